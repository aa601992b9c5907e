//! Tile model and core state for the emissions dashboard grid.
//!
//! The library half of the crate holds everything that can run without a
//! browser: the tile collection store, the layout helpers, persistence
//! (behind an injectable storage trait) and the data shaping used by the
//! renderers. The Yew front end in `main.rs` wires these together.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod cache;
pub mod client;
pub mod config;
pub mod debounce;
pub mod export;
pub mod grid;
pub mod layout;
pub mod query;
pub mod series;
pub mod storage;

pub use grid::{GridAction, GridState};
pub use series::DataSeries;

/// Identifier of a tile, unique within a collection.
pub type TileId = u32;

/// The kind of chart a tile renders. Fixed at creation.
///
/// Older saved grids may carry `"area"` or `"scatter"`; both were only ever
/// rendered as line charts and load as [`ChartKind::Line`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[serde(alias = "area", alias = "scatter")]
    Line,
    Bar,
    Pie,
    Map,
}

impl ChartKind {
    /// Every chart kind, in the order the context menu offers them.
    pub const ALL: [ChartKind; 4] = [
        ChartKind::Line,
        ChartKind::Bar,
        ChartKind::Pie,
        ChartKind::Map,
    ];

    /// Lowercase tag, identical to the persisted form.
    pub fn tag(self) -> &'static str {
        match self {
            ChartKind::Line => "line",
            ChartKind::Bar => "bar",
            ChartKind::Pie => "pie",
            ChartKind::Map => "map",
        }
    }

    /// Pie and map charts show one total per entity instead of a time series.
    pub fn is_aggregate(self) -> bool {
        matches!(self, ChartKind::Pie | ChartKind::Map)
    }

    /// `"Line Chart"`, `"Bar Chart"`, ...
    pub fn default_title(self) -> String {
        let tag = self.tag();
        let mut chars = tag.chars();
        let capitalized: String = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
        format!("{} Chart", capitalized)
    }

    pub fn default_description(self) -> String {
        format!("Showing data visualization using {} chart", self.tag())
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Whether a tile shows its chart or the underlying numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Chart,
    Table,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            ViewMode::Chart => ViewMode::Table,
            ViewMode::Table => ViewMode::Chart,
        }
    }
}

/// Rectangle in grid cells. `x` is the column, `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileLayout {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileMetadata {
    pub title: String,
    pub description: String,
}

impl TileMetadata {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }

    /// Metadata a freshly created tile of `kind` starts with.
    pub fn default_for(kind: ChartKind) -> Self {
        Self::new(kind.default_title(), kind.default_description())
    }
}

/// One chart or table placed on the canvas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tile {
    pub id: TileId,
    #[serde(rename = "type")]
    pub kind: ChartKind,
    pub layout: TileLayout,
    pub metadata: TileMetadata,
    pub view_mode: ViewMode,
}

impl Tile {
    /// A tile with default metadata in chart view.
    pub fn new(id: TileId, kind: ChartKind, layout: TileLayout) -> Self {
        Self {
            id,
            kind,
            layout,
            metadata: TileMetadata::default_for(kind),
            view_mode: ViewMode::Chart,
        }
    }

    /// Key the layout engine knows this tile by.
    pub fn layout_key(&self) -> String {
        layout::tile_key(self.id)
    }
}
