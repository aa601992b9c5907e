//! Helpers between the tile collection and the layout engine.
//!
//! The layout engine only knows rectangles keyed by string. Tiles are
//! projected into that form for every render, and whatever the engine
//! reports back after a drag, resize or compaction is matched by key onto
//! the existing tiles.

use crate::config::{
    GridGeometry, CONTEXT_MENU_HEIGHT, CONTEXT_MENU_PADDING, CONTEXT_MENU_WIDTH,
};
use crate::{ChartKind, Tile, TileId, TileLayout, TileMetadata, ViewMode};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

const KEY_PREFIX: &str = "tile-";

/// Rectangle as exchanged with the layout engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutItem {
    pub key: String,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl LayoutItem {
    pub fn rect(&self) -> TileLayout {
        TileLayout {
            x: self.x,
            y: self.y,
            w: self.w,
            h: self.h,
        }
    }
}

pub fn tile_key(id: TileId) -> String {
    format!("{}{}", KEY_PREFIX, id)
}

pub fn parse_tile_key(key: &str) -> Option<TileId> {
    key.strip_prefix(KEY_PREFIX)?.parse().ok()
}

/// Project tiles into engine rectangles, preserving order.
pub fn layout_from_tiles(tiles: &[Tile]) -> Vec<LayoutItem> {
    tiles
        .iter()
        .map(|tile| LayoutItem {
            key: tile.layout_key(),
            x: tile.layout.x,
            y: tile.layout.y,
            w: tile.layout.w,
            h: tile.layout.h,
        })
        .collect()
}

/// Apply engine rectangles to the tiles they name.
///
/// Tiles without a matching key keep their previous layout; no tile is added
/// or dropped, and order is unchanged.
pub fn tiles_from_layout(tiles: &[Tile], items: &[LayoutItem]) -> Vec<Tile> {
    let by_id: HashMap<TileId, &LayoutItem> = items
        .iter()
        .filter_map(|item| Some((parse_tile_key(&item.key)?, item)))
        .collect();

    tiles
        .iter()
        .map(|tile| match by_id.get(&tile.id) {
            Some(item) => Tile {
                layout: item.rect(),
                ..tile.clone()
            },
            None => tile.clone(),
        })
        .collect()
}

/// Next free id: one past the largest id present, or 0 for an empty grid.
///
/// When the largest id is already `TileId::MAX`, the lowest unused id is
/// handed out instead.
pub fn next_tile_id(tiles: &[Tile]) -> TileId {
    let Some(max) = tiles.iter().map(|tile| tile.id).max() else {
        return 0;
    };
    max.checked_add(1).unwrap_or_else(|| {
        let used: HashSet<TileId> = tiles.iter().map(|tile| tile.id).collect();
        (0..TileId::MAX).find(|id| !used.contains(id)).unwrap_or_default()
    })
}

/// Position and width of the rendered canvas, in page pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
}

/// A cell coordinate on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCell {
    pub x: u32,
    pub y: u32,
}

/// Map a pointer position onto the grid cell underneath it.
///
/// Points left of or above the canvas snap to the first column or row.
pub fn grid_cell_at(
    client_x: f64,
    client_y: f64,
    canvas: CanvasRect,
    geometry: GridGeometry,
) -> GridCell {
    let rel_x = (client_x - canvas.left).max(0.0);
    let rel_y = (client_y - canvas.top).max(0.0);

    let col_width = canvas.width / geometry.columns.max(1) as f64;
    let x = if col_width > 0.0 {
        (rel_x / col_width).floor() as u32
    } else {
        0
    };
    let y = (rel_y / geometry.row_height.max(1) as f64).floor() as u32;

    GridCell { x, y }
}

/// Rectangle for a new tile dropped at `cell`.
///
/// `x` is clamped so the tile never overflows the right edge; `y` is kept
/// as is since the grid grows downward without limit.
pub fn placement_for(cell: GridCell, geometry: GridGeometry) -> TileLayout {
    let max_x = geometry.columns.saturating_sub(geometry.tile_width);
    TileLayout {
        x: cell.x.min(max_x),
        y: cell.y,
        w: geometry.tile_width,
        h: geometry.tile_height,
    }
}

/// Keep a context menu opened at (`x`, `y`) inside a viewport.
pub fn menu_position(x: f64, y: f64, viewport_width: f64, viewport_height: f64) -> (f64, f64) {
    let mut adjusted_x = x;
    let mut adjusted_y = y;

    if x + CONTEXT_MENU_WIDTH > viewport_width {
        adjusted_x = viewport_width - CONTEXT_MENU_WIDTH - CONTEXT_MENU_PADDING;
    }

    if y + CONTEXT_MENU_HEIGHT > viewport_height {
        // open above the cursor instead
        adjusted_y = y - CONTEXT_MENU_HEIGHT;
        if adjusted_y < 0.0 {
            adjusted_y = CONTEXT_MENU_PADDING;
        }
    }

    (adjusted_x, adjusted_y)
}

/// The starter grid shown on first visit and after a reset.
pub fn default_tiles() -> Vec<Tile> {
    let tile = |id, kind, (x, y, w, h), title: &str, description: &str, view_mode| Tile {
        id,
        kind,
        layout: TileLayout { x, y, w, h },
        metadata: TileMetadata::new(title, description),
        view_mode,
    };

    vec![
        tile(
            1,
            ChartKind::Line,
            (0, 0, 4, 4),
            "Greenhouse Gas Emissions Line Chart",
            "Note changes in trends within individual countries over time",
            ViewMode::Chart,
        ),
        tile(
            2,
            ChartKind::Bar,
            (0, 4, 4, 3),
            "Greenhouse Gas Emissions Bar Chart",
            "See how the stacked emissions vary by year",
            ViewMode::Chart,
        ),
        tile(
            3,
            ChartKind::Pie,
            (2, 7, 2, 5),
            "Greenhouse Gas Emissions Pie Chart",
            "View aggregated emissions by country",
            ViewMode::Chart,
        ),
        tile(
            4,
            ChartKind::Map,
            (0, 7, 2, 5),
            "Greenhouse Gas Emissions Map Chart",
            "Analyze the geographical correlation with greenhouse emissions",
            ViewMode::Chart,
        ),
        tile(
            5,
            ChartKind::Line,
            (0, 12, 4, 4),
            "Greenhouse Gas Emissions Table (Line Chart)",
            "Analyze the raw data per year by country",
            ViewMode::Table,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> GridGeometry {
        GridGeometry {
            columns: 4,
            row_height: 100,
            tile_width: 2,
            tile_height: 4,
        }
    }

    fn tile_at(id: TileId, x: u32, y: u32) -> Tile {
        Tile::new(id, ChartKind::Line, TileLayout { x, y, w: 2, h: 4 })
    }

    #[test]
    fn next_id_of_empty_grid_is_zero() {
        assert_eq!(next_tile_id(&[]), 0);
    }

    #[test]
    fn next_id_follows_largest_present_id() {
        let tiles = vec![tile_at(0, 0, 0), tile_at(5, 2, 0)];
        assert_eq!(next_tile_id(&tiles), 6);
    }

    #[test]
    fn next_id_reuses_lowest_free_id_at_the_top_of_the_range() {
        let tiles = vec![tile_at(0, 0, 0), tile_at(1, 2, 0), tile_at(TileId::MAX, 0, 4)];
        assert_eq!(next_tile_id(&tiles), 2);
        assert_eq!(next_tile_id(&[tile_at(TileId::MAX, 0, 0)]), 0);
    }

    #[test]
    fn projection_keys_tiles_in_order() {
        let tiles = vec![tile_at(7, 0, 0), tile_at(2, 2, 4)];
        let items = layout_from_tiles(&tiles);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].key, "tile-7");
        assert_eq!(items[1].key, "tile-2");
        assert_eq!(items[1].rect(), tiles[1].layout);
    }

    #[test]
    fn reconciliation_leaves_unmatched_tiles_alone() {
        let tiles = vec![tile_at(0, 0, 0), tile_at(1, 2, 0), tile_at(2, 0, 4)];
        let items = vec![
            LayoutItem { key: "tile-0".into(), x: 2, y: 8, w: 2, h: 3 },
            LayoutItem { key: "tile-2".into(), x: 0, y: 0, w: 4, h: 4 },
        ];

        let updated = tiles_from_layout(&tiles, &items);

        assert_eq!(updated.len(), 3);
        assert_eq!(updated[0].layout, TileLayout { x: 2, y: 8, w: 2, h: 3 });
        assert_eq!(updated[1], tiles[1]);
        assert_eq!(updated[2].layout, TileLayout { x: 0, y: 0, w: 4, h: 4 });
        assert_eq!(updated[2].metadata, tiles[2].metadata);
    }

    #[test]
    fn reconciliation_ignores_unknown_keys() {
        let tiles = vec![tile_at(0, 0, 0)];
        let items = vec![
            LayoutItem { key: "tile-9".into(), x: 2, y: 2, w: 2, h: 2 },
            LayoutItem { key: "tile-".into(), x: 2, y: 2, w: 2, h: 2 },
            LayoutItem { key: "0".into(), x: 2, y: 2, w: 2, h: 2 },
        ];
        assert_eq!(tiles_from_layout(&tiles, &items), tiles);
    }

    #[test]
    fn tile_keys_round_trip() {
        assert_eq!(parse_tile_key(&tile_key(42)), Some(42));
        assert_eq!(parse_tile_key("panel-1"), None);
        assert_eq!(parse_tile_key("tile-x"), None);
    }

    #[test]
    fn click_maps_to_cell() {
        let canvas = CanvasRect { left: 100.0, top: 50.0, width: 800.0 };
        // columns are 200px wide, rows 100px tall
        let cell = grid_cell_at(100.0 + 650.0, 50.0 + 30.0, canvas, geometry());
        assert_eq!(cell, GridCell { x: 3, y: 0 });

        let cell = grid_cell_at(100.0 + 199.0, 50.0 + 420.0, canvas, geometry());
        assert_eq!(cell, GridCell { x: 0, y: 4 });
    }

    #[test]
    fn clicks_outside_canvas_snap_to_origin() {
        let canvas = CanvasRect { left: 100.0, top: 50.0, width: 800.0 };
        let cell = grid_cell_at(10.0, 0.0, canvas, geometry());
        assert_eq!(cell, GridCell { x: 0, y: 0 });
    }

    #[test]
    fn placement_clamps_to_right_edge() {
        let layout = placement_for(GridCell { x: 3, y: 0 }, geometry());
        assert_eq!(layout, TileLayout { x: 2, y: 0, w: 2, h: 4 });
    }

    #[test]
    fn placement_never_overflows_columns() {
        let g = geometry();
        for x in 0..50 {
            let layout = placement_for(GridCell { x, y: 1000 }, g);
            assert!(layout.x + layout.w <= g.columns);
            assert_eq!(layout.y, 1000);
        }
    }

    #[test]
    fn menu_stays_inside_viewport() {
        assert_eq!(menu_position(100.0, 100.0, 1000.0, 800.0), (100.0, 100.0));
        assert_eq!(menu_position(950.0, 100.0, 1000.0, 800.0), (790.0, 100.0));
        assert_eq!(menu_position(100.0, 700.0, 1000.0, 800.0), (100.0, 550.0));
        assert_eq!(menu_position(100.0, 100.0, 1000.0, 120.0), (100.0, 10.0));
    }

    #[test]
    fn default_grid_covers_every_chart_kind() {
        let tiles = default_tiles();
        assert_eq!(tiles.len(), 5);
        for kind in ChartKind::ALL {
            assert!(tiles.iter().any(|t| t.kind == kind));
        }
        assert_eq!(tiles[4].view_mode, ViewMode::Table);
        let mut ids: Vec<_> = tiles.iter().map(|t| t.id).collect();
        ids.dedup();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }
}
