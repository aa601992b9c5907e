//! Application-level configuration constants.

// Grid geometry
pub const GRID_COLS: u32 = 4;
pub const ROW_HEIGHT: u32 = 100;
pub const TILE_WIDTH: u32 = 2;
pub const TILE_HEIGHT: u32 = 4;
pub const GRID_MARGIN: u32 = 20;
pub const MAX_ROWS: u32 = 500;

// Persistence
pub const STORAGE_KEY: &str = "grid-tiles-config";
pub const SAVE_DEBOUNCE_MS: u32 = 500;
pub const LAYOUT_DEBOUNCE_MS: u32 = 50;

// Filter defaults and limits
pub const DEFAULT_START_YEAR: i32 = 1972;
pub const DEFAULT_END_YEAR: i32 = 2022;
pub const MIN_YEAR: i32 = 1960;

// Remote data
pub const API_BASE: &str = "https://api.worldbank.org/v2";
pub const INDICATOR: &str = "EN.GHG.ALL.MT.CE.AR5";
pub const PER_PAGE: u32 = 100;

// UI constants
pub const CONTEXT_MENU_WIDTH: f64 = 200.0;
pub const CONTEXT_MENU_HEIGHT: f64 = 150.0;
pub const CONTEXT_MENU_PADDING: f64 = 10.0;
pub const CHART_Y_AXIS_LABEL: &str = "Mt CO2e";

/// Cell geometry of the tile canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    pub columns: u32,
    pub row_height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
}

impl Default for GridGeometry {
    fn default() -> Self {
        Self {
            columns: GRID_COLS,
            row_height: ROW_HEIGHT,
            tile_width: TILE_WIDTH,
            tile_height: TILE_HEIGHT,
        }
    }
}
