//! JavaScript interop for the layout engine and chart rendering.
//! Provides Rust bindings to helper functions defined in grid_helpers.js.

use emissions_grid::layout::LayoutItem;
use emissions_grid::series::ChartPayload;
use log::warn;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(module = "/grid_helpers.js")]
extern "C" {
    #[wasm_bindgen(js_name = mountLayoutEngine)]
    fn mount_layout_engine_js(
        container_id: &str,
        columns: u32,
        row_height: u32,
        margin: u32,
        max_rows: u32,
        on_change: &js_sys::Function,
    );

    #[wasm_bindgen(js_name = syncLayoutEngine)]
    fn sync_layout_engine_js(container_id: &str, items: JsValue);

    #[wasm_bindgen(js_name = unmountLayoutEngine)]
    pub fn unmount_layout_engine(container_id: &str);

    #[wasm_bindgen(js_name = renderChart)]
    fn render_chart_js(canvas_id: &str, payload: JsValue);

    #[wasm_bindgen(js_name = destroyChart)]
    pub fn destroy_chart(canvas_id: &str);

    #[wasm_bindgen(js_name = downloadText)]
    pub fn download_text(filename: &str, mime: &str, content: &str);
}

/// Geometry the layout engine is mounted with.
pub struct EngineOptions {
    pub columns: u32,
    pub row_height: u32,
    pub margin: u32,
    pub max_rows: u32,
}

/// Attach the layout engine to `container_id`.
///
/// The returned closure must be kept alive for as long as the engine is
/// mounted; it receives the engine's full rectangle set after every drag,
/// resize or compaction.
pub fn mount_layout_engine(
    container_id: &str,
    options: &EngineOptions,
    on_change: impl Fn(Vec<LayoutItem>) + 'static,
) -> Closure<dyn Fn(JsValue)> {
    let closure = Closure::<dyn Fn(JsValue)>::new(move |value: JsValue| {
        match serde_wasm_bindgen::from_value::<Vec<LayoutItem>>(value) {
            Ok(items) => on_change(items),
            Err(e) => warn!("Ignoring malformed layout event: {}", e),
        }
    });
    mount_layout_engine_js(
        container_id,
        options.columns,
        options.row_height,
        options.margin,
        options.max_rows,
        closure.as_ref().unchecked_ref(),
    );
    closure
}

/// Hand the engine the rectangles of the current tiles.
pub fn sync_layout_engine(container_id: &str, items: &[LayoutItem]) {
    match serde_wasm_bindgen::to_value(items) {
        Ok(value) => sync_layout_engine_js(container_id, value),
        Err(e) => warn!("Failed to pass layout to engine: {}", e),
    }
}

pub fn render_chart(canvas_id: &str, payload: &ChartPayload) {
    match serde_wasm_bindgen::to_value(payload) {
        Ok(value) => render_chart_js(canvas_id, value),
        Err(e) => warn!("Failed to pass chart data to renderer: {}", e),
    }
}
