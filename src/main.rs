//! Main module for the emissions dashboard using Yew.
//! Wires the filters, the remote data and the tile grid together.

use emissions_grid::client::get_series;
use emissions_grid::config::{GridGeometry, GRID_MARGIN, MAX_ROWS};
use emissions_grid::grid::GridAction;
use emissions_grid::layout::{grid_cell_at, layout_from_tiles, placement_for, CanvasRect, GridCell};
use emissions_grid::query::FilterParams;
use emissions_grid::storage::{LocalTileStorage, TileStorage};
use emissions_grid::ChartKind;
use log::{info, warn};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use yew::prelude::*;

mod chart;
mod components;
mod hooks;

use chart::{mount_layout_engine, sync_layout_engine, unmount_layout_engine, EngineOptions};
use components::{ContextMenu, EmissionsFilters, TileView};
use hooks::{use_grid_context, use_grid_store, use_layout_change, DataState, GridContext};

const GRID_CONTAINER_ID: &str = "tile-grid";

#[derive(Properties, PartialEq)]
struct GridProviderProps {
    data: DataState,
    children: Html,
}

/// Owns the tile store and shares it, with the current data, through context.
#[function_component(GridProvider)]
fn grid_provider(props: &GridProviderProps) -> Html {
    let storage: Rc<dyn TileStorage> = use_memo((), |_| LocalTileStorage::default());
    let (store, saver) = use_grid_store(storage);

    let context = GridContext {
        store,
        saver,
        data: props.data.clone(),
    };

    html! {
        <ContextProvider<GridContext> {context}>
            { props.children.clone() }
        </ContextProvider<GridContext>>
    }
}

/// The tile canvas: layout engine, right-click menu and reset control.
#[function_component(Grid)]
fn grid() -> Html {
    let ctx = use_grid_context();
    let geometry = GridGeometry::default();
    let container = use_node_ref();
    // (pointer x, pointer y, cell under the pointer)
    let menu = use_state(|| None::<(f64, f64, GridCell)>);
    let on_layout_change = use_layout_change(ctx.store.dispatcher());
    let engine_closure = use_mut_ref(|| None::<Closure<dyn Fn(JsValue)>>);

    // Mount the layout engine once; the closure lives as long as the engine.
    {
        let on_layout_change = on_layout_change.clone();
        use_effect_with((), move |_| {
            let options = EngineOptions {
                columns: geometry.columns,
                row_height: geometry.row_height,
                margin: GRID_MARGIN,
                max_rows: MAX_ROWS,
            };
            let closure = mount_layout_engine(GRID_CONTAINER_ID, &options, move |items| {
                on_layout_change.emit(items)
            });
            *engine_closure.borrow_mut() = Some(closure);

            move || {
                unmount_layout_engine(GRID_CONTAINER_ID);
                engine_closure.borrow_mut().take();
            }
        });
    }

    // Hand the engine a fresh projection whenever the tiles change.
    use_effect_with(ctx.store.tiles.clone(), |tiles| {
        sync_layout_engine(GRID_CONTAINER_ID, &layout_from_tiles(tiles));
    });

    let on_context_menu = {
        let container = container.clone();
        let menu = menu.clone();
        Callback::from(move |e: MouseEvent| {
            e.prevent_default();
            let Some(el) = container.cast::<web_sys::Element>() else {
                return;
            };
            let rect = el.get_bounding_client_rect();
            let canvas = CanvasRect {
                left: rect.left(),
                top: rect.top(),
                width: rect.width(),
            };
            let (x, y) = (e.client_x() as f64, e.client_y() as f64);
            menu.set(Some((x, y, grid_cell_at(x, y, canvas, geometry))));
        })
    };

    let on_select_chart = {
        let ctx = ctx.clone();
        let menu = menu.clone();
        Callback::from(move |kind: ChartKind| {
            if let Some((_, _, cell)) = *menu {
                ctx.dispatch(GridAction::AddTile {
                    kind,
                    layout: placement_for(cell, geometry),
                });
            }
            menu.set(None);
        })
    };

    let on_close_menu = {
        let menu = menu.clone();
        Callback::from(move |_: ()| menu.set(None))
    };

    let on_reset = {
        let ctx = ctx.clone();
        Callback::from(move |_: MouseEvent| {
            info!("Resetting grid to the example layout");
            ctx.reset();
        })
    };

    let tiles = ctx.store.tiles.iter().map(|tile| {
        let key = tile.layout_key();
        html! {
            <div
                key={key.clone()}
                class="grid-stack-item"
                data-grid-key={key}
                gs-x={tile.layout.x.to_string()}
                gs-y={tile.layout.y.to_string()}
                gs-w={tile.layout.w.to_string()}
                gs-h={tile.layout.h.to_string()}
            >
                <div class="grid-stack-item-content">
                    <TileView tile={tile.clone()} />
                </div>
            </div>
        }
    });

    html! {
        <>
            <div class="grid-canvas" ref={container} oncontextmenu={on_context_menu}>
                if ctx.store.is_empty() {
                    <div class="grid-empty">{ "Right-click to add a chart" }</div>
                }
                <div id={GRID_CONTAINER_ID} class="grid-stack">
                    { for tiles }
                </div>
            </div>
            if let Some((x, y, _)) = *menu {
                <ContextMenu {x} {y} on_select={on_select_chart} on_close={on_close_menu} />
            }
            <button class="reset-grid" onclick={on_reset}>{ "Reset Grid To Example" }</button>
        </>
    }
}

/// Primary application component: filters on top, tiles below.
#[function_component(App)]
fn app() -> Html {
    let params = use_state(|| {
        let search = gloo_utils::window().location().search().unwrap_or_default();
        FilterParams::from_query(&search)
    });
    let data = use_state(|| DataState::Loading);
    // Bumped per request so a slow, superseded response is ignored.
    let request_token = use_mut_ref(|| 0u32);

    {
        let data = data.clone();
        use_effect_with((*params).clone(), move |params| {
            let token = {
                let mut current = request_token.borrow_mut();
                *current = current.wrapping_add(1);
                *current
            };
            data.set(DataState::Loading);

            let params = params.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let result = get_series(&params).await;
                if *request_token.borrow() != token {
                    return;
                }
                match result {
                    Ok(series) => data.set(DataState::Ready(series)),
                    Err(e) => {
                        warn!("{}", e);
                        data.set(DataState::Failed(e.to_string()));
                    }
                }
            });
        });
    }

    let on_apply = {
        let params = params.clone();
        Callback::from(move |next: FilterParams| {
            let url = next.to_query();
            if let Err(e) = gloo_utils::history().push_state_with_url(&JsValue::NULL, "", Some(&url)) {
                warn!("Failed to update the URL: {:?}", e);
            }
            params.set(next);
        })
    };

    html! {
        <div class="container">
            <h1>{ "Global Emissions Analytics" }</h1>
            <EmissionsFilters key={params.to_query()} params={(*params).clone()} {on_apply} />
            <GridProvider data={(*data).clone()}>
                <Grid />
            </GridProvider>
        </div>
    }
}

/// Entry point: installs logging and renders the app.
fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
    yew::Renderer::<App>::new().render();
}
