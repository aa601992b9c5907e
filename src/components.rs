//! Yew view components for the tiles and the controls around the grid.
//!
//! Tiles read the store and the data through the grid context; everything
//! else here renders from props.

use crate::chart::{destroy_chart, download_text, render_chart};
use crate::hooks::{use_grid_context, use_year_input, DataState};
use emissions_grid::config::{CONTEXT_MENU_WIDTH, DEFAULT_END_YEAR, MIN_YEAR};
use emissions_grid::export::{csv_filename, series_to_csv};
use emissions_grid::grid::GridAction;
use emissions_grid::layout::menu_position;
use emissions_grid::query::{validate_range, Countries, FilterParams};
use emissions_grid::series::{chart_payload, table_for, ChartPayload, TableView, ENTITIES};
use emissions_grid::{ChartKind, Tile, ViewMode};
use log::warn;
use std::rc::Rc;
use web_sys::{HtmlInputElement, HtmlTextAreaElement};
use yew::prelude::*;

/// Renders a tile's table view.
pub fn render_table(table: &TableView) -> Html {
    if table.is_empty() {
        return html! { <p class="no-data-message">{ "No data available" }</p> };
    }

    html! {
        <div class="tile-table-container">
            <table class="tile-table">
                <thead>
                    <tr>
                        { table.columns.iter().map(|c| html! { <th>{ c.clone() }</th> }).collect::<Html>() }
                    </tr>
                </thead>
                <tbody>
                    { table.rows.iter().map(|row| html! {
                        <tr>
                            { row.iter().map(|cell| html! { <td>{ cell.clone() }</td> }).collect::<Html>() }
                        </tr>
                    }).collect::<Html>() }
                </tbody>
            </table>
        </div>
    }
}

fn render_tile_body(tile: &Tile, data: &DataState) -> Html {
    match data {
        DataState::Loading => html! { <p class="loading-message">{ "Loading chart..." }</p> },
        DataState::Failed(_) => html! { <p class="no-data-message">{ "No data available" }</p> },
        DataState::Ready(series) if series.is_empty() => {
            html! { <p class="no-data-message">{ "No data available" }</p> }
        }
        DataState::Ready(series) => match tile.view_mode {
            ViewMode::Chart => html! {
                <ChartCanvas
                    canvas_id={format!("chart-{}", tile.id)}
                    payload={Rc::new(chart_payload(tile.kind, series))}
                />
            },
            ViewMode::Table => render_table(&table_for(tile.kind, series)),
        },
    }
}

#[derive(Properties, PartialEq)]
pub struct ChartCanvasProps {
    pub canvas_id: String,
    pub payload: Rc<ChartPayload>,
}

#[function_component(ChartCanvas)]
pub fn chart_canvas(props: &ChartCanvasProps) -> Html {
    {
        let canvas_id = props.canvas_id.clone();
        use_effect_with(props.payload.clone(), move |payload| {
            render_chart(&canvas_id, payload);
            move || destroy_chart(&canvas_id)
        });
    }

    html! {
        <div class="chart-container">
            <canvas id={props.canvas_id.clone()}></canvas>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct TileProps {
    pub tile: Tile,
}

/// One tile: header with its controls, then the chart or table.
#[function_component(TileView)]
pub fn tile_view(props: &TileProps) -> Html {
    let ctx = use_grid_context();
    let editing = use_state(|| false);
    let deleting = use_state(|| false);
    let tile = &props.tile;
    let id = tile.id;

    let on_toggle_view = {
        let ctx = ctx.clone();
        let view_mode = tile.view_mode.toggled();
        Callback::from(move |_: MouseEvent| {
            ctx.dispatch(GridAction::UpdateTileViewMode { id, view_mode });
        })
    };

    let on_export = {
        let data = ctx.data.clone();
        let kind = tile.kind;
        let title = tile.metadata.title.clone();
        Callback::from(move |_: MouseEvent| {
            let DataState::Ready(series) = &data else {
                return;
            };
            match series_to_csv(kind, series) {
                Ok(csv) => download_text(&csv_filename(&title), "text/csv;charset=utf-8", &csv),
                Err(e) => warn!("CSV export failed: {}", e),
            }
        })
    };

    let on_save = {
        let ctx = ctx.clone();
        let editing = editing.clone();
        Callback::from(move |(title, description): (String, String)| {
            ctx.dispatch(GridAction::UpdateTileMetadata {
                id,
                title,
                description,
            });
            editing.set(false);
        })
    };

    let on_confirm_delete = {
        let ctx = ctx.clone();
        let deleting = deleting.clone();
        Callback::from(move |_: ()| {
            deleting.set(false);
            ctx.dispatch(GridAction::DeleteTile { id });
        })
    };

    let open_editor = {
        let editing = editing.clone();
        Callback::from(move |_: MouseEvent| editing.set(true))
    };
    let close_editor = {
        let editing = editing.clone();
        Callback::from(move |_: ()| editing.set(false))
    };
    let open_delete = {
        let deleting = deleting.clone();
        Callback::from(move |_: MouseEvent| deleting.set(true))
    };
    let close_delete = {
        let deleting = deleting.clone();
        Callback::from(move |_: ()| deleting.set(false))
    };

    let toggle_label = match tile.view_mode {
        ViewMode::Chart => "Show table",
        ViewMode::Table => "Show chart",
    };

    html! {
        <div class="tile">
            <div class="tile-header">
                <span class="drag-handle" title="Drag to move">{ "⠿" }</span>
                <div class="tile-titles">
                    <h3 class="tile-title">{ tile.metadata.title.clone() }</h3>
                    <p class="tile-description">{ tile.metadata.description.clone() }</p>
                </div>
                <div class="tile-actions">
                    <button onclick={on_toggle_view}>{ toggle_label }</button>
                    <button onclick={on_export}>{ "Export CSV" }</button>
                    <button onclick={open_editor}>{ "Edit" }</button>
                    <button class="danger" onclick={open_delete}>{ "Delete" }</button>
                </div>
            </div>
            <div class="tile-body">
                { render_tile_body(tile, &ctx.data) }
            </div>
            if *editing {
                <EditTileDialog
                    title={tile.metadata.title.clone()}
                    description={tile.metadata.description.clone()}
                    on_save={on_save}
                    on_cancel={close_editor}
                />
            }
            if *deleting {
                <DeleteTileDialog
                    title={tile.metadata.title.clone()}
                    on_confirm={on_confirm_delete}
                    on_cancel={close_delete}
                />
            }
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct EditTileDialogProps {
    pub title: String,
    pub description: String,
    pub on_save: Callback<(String, String)>,
    pub on_cancel: Callback<()>,
}

#[function_component(EditTileDialog)]
pub fn edit_tile_dialog(props: &EditTileDialogProps) -> Html {
    let title = use_state(|| props.title.clone());
    let description = use_state(|| props.description.clone());

    let on_title = {
        let title = title.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            title.set(input.value());
        })
    };
    let on_description = {
        let description = description.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlTextAreaElement = e.target_unchecked_into();
            description.set(input.value());
        })
    };
    let on_save = {
        let title = title.clone();
        let description = description.clone();
        let on_save = props.on_save.clone();
        Callback::from(move |_: MouseEvent| {
            on_save.emit(((*title).clone(), (*description).clone()));
        })
    };
    let on_cancel = props.on_cancel.reform(|_: MouseEvent| ());

    html! {
        <div class="dialog-backdrop">
            <div class="dialog">
                <h3>{ "Edit Tile" }</h3>
                <div class="form-group">
                    <label>{ "Title" }</label>
                    <input type="text" value={(*title).clone()} oninput={on_title} />
                </div>
                <div class="form-group">
                    <label>{ "Description" }</label>
                    <textarea rows="3" value={(*description).clone()} oninput={on_description} />
                </div>
                <div class="dialog-actions">
                    <button onclick={on_cancel}>{ "Cancel" }</button>
                    <button class="primary" onclick={on_save}>{ "Save" }</button>
                </div>
            </div>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct DeleteTileDialogProps {
    pub title: String,
    pub on_confirm: Callback<()>,
    pub on_cancel: Callback<()>,
}

#[function_component(DeleteTileDialog)]
pub fn delete_tile_dialog(props: &DeleteTileDialogProps) -> Html {
    html! {
        <div class="dialog-backdrop">
            <div class="dialog">
                <h3>{ "Delete Tile" }</h3>
                <p>{ format!("Delete \"{}\"? This cannot be undone.", props.title) }</p>
                <div class="dialog-actions">
                    <button onclick={props.on_cancel.reform(|_: MouseEvent| ())}>{ "Cancel" }</button>
                    <button class="danger" onclick={props.on_confirm.reform(|_: MouseEvent| ())}>
                        { "Delete" }
                    </button>
                </div>
            </div>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct ContextMenuProps {
    /// Pointer position in viewport pixels.
    pub x: f64,
    pub y: f64,
    pub on_select: Callback<ChartKind>,
    pub on_close: Callback<()>,
}

/// Chart picker opened by a right click on the canvas.
#[function_component(ContextMenu)]
pub fn context_menu(props: &ContextMenuProps) -> Html {
    let (left, top) = web_sys::window()
        .map(|w| {
            let width = w.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(f64::MAX);
            let height = w.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(f64::MAX);
            menu_position(props.x, props.y, width, height)
        })
        .unwrap_or((props.x, props.y));

    let items = ChartKind::ALL.into_iter().map(|kind| {
        let on_select = props.on_select.clone();
        let onclick = Callback::from(move |e: MouseEvent| {
            e.stop_propagation();
            on_select.emit(kind);
        });
        html! {
            <li class="context-menu-item" {onclick}>{ kind.default_title() }</li>
        }
    });

    html! {
        <div class="context-menu-backdrop" onclick={props.on_close.reform(|_: MouseEvent| ())}>
            <ul
                class="context-menu"
                style={format!("left: {}px; top: {}px; width: {}px;", left, top, CONTEXT_MENU_WIDTH)}
            >
                { for items }
            </ul>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct FiltersProps {
    pub params: FilterParams,
    pub on_apply: Callback<FilterParams>,
}

/// Year range and country selection. Nothing is applied until the user
/// presses "Apply".
#[function_component(EmissionsFilters)]
pub fn emissions_filters(props: &FiltersProps) -> Html {
    let start = use_year_input(props.params.start_year, "Start year");
    let end = use_year_input(props.params.end_year, "End year");
    let selected = use_state(|| {
        ENTITIES
            .iter()
            .filter(|e| props.params.countries.contains(e.code))
            .map(|e| e.code.to_string())
            .collect::<Vec<_>>()
    });
    let range_error = use_state(|| None::<String>);

    let toggle_all = {
        let selected = selected.clone();
        Callback::from(move |_: Event| {
            if selected.len() == ENTITIES.len() {
                selected.set(Vec::new());
            } else {
                selected.set(ENTITIES.iter().map(|e| e.code.to_string()).collect());
            }
        })
    };

    let on_apply = {
        let commit_start = start.commit.clone();
        let commit_end = end.commit.clone();
        let selected = selected.clone();
        let range_error = range_error.clone();
        let on_apply = props.on_apply.clone();
        Callback::from(move |_: MouseEvent| {
            let (Ok(start_year), Ok(end_year)) = (commit_start(), commit_end()) else {
                return;
            };
            if let Err(e) = validate_range(start_year, end_year) {
                range_error.set(Some(e.to_string()));
                return;
            }
            range_error.set(None);

            let countries = if selected.len() == ENTITIES.len() {
                Countries::All
            } else {
                Countries::Codes((*selected).clone())
            };
            on_apply.emit(FilterParams {
                start_year,
                end_year,
                countries,
            });
        })
    };

    let country_boxes = ENTITIES.iter().map(|entity| {
        let code = entity.code;
        let checked = selected.iter().any(|c| c == code);
        let onchange = {
            let selected = selected.clone();
            Callback::from(move |_: Event| {
                // keep catalog order
                let next = ENTITIES
                    .iter()
                    .map(|e| e.code.to_string())
                    .filter(|c| if c == code { !checked } else { selected.contains(c) })
                    .collect();
                selected.set(next);
            })
        };
        html! {
            <label class="country-option">
                <input type="checkbox" {checked} {onchange} />
                { entity.name }
            </label>
        }
    });

    let year_hint = format!("{}-{}", MIN_YEAR, DEFAULT_END_YEAR);

    html! {
        <div class="filters">
            <div class="form-group">
                <label for="start-year">{ "Start Year:" }</label>
                <input id="start-year" type="number" placeholder={year_hint.clone()}
                    value={start.text.clone()} oninput={start.on_text_input.clone()} />
                if let Some(err) = &start.error {
                    <span class="error">{ err.to_string() }</span>
                }
            </div>
            <div class="form-group">
                <label for="end-year">{ "End Year:" }</label>
                <input id="end-year" type="number" placeholder={year_hint}
                    value={end.text.clone()} oninput={end.on_text_input.clone()} />
                if let Some(err) = &end.error {
                    <span class="error">{ err.to_string() }</span>
                }
            </div>
            <div class="form-group countries">
                <label class="country-option">
                    <input type="checkbox" checked={selected.len() == ENTITIES.len()} onchange={toggle_all} />
                    { "All" }
                </label>
                { for country_boxes }
            </div>
            if let Some(err) = &*range_error {
                <div class="error">{ err.clone() }</div>
            }
            <button class="primary" onclick={on_apply}>{ "Apply" }</button>
        </div>
    }
}
