use emissions_grid::config::LAYOUT_DEBOUNCE_MS;
use emissions_grid::debounce::Debouncer;
use emissions_grid::grid::{GridAction, GridState};
use emissions_grid::layout::LayoutItem;
use emissions_grid::query::{validate_year, FilterError};
use emissions_grid::series::DataSeries;
use emissions_grid::storage::{DebouncedSaver, TileStorage};
use std::cell::RefCell;
use std::rc::Rc;
use web_sys::HtmlInputElement;
use yew::prelude::*;

/// Remote data as seen by the tiles.
#[derive(Clone, PartialEq)]
pub enum DataState {
    Loading,
    Ready(Rc<Vec<DataSeries>>),
    Failed(String),
}

/// Shared by every component under the grid provider.
#[derive(Clone)]
pub struct GridContext {
    pub store: UseReducerHandle<GridState>,
    pub saver: Rc<DebouncedSaver>,
    pub data: DataState,
}

impl PartialEq for GridContext {
    fn eq(&self, other: &Self) -> bool {
        self.store == other.store && Rc::ptr_eq(&self.saver, &other.saver) && self.data == other.data
    }
}

impl GridContext {
    pub fn dispatch(&self, action: GridAction) {
        self.store.dispatch(action);
    }

    /// Discard the saved grid and return to the starter tiles.
    pub fn reset(&self) {
        self.saver.reset();
        self.store.dispatch(GridAction::ResetGrid);
    }
}

#[hook]
pub fn use_grid_context() -> GridContext {
    use_context::<GridContext>().expect("use_grid_context must be used within a GridProvider")
}

/// Tile store seeded from `storage`, saved back (debounced) on every change.
#[hook]
pub fn use_grid_store(
    storage: Rc<dyn TileStorage>,
) -> (UseReducerHandle<GridState>, Rc<DebouncedSaver>) {
    let restored = {
        let storage = storage.clone();
        use_memo((), move |_| storage.restore())
    };
    let store = {
        let tiles = restored.tiles.clone();
        use_reducer(move || GridState::new(tiles))
    };
    let saver = use_memo((), move |_| DebouncedSaver::new(storage));
    // A newer record survives until the user changes something.
    let skip_initial_save = use_mut_ref(|| restored.keep_record);

    {
        let saver = saver.clone();
        use_effect_with(store.tiles.clone(), move |tiles| {
            if skip_initial_save.replace(false) {
                return;
            }
            saver.schedule(tiles.clone());
        });
    }

    (store, saver)
}

/// Callback for layout-engine events, forwarded to the store once the
/// engine has been quiet for `LAYOUT_DEBOUNCE_MS`.
#[hook]
pub fn use_layout_change(
    dispatcher: UseReducerDispatcher<GridState>,
) -> Callback<Vec<LayoutItem>> {
    let debouncer = use_memo((), |_| Debouncer::new(LAYOUT_DEBOUNCE_MS));

    use_callback(dispatcher, move |items: Vec<LayoutItem>, dispatcher| {
        let dispatcher = dispatcher.clone();
        debouncer.call(move || {
            dispatcher.dispatch(GridAction::UpdateTilesFromLayout { items });
        });
    })
}

/// Holds the state and callbacks for a year field in the filter form.
#[derive(Clone)]
pub struct YearInput {
    /// The current text content of the input field.
    pub text: String,
    /// Last value that passed validation.
    pub value: i32,
    pub error: Option<FilterError>,
    /// Callback for the input's `oninput` event.
    pub on_text_input: Callback<InputEvent>,
    /// Validate the current text, keeping the previous value on failure.
    /// Returns the value that is in effect afterwards.
    pub commit: Rc<dyn Fn() -> Result<i32, FilterError>>,
}

#[hook]
pub fn use_year_input(initial: i32, field: &'static str) -> YearInput {
    let text = use_state(|| initial.to_string());
    let value = use_state(|| initial);
    let error = use_state(|| None::<FilterError>);
    // Latest text typed, readable from `commit` without waiting for a re-render.
    let latest = use_mut_ref(|| initial.to_string());

    let on_text_input = {
        let text = text.clone();
        let latest = latest.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            *latest.borrow_mut() = input.value();
            text.set(input.value());
        })
    };

    let commit: Rc<dyn Fn() -> Result<i32, FilterError>> = {
        let value = value.clone();
        let error = error.clone();
        let latest: Rc<RefCell<String>> = latest.clone();
        Rc::new(move || match validate_year(&latest.borrow(), field) {
            Ok(year) => {
                value.set(year);
                error.set(None);
                Ok(year)
            }
            Err(e) => {
                error.set(Some(e.clone()));
                Err(e)
            }
        })
    };

    YearInput {
        text: (*text).clone(),
        value: *value,
        error: (*error).clone(),
        on_text_input,
        commit,
    }
}
