//! Browser-only checks: the real `localStorage` adapter and the timer-driven
//! debounces.
#![cfg(target_arch = "wasm32")]

use emissions_grid::config::LAYOUT_DEBOUNCE_MS;
use emissions_grid::debounce::Debouncer;
use emissions_grid::layout::default_tiles;
use emissions_grid::storage::{
    DebouncedSaver, LocalTileStorage, MemoryTileStorage, StorageError, TileStorage,
};
use emissions_grid::{ChartKind, Tile, TileLayout};
use gloo_timers::future::TimeoutFuture;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn scratch(name: &str) -> LocalTileStorage {
    let storage = LocalTileStorage::new(format!("emissions-grid-test-{}", name));
    storage.reset().unwrap();
    storage
}

#[wasm_bindgen_test]
fn local_storage_round_trip() {
    let storage = scratch("round-trip");
    let tiles = default_tiles();

    storage.save(&tiles).unwrap();
    assert_eq!(storage.load(), Some(tiles));

    storage.reset().unwrap();
}

#[wasm_bindgen_test]
fn reset_clears_saved_grid() {
    let storage = scratch("reset");
    let tile = Tile::new(3, ChartKind::Pie, TileLayout { x: 2, y: 0, w: 2, h: 4 });

    storage.save(&[tile]).unwrap();
    assert!(storage.read_raw().unwrap().is_some());

    storage.reset().unwrap();
    assert_eq!(storage.read_raw().unwrap(), None);
    assert_eq!(storage.load(), None);
}

#[wasm_bindgen_test]
fn corrupt_record_loads_as_nothing() {
    let storage = scratch("corrupt");
    storage.write_raw("{not json").unwrap();

    assert_eq!(storage.load(), None);

    storage.reset().unwrap();
}

/// In-memory storage that counts writes.
#[derive(Default)]
struct CountingStorage {
    inner: MemoryTileStorage,
    writes: Cell<usize>,
}

impl TileStorage for CountingStorage {
    fn read_raw(&self) -> Result<Option<String>, StorageError> {
        self.inner.read_raw()
    }

    fn write_raw(&self, value: &str) -> Result<(), StorageError> {
        self.writes.set(self.writes.get() + 1);
        self.inner.write_raw(value)
    }

    fn remove_raw(&self) -> Result<(), StorageError> {
        self.inner.remove_raw()
    }
}

const SAVE_DELAY_MS: u32 = 20;

#[wasm_bindgen_test]
async fn rapid_saves_collapse_into_one_write() {
    let storage = Rc::new(CountingStorage::default());
    let saver = DebouncedSaver::with_delay(storage.clone(), SAVE_DELAY_MS);
    let tiles = default_tiles();

    saver.schedule(tiles[..1].to_vec());
    saver.schedule(tiles[..3].to_vec());
    saver.schedule(tiles.clone());
    assert_eq!(storage.writes.get(), 0);

    TimeoutFuture::new(SAVE_DELAY_MS * 4).await;

    assert_eq!(storage.writes.get(), 1);
    assert_eq!(storage.load(), Some(tiles));
}

#[wasm_bindgen_test]
async fn saves_after_a_quiet_period_are_written_separately() {
    let storage = Rc::new(CountingStorage::default());
    let saver = DebouncedSaver::with_delay(storage.clone(), SAVE_DELAY_MS);
    let tiles = default_tiles();

    saver.schedule(tiles[..2].to_vec());
    TimeoutFuture::new(SAVE_DELAY_MS * 4).await;
    saver.schedule(tiles.clone());
    TimeoutFuture::new(SAVE_DELAY_MS * 4).await;

    assert_eq!(storage.writes.get(), 2);
    assert_eq!(storage.load(), Some(tiles));
}

#[wasm_bindgen_test]
async fn reset_cancels_pending_write() {
    let storage = Rc::new(CountingStorage::default());
    let saver = DebouncedSaver::with_delay(storage.clone(), SAVE_DELAY_MS);

    saver.schedule(default_tiles());
    saver.reset();
    TimeoutFuture::new(SAVE_DELAY_MS * 4).await;

    assert_eq!(storage.writes.get(), 0);
    assert_eq!(storage.load(), None);
}

#[wasm_bindgen_test]
async fn layout_debounce_runs_only_the_latest_action() {
    let runs = Rc::new(RefCell::new(Vec::new()));
    let debouncer = Debouncer::new(LAYOUT_DEBOUNCE_MS);

    for step in 0..3 {
        let runs = runs.clone();
        debouncer.call(move || runs.borrow_mut().push(step));
    }
    assert!(runs.borrow().is_empty());

    TimeoutFuture::new(LAYOUT_DEBOUNCE_MS * 4).await;
    assert_eq!(*runs.borrow(), vec![2]);
}

#[wasm_bindgen_test]
async fn cancelled_debounce_never_runs() {
    let ran = Rc::new(Cell::new(false));
    let debouncer = Debouncer::new(LAYOUT_DEBOUNCE_MS);

    let flag = ran.clone();
    debouncer.call(move || flag.set(true));
    debouncer.cancel();

    TimeoutFuture::new(LAYOUT_DEBOUNCE_MS * 4).await;
    assert!(!ran.get());
}
