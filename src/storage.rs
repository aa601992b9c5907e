//! Persistence of the tile collection.
//!
//! Tiles are stored as one JSON record under a fixed key. The record is
//! versioned:
//!
//! - v1: a bare array of tiles, where `metadata` and `viewMode` may be
//!   missing (written by earlier versions of the dashboard).
//! - v2: `{"version": 2, "tiles": [...]}` with every field present.
//!
//! Older records are migrated one version at a time when loaded. The
//! upgraded form is only written back on the next regular save. Records
//! from a newer schema are never migrated down; see [`TileStorage::restore`].

use crate::config::{SAVE_DEBOUNCE_MS, STORAGE_KEY};
use crate::debounce::Debouncer;
use crate::layout::default_tiles;
use crate::{ChartKind, Tile, TileId, TileLayout, TileMetadata, ViewMode};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Schema version written by [`encode`].
pub const SCHEMA_VERSION: u32 = 2;

#[derive(Debug, Clone, PartialEq)]
pub enum StorageError {
    /// No storage backend (no window, or storage disabled by the browser).
    Unavailable,
    Read(String),
    Write(String),
    Parse(String),
    UnsupportedVersion(u32),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Unavailable => write!(f, "Local storage is not available"),
            StorageError::Read(msg) => write!(f, "Failed to read saved grid: {}", msg),
            StorageError::Write(msg) => write!(f, "Failed to write grid: {}", msg),
            StorageError::Parse(msg) => write!(f, "Saved grid is not valid: {}", msg),
            StorageError::UnsupportedVersion(v) => {
                write!(f, "Saved grid uses unknown schema version {}", v)
            }
        }
    }
}

impl std::error::Error for StorageError {}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Parse(err.to_string())
    }
}

#[derive(Serialize)]
struct PersistedGridRef<'a> {
    version: u32,
    tiles: &'a [Tile],
}

#[derive(Serialize, Deserialize)]
struct PersistedGrid {
    version: u32,
    tiles: Vec<Tile>,
}

/// Tile as written by schema v1.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyTile {
    id: TileId,
    #[serde(rename = "type")]
    kind: ChartKind,
    layout: TileLayout,
    metadata: Option<TileMetadata>,
    view_mode: Option<ViewMode>,
}

impl From<LegacyTile> for Tile {
    fn from(legacy: LegacyTile) -> Self {
        Tile {
            id: legacy.id,
            kind: legacy.kind,
            layout: legacy.layout,
            metadata: legacy
                .metadata
                .unwrap_or_else(|| TileMetadata::default_for(legacy.kind)),
            view_mode: legacy.view_mode.unwrap_or_default(),
        }
    }
}

/// Serialize tiles into the current schema.
pub fn encode(tiles: &[Tile]) -> Result<String, StorageError> {
    let record = PersistedGridRef {
        version: SCHEMA_VERSION,
        tiles,
    };
    Ok(serde_json::to_string(&record)?)
}

/// Parse a stored record of any known schema version.
pub fn decode(raw: &str) -> Result<Vec<Tile>, StorageError> {
    let mut value: Value = serde_json::from_str(raw)?;
    let mut version = schema_version(&value)?;

    if version > SCHEMA_VERSION {
        return Err(StorageError::UnsupportedVersion(version));
    }
    while version < SCHEMA_VERSION {
        info!("Migrating saved grid from schema v{}", version);
        value = migrate(version, value)?;
        version += 1;
    }

    let grid: PersistedGrid = serde_json::from_value(value)?;
    Ok(grid.tiles)
}

fn schema_version(value: &Value) -> Result<u32, StorageError> {
    match value {
        Value::Array(_) => Ok(1),
        Value::Object(map) => map
            .get("version")
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| StorageError::Parse("missing schema version".to_string())),
        _ => Err(StorageError::Parse(
            "expected a tile array or versioned record".to_string(),
        )),
    }
}

/// Upgrade a record from `from` to `from + 1`.
fn migrate(from: u32, value: Value) -> Result<Value, StorageError> {
    match from {
        1 => {
            let legacy: Vec<LegacyTile> = serde_json::from_value(value)?;
            let tiles: Vec<Tile> = legacy.into_iter().map(Tile::from).collect();
            Ok(serde_json::to_value(PersistedGrid { version: 2, tiles })?)
        }
        other => Err(StorageError::UnsupportedVersion(other)),
    }
}

/// Key-value backend holding the saved grid.
///
/// Implementors only provide raw access to the single stored record;
/// encoding, migration and failure policy live in the provided methods.
pub trait TileStorage {
    fn read_raw(&self) -> Result<Option<String>, StorageError>;
    fn write_raw(&self, value: &str) -> Result<(), StorageError>;
    fn remove_raw(&self) -> Result<(), StorageError>;

    /// Decoded record, `Ok(None)` when nothing is stored.
    fn load_record(&self) -> Result<Option<Vec<Tile>>, StorageError> {
        match self.read_raw()? {
            Some(raw) => decode(&raw).map(Some),
            None => Ok(None),
        }
    }

    /// Saved tiles, or `None` when nothing usable is stored.
    ///
    /// Corrupt or foreign records are logged and reported as `None`.
    fn load(&self) -> Option<Vec<Tile>> {
        self.load_record().unwrap_or_else(|e| {
            log_load_failure(&e);
            None
        })
    }

    /// Tiles to start a session with.
    ///
    /// Falls back to the starter tiles when nothing usable is stored. A
    /// record written by a newer schema is left alone until the user
    /// changes the grid.
    fn restore(&self) -> Restored {
        match self.load_record() {
            Ok(Some(tiles)) => Restored {
                tiles,
                keep_record: false,
            },
            Ok(None) => Restored {
                tiles: default_tiles(),
                keep_record: false,
            },
            Err(e) => {
                log_load_failure(&e);
                Restored {
                    tiles: default_tiles(),
                    keep_record: matches!(e, StorageError::UnsupportedVersion(_)),
                }
            }
        }
    }

    fn save(&self, tiles: &[Tile]) -> Result<(), StorageError> {
        let raw = encode(tiles)?;
        self.write_raw(&raw)
    }

    fn reset(&self) -> Result<(), StorageError> {
        self.remove_raw()
    }
}

fn log_load_failure(err: &StorageError) {
    match err {
        StorageError::Parse(_) | StorageError::UnsupportedVersion(_) => {
            error!("Failed to parse saved grid configuration: {}", err)
        }
        _ => warn!("{}", err),
    }
}

/// Starting point of a session, see [`TileStorage::restore`].
#[derive(Debug, Clone, PartialEq)]
pub struct Restored {
    pub tiles: Vec<Tile>,
    /// The stored record must not be overwritten by the initial save.
    pub keep_record: bool,
}

/// Browser `localStorage` under a fixed key.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalTileStorage {
    key: String,
}

impl LocalTileStorage {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    fn storage(&self) -> Result<web_sys::Storage, StorageError> {
        web_sys::window()
            .ok_or(StorageError::Unavailable)?
            .local_storage()
            .map_err(|e| StorageError::Read(format!("{:?}", e)))?
            .ok_or(StorageError::Unavailable)
    }
}

impl Default for LocalTileStorage {
    fn default() -> Self {
        Self::new(STORAGE_KEY)
    }
}

impl TileStorage for LocalTileStorage {
    fn read_raw(&self) -> Result<Option<String>, StorageError> {
        self.storage()?
            .get_item(&self.key)
            .map_err(|e| StorageError::Read(format!("{:?}", e)))
    }

    fn write_raw(&self, value: &str) -> Result<(), StorageError> {
        self.storage()?
            .set_item(&self.key, value)
            .map_err(|e| StorageError::Write(format!("{:?}", e)))
    }

    fn remove_raw(&self) -> Result<(), StorageError> {
        self.storage()?
            .remove_item(&self.key)
            .map_err(|e| StorageError::Write(format!("{:?}", e)))
    }
}

/// In-process storage for tests and non-browser hosts.
#[derive(Debug, Default)]
pub struct MemoryTileStorage {
    record: RefCell<Option<String>>,
}

impl MemoryTileStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            record: RefCell::new(Some(raw.into())),
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.record.borrow().clone()
    }
}

impl TileStorage for MemoryTileStorage {
    fn read_raw(&self) -> Result<Option<String>, StorageError> {
        Ok(self.record.borrow().clone())
    }

    fn write_raw(&self, value: &str) -> Result<(), StorageError> {
        self.record.replace(Some(value.to_string()));
        Ok(())
    }

    fn remove_raw(&self) -> Result<(), StorageError> {
        self.record.replace(None);
        Ok(())
    }
}

/// Collapses bursts of saves into one write per quiet period.
///
/// Each call to [`DebouncedSaver::schedule`] replaces the pending timer, so
/// only the latest tiles are written once `delay_ms` passes without a new
/// call.
pub struct DebouncedSaver {
    storage: Rc<dyn TileStorage>,
    debouncer: Debouncer,
}

impl DebouncedSaver {
    pub fn new(storage: Rc<dyn TileStorage>) -> Self {
        Self::with_delay(storage, SAVE_DEBOUNCE_MS)
    }

    pub fn with_delay(storage: Rc<dyn TileStorage>, delay_ms: u32) -> Self {
        Self {
            storage,
            debouncer: Debouncer::new(delay_ms),
        }
    }

    pub fn schedule(&self, tiles: Vec<Tile>) {
        let storage = self.storage.clone();
        self.debouncer.call(move || {
            debug!("Saving {} tiles", tiles.len());
            if let Err(e) = storage.save(&tiles) {
                warn!("{}", e);
            }
        });
    }

    pub fn cancel(&self) {
        self.debouncer.cancel();
    }

    /// Drop any pending write and clear the stored record.
    pub fn reset(&self) {
        self.cancel();
        info!("Clearing saved grid");
        if let Err(e) = self.storage.reset() {
            warn!("{}", e);
        }
    }
}
