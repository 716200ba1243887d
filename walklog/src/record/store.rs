//! Walk storage backends.
//!
//! [`WalkStore`] is the persistence seam: saving finished walks, listing the
//! walk history and maintaining the set of explored tiles. Tile upserts
//! ignore conflicts, so storing the same tile twice is harmless and only new
//! tiles are counted.

use std::collections::BTreeSet;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use super::WalkRecord;
use crate::coord::TileKey;

const WALKS_DIR: &str = "walks";
const EXPLORED_TILES_FILE: &str = "explored_tiles.json";

/// Identifier of a stored walk.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WalkId(String);

impl WalkId {
    /// Wrap an identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors that can occur while reading or writing walk data.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Walk not found: {0}")]
    NotFound(WalkId),
}

/// Totals over everything a store holds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WalkStats {
    pub walk_count: usize,
    pub total_distance_m: f64,
    pub explored_tile_count: usize,
}

/// Persistence for walks and explored tiles.
pub trait WalkStore: Send + Sync {
    /// Store a finished walk and return its identifier.
    fn save_walk(&self, record: &WalkRecord) -> Result<WalkId, StoreError>;

    /// Load a previously saved walk.
    fn load_walk(&self, id: &WalkId) -> Result<WalkRecord, StoreError>;

    /// Add tiles to the explored set, ignoring ones already present.
    ///
    /// Returns how many tiles were newly explored.
    fn upsert_explored_tiles(&self, tiles: &[TileKey]) -> Result<usize, StoreError>;

    /// All explored tiles.
    fn explored_tiles(&self) -> Result<BTreeSet<TileKey>, StoreError>;

    /// Up to `limit` walks, most recently started first.
    fn list_walks(&self, limit: usize) -> Result<Vec<(WalkId, WalkRecord)>, StoreError>;

    /// Walk count, summed distance and explored tile count.
    fn stats(&self) -> Result<WalkStats, StoreError> {
        let walks = self.list_walks(usize::MAX)?;
        Ok(WalkStats {
            walk_count: walks.len(),
            total_distance_m: walks.iter().map(|(_, w)| w.total_distance_m).sum(),
            explored_tile_count: self.explored_tiles()?.len(),
        })
    }
}

/// Order walks newest first; ties go to the later identifier.
fn newest_first(walks: &mut [(WalkId, WalkRecord)]) {
    walks.sort_by(|(a_id, a), (b_id, b)| {
        b.started_at
            .cmp(&a.started_at)
            .then_with(|| b_id.cmp(a_id))
    });
}

#[derive(Debug, Default)]
struct MemoryInner {
    walks: Vec<WalkRecord>,
    tiles: BTreeSet<TileKey>,
}

/// In-memory store, used in tests and for dry runs.
#[derive(Debug, Default)]
pub struct MemoryWalkStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryWalkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored walks.
    pub fn walk_count(&self) -> usize {
        self.inner.lock().walks.len()
    }
}

impl WalkStore for MemoryWalkStore {
    fn save_walk(&self, record: &WalkRecord) -> Result<WalkId, StoreError> {
        let mut inner = self.inner.lock();
        inner.walks.push(record.clone());
        Ok(WalkId(format!("walk-{}", inner.walks.len())))
    }

    fn load_walk(&self, id: &WalkId) -> Result<WalkRecord, StoreError> {
        let inner = self.inner.lock();
        id.0.strip_prefix("walk-")
            .and_then(|n| n.parse::<usize>().ok())
            .and_then(|n| n.checked_sub(1))
            .and_then(|index| inner.walks.get(index).cloned())
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    fn upsert_explored_tiles(&self, tiles: &[TileKey]) -> Result<usize, StoreError> {
        let mut inner = self.inner.lock();
        Ok(tiles.iter().filter(|t| inner.tiles.insert(**t)).count())
    }

    fn explored_tiles(&self) -> Result<BTreeSet<TileKey>, StoreError> {
        Ok(self.inner.lock().tiles.clone())
    }

    fn list_walks(&self, limit: usize) -> Result<Vec<(WalkId, WalkRecord)>, StoreError> {
        let inner = self.inner.lock();
        let mut walks: Vec<_> = inner
            .walks
            .iter()
            .enumerate()
            .map(|(i, record)| (WalkId(format!("walk-{}", i + 1)), record.clone()))
            .collect();
        drop(inner);

        // "walk-10" sorts before "walk-9"; break ties on save order instead
        walks.sort_by(|(a_id, a), (b_id, b)| {
            b.started_at
                .cmp(&a.started_at)
                .then_with(|| memory_index(b_id).cmp(&memory_index(a_id)))
        });
        walks.truncate(limit);
        Ok(walks)
    }
}

fn memory_index(id: &WalkId) -> usize {
    id.0.strip_prefix("walk-")
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}

/// Store backed by a directory of JSON files.
///
/// ```text
/// <root>/
/// ├── walks/
/// │   └── 20240501T083000123Z.json
/// └── explored_tiles.json
/// ```
///
/// Files are written to a temporary path and renamed into place.
#[derive(Debug)]
pub struct JsonDirWalkStore {
    root: PathBuf,
    // Serialises read-modify-write of the explored tile file
    tiles_lock: Mutex<()>,
}

impl JsonDirWalkStore {
    /// Open a store rooted at `root`, creating the directories if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        let walks = root.join(WALKS_DIR);
        fs::create_dir_all(&walks).map_err(|source| StoreError::Io {
            path: walks.clone(),
            source,
        })?;

        debug!(root = %root.display(), "Opened walk store");
        Ok(Self {
            root,
            tiles_lock: Mutex::new(()),
        })
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the JSON file holding a walk.
    pub fn walk_path(&self, id: &WalkId) -> PathBuf {
        self.root.join(WALKS_DIR).join(format!("{}.json", id))
    }

    fn tiles_path(&self) -> PathBuf {
        self.root.join(EXPLORED_TILES_FILE)
    }

    fn next_walk_id(&self, record: &WalkRecord) -> WalkId {
        let base = record.started_at.format("%Y%m%dT%H%M%S%3fZ").to_string();
        let mut id = WalkId(base.clone());
        let mut suffix = 2;
        while self.walk_path(&id).exists() {
            id = WalkId(format!("{}-{}", base, suffix));
            suffix += 1;
        }
        id
    }
}

impl WalkStore for JsonDirWalkStore {
    fn save_walk(&self, record: &WalkRecord) -> Result<WalkId, StoreError> {
        let id = self.next_walk_id(record);
        write_json_atomic(&self.walk_path(&id), record)?;
        info!(
            id = %id,
            distance_m = format!("{:.1}", record.total_distance_m),
            points = record.point_count(),
            "Walk saved"
        );
        Ok(id)
    }

    fn load_walk(&self, id: &WalkId) -> Result<WalkRecord, StoreError> {
        if id.0.is_empty() || id.0.contains(['/', '\\']) || id.0.starts_with('.') {
            return Err(StoreError::NotFound(id.clone()));
        }
        let path = self.walk_path(id);
        if !path.exists() {
            return Err(StoreError::NotFound(id.clone()));
        }
        read_json(&path)
    }

    fn upsert_explored_tiles(&self, tiles: &[TileKey]) -> Result<usize, StoreError> {
        let _guard = self.tiles_lock.lock();

        let mut explored = self.explored_tiles()?;
        let added = tiles.iter().filter(|t| explored.insert(**t)).count();

        if added > 0 {
            write_json_atomic(&self.tiles_path(), &explored)?;
        }
        debug!(added, total = explored.len(), "Explored tiles updated");
        Ok(added)
    }

    fn explored_tiles(&self) -> Result<BTreeSet<TileKey>, StoreError> {
        let path = self.tiles_path();
        if !path.exists() {
            return Ok(BTreeSet::new());
        }
        read_json(&path)
    }

    fn list_walks(&self, limit: usize) -> Result<Vec<(WalkId, WalkRecord)>, StoreError> {
        let dir = self.root.join(WALKS_DIR);
        let io_err = |source| StoreError::Io {
            path: dir.clone(),
            source,
        };

        let mut walks = Vec::new();
        for entry in fs::read_dir(&dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            walks.push((WalkId::new(stem), read_json(&path)?));
        }

        newest_first(&mut walks);
        walks.truncate(limit);
        debug!(count = walks.len(), limit, "Listed walks");
        Ok(walks)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let file = File::open(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    let temp_path = path.with_extension("json.tmp");
    let file = File::create(&temp_path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);

    let written = serde_json::to_writer_pretty(&mut writer, value)
        .map_err(|source| StoreError::Json {
            path: temp_path.clone(),
            source,
        })
        .and_then(|()| writer.flush().map_err(io_err));
    drop(writer);

    let result = written.and_then(|()| fs::rename(&temp_path, path).map_err(io_err));
    if result.is_err() {
        // Best effort; report the write error
        let _ = fs::remove_file(&temp_path);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::LineString;
    use chrono::{TimeZone, Utc};

    fn record(started_secs: i64) -> WalkRecord {
        WalkRecord {
            started_at: Utc.timestamp_opt(started_secs, 0).unwrap(),
            ended_at: Utc.timestamp_opt(started_secs + 600, 0).unwrap(),
            total_distance_m: 842.5,
            total_time_sec: 600,
            route_geojson: LineString::new(vec![[139.7667, 35.6807], [139.7700, 35.6820]]),
            tile_keys: vec![TileKey::new(17, 116_423, 51_613)],
        }
    }

    fn tiles(keys: &[(i64, i64)]) -> Vec<TileKey> {
        keys.iter().map(|&(x, y)| TileKey::new(17, x, y)).collect()
    }

    #[test]
    fn test_memory_store_saves_and_loads() {
        let store = MemoryWalkStore::new();
        let id = store.save_walk(&record(1_700_000_000)).unwrap();
        assert_eq!(store.walk_count(), 1);
        assert_eq!(store.load_walk(&id).unwrap(), record(1_700_000_000));
        assert!(matches!(
            store.load_walk(&WalkId::new("walk-9")),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_memory_store_upsert_ignores_conflicts() {
        let store = MemoryWalkStore::new();
        assert_eq!(store.upsert_explored_tiles(&tiles(&[(1, 1), (1, 2)])).unwrap(), 2);
        assert_eq!(store.upsert_explored_tiles(&tiles(&[(1, 2), (1, 3)])).unwrap(), 1);
        assert_eq!(store.explored_tiles().unwrap().len(), 3);
    }

    #[test]
    fn test_json_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirWalkStore::open(dir.path()).unwrap();

        let id = store.save_walk(&record(1_700_000_000)).unwrap();
        assert_eq!(id.as_str(), "20231114T221320000Z");
        assert!(store.walk_path(&id).exists());
        assert_eq!(store.load_walk(&id).unwrap(), record(1_700_000_000));
    }

    #[test]
    fn test_json_store_unique_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirWalkStore::open(dir.path()).unwrap();

        let first = store.save_walk(&record(1_700_000_000)).unwrap();
        let second = store.save_walk(&record(1_700_000_000)).unwrap();
        assert_ne!(first, second);
        assert_eq!(second.as_str(), "20231114T221320000Z-2");
    }

    #[test]
    fn test_json_store_file_is_geojson() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirWalkStore::open(dir.path()).unwrap();
        let id = store.save_walk(&record(1_700_000_000)).unwrap();

        let raw = fs::read_to_string(store.walk_path(&id)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["route_geojson"]["type"], "LineString");
        assert_eq!(json["route_geojson"]["coordinates"][0][0], 139.7667);
        assert_eq!(json["tile_keys"][0], "17/116423/51613");
    }

    #[test]
    fn test_json_store_upserts_without_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirWalkStore::open(dir.path()).unwrap();
        assert!(store.explored_tiles().unwrap().is_empty());

        assert_eq!(store.upsert_explored_tiles(&tiles(&[(1, 1), (2, 2)])).unwrap(), 2);
        assert_eq!(store.upsert_explored_tiles(&tiles(&[(2, 2), (1, 1)])).unwrap(), 0);
        assert_eq!(store.upsert_explored_tiles(&tiles(&[(3, 3)])).unwrap(), 1);

        // Reopen to read back from disk
        let reopened = JsonDirWalkStore::open(dir.path()).unwrap();
        let explored = reopened.explored_tiles().unwrap();
        assert_eq!(explored.len(), 3);
        assert!(explored.contains(&TileKey::new(17, 3, 3)));
    }

    #[test]
    fn test_json_store_missing_walk() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirWalkStore::open(dir.path()).unwrap();
        assert!(matches!(
            store.load_walk(&WalkId::new("nope")),
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.load_walk(&WalkId::new("../explored_tiles")),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_memory_store_lists_newest_first() {
        let store = MemoryWalkStore::new();
        for started in [1_700_000_000, 1_700_100_000, 1_700_050_000] {
            store.save_walk(&record(started)).unwrap();
        }

        let walks = store.list_walks(10).unwrap();
        let ids: Vec<_> = walks.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["walk-2", "walk-3", "walk-1"]);

        assert_eq!(store.list_walks(1).unwrap().len(), 1);
        assert!(store.list_walks(0).unwrap().is_empty());
    }

    #[test]
    fn test_memory_store_stats() {
        let store = MemoryWalkStore::new();
        assert_eq!(store.stats().unwrap(), WalkStats::default());

        store.save_walk(&record(1_700_000_000)).unwrap();
        store.save_walk(&record(1_700_100_000)).unwrap();
        store.upsert_explored_tiles(&tiles(&[(1, 1), (1, 2), (1, 3)])).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.walk_count, 2);
        assert!((stats.total_distance_m - 1685.0).abs() < 1e-9);
        assert_eq!(stats.explored_tile_count, 3);
    }

    #[test]
    fn test_json_store_lists_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirWalkStore::open(dir.path()).unwrap();
        assert!(store.list_walks(10).unwrap().is_empty());

        let oldest = store.save_walk(&record(1_700_000_000)).unwrap();
        let newest = store.save_walk(&record(1_700_100_000)).unwrap();
        let middle = store.save_walk(&record(1_700_050_000)).unwrap();
        let same_start = store.save_walk(&record(1_700_050_000)).unwrap();

        // Stray files in the walks directory are skipped
        fs::write(dir.path().join(WALKS_DIR).join("notes.txt"), "hi").unwrap();

        let ids: Vec<_> = store
            .list_walks(10)
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec![newest.clone(), same_start, middle, oldest]);

        let limited = store.list_walks(1).unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].0, newest);
        assert_eq!(limited[0].1, record(1_700_100_000));
    }

    #[test]
    fn test_json_store_stats() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirWalkStore::open(dir.path()).unwrap();
        store.save_walk(&record(1_700_000_000)).unwrap();
        store.save_walk(&record(1_700_100_000)).unwrap();
        store.upsert_explored_tiles(&tiles(&[(1, 1), (2, 2)])).unwrap();

        let stats = JsonDirWalkStore::open(dir.path()).unwrap().stats().unwrap();
        assert_eq!(stats.walk_count, 2);
        assert!((stats.total_distance_m - 1685.0).abs() < 1e-9);
        assert_eq!(stats.explored_tile_count, 2);
    }

    #[test]
    fn test_failed_write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("values.json");

        // JSON object keys must be strings
        let mut bad = std::collections::BTreeMap::new();
        bad.insert(vec![1u8], 1u8);

        assert!(matches!(
            write_json_atomic(&target, &bad),
            Err(StoreError::Json { .. })
        ));
        assert!(!target.exists());
        assert!(!dir.path().join("values.json.tmp").exists());
    }

    #[test]
    fn test_failed_rename_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        // Renaming a file onto a non-empty directory fails
        let target = dir.path().join("taken.json");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("inside"), "x").unwrap();

        assert!(matches!(
            write_json_atomic(&target, &[1, 2, 3]),
            Err(StoreError::Io { .. })
        ));
        assert!(!dir.path().join("taken.json.tmp").exists());
    }

    #[test]
    fn test_json_store_corrupt_tiles_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirWalkStore::open(dir.path()).unwrap();
        fs::write(dir.path().join(EXPLORED_TILES_FILE), "not json").unwrap();
        assert!(matches!(
            store.explored_tiles(),
            Err(StoreError::Json { .. })
        ));
    }
}
