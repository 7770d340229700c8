//! Where saved swarms go.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use lifeswarm::storage::{self, CollectionSnapshot, SaveFormat};

use crate::error::SwarmError;
use crate::paths::AppPaths;

/// Persistence collaborator: stores a whole collection as one unit.
pub trait SnapshotStore: Send + Sync {
    /// Returns a description of where the snapshot went.
    fn save(&self, snapshot: &CollectionSnapshot) -> Result<String, SwarmError>;
    /// The most recent snapshot and where it came from.
    fn load_latest(&self) -> Result<(CollectionSnapshot, String), SwarmError>;
}

/// One file per save under `<data_dir>/saves/`.
pub struct FileStore {
    paths: AppPaths,
    format: SaveFormat,
}

impl FileStore {
    pub fn new(paths: AppPaths, format: SaveFormat) -> Self {
        Self { paths, format }
    }

    fn next_free_path(&self) -> PathBuf {
        let mut millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        loop {
            let path = self.paths.save_file(millis, self.format);
            if !path.exists() {
                return path;
            }
            millis += 1;
        }
    }
}

impl SnapshotStore for FileStore {
    fn save(&self, snapshot: &CollectionSnapshot) -> Result<String, SwarmError> {
        let path = self.next_free_path();
        write_then_rename(&path, |w| Ok(storage::save_to(w, snapshot, self.format)?))?;
        Ok(path.display().to_string())
    }

    fn load_latest(&self) -> Result<(CollectionSnapshot, String), SwarmError> {
        let path = self
            .paths
            .latest_save()?
            .ok_or_else(|| SwarmError::NoSaves(self.paths.saves_dir()))?;
        let mut r = BufReader::new(File::open(&path)?);
        let snapshot = storage::load_from(&mut r)?;
        Ok((snapshot, path.display().to_string()))
    }
}

/// Write to `<path>.tmp` and rename into place, so a failed write never
/// leaves a truncated file under a save name. The temp file is removed on
/// error.
fn write_then_rename(
    path: &Path,
    write: impl FnOnce(&mut BufWriter<File>) -> Result<(), SwarmError>,
) -> Result<(), SwarmError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let written = File::create(&tmp)
        .map_err(SwarmError::from)
        .and_then(|file| write(&mut BufWriter::new(file)))
        .and_then(|()| fs::rename(&tmp, path).map_err(SwarmError::from));
    if written.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    written
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Keeps saves in memory; newest last.
    #[derive(Default)]
    pub struct MemoryStore {
        saves: Mutex<Vec<CollectionSnapshot>>,
    }

    impl MemoryStore {
        pub fn with(snapshot: CollectionSnapshot) -> Self {
            Self {
                saves: Mutex::new(vec![snapshot]),
            }
        }

        pub fn count(&self) -> usize {
            self.saves.lock().unwrap().len()
        }
    }

    impl SnapshotStore for MemoryStore {
        fn save(&self, snapshot: &CollectionSnapshot) -> Result<String, SwarmError> {
            let mut saves = self.saves.lock().unwrap();
            saves.push(snapshot.clone());
            Ok(format!("memory:{}", saves.len()))
        }

        fn load_latest(&self) -> Result<(CollectionSnapshot, String), SwarmError> {
            let saves = self.saves.lock().unwrap();
            saves
                .last()
                .cloned()
                .map(|s| (s, format!("memory:{}", saves.len())))
                .ok_or_else(|| SwarmError::NoSaves(PathBuf::from("memory")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifeswarm::prelude::*;
    use std::io::{self, Write as _};

    fn store(dir: &std::path::Path, format: SaveFormat) -> FileStore {
        FileStore::new(AppPaths::new(Some(dir.to_path_buf())).unwrap(), format)
    }

    #[test]
    fn load_without_saves_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(tmp.path(), SaveFormat::Json);
        assert!(matches!(store.load_latest(), Err(SwarmError::NoSaves(_))));
    }

    #[test]
    fn newest_save_wins() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(tmp.path(), SaveFormat::Lz4);

        let swarm = Swarm::random(4, &mut Prng::new(2));
        let first = CollectionSnapshot::capture(&swarm.snapshot_all());
        swarm.tick();
        let second = CollectionSnapshot::capture(&swarm.snapshot_all());

        let a = store.save(&first).unwrap();
        let b = store.save(&second).unwrap();
        assert_ne!(a, b);
        assert!(b.ends_with(".lsz"));

        let (loaded, from) = store.load_latest().unwrap();
        assert_eq!(from, b);
        assert_eq!(loaded, second);
    }

    #[test]
    fn json_saves_are_readable_by_any_store() {
        let tmp = tempfile::tempdir().unwrap();
        let swarm = Swarm::random(3, &mut Prng::new(8));
        let snap = CollectionSnapshot::capture(&swarm.snapshot_all());

        store(tmp.path(), SaveFormat::Json).save(&snap).unwrap();
        let (loaded, from) = store(tmp.path(), SaveFormat::Lz4).load_latest().unwrap();
        assert!(from.ends_with(".json"));
        assert_eq!(loaded, snap);
    }

    #[test]
    fn failed_write_leaves_previous_save_loadable() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(tmp.path(), SaveFormat::Json);
        let swarm = Swarm::random(3, &mut Prng::new(4));
        let snap = CollectionSnapshot::capture(&swarm.snapshot_all());
        let good = store.save(&snap).unwrap();

        let target = store.next_free_path();
        let result = write_then_rename(&target, |w| {
            w.write_all(br#"{"games": [{"size": 5, "cel"#)?;
            w.flush()?;
            Err(SwarmError::Io(io::Error::other("disk full")))
        });
        assert!(result.is_err());
        assert!(!target.exists());
        let leftovers = fs::read_dir(store.paths.saves_dir()).unwrap().count();
        assert_eq!(leftovers, 1);

        let (loaded, from) = store.load_latest().unwrap();
        assert_eq!(from, good);
        assert_eq!(loaded, snap);
    }

    #[test]
    fn stray_temp_files_are_not_saves() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(tmp.path(), SaveFormat::Json);
        let swarm = Swarm::random(2, &mut Prng::new(6));
        let snap = CollectionSnapshot::capture(&swarm.snapshot_all());
        let good = store.save(&snap).unwrap();

        // an interrupted save newer than the good one
        let mut stray = store.next_free_path().into_os_string();
        stray.push(".tmp");
        fs::write(&stray, b"{\"games\": [").unwrap();

        let (_, from) = store.load_latest().unwrap();
        assert_eq!(from, good);
    }

    #[test]
    fn corrupt_save_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(tmp.path(), SaveFormat::Json);
        fs::write(store.paths.save_file(1, SaveFormat::Json), b"{\"games\": [{\"size\": -3}]}")
            .unwrap();
        assert!(matches!(store.load_latest(), Err(SwarmError::Snapshot(_))));
    }
}
