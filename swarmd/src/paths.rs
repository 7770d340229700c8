//! Cross-platform application paths

use std::fs;
use std::path::{Path, PathBuf};

use lifeswarm::storage::SaveFormat;

use crate::error::SwarmError;

const SAVE_PREFIX: &str = "swarm_save_";

#[derive(Debug, Clone)]
pub struct AppPaths {
    data_dir: PathBuf,
}

impl AppPaths {
    /// Use `data_dir` if given, else the OS data directory plus `lifeswarm`.
    pub fn new(data_dir: Option<PathBuf>) -> Result<Self, SwarmError> {
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => Self::default_data_dir()?,
        };

        // Ensure directories exist
        fs::create_dir_all(data_dir.join("saves")).map_err(|e| {
            SwarmError::Paths(format!(
                "Failed to create data directory {}: {e}",
                data_dir.display()
            ))
        })?;

        Ok(Self { data_dir })
    }

    fn default_data_dir() -> Result<PathBuf, SwarmError> {
        let base = dirs::data_dir()
            .ok_or_else(|| SwarmError::Paths("Could not determine data directory".into()))?;
        Ok(base.join("lifeswarm"))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn saves_dir(&self) -> PathBuf {
        self.data_dir.join("saves")
    }

    pub fn config_file(&self) -> PathBuf {
        self.data_dir.join("config.json")
    }

    /// `swarm_save_<millis>.<ext>`; the zero padding keeps name order equal
    /// to time order.
    pub fn save_file(&self, unix_millis: u128, format: SaveFormat) -> PathBuf {
        self.saves_dir().join(format!(
            "{SAVE_PREFIX}{unix_millis:020}.{}",
            format.extension()
        ))
    }

    /// The newest save file, by name.
    pub fn latest_save(&self) -> Result<Option<PathBuf>, SwarmError> {
        let mut latest: Option<PathBuf> = None;
        for entry in fs::read_dir(self.saves_dir())? {
            let path = entry?.path();
            if !is_save_file(&path) {
                continue;
            }
            if latest.as_ref().map_or(true, |best| path.file_name() > best.file_name()) {
                latest = Some(path);
            }
        }
        Ok(latest)
    }
}

fn is_save_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let known_ext = [SaveFormat::Json, SaveFormat::Lz4]
        .iter()
        .any(|f| path.extension().and_then(|e| e.to_str()) == Some(f.extension()));
    name.starts_with(SAVE_PREFIX) && known_ext && path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_saves_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = AppPaths::new(Some(tmp.path().join("nested"))).unwrap();
        assert!(paths.saves_dir().is_dir());
        assert_eq!(paths.config_file(), tmp.path().join("nested").join("config.json"));
    }

    #[test]
    fn save_names_sort_by_time() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = AppPaths::new(Some(tmp.path().to_path_buf())).unwrap();
        let early = paths.save_file(999, SaveFormat::Json);
        let late = paths.save_file(1_000, SaveFormat::Lz4);
        assert!(early.file_name() < late.file_name());
        assert!(late.to_string_lossy().ends_with(".lsz"));
    }

    #[test]
    fn latest_save_ignores_other_files() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = AppPaths::new(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(paths.latest_save().unwrap(), None);

        let older = paths.save_file(5, SaveFormat::Json);
        let newer = paths.save_file(70, SaveFormat::Lz4);
        fs::write(&older, b"{}").unwrap();
        fs::write(&newer, b"{}").unwrap();
        fs::write(paths.saves_dir().join("notes.txt"), b"x").unwrap();
        fs::write(paths.saves_dir().join("swarm_save_99999999999999999999.bak"), b"x").unwrap();

        assert_eq!(paths.latest_save().unwrap(), Some(newer));
    }
}
