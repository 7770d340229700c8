use std::path::PathBuf;

use lifeswarm::storage::SnapshotError;
use lifeswarm::view::ViewMode;

#[derive(Debug, thiserror::Error)]
pub enum SwarmError {
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no saved games found in {}", .0.display())]
    NoSaves(PathBuf),
    #[error("{0}")]
    Paths(String),
    #[error("invalid config: {0}")]
    Config(String),
    #[error("command needs the {0:?} view")]
    WrongMode(ViewMode),
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("daemon is shutting down")]
    ShuttingDown,
}
