//! Daemon settings: `<data_dir>/config.json` first, then command-line flags.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use lifeswarm::storage::SaveFormat;
use serde::{Deserialize, Serialize};

use crate::error::SwarmError;
use crate::paths::AppPaths;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmConfig {
    pub total_games: usize,
    pub page_size: usize,
    pub multi_page_size: usize,
    pub tick_interval_ms: u64,
    pub multi_display_interval_ms: u64,
    pub poll_interval_ms: u64,
    /// Seed for the initial boards; time-derived when absent.
    pub seed: Option<u64>,
    /// Worker cap for one tick; all available cores when absent.
    pub max_parallelism: Option<usize>,
    /// Control socket address, e.g. `127.0.0.1:9877`.
    pub listen: Option<String>,
    pub compress_saves: bool,
    pub start_paused: bool,
    pub headless: bool,
    pub data_dir: Option<PathBuf>,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            total_games: 1000,
            page_size: 10,
            multi_page_size: 5,
            tick_interval_ms: 1000,
            multi_display_interval_ms: 500,
            poll_interval_ms: 100,
            seed: None,
            max_parallelism: None,
            listen: None,
            compress_saves: false,
            start_paused: false,
            headless: false,
            data_dir: None,
        }
    }
}

impl SwarmConfig {
    /// Read a config file. A missing file is not an error.
    pub fn from_file(path: &Path) -> Result<Option<Self>, SwarmError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| SwarmError::Config(format!("{}: {e}", path.display())))
    }

    pub fn apply_args(&mut self, args: &[String]) -> Result<(), SwarmError> {
        let mut it = args.iter();
        while let Some(flag) = it.next() {
            let mut value = || {
                it.next()
                    .ok_or_else(|| SwarmError::Config(format!("missing value for {flag}")))
            };
            match flag.as_str() {
                "--games" => self.total_games = parse(flag, value()?)?,
                "--page-size" => self.page_size = parse(flag, value()?)?,
                "--multi-page-size" => self.multi_page_size = parse(flag, value()?)?,
                "--tick-ms" => self.tick_interval_ms = parse(flag, value()?)?,
                "--multi-ms" => self.multi_display_interval_ms = parse(flag, value()?)?,
                "--poll-ms" => self.poll_interval_ms = parse(flag, value()?)?,
                "--seed" => self.seed = Some(parse(flag, value()?)?),
                "--threads" => self.max_parallelism = Some(parse(flag, value()?)?),
                "--listen" => self.listen = Some(value()?.clone()),
                "--data-dir" => self.data_dir = Some(PathBuf::from(value()?)),
                "--compress" => self.compress_saves = true,
                "--paused" => self.start_paused = true,
                "--headless" => self.headless = true,
                other => return Err(SwarmError::Config(format!("unknown argument: {other}"))),
            }
        }
        Ok(())
    }

    pub fn clamped(mut self) -> Self {
        self.page_size = self.page_size.max(1);
        self.multi_page_size = self.multi_page_size.max(1);
        self.tick_interval_ms = self.tick_interval_ms.max(1);
        self.multi_display_interval_ms = self.multi_display_interval_ms.max(1);
        self.poll_interval_ms = self.poll_interval_ms.max(1);
        self.max_parallelism = self.max_parallelism.map(|n| n.max(1));
        self
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn multi_display_interval(&self) -> Duration {
        Duration::from_millis(self.multi_display_interval_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn save_format(&self) -> SaveFormat {
        if self.compress_saves {
            SaveFormat::Lz4
        } else {
            SaveFormat::Json
        }
    }
}

fn parse<T: std::str::FromStr>(flag: &str, raw: &str) -> Result<T, SwarmError>
where
    T::Err: std::fmt::Display,
{
    raw.parse()
        .map_err(|e| SwarmError::Config(format!("bad value for {flag}: {e}")))
}

/// Work out the data directory, read its config file, then let the flags win.
pub fn resolve(args: &[String]) -> Result<(SwarmConfig, AppPaths), SwarmError> {
    let mut from_args = SwarmConfig::default();
    from_args.apply_args(args)?;
    let paths = AppPaths::new(from_args.data_dir.clone())?;

    let mut config = SwarmConfig::from_file(&paths.config_file())?.unwrap_or_default();
    config.apply_args(args)?;
    config.data_dir = Some(paths.data_dir().to_path_buf());
    Ok((config.clamped(), paths))
}
