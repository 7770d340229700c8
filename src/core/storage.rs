//! Save-file shape for a whole swarm.
//!
//! A save is `{"games": [{"size", "cells", "iteration_count"}, ...]}` as JSON,
//! optionally wrapped in a compressed frame:
//! - magic: `LSWARM01`
//! - version: u32 LE
//! - uncompressed_len: u32 LE
//! - LZ4 block of the JSON bytes
//!
//! Decoding detects the frame from the magic, so both kinds load the same way.

use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};

use crate::board::{Board, MAX_SIZE, MIN_SIZE};
use crate::instance::{InstanceId, SimulationInstance};

pub const MAGIC: &[u8; 8] = b"LSWARM01";
pub const VERSION_V1: u32 = 1;
pub const VERSION_CURRENT: u32 = VERSION_V1;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid save data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed snapshot: {0}")]
    Malformed(String),
    #[error("lz4 decompression failed")]
    Compression,
    #[error("unsupported save version {0}")]
    UnsupportedVersion(u32),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SaveFormat {
    #[default]
    Json,
    Lz4,
}

impl SaveFormat {
    pub fn extension(self) -> &'static str {
        match self {
            SaveFormat::Json => "json",
            SaveFormat::Lz4 => "lsz",
        }
    }
}

/// One saved board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedInstance {
    pub size: usize,
    pub cells: Vec<Vec<bool>>,
    pub iteration_count: u64,
}

impl SavedInstance {
    pub fn capture(inst: &SimulationInstance) -> Self {
        Self {
            size: inst.board().size(),
            cells: inst.board().to_rows(),
            iteration_count: inst.iteration_count(),
        }
    }

    fn to_board(&self, index: usize) -> Result<Board, SnapshotError> {
        if !(MIN_SIZE..=MAX_SIZE).contains(&self.size) {
            return Err(SnapshotError::Malformed(format!(
                "game {index}: size {} outside {MIN_SIZE}..={MAX_SIZE}",
                self.size
            )));
        }
        if self.cells.len() != self.size || self.cells.iter().any(|r| r.len() != self.size) {
            return Err(SnapshotError::Malformed(format!(
                "game {index}: cells do not form a {0}x{0} board",
                self.size
            )));
        }
        Board::from_rows(&self.cells)
            .ok_or_else(|| SnapshotError::Malformed(format!("game {index}: empty board")))
    }
}

/// Everything needed to rebuild a swarm.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSnapshot {
    pub games: Vec<SavedInstance>,
}

impl CollectionSnapshot {
    pub fn capture<'a>(instances: impl IntoIterator<Item = &'a SimulationInstance>) -> Self {
        Self {
            games: instances.into_iter().map(SavedInstance::capture).collect(),
        }
    }

    /// Validate every game and build fresh instances with ids `1..=n`.
    ///
    /// All or nothing: one bad game rejects the whole snapshot.
    pub fn into_instances(self) -> Result<Vec<SimulationInstance>, SnapshotError> {
        self.games
            .iter()
            .enumerate()
            .map(|(i, g)| {
                let board = g.to_board(i)?;
                Ok(SimulationInstance::resume(
                    InstanceId(i as u64 + 1),
                    board,
                    g.iteration_count,
                ))
            })
            .collect()
    }
}

pub fn encode(snapshot: &CollectionSnapshot, format: SaveFormat) -> Result<Vec<u8>, SnapshotError> {
    let json = serde_json::to_vec_pretty(snapshot)?;
    match format {
        SaveFormat::Json => Ok(json),
        SaveFormat::Lz4 => {
            let uncompressed_len = u32::try_from(json.len()).map_err(|_| {
                SnapshotError::Io(io::Error::new(io::ErrorKind::InvalidData, "save too large"))
            })?;
            let mut out = Vec::with_capacity(json.len() / 2 + 16);
            out.extend_from_slice(MAGIC);
            write_u32_le(&mut out, VERSION_CURRENT)?;
            write_u32_le(&mut out, uncompressed_len)?;
            out.extend_from_slice(&lz4_flex::compress(&json));
            Ok(out)
        }
    }
}

pub fn decode(bytes: &[u8]) -> Result<CollectionSnapshot, SnapshotError> {
    if !bytes.starts_with(MAGIC) {
        return Ok(serde_json::from_slice(bytes)?);
    }

    let mut r = &bytes[MAGIC.len()..];
    let version = read_u32_le(&mut r)?;
    if version != VERSION_V1 {
        return Err(SnapshotError::UnsupportedVersion(version));
    }
    let uncompressed_len = read_u32_le(&mut r)? as usize;
    let json =
        lz4_flex::decompress(r, uncompressed_len).map_err(|_| SnapshotError::Compression)?;
    Ok(serde_json::from_slice(&json)?)
}

pub fn save_to<W: Write>(
    w: &mut W,
    snapshot: &CollectionSnapshot,
    format: SaveFormat,
) -> Result<(), SnapshotError> {
    w.write_all(&encode(snapshot, format)?)?;
    w.flush()?;
    Ok(())
}

pub fn load_from<R: Read>(r: &mut R) -> Result<CollectionSnapshot, SnapshotError> {
    let mut buf = Vec::new();
    r.read_to_end(&mut buf)?;
    decode(&buf)
}

fn write_u32_le<W: Write>(w: &mut W, v: u32) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

fn read_u32_le<R: Read>(r: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}
