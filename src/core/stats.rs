use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::instance::SimulationInstance;

/// Swarm-wide counters as of the most recently completed tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StatsSnapshot {
    /// Completed ticks (or the restored baseline after a load).
    pub iterations: u64,
    pub total_living_cells: u64,
    /// Instances with at least one living cell.
    pub active_count: u64,
}

impl StatsSnapshot {
    /// Derive the counters directly from a collection.
    pub fn from_instances<'a>(
        iterations: u64,
        instances: impl IntoIterator<Item = &'a SimulationInstance>,
    ) -> Self {
        let mut snap = Self {
            iterations,
            ..Self::default()
        };
        for inst in instances {
            snap.total_living_cells += inst.living_cells() as u64;
            if inst.living_cells() > 0 {
                snap.active_count += 1;
            }
        }
        snap
    }
}

/// Contributions gathered while a tick fans out.
///
/// Workers finish in any order, so each one adds its instance with an atomic
/// add; nothing here is visible to readers until [`AggregateStats::publish_tick`].
#[derive(Debug, Default)]
pub struct TickTally {
    living: AtomicU64,
    active: AtomicU64,
    advanced: AtomicUsize,
}

impl TickTally {
    pub fn record(&self, living: usize) {
        self.living.fetch_add(living as u64, Ordering::Relaxed);
        if living > 0 {
            self.active.fetch_add(1, Ordering::Relaxed);
        }
        self.advanced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn advanced(&self) -> usize {
        self.advanced.load(Ordering::Relaxed)
    }
}

/// Published aggregate statistics.
///
/// Readers only ever see whole ticks: the tally is folded in under a single
/// write, after the fan-in barrier.
#[derive(Debug, Default)]
pub struct AggregateStats {
    published: RwLock<StatsSnapshot>,
}

impl AggregateStats {
    pub fn new(initial: StatsSnapshot) -> Self {
        Self {
            published: RwLock::new(initial),
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        *self.published.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fold a finished tick in. `iterations` moves by exactly one.
    pub fn publish_tick(&self, tally: &TickTally) -> StatsSnapshot {
        let mut published = self.published.write().unwrap_or_else(PoisonError::into_inner);
        *published = StatsSnapshot {
            iterations: published.iterations + 1,
            total_living_cells: tally.living.load(Ordering::Acquire),
            active_count: tally.active.load(Ordering::Acquire),
        };
        *published
    }

    /// Replace the published counters wholesale (used after a load).
    pub fn reset(&self, snapshot: StatsSnapshot) {
        *self.published.write().unwrap_or_else(PoisonError::into_inner) = snapshot;
    }
}
