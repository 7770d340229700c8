//! The collection of simulation instances and its barrier-synchronised tick.
//!
//! Locking layout:
//! - the instance list sits behind an `RwLock`; ticks, saves and page reads
//!   share it, and only a wholesale [`Swarm::replace`] takes it exclusively
//! - every instance has its own `Mutex`, held by exactly one worker while it
//!   advances, so a concurrent save or page read sees it either before or
//!   after a whole generation

use std::ops::Range;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::board::{Automaton, Board, ConwayRule, RuleFault, MAX_SIZE, MIN_SIZE};
use crate::instance::{InstanceId, SimulationInstance};
use crate::prng::Prng;
use crate::stats::{AggregateStats, StatsSnapshot, TickTally};

/// One instance that could not advance during a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceFault {
    pub id: InstanceId,
    pub fault: RuleFault,
}

/// What a completed tick did.
#[derive(Debug, Clone)]
pub struct TickReport {
    pub stats: StatsSnapshot,
    pub advanced: usize,
    pub faults: Vec<InstanceFault>,
}

pub struct Swarm {
    instances: RwLock<Vec<Mutex<SimulationInstance>>>,
    stats: AggregateStats,
    rule: Box<dyn Automaton>,
    max_parallelism: usize,
}

impl Swarm {
    pub fn new(instances: Vec<SimulationInstance>, rule: Box<dyn Automaton>) -> Self {
        let stats = AggregateStats::new(StatsSnapshot::from_instances(0, &instances));
        let max_parallelism = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            instances: RwLock::new(instances.into_iter().map(Mutex::new).collect()),
            stats,
            rule,
            max_parallelism,
        }
    }

    /// `count` random boards under Conway's rule, sizes uniform in
    /// `MIN_SIZE..=MAX_SIZE`.
    pub fn random(count: usize, rng: &mut Prng) -> Self {
        Self::new(random_instances(count, rng), Box::new(ConwayRule))
    }

    /// Upper bound on worker threads when advancing without rayon.
    /// `1` advances sequentially, in collection order.
    pub fn set_max_parallelism(&mut self, threads: usize) {
        self.max_parallelism = threads.max(1);
    }

    pub fn max_parallelism(&self) -> usize {
        self.max_parallelism
    }

    pub fn len(&self) -> usize {
        self.read_instances().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Advance every instance once and publish the tick's statistics.
    ///
    /// Returns only after every instance has finished (or faulted); faulted
    /// instances are left as they were and do not contribute to the totals.
    pub fn tick(&self) -> TickReport {
        let instances = self.read_instances();
        let tally = TickTally::default();
        let faults = self.advance_all(&instances, &tally);
        let stats = self.stats.publish_tick(&tally);
        TickReport {
            stats,
            advanced: tally.advanced(),
            faults,
        }
    }

    #[cfg(feature = "parallel")]
    fn advance_all(
        &self,
        instances: &[Mutex<SimulationInstance>],
        tally: &TickTally,
    ) -> Vec<InstanceFault> {
        let rule = self.rule.as_ref();
        if self.max_parallelism <= 1 {
            return instances
                .iter()
                .filter_map(|slot| advance_slot(slot, rule, tally))
                .collect();
        }
        instances
            .par_iter()
            .filter_map(|slot| advance_slot(slot, rule, tally))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn advance_all(
        &self,
        instances: &[Mutex<SimulationInstance>],
        tally: &TickTally,
    ) -> Vec<InstanceFault> {
        let rule = self.rule.as_ref();
        let threads = self.max_parallelism.min(instances.len()).max(1);
        if threads <= 1 {
            return instances
                .iter()
                .filter_map(|slot| advance_slot(slot, rule, tally))
                .collect();
        }

        let chunk = instances.len().div_ceil(threads);
        std::thread::scope(|scope| {
            let workers: Vec<_> = instances
                .chunks(chunk)
                .map(|segment| {
                    let worker = scope.spawn(move || {
                        segment
                            .iter()
                            .filter_map(|slot| advance_slot(slot, rule, tally))
                            .collect::<Vec<_>>()
                    });
                    (segment, worker)
                })
                .collect();

            let mut faults = Vec::new();
            for (segment, worker) in workers {
                match worker.join() {
                    Ok(mut f) => faults.append(&mut f),
                    // Died outside the rule; fault the whole chunk.
                    Err(_) => faults.extend(segment.iter().map(|slot| InstanceFault {
                        id: lock_instance(slot).id(),
                        fault: RuleFault::new("worker panicked"),
                    })),
                }
            }
            faults
        })
    }

    /// Swap in a new collection wholesale and re-derive the statistics.
    ///
    /// `iterations` restarts at the largest iteration count among the new
    /// instances; they are independent clocks, so their sum means nothing.
    pub fn replace(&self, instances: Vec<SimulationInstance>) -> StatsSnapshot {
        let baseline = instances
            .iter()
            .map(SimulationInstance::iteration_count)
            .max()
            .unwrap_or(0);
        let stats = StatsSnapshot::from_instances(baseline, &instances);

        let mut slot = self.instances.write().unwrap_or_else(PoisonError::into_inner);
        *slot = instances.into_iter().map(Mutex::new).collect();
        self.stats.reset(stats);
        stats
    }

    /// Clone every instance, one lock at a time.
    ///
    /// This does not stop a tick in flight, so instances may straddle two
    /// generations; each one is still internally consistent.
    pub fn snapshot_all(&self) -> Vec<SimulationInstance> {
        self.read_instances()
            .iter()
            .map(|slot| lock_instance(slot).clone())
            .collect()
    }

    /// Clone the instances in `range`, clamped to the collection.
    pub fn window(&self, range: Range<usize>) -> Vec<SimulationInstance> {
        let instances = self.read_instances();
        let end = range.end.min(instances.len());
        let start = range.start.min(end);
        instances[start..end]
            .iter()
            .map(|slot| lock_instance(slot).clone())
            .collect()
    }

    fn read_instances(&self) -> RwLockReadGuard<'_, Vec<Mutex<SimulationInstance>>> {
        self.instances.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Fresh random instances with ids `1..=count`.
pub fn random_instances(count: usize, rng: &mut Prng) -> Vec<SimulationInstance> {
    (0..count)
        .map(|i| {
            let size = rng.gen_inclusive(MIN_SIZE, MAX_SIZE);
            SimulationInstance::new(InstanceId(i as u64 + 1), Board::random(size, rng))
        })
        .collect()
}

fn lock_instance(slot: &Mutex<SimulationInstance>) -> MutexGuard<'_, SimulationInstance> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

fn advance_slot(
    slot: &Mutex<SimulationInstance>,
    rule: &dyn Automaton,
    tally: &TickTally,
) -> Option<InstanceFault> {
    let mut inst = lock_instance(slot);
    let id = inst.id();
    // A panicking rule faults its own instance only; `advance` has not
    // touched the instance yet when the rule unwinds.
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| inst.advance(rule)))
        .unwrap_or_else(|_| Err(RuleFault::new("rule panicked")));
    match outcome {
        Ok(living) => {
            tally.record(living);
            None
        }
        Err(fault) => Some(InstanceFault { id, fault }),
    }
}
