//! Background tick loop.

use std::sync::Arc;
use std::time::Duration;

use lifeswarm::observer::PageRenderer;
use lifeswarm::swarm::{Swarm, TickReport};
use lifeswarm::view::ViewMode;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::display::{render_current, ViewHandle};
use crate::gate::PauseGate;

/// State shared by the tick loop, the router and the display tasks.
///
/// Everything is a handle; nobody holds a reference back to its owner.
#[derive(Clone)]
pub struct SwarmHandles {
    pub swarm: Arc<Swarm>,
    pub view: ViewHandle,
    pub gate: PauseGate,
    pub renderer: Arc<dyn PageRenderer>,
    pub cancel: CancellationToken,
}

pub struct Orchestrator {
    handles: SwarmHandles,
    interval: Duration,
}

impl Orchestrator {
    pub fn new(handles: SwarmHandles, interval: Duration) -> Self {
        Self { handles, interval }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(self) {
        let cancel = self.handles.cancel.clone();
        info!(interval_ms = self.interval.as_millis() as u64, "tick loop started");

        while !cancel.is_cancelled() {
            let started = Instant::now();
            self.tick_once().await;

            if self.handles.view.snapshot().mode() == ViewMode::SinglePage {
                render_current(&self.handles);
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sleep_until(started + self.interval) => {}
            }
        }
        info!("tick loop stopped");
    }

    /// One tick under the pause gate. `None` when paused.
    pub async fn tick_once(&self) -> Option<TickReport> {
        let guard = self.handles.gate.exclusive().await;
        if guard.is_paused() {
            return None;
        }

        let swarm = Arc::clone(&self.handles.swarm);
        let report = match tokio::task::spawn_blocking(move || swarm.tick()).await {
            Ok(report) => report,
            Err(e) => {
                error!("tick failed: {e}");
                return None;
            }
        };
        drop(guard);

        for fault in &report.faults {
            warn!(instance = %fault.id, "skipped this tick: {}", fault.fault);
        }
        debug!(
            iterations = report.stats.iterations,
            living = report.stats.total_living_cells,
            active = report.stats.active_count,
            advanced = report.advanced,
            "tick complete"
        );
        Some(report)
    }
}
