//! Foreground command loop.
//!
//! Commands arrive on an mpsc channel from stdin, the control socket and the
//! Ctrl-C handler. The router owns the view state writes, the grid display
//! task and the shutdown sequence; it reaches the swarm only through
//! [`Swarm::replace`] on load and best-effort reads on save.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use lifeswarm::command::{Command, StatusReport};
use lifeswarm::instance::SimulationInstance;
use lifeswarm::stats::StatsSnapshot;
use lifeswarm::storage::CollectionSnapshot;
use lifeswarm::swarm::Swarm;
use lifeswarm::view::{ViewMode, ViewState};
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::display::{render_current, spawn_multi_display};
use crate::error::SwarmError;
use crate::orchestrator::SwarmHandles;
use crate::persist::SnapshotStore;

pub type Reply = oneshot::Sender<Result<Outcome, SwarmError>>;

/// A command plus, optionally, somewhere to send the result.
pub struct Envelope {
    pub command: Command,
    pub reply: Option<Reply>,
}

impl Envelope {
    /// A command nobody waits on (keyboard, Ctrl-C).
    pub fn fire(command: Command) -> Self {
        Self { command, reply: None }
    }

    pub fn with_reply(command: Command) -> (Self, oneshot::Receiver<Result<Outcome, SwarmError>>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                command,
                reply: Some(tx),
            },
            rx,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Paged { page: usize, page_count: usize },
    ViewChanged(ViewMode),
    Paused(bool),
    Saved { games: usize, location: String },
    Loaded { games: usize, iterations: u64 },
    Status(StatusReport),
    Stopped,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Paged { page, page_count } => write!(f, "page {}/{}", page + 1, page_count),
            Outcome::ViewChanged(ViewMode::SinglePage) => write!(f, "single view"),
            Outcome::ViewChanged(ViewMode::MultiGrid) => write!(f, "grid view"),
            Outcome::Paused(true) => write!(f, "paused"),
            Outcome::Paused(false) => write!(f, "resumed"),
            Outcome::Saved { games, location } => write!(f, "saved {games} games to {location}"),
            Outcome::Loaded { games, iterations } => {
                write!(f, "loaded {games} games at iteration {iterations}")
            }
            Outcome::Status(s) => write!(
                f,
                "{} games, iteration {}",
                s.instances, s.stats.iterations
            ),
            Outcome::Stopped => write!(f, "stopped"),
        }
    }
}

pub struct CommandRouter {
    handles: SwarmHandles,
    store: Arc<dyn SnapshotStore>,
    multi_interval: Duration,
    poll_interval: Duration,
    grid_task: Option<(CancellationToken, JoinHandle<()>)>,
    tick_task: Option<JoinHandle<()>>,
}

impl CommandRouter {
    pub fn new(
        handles: SwarmHandles,
        store: Arc<dyn SnapshotStore>,
        multi_interval: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            handles,
            store,
            multi_interval,
            poll_interval,
            grid_task: None,
            tick_task: None,
        }
    }

    /// Quit waits for this task before returning.
    pub fn attach_tick_task(&mut self, task: JoinHandle<()>) {
        self.tick_task = Some(task);
    }

    /// Poll for commands until Quit (or every sender is gone).
    pub async fn run(mut self, mut commands: mpsc::Receiver<Envelope>) {
        let mut poll = interval(self.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            poll.tick().await;
            loop {
                match commands.try_recv() {
                    Ok(envelope) => {
                        if self.dispatch(envelope).await {
                            return;
                        }
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        info!("command channel closed");
                        self.shutdown().await;
                        return;
                    }
                }
            }
        }
    }

    /// Returns true once the router has shut down.
    async fn dispatch(&mut self, envelope: Envelope) -> bool {
        let command = envelope.command;
        let result = self.execute(command).await;
        if let Err(e) = &result {
            match e {
                SwarmError::WrongMode(_) => info!(?command, "ignored: {e}"),
                _ => error!(?command, "{e}"),
            }
        }
        if let Some(reply) = envelope.reply {
            let _ = reply.send(result);
        }
        command == Command::Quit
    }

    pub async fn execute(&mut self, command: Command) -> Result<Outcome, SwarmError> {
        if let Some(required) = command.required_mode() {
            if self.handles.view.snapshot().mode() != required {
                return Err(SwarmError::WrongMode(required));
            }
        }

        match command {
            Command::NextPage => Ok(self.flip(|v| v.next_page())),
            Command::PrevPage => Ok(self.flip(|v| v.prev_page())),
            Command::MultiNextPage => Ok(self.flip(|v| v.multi_next_page())),
            Command::MultiPrevPage => Ok(self.flip(|v| v.multi_prev_page())),
            Command::ToggleMultiView => {
                self.handles.view.update(|v| v.enter_multi());
                let cancel = self.handles.cancel.child_token();
                let task =
                    spawn_multi_display(self.handles.clone(), self.multi_interval, cancel.clone());
                self.grid_task = Some((cancel, task));
                Ok(Outcome::ViewChanged(ViewMode::MultiGrid))
            }
            Command::ReturnToSingle => {
                self.stop_grid_task().await;
                self.handles.view.update(|v| v.leave_multi());
                render_current(&self.handles);
                Ok(Outcome::ViewChanged(ViewMode::SinglePage))
            }
            Command::TogglePause => {
                let paused = self.handles.gate.toggle().await;
                info!(paused, "pause toggled");
                Ok(Outcome::Paused(paused))
            }
            Command::SaveAll => self.save_all().await,
            Command::LoadAll => self.load_all().await,
            Command::Status => Ok(Outcome::Status(self.status())),
            Command::Quit => {
                self.shutdown().await;
                Ok(Outcome::Stopped)
            }
        }
    }

    fn flip(&self, step: impl FnOnce(&mut ViewState) -> usize) -> Outcome {
        let (page, page_count) = self.handles.view.update(|v| {
            step(v);
            v.position()
        });
        render_current(&self.handles);
        Outcome::Paged { page, page_count }
    }

    /// Best effort: the tick loop keeps running while instances are copied.
    async fn save_all(&self) -> Result<Outcome, SwarmError> {
        let swarm = Arc::clone(&self.handles.swarm);
        let store = Arc::clone(&self.store);
        let (games, location) = tokio::task::spawn_blocking(move || {
            let snapshot = CollectionSnapshot::capture(&swarm.snapshot_all());
            store.save(&snapshot).map(|at| (snapshot.games.len(), at))
        })
        .await??;
        info!(games, %location, "swarm saved");
        Ok(Outcome::Saved { games, location })
    }

    /// All or nothing: the snapshot is validated before the gate is taken,
    /// and the swap happens under the gate so no tick sees half of it.
    async fn load_all(&self) -> Result<Outcome, SwarmError> {
        let store = Arc::clone(&self.store);
        let (instances, from) = tokio::task::spawn_blocking(move || {
            let (snapshot, from) = store.load_latest()?;
            Ok::<_, SwarmError>((snapshot.into_instances()?, from))
        })
        .await??;

        let stats = {
            let _guard = self.handles.gate.exclusive().await;
            let stats = replace_blocking(&self.handles.swarm, instances).await?;
            let games = self.handles.swarm.len();
            self.handles.view.update(|v| v.set_total(games));
            stats
        };
        let games = self.handles.swarm.len();
        info!(games, iterations = stats.iterations, %from, "swarm loaded");

        if self.handles.view.snapshot().mode() == ViewMode::SinglePage {
            render_current(&self.handles);
        }
        Ok(Outcome::Loaded {
            games,
            iterations: stats.iterations,
        })
    }

    fn status(&self) -> StatusReport {
        let view = self.handles.view.snapshot();
        let (page, page_count) = view.position();
        StatusReport {
            paused: self.handles.gate.peek(),
            mode: view.mode(),
            page,
            page_count,
            instances: self.handles.swarm.len(),
            stats: self.handles.swarm.stats(),
        }
    }

    async fn stop_grid_task(&mut self) {
        if let Some((cancel, task)) = self.grid_task.take() {
            cancel.cancel();
            if let Err(e) = task.await {
                warn!("grid display ended badly: {e}");
            }
        }
    }

    async fn shutdown(&mut self) {
        info!("shutting down");
        self.handles.cancel.cancel();
        self.stop_grid_task().await;
        if let Some(task) = self.tick_task.take() {
            if let Err(e) = task.await {
                error!("tick loop ended badly: {e}");
            }
        }
    }
}

async fn replace_blocking(
    swarm: &Arc<Swarm>,
    instances: Vec<SimulationInstance>,
) -> Result<StatsSnapshot, SwarmError> {
    let swarm = Arc::clone(swarm);
    Ok(tokio::task::spawn_blocking(move || swarm.replace(instances)).await?)
}
