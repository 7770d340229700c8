//! # lifeswarm
//!
//! Many independent Game of Life boards advanced together, one barrier-synchronised
//! tick at a time, with swarm-wide statistics that only ever reflect whole ticks.
//!
//! ## Quick Start
//!
//! ```
//! use lifeswarm::prelude::*;
//!
//! let mut rng = Prng::new(42);
//! let swarm = Swarm::random(100, &mut rng);
//!
//! let report = swarm.tick();
//! assert_eq!(report.stats.iterations, 1);
//!
//! let view = ViewState::new(swarm.len(), 10, 5);
//! let page = SwarmAdapter::new(&swarm).page(&view, false);
//! assert_eq!(page.instances.len(), 10);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` (default): save files and the wire form of commands
//! - `parallel`: advance instances on rayon's pool instead of scoped threads
//!
//! ## Modules
//!
//! - [`board`]: boards and the automaton rule
//! - [`swarm`]: the collection and its tick
//! - [`view`]: paging state
//! - [`storage`]: save-file shape and encoding
//! - [`observer`]: read-only snapshots for display

#[path = "core/board.rs"]
pub mod board;

#[path = "core/prng.rs"]
pub mod prng;

#[path = "core/instance.rs"]
pub mod instance;

#[path = "core/stats.rs"]
pub mod stats;

#[path = "core/swarm.rs"]
pub mod swarm;

#[path = "core/view.rs"]
pub mod view;

#[path = "core/command.rs"]
pub mod command;

#[cfg(feature = "serde")]
#[path = "core/storage.rs"]
pub mod storage;

pub mod observer;

/// Prelude module for convenient imports.
///
/// ```
/// use lifeswarm::prelude::*;
/// ```
pub mod prelude {
    pub use crate::board::{Automaton, Board, ConwayRule, RuleFault, MAX_SIZE, MIN_SIZE};
    pub use crate::command::{Command, Response, StatusReport};
    pub use crate::instance::{InstanceId, SimulationInstance};
    pub use crate::observer::{InstanceView, PageInfo, PageRenderer, PageSnapshot, SwarmAdapter};
    pub use crate::prng::Prng;
    pub use crate::stats::StatsSnapshot;
    pub use crate::swarm::{InstanceFault, Swarm, TickReport};
    pub use crate::view::{ViewMode, ViewState};
}
