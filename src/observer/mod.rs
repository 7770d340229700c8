use crate::board::Board;
use crate::instance::{InstanceId, SimulationInstance};
use crate::stats::StatsSnapshot;
use crate::swarm::Swarm;
use crate::view::{ViewMode, ViewState};

/// A read-only copy of one instance, taken for display.
///
/// Observers cannot reach back into the swarm: the board is cloned at
/// snapshot time and the live instance keeps running independently.
#[derive(Debug, Clone)]
pub struct InstanceView {
    pub id: InstanceId,
    pub board: Board,
    pub iteration_count: u64,
    pub living_cells: usize,
}

impl From<&SimulationInstance> for InstanceView {
    fn from(inst: &SimulationInstance) -> Self {
        Self {
            id: inst.id(),
            board: inst.board().clone(),
            iteration_count: inst.iteration_count(),
            living_cells: inst.living_cells(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub mode: ViewMode,
    /// Zero-based.
    pub page: usize,
    pub page_count: usize,
    pub page_size: usize,
    pub paused: bool,
}

#[derive(Debug, Clone)]
pub struct PageSnapshot {
    pub instances: Vec<InstanceView>,
    pub stats: StatsSnapshot,
    pub page: PageInfo,
}

/// The display collaborator: draws one page. Must not assume it is called
/// from any particular thread.
pub trait PageRenderer: Send + Sync {
    fn render_page(&self, page: &PageSnapshot);
}

pub struct SwarmAdapter<'a> {
    swarm: &'a Swarm,
}

impl<'a> SwarmAdapter<'a> {
    pub fn new(swarm: &'a Swarm) -> Self {
        Self { swarm }
    }

    /// Snapshot the page `view` currently points at.
    pub fn page(&self, view: &ViewState, paused: bool) -> PageSnapshot {
        let (page, page_count) = view.position();
        let page_size = match view.mode() {
            ViewMode::SinglePage => view.page_size(),
            ViewMode::MultiGrid => view.multi_page_size(),
        };
        let instances = self
            .swarm
            .window(view.window())
            .iter()
            .map(InstanceView::from)
            .collect();

        PageSnapshot {
            instances,
            stats: self.swarm.stats(),
            page: PageInfo {
                mode: view.mode(),
                page,
                page_count,
                page_size,
                paused,
            },
        }
    }
}
