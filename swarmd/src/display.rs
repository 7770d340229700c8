//! Display path: the shared view state, the renderers, and the grid refresher.

use std::fmt::Write as _;
use std::io::Write as _;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use lifeswarm::observer::{InstanceView, PageRenderer, PageSnapshot, SwarmAdapter};
use lifeswarm::view::{ViewMode, ViewState};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::orchestrator::SwarmHandles;

const TOP_ROW: usize = 3;

/// Paging state shared between the router (writer) and every renderer
/// (readers). Reads take a whole copy under the lock.
#[derive(Clone)]
pub struct ViewHandle {
    inner: Arc<Mutex<ViewState>>,
}

impl ViewHandle {
    pub fn new(view: ViewState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(view)),
        }
    }

    pub fn snapshot(&self) -> ViewState {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut ViewState) -> R) -> R {
        let mut view = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut view)
    }
}

/// Snapshot the current page and hand it to the renderer.
pub fn render_current(handles: &SwarmHandles) {
    let view = handles.view.snapshot();
    let page = SwarmAdapter::new(&handles.swarm).page(&view, handles.gate.peek());
    handles.renderer.render_page(&page);
}

/// Clears the terminal and redraws the page on stdout.
pub struct TerminalRenderer;

impl PageRenderer for TerminalRenderer {
    fn render_page(&self, page: &PageSnapshot) {
        let frame = format_page(page);
        let mut out = std::io::stdout().lock();
        if let Err(e) = write!(out, "\x1b[2J\x1b[H{frame}").and_then(|_| out.flush()) {
            debug!("render failed: {e}");
        }
    }
}

/// One log line per page, for runs without a terminal.
pub struct LogRenderer;

impl PageRenderer for LogRenderer {
    fn render_page(&self, page: &PageSnapshot) {
        info!(
            mode = ?page.page.mode,
            page = page.page.page + 1,
            pages = page.page.page_count,
            paused = page.page.paused,
            iterations = page.stats.iterations,
            living = page.stats.total_living_cells,
            active = page.stats.active_count,
            "swarm"
        );
    }
}

pub fn format_page(page: &PageSnapshot) -> String {
    let info = &page.page;
    let paused = if info.paused { "   [paused]" } else { "" };
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Iterations: {}   Living cells: {}   Active games: {}",
        page.stats.iterations, page.stats.total_living_cells, page.stats.active_count
    );

    match info.mode {
        ViewMode::SinglePage => {
            let _ = writeln!(out, "Page {}/{}{paused}\n", info.page + 1, info.page_count);
            for inst in &page.instances {
                let size = inst.board.size();
                let _ = writeln!(
                    out,
                    "Game {:>6}   {size:>2}x{size:<2}   iteration {:>7}   living {:>5}",
                    inst.id.to_string(),
                    inst.iteration_count,
                    inst.living_cells
                );
            }
            out.push_str("\n[n] next  [p] prev  [m] grid  [space] pause  [s] save  [l] load  [q] quit\n");
        }
        ViewMode::MultiGrid => {
            let _ = writeln!(out, "Grid {}/{}{paused}\n", info.page + 1, info.page_count);
            let split = page.instances.len().min(TOP_ROW);
            let (top, bottom) = page.instances.split_at(split);
            for row in [top, bottom] {
                if !row.is_empty() {
                    write_board_row(&mut out, row);
                    out.push('\n');
                }
            }
            out.push_str("[n] next  [p] prev  [q] back  [space] pause  [s] save  [l] load\n");
        }
    }
    out
}

/// Boards side by side, each under a caption, shorter boards padded.
fn write_board_row(out: &mut String, views: &[InstanceView]) {
    let captions: Vec<String> = views
        .iter()
        .map(|v| format!("{} it {}", v.id, v.iteration_count))
        .collect();
    let widths: Vec<usize> = views
        .iter()
        .zip(&captions)
        .map(|(v, c)| v.board.size().max(c.len()))
        .collect();
    let height = views.iter().map(|v| v.board.size()).max().unwrap_or(0);

    let mut line = String::new();
    for (caption, &width) in captions.iter().zip(&widths) {
        let _ = write!(line, "{caption:<width$}  ");
    }
    out.push_str(line.trim_end());
    out.push('\n');

    for r in 0..height {
        line.clear();
        for (view, &width) in views.iter().zip(&widths) {
            let cells: String = if r < view.board.size() {
                (0..view.board.size())
                    .map(|c| if view.board.get(r, c) { '#' } else { '.' })
                    .collect()
            } else {
                String::new()
            };
            let _ = write!(line, "{cells:<width$}  ");
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
}

/// Redraw the board grid every `interval` until `cancel` fires or the view
/// leaves the grid.
pub fn spawn_multi_display(
    handles: SwarmHandles,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            if handles.view.snapshot().mode() != ViewMode::MultiGrid {
                break;
            }
            render_current(&handles);
        }
        debug!("grid display stopped");
    })
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use lifeswarm::observer::PageInfo;

    /// Keeps every page it is asked to draw.
    #[derive(Default)]
    pub struct RecordingRenderer {
        pages: Mutex<Vec<(PageInfo, u64)>>,
    }

    impl RecordingRenderer {
        pub fn pages(&self) -> Vec<(PageInfo, u64)> {
            self.pages.lock().unwrap().clone()
        }
    }

    impl PageRenderer for RecordingRenderer {
        fn render_page(&self, page: &PageSnapshot) {
            self.pages.lock().unwrap().push((page.page, page.stats.iterations));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingRenderer;
    use super::*;
    use crate::gate::PauseGate;
    use lifeswarm::prelude::*;

    fn handles(count: usize, renderer: Arc<RecordingRenderer>) -> SwarmHandles {
        let swarm = Arc::new(Swarm::random(count, &mut Prng::new(5)));
        SwarmHandles {
            view: ViewHandle::new(ViewState::new(swarm.len(), 4, 5)),
            swarm,
            gate: PauseGate::new(false),
            renderer,
            cancel: CancellationToken::new(),
        }
    }

    #[test]
    fn single_page_lists_games() {
        let swarm = Swarm::random(12, &mut Prng::new(1));
        let mut view = ViewState::new(swarm.len(), 5, 5);
        view.next_page();
        let text = format_page(&SwarmAdapter::new(&swarm).page(&view, true));

        assert!(text.contains("Page 2/3"));
        assert!(text.contains("[paused]"));
        assert_eq!(text.lines().filter(|l| l.starts_with("Game")).count(), 5);
        assert!(text.contains("#6"));
        assert!(!text.contains("#11"));
    }

    #[test]
    fn grid_puts_three_boards_on_top() {
        let boards = [6, 5, 7, 5, 8];
        let instances = boards
            .iter()
            .enumerate()
            .map(|(i, &n)| SimulationInstance::new(InstanceId(i as u64 + 1), Board::new(n)))
            .collect();
        let swarm = Swarm::new(instances, Box::new(ConwayRule));
        let mut view = ViewState::new(swarm.len(), 10, 5);
        view.enter_multi();
        let text = format_page(&SwarmAdapter::new(&swarm).page(&view, false));

        let captions: Vec<&str> = text.lines().filter(|l| l.starts_with("#")).collect();
        assert_eq!(captions.len(), 2);
        assert!(captions[0].contains("#1") && captions[0].contains("#3"));
        assert!(captions[1].contains("#4") && captions[1].contains("#5"));
        // top row is as tall as its tallest board
        let dotted = text.lines().filter(|l| l.contains('.')).count();
        assert_eq!(dotted, 7 + 8);
    }

    #[tokio::test]
    async fn grid_display_runs_until_cancelled() {
        let renderer = Arc::new(RecordingRenderer::default());
        let handles = handles(9, Arc::clone(&renderer));
        handles.view.update(|v| v.enter_multi());

        let cancel = CancellationToken::new();
        let task = spawn_multi_display(handles.clone(), Duration::from_millis(5), cancel.clone());
        tokio::time::sleep(Duration::from_millis(60)).await;
        cancel.cancel();
        task.await.unwrap();

        let pages = renderer.pages();
        assert!(pages.len() >= 2);
        assert!(pages.iter().all(|(p, _)| p.mode == ViewMode::MultiGrid && p.page_size == 5));

        let seen = pages.len();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(renderer.pages().len(), seen);
    }

    #[tokio::test]
    async fn grid_display_stops_when_view_leaves_grid() {
        let renderer = Arc::new(RecordingRenderer::default());
        let handles = handles(3, Arc::clone(&renderer));

        let task = spawn_multi_display(handles, Duration::from_millis(5), CancellationToken::new());
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("task should stop on its own")
            .unwrap();
        assert!(renderer.pages().is_empty());
    }
}
