use crate::prng::Prng;

/// Smallest board edge a simulation instance may use.
pub const MIN_SIZE: usize = 5;

/// Largest board edge a simulation instance may use.
pub const MAX_SIZE: usize = 40;

/// Square grid of cells, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    size: usize,
    cells: Vec<bool>,
}

impl Board {
    /// An all-dead board.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![false; size * size],
        }
    }

    /// A board where every cell is alive with probability 1/2.
    pub fn random(size: usize, rng: &mut Prng) -> Self {
        let cells = (0..size * size).map(|_| rng.gen_bool()).collect();
        Self { size, cells }
    }

    /// Build a board from explicit rows. Returns `None` unless the rows form a
    /// non-empty square.
    pub fn from_rows(rows: &[Vec<bool>]) -> Option<Self> {
        let size = rows.len();
        if size == 0 || rows.iter().any(|r| r.len() != size) {
            return None;
        }
        Some(Self {
            size,
            cells: rows.iter().flatten().copied().collect(),
        })
    }

    /// Parse a picture like `[".#.", "###", "..."]`; `#` or `O` is alive.
    pub fn from_pattern(lines: &[&str]) -> Option<Self> {
        let rows: Vec<Vec<bool>> = lines
            .iter()
            .map(|l| l.chars().map(|c| c == '#' || c == 'O').collect())
            .collect();
        Self::from_rows(&rows)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> bool {
        row < self.size && col < self.size && self.cells[row * self.size + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, alive: bool) {
        if row < self.size && col < self.size {
            self.cells[row * self.size + col] = alive;
        }
    }

    pub fn living_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[bool]> {
        self.cells.chunks(self.size.max(1))
    }

    pub fn to_rows(&self) -> Vec<Vec<bool>> {
        self.rows().map(|r| r.to_vec()).collect()
    }

    /// Live neighbours of a cell; anything past the edge counts as dead.
    pub fn live_neighbors(&self, row: usize, col: usize) -> u8 {
        let mut count = 0;
        for dr in [-1isize, 0, 1] {
            for dc in [-1isize, 0, 1] {
                if dr == 0 && dc == 0 {
                    continue;
                }
                let r = row as isize + dr;
                let c = col as isize + dc;
                if r < 0 || c < 0 {
                    continue;
                }
                if self.get(r as usize, c as usize) {
                    count += 1;
                }
            }
        }
        count
    }
}

/// The automaton refused to advance a board.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("automaton fault: {reason}")]
pub struct RuleFault {
    pub reason: String,
}

impl RuleFault {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// The single-board update rule.
///
/// Implementations must be pure: the same board always yields the same next
/// board and living count. The swarm calls this concurrently for different
/// boards, never for the same board twice at once.
pub trait Automaton: Send + Sync {
    fn next_generation(&self, board: &Board) -> Result<(Board, usize), RuleFault>;
}

/// Conway's B3/S23 rule on a bounded (non-wrapping) board.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConwayRule;

impl Automaton for ConwayRule {
    fn next_generation(&self, board: &Board) -> Result<(Board, usize), RuleFault> {
        let size = board.size();
        let mut next = Board::new(size);
        let mut living = 0;
        for row in 0..size {
            for col in 0..size {
                let alive = matches!(
                    (board.get(row, col), board.live_neighbors(row, col)),
                    (true, 2) | (true, 3) | (false, 3)
                );
                if alive {
                    next.set(row, col, true);
                    living += 1;
                }
            }
        }
        Ok((next, living))
    }
}
