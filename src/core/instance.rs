use crate::board::{Automaton, Board, RuleFault};

/// Stable identifier of one simulation instance within a swarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub u64);

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One independent board plus its generation counter and cached population.
#[derive(Debug, Clone)]
pub struct SimulationInstance {
    id: InstanceId,
    board: Board,
    iteration_count: u64,
    living_cells: usize,
}

impl SimulationInstance {
    pub fn new(id: InstanceId, board: Board) -> Self {
        Self::resume(id, board, 0)
    }

    /// Rebuild an instance that already ran for `iteration_count` generations.
    pub fn resume(id: InstanceId, board: Board, iteration_count: u64) -> Self {
        let living_cells = board.living_count();
        Self {
            id,
            board,
            iteration_count,
            living_cells,
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn iteration_count(&self) -> u64 {
        self.iteration_count
    }

    pub fn living_cells(&self) -> usize {
        self.living_cells
    }

    /// Advance by one generation.
    ///
    /// On a fault nothing changes: the board, counter and population stay as
    /// they were, so the instance is simply retried on the next tick.
    pub fn advance(&mut self, rule: &dyn Automaton) -> Result<usize, RuleFault> {
        let (next, living) = rule.next_generation(&self.board)?;
        self.board = next;
        self.iteration_count += 1;
        self.living_cells = living;
        Ok(living)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::ConwayRule;

    struct Broken;

    impl Automaton for Broken {
        fn next_generation(&self, _board: &Board) -> Result<(Board, usize), RuleFault> {
            Err(RuleFault::new("broken"))
        }
    }

    #[test]
    fn advance_updates_counters() {
        let board = Board::from_pattern(&[".....", "..#..", "..#..", "..#..", "....."]).unwrap();
        let mut inst = SimulationInstance::new(InstanceId(1), board);
        assert_eq!(inst.living_cells(), 3);

        let living = inst.advance(&ConwayRule).unwrap();
        assert_eq!(living, 3);
        assert_eq!(inst.iteration_count(), 1);
        assert!(inst.board().get(2, 1));
    }

    #[test]
    fn fault_leaves_instance_untouched() {
        let board = Board::from_pattern(&["##...", "##...", ".....", ".....", "....."]).unwrap();
        let mut inst = SimulationInstance::resume(InstanceId(3), board.clone(), 17);

        assert!(inst.advance(&Broken).is_err());
        assert_eq!(inst.iteration_count(), 17);
        assert_eq!(inst.living_cells(), 4);
        assert_eq!(inst.board(), &board);
    }
}
