use chrono::{DateTime, Local};
use ricochet_board::{Board, Placement, Position, Robot, Round, DIRECTIONS};
use std::ops;

use crate::{Interrupt, SolverConfig, SolverError};

/// The number of nodes between two looks at the clock.
const DEADLINE_SAMPLE_INTERVAL: u64 = 4096;

/// This board contains the minimum number of moves to reach the goal for each cell.
///
/// This minimum is a lower bound and may be impossible to reach even if all other robots are
/// positioned perfectly. If the lower bound of a position is the number of cells on the board, then
/// the goal is impossible to reach from that cell.
///
/// `LeastMovesBoard` implements `Index<Position>` which makes getting the calculated minimum of a
/// position easy.
#[derive(Debug, Clone, Default)]
pub struct LeastMovesBoard {
    board: Vec<usize>,
    goal: Position,
}

impl LeastMovesBoard {
    /// Creates a new board and calculates the minimum number of moves needed to reach the `goal`
    /// from each cell.
    ///
    /// The board is created by starting from the goal and going through all cells from which the
    /// goal can be reached in one move, assuming a robot could stop anywhere. These cells are
    /// assigned a lower bound of 1 and are added to the list of next cells to be expanded. This
    /// repeats until no bound improves anymore. The remaining cells can never reach the goal and
    /// are marked with the number of cells on the board, a bound longer than possible.
    ///
    /// # Panics
    /// The board has to be enclosed by walls, which debug builds check.
    pub fn new(board: &Board, goal: Position) -> Self {
        debug_assert!(board.open_edge().is_none(), "the board has to be enclosed");
        let unreachable = board.cell_count();
        let mut move_board = vec![unreachable; unreachable];

        let mut current_moves = Vec::with_capacity(256);
        let mut next_moves = current_moves.clone();

        move_board[goal.index()] = 0;
        current_moves.push(goal);

        for move_n in 1usize.. {
            for &pos in &current_moves {
                for &dir in DIRECTIONS.iter() {
                    // Start from pos for each direction.
                    let mut check_pos = pos;
                    while !board.is_adjacent_to_wall(check_pos, dir) {
                        check_pos = board.step(check_pos, dir);
                        let current_min = &mut move_board[check_pos.index()];
                        if move_n < *current_min {
                            // new position found
                            *current_min = move_n;
                            next_moves.push(check_pos);
                        }
                    }
                }
            }

            if next_moves.is_empty() {
                break;
            }
            current_moves.clear();
            std::mem::swap(&mut current_moves, &mut next_moves);
        }

        Self {
            board: move_board,
            goal,
        }
    }

    /// Creates the board for the goal of `round` and checks that the target robot can reach the
    /// goal from `start` at all.
    pub fn for_round(round: &Round, start: &Placement) -> Result<Self, SolverError> {
        let move_board = Self::new(round.board(), round.goal());
        if move_board.is_unsolvable(start, round.target()) {
            return Err(SolverError::Unreachable {
                goal: round.goal(),
                start: start[round.target()],
            });
        }
        Ok(move_board)
    }

    /// Returns the goal the bounds were calculated for.
    pub fn goal(&self) -> Position {
        self.goal
    }

    /// Returns the lower bound of the number of moves needed to get the `target` robot of
    /// `placement` onto the goal.
    #[inline(always)]
    pub fn min_moves(&self, placement: &Placement, target: Robot) -> usize {
        self[placement[target]]
    }

    /// Checks whether the goal is impossible to reach for `target` by checking if the lower bound
    /// returned by [`min_moves`](Self::min_moves) is greater than or equal to the number of cells
    /// on the board.
    pub fn is_unsolvable(&self, placement: &Placement, target: Robot) -> bool {
        self.min_moves(placement, target) >= self.board.len()
    }
}

impl ops::Index<Position> for LeastMovesBoard {
    type Output = usize;

    #[inline(always)]
    fn index(&self, index: Position) -> &Self::Output {
        &self.board[index.index()]
    }
}

/// Keeps track of the time and nodes a single solve may still spend.
#[derive(Debug, Clone)]
pub(crate) struct Budget {
    deadline: Option<DateTime<Local>>,
    node_limit: Option<u64>,
    spent: u64,
}

impl Budget {
    /// Starts the clock for a new solve.
    pub fn start(config: &SolverConfig) -> Self {
        let deadline = config
            .time_limit
            .and_then(|limit| Local::now().checked_add_signed(limit));
        Self {
            deadline,
            node_limit: config.node_limit,
            spent: 0,
        }
    }

    /// Accounts for one more node and reports if the search has to stop before visiting it.
    ///
    /// The clock is only read every few thousand nodes.
    #[inline]
    pub fn tick(&mut self) -> Option<Interrupt> {
        if matches!(self.node_limit, Some(limit) if self.spent >= limit) {
            return Some(Interrupt::NodeLimit);
        }
        self.spent += 1;
        if self.spent % DEADLINE_SAMPLE_INTERVAL == 0 {
            if let Some(deadline) = self.deadline {
                if Local::now() >= deadline {
                    return Some(Interrupt::Deadline);
                }
            }
        }
        None
    }
}
