use std::fmt;

use log::debug;
use ricochet_board::{Move, Placement, Robot, Round, SearchState, DIRECTIONS, ROBOTS};

use crate::util::{Budget, LeastMovesBoard};
use crate::visited::BestDepthMap;
use crate::{IterationStats, Outcome, Path, Solution, Solver, SolverConfig, SolverError, Stats};

const NAME: &str = "iterative deepening";

/// Observer called with the counters of every finished depth iteration.
pub type ProgressCallback = Box<dyn FnMut(&IterationStats)>;

/// A solver using iterative deepening to find the shortest path to the goal.
///
/// Runs depth limited searches with the limit starting at 1 and growing by one move after every
/// iteration, so the first solution found is a shortest one. Robots are moved in place and moved
/// back after each branch.
///
/// Even though one of the advantages of iterative deepening is the small amount of memory needed,
/// using it without storing visited nodes makes it unusably slow. Every placement is stored in a
/// transposition table together with the number of moves that were left when it was visited. The
/// table is cleared at the start of each iteration.
// Optimizations: https://speakerdeck.com/fogleman/ricochet-robots-solver-algorithms
pub struct IterativeDeepening {
    config: SolverConfig,
    progress: Option<ProgressCallback>,
}

/// How the search below a node ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Descent {
    Found,
    Exhausted,
    Interrupted(crate::Interrupt),
}

/// Everything a single solve works on.
struct Search<'a> {
    round: &'a Round,
    move_board: &'a LeastMovesBoard,
    state: SearchState,
    table: BestDepthMap,
    budget: Budget,
    /// The moves of a found solution, last move first.
    path: Vec<Move>,
    end: Placement,
    iteration: IterationStats,
}

impl Solver for IterativeDeepening {
    fn solve(&mut self, round: &Round, start: &Placement) -> Result<Solution, SolverError> {
        self.config.validate()?;
        round.check_placement(start)?;

        // Check if the robot has already reached the goal
        if round.target_reached(start) {
            let solution = Solution::new(
                Outcome::Found(Path::new_start_on_target(*start)),
                Stats::default(),
            );
            solution.log(NAME);
            return Ok(solution);
        }

        let move_board = LeastMovesBoard::for_round(round, start)?;
        let mut search = Search {
            round,
            move_board: &move_board,
            state: SearchState::new(round.board(), *start),
            table: BestDepthMap::with_capacity(self.config.table_capacity, self.config.growth)?,
            budget: Budget::start(&self.config),
            path: Vec::with_capacity(self.config.max_depth),
            end: *start,
            iteration: IterationStats::default(),
        };

        let mut stats = Stats::default();
        let mut outcome = Outcome::Exhausted {
            max_depth: self.config.max_depth,
        };
        for max_depth in 1..=self.config.max_depth {
            search.table.clear();
            search.iteration = IterationStats::new(max_depth);

            let descent = search.descend(0, max_depth)?;
            stats.add_iteration(&search.iteration, search.table.len());

            match descent {
                Descent::Interrupted(reason) => {
                    outcome = Outcome::Interrupted {
                        reason,
                        depth: max_depth,
                    };
                    break;
                }
                Descent::Exhausted | Descent::Found => {
                    debug!(
                        "finished depth {}: {} nodes, {} expanded, {} hits, {} placements stored",
                        max_depth,
                        search.iteration.nodes(),
                        search.iteration.inner(),
                        search.iteration.hits(),
                        search.table.len()
                    );
                    if let Some(progress) = &mut self.progress {
                        progress(&search.iteration);
                    }
                }
            }

            if descent == Descent::Found {
                let mut movements = std::mem::take(&mut search.path);
                movements.reverse();
                outcome = Outcome::Found(Path::new(*start, search.end, movements));
                break;
            }
        }

        let solution = Solution::new(outcome, stats);
        solution.log(NAME);
        Ok(solution)
    }
}

impl IterativeDeepening {
    /// Creates a new solver using the default configuration.
    pub fn new() -> Self {
        Self::with_config(SolverConfig::default())
    }

    /// Creates a new solver using `config`.
    pub fn with_config(config: SolverConfig) -> Self {
        Self {
            config,
            progress: None,
        }
    }

    /// Sets a callback which is called after every finished depth iteration.
    ///
    /// An iteration interrupted by the budget doesn't count as finished.
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&IterationStats) + 'static,
    {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Returns the configuration used by the solver.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }
}

impl Default for IterativeDeepening {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for IterativeDeepening {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("IterativeDeepening")
            .field("config", &self.config)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl<'a> Search<'a> {
    /// Performs a depth limited search from the current state up to a depth of `max_depth`.
    ///
    /// `depth` is the number of moves played to reach the current state.
    fn descend(&mut self, depth: usize, max_depth: usize) -> Result<Descent, SolverError> {
        if let Some(reason) = self.budget.tick() {
            return Ok(Descent::Interrupted(reason));
        }
        self.iteration.nodes += 1;

        let round = self.round;
        let target = round.target();
        if round.target_reached(self.state.placement()) {
            self.end = *self.state.placement();
            return Ok(Descent::Found);
        }
        if depth == max_depth {
            return Ok(Descent::Exhausted);
        }

        // Ignore the state if the goal can't be reached within the remaining moves.
        let remaining = max_depth - depth;
        if self.move_board.min_moves(self.state.placement(), target) > remaining {
            return Ok(Descent::Exhausted);
        }

        // On the last move every state has to be tried anyway.
        if remaining > 1 {
            let key = self.state.placement().canonical_key(target);
            if !self.table.add(key, remaining as u8)? {
                self.iteration.hits += 1;
                return Ok(Descent::Exhausted);
            }
        }
        self.iteration.inner += 1;

        // Only the target robot can finish with the last move.
        let robots: &[Robot] = if remaining == 1 {
            &ROBOTS[target.index()..=target.index()]
        } else {
            self.state.placement().robot_ids()
        };

        let board = round.board();
        for &robot in robots {
            for &direction in DIRECTIONS.iter() {
                if !self.state.can_move(board, robot, direction) {
                    continue;
                }
                let undo = self.state.apply_move(board, robot, direction);
                let descent = self.descend(depth + 1, max_depth);
                self.state.undo_move(undo);

                match descent? {
                    Descent::Exhausted => {}
                    Descent::Found => {
                        self.path.push(Move::new(robot, direction));
                        return Ok(Descent::Found);
                    }
                    interrupted => return Ok(interrupted),
                }
            }
        }
        Ok(Descent::Exhausted)
    }
}
