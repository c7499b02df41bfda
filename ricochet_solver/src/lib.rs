//! Solvers finding the least number of moves for a round of ricochet robots.
//!
//! Both solvers implement [`Solver`](Solver) and are interchangeable:
//!
//! - [`IterativeDeepening`](IterativeDeepening) runs depth limited searches with increasing limits,
//!   pruning with a [`LeastMovesBoard`](util::LeastMovesBoard) and a transposition table.
//! - [`BreadthFirst`](BreadthFirst) stores every visited placement in a queue and reconstructs the
//!   solution by following parent links.
//!
//! A solve either finds a shortest solution, proves that there is none within the configured depth
//! or stops when its budget runs out. All three are an [`Outcome`](Outcome), whereas malformed input
//! and failed allocations are a [`SolverError`](SolverError).

mod breadth_first;
mod config;
mod error;
mod iterative_deepening;
pub mod util;
pub mod visited;

use std::fmt;

use getset::{CopyGetters, Getters};
use log::{info, warn};
use ricochet_board::{Move, Placement, Round};

pub use breadth_first::BreadthFirst;
pub use config::{Growth, SolverConfig, MAX_DEPTH_CEILING};
pub use error::SolverError;
pub use iterative_deepening::{IterativeDeepening, ProgressCallback};

/// A strategy to find shortest solutions.
pub trait Solver {
    /// Find a shortest solution to move the target robot of `round` from `start` onto the goal.
    fn solve(&mut self, round: &Round, start: &Placement) -> Result<Solution, SolverError>;
}

/// The available search strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Use [`IterativeDeepening`](IterativeDeepening).
    IterativeDeepening,
    /// Use [`BreadthFirst`](BreadthFirst).
    BreadthFirst,
}

impl Strategy {
    /// Creates a solver for this strategy using `config`.
    pub fn solver(self, config: SolverConfig) -> Box<dyn Solver> {
        match self {
            Strategy::IterativeDeepening => Box::new(IterativeDeepening::with_config(config)),
            Strategy::BreadthFirst => Box::new(BreadthFirst::with_config(config)),
        }
    }
}

/// A path from a starting position to another position.
///
/// Contains the starting positions of the robots, their final positions and a path from the former
/// to the latter. The path consists of the robots and the directions they moved in.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct Path {
    start_pos: Placement,
    end_pos: Placement,
    movements: Vec<Move>,
}

impl Path {
    /// Creates a new path containing the starting and final positions of the robots and a path
    /// to reach the goal.
    pub fn new(start_pos: Placement, end_pos: Placement, movements: Vec<Move>) -> Self {
        debug_assert!(!movements.is_empty() || start_pos == end_pos);
        Self {
            start_pos,
            end_pos,
            movements,
        }
    }

    /// Creates a new path which ends on the starting position.
    pub fn new_start_on_target(start_pos: Placement) -> Self {
        Self::new(start_pos, start_pos, Vec::new())
    }

    /// Returns the number of moves in the path.
    pub fn len(&self) -> usize {
        self.movements.len()
    }

    /// Checks if the path has a length of 0.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The reason a solve stopped before it could finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// The time limit ran out.
    Deadline,
    /// The maximum number of nodes has been visited.
    NodeLimit,
}

impl fmt::Display for Interrupt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Interrupt::Deadline => f.pad("time limit reached"),
            Interrupt::NodeLimit => f.pad("node limit reached"),
        }
    }
}

/// How a solve ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A shortest solution.
    Found(Path),
    /// There is no solution with at most `max_depth` moves.
    Exhausted {
        /// The depth ceiling of the solve.
        max_depth: usize,
    },
    /// The solve ran out of budget while searching solutions of up to `depth` moves.
    ///
    /// All solutions with less than `depth` moves have been ruled out.
    Interrupted {
        /// Why the solve stopped.
        reason: Interrupt,
        /// The depth being searched.
        depth: usize,
    },
}

/// Counters describing the work done during a solve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct Stats {
    /// The number of depth iterations run, or depth layers dequeued by a breadth first search.
    iterations: usize,
    /// The number of nodes visited.
    nodes: u64,
    /// The number of nodes which passed all pruning and have been expanded.
    inner: u64,
    /// The number of nodes discarded because their placement had already been visited.
    hits: u64,
    /// The largest number of entries in a visited store.
    max_table_len: usize,
}

/// The counters of a single depth iteration, handed to a [`ProgressCallback`](ProgressCallback).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct IterationStats {
    /// The depth limit of the iteration.
    depth: usize,
    /// The number of nodes visited.
    nodes: u64,
    /// The number of nodes which passed all pruning and have been expanded.
    inner: u64,
    /// The number of nodes discarded by the transposition table.
    hits: u64,
}

impl IterationStats {
    pub(crate) fn new(depth: usize) -> Self {
        Self {
            depth,
            ..Default::default()
        }
    }
}

impl Stats {
    /// Adds the counters of a finished iteration.
    pub(crate) fn add_iteration(&mut self, iteration: &IterationStats, table_len: usize) {
        self.iterations += 1;
        self.nodes += iteration.nodes;
        self.inner += iteration.inner;
        self.hits += iteration.hits;
        self.max_table_len = self.max_table_len.max(table_len);
    }
}

/// The result of a solve.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct Solution {
    /// How the solve ended.
    #[getset(get = "pub")]
    outcome: Outcome,
    /// The work done to get there.
    #[getset(get = "pub")]
    stats: Stats,
}

impl Solution {
    pub(crate) fn new(outcome: Outcome, stats: Stats) -> Self {
        Self { outcome, stats }
    }

    /// Returns the path if a solution has been found.
    pub fn path(&self) -> Option<&Path> {
        match &self.outcome {
            Outcome::Found(path) => Some(path),
            _ => None,
        }
    }

    /// Consumes the solution and returns its path if one has been found.
    pub fn into_path(self) -> Option<Path> {
        match self.outcome {
            Outcome::Found(path) => Some(path),
            _ => None,
        }
    }

    /// Logs how the solve by `solver` ended.
    pub(crate) fn log(&self, solver: &str) {
        let stats = &self.stats;
        match &self.outcome {
            Outcome::Found(path) => info!(
                "{} found a solution with {} moves after visiting {} nodes ({} expanded, {} hits)",
                solver,
                path.len(),
                stats.nodes,
                stats.inner,
                stats.hits
            ),
            Outcome::Exhausted { max_depth } => info!(
                "{} found no solution with up to {} moves after visiting {} nodes",
                solver, max_depth, stats.nodes
            ),
            Outcome::Interrupted { reason, depth } => warn!(
                "{} stopped at depth {} after visiting {} nodes: {}",
                solver, depth, stats.nodes, reason
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;
    use rayon::prelude::*;
    use ricochet_board::generator::Generator;
    use ricochet_board::{Placement, Round};

    use crate::{Outcome, Path, SolverConfig, SolverError, Strategy};

    fn solve(strategy: Strategy, max_depth: usize, round: &Round, start: &Placement) -> Outcome {
        let config = SolverConfig {
            max_depth,
            ..Default::default()
        };
        match strategy.solver(config).solve(round, start) {
            Ok(solution) => solution.outcome().clone(),
            Err(SolverError::Unreachable { .. }) => Outcome::Exhausted { max_depth },
            Err(err) => panic!("unexpected error: {}", err),
        }
    }

    /// Checks that `path` reaches the goal with its last move and not earlier, and that no robot
    /// immediately reverses its own move.
    fn check_path(round: &Round, path: &Path) {
        let moves = path.movements();
        for n in 0..moves.len() {
            let placement = round.replay(path.start_pos(), &moves[..n]).unwrap();
            assert!(!round.target_reached(&placement), "reached early: {:?}", path);
        }
        let end = round.replay(path.start_pos(), moves).unwrap();
        assert!(round.target_reached(&end));
        assert_eq!(&end, path.end_pos());

        for (first, second) in moves.iter().tuple_windows() {
            assert_ne!(*second, first.reverse(), "wasted move in {:?}", path);
        }
    }

    fn cross_check(seed: u128, side_length: u16, robots: usize, max_depth: usize) -> usize {
        let (round, start) = Generator::from_seed(seed, side_length)
            .generate(robots)
            .unwrap();
        let deepening = solve(Strategy::IterativeDeepening, max_depth, &round, &start);
        let breadth = solve(Strategy::BreadthFirst, max_depth, &round, &start);

        match (&deepening, &breadth) {
            (Outcome::Found(a), Outcome::Found(b)) => {
                assert_eq!(a.len(), b.len(), "seed {}: {:?} vs {:?}", seed, a, b);
                check_path(&round, a);
                check_path(&round, b);
                a.len()
            }
            (Outcome::Exhausted { .. }, Outcome::Exhausted { .. }) => 0,
            _ => panic!("seed {}: {:?} vs {:?}", seed, deepening, breadth),
        }
    }

    #[test]
    fn strategies_agree() {
        let lengths = (0..24)
            .map(|seed| cross_check(seed, 8, 3, 6))
            .collect::<Vec<_>>();
        // Make sure the rounds aren't all trivial.
        assert!(lengths.iter().any(|&len| len >= 3), "{:?}", lengths);
    }

    #[test]
    #[ignore]
    fn strategies_agree_many() {
        let lengths = (0..400u64)
            .into_par_iter()
            .map(|seed| cross_check(seed as u128, 12, 4, 8))
            .collect::<Vec<_>>();
        let counts = lengths.iter().counts();
        println!("{:?}", counts.iter().sorted().collect::<Vec<_>>());
    }
}
