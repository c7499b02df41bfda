use std::collections::TryReserveError;

use ricochet_board::{Position, RoundError};
use thiserror::Error;

/// Errors which prevent a solver from finding an answer.
///
/// Running out of moves or out of time is not an error, see [`Outcome`](crate::Outcome).
#[derive(Debug, Error)]
pub enum SolverError {
    /// The round or the starting placement are malformed.
    #[error("invalid round: {0}")]
    InvalidRound(#[from] RoundError),
    /// The target robot can't reach the goal, even if all other robots were removed.
    #[error("the goal {goal:?} can't be reached by the target robot starting on {start:?}")]
    Unreachable {
        /// The goal of the round.
        goal: Position,
        /// The starting position of the target robot.
        start: Position,
    },
    /// Growing one of the search structures failed.
    #[error("failed to grow the {structure} to {requested} entries")]
    Allocation {
        /// The structure that couldn't grow.
        structure: &'static str,
        /// The number of entries that was requested.
        requested: usize,
        /// The error returned by the allocator.
        source: TryReserveError,
    },
    /// The solver configuration contains invalid values.
    #[error("invalid solver configuration: {reason}")]
    InvalidConfig {
        /// What is wrong with the configuration.
        reason: &'static str,
    },
}
