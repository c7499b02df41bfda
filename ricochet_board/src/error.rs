use thiserror::Error;

use crate::{Position, PositionEncoding, Robot, MAX_ROBOTS, MAX_SIDE_LENGTH};

/// Errors in the definition of a board, a round or a placement of robots.
///
/// These are detected before any robot is moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RoundError {
    /// The side length of the board is not supported.
    #[error("side length {side_length} is outside of the supported range 2..={}", MAX_SIDE_LENGTH)]
    SideLength {
        /// The rejected side length.
        side_length: PositionEncoding,
    },
    /// The number of cells doesn't match the side length.
    #[error("expected {expected} cells for the board, got {actual}")]
    CellCount {
        /// The number of cells a board with the given side length has.
        expected: usize,
        /// The number of cells that were passed.
        actual: usize,
    },
    /// A cell on the edge of the board has no boundary wall.
    #[error("cell {position:?} is on the edge of the board but has no boundary wall")]
    OpenEdge {
        /// The first open cell found.
        position: Position,
    },
    /// A position is not on the board.
    #[error("position {position:?} is not on the board")]
    OutOfBounds {
        /// The offending position.
        position: Position,
    },
    /// Coordinates are outside of the board.
    #[error("coordinates ({column}, {row}) are not on the board")]
    Coordinates {
        /// The column of the rejected coordinates.
        column: PositionEncoding,
        /// The row of the rejected coordinates.
        row: PositionEncoding,
    },
    /// A placement has too few or too many robots.
    #[error("a placement needs between 1 and {} robots, got {count}", MAX_ROBOTS)]
    RobotCount {
        /// The number of robots passed.
        count: usize,
    },
    /// A robot is used that isn't part of the placement.
    #[error("robot {robot} is not part of a placement with {count} robots")]
    MissingRobot {
        /// The robot that is missing.
        robot: Robot,
        /// The number of robots in the placement.
        count: usize,
    },
    /// Two robots are on the same cell.
    #[error("more than one robot is placed on {position:?}")]
    Overlap {
        /// The cell with more than one robot.
        position: Position,
    },
}
