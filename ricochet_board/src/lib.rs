#![deny(missing_docs)]
#![deny(missing_debug_implementations)]

//! Basic components to play Ricochet Robots.
//!
//! The board game [Ricochet Robots](https://en.wikipedia.org/wiki/Ricochet_Robot) is played on a
//! square board containing some walls and up to 4 robots. The goal of a round is to move one
//! chosen robot, the target robot, onto the goal cell. The robots can each move in all four
//! directions but only stop when they hit a wall or another robot. This is counted as one move and
//! all robots can be moved in arbitrary order.
//!
//! The main components are the [`Board`](Board), the [`Round`](Round), the
//! [`Placement`](Placement) and the [`SearchState`](SearchState). A `Board` stores the walls of
//! every cell. A `Round` contains a board, the goal cell and the target robot. A `Placement` holds
//! the cell of every robot, and a `SearchState` is the mutable working copy a solver moves robots
//! around in, one [`apply_move`](SearchState::apply_move) and
//! [`undo_move`](SearchState::undo_move) at a time.
//!
//! Random boards and rounds for testing and benchmarking can be created with the
//! [`generator`](generator) module.

mod error;
pub mod generator;
mod positions;
mod state;

use std::{fmt, ops};

pub use crate::error::RoundError;
pub use crate::positions::{Placement, Position, PositionEncoding, StateKey, MAX_ROBOTS};
pub use crate::state::{SearchState, Undo};

/// The largest supported side length.
///
/// Every cell index plus one has to fit into a 16 bit lane of a [`StateKey`](StateKey).
pub const MAX_SIDE_LENGTH: PositionEncoding = 255;

/// All `Direction`s a robot can move in, in the order they are enumerated by the solvers.
pub const DIRECTIONS: [Direction; 4] = [
    Direction::North,
    Direction::East,
    Direction::South,
    Direction::West,
];

/// All robots defined by their color, in the order they are enumerated by the solvers.
pub const ROBOTS: [Robot; MAX_ROBOTS] = [Robot::Red, Robot::Blue, Robot::Green, Robot::Yellow];

/// The walls surrounding a single cell, stored as a bitmask.
///
/// ```txt
/// W S E N
/// 8 4 2 1
/// ```
#[derive(Debug, Copy, Clone, Default, Hash, PartialEq, Eq)]
pub struct Walls(u8);

/// A ricochet robots board containing walls, but no goal.
///
/// The cells are stored row by row, see [`Position`](Position).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Board {
    side_length: PositionEncoding,
    cells: Vec<Walls>,
}

/// One round of a ricochet game.
///
/// Represents the problem of moving the target robot from a starting placement onto the goal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    board: Board,
    target: Robot,
    goal: Position,
}

/// The robots identified by their color.
#[allow(missing_docs)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Robot {
    Red,
    Blue,
    Green,
    Yellow,
}

/// The directions a robot can be moved in.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

/// A robot and the direction it is moved in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    /// The robot being moved.
    pub robot: Robot,
    /// The direction the robot slides in.
    pub direction: Direction,
}

impl Walls {
    /// A cell without any walls.
    pub const NONE: Walls = Walls(0);

    /// A cell enclosed on all four sides.
    pub const ALL: Walls = Walls(0x0f);

    /// Creates the walls from a bitmask, ignoring all bits above the four direction bits.
    pub fn from_bits(bits: u8) -> Self {
        Walls(bits & Self::ALL.0)
    }

    /// Returns the raw bitmask.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Checks if the wall in `direction` is set.
    #[inline(always)]
    pub fn contains(self, direction: Direction) -> bool {
        self.0 & direction.mask() != 0
    }

    /// Sets the wall in `direction`.
    pub fn insert(&mut self, direction: Direction) {
        self.0 |= direction.mask();
    }
}

impl Direction {
    /// Returns the direction pointing the other way.
    #[inline(always)]
    pub fn reverse(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }

    /// Returns the bit used for this direction in [`Walls`](Walls).
    #[inline(always)]
    pub fn mask(self) -> u8 {
        match self {
            Direction::North => 0x01,
            Direction::East => 0x02,
            Direction::South => 0x04,
            Direction::West => 0x08,
        }
    }
}

impl Robot {
    /// Returns the index of the robot in a [`Placement`](Placement).
    #[inline(always)]
    pub fn index(self) -> usize {
        match self {
            Robot::Red => 0,
            Robot::Blue => 1,
            Robot::Green => 2,
            Robot::Yellow => 3,
        }
    }

    /// Returns the robot stored at `index` of a placement.
    pub fn from_index(index: usize) -> Option<Self> {
        ROBOTS.get(index).copied()
    }
}

impl Move {
    /// Creates a new move.
    pub fn new(robot: Robot, direction: Direction) -> Self {
        Self { robot, direction }
    }

    /// Returns the move undoing the direction of `self` with the same robot.
    pub fn reverse(self) -> Self {
        Self::new(self.robot, self.direction.reverse())
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let string = format!("{:?}", &self);
        f.pad(&string)
    }
}

impl fmt::Display for Robot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let string = format!("{:?}", &self);
        f.pad(&string)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let string = format!("{} {}", self.robot, self.direction);
        f.pad(&string)
    }
}

/// Board impl containing code to create or change a board.
impl Board {
    /// Create a new board with the given walls, stored row by row.
    pub fn new(side_length: PositionEncoding, cells: Vec<Walls>) -> Result<Self, RoundError> {
        check_side_length(side_length)?;
        let expected = side_length as usize * side_length as usize;
        if cells.len() != expected {
            return Err(RoundError::CellCount {
                expected,
                actual: cells.len(),
            });
        }
        Ok(Self { side_length, cells })
    }

    /// Create a new empty board with no walls with `side_length`.
    ///
    /// The board has no boundary walls yet, use [`wall_enclosure`](Self::wall_enclosure) to add
    /// them.
    pub fn new_empty(side_length: PositionEncoding) -> Self {
        let count = side_length as usize * side_length as usize;
        Self {
            side_length,
            cells: vec![Walls::NONE; count],
        }
    }

    /// Returns the side length of the board.
    pub fn side_length(&self) -> PositionEncoding {
        self.side_length
    }

    /// Returns the number of cells on the board.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Encloses the board with walls.
    pub fn wall_enclosure(mut self) -> Self {
        let last = self.side_length.saturating_sub(1);
        for i in 0..self.side_length {
            let (top, bottom) = (self.position(i, 0), self.position(i, last));
            let (left, right) = (self.position(0, i), self.position(last, i));
            self.cells[top.index()].insert(Direction::North);
            self.cells[bottom.index()].insert(Direction::South);
            self.cells[left.index()].insert(Direction::West);
            self.cells[right.index()].insert(Direction::East);
        }
        self
    }

    /// Creates a 2x2 block enclosed by walls in the center of the board.
    pub fn set_center_walls(self) -> Self {
        let point = self.side_length / 2 - 1;
        self.enclose_lengths(point, point, 2, 2)
    }

    /// Encloses a rectangle defined by the upper left cell and its width and height.
    ///
    /// The cell (col, row) is inside the enclosure.
    pub fn enclose_lengths(
        self,
        col: PositionEncoding,
        row: PositionEncoding,
        width: PositionEncoding,
        height: PositionEncoding,
    ) -> Self {
        let mut board = self;
        for c in col..(col + width) {
            let top = board.position(c, row);
            let bottom = board.position(c, row + height - 1);
            board = board
                .set_wall(top, Direction::North)
                .set_wall(bottom, Direction::South);
        }
        for r in row..(row + height) {
            let left = board.position(col, r);
            let right = board.position(col + width - 1, r);
            board = board
                .set_wall(left, Direction::West)
                .set_wall(right, Direction::East);
        }
        board
    }

    /// Starting from `[col, row]` sets `len` cells downwards to have a wall on the east side.
    #[inline]
    pub fn set_vertical_line(
        mut self,
        col: PositionEncoding,
        row: PositionEncoding,
        len: PositionEncoding,
    ) -> Self {
        for row in row..(row + len) {
            let pos = self.position(col, row);
            self = self.set_wall(pos, Direction::East);
        }
        self
    }

    /// Starting from `[col, row]` sets `width` cells to the right to have a wall on the south side.
    #[inline]
    pub fn set_horizontal_line(
        mut self,
        col: PositionEncoding,
        row: PositionEncoding,
        width: PositionEncoding,
    ) -> Self {
        for col in col..(col + width) {
            let pos = self.position(col, row);
            self = self.set_wall(pos, Direction::South);
        }
        self
    }

    /// Sets the wall of `pos` in `direction` and the matching wall of the neighbouring cell.
    pub fn set_wall(mut self, pos: Position, direction: Direction) -> Self {
        self.cells[pos.index()].insert(direction);
        if let Some(neighbor) = self.neighbor(pos, direction) {
            self.cells[neighbor.index()].insert(direction.reverse());
        }
        self
    }
}

/// Board impl containing code to interact with a board.
impl Board {
    /// Returns the position of the cell in `column` and `row`.
    ///
    /// The caller has to make sure, that the coordinates are within the bounds of the board.
    #[inline]
    pub fn position(&self, column: PositionEncoding, row: PositionEncoding) -> Position {
        Position::new(row * self.side_length + column)
    }

    /// Returns the `(column, row)` coordinates of `pos`.
    #[inline]
    pub fn coordinates(&self, pos: Position) -> (PositionEncoding, PositionEncoding) {
        let encoded = pos.encoded();
        (encoded % self.side_length, encoded / self.side_length)
    }

    /// Checks if `pos` lies on the board.
    pub fn contains(&self, pos: Position) -> bool {
        pos.index() < self.cells.len()
    }

    /// Returns the walls of all cells row by row.
    pub fn cells(&self) -> &[Walls] {
        &self.cells
    }

    /// Checks if a wall is next to `pos` in the given `direction`.
    #[inline(always)]
    pub fn is_adjacent_to_wall(&self, pos: Position, direction: Direction) -> bool {
        self.cells[pos.index()].contains(direction)
    }

    /// Returns the cell next to `pos` in `direction` or `None` if `pos` is at the edge.
    pub fn neighbor(&self, pos: Position, direction: Direction) -> Option<Position> {
        let (col, row) = self.coordinates(pos);
        let last = self.side_length.saturating_sub(1);
        let (col, row) = match direction {
            Direction::North if row > 0 => (col, row - 1),
            Direction::East if col < last => (col + 1, row),
            Direction::South if row < last => (col, row + 1),
            Direction::West if col > 0 => (col - 1, row),
            _ => return None,
        };
        Some(self.position(col, row))
    }

    /// Returns the cell next to `pos` in `direction` without checking the edge of the board.
    ///
    /// Only valid if `pos` has no wall in `direction` on an enclosed board.
    #[inline(always)]
    pub fn step(&self, pos: Position, direction: Direction) -> Position {
        let encoded = pos.encoded();
        Position::new(match direction {
            Direction::North => encoded - self.side_length,
            Direction::East => encoded + 1,
            Direction::South => encoded + self.side_length,
            Direction::West => encoded - 1,
        })
    }

    /// Returns the first cell on the edge of the board which is missing its boundary wall.
    pub fn open_edge(&self) -> Option<Position> {
        let last = self.side_length.saturating_sub(1);
        (0..self.cell_count())
            .map(|i| Position::new(i as PositionEncoding))
            .find(|&pos| {
                let (col, row) = self.coordinates(pos);
                let walls = self[pos];
                (row == 0 && !walls.contains(Direction::North))
                    || (col == last && !walls.contains(Direction::East))
                    || (row == last && !walls.contains(Direction::South))
                    || (col == 0 && !walls.contains(Direction::West))
            })
    }
}

impl ops::Index<Position> for Board {
    type Output = Walls;

    fn index(&self, index: Position) -> &Self::Output {
        &self.cells[index.index()]
    }
}

impl Round {
    /// Creates a new ricochet robots round.
    ///
    /// Fails if the board isn't fully enclosed by walls or `goal` isn't on the board.
    pub fn new(board: Board, target: Robot, goal: Position) -> Result<Self, RoundError> {
        check_side_length(board.side_length())?;
        if let Some(position) = board.open_edge() {
            return Err(RoundError::OpenEdge { position });
        }
        if !board.contains(goal) {
            return Err(RoundError::OutOfBounds { position: goal });
        }
        Ok(Self {
            board,
            target,
            goal,
        })
    }

    /// Returns the `Board` the robots move on.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Returns the robot which has to reach the goal.
    pub fn target(&self) -> Robot {
        self.target
    }

    /// Returns the goal position.
    pub fn goal(&self) -> Position {
        self.goal
    }

    /// Checks if the target robot has reached the goal.
    #[inline(always)]
    pub fn target_reached(&self, placement: &Placement) -> bool {
        placement.contains_robot(self.target, self.goal)
    }

    /// Checks that `placement` can be used to play this round.
    ///
    /// The placement has to contain the target robot and all robots have to be on distinct cells
    /// of the board.
    pub fn check_placement(&self, placement: &Placement) -> Result<(), RoundError> {
        if self.target.index() >= placement.len() {
            return Err(RoundError::MissingRobot {
                robot: self.target,
                count: placement.len(),
            });
        }
        let robots = placement.robots();
        for (i, &pos) in robots.iter().enumerate() {
            if !self.board.contains(pos) {
                return Err(RoundError::OutOfBounds { position: pos });
            }
            if robots[..i].contains(&pos) {
                return Err(RoundError::Overlap { position: pos });
            }
        }
        Ok(())
    }

    /// Plays `moves` starting from `start` and returns the final placement.
    ///
    /// Moves are played by the rules of the game only, so a move that is blocked right away leaves
    /// the placement unchanged.
    pub fn replay(&self, start: &Placement, moves: &[Move]) -> Result<Placement, RoundError> {
        self.check_placement(start)?;
        let mut state = SearchState::new(&self.board, *start);
        for mv in moves {
            if mv.robot.index() >= start.len() {
                return Err(RoundError::MissingRobot {
                    robot: mv.robot,
                    count: start.len(),
                });
            }
            let landing = state.landing(&self.board, mv.robot, mv.direction);
            if landing != state.placement()[mv.robot] {
                state.apply_move(&self.board, mv.robot, mv.direction);
            }
        }
        Ok(*state.placement())
    }
}

fn check_side_length(side_length: PositionEncoding) -> Result<(), RoundError> {
    if (2..=MAX_SIDE_LENGTH).contains(&side_length) {
        Ok(())
    } else {
        Err(RoundError::SideLength { side_length })
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        Board, Direction, Move, Placement, Robot, Round, RoundError, Walls, DIRECTIONS,
    };

    #[test]
    fn reverse_pairs() {
        for &dir in DIRECTIONS.iter() {
            assert_ne!(dir, dir.reverse());
            assert_eq!(dir, dir.reverse().reverse());
        }
        assert_eq!(Direction::North.reverse(), Direction::South);
        assert_eq!(Direction::East.reverse(), Direction::West);
    }

    #[test]
    fn enclosure() {
        let board = Board::new_empty(4).wall_enclosure();
        assert_eq!(board.open_edge(), None);
        assert_eq!(board[board.position(0, 0)].bits(), 0x01 | 0x08);
        assert_eq!(board[board.position(3, 3)].bits(), 0x02 | 0x04);
        assert_eq!(board[board.position(1, 1)], Walls::NONE);
    }

    #[test]
    fn walls_are_symmetric() {
        let board = Board::new_empty(4).wall_enclosure();
        let pos = board.position(1, 1);
        let board = board.set_wall(pos, Direction::East);
        assert!(board.is_adjacent_to_wall(pos, Direction::East));
        assert!(board.is_adjacent_to_wall(board.position(2, 1), Direction::West));

        let board = board.set_horizontal_line(2, 2, 2);
        assert!(board.is_adjacent_to_wall(board.position(3, 2), Direction::South));
        assert!(board.is_adjacent_to_wall(board.position(3, 3), Direction::North));
    }

    #[test]
    fn center_walls() {
        let board = Board::new_empty(6).wall_enclosure().set_center_walls();
        let upper_left = board.position(2, 2);
        assert!(board[upper_left].contains(Direction::North));
        assert!(board[upper_left].contains(Direction::West));
        assert!(!board[upper_left].contains(Direction::East));
        assert!(board.is_adjacent_to_wall(board.position(4, 3), Direction::West));
    }

    #[test]
    fn coordinates() {
        let board = Board::new_empty(7);
        let pos = board.position(5, 3);
        assert_eq!(pos.index(), 3 * 7 + 5);
        assert_eq!(board.coordinates(pos), (5, 3));
        assert_eq!(board.neighbor(pos, Direction::North), Some(board.position(5, 2)));
        assert_eq!(board.neighbor(board.position(6, 0), Direction::East), None);
    }

    #[test]
    fn board_from_cells() {
        assert_eq!(
            Board::new(3, vec![Walls::NONE; 8]),
            Err(RoundError::CellCount {
                expected: 9,
                actual: 8
            })
        );
        assert_eq!(
            Board::new(1, vec![Walls::ALL]),
            Err(RoundError::SideLength { side_length: 1 })
        );
        let board = Board::new(2, vec![Walls::from_bits(0xff); 4]).unwrap();
        assert_eq!(board[board.position(1, 1)], Walls::ALL);
    }

    #[test]
    fn round_rejects_open_board() {
        let board = Board::new_empty(4);
        let goal = board.position(1, 1);
        assert_eq!(
            Round::new(board.clone(), Robot::Red, goal),
            Err(RoundError::OpenEdge {
                position: board.position(0, 0)
            })
        );

        let board = board.wall_enclosure();
        let outside = crate::Position::new(16);
        assert_eq!(
            Round::new(board, Robot::Red, outside),
            Err(RoundError::OutOfBounds { position: outside })
        );
    }

    #[test]
    fn check_placement() {
        let board = Board::new_empty(4).wall_enclosure();
        let round = Round::new(board.clone(), Robot::Green, board.position(0, 0)).unwrap();

        let short = Placement::from_coordinates(&board, &[(1, 1), (2, 2)]).unwrap();
        assert_eq!(
            round.check_placement(&short),
            Err(RoundError::MissingRobot {
                robot: Robot::Green,
                count: 2
            })
        );

        let overlap = Placement::from_coordinates(&board, &[(1, 1), (2, 2), (1, 1)]).unwrap();
        assert_eq!(
            round.check_placement(&overlap),
            Err(RoundError::Overlap {
                position: board.position(1, 1)
            })
        );

        let valid = Placement::from_coordinates(&board, &[(1, 1), (2, 2), (3, 1)]).unwrap();
        assert_eq!(round.check_placement(&valid), Ok(()));
        assert!(!round.target_reached(&valid));
    }

    #[test]
    fn replay() {
        let board = Board::new_empty(4).wall_enclosure();
        let round = Round::new(board.clone(), Robot::Red, board.position(0, 0)).unwrap();
        let start = Placement::from_coordinates(&board, &[(3, 3), (1, 2)]).unwrap();

        let end = round
            .replay(
                &start,
                &[
                    Move::new(Robot::Red, Direction::North),
                    Move::new(Robot::Red, Direction::West),
                ],
            )
            .unwrap();
        assert!(round.target_reached(&end));
        assert_eq!(end[Robot::Blue], board.position(1, 2));

        // Blocked moves don't change anything.
        let same = round
            .replay(&start, &[Move::new(Robot::Red, Direction::East)])
            .unwrap();
        assert_eq!(same, start);
    }
}
