use std::{fmt, ops};

use crate::{Board, Robot, RoundError, ROBOTS};

/// The type a position is encoded as.
///
/// A u16 is sufficient to encode any cell on a board with a side length of up to 255, see
/// [`MAX_SIDE_LENGTH`](crate::MAX_SIDE_LENGTH).
pub type PositionEncoding = u16;

/// The maximum number of robots on a board.
pub const MAX_ROBOTS: usize = 4;

/// Number of bits each robot occupies in a [`StateKey`](StateKey).
const KEY_LANE_BITS: u32 = 16;

/// A cell on the board, stored as a flat index.
///
/// Cells are numbered row by row, so the cell in `column` and `row` has the index
/// `row * side_length + column`. Use [`Board::position`](Board::position) and
/// [`Board::coordinates`](Board::coordinates) to convert between both representations.
#[derive(Copy, Clone, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    encoded_position: PositionEncoding,
}

/// Positions of all robots on the board.
///
/// The robot at index `i` is [`ROBOTS[i]`](ROBOTS). A placement holds between 1 and
/// [`MAX_ROBOTS`](MAX_ROBOTS) robots.
#[derive(Copy, Clone, Hash, PartialEq, Eq)]
pub struct Placement {
    robots: [Position; MAX_ROBOTS],
    count: u8,
}

/// The canonical encoding of a placement used to find transpositions.
///
/// ```txt
/// 63        48 47        32 31        16 15         0
/// | other #3  | other #2   | other #1   | target     |
/// ```
///
/// Every lane holds the cell index plus one, the other robots are sorted in ascending order. Unused
/// lanes are `0`. Since the target lane is never `0`, no key is `0` either.
#[derive(Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct StateKey(u64);

impl Position {
    /// Creates a new position from a flat cell index.
    ///
    /// The caller has to make sure, that the index is within the bounds of the board.
    #[inline(always)]
    pub fn new(encoded_position: PositionEncoding) -> Self {
        Position { encoded_position }
    }

    /// Returns the encoded cell index.
    #[inline(always)]
    pub fn encoded(self) -> PositionEncoding {
        self.encoded_position
    }

    /// Returns the cell index, usable to index cell arrays.
    #[inline(always)]
    pub fn index(self) -> usize {
        self.encoded_position as usize
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.encoded_position)
    }
}

impl From<Position> for usize {
    fn from(pos: Position) -> Self {
        pos.index()
    }
}

impl StateKey {
    /// Returns the raw key. It is never `0`.
    #[inline(always)]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "StateKey({:#018x})", self.0)
    }
}

impl Placement {
    /// Creates a placement from the positions of the robots in the order red, blue, green, yellow.
    pub fn new(positions: &[Position]) -> Result<Self, RoundError> {
        if positions.is_empty() || positions.len() > MAX_ROBOTS {
            return Err(RoundError::RobotCount {
                count: positions.len(),
            });
        }
        let mut robots = [Position::default(); MAX_ROBOTS];
        robots[..positions.len()].copy_from_slice(positions);
        Ok(Self {
            robots,
            count: positions.len() as u8,
        })
    }

    /// Creates a placement from `(column, row)` tuples on `board`.
    ///
    /// The values in `coordinates` are used in the order red, blue, green, yellow.
    pub fn from_coordinates(
        board: &Board,
        coordinates: &[(PositionEncoding, PositionEncoding)],
    ) -> Result<Self, RoundError> {
        if coordinates.is_empty() || coordinates.len() > MAX_ROBOTS {
            return Err(RoundError::RobotCount {
                count: coordinates.len(),
            });
        }
        let mut positions = [Position::default(); MAX_ROBOTS];
        for (slot, &(column, row)) in positions.iter_mut().zip(coordinates) {
            if column >= board.side_length() || row >= board.side_length() {
                return Err(RoundError::Coordinates { column, row });
            }
            *slot = board.position(column, row);
        }
        Self::new(&positions[..coordinates.len()])
    }

    /// Returns the number of robots.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.count as usize
    }

    /// Checks if the placement holds no robots.
    ///
    /// Placements created by [`new`](Self::new) or [`from_coordinates`](Self::from_coordinates)
    /// hold at least one robot, so this is `false` for them.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns the positions of the robots in the order red, blue, green, yellow.
    #[inline(always)]
    pub fn robots(&self) -> &[Position] {
        &self.robots[..self.len()]
    }

    /// Returns the robots of this placement.
    pub fn robot_ids(&self) -> &'static [Robot] {
        &ROBOTS[..self.len()]
    }

    /// Creates an Iterator over all robots and their positions.
    pub fn iter(&self) -> impl Iterator<Item = (Robot, Position)> + '_ {
        ROBOTS.iter().copied().zip(self.robots().iter().copied())
    }

    /// Sets the `robot` to `new_position`.
    #[inline(always)]
    pub(crate) fn set_robot(&mut self, robot: Robot, new_position: Position) {
        self.robots[robot.index()] = new_position;
    }

    /// Checks if `pos` has any robot on it.
    pub fn contains_any_robot(&self, pos: Position) -> bool {
        self.robots().contains(&pos)
    }

    /// Checks if the `robot` is on `pos`.
    #[inline(always)]
    pub fn contains_robot(&self, robot: Robot, pos: Position) -> bool {
        robot.index() < self.len() && self.robots[robot.index()] == pos
    }

    /// Returns the canonical key of the placement.
    ///
    /// The `target` robot keeps its identity, while all other robots are interchangeable
    /// obstacles. Two placements that only differ in which of the other robots stands on which
    /// cell share a key.
    pub fn canonical_key(&self, target: Robot) -> StateKey {
        let mut others = [0u64; MAX_ROBOTS - 1];
        let mut n_others = 0;
        for (robot, pos) in self.iter() {
            if robot != target {
                others[n_others] = pos.encoded() as u64 + 1;
                n_others += 1;
            }
        }
        others[..n_others].sort_unstable();

        let mut key = self.robots[target.index()].encoded() as u64 + 1;
        for (lane, &other) in others[..n_others].iter().enumerate() {
            key |= other << (KEY_LANE_BITS * (lane as u32 + 1));
        }
        StateKey(key)
    }
}

impl ops::Index<Robot> for Placement {
    type Output = Position;

    fn index(&self, index: Robot) -> &Self::Output {
        &self.robots()[index.index()]
    }
}

impl fmt::Debug for Placement {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str("[")?;
        for (i, pos) in self.robots().iter().enumerate() {
            if i > 0 {
                fmt.write_str(" | ")?;
            }
            write!(fmt, "{:?}", pos)?;
        }
        fmt.write_str("]")
    }
}
