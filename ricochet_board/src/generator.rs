//! Tools to generate boards and rounds of different sizes.

use std::collections::BTreeSet;

use crate::{
    Board, Direction, Placement, Position, PositionEncoding, Round, RoundError, DIRECTIONS,
    MAX_ROBOTS, MAX_SIDE_LENGTH, ROBOTS,
};
use itertools::Itertools;
use rand::prelude::SliceRandom;
use rand::{Rng, SeedableRng};

/// Marks the side_length from which on generated boards contain a center wall block.
pub const CENTER_WALLS_FROM_SIDE_LENGTH: PositionEncoding = 10;

/// The smallest side length the generator can create boards for.
pub const MIN_GENERATED_SIDE_LENGTH: PositionEncoding = 4;

/// A board generator to create boards of different sizes and configurations.
#[derive(Debug)]
pub struct Generator {
    rng: rand_pcg::Pcg64Mcg,
    side_length: PositionEncoding,
    potential_goals: Vec<(PositionEncoding, PositionEncoding)>,
    occupied_fields: BTreeSet<(PositionEncoding, PositionEncoding)>,
}

impl Generator {
    /// Creates a new generator with a random state.
    pub fn new(side_length: PositionEncoding) -> Self {
        Self::with_rng(rand_pcg::Pcg64Mcg::from_entropy(), side_length)
    }

    /// Creates a new generator initialized with `seed`.
    ///
    /// The generator was implemented in a way that focuses on generating boards with a
    /// `side_length` greater than 6.
    pub fn from_seed(seed: u128, side_length: PositionEncoding) -> Self {
        Self::with_rng(rand_pcg::Pcg64Mcg::new(seed.wrapping_mul(2)), side_length)
    }

    fn with_rng(rng: rand_pcg::Pcg64Mcg, side_length: PositionEncoding) -> Self {
        Self {
            rng,
            side_length,
            potential_goals: Vec::new(),
            occupied_fields: BTreeSet::new(),
        }
    }

    /// Generates a new round on a fresh board together with a starting placement of
    /// `robot_count` robots.
    ///
    /// The goal is one of the cells with a corner wall if there are any, the target robot is chosen
    /// at random.
    pub fn generate(&mut self, robot_count: usize) -> Result<(Round, Placement), RoundError> {
        if robot_count == 0 || robot_count > MAX_ROBOTS {
            return Err(RoundError::RobotCount { count: robot_count });
        }
        let board = self.generate_board()?;
        // Small boards may have no room left for corner walls.
        let (col, row) = match self.potential_goals.choose(&mut self.rng) {
            Some(&field) => field,
            None => (
                self.rng.gen_range(0..self.side_length),
                self.rng.gen_range(0..self.side_length),
            ),
        };
        let goal = board.position(col, row);
        let target = ROBOTS[self.rng.gen_range(0..robot_count)];
        let placement = self.generate_placement(&board, robot_count)?;
        Ok((Round::new(board, target, goal)?, placement))
    }

    /// Generates a placement of `robot_count` robots on distinct cells of `board`.
    ///
    /// No robot is placed inside the center block.
    pub fn generate_placement(
        &mut self,
        board: &Board,
        robot_count: usize,
    ) -> Result<Placement, RoundError> {
        if robot_count == 0 || robot_count > MAX_ROBOTS {
            return Err(RoundError::RobotCount { count: robot_count });
        }
        let side_length = board.side_length();
        let center = (side_length / 2).saturating_sub(1)..=side_length / 2;
        let has_center = side_length >= CENTER_WALLS_FROM_SIDE_LENGTH;

        let mut positions: Vec<Position> = Vec::with_capacity(robot_count);
        while positions.len() < robot_count {
            let col = self.rng.gen_range(0..side_length);
            let row = self.rng.gen_range(0..side_length);
            if has_center && center.contains(&col) && center.contains(&row) {
                continue;
            }
            let pos = board.position(col, row);
            if !positions.contains(&pos) {
                positions.push(pos);
            }
        }
        Placement::new(&positions)
    }

    /// Generates a new board and updates the potential goals.
    pub fn generate_board(&mut self) -> Result<Board, RoundError> {
        if self.side_length < MIN_GENERATED_SIDE_LENGTH || self.side_length > MAX_SIDE_LENGTH {
            return Err(RoundError::SideLength {
                side_length: self.side_length,
            });
        }

        let mut base = Board::new_empty(self.side_length).wall_enclosure();
        self.potential_goals = Vec::new();
        self.occupied_fields = BTreeSet::new();

        if self.side_length >= CENTER_WALLS_FROM_SIDE_LENGTH {
            base = base.set_center_walls();
            let f = self.side_length / 2 - 1;
            for (col_add, row_add) in [0, 1].iter().cartesian_product(&[0, 1]) {
                self.add_occupied_field((f + col_add, f + row_add));
            }
        }

        base = self.add_outer_wall_protrusions(base);

        let first_quad_len = self.side_length / 2;
        let mut other_quad_len = first_quad_len;
        if self.side_length % 2 == 1 {
            other_quad_len += 1
        }
        // The parts of the quadrants in which walls will be generated in the form
        // `((col, row), (width, height))`.
        let quadrants = vec![
            ((1, 1), (first_quad_len - 1, first_quad_len - 1)),
            (
                (1, first_quad_len),
                (first_quad_len - 1, other_quad_len - 1),
            ),
            (
                (first_quad_len, 1),
                (other_quad_len - 1, first_quad_len - 1),
            ),
            (
                (first_quad_len, first_quad_len),
                (other_quad_len - 1, other_quad_len - 1),
            ),
        ];

        let fields_per_quad = (self.side_length as f64 / 4.0).round() as usize;
        for quad in quadrants {
            for _ in 0..fields_per_quad {
                let chosen = match free_fields(&self.occupied_fields, quad).choose(&mut self.rng) {
                    Some(field) => *field,
                    None => break,
                };
                base = self.walls_around_field(base, chosen);

                self.potential_goals.push(chosen);
                self.add_occupied_field(chosen);
            }
        }

        // Add one more corner wall if there is any space left.
        let open_fields = free_fields(
            &self.occupied_fields,
            ((1, 1), (self.side_length - 2, self.side_length - 2)),
        );
        if let Some(&field) = open_fields.choose(&mut self.rng) {
            base = self.walls_around_field(base, field);
            self.potential_goals.push(field);
        }

        Ok(base)
    }

    /// Adds a random corner wall to the field at `(col, row)`.
    fn walls_around_field(
        &mut self,
        board: Board,
        (col, row): (PositionEncoding, PositionEncoding),
    ) -> Board {
        let pos = board.position(col, row);
        let first = *DIRECTIONS.choose(&mut self.rng).unwrap_or(&Direction::North);
        // The second wall is the one clockwise of the first, which closes the corner.
        let second = match first {
            Direction::North => Direction::East,
            Direction::East => Direction::South,
            Direction::South => Direction::West,
            Direction::West => Direction::North,
        };
        board.set_wall(pos, first).set_wall(pos, second)
    }

    /// Adds walls protruding from the outer walls to the board.
    fn add_outer_wall_protrusions(&mut self, mut board: Board) -> Board {
        let side_length = self.side_length as usize;
        let num_per_wall = (side_length + 7) / 8;
        let segment_length = side_length / num_per_wall;
        let is_odd_length = side_length % 2 == 1;

        // Get the indices of the fields for which walls will be set.
        let get_indices = |generator: &mut Self| {
            let mut indices = Vec::with_capacity(num_per_wall);
            let mut segment_sum = 0;
            for n in 0..num_per_wall {
                let mut len = segment_length;
                if is_odd_length && (num_per_wall - n) % 2 == 1 {
                    len += 1;
                }

                // Exclude the first field of the first segment.
                let start = segment_sum + (n == 0) as usize;

                segment_sum += len;

                let mut end = segment_sum - 1;
                if n == num_per_wall - 1 {
                    // Exclude the last two fields of the last segment.
                    end = side_length - 2;
                }

                indices.push(generator.rng.gen_range(start..end) as PositionEncoding)
            }
            indices
        };

        let last = self.side_length - 1;

        // Set protrusions at the top and bottom.
        for &row in &[0, last] {
            for col in get_indices(self) {
                let pos = board.position(col, row);
                board = board.set_wall(pos, Direction::East);
                self.add_occupied_field((col, row));
            }
        }

        // Set protrusions at walls on the left and on the right.
        for &col in &[0, last] {
            for row in get_indices(self) {
                let pos = board.position(col, row);
                board = board.set_wall(pos, Direction::South);
                self.add_occupied_field((col, row));
            }
        }

        board
    }

    /// Adds a field and its surroundings to `self.occupied_fields`.
    fn add_occupied_field(&mut self, (col, row): (PositionEncoding, PositionEncoding)) {
        let additions: Vec<(_, fn(_, _) -> _)> = vec![
            (1, PositionEncoding::checked_sub),
            (0, PositionEncoding::checked_add),
            (1, PositionEncoding::checked_add),
        ];
        for (col_add, row_add) in additions.iter().cartesian_product(&additions) {
            let col = match col_add.1(col, col_add.0) {
                Some(col) if col < self.side_length => col,
                _ => continue,
            };
            let row = match row_add.1(row, row_add.0) {
                Some(row) if row < self.side_length => row,
                _ => continue,
            };
            self.occupied_fields.insert((col, row));
        }
    }
}

/// Returns all fields inside `((col, row), (width, height))` which aren't occupied yet.
fn free_fields(
    occupied: &BTreeSet<(PositionEncoding, PositionEncoding)>,
    ((col, row), (width, height)): (
        (PositionEncoding, PositionEncoding),
        (PositionEncoding, PositionEncoding),
    ),
) -> Vec<(PositionEncoding, PositionEncoding)> {
    (col..(col + width))
        .cartesian_product(row..(row + height))
        .filter(|field| !occupied.contains(field))
        .collect()
}
