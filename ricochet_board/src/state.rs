use crate::{Board, Direction, Move, Placement, Position, Robot};

/// Everything needed to take back a move played with
/// [`SearchState::apply_move`](SearchState::apply_move).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Undo {
    robot: Robot,
    from: Position,
    last: Option<Move>,
}

/// The mutable state robots are moved in while searching.
///
/// Holds the current placement, the move that led to it and the number of moves played so far.
/// Every cell additionally carries an occupied flag so finding the landing cell of a move doesn't
/// need to look at all robots for every step.
///
/// Moves are played in place with [`apply_move`](Self::apply_move) and taken back with
/// [`undo_move`](Self::undo_move). Each undo has to be passed back in the reverse order the moves
/// were applied in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchState {
    placement: Placement,
    last: Option<Move>,
    moves: usize,
    occupied: Vec<bool>,
}

impl SearchState {
    /// Creates a state for `placement` on `board` without any moves played.
    ///
    /// # Panics
    /// Moving robots on a board which isn't enclosed by walls walks off the board and panics.
    /// Debug builds check the enclosure right here.
    pub fn new(board: &Board, placement: Placement) -> Self {
        debug_assert!(board.open_edge().is_none(), "the board has to be enclosed");
        let mut occupied = vec![false; board.cell_count()];
        for &pos in placement.robots() {
            occupied[pos.index()] = true;
        }
        Self {
            placement,
            last: None,
            moves: 0,
            occupied,
        }
    }

    /// Replaces the current placement with `placement`, which was reached after `moves` moves with
    /// `last` being the final one.
    pub fn load(&mut self, placement: Placement, last: Option<Move>, moves: usize) {
        for &pos in self.placement.robots() {
            self.occupied[pos.index()] = false;
        }
        for &pos in placement.robots() {
            self.occupied[pos.index()] = true;
        }
        self.placement = placement;
        self.last = last;
        self.moves = moves;
    }

    /// Returns the current positions of the robots.
    #[inline(always)]
    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    /// Returns the move that led to the current placement.
    pub fn last_move(&self) -> Option<Move> {
        self.last
    }

    /// Returns the number of moves played.
    pub fn moves(&self) -> usize {
        self.moves
    }

    /// Checks if a robot stands on `pos`.
    #[inline(always)]
    pub fn is_occupied(&self, pos: Position) -> bool {
        self.occupied[pos.index()]
    }

    /// Checks if moving `robot` in `direction` is worth trying.
    ///
    /// A move is rejected if the robot would not move at all, because of a wall or a robot right
    /// next to it, or if it reverses the directly preceding move of the same robot. Reversing a
    /// move of the same robot ends up either where the robot started or where moving in the
    /// reversed direction right away would have ended, so such a move never shortens a solution.
    #[inline]
    pub fn can_move(&self, board: &Board, robot: Robot, direction: Direction) -> bool {
        if self.last == Some(Move::new(robot, direction.reverse())) {
            return false;
        }
        let pos = self.placement[robot];
        if board.is_adjacent_to_wall(pos, direction) {
            return false;
        }
        !self.is_occupied(board.step(pos, direction))
    }

    /// Returns the cell `robot` stops on when it is moved in `direction`.
    ///
    /// The robot slides until the next step would cross a wall or hit another robot. If the move
    /// is blocked right away, the current position is returned.
    #[inline]
    pub fn landing(&self, board: &Board, robot: Robot, direction: Direction) -> Position {
        let mut pos = self.placement[robot];
        while !board.is_adjacent_to_wall(pos, direction) {
            let next = board.step(pos, direction);
            if self.is_occupied(next) {
                break;
            }
            pos = next;
        }
        pos
    }

    /// Moves `robot` as far in the given `direction` as possible.
    ///
    /// Returns the information needed to take the move back with
    /// [`undo_move`](Self::undo_move).
    #[inline]
    pub fn apply_move(&mut self, board: &Board, robot: Robot, direction: Direction) -> Undo {
        let from = self.placement[robot];
        let to = self.landing(board, robot, direction);
        let undo = Undo {
            robot,
            from,
            last: self.last,
        };

        self.occupied[from.index()] = false;
        self.occupied[to.index()] = true;
        self.placement.set_robot(robot, to);
        self.last = Some(Move::new(robot, direction));
        self.moves += 1;
        undo
    }

    /// Takes back the move `undo` was created by.
    #[inline]
    pub fn undo_move(&mut self, undo: Undo) {
        let to = self.placement[undo.robot];
        self.occupied[to.index()] = false;
        self.occupied[undo.from.index()] = true;
        self.placement.set_robot(undo.robot, undo.from);
        self.last = undo.last;
        self.moves -= 1;
    }

    /// Creates an Iterator over all moves accepted by [`can_move`](Self::can_move).
    ///
    /// Robots are enumerated first, directions second, both in their standard order.
    pub fn legal_moves<'a>(&'a self, board: &'a Board) -> impl Iterator<Item = Move> + 'a {
        self.placement
            .robot_ids()
            .iter()
            .flat_map(|&robot| crate::DIRECTIONS.iter().map(move |&dir| Move::new(robot, dir)))
            .filter(move |mv| self.can_move(board, mv.robot, mv.direction))
    }
}
