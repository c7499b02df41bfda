use log::debug;
use ricochet_board::{Move, Placement, Round, SearchState, DIRECTIONS};

use crate::util::{Budget, LeastMovesBoard};
use crate::visited::VisitedSet;
use crate::{Outcome, Path, Solution, Solver, SolverConfig, SolverError, Stats};

const NAME: &str = "breadth first search";

/// A visited placement in the queue of a [`BreadthFirst`](BreadthFirst) search.
#[derive(Debug, Clone, Copy)]
struct Node {
    placement: Placement,
    /// The move leading here from the parent, `None` for the start.
    last: Option<Move>,
    depth: usize,
    /// The index of the node this one was reached from.
    parent: usize,
}

/// Finds an optimal solution by visiting all possible game states in order of moves needed to
/// reach them.
///
/// Every placement is stored once in a queue together with the index of the node it was reached
/// from. Two placements which only differ in the positions of the non-target robots swapping
/// places are the same node.
#[derive(Debug, Clone, Default)]
pub struct BreadthFirst {
    config: SolverConfig,
}

impl Solver for BreadthFirst {
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

        LeastMovesBoard::for_round(round, start)?;
        let solution = self.start(round, start)?;
        solution.log(NAME);
        Ok(solution)
    }
}

impl BreadthFirst {
    /// Create a new solver which uses a breadth first search to find an optimal solution.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new solver using `config`.
    pub fn with_config(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration used by the solver.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    fn start(&mut self, round: &Round, start: &Placement) -> Result<Solution, SolverError> {
        let board = round.board();
        let target = round.target();
        let mut budget = Budget::start(&self.config);
        let mut stats = Stats::default();

        let mut visited = VisitedSet::with_capacity(self.config.table_capacity, self.config.growth)?;
        visited.add(start.canonical_key(target))?;
        let mut queue = Vec::new();
        push_node(
            &mut queue,
            Node {
                placement: *start,
                last: None,
                depth: 0,
                parent: 0,
            },
        )?;

        let mut state = SearchState::new(board, *start);
        let mut outcome = Outcome::Exhausted {
            max_depth: self.config.max_depth,
        };
        let mut layer = 0;
        let mut head = 0;
        while head < queue.len() {
            let node = queue[head];
            if let Some(reason) = budget.tick() {
                outcome = Outcome::Interrupted {
                    reason,
                    depth: node.depth,
                };
                break;
            }
            stats.nodes += 1;

            if node.depth > layer {
                debug!(
                    "finished layer {}: {} nodes queued, {} placements visited",
                    layer,
                    queue.len(),
                    visited.len()
                );
                layer = node.depth;
            }

            if round.target_reached(&node.placement) {
                outcome = Outcome::Found(path_to(&queue, head, *start));
                break;
            }

            head += 1;
            if node.depth >= self.config.max_depth {
                continue;
            }
            stats.inner += 1;

            // Compute all unseen placements reachable from `node` and add them to the queue.
            state.load(node.placement, node.last, node.depth);
            for &robot in node.placement.robot_ids() {
                for &direction in DIRECTIONS.iter() {
                    if !state.can_move(board, robot, direction) {
                        continue;
                    }
                    let undo = state.apply_move(board, robot, direction);
                    let placement = *state.placement();
                    state.undo_move(undo);

                    if !visited.add(placement.canonical_key(target))? {
                        stats.hits += 1;
                        continue;
                    }
                    push_node(
                        &mut queue,
                        Node {
                            placement,
                            last: Some(Move::new(robot, direction)),
                            depth: node.depth + 1,
                            parent: head - 1,
                        },
                    )?;
                }
            }
        }

        stats.iterations = layer + 1;
        stats.max_table_len = visited.len();
        Ok(Solution::new(outcome, stats))
    }
}

/// Appends `node` to the queue, reporting a failed allocation instead of aborting.
fn push_node(queue: &mut Vec<Node>, node: Node) -> Result<(), SolverError> {
    if queue.len() == queue.capacity() {
        let additional = queue.capacity().max(1024);
        queue
            .try_reserve(additional)
            .map_err(|source| SolverError::Allocation {
                structure: "search queue",
                requested: queue.len() + additional,
                source,
            })?;
    }
    queue.push(node);
    Ok(())
}

/// Returns the path to the node at `index` by following the parents back to the start.
fn path_to(queue: &[Node], index: usize, start: Placement) -> Path {
    let mut movements = Vec::with_capacity(queue[index].depth);
    let mut current = index;
    while let Some(movement) = queue[current].last {
        movements.push(movement);
        current = queue[current].parent;
    }

    movements.reverse();
    Path::new(start, queue[index].placement, movements)
}

#[cfg(test)]
mod tests {
    use ricochet_board::{Board, Direction, Move, Placement, Robot, Round};

    use super::BreadthFirst;
    use crate::{Interrupt, Outcome, Path, Solver, SolverConfig, SolverError};

    fn create_corner_round() -> (Round, Placement) {
        let board = Board::new_empty(4).wall_enclosure();
        let start = Placement::from_coordinates(&board, &[(3, 3), (1, 2)]).unwrap();
        let goal = board.position(0, 0);
        (Round::new(board, Robot::Red, goal).unwrap(), start)
    }

    // Test robot already on target
    #[test]
    fn on_target() {
        let board = Board::new_empty(4).wall_enclosure();
        let start = Placement::from_coordinates(&board, &[(0, 1), (2, 2)]).unwrap();
        let round = Round::new(board.clone(), Robot::Red, board.position(0, 1)).unwrap();

        let solution = BreadthFirst::new().solve(&round, &start).unwrap();
        assert_eq!(solution.path(), Some(&Path::new_start_on_target(start)));
    }

    #[test]
    fn two_moves_to_corner() {
        let (round, start) = create_corner_round();
        let solution = BreadthFirst::new().solve(&round, &start).unwrap();
        let path = solution.path().unwrap();

        assert_eq!(path.len(), 2);
        let end = round.replay(&start, path.movements()).unwrap();
        assert_eq!(&end, path.end_pos());
        assert!(round.target_reached(&end));
    }

    #[test]
    fn bank_shot() {
        let board = Board::new_empty(5).wall_enclosure();
        let start = Placement::from_coordinates(&board, &[(2, 4), (2, 1)]).unwrap();
        let round = Round::new(board.clone(), Robot::Red, board.position(2, 2)).unwrap();

        let solution = BreadthFirst::new().solve(&round, &start).unwrap();
        assert_eq!(
            solution.into_path().unwrap().movements(),
            &vec![Move::new(Robot::Red, Direction::North)]
        );

        // Without blue there's nothing to stop red in the center.
        let alone = Placement::from_coordinates(&board, &[(2, 4)]).unwrap();
        let config = SolverConfig {
            max_depth: 8,
            ..Default::default()
        };
        let solution = BreadthFirst::with_config(config)
            .solve(&round, &alone)
            .unwrap();
        assert_eq!(solution.outcome(), &Outcome::Exhausted { max_depth: 8 });
        // A lone robot can only stop on the 16 edge cells.
        assert!(solution.stats().max_table_len() <= 16);
    }

    #[test]
    fn unreachable_goal() {
        let board = Board::new_empty(4)
            .wall_enclosure()
            .enclose_lengths(2, 1, 1, 1);
        let start = Placement::from_coordinates(&board, &[(0, 3), (3, 3)]).unwrap();
        let round = Round::new(board.clone(), Robot::Blue, board.position(2, 1)).unwrap();

        match BreadthFirst::new().solve(&round, &start) {
            Err(SolverError::Unreachable { goal, start }) => {
                assert_eq!(goal, board.position(2, 1));
                assert_eq!(start, board.position(3, 3));
            }
            other => panic!("expected an unreachable goal, got {:?}", other),
        }
    }

    #[test]
    fn node_limit() {
        let (round, start) = create_corner_round();
        let config = SolverConfig {
            node_limit: Some(1),
            ..Default::default()
        };
        let solution = BreadthFirst::with_config(config)
            .solve(&round, &start)
            .unwrap();
        assert_eq!(
            solution.outcome(),
            &Outcome::Interrupted {
                reason: Interrupt::NodeLimit,
                depth: 1
            }
        );
        assert_eq!(solution.stats().nodes(), 1);
    }

    #[test]
    fn visited_allocation_failure() {
        let (round, start) = create_corner_round();
        let config = SolverConfig {
            table_capacity: usize::MAX >> 3,
            ..Default::default()
        };
        match BreadthFirst::with_config(config).solve(&round, &start) {
            Err(SolverError::Allocation { structure, .. }) => assert_eq!(structure, "visited set"),
            other => panic!("expected an allocation error, got {:?}", other),
        }
    }

    #[test]
    fn tiny_table_grows() {
        let (round, start) = create_corner_round();
        let config = SolverConfig {
            table_capacity: 1,
            ..Default::default()
        };
        let solution = BreadthFirst::with_config(config)
            .solve(&round, &start)
            .unwrap();
        assert_eq!(solution.path().map(Path::len), Some(2));
        assert!(solution.stats().max_table_len() > 1);
    }
}
