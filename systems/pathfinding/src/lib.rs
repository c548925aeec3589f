#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure breadth-first pathfinding over the combat grid.
//!
//! Two operations live here. [`DistanceField::rebuild_with`] computes the
//! shortest hop-count from an acting unit's position to every cell reachable
//! through unblocked terrain. [`first_step`] then re-derives the unique
//! reading-order-minimal first move toward a chosen goal by walking the
//! field backward. The two-pass split is deliberate: the movement rules fix
//! the goal first (nearest in-range cell, reading order on ties) and only
//! then resolve the path, and a greedy descent toward lower distances picks
//! the wrong first step when several shortest paths exist.

use std::collections::VecDeque;

use skirmish_core::Position;

const UNREACHABLE: u16 = u16::MAX;

/// Dense shortest-distance grid seeded from a single origin.
///
/// The buffer is reused across rebuilds so a full battle performs one
/// allocation per board size, not one per unit turn.
#[derive(Clone, Debug, Default)]
pub struct DistanceField {
    width: u32,
    height: u32,
    distances: Vec<u16>,
}

impl DistanceField {
    /// Creates an empty field; call [`rebuild_with`](Self::rebuild_with)
    /// before querying distances.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the distances via breadth-first search from `origin`.
    ///
    /// `is_blocked` decides which cells the traversal may not enter; for
    /// combat movement that is every wall and every cell occupied by a
    /// living unit. The origin itself is exempt from the predicate because
    /// the traversal starts beneath the acting unit.
    pub fn rebuild_with<F>(&mut self, width: u32, height: u32, origin: Position, is_blocked: F)
    where
        F: Fn(Position) -> bool,
    {
        let cell_count = usize::try_from(u64::from(width) * u64::from(height)).unwrap_or(0);

        self.width = width;
        self.height = height;
        if self.distances.len() != cell_count {
            self.distances = vec![UNREACHABLE; cell_count];
        } else {
            self.distances.fill(UNREACHABLE);
        }

        let Some(origin_index) = self.index(origin) else {
            return;
        };
        self.distances[origin_index] = 0;

        let mut queue = VecDeque::new();
        queue.push_back(origin);

        while let Some(current) = queue.pop_front() {
            let Some(current_index) = self.index(current) else {
                continue;
            };
            let current_distance = self.distances[current_index];
            if current_distance >= UNREACHABLE - 1 {
                continue;
            }
            let next_distance = current_distance + 1;

            for neighbor in current.neighbors() {
                if is_blocked(neighbor) {
                    continue;
                }
                let Some(neighbor_index) = self.index(neighbor) else {
                    continue;
                };
                if self.distances[neighbor_index] <= next_distance {
                    continue;
                }
                self.distances[neighbor_index] = next_distance;
                queue.push_back(neighbor);
            }
        }
    }

    /// Shortest hop-count to the given position.
    ///
    /// Returns `None` for positions outside the field and positions the
    /// origin cannot reach; unreachable never compares equal to any real
    /// distance.
    #[must_use]
    pub fn distance(&self, position: Position) -> Option<u16> {
        let index = self.index(position)?;
        let stored = self.distances[index];
        (stored != UNREACHABLE).then_some(stored)
    }

    fn index(&self, position: Position) -> Option<usize> {
        if position.col() < self.width && position.row() < self.height {
            let row = usize::try_from(position.row()).ok()?;
            let col = usize::try_from(position.col()).ok()?;
            let width = usize::try_from(self.width).ok()?;
            Some(row * width + col)
        } else {
            None
        }
    }
}

/// Resolves the first move from `origin` toward `goal`.
///
/// `field` must have been rebuilt from `origin`. Starting at the goal, the
/// frontier of each decreasing distance level is expanded into predecessors
/// (neighbors whose stored distance is exactly one less); at level 1 the
/// surviving frontier holds the first cells of every shortest path, and the
/// reading-order minimum among them is the step. Returns `None` when the
/// goal is unreachable or is the origin itself.
#[must_use]
pub fn first_step(origin: Position, goal: Position, field: &DistanceField) -> Option<Position> {
    let mut distance = field.distance(goal)?;
    if distance == 0 {
        return None;
    }

    let mut frontier = vec![goal];
    let mut predecessors = Vec::new();
    while distance > 1 {
        distance -= 1;
        predecessors.clear();
        for position in &frontier {
            for neighbor in position.neighbors() {
                if field.distance(neighbor) == Some(distance) {
                    predecessors.push(neighbor);
                }
            }
        }
        predecessors.sort_unstable();
        predecessors.dedup();
        std::mem::swap(&mut frontier, &mut predecessors);
    }

    let step = frontier.into_iter().min()?;
    debug_assert!(step.is_adjacent_to(origin));
    Some(step)
}
