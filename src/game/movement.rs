use std::collections::{BTreeSet, HashMap, VecDeque};

use super::{GameMap, GridPosition};

/// Calculate reachable tiles using BFS.
///
/// A cell is reachable when the cheapest path into it costs no more than
/// `movement`. Cells are re-expanded whenever a cheaper path turns up, so a
/// plain FIFO queue is enough for the small integer costs involved. Water is
/// never entered. Occupancy is the caller's business. The start cell itself
/// is not part of the result.
pub fn calculate_movement_range(
    start: GridPosition,
    movement: u32,
    map: &GameMap,
) -> BTreeSet<GridPosition> {
    let mut visited: HashMap<GridPosition, u32> = HashMap::new();
    let mut queue = VecDeque::new();

    queue.push_back((start, 0u32));
    visited.insert(start, 0);

    while let Some((pos, cost)) = queue.pop_front() {
        // Stale entry: a cheaper route reached this cell after it was queued
        if visited.get(&pos).is_some_and(|&best| best < cost) {
            continue;
        }

        for next in pos.neighbors() {
            let Some(move_cost) = map.terrain_at(next).and_then(|t| t.movement_cost()) else {
                continue;
            };

            let new_cost = cost + move_cost;
            if new_cost > movement {
                continue;
            }

            let should_visit = visited
                .get(&next)
                .map(|&prev_cost| new_cost < prev_cost)
                .unwrap_or(true);

            if should_visit {
                visited.insert(next, new_cost);
                queue.push_back((next, new_cost));
            }
        }
    }

    visited.remove(&start);
    visited.into_keys().collect()
}

pub fn is_within_move_range(
    from: GridPosition,
    to: GridPosition,
    movement: u32,
    map: &GameMap,
) -> bool {
    calculate_movement_range(from, movement, map).contains(&to)
}
