//! The individual steps of the AI cascade
use fxhash::FxHashSet;
use rand::Rng;
use tracing::trace;

use super::SnakeAi;
use crate::food::FoodPool;
use crate::snake::{Siblings, SnakeView};
use crate::types::{Bounds, Direction, FoodId, Position};

/// Direction toward the goal food, claiming a new goal first when none is cached.
///
/// Candidates are tried vertical first (Up, Down) then horizontal (Left, Right);
/// the first one that closes the gap on its axis and is safe is returned.
pub fn closest_food_direction(
    ai: &mut SnakeAi,
    me: SnakeView<'_>,
    foods: &FoodPool,
    siblings: &mut Siblings<'_>,
) -> Option<Direction> {
    let cached = ai
        .goal_food()
        .and_then(|id| foods.position(id).map(|pos| (id, pos)));
    let target = match cached {
        Some((_, pos)) => pos,
        None => {
            let claimed = claim_closest_food(me, foods, siblings);
            ai.set_goal(claimed.map(|(id, _)| id));
            claimed?.1
        }
    };

    let here = me.position();
    let wanted = [
        (here.y > target.y, Direction::Up),
        (here.y < target.y, Direction::Down),
        (here.x > target.x, Direction::Left),
        (here.x < target.x, Direction::Right),
    ];
    wanted
        .iter()
        .find(|(closes_gap, direction)| *closes_gap && me.is_safe(*direction))
        .map(|(_, direction)| *direction)
}

/// Finds the nearest food this snake may chase and takes it from any farther sibling.
///
/// Food under the snake's own body is skipped. Food already claimed by a sibling
/// at the same distance or closer is skipped too, the incumbent keeps it.
/// Siblings that claimed the chosen food from farther away lose their claim.
pub fn claim_closest_food(
    me: SnakeView<'_>,
    foods: &FoodPool,
    siblings: &mut Siblings<'_>,
) -> Option<(FoodId, Position)> {
    let here = me.position();
    let under_body: FxHashSet<Position> = me.body_positions().collect();

    let mut best: Option<(FoodId, Position, i32)> = None;
    for (id, food) in foods.iter() {
        let distance = here.distance(&food);
        if best.map_or(false, |(_, _, d)| distance >= d) {
            continue;
        }
        if under_body.contains(&food) {
            continue;
        }
        if held_by_nearer_sibling(food, distance, foods, siblings) {
            continue;
        }
        best = Some((id, food, distance));
    }

    let (id, food, distance) = best?;
    for sibling in siblings.iter_mut() {
        if sibling.goal_position(foods) == Some(food) {
            trace!(
                snake = sibling.id().0,
                food = id.0,
                distance,
                "claim taken by a nearer snake"
            );
            sibling.release_goal_food();
        }
    }
    Some((id, food))
}

fn held_by_nearer_sibling(
    food: Position,
    distance: i32,
    foods: &FoodPool,
    siblings: &Siblings<'_>,
) -> bool {
    siblings
        .iter()
        .any(|s| s.goal_position(foods) == Some(food) && s.position().distance(&food) <= distance)
}

/// Votes for the side of the head with the most room.
///
/// Every living snake, this one included, casts one evaluation. An evaluation
/// starts each vertical tally at that snake's `bounds.max.y` and each horizontal
/// tally at `bounds.max.x`, then knocks one off per own-body segment lying on
/// that side of the head in the head's column or row. The vote goes to the
/// first direction in Up, Down, Left, Right order that has the largest tally
/// and is safe. The winner is picked from the votes the same way.
pub fn most_open_direction(me: SnakeView<'_>, siblings: &Siblings<'_>) -> Option<Direction> {
    let mut votes = [0i32; 4];
    let evaluations = std::iter::once(me.bounds()).chain(
        siblings
            .iter()
            .filter(|s| !s.is_dead())
            .map(|s| s.bounds()),
    );
    for bounds in evaluations {
        if let Some(direction) = first_safe_largest(&free_cells(me, bounds), me) {
            votes[direction.as_index()] += 1;
        }
    }
    first_safe_largest(&votes, me)
}

/// free cell tallies indexed like [Direction::as_index]
pub fn free_cells(me: SnakeView<'_>, bounds: Bounds) -> [i32; 4] {
    let here = me.position();
    let mut free = [bounds.max.y, bounds.max.y, bounds.max.x, bounds.max.x];
    for segment in me.body_positions() {
        if segment.x == here.x {
            if segment.y < here.y {
                free[Direction::Up.as_index()] -= 1;
            } else if segment.y > here.y {
                free[Direction::Down.as_index()] -= 1;
            }
        }
        if segment.y == here.y {
            if segment.x < here.x {
                free[Direction::Left.as_index()] -= 1;
            } else if segment.x > here.x {
                free[Direction::Right.as_index()] -= 1;
            }
        }
    }
    free
}

fn first_safe_largest(tallies: &[i32; 4], me: SnakeView<'_>) -> Option<Direction> {
    let largest = tallies.iter().copied().max()?;
    Direction::all()
        .iter()
        .copied()
        .find(|d| tallies[d.as_index()] == largest && me.is_safe(*d))
}

/// up to `attempts` uniformly random directions, the first safe one wins
pub fn random_direction<R: Rng + ?Sized>(
    me: SnakeView<'_>,
    attempts: u32,
    rng: &mut R,
) -> Option<Direction> {
    (0..attempts)
        .map(|_| Direction::random(rng))
        .find(|d| me.is_safe(*d))
}
