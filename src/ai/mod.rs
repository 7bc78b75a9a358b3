//! The per-snake decision policy.
//!
//! Every tick an AI snake walks a short cascade of heuristics. Each one is
//! attempted only if an independent roll of `0..100` falls under its chance;
//! the first one that proposes a legal, non-fatal direction wins. If none does,
//! a handful of random directions are tried before giving up and going
//! straight. A damping step then tends to cancel turns when the snake has been
//! turning a lot recently.
pub mod heuristics;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::food::FoodPool;
use crate::snake::{Siblings, SnakeView};
use crate::types::{Direction, FoodId};

/// rolls are drawn from `0..CHANCE_MAX`
pub const CHANCE_MAX: u32 = 100;

/// chances (out of [CHANCE_MAX]) and limits steering the AI
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct AiWeights {
    /// chance of heading for the closest unclaimed food
    pub closest_food: u32,
    /// chance of heading for the side of the head with the fewest own segments
    pub most_open_space: u32,
    /// chance of just carrying on
    pub straight: u32,
    /// per recent turn chance of refusing to turn
    pub damping_per_turn: u32,
    /// random directions tried before falling back to straight ahead
    pub random_attempts: u32,
}

impl Default for AiWeights {
    fn default() -> Self {
        AiWeights {
            closest_food: 75,
            most_open_space: 60,
            straight: 95,
            damping_per_turn: 5,
            random_attempts: 8,
        }
    }
}

/// one step of the cascade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heuristic {
    /// see [heuristics::closest_food_direction]
    ClosestFood,
    /// see [heuristics::most_open_direction]
    MostOpenSpace,
    /// keep the current facing
    Straight,
}

/// the cascade, in the order it is tried
pub const CASCADE: [Heuristic; 3] = [
    Heuristic::ClosestFood,
    Heuristic::MostOpenSpace,
    Heuristic::Straight,
];

impl Heuristic {
    /// chance of this step being attempted
    pub fn chance(self, weights: &AiWeights) -> u32 {
        match self {
            Heuristic::ClosestFood => weights.closest_food,
            Heuristic::MostOpenSpace => weights.most_open_space,
            Heuristic::Straight => weights.straight,
        }
    }

    /// the direction this step would like, before safety checks
    fn candidate(
        self,
        ai: &mut SnakeAi,
        me: SnakeView<'_>,
        foods: &FoodPool,
        siblings: &mut Siblings<'_>,
    ) -> Option<Direction> {
        match self {
            Heuristic::ClosestFood => heuristics::closest_food_direction(ai, me, foods, siblings),
            Heuristic::MostOpenSpace => heuristics::most_open_direction(me, siblings),
            Heuristic::Straight => Some(me.direction()),
        }
    }
}

fn roll<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    rng.gen_range(0..CHANCE_MAX)
}

/// AI state carried by each snake between ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnakeAi {
    weights: AiWeights,
    goal_food: Option<FoodId>,
    recent_turns: u32,
}

impl SnakeAi {
    /// AI state with no goal and no recent turns
    pub fn new(weights: AiWeights) -> Self {
        SnakeAi {
            weights,
            goal_food: None,
            recent_turns: 0,
        }
    }

    /// the chances this AI rolls against
    pub fn weights(&self) -> &AiWeights {
        &self.weights
    }

    /// the food this snake is chasing, as last cached
    pub fn goal_food(&self) -> Option<FoodId> {
        self.goal_food
    }

    /// forgets the cached goal, the next food search starts from scratch
    pub fn release_goal(&mut self) {
        self.goal_food = None;
    }

    pub(crate) fn set_goal(&mut self, goal: Option<FoodId>) {
        self.goal_food = goal;
    }

    /// how many more turns than straight moves were made lately
    pub fn recent_turns(&self) -> u32 {
        self.recent_turns
    }

    /// Picks the direction for this tick. The result may still be fatal when
    /// nothing safe was found, the snake's own collision check deals with that.
    pub fn choose_direction<R: Rng + ?Sized>(
        &mut self,
        me: SnakeView<'_>,
        foods: &FoodPool,
        siblings: &mut Siblings<'_>,
        rng: &mut R,
    ) -> Direction {
        let current = me.direction();
        let mut choice = self.best_direction(me, foods, siblings, rng);

        let multiplier = if foods.any_at(&me.projected_position(choice)) {
            2
        } else {
            1
        };
        let threshold = self
            .recent_turns
            .saturating_mul(multiplier)
            .saturating_mul(self.weights.damping_per_turn);
        if roll(rng) < threshold && !me.will_collide(current) {
            choice = current;
        }

        if choice != current {
            self.recent_turns += 1;
        } else {
            self.recent_turns = self.recent_turns.saturating_sub(1);
        }

        trace!(
            position = %me.position(),
            %current,
            %choice,
            recent_turns = self.recent_turns,
            goal = ?self.goal_food,
            "ai decision"
        );
        choice
    }

    fn best_direction<R: Rng + ?Sized>(
        &mut self,
        me: SnakeView<'_>,
        foods: &FoodPool,
        siblings: &mut Siblings<'_>,
        rng: &mut R,
    ) -> Direction {
        for heuristic in CASCADE.iter() {
            if roll(rng) >= heuristic.chance(&self.weights) {
                continue;
            }
            if let Some(direction) = heuristic.candidate(self, me, foods, siblings) {
                if me.is_safe(direction) {
                    return direction;
                }
            }
        }

        heuristics::random_direction(me, self.weights.random_attempts, rng)
            .unwrap_or_else(|| me.direction())
    }
}
