//! A snake: a head that remembers its trajectory plus a chain of segments following it.
//!
//! Snakes do not hold on to the food, teleporters or other snakes they interact
//! with. The [World](crate::world::World) lends them a [TickContext] for the
//! duration of their own tick instead.
use std::fmt;

use itertools::Itertools;
use rand::Rng;
use serde::Serialize;
use tracing::debug;

use crate::ai::{AiWeights, SnakeAi};
use crate::entity::{BoundedEntity, HistoryEntity};
use crate::food::FoodPool;
use crate::teleporter::Teleporter;
use crate::types::{Bounds, Direction, FoodId, Position, SnakeId};

/// segments appended for every food eaten
pub const SEGMENTS_PER_FOOD: usize = 3;

/// Read-only view of a snake's head and body, what collision and legality checks need
#[derive(Debug, Clone, Copy)]
pub struct SnakeView<'a> {
    head: &'a HistoryEntity,
    body: &'a [HistoryEntity],
}

impl<'a> SnakeView<'a> {
    /// builds a view over a head and its body
    pub fn new(head: &'a HistoryEntity, body: &'a [HistoryEntity]) -> Self {
        SnakeView { head, body }
    }

    /// cell of the head
    pub fn position(&self) -> Position {
        self.head.position
    }

    /// facing of the head
    pub fn direction(&self) -> Direction {
        self.head.direction
    }

    /// the area the head must stay in
    pub fn bounds(&self) -> Bounds {
        self.head.bounds
    }

    /// segment positions, nearest the head first
    pub fn body_positions(&self) -> impl Iterator<Item = Position> + 'a {
        self.body.iter().map(|s| s.position)
    }

    /// where the head lands moving in `direction`
    pub fn projected_position(&self, direction: Direction) -> Position {
        self.head.projected_position(direction)
    }

    /// anything but a 180 degree turn is legal
    pub fn is_legal_direction_change(&self, direction: Direction) -> bool {
        self.head.direction.is_not_opposite(&direction)
    }

    /// a cell kills the head if it is on the body or off the board
    pub fn collides_at(&self, pos: &Position) -> bool {
        !self.head.bounds.contains(pos) || self.body.iter().any(|s| s.position == *pos)
    }

    /// would stepping in `direction` kill the head
    pub fn will_collide(&self, direction: Direction) -> bool {
        self.collides_at(&self.projected_position(direction))
    }

    /// legal and not immediately fatal
    pub fn is_safe(&self, direction: Direction) -> bool {
        self.is_legal_direction_change(direction) && !self.will_collide(direction)
    }
}

/// Every snake in the world except the one currently ticking
pub struct Siblings<'a> {
    before: &'a mut [Snake],
    after: &'a mut [Snake],
}

impl fmt::Debug for Siblings<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter().map(|s| s.id())).finish()
    }
}

impl<'a> Siblings<'a> {
    /// no siblings at all
    pub fn none() -> Self {
        Siblings {
            before: Default::default(),
            after: Default::default(),
        }
    }

    /// splits `snakes` into the snake at `index` and everybody else
    pub fn split(snakes: &'a mut [Snake], index: usize) -> Option<(&'a mut Snake, Siblings<'a>)> {
        if index >= snakes.len() {
            return None;
        }
        let (before, rest) = snakes.split_at_mut(index);
        let (snake, after) = rest.split_first_mut()?;
        Some((snake, Siblings { before, after }))
    }

    /// number of other snakes
    pub fn len(&self) -> usize {
        self.before.len() + self.after.len()
    }

    /// true when this snake is alone
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// the other snakes in id order
    pub fn iter(&self) -> impl Iterator<Item = &Snake> + '_ {
        self.before.iter().chain(self.after.iter())
    }

    /// the other snakes in id order, mutably
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Snake> + '_ {
        self.before.iter_mut().chain(self.after.iter_mut())
    }

    /// drops the goal of every sibling chasing the food on `pos`
    pub fn release_goals_at(&mut self, foods: &FoodPool, pos: Position) {
        for sibling in self.iter_mut() {
            sibling.release_goal_if_at(foods, pos);
        }
    }
}

/// What a snake borrows from the world while it ticks
pub struct TickContext<'a, R: Rng + ?Sized> {
    /// shared food
    pub foods: &'a mut FoodPool,
    /// shared teleporters
    pub teleporters: &'a mut [Teleporter],
    /// the other snakes
    pub siblings: Siblings<'a>,
    /// random source
    pub rng: &'a mut R,
}

impl<R: Rng + ?Sized> fmt::Debug for TickContext<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickContext")
            .field("foods", &self.foods)
            .field("teleporters", &self.teleporters)
            .field("siblings", &self.siblings)
            .finish()
    }
}

/// what happened to one snake during one tick
#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// moved forward
    pub moved: bool,
    /// stepped one state backwards
    pub rewound: bool,
    /// foods eaten this tick
    pub foods_eaten: u32,
    /// went through a teleporter
    pub teleported: bool,
    /// collided
    pub died: bool,
    /// was put back at its spawn after dying
    pub respawned: bool,
}

/// A snake agent.
#[derive(Debug, Clone)]
pub struct Snake {
    id: SnakeId,
    head: HistoryEntity,
    body: Vec<HistoryEntity>,
    initial_position: Position,
    initial_direction: Direction,
    dead: bool,
    ai_controlled: bool,
    rewinding: bool,
    foods_eaten: u32,
    ai: SnakeAi,
}

impl Snake {
    /// a player-controlled snake with unbounded history and default AI weights
    pub fn new(id: SnakeId, direction: Direction, position: Position, bounds: Bounds) -> Self {
        Snake {
            id,
            head: HistoryEntity::unbounded(BoundedEntity::new(direction, position, bounds)),
            body: Vec::new(),
            initial_position: position,
            initial_direction: direction,
            dead: false,
            ai_controlled: false,
            rewinding: false,
            foods_eaten: 0,
            ai: SnakeAi::new(AiWeights::default()),
        }
    }

    /// caps how many head moves can be rewound
    pub fn with_max_history(mut self, max_history: usize) -> Self {
        self.head = HistoryEntity::new(*self.head, max_history);
        self
    }

    /// replaces the AI weights
    pub fn with_ai_weights(mut self, weights: AiWeights) -> Self {
        self.ai = SnakeAi::new(weights);
        self
    }

    /// puts the AI in control
    pub fn with_ai(mut self, ai_controlled: bool) -> Self {
        self.ai_controlled = ai_controlled;
        self
    }

    /// this snake's index in its world
    pub fn id(&self) -> SnakeId {
        self.id
    }

    /// head position
    pub fn position(&self) -> Position {
        self.head.position
    }

    /// head facing
    pub fn direction(&self) -> Direction {
        self.head.direction
    }

    /// the area the snake lives in
    pub fn bounds(&self) -> Bounds {
        self.head.bounds
    }

    /// the head with its rewind history
    pub fn head(&self) -> &HistoryEntity {
        &self.head
    }

    /// body segments, nearest the head first
    pub fn body(&self) -> &[HistoryEntity] {
        &self.body
    }

    /// body segment positions, nearest the head first
    pub fn body_positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.body.iter().map(|s| s.position)
    }

    /// the score is the body length
    pub fn score(&self) -> usize {
        self.body.len()
    }

    /// set by a collision, cleared by respawn or rewind
    pub fn is_dead(&self) -> bool {
        self.dead
    }

    /// whether the AI picks the direction each tick
    pub fn is_ai_controlled(&self) -> bool {
        self.ai_controlled
    }

    /// whether ticks step this snake backwards
    pub fn is_rewinding(&self) -> bool {
        self.rewinding
    }

    /// foods eaten since the last respawn
    pub fn foods_eaten(&self) -> u32 {
        self.foods_eaten
    }

    /// spawn cell
    pub fn initial_position(&self) -> Position {
        self.initial_position
    }

    /// spawn facing
    pub fn initial_direction(&self) -> Direction {
        self.initial_direction
    }

    /// the AI state, used even while the AI is not in control
    pub fn ai(&self) -> &SnakeAi {
        &self.ai
    }

    #[cfg(test)]
    pub(crate) fn ai_mut(&mut self) -> &mut SnakeAi {
        &mut self.ai
    }

    /// the cached goal food, which may have been removed from the pool since
    pub fn goal_food(&self) -> Option<FoodId> {
        self.ai.goal_food()
    }

    /// where the goal food currently is, if it still exists
    pub fn goal_position(&self, foods: &FoodPool) -> Option<Position> {
        self.ai.goal_food().and_then(|id| foods.position(id))
    }

    /// forgets the goal food
    pub fn release_goal_food(&mut self) {
        self.ai.release_goal();
    }

    /// drops the goal when it is the food sitting on `pos`
    pub fn release_goal_if_at(&mut self, foods: &FoodPool, pos: Position) {
        if self.goal_position(foods) == Some(pos) {
            self.ai.release_goal();
        }
    }

    /// read-only view for collision and legality checks
    pub fn view(&self) -> SnakeView<'_> {
        SnakeView::new(&self.head, &self.body)
    }

    /// anything but a 180 degree turn is legal
    pub fn is_legal_direction_change(&self, direction: Direction) -> bool {
        self.view().is_legal_direction_change(direction)
    }

    /// would stepping in `direction` kill the head
    pub fn will_collide(&self, direction: Direction) -> bool {
        self.view().will_collide(direction)
    }

    /// changes the facing unless it is a reversal. returns whether it was accepted
    pub fn set_direction(&mut self, direction: Direction) -> bool {
        if self.is_legal_direction_change(direction) {
            self.head.direction = direction;
            true
        } else {
            false
        }
    }

    /// hands control to the AI or takes it back
    pub fn toggle_ai(&mut self) {
        self.ai_controlled = !self.ai_controlled;
    }

    /// puts the AI in or out of control
    pub fn set_ai_controlled(&mut self, ai_controlled: bool) {
        self.ai_controlled = ai_controlled;
    }

    /// starts or stops rewinding, evaluated at the start of this snake's next tick
    pub fn set_rewind(&mut self, rewinding: bool) {
        self.rewinding = rewinding;
    }

    /// Back to the spawn cell and facing with no history, no body and nothing eaten.
    /// Whether the AI is in control and whether the snake is rewinding are kept.
    pub fn respawn(&mut self) {
        self.head.position = self.initial_position;
        self.head.direction = self.initial_direction;
        self.head.clear_history();
        self.dead = false;
        self.body.clear();
        self.foods_eaten = 0;
        self.ai.release_goal();
        debug!(snake = self.id.0, position = %self.initial_position, "respawned");
    }

    /// Runs one tick: move (or rewind), then eat, teleport and check for collisions.
    pub fn run<R: Rng + ?Sized>(
        &mut self,
        ctx: &mut TickContext<'_, R>,
        respawn_on_death: bool,
    ) -> TickReport {
        let mut report = TickReport::default();

        // reverse motion revives the dead so they can be stepped back
        if self.rewinding {
            self.dead = false;
        }
        if self.dead {
            return report;
        }

        if self.rewinding {
            report.rewound = self.rewind_step();
            return report;
        }

        self.forward_step(ctx);
        report.moved = true;
        report.foods_eaten = self.eat(ctx);
        report.teleported = self.teleport(ctx);

        if self.view().collides_at(&self.head.position) {
            self.dead = true;
            report.died = true;
            debug!(snake = self.id.0, position = %self.head.position, score = self.score(), "collided");
            if respawn_on_death {
                self.respawn();
                report.respawned = true;
            }
        }

        report
    }

    fn propagate_body(&mut self) {
        let mut vacated = self.head.position;
        for segment in self.body.iter_mut() {
            let previous = segment.position;
            segment.push_state(previous);
            segment.position = vacated;
            vacated = previous;
        }
    }

    fn forward_step<R: Rng + ?Sized>(&mut self, ctx: &mut TickContext<'_, R>) {
        self.propagate_body();

        if self.ai_controlled {
            let view = SnakeView::new(&self.head, &self.body);
            let choice =
                self.ai
                    .choose_direction(view, &*ctx.foods, &mut ctx.siblings, &mut *ctx.rng);
            self.set_direction(choice);
        }

        self.head.move_in_direction(None);
    }

    fn rewind_step(&mut self) -> bool {
        // whatever the goal was, it was chosen for a state we are leaving
        self.ai.release_goal();

        if !self.head.rewind() {
            return false;
        }
        // segments that run out of history were grown after this point, so they go
        for i in (0..self.body.len()).rev() {
            if !self.body[i].rewind() {
                self.body.remove(i);
            }
        }
        true
    }

    fn grow(&mut self) {
        let bounds = self.head.bounds;
        let max_history = self.head.max_history();
        for _ in 0..SEGMENTS_PER_FOOD {
            self.body.push(HistoryEntity::new(
                BoundedEntity::new(Direction::default(), bounds.staging_position(), bounds),
                max_history,
            ));
        }
    }

    fn eat<R: Rng + ?Sized>(&mut self, ctx: &mut TickContext<'_, R>) -> u32 {
        let pos = self.head.position;
        let eaten = ctx.foods.ids_at(pos).collect_vec();
        for id in eaten.iter() {
            ctx.siblings.release_goals_at(&*ctx.foods, pos);
            self.ai.release_goal();
            ctx.foods.relocate(*id, &mut *ctx.rng);
            self.grow();
            self.foods_eaten += 1;
            debug!(snake = self.id.0, food = id.0, position = %pos, score = self.score(), "ate food");
        }
        eaten.len() as u32
    }

    fn teleport<R: Rng + ?Sized>(&mut self, ctx: &mut TickContext<'_, R>) -> bool {
        let pos = self.head.position;
        for teleporter in ctx.teleporters.iter_mut() {
            if let Some(entered) = teleporter.endpoint_at(&pos) {
                let target = entered.partner();
                self.head.position = teleporter.position_of(target);
                teleporter.relocate_endpoint(target, &mut *ctx.rng);
                self.ai.release_goal();
                debug!(snake = self.id.0, from = %pos, to = %self.head.position, "teleported");
                return true;
            }
        }
        false
    }
}
