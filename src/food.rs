//! the shared pool of food
use rand::Rng;
use tracing::debug;

use crate::entity::BoundedEntity;
use crate::types::{Bounds, FoodId, Position};

/// All food on the board. Food is only ever removed from the back, so a
/// [FoodId] stays valid until the food it names is removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoodPool {
    bounds: Bounds,
    foods: Vec<BoundedEntity>,
}

impl FoodPool {
    /// an empty pool placing food inside `bounds`
    pub fn new(bounds: Bounds) -> Self {
        FoodPool {
            bounds,
            foods: Vec::new(),
        }
    }

    /// a pool with `count` randomly placed foods
    pub fn with_count<R: Rng + ?Sized>(bounds: Bounds, count: usize, rng: &mut R) -> Self {
        let mut pool = Self::new(bounds);
        for _ in 0..count {
            pool.add(rng);
        }
        pool
    }

    /// number of foods
    pub fn len(&self) -> usize {
        self.foods.len()
    }

    /// true when there is no food at all
    pub fn is_empty(&self) -> bool {
        self.foods.is_empty()
    }

    /// adds one food at a random cell
    pub fn add<R: Rng + ?Sized>(&mut self, rng: &mut R) -> FoodId {
        self.foods.push(BoundedEntity::at_random(self.bounds, rng));
        let id = FoodId(self.foods.len() - 1);
        debug!(food = id.0, position = %self.foods[id.0].position, "added food");
        id
    }

    /// adds one food at a fixed cell
    pub fn add_at(&mut self, position: Position) -> FoodId {
        self.foods
            .push(BoundedEntity::new(Default::default(), position, self.bounds));
        FoodId(self.foods.len() - 1)
    }

    /// removes the most recently added food, unless it is the last one left.
    /// returns the removed id and where that food was
    pub fn remove_last(&mut self) -> Option<(FoodId, Position)> {
        if self.foods.len() <= 1 {
            return None;
        }
        let food = self.foods.pop()?;
        let id = FoodId(self.foods.len());
        debug!(food = id.0, position = %food.position, "removed food");
        Some((id, food.position))
    }

    /// position of a food, `None` once the id no longer names a food
    pub fn position(&self, id: FoodId) -> Option<Position> {
        self.foods.get(id.0).map(|f| f.position)
    }

    /// checks whether an id still names a food
    pub fn contains(&self, id: FoodId) -> bool {
        id.0 < self.foods.len()
    }

    /// every food as (id, position)
    pub fn iter(&self) -> impl Iterator<Item = (FoodId, Position)> + '_ {
        self.foods
            .iter()
            .enumerate()
            .map(|(i, f)| (FoodId(i), f.position))
    }

    /// every food position, in id order
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.foods.iter().map(|f| f.position)
    }

    /// ids of every food on `pos`
    pub fn ids_at(&self, pos: Position) -> impl Iterator<Item = FoodId> + '_ {
        self.iter()
            .filter(move |(_, p)| *p == pos)
            .map(|(id, _)| id)
    }

    /// is there any food on `pos`
    pub fn any_at(&self, pos: &Position) -> bool {
        self.foods.iter().any(|f| f.position == *pos)
    }

    /// moves one food to a random cell
    pub fn relocate<R: Rng + ?Sized>(&mut self, id: FoodId, rng: &mut R) {
        if let Some(food) = self.foods.get_mut(id.0) {
            food.relocate_randomly(rng);
        }
    }

    /// moves every food to a random cell
    pub fn relocate_all<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for food in self.foods.iter_mut() {
            food.relocate_randomly(rng);
        }
    }
}
