//! Entities that occupy a single cell of the grid
pub mod history;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::types::{Bounds, Direction, Position};

pub use history::{HistoryEntity, HistoryEntry};

/// Something sitting on one cell, with a facing and the bounds it may be placed in
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundedEntity {
    /// current cell
    pub position: Position,
    /// current facing
    pub direction: Direction,
    /// area random placement draws from
    pub bounds: Bounds,
}

impl BoundedEntity {
    /// makes a new entity
    pub fn new(direction: Direction, position: Position, bounds: Bounds) -> Self {
        BoundedEntity {
            position,
            direction,
            bounds,
        }
    }

    /// makes an entity facing the default direction on a random cell of `bounds`
    pub fn at_random<R: Rng + ?Sized>(bounds: Bounds, rng: &mut R) -> Self {
        let mut entity = Self::new(Direction::default(), bounds.min, bounds);
        entity.relocate_randomly(rng);
        entity
    }

    /// moves to a uniformly random cell inside the bounds, the facing is untouched
    pub fn relocate_randomly<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.position = self.bounds.random_position(rng);
    }
}
