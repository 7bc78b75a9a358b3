//! paired teleporters
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::entity::BoundedEntity;
use crate::types::{Bounds, Position};

/// one side of a [Teleporter]
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    #[allow(missing_docs)]
    Entrance,
    #[allow(missing_docs)]
    Exit,
}

impl Endpoint {
    /// the other side
    pub fn partner(self) -> Endpoint {
        match self {
            Endpoint::Entrance => Endpoint::Exit,
            Endpoint::Exit => Endpoint::Entrance,
        }
    }
}

/// Two linked cells. Stepping onto either one puts a snake on the other.
/// The two endpoints never share a cell, which needs bounds of at least two cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Teleporter {
    entrance: BoundedEntity,
    exit: BoundedEntity,
}

impl Teleporter {
    /// places both endpoints at random
    pub fn new<R: Rng + ?Sized>(bounds: Bounds, rng: &mut R) -> Self {
        let mut teleporter = Teleporter {
            entrance: BoundedEntity::new(Default::default(), bounds.min, bounds),
            exit: BoundedEntity::new(Default::default(), bounds.min, bounds),
        };
        teleporter.relocate(rng);
        teleporter
    }

    /// makes a teleporter at fixed cells, `None` if they coincide
    pub fn at(bounds: Bounds, entrance: Position, exit: Position) -> Option<Self> {
        if entrance == exit {
            return None;
        }
        Some(Teleporter {
            entrance: BoundedEntity::new(Default::default(), entrance, bounds),
            exit: BoundedEntity::new(Default::default(), exit, bounds),
        })
    }

    /// cell of the entrance
    pub fn entrance(&self) -> Position {
        self.entrance.position
    }

    /// cell of the exit
    pub fn exit(&self) -> Position {
        self.exit.position
    }

    /// position of the given endpoint
    pub fn position_of(&self, endpoint: Endpoint) -> Position {
        match endpoint {
            Endpoint::Entrance => self.entrance.position,
            Endpoint::Exit => self.exit.position,
        }
    }

    /// which endpoint, if any, sits on `pos`. the entrance is checked first
    pub fn endpoint_at(&self, pos: &Position) -> Option<Endpoint> {
        if self.entrance.position == *pos {
            Some(Endpoint::Entrance)
        } else if self.exit.position == *pos {
            Some(Endpoint::Exit)
        } else {
            None
        }
    }

    /// re-rolls both endpoints
    pub fn relocate<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if !self.entrance.bounds.is_non_degenerate() {
            return;
        }
        self.entrance.relocate_randomly(rng);
        self.relocate_endpoint(Endpoint::Exit, rng);
    }

    /// Re-rolls `endpoint` until it lands somewhere other than its partner.
    /// Bounds with fewer than two cells leave the endpoint where it is.
    pub fn relocate_endpoint<R: Rng + ?Sized>(&mut self, endpoint: Endpoint, rng: &mut R) {
        let (anchor, moving) = match endpoint {
            Endpoint::Entrance => (self.exit.position, &mut self.entrance),
            Endpoint::Exit => (self.entrance.position, &mut self.exit),
        };
        if moving.bounds.cell_count() < 2 {
            return;
        }
        loop {
            moving.relocate_randomly(rng);
            if moving.position != anchor {
                break;
            }
        }
    }
}
