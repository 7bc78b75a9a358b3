//! An entity that remembers where it has been so it can be stepped backwards
use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};

use super::BoundedEntity;
use crate::types::{Direction, Position};

/// one remembered state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryEntry {
    #[allow(missing_docs)]
    pub position: Position,
    #[allow(missing_docs)]
    pub direction: Direction,
}

/// A [BoundedEntity] with a most-recent-first stack of prior states.
///
/// `move_in_direction` is capped at `max_history` entries, dropping the oldest.
/// `push_state` never caps: it is how a follower records the cell it leaves when
/// the chain in front of it moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntity {
    entity: BoundedEntity,
    history: VecDeque<HistoryEntry>,
    max_history: usize,
}

impl Deref for HistoryEntity {
    type Target = BoundedEntity;

    fn deref(&self) -> &Self::Target {
        &self.entity
    }
}

impl DerefMut for HistoryEntity {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.entity
    }
}

impl HistoryEntity {
    /// wraps an entity with an empty history
    pub fn new(entity: BoundedEntity, max_history: usize) -> Self {
        HistoryEntity {
            entity,
            history: VecDeque::new(),
            max_history,
        }
    }

    /// an entity whose history is effectively unbounded
    pub fn unbounded(entity: BoundedEntity) -> Self {
        Self::new(entity, usize::MAX)
    }

    /// the cap applied by `move_in_direction`
    pub fn max_history(&self) -> usize {
        self.max_history
    }

    /// number of remembered states
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// remembered states, newest first
    pub fn history(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.history.iter()
    }

    /// Records the current state, then steps one cell in `direction`
    /// (the current facing when `None`). The facing itself is not changed.
    pub fn move_in_direction(&mut self, direction: Option<Direction>) {
        let direction = direction.unwrap_or(self.entity.direction);
        self.history.push_front(HistoryEntry {
            position: self.entity.position,
            direction: self.entity.direction,
        });
        while self.history.len() > self.max_history {
            self.history.pop_back();
        }
        self.entity.position = self.projected_position(direction);
    }

    /// records `position` with the current facing, ignoring the cap
    pub fn push_state(&mut self, position: Position) {
        self.history.push_front(HistoryEntry {
            position,
            direction: self.entity.direction,
        });
    }

    /// restores the newest remembered state. false when there is nothing to restore
    pub fn rewind(&mut self) -> bool {
        match self.history.pop_front() {
            Some(entry) => {
                self.entity.position = entry.position;
                self.entity.direction = entry.direction;
                true
            }
            None => false,
        }
    }

    /// forgets every remembered state
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// where this entity would land moving one cell in `direction` from where it is now
    pub fn projected_position(&self, direction: Direction) -> Position {
        self.entity.position.add_vec(direction.to_vector())
    }
}
