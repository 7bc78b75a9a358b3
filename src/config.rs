//! World configuration and its validation
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ai::{AiWeights, Heuristic, CASCADE, CHANCE_MAX};
use crate::types::{Bounds, Direction, Position};

/// where a snake starts and returns to on respawn
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnPoint {
    #[allow(missing_docs)]
    pub position: Position,
    #[allow(missing_docs)]
    pub direction: Direction,
    /// whether the AI steers this snake from the start
    #[serde(default = "default_ai_controlled")]
    pub ai_controlled: bool,
}

fn default_ai_controlled() -> bool {
    true
}

impl SpawnPoint {
    /// an AI controlled spawn
    pub fn new(position: Position, direction: Direction) -> Self {
        SpawnPoint {
            position,
            direction,
            ai_controlled: true,
        }
    }
}

/// Everything needed to build a [World](crate::world::World)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct WorldConfig {
    /// inclusive corner of the grid
    pub min: Position,
    /// exclusive corner of the grid
    pub max: Position,
    /// foods placed at start
    pub food_count: usize,
    /// teleporter pairs placed at start
    pub teleporter_count: usize,
    /// one snake per spawn; empty means four snakes around the centre
    pub spawns: Vec<SpawnPoint>,
    /// cap on each head's rewind history, `None` for unbounded
    pub history_cap: Option<usize>,
    /// respawn snakes as soon as they die
    pub respawn_on_death: bool,
    /// seed for the world's random source, `None` to seed from entropy
    pub seed: Option<u64>,
    /// AI tuning shared by every snake
    pub ai: AiWeights,
}

impl Default for WorldConfig {
    fn default() -> Self {
        WorldConfig {
            min: Position::new(0, 0),
            max: Position::new(124, 68),
            food_count: 8,
            teleporter_count: 4,
            spawns: Vec::new(),
            history_cap: None,
            respawn_on_death: false,
            seed: None,
            ai: AiWeights::default(),
        }
    }
}

/// Ways a [WorldConfig] can be unusable
#[derive(Debug, Error)]
pub enum ConfigError {
    /// max must exceed min on both axes
    #[error("bounds {min} to {max} contain no cells")]
    DegenerateBounds {
        #[allow(missing_docs)]
        min: Position,
        #[allow(missing_docs)]
        max: Position,
    },
    /// teleporter endpoints need two distinct cells
    #[error("teleporters need at least 2 cells, bounds have {cells}")]
    TooSmallForTeleporters {
        #[allow(missing_docs)]
        cells: u64,
    },
    /// the food pool never shrinks below one
    #[error("food_count must be at least 1")]
    NoFood,
    /// a spawn lies off the grid
    #[error("spawn {index} at {position} is outside the bounds")]
    SpawnOutOfBounds {
        #[allow(missing_docs)]
        index: usize,
        #[allow(missing_docs)]
        position: Position,
    },
    /// snake ids are a single byte
    #[error("{0} spawns requested, at most 256 snakes are supported")]
    TooManySnakes(usize),
    /// chances are out of 100
    #[error("{heuristic:?} chance {chance} exceeds {max}")]
    ChanceOutOfRange {
        #[allow(missing_docs)]
        heuristic: Heuristic,
        #[allow(missing_docs)]
        chance: u32,
        #[allow(missing_docs)]
        max: u32,
    },
    /// the damping chance per recent turn is out of 100 too
    #[error("damping_per_turn {0} exceeds 100")]
    DampingOutOfRange(u32),
    /// the config was not valid json
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl WorldConfig {
    /// bounds built from `min` and `max`
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.min, self.max)
    }

    /// the configured spawns, or the four default ones around the centre when none are given
    pub fn resolved_spawns(&self) -> Vec<SpawnPoint> {
        if !self.spawns.is_empty() {
            return self.spawns.clone();
        }
        let mid = Position::new(
            self.max.x / 2 + self.max.x % 2,
            self.max.y / 2 + self.max.y % 2,
        );
        vec![
            SpawnPoint::new(Position::new(mid.x - 1, mid.y - 1), Direction::Left),
            SpawnPoint::new(Position::new(mid.x + 1, mid.y - 1), Direction::Left),
            SpawnPoint::new(Position::new(mid.x - 1, mid.y + 1), Direction::Right),
            SpawnPoint::new(Position::new(mid.x + 1, mid.y + 1), Direction::Right),
        ]
    }

    /// checks that a world can be built from this config
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bounds = self.bounds();
        if !bounds.is_non_degenerate() {
            return Err(ConfigError::DegenerateBounds {
                min: self.min,
                max: self.max,
            });
        }
        if self.teleporter_count > 0 && bounds.cell_count() < 2 {
            return Err(ConfigError::TooSmallForTeleporters {
                cells: bounds.cell_count(),
            });
        }
        if self.food_count == 0 {
            return Err(ConfigError::NoFood);
        }

        let spawns = self.resolved_spawns();
        if spawns.len() > usize::from(u8::MAX) + 1 {
            return Err(ConfigError::TooManySnakes(spawns.len()));
        }
        if let Some((index, spawn)) = spawns
            .iter()
            .enumerate()
            .find(|(_, s)| !bounds.contains(&s.position))
        {
            return Err(ConfigError::SpawnOutOfBounds {
                index,
                position: spawn.position,
            });
        }

        for heuristic in CASCADE.iter() {
            let chance = heuristic.chance(&self.ai);
            if chance > CHANCE_MAX {
                return Err(ConfigError::ChanceOutOfRange {
                    heuristic: *heuristic,
                    chance,
                    max: CHANCE_MAX,
                });
            }
        }
        if self.ai.damping_per_turn > CHANCE_MAX {
            return Err(ConfigError::DampingOutOfRange(self.ai.damping_per_turn));
        }
        Ok(())
    }

    /// parses a config from json and validates it. missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: WorldConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}
