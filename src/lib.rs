#![deny(
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs
)]
//! A grid simulation of competing snakes.
//!
//! Snakes move on a bounded grid, race each other for food, hop through paired
//! teleporters and die when they run into a wall or their own body. Every move
//! a snake makes is recorded so the snake can be rewound step by step, reviving
//! it if it died. Snakes can be steered from outside or handed to an AI that
//! picks directions from a weighted cascade of cheap heuristics and negotiates
//! food claims with the other snakes.
//!
//! The [World] owns all state. A driver (a renderer, a game loop, a benchmark)
//! sends it commands and calls [World::tick] or [World::advance_tick]:
//! ```
//! use snakepit::{World, WorldConfig};
//!
//! let mut world = World::new(WorldConfig {
//!     seed: Some(7),
//!     ..Default::default()
//! })
//! .unwrap();
//! assert!(world.tick().is_none()); // worlds start paused
//! world.toggle_pause();
//! let summary = world.tick().unwrap();
//! assert_eq!(summary.reports.len(), world.snakes().len());
//! ```

pub mod ai;
pub mod config;
pub mod entity;
pub mod food;
pub mod snake;
pub mod teleporter;
pub mod types;
pub mod world;

pub use config::{ConfigError, SpawnPoint, WorldConfig};
pub use snake::Snake;
pub use world::{TickSummary, World, WorldSnapshot};
