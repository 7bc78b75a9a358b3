//! The simulation driver: owns every snake, food and teleporter and advances them tick by tick.
use std::fmt;
use std::time::Instant;

use fxhash::FxHashSet;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, instrument, trace};

use crate::config::{ConfigError, WorldConfig};
use crate::food::FoodPool;
use crate::snake::{Siblings, Snake, TickContext, TickReport};
use crate::teleporter::Teleporter;
use crate::types::{Bounds, Direction, FoodId, Position, SimulatorInstruments, SnakeId};

/// result of one [World::advance_tick]
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TickSummary {
    /// the tick that was just completed, counting from 1
    pub tick: u64,
    /// one report per snake, in snake id order
    pub reports: Vec<TickReport>,
}

impl TickSummary {
    /// ids of the snakes that collided during this tick
    pub fn deaths(&self) -> impl Iterator<Item = SnakeId> + '_ {
        self.reports
            .iter()
            .enumerate()
            .filter(|(_, r)| r.died)
            .map(|(i, _)| SnakeId(i as u8))
    }
}

/// read-only copy of one snake for renderers
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct SnakeSnapshot {
    pub id: SnakeId,
    pub head: Position,
    pub direction: Direction,
    pub body: Vec<Position>,
    pub dead: bool,
    pub ai_controlled: bool,
    pub rewinding: bool,
    pub foods_eaten: u32,
    pub score: usize,
    pub high_score: usize,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct TeleporterSnapshot {
    pub entrance: Position,
    pub exit: Position,
}

/// read-only copy of the whole world for renderers
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub paused: bool,
    pub respawn_on_death: bool,
    pub bounds: Bounds,
    pub snakes: Vec<SnakeSnapshot>,
    pub foods: Vec<Position>,
    pub teleporters: Vec<TeleporterSnapshot>,
}

/// A running simulation. New worlds start paused.
#[derive(Debug, Clone)]
pub struct World {
    bounds: Bounds,
    snakes: Vec<Snake>,
    foods: FoodPool,
    teleporters: Vec<Teleporter>,
    rng: SmallRng,
    respawn_on_death: bool,
    paused: bool,
    tick: u64,
    high_scores: Vec<usize>,
}

impl World {
    /// builds a world, seeding its random source from `config.seed` or from entropy
    pub fn new(config: WorldConfig) -> Result<Self, ConfigError> {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }

    /// builds a world drawing from the given random source. `config.seed` is ignored
    pub fn with_rng(config: WorldConfig, mut rng: SmallRng) -> Result<Self, ConfigError> {
        config.validate()?;
        let bounds = config.bounds();
        let max_history = config.history_cap.unwrap_or(usize::MAX);

        let snakes: Vec<Snake> = config
            .resolved_spawns()
            .iter()
            .enumerate()
            .map(|(i, spawn)| {
                Snake::new(SnakeId(i as u8), spawn.direction, spawn.position, bounds)
                    .with_max_history(max_history)
                    .with_ai_weights(config.ai)
                    .with_ai(spawn.ai_controlled)
            })
            .collect();
        let foods = FoodPool::with_count(bounds, config.food_count, &mut rng);
        let teleporters = (0..config.teleporter_count)
            .map(|_| Teleporter::new(bounds, &mut rng))
            .collect();

        debug!(
            snakes = snakes.len(),
            foods = config.food_count,
            teleporters = config.teleporter_count,
            "created world"
        );
        Ok(World {
            bounds,
            high_scores: vec![0; snakes.len()],
            snakes,
            foods,
            teleporters,
            rng,
            respawn_on_death: config.respawn_on_death,
            paused: true,
            tick: 0,
        })
    }

    /// the playable area
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// every snake, indexed by id
    pub fn snakes(&self) -> &[Snake] {
        &self.snakes
    }

    /// one snake, `None` for unknown ids
    pub fn snake(&self, id: SnakeId) -> Option<&Snake> {
        self.snakes.get(id.as_usize())
    }

    /// the shared food pool
    pub fn foods(&self) -> &FoodPool {
        &self.foods
    }

    /// every teleporter pair
    pub fn teleporters(&self) -> &[Teleporter] {
        &self.teleporters
    }

    /// whether [World::tick] is currently a no-op
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// the auto respawn setting [World::tick] uses
    pub fn respawn_on_death(&self) -> bool {
        self.respawn_on_death
    }

    /// ticks completed since creation or the last restart
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// best score a snake has reached, restarts included
    pub fn high_score(&self, id: SnakeId) -> Option<usize> {
        self.high_scores.get(id.as_usize()).copied()
    }

    fn snake_mut(&mut self, id: SnakeId) -> Option<&mut Snake> {
        self.snakes.get_mut(id.as_usize())
    }

    /// Steers a living snake. Returns whether the facing was accepted; reversals,
    /// dead snakes and unknown ids are ignored.
    pub fn set_direction(&mut self, id: SnakeId, direction: Direction) -> bool {
        match self.snake_mut(id) {
            Some(snake) if !snake.is_dead() => snake.set_direction(direction),
            _ => false,
        }
    }

    /// hands a snake to the AI or takes it back. returns false for unknown ids
    pub fn toggle_ai(&mut self, id: SnakeId) -> bool {
        self.snake_mut(id).map(Snake::toggle_ai).is_some()
    }

    /// starts or stops rewinding a snake. returns false for unknown ids
    pub fn set_rewind(&mut self, id: SnakeId, rewinding: bool) -> bool {
        self.snake_mut(id)
            .map(|s| s.set_rewind(rewinding))
            .is_some()
    }

    /// puts a snake back at its spawn. returns false for unknown ids
    pub fn respawn(&mut self, id: SnakeId) -> bool {
        self.snake_mut(id).map(Snake::respawn).is_some()
    }

    /// While running, respawns a dead snake and toggles the AI of a living one.
    /// While paused, always toggles the AI.
    pub fn respawn_or_toggle_ai(&mut self, id: SnakeId) -> bool {
        let paused = self.paused;
        match self.snake_mut(id) {
            Some(snake) if !paused && snake.is_dead() => snake.respawn(),
            Some(snake) => snake.toggle_ai(),
            None => return false,
        }
        true
    }

    /// adds a food at a random cell
    pub fn add_food(&mut self) -> FoodId {
        self.foods.add(&mut self.rng)
    }

    /// Removes the newest food unless only one is left, and makes every snake
    /// chasing it look for another one.
    pub fn remove_food(&mut self) -> Option<FoodId> {
        let (removed, _) = self.foods.remove_last()?;
        for snake in self.snakes.iter_mut() {
            if snake.goal_food() == Some(removed) {
                snake.release_goal_food();
            }
        }
        Some(removed)
    }

    /// pauses or resumes [World::tick]. returns the new paused state
    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        debug!(paused = self.paused, "toggled pause");
        self.paused
    }

    /// flips auto respawn. switching it on brings every dead snake back at once
    pub fn toggle_respawn_on_death(&mut self) -> bool {
        self.respawn_on_death = !self.respawn_on_death;
        if self.respawn_on_death {
            for snake in self.snakes.iter_mut().filter(|s| s.is_dead()) {
                snake.respawn();
            }
        }
        self.respawn_on_death
    }

    /// Respawns every snake, scatters food and teleporters, resets the tick
    /// counter and pauses. High scores survive.
    pub fn restart_all(&mut self) {
        for snake in self.snakes.iter_mut() {
            snake.respawn();
        }
        self.foods.relocate_all(&mut self.rng);
        for teleporter in self.teleporters.iter_mut() {
            teleporter.relocate(&mut self.rng);
        }
        self.tick = 0;
        self.paused = true;
        debug!("restarted world");
    }

    /// advances one tick with the stored auto respawn setting, unless paused
    pub fn tick(&mut self) -> Option<TickSummary> {
        if self.paused {
            return None;
        }
        Some(self.advance_tick(self.respawn_on_death))
    }

    /// Runs every snake once, in id order. Each snake sees the food, teleporters
    /// and siblings as the snakes before it left them.
    #[instrument(level = "trace", skip_all, fields(tick = self.tick + 1))]
    pub fn advance_tick(&mut self, respawn_on_death: bool) -> TickSummary {
        let mut reports = Vec::with_capacity(self.snakes.len());
        for index in 0..self.snakes.len() {
            let (snake, siblings) = match Siblings::split(&mut self.snakes, index) {
                Some(split) => split,
                None => continue,
            };
            let mut ctx = TickContext {
                foods: &mut self.foods,
                teleporters: &mut self.teleporters,
                siblings,
                rng: &mut self.rng,
            };
            reports.push(snake.run(&mut ctx, respawn_on_death));
        }

        for (high, snake) in self.high_scores.iter_mut().zip(self.snakes.iter()) {
            *high = (*high).max(snake.score());
        }
        self.tick += 1;
        trace!(
            tick = self.tick,
            alive = self.snakes.iter().filter(|s| !s.is_dead()).count(),
            "tick complete"
        );
        TickSummary {
            tick: self.tick,
            reports,
        }
    }

    /// [World::advance_tick], timed through `instruments`
    pub fn advance_tick_with<T: SimulatorInstruments>(
        &mut self,
        instruments: &T,
        respawn_on_death: bool,
    ) -> TickSummary {
        let start = Instant::now();
        let summary = self.advance_tick(respawn_on_death);
        instruments.observe_simulation(start.elapsed());
        summary
    }

    /// copies out everything a renderer needs
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            tick: self.tick,
            paused: self.paused,
            respawn_on_death: self.respawn_on_death,
            bounds: self.bounds,
            snakes: self
                .snakes
                .iter()
                .zip(self.high_scores.iter())
                .map(|(s, high)| SnakeSnapshot {
                    id: s.id(),
                    head: s.position(),
                    direction: s.direction(),
                    body: s.body_positions().collect(),
                    dead: s.is_dead(),
                    ai_controlled: s.is_ai_controlled(),
                    rewinding: s.is_rewinding(),
                    foods_eaten: s.foods_eaten(),
                    score: s.score(),
                    high_score: *high,
                })
                .collect(),
            foods: self.foods.positions().collect(),
            teleporters: self
                .teleporters
                .iter()
                .map(|t| TeleporterSnapshot {
                    entrance: t.entrance(),
                    exit: t.exit(),
                })
                .collect(),
        }
    }
}

impl fmt::Display for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let heads: FxHashSet<Position> = self.snakes.iter().map(|s| s.position()).collect();
        let bodies: FxHashSet<Position> = self
            .snakes
            .iter()
            .flat_map(|s| s.body_positions())
            .collect();
        let foods: FxHashSet<Position> = self.foods.positions().collect();
        let teleporters: FxHashSet<Position> = self
            .teleporters
            .iter()
            .flat_map(|t| vec![t.entrance(), t.exit()])
            .collect();

        writeln!(f)?;
        for y in self.bounds.min.y..self.bounds.max.y {
            for x in self.bounds.min.x..self.bounds.max.x {
                let position = Position { x, y };
                if heads.contains(&position) {
                    write!(f, "H")?;
                } else if bodies.contains(&position) {
                    write!(f, "s")?;
                } else if foods.contains(&position) {
                    write!(f, "f")?;
                } else if teleporters.contains(&position) {
                    write!(f, "T")?;
                } else {
                    write!(f, ".")?;
                }
                write!(f, " ")?;
            }
            writeln!(f)?;
        }
        for snake in self.snakes.iter() {
            writeln!(
                f,
                "(snake {} {} head: {} facing: {} score: {})",
                snake.id().0,
                if snake.is_dead() { "dead" } else { "alive" },
                snake.position(),
                snake.direction(),
                snake.score(),
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::AiWeights;
    use crate::config::SpawnPoint;
    use itertools::Itertools;
    use std::cell::Cell;
    use std::time::Duration;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    }

    fn small_bounds() -> Bounds {
        Bounds::new(Position::new(0, 0), Position::new(10, 10))
    }

    fn manual(x: i32, y: i32, direction: Direction) -> SpawnPoint {
        SpawnPoint {
            position: Position::new(x, y),
            direction,
            ai_controlled: false,
        }
    }

    /// a 10x10 world with no teleporters and a single food parked at `food`
    fn small_world(spawns: Vec<SpawnPoint>, food: Position) -> World {
        let mut world = World::new(WorldConfig {
            max: Position::new(10, 10),
            food_count: 1,
            teleporter_count: 0,
            spawns,
            seed: Some(11),
            ..Default::default()
        })
        .unwrap();
        world.foods = FoodPool::new(small_bounds());
        world.foods.add_at(food);
        world
    }

    #[test]
    fn test_default_world() {
        let world = World::new(WorldConfig {
            seed: Some(1),
            ..Default::default()
        })
        .unwrap();
        assert!(world.is_paused());
        assert_eq!(world.snakes().len(), 4);
        assert_eq!(world.foods().len(), 8);
        assert_eq!(world.teleporters().len(), 4);
        assert!(world.snakes().iter().all(|s| s.is_ai_controlled()));
        assert_eq!(world.tick_count(), 0);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let result = World::new(WorldConfig {
            food_count: 0,
            ..Default::default()
        });
        assert!(matches!(result, Err(ConfigError::NoFood)));
    }

    #[test]
    fn test_snakes_stay_in_bounds() {
        init_tracing();
        let mut world = World::new(WorldConfig {
            max: Position::new(30, 20),
            seed: Some(3),
            respawn_on_death: true,
            ..Default::default()
        })
        .unwrap();
        let bounds = world.bounds();
        for _ in 0..500 {
            world.advance_tick(true);
            for snake in world.snakes().iter().filter(|s| !s.is_dead()) {
                assert!(bounds.contains(&snake.position()));
                // freshly grown segments wait off the grid until the chain pulls them in
                assert!(snake
                    .body_positions()
                    .filter(|p| *p != bounds.staging_position())
                    .all(|p| bounds.contains(&p)));
            }
        }
        assert_eq!(world.tick_count(), 500);
    }

    #[test]
    fn test_goal_food_is_never_shared() {
        let mut world = World::new(WorldConfig {
            max: Position::new(20, 20),
            food_count: 3,
            seed: Some(4),
            respawn_on_death: true,
            spawns: (0..6)
                .map(|i| SpawnPoint::new(Position::new(3 * i + 1, 10), Direction::Up))
                .collect(),
            ..Default::default()
        })
        .unwrap();
        for _ in 0..300 {
            world.advance_tick(true);
            let goals = world.snakes().iter().filter_map(|s| s.goal_food()).collect_vec();
            assert_eq!(goals.len(), goals.iter().unique().count(), "{:?}", goals);
        }
    }

    #[test]
    fn test_move_and_rewind() {
        let mut world = small_world(vec![manual(5, 5, Direction::Right)], Position::new(0, 9));
        world.advance_tick(false);
        assert_eq!(world.snakes()[0].position(), Position::new(6, 5));
        assert!(world.set_rewind(SnakeId(0), true));
        world.advance_tick(false);
        assert_eq!(world.snakes()[0].position(), Position::new(5, 5));
        assert_eq!(world.snakes()[0].direction(), Direction::Right);
    }

    #[test]
    fn test_eating_grows_and_updates_high_score() {
        let mut world = small_world(vec![manual(5, 5, Direction::Right)], Position::new(6, 5));
        let summary = world.advance_tick(false);
        assert_eq!(summary.reports[0].foods_eaten, 1);
        assert_eq!(world.snakes()[0].body().len(), 3);
        assert_ne!(world.foods().position(FoodId(0)), Some(Position::new(6, 5)));
        assert_eq!(world.high_score(SnakeId(0)), Some(3));

        world.respawn(SnakeId(0));
        assert_eq!(world.snakes()[0].score(), 0);
        assert_eq!(world.high_score(SnakeId(0)), Some(3));
    }

    #[test]
    fn test_wall_death_and_respawn_toggle() {
        let mut world = small_world(vec![manual(9, 5, Direction::Right)], Position::new(0, 0));
        let summary = world.advance_tick(false);
        assert_eq!(summary.deaths().collect_vec(), vec![SnakeId(0)]);
        assert!(world.snakes()[0].is_dead());
        assert!(!world.set_direction(SnakeId(0), Direction::Up));

        assert!(world.toggle_respawn_on_death());
        let snake = &world.snakes()[0];
        assert!(!snake.is_dead());
        assert_eq!(snake.position(), snake.initial_position());
        assert!(snake.body().is_empty());
    }

    #[test]
    fn test_respawn_or_toggle_ai() {
        let mut world = small_world(vec![manual(9, 5, Direction::Right)], Position::new(0, 0));
        world.advance_tick(false);
        assert!(world.snakes()[0].is_dead());

        // paused: only the AI flag changes
        assert!(world.respawn_or_toggle_ai(SnakeId(0)));
        assert!(world.snakes()[0].is_dead());
        assert!(world.snakes()[0].is_ai_controlled());

        world.toggle_pause();
        assert!(world.respawn_or_toggle_ai(SnakeId(0)));
        assert!(!world.snakes()[0].is_dead());
        assert!(world.snakes()[0].is_ai_controlled());
        assert!(world.respawn_or_toggle_ai(SnakeId(0)));
        assert!(!world.snakes()[0].is_ai_controlled());

        assert!(!world.respawn_or_toggle_ai(SnakeId(7)));
    }

    #[test]
    fn test_food_never_drops_below_one() {
        let mut world = small_world(vec![manual(5, 5, Direction::Right)], Position::new(0, 0));
        let added = world.add_food();
        assert_eq!(world.foods().len(), 2);
        assert_eq!(world.remove_food(), Some(added));
        assert_eq!(world.remove_food(), None);
        assert_eq!(world.foods().len(), 1);
    }

    #[test]
    fn test_removing_food_releases_its_claim() {
        let mut spawn = manual(5, 5, Direction::Right);
        spawn.ai_controlled = true;
        let mut world = small_world(vec![spawn], Position::new(0, 0));
        world.foods = FoodPool::new(small_bounds());
        world.foods.add_at(Position::new(0, 0));
        let near = world.foods.add_at(Position::new(5, 2));
        world.snakes[0].ai_mut().set_goal(Some(near));

        assert_eq!(world.remove_food(), Some(near));
        assert_eq!(world.snakes()[0].goal_food(), None);
    }

    #[test]
    fn test_nearer_snake_keeps_food() {
        let weights = AiWeights {
            closest_food: 100,
            damping_per_turn: 0,
            ..Default::default()
        };
        let mut world = World::new(WorldConfig {
            max: Position::new(20, 20),
            food_count: 1,
            teleporter_count: 0,
            spawns: vec![
                SpawnPoint::new(Position::new(10, 3), Direction::Right),
                SpawnPoint::new(Position::new(10, 8), Direction::Right),
            ],
            seed: Some(5),
            ai: weights,
            ..Default::default()
        })
        .unwrap();
        let bounds = world.bounds();
        world.foods = FoodPool::new(bounds);
        let contested = world.foods.add_at(Position::new(10, 5));
        let fallback = world.foods.add_at(Position::new(10, 18));

        world.advance_tick(false);
        assert_eq!(world.snakes()[0].goal_food(), Some(contested));
        assert_eq!(world.snakes()[0].position(), Position::new(10, 4));
        assert_eq!(world.snakes()[1].goal_food(), Some(fallback));
        assert_eq!(world.snakes()[1].position(), Position::new(10, 9));
    }

    #[test]
    fn test_teleporting() {
        let mut world = small_world(vec![manual(1, 2, Direction::Right)], Position::new(0, 9));
        world.teleporters = vec![Teleporter::at(
            small_bounds(),
            Position::new(2, 2),
            Position::new(8, 8),
        )
        .unwrap()];
        let summary = world.advance_tick(false);
        assert!(summary.reports[0].teleported);
        assert_eq!(world.snakes()[0].position(), Position::new(8, 8));
        let teleporter = world.teleporters()[0];
        assert_eq!(teleporter.entrance(), Position::new(2, 2));
        assert_ne!(teleporter.exit(), teleporter.entrance());
    }

    #[test]
    fn test_pause_and_restart() {
        let mut world = small_world(vec![manual(2, 5, Direction::Right)], Position::new(3, 5));
        assert!(world.tick().is_none());
        assert!(!world.toggle_pause());
        let summary = world.tick().unwrap();
        assert_eq!(summary.tick, 1);
        world.tick();
        assert_eq!(world.tick_count(), 2);

        world.restart_all();
        assert!(world.is_paused());
        assert_eq!(world.tick_count(), 0);
        let snake = &world.snakes()[0];
        assert_eq!(snake.position(), Position::new(2, 5));
        assert!(snake.body().is_empty());
        assert!(world.high_score(SnakeId(0)).unwrap() >= 3);
    }

    #[derive(Debug, Default)]
    struct Instruments {
        calls: Cell<u32>,
    }

    impl SimulatorInstruments for Instruments {
        fn observe_simulation(&self, _: Duration) {
            self.calls.set(self.calls.get() + 1);
        }
    }

    #[test]
    fn test_instruments_observe_every_tick() {
        let instruments = Instruments::default();
        let mut world = small_world(vec![manual(1, 1, Direction::Down)], Position::new(9, 9));
        for _ in 0..3 {
            world.advance_tick_with(&instruments, false);
        }
        assert_eq!(instruments.calls.get(), 3);
    }

    #[test]
    fn test_display() {
        let mut world = World::new(WorldConfig {
            max: Position::new(4, 3),
            food_count: 1,
            teleporter_count: 0,
            spawns: vec![manual(1, 1, Direction::Right)],
            seed: Some(2),
            ..Default::default()
        })
        .unwrap();
        let bounds = world.bounds();
        world.foods = FoodPool::new(bounds);
        world.foods.add_at(Position::new(3, 2));
        world.teleporters = vec![Teleporter::at(
            bounds,
            Position::new(0, 0),
            Position::new(3, 0),
        )
        .unwrap()];
        let rendered = world.to_string();
        assert!(
            rendered.starts_with("\nT . . T \n. H . . \n. . . f \n"),
            "{}",
            rendered
        );
        assert!(rendered.contains("(snake 0 alive head: (1, 1) facing: right score: 0)"));
    }

    #[test]
    fn test_snapshot_serializes() {
        let world = small_world(vec![manual(5, 5, Direction::Up)], Position::new(1, 1));
        let snapshot = world.snapshot();
        assert_eq!(snapshot.snakes.len(), 1);
        assert_eq!(snapshot.snakes[0].head, Position::new(5, 5));
        assert_eq!(snapshot.foods, vec![Position::new(1, 1)]);
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["snakes"][0]["direction"], "Up");
        assert_eq!(json["paused"], true);
    }
}
