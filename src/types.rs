//! various types that are useful for working with the snake grid
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// A vector with which to do positional math
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vector {
    /// x offset
    pub x: i32,
    /// y offset
    pub y: i32,
}

/// A cell on the grid. `y` grows downwards, so `Up` decrements it.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    /// column
    pub x: i32,
    /// row
    pub y: i32,
}

impl Position {
    /// makes a new position
    pub fn new(x: i32, y: i32) -> Self {
        Position { x, y }
    }

    /// offsets this position by a vector
    pub fn add_vec(&self, v: Vector) -> Position {
        Position {
            x: self.x + v.x,
            y: self.y + v.y,
        }
    }

    /// Euclidean distance to another position, truncated toward zero
    pub fn distance(&self, other: &Position) -> i32 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        (dx * dx + dy * dy).sqrt() as i32
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Represents a facing / a move
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    #[allow(missing_docs)]
    Up,
    #[allow(missing_docs)]
    Down,
    #[allow(missing_docs)]
    Left,
    #[allow(missing_docs)]
    Right,
}

impl Default for Direction {
    fn default() -> Self {
        Direction::Right
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Left => write!(f, "left"),
            Direction::Right => write!(f, "right"),
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

impl Direction {
    /// convert this direction to a unit vector
    pub fn to_vector(self) -> Vector {
        match self {
            Direction::Left => Vector { x: -1, y: 0 },
            Direction::Right => Vector { x: 1, y: 0 },
            Direction::Up => Vector { x: 0, y: -1 },
            Direction::Down => Vector { x: 0, y: 1 },
        }
    }

    /// all directions, in tie-break priority order
    pub fn all() -> [Direction; 4] {
        [
            Direction::Up,
            Direction::Down,
            Direction::Left,
            Direction::Right,
        ]
    }

    /// converts this direction to a usize index. indices are the same order as `Direction::all()`
    pub fn as_index(&self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Right => 3,
        }
    }

    /// converts a usize index to a direction
    pub fn from_index(index: usize) -> Direction {
        match index {
            0 => Direction::Up,
            1 => Direction::Down,
            2 => Direction::Left,
            3 => Direction::Right,
            _ => panic!("invalid index"),
        }
    }

    /// Up <-> Down, Left <-> Right
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// checks if a given direction is not opposite this one. e.g. Up is not opposite to Left, but is opposite to Down
    pub fn is_not_opposite(&self, other: &Direction) -> bool {
        other.opposite() != *self
    }

    /// draws a uniformly random direction
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Direction {
        Direction::from_index(rng.gen_range(0..4))
    }
}

/// The area an entity lives in. Valid cells are `min..max` on each axis, `max` itself is outside.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bounds {
    /// inclusive corner
    pub min: Position,
    /// exclusive corner
    pub max: Position,
}

impl Bounds {
    /// makes new bounds
    pub fn new(min: Position, max: Position) -> Self {
        Bounds { min, max }
    }

    /// checks whether `pos` is a playable cell
    pub fn contains(&self, pos: &Position) -> bool {
        pos.x >= self.min.x && pos.x < self.max.x && pos.y >= self.min.y && pos.y < self.max.y
    }

    /// true when both axes have at least one cell
    pub fn is_non_degenerate(&self) -> bool {
        self.max.x > self.min.x && self.max.y > self.min.y
    }

    /// number of playable cells
    pub fn cell_count(&self) -> u64 {
        if !self.is_non_degenerate() {
            return 0;
        }
        (self.max.x - self.min.x) as u64 * (self.max.y - self.min.y) as u64
    }

    /// width of the playable area
    pub fn width(&self) -> i32 {
        self.max.x - self.min.x
    }

    /// height of the playable area
    pub fn height(&self) -> i32 {
        self.max.y - self.min.y
    }

    /// draws a uniformly random playable cell. bounds must be non degenerate.
    pub fn random_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Position {
        debug_assert!(self.is_non_degenerate());
        Position {
            x: rng.gen_range(self.min.x..self.max.x),
            y: rng.gen_range(self.min.y..self.max.y),
        }
    }

    /// an off-grid cell where freshly grown segments wait until the chain pulls them in
    pub fn staging_position(&self) -> Position {
        Position {
            x: self.min.x - self.max.x,
            y: self.min.y - self.max.y,
        }
    }
}

/// token to represent a snake id, the snake's index in its world
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct SnakeId(pub u8);

impl SnakeId {
    /// convert this snake ID to a usize
    pub fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

/// token to represent a food, its index in the food pool
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct FoodId(pub usize);

impl FoodId {
    /// convert this food ID to a usize
    pub fn as_usize(&self) -> usize {
        self.0
    }
}

/// Instruments to be used with simulation
pub trait SimulatorInstruments: std::fmt::Debug {
    /// records how long one world advance took
    fn observe_simulation(&self, duration: Duration);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::SmallRng, SeedableRng};

    #[test]
    fn test_opposites() {
        for d in Direction::all() {
            assert_eq!(d.opposite().opposite(), d);
            assert!(!d.is_not_opposite(&d.opposite()));
            assert!(d.is_not_opposite(&d));
        }
        assert_eq!(Direction::Up.opposite(), Direction::Down);
        assert_eq!(Direction::Left.opposite(), Direction::Right);
    }

    #[test]
    fn test_index_round_trips() {
        for (i, d) in Direction::all().iter().enumerate() {
            assert_eq!(d.as_index(), i);
            assert_eq!(Direction::from_index(i), *d);
        }
    }

    #[test]
    fn test_up_decrements_y() {
        let p = Position::new(5, 5);
        assert_eq!(p.add_vec(Direction::Up.to_vector()), Position::new(5, 4));
        assert_eq!(p.add_vec(Direction::Down.to_vector()), Position::new(5, 6));
        assert_eq!(p.add_vec(Direction::Left.to_vector()), Position::new(4, 5));
        assert_eq!(p.add_vec(Direction::Right.to_vector()), Position::new(6, 5));
    }

    #[test]
    fn test_distance_truncates() {
        let a = Position::new(0, 0);
        assert_eq!(a.distance(&Position::new(3, 4)), 5);
        // sqrt(2) ~ 1.41
        assert_eq!(a.distance(&Position::new(1, 1)), 1);
        // sqrt(8) ~ 2.83
        assert_eq!(a.distance(&Position::new(2, 2)), 2);
        assert_eq!(a.distance(&a), 0);
    }

    #[test]
    fn test_bounds_exclude_max() {
        let b = Bounds::new(Position::new(0, 0), Position::new(10, 10));
        assert!(b.contains(&Position::new(0, 0)));
        assert!(b.contains(&Position::new(9, 9)));
        assert!(!b.contains(&Position::new(10, 9)));
        assert!(!b.contains(&Position::new(-1, 3)));
        assert_eq!(b.cell_count(), 100);
        assert!(!b.contains(&b.staging_position()));
    }

    #[test]
    fn test_random_position_in_bounds() {
        let b = Bounds::new(Position::new(3, -2), Position::new(7, 4));
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..1000 {
            assert!(b.contains(&b.random_position(&mut rng)));
        }
    }
}
