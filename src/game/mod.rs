//! # Game Module
//!
//! Core coordinate types, the player character, central game state, and the
//! background upkeep ticker.

pub mod player;
pub mod state;
pub mod upkeep;

pub use player::*;
pub use state::*;
pub use upkeep::*;

use serde::{Deserialize, Serialize};

/// Represents a 2D coordinate in the game world.
///
/// # Examples
///
/// ```
/// use eramud::Position;
///
/// let pos = Position::new(10, 5);
/// assert_eq!(pos.x, 10);
/// assert_eq!(pos.y, 5);
/// assert_eq!(pos.manhattan_distance(Position::origin()), 15);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    /// Creates a new position with the given coordinates.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the origin position (0, 0).
    pub fn origin() -> Self {
        Self::new(0, 0)
    }

    /// Calculates the Manhattan distance to another position.
    ///
    /// # Examples
    ///
    /// ```
    /// use eramud::Position;
    ///
    /// let pos1 = Position::new(0, 0);
    /// let pos2 = Position::new(3, 4);
    /// assert_eq!(pos1.manhattan_distance(pos2), 7);
    /// ```
    pub fn manhattan_distance(self, other: Position) -> u32 {
        ((self.x - other.x).abs() + (self.y - other.y).abs()) as u32
    }

    /// Returns the position one step in the given direction.
    pub fn offset(self, direction: Direction) -> Position {
        let delta = direction.to_delta();
        Position::new(self.x + delta.x, self.y + delta.y)
    }

    /// Returns the 4 cardinal adjacent positions, in compass priority order.
    pub fn cardinal_adjacent_positions(self) -> Vec<Position> {
        Direction::PRIORITY
            .iter()
            .map(|dir| self.offset(*dir))
            .collect()
    }
}

impl std::ops::Add for Position {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for Position {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Compass directions for movement and orientation.
///
/// The world is four-connected; there are no diagonals. Wherever several
/// directions must be examined in a stable order (monster pursuit, shadow
/// queries), [`Direction::PRIORITY`] fixes that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    /// The fixed evaluation order used by every deterministic scan.
    pub const PRIORITY: [Direction; 4] = [
        Direction::East,
        Direction::West,
        Direction::North,
        Direction::South,
    ];

    /// Converts a direction to a position delta.
    ///
    /// # Examples
    ///
    /// ```
    /// use eramud::{Direction, Position};
    ///
    /// assert_eq!(Direction::North.to_delta(), Position::new(0, 1));
    /// assert_eq!(Direction::West.to_delta(), Position::new(-1, 0));
    /// ```
    pub fn to_delta(self) -> Position {
        match self {
            Direction::North => Position::new(0, 1),
            Direction::South => Position::new(0, -1),
            Direction::East => Position::new(1, 0),
            Direction::West => Position::new(-1, 0),
        }
    }

    /// Converts a unit position delta to a direction.
    ///
    /// Returns None if the delta doesn't correspond to a cardinal step.
    pub fn from_delta(delta: Position) -> Option<Direction> {
        match (delta.x, delta.y) {
            (0, 1) => Some(Direction::North),
            (0, -1) => Some(Direction::South),
            (1, 0) => Some(Direction::East),
            (-1, 0) => Some(Direction::West),
            _ => None,
        }
    }

    /// The opposite compass direction.
    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }

    /// The dominant compass direction from one position toward another.
    ///
    /// Used for sensory cues ("footsteps to the east"). The axis with the
    /// larger displacement wins; on a tie the east/west axis wins, matching
    /// the fixed priority order. Returns None when the positions coincide.
    pub fn toward(from: Position, to: Position) -> Option<Direction> {
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        if dx == 0 && dy == 0 {
            return None;
        }
        if dx.abs() >= dy.abs() {
            if dx > 0 {
                Some(Direction::East)
            } else if dx < 0 {
                Some(Direction::West)
            } else if dy > 0 {
                Some(Direction::North)
            } else {
                Some(Direction::South)
            }
        } else if dy > 0 {
            Some(Direction::North)
        } else {
            Some(Direction::South)
        }
    }

    /// Parses a direction name or single-letter abbreviation.
    pub fn parse(token: &str) -> Option<Direction> {
        match token.to_ascii_lowercase().as_str() {
            "n" | "north" => Some(Direction::North),
            "s" | "south" => Some(Direction::South),
            "e" | "east" => Some(Direction::East),
            "w" | "west" => Some(Direction::West),
            _ => None,
        }
    }

    /// Lowercase compass name, as used in rendered messages.
    pub fn name(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::East => "east",
            Direction::West => "west",
        }
    }
}
