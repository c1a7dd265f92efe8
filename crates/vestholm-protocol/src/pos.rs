use serde::{Deserialize, Serialize};

/// Packed position on the world grid: `(row << col_bits) | col`.
///
/// The bit split is owned by the grid geometry that minted the value, so a
/// `MapPos` is only meaningful together with the map it came from.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MapPos(pub u32);

/// The six edge directions leaving a vertex of the triangle mesh.
///
/// The grid is a sheared square lattice: each rhombus tile splits into an
/// "up" and a "down" triangle, giving every vertex six neighbors.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum Direction {
    Right = 0,
    DownRight = 1,
    Down = 2,
    Left = 3,
    UpLeft = 4,
    Up = 5,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::Right,
        Direction::DownRight,
        Direction::Down,
        Direction::Left,
        Direction::UpLeft,
        Direction::Up,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Direction> {
        Self::ALL.get(index).copied()
    }

    /// The opposite direction; stepping there undoes a step here.
    #[inline]
    pub const fn reverse(self) -> Direction {
        match self {
            Direction::Right => Direction::Left,
            Direction::DownRight => Direction::UpLeft,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::UpLeft => Direction::DownRight,
            Direction::Up => Direction::Down,
        }
    }

    /// Signed (col, row) delta of a single step, before toroidal wrap.
    #[inline]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::Right => (1, 0),
            Direction::DownRight => (1, 1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::UpLeft => (-1, -1),
            Direction::Up => (0, -1),
        }
    }
}
