//! Toroidal grid geometry: packed positions, wrap masks, spiral offsets.

use vestholm_protocol::{Direction, MapPos};

use crate::GameRng;

/// Radial seed rows for the outward spiral. Rings at radius 1 through 9
/// (the last ring partial), then long-range probe offsets at radius 16
/// and 24. Each row is swept through the six sextant generators below.
const SPIRAL_SEEDS: [(i32, i32); 49] = [
    (1, 0),
    (2, 1),
    (2, 0),
    (3, 1),
    (3, 2),
    (3, 0),
    (4, 2),
    (4, 1),
    (4, 3),
    (4, 0),
    (5, 2),
    (5, 3),
    (5, 1),
    (5, 4),
    (5, 0),
    (6, 3),
    (6, 2),
    (6, 4),
    (6, 1),
    (6, 5),
    (6, 0),
    (7, 3),
    (7, 4),
    (7, 2),
    (7, 5),
    (7, 1),
    (7, 6),
    (7, 0),
    (8, 4),
    (8, 3),
    (8, 5),
    (8, 2),
    (8, 6),
    (8, 1),
    (8, 7),
    (8, 0),
    (9, 4),
    (9, 5),
    (9, 3),
    (9, 6),
    (9, 2),
    (9, 7),
    (9, 1),
    (9, 0),
    (16, 0),
    (16, 8),
    (24, 0),
    (24, 8),
    (24, 16),
];

/// Sextant rotations in row-vector form: `(x', y') = (x*m0 + y*m2, x*m1 + y*m3)`.
const SPIRAL_MATRIX: [[i32; 4]; 6] = [
    [1, 0, 0, 1],
    [1, 1, -1, 0],
    [0, 1, -1, -1],
    [-1, 0, 0, -1],
    [-1, -1, 1, 0],
    [0, -1, 1, 1],
];

/// Toroidal grid geometry.
///
/// `cols` and `rows` are powers of two derived from `size`, positions pack as
/// `(row << col_bits) | col`, so every u32 below `tile_count` is a valid
/// position. All movement wraps at the edges through the axis masks.
#[derive(Clone, Debug)]
pub struct MapGeometry {
    size: u32,
    col_bits: u32,
    cols: u32,
    rows: u32,
    col_mask: u32,
    row_mask: u32,
    spiral: Vec<MapPos>,
}

impl MapGeometry {
    pub fn new(size: u32) -> Self {
        assert!(size >= 1, "grid size must be at least 1");
        let col_bits = 5 + size / 2;
        let row_bits = 5 + (size - 1) / 2;
        let cols = 1 << col_bits;
        let rows = 1 << row_bits;
        let mut geom = Self {
            size,
            col_bits,
            cols,
            rows,
            col_mask: cols - 1,
            row_mask: rows - 1,
            spiral: Vec::new(),
        };
        geom.spiral = geom.build_spiral();
        geom
    }

    fn build_spiral(&self) -> Vec<MapPos> {
        let mut spiral = Vec::with_capacity(1 + SPIRAL_SEEDS.len() * 6);
        spiral.push(MapPos(0));
        for &(x, y) in SPIRAL_SEEDS.iter() {
            for m in SPIRAL_MATRIX.iter() {
                let col = (x * m[0] + y * m[2]) as u32 & self.col_mask;
                let row = (x * m[1] + y * m[3]) as u32 & self.row_mask;
                spiral.push(self.pos(col, row));
            }
        }
        spiral
    }

    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    #[inline]
    pub fn cols(&self) -> u32 {
        self.cols
    }

    #[inline]
    pub fn rows(&self) -> u32 {
        self.rows
    }

    #[inline]
    pub fn tile_count(&self) -> usize {
        self.cols as usize * self.rows as usize
    }

    #[inline]
    pub fn pos(&self, col: u32, row: u32) -> MapPos {
        MapPos(((row & self.row_mask) << self.col_bits) | (col & self.col_mask))
    }

    #[inline]
    pub fn pos_col(&self, pos: MapPos) -> u32 {
        pos.0 & self.col_mask
    }

    #[inline]
    pub fn pos_row(&self, pos: MapPos) -> u32 {
        (pos.0 >> self.col_bits) & self.row_mask
    }

    /// Component-wise sum of two positions on the torus.
    #[inline]
    pub fn pos_add(&self, pos: MapPos, off: MapPos) -> MapPos {
        self.pos(
            self.pos_col(pos).wrapping_add(self.pos_col(off)),
            self.pos_row(pos).wrapping_add(self.pos_row(off)),
        )
    }

    /// One step along `dir`, wrapping at the grid edges.
    #[inline]
    pub fn neighbor(&self, pos: MapPos, dir: Direction) -> MapPos {
        self.neighbor_n(pos, dir, 1)
    }

    /// `n` steps along `dir` in one jump.
    #[inline]
    pub fn neighbor_n(&self, pos: MapPos, dir: Direction, n: u32) -> MapPos {
        let (dc, dr) = dir.delta();
        self.pos(
            self.pos_col(pos).wrapping_add((dc as u32).wrapping_mul(n)),
            self.pos_row(pos).wrapping_add((dr as u32).wrapping_mul(n)),
        )
    }

    #[inline]
    pub fn move_right(&self, pos: MapPos) -> MapPos {
        self.neighbor(pos, Direction::Right)
    }

    #[inline]
    pub fn move_down_right(&self, pos: MapPos) -> MapPos {
        self.neighbor(pos, Direction::DownRight)
    }

    #[inline]
    pub fn move_down(&self, pos: MapPos) -> MapPos {
        self.neighbor(pos, Direction::Down)
    }

    #[inline]
    pub fn move_left(&self, pos: MapPos) -> MapPos {
        self.neighbor(pos, Direction::Left)
    }

    #[inline]
    pub fn move_up_left(&self, pos: MapPos) -> MapPos {
        self.neighbor(pos, Direction::UpLeft)
    }

    #[inline]
    pub fn move_up(&self, pos: MapPos) -> MapPos {
        self.neighbor(pos, Direction::Up)
    }

    /// Composite diagonal with no `Direction` of its own.
    #[inline]
    pub fn move_down_left(&self, pos: MapPos) -> MapPos {
        self.pos(
            self.pos_col(pos).wrapping_sub(1),
            self.pos_row(pos).wrapping_add(1),
        )
    }

    /// Composite diagonal with no `Direction` of its own.
    #[inline]
    pub fn move_up_right(&self, pos: MapPos) -> MapPos {
        self.pos(
            self.pos_col(pos).wrapping_add(1),
            self.pos_row(pos).wrapping_sub(1),
        )
    }

    #[inline]
    pub fn move_right_n(&self, pos: MapPos, n: u32) -> MapPos {
        self.neighbor_n(pos, Direction::Right, n)
    }

    /// Signed column distance from `from` to `to`, the shortest way around.
    pub fn dist_col(&self, from: MapPos, to: MapPos) -> i32 {
        let d = self.pos_col(to).wrapping_sub(self.pos_col(from)) & self.col_mask;
        if d > self.cols / 2 {
            d as i32 - self.cols as i32
        } else {
            d as i32
        }
    }

    /// Signed row distance from `from` to `to`, the shortest way around.
    pub fn dist_row(&self, from: MapPos, to: MapPos) -> i32 {
        let d = self.pos_row(to).wrapping_sub(self.pos_row(from)) & self.row_mask;
        if d > self.rows / 2 {
            d as i32 - self.rows as i32
        } else {
            d as i32
        }
    }

    /// The canonical outward spiral of wrapped offsets; index 0 is the origin.
    #[inline]
    pub fn spiral_pattern(&self) -> &[MapPos] {
        &self.spiral
    }

    /// The `i`-th spiral position around `center`.
    #[inline]
    pub fn spiral_pos(&self, center: MapPos, i: usize) -> MapPos {
        self.pos_add(center, self.spiral[i])
    }

    /// Uniformly random position; the column word is drawn first.
    pub fn rnd_pos(&self, rng: &mut GameRng) -> MapPos {
        let col = u32::from(rng.next_u16()) & self.col_mask;
        let row = u32::from(rng.next_u16()) & self.row_mask;
        self.pos(col, row)
    }
}
