//! Downsampled overview of the grid, one palette byte per tile.
//!
//! Water shades map to flat palette entries; land terrain picks a
//! palette row and the west-to-southwest height differential picks the
//! shade within it, which gives the overview cheap hill shading.

use crate::map::Map;

/// Palette row start per terrain nibble.
const COLOR_OFFSET: [usize; 16] = [
    0, 85, 102, 119, 17, 17, 17, 17, //
    34, 34, 34, 51, 51, 51, 68, 68,
];

/// Eight rows of seventeen shades, indexed by row start plus height
/// differential.
const COLORS: [u8; 136] = [
    8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, //
    31, 31, 30, 29, 28, 27, 26, 25, 24, 23, 22, 21, 20, 19, 18, 17, 16, //
    63, 63, 62, 61, 61, 60, 59, 59, 58, 57, 57, 56, 55, 55, 54, 53, 53, //
    61, 61, 60, 60, 59, 59, 58, 57, 56, 55, 54, 53, 52, 51, 50, 49, 48, //
    47, 47, 46, 46, 45, 44, 43, 42, 41, 40, 39, 38, 37, 36, 35, 34, 33, //
    9, 9, 9, 9, 9, 9, 9, 9, 9, 9, 9, 9, 9, 9, 9, 9, 9, //
    10, 10, 10, 10, 10, 10, 10, 10, 10, 10, 10, 10, 10, 10, 10, 10, 10, //
    11, 11, 11, 11, 11, 11, 11, 11, 11, 11, 11, 11, 11, 11, 11, 11, 11,
];

impl Map {
    /// Row-major overview bytes, one per tile. Built on first access
    /// and cached; height edits do not refresh it, but reinitializing
    /// or loading the grid drops the cache.
    pub fn minimap(&mut self) -> &[u8] {
        if self.minimap.is_none() {
            let data = self.build_minimap();
            self.minimap = Some(data);
        }
        self.minimap.as_deref().unwrap_or(&[])
    }

    fn build_minimap(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.geom.tile_count());
        for row in 0..self.geom.rows() {
            for col in 0..self.geom.cols() {
                let pos = self.geom.pos(col, row);
                let type_off = COLOR_OFFSET[usize::from(self.type_up(pos).as_u8())];

                let right = self.geom.move_right(pos);
                let h1 = i32::from(self.height(right));
                let h2 = i32::from(self.height(self.geom.move_down_left(right)));

                let h_off = (h2 - h1 + 8).clamp(0, 16) as usize;
                data.push(COLORS[type_off + h_off]);
            }
        }
        data
    }
}
