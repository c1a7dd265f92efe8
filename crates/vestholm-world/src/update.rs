//! Amortized background pass over the grid.
//!
//! Elapsed ticks buy tile visits at a fixed rate, so the cost of aging
//! vegetation and moving fish stays proportional to map area regardless
//! of how often the caller advances time. The cursor, ring counter and
//! tick credit live in [`SweepState`](vestholm_protocol::SweepState)
//! and survive a save/load cycle.

use vestholm_protocol::{Direction, MapPos, Object};

use crate::map::Map;
use crate::rng::GameRng;

/// Ticks one visit quota costs. Every `TICKS_PER_QUOTA` elapsed ticks,
/// one tile per 32x32 region is visited.
const TICKS_PER_QUOTA: i32 = 20;

/// Column stride between consecutive visits. Coprime with every legal
/// grid width, so repeated strides cover all columns.
const SWEEP_STRIDE: u32 = 23;

impl Map {
    /// Advance the sweep to `tick`.
    ///
    /// `tick` is a wrapping 16-bit counter; the elapsed delta is taken
    /// modulo 2^16, so callers can let their clock roll over. Unspent
    /// ticks carry in the counter, which keeps the long-run visit rate
    /// exact across calls of any granularity.
    pub fn update(&mut self, tick: u16, rng: &mut GameRng) {
        let delta = tick.wrapping_sub(self.sweep.last_tick);
        self.sweep.last_tick = tick;
        self.sweep.counter -= i32::from(delta);

        let mut quota = 0u32;
        while self.sweep.counter < 0 {
            quota += self.regions();
            self.sweep.counter += TICKS_PER_QUOTA;
        }

        let mut pos = self.sweep.pos;
        for _ in 0..quota {
            self.sweep.ring = match self.sweep.ring {
                0 => 16,
                r => r - 1,
            };
            let wraps = self.geom.pos_col(pos) + SWEEP_STRIDE >= self.geom.cols();
            pos = self.geom.move_right_n(pos, SWEEP_STRIDE);
            if wraps {
                pos = self.geom.move_down(pos);
            }
            self.update_hidden(pos, rng);
            self.update_public(pos, rng);
        }
        self.sweep.pos = pos;
    }

    /// Fish growth and migration. Consumes one random draw per visited
    /// water tile that holds fish; dry or empty tiles draw nothing.
    fn update_hidden(&mut self, pos: MapPos, rng: &mut GameRng) {
        if !self.is_in_water(pos) || self.resource_fish(pos) == 0 {
            return;
        }
        let r = rng.next_u16();
        if self.resource_fish(pos) < 10 && r & 0x3f00 != 0 {
            self.tile_mut(pos).resource += 1;
        }
        // Fish swim along the even axes only.
        let dir = match (r >> 2) & 3 {
            0 => Direction::Right,
            1 => Direction::DownRight,
            2 => Direction::Left,
            _ => Direction::UpLeft,
        };
        let adj = self.neighbor(pos, dir);
        if self.is_in_water(adj) {
            self.tile_mut(pos).resource -= 1;
            let tile = self.tile_mut(adj);
            tile.resource = tile.resource.saturating_add(1);
        }
    }

    /// Visible tile aging: felled trunks rot, saplings mature, sown
    /// fields advance, and prospecting signs fade on the slow ring.
    fn update_public(&mut self, pos: MapPos, rng: &mut GameRng) {
        match self.object(pos) {
            Object::Stump => {
                if rng.next_u16() & 3 == 0 {
                    self.set_object(pos, Object::None, None);
                }
            }
            Object::FelledPine0
            | Object::FelledPine1
            | Object::FelledPine2
            | Object::FelledPine3
            | Object::FelledPine4
            | Object::FelledTree0
            | Object::FelledTree1
            | Object::FelledTree2
            | Object::FelledTree3
            | Object::FelledTree4 => {
                self.set_object(pos, Object::Stump, None);
            }
            Object::NewPine => {
                let r = rng.next_u16();
                if r & 0x300 == 0 {
                    let grown = Object::from_u8(Object::Pine0.as_u8() + (r & 7) as u8);
                    self.set_object(pos, grown, None);
                }
            }
            Object::NewTree => {
                let r = rng.next_u16();
                if r & 0x300 == 0 {
                    let grown = Object::from_u8(Object::Tree0.as_u8() + (r & 7) as u8);
                    self.set_object(pos, grown, None);
                }
            }
            obj @ (Object::Seeds0
            | Object::Seeds1
            | Object::Seeds2
            | Object::Seeds3
            | Object::Seeds4
            | Object::Field0
            | Object::Field1
            | Object::Field2
            | Object::Field3
            | Object::Field4) => {
                self.set_object(pos, Object::from_u8(obj.as_u8() + 1), None);
            }
            Object::Seeds5 => self.set_object(pos, Object::Field0, None),
            Object::Field5 => self.set_object(pos, Object::FieldExpired, None),
            Object::FieldExpired => self.set_object(pos, Object::None, None),
            Object::SignLargeGold
            | Object::SignSmallGold
            | Object::SignLargeIron
            | Object::SignSmallIron
            | Object::SignLargeCoal
            | Object::SignSmallCoal
            | Object::SignLargeStone
            | Object::SignSmallStone
            | Object::SignEmpty => {
                // Signs only fade on the slowest ring, one cycle in
                // seventeen.
                if self.sweep.ring == 0 {
                    self.set_object(pos, Object::None, None);
                }
            }
            _ => {}
        }
    }
}
