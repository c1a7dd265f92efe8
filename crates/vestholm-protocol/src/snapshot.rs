use serde::{Deserialize, Serialize};

use crate::MapPos;

/// Tiles per side of one persisted map section.
pub const SECTION_SIZE: u32 = 16;

/// Resume cursor for the amortized world sweep.
///
/// `counter` is replenished in 20-tick units, `ring` cycles 16 down to 0 and
/// gates low-frequency decay, `pos` is where the next visit strides from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepState {
    pub last_tick: u16,
    pub counter: i32,
    pub ring: u8,
    pub pos: MapPos,
}

/// One 16x16 block of tile fields, row-major within the block.
///
/// Field widths follow the persisted layout: heights masked to 5 bits (owner
/// bits are not carried here), paths to 6, objects to 7. Water tiles store
/// their fish count as the resource amount with type 0.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapSection {
    pub origin_col: u32,
    pub origin_row: u32,
    pub heights: Vec<u8>,
    pub types_up: Vec<u8>,
    pub types_down: Vec<u8>,
    pub paths: Vec<u8>,
    pub objects: Vec<u8>,
    pub serfs: Vec<u16>,
    pub resource_types: Vec<u8>,
    pub resource_amounts: Vec<u8>,
}

/// Full world-grid state for initial sync or rejoin.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapSnapshot {
    pub size: u32,
    pub sections: Vec<MapSection>,
    #[serde(default)]
    pub sweep: SweepState,
    #[serde(default)]
    pub rng_state: [u8; 6], // for determinism verification
}
