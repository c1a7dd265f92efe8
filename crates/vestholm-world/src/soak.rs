//! Long-run determinism audit for the world sweep.
//!
//! Builds a fixture grid from a seed, drives the tick update for a
//! configured span, and reports fish totals, observer traffic and the
//! final state hash. Two runs with the same config must report the
//! same hash; a mismatch means the sweep or the rng drifted.

use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use vestholm_protocol::{
    hash_bytes_fnv1a64, snapshot_hash, MapPos, Minerals, Object, Terrain, WireError,
};

use crate::geom::MapGeometry;
use crate::map::{ChangeHandler, Map, MapGenerator};
use crate::rng::GameRng;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SoakConfig {
    pub seed: u64,
    pub size: u32,
    pub steps: u32,
    pub tick_step: u16,
}

impl Default for SoakConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            size: 3,
            steps: 256,
            tick_step: 20,
        }
    }
}

/// What one soak run observed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoakReport {
    pub seed: u64,
    pub size: u32,
    pub steps: u32,
    pub fish_start: u64,
    pub fish_end: u64,
    pub object_changes: u64,
    pub height_changes: u64,
    pub gold_deposit: u32,
    pub state_hash: u64,
}

/// Seeded fixture terrain: a water band across the top quarter of the
/// grid, grassland below it scattered with everything the sweep acts
/// on, and a sprinkling of ore.
pub struct SoakGenerator {
    seed: u64,
    geom: MapGeometry,
}

impl SoakGenerator {
    pub fn new(seed: u64, size: u32) -> Self {
        Self {
            seed,
            geom: MapGeometry::new(size),
        }
    }

    fn mix(&self, pos: MapPos) -> u64 {
        let mut bytes = [0u8; 12];
        bytes[..8].copy_from_slice(&self.seed.to_le_bytes());
        bytes[8..].copy_from_slice(&pos.0.to_le_bytes());
        hash_bytes_fnv1a64(&bytes)
    }

    fn in_water_band(&self, pos: MapPos) -> bool {
        self.geom.pos_row(pos) < self.geom.rows() / 4
    }
}

impl MapGenerator for SoakGenerator {
    fn height(&self, pos: MapPos) -> u8 {
        (self.mix(pos) % 8) as u8
    }

    fn type_up(&self, pos: MapPos) -> Terrain {
        if self.in_water_band(pos) {
            Terrain::Water2
        } else {
            Terrain::Grass1
        }
    }

    fn type_down(&self, pos: MapPos) -> Terrain {
        self.type_up(pos)
    }

    fn object(&self, pos: MapPos) -> Object {
        if self.in_water_band(pos) {
            return Object::None;
        }
        match self.mix(pos) % 19 {
            0 => Object::NewPine,
            1 => Object::NewTree,
            2 => Object::Seeds0,
            3 => Object::Seeds3,
            4 => Object::Seeds5,
            5 => Object::Field2,
            6 => Object::Field5,
            7 => Object::FieldExpired,
            8 => Object::FelledPine1,
            9 => Object::FelledTree3,
            10 => Object::Stump,
            11 => Object::SignLargeGold,
            12 => Object::SignEmpty,
            13 => Object::Pine0,
            14 => Object::Tree4,
            15 => Object::Stone2,
            _ => Object::None,
        }
    }

    fn resource_type(&self, pos: MapPos) -> Minerals {
        if self.in_water_band(pos) {
            return Minerals::None;
        }
        match self.mix(pos) % 23 {
            0 => Minerals::Gold,
            1 => Minerals::Iron,
            2 => Minerals::Coal,
            _ => Minerals::None,
        }
    }

    fn resource_amount(&self, pos: MapPos) -> u8 {
        let h = self.mix(pos);
        if self.in_water_band(pos) {
            (h % 8) as u8
        } else if self.resource_type(pos) != Minerals::None {
            (8 + h % 8) as u8
        } else {
            0
        }
    }
}

/// Tallies observer callbacks during a run.
#[derive(Default)]
pub struct ChangeCounter {
    heights: Cell<u64>,
    objects: Cell<u64>,
}

impl ChangeCounter {
    pub fn heights(&self) -> u64 {
        self.heights.get()
    }

    pub fn objects(&self) -> u64 {
        self.objects.get()
    }
}

impl ChangeHandler for ChangeCounter {
    fn on_height_changed(&self, _pos: MapPos) {
        self.heights.set(self.heights.get() + 1);
    }

    fn on_object_changed(&self, _pos: MapPos) {
        self.objects.set(self.objects.get() + 1);
    }
}

/// Fish currently in open water.
pub fn fish_total(map: &Map) -> u64 {
    let mut total = 0;
    for i in 0..map.geom().tile_count() {
        let pos = MapPos(i as u32);
        if map.is_in_water(pos) {
            total += u64::from(map.resource_fish(pos));
        }
    }
    total
}

pub fn run_soak(config: &SoakConfig) -> Result<SoakReport, WireError> {
    let mut map = Map::new(config.size);
    map.init_tiles(&SoakGenerator::new(config.seed, config.size));

    let counter = Rc::new(ChangeCounter::default());
    map.add_change_handler(counter.clone());

    let mut rng = GameRng::seed_from_u64(config.seed);
    let fish_start = fish_total(&map);

    let mut tick: u16 = 0;
    for _ in 0..config.steps {
        tick = tick.wrapping_add(config.tick_step);
        map.update(tick, &mut rng);
    }

    let fish_end = fish_total(&map);
    let state_hash = snapshot_hash(&map.snapshot(&rng))?;

    Ok(SoakReport {
        seed: config.seed,
        size: config.size,
        steps: config.steps,
        fish_start,
        fish_end,
        object_changes: counter.objects(),
        height_changes: counter.heights(),
        gold_deposit: map.gold_deposit(),
        state_hash,
    })
}
