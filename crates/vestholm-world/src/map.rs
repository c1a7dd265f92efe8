//! The tile store: packed per-position state, accessors, mutators, and
//! change observation.

use std::rc::Rc;

use vestholm_protocol::{Direction, MapPos, Minerals, Object, PlayerId, SweepState, Terrain};

use crate::geom::MapGeometry;

/// One packed cell of the grid.
///
/// `height` carries elevation in bits 0-4, the owner in bits 5-6, and the
/// has-owner flag in bit 7. `types` holds the up-triangle terrain in the high
/// nibble and the down triangle in the low nibble. `obj` is the 7-bit object
/// id plus the idle-serf marker in bit 7. `resource` packs minerals as
/// `type << 5 | amount` on land and a plain fish count on water.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Tile {
    pub(crate) height: u8,
    pub(crate) types: u8,
    pub(crate) paths: u8,
    pub(crate) obj: u8,
    pub(crate) resource: u8,
    pub(crate) obj_index: u16,
    pub(crate) serf: u16,
}

/// Observer for tile mutations. Callbacks run synchronously inside the
/// mutator and must not call back into the map.
pub trait ChangeHandler {
    fn on_height_changed(&self, pos: MapPos);
    fn on_object_changed(&self, pos: MapPos);
}

/// Bulk source of initial tile state, read once by [`Map::init_tiles`].
pub trait MapGenerator {
    fn height(&self, pos: MapPos) -> u8;
    fn type_up(&self, pos: MapPos) -> Terrain;
    fn type_down(&self, pos: MapPos) -> Terrain;
    fn object(&self, pos: MapPos) -> Object;
    fn resource_type(&self, pos: MapPos) -> Minerals;
    fn resource_amount(&self, pos: MapPos) -> u8;
}

/// The authoritative world grid.
pub struct Map {
    pub(crate) geom: MapGeometry,
    pub(crate) tiles: Vec<Tile>,
    pub(crate) sweep: SweepState,
    pub(crate) minimap: Option<Vec<u8>>,
    regions: u32,
    gold_deposit: u32,
    change_handlers: Vec<Rc<dyn ChangeHandler>>,
}

impl Map {
    pub fn new(size: u32) -> Self {
        let geom = MapGeometry::new(size);
        let tiles = vec![Tile::default(); geom.tile_count()];
        let regions = (geom.cols() >> 5) * (geom.rows() >> 5);
        Self {
            geom,
            tiles,
            sweep: SweepState::default(),
            minimap: None,
            regions,
            gold_deposit: 0,
            change_handlers: Vec::new(),
        }
    }

    #[inline]
    pub fn geom(&self) -> &MapGeometry {
        &self.geom
    }

    /// Count of 32x32 blocks in the grid; the unit of sweep throughput.
    #[inline]
    pub fn regions(&self) -> u32 {
        self.regions
    }

    /// Where the background sweep will resume.
    #[inline]
    pub fn sweep_state(&self) -> SweepState {
        self.sweep
    }

    #[inline]
    pub fn pos(&self, col: u32, row: u32) -> MapPos {
        self.geom.pos(col, row)
    }

    #[inline]
    pub fn neighbor(&self, pos: MapPos, dir: Direction) -> MapPos {
        self.geom.neighbor(pos, dir)
    }

    #[inline]
    pub(crate) fn tile(&self, pos: MapPos) -> &Tile {
        &self.tiles[pos.0 as usize]
    }

    #[inline]
    pub(crate) fn tile_mut(&mut self, pos: MapPos) -> &mut Tile {
        &mut self.tiles[pos.0 as usize]
    }

    /// Elevation, 0-31.
    #[inline]
    pub fn height(&self, pos: MapPos) -> u8 {
        self.tile(pos).height & 0x1f
    }

    #[inline]
    pub fn type_up(&self, pos: MapPos) -> Terrain {
        Terrain::from_u4(self.tile(pos).types >> 4)
    }

    #[inline]
    pub fn type_down(&self, pos: MapPos) -> Terrain {
        Terrain::from_u4(self.tile(pos).types)
    }

    #[inline]
    pub fn object(&self, pos: MapPos) -> Object {
        Object::from_u8(self.tile(pos).obj)
    }

    /// Registry index of the flag or building standing at `pos`.
    #[inline]
    pub fn object_index(&self, pos: MapPos) -> u16 {
        self.tile(pos).obj_index
    }

    /// Committed road directions leaving `pos`, one bit per `Direction`.
    #[inline]
    pub fn paths(&self, pos: MapPos) -> u8 {
        self.tile(pos).paths & 0x3f
    }

    #[inline]
    pub fn has_path(&self, pos: MapPos, dir: Direction) -> bool {
        self.tile(pos).paths & (1 << dir.index()) != 0
    }

    #[inline]
    pub fn has_flag(&self, pos: MapPos) -> bool {
        self.object(pos) == Object::Flag
    }

    #[inline]
    pub fn has_building(&self, pos: MapPos) -> bool {
        matches!(
            self.object(pos),
            Object::SmallBuilding | Object::LargeBuilding | Object::Castle
        )
    }

    #[inline]
    pub fn owner(&self, pos: MapPos) -> Option<PlayerId> {
        let height = self.tile(pos).height;
        if height & 0x80 != 0 {
            Some(PlayerId((height >> 5) & 0x03))
        } else {
            None
        }
    }

    #[inline]
    pub fn has_owner(&self, pos: MapPos) -> bool {
        self.tile(pos).height & 0x80 != 0
    }

    #[inline]
    pub fn idle_serf(&self, pos: MapPos) -> bool {
        self.tile(pos).obj & 0x80 != 0
    }

    #[inline]
    pub fn serf_index(&self, pos: MapPos) -> u16 {
        self.tile(pos).serf
    }

    /// Mineral kind under `pos`; meaningful on dry land only.
    #[inline]
    pub fn resource_type(&self, pos: MapPos) -> Minerals {
        Minerals::from_u3(self.tile(pos).resource >> 5)
    }

    #[inline]
    pub fn resource_amount(&self, pos: MapPos) -> u8 {
        self.tile(pos).resource & 0x1f
    }

    /// Fish under `pos`; meaningful on water only.
    #[inline]
    pub fn resource_fish(&self, pos: MapPos) -> u8 {
        self.tile(pos).resource
    }

    /// Gold ore present when the grid was initialized or loaded.
    #[inline]
    pub fn gold_deposit(&self) -> u32 {
        self.gold_deposit
    }

    /// True when all six triangles around the vertex lie inside the
    /// inclusive terrain band.
    pub fn types_within(&self, pos: MapPos, low: Terrain, high: Terrain) -> bool {
        let up_left = self.geom.move_up_left(pos);
        let triangles = [
            self.type_up(pos),
            self.type_down(pos),
            self.type_down(self.geom.move_left(pos)),
            self.type_up(up_left),
            self.type_down(up_left),
            self.type_up(self.geom.move_up(pos)),
        ];
        triangles.iter().all(|t| (low..=high).contains(t))
    }

    #[inline]
    pub fn is_in_water(&self, pos: MapPos) -> bool {
        self.types_within(pos, Terrain::Water0, Terrain::Water3)
    }

    /// Set elevation, preserving ownership bits. Notifies height observers
    /// once per surrounding vertex.
    pub fn set_height(&mut self, pos: MapPos, height: u8) {
        debug_assert!(height <= 0x1f, "height out of range");
        let tile = self.tile_mut(pos);
        tile.height = (tile.height & 0xe0) | (height & 0x1f);
        self.notify_height_changed(pos);
    }

    /// Set the ground object, preserving the idle-serf marker. `index`
    /// replaces the registry index when given, otherwise the old index
    /// stays. Notifies object observers once per surrounding vertex.
    pub fn set_object(&mut self, pos: MapPos, obj: Object, index: Option<u16>) {
        let tile = self.tile_mut(pos);
        tile.obj = (tile.obj & 0x80) | obj.as_u8();
        if let Some(index) = index {
            tile.obj_index = index;
        }
        self.notify_object_changed(pos);
    }

    /// Take `amount` from the mineral deposit under `pos`. Draining the
    /// deposit clears the mineral type as well.
    pub fn remove_ground_deposit(&mut self, pos: MapPos, amount: u8) {
        let left = self.resource_amount(pos).saturating_sub(amount);
        let tile = self.tile_mut(pos);
        tile.resource = if left == 0 {
            0
        } else {
            (tile.resource & 0xe0) | left
        };
    }

    /// Take `amount` fish from a water tile.
    pub fn remove_fish(&mut self, pos: MapPos, amount: u8) {
        debug_assert!(self.is_in_water(pos), "fish live in water");
        let tile = self.tile_mut(pos);
        tile.resource = tile.resource.saturating_sub(amount);
    }

    /// Record which serf occupies `pos` (0 for none).
    pub fn set_serf_index(&mut self, pos: MapPos, index: u16) {
        self.tile_mut(pos).serf = index;
    }

    pub fn set_idle_serf(&mut self, pos: MapPos) {
        self.tile_mut(pos).obj |= 0x80;
    }

    pub fn clear_idle_serf(&mut self, pos: MapPos) {
        self.tile_mut(pos).obj &= 0x7f;
    }

    /// Claim `pos` for `player`, keeping elevation untouched.
    pub fn set_owner(&mut self, pos: MapPos, player: PlayerId) {
        debug_assert!(player.0 < 4, "owner field holds players 0-3");
        let tile = self.tile_mut(pos);
        tile.height = (tile.height & 0x1f) | 0x80 | ((player.0 & 0x03) << 5);
    }

    pub fn del_owner(&mut self, pos: MapPos) {
        self.tile_mut(pos).height &= 0x1f;
    }

    pub(crate) fn add_path(&mut self, pos: MapPos, dir: Direction) {
        self.tile_mut(pos).paths |= 1 << dir.index();
    }

    pub(crate) fn del_path(&mut self, pos: MapPos, dir: Direction) {
        self.tile_mut(pos).paths &= !(1 << dir.index());
    }

    /// Register an observer. Registration is a plain list append; adding a
    /// handle twice doubles its notifications.
    pub fn add_change_handler(&mut self, handler: Rc<dyn ChangeHandler>) {
        self.change_handlers.push(handler);
    }

    /// Remove every registration of `handler`, matched by identity.
    pub fn del_change_handler(&mut self, handler: &Rc<dyn ChangeHandler>) {
        self.change_handlers.retain(|h| !Rc::ptr_eq(h, handler));
    }

    fn notify_height_changed(&self, pos: MapPos) {
        for dir in Direction::ALL {
            let vertex = self.geom.neighbor(pos, dir);
            for handler in &self.change_handlers {
                handler.on_height_changed(vertex);
            }
        }
    }

    fn notify_object_changed(&self, pos: MapPos) {
        for dir in Direction::ALL {
            let vertex = self.geom.neighbor(pos, dir);
            for handler in &self.change_handlers {
                handler.on_object_changed(vertex);
            }
        }
    }

    /// Bulk-load every tile from the generator, then derive the gold total.
    /// Fields are masked to their stored widths on the way in.
    pub fn init_tiles(&mut self, generator: &dyn MapGenerator) {
        for i in 0..self.tiles.len() {
            let pos = MapPos(i as u32);
            let mineral = generator.resource_type(pos);
            let amount = generator.resource_amount(pos);
            let tile = &mut self.tiles[i];
            tile.height = generator.height(pos) & 0x1f;
            tile.types = (generator.type_up(pos).as_u8() << 4) | generator.type_down(pos).as_u8();
            tile.obj = generator.object(pos).as_u8();
            tile.resource = match mineral {
                Minerals::None => amount,
                _ => (mineral.as_u8() << 5) | (amount & 0x1f),
            };
        }
        self.minimap = None;
        self.recompute_gold_deposit();
    }

    pub(crate) fn recompute_gold_deposit(&mut self) {
        let mut total = 0_u32;
        for i in 0..self.tiles.len() {
            let pos = MapPos(i as u32);
            if !self.is_in_water(pos) && self.resource_type(pos) == Minerals::Gold {
                total += u32::from(self.resource_amount(pos));
            }
        }
        self.gold_deposit = total;
    }
}
