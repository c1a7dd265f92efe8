//! Road building: the in-progress path model and the placement engine that
//! commits or rejects it against the grid.

use vestholm_protocol::{Direction, MapPos, Object, Space};

use crate::geom::MapGeometry;
use crate::map::Map;

/// A road under construction: a start position plus the directions walked
/// from it. With no start and no directions the road is empty and every
/// mutation except `start` is refused.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Road {
    begin: Option<MapPos>,
    dirs: Vec<Direction>,
}

impl Road {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a fresh path at `begin`, dropping any previous progress.
    pub fn start(&mut self, begin: MapPos) {
        self.begin = Some(begin);
        self.dirs.clear();
    }

    pub fn source(&self) -> Option<MapPos> {
        self.begin
    }

    pub fn dirs(&self) -> &[Direction] {
        &self.dirs
    }

    pub fn last(&self) -> Option<Direction> {
        self.dirs.last().copied()
    }

    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    /// The position the path currently reaches.
    pub fn end(&self, geom: &MapGeometry) -> Option<MapPos> {
        let mut pos = self.begin?;
        for &dir in &self.dirs {
            pos = geom.neighbor(pos, dir);
        }
        Some(pos)
    }

    /// Append a direction. Fails only when no path has been started;
    /// whether the segment is placeable is the placement engine's call.
    pub fn extend(&mut self, dir: Direction) -> bool {
        if self.begin.is_none() {
            return false;
        }
        self.dirs.push(dir);
        true
    }

    /// Drop the last direction; draining the path resets it to empty.
    pub fn undo(&mut self) -> bool {
        if self.begin.is_none() {
            return false;
        }
        self.dirs.pop();
        if self.dirs.is_empty() {
            self.begin = None;
        }
        true
    }

    /// Would `dir` exactly reverse the last step?
    pub fn is_undo(&self, dir: Direction) -> bool {
        self.last() == Some(dir.reverse())
    }

    /// Advisory self-intersection check for interactive extension: refuses
    /// an immediate backtrack and any step onto a vertex the path has
    /// already visited, the start included.
    pub fn is_valid_extension(&self, geom: &MapGeometry, dir: Direction) -> bool {
        if self.is_undo(dir) {
            return false;
        }
        let Some(begin) = self.begin else {
            return false;
        };
        let Some(end) = self.end(geom) else {
            return false;
        };
        let extended = geom.neighbor(end, dir);
        let mut pos = begin;
        if pos == extended {
            return false;
        }
        for &d in &self.dirs {
            pos = geom.neighbor(pos, d);
            if pos == extended {
                return false;
            }
        }
        true
    }
}

impl Map {
    /// Can a road segment leave `pos` along `dir`? The target vertex must
    /// carry no other path, hold nothing at semipassable or above, be owned
    /// by the same player as the source, and the segment may not cross
    /// between land and water without a flag at either end. Connecting the
    /// finished road to its terminal flags is the owning game's business.
    pub fn is_road_segment_valid(&self, pos: MapPos, dir: Direction) -> bool {
        let other = self.neighbor(pos, dir);
        let obj = self.object(other);
        if self.paths(other) != 0 && obj != Object::Flag {
            return false;
        }
        if obj.space() >= Space::Semipassable {
            return false;
        }
        match (self.owner(other), self.owner(pos)) {
            (Some(target), Some(source)) if target == source => {}
            _ => return false,
        }
        if self.is_in_water(pos) != self.is_in_water(other)
            && !(self.has_flag(pos) || self.has_flag(other))
        {
            return false;
        }
        true
    }

    /// Commit every segment of `road` in order, or roll the grid back to
    /// its pre-call path state on the first invalid segment.
    pub fn place_road_segments(&mut self, road: &Road) -> bool {
        let Some(mut pos) = road.source() else {
            return false;
        };
        let mut placed: Vec<(MapPos, Direction)> = Vec::with_capacity(road.len());
        for &dir in road.dirs() {
            if !self.is_road_segment_valid(pos, dir) {
                for &(p, d) in placed.iter().rev() {
                    let other = self.neighbor(p, d);
                    self.del_path(p, d);
                    self.del_path(other, d.reverse());
                }
                return false;
            }
            let other = self.neighbor(pos, dir);
            self.add_path(pos, dir);
            self.add_path(other, dir.reverse());
            placed.push((pos, dir));
            pos = other;
        }
        true
    }

    /// Clear one committed segment, step to its far end, and report the
    /// next outgoing direction found there.
    pub fn remove_road_segment(
        &mut self,
        pos: MapPos,
        dir: Direction,
    ) -> (MapPos, Option<Direction>) {
        self.del_path(pos, dir);
        let pos = self.neighbor(pos, dir);
        self.del_path(pos, dir.reverse());
        let next = Direction::ALL.into_iter().find(|&d| self.has_path(pos, d));
        (pos, next)
    }

    /// Walk from `pos` along `dir`, clearing each tile's pointer back the
    /// way we came, until a flag terminates the road. Fails when the path
    /// dead-ends before a flag.
    pub fn remove_road_backref_until_flag(&mut self, pos: MapPos, dir: Direction) -> bool {
        let mut pos = pos;
        let mut dir = dir;
        loop {
            pos = self.neighbor(pos, dir);
            self.del_path(pos, dir.reverse());
            if self.has_flag(pos) {
                return true;
            }
            let Some(next) = Direction::ALL.into_iter().find(|&d| self.has_path(pos, d)) else {
                return false;
            };
            dir = next;
        }
    }

    /// Split the road running through a junction tile: walk both departures
    /// to their flags, clearing the bits that point back toward the
    /// junction. Refuses to touch anything unless the junction has exactly
    /// two departures.
    pub fn remove_road_backrefs(&mut self, pos: MapPos) -> bool {
        let mut departures = [None; 2];
        let mut count = 0;
        for d in Direction::ALL {
            if self.has_path(pos, d) {
                if count < 2 {
                    departures[count] = Some(d);
                }
                count += 1;
            }
        }
        if count != 2 {
            return false;
        }
        let (Some(first), Some(second)) = (departures[0], departures[1]) else {
            return false;
        };
        if !self.remove_road_backref_until_flag(pos, first) {
            return false;
        }
        self.remove_road_backref_until_flag(pos, second)
    }

    /// Does the segment from `pos` along `dir` run between two water
    /// triangles? Backward directions are folded onto the owning endpoint
    /// first.
    pub fn road_segment_in_water(&self, pos: MapPos, dir: Direction) -> bool {
        let (pos, dir) = if dir > Direction::Down {
            (self.neighbor(pos, dir), dir.reverse())
        } else {
            (pos, dir)
        };
        match dir {
            Direction::Right => {
                self.type_down(pos).is_water()
                    && self.type_up(self.geom.move_up(pos)).is_water()
            }
            Direction::DownRight => {
                self.type_up(pos).is_water() && self.type_down(pos).is_water()
            }
            Direction::Down => {
                self.type_up(pos).is_water()
                    && self.type_down(self.geom.move_left(pos)).is_water()
            }
            _ => unreachable!(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vestholm_protocol::{PlayerId, Terrain};

    fn open_map() -> Map {
        let mut map = Map::new(1);
        let grass = (Terrain::Grass1.as_u8() << 4) | Terrain::Grass1.as_u8();
        for tile in map.tiles.iter_mut() {
            tile.types = grass;
        }
        for i in 0..map.tiles.len() {
            map.set_owner(MapPos(i as u32), PlayerId(1));
        }
        map
    }

    #[test]
    fn test_road_state_machine() {
        let geom = MapGeometry::new(1);
        let mut road = Road::new();
        assert!(!road.extend(Direction::Right));
        assert!(!road.undo());
        assert_eq!(road.end(&geom), None);

        road.start(geom.pos(4, 4));
        assert_eq!(road.source(), Some(geom.pos(4, 4)));
        assert!(road.extend(Direction::Right));
        assert!(road.extend(Direction::Down));
        assert_eq!(road.len(), 2);
        assert_eq!(road.last(), Some(Direction::Down));
        assert_eq!(road.end(&geom), Some(geom.pos(5, 5)));

        assert!(road.undo());
        assert!(road.undo());
        assert_eq!(road.source(), None);
        assert!(!road.extend(Direction::Right));
    }

    #[test]
    fn test_is_undo_matches_only_the_exact_reverse() {
        let geom = MapGeometry::new(1);
        let mut road = Road::new();
        road.start(geom.pos(1, 1));
        road.extend(Direction::DownRight);
        assert!(road.is_undo(Direction::UpLeft));
        assert!(!road.is_undo(Direction::Left));
        assert!(!road.is_undo(Direction::DownRight));
    }

    #[test]
    fn test_extension_refuses_revisits() {
        let geom = MapGeometry::new(2);
        let mut road = Road::new();
        road.start(geom.pos(10, 10));
        // A freshly started path has nothing to collide with.
        for dir in Direction::ALL {
            assert!(road.is_valid_extension(&geom, dir));
        }

        assert!(road.extend(Direction::Right));
        assert!(!road.is_valid_extension(&geom, Direction::Left));

        assert!(road.extend(Direction::Down));
        // Stepping up-left would land back on the start vertex.
        assert!(!road.is_valid_extension(&geom, Direction::UpLeft));
        // Stepping up would land on the first intermediate vertex.
        assert!(!road.is_valid_extension(&geom, Direction::Up));
        assert!(road.is_valid_extension(&geom, Direction::Right));
    }

    #[test]
    fn test_segment_validity_checks_the_target() {
        let mut map = open_map();
        let pos = map.pos(5, 5);
        assert!(map.is_road_segment_valid(pos, Direction::Right));

        // An occupying object below semipassable is fine, anything at or
        // above it blocks.
        let target = map.neighbor(pos, Direction::Right);
        map.set_object(target, Object::SignLargeGold, None);
        assert!(map.is_road_segment_valid(pos, Direction::Right));
        map.set_object(target, Object::Seeds3, None);
        assert!(!map.is_road_segment_valid(pos, Direction::Right));
        map.set_object(target, Object::Stone3, None);
        assert!(!map.is_road_segment_valid(pos, Direction::Right));
        map.set_object(target, Object::None, None);

        // A target already carrying a path is a crossing; a flag target is
        // an occupied vertex. Both are rejected here.
        map.add_path(target, Direction::Up);
        assert!(!map.is_road_segment_valid(pos, Direction::Right));
        map.del_path(target, Direction::Up);
        map.set_object(target, Object::Flag, None);
        assert!(!map.is_road_segment_valid(pos, Direction::Right));
        map.set_object(target, Object::None, None);

        // Ownership must exist and agree across the segment.
        map.set_owner(target, PlayerId(2));
        assert!(!map.is_road_segment_valid(pos, Direction::Right));
        map.del_owner(target);
        assert!(!map.is_road_segment_valid(pos, Direction::Right));
        map.set_owner(target, PlayerId(1));
        map.del_owner(pos);
        assert!(!map.is_road_segment_valid(pos, Direction::Right));
    }

    #[test]
    fn test_water_boundary_needs_a_flag() {
        let mut map = open_map();
        let water = (Terrain::Water1.as_u8() << 4) | Terrain::Water1.as_u8();
        for col in 20..=27 {
            for row in 20..=27 {
                let pos = map.pos(col, row);
                map.tiles[pos.0 as usize].types = water;
            }
        }
        let shore = map.pos(20, 24);
        let wet = map.pos(21, 24);
        assert!(!map.is_in_water(shore));
        assert!(map.is_in_water(wet));

        assert!(!map.is_road_segment_valid(shore, Direction::Right));
        map.set_object(shore, Object::Flag, None);
        assert!(map.is_road_segment_valid(shore, Direction::Right));
    }

    #[test]
    fn test_water_edge_classification() {
        let mut map = Map::new(1);
        let pos = map.pos(9, 9);
        assert!(map.road_segment_in_water(pos, Direction::Right));
        assert!(map.road_segment_in_water(pos, Direction::Down));
        // A backward direction folds onto the same edge.
        assert!(map.road_segment_in_water(map.neighbor(pos, Direction::Right), Direction::Left));

        let grass = (Terrain::Grass0.as_u8() << 4) | Terrain::Grass0.as_u8();
        for tile in map.tiles.iter_mut() {
            tile.types = grass;
        }
        assert!(!map.road_segment_in_water(pos, Direction::DownRight));
    }

    #[test]
    fn test_placement_commits_symmetric_bits() {
        let mut map = open_map();
        let mut road = Road::new();
        let begin = map.pos(5, 5);
        road.start(begin);
        road.extend(Direction::Right);
        road.extend(Direction::DownRight);
        road.extend(Direction::Down);
        assert!(map.place_road_segments(&road));

        let mut pos = begin;
        for &dir in road.dirs() {
            assert!(map.has_path(pos, dir));
            pos = map.neighbor(pos, dir);
            assert!(map.has_path(pos, dir.reverse()));
        }
    }

    #[test]
    fn test_placement_rolls_back_on_failure() {
        let mut map = open_map();
        let begin = map.pos(5, 5);
        let mut road = Road::new();
        road.start(begin);
        road.extend(Direction::Right);
        road.extend(Direction::DownRight);
        road.extend(Direction::Down);

        // Block the final target.
        let blocked = map.pos(7, 7);
        map.set_object(blocked, Object::Stone0, None);
        assert!(!map.place_road_segments(&road));

        for i in 0..map.tiles.len() {
            assert_eq!(map.paths(MapPos(i as u32)), 0, "tile {i} kept a path bit");
        }
    }

    #[test]
    fn test_backref_walk_stops_at_the_flag() {
        let mut map = open_map();
        // Flag A at (5,5), junction at (7,5), flag B at (9,5).
        let flag_a = map.pos(5, 5);
        let junction = map.pos(7, 5);
        let flag_b = map.pos(9, 5);

        let mut road = Road::new();
        road.start(flag_a);
        for _ in 0..4 {
            road.extend(Direction::Right);
        }
        assert!(map.place_road_segments(&road));

        // Flags go in after the roadbed; placement itself refuses to
        // build into an occupied vertex.
        map.set_object(flag_a, Object::Flag, None);
        map.set_object(flag_b, Object::Flag, None);

        assert!(map.remove_road_backrefs(junction));

        // The junction keeps its own departures; the tiles on the way to
        // each flag lost only the bit pointing back at the junction.
        assert!(map.has_path(junction, Direction::Right));
        assert!(map.has_path(junction, Direction::Left));
        assert!(!map.has_path(map.pos(6, 5), Direction::Right));
        assert!(map.has_path(map.pos(6, 5), Direction::Left));
        assert!(!map.has_path(map.pos(8, 5), Direction::Left));
        assert!(map.has_path(map.pos(8, 5), Direction::Right));
        assert!(!map.has_path(flag_a, Direction::Right));
        assert!(!map.has_path(flag_b, Direction::Left));
    }

    #[test]
    fn test_backref_split_needs_exactly_two_departures() {
        let mut map = open_map();
        let pos = map.pos(12, 12);
        assert!(!map.remove_road_backrefs(pos));

        map.add_path(pos, Direction::Right);
        assert!(!map.remove_road_backrefs(pos));

        map.add_path(pos, Direction::Left);
        map.add_path(pos, Direction::Down);
        assert!(!map.remove_road_backrefs(pos));
        assert_eq!(map.paths(pos), map.paths(pos) & 0x3f);
        assert!(map.has_path(pos, Direction::Right));
        assert!(map.has_path(pos, Direction::Left));
        assert!(map.has_path(pos, Direction::Down));
    }
}
