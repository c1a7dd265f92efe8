use serde::{Deserialize, Serialize};

/// Terrain class of one triangle of a tile.
///
/// Water 0-3, grass 4-7, desert 8-10, tundra 11-13, snow 14-15. Within a band
/// the value encodes shore/edge adjacency or elevation shading; only the map
/// generator enforces that correlation.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum Terrain {
    Water0 = 0,
    Water1,
    Water2,
    Water3,
    Grass0 = 4,
    Grass1,
    Grass2,
    Grass3,
    Desert0 = 8,
    Desert1,
    Desert2,
    Tundra0 = 11,
    Tundra1,
    Tundra2,
    Snow0 = 14,
    Snow1,
}

const TERRAIN_BY_NIBBLE: [Terrain; 16] = [
    Terrain::Water0,
    Terrain::Water1,
    Terrain::Water2,
    Terrain::Water3,
    Terrain::Grass0,
    Terrain::Grass1,
    Terrain::Grass2,
    Terrain::Grass3,
    Terrain::Desert0,
    Terrain::Desert1,
    Terrain::Desert2,
    Terrain::Tundra0,
    Terrain::Tundra1,
    Terrain::Tundra2,
    Terrain::Snow0,
    Terrain::Snow1,
];

impl Terrain {
    /// Decode a stored nibble; out-of-width bits are masked off.
    #[inline]
    pub fn from_u4(value: u8) -> Terrain {
        TERRAIN_BY_NIBBLE[(value & 0x0f) as usize]
    }

    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    #[inline]
    pub const fn is_water(self) -> bool {
        (self as u8) <= (Terrain::Water3 as u8)
    }
}

/// Mineral kind carried in the high bits of a ground-resource byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Minerals {
    None = 0,
    Gold,
    Iron,
    Coal,
    Stone,
}

impl Minerals {
    /// Decode the 3-bit mineral field; unassigned encodings read as none.
    #[inline]
    pub fn from_u3(value: u8) -> Minerals {
        match value & 0x07 {
            1 => Minerals::Gold,
            2 => Minerals::Iron,
            3 => Minerals::Coal,
            4 => Minerals::Stone,
            _ => Minerals::None,
        }
    }

    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

/// How much of a vertex a ground object occupies.
///
/// The ordering is meaningful: road building rejects any target at
/// `Semipassable` or above, serf traversal distinguishes the rest.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum Space {
    Open = 0,
    Semipassable,
    Filled,
    Impassable,
}

/// Ground feature occupying a vertex, stored as a 7-bit id.
///
/// Numbering is part of the save format. Gaps in the id space (5-7, 32-71,
/// 127) decode as `None`; raw tile bytes keep whatever was stored so an
/// unknown id survives a load/save round trip untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Object {
    None = 0,
    Flag = 1,
    SmallBuilding = 2,
    LargeBuilding = 3,
    Castle = 4,

    Tree0 = 8,
    Tree1,
    Tree2,
    Tree3,
    Tree4,
    Tree5,
    Tree6,
    Tree7,

    Pine0 = 16,
    Pine1,
    Pine2,
    Pine3,
    Pine4,
    Pine5,
    Pine6,
    Pine7,

    Palm0 = 24,
    Palm1,
    Palm2,
    Palm3,

    WaterTree0 = 28,
    WaterTree1,
    WaterTree2,
    WaterTree3,

    Stone0 = 72,
    Stone1,
    Stone2,
    Stone3,
    Stone4,
    Stone5,
    Stone6,
    Stone7,

    Sandstone0 = 80,
    Sandstone1,

    Cross = 82,
    Stump = 83,

    Stone = 84,
    Sandstone3 = 85,

    Cadaver0 = 86,
    Cadaver1,

    WaterStone0 = 88,
    WaterStone1,

    Cactus0 = 90,
    Cactus1,

    DeadTree = 92,

    FelledPine0 = 93,
    FelledPine1,
    FelledPine2,
    FelledPine3,
    FelledPine4,

    FelledTree0 = 98,
    FelledTree1,
    FelledTree2,
    FelledTree3,
    FelledTree4,

    NewPine = 103,
    NewTree = 104,

    Seeds0 = 105,
    Seeds1,
    Seeds2,
    Seeds3,
    Seeds4,
    Seeds5,

    FieldExpired = 111,

    SignLargeGold = 112,
    SignSmallGold,
    SignLargeIron,
    SignSmallIron,
    SignLargeCoal,
    SignSmallCoal,
    SignLargeStone,
    SignSmallStone,

    SignEmpty = 120,

    Field0 = 121,
    Field1,
    Field2,
    Field3,
    Field4,
    Field5,
}

const OBJECT_BY_ID: [Object; 128] = {
    let mut table = [Object::None; 128];
    table[1] = Object::Flag;
    table[2] = Object::SmallBuilding;
    table[3] = Object::LargeBuilding;
    table[4] = Object::Castle;
    table[8] = Object::Tree0;
    table[9] = Object::Tree1;
    table[10] = Object::Tree2;
    table[11] = Object::Tree3;
    table[12] = Object::Tree4;
    table[13] = Object::Tree5;
    table[14] = Object::Tree6;
    table[15] = Object::Tree7;
    table[16] = Object::Pine0;
    table[17] = Object::Pine1;
    table[18] = Object::Pine2;
    table[19] = Object::Pine3;
    table[20] = Object::Pine4;
    table[21] = Object::Pine5;
    table[22] = Object::Pine6;
    table[23] = Object::Pine7;
    table[24] = Object::Palm0;
    table[25] = Object::Palm1;
    table[26] = Object::Palm2;
    table[27] = Object::Palm3;
    table[28] = Object::WaterTree0;
    table[29] = Object::WaterTree1;
    table[30] = Object::WaterTree2;
    table[31] = Object::WaterTree3;
    table[72] = Object::Stone0;
    table[73] = Object::Stone1;
    table[74] = Object::Stone2;
    table[75] = Object::Stone3;
    table[76] = Object::Stone4;
    table[77] = Object::Stone5;
    table[78] = Object::Stone6;
    table[79] = Object::Stone7;
    table[80] = Object::Sandstone0;
    table[81] = Object::Sandstone1;
    table[82] = Object::Cross;
    table[83] = Object::Stump;
    table[84] = Object::Stone;
    table[85] = Object::Sandstone3;
    table[86] = Object::Cadaver0;
    table[87] = Object::Cadaver1;
    table[88] = Object::WaterStone0;
    table[89] = Object::WaterStone1;
    table[90] = Object::Cactus0;
    table[91] = Object::Cactus1;
    table[92] = Object::DeadTree;
    table[93] = Object::FelledPine0;
    table[94] = Object::FelledPine1;
    table[95] = Object::FelledPine2;
    table[96] = Object::FelledPine3;
    table[97] = Object::FelledPine4;
    table[98] = Object::FelledTree0;
    table[99] = Object::FelledTree1;
    table[100] = Object::FelledTree2;
    table[101] = Object::FelledTree3;
    table[102] = Object::FelledTree4;
    table[103] = Object::NewPine;
    table[104] = Object::NewTree;
    table[105] = Object::Seeds0;
    table[106] = Object::Seeds1;
    table[107] = Object::Seeds2;
    table[108] = Object::Seeds3;
    table[109] = Object::Seeds4;
    table[110] = Object::Seeds5;
    table[111] = Object::FieldExpired;
    table[112] = Object::SignLargeGold;
    table[113] = Object::SignSmallGold;
    table[114] = Object::SignLargeIron;
    table[115] = Object::SignSmallIron;
    table[116] = Object::SignLargeCoal;
    table[117] = Object::SignSmallCoal;
    table[118] = Object::SignLargeStone;
    table[119] = Object::SignSmallStone;
    table[120] = Object::SignEmpty;
    table[121] = Object::Field0;
    table[122] = Object::Field1;
    table[123] = Object::Field2;
    table[124] = Object::Field3;
    table[125] = Object::Field4;
    table[126] = Object::Field5;
    table
};

impl Object {
    /// Decode a stored object byte; the high marker bit and unknown ids
    /// read as `None`.
    #[inline]
    pub fn from_u8(value: u8) -> Object {
        OBJECT_BY_ID[(value & 0x7f) as usize]
    }

    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Passability class used by road validation and serf traversal.
    pub const fn space(self) -> Space {
        match self {
            Object::Flag
            | Object::Tree0
            | Object::Tree1
            | Object::Tree2
            | Object::Tree3
            | Object::Tree4
            | Object::Tree5
            | Object::Tree6
            | Object::Tree7
            | Object::Pine0
            | Object::Pine1
            | Object::Pine2
            | Object::Pine3
            | Object::Pine4
            | Object::Pine5
            | Object::Pine6
            | Object::Pine7
            | Object::Palm0
            | Object::Palm1
            | Object::Palm2
            | Object::Palm3
            | Object::Cross
            | Object::Cactus0
            | Object::Cactus1
            | Object::DeadTree
            | Object::FelledPine0
            | Object::FelledPine1
            | Object::FelledPine2
            | Object::FelledPine3
            | Object::FelledTree0
            | Object::FelledTree1
            | Object::FelledTree2
            | Object::FelledTree3
            | Object::NewPine
            | Object::NewTree => Space::Filled,
            Object::SmallBuilding
            | Object::LargeBuilding
            | Object::Castle
            | Object::WaterTree0
            | Object::WaterTree1
            | Object::WaterTree2
            | Object::WaterTree3
            | Object::Stone0
            | Object::Stone1
            | Object::Stone2
            | Object::Stone3
            | Object::Stone4
            | Object::Stone5
            | Object::Stone6
            | Object::Stone7
            | Object::Sandstone0
            | Object::Sandstone1
            | Object::WaterStone0
            | Object::WaterStone1 => Space::Impassable,
            Object::Seeds0
            | Object::Seeds1
            | Object::Seeds2
            | Object::Seeds3
            | Object::Seeds4
            | Object::Seeds5
            | Object::Field0
            | Object::Field1
            | Object::Field2
            | Object::Field3
            | Object::Field4
            | Object::Field5 => Space::Semipassable,
            _ => Space::Open,
        }
    }
}

/// Player ID is a simple index (a tile owner field holds at most 4).
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub u8);
