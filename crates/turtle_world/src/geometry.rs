use serde::{Deserialize, Serialize};

pub const CHUNK_SIZE_X: i32 = 16;
pub const CHUNK_SIZE_Z: i32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            z: self.z.saturating_add(dz),
        }
    }

    pub fn up(self) -> Self {
        self.offset(0, 1, 0)
    }

    pub fn down(self) -> Self {
        self.offset(0, -1, 0)
    }

    pub fn chunk(self) -> ChunkPos {
        ChunkPos::of(self)
    }
}

/// Horizontal facing of a turtle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Facing {
    #[default]
    North,
    East,
    South,
    West,
}

impl Facing {
    pub fn turn_left(self) -> Self {
        match self {
            Facing::North => Facing::West,
            Facing::West => Facing::South,
            Facing::South => Facing::East,
            Facing::East => Facing::North,
        }
    }

    pub fn turn_right(self) -> Self {
        match self {
            Facing::North => Facing::East,
            Facing::East => Facing::South,
            Facing::South => Facing::West,
            Facing::West => Facing::North,
        }
    }

    pub fn opposite(self) -> Self {
        self.turn_left().turn_left()
    }

    /// Unit step on the x/z plane. North is -z.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Facing::North => (0, -1),
            Facing::East => (1, 0),
            Facing::South => (0, 1),
            Facing::West => (-1, 0),
        }
    }

    pub fn step(self, pos: BlockPos) -> BlockPos {
        let (dx, dz) = self.delta();
        pos.offset(dx, 0, dz)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Facing::North => "north",
            Facing::East => "east",
            Facing::South => "south",
            Facing::West => "west",
        }
    }
}

/// Column of blocks that is loaded or unloaded as a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub fn of(pos: BlockPos) -> Self {
        Self {
            x: pos.x.div_euclid(CHUNK_SIZE_X),
            z: pos.z.div_euclid(CHUNK_SIZE_Z),
        }
    }

    pub fn min_block(self, y: i32) -> BlockPos {
        BlockPos::new(self.x * CHUNK_SIZE_X, y, self.z * CHUNK_SIZE_Z)
    }
}
