/// Position of a region on the region grid.
///
/// Each region covers a 32x32 block of chunks, so region coordinates are
/// global chunk coordinates shifted down by five bits.
#[derive(Debug, Ord, PartialOrd, Eq, PartialEq, Copy, Clone, Hash)]
pub struct RegionPosition {
    pub x: i32,
    pub z: i32,
}

impl RegionPosition {
    pub fn new(x: i32, z: i32) -> RegionPosition {
        RegionPosition { x, z }
    }

    /// Region owning the given global chunk coordinates.
    pub fn from_chunk_position(chunk_x: i32, chunk_z: i32) -> RegionPosition {
        let x = chunk_x >> 5;
        let z = chunk_z >> 5;

        RegionPosition::new(x, z)
    }
}

/// Position of a chunk slot inside its region, both axes in `0..32`.
#[derive(Debug, Ord, PartialOrd, Eq, PartialEq, Copy, Clone, Hash)]
pub struct RegionChunkPosition {
    pub x: u8,
    pub z: u8,
}

impl RegionChunkPosition {
    pub fn new(x: u8, z: u8) -> RegionChunkPosition {
        debug_assert!(32 > x, "Region chunk x coordinate out of bounds");
        debug_assert!(32 > z, "Region chunk z coordinate out of bounds");

        RegionChunkPosition { x, z }
    }

    /// Slot for the given global chunk coordinates: both axes are taken
    /// modulo 32, so `(35, -1)` addresses slot `(3, 31)`.
    pub fn from_chunk_position(chunk_x: i32, chunk_z: i32) -> RegionChunkPosition {
        let x = (chunk_x & 31) as u8;
        let z = (chunk_z & 31) as u8;

        RegionChunkPosition::new(x, z)
    }

    /// Index into the header tables: z-major, x within z.
    pub(crate) fn metadata_index(&self) -> usize {
        self.x as usize + self.z as usize * 32
    }

    pub(crate) fn from_metadata_index(index: usize) -> RegionChunkPosition {
        debug_assert!(1024 > index, "Metadata index out of bounds");

        RegionChunkPosition::new((index % 32) as u8, (index / 32) as u8)
    }
}
