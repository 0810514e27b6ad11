use crate::position::RegionChunkPosition;
use crate::tag::CompoundTag;

/// One chunk's decoded data bound to its slot inside the owning region.
///
/// Immutable once constructed and owned exclusively by the caller; chunks
/// share no state with each other or with the region they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    position: RegionChunkPosition,
    nbt: CompoundTag,
}

impl Chunk {
    pub fn new(position: RegionChunkPosition, nbt: CompoundTag) -> Chunk {
        Chunk { position, nbt }
    }

    pub fn position(&self) -> RegionChunkPosition {
        self.position
    }

    pub fn nbt(&self) -> &CompoundTag {
        &self.nbt
    }

    pub fn into_nbt(self) -> CompoundTag {
        self.nbt
    }
}
