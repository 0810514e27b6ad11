use crate::chunk::Chunk;
use crate::decode::{read_compound_tag, read_gzip_compound_tag, read_zlib_compound_tag};
use crate::encode::write_zlib_compound_tag;
use crate::error::{ChunkReadError, ChunkWriteError, RegionLoadError};
use crate::position::{RegionChunkPosition, RegionPosition};
use crate::tag::CompoundTag;
use bitvec::prelude::*;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use log::debug;
use std::io;
use std::io::{Cursor, Error, Read, Seek, SeekFrom, Write};
use std::time::{SystemTime, UNIX_EPOCH};

/// Amount of chunk slots in a region.
const REGION_CHUNKS: usize = 1024;
/// Length of chunks metadata in region.
const REGION_CHUNKS_METADATA_LENGTH: usize = 2 * REGION_CHUNKS;
/// Region header length in bytes: offset table plus timestamp table.
pub(crate) const REGION_HEADER_BYTES_LENGTH: u64 = 8 * REGION_CHUNKS as u64;
/// Region sector length in bytes.
const REGION_SECTOR_BYTES_LENGTH: u32 = 4096;
/// Maximum chunk length in bytes: the sector count is a single header byte.
const CHUNK_MAXIMUM_BYTES_LENGTH: u32 = REGION_SECTOR_BYTES_LENGTH * 255;

/// Gzip compression scheme value.
const GZIP_COMPRESSION_TYPE: u8 = 1;
/// Zlib compression scheme value.
const ZLIB_COMPRESSION_TYPE: u8 = 2;
/// Uncompressed scheme value: payload bytes are raw NBT.
const UNCOMPRESSED_TYPE: u8 = 3;

/// Region represents a 32x32 group of chunks.
///
/// The header tables are parsed eagerly on load; chunk payloads are read and
/// decoded lazily, one at a time, when a chunk is requested or iterated.
pub struct Region<S> {
    /// Position on the region grid.
    position: RegionPosition,
    /// Source in which region are stored.
    source: S,
    /// Array of chunks metadata.
    chunks_metadata: [ChunkMetadata; REGION_CHUNKS],
    /// Used sectors for chunks data.
    used_sectors: BitVec,
}

impl<S> Region<S> {
    pub fn position(&self) -> RegionPosition {
        self.position
    }

    /// Last modification time in epoch seconds recorded for a slot.
    pub fn last_modified_timestamp(&self, position: RegionChunkPosition) -> u32 {
        self.get_metadata(position).last_modified_timestamp
    }

    /// Returns chunk metadata at specified position.
    fn get_metadata(&self, position: RegionChunkPosition) -> ChunkMetadata {
        self.chunks_metadata[position.metadata_index()]
    }
}

/// Calculates used sectors.
fn used_sectors(total_sectors: usize, chunks_metadata: &[ChunkMetadata]) -> BitVec {
    // First two sectors hold the header tables.
    let mut used_sectors = bitvec![0; total_sectors];

    used_sectors.set(0, true);
    used_sectors.set(1, true);

    for metadata in chunks_metadata {
        if metadata.is_empty() {
            continue;
        }

        let start_index = metadata.start_sector_index as usize;
        let end_index = (start_index + metadata.sectors as usize).min(total_sectors);

        for index in start_index..end_index {
            used_sectors.set(index, true);
        }
    }

    used_sectors
}

impl<S: Read + Seek> Region<S> {
    /// Parses the header tables of a region source.
    ///
    /// Chunk payloads are not validated here; a corrupt payload surfaces
    /// only when its slot is actually read.
    pub fn load(position: RegionPosition, mut source: S) -> Result<Self, RegionLoadError> {
        let source_len = source.len()?;

        if REGION_HEADER_BYTES_LENGTH > source_len {
            return Err(RegionLoadError::CorruptRegionFile { length: source_len });
        }

        let chunks_metadata = Self::read_header(&mut source)?;

        let total_sectors = (source_len as usize + (REGION_SECTOR_BYTES_LENGTH as usize - 1))
            / REGION_SECTOR_BYTES_LENGTH as usize;

        let used_sectors = used_sectors(total_sectors, &chunks_metadata);

        let region = Region {
            position,
            source,
            chunks_metadata,
            used_sectors,
        };

        Ok(region)
    }

    /// First 8KB of source are header of 1024 offsets and 1024 timestamps.
    fn read_header(source: &mut S) -> Result<[ChunkMetadata; REGION_CHUNKS], io::Error> {
        source.seek(SeekFrom::Start(0))?;

        let mut values = [0u32; REGION_CHUNKS_METADATA_LENGTH];

        for index in 0..REGION_CHUNKS_METADATA_LENGTH {
            values[index] = source.read_u32::<BigEndian>()?;
        }

        let mut chunks_metadata = [ChunkMetadata::default(); REGION_CHUNKS];

        for index in 0..REGION_CHUNKS {
            let offset = values[index];
            let last_modified_timestamp = values[REGION_CHUNKS + index];

            let start_sector_index = offset >> 8;
            let sectors = (offset & 0xFF) as u8;

            let metadata = ChunkMetadata::new(start_sector_index, sectors, last_modified_timestamp);
            chunks_metadata[index] = metadata;
        }

        Ok(chunks_metadata)
    }

    /// Reads and decodes the chunk stored in a slot.
    ///
    /// An empty slot yields `Ok(None)`: a missing chunk is a valid result,
    /// not a corruption.
    pub fn read_chunk(
        &mut self,
        position: RegionChunkPosition,
    ) -> Result<Option<Chunk>, ChunkReadError> {
        let metadata = self.get_metadata(position);

        if metadata.is_empty() {
            return Ok(None);
        }

        // A used slot must allocate sectors past the header tables.
        if metadata.start_sector_index < 2 || metadata.sectors == 0 {
            return Err(ChunkReadError::CorruptChunkEntry {
                position,
                length: 0,
                sectors: metadata.sectors,
            });
        }

        let maximum_length =
            (metadata.sectors as u32 * REGION_SECTOR_BYTES_LENGTH).min(CHUNK_MAXIMUM_BYTES_LENGTH);

        let seek_offset = metadata.start_sector_index as u64 * REGION_SECTOR_BYTES_LENGTH as u64;

        self.source.seek(SeekFrom::Start(seek_offset))?;
        let length = self.source.read_u32::<BigEndian>()?;

        // Length prefix counts the scheme byte; it and its 4 byte prefix
        // must fit in the sectors the header allocated.
        if length == 0 || length > maximum_length - 4 {
            return Err(ChunkReadError::CorruptChunkEntry {
                position,
                length,
                sectors: metadata.sectors,
            });
        }

        let compression_scheme = self.source.read_u8()?;
        let mut compressed_buffer = vec![0u8; (length - 1) as usize];
        self.source.read_exact(&mut compressed_buffer)?;

        let mut cursor = Cursor::new(&compressed_buffer);

        let nbt = match compression_scheme {
            GZIP_COMPRESSION_TYPE => read_gzip_compound_tag(&mut cursor)?,
            ZLIB_COMPRESSION_TYPE => read_zlib_compound_tag(&mut cursor)?,
            UNCOMPRESSED_TYPE => read_compound_tag(&mut cursor)?,
            _ => return Err(ChunkReadError::UnsupportedCompressionScheme { compression_scheme }),
        };

        Ok(Some(Chunk::new(position, nbt)))
    }

    /// Reads the chunk owning the given global chunk coordinates: both axes
    /// are mapped into the region modulo 32.
    pub fn read_chunk_at(
        &mut self,
        chunk_x: i32,
        chunk_z: i32,
    ) -> Result<Option<Chunk>, ChunkReadError> {
        self.read_chunk(RegionChunkPosition::from_chunk_position(chunk_x, chunk_z))
    }

    /// Iterates all chunks present in this region in slot index order
    /// (z-major, x within z), decoding one chunk per step.
    ///
    /// Empty slots are skipped; a corrupt chunk yields its error and
    /// iteration continues with the next slot. The cursor holds no decoded
    /// state, so restarting is just calling `iter_nonempty` again.
    pub fn iter_nonempty(&mut self) -> ChunkIter<'_, S> {
        ChunkIter {
            region: self,
            next_index: 0,
        }
    }
}

/// Cursor over the slot index space of a region.
pub struct ChunkIter<'a, S> {
    region: &'a mut Region<S>,
    next_index: usize,
}

impl<'a, S: Read + Seek> Iterator for ChunkIter<'a, S> {
    type Item = Result<Chunk, ChunkReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next_index < REGION_CHUNKS {
            let index = self.next_index;
            self.next_index += 1;

            if self.region.chunks_metadata[index].is_empty() {
                continue;
            }

            let position = RegionChunkPosition::from_metadata_index(index);

            match self.region.read_chunk(position) {
                Ok(Some(chunk)) => return Some(Ok(chunk)),
                Ok(None) => continue,
                Err(error) => return Some(Err(error)),
            }
        }

        None
    }
}

impl<S: Write + Seek> Region<S> {
    /// Compresses and stores a chunk, updating the offset and timestamp
    /// tables. Payloads are written zlib compressed, the scheme save files
    /// use in practice.
    pub fn write_chunk(
        &mut self,
        position: RegionChunkPosition,
        chunk_compound_tag: &CompoundTag,
    ) -> Result<(), ChunkWriteError> {
        let mut buffer = Vec::new();

        buffer.write_u8(ZLIB_COMPRESSION_TYPE)?;
        write_zlib_compound_tag(&mut buffer, chunk_compound_tag)?;

        // 4 bytes for data length.
        let length = (buffer.len() + 4) as u32;

        let sectors_required =
            (length + REGION_SECTOR_BYTES_LENGTH - 1) / REGION_SECTOR_BYTES_LENGTH;

        if sectors_required > 255 {
            return Err(ChunkWriteError::LengthExceedsMaximum { length });
        }

        let mut metadata = self.find_place(position, sectors_required as u8)?;
        let seek_offset = metadata.start_sector_index as u64 * REGION_SECTOR_BYTES_LENGTH as u64;

        self.source.seek(SeekFrom::Start(seek_offset))?;
        self.source.write_u32::<BigEndian>(buffer.len() as u32)?;
        self.source.write_all(&buffer)?;

        // Padding to align sector.
        let padding_len = sectors_required as u64 * REGION_SECTOR_BYTES_LENGTH as u64 - length as u64;

        if padding_len > 0 {
            self.source.write_all(&vec![0; padding_len as usize])?;
        }

        metadata.update_last_modified_timestamp();
        self.update_metadata(position, metadata)?;

        Ok(())
    }

    /// Finds a place where chunk data of a given sector count can be put.
    ///
    /// If cannot find a place to put chunk data will extend source.
    fn find_place(
        &mut self,
        position: RegionChunkPosition,
        sectors_required: u8,
    ) -> Result<ChunkMetadata, io::Error> {
        let metadata = self.get_metadata(position);

        // Chunk still fits in the old place.
        if metadata.sectors == sectors_required {
            debug!(
                target: "nbt-region",
                "Region x: {}, z: {} chunk x: {}, z: {} with {} required sectors still fits in the old place",
                self.position.x, self.position.z, position.x, position.z, sectors_required
            );

            return Ok(metadata);
        }

        // Release previously used sectors.
        for i in 0..metadata.sectors {
            let sector_index = metadata.start_sector_index as usize + i as usize;
            self.used_sectors.set(sector_index, false);
        }

        let source_len = self.source.len()?;
        let total_sectors = source_len / REGION_SECTOR_BYTES_LENGTH as u64;

        // Trying to find enough big gap between sectors to put chunk.
        let mut sectors_free = 0;

        for sector_index in 0..total_sectors {
            // Sector occupied and we can't place chunk.
            if self.used_sectors[sector_index as usize] {
                sectors_free = 0;
                continue;
            }

            debug!(target: "nbt-region", "Sector {} is free", sector_index);
            sectors_free += 1;

            // Can put chunk in gap.
            if sectors_free == sectors_required {
                let put_sector_index = sector_index as u32 - sectors_free as u32 + 1;

                // Marking new sectors as used.
                for i in 0..sectors_free {
                    let sector_index = put_sector_index as usize + i as usize;
                    self.used_sectors.set(sector_index, true);
                }

                debug!(
                    target: "nbt-region",
                    "Region x: {}, z: {} chunk x: {}, z: {} with {} required sectors \
                    can be placed in free sectors gap between from {} to {}",
                    self.position.x,
                    self.position.z,
                    position.x,
                    position.z,
                    sectors_required,
                    put_sector_index,
                    sector_index
                );

                return Ok(ChunkMetadata::new(put_sector_index, sectors_required, 0));
            }
        }

        // Extending source because cannot find a place to put chunk data.
        let extend_sectors = sectors_required - sectors_free;
        let extend_len = REGION_SECTOR_BYTES_LENGTH as u64 * extend_sectors as u64;

        debug!(
            target: "nbt-region",
            "Extending region x: {}, z: {} source for {} bytes to place chunk data",
            self.position.x,
            self.position.z,
            extend_len
        );

        self.source.extend_len(source_len + extend_len)?;

        // Mark new sectors as used.
        for _ in 0..extend_sectors {
            self.used_sectors.push(true);
        }

        Ok(ChunkMetadata::new(
            total_sectors as u32 - sectors_free as u32,
            sectors_required,
            0,
        ))
    }

    /// Updates chunk metadata.
    fn update_metadata(
        &mut self,
        position: RegionChunkPosition,
        metadata: ChunkMetadata,
    ) -> Result<(), io::Error> {
        let metadata_index = position.metadata_index();
        self.chunks_metadata[metadata_index] = metadata;

        let start_seek_offset = SeekFrom::Start((metadata_index * 4) as u64);
        let offset = (metadata.start_sector_index << 8) | metadata.sectors as u32;

        self.source.seek(start_seek_offset)?;
        self.source.write_u32::<BigEndian>(offset)?;

        let next_seek_offset = SeekFrom::Current(REGION_SECTOR_BYTES_LENGTH as i64 - 4);
        let last_modified_timestamp = metadata.last_modified_timestamp;

        self.source.seek(next_seek_offset)?;
        self.source
            .write_u32::<BigEndian>(last_modified_timestamp)?;

        Ok(())
    }
}

/// Chunk metadata are stored in header.
#[derive(Copy, Clone, Default, Debug, Eq, PartialEq)]
struct ChunkMetadata {
    /// Sector index from which starts chunk data.
    start_sector_index: u32,
    /// Amount of sectors used to store chunk.
    sectors: u8,
    /// Last time in seconds when chunk was modified.
    last_modified_timestamp: u32,
}

impl ChunkMetadata {
    fn new(start_sector_index: u32, sectors: u8, last_modified_timestamp: u32) -> Self {
        ChunkMetadata {
            start_sector_index,
            sectors,
            last_modified_timestamp,
        }
    }

    fn update_last_modified_timestamp(&mut self) {
        let system_time = SystemTime::now();
        let time = system_time.duration_since(UNIX_EPOCH).unwrap();

        self.last_modified_timestamp = time.as_secs() as u32
    }

    fn is_empty(&self) -> bool {
        self.start_sector_index == 0 && self.sectors == 0
    }
}

/// Trait adds additional helper methods for `Seek`.
trait SeekExt {
    fn len(&mut self) -> Result<u64, io::Error>;
}

impl<S: Seek> SeekExt for S {
    fn len(&mut self) -> Result<u64, Error> {
        let old_pos = self.seek(SeekFrom::Current(0))?;
        self.seek(SeekFrom::Start(0))?;
        let len = self.seek(SeekFrom::End(0))?;

        if old_pos != len {
            self.seek(SeekFrom::Start(old_pos))?;
        }

        Ok(len)
    }
}

/// Trait adds additional helper methods for `Seek+Write`.
trait SeekWriteExt {
    fn extend_len(&mut self, new_len: u64) -> Result<(), io::Error>;
}

impl<S: Seek + Write> SeekWriteExt for S {
    fn extend_len(&mut self, new_len: u64) -> Result<(), Error> {
        let old_pos = self.seek(SeekFrom::Current(0))?;
        self.seek(SeekFrom::Start(0))?;
        let len = self.seek(SeekFrom::End(0))?;

        if new_len > len {
            let padding_len = new_len - len;
            self.write_all(&vec![0; padding_len as usize])?;
        }

        if old_pos != len {
            self.seek(SeekFrom::Start(old_pos))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::write_compound_tag;

    fn empty_region_bytes() -> Vec<u8> {
        vec![0; REGION_HEADER_BYTES_LENGTH as usize]
    }

    fn test_position() -> RegionPosition {
        RegionPosition::new(1, 1)
    }

    /// Header bytes with one slot entry and its timestamp filled in.
    fn region_bytes_with_slot(
        index: usize,
        start_sector_index: u32,
        sectors: u8,
        timestamp: u32,
    ) -> Vec<u8> {
        let mut bytes = empty_region_bytes();

        let offset = (start_sector_index << 8) | sectors as u32;
        bytes[index * 4..index * 4 + 4].copy_from_slice(&offset.to_be_bytes());

        let timestamp_offset = 4096 + index * 4;
        bytes[timestamp_offset..timestamp_offset + 4].copy_from_slice(&timestamp.to_be_bytes());

        bytes
    }

    #[test]
    fn test_load_too_short_source() {
        let cursor = Cursor::new(vec![0; 100]);
        let load_error = Region::load(test_position(), cursor).err().unwrap();

        match load_error {
            RegionLoadError::CorruptRegionFile { length } => assert_eq!(length, 100),
            _ => panic!("Expected `CorruptRegionFile` but got `{:?}`", load_error),
        }
    }

    #[test]
    fn test_load_empty_source() {
        let cursor = Cursor::new(Vec::new());
        let load_error = Region::load(test_position(), cursor).err().unwrap();

        match load_error {
            RegionLoadError::CorruptRegionFile { length } => assert_eq!(length, 0),
            _ => panic!("Expected `CorruptRegionFile` but got `{:?}`", load_error),
        }
    }

    #[test]
    fn test_header_read() {
        let mut bytes = region_bytes_with_slot(256, 61, 2, 1570215508);
        // Slot payloads are irrelevant for header parsing.
        bytes.extend_from_slice(&vec![0; 4096 * 61]);

        let region = Region::load(test_position(), Cursor::new(bytes)).unwrap();
        let metadata = region.chunks_metadata[256];

        assert_eq!(metadata, ChunkMetadata::new(61, 2, 1570215508));
        assert_eq!(
            region.last_modified_timestamp(RegionChunkPosition::new(0, 8)),
            1570215508
        );
    }

    #[test]
    fn test_read_chunk_empty_slot_is_absent() {
        let cursor = Cursor::new(empty_region_bytes());
        let mut region = Region::load(test_position(), cursor).unwrap();

        let chunk = region.read_chunk(RegionChunkPosition::new(14, 12)).unwrap();

        assert!(chunk.is_none());
    }

    #[test]
    fn test_write_chunk_then_read_round_trip() {
        let cursor = Cursor::new(empty_region_bytes());
        let mut region = Region::load(test_position(), cursor).unwrap();

        let mut write_compound_tag = CompoundTag::new();
        write_compound_tag.insert_bool("test_bool", true);
        write_compound_tag.insert_str("test_str", "test");

        let position = RegionChunkPosition::new(15, 15);
        region.write_chunk(position, &write_compound_tag).unwrap();

        assert_eq!(
            region.source.len().unwrap(),
            REGION_HEADER_BYTES_LENGTH + REGION_SECTOR_BYTES_LENGTH as u64
        );

        assert_eq!(region.used_sectors.len(), 3);

        let chunk = region.read_chunk(position).unwrap().unwrap();

        assert_eq!(chunk.position(), position);
        assert!(chunk.nbt().get_bool("test_bool").unwrap());
        assert_eq!(chunk.nbt().get_str("test_str").unwrap(), "test");

        // Write stamped the slot's modification time.
        assert!(region.last_modified_timestamp(position) > 0);
    }

    #[test]
    fn test_read_chunk_at_global_coordinates() {
        let cursor = Cursor::new(empty_region_bytes());
        let mut region = Region::load(test_position(), cursor).unwrap();

        let mut write_compound_tag = CompoundTag::new();
        write_compound_tag.insert_i32("value", 7);

        // Global (35, -1) maps to local slot (3, 31).
        region
            .write_chunk(RegionChunkPosition::new(3, 31), &write_compound_tag)
            .unwrap();

        let chunk = region.read_chunk_at(35, -1).unwrap().unwrap();

        assert_eq!(chunk.position(), RegionChunkPosition::new(3, 31));
        assert_eq!(chunk.nbt().get_i32("value"), Some(7));
    }

    #[test]
    fn test_write_chunk_same_sector() {
        let cursor = Cursor::new(empty_region_bytes());
        let mut region = Region::load(test_position(), cursor).unwrap();

        let mut write_compound_tag_1 = CompoundTag::new();
        write_compound_tag_1.insert_bool("test_bool", true);
        write_compound_tag_1.insert_str("test_str", "test");
        write_compound_tag_1.insert_f32("test_f32", 1.23);

        let position = RegionChunkPosition::new(15, 15);
        region.write_chunk(position, &write_compound_tag_1).unwrap();

        let mut write_compound_tag_2 = CompoundTag::new();
        write_compound_tag_2.insert_bool("test_bool", true);
        write_compound_tag_2.insert_str("test_str", "test");

        region.write_chunk(position, &write_compound_tag_2).unwrap();

        assert_eq!(
            region.source.len().unwrap(),
            REGION_HEADER_BYTES_LENGTH + REGION_SECTOR_BYTES_LENGTH as u64
        );

        assert_eq!(region.used_sectors.len(), 3);

        let chunk = region.read_chunk(position).unwrap().unwrap();

        assert!(chunk.nbt().get_bool("test_bool").unwrap());
        assert_eq!(chunk.nbt().get_str("test_str").unwrap(), "test");
        assert!(!chunk.nbt().contains_key("test_f32"));
    }

    #[test]
    fn test_write_chunk_same_sector_with_source_expand() {
        let cursor = Cursor::new(empty_region_bytes());
        let mut region = Region::load(test_position(), cursor).unwrap();

        let mut write_compound_tag_1 = CompoundTag::new();
        write_compound_tag_1.insert_bool("test_bool", true);
        write_compound_tag_1.insert_str("test_str", "test");

        let position = RegionChunkPosition::new(15, 15);
        region.write_chunk(position, &write_compound_tag_1).unwrap();

        // Extending chunk to second sector.
        // Due compression we need to write more than 1024 ints.
        let mut write_compound_tag_2 = CompoundTag::new();
        write_compound_tag_2.insert_i32_vec("test_i32_vec", (0..3000).collect());

        region.write_chunk(position, &write_compound_tag_2).unwrap();

        assert_eq!(
            region.source.len().unwrap(),
            REGION_HEADER_BYTES_LENGTH + REGION_SECTOR_BYTES_LENGTH as u64 * 2
        );

        assert_eq!(region.used_sectors.len(), 4);
    }

    #[test]
    fn test_write_chunk_with_insert_in_middle_gap() {
        let cursor = Cursor::new(empty_region_bytes());
        let mut region = Region::load(test_position(), cursor).unwrap();

        let mut write_compound_tag = CompoundTag::new();
        write_compound_tag.insert_bool("test_bool", true);
        write_compound_tag.insert_str("test_str", "test");

        // First two sectors are occupied by header.
        for _ in 0..3 {
            region.used_sectors.push(true);
        }

        region.used_sectors.set(2, false);

        let length = REGION_HEADER_BYTES_LENGTH + REGION_SECTOR_BYTES_LENGTH as u64 * 3;
        region.source.extend_len(length).unwrap();

        region
            .write_chunk(RegionChunkPosition::new(15, 15), &write_compound_tag)
            .unwrap();

        for i in 0..5 {
            assert!(region.used_sectors[i]);
        }

        assert_eq!(region.source.len().unwrap(), length);
        assert_eq!(region.used_sectors.len(), 5);
    }

    #[test]
    fn test_write_chunk_not_enough_gap() {
        let cursor = Cursor::new(empty_region_bytes());
        let mut region = Region::load(test_position(), cursor).unwrap();

        let mut write_compound_tag_1 = CompoundTag::new();
        write_compound_tag_1.insert_bool("test_bool", true);
        write_compound_tag_1.insert_str("test_str", "test");

        region
            .write_chunk(RegionChunkPosition::new(15, 15), &write_compound_tag_1)
            .unwrap();

        region
            .write_chunk(RegionChunkPosition::new(0, 0), &write_compound_tag_1)
            .unwrap();

        // Extending chunk to second sector.
        // Due compression we need to write more than 1024 ints.
        let mut write_compound_tag_2 = CompoundTag::new();
        write_compound_tag_2.insert_i32_vec("test_i32_vec", (0..3000).collect());

        region
            .write_chunk(RegionChunkPosition::new(15, 15), &write_compound_tag_2)
            .unwrap();

        // Sector 2 was freed, sectors 3 to 5 are the remaining chunk and the
        // two sector rewrite appended at the end.
        assert!(region.used_sectors[0]);
        assert!(region.used_sectors[1]);
        assert!(!region.used_sectors[2]);
        assert!(region.used_sectors[3]);
        assert!(region.used_sectors[4]);
        assert!(region.used_sectors[5]);

        assert_eq!(region.used_sectors.len(), 6);
        assert_eq!(
            region.source.len().unwrap(),
            REGION_HEADER_BYTES_LENGTH + REGION_SECTOR_BYTES_LENGTH as u64 * 4
        );
    }

    #[test]
    fn test_update_metadata() {
        let cursor = Cursor::new(empty_region_bytes());
        let mut region = Region::load(test_position(), cursor).unwrap();

        let mut metadata = ChunkMetadata::new(500, 10, 0);
        metadata.update_last_modified_timestamp();

        let position = RegionChunkPosition::new(15, 15);
        region.update_metadata(position, metadata).unwrap();

        let chunks_metadata = Region::read_header(&mut region.source).unwrap();
        let metadata_index = position.metadata_index();

        // In memory metadata.
        assert_eq!(region.get_metadata(position), metadata);
        // Written to file metadata.
        assert_eq!(chunks_metadata[metadata_index], metadata);
    }

    #[test]
    fn test_read_chunk_uncompressed_scheme() {
        let mut compound_tag = CompoundTag::new();
        compound_tag.insert_i32("xPos", 3);
        compound_tag.insert_i32("zPos", 0);

        let mut nbt_bytes = Vec::new();
        write_compound_tag(&mut nbt_bytes, &compound_tag).unwrap();

        // Slot (3, 0) at sector 2; length prefix counts the scheme byte.
        let mut bytes = region_bytes_with_slot(3, 2, 1, 0);
        bytes.extend_from_slice(&((nbt_bytes.len() + 1) as u32).to_be_bytes());
        bytes.push(UNCOMPRESSED_TYPE);
        bytes.extend_from_slice(&nbt_bytes);
        bytes.resize(8192 + 4096, 0);

        let mut region = Region::load(test_position(), Cursor::new(bytes)).unwrap();
        let chunk = region
            .read_chunk(RegionChunkPosition::new(3, 0))
            .unwrap()
            .unwrap();

        assert_eq!(chunk.nbt().get_i32("xPos"), Some(3));
        assert_eq!(chunk.nbt().get_i32("zPos"), Some(0));
    }

    #[test]
    fn test_read_chunk_unsupported_scheme() {
        let mut bytes = region_bytes_with_slot(0, 2, 1, 0);
        bytes.extend_from_slice(&2u32.to_be_bytes());
        bytes.push(7);
        bytes.push(0);
        bytes.resize(8192 + 4096, 0);

        let mut region = Region::load(test_position(), Cursor::new(bytes)).unwrap();
        let read_error = region
            .read_chunk(RegionChunkPosition::new(0, 0))
            .err()
            .unwrap();

        match read_error {
            ChunkReadError::UnsupportedCompressionScheme { compression_scheme } => {
                assert_eq!(compression_scheme, 7)
            }
            _ => panic!("Expected `UnsupportedCompressionScheme` but got `{:?}`", read_error),
        }
    }

    #[test]
    fn test_read_chunk_length_exceeds_sectors() {
        // One allocated sector cannot hold a 5000 byte payload.
        let mut bytes = region_bytes_with_slot(0, 2, 1, 0);
        bytes.extend_from_slice(&5000u32.to_be_bytes());
        bytes.resize(8192 + 4096, 0);

        let mut region = Region::load(test_position(), Cursor::new(bytes)).unwrap();
        let read_error = region
            .read_chunk(RegionChunkPosition::new(0, 0))
            .err()
            .unwrap();

        match read_error {
            ChunkReadError::CorruptChunkEntry {
                length, sectors, ..
            } => {
                assert_eq!(length, 5000);
                assert_eq!(sectors, 1);
            }
            _ => panic!("Expected `CorruptChunkEntry` but got `{:?}`", read_error),
        }
    }

    #[test]
    fn test_read_chunk_zero_length_prefix() {
        let mut bytes = region_bytes_with_slot(0, 2, 1, 0);
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.resize(8192 + 4096, 0);

        let mut region = Region::load(test_position(), Cursor::new(bytes)).unwrap();
        let read_error = region
            .read_chunk(RegionChunkPosition::new(0, 0))
            .err()
            .unwrap();

        match read_error {
            ChunkReadError::CorruptChunkEntry { length, .. } => assert_eq!(length, 0),
            _ => panic!("Expected `CorruptChunkEntry` but got `{:?}`", read_error),
        }
    }

    #[test]
    fn test_read_chunk_offset_inside_header() {
        let bytes = region_bytes_with_slot(0, 1, 1, 0);

        let mut region = Region::load(test_position(), Cursor::new(bytes)).unwrap();
        let read_error = region
            .read_chunk(RegionChunkPosition::new(0, 0))
            .err()
            .unwrap();

        match read_error {
            ChunkReadError::CorruptChunkEntry { .. } => {}
            _ => panic!("Expected `CorruptChunkEntry` but got `{:?}`", read_error),
        }
    }

    #[test]
    fn test_iter_nonempty_slot_order_and_restart() {
        let cursor = Cursor::new(empty_region_bytes());
        let mut region = Region::load(test_position(), cursor).unwrap();

        let mut compound_tag = CompoundTag::new();
        compound_tag.insert_i32("value", 1);

        // Written out of slot order on purpose.
        for (x, z) in &[(0u8, 1u8), (5, 0), (2, 0)] {
            region
                .write_chunk(RegionChunkPosition::new(*x, *z), &compound_tag)
                .unwrap();
        }

        let positions: Vec<RegionChunkPosition> = region
            .iter_nonempty()
            .map(|chunk| chunk.unwrap().position())
            .collect();

        // Slot index order is z-major: (2, 0) = 2, (5, 0) = 5, (0, 1) = 32.
        assert_eq!(
            positions,
            vec![
                RegionChunkPosition::new(2, 0),
                RegionChunkPosition::new(5, 0),
                RegionChunkPosition::new(0, 1),
            ]
        );

        // Re-creating the cursor restarts iteration from the beginning.
        let restarted: Vec<RegionChunkPosition> = region
            .iter_nonempty()
            .map(|chunk| chunk.unwrap().position())
            .collect();

        assert_eq!(positions, restarted);
    }

    #[test]
    fn test_iter_nonempty_corrupt_chunk_does_not_stop_iteration() {
        let cursor = Cursor::new(empty_region_bytes());
        let mut region = Region::load(test_position(), cursor).unwrap();

        let mut compound_tag = CompoundTag::new();
        compound_tag.insert_i32("value", 1);

        region
            .write_chunk(RegionChunkPosition::new(0, 0), &compound_tag)
            .unwrap();
        region
            .write_chunk(RegionChunkPosition::new(2, 0), &compound_tag)
            .unwrap();

        // Point slot (1, 0) into the header so reading it fails.
        region
            .update_metadata(RegionChunkPosition::new(1, 0), ChunkMetadata::new(1, 1, 0))
            .unwrap();

        let results: Vec<Result<Chunk, ChunkReadError>> = region.iter_nonempty().collect();

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());
    }

    #[test]
    fn test_used_sectors_only_header() {
        let empty_chunks_metadata = Vec::new();
        let used_sectors = used_sectors(8, &empty_chunks_metadata);

        assert!(used_sectors[0]);
        assert!(used_sectors[1]);

        for index in 2..8 {
            assert!(!used_sectors[index]);
        }
    }

    #[test]
    fn test_used_sectors_all() {
        let chunks_metadata = vec![ChunkMetadata::new(2, 6, 0)];
        let used_sectors = used_sectors(8, &chunks_metadata);

        for index in 0..8 {
            assert!(used_sectors[index]);
        }
    }

    #[test]
    fn test_used_sectors_partially() {
        let chunks_metadata = vec![ChunkMetadata::new(3, 3, 0), ChunkMetadata::new(8, 1, 0)];
        let used_sectors = used_sectors(10, &chunks_metadata);

        let expected = [
            true, true, false, true, true, true, false, false, true, false,
        ];

        for (index, value) in expected.iter().enumerate() {
            assert_eq!(used_sectors[index], *value, "sector {}", index);
        }
    }

    #[test]
    fn test_len() {
        let mut cursor = Cursor::new(vec![1, 2, 3, 4, 5]);
        let len = cursor.len().unwrap();

        assert_eq!(len, 5);
    }

    #[test]
    fn test_extend_len() {
        let mut cursor = Cursor::new(vec![1, 2, 3, 4, 5]);
        cursor.extend_len(10).unwrap();
        let len = cursor.len().unwrap();

        assert_eq!(len, 10);
    }
}
