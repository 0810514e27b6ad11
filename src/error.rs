use crate::decode::TagDecodeError;
use crate::position::RegionChunkPosition;
use std::{error::Error, fmt::Display, io};

/// Possible errors while opening a region source.
#[derive(Debug)]
pub enum RegionLoadError {
    /// Source is shorter than the two 4096 byte header tables.
    ///
    /// Region file are corrupted or truncated.
    CorruptRegionFile {
        /// Actual source length in bytes.
        length: u64,
    },
    /// I/O Error which happened while were reading region header.
    IOError { io_error: io::Error },
}

impl From<io::Error> for RegionLoadError {
    fn from(io_error: io::Error) -> Self {
        RegionLoadError::IOError { io_error }
    }
}

impl Error for RegionLoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RegionLoadError::IOError { io_error } => Some(io_error),
            _ => None,
        }
    }
}

impl Display for RegionLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use RegionLoadError::*;
        match self {
            CorruptRegionFile { length } => {
                write!(f, "Region source of {} bytes is shorter than the header", length)
            }
            IOError { .. } => write!(f, "IO Error"),
        }
    }
}

/// Possible errors while loading a chunk.
#[derive(Debug)]
pub enum ChunkReadError {
    /// Slot metadata and the payload length prefix disagree.
    ///
    /// This should not occur under normal conditions.
    ///
    /// Region file are corrupted.
    CorruptChunkEntry {
        position: RegionChunkPosition,
        /// Declared payload length, zero when the slot offset itself is bad.
        length: u32,
        /// Sector count the header allocated for the slot.
        sectors: u8,
    },
    /// Compression scheme other than gzip, zlib or uncompressed.
    ///
    /// This should not occur under normal conditions.
    ///
    /// Region file are corrupted or was introduced new compression type.
    UnsupportedCompressionScheme {
        /// Compression scheme type id.
        compression_scheme: u8,
    },
    /// I/O Error which happened while were reading chunk data from region file.
    IOError { io_error: io::Error },
    /// Error while decoding binary data to NBT tag.
    ///
    /// This should not occur under normal conditions.
    ///
    /// Region file are corrupted or a developer error in the NBT library.
    TagDecodeError { tag_decode_error: TagDecodeError },
}

impl From<io::Error> for ChunkReadError {
    fn from(io_error: io::Error) -> Self {
        ChunkReadError::IOError { io_error }
    }
}

impl From<TagDecodeError> for ChunkReadError {
    fn from(tag_decode_error: TagDecodeError) -> Self {
        ChunkReadError::TagDecodeError { tag_decode_error }
    }
}

impl Error for ChunkReadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        use ChunkReadError::*;
        match self {
            IOError { io_error } => Some(io_error),
            TagDecodeError { tag_decode_error } => Some(tag_decode_error),
            _ => None,
        }
    }
}

impl Display for ChunkReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ChunkReadError::*;
        match self {
            CorruptChunkEntry {
                position,
                length,
                sectors,
            } => write!(
                f,
                "Chunk {}, {} entry is corrupt: length {} in {} sectors",
                position.x, position.z, length, sectors
            ),
            UnsupportedCompressionScheme { compression_scheme } => {
                write!(f, "Unsupported compression scheme: {}", compression_scheme)
            }
            IOError { .. } => write!(f, "IO Error"),
            TagDecodeError { .. } => write!(f, "Failed to decode nbt"),
        }
    }
}

/// Possible errors while saving a chunk.
#[derive(Debug)]
pub enum ChunkWriteError {
    /// Chunk length exceeds the sector count a slot can address.
    ///
    /// This should not occur under normal conditions.
    LengthExceedsMaximum {
        /// Chunk length.
        length: u32,
    },
    /// I/O Error which happened while were writing chunk data to region.
    IOError { io_error: io::Error },
}

impl From<io::Error> for ChunkWriteError {
    fn from(io_error: io::Error) -> Self {
        ChunkWriteError::IOError { io_error }
    }
}

impl Error for ChunkWriteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ChunkWriteError::IOError { io_error } => Some(io_error),
            _ => None,
        }
    }
}

impl Display for ChunkWriteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ChunkWriteError::*;
        match self {
            LengthExceedsMaximum { length } => {
                write!(f, "Chunk length of {} exceeds maximum", length)
            }
            IOError { .. } => write!(f, "IO Error"),
        }
    }
}
