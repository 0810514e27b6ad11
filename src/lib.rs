//! NBT tag codec and region file format storage for chunks.
//!
//! Save data is stored as trees of named binary tags, either in standalone
//! gzip framed files (`level.dat` and friends) or packed per-chunk into
//! sector addressed region files (`r.<x>.<z>.mca`). This crate implements
//! the big-endian tag codec, the standalone file layer and the region
//! container: header parsing, per-chunk decompression and sector allocation
//! on write.
//!
//! ```
//! use nbt_region::tag::CompoundTag;
//! use nbt_region::{decode, encode};
//! use std::io::Cursor;
//!
//! let mut root = CompoundTag::new();
//! root.insert_str("name", "Steve");
//! root.insert_i32("score", 42);
//!
//! let mut buffer = Vec::new();
//! encode::write_compound_tag(&mut buffer, &root).unwrap();
//!
//! let decoded = decode::read_compound_tag(&mut Cursor::new(buffer)).unwrap();
//! assert_eq!(decoded, root);
//! ```
//!
//! Reading a chunk out of a region folder:
//!
//! ```no_run
//! use nbt_region::position::{RegionChunkPosition, RegionPosition};
//! use nbt_region::provider::{FolderRegionProvider, RegionProvider};
//!
//! let provider = FolderRegionProvider::new("world/region");
//!
//! let mut region = provider
//!     .get_region(RegionPosition::from_chunk_position(35, -1))
//!     .unwrap();
//!
//! // An empty slot is a valid absent result, not an error.
//! if let Some(chunk) = region.read_chunk_at(35, -1).unwrap() {
//!     println!("chunk has {} root entries", chunk.nbt().len());
//! }
//! ```
//!
//! Strings are decoded as UTF-8 although the format actually stores modified
//! UTF-8; see the [`decode`] module docs for the exact deviation.

pub mod chunk;
pub mod decode;
pub mod encode;
pub mod error;
pub mod file;
pub mod position;
pub mod provider;
pub mod region;
pub mod tag;

pub use crate::chunk::Chunk;
pub use crate::position::{RegionChunkPosition, RegionPosition};
pub use crate::region::{ChunkIter, Region};
pub use crate::tag::{CompoundTag, ListTag, Tag, TagKind};
