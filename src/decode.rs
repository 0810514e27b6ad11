//! Reading NBT trees from big-endian byte streams.
//!
//! Names and string payloads are decoded as UTF-8 with lossy fallback. The
//! source format actually stores modified UTF-8; plain ASCII and well-formed
//! UTF-8 decode identically, but byte sequences requiring true MUTF-8
//! semantics (embedded NUL, surrogate pairs) come out as replacement
//! characters. This is a deliberate, documented deviation.

use crate::tag::{CompoundTag, ListTag, Tag, TagKind};
use byteorder::{BigEndian, ReadBytesExt};
use flate2::read::{GzDecoder, ZlibDecoder};
use std::error::Error;
use std::fmt::{self, Display};
use std::io;
use std::io::Read;

/// Maximum nesting of list and compound payloads before decoding bails out.
///
/// Bounds recursion explicitly so corrupt or malicious input degrades to an
/// error instead of exhausting the call stack.
const DEPTH_LIMIT: usize = 512;

/// Possible errors while decoding binary data to an NBT tag.
#[derive(Debug)]
pub enum TagDecodeError {
    /// Stream ended in the middle of a value.
    UnexpectedEof,
    /// Tag kind id outside the 0-12 range.
    UnknownTagKind {
        /// Raw id byte read from the stream.
        id: u8,
    },
    /// End tag encountered outside a compound terminator position.
    UnexpectedEndTag,
    /// Array or list element count below zero.
    NegativeLength { length: i32 },
    /// Nesting exceeded the decoder's depth bound.
    DepthExceeded,
    /// Root tag payload was expected to be a compound.
    RootTagNotCompound { kind: TagKind },
    /// Transport failure other than end of stream.
    IoError { io_error: io::Error },
}

impl From<io::Error> for TagDecodeError {
    fn from(io_error: io::Error) -> Self {
        if io_error.kind() == io::ErrorKind::UnexpectedEof {
            TagDecodeError::UnexpectedEof
        } else {
            TagDecodeError::IoError { io_error }
        }
    }
}

impl Error for TagDecodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TagDecodeError::IoError { io_error } => Some(io_error),
            _ => None,
        }
    }
}

impl Display for TagDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TagDecodeError::*;
        match self {
            UnexpectedEof => write!(f, "Stream ended in the middle of a tag"),
            UnknownTagKind { id } => write!(f, "Unknown tag kind id: {}", id),
            UnexpectedEndTag => write!(f, "End tag outside a compound terminator position"),
            NegativeLength { length } => write!(f, "Negative element count: {}", length),
            DepthExceeded => write!(f, "Tag nesting deeper than {}", DEPTH_LIMIT),
            RootTagNotCompound { kind } => {
                write!(f, "Expected compound root tag but found {}", kind)
            }
            IoError { .. } => write!(f, "IO Error"),
        }
    }
}

/// Reads a named root tag: kind id, name, payload.
///
/// The root kind `End` is rejected; any other kind is accepted, matching the
/// root-level file convention where the root is usually, but not necessarily,
/// a compound.
pub fn read_named_tag<R: Read>(reader: &mut R) -> Result<(String, Tag), TagDecodeError> {
    let id = reader.read_u8()?;
    let kind = TagKind::from_id(id).ok_or(TagDecodeError::UnknownTagKind { id })?;

    if kind == TagKind::End {
        return Err(TagDecodeError::UnexpectedEndTag);
    }

    let name = read_string(reader)?;
    let tag = read_payload(reader, kind, 0)?;

    Ok((name, tag))
}

/// Reads a named root tag whose payload must be a compound.
pub fn read_compound_tag<R: Read>(reader: &mut R) -> Result<CompoundTag, TagDecodeError> {
    let (_, tag) = read_named_tag(reader)?;

    match tag {
        Tag::Compound(compound_tag) => Ok(compound_tag),
        other => Err(TagDecodeError::RootTagNotCompound { kind: other.kind() }),
    }
}

/// Reads a gzip compressed compound root tag.
pub fn read_gzip_compound_tag<R: Read>(reader: &mut R) -> Result<CompoundTag, TagDecodeError> {
    read_compound_tag(&mut GzDecoder::new(reader))
}

/// Reads a zlib compressed compound root tag.
pub fn read_zlib_compound_tag<R: Read>(reader: &mut R) -> Result<CompoundTag, TagDecodeError> {
    read_compound_tag(&mut ZlibDecoder::new(reader))
}

/// Length-prefixed string: 16-bit unsigned length, then UTF-8 bytes.
fn read_string<R: Read>(reader: &mut R) -> Result<String, TagDecodeError> {
    let length = reader.read_u16::<BigEndian>()?;

    let mut bytes = vec![0u8; length as usize];
    reader.read_exact(&mut bytes)?;

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Signed 32-bit element count, rejected when negative.
fn read_length<R: Read>(reader: &mut R) -> Result<usize, TagDecodeError> {
    let length = reader.read_i32::<BigEndian>()?;

    if length < 0 {
        return Err(TagDecodeError::NegativeLength { length });
    }

    Ok(length as usize)
}

fn read_payload<R: Read>(
    reader: &mut R,
    kind: TagKind,
    depth: usize,
) -> Result<Tag, TagDecodeError> {
    match kind {
        TagKind::End => Err(TagDecodeError::UnexpectedEndTag),
        TagKind::Byte => Ok(Tag::Byte(reader.read_i8()?)),
        TagKind::Short => Ok(Tag::Short(reader.read_i16::<BigEndian>()?)),
        TagKind::Int => Ok(Tag::Int(reader.read_i32::<BigEndian>()?)),
        TagKind::Long => Ok(Tag::Long(reader.read_i64::<BigEndian>()?)),
        TagKind::Float => Ok(Tag::Float(reader.read_f32::<BigEndian>()?)),
        TagKind::Double => Ok(Tag::Double(reader.read_f64::<BigEndian>()?)),
        TagKind::ByteArray => {
            let length = read_length(reader)?;

            let mut bytes = vec![0u8; length];
            reader.read_exact(&mut bytes)?;

            Ok(Tag::ByteArray(bytes.into_iter().map(|b| b as i8).collect()))
        }
        TagKind::String => Ok(Tag::String(read_string(reader)?)),
        TagKind::List => read_list(reader, depth),
        TagKind::Compound => read_compound(reader, depth),
        TagKind::IntArray => {
            let length = read_length(reader)?;

            let mut values = Vec::with_capacity(length);
            for _ in 0..length {
                values.push(reader.read_i32::<BigEndian>()?);
            }

            Ok(Tag::IntArray(values))
        }
        TagKind::LongArray => {
            let length = read_length(reader)?;

            let mut values = Vec::with_capacity(length);
            for _ in 0..length {
                values.push(reader.read_i64::<BigEndian>()?);
            }

            Ok(Tag::LongArray(values))
        }
    }
}

/// Element kind id, element count, then that many unnamed payloads.
fn read_list<R: Read>(reader: &mut R, depth: usize) -> Result<Tag, TagDecodeError> {
    if depth >= DEPTH_LIMIT {
        return Err(TagDecodeError::DepthExceeded);
    }

    let id = reader.read_u8()?;
    let element_kind = TagKind::from_id(id).ok_or(TagDecodeError::UnknownTagKind { id })?;
    let length = read_length(reader)?;

    // An End element kind only ever marks an empty list.
    if element_kind == TagKind::End && length > 0 {
        return Err(TagDecodeError::UnexpectedEndTag);
    }

    let mut items = Vec::with_capacity(length);
    for _ in 0..length {
        items.push(read_payload(reader, element_kind, depth + 1)?);
    }

    Ok(Tag::List(ListTag::from_parts(element_kind, items)))
}

/// Named tags until the End terminator, which is consumed and not stored.
fn read_compound<R: Read>(reader: &mut R, depth: usize) -> Result<Tag, TagDecodeError> {
    if depth >= DEPTH_LIMIT {
        return Err(TagDecodeError::DepthExceeded);
    }

    let mut compound_tag = CompoundTag::new();

    loop {
        let id = reader.read_u8()?;

        if id == TagKind::End.id() {
            break;
        }

        let kind = TagKind::from_id(id).ok_or(TagDecodeError::UnknownTagKind { id })?;
        let name = read_string(reader)?;
        let tag = read_payload(reader, kind, depth + 1)?;

        compound_tag.insert(name, tag);
    }

    Ok(Tag::Compound(compound_tag))
}
