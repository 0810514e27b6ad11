//! Writing NBT trees as big-endian byte streams.
//!
//! Mirrors the decoder byte for byte: any tree that decodes re-encodes to the
//! same bytes, and any valid tree survives `decode(encode(t)) == t`. The
//! encoder assumes a validated tree (list homogeneity is enforced at
//! construction) and only fails on sink I/O errors.

use crate::tag::{CompoundTag, Tag, TagKind};
use byteorder::{BigEndian, WriteBytesExt};
use flate2::write::{GzEncoder, ZlibEncoder};
use flate2::Compression;
use std::io;
use std::io::Write;

/// Writes a named tag: kind id, name, payload.
pub fn write_named_tag<W: Write>(writer: &mut W, name: &str, tag: &Tag) -> io::Result<()> {
    writer.write_u8(tag.kind().id())?;
    write_string(writer, name)?;
    write_payload(writer, tag)
}

/// Writes a compound root tag with an empty name.
pub fn write_compound_tag<W: Write>(
    writer: &mut W,
    compound_tag: &CompoundTag,
) -> io::Result<()> {
    writer.write_u8(TagKind::Compound.id())?;
    write_string(writer, "")?;
    write_compound_payload(writer, compound_tag)
}

/// Writes a gzip compressed compound root tag.
pub fn write_gzip_compound_tag<W: Write>(
    writer: &mut W,
    compound_tag: &CompoundTag,
) -> io::Result<()> {
    let mut encoder = GzEncoder::new(writer, Compression::default());
    write_compound_tag(&mut encoder, compound_tag)?;
    encoder.finish()?;

    Ok(())
}

/// Writes a zlib compressed compound root tag.
pub fn write_zlib_compound_tag<W: Write>(
    writer: &mut W,
    compound_tag: &CompoundTag,
) -> io::Result<()> {
    let mut encoder = ZlibEncoder::new(writer, Compression::default());
    write_compound_tag(&mut encoder, compound_tag)?;
    encoder.finish()?;

    Ok(())
}

fn write_string<W: Write>(writer: &mut W, value: &str) -> io::Result<()> {
    writer.write_u16::<BigEndian>(value.len() as u16)?;
    writer.write_all(value.as_bytes())
}

fn write_payload<W: Write>(writer: &mut W, tag: &Tag) -> io::Result<()> {
    match tag {
        Tag::Byte(value) => writer.write_i8(*value),
        Tag::Short(value) => writer.write_i16::<BigEndian>(*value),
        Tag::Int(value) => writer.write_i32::<BigEndian>(*value),
        Tag::Long(value) => writer.write_i64::<BigEndian>(*value),
        Tag::Float(value) => writer.write_f32::<BigEndian>(*value),
        Tag::Double(value) => writer.write_f64::<BigEndian>(*value),
        Tag::ByteArray(value) => {
            writer.write_i32::<BigEndian>(value.len() as i32)?;

            for byte in value {
                writer.write_i8(*byte)?;
            }

            Ok(())
        }
        Tag::String(value) => write_string(writer, value),
        Tag::List(value) => {
            // The declared element kind is written even for empty lists so a
            // round trip preserves it.
            writer.write_u8(value.element_kind().id())?;
            writer.write_i32::<BigEndian>(value.len() as i32)?;

            for item in value.iter() {
                write_payload(writer, item)?;
            }

            Ok(())
        }
        Tag::Compound(value) => write_compound_payload(writer, value),
        Tag::IntArray(value) => {
            writer.write_i32::<BigEndian>(value.len() as i32)?;

            for int in value {
                writer.write_i32::<BigEndian>(*int)?;
            }

            Ok(())
        }
        Tag::LongArray(value) => {
            writer.write_i32::<BigEndian>(value.len() as i32)?;

            for long in value {
                writer.write_i64::<BigEndian>(*long)?;
            }

            Ok(())
        }
    }
}

/// Entries in insertion order, then the End terminator byte.
fn write_compound_payload<W: Write>(
    writer: &mut W,
    compound_tag: &CompoundTag,
) -> io::Result<()> {
    for (name, tag) in compound_tag.iter() {
        write_named_tag(writer, name, tag)?;
    }

    writer.write_u8(TagKind::End.id())
}
