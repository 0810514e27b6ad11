//! Root-level NBT files.
//!
//! Standalone save files hold a single named root tag, usually gzip framed.
//! Reading sniffs the two-byte gzip magic and transparently inflates; files
//! without the magic are parsed as raw NBT. Writing always applies gzip
//! framing: an uncompressed root-level file is a supported read path but not
//! a write path.

use crate::decode::{read_named_tag, TagDecodeError};
use crate::encode::write_named_tag;
use crate::tag::Tag;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// First two bytes of every gzip stream.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Reads a named root tag, inflating gzip framing when present.
pub fn read_root_tag<R: Read>(reader: &mut R) -> Result<(String, Tag), TagDecodeError> {
    let mut magic = [0u8; 2];
    reader.read_exact(&mut magic)?;

    // The sniffed bytes are stitched back in front of the remaining stream.
    let mut source = io::Cursor::new(magic).chain(reader);

    if magic == GZIP_MAGIC {
        read_named_tag(&mut GzDecoder::new(source))
    } else {
        read_named_tag(&mut source)
    }
}

pub fn read_root_tag_from_path<P: AsRef<Path>>(path: P) -> Result<(String, Tag), TagDecodeError> {
    let mut reader = BufReader::new(File::open(path)?);
    read_root_tag(&mut reader)
}

/// Writes a named root tag with gzip framing.
pub fn write_root_tag<W: Write>(writer: &mut W, name: &str, tag: &Tag) -> io::Result<()> {
    let mut encoder = GzEncoder::new(writer, Compression::default());
    write_named_tag(&mut encoder, name, tag)?;
    encoder.finish()?;

    Ok(())
}

pub fn write_root_tag_to_path<P: AsRef<Path>>(path: P, name: &str, tag: &Tag) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_root_tag(&mut writer, name, tag)?;
    writer.flush()
}
