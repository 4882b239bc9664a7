//! Framed binary serialization of engine objects.
//!
//! Every saved object is a 16 byte header followed by the (optionally
//! compressed) little-endian body produced by [`WriterTo`]:
//!
//! | offset | field          | type |
//! |--------|----------------|------|
//! | 0      | magic `0xA15E` | u16  |
//! | 2      | header size    | u8   |
//! | 3      | version major  | u8   |
//! | 4      | version minor  | u8   |
//! | 5      | compr mode     | u8   |
//! | 6      | reserved       | u16  |
//! | 8      | total size     | u64  |

use std::io::{Cursor, Read, Result as IoResult, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::fault::{NativeFault, Result};

pub const SERIALIZATION_MAGIC: u16 = 0xA15E;
pub const HEADER_SIZE: usize = 16;
pub const VERSION_MAJOR: u8 = 1;
pub const VERSION_MINOR: u8 = 0;

/// Upper bound on a decompressed body.
pub const MAX_BODY_SIZE: usize = 1 << 30;

/// Upper bound on any element count read from a body.
pub const MAX_ELEMENT_COUNT: u64 = 1 << 27;

pub trait WriterTo {
    fn write_to<W: Write>(&self, writer: &mut W) -> IoResult<()>;
}

pub trait ReaderFrom {
    fn read_from<R: Read>(&mut self, reader: &mut R) -> IoResult<()>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum ComprMode {
    #[default]
    None = 0,
    Lz4 = 1,
    Zstd = 2,
}

impl ComprMode {
    pub fn from_u8(value: u8) -> Option<ComprMode> {
        match value {
            0 => Some(ComprMode::None),
            1 => Some(ComprMode::Lz4),
            2 => Some(ComprMode::Zstd),
            _ => None,
        }
    }

    fn compress(&self, body: &[u8]) -> Result<Vec<u8>> {
        match self {
            ComprMode::None => Ok(body.to_vec()),
            ComprMode::Lz4 => Ok(lz4_flex::block::compress_prepend_size(body)),
            ComprMode::Zstd => Ok(zstd::bulk::compress(body, 0)?),
        }
    }

    fn decompress(&self, payload: &[u8]) -> Result<Vec<u8>> {
        match self {
            ComprMode::None => Ok(payload.to_vec()),
            ComprMode::Lz4 => {
                let declared: usize = Cursor::new(payload).read_u32::<LittleEndian>()? as usize;
                if declared > MAX_BODY_SIZE {
                    return Err(NativeFault::logic_error(format!(
                        "lz4 body declares {declared} bytes, above the {MAX_BODY_SIZE} byte limit"
                    )));
                }
                lz4_flex::block::decompress_size_prepended(payload)
                    .map_err(|err| NativeFault::logic_error(format!("lz4 decompression failed: {err}")))
            }
            ComprMode::Zstd => {
                let mut body: Vec<u8> = Vec::new();
                zstd::stream::read::Decoder::new(payload)
                    .map_err(|err| NativeFault::logic_error(format!("zstd decompression failed: {err}")))?
                    .take(MAX_BODY_SIZE as u64 + 1)
                    .read_to_end(&mut body)
                    .map_err(|err| NativeFault::logic_error(format!("zstd decompression failed: {err}")))?;
                if body.len() > MAX_BODY_SIZE {
                    return Err(NativeFault::logic_error("zstd body exceeds size limit"));
                }
                Ok(body)
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub compr_mode: ComprMode,
    pub size: u64,
}

impl Header {
    fn write_to<W: Write>(&self, writer: &mut W) -> IoResult<()> {
        writer.write_u16::<LittleEndian>(SERIALIZATION_MAGIC)?;
        writer.write_u8(HEADER_SIZE as u8)?;
        writer.write_u8(VERSION_MAJOR)?;
        writer.write_u8(VERSION_MINOR)?;
        writer.write_u8(self.compr_mode as u8)?;
        writer.write_u16::<LittleEndian>(0)?;
        writer.write_u64::<LittleEndian>(self.size)?;
        Ok(())
    }

    pub fn parse(bytes: &[u8]) -> Result<Header> {
        if bytes.len() < HEADER_SIZE {
            return Err(NativeFault::logic_error(format!(
                "serialized data is too short: {} < {HEADER_SIZE} header bytes",
                bytes.len()
            )));
        }
        let mut reader: Cursor<&[u8]> = Cursor::new(bytes);
        let magic: u16 = reader.read_u16::<LittleEndian>()?;
        if magic != SERIALIZATION_MAGIC {
            return Err(NativeFault::logic_error(format!("invalid magic number {magic:#06X}")));
        }
        let header_size: u8 = reader.read_u8()?;
        if header_size as usize != HEADER_SIZE {
            return Err(NativeFault::logic_error(format!("invalid header size {header_size}")));
        }
        let major: u8 = reader.read_u8()?;
        let _minor: u8 = reader.read_u8()?;
        if major != VERSION_MAJOR {
            return Err(NativeFault::logic_error(format!(
                "unsupported serialization version {major} (expected {VERSION_MAJOR})"
            )));
        }
        let mode: u8 = reader.read_u8()?;
        let compr_mode: ComprMode =
            ComprMode::from_u8(mode).ok_or_else(|| NativeFault::logic_error(format!("unsupported compression mode {mode}")))?;
        let reserved: u16 = reader.read_u16::<LittleEndian>()?;
        if reserved != 0 {
            return Err(NativeFault::logic_error("reserved header field is not zero"));
        }
        let size: u64 = reader.read_u64::<LittleEndian>()?;
        if size < HEADER_SIZE as u64 {
            return Err(NativeFault::logic_error(format!("invalid total size {size}")));
        }
        Ok(Header { compr_mode, size })
    }
}

/// Serializes `obj` into a framed buffer.
pub fn save<T: WriterTo>(obj: &T, compr_mode: ComprMode) -> Result<Vec<u8>> {
    let mut body: Vec<u8> = Vec::new();
    obj.write_to(&mut body)?;
    let payload: Vec<u8> = compr_mode.compress(&body)?;
    let header: Header = Header {
        compr_mode,
        size: (HEADER_SIZE + payload.len()) as u64,
    };
    let mut out: Vec<u8> = Vec::with_capacity(HEADER_SIZE + payload.len());
    header.write_to(&mut out)?;
    out.extend_from_slice(&payload);
    log::trace!(
        "saved {} body bytes as {} framed bytes ({:?})",
        body.len(),
        out.len(),
        compr_mode
    );
    Ok(out)
}

/// Deserializes a framed buffer into a fresh object. `bytes` must contain
/// exactly one frame; `obj` is only produced when the whole frame parses.
pub fn load<T: ReaderFrom + Default>(bytes: &[u8]) -> Result<T> {
    let header: Header = Header::parse(bytes)?;
    if header.size != bytes.len() as u64 {
        return Err(NativeFault::logic_error(format!(
            "header declares {} bytes but {} were given",
            header.size,
            bytes.len()
        )));
    }
    let body: Vec<u8> = header.compr_mode.decompress(&bytes[HEADER_SIZE..])?;
    let mut reader: Cursor<&[u8]> = Cursor::new(&body);
    let mut obj: T = T::default();
    obj.read_from(&mut reader)?;
    if reader.position() != body.len() as u64 {
        return Err(NativeFault::logic_error(format!(
            "{} trailing bytes after serialized object",
            body.len() as u64 - reader.position()
        )));
    }
    Ok(obj)
}

pub(crate) fn invalid_data(message: impl Into<String>) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidData, message.into())
}

pub(crate) fn read_count<R: Read>(reader: &mut R, what: &str) -> IoResult<usize> {
    let count: u64 = reader.read_u64::<LittleEndian>()?;
    if count > MAX_ELEMENT_COUNT {
        return Err(invalid_data(format!(
            "{what} count {count} exceeds limit {MAX_ELEMENT_COUNT}"
        )));
    }
    Ok(count as usize)
}

pub(crate) fn read_u64_vec<R: Read>(reader: &mut R, len: usize) -> IoResult<Vec<u64>> {
    let mut values: Vec<u64> = vec![0; len];
    reader.read_u64_into::<LittleEndian>(&mut values)?;
    Ok(values)
}

pub(crate) fn write_u64_slice<W: Write>(writer: &mut W, values: &[u64]) -> IoResult<()> {
    values
        .iter()
        .try_for_each(|v| writer.write_u64::<LittleEndian>(*v))
}
