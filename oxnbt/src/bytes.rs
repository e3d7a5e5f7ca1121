//! Endian-correct primitive I/O over a byte stream, plus the compression
//! layer that NBT files are wrapped in.

use std::io::{Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::{GzEncoder, ZlibEncoder};

use crate::error::{Error, Result};
use crate::Tag;

/// Cap on up-front allocation for length-prefixed data. A claimed length is
/// not trusted until the bytes actually arrive, so a hostile length can
/// never reserve more than this before reading.
const MAX_PREALLOC: usize = 64 * 1024;

/// Big-endian reader over a byte source. Tracks the absolute offset so
/// errors can report where the stream went wrong.
pub(crate) struct TagReader<R> {
    inner: R,
    offset: u64,
}

impl<R: Read> TagReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, offset: 0 }
    }

    /// Offset of the next unread byte.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let at = self.offset;
        let v = self.inner.read_u8().map_err(|e| Error::from(e).at(at))?;
        self.offset += 1;
        Ok(v)
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let at = self.offset;
        let v = self
            .inner
            .read_u16::<BigEndian>()
            .map_err(|e| Error::from(e).at(at))?;
        self.offset += 2;
        Ok(v)
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(self.read_u16()? as i16)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let at = self.offset;
        let v = self
            .inner
            .read_i32::<BigEndian>()
            .map_err(|e| Error::from(e).at(at))?;
        self.offset += 4;
        Ok(v)
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        let at = self.offset;
        let v = self
            .inner
            .read_i64::<BigEndian>()
            .map_err(|e| Error::from(e).at(at))?;
        self.offset += 8;
        Ok(v)
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        let at = self.offset;
        let v = self
            .inner
            .read_f32::<BigEndian>()
            .map_err(|e| Error::from(e).at(at))?;
        self.offset += 4;
        Ok(v)
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        let at = self.offset;
        let v = self
            .inner
            .read_f64::<BigEndian>()
            .map_err(|e| Error::from(e).at(at))?;
        self.offset += 8;
        Ok(v)
    }

    /// Read exactly `len` bytes with bounded pre-allocation.
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let at = self.offset;
        let mut buf = Vec::with_capacity(len.min(MAX_PREALLOC));
        let got = (&mut self.inner)
            .take(len as u64)
            .read_to_end(&mut buf)
            .map_err(|e| Error::from(e).at(at))?;
        self.offset += got as u64;
        if got < len {
            return Err(Error::unexpected_end().at(self.offset));
        }
        Ok(buf)
    }

    /// Read a u16-length-prefixed modified UTF-8 string.
    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_u16()? as usize;
        let at = self.offset;
        let buf = self.read_bytes(len)?;
        Ok(cesu8::from_java_cesu8(&buf)
            .map_err(|_| Error::invalid_utf8(&buf).at(at))?
            .into_owned())
    }

    /// Discard `len` bytes.
    pub fn skip(&mut self, len: u64) -> Result<()> {
        let got = std::io::copy(&mut (&mut self.inner).take(len), &mut std::io::sink())
            .map_err(|e| Error::from(e).at(self.offset))?;
        self.offset += got;
        if got < len {
            return Err(Error::unexpected_end().at(self.offset));
        }
        Ok(())
    }
}

/// Byte emission helpers shared by the streaming writer.
pub(crate) trait WriteNbt: Write {
    fn write_kind(&mut self, tag: Tag) -> Result<()> {
        self.write_u8(tag as u8)?;
        Ok(())
    }

    fn write_size_prefixed_str(&mut self, s: &str) -> Result<()> {
        let data = cesu8::to_java_cesu8(s);
        let len: u16 = data
            .len()
            .try_into()
            .map_err(|_| Error::structural("string too long for nbt"))?;
        self.write_u16::<BigEndian>(len)?;
        self.write_all(&data)?;
        Ok(())
    }

    fn write_len(&mut self, len: usize) -> Result<()> {
        let len: i32 = len
            .try_into()
            .map_err(|_| Error::structural("length too large for nbt"))?;
        self.write_i32::<BigEndian>(len)?;
        Ok(())
    }
}

impl<T> WriteNbt for T where T: Write {}

/// Compression applied to an NBT document on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Zlib,
}

impl Compression {
    /// Sniff the compression from the leading magic bytes: `1F 8B` for
    /// gzip, `78 01`/`78 9C`/`78 DA` for zlib, anything else is raw NBT.
    pub fn detect(data: &[u8]) -> Compression {
        match data {
            [0x1f, 0x8b, ..] => Compression::Gzip,
            [0x78, 0x01, ..] | [0x78, 0x9c, ..] | [0x78, 0xda, ..] => Compression::Zlib,
            _ => Compression::None,
        }
    }
}

pub(crate) fn decompress(data: &[u8], compression: Compression) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    match compression {
        Compression::None => out.extend_from_slice(data),
        Compression::Gzip => {
            GzDecoder::new(data).read_to_end(&mut out)?;
        }
        Compression::Zlib => {
            ZlibDecoder::new(data).read_to_end(&mut out)?;
        }
    }
    Ok(out)
}

pub(crate) fn compress(data: &[u8], compression: Compression) -> Result<Vec<u8>> {
    match compression {
        Compression::None => Ok(data.to_vec()),
        Compression::Gzip => {
            let mut enc = GzEncoder::new(Vec::new(), flate2::Compression::default());
            enc.write_all(data)?;
            Ok(enc.finish()?)
        }
        Compression::Zlib => {
            let mut enc = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
            enc.write_all(data)?;
            Ok(enc.finish()?)
        }
    }
}
