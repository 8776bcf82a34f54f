//! Byte format of the docID and frequency streams.
//!
//! `Compression::None` stores every integer as a fixed 4-byte little-endian
//! `u32`. `Compression::VByte` stores 7 payload bits per byte, least
//! significant group first, with the high bit set on every byte except the
//! last one. Under `VByte` docIDs are written as gaps from the previous docID
//! of the same list (the first gap is measured from 0). Floats are always
//! 4-byte little-endian `f32`.

use crate::error::{IndexError, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::io::{self, Read, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Compression {
    None,
    #[default]
    VByte,
}

impl Compression {
    pub fn encode_u32<W: Write>(self, value: u32, out: &mut W) -> io::Result<()> {
        match self {
            Compression::None => out.write_u32::<LittleEndian>(value),
            Compression::VByte => {
                let mut buf = Vec::with_capacity(5);
                encode_vbyte(value, &mut buf);
                out.write_all(&buf)
            }
        }
    }

    pub fn decode_u32<R: Read>(self, input: &mut R) -> Result<u32> {
        match self {
            Compression::None => Ok(input.read_u32::<LittleEndian>()?),
            Compression::VByte => decode_vbyte(input),
        }
    }

    /// Writes `doc_id`, which must be greater than `prev` (0 for the first posting).
    pub fn encode_doc_id<W: Write>(self, prev: u32, doc_id: u32, out: &mut W) -> io::Result<()> {
        debug_assert!(doc_id > prev || (prev == 0 && doc_id == 0));
        match self {
            Compression::None => self.encode_u32(doc_id, out),
            Compression::VByte => self.encode_u32(doc_id - prev, out),
        }
    }

    pub fn decode_doc_id<R: Read>(self, prev: u32, input: &mut R) -> Result<u32> {
        let raw = self.decode_u32(input)?;
        match self {
            Compression::None => Ok(raw),
            Compression::VByte => prev
                .checked_add(raw)
                .ok_or_else(|| IndexError::Corrupt(format!("docID gap {raw} overflows after {prev}"))),
        }
    }
}

/// Append the variable-byte form of `value` to `out`.
pub fn encode_vbyte(mut value: u32, out: &mut Vec<u8>) {
    while value >= 0x80 {
        out.push((value as u8 & 0x7F) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

pub fn decode_vbyte<R: Read>(input: &mut R) -> Result<u32> {
    let mut result: u32 = 0;
    let mut shift = 0u32;
    loop {
        let byte = input.read_u8()?;
        let payload = (byte & 0x7F) as u32;
        if shift == 28 && payload > 0x0F {
            return Err(IndexError::Corrupt("VByte value wider than 32 bits".into()));
        }
        result |= payload << shift;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
        shift += 7;
        if shift > 28 {
            return Err(IndexError::Corrupt("VByte value wider than 32 bits".into()));
        }
    }
}

pub fn encode_f32<W: Write>(value: f32, out: &mut W) -> io::Result<()> {
    out.write_f32::<LittleEndian>(value)
}

pub fn decode_f32<R: Read>(input: &mut R) -> io::Result<f32> {
    input.read_f32::<LittleEndian>()
}

/// Writer that remembers how many bytes went through it, so callers can
/// record byte offsets of what they are about to write.
pub struct CountingWriter<W: Write> {
    inner: W,
    position: u64,
}

impl<W: Write> CountingWriter<W> {
    pub fn new(inner: W) -> Self { Self { inner, position: 0 } }
    pub fn position(&self) -> u64 { self.position }
    pub fn into_inner(self) -> W { self.inner }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.position += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> { self.inner.flush() }
}
