//! Wire format adapter: a growable byte sink and a bounded byte source.
//!
//! All fixed-width numbers are big-endian. Text is a LEB128 byte length
//! followed by UTF-8; opaque byte blocks carry a 32-bit signed length.
//! No header, magic number or version is ever written here.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::{CodecError, CodecResult};

/// Upper bounds on text, byte blocks and tree nesting.
///
/// Writers and readers apply the same bounds, so anything a writer accepts
/// is readable by a reader built from the same limits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireLimits {
    /// Maximum byte length of a single text value.
    pub max_text_len: usize,
    /// Maximum length of a single opaque byte block.
    pub max_block_len: usize,
    /// Maximum nesting depth of a wire-encoded tree.
    pub max_tree_depth: usize,
}

impl Default for WireLimits {
    fn default() -> Self {
        Self {
            max_text_len: 32_767,
            max_block_len: 2 * 1024 * 1024,
            max_tree_depth: 512,
        }
    }
}

// ---------------------------------------------------------------------------
// WireWriter
// ---------------------------------------------------------------------------

/// Growable sink with a sequential write cursor.
///
/// Values longer than the writer's [`WireLimits`] are refused with
/// [`CodecError::LengthOutOfBounds`] before any byte of them is written.
#[derive(Debug, Default)]
pub struct WireWriter {
    buf: BytesMut,
    limits: WireLimits,
}

impl WireWriter {
    /// Create a writer with default [`WireLimits`].
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            limits: WireLimits::default(),
        }
    }

    pub fn with_limits(limits: WireLimits) -> Self {
        Self {
            buf: BytesMut::new(),
            limits,
        }
    }

    pub fn limits(&self) -> &WireLimits {
        &self.limits
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Finish writing and hand the bytes to the transport.
    pub fn freeze(self) -> Bytes {
        self.buf.freeze()
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    pub fn write_i8(&mut self, value: i8) {
        self.buf.put_i8(value);
    }

    pub fn write_i16(&mut self, value: i16) {
        self.buf.put_i16(value);
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buf.put_i32(value);
    }

    pub fn write_i64(&mut self, value: i64) {
        self.buf.put_i64(value);
    }

    pub fn write_f32(&mut self, value: f32) {
        self.buf.put_f32(value);
    }

    pub fn write_f64(&mut self, value: f64) {
        self.buf.put_f64(value);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.put_u8(value as u8);
    }

    /// Write an unsigned LEB128 integer (1 to 5 bytes).
    pub fn write_var_u32(&mut self, mut value: u32) {
        while value >= 0x80 {
            self.buf.put_u8((value as u8 & 0x7f) | 0x80);
            value >>= 7;
        }
        self.buf.put_u8(value as u8);
    }

    /// Write length-prefixed UTF-8 text, bounded by `max_text_len`.
    pub fn write_str(&mut self, value: &str) -> CodecResult<()> {
        let limit = self.limits.max_text_len.min(u32::MAX as usize);
        let len = bounded_len(value.len(), limit)?;
        self.write_var_u32(len as u32);
        self.buf.put_slice(value.as_bytes());
        Ok(())
    }

    /// Write a length-prefixed opaque byte block, bounded by `max_block_len`.
    pub fn write_bytes(&mut self, value: &[u8]) -> CodecResult<()> {
        let limit = self.limits.max_block_len.min(i32::MAX as usize);
        let len = bounded_len(value.len(), limit)?;
        self.buf.put_i32(len as i32);
        self.buf.put_slice(value);
        Ok(())
    }

    /// Write a raw run of bytes with no framing.
    pub fn write_raw(&mut self, value: &[u8]) {
        self.buf.put_slice(value);
    }
}

fn bounded_len(len: usize, limit: usize) -> CodecResult<usize> {
    if len > limit {
        return Err(CodecError::LengthOutOfBounds {
            len: len as i64,
            limit,
        });
    }
    Ok(len)
}

// ---------------------------------------------------------------------------
// WireReader
// ---------------------------------------------------------------------------

/// Bounded source with a sequential read cursor.
///
/// Reads never panic: running out of bytes yields
/// [`CodecError::UnexpectedEof`].
#[derive(Debug, Clone)]
pub struct WireReader {
    buf: Bytes,
    total: usize,
    limits: WireLimits,
}

impl WireReader {
    /// Create a reader with default [`WireLimits`].
    pub fn new(buf: impl Into<Bytes>) -> Self {
        Self::with_limits(buf, WireLimits::default())
    }

    pub fn with_limits(buf: impl Into<Bytes>, limits: WireLimits) -> Self {
        let buf = buf.into();
        Self {
            total: buf.len(),
            buf,
            limits,
        }
    }

    pub fn limits(&self) -> &WireLimits {
        &self.limits
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.total - self.buf.remaining()
    }

    fn need(&self, needed: usize) -> CodecResult<()> {
        let remaining = self.buf.remaining();
        if remaining < needed {
            return Err(CodecError::UnexpectedEof { needed, remaining });
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> CodecResult<u8> {
        self.need(1)?;
        Ok(self.buf.get_u8())
    }

    pub fn read_i8(&mut self) -> CodecResult<i8> {
        self.need(1)?;
        Ok(self.buf.get_i8())
    }

    pub fn read_i16(&mut self) -> CodecResult<i16> {
        self.need(2)?;
        Ok(self.buf.get_i16())
    }

    pub fn read_i32(&mut self) -> CodecResult<i32> {
        self.need(4)?;
        Ok(self.buf.get_i32())
    }

    pub fn read_i64(&mut self) -> CodecResult<i64> {
        self.need(8)?;
        Ok(self.buf.get_i64())
    }

    pub fn read_f32(&mut self) -> CodecResult<f32> {
        self.need(4)?;
        Ok(self.buf.get_f32())
    }

    pub fn read_f64(&mut self) -> CodecResult<f64> {
        self.need(8)?;
        Ok(self.buf.get_f64())
    }

    /// Any non-zero byte reads as `true`.
    pub fn read_bool(&mut self) -> CodecResult<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_var_u32(&mut self) -> CodecResult<u32> {
        let mut value = 0u32;
        for shift in (0..35).step_by(7) {
            let byte = self.read_u8()?;
            value |= u32::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(CodecError::MalformedVarInt)
    }

    /// Read length-prefixed UTF-8 text, bounded by `max_text_len`.
    pub fn read_str(&mut self) -> CodecResult<String> {
        let len = self.read_var_u32()? as usize;
        if len > self.limits.max_text_len {
            return Err(CodecError::LengthOutOfBounds {
                len: len as i64,
                limit: self.limits.max_text_len,
            });
        }
        let raw = self.read_raw(len)?;
        Ok(String::from_utf8(raw.to_vec())?)
    }

    /// Read a length-prefixed byte block, bounded by `max_block_len`.
    pub fn read_bytes(&mut self) -> CodecResult<Vec<u8>> {
        let len = self.read_i32()?;
        if len < 0 || len as usize > self.limits.max_block_len {
            return Err(CodecError::LengthOutOfBounds {
                len: i64::from(len),
                limit: self.limits.max_block_len,
            });
        }
        Ok(self.read_raw(len as usize)?.to_vec())
    }

    /// Read a raw run of `len` bytes without copying.
    pub fn read_raw(&mut self, len: usize) -> CodecResult<Bytes> {
        self.need(len)?;
        Ok(self.buf.split_to(len))
    }
}
