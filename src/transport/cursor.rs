//! Bounds-checked read cursor over a received frame
//!
//! Every decode path advances one of these instead of doing raw offset
//! arithmetic. Overrunning the buffer is a protocol violation, not an
//! error value: the transport promised a complete frame.

use crate::transport::ProtocolViolation;

/// A position plus remaining-length check over a byte slice.
#[derive(Debug)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Start reading at the beginning of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// The unconsumed tail of the buffer.
    pub fn rest(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    /// Skip `n` bytes already consumed by an external decoder.
    pub fn advance(&mut self, n: usize) {
        self.require(n);
        self.pos += n;
    }

    /// Assert `n` bytes remain before consuming them.
    pub fn require(&self, n: usize) {
        if self.remaining() < n {
            ProtocolViolation::TruncatedBuffer {
                needed: n,
                remaining: self.remaining(),
            }
            .raise();
        }
    }

    fn take(&mut self, n: usize) -> &'a [u8] {
        self.require(n);
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        slice
    }

    /// Read one byte.
    pub fn read_u8(&mut self) -> u8 {
        self.take(1)[0]
    }

    /// Read a little-endian u32.
    pub fn read_u32(&mut self) -> u32 {
        let bytes = self.take(4);
        u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    /// Read a little-endian u64.
    pub fn read_u64(&mut self) -> u64 {
        let bytes = self.take(8);
        u64::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ])
    }

    /// Read a boolean encoded as one byte.
    pub fn read_bool(&mut self) -> bool {
        self.read_u8() != 0
    }

    /// Read `len` raw bytes.
    pub fn read_bytes(&mut self, len: usize) -> &'a [u8] {
        self.take(len)
    }
}
