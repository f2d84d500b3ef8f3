// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;

/// A read cursor over a borrowed byte slice.  Every read is bounds-checked and
/// an underrun is reported as [`Error::MalformedStructure`] carrying both the
/// requested and the remaining byte counts.  A failed read does not move the
/// cursor.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Number of bytes consumed so far
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// The unread tail of the buffer, without consuming it
    pub fn rest(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    fn ensure(&self, n: usize) -> Result<(), Error> {
        if n > self.remaining() {
            return Err(Error::MalformedStructure {
                requested: n,
                remaining: self.remaining(),
            });
        }
        Ok(())
    }

    pub fn get_bytes(&mut self, n: usize) -> Result<&'a [u8], Error> {
        self.ensure(n)?;
        let v = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(v)
    }

    pub fn skip(&mut self, n: usize) -> Result<(), Error> {
        self.get_bytes(n).map(|_| ())
    }

    pub fn get_u8(&mut self) -> Result<u8, Error> {
        Ok(self.get_bytes(1)?[0])
    }

    pub fn get_u16_le(&mut self) -> Result<u16, Error> {
        let b = self.get_bytes(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn get_u24_le(&mut self) -> Result<u32, Error> {
        let b = self.get_bytes(3)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], 0]))
    }

    pub fn get_u32_be(&mut self) -> Result<u32, Error> {
        let b = self.get_bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a big-endian u32 without consuming it
    pub fn peek_u32_be(&self) -> Result<u32, Error> {
        self.clone().get_u32_be()
    }
}
