// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use byteorder::{BigEndian, ByteOrder};

use crate::error::{Error, Result};

/// Sequential reader over a complete JPEG byte stream.
///
/// Segment fields are read through the fallible accessors, which fail with
/// [`Error::ShortRead`] when the stream is exhausted. The entropy-coded
/// refill path uses [`ByteReader::try_read_u8`] instead, since running off
/// the end of the entropy segment is handled by the bit reservoir.
#[derive(Clone, Debug)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> ByteReader<'a> {
        ByteReader { data, pos: 0 }
    }

    /// Offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let byte = *self.data.get(self.pos).ok_or(Error::ShortRead)?;
        self.pos += 1;
        Ok(byte)
    }

    /// Reads one byte, or `None` at end of stream.
    pub fn try_read_u8(&mut self) -> Option<u8> {
        let byte = *self.data.get(self.pos)?;
        self.pos += 1;
        Some(byte)
    }

    /// Two bytes, most significant first.
    pub fn read_u16_be(&mut self) -> Result<u16> {
        let bytes = self.read_bytes(2)?;
        Ok(BigEndian::read_u16(bytes))
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).ok_or(Error::ShortRead)?;
        let bytes = self.data.get(self.pos..end).ok_or(Error::ShortRead)?;
        self.pos = end;
        Ok(bytes)
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        let end = self.pos.checked_add(n).ok_or(Error::ShortRead)?;
        if end > self.data.len() {
            return Err(Error::ShortRead);
        }
        self.pos = end;
        Ok(())
    }
}
