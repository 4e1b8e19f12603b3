// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Canonical JPEG Huffman tables with a lookahead acceleration table.
//!
//! Codes are assigned per ITU T.81 C.2: increasing length, counting up from
//! zero, doubled between lengths. Decoding peeks [`LOOKAHEAD_BITS`] bits
//! into a flat table first; longer codes fall back to a linear scan of the
//! per-length `max_codes` boundaries.

use crate::bit_reader::BitReader;
use crate::byte_reader::ByteReader;
use crate::error::{Error, Result};

/// Codes at most this long resolve through the lookahead table.
pub const LOOKAHEAD_BITS: usize = 9;
/// Longest code length a JPEG Huffman table can contain.
pub const MAX_BITS: usize = 16;

/// Lookahead entry for bit patterns that need the slow path.
const LOOKUP_SENTINEL: u16 = 0xFFFF;

#[derive(Clone)]
pub struct HuffmanTable {
    symbols: [u8; 256],
    /// `delta[len]` maps a code of length `len` to its symbol index.
    delta: [i32; MAX_BITS + 2],
    /// One past the largest code of each length, preshifted to 16 bits;
    /// `max_codes[17]` is an all-ones sentinel that terminates the scan.
    max_codes: [u32; MAX_BITS + 2],
    /// `(length << 8) | symbol` for every prefix of a short code.
    lookups: [u16; 1 << LOOKAHEAD_BITS],
}

impl HuffmanTable {
    /// Builds a table from the 16 per-length symbol counts and the symbol
    /// list of a DHT segment.
    pub fn build(counts: &[u8; 16], symbol_values: &[u8]) -> Result<HuffmanTable> {
        let total: usize = counts.iter().map(|&c| c as usize).sum();
        if total > 256 || symbol_values.len() != total {
            return Err(Error::BadHuffman);
        }

        let mut bit_lengths = [0u8; 257];
        let mut index = 0;
        for (i, &count) in counts.iter().enumerate() {
            for _ in 0..count {
                bit_lengths[index] = (i + 1) as u8;
                index += 1;
            }
        }

        let mut symbols = [0u8; 256];
        symbols[..total].copy_from_slice(symbol_values);

        let mut codes = [0u16; 256];
        let mut delta = [0i32; MAX_BITS + 2];
        let mut max_codes = [0u32; MAX_BITS + 2];
        let mut code: u32 = 0;
        index = 0;
        for bit_number in 1..=MAX_BITS {
            delta[bit_number] = index as i32 - code as i32;
            if bit_lengths[index] == bit_number as u8 {
                while bit_lengths[index] == bit_number as u8 {
                    codes[index] = code as u16;
                    index += 1;
                    code += 1;
                }
                if code - 1 >= 1 << bit_number {
                    return Err(Error::BadHuffman);
                }
            }
            max_codes[bit_number] = code << (MAX_BITS - bit_number);
            code <<= 1;
        }
        max_codes[MAX_BITS + 1] = u32::MAX;

        let mut lookups = [LOOKUP_SENTINEL; 1 << LOOKAHEAD_BITS];
        for i in 0..total {
            let bit_length = bit_lengths[i] as usize;
            if bit_length <= LOOKAHEAD_BITS {
                let first = (codes[i] as usize) << (LOOKAHEAD_BITS - bit_length);
                let span = 1 << (LOOKAHEAD_BITS - bit_length);
                for entry in lookups[first..first + span].iter_mut() {
                    *entry = ((bit_length as u16) << 8) | symbols[i] as u16;
                }
            }
        }

        Ok(HuffmanTable {
            symbols,
            delta,
            max_codes,
            lookups,
        })
    }

    /// Decodes one symbol from the reservoir.
    pub fn decode(&self, bits: &mut BitReader, reader: &mut ByteReader) -> Result<u8> {
        if bits.bits_in_reservoir() < LOOKAHEAD_BITS {
            bits.refill(reader);
        }
        let entry = self.lookups[bits.peek(LOOKAHEAD_BITS) as usize];
        if entry != LOOKUP_SENTINEL {
            bits.discard((entry >> 8) as usize);
            return Ok((entry & 0xFF) as u8);
        }

        if bits.bits_in_reservoir() < MAX_BITS {
            bits.refill(reader);
        }
        let code16 = bits.peek(MAX_BITS);
        let mut bit_length = LOOKAHEAD_BITS + 1;
        while code16 >= self.max_codes[bit_length] {
            bit_length += 1;
        }
        if bit_length > MAX_BITS {
            bits.discard(MAX_BITS);
            return Err(Error::BadHuffman);
        }

        // The max_codes scan bounds the code below this length's boundary,
        // so the index lands inside the symbol list.
        let index = (bits.peek(bit_length) as i32 + self.delta[bit_length]) as usize;
        bits.discard(bit_length);
        Ok(self.symbols[index])
    }
}
