// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Entropy-coded scan decoding.
//!
//! Baseline scans decode whole blocks and IDCT them straight into the
//! component sample planes. Progressive scans accumulate coefficients in
//! the per-component coefficient planes across multiple scans; the
//! dequantize + IDCT pass runs once at end of stream.
//!
//! Restart handling: every MCU decrements `todo`. At zero, a pending
//! RSTn marker resets the reservoir, the DC predictors and the EOB run. Any
//! other pending marker ends the scan gracefully, leaving whatever blocks
//! decoded so far in place; the orchestrator resumes at that marker.

use crate::bit_reader::BitReader;
use crate::byte_reader::ByteReader;
use crate::decoder::{JpegDecoder, ScanInfo};
use crate::error::{Error, Result};
use crate::huffman::HuffmanTable;
use crate::markers;
use crate::util::tracing_wrappers::*;
use crate::zigzag::DEZIGZAG;

impl JpegDecoder<'_> {
    pub(crate) fn parse_entropy_coded_data(&mut self) -> Result<()> {
        self.reset_scan_state();
        if !self.frame.progressive {
            if self.scan.scan_n == 1 {
                self.baseline_noninterleaved()
            } else {
                self.baseline_interleaved()
            }
        } else if self.scan.scan_n == 1 {
            self.progressive_noninterleaved()
        } else {
            self.progressive_interleaved()
        }
    }

    fn reset_scan_state(&mut self) {
        self.bits.reset();
        for component in self.components.iter_mut() {
            component.dc_pred = 0;
        }
        self.scan.eob_run = 0;
        self.scan.todo = if self.frame.restart_interval > 0 {
            self.frame.restart_interval as i32
        } else {
            i32::MAX
        };
    }

    /// Counts down one restart unit. Returns `false` when the scan must
    /// stop: either no marker is pending or the pending marker is not a
    /// restart.
    fn restart_boundary(&mut self) -> bool {
        self.scan.todo -= 1;
        if self.scan.todo > 0 {
            return true;
        }
        match self.bits.pending_marker() {
            Some(marker) if markers::is_restart(marker) => {
                self.reset_scan_state();
                true
            }
            _ => {
                warn!("scan ended without a restart marker");
                false
            }
        }
    }

    fn baseline_noninterleaved(&mut self) -> Result<()> {
        let comp_index = self.scan.order[0];
        let kernels = self.kernels;
        let (blocks_x, blocks_y, w2) = {
            let component = &self.components[comp_index];
            ((component.x + 7) >> 3, (component.y + 7) >> 3, component.w2)
        };
        for by in 0..blocks_y {
            for bx in 0..blocks_x {
                let mut data = [0i16; 64];
                {
                    let Self {
                        reader,
                        bits,
                        components,
                        huff_dc,
                        huff_ac,
                        quant,
                        ..
                    } = self;
                    let component = &mut components[comp_index];
                    let dc_table = huff_dc[component.dc_id]
                        .as_ref()
                        .ok_or(Error::MissingHuffmanTable(component.dc_id as u8))?;
                    let ac_table = huff_ac[component.ac_id]
                        .as_ref()
                        .ok_or(Error::MissingHuffmanTable(component.ac_id as u8))?;
                    decode_block(
                        bits,
                        reader,
                        &mut data,
                        dc_table,
                        ac_table,
                        &mut component.dc_pred,
                        &quant[component.quant_id],
                    )?;
                }
                let offset = w2 * by * 8 + bx * 8;
                let plane = self.components[comp_index].plane.as_mut_slice();
                (kernels.idct_block)(&mut plane[offset..], w2, &data);

                // each block of a non-interleaved scan is its own MCU
                if !self.restart_boundary() {
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    fn baseline_interleaved(&mut self) -> Result<()> {
        let kernels = self.kernels;
        for mcu_y in 0..self.frame.mcus_y {
            for mcu_x in 0..self.frame.mcus_x {
                for k in 0..self.scan.scan_n {
                    let comp_index = self.scan.order[k];
                    let (hsampling, vsampling, w2) = {
                        let component = &self.components[comp_index];
                        (component.hsampling, component.vsampling, component.w2)
                    };
                    for v in 0..vsampling {
                        for h in 0..hsampling {
                            let mut data = [0i16; 64];
                            {
                                let Self {
                                    reader,
                                    bits,
                                    components,
                                    huff_dc,
                                    huff_ac,
                                    quant,
                                    ..
                                } = self;
                                let component = &mut components[comp_index];
                                let dc_table = huff_dc[component.dc_id]
                                    .as_ref()
                                    .ok_or(Error::MissingHuffmanTable(component.dc_id as u8))?;
                                let ac_table = huff_ac[component.ac_id]
                                    .as_ref()
                                    .ok_or(Error::MissingHuffmanTable(component.ac_id as u8))?;
                                decode_block(
                                    bits,
                                    reader,
                                    &mut data,
                                    dc_table,
                                    ac_table,
                                    &mut component.dc_pred,
                                    &quant[component.quant_id],
                                )?;
                            }
                            let col = (mcu_x * hsampling + h) * 8;
                            let row = (mcu_y * vsampling + v) * 8;
                            let offset = w2 * row + col;
                            let plane = self.components[comp_index].plane.as_mut_slice();
                            (kernels.idct_block)(&mut plane[offset..], w2, &data);
                        }
                    }
                }
                if !self.restart_boundary() {
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    fn progressive_noninterleaved(&mut self) -> Result<()> {
        let comp_index = self.scan.order[0];
        let dc_band = self.scan.spec_start == 0;
        if dc_band && self.scan.spec_end != 0 {
            // a scan cannot mix DC and AC coefficients
            return Err(Error::BadProgressiveCode);
        }
        let (blocks_x, blocks_y) = {
            let component = &self.components[comp_index];
            ((component.x + 7) >> 3, (component.y + 7) >> 3)
        };
        for by in 0..blocks_y {
            for bx in 0..blocks_x {
                {
                    let Self {
                        reader,
                        bits,
                        components,
                        huff_dc,
                        huff_ac,
                        scan,
                        ..
                    } = self;
                    let component = &mut components[comp_index];
                    let offset = 64 * (bx + by * component.coeff_w);
                    let block = &mut component.coeff.as_mut_slice()[offset..offset + 64];
                    if dc_band {
                        if scan.succ_high == 0 {
                            let dc_table = huff_dc[component.dc_id]
                                .as_ref()
                                .ok_or(Error::MissingHuffmanTable(component.dc_id as u8))?;
                            progressive_dc_first(
                                bits,
                                reader,
                                block,
                                dc_table,
                                &mut component.dc_pred,
                                scan.succ_low,
                            )?;
                        } else {
                            progressive_dc_refine(bits, reader, block, scan.succ_low);
                        }
                    } else {
                        let ac_table = huff_ac[component.ac_id]
                            .as_ref()
                            .ok_or(Error::MissingHuffmanTable(component.ac_id as u8))?;
                        decode_progressive_ac_block(bits, reader, block, ac_table, scan)?;
                    }
                }
                if !self.restart_boundary() {
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    /// Interleaved progressive scans carry DC data only; AC bands are
    /// non-interleaved by construction.
    fn progressive_interleaved(&mut self) -> Result<()> {
        if self.scan.spec_start != 0 || self.scan.spec_end != 0 {
            return Err(Error::BadProgressiveCode);
        }
        for mcu_y in 0..self.frame.mcus_y {
            for mcu_x in 0..self.frame.mcus_x {
                for k in 0..self.scan.scan_n {
                    let comp_index = self.scan.order[k];
                    let Self {
                        reader,
                        bits,
                        components,
                        huff_dc,
                        scan,
                        ..
                    } = self;
                    let component = &mut components[comp_index];
                    for v in 0..component.vsampling {
                        for h in 0..component.hsampling {
                            let bx = mcu_x * component.hsampling + h;
                            let by = mcu_y * component.vsampling + v;
                            let offset = 64 * (bx + by * component.coeff_w);
                            let block = &mut component.coeff.as_mut_slice()[offset..offset + 64];
                            if scan.succ_high == 0 {
                                let dc_table = huff_dc[component.dc_id]
                                    .as_ref()
                                    .ok_or(Error::MissingHuffmanTable(component.dc_id as u8))?;
                                progressive_dc_first(
                                    bits,
                                    reader,
                                    block,
                                    dc_table,
                                    &mut component.dc_pred,
                                    scan.succ_low,
                                )?;
                            } else {
                                progressive_dc_refine(bits, reader, block, scan.succ_low);
                            }
                        }
                    }
                }
                if !self.restart_boundary() {
                    return Ok(());
                }
            }
        }
        Ok(())
    }
}

/// Baseline: DC difference plus the AC run-length loop, dequantizing into
/// row-major order as it goes.
fn decode_block(
    bits: &mut BitReader,
    reader: &mut ByteReader,
    data: &mut [i16; 64],
    dc_table: &HuffmanTable,
    ac_table: &HuffmanTable,
    dc_pred: &mut i32,
    quant: &[u16; 64],
) -> Result<()> {
    let size = dc_table.decode(bits, reader)? as usize;
    if size > 15 {
        return Err(Error::BadHuffman);
    }
    let diff = if size > 0 {
        bits.receive_extend(reader, size)
    } else {
        0
    };
    let dc = dc_pred.wrapping_add(diff);
    *dc_pred = dc;
    data[0] = dc.wrapping_mul(quant[0] as i32) as i16;

    let mut k = 1usize;
    loop {
        let rs = ac_table.decode(bits, reader)?;
        let run = (rs >> 4) as usize;
        let size = (rs & 15) as usize;
        if size == 0 {
            if rs != 0xF0 {
                break; // end of block
            }
            k += 16;
        } else {
            k += run;
            let pos = DEZIGZAG[k] as usize;
            let value = bits.receive_extend(reader, size);
            data[pos] = value.wrapping_mul(quant[pos] as i32) as i16;
            k += 1;
        }
        if k >= 64 {
            break;
        }
    }
    Ok(())
}

/// Progressive DC, first scan: baseline DC scaled up by the approximation
/// shift. Clears the rest of the block, which no earlier scan can have
/// touched.
fn progressive_dc_first(
    bits: &mut BitReader,
    reader: &mut ByteReader,
    data: &mut [i16],
    dc_table: &HuffmanTable,
    dc_pred: &mut i32,
    succ_low: u32,
) -> Result<()> {
    data.fill(0);
    let size = dc_table.decode(bits, reader)? as usize;
    if size > 15 {
        return Err(Error::BadHuffman);
    }
    let diff = if size > 0 {
        bits.receive_extend(reader, size)
    } else {
        0
    };
    let dc = dc_pred.wrapping_add(diff);
    *dc_pred = dc;
    data[0] = dc.wrapping_shl(succ_low) as i16;
    Ok(())
}

/// Progressive DC refinement: one raw bit adds `1 << succ_low`. No entropy
/// table is involved.
fn progressive_dc_refine(
    bits: &mut BitReader,
    reader: &mut ByteReader,
    data: &mut [i16],
    succ_low: u32,
) {
    if bits.get_bit(reader) {
        data[0] = data[0].wrapping_add(1 << succ_low);
    }
}

/// Progressive AC over the band `[spec_start..=spec_end]`.
fn decode_progressive_ac_block(
    bits: &mut BitReader,
    reader: &mut ByteReader,
    data: &mut [i16],
    ac_table: &HuffmanTable,
    scan: &mut ScanInfo,
) -> Result<()> {
    if scan.spec_start == 0 {
        return Err(Error::BadProgressiveCode);
    }

    if scan.succ_high == 0 {
        // first scan: place whole coefficients, scaled by the shift
        let shift = scan.succ_low;
        if scan.eob_run > 0 {
            scan.eob_run -= 1;
            return Ok(());
        }
        let mut k = scan.spec_start;
        loop {
            let rs = ac_table.decode(bits, reader)?;
            let run = (rs >> 4) as usize;
            let size = (rs & 15) as usize;
            if size == 0 {
                if run < 15 {
                    scan.eob_run = (1 << run) + bits.receive(reader, run) - 1;
                    break;
                }
                k += 16;
            } else {
                k += run;
                let pos = DEZIGZAG[k] as usize;
                k += 1;
                let value = bits.receive_extend(reader, size);
                data[pos] = value.wrapping_shl(shift) as i16;
            }
            if k > scan.spec_end {
                break;
            }
        }
    } else {
        // refinement: each nonzero coefficient in the band receives one
        // correction bit; zeros are spent by run counts until a new ±bit
        // lands
        let bit = 1i16 << scan.succ_low;

        if scan.eob_run > 0 {
            scan.eob_run -= 1;
            for k in scan.spec_start..=scan.spec_end {
                refine_nonzero(bits, reader, &mut data[DEZIGZAG[k] as usize], bit);
            }
            return Ok(());
        }

        let mut k = scan.spec_start;
        loop {
            let rs = ac_table.decode(bits, reader)?;
            let mut run = (rs >> 4) as i32;
            let size = (rs & 15) as usize;
            let mut coefficient = 0i16;
            if size == 0 {
                if run < 15 {
                    scan.eob_run = (1 << run) - 1 + bits.receive(reader, run as usize);
                    run = 64; // force end of block
                }
                // run == 15: sixteen zeros, the last placed as a zero
                // coefficient by the loop below
            } else {
                if size != 1 {
                    return Err(Error::BadProgressiveCode);
                }
                coefficient = if bits.get_bit(reader) { bit } else { -bit };
            }

            while k <= scan.spec_end {
                let pos = DEZIGZAG[k] as usize;
                k += 1;
                if data[pos] != 0 {
                    refine_nonzero(bits, reader, &mut data[pos], bit);
                } else {
                    if run == 0 {
                        data[pos] = coefficient;
                        break;
                    }
                    run -= 1;
                }
            }
            if k > scan.spec_end {
                break;
            }
        }
    }
    Ok(())
}

/// One refinement bit for an already-nonzero coefficient: a set bit moves
/// the value one step away from zero, once per approximation level.
fn refine_nonzero(bits: &mut BitReader, reader: &mut ByteReader, value: &mut i16, bit: i16) {
    if bits.get_bit(reader) && (*value & bit) == 0 {
        if *value > 0 {
            *value = value.wrapping_add(bit);
        } else {
            *value = value.wrapping_sub(bit);
        }
    }
}
