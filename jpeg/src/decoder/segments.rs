// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Marker segment parsing.
//!
//! Every segment starts with a big-endian length that includes the two
//! length bytes themselves. Parsers validate the declared length against
//! what they consume; multi-table segments (DQT, DHT) re-check the residual
//! after the table loop.

use crate::component::Component;
use crate::decoder::JpegDecoder;
use crate::error::{Error, Result};
use crate::huffman::HuffmanTable;
use crate::markers;
use crate::plane::{checked_mad2, checked_mad3, AlignedBuf};
use crate::util::tracing_wrappers::*;
use crate::zigzag::DEZIGZAG;

impl JpegDecoder<'_> {
    pub(crate) fn process_segment(&mut self, marker: u8) -> Result<()> {
        match marker {
            markers::APP0 => self.parse_app0(),
            markers::APP14 => self.parse_app14(),
            markers::DQT => self.parse_dqt(),
            markers::SOF0 | markers::SOF2 => {
                if marker == markers::SOF2 {
                    self.frame.progressive = true;
                }
                self.parse_sof(marker)
            }
            markers::DHT => self.parse_dht(),
            markers::DRI => self.parse_dri(),
            markers::DNL => self.parse_dnl(),
            markers::COM => self.skip_segment(marker),
            _ if markers::is_unsupported_sof(marker) => {
                Err(Error::UnsupportedCodingProcess(marker))
            }
            _ => self.skip_segment(marker),
        }
    }

    /// APP0: only the JFIF identifier matters; it decides whether an Adobe
    /// transform of 0 really means RGB.
    fn parse_app0(&mut self) -> Result<()> {
        let length = self.reader.read_u16_be()?;
        if length < 16 {
            return Err(Error::BadSegmentLength {
                marker: markers::APP0,
                length,
            });
        }
        let tag = self.reader.read_bytes(5)?;
        self.frame.jfif = tag == b"JFIF\0";
        self.reader.skip(length as usize - 7)
    }

    /// APP14: Adobe's color transform hint for 3- and 4-component files.
    fn parse_app14(&mut self) -> Result<()> {
        let length = self.reader.read_u16_be()?;
        if length < 8 {
            return Err(Error::BadSegmentLength {
                marker: markers::APP14,
                length,
            });
        }
        let tag = self.reader.read_bytes(6)?;
        if tag == b"Adobe\0" {
            if length < 14 {
                return Err(Error::BadSegmentLength {
                    marker: markers::APP14,
                    length,
                });
            }
            // version, flags0, flags1 precede the transform byte
            self.reader.skip(5)?;
            self.frame.app14_color_transform = self.reader.read_u8()? as i32;
            debug!(
                transform = self.frame.app14_color_transform,
                "Adobe APP14"
            );
            self.reader.skip(length as usize - 14)
        } else {
            self.reader.skip(length as usize - 8)
        }
    }

    fn parse_sof(&mut self, marker: u8) -> Result<()> {
        let length = self.reader.read_u16_be()?;
        if length < 11 {
            return Err(Error::BadSegmentLength { marker, length });
        }
        let precision = self.reader.read_u8()?;
        if precision != 8 {
            return Err(Error::UnsupportedPrecision(precision));
        }

        let height = self.reader.read_u16_be()? as usize;
        let width = self.reader.read_u16_be()? as usize;
        if height < 1 || width < 1 {
            return Err(Error::InvalidDimensions(width, height));
        }

        let ncomp = self.reader.read_u8()?;
        if ncomp != 1 && ncomp != 3 && ncomp != 4 {
            return Err(Error::UnsupportedComponentCount(ncomp));
        }
        let ncomp = ncomp as usize;
        let total_samples = width as u64 * height as u64 * ncomp as u64;
        if total_samples > self.options.max_image_size {
            return Err(Error::ImageTooLarge(total_samples));
        }
        if length as usize != 8 + 3 * ncomp {
            return Err(Error::BadSegmentLength { marker, length });
        }

        self.frame.width = width;
        self.frame.height = height;
        self.frame.components = ncomp;
        self.frame.rgb_tag_count = 0;

        let mut h_max = 1usize;
        let mut v_max = 1usize;
        for i in 0..ncomp {
            let id = self.reader.read_u8()?;
            if ncomp == 3 && id == b"RGB"[i] {
                self.frame.rgb_tag_count += 1;
            }
            let sampling = self.reader.read_u8()?;
            let hsampling = (sampling >> 4) as usize;
            let vsampling = (sampling & 15) as usize;
            if hsampling < 1 || hsampling > 4 || vsampling < 1 || vsampling > 4 {
                return Err(Error::InvalidSamplingFactor(sampling, id));
            }
            let quant_id = self.reader.read_u8()?;
            if quant_id > 3 {
                return Err(Error::InvalidTableId(quant_id));
            }
            self.components[i] = Component {
                id,
                hsampling,
                vsampling,
                quant_id: quant_id as usize,
                ..Component::default()
            };
            h_max = h_max.max(hsampling);
            v_max = v_max.max(vsampling);
        }
        for component in self.components[..ncomp].iter() {
            // every component must divide the MCU grid evenly
            if h_max % component.hsampling != 0 || v_max % component.vsampling != 0 {
                return Err(Error::InvalidSamplingFactor(
                    ((component.hsampling << 4) | component.vsampling) as u8,
                    component.id,
                ));
            }
        }

        self.frame.h_max = h_max;
        self.frame.v_max = v_max;
        self.frame.mcu_width = h_max * 8;
        self.frame.mcu_height = v_max * 8;
        self.frame.mcus_x = width.div_ceil(self.frame.mcu_width);
        self.frame.mcus_y = height.div_ceil(self.frame.mcu_height);

        for i in 0..ncomp {
            let component = &mut self.components[i];
            // effective pixels of this plane, before MCU padding
            component.x = (width * component.hsampling).div_ceil(h_max);
            component.y = (height * component.vsampling).div_ceil(v_max);
            // padded out to whole interleaved MCUs; the excess is decoded
            // but never read back after color conversion
            component.w2 = self.frame.mcus_x * component.hsampling * 8;
            component.h2 = self.frame.mcus_y * component.vsampling * 8;
            let plane_size = checked_mad2(component.w2, component.h2, 15)? - 15;
            component.plane = AlignedBuf::new_zeroed(plane_size)?;
            if self.frame.progressive {
                component.coeff_w = component.w2 / 8;
                component.coeff_h = component.h2 / 8;
                let coeff_len =
                    checked_mad3(component.w2, component.h2, std::mem::size_of::<i16>(), 15)?;
                component.coeff = AlignedBuf::new_zeroed((coeff_len - 15) / 2)?;
            }
        }
        Ok(())
    }

    pub(crate) fn parse_sos(&mut self) -> Result<()> {
        let length = self.reader.read_u16_be()?;
        let scan_n = self.reader.read_u8()?;
        if scan_n != 1 && scan_n != 3 && scan_n != 4 {
            return Err(Error::BadScanHeader("component count not 1, 3 or 4"));
        }
        let scan_n = scan_n as usize;
        if length as usize != 6 + 2 * scan_n {
            return Err(Error::BadSegmentLength {
                marker: markers::SOS,
                length,
            });
        }

        self.scan.scan_n = scan_n;
        for i in 0..scan_n {
            let component_id = self.reader.read_u8()?;
            let table_ids = self.reader.read_u8()?;
            let index = self.components[..self.frame.components]
                .iter()
                .position(|component| component.id == component_id)
                .ok_or(Error::UnknownScanComponent(component_id))?;
            let dc_id = (table_ids >> 4) as usize;
            let ac_id = (table_ids & 15) as usize;
            if dc_id > 3 || ac_id > 3 {
                return Err(Error::InvalidTableId(table_ids));
            }
            self.components[index].dc_id = dc_id;
            self.components[index].ac_id = ac_id;
            self.scan.order[i] = index;
        }

        self.scan.spec_start = self.reader.read_u8()? as usize;
        let spec_end = self.reader.read_u8()? as usize;
        let approx = self.reader.read_u8()?;
        self.scan.succ_high = (approx >> 4) as u32;
        self.scan.succ_low = (approx & 15) as u32;
        if self.frame.progressive {
            if self.scan.spec_start > 63
                || spec_end > 63
                || self.scan.spec_start > spec_end
                || self.scan.succ_high > 13
                || self.scan.succ_low > 13
            {
                return Err(Error::BadScanHeader("spectral selection out of range"));
            }
            self.scan.spec_end = spec_end;
        } else {
            if self.scan.spec_start != 0 {
                return Err(Error::BadScanHeader("baseline scan with nonzero Ss"));
            }
            if self.scan.succ_high != 0 || self.scan.succ_low != 0 {
                return Err(Error::BadScanHeader("baseline scan with approximation"));
            }
            self.scan.spec_end = 63;
        }
        debug!(
            scan_n,
            ss = self.scan.spec_start,
            se = self.scan.spec_end,
            ah = self.scan.succ_high,
            al = self.scan.succ_low,
            "scan header parsed"
        );
        Ok(())
    }

    /// One or more quantization tables. Values arrive in zigzag order and
    /// are stored de-zigzagged, so dequantization indexes naturally.
    fn parse_dqt(&mut self) -> Result<()> {
        let length = self.reader.read_u16_be()?;
        let mut remaining = length as i32 - 2;
        while remaining > 0 {
            let value = self.reader.read_u8()?;
            let precision = value >> 4;
            let table_id = value & 15;
            if precision > 1 {
                return Err(Error::InvalidQuantPrecision(precision));
            }
            if table_id > 3 {
                return Err(Error::InvalidTableId(table_id));
            }
            let table = &mut self.quant[table_id as usize];
            if precision == 1 {
                for k in 0..64 {
                    table[DEZIGZAG[k] as usize] = self.reader.read_u16_be()?;
                }
            } else {
                for k in 0..64 {
                    table[DEZIGZAG[k] as usize] = self.reader.read_u8()? as u16;
                }
            }
            remaining -= if precision == 1 { 129 } else { 65 };
        }
        if remaining != 0 {
            return Err(Error::BadSegmentLength {
                marker: markers::DQT,
                length,
            });
        }
        Ok(())
    }

    /// One or more Huffman tables, each built as soon as its symbols are
    /// read.
    fn parse_dht(&mut self) -> Result<()> {
        let length = self.reader.read_u16_be()?;
        if length <= 19 {
            return Err(Error::BadSegmentLength {
                marker: markers::DHT,
                length,
            });
        }
        let mut remaining = length as i32 - 2;
        while remaining > 0 {
            let value = self.reader.read_u8()?;
            let class = value >> 4;
            let table_id = value & 15;
            if class > 1 || table_id > 3 {
                return Err(Error::InvalidTableId(value));
            }

            let mut counts = [0u8; 16];
            let mut total = 0usize;
            for count in counts.iter_mut() {
                *count = self.reader.read_u8()?;
                total += *count as usize;
            }
            if total > 256 {
                return Err(Error::BadHuffman);
            }
            let symbols = self.reader.read_bytes(total)?;
            let table = HuffmanTable::build(&counts, symbols)?;
            if class == 0 {
                self.huff_dc[table_id as usize] = Some(table);
            } else {
                self.huff_ac[table_id as usize] = Some(table);
            }
            remaining -= 17 + total as i32;
        }
        if remaining != 0 {
            return Err(Error::BadSegmentLength {
                marker: markers::DHT,
                length,
            });
        }
        Ok(())
    }

    fn parse_dri(&mut self) -> Result<()> {
        let length = self.reader.read_u16_be()?;
        if length != 4 {
            return Err(Error::BadSegmentLength {
                marker: markers::DRI,
                length,
            });
        }
        self.frame.restart_interval = self.reader.read_u16_be()? as u32;
        debug!(interval = self.frame.restart_interval, "restart interval");
        Ok(())
    }

    fn parse_dnl(&mut self) -> Result<()> {
        let length = self.reader.read_u16_be()?;
        if length != 4 {
            return Err(Error::BadSegmentLength {
                marker: markers::DNL,
                length,
            });
        }
        let lines = self.reader.read_u16_be()?;
        if lines as usize != self.frame.height {
            return Err(Error::DnlMismatch {
                dnl: lines,
                frame: self.frame.height,
            });
        }
        Ok(())
    }

    /// COM and all APPn/unknown segments are skipped whole.
    fn skip_segment(&mut self, marker: u8) -> Result<()> {
        let length = self.reader.read_u16_be()?;
        if length < 2 {
            return Err(Error::BadSegmentLength { marker, length });
        }
        trace!(marker, length, "skipping segment");
        self.reader.skip(length as usize - 2)
    }
}
