// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Decode orchestration.
//!
//! [`JpegDecoder::read_header`] consumes segments up to the first SOS and
//! populates the frame state; [`JpegDecoder::decode_data`] then drives the
//! entropy-coded scans, finalizes progressive coefficients, and resamples /
//! color-converts into the caller's buffer.

mod render;
mod scan;
mod segments;

use crate::bit_reader::BitReader;
use crate::byte_reader::ByteReader;
use crate::component::{Component, MAX_COMPONENTS};
use crate::error::{Error, Result};
use crate::huffman::HuffmanTable;
use crate::kernels::KernelSet;
use crate::markers;
use crate::util::tracing_wrappers::*;

/// Default bound on `width * height * components`.
pub const MAX_IMAGE_SIZE: u64 = (1 << 24) * 4;

/// Caller-tunable decode parameters.
#[derive(Clone, Debug)]
pub struct DecodeOptions {
    /// Requested channel count of the output buffer: 1 or 3. `None` picks
    /// 3 for color sources and 1 for grayscale.
    pub output_channels: Option<usize>,
    /// Upper bound on `width * height * components`.
    pub max_image_size: u64,
}

impl Default for DecodeOptions {
    fn default() -> DecodeOptions {
        DecodeOptions {
            output_channels: None,
            max_image_size: MAX_IMAGE_SIZE,
        }
    }
}

/// Frame-level state from SOF and the metadata segments.
#[derive(Debug, Default)]
pub(crate) struct FrameInfo {
    pub width: usize,
    pub height: usize,
    pub components: usize,
    pub progressive: bool,
    pub jfif: bool,
    /// Adobe APP14 transform: -1 unknown, 0 none/RGB/CMYK, 1 YCbCr, 2 YCCK.
    pub app14_color_transform: i32,
    /// How many component ids literally spell 'R', 'G', 'B' in order.
    pub rgb_tag_count: usize,
    pub h_max: usize,
    pub v_max: usize,
    pub mcu_width: usize,
    pub mcu_height: usize,
    pub mcus_x: usize,
    pub mcus_y: usize,
    pub restart_interval: u32,
}

/// Per-scan state from the SOS header plus the restart/EOB counters the
/// entropy decoder maintains while the scan runs.
#[derive(Debug, Default)]
pub(crate) struct ScanInfo {
    pub scan_n: usize,
    /// Component indices in MCU order.
    pub order: [usize; MAX_COMPONENTS],
    pub spec_start: usize,
    pub spec_end: usize,
    pub succ_high: u32,
    pub succ_low: u32,
    /// MCUs left until the next restart marker is due.
    pub todo: i32,
    /// Blocks still covered by a progressive end-of-band run.
    pub eob_run: u32,
}

pub struct JpegDecoder<'a> {
    pub(crate) reader: ByteReader<'a>,
    pub(crate) bits: BitReader,
    pub(crate) frame: FrameInfo,
    pub(crate) components: [Component; MAX_COMPONENTS],
    pub(crate) quant: [[u16; 64]; MAX_COMPONENTS],
    pub(crate) huff_dc: [Option<HuffmanTable>; MAX_COMPONENTS],
    pub(crate) huff_ac: [Option<HuffmanTable>; MAX_COMPONENTS],
    pub(crate) scan: ScanInfo,
    pub(crate) kernels: KernelSet,
    pub(crate) options: DecodeOptions,
    header_done: bool,
}

impl<'a> JpegDecoder<'a> {
    pub fn new(data: &'a [u8]) -> JpegDecoder<'a> {
        JpegDecoder::with_options(data, DecodeOptions::default())
    }

    pub fn with_options(data: &'a [u8], options: DecodeOptions) -> JpegDecoder<'a> {
        JpegDecoder {
            reader: ByteReader::new(data),
            bits: BitReader::new(),
            frame: FrameInfo {
                app14_color_transform: -1,
                ..FrameInfo::default()
            },
            components: Default::default(),
            quant: [[0; 64]; MAX_COMPONENTS],
            huff_dc: Default::default(),
            huff_ac: Default::default(),
            scan: ScanInfo::default(),
            kernels: KernelSet::scalar(),
            options,
            header_done: false,
        }
    }

    pub fn width(&self) -> usize {
        self.frame.width
    }

    pub fn height(&self) -> usize {
        self.frame.height
    }

    /// Component count of the compressed stream (1, 3 or 4).
    pub fn num_components(&self) -> usize {
        self.frame.components
    }

    /// Channel count [`JpegDecoder::decode_data`] will write: 1 or 3.
    pub fn output_channels(&self) -> usize {
        match self.options.output_channels {
            Some(channels) => channels,
            None => {
                if self.frame.components >= 3 {
                    3
                } else {
                    1
                }
            }
        }
    }

    /// Parses segments up to the first SOS, allocating component planes.
    /// After this, the dimension accessors describe the frame.
    pub fn read_header(&mut self) -> Result<()> {
        let soi0 = self.reader.read_u8()?;
        let soi1 = self.reader.read_u8()?;
        if soi0 != 0xFF || soi1 != markers::SOI {
            return Err(Error::BadMarker(if soi0 != 0xFF { soi0 } else { soi1 }));
        }

        let mut marker = self.next_marker()?;
        while marker != markers::SOS && marker != markers::EOI {
            self.process_segment(marker)?;
            marker = self.next_marker()?;
            if marker == markers::SOS || marker == markers::EOI {
                // hand the marker to the decode phase
                self.bits.latch_marker(marker);
            }
        }
        if marker == markers::EOI {
            return Err(Error::NoScanData);
        }

        debug!(
            width = self.frame.width,
            height = self.frame.height,
            components = self.frame.components,
            progressive = self.frame.progressive,
            "frame header parsed"
        );
        self.header_done = true;
        Ok(())
    }

    /// Decodes the image into `image`, writing `width * output_channels`
    /// bytes per row at offsets `stride * row`. Component buffers are
    /// released on return, success or not.
    pub fn decode_data(&mut self, stride: usize, image: &mut [u8]) -> Result<()> {
        let result = self.decode_data_inner(stride, image);
        self.release_planes();
        result
    }

    fn decode_data_inner(&mut self, stride: usize, image: &mut [u8]) -> Result<()> {
        if !self.header_done {
            self.read_header()?;
        }
        if self.frame.components == 0 {
            return Err(Error::BadScanHeader("scan data without a frame header"));
        }

        let channels = self.output_channels();
        if channels != 1 && channels != 3 {
            return Err(Error::InvalidOutputChannels(channels));
        }
        let row_bytes = self
            .frame
            .width
            .checked_mul(channels)
            .ok_or(Error::SizeOverflow)?;
        let needed = (self.frame.height - 1)
            .checked_mul(stride)
            .and_then(|size| size.checked_add(row_bytes))
            .ok_or(Error::SizeOverflow)?;
        if stride < row_bytes || image.len() < needed {
            return Err(Error::OutputBufferTooSmall {
                width: self.frame.width,
                height: self.frame.height,
                channels,
            });
        }

        let mut marker = self.next_marker()?;
        while marker != markers::EOI {
            if marker == markers::SOS {
                self.parse_sos()?;
                self.parse_entropy_coded_data()?;
            } else {
                self.process_segment(marker)?;
            }
            marker = self.next_marker()?;
        }

        if self.frame.progressive {
            self.finish_progressive();
        }
        self.render_output(stride, image)
    }

    /// Returns a marker latched by the entropy decoder if there is one,
    /// otherwise reads `0xFF`-fill bytes followed by a marker byte.
    fn next_marker(&mut self) -> Result<u8> {
        if let Some(marker) = self.bits.take_marker() {
            return Ok(marker);
        }
        let mut byte = self.reader.read_u8()?;
        if byte != 0xFF {
            return Err(Error::BadMarker(byte));
        }
        while byte == 0xFF {
            byte = self.reader.read_u8()?;
        }
        Ok(byte)
    }

    fn release_planes(&mut self) {
        for component in self.components.iter_mut() {
            component.release_buffers();
        }
    }
}
