// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Baseline and progressive JPEG decoding.
//!
//! This crate turns a JPEG byte stream (SOF0 baseline or SOF2 progressive,
//! 8-bit precision) into an interleaved pixel buffer: BGR for color sources,
//! a single luma channel for grayscale. 4-component CMYK/YCCK streams are
//! composited down to BGR using the Adobe APP14 transform hint.
//!
//! The decoder is a plain library with no I/O of its own: the caller hands it
//! a byte slice and an output buffer.
//!
//! ```
//! # use jpeg::{JpegDecoder, Result};
//! # fn decode(data: &[u8]) -> Result<Vec<u8>> {
//! let mut decoder = JpegDecoder::new(data);
//! decoder.read_header()?;
//! let stride = decoder.width() * decoder.output_channels();
//! let mut image = vec![0u8; stride * decoder.height()];
//! decoder.decode_data(stride, &mut image)?;
//! # Ok(image)
//! # }
//! ```

pub mod bit_reader;
pub mod byte_reader;
pub mod color;
pub mod decoder;
pub mod error;
pub mod huffman;
pub mod idct;
pub mod kernels;
pub mod markers;
pub mod upsample;
pub mod zigzag;

mod component;
mod plane;
mod util;

#[cfg(test)]
mod tests;

pub use decoder::{DecodeOptions, JpegDecoder, MAX_IMAGE_SIZE};
pub use error::{Error, Result};
