// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Runtime-selected block kernels.
//!
//! The three hottest routines are reached through a capability table chosen
//! once when the decoder is built, so specialized implementations (e.g. for
//! a particular instruction set) can slot in without touching the decode
//! paths. The scalar set is the reference; any replacement must be
//! bit-identical to it.

use crate::{color, idct, upsample};

/// Inverse-transforms one 8x8 coefficient block into `output` rows of
/// `stride` bytes.
pub type IdctBlockFn = fn(output: &mut [u8], stride: usize, data: &[i16]);

/// Converts one row of Y/Cb/Cr samples into interleaved BGR pixels.
pub type YCbCrToBgrFn = fn(out: &mut [u8], y: &[u8], cb: &[u8], cr: &[u8], width: usize, channels: usize);

/// Produces one upsampled row from two source rows; returns the row, which
/// may alias either input or the scratch buffer.
pub type ResampleRowFn =
    for<'a> fn(out: &'a mut [u8], near: &'a [u8], far: &'a [u8], w_lores: usize, hs: usize) -> &'a [u8];

#[derive(Clone, Copy)]
pub struct KernelSet {
    pub idct_block: IdctBlockFn,
    pub ycbcr_to_bgr: YCbCrToBgrFn,
    pub resample_h2v2: ResampleRowFn,
}

impl KernelSet {
    pub fn scalar() -> KernelSet {
        KernelSet {
            idct_block: idct::idct_block,
            ycbcr_to_bgr: color::ycbcr_to_bgr_row,
            resample_h2v2: upsample::resample_row_hv2,
        }
    }
}

impl Default for KernelSet {
    fn default() -> KernelSet {
        KernelSet::scalar()
    }
}
