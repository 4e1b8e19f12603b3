// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::plane::AlignedBuf;

pub(crate) const MAX_COMPONENTS: usize = 4;

/// Per-component state from the frame and scan headers, plus the owned
/// decode buffers. Buffers are dropped with the component, so cleanup after
/// a partial failure needs no bookkeeping.
#[derive(Debug, Default)]
pub(crate) struct Component {
    /// Raw component id from the stream (Y=1, Cb=2, Cr=3 by convention,
    /// or literal 'R'/'G'/'B' for RGB-tagged files).
    pub id: u8,
    pub hsampling: usize,
    pub vsampling: usize,
    pub quant_id: usize,
    pub dc_id: usize,
    pub ac_id: usize,
    /// Effective pixel dimensions of this component's plane.
    pub x: usize,
    pub y: usize,
    /// Padded plane dimensions covering whole interleaved MCUs.
    pub w2: usize,
    pub h2: usize,
    /// Coefficient grid dimensions in blocks (`w2 / 8`, `h2 / 8`).
    pub coeff_w: usize,
    pub coeff_h: usize,
    /// Running DC predictor for the current scan.
    pub dc_pred: i32,
    /// Decoded samples, `w2 * h2` bytes.
    pub plane: AlignedBuf<u8>,
    /// Progressive only: one 64-entry block per grid cell.
    pub coeff: AlignedBuf<i16>,
}

impl Component {
    pub fn release_buffers(&mut self) {
        self.plane = AlignedBuf::default();
        self.coeff = AlignedBuf::default();
    }
}
