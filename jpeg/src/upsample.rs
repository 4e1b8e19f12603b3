// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Chroma upsampling kernels.
//!
//! Each kernel produces one output row from the two nearest source rows
//! (`near` is the closer one). `out` is a scratch row at least
//! `w_lores * hs` bytes long; kernels return the slice holding the result,
//! which for the 1:1 case is `near` itself.

fn div4(x: i32) -> u8 {
    (x >> 2) as u8
}

fn div16(x: i32) -> u8 {
    (x >> 4) as u8
}

/// No resampling: the source row is already at output resolution.
pub fn resample_row_1<'a>(
    _out: &'a mut [u8],
    near: &'a [u8],
    _far: &'a [u8],
    _w_lores: usize,
    _hs: usize,
) -> &'a [u8] {
    near
}

/// Two output rows per source row: linear blend weighted 3:1 towards the
/// nearer row.
pub fn resample_row_v2<'a>(
    out: &'a mut [u8],
    near: &'a [u8],
    far: &'a [u8],
    w_lores: usize,
    _hs: usize,
) -> &'a [u8] {
    for i in 0..w_lores {
        out[i] = div4(3 * near[i] as i32 + far[i] as i32 + 2);
    }
    &out[..w_lores]
}

/// Two output samples per input sample, linear with replicated endpoints.
pub fn resample_row_h2<'a>(
    out: &'a mut [u8],
    near: &'a [u8],
    _far: &'a [u8],
    w_lores: usize,
    _hs: usize,
) -> &'a [u8] {
    let input = near;
    if w_lores == 1 {
        // one sample leaves nothing to interpolate
        out[0] = input[0];
        out[1] = input[0];
        return &out[..2];
    }

    out[0] = input[0];
    out[1] = div4(input[0] as i32 * 3 + input[1] as i32 + 2);
    for i in 1..w_lores - 1 {
        let n = 3 * input[i] as i32 + 2;
        out[i * 2] = div4(n + input[i - 1] as i32);
        out[i * 2 + 1] = div4(n + input[i + 1] as i32);
    }
    out[(w_lores - 1) * 2] = div4(input[w_lores - 2] as i32 * 3 + input[w_lores - 1] as i32 + 2);
    out[(w_lores - 1) * 2 + 1] = input[w_lores - 1];
    &out[..w_lores * 2]
}

/// 2x2 upsampling: vertical 3:1 blend per column, then horizontal 3:1
/// blend between neighboring blended columns.
pub fn resample_row_hv2<'a>(
    out: &'a mut [u8],
    near: &'a [u8],
    far: &'a [u8],
    w_lores: usize,
    _hs: usize,
) -> &'a [u8] {
    if w_lores == 1 {
        let v = div4(3 * near[0] as i32 + far[0] as i32 + 2);
        out[0] = v;
        out[1] = v;
        return &out[..2];
    }

    let mut t1 = 3 * near[0] as i32 + far[0] as i32;
    out[0] = div4(t1 + 2);
    for i in 1..w_lores {
        let t0 = t1;
        t1 = 3 * near[i] as i32 + far[i] as i32;
        out[i * 2 - 1] = div16(3 * t0 + t1 + 8);
        out[i * 2] = div16(3 * t1 + t0 + 8);
    }
    out[w_lores * 2 - 1] = div4(t1 + 2);
    &out[..w_lores * 2]
}

/// Nearest-neighbor fallback for sampling ratios with no dedicated kernel.
pub fn resample_row_generic<'a>(
    out: &'a mut [u8],
    near: &'a [u8],
    _far: &'a [u8],
    w_lores: usize,
    hs: usize,
) -> &'a [u8] {
    for i in 0..w_lores {
        for j in 0..hs {
            out[i * hs + j] = near[i];
        }
    }
    &out[..w_lores * hs]
}
