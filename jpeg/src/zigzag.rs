// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! The zigzag coefficient ordering of ITU T.81 Figure 5.

/// Maps a position in the zigzag stream to its row-major position in the
/// 8x8 block. The 15 trailing entries clamp to the last coefficient so that
/// run lengths from corrupt streams index past 63 without leaving the block.
#[rustfmt::skip]
pub const DEZIGZAG: [u8; 64 + 15] = [
     0,  1,  8, 16,  9,  2,  3, 10,
    17, 24, 32, 25, 18, 11,  4,  5,
    12, 19, 26, 33, 40, 48, 41, 34,
    27, 20, 13,  6,  7, 14, 21, 28,
    35, 42, 49, 56, 57, 50, 43, 36,
    29, 22, 15, 23, 30, 37, 44, 51,
    58, 59, 52, 45, 38, 31, 39, 46,
    53, 60, 61, 54, 47, 55, 62, 63,
    63, 63, 63, 63, 63, 63, 63, 63,
    63, 63, 63, 63, 63, 63, 63,
];
