// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Progressive finalization and the resample + color-convert output pass.

use crate::color::{blinn8x8, luma_from_rgb};
use crate::component::MAX_COMPONENTS;
use crate::decoder::JpegDecoder;
use crate::error::Result;
use crate::kernels::ResampleRowFn;
use crate::upsample::{
    resample_row_1, resample_row_generic, resample_row_h2, resample_row_v2,
};
use crate::util::tracing_wrappers::*;

/// Vertical position and kernel choice for one component while walking
/// output rows. `line0`/`line1` are byte offsets of the two source rows the
/// kernel blends; they trail the output row by the sampling ratio.
struct SampleState {
    hs: usize,
    vs: usize,
    w_lores: usize,
    ystep: usize,
    ypos: usize,
    line0: usize,
    line1: usize,
    kernel: ResampleRowFn,
    line_buffer: Vec<u8>,
}

impl JpegDecoder<'_> {
    /// Progressive streams keep raw coefficients until every scan has been
    /// seen; dequantize and transform them into samples now.
    pub(crate) fn finish_progressive(&mut self) {
        let kernels = self.kernels;
        for index in 0..self.frame.components {
            let quant = self.quant[self.components[index].quant_id];
            let component = &mut self.components[index];
            let blocks_x = (component.x + 7) >> 3;
            let blocks_y = (component.y + 7) >> 3;
            let coeff_w = component.coeff_w;
            let w2 = component.w2;
            let coeff = component.coeff.as_mut_slice();
            let plane = component.plane.as_mut_slice();
            for by in 0..blocks_y {
                for bx in 0..blocks_x {
                    let offset = 64 * (bx + by * coeff_w);
                    let block = &mut coeff[offset..offset + 64];
                    for (value, q) in block.iter_mut().zip(quant.iter()) {
                        *value = value.wrapping_mul(*q as i16);
                    }
                    (kernels.idct_block)(&mut plane[w2 * by * 8 + bx * 8..], w2, block);
                }
            }
        }
    }

    /// Upsamples each decoded component to full resolution row by row and
    /// converts into the caller's buffer.
    pub(crate) fn render_output(&mut self, stride: usize, image: &mut [u8]) -> Result<()> {
        let channels = self.output_channels();
        let ncomp = self.frame.components;
        let width = self.frame.width;
        let height = self.frame.height;
        let transform = self.frame.app14_color_transform;
        let is_rgb = ncomp == 3
            && (self.frame.rgb_tag_count == 3 || (transform == 0 && !self.frame.jfif));
        // a grayscale request from a YCbCr source only needs the Y plane
        let decode_n = if ncomp == 3 && channels < 3 && !is_rgb {
            1
        } else {
            ncomp
        };
        let kernels = self.kernels;
        debug!(channels, decode_n, is_rgb, "rendering output");

        let mut states = Vec::with_capacity(decode_n);
        for index in 0..decode_n {
            let component = &self.components[index];
            let hs = self.frame.h_max / component.hsampling;
            let vs = self.frame.v_max / component.vsampling;
            // big enough to upsample off the right edge at any ratio
            let mut line_buffer = Vec::new();
            line_buffer.try_reserve_exact(width + 3)?;
            line_buffer.resize(width + 3, 0);
            states.push(SampleState {
                hs,
                vs,
                w_lores: width.div_ceil(hs),
                ystep: vs >> 1,
                ypos: 0,
                line0: 0,
                line1: 0,
                kernel: match (hs, vs) {
                    (1, 1) => resample_row_1,
                    (1, 2) => resample_row_v2,
                    (2, 1) => resample_row_h2,
                    (2, 2) => kernels.resample_h2v2,
                    _ => resample_row_generic,
                },
                line_buffer,
            });
        }

        for row in 0..height {
            let out = &mut image[stride * row..stride * row + width * channels];
            let mut rows: [&[u8]; MAX_COMPONENTS] = [&[]; MAX_COMPONENTS];
            for (index, state) in states.iter_mut().enumerate() {
                let component = &self.components[index];
                let plane = component.plane.as_slice();
                let y_bot = state.ystep >= (state.vs >> 1);
                let (near, far) = if y_bot {
                    (state.line1, state.line0)
                } else {
                    (state.line0, state.line1)
                };
                let kernel = state.kernel;
                rows[index] = kernel(
                    &mut state.line_buffer,
                    &plane[near..near + component.w2],
                    &plane[far..far + component.w2],
                    state.w_lores,
                    state.hs,
                );
                state.ystep += 1;
                if state.ystep >= state.vs {
                    state.ystep = 0;
                    state.line0 = state.line1;
                    state.ypos += 1;
                    if state.ypos < component.y {
                        state.line1 += component.w2;
                    }
                }
            }

            if channels == 3 {
                let y = rows[0];
                if ncomp == 3 {
                    if is_rgb {
                        for i in 0..width {
                            out[i * 3] = rows[2][i];
                            out[i * 3 + 1] = rows[1][i];
                            out[i * 3 + 2] = y[i];
                        }
                    } else {
                        (kernels.ycbcr_to_bgr)(out, y, rows[1], rows[2], width, channels);
                    }
                } else if ncomp == 4 {
                    if transform == 0 {
                        // CMYK: multiply through the key plane
                        for i in 0..width {
                            let key = rows[3][i];
                            out[i * 3] = blinn8x8(rows[0][i], key);
                            out[i * 3 + 1] = blinn8x8(rows[1][i], key);
                            out[i * 3 + 2] = blinn8x8(rows[2][i], key);
                        }
                    } else if transform == 2 {
                        // YCCK: YCbCr to BGR, then invert and key
                        (kernels.ycbcr_to_bgr)(out, y, rows[1], rows[2], width, channels);
                        for i in 0..width {
                            let key = rows[3][i];
                            for c in 0..3 {
                                out[i * 3 + c] = blinn8x8(255 - out[i * 3 + c], key);
                            }
                        }
                    } else {
                        // fourth channel without a transform hint: ignore it
                        (kernels.ycbcr_to_bgr)(out, y, rows[1], rows[2], width, channels);
                    }
                } else {
                    for i in 0..width {
                        let v = y[i];
                        out[i * 3] = v;
                        out[i * 3 + 1] = v;
                        out[i * 3 + 2] = v;
                    }
                }
            } else if is_rgb {
                for i in 0..width {
                    out[i] = luma_from_rgb(rows[0][i], rows[1][i], rows[2][i]);
                }
            } else if ncomp == 4 && transform == 0 {
                for i in 0..width {
                    let key = rows[3][i];
                    out[i] = luma_from_rgb(
                        blinn8x8(rows[0][i], key),
                        blinn8x8(rows[1][i], key),
                        blinn8x8(rows[2][i], key),
                    );
                }
            } else if ncomp == 4 && transform == 2 {
                for i in 0..width {
                    out[i] = blinn8x8(255 - rows[0][i], rows[3][i]);
                }
            } else {
                out[..width].copy_from_slice(&rows[0][..width]);
            }
        }
        Ok(())
    }
}
