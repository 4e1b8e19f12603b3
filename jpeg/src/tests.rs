// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! End-to-end decode tests over synthesized JPEG streams.


use test_log::test;

use crate::decoder::{DecodeOptions, JpegDecoder};
use crate::error::Error;
use crate::tests::builder::{BitWriter, JpegBuilder, TestTable};

const IDENTITY_QUANT: [u16; 64] = [1; 64];

/// Sample value an 8x8 block decodes to when its only coefficient is a DC
/// term `dc` (quantizer 1): `(dc * 2^14 + 2^16 + 128 * 2^17) >> 17`.
fn dc_to_sample(dc: i32) -> u8 {
    ((dc * 16384 + 65536 + (128 << 17)) >> 17).clamp(0, 255) as u8
}

/// Grayscale baseline stream with one 8x8 block per entry of `dc_diffs`,
/// all in one non-interleaved scan.
fn gray_baseline(width: u16, height: u16, dc_diffs: &[i32]) -> Vec<u8> {
    let dc_table = TestTable::dc_sizes();
    let ac_table = TestTable::ac_common();
    let mut builder = JpegBuilder::new();
    builder.dqt8(0, &IDENTITY_QUANT);
    builder.sof(0xC0, width, height, &[(1, 1, 1, 0)]);
    builder.dht(0, 0, &dc_table);
    builder.dht(1, 0, &ac_table);
    builder.sos(&[(1, 0, 0)], 0, 63, 0, 0);
    let mut writer = BitWriter::new();
    for &diff in dc_diffs {
        dc_table.emit_dc_diff(&mut writer, diff);
        ac_table.emit(&mut writer, 0x00); // EOB
    }
    builder.entropy(writer);
    builder.eoi()
}

#[test]
fn one_pixel_grayscale() {
    let data = gray_baseline(1, 1, &[0]);
    let mut decoder = JpegDecoder::new(&data);
    decoder.read_header().unwrap();
    assert_eq!(decoder.width(), 1);
    assert_eq!(decoder.height(), 1);
    assert_eq!(decoder.num_components(), 1);
    assert_eq!(decoder.output_channels(), 1);
    let mut image = [0u8; 1];
    decoder.decode_data(1, &mut image).unwrap();
    assert_eq!(image[0], 128);
}

#[test]
fn dc_only_block() {
    let data = gray_baseline(8, 8, &[8]);
    let mut decoder = JpegDecoder::new(&data);
    let mut image = [0u8; 64];
    decoder.decode_data(8, &mut image).unwrap();
    assert_eq!(dc_to_sample(8), 129);
    assert!(image.iter().all(|&sample| sample == 129));
}

#[test]
fn ycbcr_420_neutral_gray() {
    let dc_table = TestTable::dc_sizes();
    let ac_table = TestTable::ac_common();
    let mut builder = JpegBuilder::new();
    builder.dqt8(0, &IDENTITY_QUANT);
    builder.dqt8(1, &IDENTITY_QUANT);
    builder.sof(0xC0, 16, 16, &[(1, 2, 2, 0), (2, 1, 1, 1), (3, 1, 1, 1)]);
    builder.dht(0, 0, &dc_table);
    builder.dht(1, 0, &ac_table);
    builder.sos(&[(1, 0, 0), (2, 0, 0), (3, 0, 0)], 0, 63, 0, 0);
    // one 16x16 MCU: four Y blocks, one Cb, one Cr, all DC 0
    let mut writer = BitWriter::new();
    for _ in 0..6 {
        dc_table.emit_dc_diff(&mut writer, 0);
        ac_table.emit(&mut writer, 0x00);
    }
    builder.entropy(writer);
    let data = builder.eoi();

    let mut decoder = JpegDecoder::new(&data);
    decoder.read_header().unwrap();
    assert_eq!(decoder.output_channels(), 3);
    let mut image = [0u8; 16 * 16 * 3];
    decoder.decode_data(16 * 3, &mut image).unwrap();
    assert!(image.iter().all(|&sample| sample == 128));
}

#[test]
fn output_footprint_respects_stride() {
    let data = gray_baseline(8, 8, &[8]);
    let mut decoder = JpegDecoder::new(&data);
    let stride = 13;
    let mut image = vec![0xAAu8; stride * 7 + 8];
    decoder.decode_data(stride, &mut image).unwrap();
    for row in 0..8 {
        let line = &image[stride * row..];
        assert!(line[..8].iter().all(|&sample| sample == 129));
        if row < 7 {
            assert!(line[8..stride].iter().all(|&sample| sample == 0xAA));
        }
    }
}

#[test]
fn random_dc_mosaic_decodes_exactly() {
    use rand::{Rng, SeedableRng};
    use rand_xorshift::XorShiftRng;

    // 48x32: a 6x4 grid of DC-only blocks with a fixed seed, so every
    // block's flat value is known in closed form
    let mut rng = XorShiftRng::seed_from_u64(0x6a70_6567);
    let dcs: Vec<i32> = (0..24).map(|_| rng.gen_range(-512..=512)).collect();
    let mut diffs = Vec::with_capacity(dcs.len());
    let mut pred = 0;
    for &dc in &dcs {
        diffs.push(dc - pred);
        pred = dc;
    }
    let data = gray_baseline(48, 32, &diffs);

    let mut decoder = JpegDecoder::new(&data);
    let mut image = [0u8; 48 * 32];
    decoder.decode_data(48, &mut image).unwrap();
    for (block, &dc) in dcs.iter().enumerate() {
        let (bx, by) = (block % 6, block / 6);
        let expected = dc_to_sample(dc);
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(image[(by * 8 + y) * 48 + bx * 8 + x], expected);
            }
        }
    }
}

#[test]
fn progressive_matches_baseline() {
    let dcs: [i32; 16] = [0, 3, -2, 7, 1, 1, 0, -6, 4, 2, -1, 5, 3, -3, 2, 0];
    let mut quant = [1u16; 64];
    quant[0] = 3;
    quant[1] = 2;

    let dc_table = TestTable::dc_sizes();
    let ac_table = TestTable::ac_common();

    // Baseline rendition: the final coefficients in a single scan.
    let mut baseline = JpegBuilder::new();
    baseline.dqt8(0, &quant);
    baseline.sof(0xC0, 32, 32, &[(1, 1, 1, 0)]);
    baseline.dht(0, 0, &dc_table);
    baseline.dht(1, 0, &ac_table);
    baseline.sos(&[(1, 0, 0)], 0, 63, 0, 0);
    let mut writer = BitWriter::new();
    let mut pred = 0i32;
    for (block, &dc) in dcs.iter().enumerate() {
        dc_table.emit_dc_diff(&mut writer, dc - pred);
        pred = dc;
        if block == 0 {
            ac_table.emit_ac(&mut writer, 0, 2); // zigzag 1 = 2
        }
        ac_table.emit(&mut writer, 0x00);
    }
    baseline.entropy(writer);
    let baseline_data = baseline.eoi();

    // Progressive rendition: DC first at Al=1, DC refinement, AC first at
    // Al=1 carrying the same final coefficients.
    let mut progressive = JpegBuilder::new();
    progressive.dqt8(0, &quant);
    progressive.sof(0xC2, 32, 32, &[(1, 1, 1, 0)]);
    progressive.dht(0, 0, &dc_table);
    progressive.dht(1, 0, &ac_table);

    progressive.sos(&[(1, 0, 0)], 0, 0, 0, 1);
    let mut writer = BitWriter::new();
    let mut pred = 0i32;
    for &dc in dcs.iter() {
        let approx = dc >> 1;
        dc_table.emit_dc_diff(&mut writer, approx - pred);
        pred = approx;
    }
    progressive.entropy(writer);

    progressive.sos(&[(1, 0, 0)], 0, 0, 1, 0);
    let mut writer = BitWriter::new();
    for &dc in dcs.iter() {
        writer.put((dc & 1) as u32, 1);
    }
    progressive.entropy(writer);

    progressive.sos(&[(1, 0, 0)], 1, 63, 0, 1);
    let mut writer = BitWriter::new();
    // block 0: coefficient 2 at zigzag 1, sent as 1 at Al=1, then EOB
    ac_table.emit_ac(&mut writer, 0, 1);
    ac_table.emit(&mut writer, 0x00);
    // block 1: EOB run of 14 covers blocks 1..=14
    ac_table.emit(&mut writer, 0x30);
    writer.put(6, 3);
    // block 15: plain EOB
    ac_table.emit(&mut writer, 0x00);
    progressive.entropy(writer);
    let progressive_data = progressive.eoi();

    let mut expected = [0u8; 32 * 32];
    let mut decoder = JpegDecoder::new(&baseline_data);
    decoder.decode_data(32, &mut expected).unwrap();

    let mut got = [0u8; 32 * 32];
    let mut decoder = JpegDecoder::new(&progressive_data);
    decoder.read_header().unwrap();
    decoder.decode_data(32, &mut got).unwrap();

    assert_eq!(expected, got);
    // sanity: the DC staircase actually varies
    assert!(expected.iter().any(|&sample| sample != expected[0]));
}

#[test]
fn restart_interval_recovers_after_corruption() {
    let dc_table = TestTable::dc_sizes();
    let ac_table = TestTable::ac_common();
    let mut builder = JpegBuilder::new();
    builder.dqt8(0, &IDENTITY_QUANT);
    builder.sof(0xC0, 48, 8, &[(1, 1, 1, 0)]);
    builder.dht(0, 0, &dc_table);
    builder.dht(1, 0, &ac_table);
    builder.dri(2);
    builder.sos(&[(1, 0, 0)], 0, 63, 0, 0);

    // six 8x8 MCUs, restart every two; the DC mantissa of MCU 2 carries an
    // injected bit error (12 instead of 8) that stays bit-aligned
    let intervals: [[i32; 2]; 3] = [[8, 8], [12, 8], [8, 8]];
    for (index, diffs) in intervals.iter().enumerate() {
        let mut writer = BitWriter::new();
        for &diff in diffs {
            dc_table.emit_dc_diff(&mut writer, diff);
            ac_table.emit(&mut writer, 0x00);
        }
        builder.entropy(writer);
        if index < 2 {
            builder.rst(index as u8);
        }
    }
    let data = builder.eoi();

    let mut decoder = JpegDecoder::new(&data);
    let mut image = [0u8; 48 * 8];
    decoder.decode_data(48, &mut image).unwrap();

    // blocks before the corruption and after the next restart are exact
    let expected = [dc_to_sample(8), dc_to_sample(16)];
    for row in 0..8 {
        let line = &image[48 * row..48 * (row + 1)];
        for good in [0usize, 1, 4, 5] {
            let value = expected[good % 2];
            assert!(line[good * 8..good * 8 + 8].iter().all(|&s| s == value));
        }
    }
}

#[test]
fn cmyk_adobe_transform_zero() {
    let dc_table = TestTable::dc_sizes();
    let ac_table = TestTable::ac_common();
    let mut builder = JpegBuilder::new();
    builder.app14_adobe(0);
    builder.dqt8(0, &IDENTITY_QUANT);
    builder.sof(
        0xC0,
        8,
        8,
        &[(1, 1, 1, 0), (2, 1, 1, 0), (3, 1, 1, 0), (4, 1, 1, 0)],
    );
    builder.dht(0, 0, &dc_table);
    builder.dht(1, 0, &ac_table);
    builder.sos(&[(1, 0, 0), (2, 0, 0), (3, 0, 0), (4, 0, 0)], 0, 63, 0, 0);
    // all four planes saturate to 255 (inverted CMYK: no ink, full key)
    let mut writer = BitWriter::new();
    for _ in 0..4 {
        dc_table.emit_dc_diff(&mut writer, 1016);
        ac_table.emit(&mut writer, 0x00);
    }
    builder.entropy(writer);
    let data = builder.eoi();

    let mut decoder = JpegDecoder::new(&data);
    decoder.read_header().unwrap();
    assert_eq!(decoder.num_components(), 4);
    assert_eq!(decoder.output_channels(), 3);
    let mut image = [0u8; 8 * 8 * 3];
    decoder.decode_data(8 * 3, &mut image).unwrap();
    assert_eq!(dc_to_sample(1016), 255);
    assert!(image.iter().all(|&sample| sample == 255));
}

#[test]
fn rgb_tagged_components_pass_through_as_bgr() {
    let dc_table = TestTable::dc_sizes();
    let ac_table = TestTable::ac_common();
    let mut builder = JpegBuilder::new();
    builder.dqt8(0, &IDENTITY_QUANT);
    builder.sof(0xC0, 8, 8, &[(b'R', 1, 1, 0), (b'G', 1, 1, 0), (b'B', 1, 1, 0)]);
    builder.dht(0, 0, &dc_table);
    builder.dht(1, 0, &ac_table);
    builder.sos(&[(b'R', 0, 0), (b'G', 0, 0), (b'B', 0, 0)], 0, 63, 0, 0);
    // R = 200, G = 100, B = 50
    let mut writer = BitWriter::new();
    for &dc in &[576i32, -224, -624] {
        dc_table.emit_dc_diff(&mut writer, dc);
        ac_table.emit(&mut writer, 0x00);
    }
    builder.entropy(writer);
    let data = builder.eoi();

    let mut decoder = JpegDecoder::new(&data);
    let mut image = [0u8; 8 * 8 * 3];
    decoder.decode_data(8 * 3, &mut image).unwrap();
    for pixel in image.chunks_exact(3) {
        assert_eq!(pixel, &[50, 100, 200]);
    }
}

#[test]
fn grayscale_output_from_color_source() {
    let dc_table = TestTable::dc_sizes();
    let ac_table = TestTable::ac_common();
    let mut builder = JpegBuilder::new();
    builder.dqt8(0, &IDENTITY_QUANT);
    builder.sof(0xC0, 16, 16, &[(1, 2, 2, 0), (2, 1, 1, 0), (3, 1, 1, 0)]);
    builder.dht(0, 0, &dc_table);
    builder.dht(1, 0, &ac_table);
    builder.sos(&[(1, 0, 0), (2, 0, 0), (3, 0, 0)], 0, 63, 0, 0);
    let mut writer = BitWriter::new();
    for _ in 0..6 {
        dc_table.emit_dc_diff(&mut writer, 0);
        ac_table.emit(&mut writer, 0x00);
    }
    builder.entropy(writer);
    let data = builder.eoi();

    let options = DecodeOptions {
        output_channels: Some(1),
        ..DecodeOptions::default()
    };
    let mut decoder = JpegDecoder::with_options(&data, options);
    decoder.read_header().unwrap();
    assert_eq!(decoder.output_channels(), 1);
    let mut image = [0u8; 16 * 16];
    decoder.decode_data(16, &mut image).unwrap();
    assert!(image.iter().all(|&sample| sample == 128));
}

#[test]
fn grayscale_source_to_three_channels() {
    let data = gray_baseline(8, 8, &[8]);
    let options = DecodeOptions {
        output_channels: Some(3),
        ..DecodeOptions::default()
    };
    let mut decoder = JpegDecoder::with_options(&data, options);
    let mut image = [0u8; 8 * 8 * 3];
    decoder.decode_data(8 * 3, &mut image).unwrap();
    assert!(image.iter().all(|&sample| sample == 129));
}

#[test]
fn truncated_stream_is_short_read() {
    let data = gray_baseline(8, 8, &[8]);
    let mut decoder = JpegDecoder::new(&data[..20]);
    assert!(matches!(decoder.read_header(), Err(Error::ShortRead)));
}

#[test]
fn output_buffer_too_small_is_rejected() {
    let data = gray_baseline(8, 8, &[8]);
    let mut decoder = JpegDecoder::new(&data);
    let mut image = [0u8; 32];
    assert!(matches!(
        decoder.decode_data(8, &mut image),
        Err(Error::OutputBufferTooSmall { .. })
    ));
}

#[test]
fn invalid_output_channel_request_is_rejected() {
    let data = gray_baseline(8, 8, &[8]);
    let options = DecodeOptions {
        output_channels: Some(2),
        ..DecodeOptions::default()
    };
    let mut decoder = JpegDecoder::with_options(&data, options);
    let mut image = [0u8; 8 * 8 * 2];
    assert!(matches!(
        decoder.decode_data(16, &mut image),
        Err(Error::InvalidOutputChannels(2))
    ));
}

#[test]
fn image_size_limit_is_enforced() {
    let mut builder = JpegBuilder::new();
    builder.dqt8(0, &IDENTITY_QUANT);
    builder.sof(0xC0, 4096, 4096, &[(1, 1, 1, 0)]);
    let data = builder.eoi();
    let options = DecodeOptions {
        max_image_size: 1 << 20,
        ..DecodeOptions::default()
    };
    let mut decoder = JpegDecoder::with_options(&data, options);
    assert!(matches!(
        decoder.read_header(),
        Err(Error::ImageTooLarge(_))
    ));
}

#[test]
fn progressive_ac_scan_in_interleaved_order_is_rejected() {
    let dc_table = TestTable::dc_sizes();
    let ac_table = TestTable::ac_common();
    let mut builder = JpegBuilder::new();
    builder.dqt8(0, &IDENTITY_QUANT);
    builder.sof(0xC2, 16, 16, &[(1, 1, 1, 0), (2, 1, 1, 0), (3, 1, 1, 0)]);
    builder.dht(0, 0, &dc_table);
    builder.dht(1, 0, &ac_table);
    // an interleaved scan whose band is not DC-only is corrupt
    builder.sos(&[(1, 0, 0), (2, 0, 0), (3, 0, 0)], 0, 5, 0, 0);
    let mut writer = BitWriter::new();
    writer.put(0, 8);
    builder.entropy(writer);
    let data = builder.eoi();

    let mut decoder = JpegDecoder::new(&data);
    decoder.read_header().unwrap();
    let mut image = [0u8; 16 * 16 * 3];
    assert!(matches!(
        decoder.decode_data(16 * 3, &mut image),
        Err(Error::BadProgressiveCode)
    ));
}
