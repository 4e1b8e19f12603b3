// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::collections::TryReserveError;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Byte stream ended unexpectedly")]
    ShortRead,
    #[error("Expected a marker, found byte {0:#04x}")]
    BadMarker(u8),
    #[error("End of image reached before any scan data")]
    NoScanData,
    #[error("Segment {marker:#04x} has invalid length {length}")]
    BadSegmentLength { marker: u8, length: u16 },
    #[error("Unsupported sample precision: {0} bits")]
    UnsupportedPrecision(u8),
    #[error("Unsupported component count: {0}")]
    UnsupportedComponentCount(u8),
    #[error("Unsupported coding process (marker {0:#04x})")]
    UnsupportedCodingProcess(u8),
    #[error("Invalid image dimensions: {0}x{1}")]
    InvalidDimensions(usize, usize),
    #[error("Image too large: {0} samples")]
    ImageTooLarge(u64),
    #[error("Invalid sampling factors {0:#04x} for component {1}")]
    InvalidSamplingFactor(u8, u8),
    #[error("Invalid table id or class: {0}")]
    InvalidTableId(u8),
    #[error("Invalid quantization table precision: {0}")]
    InvalidQuantPrecision(u8),
    #[error("Invalid Huffman code lengths")]
    BadHuffman,
    #[error("Invalid code in progressive scan")]
    BadProgressiveCode,
    #[error("Malformed scan header: {0}")]
    BadScanHeader(&'static str),
    #[error("Scan references component id {0} absent from the frame header")]
    UnknownScanComponent(u8),
    #[error("Huffman table {0} referenced before definition")]
    MissingHuffmanTable(u8),
    #[error("DNL line count {dnl} does not match frame height {frame}")]
    DnlMismatch { dnl: u16, frame: usize },
    #[error("Overflow when computing a buffer size")]
    SizeOverflow,
    #[error("Out of memory: {0}")]
    OutOfMemory(#[from] TryReserveError),
    #[error("Requested output channel count {0} is not 1 or 3")]
    InvalidOutputChannels(usize),
    #[error("Output buffer or stride too small for {width}x{height}x{channels}")]
    OutputBufferTooSmall {
        width: usize,
        height: usize,
        channels: usize,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
