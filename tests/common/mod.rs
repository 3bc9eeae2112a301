//! Shared helpers for tests that need the native library.
//!
//! Tests call [`magick`] first and return early when MagickWand cannot be
//! loaded, so the suite passes on machines without ImageMagick. Set
//! `ZENMAGICK_REQUIRE_NATIVE=1` to fail instead of skipping.

#![allow(dead_code)]

use std::sync::Once;

use tracing_subscriber::EnvFilter;
use zenmagick::{Magick, MagickError};

/// Set to `1` (or `true`) to turn a missing library into a test failure.
pub const REQUIRE_NATIVE_ENV: &str = "ZENMAGICK_REQUIRE_NATIVE";

pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// The shared library instance, or `None` (with a note) when unavailable.
pub fn magick() -> Option<&'static Magick> {
    init_tracing();
    match Magick::global() {
        Ok(magick) => Some(magick),
        Err(e) => {
            unavailable(&e);
            None
        }
    }
}

/// Whether [`REQUIRE_NATIVE_ENV`] asks for the native library.
pub fn native_required() -> bool {
    std::env::var(REQUIRE_NATIVE_ENV)
        .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Report a missing library: panic when it is required, otherwise note the
/// skip.
pub fn unavailable(err: &MagickError) {
    if native_required() {
        panic!("MagickWand required by {REQUIRE_NATIVE_ENV} but unavailable: {err}");
    }
    eprintln!("skipping: MagickWand unavailable: {err}");
}

/// Encode `data` as a PNG with the `png` crate. 16-bit samples are big-endian.
pub fn png(
    width: u32,
    height: u32,
    color: png::ColorType,
    depth: png::BitDepth,
    data: &[u8],
) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(color);
        encoder.set_depth(depth);
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(data).unwrap();
        writer.finish().unwrap();
    }
    out
}

/// `width × height` 8-bit PNG filled with a per-pixel gradient of `channels`
/// samples.
pub fn png8(width: u32, height: u32, color: png::ColorType, channels: usize) -> Vec<u8> {
    let data: Vec<u8> = (0..(width * height) as usize * channels)
        .map(|i| (i * 37 % 251) as u8)
        .collect();
    png(width, height, color, png::BitDepth::Eight, &data)
}

/// `width × height` 16-bit PNG whose samples use distinct high and low bytes.
pub fn png16(width: u32, height: u32, color: png::ColorType, channels: usize) -> Vec<u8> {
    let data: Vec<u8> = (0..(width * height) as usize * channels)
        .flat_map(|i| (0x1234u16.wrapping_add((i * 4099) as u16)).to_be_bytes())
        .collect();
    png(width, height, color, png::BitDepth::Sixteen, &data)
}

/// Smallest valid GIF: one transparent pixel.
pub const GIF_1X1: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0xff, 0xff,
    0xff, 0x00, 0x00, 0x00, 0x21, 0xf9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x2c, 0x00, 0x00,
    0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x44, 0x01, 0x00, 0x3b,
];

/// Bytes no decoder accepts.
pub const GARBAGE: &[u8] = b"\x00\x01\x02\x03 definitely not an image \xfe\xff";

/// Palette of [`gif`]: red, green, blue, white.
pub const GIF_PALETTE: [[u8; 3]; 4] = [[255, 0, 0], [0, 255, 0], [0, 0, 255], [255, 255, 255]];

/// One frame of [`gif`]: placement and palette indices.
pub struct GifFrame {
    pub left: u16,
    pub top: u16,
    pub width: u16,
    pub height: u16,
    pub indices: Vec<u8>,
}

/// Multi-frame GIF over [`GIF_PALETTE`] on a `width × height` screen.
///
/// Pixel data uses 3-bit LZW codes with a clear code before every pair of
/// literals, so the code width never grows.
pub fn gif(width: u16, height: u16, frames: &[GifFrame]) -> Vec<u8> {
    let mut out = b"GIF89a".to_vec();
    out.extend_from_slice(&width.to_le_bytes());
    out.extend_from_slice(&height.to_le_bytes());
    // Global table of 4 entries, 8-bit color resolution.
    out.extend_from_slice(&[0xf1, 0, 0]);
    for rgb in GIF_PALETTE {
        out.extend_from_slice(&rgb);
    }
    for frame in frames {
        assert_eq!(frame.indices.len(), frame.width as usize * frame.height as usize);
        out.push(0x2c);
        for v in [frame.left, frame.top, frame.width, frame.height] {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out.push(0);
        out.push(2);
        for block in lzw_literals(&frame.indices).chunks(255) {
            out.push(block.len() as u8);
            out.extend_from_slice(block);
        }
        out.push(0);
    }
    out.push(0x3b);
    out
}

fn lzw_literals(indices: &[u8]) -> Vec<u8> {
    const CLEAR: u32 = 4;
    const END: u32 = 5;
    let mut codes = Vec::new();
    for pair in indices.chunks(2) {
        codes.push(CLEAR);
        codes.extend(pair.iter().map(|&i| u32::from(i)));
    }
    codes.push(END);

    let mut bytes = Vec::new();
    let (mut acc, mut bits) = (0u32, 0u32);
    for code in codes {
        acc |= code << bits;
        bits += 3;
        while bits >= 8 {
            bytes.push(acc as u8);
            acc >>= 8;
            bits -= 8;
        }
    }
    if bits > 0 {
        bytes.push(acc as u8);
    }
    bytes
}

/// Two frames: a 4×3 red frame, then a 2×1 blue frame at (1, 1).
pub fn two_frame_gif() -> Vec<u8> {
    gif(
        4,
        3,
        &[
            GifFrame {
                left: 0,
                top: 0,
                width: 4,
                height: 3,
                indices: vec![0; 12],
            },
            GifFrame {
                left: 1,
                top: 1,
                width: 2,
                height: 1,
                indices: vec![2; 2],
            },
        ],
    )
}
