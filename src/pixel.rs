//! Pixel buffers exchanged with the native library.
//!
//! [`PixelBuffer`] is the raw, shape-checked form the wand imports and
//! exports: a [`ChannelMap`], a [`StorageKind`] and `width × height × map.len()`
//! words. [`PixelData`] is the typed `imgref` view host code usually wants.

use alloc::vec::Vec;
use core::fmt;

use imgref::ImgVec;
use rgb::{Gray, Rgb, Rgba};

use crate::error::{MagickError, Result};
use crate::storage::{PixelWords, StorageKind};

const MAX_CHANNELS: usize = 5;
const CHANNEL_LETTERS: &[u8] = b"RGBAOCYMKIP";

/// Channel order of a pixel, as the native map string (`"RGB"`, `"I"`, ...).
///
/// Letters: `R`ed, `G`reen, `B`lue, `A`lpha, `O`pacity, `C`yan, `Y`ellow,
/// `M`agenta, blac`K`, `I`ntensity and `P`ad. The length of the map is the
/// number of words per pixel.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelMap {
    letters: [u8; MAX_CHANNELS],
    len: u8,
}

impl ChannelMap {
    /// Single intensity channel.
    pub const GRAY: ChannelMap = ChannelMap::known(b"I");
    pub const RGB: ChannelMap = ChannelMap::known(b"RGB");
    /// Alpha first, as the native library exports it for decode.
    pub const ARGB: ChannelMap = ChannelMap::known(b"ARGB");
    pub const RGBA: ChannelMap = ChannelMap::known(b"RGBA");
    pub const BGR: ChannelMap = ChannelMap::known(b"BGR");
    pub const ABGR: ChannelMap = ChannelMap::known(b"ABGR");

    const fn known(map: &[u8]) -> Self {
        let mut letters = [0u8; MAX_CHANNELS];
        let mut i = 0;
        while i < map.len() {
            letters[i] = map[i];
            i += 1;
        }
        Self {
            letters,
            len: map.len() as u8,
        }
    }

    /// Parse a map string. Letters are case-insensitive.
    pub fn new(map: &str) -> Result<Self> {
        if map.is_empty() || map.len() > MAX_CHANNELS {
            return Err(MagickError::InvalidInput(format!(
                "channel map {map:?} must have 1 to {MAX_CHANNELS} channels"
            )));
        }
        let mut letters = [0u8; MAX_CHANNELS];
        for (slot, c) in letters.iter_mut().zip(map.bytes()) {
            let c = c.to_ascii_uppercase();
            if !CHANNEL_LETTERS.contains(&c) {
                return Err(MagickError::InvalidInput(format!(
                    "unknown channel {:?} in map {map:?}",
                    c as char
                )));
            }
            *slot = c;
        }
        Ok(Self {
            letters,
            len: map.len() as u8,
        })
    }

    /// Words per pixel.
    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_str(&self) -> &str {
        // Letters are validated ASCII.
        core::str::from_utf8(&self.letters[..self.len()]).unwrap_or_default()
    }

    /// Whether the map carries alpha or opacity.
    pub fn has_alpha(&self) -> bool {
        self.as_str().contains(['A', 'O'])
    }
}

impl fmt::Debug for ChannelMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChannelMap({:?})", self.as_str())
    }
}

impl fmt::Display for ChannelMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw pixel words with their shape.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    map: ChannelMap,
    words: PixelWords,
}

impl PixelBuffer {
    /// Wrap `words`, checking that there are exactly
    /// `width × height × map.len()` of them.
    pub fn new(
        width: usize,
        height: usize,
        map: ChannelMap,
        words: impl Into<PixelWords>,
    ) -> Result<Self> {
        let words = words.into();
        let expected = word_count(width, height, map)?;
        if words.len() != expected {
            return Err(MagickError::InvalidInput(format!(
                "{width}x{height} {map} needs {expected} words, got {}",
                words.len()
            )));
        }
        Ok(Self {
            width,
            height,
            map,
            words,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn map(&self) -> ChannelMap {
        self.map
    }

    pub fn storage(&self) -> StorageKind {
        self.words.kind()
    }

    pub fn words_per_pixel(&self) -> usize {
        self.map.len()
    }

    pub fn words(&self) -> &PixelWords {
        &self.words
    }

    pub fn into_words(self) -> PixelWords {
        self.words
    }

    /// Native-endian bytes, `word count × storage size` long.
    pub fn as_bytes(&self) -> &[u8] {
        self.words.as_bytes()
    }
}

/// `width × height × map.len()`, or `InvalidInput` on overflow.
pub(crate) fn word_count(width: usize, height: usize, map: ChannelMap) -> Result<usize> {
    width
        .checked_mul(height)
        .and_then(|px| px.checked_mul(map.len()))
        .ok_or_else(|| {
            MagickError::InvalidInput(format!("{width}x{height} {map} overflows usize"))
        })
}

/// Decoded pixels in a typed buffer.
///
/// ARGB exports from the native library are re-ordered into [`Rgba`].
#[non_exhaustive]
pub enum PixelData {
    Gray8(ImgVec<Gray<u8>>),
    Rgb8(ImgVec<Rgb<u8>>),
    Rgba8(ImgVec<Rgba<u8>>),
    Gray16(ImgVec<Gray<u16>>),
    Rgb16(ImgVec<Rgb<u16>>),
    Rgba16(ImgVec<Rgba<u16>>),
}

impl PixelData {
    /// Type a raw buffer. Supports 8- and 16-bit words with the `I`, `RGB`,
    /// `RGBA` and `ARGB` maps.
    pub fn from_buffer(buffer: PixelBuffer) -> Result<Self> {
        let (w, h, map) = (buffer.width, buffer.height, buffer.map);
        let data = match (buffer.words, map) {
            (PixelWords::U8(v), ChannelMap::GRAY) => PixelData::Gray8(ImgVec::new(
                v.into_iter().map(Gray).collect(),
                w,
                h,
            )),
            (PixelWords::U8(v), ChannelMap::RGB) => PixelData::Rgb8(ImgVec::new(
                v.chunks_exact(3).map(|c| Rgb::new(c[0], c[1], c[2])).collect(),
                w,
                h,
            )),
            (PixelWords::U8(v), ChannelMap::RGBA) => PixelData::Rgba8(ImgVec::new(
                v.chunks_exact(4)
                    .map(|c| Rgba::new(c[0], c[1], c[2], c[3]))
                    .collect(),
                w,
                h,
            )),
            (PixelWords::U8(v), ChannelMap::ARGB) => PixelData::Rgba8(ImgVec::new(
                v.chunks_exact(4)
                    .map(|c| Rgba::new(c[1], c[2], c[3], c[0]))
                    .collect(),
                w,
                h,
            )),
            (PixelWords::U16(v), ChannelMap::GRAY) => PixelData::Gray16(ImgVec::new(
                v.into_iter().map(Gray).collect(),
                w,
                h,
            )),
            (PixelWords::U16(v), ChannelMap::RGB) => PixelData::Rgb16(ImgVec::new(
                v.chunks_exact(3).map(|c| Rgb::new(c[0], c[1], c[2])).collect(),
                w,
                h,
            )),
            (PixelWords::U16(v), ChannelMap::RGBA) => PixelData::Rgba16(ImgVec::new(
                v.chunks_exact(4)
                    .map(|c| Rgba::new(c[0], c[1], c[2], c[3]))
                    .collect(),
                w,
                h,
            )),
            (PixelWords::U16(v), ChannelMap::ARGB) => PixelData::Rgba16(ImgVec::new(
                v.chunks_exact(4)
                    .map(|c| Rgba::new(c[1], c[2], c[3], c[0]))
                    .collect(),
                w,
                h,
            )),
            (words, map) => {
                return Err(MagickError::InvalidInput(format!(
                    "no typed layout for {:?} words with map {map}",
                    words.kind()
                )));
            }
        };
        Ok(data)
    }

    /// Flatten into a raw buffer (`I`, `RGB` or `RGBA` map), ready for import.
    pub fn to_buffer(&self) -> PixelBuffer {
        let (map, words): (ChannelMap, PixelWords) = match self {
            PixelData::Gray8(img) => (
                ChannelMap::GRAY,
                img.rows().flatten().map(|p| p.value()).collect::<Vec<u8>>().into(),
            ),
            PixelData::Rgb8(img) => (
                ChannelMap::RGB,
                img.rows()
                    .flatten()
                    .flat_map(|p| [p.r, p.g, p.b])
                    .collect::<Vec<u8>>()
                    .into(),
            ),
            PixelData::Rgba8(img) => (
                ChannelMap::RGBA,
                img.rows()
                    .flatten()
                    .flat_map(|p| [p.r, p.g, p.b, p.a])
                    .collect::<Vec<u8>>()
                    .into(),
            ),
            PixelData::Gray16(img) => (
                ChannelMap::GRAY,
                img.rows().flatten().map(|p| p.value()).collect::<Vec<u16>>().into(),
            ),
            PixelData::Rgb16(img) => (
                ChannelMap::RGB,
                img.rows()
                    .flatten()
                    .flat_map(|p| [p.r, p.g, p.b])
                    .collect::<Vec<u16>>()
                    .into(),
            ),
            PixelData::Rgba16(img) => (
                ChannelMap::RGBA,
                img.rows()
                    .flatten()
                    .flat_map(|p| [p.r, p.g, p.b, p.a])
                    .collect::<Vec<u16>>()
                    .into(),
            ),
        };
        PixelBuffer {
            width: self.width(),
            height: self.height(),
            map,
            words,
        }
    }

    /// Image width in pixels.
    pub fn width(&self) -> usize {
        match self {
            PixelData::Gray8(img) => img.width(),
            PixelData::Rgb8(img) => img.width(),
            PixelData::Rgba8(img) => img.width(),
            PixelData::Gray16(img) => img.width(),
            PixelData::Rgb16(img) => img.width(),
            PixelData::Rgba16(img) => img.width(),
        }
    }

    /// Image height in pixels.
    pub fn height(&self) -> usize {
        match self {
            PixelData::Gray8(img) => img.height(),
            PixelData::Rgb8(img) => img.height(),
            PixelData::Rgba8(img) => img.height(),
            PixelData::Gray16(img) => img.height(),
            PixelData::Rgb16(img) => img.height(),
            PixelData::Rgba16(img) => img.height(),
        }
    }

    pub fn has_alpha(&self) -> bool {
        matches!(self, PixelData::Rgba8(_) | PixelData::Rgba16(_))
    }

    /// Bits per channel.
    pub fn depth(&self) -> usize {
        match self {
            PixelData::Gray8(_) | PixelData::Rgb8(_) | PixelData::Rgba8(_) => 8,
            PixelData::Gray16(_) | PixelData::Rgb16(_) | PixelData::Rgba16(_) => 16,
        }
    }

    /// Convert to RGBA8, expanding gray and adding opaque alpha.
    /// 16-bit channels keep their high byte.
    pub fn to_rgba8(&self) -> ImgVec<Rgba<u8>> {
        let (w, h) = (self.width(), self.height());
        let px: Vec<Rgba<u8>> = match self {
            PixelData::Gray8(img) => img
                .rows()
                .flatten()
                .map(|p| Rgba::new(p.value(), p.value(), p.value(), 255))
                .collect(),
            PixelData::Rgb8(img) => img
                .rows()
                .flatten()
                .map(|p| Rgba::new(p.r, p.g, p.b, 255))
                .collect(),
            PixelData::Rgba8(img) => img.rows().flatten().copied().collect(),
            PixelData::Gray16(img) => img
                .rows()
                .flatten()
                .map(|p| {
                    let v = (p.value() >> 8) as u8;
                    Rgba::new(v, v, v, 255)
                })
                .collect(),
            PixelData::Rgb16(img) => img
                .rows()
                .flatten()
                .map(|p| Rgba::new((p.r >> 8) as u8, (p.g >> 8) as u8, (p.b >> 8) as u8, 255))
                .collect(),
            PixelData::Rgba16(img) => img
                .rows()
                .flatten()
                .map(|p| {
                    Rgba::new(
                        (p.r >> 8) as u8,
                        (p.g >> 8) as u8,
                        (p.b >> 8) as u8,
                        (p.a >> 8) as u8,
                    )
                })
                .collect(),
        };
        ImgVec::new(px, w, h)
    }

    /// Raw pixel data as native-endian bytes, row-major.
    pub fn as_bytes(&self) -> Vec<u8> {
        use rgb::ComponentBytes;
        match self {
            PixelData::Gray8(img) => {
                let (buf, _, _) = img.as_ref().to_contiguous_buf();
                buf.as_bytes().to_vec()
            }
            PixelData::Rgb8(img) => {
                let (buf, _, _) = img.as_ref().to_contiguous_buf();
                buf.as_bytes().to_vec()
            }
            PixelData::Rgba8(img) => {
                let (buf, _, _) = img.as_ref().to_contiguous_buf();
                buf.as_bytes().to_vec()
            }
            PixelData::Gray16(img) => {
                let (buf, _, _) = img.as_ref().to_contiguous_buf();
                buf.as_bytes().to_vec()
            }
            PixelData::Rgb16(img) => {
                let (buf, _, _) = img.as_ref().to_contiguous_buf();
                buf.as_bytes().to_vec()
            }
            PixelData::Rgba16(img) => {
                let (buf, _, _) = img.as_ref().to_contiguous_buf();
                buf.as_bytes().to_vec()
            }
        }
    }
}

impl fmt::Debug for PixelData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let variant = match self {
            PixelData::Gray8(_) => "Gray8",
            PixelData::Rgb8(_) => "Rgb8",
            PixelData::Rgba8(_) => "Rgba8",
            PixelData::Gray16(_) => "Gray16",
            PixelData::Rgb16(_) => "Rgb16",
            PixelData::Rgba16(_) => "Rgba16",
        };
        write!(
            f,
            "PixelData::{}({}x{})",
            variant,
            self.width(),
            self.height()
        )
    }
}
