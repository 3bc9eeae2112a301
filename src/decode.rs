//! Image decoding.
//!
//! A decoded frame is exported in one of six layouts, chosen from its bit
//! depth, colorspace channel count and alpha flag by [`DecodeLayout::select`].

use tracing::debug;

use crate::error::{MagickError, Result};
use crate::info::ImageDescriptor;
use crate::limits::Limits;
use crate::magick::Magick;
use crate::pixel::{self, ChannelMap, PixelData};
use crate::storage::StorageKind;
use crate::wand::Wand;

/// Export shape of a decoded frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DecodeLayout {
    Gray8,
    Rgb8,
    /// Exported as `ARGB`, delivered as [`Rgba`](rgb::Rgba).
    Argb8,
    Gray16,
    Rgb16,
    Argb16,
}

impl DecodeLayout {
    /// Pick the layout for a frame.
    ///
    /// | depth | channels | alpha | layout |
    /// |-------|----------|-------|--------|
    /// | 8     | 1        | any   | Gray8  |
    /// | 8     | 3, 4     | no    | Rgb8   |
    /// | 8     | 3, 4     | yes   | Argb8  |
    /// | 16    | 1        | any   | Gray16 |
    /// | 16    | 3, 4     | no    | Rgb16  |
    /// | 16    | 3, 4     | yes   | Argb16 |
    pub fn select(depth: usize, channels: u8, alpha: bool) -> Result<Self> {
        let layout = match (depth, channels, alpha) {
            (8, 1, _) => DecodeLayout::Gray8,
            (8, 3 | 4, false) => DecodeLayout::Rgb8,
            (8, 3 | 4, true) => DecodeLayout::Argb8,
            (16, 1, _) => DecodeLayout::Gray16,
            (16, 3 | 4, false) => DecodeLayout::Rgb16,
            (16, 3 | 4, true) => DecodeLayout::Argb16,
            (8 | 16, channels, _) => return Err(MagickError::UnsupportedShape { depth, channels }),
            _ => return Err(MagickError::UnsupportedDepth { depth }),
        };
        Ok(layout)
    }

    /// Word kind of the export.
    pub fn storage(self) -> StorageKind {
        match self {
            DecodeLayout::Gray8 | DecodeLayout::Rgb8 | DecodeLayout::Argb8 => StorageKind::U8,
            DecodeLayout::Gray16 | DecodeLayout::Rgb16 | DecodeLayout::Argb16 => StorageKind::U16,
        }
    }

    /// Channel map of the export.
    pub fn map(self) -> ChannelMap {
        match self {
            DecodeLayout::Gray8 | DecodeLayout::Gray16 => ChannelMap::GRAY,
            DecodeLayout::Rgb8 | DecodeLayout::Rgb16 => ChannelMap::RGB,
            DecodeLayout::Argb8 | DecodeLayout::Argb16 => ChannelMap::ARGB,
        }
    }

    /// Exported buffer size in bytes for a `width × height` frame.
    pub fn byte_len(self, width: usize, height: usize) -> Result<usize> {
        let words = pixel::word_count(width, height, self.map())?;
        self.storage().byte_len(words).ok_or_else(|| {
            MagickError::InvalidInput(format!("{width}x{height} {self:?} overflows usize"))
        })
    }
}

/// Decoded image output.
#[derive(Debug)]
pub struct DecodeOutput {
    /// Decoded pixel data in a typed buffer.
    pub pixels: PixelData,
    /// Metadata of the decoded frame.
    pub info: ImageDescriptor,
    /// Layout the frame was exported in.
    pub layout: DecodeLayout,
}

impl DecodeOutput {
    /// Image width in pixels (convenience accessor).
    pub fn width(&self) -> usize {
        self.pixels.width()
    }

    /// Image height in pixels (convenience accessor).
    pub fn height(&self) -> usize {
        self.pixels.height()
    }
}

/// Image decode request builder.
///
/// # Example
///
/// ```no_run
/// use zenmagick::DecodeRequest;
///
/// let data: &[u8] = &[]; // your image bytes
/// let output = DecodeRequest::new(data).decode()?;
/// println!("{}x{}", output.width(), output.height());
/// # Ok::<(), zenmagick::MagickError>(())
/// ```
pub struct DecodeRequest<'a> {
    data: &'a [u8],
    frame: usize,
    limits: Option<&'a Limits>,
    magick: Option<&'a Magick>,
}

impl<'a> DecodeRequest<'a> {
    /// Create a new decode request for the first frame of `data`.
    ///
    /// The format is detected by the native library.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            frame: 0,
            limits: None,
            magick: None,
        }
    }

    /// Decode frame `index` of a multi-frame blob.
    pub fn with_frame(mut self, index: usize) -> Self {
        self.frame = index;
        self
    }

    /// Set resource limits.
    pub fn with_limits(mut self, limits: &'a Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Use a specific library instance instead of [`Magick::global`].
    pub fn with_magick(mut self, magick: &'a Magick) -> Self {
        self.magick = Some(magick);
        self
    }

    /// Decode the image to pixels.
    pub fn decode(self) -> Result<DecodeOutput> {
        let magick = match self.magick {
            Some(m) => m,
            None => Magick::global()?,
        };
        let mut wand = magick.new_wand()?;
        wand.read_blob(self.data)?;
        decode_frame(&mut wand, self.frame, self.limits)
    }
}

/// Export frame `index` of a loaded wand in its dispatched layout.
pub(crate) fn decode_frame(
    wand: &mut Wand<'_>,
    index: usize,
    limits: Option<&Limits>,
) -> Result<DecodeOutput> {
    let info = wand.describe(index)?;
    let layout = DecodeLayout::select(info.depth, info.colorspace.channel_count(), info.has_alpha)?;
    if let Some(limits) = limits {
        limits.check_dimensions(info.width as u64, info.height as u64)?;
        limits.check_memory(layout.byte_len(info.width, info.height)? as u64)?;
    }
    debug!(
        frame = index,
        width = info.width,
        height = info.height,
        depth = info.depth,
        colorspace = %info.colorspace,
        alpha = info.has_alpha,
        ?layout,
        "decoding frame"
    );
    let buffer = wand.export_pixels(layout.map(), layout.storage())?;
    let pixels = PixelData::from_buffer(buffer)?;
    Ok(DecodeOutput {
        pixels,
        info,
        layout,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_table() {
        let cases = [
            (8, 1, false, DecodeLayout::Gray8),
            (8, 1, true, DecodeLayout::Gray8),
            (8, 3, false, DecodeLayout::Rgb8),
            (8, 4, false, DecodeLayout::Rgb8),
            (8, 3, true, DecodeLayout::Argb8),
            (8, 4, true, DecodeLayout::Argb8),
            (16, 1, false, DecodeLayout::Gray16),
            (16, 3, false, DecodeLayout::Rgb16),
            (16, 4, true, DecodeLayout::Argb16),
        ];
        for (depth, channels, alpha, expected) in cases {
            assert_eq!(
                DecodeLayout::select(depth, channels, alpha).unwrap(),
                expected,
                "depth {depth} channels {channels} alpha {alpha}"
            );
        }
    }

    #[test]
    fn unsupported_depth() {
        for depth in [1, 4, 12, 32] {
            let err = DecodeLayout::select(depth, 3, false).unwrap_err();
            assert!(matches!(err, MagickError::UnsupportedDepth { depth: d } if d == depth));
        }
    }

    #[test]
    fn unsupported_shape() {
        let err = DecodeLayout::select(8, 2, false).unwrap_err();
        assert!(matches!(
            err,
            MagickError::UnsupportedShape {
                depth: 8,
                channels: 2
            }
        ));
        assert!(DecodeLayout::select(16, 5, true).is_err());
    }

    #[test]
    fn layout_storage_and_map() {
        assert_eq!(DecodeLayout::Argb16.storage(), StorageKind::U16);
        assert_eq!(DecodeLayout::Argb16.map(), ChannelMap::ARGB);
        assert_eq!(DecodeLayout::Gray8.map(), ChannelMap::GRAY);
        assert_eq!(DecodeLayout::Rgb8.storage(), StorageKind::U8);
    }

    #[test]
    fn byte_len_is_width_height_channels_size() {
        assert_eq!(DecodeLayout::Gray8.byte_len(10, 10).unwrap(), 100);
        assert_eq!(DecodeLayout::Rgb16.byte_len(4, 3).unwrap(), 4 * 3 * 3 * 2);
        assert_eq!(DecodeLayout::Argb8.byte_len(5, 2).unwrap(), 40);
        assert!(DecodeLayout::Argb16.byte_len(usize::MAX, 2).is_err());
    }
}
