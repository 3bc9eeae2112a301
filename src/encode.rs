//! Image encoding.
//!
//! Pixels are imported into a fresh frame of a short-lived wand, which is
//! then written in the requested native format.

use alloc::vec::Vec;
use std::io::Write;

use imgref::ImgRef;
use rgb::{Gray, Rgb, Rgba};
use tracing::debug;

use crate::error::{MagickError, Result};
use crate::limits::Limits;
use crate::magick::Magick;
use crate::pixel::{ChannelMap, PixelBuffer, PixelData};

/// Encoded image output.
#[derive(Clone, Debug)]
pub struct EncodeOutput {
    /// Encoded image data.
    pub data: Vec<u8>,
    /// Native format name used for encoding, upper case.
    pub format: String,
}

/// Image encode request builder.
///
/// # Example
///
/// ```no_run
/// use imgref::ImgVec;
/// use rgb::Rgba;
/// use zenmagick::EncodeRequest;
///
/// let pixels = ImgVec::new(vec![Rgba { r: 0u8, g: 0, b: 0, a: 255 }; 100*100], 100, 100);
/// let output = EncodeRequest::new("PNG").encode_rgba8(pixels.as_ref())?;
/// # Ok::<(), zenmagick::MagickError>(())
/// ```
pub struct EncodeRequest<'a> {
    format: String,
    limits: Option<&'a Limits>,
    magick: Option<&'a Magick>,
}

impl<'a> EncodeRequest<'a> {
    /// Encode to the native format `format` (`"PNG"`, `"jpeg"`, ...).
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            limits: None,
            magick: None,
        }
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

    /// Encode a raw pixel buffer.
    pub fn encode(self, buffer: &PixelBuffer) -> Result<EncodeOutput> {
        if self.format.is_empty() {
            return Err(MagickError::Encode {
                call: "MagickSetImageFormat",
                message: "no output format set".into(),
                severity: None,
                cause: None,
            });
        }
        if let Some(limits) = self.limits {
            limits.check_dimensions(buffer.width() as u64, buffer.height() as u64)?;
            limits.check_memory(buffer.as_bytes().len() as u64)?;
        }
        let magick = match self.magick {
            Some(m) => m,
            None => Magick::global()?,
        };

        let mut wand = magick.new_wand()?;
        wand.new_image(buffer.width(), buffer.height())?;
        wand.import_pixels(buffer)?;
        wand.set_image_format(&self.format)?;
        let data = wand.image_blob()?;
        debug!(
            format = %self.format,
            width = buffer.width(),
            height = buffer.height(),
            map = %buffer.map(),
            bytes = data.len(),
            "encoded image"
        );
        Ok(EncodeOutput {
            data,
            format: self.format.to_ascii_uppercase(),
        })
    }

    /// Encode typed pixels.
    pub fn encode_pixels(self, pixels: &PixelData) -> Result<EncodeOutput> {
        self.encode(&pixels.to_buffer())
    }

    /// Encode RGB8 pixels.
    pub fn encode_rgb8(self, img: ImgRef<Rgb<u8>>) -> Result<EncodeOutput> {
        let words: Vec<u8> = img.pixels().flat_map(|p| [p.r, p.g, p.b]).collect();
        self.encode(&PixelBuffer::new(img.width(), img.height(), ChannelMap::RGB, words)?)
    }

    /// Encode RGBA8 pixels.
    pub fn encode_rgba8(self, img: ImgRef<Rgba<u8>>) -> Result<EncodeOutput> {
        let words: Vec<u8> = img.pixels().flat_map(|p| [p.r, p.g, p.b, p.a]).collect();
        self.encode(&PixelBuffer::new(img.width(), img.height(), ChannelMap::RGBA, words)?)
    }

    /// Encode Gray8 pixels.
    pub fn encode_gray8(self, img: ImgRef<Gray<u8>>) -> Result<EncodeOutput> {
        let words: Vec<u8> = img.pixels().map(|p| p.value()).collect();
        self.encode(&PixelBuffer::new(img.width(), img.height(), ChannelMap::GRAY, words)?)
    }

    /// Encode a raw buffer into `sink`, then flush it. Returns the number of
    /// bytes written.
    pub fn encode_to<W: Write + ?Sized>(self, buffer: &PixelBuffer, sink: &mut W) -> Result<usize> {
        let output = self.encode(buffer)?;
        sink.write_all(&output.data)?;
        sink.flush()?;
        Ok(output.data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_format_is_an_encode_error() {
        let buffer = PixelBuffer::new(1, 1, ChannelMap::RGB, vec![0u8; 3]).unwrap();
        let err = EncodeRequest::new("").encode(&buffer).unwrap_err();
        assert!(err.is_encode());
    }

    #[test]
    fn limits_checked_before_touching_the_library() {
        let limits = Limits {
            max_pixels: Some(10),
            ..Default::default()
        };
        let buffer = PixelBuffer::new(4, 4, ChannelMap::GRAY, vec![0u8; 16]).unwrap();
        let err = EncodeRequest::new("PNG")
            .with_limits(&limits)
            .encode(&buffer)
            .unwrap_err();
        assert!(matches!(err, MagickError::LimitExceeded(_)));
    }
}
