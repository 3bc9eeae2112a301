//! Stateful reader over one input blob.

use std::io::Read;

use crate::decode::{self, DecodeOutput};
use crate::error::{MagickError, Result};
use crate::info::ImageDescriptor;
use crate::limits::Limits;
use crate::magick::Magick;
use crate::wand::Wand;

/// Reads frames of one input, decoding it once on [`set_input`](Self::set_input).
///
/// # Example
///
/// ```no_run
/// use zenmagick::{ImageReader, Magick};
///
/// let magick = Magick::global()?;
/// let mut reader = ImageReader::new(magick);
/// reader.set_input(&std::fs::read("anim.gif")?)?;
/// for index in 0..reader.num_images()? {
///     let frame = reader.read(index)?;
///     println!("{index}: {}x{}", frame.width(), frame.height());
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct ImageReader<'m> {
    magick: &'m Magick,
    wand: Option<Wand<'m>>,
    limits: Option<Limits>,
}

impl<'m> ImageReader<'m> {
    pub fn new(magick: &'m Magick) -> Self {
        Self {
            magick,
            wand: None,
            limits: None,
        }
    }

    /// Set resource limits applied to every [`read`](Self::read).
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Whether `data` looks decodable. Does not change the current input.
    pub fn can_decode(&self, data: &[u8]) -> Result<bool> {
        self.magick.can_read(data)
    }

    /// Replace the input. The previous input is released first; on failure
    /// the reader has no input.
    pub fn set_input(&mut self, data: &[u8]) -> Result<()> {
        self.dispose();
        let mut wand = self.magick.new_wand()?;
        wand.read_blob(data)?;
        self.wand = Some(wand);
        Ok(())
    }

    /// Read `source` to the end and use it as input.
    pub fn set_input_from<R: Read>(&mut self, mut source: R) -> Result<()> {
        let mut data = Vec::new();
        source.read_to_end(&mut data)?;
        self.set_input(&data)
    }

    fn wand(&mut self) -> Result<&mut Wand<'m>> {
        self.wand.as_mut().ok_or(MagickError::State("no input set"))
    }

    /// Number of frames in the input.
    pub fn num_images(&self) -> Result<usize> {
        self.wand
            .as_ref()
            .ok_or(MagickError::State("no input set"))?
            .number_images()
    }

    /// Width of frame `index`.
    pub fn width(&mut self, index: usize) -> Result<usize> {
        let wand = self.wand()?;
        wand.set_iterator_index(index)?;
        wand.image_width()
    }

    /// Height of frame `index`.
    pub fn height(&mut self, index: usize) -> Result<usize> {
        let wand = self.wand()?;
        wand.set_iterator_index(index)?;
        wand.image_height()
    }

    /// Metadata of frame `index`.
    pub fn descriptor(&mut self, index: usize) -> Result<ImageDescriptor> {
        self.wand()?.describe(index)
    }

    /// Decode frame `index`.
    pub fn read(&mut self, index: usize) -> Result<DecodeOutput> {
        let wand = self.wand.as_mut().ok_or(MagickError::State("no input set"))?;
        decode::decode_frame(wand, index, self.limits.as_ref())
    }

    /// Release the current input. Idempotent.
    pub fn dispose(&mut self) {
        if let Some(mut wand) = self.wand.take() {
            wand.close();
        }
    }

    /// Whether an input is set.
    pub fn has_input(&self) -> bool {
        self.wand.is_some()
    }
}
