//! Per-frame image metadata read without exporting pixels.

use core::fmt;

use crate::colorspace::Colorspace;

/// What the native library knows about one frame of a decoded blob.
///
/// Recomputed on every query; nothing here is cached between reads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageDescriptor {
    /// Zero-based frame index this descriptor was read from.
    pub index: usize,
    /// Number of frames in the blob.
    pub frames: usize,
    pub width: usize,
    pub height: usize,
    /// Bits per channel.
    pub depth: usize,
    pub colorspace: Colorspace,
    pub has_alpha: bool,
    /// Native format name (`PNG`, `GIF`, ...), upper case.
    pub format: String,
}

impl ImageDescriptor {
    /// Channels the frame decodes to, alpha included.
    pub fn channels(&self) -> u8 {
        match self.colorspace.channel_count() {
            1 => 1,
            _ if self.has_alpha => 4,
            _ => 3,
        }
    }

    /// Whether this is one frame of an animation or multi-page file.
    pub fn is_multi_frame(&self) -> bool {
        self.frames > 1
    }
}

impl fmt::Display for ImageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}x{} {}-bit {}{}",
            self.format,
            self.width,
            self.height,
            self.depth,
            self.colorspace,
            if self.has_alpha { "+alpha" } else { "" }
        )?;
        if self.is_multi_frame() {
            write!(f, " (frame {} of {})", self.index + 1, self.frames)?;
        }
        Ok(())
    }
}
