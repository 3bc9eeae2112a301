//! Resource limits for decode and encode.

use crate::error::{MagickError, Result};

/// Resource limits checked before any pixel buffer is allocated.
///
/// Guards against decompression bombs: the native library reports the frame
/// size cheaply, so oversized frames are refused before export. All limits
/// are optional.
#[derive(Clone, Debug, Default)]
pub struct Limits {
    /// Maximum image width in pixels.
    pub max_width: Option<u64>,
    /// Maximum image height in pixels.
    pub max_height: Option<u64>,
    /// Maximum total pixels (width × height).
    pub max_pixels: Option<u64>,
    /// Maximum pixel buffer size in bytes.
    pub max_memory_bytes: Option<u64>,
}

impl Limits {
    /// Create a new Limits with no restrictions.
    pub fn none() -> Self {
        Self::default()
    }

    /// Check if dimensions are within limits.
    pub fn check_dimensions(&self, width: u64, height: u64) -> Result<()> {
        if let Some(max_width) = self.max_width {
            if width > max_width {
                return Err(MagickError::LimitExceeded(format!(
                    "width {width} exceeds limit {max_width}"
                )));
            }
        }

        if let Some(max_height) = self.max_height {
            if height > max_height {
                return Err(MagickError::LimitExceeded(format!(
                    "height {height} exceeds limit {max_height}"
                )));
            }
        }

        if let Some(max_pixels) = self.max_pixels {
            let pixels = width.saturating_mul(height);
            if pixels > max_pixels {
                return Err(MagickError::LimitExceeded(format!(
                    "pixel count {pixels} exceeds limit {max_pixels}"
                )));
            }
        }

        Ok(())
    }

    /// Check if a buffer allocation is within limits.
    pub fn check_memory(&self, bytes: u64) -> Result<()> {
        if let Some(max_memory) = self.max_memory_bytes {
            if bytes > max_memory {
                return Err(MagickError::LimitExceeded(format!(
                    "{bytes} byte buffer exceeds limit {max_memory}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_none() {
        let limits = Limits::none();
        assert!(limits.check_dimensions(u64::MAX, u64::MAX).is_ok());
        assert!(limits.check_memory(u64::MAX).is_ok());
    }

    #[test]
    fn limits_dimensions() {
        let limits = Limits {
            max_width: Some(1000),
            max_height: Some(1000),
            max_pixels: Some(500_000),
            ..Default::default()
        };

        assert!(limits.check_dimensions(1000, 1000).is_err()); // 1M pixels > 500k
        assert!(limits.check_dimensions(500, 500).is_ok()); // 250k pixels
        assert!(limits.check_dimensions(2000, 500).is_err()); // width > 1000
    }

    #[test]
    fn limits_memory() {
        let limits = Limits {
            max_memory_bytes: Some(1_000_000),
            ..Default::default()
        };

        assert!(limits.check_memory(500_000).is_ok());
        let err = limits.check_memory(2_000_000).unwrap_err();
        assert!(matches!(err, MagickError::LimitExceeded(_)));
        assert!(err.to_string().contains("2000000"));
    }
}
