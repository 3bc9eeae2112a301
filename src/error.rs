//! Unified error type for binding operations.

use std::sync::Arc;

use thiserror::Error;

use crate::exception::ExceptionSeverity;

/// Result alias used throughout the crate.
pub type Result<T, E = MagickError> = core::result::Result<T, E>;

/// Unified error type for MagickWand operations.
///
/// Native boolean return codes never escape the binding: every failed native
/// call is translated into one of these variants at the call site. When both
/// a binding-level fault and the native library's own diagnostic are
/// available, the diagnostic text becomes the message and the fault is kept
/// as [`cause`](std::error::Error::source).
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum MagickError {
    /// No candidate library could be opened and process fallback was disabled.
    #[error("MagickWand library not found (tried: {tried})")]
    LibraryNotFound { tried: String },

    /// A required native symbol is missing from the resolved library.
    #[error("missing symbol {symbol} in {library}: {message}")]
    Link {
        symbol: &'static str,
        library: String,
        message: String,
    },

    /// The native library rejected the encoded input.
    #[error("{call} failed: {message}")]
    Decode {
        call: &'static str,
        message: String,
        severity: Option<ExceptionSeverity>,
        #[source]
        cause: Option<Box<MagickError>>,
    },

    /// Format unset or unknown, or encoding produced no output.
    #[error("{call} failed: {message}")]
    Encode {
        call: &'static str,
        message: String,
        severity: Option<ExceptionSeverity>,
        #[source]
        cause: Option<Box<MagickError>>,
    },

    /// Bit depth other than 8 or 16.
    #[error("image depth {depth} unsupported")]
    UnsupportedDepth { depth: usize },

    /// Depth/channel combination without a decode layout.
    #[error("handling image depth {depth} and channel count {channels} not implemented")]
    UnsupportedShape { depth: usize, channels: u8 },

    /// Unexpected failure inside a bound native call.
    #[error("native fault in {call}: {message}")]
    NativeFault {
        call: &'static str,
        message: String,
        severity: Option<ExceptionSeverity>,
        #[source]
        cause: Option<Box<MagickError>>,
    },

    /// Operation not valid in the wand's current state.
    #[error("invalid wand state: {0}")]
    State(&'static str),

    /// Frame index past the end of the image list.
    #[error("frame index {index} out of range ({count} frames)")]
    FrameOutOfRange { index: usize, count: usize },

    /// Input validation failed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Resource limit exceeded.
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// Reading input or writing to a sink failed.
    #[error("I/O error: {0}")]
    Io(#[source] Arc<std::io::Error>),
}

impl MagickError {
    /// Whether this is a decode failure.
    pub fn is_decode(&self) -> bool {
        matches!(self, MagickError::Decode { .. })
    }

    /// Whether this is an encode failure.
    pub fn is_encode(&self) -> bool {
        matches!(self, MagickError::Encode { .. })
    }

    /// Native diagnostic severity, when the native library reported one.
    pub fn severity(&self) -> Option<ExceptionSeverity> {
        match self {
            MagickError::Decode { severity, .. }
            | MagickError::Encode { severity, .. }
            | MagickError::NativeFault { severity, .. } => *severity,
            _ => None,
        }
    }

    pub(crate) fn fault(call: &'static str, message: impl Into<String>) -> Self {
        MagickError::NativeFault {
            call,
            message: message.into(),
            severity: None,
            cause: None,
        }
    }
}

impl From<std::io::Error> for MagickError {
    fn from(e: std::io::Error) -> Self {
        MagickError::Io(Arc::new(e))
    }
}
