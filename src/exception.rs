//! Native exception query and translation into [`MagickError`].
//!
//! MagickWand reports failure as a false boolean (or a null pointer) and
//! leaves the details in a per-wand exception slot. [`take`] drains that
//! slot; [`translate`] turns what it found into the error for the call.

use core::ffi::c_void;
use core::fmt;
use core::ptr::NonNull;

use crate::error::MagickError;
use crate::ffi::{MagickApi, MagickWandT, NativeEnum, NativeMemory};

/// How bad a native exception is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExceptionLevel {
    Undefined,
    Warning,
    Error,
    Fatal,
}

/// Classified native `ExceptionType` code.
///
/// Codes 300..=399 are warnings, 400..=699 errors and 700 and above fatal
/// errors. The last two digits name the subsystem that raised it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ExceptionSeverity {
    code: i32,
}

impl ExceptionSeverity {
    pub fn from_code(code: i32) -> Self {
        Self { code }
    }

    /// The raw native code.
    pub fn code(self) -> i32 {
        self.code
    }

    pub fn level(self) -> ExceptionLevel {
        match self.code {
            300..=399 => ExceptionLevel::Warning,
            400..=699 => ExceptionLevel::Error,
            700.. => ExceptionLevel::Fatal,
            _ => ExceptionLevel::Undefined,
        }
    }

    pub fn is_warning(self) -> bool {
        self.level() == ExceptionLevel::Warning
    }

    /// Subsystem that raised the exception, e.g. `CorruptImage` or `Blob`.
    pub fn domain(self) -> &'static str {
        if self.level() == ExceptionLevel::Undefined {
            return "Undefined";
        }
        match self.code % 100 {
            0 => "ResourceLimit",
            5 => "Type",
            10 => "Option",
            15 => "Delegate",
            20 => "MissingDelegate",
            25 => "CorruptImage",
            30 => "FileOpen",
            35 => "Blob",
            40 => "Stream",
            45 => "Cache",
            50 => "Coder",
            52 => "Filter",
            55 => "Module",
            60 => "Draw",
            65 => "Image",
            70 => "Wand",
            75 => "Random",
            80 => "XServer",
            85 => "Monitor",
            90 => "Registry",
            95 => "Configure",
            99 => "Policy",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for ExceptionSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level() {
            ExceptionLevel::Undefined => return f.write_str("Undefined"),
            ExceptionLevel::Warning => "Warning",
            ExceptionLevel::Error => "Error",
            ExceptionLevel::Fatal => "FatalError",
        };
        write!(f, "{}{level} ({})", self.domain(), self.code)
    }
}

/// What a failed call was doing, which decides the error variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FailureKind {
    Decode,
    Encode,
    Fault,
}

/// Diagnostic drained from a wand's exception slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct NativeException {
    pub(crate) severity: ExceptionSeverity,
    pub(crate) message: String,
}

/// Copy out and clear the wand's pending exception.
///
/// Returns `None` when the slot holds neither a code nor text.
///
/// # Safety
///
/// `wand` must be a live wand created by `api`.
pub(crate) unsafe fn take(api: &MagickApi, wand: NonNull<MagickWandT>) -> Option<NativeException> {
    let mut code: NativeEnum = 0;
    // SAFETY: live wand; the returned string is ours to relinquish.
    let raw = unsafe { (api.get_exception)(wand.as_ptr(), &mut code) };
    // SAFETY: MagickGetException allocates with AcquireString.
    let message = unsafe { NativeMemory::new(api, raw.cast::<c_void>()) }
        // SAFETY: NUL-terminated native string.
        .map(|mem| unsafe { mem.to_string_lossy() })
        .unwrap_or_default();
    // SAFETY: live wand.
    unsafe { (api.clear_exception)(wand.as_ptr()) };

    let message = message.trim().to_string();
    if code == 0 && message.is_empty() {
        return None;
    }
    Some(NativeException {
        severity: ExceptionSeverity::from_code(code),
        message,
    })
}

/// Build the error for a failed `call`.
///
/// Native text, when present, becomes the message and any binding-level
/// `fault` is attached as the cause. Without native text a `Fault` kind
/// returns the fault itself; other kinds carry the fault's text.
pub(crate) fn translate(
    kind: FailureKind,
    call: &'static str,
    exception: Option<NativeException>,
    fault: Option<MagickError>,
) -> MagickError {
    let severity = exception.as_ref().map(|e| e.severity);
    let text = exception.map(|e| e.message).filter(|m| !m.is_empty());
    let message = match (text, &fault) {
        (Some(text), _) => text,
        (None, Some(f)) => {
            if kind == FailureKind::Fault {
                return f.clone();
            }
            f.to_string()
        }
        (None, None) => format!("{call}: operation failed"),
    };
    let cause = fault.map(Box::new);
    match kind {
        FailureKind::Decode => MagickError::Decode {
            call,
            message,
            severity,
            cause,
        },
        FailureKind::Encode => MagickError::Encode {
            call,
            message,
            severity,
            cause,
        },
        FailureKind::Fault => MagickError::NativeFault {
            call,
            message,
            severity,
            cause,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_ranges() {
        assert_eq!(ExceptionSeverity::from_code(0).level(), ExceptionLevel::Undefined);
        assert_eq!(ExceptionSeverity::from_code(350).level(), ExceptionLevel::Warning);
        assert!(ExceptionSeverity::from_code(399).is_warning());
        assert_eq!(ExceptionSeverity::from_code(425).level(), ExceptionLevel::Error);
        assert_eq!(ExceptionSeverity::from_code(699).level(), ExceptionLevel::Error);
        assert_eq!(ExceptionSeverity::from_code(700).level(), ExceptionLevel::Fatal);
    }

    #[test]
    fn domains() {
        assert_eq!(ExceptionSeverity::from_code(420).domain(), "MissingDelegate");
        assert_eq!(ExceptionSeverity::from_code(325).domain(), "CorruptImage");
        assert_eq!(ExceptionSeverity::from_code(435).domain(), "Blob");
        assert_eq!(ExceptionSeverity::from_code(410).domain(), "Option");
        assert_eq!(ExceptionSeverity::from_code(0).domain(), "Undefined");
    }

    #[test]
    fn display() {
        assert_eq!(
            ExceptionSeverity::from_code(420).to_string(),
            "MissingDelegateError (420)"
        );
        assert_eq!(
            ExceptionSeverity::from_code(710).to_string(),
            "OptionFatalError (710)"
        );
    }

    #[test]
    fn native_text_wins() {
        let exc = NativeException {
            severity: ExceptionSeverity::from_code(420),
            message: "no decode delegate for this image format".into(),
        };
        let err = translate(FailureKind::Decode, "MagickReadImageBlob", Some(exc), None);
        assert!(err.is_decode());
        assert!(err.to_string().contains("no decode delegate"));
        assert_eq!(err.severity().map(|s| s.code()), Some(420));
    }

    #[test]
    fn empty_slot_gives_generic_message() {
        let err = translate(FailureKind::Encode, "MagickSetImageFormat", None, None);
        assert!(err.is_encode());
        assert!(err.to_string().contains("operation failed"));
        assert!(err.severity().is_none());
    }

    #[test]
    fn bare_fault_is_returned_as_is() {
        let fault = MagickError::fault("NewMagickWand", "null wand");
        let err = translate(FailureKind::Fault, "NewMagickWand", None, Some(fault));
        assert!(matches!(err, MagickError::NativeFault { .. }));
        assert!(err.to_string().contains("null wand"));
    }

    #[test]
    fn fault_without_text_takes_call_kind() {
        let fault = MagickError::fault("MagickGetImageBlob", "null blob");
        let err = translate(FailureKind::Encode, "MagickGetImageBlob", None, Some(fault));
        assert!(err.is_encode());
        assert!(err.to_string().contains("null blob"));
    }

    #[test]
    fn fault_with_text_becomes_cause() {
        use std::error::Error as _;
        let exc = NativeException {
            severity: ExceptionSeverity::from_code(450),
            message: "no encode delegate".into(),
        };
        let fault = MagickError::fault("MagickGetImageBlob", "null blob");
        let err = translate(FailureKind::Encode, "MagickGetImageBlob", Some(exc), Some(fault));
        assert!(err.is_encode());
        assert!(err.source().unwrap().to_string().contains("null blob"));
    }
}
