//! Library facade: initialization, shutdown and stateless conveniences.

use core::ffi::{c_char, c_void};
use std::sync::OnceLock;

use tracing::debug;

use crate::arena::call_with_arena;
use crate::config::LoaderConfig;
use crate::decode::{DecodeOutput, DecodeRequest};
use crate::error::{MagickError, Result};
use crate::ffi::{ApiGeneration, MagickApi, NativeMemory};
use crate::info::ImageDescriptor;
use crate::registry::FormatRegistry;
use crate::wand::Wand;

/// An initialized MagickWand library.
///
/// Construction resolves the library and runs `MagickWandGenesis`.
/// [`close`](Self::close) runs `MagickWandTerminus` and unloads the library;
/// dropping without closing leaves it loaded and initialized for the rest of
/// the process. Every
/// [`Wand`] borrows the `Magick` it came from, so closing while a wand is
/// alive does not compile.
///
/// # Example
///
/// ```no_run
/// let magick = zenmagick::Magick::global()?;
/// let png = std::fs::read("in.gif")?;
/// let out = magick.convert_blob(&png, "PNG")?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct Magick {
    api: MagickApi,
    formats: OnceLock<FormatRegistry>,
}

static GLOBAL: OnceLock<Result<Magick>> = OnceLock::new();

impl Magick {
    /// Resolve the library from [`LoaderConfig::from_env`] and initialize it.
    pub fn new() -> Result<Self> {
        Self::with_config(&LoaderConfig::from_env())
    }

    /// Resolve the library from `config` and initialize it.
    pub fn with_config(config: &LoaderConfig) -> Result<Self> {
        let api = MagickApi::load(config)?;
        // SAFETY: all symbols bound; genesis is idempotent.
        unsafe { (api.genesis)() };
        debug!(
            library = api.library_name(),
            version = api.version(),
            "MagickWand initialized"
        );
        Ok(Self {
            api,
            formats: OnceLock::new(),
        })
    }

    /// The process-wide instance, created on first use.
    ///
    /// Concurrent first calls create exactly one instance. A failed
    /// construction is remembered and returned to every later caller.
    pub fn global() -> Result<&'static Magick> {
        GLOBAL.get_or_init(Magick::new).as_ref().map_err(Clone::clone)
    }

    pub(crate) fn api(&self) -> &MagickApi {
        &self.api
    }

    /// ImageMagick major version in use.
    pub fn generation(&self) -> ApiGeneration {
        self.api.generation()
    }

    /// Version string reported by the library.
    pub fn version(&self) -> &str {
        self.api.version()
    }

    /// Candidate the library was loaded from, or `<process>`.
    pub fn library_name(&self) -> &str {
        self.api.library_name()
    }

    /// A fresh, empty wand.
    pub fn new_wand(&self) -> Result<Wand<'_>> {
        Wand::new(self)
    }

    /// Re-encode `blob` in `format`. Multi-frame input yields its first frame
    /// unless the format writes sequences.
    pub fn convert_blob(&self, blob: &[u8], format: &str) -> Result<Vec<u8>> {
        let mut wand = self.new_wand()?;
        wand.read_blob(blob)?;
        wand.reset_iterator()?;
        wand.set_image_format(format)?;
        wand.image_blob()
    }

    /// Whether the library can decode `blob`.
    ///
    /// Decode failures are `Ok(false)`; only failing to create a wand is an
    /// error.
    pub fn can_read(&self, blob: &[u8]) -> Result<bool> {
        let mut wand = self.new_wand()?;
        match wand.read_blob(blob) {
            Ok(()) => Ok(true),
            Err(e) => {
                debug!(error = %e, bytes = blob.len(), "blob not readable");
                Ok(false)
            }
        }
    }

    /// Metadata of frame `index` without exporting pixels.
    pub fn probe(&self, blob: &[u8], index: usize) -> Result<ImageDescriptor> {
        let mut wand = self.new_wand()?;
        wand.read_blob(blob)?;
        wand.describe(index)
    }

    /// Decode the first frame of `blob`.
    pub fn decode(&self, blob: &[u8]) -> Result<DecodeOutput> {
        DecodeRequest::new(blob).with_magick(self).decode()
    }

    /// Every format the library knows, queried fresh.
    pub fn query_formats(&self) -> Result<FormatRegistry> {
        const CALL: &str = "MagickQueryFormats";
        let api = &self.api;
        let names = call_with_arena(|arena| {
            let pattern = arena.c_str("*")?;
            let mut count = 0usize;
            // SAFETY: pattern is NUL-terminated; the array and each entry are
            // ours to relinquish.
            let raw = unsafe { (api.query_formats)(pattern.as_ptr(), &mut count) };
            // SAFETY: array allocated by the library.
            let array = unsafe { NativeMemory::new(api, raw.cast::<c_void>()) }
                .ok_or_else(|| MagickError::fault(CALL, "returned null"))?;
            let entries = array.as_ptr().cast::<*mut c_char>();
            let mut names = Vec::with_capacity(count);
            for i in 0..count {
                // SAFETY: `count` entries were reported.
                let entry = unsafe { *entries.add(i) };
                // SAFETY: each entry is a separately allocated string.
                if let Some(name) = unsafe { NativeMemory::new(api, entry.cast::<c_void>()) } {
                    // SAFETY: NUL-terminated.
                    names.push(unsafe { name.to_string_lossy() });
                }
            }
            Ok(names)
        })?;
        let registry = FormatRegistry::from_names(names);
        debug!(count = registry.len(), "queried formats");
        Ok(registry)
    }

    /// Every format the library knows, queried once and cached.
    pub fn formats(&self) -> Result<&FormatRegistry> {
        if let Some(formats) = self.formats.get() {
            return Ok(formats);
        }
        let registry = self.query_formats()?;
        Ok(self.formats.get_or_init(|| registry))
    }

    /// Shut the library down with `MagickWandTerminus`, then unload it.
    ///
    /// Terminus is process-wide and not reference counted: no other
    /// `Magick` (including [`Magick::global`]) may be used afterwards.
    pub fn close(mut self) {
        // SAFETY: `self` is consumed, so no wand borrowed from it is alive.
        unsafe { (self.api.terminus)() };
        debug!(library = self.api.library_name(), "MagickWand terminated");
        // SAFETY: terminus ran and `self` is dropped right after.
        unsafe { self.api.unload() };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn magick_is_send_and_sync() {
        assert_send_sync::<Magick>();
    }

    #[test]
    fn missing_library_is_reported() {
        let config = LoaderConfig::default()
            .with_candidates(["/nonexistent/libMagickWand-test.so"])
            .with_process_fallback(false);
        let err = Magick::with_config(&config).unwrap_err();
        assert!(matches!(err, MagickError::LibraryNotFound { .. }));
    }
}
