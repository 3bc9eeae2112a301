//! Runtime symbol resolution for the MagickWand C API.
//!
//! The library is opened with `libloading` from the candidates in a
//! [`LoaderConfig`], every required entry point is bound eagerly, and the
//! packed version number decides which enum numbering ([`ApiGeneration`])
//! the rest of the crate follows.

use core::ffi::{CStr, c_char, c_int, c_uint, c_void};
use core::fmt;
use core::mem::ManuallyDrop;
use core::ops::Deref;
use core::ptr::NonNull;

use libloading::Library;
use tracing::{debug, warn};

use crate::config::LoaderConfig;
use crate::error::{MagickError, Result};

/// ImageMagick major version whose enum numbering is in effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ApiGeneration {
    /// ImageMagick 6.x
    V6,
    /// ImageMagick 7.x
    V7,
}

impl ApiGeneration {
    /// Decode the packed number written by `MagickGetVersion` (`0x711` for 7.1.1).
    pub fn from_packed(packed: usize) -> Option<Self> {
        match packed >> 8 {
            6 => Some(ApiGeneration::V6),
            7 => Some(ApiGeneration::V7),
            _ => None,
        }
    }
}

impl fmt::Display for ApiGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiGeneration::V6 => f.write_str("ImageMagick 6"),
            ApiGeneration::V7 => f.write_str("ImageMagick 7"),
        }
    }
}

/// Opaque `MagickWand`.
#[repr(C)]
pub(crate) struct MagickWandT {
    _private: [u8; 0],
}

/// Opaque `PixelWand`.
#[repr(C)]
pub(crate) struct PixelWandT {
    _private: [u8; 0],
}

/// `MagickBooleanType`; zero is false.
pub(crate) type MagickBoolean = c_uint;
pub(crate) const MAGICK_FALSE: MagickBoolean = 0;

/// `ExceptionType`, `ColorspaceType` and `StorageType` are C enums.
pub(crate) type NativeEnum = c_int;

macro_rules! magick_symbols {
    ($( $field:ident = $symbol:literal: $fnty:ty; )*) => {
        /// Function table bound from the resolved library.
        pub(crate) struct Symbols {
            $( pub(crate) $field: $fnty, )*
        }

        impl Symbols {
            /// # Safety
            ///
            /// `library` must be a MagickWand build whose exports match the
            /// declared signatures.
            unsafe fn bind(library: &Library, name: &str) -> Result<Self> {
                Ok(Self {
                    $( $field: {
                        // SAFETY: signature per MagickWand headers, shared by 6 and 7.
                        let symbol = unsafe {
                            library.get::<$fnty>(concat!($symbol, "\0").as_bytes())
                        }
                        .map_err(|e| MagickError::Link {
                            symbol: $symbol,
                            library: name.to_string(),
                            message: e.to_string(),
                        })?;
                        *symbol
                    }, )*
                })
            }
        }
    };
}

magick_symbols! {
    genesis = "MagickWandGenesis": unsafe extern "C" fn();
    terminus = "MagickWandTerminus": unsafe extern "C" fn();
    get_version = "MagickGetVersion": unsafe extern "C" fn(*mut usize) -> *const c_char;
    new_wand = "NewMagickWand": unsafe extern "C" fn() -> *mut MagickWandT;
    destroy_wand = "DestroyMagickWand": unsafe extern "C" fn(*mut MagickWandT) -> *mut MagickWandT;
    read_image_blob = "MagickReadImageBlob":
        unsafe extern "C" fn(*mut MagickWandT, *const c_void, usize) -> MagickBoolean;
    set_image_format = "MagickSetImageFormat":
        unsafe extern "C" fn(*mut MagickWandT, *const c_char) -> MagickBoolean;
    get_image_format = "MagickGetImageFormat": unsafe extern "C" fn(*mut MagickWandT) -> *mut c_char;
    get_image_blob = "MagickGetImageBlob":
        unsafe extern "C" fn(*mut MagickWandT, *mut usize) -> *mut u8;
    relinquish_memory = "MagickRelinquishMemory": unsafe extern "C" fn(*mut c_void) -> *mut c_void;
    get_exception = "MagickGetException":
        unsafe extern "C" fn(*const MagickWandT, *mut NativeEnum) -> *mut c_char;
    clear_exception = "MagickClearException": unsafe extern "C" fn(*mut MagickWandT) -> MagickBoolean;
    reset_iterator = "MagickResetIterator": unsafe extern "C" fn(*mut MagickWandT);
    set_iterator_index = "MagickSetIteratorIndex":
        unsafe extern "C" fn(*mut MagickWandT, isize) -> MagickBoolean;
    query_formats = "MagickQueryFormats":
        unsafe extern "C" fn(*const c_char, *mut usize) -> *mut *mut c_char;
    get_number_images = "MagickGetNumberImages": unsafe extern "C" fn(*const MagickWandT) -> usize;
    get_image_width = "MagickGetImageWidth": unsafe extern "C" fn(*mut MagickWandT) -> usize;
    get_image_height = "MagickGetImageHeight": unsafe extern "C" fn(*mut MagickWandT) -> usize;
    get_image_depth = "MagickGetImageDepth": unsafe extern "C" fn(*mut MagickWandT) -> usize;
    set_image_depth = "MagickSetImageDepth":
        unsafe extern "C" fn(*mut MagickWandT, usize) -> MagickBoolean;
    get_image_colorspace = "MagickGetImageColorspace":
        unsafe extern "C" fn(*mut MagickWandT) -> NativeEnum;
    get_image_alpha_channel = "MagickGetImageAlphaChannel":
        unsafe extern "C" fn(*mut MagickWandT) -> MagickBoolean;
    export_image_pixels = "MagickExportImagePixels":
        unsafe extern "C" fn(
            *mut MagickWandT,
            isize,
            isize,
            usize,
            usize,
            *const c_char,
            NativeEnum,
            *mut c_void,
        ) -> MagickBoolean;
    import_image_pixels = "MagickImportImagePixels":
        unsafe extern "C" fn(
            *mut MagickWandT,
            isize,
            isize,
            usize,
            usize,
            *const c_char,
            NativeEnum,
            *const c_void,
        ) -> MagickBoolean;
    new_image = "MagickNewImage":
        unsafe extern "C" fn(*mut MagickWandT, usize, usize, *const PixelWandT) -> MagickBoolean;
    new_pixel_wand = "NewPixelWand": unsafe extern "C" fn() -> *mut PixelWandT;
    destroy_pixel_wand = "DestroyPixelWand": unsafe extern "C" fn(*mut PixelWandT) -> *mut PixelWandT;
}

/// A resolved MagickWand library with every required symbol bound.
///
/// The `Library` handle is never closed implicitly: dropping a `MagickApi`
/// leaves the library mapped, since genesis may have run against it. Only
/// [`unload`](Self::unload) closes it.
pub(crate) struct MagickApi {
    symbols: Symbols,
    generation: ApiGeneration,
    version: String,
    library: String,
    handle: ManuallyDrop<Library>,
}

impl Deref for MagickApi {
    type Target = Symbols;

    fn deref(&self) -> &Symbols {
        &self.symbols
    }
}

impl fmt::Debug for MagickApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MagickApi")
            .field("library", &self.library)
            .field("generation", &self.generation)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl MagickApi {
    /// Open the first loadable candidate and bind the function table.
    pub(crate) fn load(config: &LoaderConfig) -> Result<Self> {
        let (library, name) = open_library(config)?;
        // SAFETY: the candidates name MagickWand builds; a library exporting
        // these names with other signatures is a misconfiguration we cannot
        // detect.
        let symbols = unsafe { Symbols::bind(&library, &name)? };

        let mut packed = 0usize;
        // SAFETY: MagickGetVersion only writes the out-parameter and returns
        // a pointer to static storage.
        let text = unsafe { (symbols.get_version)(&mut packed) };
        let version = if text.is_null() {
            String::new()
        } else {
            // SAFETY: non-null, NUL-terminated, static.
            unsafe { CStr::from_ptr(text) }.to_string_lossy().into_owned()
        };
        let generation = ApiGeneration::from_packed(packed).ok_or_else(|| MagickError::Link {
            symbol: "MagickGetVersion",
            library: name.clone(),
            message: format!("unsupported library version {packed:#x} ({version})"),
        })?;

        debug!(library = %name, %generation, %version, "bound MagickWand");
        Ok(Self {
            symbols,
            generation,
            version,
            library: name,
            handle: ManuallyDrop::new(library),
        })
    }

    pub(crate) fn generation(&self) -> ApiGeneration {
        self.generation
    }

    /// Version string reported by the library.
    pub(crate) fn version(&self) -> &str {
        &self.version
    }

    /// Name of the candidate that was loaded, or `<process>`.
    pub(crate) fn library_name(&self) -> &str {
        &self.library
    }

    /// Close the library handle.
    ///
    /// # Safety
    ///
    /// Terminus must have run, and no bound symbol may be called afterwards.
    /// Call at most once.
    pub(crate) unsafe fn unload(&mut self) {
        // SAFETY: caller guarantees single use and no later calls.
        unsafe { ManuallyDrop::drop(&mut self.handle) };
    }
}

fn open_library(config: &LoaderConfig) -> Result<(Library, String)> {
    let mut failures = Vec::new();
    for candidate in config.candidates() {
        let file = LoaderConfig::loader_name(candidate);
        // SAFETY: loading runs the library's initializers; MagickWand's are
        // side-effect free until genesis.
        match unsafe { Library::new(&file) } {
            Ok(library) => {
                debug!(candidate = %candidate, "opened MagickWand library");
                return Ok((library, candidate.clone()));
            }
            Err(e) => {
                debug!(candidate = %candidate, error = %e, "candidate did not load");
                failures.push(candidate.as_str());
            }
        }
    }

    let tried = failures.join(", ");
    if !config.process_fallback() {
        return Err(MagickError::LibraryNotFound { tried });
    }
    warn!(%tried, "no MagickWand library loaded, binding against the process");
    let library = process_library().map_err(|e| MagickError::LibraryNotFound {
        tried: format!("{tried}, <process>: {e}"),
    })?;
    Ok((library, "<process>".to_string()))
}

#[cfg(unix)]
fn process_library() -> core::result::Result<Library, libloading::Error> {
    Ok(libloading::os::unix::Library::this().into())
}

#[cfg(windows)]
fn process_library() -> core::result::Result<Library, libloading::Error> {
    libloading::os::windows::Library::this().map(Into::into)
}

/// Memory allocated by the native library, relinquished on drop.
pub(crate) struct NativeMemory<'a> {
    api: &'a MagickApi,
    ptr: NonNull<c_void>,
}

impl<'a> NativeMemory<'a> {
    /// Take ownership of a native allocation. `None` for null.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or owned by the caller and releasable with
    /// `MagickRelinquishMemory`.
    pub(crate) unsafe fn new(api: &'a MagickApi, ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Self { api, ptr })
    }

    pub(crate) fn as_ptr(&self) -> *mut c_void {
        self.ptr.as_ptr()
    }

    /// Copy the allocation as a NUL-terminated string, replacing invalid UTF-8.
    ///
    /// # Safety
    ///
    /// The allocation must hold a NUL-terminated string.
    pub(crate) unsafe fn to_string_lossy(&self) -> String {
        // SAFETY: caller guarantees NUL termination.
        unsafe { CStr::from_ptr(self.ptr.as_ptr().cast::<c_char>()) }
            .to_string_lossy()
            .into_owned()
    }

    /// Copy the first `len` bytes.
    ///
    /// # Safety
    ///
    /// The allocation must be at least `len` bytes long and `len` must not
    /// exceed `isize::MAX`.
    pub(crate) unsafe fn to_vec(&self, len: usize) -> Vec<u8> {
        // SAFETY: caller guarantees the extent.
        unsafe { core::slice::from_raw_parts(self.ptr.as_ptr().cast::<u8>(), len) }.to_vec()
    }
}

impl Drop for NativeMemory<'_> {
    fn drop(&mut self) {
        // SAFETY: owned allocation from the same library, released once.
        unsafe { (self.api.relinquish_memory)(self.ptr.as_ptr()) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_versions() {
        assert_eq!(ApiGeneration::from_packed(0x711), Some(ApiGeneration::V7));
        assert_eq!(ApiGeneration::from_packed(0x700), Some(ApiGeneration::V7));
        assert_eq!(ApiGeneration::from_packed(0x69D), Some(ApiGeneration::V6));
        assert_eq!(ApiGeneration::from_packed(0x580), None);
        assert_eq!(ApiGeneration::from_packed(0), None);
    }

    #[test]
    fn missing_library_without_fallback() {
        let config = LoaderConfig::default()
            .with_candidates(["/nonexistent/libMagickWand-none.so"])
            .with_process_fallback(false);
        let err = MagickApi::load(&config).unwrap_err();
        match err {
            MagickError::LibraryNotFound { tried } => {
                assert!(tried.contains("libMagickWand-none"));
            }
            other => panic!("expected LibraryNotFound, got {other:?}"),
        }
    }

    #[test]
    fn generation_display() {
        assert_eq!(ApiGeneration::V7.to_string(), "ImageMagick 7");
    }
}
