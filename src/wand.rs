//! One native `MagickWand` context.
//!
//! A [`Wand`] owns its native handle and destroys it exactly once, either
//! through [`Wand::close`] or on drop. It borrows the [`Magick`] it was
//! created from, so the library cannot be shut down while a wand is alive.
//!
//! Every native boolean is checked at the call site through
//! [`Wand::check`], which drains the wand's exception slot into a
//! [`MagickError`].

use core::ffi::c_void;
use core::fmt;
use core::ptr::NonNull;

use tracing::trace;

use crate::arena::{call_with_arena, with_arena};
use crate::colorspace::Colorspace;
use crate::error::{MagickError, Result};
use crate::exception::{self, FailureKind};
use crate::ffi::{MAGICK_FALSE, MagickApi, MagickBoolean, MagickWandT, NativeMemory, PixelWandT};
use crate::info::ImageDescriptor;
use crate::magick::Magick;
use crate::pixel::{self, ChannelMap, PixelBuffer};
use crate::storage::{PixelWords, StorageKind};

/// Lifecycle of a [`Wand`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WandState {
    /// No image read or created yet.
    Created,
    /// Holds at least one frame.
    Loaded,
    /// Native handle destroyed. Terminal.
    Disposed,
}

/// Owned native processing context.
///
/// Not thread-safe: a wand may move between threads but is never shared.
pub struct Wand<'m> {
    magick: &'m Magick,
    handle: Option<NonNull<MagickWandT>>,
    state: WandState,
}

// SAFETY: a MagickWand has no thread affinity; it only must not be used from
// two threads at once, which `!Sync` and `&mut self` mutators ensure. The
// borrowed `Magick` is `Sync`.
unsafe impl Send for Wand<'_> {}

impl<'m> Wand<'m> {
    pub(crate) fn new(magick: &'m Magick) -> Result<Self> {
        let api = magick.api();
        // SAFETY: genesis ran when `magick` was constructed.
        let raw = unsafe { (api.new_wand)() };
        let handle = NonNull::new(raw)
            .ok_or_else(|| MagickError::fault("NewMagickWand", "returned null"))?;
        trace!(wand = ?handle, "wand created");
        Ok(Self {
            magick,
            handle: Some(handle),
            state: WandState::Created,
        })
    }

    fn api(&self) -> &'m MagickApi {
        self.magick.api()
    }

    /// The library this wand belongs to.
    pub fn magick(&self) -> &'m Magick {
        self.magick
    }

    pub fn state(&self) -> WandState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == WandState::Disposed
    }

    /// Handle of a wand that has not been closed.
    fn live(&self) -> Result<NonNull<MagickWandT>> {
        self.handle.ok_or(MagickError::State("wand is closed"))
    }

    /// Handle of a wand holding at least one frame.
    fn loaded(&self) -> Result<NonNull<MagickWandT>> {
        let handle = self.live()?;
        match self.state {
            WandState::Loaded => Ok(handle),
            _ => Err(MagickError::State("no image loaded")),
        }
    }

    /// Turn a native boolean into a result, translating the pending
    /// exception on false.
    fn check(&self, call: &'static str, status: MagickBoolean, kind: FailureKind) -> Result<()> {
        if status != MAGICK_FALSE {
            return Ok(());
        }
        Err(self.failure(kind, call, None))
    }

    fn failure(
        &self,
        kind: FailureKind,
        call: &'static str,
        fault: Option<MagickError>,
    ) -> MagickError {
        // SAFETY: handle is live while `self.handle` is `Some`.
        let pending = self.handle.and_then(|h| unsafe { exception::take(self.api(), h) });
        exception::translate(kind, call, pending, fault)
    }

    /// Decode `blob`, appending its frames to the wand.
    pub fn read_blob(&mut self, blob: &[u8]) -> Result<()> {
        let wand = self.live()?;
        if blob.is_empty() {
            return Err(MagickError::InvalidInput("empty blob".into()));
        }
        // SAFETY: the slice outlives the call; the library copies what it keeps.
        let status = unsafe {
            (self.api().read_image_blob)(wand.as_ptr(), blob.as_ptr().cast::<c_void>(), blob.len())
        };
        self.check("MagickReadImageBlob", status, FailureKind::Decode)?;
        self.state = WandState::Loaded;
        trace!(wand = ?wand, bytes = blob.len(), "blob read");
        Ok(())
    }

    /// Encode the current frame in the format last set with
    /// [`set_image_format`](Self::set_image_format).
    pub fn image_blob(&mut self) -> Result<Vec<u8>> {
        const CALL: &str = "MagickGetImageBlob";
        let wand = self.loaded()?;
        let api = self.api();
        let mut len = 0usize;
        // SAFETY: live wand; the result is ours to relinquish.
        let raw = unsafe { (api.get_image_blob)(wand.as_ptr(), &mut len) };
        // SAFETY: blob allocated by the library.
        let Some(blob) = (unsafe { NativeMemory::new(api, raw.cast::<c_void>()) }) else {
            let fault = MagickError::fault(CALL, "returned no data");
            return Err(self.failure(FailureKind::Encode, CALL, Some(fault)));
        };
        if len == 0 || len > isize::MAX as usize {
            drop(blob);
            let fault = MagickError::fault(CALL, format!("returned {len} bytes"));
            return Err(self.failure(FailureKind::Encode, CALL, Some(fault)));
        }
        // SAFETY: the library reports `len` valid bytes.
        Ok(unsafe { blob.to_vec(len) })
    }

    /// Set the output format of the current frame (`"PNG"`, `"jpeg"`, ...).
    pub fn set_image_format(&mut self, format: &str) -> Result<()> {
        let wand = self.loaded()?;
        if format.is_empty() {
            return Err(MagickError::InvalidInput("empty format name".into()));
        }
        with_arena(|arena| {
            let name = arena.c_str(format)?;
            // SAFETY: live wand, NUL-terminated name living in the arena.
            let status = unsafe { (self.api().set_image_format)(wand.as_ptr(), name.as_ptr()) };
            self.check("MagickSetImageFormat", status, FailureKind::Encode)
        })
    }

    /// Native format name of the current frame.
    pub fn image_format(&self) -> Result<String> {
        const CALL: &str = "MagickGetImageFormat";
        let wand = self.loaded()?;
        let api = self.api();
        // SAFETY: live wand; the string is ours to relinquish.
        let raw = unsafe { (api.get_image_format)(wand.as_ptr()) };
        // SAFETY: allocated by the library.
        match unsafe { NativeMemory::new(api, raw.cast::<c_void>()) } {
            // SAFETY: NUL-terminated.
            Some(name) => Ok(unsafe { name.to_string_lossy() }),
            None => Err(self.failure(
                FailureKind::Fault,
                CALL,
                Some(MagickError::fault(CALL, "returned null")),
            )),
        }
    }

    /// Number of frames held. Zero before anything was read.
    pub fn number_images(&self) -> Result<usize> {
        let wand = self.live()?;
        // SAFETY: live wand.
        Ok(unsafe { (self.api().get_number_images)(wand.as_ptr()) })
    }

    pub fn image_width(&self) -> Result<usize> {
        let wand = self.loaded()?;
        // SAFETY: live wand.
        Ok(unsafe { (self.api().get_image_width)(wand.as_ptr()) })
    }

    pub fn image_height(&self) -> Result<usize> {
        let wand = self.loaded()?;
        // SAFETY: live wand.
        Ok(unsafe { (self.api().get_image_height)(wand.as_ptr()) })
    }

    /// Bits per channel of the current frame.
    pub fn image_depth(&self) -> Result<usize> {
        let wand = self.loaded()?;
        // SAFETY: live wand.
        Ok(unsafe { (self.api().get_image_depth)(wand.as_ptr()) })
    }

    /// Colorspace of the current frame. Codes outside the known table are
    /// decode errors.
    pub fn image_colorspace(&self) -> Result<Colorspace> {
        let wand = self.loaded()?;
        // SAFETY: live wand.
        let code = unsafe { (self.api().get_image_colorspace)(wand.as_ptr()) };
        Colorspace::from_code(i64::from(code), self.api().generation()).ok_or_else(|| {
            MagickError::Decode {
                call: "MagickGetImageColorspace",
                message: format!("unknown colorspace code {code}"),
                severity: None,
                cause: None,
            }
        })
    }

    /// Whether the current frame has an active alpha channel.
    pub fn image_alpha_channel(&self) -> Result<bool> {
        let wand = self.loaded()?;
        // SAFETY: live wand.
        Ok(unsafe { (self.api().get_image_alpha_channel)(wand.as_ptr()) } != MAGICK_FALSE)
    }

    /// Make the first frame current.
    pub fn reset_iterator(&mut self) -> Result<()> {
        let wand = self.live()?;
        // SAFETY: live wand.
        unsafe { (self.api().reset_iterator)(wand.as_ptr()) };
        Ok(())
    }

    /// Make frame `index` current.
    pub fn set_iterator_index(&mut self, index: usize) -> Result<()> {
        let wand = self.loaded()?;
        let count = self.number_images()?;
        if index >= count {
            return Err(MagickError::FrameOutOfRange { index, count });
        }
        let native = isize::try_from(index)
            .map_err(|_| MagickError::FrameOutOfRange { index, count })?;
        // SAFETY: live wand, index in range.
        let status = unsafe { (self.api().set_iterator_index)(wand.as_ptr(), native) };
        self.check("MagickSetIteratorIndex", status, FailureKind::Fault)
    }

    fn ensure_supported(&self, kind: StorageKind) -> Result<()> {
        let generation = self.api().generation();
        if kind.supported_by(generation) {
            Ok(())
        } else {
            Err(MagickError::InvalidInput(format!(
                "{kind:?} pixels are not supported by {generation} on this target"
            )))
        }
    }

    /// Export the whole current frame as `kind` words in `map` order.
    pub fn export_pixels(&self, map: ChannelMap, kind: StorageKind) -> Result<PixelBuffer> {
        let wand = self.loaded()?;
        self.ensure_supported(kind)?;
        let (width, height) = (self.image_width()?, self.image_height()?);
        let words = pixel::word_count(width, height, map)?;
        let api = self.api();
        let exported = call_with_arena(|arena| {
            let c_map = arena.c_str(map.as_str())?;
            let buf = arena.words(kind, words)?;
            // SAFETY: `buf` holds width·height·map.len() words of `kind`.
            let status = unsafe {
                (api.export_image_pixels)(
                    wand.as_ptr(),
                    0,
                    0,
                    width,
                    height,
                    c_map.as_ptr(),
                    kind.native_tag(),
                    buf.as_mut_ptr().cast::<c_void>(),
                )
            };
            self.check("MagickExportImagePixels", status, FailureKind::Decode)?;
            Ok(PixelWords::from_bytes(kind, buf))
        })?;
        PixelBuffer::new(width, height, map, exported)
    }

    fn export_u8(&self, map: ChannelMap) -> Result<Vec<u8>> {
        self.export_pixels(map, StorageKind::U8)?
            .into_words()
            .into_u8()
            .ok_or_else(|| MagickError::fault("MagickExportImagePixels", "word kind mismatch"))
    }

    fn export_u16(&self, map: ChannelMap) -> Result<Vec<u16>> {
        self.export_pixels(map, StorageKind::U16)?
            .into_words()
            .into_u16()
            .ok_or_else(|| MagickError::fault("MagickExportImagePixels", "word kind mismatch"))
    }

    /// One 8-bit intensity word per pixel.
    pub fn export_gray_bytes(&self) -> Result<Vec<u8>> {
        self.export_u8(ChannelMap::GRAY)
    }

    pub fn export_rgb_bytes(&self) -> Result<Vec<u8>> {
        self.export_u8(ChannelMap::RGB)
    }

    /// Alpha first: `[a, r, g, b]` per pixel.
    pub fn export_argb_bytes(&self) -> Result<Vec<u8>> {
        self.export_u8(ChannelMap::ARGB)
    }

    pub fn export_gray_shorts(&self) -> Result<Vec<u16>> {
        self.export_u16(ChannelMap::GRAY)
    }

    pub fn export_rgb_shorts(&self) -> Result<Vec<u16>> {
        self.export_u16(ChannelMap::RGB)
    }

    pub fn export_argb_shorts(&self) -> Result<Vec<u16>> {
        self.export_u16(ChannelMap::ARGB)
    }

    /// Write `buffer` into the current frame at the origin.
    ///
    /// The frame must exist ([`new_image`](Self::new_image) or
    /// [`read_blob`](Self::read_blob)). 8- and 16-bit imports also set the
    /// frame depth so encoders write the supplied precision.
    pub fn import_pixels(&mut self, buffer: &PixelBuffer) -> Result<()> {
        let wand = self.loaded()?;
        let kind = buffer.storage();
        self.ensure_supported(kind)?;
        let api = self.api();
        with_arena(|arena| {
            let c_map = arena.c_str(buffer.map().as_str())?;
            let words = arena.copy_words(buffer.words())?;
            // SAFETY: `words` holds exactly width·height·map.len() words,
            // checked when the buffer was built.
            let status = unsafe {
                (api.import_image_pixels)(
                    wand.as_ptr(),
                    0,
                    0,
                    buffer.width(),
                    buffer.height(),
                    c_map.as_ptr(),
                    kind.native_tag(),
                    words.as_ptr().cast::<c_void>(),
                )
            };
            self.check("MagickImportImagePixels", status, FailureKind::Fault)
        })?;
        if let Some(depth) = import_depth(kind) {
            // SAFETY: live wand.
            let status = unsafe { (api.set_image_depth)(wand.as_ptr(), depth) };
            self.check("MagickSetImageDepth", status, FailureKind::Fault)?;
        }
        Ok(())
    }

    /// Import 8-bit words laid out as `map`.
    ///
    /// # Panics
    ///
    /// If `map` does not have `words_per_pixel` channels.
    pub fn import_bytes(
        &mut self,
        pixels: &[u8],
        map: &str,
        words_per_pixel: usize,
        width: usize,
        height: usize,
    ) -> Result<()> {
        let map = checked_map(map, words_per_pixel)?;
        let buffer = PixelBuffer::new(width, height, map, pixels.to_vec())?;
        self.import_pixels(&buffer)
    }

    /// Import 16-bit words laid out as `map`.
    ///
    /// # Panics
    ///
    /// If `map` does not have `words_per_pixel` channels.
    pub fn import_shorts(
        &mut self,
        pixels: &[u16],
        map: &str,
        words_per_pixel: usize,
        width: usize,
        height: usize,
    ) -> Result<()> {
        let map = checked_map(map, words_per_pixel)?;
        let buffer = PixelBuffer::new(width, height, map, pixels.to_vec())?;
        self.import_pixels(&buffer)
    }

    /// Append a blank `width × height` frame and make it current.
    pub fn new_image(&mut self, width: usize, height: usize) -> Result<()> {
        let wand = self.live()?;
        if width == 0 || height == 0 {
            return Err(MagickError::InvalidInput(format!(
                "image dimensions {width}x{height} must be non-zero"
            )));
        }
        let background = PixelWand::new(self.api())?;
        // SAFETY: live wand and pixel wand.
        let status =
            unsafe { (self.api().new_image)(wand.as_ptr(), width, height, background.as_ptr()) };
        drop(background);
        self.check("MagickNewImage", status, FailureKind::Fault)?;
        self.state = WandState::Loaded;
        Ok(())
    }

    /// Metadata of frame `index`, which becomes the current frame.
    pub fn describe(&mut self, index: usize) -> Result<ImageDescriptor> {
        self.set_iterator_index(index)?;
        Ok(ImageDescriptor {
            index,
            frames: self.number_images()?,
            width: self.image_width()?,
            height: self.image_height()?,
            depth: self.image_depth()?,
            colorspace: self.image_colorspace()?,
            has_alpha: self.image_alpha_channel()?,
            format: self.image_format()?.to_ascii_uppercase(),
        })
    }

    /// Destroy the native handle. Later calls are no-ops.
    pub fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            // SAFETY: the handle is owned and destroyed exactly once.
            unsafe { (self.api().destroy_wand)(handle.as_ptr()) };
            trace!(wand = ?handle, "wand destroyed");
        }
        self.state = WandState::Disposed;
    }
}

impl Drop for Wand<'_> {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Wand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wand")
            .field("handle", &self.handle)
            .field("state", &self.state)
            .finish()
    }
}

/// Transient background color for `MagickNewImage`, destroyed on drop.
struct PixelWand<'a> {
    api: &'a MagickApi,
    ptr: NonNull<PixelWandT>,
}

impl<'a> PixelWand<'a> {
    fn new(api: &'a MagickApi) -> Result<Self> {
        // SAFETY: no preconditions beyond genesis.
        let raw = unsafe { (api.new_pixel_wand)() };
        let ptr =
            NonNull::new(raw).ok_or_else(|| MagickError::fault("NewPixelWand", "returned null"))?;
        Ok(Self { api, ptr })
    }

    fn as_ptr(&self) -> *const PixelWandT {
        self.ptr.as_ptr()
    }
}

impl Drop for PixelWand<'_> {
    fn drop(&mut self) {
        // SAFETY: owned, destroyed once.
        unsafe { (self.api.destroy_pixel_wand)(self.ptr.as_ptr()) };
    }
}

fn checked_map(map: &str, words_per_pixel: usize) -> Result<ChannelMap> {
    let map = ChannelMap::new(map)?;
    assert_eq!(
        map.len(),
        words_per_pixel,
        "channel map {map} does not have {words_per_pixel} channels"
    );
    Ok(map)
}

/// Frame depth implied by imported words.
fn import_depth(kind: StorageKind) -> Option<usize> {
    match kind {
        StorageKind::U8 => Some(8),
        StorageKind::U16 => Some(16),
        _ => None,
    }
}
