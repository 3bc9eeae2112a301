//! # zenmagick
//!
//! Resource-safe runtime binding to the ImageMagick MagickWand C API
//! (ImageMagick 6 or 7), limited to decode, encode and format queries.
//!
//! The library is located and bound at runtime; nothing links against
//! ImageMagick at build time. Set `ZENMAGICK_LIBRARY` to point at a specific
//! build, or configure candidates with [`LoaderConfig`].
//!
//! - [`Magick`]: library lifecycle, process-wide [`Magick::global`] instance,
//!   [`convert_blob`](Magick::convert_blob), [`can_read`](Magick::can_read),
//!   [`query_formats`](Magick::query_formats)
//! - [`Wand`]: one native context with typed pixel import and export
//! - [`DecodeRequest`] / [`EncodeRequest`]: one-shot decode and encode
//! - [`ImageReader`]: frame-indexed reader over one input
//! - [`PixelData`]: typed pixel buffer enum over `imgref::ImgVec`
//! - [`with_arena`] / [`call_with_arena`]: scoped native scratch memory
//!
//! ## Usage
//!
//! ```rust,no_run
//! use zenmagick::{DecodeRequest, EncodeRequest, Magick};
//!
//! let data: &[u8] = &[]; // your image bytes
//! let magick = Magick::global()?;
//! if magick.can_read(data)? {
//!     let decoded = DecodeRequest::new(data).decode()?;
//!     let png = EncodeRequest::new("PNG").encode_pixels(&decoded.pixels)?;
//!     # let _ = png;
//! }
//! # Ok::<(), zenmagick::MagickError>(())
//! ```

extern crate alloc;

mod arena;
mod colorspace;
mod config;
mod decode;
mod encode;
mod error;
mod exception;
mod ffi;
mod info;
mod limits;
mod magick;
mod pixel;
mod reader;
mod registry;
mod storage;
mod wand;

pub use arena::{ScopedArena, call_with_arena, with_arena};
pub use colorspace::Colorspace;
pub use config::{DEFAULT_CANDIDATES, LIBRARY_ENV, LoaderConfig};
pub use decode::{DecodeLayout, DecodeOutput, DecodeRequest};
pub use encode::{EncodeOutput, EncodeRequest};
pub use error::{MagickError, Result};
pub use exception::{ExceptionLevel, ExceptionSeverity};
pub use ffi::ApiGeneration;
pub use info::ImageDescriptor;
pub use limits::Limits;
pub use magick::Magick;
pub use pixel::{ChannelMap, PixelBuffer, PixelData};
pub use reader::ImageReader;
pub use registry::FormatRegistry;
pub use storage::{PixelWords, StorageKind};
pub use wand::{Wand, WandState};

pub use imgref::{Img, ImgRef, ImgVec};
pub use rgb::{Gray, Rgb, Rgba};
