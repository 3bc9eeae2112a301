//! Per-call scratch memory for buffers handed to native calls.
//!
//! A [`ScopedArena`] only exists for the duration of a closure passed to
//! [`with_arena`] or [`call_with_arena`]. Everything it hands out borrows the
//! arena, so no pointer into the region survives the call, and the whole
//! region is freed at once when the closure returns, fails or unwinds.

use core::ffi::CStr;

use bumpalo::Bump;
use tracing::trace;

use crate::error::{MagickError, Result};
use crate::storage::{PixelWords, StorageKind};

/// Bump region lent to one logical native operation.
pub struct ScopedArena {
    bump: Bump,
}

impl ScopedArena {
    fn new() -> Self {
        Self { bump: Bump::new() }
    }

    /// NUL-terminated copy of `s`.
    ///
    /// Strings with an interior NUL cannot cross the C boundary intact and
    /// are rejected.
    pub fn c_str(&self, s: &str) -> Result<&CStr> {
        let buf = self.bump.alloc_slice_fill_copy(s.len() + 1, 0u8);
        buf[..s.len()].copy_from_slice(s.as_bytes());
        CStr::from_bytes_with_nul(buf)
            .map_err(|_| MagickError::InvalidInput(format!("interior NUL in {s:?}")))
    }

    /// Zeroed buffer for `words` words of `kind`, aligned for any word kind.
    pub fn words(&self, kind: StorageKind, words: usize) -> Result<&mut [u8]> {
        let len = kind.byte_len(words).ok_or_else(|| {
            MagickError::InvalidInput(format!("{words} {kind:?} words overflow usize"))
        })?;
        let backing = self.bump.alloc_slice_fill_copy(len.div_ceil(8), 0u64);
        let bytes: &mut [u8] = bytemuck::cast_slice_mut(backing);
        Ok(&mut bytes[..len])
    }

    /// Aligned copy of host words.
    pub fn copy_words(&self, words: &PixelWords) -> Result<&[u8]> {
        let buf = self.words(words.kind(), words.len())?;
        buf.copy_from_slice(words.as_bytes());
        Ok(buf)
    }

    /// Bytes currently reserved by the region.
    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }
}

impl Drop for ScopedArena {
    fn drop(&mut self) {
        trace!(bytes = self.bump.allocated_bytes(), "arena released");
    }
}

/// Run `body` with a fresh arena; the region is released on every exit path.
pub fn with_arena<F>(body: F) -> Result<()>
where
    F: FnOnce(&ScopedArena) -> Result<()>,
{
    call_with_arena(body)
}

/// Like [`with_arena`], returning the closure's value.
pub fn call_with_arena<T, F>(body: F) -> Result<T>
where
    F: FnOnce(&ScopedArena) -> Result<T>,
{
    let arena = ScopedArena::new();
    body(&arena)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn c_str_is_nul_terminated() {
        let s = call_with_arena(|arena| Ok(arena.c_str("RGBA")?.to_bytes_with_nul().to_vec()))
            .unwrap();
        assert_eq!(s, b"RGBA\0");
    }

    #[test]
    fn interior_nul_rejected() {
        let err = with_arena(|arena| arena.c_str("PN\0G").map(|_| ())).unwrap_err();
        assert!(matches!(err, MagickError::InvalidInput(_)));
    }

    #[test]
    fn word_buffers_are_zeroed_and_aligned() {
        with_arena(|arena| {
            let _pad = arena.c_str("x")?;
            for kind in StorageKind::ALL {
                let buf = arena.words(kind, 5)?;
                assert_eq!(buf.len(), 5 * kind.size());
                assert!(buf.iter().all(|&b| b == 0));
                assert_eq!(buf.as_ptr() as usize % 8, 0);
            }
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn word_count_overflow() {
        let err = with_arena(|arena| arena.words(StorageKind::U64, usize::MAX).map(|_| ()))
            .unwrap_err();
        assert!(matches!(err, MagickError::InvalidInput(_)));
    }

    #[test]
    fn copy_words_preserves_bytes() {
        let words = PixelWords::U16(vec![1, 0x0203, 0xffff]);
        let copied = call_with_arena(|arena| Ok(arena.copy_words(&words)?.to_vec())).unwrap();
        assert_eq!(copied, words.as_bytes());
    }

    #[test]
    fn error_from_body_propagates() {
        let err = call_with_arena::<(), _>(|_| Err(MagickError::State("closed"))).unwrap_err();
        assert!(matches!(err, MagickError::State("closed")));
    }

    #[test]
    fn region_grows_with_allocations() {
        call_with_arena(|arena| {
            let before = arena.allocated_bytes();
            arena.words(StorageKind::U8, 64 * 1024)?;
            assert!(arena.allocated_bytes() > before);
            Ok(())
        })
        .unwrap();
    }
}
