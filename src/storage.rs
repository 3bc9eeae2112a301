//! Pixel word kinds understood by the native import/export calls.
//!
//! A [`StorageKind`] names the binary type of one channel value. The set is
//! closed: the native library only ever accepts these few word types, so each
//! kind is a plain enum case carrying its byte size and native tag, and
//! [`PixelWords`] is the matching host-array variant.

use alloc::vec::Vec;

use crate::ffi::ApiGeneration;

/// Binary type of one channel value in a pixel buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StorageKind {
    /// 8-bit unsigned integer (`CharPixel`).
    U8,
    /// 16-bit unsigned integer (`ShortPixel`).
    U16,
    /// 32-bit unsigned integer.
    U32,
    /// 64-bit unsigned integer.
    U64,
    /// 32-bit float, 0.0..=1.0 (`FloatPixel`).
    F32,
    /// 64-bit float, 0.0..=1.0 (`DoublePixel`).
    F64,
}

impl StorageKind {
    /// All kinds, smallest word first.
    pub const ALL: [StorageKind; 6] = [
        StorageKind::U8,
        StorageKind::U16,
        StorageKind::U32,
        StorageKind::U64,
        StorageKind::F32,
        StorageKind::F64,
    ];

    /// Size of one word in bytes.
    pub const fn size(self) -> usize {
        match self {
            StorageKind::U8 => 1,
            StorageKind::U16 => 2,
            StorageKind::U32 | StorageKind::F32 => 4,
            StorageKind::U64 | StorageKind::F64 => 8,
        }
    }

    /// Native `StorageType` enum value.
    ///
    /// ImageMagick 6 and 7 use the same numbering. Tag 4 is a 32-bit word in
    /// both (`IntegerPixel` in 6, `LongPixel` in 7); tag 5 is `LongPixel`
    /// (C `long`) in 6 and `LongLongPixel` (64-bit) in 7.
    pub(crate) fn native_tag(self) -> core::ffi::c_int {
        match self {
            StorageKind::U8 => 1,
            StorageKind::F64 => 2,
            StorageKind::F32 => 3,
            StorageKind::U32 => 4,
            StorageKind::U64 => 5,
            StorageKind::U16 => 7,
        }
    }

    /// Whether the native library can exchange this kind.
    ///
    /// ImageMagick 6's 64-bit `LongPixel` is a C `long`, which is only
    /// 64 bits wide on LP64 targets.
    pub fn supported_by(self, generation: ApiGeneration) -> bool {
        match (self, generation) {
            (StorageKind::U64, ApiGeneration::V6) => {
                cfg!(all(target_pointer_width = "64", not(windows)))
            }
            _ => true,
        }
    }

    /// Byte length of `words` words, or `None` on overflow.
    pub fn byte_len(self, words: usize) -> Option<usize> {
        words.checked_mul(self.size())
    }
}

/// Host-typed pixel words, one variant per [`StorageKind`].
#[derive(Clone, Debug, PartialEq)]
pub enum PixelWords {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    U64(Vec<u64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl PixelWords {
    /// Zero-filled words of the given kind.
    pub fn zeroed(kind: StorageKind, len: usize) -> Self {
        match kind {
            StorageKind::U8 => PixelWords::U8(alloc::vec![0; len]),
            StorageKind::U16 => PixelWords::U16(alloc::vec![0; len]),
            StorageKind::U32 => PixelWords::U32(alloc::vec![0; len]),
            StorageKind::U64 => PixelWords::U64(alloc::vec![0; len]),
            StorageKind::F32 => PixelWords::F32(alloc::vec![0.0; len]),
            StorageKind::F64 => PixelWords::F64(alloc::vec![0.0; len]),
        }
    }

    /// Copy native-endian bytes into a new host array of `kind`.
    ///
    /// `bytes.len()` must be a multiple of `kind.size()`; trailing bytes are
    /// ignored otherwise. The source needs no particular alignment.
    pub fn from_bytes(kind: StorageKind, bytes: &[u8]) -> Self {
        let len = bytes.len() / kind.size();
        let bytes = &bytes[..len * kind.size()];
        let mut words = Self::zeroed(kind, len);
        words.as_bytes_mut().copy_from_slice(bytes);
        words
    }

    /// The word kind.
    pub fn kind(&self) -> StorageKind {
        match self {
            PixelWords::U8(_) => StorageKind::U8,
            PixelWords::U16(_) => StorageKind::U16,
            PixelWords::U32(_) => StorageKind::U32,
            PixelWords::U64(_) => StorageKind::U64,
            PixelWords::F32(_) => StorageKind::F32,
            PixelWords::F64(_) => StorageKind::F64,
        }
    }

    /// Number of words.
    pub fn len(&self) -> usize {
        match self {
            PixelWords::U8(v) => v.len(),
            PixelWords::U16(v) => v.len(),
            PixelWords::U32(v) => v.len(),
            PixelWords::U64(v) => v.len(),
            PixelWords::F32(v) => v.len(),
            PixelWords::F64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// View of the words as native-endian bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            PixelWords::U8(v) => v,
            PixelWords::U16(v) => bytemuck::cast_slice(v),
            PixelWords::U32(v) => bytemuck::cast_slice(v),
            PixelWords::U64(v) => bytemuck::cast_slice(v),
            PixelWords::F32(v) => bytemuck::cast_slice(v),
            PixelWords::F64(v) => bytemuck::cast_slice(v),
        }
    }

    fn as_bytes_mut(&mut self) -> &mut [u8] {
        match self {
            PixelWords::U8(v) => v,
            PixelWords::U16(v) => bytemuck::cast_slice_mut(v),
            PixelWords::U32(v) => bytemuck::cast_slice_mut(v),
            PixelWords::U64(v) => bytemuck::cast_slice_mut(v),
            PixelWords::F32(v) => bytemuck::cast_slice_mut(v),
            PixelWords::F64(v) => bytemuck::cast_slice_mut(v),
        }
    }

    /// The words if they are bytes.
    pub fn as_u8(&self) -> Option<&[u8]> {
        match self {
            PixelWords::U8(v) => Some(v),
            _ => None,
        }
    }

    /// The words if they are 16-bit.
    pub fn as_u16(&self) -> Option<&[u16]> {
        match self {
            PixelWords::U16(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_u8(self) -> Option<Vec<u8>> {
        match self {
            PixelWords::U8(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_u16(self) -> Option<Vec<u16>> {
        match self {
            PixelWords::U16(v) => Some(v),
            _ => None,
        }
    }
}

impl From<Vec<u8>> for PixelWords {
    fn from(v: Vec<u8>) -> Self {
        PixelWords::U8(v)
    }
}

impl From<Vec<u16>> for PixelWords {
    fn from(v: Vec<u16>) -> Self {
        PixelWords::U16(v)
    }
}

impl From<Vec<f32>> for PixelWords {
    fn from(v: Vec<f32>) -> Self {
        PixelWords::F32(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes() {
        let sizes: Vec<usize> = StorageKind::ALL.iter().map(|k| k.size()).collect();
        assert_eq!(sizes, [1, 2, 4, 8, 4, 8]);
    }

    #[test]
    fn native_tags() {
        let tags: Vec<_> = StorageKind::ALL.iter().map(|k| k.native_tag()).collect();
        assert_eq!(tags, [1, 7, 4, 5, 3, 2]);
    }

    #[test]
    fn u64_always_supported_on_v7() {
        assert!(StorageKind::U64.supported_by(ApiGeneration::V7));
        assert!(StorageKind::U16.supported_by(ApiGeneration::V6));
    }

    #[test]
    fn byte_len_overflow() {
        assert_eq!(StorageKind::U16.byte_len(10), Some(20));
        assert_eq!(StorageKind::F64.byte_len(usize::MAX), None);
    }

    #[test]
    fn from_bytes_u16() {
        let words = PixelWords::from_bytes(StorageKind::U16, &[1, 0, 2, 0, 3]);
        assert_eq!(words.len(), 2);
        let expected: Vec<u16> = [1u16, 2]
            .iter()
            .map(|&w| u16::from_ne_bytes(w.to_le_bytes()))
            .collect();
        assert_eq!(words.as_u16(), Some(expected.as_slice()));
    }

    #[test]
    fn bytes_view_roundtrip_is_lossless() {
        let words = PixelWords::F32(vec![0.25, 1.0]);
        let copy = PixelWords::from_bytes(StorageKind::F32, words.as_bytes());
        assert_eq!(copy, words);
        assert_eq!(words.as_bytes().len(), 8);
    }

    #[test]
    fn zeroed_has_kind_and_len() {
        for kind in StorageKind::ALL {
            let words = PixelWords::zeroed(kind, 3);
            assert_eq!(words.kind(), kind);
            assert_eq!(words.len(), 3);
            assert_eq!(words.as_bytes().len(), 3 * kind.size());
        }
    }
}
