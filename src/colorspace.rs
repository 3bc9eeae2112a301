//! Native colorspace codes and their channel counts.
//!
//! The native `ColorspaceType` enum is numbered differently by ImageMagick 6
//! and 7, so code lookup goes through a per-[`ApiGeneration`] table. A code
//! outside the table is reported as `None` rather than guessed.

use core::fmt;

use crate::ffi::ApiGeneration;

/// Colorspace of a decoded frame.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Colorspace {
    Undefined,
    Cmy,
    Cmyk,
    Gray,
    Hcl,
    Hclp,
    Hsb,
    Hsi,
    Hsl,
    Hsv,
    Hwb,
    Lab,
    Lch,
    LchAb,
    LchUv,
    Log,
    Lms,
    Luv,
    Ohta,
    Rec601Luma,
    Rec601YCbCr,
    Rec709Luma,
    Rec709YCbCr,
    /// Linear RGB.
    Rgb,
    ScRgb,
    /// Non-linear sRGB, the usual colorspace of decoded files.
    Srgb,
    Transparent,
    XyY,
    Xyz,
    YCbCr,
    Ycc,
    YDbDr,
    Yiq,
    YPbPr,
    Yuv,
    LinearGray,
    Jzazbz,
    DisplayP3,
    Adobe98,
    ProPhoto,
    Oklab,
    Oklch,
}

use Colorspace::*;

/// ImageMagick 7 `ColorspaceType` order.
const V7_CODES: &[Colorspace] = &[
    Undefined,
    Cmy,
    Cmyk,
    Gray,
    Hcl,
    Hclp,
    Hsb,
    Hsi,
    Hsl,
    Hsv,
    Hwb,
    Lab,
    Lch,
    LchAb,
    LchUv,
    Log,
    Lms,
    Luv,
    Ohta,
    Rec601YCbCr,
    Rec709YCbCr,
    Rgb,
    ScRgb,
    Srgb,
    Transparent,
    XyY,
    Xyz,
    YCbCr,
    Ycc,
    YDbDr,
    Yiq,
    YPbPr,
    Yuv,
    LinearGray,
    Jzazbz,
    DisplayP3,
    Adobe98,
    ProPhoto,
    Oklab,
    Oklch,
];

/// ImageMagick 6 `ColorspaceType` order.
const V6_CODES: &[Colorspace] = &[
    Undefined,
    Rgb,
    Gray,
    Transparent,
    Ohta,
    Lab,
    Xyz,
    YCbCr,
    Ycc,
    Yiq,
    YPbPr,
    Yuv,
    Cmyk,
    Srgb,
    Hsb,
    Hsl,
    Hwb,
    Rec601Luma,
    Rec601YCbCr,
    Rec709Luma,
    Rec709YCbCr,
    Log,
    Cmy,
    Luv,
    Hcl,
    Lch,
    Lms,
    LchAb,
    LchUv,
    ScRgb,
    Hsi,
    Hsv,
    Hclp,
    YDbDr,
    XyY,
    LinearGray,
];

impl Colorspace {
    /// Look up a native code. `None` if the code is outside the table for
    /// this library generation.
    pub fn from_code(code: i64, generation: ApiGeneration) -> Option<Self> {
        let table = match generation {
            ApiGeneration::V6 => V6_CODES,
            ApiGeneration::V7 => V7_CODES,
        };
        usize::try_from(code).ok().and_then(|i| table.get(i).copied())
    }

    /// Channels exported for this colorspace when choosing a decode layout.
    ///
    /// Single-channel gray models (and `Undefined`) give 1, CMYK gives 4,
    /// every other model is a three-component space.
    pub fn channel_count(self) -> u8 {
        match self {
            Undefined | Gray | LinearGray | Rec601Luma | Rec709Luma => 1,
            Cmyk => 4,
            _ => 3,
        }
    }

    /// Whether frames in this colorspace decode as gray.
    pub fn is_gray(self) -> bool {
        self.channel_count() == 1
    }

    /// The native name without the `Colorspace` suffix.
    pub fn name(self) -> &'static str {
        match self {
            Undefined => "Undefined",
            Cmy => "CMY",
            Cmyk => "CMYK",
            Gray => "GRAY",
            Hcl => "HCL",
            Hclp => "HCLp",
            Hsb => "HSB",
            Hsi => "HSI",
            Hsl => "HSL",
            Hsv => "HSV",
            Hwb => "HWB",
            Lab => "Lab",
            Lch => "LCH",
            LchAb => "LCHab",
            LchUv => "LCHuv",
            Log => "Log",
            Lms => "LMS",
            Luv => "Luv",
            Ohta => "OHTA",
            Rec601Luma => "Rec601Luma",
            Rec601YCbCr => "Rec601YCbCr",
            Rec709Luma => "Rec709Luma",
            Rec709YCbCr => "Rec709YCbCr",
            Rgb => "RGB",
            ScRgb => "scRGB",
            Srgb => "sRGB",
            Transparent => "Transparent",
            XyY => "xyY",
            Xyz => "XYZ",
            YCbCr => "YCbCr",
            Ycc => "YCC",
            YDbDr => "YDbDr",
            Yiq => "YIQ",
            YPbPr => "YPbPr",
            Yuv => "YUV",
            LinearGray => "LinearGRAY",
            Jzazbz => "Jzazbz",
            DisplayP3 => "DisplayP3",
            Adobe98 => "Adobe98",
            ProPhoto => "ProPhoto",
            Oklab => "Oklab",
            Oklch => "Oklch",
        }
    }
}

impl fmt::Display for Colorspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn v7_common_codes() {
        assert_eq!(Colorspace::from_code(3, ApiGeneration::V7), Some(Gray));
        assert_eq!(Colorspace::from_code(23, ApiGeneration::V7), Some(Srgb));
        assert_eq!(Colorspace::from_code(2, ApiGeneration::V7), Some(Cmyk));
        assert_eq!(Colorspace::from_code(39, ApiGeneration::V7), Some(Oklch));
    }

    #[test]
    fn v6_common_codes() {
        assert_eq!(Colorspace::from_code(2, ApiGeneration::V6), Some(Gray));
        assert_eq!(Colorspace::from_code(13, ApiGeneration::V6), Some(Srgb));
        assert_eq!(Colorspace::from_code(12, ApiGeneration::V6), Some(Cmyk));
    }

    #[test]
    fn out_of_range_is_none() {
        assert_eq!(Colorspace::from_code(-1, ApiGeneration::V7), None);
        assert_eq!(
            Colorspace::from_code(V7_CODES.len() as i64, ApiGeneration::V7),
            None
        );
        assert_eq!(
            Colorspace::from_code(V6_CODES.len() as i64, ApiGeneration::V6),
            None
        );
    }

    #[test]
    fn channel_counts() {
        assert_eq!(Gray.channel_count(), 1);
        assert_eq!(LinearGray.channel_count(), 1);
        assert_eq!(Undefined.channel_count(), 1);
        assert_eq!(Cmyk.channel_count(), 4);
        assert_eq!(Srgb.channel_count(), 3);
        assert_eq!(Hsv.channel_count(), 3);
        assert_eq!(Oklab.channel_count(), 3);
    }

    #[test]
    fn tables_have_no_duplicates() {
        for table in [V6_CODES, V7_CODES] {
            for (i, a) in table.iter().enumerate() {
                assert!(!table[i + 1..].contains(a), "{a} listed twice");
            }
        }
    }

    #[test]
    fn display_uses_native_name() {
        assert_eq!(Srgb.to_string(), "sRGB");
        assert_eq!(LchAb.to_string(), "LCHab");
    }
}
