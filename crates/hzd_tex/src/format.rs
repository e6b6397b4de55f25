//! Closed enumerations stored inside image descriptors.

use derive_more::{Display, TryFrom};

#[cfg(feature = "serde")]
use serde::Serialize;

/// Pixel format of an image as stored in the core file.
///
/// The value is stored as a single byte. Block compressed formats start at [`PixelFormat::BC1`].
#[allow(non_camel_case_types)]
#[derive(Debug, Display, TryFrom, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[try_from(repr)]
#[repr(u8)]
pub enum PixelFormat {
    RGBA_5551 = 0x00,
    RGBA_5551_REV = 0x01,
    RGBA_4444 = 0x02,
    RGBA_4444_REV = 0x03,
    RGB_888_32 = 0x04,
    RGB_888_32_REV = 0x05,
    RGB_888 = 0x06,
    RGB_888_REV = 0x07,
    RGB_565 = 0x08,
    RGB_565_REV = 0x09,
    RGB_555 = 0x0A,
    RGB_555_REV = 0x0B,
    RGBA_8888 = 0x0C,
    RGBA_8888_REV = 0x0D,
    RGBE_REV = 0x0E,
    RGBA_FLOAT_32 = 0x0F,
    RGB_FLOAT_32 = 0x10,
    RG_FLOAT_32 = 0x11,
    R_FLOAT_32 = 0x12,
    RGBA_FLOAT_16 = 0x13,
    RGB_FLOAT_16 = 0x14,
    RG_FLOAT_16 = 0x15,
    R_FLOAT_16 = 0x16,
    RGBA_UNORM_32 = 0x17,
    RG_UNORM_32 = 0x18,
    R_UNORM_32 = 0x19,
    RGBA_UNORM_16 = 0x1A,
    RG_UNORM_16 = 0x1B,
    R_UNORM_16 = 0x1C,
    RGBA_UNORM_8 = 0x1D,
    RG_UNORM_8 = 0x1E,
    R_UNORM_8 = 0x1F,
    RGBA_NORM_32 = 0x20,
    RG_NORM_32 = 0x21,
    R_NORM_32 = 0x22,
    RGBA_NORM_16 = 0x23,
    RG_NORM_16 = 0x24,
    R_NORM_16 = 0x25,
    RGBA_NORM_8 = 0x26,
    RG_NORM_8 = 0x27,
    R_NORM_8 = 0x28,
    RGBA_UINT_32 = 0x29,
    RG_UINT_32 = 0x2A,
    R_UINT_32 = 0x2B,
    RGBA_UINT_16 = 0x2C,
    RG_UINT_16 = 0x2D,
    R_UINT_16 = 0x2E,
    RGBA_UINT_8 = 0x2F,
    RG_UINT_8 = 0x30,
    R_UINT_8 = 0x31,
    RGBA_INT_32 = 0x32,
    RG_INT_32 = 0x33,
    R_INT_32 = 0x34,
    RGBA_INT_16 = 0x35,
    RG_INT_16 = 0x36,
    R_INT_16 = 0x37,
    RGBA_INT_8 = 0x38,
    RG_INT_8 = 0x39,
    R_INT_8 = 0x3A,
    RGB_FLOAT_11_11_10 = 0x3B,
    RGBA_UNORM_10_10_10_2 = 0x3C,
    RGB_UNORM_11_11_10 = 0x3D,
    DEPTH_FLOAT_32_STENCIL_8 = 0x3E,
    DEPTH_FLOAT_32_STENCIL_0 = 0x3F,
    DEPTH_24_STENCIL_8 = 0x40,
    DEPTH_16_STENCIL_0 = 0x41,
    BC1 = 0x42,
    BC2 = 0x43,
    BC3 = 0x44,
    BC4U = 0x45,
    BC4S = 0x46,
    BC5U = 0x47,
    BC5S = 0x48,
    BC6U = 0x49,
    BC6S = 0x4A,
    BC7 = 0x4B,
}

/// Dimensionality of an image
#[derive(Debug, Display, TryFrom, Copy, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[try_from(repr)]
#[repr(u16)]
pub enum ImageKind {
    #[default]
    #[display("2D")]
    Texture2D = 0,
    #[display("3D")]
    Texture3D = 1,
    #[display("CubeMap")]
    CubeMap = 2,
    #[display("2DArray")]
    Texture2DArray = 3,
}

/// Which interpretation of the descriptor header is used while reading.
///
/// Both revisions occupy the same twelve bytes in front of the descriptor magic:
///
/// | Offset | Current                | Legacy                          |
/// |--------|------------------------|---------------------------------|
/// | 0x00   | kind (u16)             | unknown (u16)                   |
/// | 0x02   | width (14 + 2 bits)    | width (14 + 2 bits)             |
/// | 0x04   | height (14 + 2 bits)   | height (14 + 2 bits)            |
/// | 0x06   | slices (u16)           | unknown (u16)                   |
/// | 0x08   | mip count (u8)         | format word byte 0 (unknown)    |
/// | 0x09   | format (u8)            | format word byte 1 (format)     |
/// | 0x0A   | attributes (2 bytes)   | format word bytes 2-3 (unknown) |
///
/// There is no marker in the file telling the revisions apart, so the caller picks one.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum LayoutRevision {
    /// Kind, slices and mip count are interpreted
    #[default]
    Current,

    /// Only the size and the format are interpreted, the image is treated as a single 2D mip
    Legacy,
}
