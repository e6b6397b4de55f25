//! DDS image container headers.
//!
//! Exported images are written as a DDS file: the `"DDS "` magic, a fixed 124 byte [`DdsHeader`]
//! and, for every supported format, a 20 byte [`DdsHeaderDxt10`] naming the DXGI format. The same
//! types are used to read the header of a replacement image before it's patched into a core file.

use binrw::{io::NoSeek, BinRead, BinWrite};
use derive_more::{Display, TryFrom};
use std::fmt;
use std::io::{Cursor, Read, Seek, Write};

use crate::error::{Error, Result};
use crate::format::PixelFormat;
use crate::image::ImageDescriptor;

/// Size of [`DdsHeader`] without the magic
pub const DDS_HEADER_SIZE: u32 = 124;
/// Size of [`DdsPixelFormat`]
pub const DDS_PIXEL_FORMAT_SIZE: u32 = 32;
/// Size of [`DdsHeaderDxt10`]
pub const DDS_DXT10_SIZE: u32 = 20;

pub const DDSD_CAPS: u32 = 0x1;
pub const DDSD_HEIGHT: u32 = 0x2;
pub const DDSD_WIDTH: u32 = 0x4;
pub const DDSD_PITCH: u32 = 0x8;
pub const DDSD_PIXELFORMAT: u32 = 0x1000;
pub const DDSD_MIPMAPCOUNT: u32 = 0x20000;

pub const DDPF_FOURCC: u32 = 0x4;

pub const DDSCAPS_COMPLEX: u32 = 0x8;
pub const DDSCAPS_TEXTURE: u32 = 0x1000;
pub const DDSCAPS_MIPMAP: u32 = 0x400000;

pub const RESOURCE_DIMENSION_TEXTURE2D: u32 = 3;
pub const ALPHA_MODE: u32 = 8;

pub const FOURCC_DX10: u32 = u32::from_le_bytes(*b"DX10");
pub const FOURCC_DXT1: u32 = u32::from_le_bytes(*b"DXT1");
pub const FOURCC_DXT5: u32 = u32::from_le_bytes(*b"DXT5");
pub const FOURCC_ATI1: u32 = u32::from_le_bytes(*b"ATI1");
pub const FOURCC_BC4U: u32 = u32::from_le_bytes(*b"BC4U");
pub const FOURCC_ATI2: u32 = u32::from_le_bytes(*b"ATI2");
pub const FOURCC_BC5U: u32 = u32::from_le_bytes(*b"BC5U");

/// DDS pixel format block
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq)]
#[brw(little)]
pub struct DdsPixelFormat {
    pub size: u32,
    pub flags: u32,
    pub four_cc: u32,
    pub rgb_bit_count: u32,
    pub r_bit_mask: u32,
    pub g_bit_mask: u32,
    pub b_bit_mask: u32,
    pub a_bit_mask: u32,
}

/// DDS header, always preceded by `"DDS "`
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq)]
#[brw(magic = b"DDS ", little)]
pub struct DdsHeader {
    pub size: u32,
    pub flags: u32,
    pub height: u32,
    pub width: u32,
    pub pitch_or_linear_size: u32,
    pub depth: u32,
    pub mip_map_count: u32,
    pub reserved1: [u32; 11],
    pub pixel_format: DdsPixelFormat,
    pub caps: u32,
    pub caps2: u32,
    pub caps3: u32,
    pub caps4: u32,
    pub reserved2: u32,
}

/// Extension header present when the FourCC is `DX10`
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq)]
#[brw(little)]
pub struct DdsHeaderDxt10 {
    pub dxgi_format: u32,
    pub resource_dimension: u32,
    pub misc_flag: u32,
    pub array_size: u32,
    pub misc_flags2: u32,
}

/// DXGI formats this library writes or accepts
#[allow(non_camel_case_types)]
#[derive(Debug, Display, TryFrom, Copy, Clone, PartialEq, Eq)]
#[try_from(repr)]
#[repr(u32)]
pub enum DxgiFormat {
    R8G8B8A8_UNORM = 28,
    R8G8B8A8_UNORM_SRGB = 29,
    BC1_UNORM = 71,
    BC1_UNORM_SRGB = 72,
    BC2_UNORM = 74,
    BC3_UNORM = 77,
    BC3_UNORM_SRGB = 78,
    BC4_UNORM = 80,
    BC4_SNORM = 81,
    BC5_UNORM = 83,
    BC5_SNORM = 84,
    BC6H_UF16 = 95,
    BC6H_SF16 = 96,
    BC7_UNORM = 98,
    BC7_UNORM_SRGB = 99,
}

/// The compression tag a DDS file declares
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DdsTag {
    /// A legacy FourCC code
    FourCC(u32),
    /// A DXGI format from the extension header
    Dxgi(u32),
}

impl fmt::Display for DdsTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DdsTag::FourCC(code) => {
                let bytes = code.to_le_bytes();
                if bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
                    write!(f, "{}", String::from_utf8_lossy(&bytes))
                } else {
                    write!(f, "FOURCC({code:#010x})")
                }
            }
            DdsTag::Dxgi(code) => match DxgiFormat::try_from(*code) {
                Ok(format) => write!(f, "{format}"),
                Err(_) => write!(f, "DXGI_FORMAT({code})"),
            },
        }
    }
}

/// The DXGI format written for a pixel format, `None` when it can't be exported
pub fn dxgi_format_for(format: PixelFormat) -> Option<DxgiFormat> {
    match format {
        PixelFormat::BC1 => Some(DxgiFormat::BC1_UNORM),
        PixelFormat::BC3 => Some(DxgiFormat::BC3_UNORM),
        PixelFormat::BC4U => Some(DxgiFormat::BC4_UNORM),
        PixelFormat::BC5U => Some(DxgiFormat::BC5_UNORM),
        PixelFormat::BC6U => Some(DxgiFormat::BC6H_UF16),
        PixelFormat::BC6S => Some(DxgiFormat::BC6H_SF16),
        PixelFormat::BC7 => Some(DxgiFormat::BC7_UNORM),
        PixelFormat::RGBA_8888 => Some(DxgiFormat::R8G8B8A8_UNORM),
        _ => None,
    }
}

/// Whether a replacement tagged `tag` carries data in `format`
pub fn tag_matches(format: PixelFormat, tag: DdsTag) -> bool {
    let Some(primary) = dxgi_format_for(format) else {
        return false;
    };

    match tag {
        DdsTag::Dxgi(code) => match DxgiFormat::try_from(code) {
            Ok(found) => {
                found == primary
                    || matches!(
                        (format, found),
                        (PixelFormat::BC1, DxgiFormat::BC1_UNORM_SRGB)
                            | (PixelFormat::BC3, DxgiFormat::BC3_UNORM_SRGB)
                    )
            }
            Err(_) => false,
        },
        DdsTag::FourCC(code) => match format {
            PixelFormat::BC1 => code == FOURCC_DXT1,
            PixelFormat::BC3 => code == FOURCC_DXT5,
            PixelFormat::BC4U => code == FOURCC_ATI1 || code == FOURCC_BC4U,
            PixelFormat::BC5U => code == FOURCC_ATI2 || code == FOURCC_BC5U,
            _ => false,
        },
    }
}

/// Serialized headers for an image, ready to be followed by its payload
pub fn synthesize_header(
    width: u32,
    height: u32,
    mip_count: u32,
    slices: u32,
    format: PixelFormat,
) -> Result<Vec<u8>> {
    DdsHeaders::for_image(width, height, mip_count, slices, format)?.to_bytes()
}

/// A DDS header with its optional extension
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct DdsHeaders {
    pub header: DdsHeader,
    pub dxt10: Option<DdsHeaderDxt10>,
}

impl DdsHeaders {
    /// Build the headers describing an image.
    ///
    /// Fails with [`Error::UnsupportedFormat`] for formats outside of [`dxgi_format_for`].
    pub fn for_image(
        width: u32,
        height: u32,
        mip_count: u32,
        slices: u32,
        format: PixelFormat,
    ) -> Result<DdsHeaders> {
        let dxgi = dxgi_format_for(format).ok_or(Error::UnsupportedFormat(format))?;
        let mip_count = mip_count.max(1);

        let mut flags = DDSD_CAPS | DDSD_HEIGHT | DDSD_WIDTH | DDSD_PITCH | DDSD_PIXELFORMAT;
        let mut caps = DDSCAPS_TEXTURE;
        if mip_count > 1 {
            flags |= DDSD_MIPMAPCOUNT;
            caps |= DDSCAPS_COMPLEX | DDSCAPS_MIPMAP;
        }

        Ok(DdsHeaders {
            header: DdsHeader {
                size: DDS_HEADER_SIZE,
                flags,
                height,
                width,
                mip_map_count: mip_count,
                pixel_format: DdsPixelFormat {
                    size: DDS_PIXEL_FORMAT_SIZE,
                    flags: DDPF_FOURCC,
                    four_cc: FOURCC_DX10,
                    ..Default::default()
                },
                caps,
                ..Default::default()
            },
            dxt10: Some(DdsHeaderDxt10 {
                dxgi_format: dxgi as u32,
                resource_dimension: RESOURCE_DIMENSION_TEXTURE2D,
                misc_flag: 0,
                array_size: slices.max(1),
                misc_flags2: ALPHA_MODE,
            }),
        })
    }

    /// Build the headers describing a texture's image
    pub fn for_descriptor(image: &ImageDescriptor) -> Result<DdsHeaders> {
        Self::for_image(
            image.width(),
            image.height(),
            image.mip_count(),
            image.slices(),
            image.format(),
        )
    }

    /// Read the headers from the start of a DDS file, leaving the reader at the pixel data
    pub fn read<R: Read>(reader: &mut R) -> Result<DdsHeaders> {
        let mut reader = NoSeek::new(reader);
        let header = DdsHeader::read(&mut reader)?;
        let dxt10 = match header.pixel_format.four_cc {
            FOURCC_DX10 => Some(DdsHeaderDxt10::read(&mut reader)?),
            _ => None,
        };

        Ok(DdsHeaders { header, dxt10 })
    }

    pub fn write<W: Write + Seek>(&self, writer: &mut W) -> Result<()> {
        self.header.write(writer)?;
        if let Some(dxt10) = &self.dxt10 {
            dxt10.write(writer)?;
        }
        Ok(())
    }

    /// Serialize into a freshly allocated buffer
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::with_capacity(self.encoded_len()));
        self.write(&mut buffer)?;
        Ok(buffer.into_inner())
    }

    /// Number of bytes including the magic
    pub fn encoded_len(&self) -> usize {
        let dxt10 = self.dxt10.map_or(0, |_| DDS_DXT10_SIZE);
        (4 + DDS_HEADER_SIZE + dxt10) as usize
    }

    /// The compression tag these headers declare
    pub fn tag(&self) -> DdsTag {
        match &self.dxt10 {
            Some(dxt10) if self.header.pixel_format.four_cc == FOURCC_DX10 => {
                DdsTag::Dxgi(dxt10.dxgi_format)
            }
            _ => DdsTag::FourCC(self.header.pixel_format.four_cc),
        }
    }
}
