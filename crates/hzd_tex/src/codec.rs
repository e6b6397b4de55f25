//! Fixed layout field readers and writers shared by all records.
//!
//! All multi-byte integers are little-endian. Readers only advance the cursor, running past the end
//! of the input surfaces as an [`std::io::ErrorKind::UnexpectedEof`] error.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

use crate::error::{CorruptionError, Error, Result};
use crate::format::{ImageKind, PixelFormat};

/// A length prefixed string carrying a 32-bit hash of its contents.
///
/// | Field  | Size                               |
/// |--------|------------------------------------|
/// | Length | 4 bytes                            |
/// | Hash   | 4 bytes, absent when length is 0   |
/// | Data   | Length bytes, one byte a character |
///
/// The hash is never verified, it's kept so the string can be written back unchanged. Each byte
/// maps to the character with the same code point, so any byte sequence round trips.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HashedString {
    pub value: String,
    pub hash: u32,
}

impl HashedString {
    pub fn read<R: Read>(reader: &mut R) -> Result<HashedString> {
        let len = reader.read_u32::<LittleEndian>()? as usize;
        if len == 0 {
            return Ok(HashedString::default());
        }

        let hash = reader.read_u32::<LittleEndian>()?;

        Ok(HashedString {
            value: decode_latin1(&read_bytes(reader, len as u64)?),
            hash,
        })
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        let bytes = encode_latin1(&self.value)?;
        writer.write_u32::<LittleEndian>(bytes.len() as u32)?;
        if bytes.is_empty() {
            return Ok(());
        }

        writer.write_u32::<LittleEndian>(self.hash)?;
        writer.write_all(&bytes)?;
        Ok(())
    }

    /// Number of bytes this string occupies on disk
    pub fn encoded_len(&self) -> usize {
        match self.value.chars().count() {
            0 => 4,
            len => 8 + len,
        }
    }
}

impl std::fmt::Display for HashedString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

/// Read exactly `len` bytes.
///
/// The buffer grows with the data actually read, so a bogus length fails with
/// [`std::io::ErrorKind::UnexpectedEof`] instead of allocating it up front.
pub fn read_bytes<R: Read>(reader: &mut R, len: u64) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    reader.by_ref().take(len).read_to_end(&mut buffer)?;
    if (buffer.len() as u64) < len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("expected {len} bytes, found {}", buffer.len()),
        )
        .into());
    }
    Ok(buffer)
}

/// One character per byte
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// One byte per character, failing for characters above U+00FF
pub fn encode_latin1(value: &str) -> Result<Vec<u8>> {
    value
        .chars()
        .map(|c| u8::try_from(c).map_err(|_| Error::UnencodableString(value.to_owned())))
        .collect()
}

/// Width and height of an image.
///
/// Descriptors pack each dimension into a 16-bit word: the low 14 bits hold the size and the
/// high 2 bits a crop indicator. Composite textures store their initial size as two plain u32.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
    pub width_crop: u8,
    pub height_crop: u8,
}

const SIZE_MASK: u16 = 0x3fff;

impl ImageSize {
    pub fn read_packed<R: Read>(reader: &mut R) -> Result<ImageSize> {
        let width = reader.read_u16::<LittleEndian>()?;
        let height = reader.read_u16::<LittleEndian>()?;

        Ok(ImageSize {
            width: (width & SIZE_MASK) as u32,
            height: (height & SIZE_MASK) as u32,
            width_crop: (width >> 14) as u8,
            height_crop: (height >> 14) as u8,
        })
    }

    pub fn write_packed<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u16::<LittleEndian>(pack(self.width, self.width_crop))?;
        writer.write_u16::<LittleEndian>(pack(self.height, self.height_crop))?;
        Ok(())
    }

    pub fn read_plain<R: Read>(reader: &mut R) -> Result<ImageSize> {
        Ok(ImageSize {
            width: reader.read_u32::<LittleEndian>()?,
            height: reader.read_u32::<LittleEndian>()?,
            ..Default::default()
        })
    }

    pub fn write_plain<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LittleEndian>(self.width)?;
        writer.write_u32::<LittleEndian>(self.height)?;
        Ok(())
    }
}

fn pack(size: u32, crop: u8) -> u16 {
    (size as u16 & SIZE_MASK) | ((crop as u16 & 0x3) << 14)
}

/// The four bytes between the slice count and the descriptor magic.
///
/// The pixel format always lives in the second byte. Under [`crate::format::LayoutRevision::Current`]
/// the first byte is the mip count and the last two are texture attributes, older files leave all
/// three uninterpreted.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FormatWord {
    pub bytes: [u8; 4],
    pub format: PixelFormat,
}

impl FormatWord {
    pub fn read<R: Read>(reader: &mut R) -> Result<FormatWord> {
        let mut bytes = [0u8; 4];
        reader.read_exact(&mut bytes)?;

        Ok(FormatWord {
            bytes,
            format: read_pixel_format(bytes[1])?,
        })
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.bytes)?;
        Ok(())
    }

    /// Mip count under the current layout
    pub fn mip_count(&self) -> u8 {
        self.bytes[0]
    }
}

impl Default for FormatWord {
    fn default() -> Self {
        Self {
            bytes: [0u8; 4],
            format: PixelFormat::RGBA_5551,
        }
    }
}

/// Map a stored format byte to its [`PixelFormat`]
pub fn read_pixel_format(value: u8) -> Result<PixelFormat> {
    PixelFormat::try_from(value).map_err(|_| CorruptionError::UnknownPixelFormat(value).into())
}

/// Map a stored kind word to its [`ImageKind`]
pub fn read_image_kind(value: u16) -> Result<ImageKind> {
    ImageKind::try_from(value).map_err(|_| CorruptionError::UnknownImageKind(value).into())
}
