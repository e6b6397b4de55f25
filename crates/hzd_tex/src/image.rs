//! Image metadata blocks owned by texture records.
//!
//! ## Layout
//!
//! | Offset (bytes) | Field          | Description                                                 |
//! |----------------|----------------|-------------------------------------------------------------|
//! | 0x0000         | Kind           | 2 bytes: [`ImageKind`]                                      |
//! | 0x0002         | Width          | 2 bytes: 14 bit size, 2 bit crop                            |
//! | 0x0004         | Height         | 2 bytes: 14 bit size, 2 bit crop                            |
//! | 0x0006         | Slices         | 2 bytes: array slices or depth                              |
//! | 0x0008         | Format word    | 4 bytes: mip count, [`PixelFormat`], 2 attribute bytes      |
//! | 0x000C         | Magic          | 4 bytes: `00 A9 FF 00`                                      |
//! | 0x0010         | Hash           | 16 bytes: content hash, not verified                        |
//! | 0x0020         | Chunk size     | 4 bytes: size of the payload chunk                          |
//! | 0x0024         | Embedded size  | 4 bytes: bytes stored inline at the end of this block       |
//! | 0x0028         | Streamed size  | 4 bytes: bytes stored in the `.stream` file                 |
//!
//! When the streamed size is non zero a [`StreamLocation`] follows: streamed mip count (4 bytes),
//! cache key length (4 bytes), cache key, offset (8 bytes) and length (8 bytes). Otherwise
//! `chunk size - 8 - embedded size` bytes of padding follow. The block ends with the embedded bytes.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Seek, Write};
use tracing::trace;

use crate::codec::{
    decode_latin1, encode_latin1, read_bytes, read_image_kind, FormatWord, ImageSize,
};
use crate::error::{CorruptionError, Error, Result};
use crate::format::{ImageKind, LayoutRevision, PixelFormat};
use crate::preview::Preview;

/// Fixed bytes every descriptor carries after its format word
pub const DESCRIPTOR_MAGIC: [u8; 4] = [0x00, 0xA9, 0xFF, 0x00];

/// Size of the embedded and streamed size fields counted by the chunk size
const PAYLOAD_SIZES_LEN: u32 = 8;

/// Where the out-of-line part of an image lives
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamLocation {
    /// How many of the mips are stored in the `.stream` file
    pub mip_count: u32,
    /// Cache key of the streamed data
    pub cache_key: String,
    /// Absolute offset into the `.stream` file
    pub offset: u64,
    /// Number of bytes at that offset
    pub length: u64,
}

/// Metadata of a single image and its embedded payload.
///
/// Descriptors are created when a core file is loaded. Only the payload bytes change afterwards and
/// their length never does.
#[derive(Debug, Clone, Default)]
pub struct ImageDescriptor {
    revision: LayoutRevision,
    declared_size: u64,
    kind_word: u16,
    kind: ImageKind,
    size: ImageSize,
    slice_word: u16,
    format_word: FormatWord,
    hash: [u8; 16],
    chunk_size: u32,
    embedded_size: u32,
    streamed_size: u32,
    stream: Option<StreamLocation>,
    padding: Vec<u8>,
    embedded_offset: u64,
    embedded_data: Vec<u8>,
    pub(crate) preview: Option<Preview>,
}

impl ImageDescriptor {
    /// Read a descriptor occupying exactly `size` bytes at the reader's position.
    ///
    /// A size of zero produces an empty descriptor without touching the reader.
    pub fn read<R: Read + Seek>(
        reader: &mut R,
        size: u64,
        revision: LayoutRevision,
    ) -> Result<ImageDescriptor> {
        let start = reader.stream_position()?;
        if size == 0 {
            return Ok(ImageDescriptor {
                revision,
                ..Default::default()
            });
        }

        let kind_word = reader.read_u16::<LittleEndian>()?;
        let kind = match revision {
            LayoutRevision::Current => read_image_kind(kind_word)?,
            LayoutRevision::Legacy => ImageKind::Texture2D,
        };
        let image_size = ImageSize::read_packed(reader)?;
        let slice_word = reader.read_u16::<LittleEndian>()?;
        let format_word = FormatWord::read(reader)?;

        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if magic != DESCRIPTOR_MAGIC {
            return Err(CorruptionError::InvalidMagic(magic).into());
        }

        let mut hash = [0u8; 16];
        reader.read_exact(&mut hash)?;

        let chunk_size = reader.read_u32::<LittleEndian>()?;
        let embedded_size = reader.read_u32::<LittleEndian>()?;
        let streamed_size = reader.read_u32::<LittleEndian>()?;

        let mut stream = None;
        let mut padding = Vec::new();
        if streamed_size > 0 {
            let mip_count = reader.read_u32::<LittleEndian>()?;
            let key_len = reader.read_u32::<LittleEndian>()?;
            let key = read_bytes(reader, key_len as u64)?;
            let offset = reader.read_u64::<LittleEndian>()?;
            let length = reader.read_u64::<LittleEndian>()?;

            stream = Some(StreamLocation {
                mip_count,
                cache_key: decode_latin1(&key),
                offset,
                length,
            });
        } else {
            let padding_len = chunk_size
                .checked_sub(PAYLOAD_SIZES_LEN)
                .and_then(|remaining| remaining.checked_sub(embedded_size))
                .ok_or(CorruptionError::InvalidPadding {
                    chunk_size,
                    embedded_size,
                })?;
            padding = read_bytes(reader, padding_len as u64)?;
        }

        let embedded_offset = reader.stream_position()?;
        let embedded_data = read_bytes(reader, embedded_size as u64)?;

        let end = reader.stream_position()?;
        if end != start + size {
            return Err(CorruptionError::SizeMismatch {
                expected: start + size,
                actual: end,
            }
            .into());
        }

        trace!(
            width = image_size.width,
            height = image_size.height,
            format = %format_word.format,
            embedded_size,
            streamed_size,
            "read image descriptor"
        );

        Ok(ImageDescriptor {
            revision,
            declared_size: size,
            kind_word,
            kind,
            size: image_size,
            slice_word,
            format_word,
            hash,
            chunk_size,
            embedded_size,
            streamed_size,
            stream,
            padding,
            embedded_offset,
            embedded_data,
            preview: None,
        })
    }

    /// Write the descriptor exactly as it was read
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        if self.is_empty() {
            return Ok(());
        }

        writer.write_u16::<LittleEndian>(self.kind_word)?;
        self.size.write_packed(writer)?;
        writer.write_u16::<LittleEndian>(self.slice_word)?;
        self.format_word.write(writer)?;
        writer.write_all(&DESCRIPTOR_MAGIC)?;
        writer.write_all(&self.hash)?;
        writer.write_u32::<LittleEndian>(self.chunk_size)?;
        writer.write_u32::<LittleEndian>(self.embedded_size)?;
        writer.write_u32::<LittleEndian>(self.streamed_size)?;

        match &self.stream {
            Some(stream) => {
                writer.write_u32::<LittleEndian>(stream.mip_count)?;
                let key = encode_latin1(&stream.cache_key)?;
                writer.write_u32::<LittleEndian>(key.len() as u32)?;
                writer.write_all(&key)?;
                writer.write_u64::<LittleEndian>(stream.offset)?;
                writer.write_u64::<LittleEndian>(stream.length)?;
            }
            None => writer.write_all(&self.padding)?,
        }

        writer.write_all(&self.embedded_data)?;
        Ok(())
    }

    /// Whether this descriptor was read from a zero sized slot
    pub fn is_empty(&self) -> bool {
        self.declared_size == 0
    }

    /// Number of bytes the descriptor occupies in the core file
    pub fn declared_size(&self) -> u64 {
        self.declared_size
    }

    pub fn revision(&self) -> LayoutRevision {
        self.revision
    }

    pub fn kind(&self) -> ImageKind {
        self.kind
    }

    pub fn size(&self) -> ImageSize {
        self.size
    }

    pub fn width(&self) -> u32 {
        self.size.width
    }

    pub fn height(&self) -> u32 {
        self.size.height
    }

    /// Number of array slices, legacy layouts always report one
    pub fn slices(&self) -> u32 {
        match self.revision {
            LayoutRevision::Current => self.slice_word as u32,
            LayoutRevision::Legacy => 1,
        }
    }

    /// Total number of mips, legacy layouts always report one
    pub fn mip_count(&self) -> u32 {
        match self.revision {
            LayoutRevision::Current => self.format_word.mip_count() as u32,
            LayoutRevision::Legacy => 1,
        }
    }

    /// Number of mips stored in the `.stream` file
    pub fn streamed_mip_count(&self) -> u32 {
        self.stream.as_ref().map_or(0, |s| s.mip_count)
    }

    pub fn format(&self) -> PixelFormat {
        self.format_word.format
    }

    pub fn hash(&self) -> &[u8; 16] {
        &self.hash
    }

    pub fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    pub fn embedded_size(&self) -> u32 {
        self.embedded_size
    }

    pub fn streamed_size(&self) -> u32 {
        self.streamed_size
    }

    pub fn stream(&self) -> Option<&StreamLocation> {
        self.stream.as_ref()
    }

    pub fn has_streamed_data(&self) -> bool {
        self.streamed_size > 0
    }

    pub fn has_embedded_data(&self) -> bool {
        self.embedded_size > 0
    }

    /// Absolute offset of the embedded bytes in the core file
    pub fn embedded_offset(&self) -> u64 {
        self.embedded_offset
    }

    pub fn embedded_data(&self) -> &[u8] {
        &self.embedded_data
    }

    /// Swap the in-memory embedded bytes for data of the same length
    pub(crate) fn replace_embedded(&mut self, data: Vec<u8>) -> Result<()> {
        if data.len() != self.embedded_data.len() {
            return Err(Error::LengthMismatch {
                expected: self.embedded_data.len() as u64,
                actual: data.len() as u64,
            });
        }
        self.embedded_data = data;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test {
    use pretty_assertions::assert_eq;
    use std::io::Cursor;
    use tracing_test::traced_test;

    use super::ImageDescriptor;
    use crate::error::{CorruptionError, Error, Result};
    use crate::format::{ImageKind, LayoutRevision, PixelFormat};

    /// BC1 4x4 with one mip and an 8 byte embedded payload
    #[rustfmt::skip]
    pub(crate) const EMBEDDED_BC1: [u8; 56] = [
        0x00, 0x00,             // Kind
        0x04, 0x00, 0x04, 0x00, // Size
        0x00, 0x00,             // Slices
        0x01, 0x42, 0x00, 0x00, // Mips, format, attributes
        0x00, 0xA9, 0xFF, 0x00, // Magic
        0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x11,
        0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x11,
        0x14, 0x00, 0x00, 0x00, // Chunk size
        0x08, 0x00, 0x00, 0x00, // Embedded size
        0x00, 0x00, 0x00, 0x00, // Streamed size
        0xAA, 0xBB, 0xCC, 0xDD, // Padding
        0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08,
    ];

    /// BC7 2D array, 256x128, 9 mips, 3 slices, 64 KiB streamed at 0x1000
    #[rustfmt::skip]
    pub(crate) const STREAMED_BC7: [u8; 77] = [
        0x03, 0x00,             // Kind
        0x00, 0x01, 0x80, 0x00, // Size
        0x03, 0x00,             // Slices
        0x09, 0x4B, 0x00, 0x00, // Mips, format, attributes
        0x00, 0xA9, 0xFF, 0x00, // Magic
        0x22, 0x22, 0x22, 0x22, 0x22, 0x22, 0x22, 0x22,
        0x22, 0x22, 0x22, 0x22, 0x22, 0x22, 0x22, 0x22,
        0x2D, 0x00, 0x00, 0x00, // Chunk size
        0x00, 0x00, 0x00, 0x00, // Embedded size
        0x00, 0x00, 0x01, 0x00, // Streamed size
        0x07, 0x00, 0x00, 0x00, // Streamed mips
        0x09, 0x00, 0x00, 0x00, // Cache key
        b'c', b'a', b'c', b'h', b'e', b':', b't', b'e', b'x',
        0x00, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // Offset
        0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, // Length
    ];

    #[traced_test]
    #[test]
    fn read_embedded_descriptor() -> Result<()> {
        let mut input = Cursor::new(EMBEDDED_BC1.to_vec());
        let image = ImageDescriptor::read(&mut input, 56, LayoutRevision::Current)?;

        assert_eq!(image.kind(), ImageKind::Texture2D);
        assert_eq!(image.width(), 4);
        assert_eq!(image.height(), 4);
        assert_eq!(image.mip_count(), 1);
        assert_eq!(image.format(), PixelFormat::BC1);
        assert_eq!(image.hash(), &[0x11; 16]);
        assert!(image.has_embedded_data());
        assert!(!image.has_streamed_data());
        assert_eq!(image.stream(), None);
        assert_eq!(image.embedded_offset(), 48);
        assert_eq!(
            image.embedded_data(),
            &[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]
        );
        assert_eq!(input.position(), 56);

        Ok(())
    }

    #[traced_test]
    #[test]
    fn read_streamed_descriptor() -> Result<()> {
        let mut input = Cursor::new(STREAMED_BC7.to_vec());
        let image = ImageDescriptor::read(&mut input, 77, LayoutRevision::Current)?;

        assert_eq!(image.kind(), ImageKind::Texture2DArray);
        assert_eq!(image.width(), 256);
        assert_eq!(image.height(), 128);
        assert_eq!(image.slices(), 3);
        assert_eq!(image.mip_count(), 9);
        assert_eq!(image.streamed_mip_count(), 7);
        assert_eq!(image.format(), PixelFormat::BC7);
        assert_eq!(image.streamed_size(), 65536);

        let stream = image.stream().expect("stream location");
        assert_eq!(stream.cache_key, "cache:tex");
        assert_eq!(stream.offset, 0x1000);
        assert_eq!(stream.length, 65536);
        assert!(image.embedded_data().is_empty());

        Ok(())
    }

    #[test]
    fn read_legacy_descriptor() -> Result<()> {
        let mut input = Cursor::new(STREAMED_BC7.to_vec());
        let image = ImageDescriptor::read(&mut input, 77, LayoutRevision::Legacy)?;

        assert_eq!(image.kind(), ImageKind::Texture2D);
        assert_eq!(image.slices(), 1);
        assert_eq!(image.mip_count(), 1);
        assert_eq!(image.format(), PixelFormat::BC7);

        Ok(())
    }

    #[test]
    fn read_zero_sized_descriptor() -> Result<()> {
        let mut input = Cursor::new(EMBEDDED_BC1.to_vec());
        let image = ImageDescriptor::read(&mut input, 0, LayoutRevision::Current)?;

        assert!(image.is_empty());
        assert_eq!(input.position(), 0);

        let mut output = Vec::new();
        image.write(&mut output)?;
        assert!(output.is_empty());

        Ok(())
    }

    #[test]
    fn read_invalid_magic() {
        let mut data = EMBEDDED_BC1.to_vec();
        data[13] = 0xA8;

        match ImageDescriptor::read(&mut Cursor::new(data), 56, LayoutRevision::Current) {
            Err(Error::Corrupt(e)) => {
                assert_eq!(e, CorruptionError::InvalidMagic([0x00, 0xA8, 0xFF, 0x00]))
            }
            other => panic!("expected invalid magic, got {other:?}"),
        }
    }

    #[test]
    fn read_size_mismatch() {
        let mut data = EMBEDDED_BC1.to_vec();
        data.extend_from_slice(&[0u8; 4]);

        match ImageDescriptor::read(&mut Cursor::new(data), 60, LayoutRevision::Current) {
            Err(Error::Corrupt(e)) => assert_eq!(
                e,
                CorruptionError::SizeMismatch {
                    expected: 60,
                    actual: 56
                }
            ),
            other => panic!("expected size mismatch, got {other:?}"),
        }
    }

    #[test]
    fn read_invalid_padding() {
        let mut data = EMBEDDED_BC1.to_vec();
        // Chunk size too small for the embedded bytes
        data[32] = 0x0C;

        match ImageDescriptor::read(&mut Cursor::new(data), 56, LayoutRevision::Current) {
            Err(Error::Corrupt(e)) => assert_eq!(
                e,
                CorruptionError::InvalidPadding {
                    chunk_size: 12,
                    embedded_size: 8
                }
            ),
            other => panic!("expected invalid padding, got {other:?}"),
        }
    }

    #[test]
    fn read_unknown_kind() {
        let mut data = EMBEDDED_BC1.to_vec();
        data[0] = 0x09;

        match ImageDescriptor::read(&mut Cursor::new(data), 56, LayoutRevision::Current) {
            Err(Error::Corrupt(e)) => assert_eq!(e, CorruptionError::UnknownImageKind(9)),
            other => panic!("expected unknown kind, got {other:?}"),
        }
    }

    #[test]
    fn write_matches_input() -> Result<()> {
        for (input, size) in [(&EMBEDDED_BC1[..], 56), (&STREAMED_BC7[..], 77)] {
            let image =
                ImageDescriptor::read(&mut Cursor::new(input.to_vec()), size, LayoutRevision::Current)?;

            let mut output = Vec::new();
            image.write(&mut output)?;
            assert_eq!(format!("{:02X?}", output), format!("{:02X?}", input));
        }

        Ok(())
    }

    #[test]
    fn replace_embedded_keeps_length() -> Result<()> {
        let mut image = ImageDescriptor::read(
            &mut Cursor::new(EMBEDDED_BC1.to_vec()),
            56,
            LayoutRevision::Current,
        )?;

        assert!(image.replace_embedded(vec![0u8; 4]).is_err());
        image.replace_embedded(vec![0xFF; 8])?;
        assert_eq!(image.embedded_data(), &[0xFF; 8]);

        Ok(())
    }
}
