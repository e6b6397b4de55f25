//! Records stored in a core file.
//!
//! Every record starts with a 12 byte header: an 8 byte type tag and a 4 byte size counting the bytes
//! that follow it. Texture records are parsed, everything else is kept as raw bytes.

use binrw::{BinRead, BinWrite};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Seek, Write};
use tracing::debug;

use crate::codec::{read_bytes, HashedString, ImageSize};
use crate::error::{CorruptionError, Result};
use crate::format::LayoutRevision;
use crate::image::ImageDescriptor;

/// Type tag of a [`Texture`]
pub const TEXTURE_TYPE: u64 = 0xF2E1AFB7052B3866;
/// Type tag of a [`CompositeTexture`]
pub const COMPOSITE_TEXTURE_TYPE: u64 = 0x9C78E9FDC6042A60;
/// Type tag of a texture set, kept as an [`OpaqueRecord`]
pub const TEXTURE_SET_TYPE: u64 = 0x0E02735CED4F1CDF;

/// Size of [`RecordHeader`] on disk
pub const RECORD_HEADER_SIZE: u64 = 12;

/// Header in front of every record
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[brw(little)]
pub struct RecordHeader {
    /// Identifies the kind of record
    pub type_tag: u64,

    /// Number of bytes in the record after this header
    pub size: u32,
}

/// A single texture
#[derive(Debug, Clone)]
pub struct Texture {
    pub header: RecordHeader,
    pub id: [u8; 16],
    pub name: HashedString,
    pub image: ImageDescriptor,
}

/// Two independent images sharing one record, used by interface textures
#[derive(Debug, Clone)]
pub struct CompositeTexture {
    pub header: RecordHeader,
    pub id: [u8; 16],
    pub names: [HashedString; 2],
    /// Size the interface shows the texture at
    pub initial_size: ImageSize,
    pub images: [ImageDescriptor; 2],
}

/// A record whose body is kept verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueRecord {
    pub header: RecordHeader,
    pub body: Vec<u8>,
}

/// Any record of a core file
#[derive(Debug, Clone)]
pub enum Record {
    Texture(Texture),
    CompositeTexture(CompositeTexture),
    TextureSet(OpaqueRecord),
    Opaque(OpaqueRecord),
}

impl Record {
    /// Read the record at the reader's position
    pub fn read<R: Read + Seek>(reader: &mut R, revision: LayoutRevision) -> Result<Record> {
        let header = RecordHeader::read(reader)?;
        let start = reader.stream_position()?;

        let record = match header.type_tag {
            TEXTURE_TYPE => Record::Texture(Texture::read(reader, header, revision)?),
            COMPOSITE_TEXTURE_TYPE => {
                Record::CompositeTexture(CompositeTexture::read(reader, header, revision)?)
            }
            TEXTURE_SET_TYPE => Record::TextureSet(OpaqueRecord::read(reader, header)?),
            _ => Record::Opaque(OpaqueRecord::read(reader, header)?),
        };

        expect_position(reader, start + header.size as u64)?;
        debug!(
            type_tag = format_args!("{:#018x}", header.type_tag),
            size = header.size,
            kind = record.kind_name(),
            "read record"
        );

        Ok(record)
    }

    /// Write the record exactly as it was read
    pub fn write<W: Write + Seek>(&self, writer: &mut W) -> Result<()> {
        self.header().write(writer)?;
        match self {
            Record::Texture(texture) => texture.write_body(writer),
            Record::CompositeTexture(composite) => composite.write_body(writer),
            Record::TextureSet(opaque) | Record::Opaque(opaque) => {
                writer.write_all(&opaque.body)?;
                Ok(())
            }
        }
    }

    pub fn header(&self) -> &RecordHeader {
        match self {
            Record::Texture(texture) => &texture.header,
            Record::CompositeTexture(composite) => &composite.header,
            Record::TextureSet(opaque) | Record::Opaque(opaque) => &opaque.header,
        }
    }

    /// Human readable kind of the record
    pub fn kind_name(&self) -> &'static str {
        match self {
            Record::Texture(_) => "Texture",
            Record::CompositeTexture(_) => "UITexture",
            Record::TextureSet(_) => "TextureSet",
            Record::Opaque(_) => "Opaque",
        }
    }
}

impl Texture {
    fn read<R: Read + Seek>(
        reader: &mut R,
        header: RecordHeader,
        revision: LayoutRevision,
    ) -> Result<Texture> {
        let start = reader.stream_position()?;
        let end = start + header.size as u64;

        let mut id = [0u8; 16];
        reader.read_exact(&mut id)?;
        let name = HashedString::read(reader)?;

        let position = reader.stream_position()?;
        let image_size = end
            .checked_sub(position)
            .ok_or(CorruptionError::SizeMismatch {
                expected: end,
                actual: position,
            })?;
        let image = ImageDescriptor::read(reader, image_size, revision)?;

        Ok(Texture {
            header,
            id,
            name,
            image,
        })
    }

    fn write_body<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.id)?;
        self.name.write(writer)?;
        self.image.write(writer)
    }
}

impl CompositeTexture {
    fn read<R: Read + Seek>(
        reader: &mut R,
        header: RecordHeader,
        revision: LayoutRevision,
    ) -> Result<CompositeTexture> {
        let mut id = [0u8; 16];
        reader.read_exact(&mut id)?;

        let names = [HashedString::read(reader)?, HashedString::read(reader)?];
        let initial_size = ImageSize::read_plain(reader)?;
        let sizes = [
            reader.read_u32::<LittleEndian>()?,
            reader.read_u32::<LittleEndian>()?,
        ];
        let images = [
            ImageDescriptor::read(reader, sizes[0] as u64, revision)?,
            ImageDescriptor::read(reader, sizes[1] as u64, revision)?,
        ];

        Ok(CompositeTexture {
            header,
            id,
            names,
            initial_size,
            images,
        })
    }

    fn write_body<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.id)?;
        for name in &self.names {
            name.write(writer)?;
        }
        self.initial_size.write_plain(writer)?;
        for image in &self.images {
            writer.write_u32::<LittleEndian>(image.declared_size() as u32)?;
        }
        for image in &self.images {
            image.write(writer)?;
        }
        Ok(())
    }

    /// Name a slot is addressed by, suffixed with its index when both slots share a name
    pub fn slot_name(&self, slot: usize) -> String {
        let name = &self.names[slot].value;
        match self.names[0].value == self.names[1].value {
            true => format!("{name}_{slot}"),
            false => name.clone(),
        }
    }
}

impl OpaqueRecord {
    fn read<R: Read>(reader: &mut R, header: RecordHeader) -> Result<OpaqueRecord> {
        let body = read_bytes(reader, header.size as u64)?;
        Ok(OpaqueRecord { header, body })
    }
}

fn expect_position<R: Seek>(reader: &mut R, expected: u64) -> Result<()> {
    let actual = reader.stream_position()?;
    if actual != expected {
        return Err(CorruptionError::SizeMismatch { expected, actual }.into());
    }
    Ok(())
}
