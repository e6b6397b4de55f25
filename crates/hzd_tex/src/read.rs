//! Types for reading core files
//!

use bon::Builder;
use indexmap::IndexMap;
use std::io::{Cursor, ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::{debug, instrument, warn};

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::error::{CorruptionError, Error, Result};
use crate::format::{ImageKind, LayoutRevision, PixelFormat};
use crate::image::ImageDescriptor;
use crate::preview::{Preview, PreviewDecoder};
use crate::store::{compose_export_stream, ExportOptions, ExportedImage, PayloadStore};
use crate::types::{Record, RECORD_HEADER_SIZE};
use crate::update::replace_image;

/// Options for how a core file is read
#[derive(Debug, Clone, Copy, Default, Builder)]
pub struct ContainerOptions {
    /// Which descriptor layout the file uses
    #[builder(default)]
    pub revision: LayoutRevision,
}

/// Where a named image lives
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct TextureSlot {
    record: usize,
    slot: usize,
}

/// Metadata of one named image
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct TextureInfo {
    pub name: String,
    pub record_type: &'static str,
    pub kind: ImageKind,
    pub width: u32,
    pub height: u32,
    pub width_crop: u8,
    pub height_crop: u8,
    pub format: PixelFormat,
    pub slices: u32,
    pub mips: u32,
    pub streamed_mips: u32,
    pub embedded_size: u32,
    pub streamed_size: u32,
    pub stream_offset: Option<u64>,
}

/// A loaded core file
///
/// Images are addressed by texture name, composite slots sharing a name get a `_0`/`_1` suffix.
/// When several records use the same name the later ones are indexed as `<name>#2`, `<name>#3`
/// and so on.
///
/// ```no_run
/// use hzd_tex::{CoreArchive, read::ContainerOptions, store::ExportOptions};
///
/// fn export_all(path: &str) -> hzd_tex::error::Result<()> {
///     let core = CoreArchive::open(path, ContainerOptions::default())?;
///
///     for name in core.texture_names() {
///         let image = core.export_by_name(name, ExportOptions::default())?;
///         std::fs::write(format!("{name}.dds"), image.data)?;
///     }
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct CoreArchive {
    store: PayloadStore,
    options: ContainerOptions,
    pub(crate) records: Vec<Record>,
    pub(crate) trailer: Vec<u8>,
    textures: IndexMap<Box<str>, TextureSlot>,
}

impl CoreArchive {
    /// Load a core file, its payloads are expected in `<path>.stream`
    #[instrument(skip(path), fields(path = %path.as_ref().display()), err)]
    pub fn open(path: impl AsRef<Path>, options: ContainerOptions) -> Result<CoreArchive> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        Self::parse(Cursor::new(data), PayloadStore::new(path), options)
    }

    /// Load the records of a core file from a reader.
    ///
    /// Records are read until fewer than 12 bytes remain, anything left is kept as a trailer. The
    /// first record that fails to load fails the whole container.
    pub fn parse<R: Read + Seek>(
        mut reader: R,
        store: PayloadStore,
        options: ContainerOptions,
    ) -> Result<CoreArchive> {
        let len = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;

        let mut records = Vec::new();
        let mut offset = 0;
        while len - offset >= RECORD_HEADER_SIZE {
            let record = Record::read(&mut reader, options.revision).map_err(|e| {
                Error::Record {
                    offset,
                    source: Box::new(eof_to_corruption(e, len)),
                }
            })?;
            records.push(record);
            offset = reader.stream_position()?;
        }

        let mut trailer = Vec::new();
        reader.read_to_end(&mut trailer)?;

        let textures = index_textures(&records);
        debug!(
            records = records.len(),
            textures = textures.len(),
            trailer = trailer.len(),
            "loaded core"
        );

        Ok(CoreArchive {
            store,
            options,
            records,
            trailer,
            textures,
        })
    }

    /// Number of named images in this core file
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    /// Whether this core file contains no images
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names of all images, in file order
    pub fn texture_names(&self) -> impl Iterator<Item = &str> {
        self.textures.keys().map(|s| s.as_ref())
    }

    /// All records, in file order
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Bytes after the last record
    pub fn trailer(&self) -> &[u8] {
        &self.trailer
    }

    pub fn store(&self) -> &PayloadStore {
        &self.store
    }

    pub fn options(&self) -> ContainerOptions {
        self.options
    }

    /// Search for an image by name
    pub fn by_name(&self, name: &str) -> Result<&ImageDescriptor> {
        let slot = self.slot(name)?;
        image(&self.records, slot).ok_or_else(|| Error::TextureNotFound(name.to_owned()))
    }

    /// Metadata of an image
    pub fn info(&self, name: &str) -> Result<TextureInfo> {
        let slot = self.slot(name)?;
        let image = self.by_name(name)?;

        Ok(TextureInfo {
            name: name.to_owned(),
            record_type: self.records[slot.record].kind_name(),
            kind: image.kind(),
            width: image.width(),
            height: image.height(),
            width_crop: image.size().width_crop,
            height_crop: image.size().height_crop,
            format: image.format(),
            slices: image.slices(),
            mips: image.mip_count(),
            streamed_mips: image.streamed_mip_count(),
            embedded_size: image.embedded_size(),
            streamed_size: image.streamed_size(),
            stream_offset: image.stream().map(|s| s.offset),
        })
    }

    /// Build the DDS file of an image
    #[instrument(skip(self), err)]
    pub fn export_by_name(&self, name: &str, options: ExportOptions) -> Result<ExportedImage> {
        let image = self.by_name(name)?;
        compose_export_stream(image, &self.store, options).map_err(|e| e.for_texture(name))
    }

    /// Replace the payload of an image with the one in a DDS stream
    #[instrument(skip(self, reader), err)]
    pub fn replace_by_name<R: Read>(&mut self, name: &str, reader: &mut R) -> Result<()> {
        let slot = self.slot(name)?;
        let store = &self.store;
        let image = image_mut(&mut self.records, slot)
            .ok_or_else(|| Error::TextureNotFound(name.to_owned()))?;

        replace_image(image, reader, store).map_err(|e| e.for_texture(name))
    }

    /// The decoded preview of an image
    pub fn preview_by_name<D: PreviewDecoder + ?Sized>(
        &mut self,
        name: &str,
        decoder: &D,
    ) -> Result<&Preview> {
        let slot = self.slot(name)?;
        let store = &self.store;
        let image = image_mut(&mut self.records, slot)
            .ok_or_else(|| Error::TextureNotFound(name.to_owned()))?;

        image
            .preview(store, decoder)
            .map_err(|e| e.for_texture(name))
    }

    fn slot(&self, name: &str) -> Result<TextureSlot> {
        self.textures
            .get(name)
            .copied()
            .ok_or_else(|| Error::TextureNotFound(name.to_owned()))
    }
}

fn image(records: &[Record], slot: TextureSlot) -> Option<&ImageDescriptor> {
    match records.get(slot.record)? {
        Record::Texture(texture) => Some(&texture.image),
        Record::CompositeTexture(composite) => composite.images.get(slot.slot),
        _ => None,
    }
}

fn image_mut(records: &mut [Record], slot: TextureSlot) -> Option<&mut ImageDescriptor> {
    match records.get_mut(slot.record)? {
        Record::Texture(texture) => Some(&mut texture.image),
        Record::CompositeTexture(composite) => composite.images.get_mut(slot.slot),
        _ => None,
    }
}

fn index_textures(records: &[Record]) -> IndexMap<Box<str>, TextureSlot> {
    let mut textures = IndexMap::new();
    let mut insert = |name: String, slot: TextureSlot| {
        if !textures.contains_key(name.as_str()) {
            textures.insert(name.into_boxed_str(), slot);
            return;
        }

        let alias = (2..)
            .map(|n| format!("{name}#{n}"))
            .find(|alias| !textures.contains_key(alias.as_str()))
            .unwrap_or_default();
        warn!("duplicate texture name {name}, addressed as {alias}");
        textures.insert(alias.into_boxed_str(), slot);
    };

    for (record, entry) in records.iter().enumerate() {
        match entry {
            Record::Texture(texture) => {
                insert(texture.name.value.clone(), TextureSlot { record, slot: 0 })
            }
            Record::CompositeTexture(composite) => {
                for (slot, image) in composite.images.iter().enumerate() {
                    if image.is_empty() {
                        debug!("skipping empty slot {slot} of {}", composite.slot_name(slot));
                        continue;
                    }
                    insert(composite.slot_name(slot), TextureSlot { record, slot });
                }
            }
            _ => {}
        }
    }

    textures
}

/// Running out of bytes inside a record means the container is malformed
fn eof_to_corruption(error: Error, len: u64) -> Error {
    let is_eof = match &error {
        Error::IOError(e) => e.kind() == ErrorKind::UnexpectedEof,
        Error::BinRWError(binrw::Error::Io(e)) => e.kind() == ErrorKind::UnexpectedEof,
        _ => false,
    };

    match is_eof {
        true => CorruptionError::UnexpectedEof(len).into(),
        false => error,
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use std::io::Cursor;
    use tracing_test::traced_test;

    use super::{CoreArchive, ContainerOptions};
    use crate::error::{CorruptionError, Error, Result};
    use crate::format::PixelFormat;
    use crate::image::test::EMBEDDED_BC1;
    use crate::store::PayloadStore;
    use crate::types::{COMPOSITE_TEXTURE_TYPE, TEXTURE_TYPE};

    fn record(type_tag: u64, body: &[u8]) -> Vec<u8> {
        let mut data = type_tag.to_le_bytes().to_vec();
        data.extend_from_slice(&(body.len() as u32).to_le_bytes());
        data.extend_from_slice(body);
        data
    }

    fn texture(name: &str) -> Vec<u8> {
        texture_named(name.as_bytes())
    }

    fn texture_named(name: &[u8]) -> Vec<u8> {
        let mut body = vec![0u8; 16];
        body.extend_from_slice(&(name.len() as u32).to_le_bytes());
        body.extend_from_slice(&[0u8; 4]);
        body.extend_from_slice(name);
        body.extend_from_slice(&EMBEDDED_BC1);
        record(TEXTURE_TYPE, &body)
    }

    fn parse(data: Vec<u8>) -> Result<CoreArchive> {
        CoreArchive::parse(
            Cursor::new(data),
            PayloadStore::new("memory.core"),
            ContainerOptions::default(),
        )
    }

    #[test]
    fn read_empty_core() -> Result<()> {
        let core = parse(Vec::new())?;
        assert!(core.is_empty());
        assert!(core.records().is_empty());
        assert!(core.trailer().is_empty());

        Ok(())
    }

    #[test]
    fn read_core_with_trailer() -> Result<()> {
        let mut data = texture("rock");
        data.extend_from_slice(&[0xEE; 11]);

        let core = parse(data)?;
        assert_eq!(core.len(), 1);
        assert_eq!(core.texture_names().collect::<Vec<_>>(), vec!["rock"]);
        assert_eq!(core.trailer(), &[0xEE; 11]);

        Ok(())
    }

    #[test]
    fn single_byte_names_load() -> Result<()> {
        let data = texture_named(b"caf\xE9");

        let core = parse(data.clone())?;
        assert_eq!(core.texture_names().collect::<Vec<_>>(), vec!["caf\u{e9}"]);
        assert!(core.by_name("caf\u{e9}").is_ok());
        assert_eq!(core.to_bytes()?, data);

        Ok(())
    }

    #[test]
    fn read_info() -> Result<()> {
        let core = parse(texture("rock"))?;

        let info = core.info("rock")?;
        assert_eq!(info.record_type, "Texture");
        assert_eq!(info.format, PixelFormat::BC1);
        assert_eq!((info.width, info.height), (4, 4));
        assert_eq!(info.mips, 1);
        assert_eq!(info.embedded_size, 8);
        assert_eq!(info.stream_offset, None);

        Ok(())
    }

    #[traced_test]
    #[test]
    fn duplicate_names_get_numbered() -> Result<()> {
        let mut data = texture("rock");
        data.extend(texture("rock"));
        data.extend(texture("sand"));
        data.extend(texture("rock"));

        let core = parse(data)?;
        assert_eq!(core.records().len(), 4);
        assert_eq!(
            core.texture_names().collect::<Vec<_>>(),
            vec!["rock", "rock#2", "sand", "rock#3"]
        );
        assert!(core.by_name("rock#3").is_ok());
        assert!(logs_contain("duplicate texture name rock, addressed as rock#2"));

        Ok(())
    }

    #[test]
    fn empty_composite_slot_is_not_named() -> Result<()> {
        let mut body = vec![0u8; 16];
        for name in ["left", "right"] {
            body.extend_from_slice(&(name.len() as u32).to_le_bytes());
            body.extend_from_slice(&[0u8; 4]);
            body.extend_from_slice(name.as_bytes());
        }
        body.extend_from_slice(&[0u8; 8]);
        body.extend_from_slice(&0u32.to_le_bytes());
        body.extend_from_slice(&56u32.to_le_bytes());
        body.extend_from_slice(&EMBEDDED_BC1);

        let core = parse(record(COMPOSITE_TEXTURE_TYPE, &body))?;
        assert_eq!(core.texture_names().collect::<Vec<_>>(), vec!["right"]);
        assert_eq!(core.info("right")?.record_type, "UITexture");

        Ok(())
    }

    #[test]
    fn truncated_record_is_corrupt() {
        let mut data = texture("rock");
        data.truncate(40);

        match parse(data) {
            Err(e @ Error::Record { offset: 0, .. }) => {
                assert!(e.is_corruption());
                let Error::Record { source, .. } = e else {
                    unreachable!()
                };
                assert!(matches!(
                    *source,
                    Error::Corrupt(CorruptionError::UnexpectedEof(40))
                ));
            }
            other => panic!("expected corrupt record, got {other:?}"),
        }
    }

    #[test]
    fn missing_texture() -> Result<()> {
        let core = parse(texture("rock"))?;

        match core.by_name("sand") {
            Err(Error::TextureNotFound(name)) => assert_eq!(name, "sand"),
            other => panic!("expected missing texture, got {other:?}"),
        }

        Ok(())
    }
}
