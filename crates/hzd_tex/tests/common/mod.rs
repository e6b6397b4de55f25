#![allow(dead_code)]

use byteorder::{LittleEndian, WriteBytesExt};
use std::io;
use std::path::{Path, PathBuf};

use hzd_tex::types::{COMPOSITE_TEXTURE_TYPE, TEXTURE_SET_TYPE, TEXTURE_TYPE};

/// An image to place in a synthetic core file
#[derive(Debug, Clone)]
pub struct ImageSpec {
    pub kind: u16,
    pub width: u16,
    pub height: u16,
    pub slices: u16,
    pub mips: u8,
    pub format: u8,
    pub embedded: Vec<u8>,
    pub streamed: Vec<u8>,
    pub streamed_mips: u32,
}

impl ImageSpec {
    pub fn embedded(width: u16, height: u16, format: u8, data: Vec<u8>) -> ImageSpec {
        ImageSpec {
            kind: 0,
            width,
            height,
            slices: 0,
            mips: 1,
            format,
            embedded: data,
            streamed: Vec::new(),
            streamed_mips: 0,
        }
    }

    pub fn streamed(width: u16, height: u16, format: u8, data: Vec<u8>) -> ImageSpec {
        ImageSpec {
            streamed: data,
            streamed_mips: 1,
            ..ImageSpec::embedded(width, height, format, Vec::new())
        }
    }

    pub fn with_mips(mut self, mips: u8, streamed_mips: u32) -> ImageSpec {
        self.mips = mips;
        self.streamed_mips = streamed_mips;
        self
    }

    pub fn with_embedded(mut self, data: Vec<u8>) -> ImageSpec {
        self.embedded = data;
        self
    }
}

/// Builds a core file and its `.stream` companion in memory
#[derive(Debug, Default)]
pub struct CoreBuilder {
    core: Vec<u8>,
    stream: Vec<u8>,
}

impl CoreBuilder {
    pub fn new() -> CoreBuilder {
        CoreBuilder::default()
    }

    /// Bytes in front of the first streamed payload
    pub fn stream_prefix(mut self, len: usize) -> CoreBuilder {
        self.stream.extend(std::iter::repeat(0x5A).take(len));
        self
    }

    pub fn texture(mut self, name: &str, image: &ImageSpec) -> CoreBuilder {
        let mut body = vec![0x7Au8; 16];
        write_name(&mut body, name);
        body.extend(self.descriptor(image));
        self.record(TEXTURE_TYPE, &body)
    }

    pub fn composite(mut self, names: [&str; 2], images: [Option<&ImageSpec>; 2]) -> CoreBuilder {
        let mut body = vec![0x7Bu8; 16];
        write_name(&mut body, names[0]);
        write_name(&mut body, names[1]);
        body.write_u32::<LittleEndian>(64).unwrap();
        body.write_u32::<LittleEndian>(64).unwrap();

        let descriptors = images.map(|image| image.map(|i| self.descriptor(i)).unwrap_or_default());
        for descriptor in &descriptors {
            body.write_u32::<LittleEndian>(descriptor.len() as u32).unwrap();
        }
        for descriptor in &descriptors {
            body.extend_from_slice(descriptor);
        }
        self.record(COMPOSITE_TEXTURE_TYPE, &body)
    }

    pub fn texture_set(self, body: &[u8]) -> CoreBuilder {
        self.record(TEXTURE_SET_TYPE, body)
    }

    pub fn record(mut self, type_tag: u64, body: &[u8]) -> CoreBuilder {
        self.core.write_u64::<LittleEndian>(type_tag).unwrap();
        self.core.write_u32::<LittleEndian>(body.len() as u32).unwrap();
        self.core.extend_from_slice(body);
        self
    }

    pub fn trailer(mut self, bytes: &[u8]) -> CoreBuilder {
        self.core.extend_from_slice(bytes);
        self
    }

    /// Write `<name>` and `<name>.stream` into `dir`
    pub fn write(self, dir: &Path, name: &str) -> io::Result<PathBuf> {
        let path = dir.join(name);
        std::fs::write(&path, &self.core)?;
        std::fs::write(dir.join(format!("{name}.stream")), &self.stream)?;
        Ok(path)
    }

    fn descriptor(&mut self, image: &ImageSpec) -> Vec<u8> {
        let mut data = Vec::new();
        data.write_u16::<LittleEndian>(image.kind).unwrap();
        data.write_u16::<LittleEndian>(image.width).unwrap();
        data.write_u16::<LittleEndian>(image.height).unwrap();
        data.write_u16::<LittleEndian>(image.slices).unwrap();
        data.extend_from_slice(&[image.mips, image.format, 0x00, 0x00]);
        data.extend_from_slice(&[0x00, 0xA9, 0xFF, 0x00]);
        data.extend_from_slice(&[0x33; 16]);

        let key = b"cache:test";
        let embedded = image.embedded.len() as u32;
        match image.streamed.is_empty() {
            true => {
                let padding = [0xEEu8; 4];
                data.write_u32::<LittleEndian>(8 + padding.len() as u32 + embedded).unwrap();
                data.write_u32::<LittleEndian>(embedded).unwrap();
                data.write_u32::<LittleEndian>(0).unwrap();
                data.extend_from_slice(&padding);
            }
            false => {
                let offset = self.stream.len() as u64;
                self.stream.extend_from_slice(&image.streamed);

                data.write_u32::<LittleEndian>(8 + 8 + key.len() as u32 + 16 + embedded)
                    .unwrap();
                data.write_u32::<LittleEndian>(embedded).unwrap();
                data.write_u32::<LittleEndian>(image.streamed.len() as u32).unwrap();
                data.write_u32::<LittleEndian>(image.streamed_mips).unwrap();
                data.write_u32::<LittleEndian>(key.len() as u32).unwrap();
                data.extend_from_slice(key);
                data.write_u64::<LittleEndian>(offset).unwrap();
                data.write_u64::<LittleEndian>(image.streamed.len() as u64).unwrap();
            }
        }

        data.extend_from_slice(&image.embedded);
        data
    }
}

fn write_name(data: &mut Vec<u8>, name: &str) {
    data.write_u32::<LittleEndian>(name.len() as u32).unwrap();
    if !name.is_empty() {
        data.write_u32::<LittleEndian>(0xC0FFEE).unwrap();
        data.extend_from_slice(name.as_bytes());
    }
}

/// Bytes that look like compressed blocks
pub fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)).collect()
}
