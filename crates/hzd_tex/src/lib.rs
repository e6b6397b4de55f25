//! This library handles reading texture resources from **core** files used by *Horizon Zero Dawn*
//! and replacing their pixel data in place.
//!
//! # Core File Format Documentation
//!
//! A core file is a flat sequence of records. Large image payloads don't live in the core file but in
//! a companion file with the same name and a `.stream` suffix, addressed by absolute byte offsets.
//!
//! ## Records
//!
//! | Offset (bytes) | Field    | Description                                          |
//! |----------------|----------|------------------------------------------------------|
//! | 0x0000         | Type     | 8 bytes: hash identifying the kind of record         |
//! | 0x0008         | Size     | 4 bytes: number of bytes following this field        |
//! | 0x000C         | Body     | Size bytes                                           |
//!
//! Known types:
//!
//! - `0xF2E1AFB7052B3866`: **Texture**, a 16 byte id, a name and one image descriptor.
//! - `0x9C78E9FDC6042A60`: **UITexture**, a 16 byte id, two names, the initial size as two u32,
//!   the sizes of two image descriptors as u32 and both descriptors. When both names are equal they
//!   are addressed as `<name>_0` and `<name>_1`.
//! - `0x0E02735CED4F1CDF`: **TextureSet**, kept as raw bytes.
//!
//! Any other record is kept as raw bytes as well, so writing a loaded file reproduces it exactly.
//! Records are read until fewer than 12 bytes are left.
//!
//! ### Names
//!
//! | Field  | Description                                      |
//! |--------|--------------------------------------------------|
//! | Length | 4 bytes                                          |
//! | Hash   | 4 bytes, only present when the length is not 0   |
//! | Data   | Length bytes                                     |
//!
//! ### Image descriptors
//!
//! See [`image`] for the layout. A descriptor either carries its payload inline (embedded) or points
//! into the `.stream` file (streamed). Exporting writes a DDS header followed by the streamed bytes
//! and then the embedded bytes. Replacing reads a DDS file in the same order and overwrites both
//! locations without changing their length.
//!
//! ## Additional Information
//!
//! - **File Extension**: `.core`, with payloads in `.core.stream`
//! - **Endianness**: Little-endian for all multi-byte integers
//!

pub mod codec;
pub mod dds;
pub mod error;
pub mod format;
pub mod image;
pub mod preview;
pub mod read;
pub mod store;
pub mod types;
pub mod update;
pub mod write;

pub use format::{ImageKind, LayoutRevision, PixelFormat};
pub use image::ImageDescriptor;
pub use read::{ContainerOptions, CoreArchive, TextureInfo};
pub use store::{ExportOptions, PayloadStore};
