//! Error types that can be emitted from this library
//!

use miette::Diagnostic;
use thiserror::Error;

use crate::format::PixelFormat;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent wrapper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Transparent wrapper for [`binrw::Error`]
    #[error(transparent)]
    BinRWError(#[from] binrw::Error),

    /// A string holds characters that don't fit in a single byte
    #[error("string {0:?} can not be stored with one byte per character")]
    UnencodableString(String),

    /// The core file is malformed and can not be loaded
    #[error("corrupt container: {0}")]
    Corrupt(#[from] CorruptionError),

    /// No image container header can be written for this pixel format
    #[error("unsupported pixel format {0}, only BC1, BC3, BC4U, BC5U, BC6U, BC6S, BC7 and RGBA_8888 are supported")]
    UnsupportedFormat(PixelFormat),

    /// The replacement image uses a different compression than the texture
    #[error("invalid pixel format in dds, expected {expected}, found {found}")]
    FormatMismatch {
        /// Tag the texture requires
        expected: String,
        /// Tag found in the replacement
        found: String,
    },

    /// The replacement image has different dimensions than the texture
    #[error("dimensions of imported dds don't match, must be {expected_width}x{expected_height}, but was {width}x{height}")]
    DimensionMismatch {
        /// Width of the texture
        expected_width: u32,
        /// Height of the texture
        expected_height: u32,
        /// Width of the replacement
        width: u32,
        /// Height of the replacement
        height: u32,
    },

    /// The replacement image has a different array size than the texture
    #[error("array size of imported dds doesn't match, must be {expected}, but was {found}")]
    SliceCountMismatch {
        /// Slices in the texture
        expected: u32,
        /// Array size of the replacement
        found: u32,
    },

    /// The replacement image doesn't carry enough mip maps
    #[error("imported dds has too few mip maps, needs at least {expected} (had only {found})")]
    MipCountTooLow {
        /// Mip maps recorded for the texture
        expected: u32,
        /// Mip maps in the replacement
        found: u32,
    },

    /// The replacement image header has unexpected structure values
    #[error("invalid dds header: {0}")]
    InvalidCandidateHeader(String),

    /// The replacement image ended before the full payload was read
    #[error("could not read {expected} bytes from image, only {actual} bytes read")]
    TruncatedInput {
        /// Bytes required
        expected: u64,
        /// Bytes available
        actual: u64,
    },

    /// A payload write would change the length of the stored data
    #[error("new data is not the right size, expected {expected} bytes but got {actual}")]
    LengthMismatch {
        /// Recorded payload length
        expected: u64,
        /// Length of the new payload
        actual: u64,
    },

    /// No texture with this name exists in the container
    #[error("unable to find texture {0}")]
    TextureNotFound(String),

    /// The preview decoder failed to produce a bitmap
    #[error("unable to decode preview: {0}")]
    PreviewFailed(String),

    /// A failure while handling a named texture
    #[error("texture {name}: {source}")]
    Texture {
        /// Name of the texture being processed
        name: String,
        /// Underlying failure
        #[source]
        source: Box<Error>,
    },

    /// A failure while loading the record at a byte offset
    #[error("record at offset {offset:#x}: {source}")]
    Record {
        /// Offset of the record's type tag in the core file
        offset: u64,
        /// Underlying failure
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Attach the name of the texture this failure belongs to
    pub fn for_texture(self, name: impl Into<String>) -> Error {
        Error::Texture {
            name: name.into(),
            source: Box::new(self),
        }
    }

    /// Whether the failure means the container itself is malformed
    pub fn is_corruption(&self) -> bool {
        match self {
            Error::Corrupt(_) => true,
            Error::Texture { source, .. } | Error::Record { source, .. } => source.is_corruption(),
            _ => false,
        }
    }
}

/// Error type to provide further information when a core file is malformed
#[derive(Error, Diagnostic, Debug, PartialEq, Eq)]
pub enum CorruptionError {
    /// invalid magic in texture
    #[error("invalid magic in texture, found {0:02X?}")]
    InvalidMagic([u8; 4]),

    /// read incorrect size
    #[error("read incorrect size, expected to end at {expected:#x} but ended at {actual:#x}")]
    SizeMismatch {
        /// Offset the block should end at
        expected: u64,
        /// Offset the reader ended at
        actual: u64,
    },

    /// unexpected end of file
    #[error("unexpected end of file at offset {0:#x}")]
    UnexpectedEof(u64),

    /// embedded size doesn't fit in the chunk
    #[error("chunk size {chunk_size} can not hold {embedded_size} embedded bytes")]
    InvalidPadding {
        /// Declared chunk size
        chunk_size: u32,
        /// Declared embedded payload size
        embedded_size: u32,
    },

    /// unknown pixel format
    #[error("unknown pixel format {0:#04x}")]
    UnknownPixelFormat(u8),

    /// unknown image kind
    #[error("unknown image kind {0:#06x}")]
    UnknownImageKind(u16),
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
