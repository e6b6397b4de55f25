//! Access to the bytes behind an image descriptor.
//!
//! A core file comes with a `.stream` companion holding the large out-of-line payloads. Both files
//! are opened per call and closed again before returning, nothing keeps a handle between operations.
//! Writes only ever overwrite existing bytes, neither file is grown or shrunk.

use bon::Builder;
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::{Cursor, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{instrument, warn};

use crate::codec::read_bytes;
use crate::dds::DdsHeaders;
use crate::error::{Error, Result};
use crate::image::ImageDescriptor;

/// Suffix appended to a core file's path to find its payload file
pub const STREAM_SUFFIX: &str = ".stream";

/// Path of the payload file belonging to a core file
pub fn stream_path_for(core_path: &Path) -> PathBuf {
    let mut path = OsString::from(core_path.as_os_str());
    path.push(STREAM_SUFFIX);
    PathBuf::from(path)
}

/// The two files backing a container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadStore {
    core_path: PathBuf,
    stream_path: PathBuf,
}

impl PayloadStore {
    /// Store for a core file and the `.stream` file next to it
    pub fn new(core_path: impl Into<PathBuf>) -> PayloadStore {
        let core_path = core_path.into();
        let stream_path = stream_path_for(&core_path);
        PayloadStore {
            core_path,
            stream_path,
        }
    }

    pub fn core_path(&self) -> &Path {
        &self.core_path
    }

    pub fn stream_path(&self) -> &Path {
        &self.stream_path
    }

    /// Read exactly `length` bytes at `offset` of the payload file
    #[instrument(skip(self), err)]
    pub fn read_streamed(&self, offset: u64, length: u64) -> Result<Vec<u8>> {
        let mut file = File::open(&self.stream_path)?;
        file.seek(SeekFrom::Start(offset))?;
        read_bytes(&mut file, length)
    }

    /// Overwrite bytes at `offset` of the payload file.
    ///
    /// The caller guarantees `data` has the length recorded for that location.
    #[instrument(skip(self, data), fields(size = data.len()), err)]
    pub fn write_streamed(&self, offset: u64, data: &[u8]) -> Result<()> {
        write_at(&mut open_for_overwrite(&self.stream_path)?, offset, data)
    }

    /// Overwrite bytes at `offset` of the core file
    #[instrument(skip(self, data), fields(size = data.len()), err)]
    pub fn overwrite_embedded(&self, offset: u64, data: &[u8]) -> Result<()> {
        write_at(&mut open_for_overwrite(&self.core_path)?, offset, data)
    }

    /// Overwrite streamed and embedded bytes of one image.
    ///
    /// Every file that gets written is opened first, a file that can't be opened fails the call
    /// before either one changes.
    #[instrument(skip_all, err)]
    pub fn overwrite_payloads(
        &self,
        streamed: Option<(u64, &[u8])>,
        embedded: Option<(u64, &[u8])>,
    ) -> Result<()> {
        let stream_file = match streamed {
            Some(_) => Some(open_for_overwrite(&self.stream_path)?),
            None => None,
        };
        let core_file = match embedded {
            Some(_) => Some(open_for_overwrite(&self.core_path)?),
            None => None,
        };

        if let (Some(mut file), Some((offset, data))) = (stream_file, streamed) {
            write_at(&mut file, offset, data)?;
        }
        if let (Some(mut file), Some((offset, data))) = (core_file, embedded) {
            write_at(&mut file, offset, data)?;
        }
        Ok(())
    }
}

fn open_for_overwrite(path: &Path) -> Result<File> {
    Ok(OpenOptions::new().write(true).open(path)?)
}

fn write_at(file: &mut File, offset: u64, data: &[u8]) -> Result<()> {
    file.seek(SeekFrom::Start(offset))?;
    file.write_all(data)?;
    file.flush()?;
    Ok(())
}

/// Options for exporting an image
#[derive(Debug, Clone, Copy, Builder)]
pub struct ExportOptions {
    /// Write the raw payload without a header when no header exists for the format, instead of
    /// failing the export
    #[builder(default)]
    pub allow_fail: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// The result of composing an export stream
#[derive(Debug)]
pub struct ExportedImage {
    /// Headers followed by the streamed and embedded payloads
    pub data: Vec<u8>,
    /// Why the headers are missing, only set when [`ExportOptions::allow_fail`] let a failure pass
    pub degraded: Option<Error>,
}

impl ExportedImage {
    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }
}

/// Build the DDS stream of an image: headers, then streamed bytes, then embedded bytes
#[instrument(skip_all, err)]
pub fn compose_export_stream(
    image: &ImageDescriptor,
    store: &PayloadStore,
    options: ExportOptions,
) -> Result<ExportedImage> {
    let (headers, degraded) = match DdsHeaders::for_descriptor(image) {
        Ok(headers) => (Some(headers), None),
        Err(e @ Error::UnsupportedFormat(_)) if options.allow_fail => {
            warn!("{e}, writing raw payload");
            (None, Some(e))
        }
        Err(e) => return Err(e),
    };

    let mut buffer = Cursor::new(Vec::new());

    if let Some(headers) = &headers {
        headers.write(&mut buffer)?;
    }

    if let Some(stream) = image.stream() {
        let streamed = store.read_streamed(stream.offset, stream.length)?;
        buffer.write_all(&streamed)?;
    }

    buffer.write_all(image.embedded_data())?;

    Ok(ExportedImage {
        data: buffer.into_inner(),
        degraded,
    })
}
