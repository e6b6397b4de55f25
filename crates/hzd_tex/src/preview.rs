//! Decoded preview bitmaps cached on image descriptors.
//!
//! Block decompression isn't done here. A [`PreviewDecoder`] receives the same DDS stream an export
//! produces and turns it into RGBA pixels. The result is kept on the descriptor until its payload is
//! replaced.

use tracing::{debug, instrument};

use crate::error::Result;
use crate::image::ImageDescriptor;
use crate::store::{compose_export_stream, ExportOptions, PayloadStore};

/// An RGBA8 bitmap of the top mip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Turns an exported DDS stream into a [`Preview`]
pub trait PreviewDecoder {
    fn decode(&self, dds: &[u8]) -> Result<Preview>;
}

impl<F> PreviewDecoder for F
where
    F: Fn(&[u8]) -> Result<Preview>,
{
    fn decode(&self, dds: &[u8]) -> Result<Preview> {
        self(dds)
    }
}

impl ImageDescriptor {
    /// The decoded preview, computing and caching it on first use
    pub fn preview<D: PreviewDecoder + ?Sized>(
        &mut self,
        store: &PayloadStore,
        decoder: &D,
    ) -> Result<&Preview> {
        let preview = match self.preview.take() {
            Some(preview) => preview,
            None => self.decode_preview(store, decoder)?,
        };

        Ok(self.preview.insert(preview))
    }

    #[instrument(skip_all, err)]
    fn decode_preview<D: PreviewDecoder + ?Sized>(
        &self,
        store: &PayloadStore,
        decoder: &D,
    ) -> Result<Preview> {
        let export = compose_export_stream(self, store, ExportOptions::default())?;
        let preview = decoder.decode(&export.data)?;
        debug!(
            width = preview.width,
            height = preview.height,
            "decoded preview"
        );
        Ok(preview)
    }

    /// The cached preview, if one was decoded since the last update
    pub fn cached_preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }

    /// Drop the cached preview so the next request decodes the current payload
    pub fn invalidate_preview(&mut self) {
        self.preview = None;
    }
}
