//! Replacing the payload of an image in place.
//!
//! A replacement is a DDS file. Its headers are checked against the descriptor and its payload is
//! read in full before anything is written, so a rejected replacement leaves both files untouched.

use std::io::Read;
use tracing::{debug, instrument};

use crate::dds::{
    dxgi_format_for, tag_matches, DdsHeaders, DDPF_FOURCC, DDS_HEADER_SIZE, DDS_PIXEL_FORMAT_SIZE,
};
use crate::error::{Error, Result};
use crate::image::ImageDescriptor;
use crate::store::PayloadStore;

/// Check that a replacement's headers describe the same image.
///
/// Checks run in a fixed order and the first failure is returned: array size (only when the
/// extension header is present), width and height, mip count, header structure, compression tag.
pub fn validate_candidate(image: &ImageDescriptor, headers: &DdsHeaders) -> Result<()> {
    let header = &headers.header;

    if let Some(dxt10) = &headers.dxt10 {
        let expected = image.slices().max(1);
        if dxt10.array_size != expected {
            return Err(Error::SliceCountMismatch {
                expected,
                found: dxt10.array_size,
            });
        }
    }

    if header.width != image.width() || header.height != image.height() {
        return Err(Error::DimensionMismatch {
            expected_width: image.width(),
            expected_height: image.height(),
            width: header.width,
            height: header.height,
        });
    }

    // A zero mip count in a DDS header means a single mip
    let mip_count = header.mip_map_count.max(1);
    if mip_count < image.mip_count() {
        return Err(Error::MipCountTooLow {
            expected: image.mip_count(),
            found: mip_count,
        });
    }

    if header.size != DDS_HEADER_SIZE {
        return Err(Error::InvalidCandidateHeader(format!(
            "header size is {}, expected {DDS_HEADER_SIZE}",
            header.size
        )));
    }
    if header.pixel_format.size != DDS_PIXEL_FORMAT_SIZE {
        return Err(Error::InvalidCandidateHeader(format!(
            "pixel format size is {}, expected {DDS_PIXEL_FORMAT_SIZE}",
            header.pixel_format.size
        )));
    }
    if header.pixel_format.flags != DDPF_FOURCC {
        return Err(Error::InvalidCandidateHeader(format!(
            "pixel format flags are {:#x}, expected {DDPF_FOURCC:#x}",
            header.pixel_format.flags
        )));
    }

    let format = image.format();
    let expected = dxgi_format_for(format).ok_or(Error::UnsupportedFormat(format))?;
    let found = headers.tag();
    if !tag_matches(format, found) {
        return Err(Error::FormatMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        });
    }

    Ok(())
}

/// Replace an image's payload with the one in a DDS stream.
///
/// The streamed part comes first in the replacement, followed by the embedded part, matching the
/// order an export writes them in.
#[instrument(skip_all, err)]
pub fn replace_image<R: Read>(
    image: &mut ImageDescriptor,
    reader: &mut R,
    store: &PayloadStore,
) -> Result<()> {
    let headers =
        DdsHeaders::read(reader).map_err(|e| Error::InvalidCandidateHeader(e.to_string()))?;
    validate_candidate(image, &headers)?;

    let streamed = match image.stream() {
        Some(stream) => {
            let data = read_payload(reader, image.streamed_size() as u64)?;
            if data.len() as u64 != stream.length {
                return Err(Error::LengthMismatch {
                    expected: stream.length,
                    actual: data.len() as u64,
                });
            }
            Some((stream.offset, data))
        }
        None => None,
    };

    let embedded = match image.has_embedded_data() {
        true => Some(read_payload(reader, image.embedded_size() as u64)?),
        false => None,
    };

    store.overwrite_payloads(
        streamed
            .as_ref()
            .map(|(offset, data)| (*offset, data.as_slice())),
        embedded
            .as_deref()
            .map(|data| (image.embedded_offset(), data)),
    )?;

    if let Some(data) = embedded {
        image.replace_embedded(data)?;
    }

    image.invalidate_preview();
    debug!(
        streamed = image.streamed_size(),
        embedded = image.embedded_size(),
        "replaced image payload"
    );

    Ok(())
}

fn read_payload<R: Read>(reader: &mut R, length: u64) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    reader.take(length).read_to_end(&mut buffer)?;

    if (buffer.len() as u64) < length {
        return Err(Error::TruncatedInput {
            expected: length,
            actual: buffer.len() as u64,
        });
    }
    Ok(buffer)
}
