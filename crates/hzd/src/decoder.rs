//! Block decompression of exported images for PNG and TGA output.

use hzd_tex::dds::{DdsHeaders, DdsTag, DxgiFormat};
use hzd_tex::error::{Error, Result};
use hzd_tex::preview::{Preview, PreviewDecoder};
use std::io::Cursor;

type BlockFn = fn(&[u8], usize, usize, &mut [u32]) -> std::result::Result<(), &'static str>;

/// Decodes the first mip of the first slice with `texture2ddecoder`
pub struct BlockDecoder;

impl PreviewDecoder for BlockDecoder {
    fn decode(&self, dds: &[u8]) -> Result<Preview> {
        let mut reader = Cursor::new(dds);
        let headers = DdsHeaders::read(&mut reader)?;
        let payload = &dds[reader.position() as usize..];

        let width = headers.header.width;
        let height = headers.header.height;
        let format = match headers.tag() {
            DdsTag::Dxgi(code) => DxgiFormat::try_from(code).ok(),
            DdsTag::FourCC(_) => None,
        }
        .ok_or_else(|| Error::PreviewFailed(format!("no decoder for {}", headers.tag())))?;

        let rgba = match format {
            DxgiFormat::R8G8B8A8_UNORM | DxgiFormat::R8G8B8A8_UNORM_SRGB => {
                let len = width as usize * height as usize * 4;
                payload
                    .get(..len)
                    .ok_or_else(|| {
                        Error::PreviewFailed(format!(
                            "expected {len} bytes of pixels, found {}",
                            payload.len()
                        ))
                    })?
                    .to_vec()
            }
            format => decode_blocks(block_fn(format)?, payload, width, height)?,
        };

        Ok(Preview {
            width,
            height,
            rgba,
        })
    }
}

fn block_fn(format: DxgiFormat) -> Result<BlockFn> {
    let decode: BlockFn = match format {
        DxgiFormat::BC1_UNORM | DxgiFormat::BC1_UNORM_SRGB => texture2ddecoder::decode_bc1,
        DxgiFormat::BC3_UNORM | DxgiFormat::BC3_UNORM_SRGB => texture2ddecoder::decode_bc3,
        DxgiFormat::BC4_UNORM => texture2ddecoder::decode_bc4,
        DxgiFormat::BC5_UNORM => texture2ddecoder::decode_bc5,
        DxgiFormat::BC6H_UF16 => texture2ddecoder::decode_bc6_unsigned,
        DxgiFormat::BC6H_SF16 => texture2ddecoder::decode_bc6_signed,
        DxgiFormat::BC7_UNORM | DxgiFormat::BC7_UNORM_SRGB => texture2ddecoder::decode_bc7,
        other => return Err(Error::PreviewFailed(format!("no decoder for {other}"))),
    };
    Ok(decode)
}

fn decode_blocks(decode: BlockFn, payload: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let (w, h) = (width as usize, height as usize);
    let mut pixels = vec![0u32; w * h];
    decode(payload, w, h, &mut pixels).map_err(|e| Error::PreviewFailed(e.to_string()))?;

    Ok(bgra_to_rgba(&pixels))
}

/// `texture2ddecoder` packs pixels as BGRA words
fn bgra_to_rgba(pixels: &[u32]) -> Vec<u8> {
    pixels
        .iter()
        .flat_map(|pixel| {
            let [b, g, r, a] = pixel.to_le_bytes();
            [r, g, b, a]
        })
        .collect()
}
