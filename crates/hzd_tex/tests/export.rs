mod common;

use pretty_assertions::assert_eq;
use tracing_test::traced_test;

use common::{pattern, CoreBuilder, ImageSpec};
use hzd_tex::error::{Error, Result};
use hzd_tex::preview::Preview;
use hzd_tex::{ContainerOptions, CoreArchive, ExportOptions, PixelFormat};

#[traced_test]
#[test]
fn unsupported_format_export_policy() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = CoreBuilder::new()
        .texture(
            "mask",
            &ImageSpec::embedded(16, 16, PixelFormat::R_UNORM_8 as u8, pattern(256, 1)),
        )
        .write(dir.path(), "mask.core")?;
    let core = CoreArchive::open(&path, ContainerOptions::default())?;

    match core.export_by_name("mask", ExportOptions::default()) {
        Err(e @ Error::Texture { .. }) => {
            assert!(e.to_string().starts_with("texture mask: unsupported pixel format R_UNORM_8"))
        }
        other => panic!("expected unsupported format, got {other:?}"),
    }

    let export = core.export_by_name("mask", ExportOptions::builder().allow_fail(true).build())?;
    assert!(matches!(
        export.degraded,
        Some(Error::UnsupportedFormat(PixelFormat::R_UNORM_8))
    ));
    assert_eq!(export.data, pattern(256, 1));
    assert!(logs_contain("writing raw payload"));

    Ok(())
}

#[test]
fn info_serializes_to_json() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = CoreBuilder::new()
        .stream_prefix(0x200)
        .texture(
            "sky",
            &ImageSpec::streamed(512, 256, PixelFormat::BC6U as u8, pattern(8192, 2)).with_mips(10, 4),
        )
        .write(dir.path(), "sky.core")?;
    let core = CoreArchive::open(&path, ContainerOptions::default())?;

    let value = serde_json::to_value(core.info("sky")?).map_err(std::io::Error::from)?;
    assert_eq!(
        value,
        serde_json::json!({
            "name": "sky",
            "record_type": "Texture",
            "kind": "Texture2D",
            "width": 512,
            "height": 256,
            "width_crop": 0,
            "height_crop": 0,
            "format": "BC6U",
            "slices": 0,
            "mips": 10,
            "streamed_mips": 4,
            "embedded_size": 0,
            "streamed_size": 8192,
            "stream_offset": 512,
        })
    );

    Ok(())
}

#[test]
fn preview_reflects_replacement() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = CoreBuilder::new()
        .texture("pebble", &ImageSpec::embedded(4, 4, PixelFormat::BC1 as u8, pattern(8, 3)))
        .write(dir.path(), "pebble.core")?;
    let mut core = CoreArchive::open(&path, ContainerOptions::default())?;

    // Hands back the payload instead of decoding it
    let decoder = |dds: &[u8]| -> Result<Preview> {
        Ok(Preview {
            width: 4,
            height: 4,
            rgba: dds[148..].to_vec(),
        })
    };

    assert_eq!(core.preview_by_name("pebble", &decoder)?.rgba, pattern(8, 3));

    let mut replacement = hzd_tex::dds::synthesize_header(4, 4, 1, 1, PixelFormat::BC1)?;
    replacement.extend(pattern(8, 4));
    core.replace_by_name("pebble", &mut std::io::Cursor::new(replacement))?;

    assert_eq!(core.by_name("pebble")?.cached_preview(), None);
    assert_eq!(core.preview_by_name("pebble", &decoder)?.rgba, pattern(8, 4));

    Ok(())
}
