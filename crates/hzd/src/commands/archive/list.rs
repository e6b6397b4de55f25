use clap::Args;
use hzd_tex::TextureInfo;
use itertools::Itertools;
use miette::{IntoDiagnostic, Result};
use owo_colors::{OwoColorize, Stream};

use super::CoreFileArgs;

#[derive(Args)]
pub struct ListArgs {
    #[command(flatten)]
    core: CoreFileArgs,

    /// List only texture names
    #[arg(short, long, default_value_t = false)]
    short: bool,

    /// Print the metadata as JSON
    #[arg(long, default_value_t = false, conflicts_with = "short")]
    json: bool,
}

impl ListArgs {
    pub fn handle(&self) -> Result<()> {
        let core = self.core.open()?;

        let infos = core
            .texture_names()
            .map(|name| core.info(name))
            .collect::<hzd_tex::error::Result<Vec<_>>>()?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&infos).into_diagnostic()?);
            return Ok(());
        }

        for info in &infos {
            println!(
                "{}",
                info.name.if_supports_color(Stream::Stdout, |n| n.bold())
            );
            if self.short {
                continue;
            }
            for (title, value) in details(info) {
                println!("    {title}: {value}");
            }
        }

        Ok(())
    }
}

fn details(info: &TextureInfo) -> Vec<(&'static str, String)> {
    let mut details = vec![
        ("Type", info.record_type.to_string()),
        ("Kind", info.kind.to_string()),
        ("Width", info.width.to_string()),
        ("Height", info.height.to_string()),
        ("Format", info.format.to_string()),
        ("Slices", info.slices.to_string()),
        ("Mip maps", info.mips.to_string()),
        ("Streamed mip maps", info.streamed_mips.to_string()),
    ];

    if info.width_crop != 0 || info.height_crop != 0 {
        details.push((
            "Crop",
            [info.width_crop, info.height_crop].iter().join("x"),
        ));
    }

    let storage = [
        (info.embedded_size > 0).then(|| format!("{} bytes embedded", info.embedded_size)),
        info.stream_offset
            .map(|offset| format!("{} bytes streamed at {offset:#x}", info.streamed_size)),
    ];
    details.push(("Storage", storage.into_iter().flatten().join(", ")));

    details
}

#[cfg(test)]
mod test {
    use hzd_tex::{ImageKind, PixelFormat, TextureInfo};
    use pretty_assertions::assert_eq;

    use super::details;

    #[test]
    fn details_of_streamed_texture() {
        let info = TextureInfo {
            name: "sky".into(),
            record_type: "Texture",
            kind: ImageKind::CubeMap,
            width: 512,
            height: 512,
            width_crop: 0,
            height_crop: 1,
            format: PixelFormat::BC6U,
            slices: 6,
            mips: 10,
            streamed_mips: 4,
            embedded_size: 1024,
            streamed_size: 65536,
            stream_offset: Some(0x2000),
        };

        let details = details(&info);
        assert_eq!(details[1], ("Kind", "CubeMap".to_string()));
        assert_eq!(details[8], ("Crop", "0x1".to_string()));
        assert_eq!(
            details[9],
            (
                "Storage",
                "1024 bytes embedded, 65536 bytes streamed at 0x2000".to_string()
            )
        );
    }
}
