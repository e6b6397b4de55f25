use clap::{Args, ValueEnum};
use hzd_tex::ExportOptions;
use image::{ImageFormat, RgbaImage};
use miette::{miette, Context, IntoDiagnostic, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use super::{selected, CoreFileArgs};
use crate::decoder::BlockDecoder;

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    #[default]
    Dds,
    Png,
    Tga,
}

impl OutputFormat {
    fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Dds => "dds",
            OutputFormat::Png => "png",
            OutputFormat::Tga => "tga",
        }
    }
}

#[derive(Args)]
pub struct ExtractArgs {
    #[command(flatten)]
    core: CoreFileArgs,

    /// An existing target directory
    #[arg(short = 'o', long = "output", value_name = "DIR")]
    directory: PathBuf,

    /// Image format of the exported files
    #[arg(short, long, value_enum, default_value_t)]
    format: OutputFormat,

    /// Allow overwriting the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,

    /// Write the raw payload of textures whose format has no DDS header
    #[arg(long, default_value_t = false)]
    allow_fail: bool,

    /// Textures to export, all of them when empty
    names: Vec<String>,
}

impl ExtractArgs {
    pub fn handle(&self) -> Result<()> {
        if !self.directory.is_dir() {
            return Err(miette!(
                "directory {} does not exist",
                self.directory.display()
            ));
        }

        let mut core = self.core.open()?;
        let names = selected(&core, &self.names)
            .into_iter()
            .map(str::to_owned)
            .collect::<Vec<_>>();

        for name in &names {
            let path = self
                .directory
                .join(format!("{name}.{}", self.format.extension()));
            info!("exporting {name} -> {}", path.display());

            match self.format {
                OutputFormat::Dds => {
                    let options = ExportOptions::builder().allow_fail(self.allow_fail).build();
                    let export = core.export_by_name(name, options)?;

                    let mut out = self.create(&path)?;
                    out.write_all(&export.data).into_diagnostic()?;
                    out.flush().into_diagnostic()?;
                }
                OutputFormat::Png | OutputFormat::Tga => {
                    let preview = core.preview_by_name(name, &BlockDecoder)?;
                    let bitmap = RgbaImage::from_raw(
                        preview.width,
                        preview.height,
                        preview.rgba.clone(),
                    )
                    .ok_or_else(|| miette!("decoded preview of {name} has the wrong size"))?;

                    let format = match self.format {
                        OutputFormat::Png => ImageFormat::Png,
                        _ => ImageFormat::Tga,
                    };
                    let mut out = self.create(&path)?;
                    bitmap
                        .write_to(&mut out, format)
                        .into_diagnostic()
                        .context(format!("encoding {}", path.display()))?;
                    out.flush().into_diagnostic()?;
                }
            }
        }

        Ok(())
    }

    fn create(&self, path: &Path) -> Result<BufWriter<File>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).into_diagnostic()?;
        }

        let file = match self.overwrite {
            true => File::create(path),
            false => File::create_new(path),
        }
        .into_diagnostic()
        .context(format!("creating {}", path.display()))?;

        Ok(BufWriter::new(file))
    }
}
