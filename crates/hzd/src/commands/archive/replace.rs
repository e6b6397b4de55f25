use clap::Args;
use hzd_tex::CoreArchive;
use miette::{miette, Context, IntoDiagnostic, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use super::CoreFileArgs;

#[derive(Args)]
pub struct ReplaceArgs {
    #[command(flatten)]
    core: CoreFileArgs,

    /// A DDS file, or a directory of `<texture name>.dds` files
    #[arg(short, long, value_name = "PATH")]
    input: PathBuf,

    /// Textures to replace, all matching files in the input directory when empty
    names: Vec<String>,
}

impl ReplaceArgs {
    pub fn handle(&self) -> Result<()> {
        let mut core = self.core.open()?;

        let replacements = match self.input.is_dir() {
            true => self.directory_replacements(&core)?,
            false => vec![(self.file_target()?, self.input.clone())],
        };

        if replacements.is_empty() {
            return Err(miette!("no matching texture to replace found"));
        }

        for (name, path) in &replacements {
            info!("replacing {name} with {}", path.display());

            let file = File::open(path)
                .into_diagnostic()
                .context(format!("opening {}", path.display()))?;
            core.replace_by_name(name, &mut BufReader::new(file))?;
        }

        Ok(())
    }

    /// The texture a single input file replaces
    fn file_target(&self) -> Result<String> {
        match self.names.as_slice() {
            [] => file_stem(&self.input)
                .ok_or_else(|| miette!("unable to get a texture name from {}", self.input.display())),
            [name] => Ok(name.clone()),
            _ => Err(miette!(
                "texture mapping for {} is not explicit, name a single texture",
                self.input.display()
            )),
        }
    }

    fn directory_replacements(&self, core: &CoreArchive) -> Result<Vec<(String, PathBuf)>> {
        if !self.names.is_empty() {
            return Ok(self
                .names
                .iter()
                .map(|name| (name.clone(), self.input.join(format!("{name}.dds"))))
                .collect());
        }

        let mut replacements = Vec::new();
        for entry in WalkDir::new(&self.input).max_depth(1).sort_by_file_name() {
            let entry = entry.into_diagnostic()?;
            let path = entry.path();
            let is_dds = path
                .extension()
                .map_or(false, |e| e.eq_ignore_ascii_case("dds"));
            if !entry.file_type().is_file() || !is_dds {
                continue;
            }

            match file_stem(path) {
                Some(name) if core.by_name(&name).is_ok() => {
                    replacements.push((name, path.to_path_buf()))
                }
                _ => debug!("skipping {}, no texture with that name", path.display()),
            }
        }

        Ok(replacements)
    }
}

fn file_stem(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_owned)
}
