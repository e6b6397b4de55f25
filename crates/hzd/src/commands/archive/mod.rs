use clap::Args;
use hzd_tex::{ContainerOptions, CoreArchive, LayoutRevision};
use miette::{Context, Result};
use std::path::PathBuf;
use tracing::info;

pub mod extract;
pub mod list;
pub mod replace;

#[derive(clap::Subcommand)]
pub enum CoreCommands {
    /// List the textures in a core file
    List(list::ListArgs),
    /// Export textures from a core file into a directory
    Extract(extract::ExtractArgs),
    /// Replace textures in a core file with DDS files
    Replace(replace::ReplaceArgs),
}

impl CoreCommands {
    pub fn handle(&self) -> Result<()> {
        match self {
            CoreCommands::List(list) => list.handle(),
            CoreCommands::Extract(extract) => extract.handle(),
            CoreCommands::Replace(replace) => replace.handle(),
        }
    }
}

/// Arguments shared by every core command
#[derive(Args)]
pub struct CoreFileArgs {
    /// An input core file, payloads are read from `<FILE>.stream`
    #[arg(short = 'c', long = "core-file", value_name = "FILE")]
    file: PathBuf,

    /// Read image descriptors with the older layout
    #[arg(long, default_value_t = false)]
    legacy_layout: bool,
}

impl CoreFileArgs {
    pub fn open(&self) -> Result<CoreArchive> {
        let revision = match self.legacy_layout {
            true => LayoutRevision::Legacy,
            false => LayoutRevision::Current,
        };

        let core = CoreArchive::open(
            &self.file,
            ContainerOptions::builder().revision(revision).build(),
        )
        .context(format!("loading {}", self.file.display()))?;

        info!("loaded {} ({} textures)", self.file.display(), core.len());
        Ok(core)
    }
}

/// The textures named on the command line, or all of them
fn selected<'a>(core: &'a CoreArchive, names: &'a [String]) -> Vec<&'a str> {
    match names.is_empty() {
        true => core.texture_names().collect(),
        false => names.iter().map(String::as_str).collect(),
    }
}
