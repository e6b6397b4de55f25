pub mod archive;

#[derive(clap::Subcommand)]
pub enum Commands {
    /// Handle texture core files
    Core {
        #[command(subcommand)]
        command: archive::CoreCommands,
    },
}

impl Commands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            Commands::Core { command } => command.handle(),
        }
    }
}
