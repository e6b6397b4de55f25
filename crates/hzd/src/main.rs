use std::io::IsTerminal;

use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use miette::{IntoDiagnostic, Result};
use tracing_log::AsTrace;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod decoder;

#[derive(Parser)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: commands::Commands,

    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
}

fn main() -> Result<()> {
    better_panic::install();

    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(std::io::stderr().is_terminal())
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time()
                .compact(),
        )
        .with(
            EnvFilter::builder()
                .with_default_directive(cli.verbose.log_level_filter().as_trace().into())
                .from_env_lossy(),
        )
        .try_init()
        .into_diagnostic()?;

    cli.command.handle()
}

#[cfg(test)]
mod test {
    use clap::{CommandFactory, Parser};

    use super::Cli;

    #[test]
    fn command_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn extract_output_flag() {
        let args = ["hzd", "core", "extract", "-c", "ui.core", "-o", "out", "icon_0"];
        assert!(Cli::try_parse_from(args).is_ok());

        let args = ["hzd", "core", "extract", "-c", "ui.core", "-d", "out"];
        assert!(Cli::try_parse_from(args).is_err());
    }
}
