#![forbid(unsafe_code)]

mod cmd;
mod logging;

use clap::Parser;
use cmd::{build::Build, parse::Parse};
use cnvd_walker::utils::measure::MeasureTime;
use indicatif::MultiProgress;
use logging::Logging;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(version, about = "CNVD database tool", author, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    logging: Logging,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    Build(Build),
    Parse(Parse),
}

impl Command {
    pub fn run(self, progress: Option<MultiProgress>) -> anyhow::Result<()> {
        match self {
            Self::Build(cmd) => cmd.run(progress),
            Self::Parse(cmd) => cmd.run(),
        }
    }
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        // only the build command does enough work for a progress bar
        let default_progress = matches!(self.command, Command::Build(_));
        let progress = self.logging.init(default_progress);

        // run

        let operation = match &self.command {
            Command::Build(_) => "Building",
            Command::Parse(_) => "Parsing",
        };
        let time = MeasureTime::new(operation);
        self.command.run(progress)?;
        drop(time);

        Ok(())
    }
}

fn main() -> ExitCode {
    if let Err(err) = Cli::parse().run() {
        log::error!("Failed to execute: {err}");
        for (n, cause) in err.chain().enumerate().skip(1) {
            log::info!("  {n}: {cause}");
        }
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
