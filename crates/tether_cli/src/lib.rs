//! The Tether command line tools
//!
//! Loads scene descriptions the same way a game would, and reports how their cross-scene
//! references resolve.

use clap::{Parser, Subcommand};
use commands::{check::CheckCommand, inspect::InspectCommand, mint::MintCommand};
use std::path::Path;
use tether::TetherConfig;
use tether_utils::{ok, AnyResult, AnyhowResultExt};

pub mod commands;

#[derive(Parser)]
#[command(name = "tether", author, version, about, long_about = None)]
pub struct Cli {
    /// Increases logging verbosity, can be repeated
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand)]
pub enum CliCommand {
    /// Loads scenes and reports the state of every reference they hold
    Check(CheckCommand),
    /// Prints freshly minted identifiers
    Mint(MintCommand),
    /// Lists the objects of a scene with their identifiers
    Inspect(InspectCommand),
}

pub trait Command {
    fn run(self) -> AnyResult;
}

/// Runs the tools as if they were ran from the command line.
pub fn run(cli: Cli) -> AnyResult {
    match cli.command {
        CliCommand::Check(c) => c.run()?,
        CliCommand::Mint(c) => c.run()?,
        CliCommand::Inspect(c) => c.run()?,
    }
    ok()
}

/// Loads the configuration file, or the defaults if none was given.
pub(crate) fn load_config(path: Option<&Path>) -> AnyResult<TetherConfig> {
    match path {
        Some(path) => TetherConfig::load(path)
            .otherwise_with(|| format!("couldn't load configuration from {}", path.display())),
        None => Ok(TetherConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        let cli = Cli::try_parse_from(["tether", "-vv", "mint", "-n", "3"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, CliCommand::Mint(MintCommand { count: 3 })));

        let cli = Cli::try_parse_from([
            "tether",
            "check",
            "a.toml",
            "b.toml",
            "--unload",
            "Level02",
        ])
        .unwrap();
        match cli.command {
            CliCommand::Check(check) => {
                assert_eq!(check.scenes.len(), 2);
                assert_eq!(check.unload.as_deref(), Some("Level02"));
            }
            _ => panic!("expected the check command"),
        }

        assert!(Cli::try_parse_from(["tether", "check"]).is_err());
    }

    #[test]
    fn missing_config_is_an_error() {
        assert_eq!(load_config(None).unwrap(), TetherConfig::default());
        assert!(load_config(Some(Path::new("/nonexistent/tether.toml"))).is_err());
    }
}
