//! clap-based command-line interface.
//!
//! Defines the [`Cli`] struct with the [`Command`] subcommands
//! (generate, cancel, status, voices) and global flags.

use clap::{Parser, Subcommand};

/// podforge — terminal client for the podcast generation backend.
#[derive(Debug, Parser)]
#[command(name = "podforge", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to an alternative podforge.toml.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Enable verbose output.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start audio generation for a podcast and follow its progress.
    /// Ctrl-C cancels the job.
    Generate {
        /// Identity of the podcast to generate.
        podcast_id: i64,
    },

    /// Ask the server to cancel a running generation job.
    Cancel {
        /// Identity of the podcast whose job should stop.
        podcast_id: i64,
    },

    /// Show a podcast draft: metadata, participants and transcript state.
    Status {
        /// Identity of the podcast to inspect.
        podcast_id: i64,
    },

    /// List the synthetic voices available for participants.
    Voices,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_generate_subcommand() {
        let cli = Cli::parse_from(["podforge", "generate", "42"]);
        match cli.command {
            Command::Generate { podcast_id } => assert_eq!(podcast_id, 42),
            _ => panic!("expected Generate command"),
        }
    }

    #[test]
    fn cli_parses_global_flags() {
        let cli = Cli::parse_from(["podforge", "--verbose", "--config", "dev.toml", "voices"]);
        assert!(cli.verbose);
        assert_eq!(cli.config.as_deref(), Some("dev.toml"));
        assert!(matches!(cli.command, Command::Voices));
    }

    #[test]
    fn cli_parses_status_subcommand() {
        let cli = Cli::parse_from(["podforge", "status", "7"]);
        match cli.command {
            Command::Status { podcast_id } => assert_eq!(podcast_id, 7),
            _ => panic!("expected Status command"),
        }
    }

    #[test]
    fn cli_verify() {
        Cli::command().debug_assert();
    }
}
