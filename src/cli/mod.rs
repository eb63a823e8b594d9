//! CLI interface for quote-radar
//!
//! Provides subcommands for:
//! - `run`: Start the radar and print candidates and alerts
//! - `check`: Validate the configuration file
//! - `config`: Show the effective configuration

mod run;

pub use run::RunArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "quote-radar")]
#[command(about = "Real-time momentum radar for KRX equities")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the radar
    Run(RunArgs),
    /// Validate the configuration file
    Check,
    /// Show the effective configuration
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Market;

    #[test]
    fn test_parse_run_overrides() {
        let cli = Cli::try_parse_from([
            "quote-radar",
            "--config",
            "radar.toml",
            "run",
            "--synthetic",
            "--market",
            "kospi",
            "--top-k",
            "3",
            "--duration-secs",
            "30",
        ])
        .unwrap();

        assert_eq!(cli.config, "radar.toml");
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert!(args.synthetic);
        assert_eq!(args.market, Some(Market::Kospi));
        assert_eq!(args.top_k, Some(3));
        assert_eq!(args.poll_ms, None);
        assert_eq!(args.duration_secs, Some(30));
    }

    #[test]
    fn test_parse_check_uses_default_path() {
        let cli = Cli::try_parse_from(["quote-radar", "check"]).unwrap();
        assert_eq!(cli.config, "config.toml");
        assert!(matches!(cli.command, Commands::Check));
    }

    #[test]
    fn test_rejects_unknown_market() {
        assert!(Cli::try_parse_from(["quote-radar", "run", "--market", "nyse"]).is_err());
    }
}
