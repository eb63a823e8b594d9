use clap::Parser;
use quote_radar::cli::{Cli, Commands};
use quote_radar::config::{Config, ConfigError};

const DEFAULT_CONFIG: &str = include_str!("../config.toml.example");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Check = cli.command {
        match Config::load_validated(&cli.config) {
            Ok(_) => {
                println!("{}: ok", cli.config);
                return Ok(());
            }
            Err(e) => {
                eprintln!("{}: {}", cli.config, e);
                std::process::exit(1);
            }
        }
    }

    // Load configuration
    let config = Config::load(&cli.config).or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
        eprintln!("Using default configuration");
        toml::from_str::<Config>(DEFAULT_CONFIG).map_err(ConfigError::from)
    })?;

    // Initialize telemetry
    let _telemetry = quote_radar::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => {
            tracing::info!("Starting radar");
            args.execute(config).await?;
        }
        Commands::Check => {}
        Commands::Config => {
            println!("# Effective configuration");
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
