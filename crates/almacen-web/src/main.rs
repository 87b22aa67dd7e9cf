//! Almacen admin web server

#![forbid(unsafe_code)]

use almacen_core::{
    Config,
    context_error::{Result, ResultExt},
    init_logging,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

/// Command line interface for the almacen web server
#[derive(Parser)]
#[command(
    name = "almacen-web",
    version = env!("CARGO_PKG_VERSION"),
    about = "Administrative front end for the almacen inventory backend"
)]
struct Cli {
    /// Configuration file path (defaults to ./almacen.toml when present)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Log format (json, pretty)
    #[arg(long)]
    log_format: Option<String>,

    /// Enable structured JSON logging
    #[arg(long)]
    json: bool,

    /// Subcommand
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand)]
enum Commands {
    /// Start the web server (default)
    Serve {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Inspect configuration
    Config {
        /// Show resolved configuration
        #[arg(short, long)]
        show: bool,

        /// Validate configuration
        #[arg(short, long)]
        validate: bool,
    },
}

impl Cli {
    /// Apply command line overrides on top of the loaded configuration
    fn apply(&self, config: &mut Config) {
        if let Some(level) = &self.log_level {
            config.logging.level.clone_from(level);
        }
        if let Some(format) = &self.log_format {
            config.logging.format.clone_from(format);
        }
        if self.json {
            config.logging.format = "json".to_string();
        }
        if let Some(Commands::Serve { port: Some(port) }) = &self.command {
            config.webserver.port = *port;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())
        .with_context(|| "Failed to load configuration")?;
    cli.apply(&mut config);

    match cli.command {
        Some(Commands::Config { show, validate }) => handle_config_command(&config, show, validate),
        Some(Commands::Serve { .. }) | None => {
            let _guard = init_logging(&config.logging)?;
            info!(
                version = env!("CARGO_PKG_VERSION"),
                log_level = %config.logging.level,
                "Almacen web starting"
            );
            almacen_web::serve(config).await
        }
    }
}

/// Handle the `config` subcommand
///
/// # Errors
///
/// Returns an error if the configuration fails validation or cannot be
/// serialized.
fn handle_config_command(config: &Config, show: bool, validate: bool) -> Result<()> {
    if validate {
        config.validate()?;
        println!("Configuration is valid");
    }

    if show || !validate {
        let rendered = serde_json::to_string_pretty(config)
            .with_context(|| "Failed to serialize configuration")?;
        println!("{rendered}");
    }

    Ok(())
}
