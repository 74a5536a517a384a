mod migrate;
mod run;

pub use migrate::MigrateCommand;
pub use run::RunCommand;

use std::path::Path;

use anyhow::Result;
use borderpass_core::config::{BorderpassConfig, LoggingConfig};

use clap::{Parser, Subcommand};

/// BorderPass - border-crossing paperwork tracker
#[derive(Parser)]
#[command(name = "borderpass")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Run the BorderPass server.
    Run(RunCommand),

    /// Apply pending database migrations.
    Migrate(MigrateCommand),
}

impl Cli {
    /// Execute the CLI command.
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Run(cmd) => cmd.execute().await,
            Commands::Migrate(cmd) => cmd.execute().await,
        }
    }
}

/// Load `.env` and the config file. A missing file means defaults.
fn load_config(path: &str) -> Result<BorderpassConfig> {
    dotenvy::dotenv().ok();

    if Path::new(path).exists() {
        Ok(BorderpassConfig::from_file(path)?)
    } else {
        Ok(BorderpassConfig::default())
    }
}

/// Install the global tracing subscriber. `RUST_LOG` wins over the config.
fn init_tracing(logging: &LoggingConfig, dev: bool) {
    let default_level = if dev { "debug" } else { logging.level.as_str() };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}
