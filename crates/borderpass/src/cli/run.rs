use anyhow::Result;
use clap::Parser;
use console::style;
use tracing::info;

use borderpass::Borderpass;
use borderpass_core::config::StorageBackend;

/// Run the BorderPass server.
#[derive(Parser)]
pub struct RunCommand {
    /// Configuration file path.
    #[arg(short, long, default_value = "borderpass.toml")]
    pub config: String,

    /// Port to listen on (overrides config).
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Development mode: debug logging, demo accounts, throwaway JWT secret.
    #[arg(long)]
    pub dev: bool,
}

impl RunCommand {
    /// Execute the run command.
    pub async fn execute(self) -> Result<()> {
        let mut config = super::load_config(&self.config)?;
        super::init_tracing(&config.observability.logging, self.dev);

        if let Some(port) = self.port {
            config.gateway.port = port;
        }
        if self.dev {
            config.demo.seed_users = true;
        }

        println!();
        println!(
            "  {}  {} v{}",
            style("🛂").bold(),
            style("BorderPass").bold().cyan(),
            env!("CARGO_PKG_VERSION")
        );
        println!();
        println!(
            "  {} Listening on {}",
            style("🌐").bold(),
            style(format!("http://0.0.0.0:{}", config.gateway.port)).cyan()
        );
        let backend = match config.database.backend {
            StorageBackend::Memory => "in-memory",
            StorageBackend::Postgres => "postgres",
        };
        println!("  {} Storage: {}", style("🗄").bold(), backend);
        if config.demo.seed_users {
            println!(
                "  {} Demo accounts: admin, traveler, agriculture, identity",
                style("👤").bold()
            );
        }
        if self.dev {
            println!("  {} Development mode enabled", style("🔧").bold());
        }
        println!();

        info!("Loaded configuration from {}", self.config);

        let runtime = Borderpass::builder()
            .config(config)
            .dev(self.dev)
            .build()?;
        runtime.run().await?;

        println!("\n  {} Goodbye!", style("👋").bold());

        Ok(())
    }
}
