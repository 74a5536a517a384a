use anyhow::Result;
use clap::Parser;
use console::style;

use borderpass_runtime::migrations::MigrationRunner;
use borderpass_runtime::Database;

/// Apply pending database migrations.
#[derive(Parser)]
pub struct MigrateCommand {
    /// Configuration file path.
    #[arg(short, long, default_value = "borderpass.toml")]
    pub config: String,
}

impl MigrateCommand {
    pub async fn execute(self) -> Result<()> {
        let config = super::load_config(&self.config)?;
        super::init_tracing(&config.observability.logging, false);

        if config.database.url.is_empty() {
            anyhow::bail!(
                "database.url is not set in {} (or DATABASE_URL via ${{DATABASE_URL}})",
                self.config
            );
        }

        println!();
        println!(
            "  {}  {} Migrations",
            style("🛂").bold(),
            style("BorderPass").bold().cyan()
        );
        println!();

        let db = Database::from_config(&config.database).await?;
        let runner = MigrationRunner::new(db.pool().clone());

        println!("  {} Running pending migrations...", style("→").dim());
        let applied = runner.run().await?;
        db.close().await;

        if applied.is_empty() {
            println!("  {} Schema is up to date", style("ℹ").blue());
        } else {
            for name in &applied {
                println!("  {} Applied: {}", style("✓").green(), style(name).cyan());
            }
            println!(
                "  {} {} migration(s) applied",
                style("✓").green(),
                applied.len()
            );
        }
        println!();

        Ok(())
    }
}
