//! Wires configuration, storage and the HTTP gateway into one process.

use std::sync::Arc;

use tokio::sync::broadcast;

use borderpass_core::config::{BorderpassConfig, StorageBackend};
use borderpass_core::error::{BorderpassError, Result};
use borderpass_core::{Clock, SystemClock};
use borderpass_runtime::db::Database;
use borderpass_runtime::gateway::{AuthConfig, GatewayConfig, GatewayServer};
use borderpass_runtime::migrations::MigrationRunner;
use borderpass_runtime::store::{MemoryRepository, PostgresRepository, Repository};
use borderpass_runtime::WorkflowEngine;

/// The BorderPass server runtime.
pub struct Borderpass {
    config: BorderpassConfig,
    dev: bool,
    shutdown_tx: broadcast::Sender<()>,
}

impl Borderpass {
    /// Create a new builder.
    pub fn builder() -> BorderpassBuilder {
        BorderpassBuilder::new()
    }

    /// Get the configuration.
    pub fn config(&self) -> &BorderpassConfig {
        &self.config
    }

    /// Gateway settings derived from the loaded configuration.
    ///
    /// Without a configured secret, dev mode signs tokens with a throwaway
    /// key and any other mode refuses to start.
    pub fn gateway_config(&self) -> Result<GatewayConfig> {
        let auth = &self.config.security.auth;
        let session_ttl_secs = i64::try_from(auth.session_ttl_secs).map_err(|_| {
            BorderpassError::Config("security.auth.session_ttl_secs is too large".into())
        })?;

        let auth = match auth.jwt_secret.as_deref() {
            Some(secret) if !secret.is_empty() => AuthConfig {
                session_ttl_secs,
                ..AuthConfig::with_secret(secret)
            },
            _ if self.dev => {
                tracing::warn!("No JWT secret configured, using a throwaway dev secret");
                AuthConfig {
                    session_ttl_secs,
                    ..AuthConfig::dev_mode()
                }
            }
            _ => {
                return Err(BorderpassError::Config(
                    "security.auth.jwt_secret is required outside dev mode".into(),
                ))
            }
        };

        Ok(GatewayConfig {
            port: self.config.gateway.port,
            cors_origins: self.config.gateway.cors_origins.clone(),
            auth,
        })
    }

    /// Run until Ctrl-C or `shutdown()`.
    pub async fn run(self) -> Result<()> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let gateway = self.gateway_config()?;

        match self.config.database.backend {
            StorageBackend::Memory => {
                tracing::warn!("Using the in-memory backend; data is lost on restart");
                let repo = MemoryRepository::new(clock.clone());
                self.serve(WorkflowEngine::new(repo, clock), gateway).await
            }
            StorageBackend::Postgres => {
                let db = Database::from_config(&self.config.database).await?;
                db.health_check().await?;

                let applied = MigrationRunner::new(db.pool().clone()).run().await?;
                if !applied.is_empty() {
                    tracing::info!(migrations = ?applied, "Applied migrations");
                }

                let repo = PostgresRepository::new(db.pool().clone(), clock.clone());
                let result = self.serve(WorkflowEngine::new(repo, clock), gateway).await;
                db.close().await;
                result
            }
        }
    }

    async fn serve<R: Repository>(
        &self,
        engine: WorkflowEngine<R>,
        gateway: GatewayConfig,
    ) -> Result<()> {
        if self.config.demo.seed_users {
            let seeded = engine.seed_demo_users(&self.config.demo.password).await?;
            for user in &seeded {
                tracing::info!(username = %user.username, role = %user.role, "Demo account ready");
            }
        }

        let server = GatewayServer::new(gateway, engine)
            .map_err(|e| BorderpassError::Config(e.to_string()))?;

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let shutdown = async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received shutdown signal");
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("Received shutdown notification");
                }
            }
        };

        server.run(shutdown).await?;
        tracing::info!("BorderPass stopped");
        Ok(())
    }

    /// Request shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

/// Builder for the runtime.
pub struct BorderpassBuilder {
    config: Option<BorderpassConfig>,
    dev: bool,
}

impl BorderpassBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            dev: false,
        }
    }

    /// Set the configuration.
    pub fn config(mut self, config: BorderpassConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Enable development mode.
    pub fn dev(mut self, dev: bool) -> Self {
        self.dev = dev;
        self
    }

    /// Build the runtime.
    pub fn build(self) -> Result<Borderpass> {
        let config = self
            .config
            .ok_or_else(|| BorderpassError::Config("Configuration is required".into()))?;
        config.validate()?;

        let (shutdown_tx, _) = broadcast::channel(1);
        Ok(Borderpass {
            config,
            dev: self.dev,
            shutdown_tx,
        })
    }
}

impl Default for BorderpassBuilder {
    fn default() -> Self {
        Self::new()
    }
}
