mod database;
mod observability;

pub use database::{DatabaseConfig, StorageBackend};
pub use observability::{LoggingConfig, ObservabilityConfig};

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{BorderpassError, Result};

/// Root configuration for BorderPass.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BorderpassConfig {
    /// Project metadata.
    #[serde(default)]
    pub project: ProjectConfig,

    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Gateway configuration.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Security configuration.
    #[serde(default)]
    pub security: SecurityConfig,

    /// Demo data configuration.
    #[serde(default)]
    pub demo: DemoConfig,
}

impl BorderpassConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| BorderpassError::Config(format!("Failed to read config file: {}", e)))?;

        Self::parse_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let content = substitute_env_vars(content);

        let config: Self = toml::from_str(&content)
            .map_err(|e| BorderpassError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-section constraints that serde defaults cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.database.backend == StorageBackend::Postgres && self.database.url.is_empty() {
            return Err(BorderpassError::Config(
                "database.url is required for the postgres backend".into(),
            ));
        }
        Ok(())
    }
}

/// Project metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name.
    #[serde(default = "default_project_name")]
    pub name: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: default_project_name(),
        }
    }
}

fn default_project_name() -> String {
    "borderpass".to_string()
}

/// Gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// HTTP port.
    #[serde(default = "default_http_port")]
    pub port: u16,

    /// Allowed CORS origins; `"*"` allows any.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_http_port(),
            cors_origins: default_cors_origins(),
        }
    }
}

fn default_http_port() -> u16 {
    8080
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

/// Security configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SecurityConfig {
    /// JWT configuration.
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// JWT secret for signing and validating session tokens.
    pub jwt_secret: Option<String>,

    /// Session TTL in seconds.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            session_ttl_secs: default_session_ttl(),
        }
    }
}

fn default_session_ttl() -> u64 {
    8 * 60 * 60 // one shift
}

/// Demo data seeded at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoConfig {
    /// Seed one account per role when the user directory is empty.
    #[serde(default)]
    pub seed_users: bool,

    /// Password given to every seeded account.
    #[serde(default = "default_demo_password")]
    pub password: String,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            seed_users: false,
            password: default_demo_password(),
        }
    }
}

fn default_demo_password() -> String {
    "pass123".to_string()
}

/// Substitute environment variables in the format ${VAR_NAME}.
fn substitute_env_vars(content: &str) -> String {
    let Ok(re) = regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}") else {
        return content.to_string();
    };

    let mut result = content.to_string();
    for cap in re.captures_iter(content) {
        let var_name = &cap[1];
        if let Ok(value) = std::env::var(var_name) {
            result = result.replace(&cap[0], &value);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BorderpassConfig::default();
        assert_eq!(config.gateway.port, 8080);
        assert_eq!(config.database.backend, StorageBackend::Memory);
        assert!(!config.demo.seed_users);
        assert_eq!(config.security.auth.session_ttl_secs, 8 * 60 * 60);
    }

    #[test]
    fn test_parse_empty_config() {
        let config = BorderpassConfig::parse_toml("").unwrap();
        assert_eq!(config.project.name, "borderpass");
        assert_eq!(config.gateway.cors_origins, vec!["*".to_string()]);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            [project]
            name = "paso-fronterizo"

            [database]
            backend = "postgres"
            url = "postgres://localhost/borderpass"
            pool_size = 25

            [gateway]
            port = 3000
            cors_origins = ["http://localhost:5173"]

            [security.auth]
            jwt_secret = "s3cret"
            session_ttl_secs = 600

            [observability.logging]
            level = "debug"

            [demo]
            seed_users = true
        "#;

        let config = BorderpassConfig::parse_toml(toml).unwrap();
        assert_eq!(config.project.name, "paso-fronterizo");
        assert_eq!(config.database.pool_size, 25);
        assert_eq!(config.gateway.port, 3000);
        assert_eq!(config.security.auth.jwt_secret.as_deref(), Some("s3cret"));
        assert_eq!(config.security.auth.session_ttl_secs, 600);
        assert_eq!(config.observability.logging.level, "debug");
        assert!(config.demo.seed_users);
        assert_eq!(config.demo.password, "pass123");
    }

    #[test]
    fn test_postgres_requires_url() {
        let toml = r#"
            [database]
            backend = "postgres"
        "#;

        let result = BorderpassConfig::parse_toml(toml);
        assert!(matches!(result, Err(BorderpassError::Config(_))));
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("BORDERPASS_TEST_JWT", "from-env");

        let toml = r#"
            [security.auth]
            jwt_secret = "${BORDERPASS_TEST_JWT}"
        "#;

        let config = BorderpassConfig::parse_toml(toml).unwrap();
        assert_eq!(config.security.auth.jwt_secret.as_deref(), Some("from-env"));

        std::env::remove_var("BORDERPASS_TEST_JWT");
    }

    #[test]
    fn test_unset_env_var_left_verbatim() {
        let toml = r#"
            [project]
            name = "${BORDERPASS_SURELY_UNSET_VAR}"
        "#;

        let config = BorderpassConfig::parse_toml(toml).unwrap();
        assert_eq!(config.project.name, "${BORDERPASS_SURELY_UNSET_VAR}");
    }
}
