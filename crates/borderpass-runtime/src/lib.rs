pub mod db;
pub mod engine;
pub mod gateway;
pub mod migrations;
pub mod store;

pub use db::Database;
pub use engine::WorkflowEngine;
pub use gateway::{AuthConfig, GatewayConfig, GatewayServer};
pub use migrations::{Migration, MigrationRunner};
pub use store::{MemoryRepository, PostgresRepository, Repository};
