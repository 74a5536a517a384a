mod memory;
mod postgres;
mod traits;

pub use memory::{MemoryRepository, MemorySnapshot};
pub use postgres::PostgresRepository;
pub use traits::{ActivityLog, NotificationStore, ProcessStore, Repository, UserDirectory};
