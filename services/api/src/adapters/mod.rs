pub mod db;
pub mod file_store;
pub mod memory;
pub mod retrying;

pub use db::PgKeyValueStore;
pub use file_store::FileStore;
pub use memory::MemoryStore;
pub use retrying::RetryingStore;
