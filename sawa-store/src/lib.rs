pub mod app_config;
pub mod database;
pub mod memory;
pub mod redis_repo;
pub mod events;

pub use database::PgDocumentStore;
pub use memory::MemoryStore;
pub use redis_repo::RedisClient;
pub use events::EventProducer;
