pub mod cache;
pub mod memory;
pub mod postgres;
pub mod store;

pub use cache::create_redis_client;
pub use memory::MemoryStore;
pub use postgres::{create_pool, PgStore};
pub use store::{FavoriteStore, RatingStore, VersionedAggregate};
