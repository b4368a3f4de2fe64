//! Storage implementations for lock state.
//!
//! - **Memory Lock Store** - process-lifetime storage, shareable between
//!   guard instances
//! - **Redis Lock Store** - durable storage with TTL-based cleanup of
//!   expired lockouts

pub mod lock_store_memory;
pub mod lock_store_redis;

// Re-exports
pub use lock_store_memory::MemoryLockStore;
pub use lock_store_redis::RedisLockStore;
