//! # originals-cache: Resolution Cache
//!
//! Bounded identifier → document cache with TTL expiry, LRU eviction and
//! content-hash verification. Documents are hashed through
//! `CanonicalBytes`, so a document re-serialized with different key order
//! still verifies.

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheStats, EntryInfo, ResolutionCache};
pub use config::CacheConfig;
pub use error::CacheError;
