//! Port implementations shipped with the runtime.

pub mod devnet;
pub mod memory_cache;

pub use memory_cache::InMemoryCache;
