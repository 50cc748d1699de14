//! Domain-partitioned document caches
//!
//! The persistence collaborator of the model runtime. Documents are grouped
//! by the storage domain their class declares and can be written out and
//! read back per domain:
//! - `DomainCache`: the contract
//! - `InMemoryCache`: held in memory
//! - `JsonLocalCache`: one JSON file per document under `<root>/<domain>/`

mod cache;
mod error;
pub mod in_memory;
pub mod local_disk;

pub use cache::{entry_name, DomainCache, MIXIN_SEPARATOR};
pub use error::CacheError;
pub use in_memory::InMemoryCache;
pub use local_disk::JsonLocalCache;
