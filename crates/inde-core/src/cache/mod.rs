//! Local caching of system code tables.
//!
//! `ReferenceCache` keeps every parent id's child codes in one JSON blob with
//! a single timestamp, considered stale after 24 hours. Storage is pluggable
//! through `CodeStorage` (in-memory or one file per key), and the network
//! side through `CodeSource`.

pub mod manager;
pub mod storage;

pub use manager::{CodeSource, ReferenceCache, CACHE_KEY};
pub use storage::{CodeStorage, FileStorage, MemoryStorage, StorageError};
