//! # Storage Layer
//!
//! This module defines the storage abstraction for modeldata. The
//! [`gateway::StorageGateway`] trait is the only way the cache talks to durable
//! storage, and it only knows two verbs: read a whole collection, write a whole
//! collection.
//!
//! ## Whole-Document Model
//!
//! A collection is persisted as one document. There are no per-record writes:
//! every mutation rewrites the full ordered sequence. Gateways must make that
//! rewrite atomic, so storage holds either the previous sequence or the new
//! one, never a mixture.
//!
//! ## Implementations
//!
//! - [`fs::FsGateway`]: Production gateway, one `<name>.json` file per
//!   collection, atomic temp-file + rename writes.
//! - [`mem::MemGateway`]: For testing cache logic without filesystem I/O.
//!   Simulates failures and counts calls.
//!
//! ## Storage Layout
//!
//! ```text
//! <data_dir>/
//! ├── congregations.json   # [ {...}, {...} ]
//! └── events.json
//! ```

pub mod fs;
pub mod gateway;
pub mod mem;

pub use fs::FsGateway;
pub use gateway::StorageGateway;
pub use mem::MemGateway;
