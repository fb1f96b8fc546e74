//! # Modeldata Architecture
//!
//! Modeldata keeps an **in-memory replica** of a named record collection (e.g.
//! `congregations`, `events`) in sync with storage that only knows how to read
//! and write whole collections. UI code reads the replica freely and mutates it
//! only through the cache, which guarantees the replica never diverges from
//! storage after a failed write.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Presentation (any UI; the `modeldata` CLI is one)          │
//! │  - Reads records, renders StatusSnapshot / Outcome          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Cache Layer (cache.rs, status.rs)                          │
//! │  - Replica + index-addressed load/create/update/delete/reset│
//! │  - Busy flag and outcomes, never returns errors             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                     │
//! │  - StorageGateway trait: whole-collection read/write        │
//! │  - FsGateway (production), MemGateway (testing)             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Principle: No Presentation in Core
//!
//! The library never prints, never exits, and never decides how a failure is
//! shown. Every operation reports into a [`status::StatusTracker`]; a UI
//! subscribes and renders.
//!
//! ## Records Are Opaque
//!
//! A [`record::Record`] is a JSON object. No field names are assumed, and a
//! record's only identity is its position in the collection.
//!
//! ## Module Overview
//!
//! - [`cache`]: The collection cache and write policies
//! - [`status`]: Operation status tracking and outcomes
//! - [`store`]: Storage gateway trait and implementations
//! - [`record`]: Record type, parsing, collection name rules
//! - [`config`]: Layered configuration
//! - [`error`]: Error types and failure message extraction

pub mod cache;
pub mod config;
pub mod error;
pub mod record;
pub mod status;
pub mod store;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

pub use cache::{CollectionCache, WritePolicy};
pub use error::{failure_message, ModelDataError, Result};
pub use record::Record;
pub use status::{BusyGuard, OperationKind, Outcome, Phase, StatusSnapshot, StatusTracker};
pub use store::{FsGateway, MemGateway, StorageGateway};
