//! cansync — keeps derived stores eventually consistent with canvas documents.
//!
//! A canvas (JSON graph of nodes and edges) is the source of truth for a
//! learning workspace. This crate propagates canvas mutations into two
//! read-optimized stores: a vector index over node content and a graph store
//! over edges. The interesting parts are debounced scheduling, bounded
//! retry with a fatal/transient taxonomy, a durable pending log replayed at
//! startup, and semaphore-bounded bulk edge sync.

pub mod canvas;
pub mod cmd;
pub mod config;
pub mod debounce;
pub mod edges;
pub mod error;
pub mod indexer;
pub mod pending;
pub mod retry;
pub mod service;
pub mod store;
pub mod subject;

pub use error::{Error, Result};
pub use service::CanvasSyncService;
