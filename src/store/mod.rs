//! Backing-store collaborator seams: vector index and graph store.

pub(crate) mod jsonl;

use std::{path::Path, sync::Arc};

use async_trait::async_trait;

use crate::{
   Result,
   canvas::{CanvasEdge, CanvasNode},
};

pub use jsonl::{JsonlGraphStore, JsonlVectorIndex};

/// Client for the derived vector index (semantic search over node content).
#[async_trait]
pub trait VectorIndexClient: Send + Sync {
   /// Prepares the client for writes. Must be safe to call repeatedly;
   /// callers treat failures here as non-fatal.
   async fn initialize(&self) -> Result<()>;

   /// Writes all nodes of one canvas into `table`, replacing any previous
   /// content for that canvas. Returns the number of nodes indexed.
   async fn index_canvas(
      &self,
      canvas_path: &Path,
      nodes: &[CanvasNode],
      table: &str,
      subject: &str,
   ) -> Result<usize>;
}

/// Client for the derived graph store (relationship queries over edges).
#[async_trait]
pub trait GraphStoreClient: Send + Sync {
   /// Merge/upsert write keyed by edge identity. Repeating the call for an
   /// unchanged edge must not create a duplicate relationship.
   async fn merge_edge(&self, canvas_key: &str, edge: &CanvasEdge) -> Result<()>;
}

/// Constructor for the vector-index client, invoked lazily on first use.
///
/// Returning an error marks the client permanently unavailable for the
/// lifetime of the worker (e.g., a missing native dependency), so the retry
/// budget is never spent on a condition that cannot self-heal.
pub type VectorClientFactory =
   Box<dyn Fn() -> Result<Arc<dyn VectorIndexClient>> + Send + Sync>;

/// Tri-state lifecycle of a lazily-constructed backing-store client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientAvailability {
   /// No acquisition attempted yet.
   NotInitialized,
   /// Client constructed and reusable across invocations.
   Available,
   /// Acquisition failed once; never attempted again.
   Unavailable,
}
