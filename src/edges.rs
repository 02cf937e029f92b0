//! Bulk edge synchronization into the graph store under bounded concurrency.

use std::{path::Path, sync::Arc, time::Instant};

use serde::Serialize;
use tokio::{sync::Semaphore, task::JoinSet};
use tracing::{debug, info, warn};

use crate::{
   Result,
   canvas::{self, Canvas},
   retry::{RetryPolicy, with_retry},
   store::GraphStoreClient,
};

/// Aggregate outcome of one bulk edge sync.
///
/// Partial failure is reported through the counts, never as an error:
/// callers must inspect `failed_count` rather than rely on propagation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeSyncResult {
   pub canvas_path:   String,
   pub total_edges:   usize,
   pub synced_count:  usize,
   pub failed_count:  usize,
   pub skipped_count: usize,
   pub sync_time_ms:  u64,
}

/// Synchronizes all edges of one canvas into the graph store.
pub struct EdgeSyncCoordinator {
   graph:          Option<Arc<dyn GraphStoreClient>>,
   policy:         RetryPolicy,
   max_concurrent: usize,
}

impl EdgeSyncCoordinator {
   pub fn new(
      graph: Option<Arc<dyn GraphStoreClient>>,
      policy: RetryPolicy,
      max_concurrent: usize,
   ) -> Self {
      Self { graph, policy, max_concurrent: max_concurrent.max(1) }
   }

   /// Reads the canvas and merges every edge into the graph store.
   ///
   /// Errors only when the canvas itself cannot be read. Without a graph
   /// client every edge counts as skipped (degraded mode, not an error).
   /// Each per-edge write runs under its own retry policy inside a
   /// semaphore-bounded pool; edges that exhaust retries count as failed.
   pub async fn sync_all(&self, canvas_path: &Path) -> Result<EdgeSyncResult> {
      let started = Instant::now();
      let canvas = Canvas::load(canvas_path).await?;
      let total_edges = canvas.edges.len();

      let Some(graph) = &self.graph else {
         debug!(
            canvas_path = %canvas_path.display(),
            total_edges,
            "no graph store configured, skipping edge sync"
         );
         return Ok(EdgeSyncResult {
            canvas_path:   canvas_path.display().to_string(),
            total_edges,
            synced_count:  0,
            failed_count:  0,
            skipped_count: total_edges,
            sync_time_ms:  started.elapsed().as_millis() as u64,
         });
      };

      let canvas_key = canvas::canvas_key(canvas_path);
      let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
      let mut tasks: JoinSet<bool> = JoinSet::new();

      for edge in canvas.edges {
         let semaphore = Arc::clone(&semaphore);
         let graph = Arc::clone(graph);
         let canvas_key = canvas_key.clone();
         let policy = self.policy.clone();

         tasks.spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
               return false;
            };

            let result = with_retry(&policy, || {
               let graph = Arc::clone(&graph);
               let canvas_key = canvas_key.clone();
               let edge = edge.clone();
               async move { graph.merge_edge(&canvas_key, &edge).await }
            })
            .await;

            if let Err(e) = result {
               warn!(edge_id = %edge.id, error = %e, "edge write exhausted retries");
               return false;
            }
            true
         });
      }

      let mut synced_count = 0;
      let mut failed_count = 0;
      while let Some(joined) = tasks.join_next().await {
         match joined {
            Ok(true) => synced_count += 1,
            Ok(false) => failed_count += 1,
            Err(e) => {
               warn!(error = %e, "edge sync task aborted");
               failed_count += 1;
            },
         }
      }

      let result = EdgeSyncResult {
         canvas_path: canvas_path.display().to_string(),
         total_edges,
         synced_count,
         failed_count,
         skipped_count: 0,
         sync_time_ms: started.elapsed().as_millis() as u64,
      };

      info!(
         canvas_path = %result.canvas_path,
         total = result.total_edges,
         synced = result.synced_count,
         failed = result.failed_count,
         elapsed_ms = result.sync_time_ms,
         "bulk edge sync finished"
      );

      Ok(result)
   }
}
