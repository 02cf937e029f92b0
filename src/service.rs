//! Composition root for the synchronization subsystem.
//!
//! One explicitly constructed service owns the scheduler, index worker,
//! pending log, and edge coordinator. There is deliberately no process-wide
//! singleton: the embedding application builds one service and passes it
//! around.

use std::{path::Path, sync::Arc};

use tracing::debug;

use crate::{
   Result,
   config::Config,
   debounce::DebounceScheduler,
   edges::{EdgeSyncCoordinator, EdgeSyncResult},
   indexer::IndexWorker,
   pending::{PendingLog, RecoveryReport},
   retry::RetryPolicy,
   store::{GraphStoreClient, VectorClientFactory},
   subject::SubjectResolver,
};

/// The synchronization service: every external operation enters here.
pub struct CanvasSyncService {
   config:    Config,
   worker:    Arc<IndexWorker>,
   scheduler: DebounceScheduler,
   pending:   Arc<PendingLog>,
   edges:     EdgeSyncCoordinator,
}

impl CanvasSyncService {
   pub fn new(
      config: Config,
      vector: VectorClientFactory,
      graph: Option<Arc<dyn GraphStoreClient>>,
      resolver: Arc<dyn SubjectResolver>,
   ) -> Self {
      let worker = Arc::new(IndexWorker::new(
         vector,
         resolver,
         config.index_table.clone(),
         config.index_timeout(),
      ));

      let pending = Arc::new(PendingLog::new(config.pending_log_path()));

      let scheduler = DebounceScheduler::new(
         config.debounce_window(),
         Arc::clone(&worker),
         RetryPolicy::index().with_max_attempts(config.index_max_attempts),
         Arc::clone(&pending),
      );

      let edges = EdgeSyncCoordinator::new(
         graph,
         RetryPolicy::edge_write().with_max_attempts(config.edge_max_attempts),
         config.effective_max_concurrent_edge_writes(),
      );

      Self { config, worker, scheduler, pending, edges }
   }

   pub fn config(&self) -> &Config {
      &self.config
   }

   /// Fire-and-forget: schedules a debounced index of one canvas. Called
   /// after every canvas mutation; never blocks and never fails the caller.
   pub fn schedule_index(&self, canvas_key: &str, base_path: &Path) {
      if !self.config.sync_enabled {
         debug!(canvas_key, "sync disabled, ignoring index request");
         return;
      }
      self.scheduler.schedule_index(canvas_key, base_path);
   }

   /// Replays the pending-entry log. Called once at process startup.
   pub async fn recover_pending(&self, base_path: &Path) -> RecoveryReport {
      if !self.config.sync_enabled {
         debug!("sync disabled, skipping pending recovery");
         return RecoveryReport::default();
      }
      self.pending.recover(base_path, &self.worker).await
   }

   /// Synchronizes all edges of one canvas into the graph store.
   pub async fn sync_all_edges(&self, canvas_path: &Path) -> Result<EdgeSyncResult> {
      self.edges.sync_all(canvas_path).await
   }

   /// Cancels all live debounce tasks. Called at process shutdown.
   pub fn cleanup(&self) {
      self.scheduler.cleanup();
   }

   /// Whether an index invocation for `canvas_key` is currently in flight.
   pub fn is_indexing(&self, canvas_key: &str) -> bool {
      self.scheduler.is_indexing(canvas_key)
   }

   /// Number of debounce tasks waiting for their quiet period to elapse.
   pub fn pending_debounce_tasks(&self) -> usize {
      self.scheduler.pending_tasks()
   }
}
