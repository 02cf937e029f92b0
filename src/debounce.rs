//! Debounced scheduling of canvas indexing.
//!
//! Rapid repeated mutation notifications for the same canvas are coalesced
//! into a single retry-wrapped index invocation: every new notification
//! cancels the previous pending task and starts a fresh quiet-period timer,
//! so the fire that survives always indexes the latest canvas state.

use std::{
   collections::{HashMap, HashSet},
   path::{Path, PathBuf},
   sync::Arc,
};

use parking_lot::Mutex;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
   indexer::IndexWorker,
   pending::PendingLog,
   retry::{RetryPolicy, with_retry},
};

struct DebounceTask {
   generation: u64,
   token:      CancellationToken,
}

/// Removes a key from the indexing set on drop, so even a panicking worker
/// future cannot leave the key suppressed.
struct IndexingGuard {
   state: Arc<Mutex<SchedulerState>>,
   key:   String,
}

impl Drop for IndexingGuard {
   fn drop(&mut self) {
      self.state.lock().indexing.remove(&self.key);
   }
}

#[derive(Default)]
struct SchedulerState {
   /// Live delayed tasks, at most one per canvas key.
   tasks: HashMap<String, DebounceTask>,
   /// Keys with an index invocation currently in flight. Distinct from
   /// `tasks`: this suppresses duplicate work, not duplicate scheduling.
   indexing: HashSet<String>,
   next_generation: u64,
}

/// Coalesces mutation notifications into debounced index invocations.
///
/// All entry points are fire-and-forget: nothing here blocks the caller or
/// propagates an error back to it. Failures end up in the pending log.
pub struct DebounceScheduler {
   state:   Arc<Mutex<SchedulerState>>,
   window:  std::time::Duration,
   worker:  Arc<IndexWorker>,
   policy:  RetryPolicy,
   pending: Arc<PendingLog>,
}

impl DebounceScheduler {
   pub fn new(
      window: std::time::Duration,
      worker: Arc<IndexWorker>,
      policy: RetryPolicy,
      pending: Arc<PendingLog>,
   ) -> Self {
      Self {
         state: Arc::new(Mutex::new(SchedulerState::default())),
         window,
         worker,
         policy,
         pending,
      }
   }

   /// Schedules (or reschedules) an index of `canvas_key` after the quiet
   /// period. Superseding an existing pending task is expected control flow.
   pub fn schedule_index(&self, canvas_key: &str, base_path: &Path) {
      let token = CancellationToken::new();
      let generation;
      {
         let mut state = self.state.lock();
         generation = state.next_generation;
         state.next_generation += 1;

         let task = DebounceTask { generation, token: token.clone() };
         if let Some(previous) = state.tasks.insert(canvas_key.to_string(), task) {
            previous.token.cancel();
            debug!(canvas_key, "superseded pending debounce task");
         }
      }

      let key: String = canvas_key.to_string();
      let base: PathBuf = base_path.to_path_buf();
      let state = Arc::clone(&self.state);
      let worker = Arc::clone(&self.worker);
      let pending = Arc::clone(&self.pending);
      let policy = self.policy.clone();
      let window = self.window;

      tokio::spawn(async move {
         tokio::select! {
            () = token.cancelled() => return,
            () = time::sleep(window) => {},
         }

         // No await between claiming the fire and entering the indexing
         // set, so a cancel landing after this block can no longer abort
         // in-flight work.
         {
            let mut state = state.lock();
            match state.tasks.get(&key) {
               Some(task) if task.generation == generation => {
                  state.tasks.remove(&key);
               },
               // A newer task replaced this one between the timer firing
               // and the lock being taken.
               _ => return,
            }

            if !state.indexing.insert(key.clone()) {
               debug!(canvas_key = %key, "index already in flight, dropping redundant fire");
               return;
            }
         }

         let _guard = IndexingGuard { state, key: key.clone() };

         let result = with_retry(&policy, || {
            let worker = Arc::clone(&worker);
            let key = key.clone();
            let base = base.clone();
            async move { worker.index_canvas(&key, &base).await }
         })
         .await;

         if let Err(e) = result {
            warn!(canvas_key = %key, error = %e, "indexing failed permanently, persisting");
            pending.persist(&key, &e).await;
         }
      });
   }

   /// Whether an index invocation for `canvas_key` is currently in flight.
   pub fn is_indexing(&self, canvas_key: &str) -> bool {
      self.state.lock().indexing.contains(canvas_key)
   }

   /// Number of live (not yet fired) debounce tasks.
   pub fn pending_tasks(&self) -> usize {
      self.state.lock().tasks.len()
   }

   /// Cancels all live debounce tasks. In-flight index invocations are left
   /// to finish; only unfired timers are dropped.
   pub fn cleanup(&self) {
      let mut state = self.state.lock();
      for (canvas_key, task) in state.tasks.drain() {
         task.token.cancel();
         debug!(canvas_key = %canvas_key, "cancelled debounce task during cleanup");
      }
   }
}
