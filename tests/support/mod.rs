#![allow(dead_code)]

use std::{
   collections::BTreeMap,
   path::{Path, PathBuf},
   sync::{
      Arc,
      atomic::{AtomicUsize, Ordering},
   },
   time::Duration,
};

use async_trait::async_trait;
use cansync::{
   Result,
   canvas::{CanvasEdge, CanvasNode},
   config::Config,
   error::SyncError,
   store::{GraphStoreClient, VectorClientFactory, VectorIndexClient},
   subject::SubjectResolver,
};
use parking_lot::Mutex;

/// One recorded vector-index write.
#[derive(Debug, Clone)]
pub struct IndexCall {
   pub canvas_path: PathBuf,
   pub node_count:  usize,
   pub subject:     String,
}

/// Vector-index mock that records calls and can fail or stall on demand.
pub struct RecordingVectorIndex {
   pub calls:          Mutex<Vec<IndexCall>>,
   pub init_calls:     AtomicUsize,
   /// Number of upcoming `index_canvas` calls that fail transiently.
   pub fail_remaining: AtomicUsize,
   /// Number of upcoming `index_canvas` calls that panic outright.
   pub panic_remaining: AtomicUsize,
   /// Virtual time spent inside each `index_canvas` call.
   pub index_delay:    Duration,
   pub active:         AtomicUsize,
   pub max_active:     AtomicUsize,
}

impl RecordingVectorIndex {
   pub fn new() -> Self {
      Self {
         calls:           Mutex::new(Vec::new()),
         init_calls:      AtomicUsize::new(0),
         fail_remaining:  AtomicUsize::new(0),
         panic_remaining: AtomicUsize::new(0),
         index_delay:     Duration::ZERO,
         active:         AtomicUsize::new(0),
         max_active:     AtomicUsize::new(0),
      }
   }

   pub fn with_delay(mut self, delay: Duration) -> Self {
      self.index_delay = delay;
      self
   }

   pub fn fail_next(self, count: usize) -> Self {
      self.fail_remaining.store(count, Ordering::SeqCst);
      self
   }

   pub fn panic_next(self, count: usize) -> Self {
      self.panic_remaining.store(count, Ordering::SeqCst);
      self
   }

   pub fn call_count(&self) -> usize {
      self.calls.lock().len()
   }
}

#[async_trait]
impl VectorIndexClient for RecordingVectorIndex {
   async fn initialize(&self) -> Result<()> {
      self.init_calls.fetch_add(1, Ordering::SeqCst);
      Ok(())
   }

   async fn index_canvas(
      &self,
      canvas_path: &Path,
      nodes: &[CanvasNode],
      _table: &str,
      subject: &str,
   ) -> Result<usize> {
      if self
         .panic_remaining
         .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
         .is_ok()
      {
         panic!("forced index panic");
      }

      let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
      self.max_active.fetch_max(active, Ordering::SeqCst);

      if !self.index_delay.is_zero() {
         tokio::time::sleep(self.index_delay).await;
      }

      self.active.fetch_sub(1, Ordering::SeqCst);

      if self
         .fail_remaining
         .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
         .is_ok()
      {
         return Err(SyncError::TransientWrite {
            op:     "index_canvas",
            reason: "forced failure".to_string(),
         }
         .into());
      }

      self.calls.lock().push(IndexCall {
         canvas_path: canvas_path.to_path_buf(),
         node_count:  nodes.len(),
         subject:     subject.to_string(),
      });

      Ok(nodes.len())
   }
}

/// Graph-store mock tracking merge counts per edge identity plus the
/// high-water mark of concurrent writes.
pub struct FlakyGraphStore {
   pub merged:     Mutex<BTreeMap<String, usize>>,
   /// Edge ids that always fail.
   pub fail_edges: Vec<String>,
   pub merge_delay: Duration,
   pub active:     AtomicUsize,
   pub max_active: AtomicUsize,
}

impl FlakyGraphStore {
   pub fn new() -> Self {
      Self {
         merged:      Mutex::new(BTreeMap::new()),
         fail_edges:  Vec::new(),
         merge_delay: Duration::ZERO,
         active:      AtomicUsize::new(0),
         max_active:  AtomicUsize::new(0),
      }
   }

   pub fn fail_on(mut self, edge_id: &str) -> Self {
      self.fail_edges.push(edge_id.to_string());
      self
   }

   pub fn with_delay(mut self, delay: Duration) -> Self {
      self.merge_delay = delay;
      self
   }

   pub fn distinct_edges(&self) -> usize {
      self.merged.lock().len()
   }
}

#[async_trait]
impl GraphStoreClient for FlakyGraphStore {
   async fn merge_edge(&self, canvas_key: &str, edge: &CanvasEdge) -> Result<()> {
      let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
      self.max_active.fetch_max(active, Ordering::SeqCst);

      if !self.merge_delay.is_zero() {
         tokio::time::sleep(self.merge_delay).await;
      }

      self.active.fetch_sub(1, Ordering::SeqCst);

      if self.fail_edges.iter().any(|id| id == &edge.id) {
         return Err(SyncError::TransientWrite {
            op:     "merge_edge",
            reason: "forced edge failure".to_string(),
         }
         .into());
      }

      *self
         .merged
         .lock()
         .entry(format!("{canvas_key}/{}", edge.id))
         .or_insert(0) += 1;

      Ok(())
   }
}

/// Resolver returning a fixed subject.
pub struct StaticSubjectResolver(pub &'static str);

#[async_trait]
impl SubjectResolver for StaticSubjectResolver {
   async fn resolve(&self, _canvas_path: &Path) -> Result<String> {
      Ok(self.0.to_string())
   }
}

pub fn factory_for(client: Arc<RecordingVectorIndex>) -> VectorClientFactory {
   Box::new(move || Ok(Arc::clone(&client) as Arc<dyn VectorIndexClient>))
}

/// Factory whose acquisition always fails, as when a native dependency of
/// the real client is missing. Returns the factory plus its invocation
/// counter so tests can assert the failure is cached.
pub fn unavailable_factory() -> (VectorClientFactory, Arc<AtomicUsize>) {
   let calls = Arc::new(AtomicUsize::new(0));
   let counter = Arc::clone(&calls);

   let factory: VectorClientFactory = Box::new(move || {
      counter.fetch_add(1, Ordering::SeqCst);
      Err(SyncError::ClientUnavailable {
         client: "vector-index",
         reason: "dependency missing".to_string(),
      }
      .into())
   });

   (factory, calls)
}

/// Config pointing all durable state at a temp dir, with a short debounce
/// window unless a test overrides it.
pub fn test_config(data_dir: &Path) -> Config {
   Config::default().with_data_dir(data_dir)
}

/// Writes a canvas file with `node_count` text nodes and the given edges
/// (each edge id connects the first two nodes).
pub fn write_canvas(dir: &Path, canvas_key: &str, node_count: usize, edge_ids: &[&str]) -> PathBuf {
   let nodes: Vec<serde_json::Value> = (0..node_count)
      .map(|i| {
         serde_json::json!({
            "id": format!("n{i}"),
            "type": "text",
            "text": format!("note {i} in {canvas_key}"),
         })
      })
      .collect();

   let edges: Vec<serde_json::Value> = edge_ids
      .iter()
      .map(|id| {
         serde_json::json!({
            "id": id,
            "fromNode": "n0",
            "toNode": "n1",
         })
      })
      .collect();

   let path = dir.join(format!("{canvas_key}.canvas"));
   let doc = serde_json::json!({ "nodes": nodes, "edges": edges });
   std::fs::write(&path, serde_json::to_vec_pretty(&doc).unwrap()).unwrap();
   path
}

/// Polls `check` under the (possibly paused) tokio clock until it returns
/// true or the iteration budget runs out.
pub async fn wait_until(mut check: impl FnMut() -> bool) {
   for _ in 0..1000 {
      if check() {
         return;
      }
      tokio::time::sleep(Duration::from_millis(100)).await;
   }
   panic!("condition not reached within wait budget");
}
