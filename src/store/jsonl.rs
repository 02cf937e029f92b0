//! File-backed dev-mode implementations of the store collaborators.
//!
//! These back the CLI when no external services are configured: the vector
//! index mirrors canvas nodes into per-canvas JSONL files, and the graph
//! store keeps a single JSON map keyed by edge identity so repeated writes
//! are natural upserts.

use std::{
   collections::BTreeMap,
   path::{Path, PathBuf},
};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{
   Result,
   canvas::{CanvasEdge, CanvasNode},
   store::{GraphStoreClient, VectorIndexClient},
};

/// Vector-index stand-in that mirrors node content to JSONL files.
pub struct JsonlVectorIndex {
   dir: PathBuf,
}

#[derive(Serialize)]
struct NodeRecord<'a> {
   canvas:    &'a str,
   subject:   &'a str,
   node_id:   &'a str,
   node_type: &'a str,
   #[serde(skip_serializing_if = "Option::is_none")]
   text:      Option<&'a str>,
   #[serde(skip_serializing_if = "Option::is_none")]
   file:      Option<&'a str>,
}

impl JsonlVectorIndex {
   pub fn new(dir: PathBuf) -> Self {
      Self { dir }
   }
}

#[async_trait]
impl VectorIndexClient for JsonlVectorIndex {
   async fn initialize(&self) -> Result<()> {
      tokio::fs::create_dir_all(&self.dir).await?;
      Ok(())
   }

   async fn index_canvas(
      &self,
      canvas_path: &Path,
      nodes: &[CanvasNode],
      table: &str,
      subject: &str,
   ) -> Result<usize> {
      let canvas = crate::canvas::canvas_key(canvas_path);
      let table_dir = self.dir.join(table);
      tokio::fs::create_dir_all(&table_dir).await?;

      let mut out = String::new();
      for node in nodes {
         let record = NodeRecord {
            canvas:    &canvas,
            subject,
            node_id:   &node.id,
            node_type: &node.node_type,
            text:      node.text.as_deref(),
            file:      node.file.as_deref(),
         };
         out.push_str(&serde_json::to_string(&record)?);
         out.push('\n');
      }

      // Whole-file replace keeps reindexing idempotent.
      let path = table_dir.join(format!("{canvas}.jsonl"));
      let tmp = path.with_extension("jsonl.tmp");
      tokio::fs::write(&tmp, out).await?;
      tokio::fs::rename(&tmp, &path).await?;

      Ok(nodes.len())
   }
}

/// Graph-store stand-in backed by a single JSON map on disk.
pub struct JsonlGraphStore {
   path:  PathBuf,
   guard: Mutex<()>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EdgeRecord {
   canvas:     String,
   from_node:  String,
   to_node:    String,
   #[serde(default, skip_serializing_if = "Option::is_none")]
   label:      Option<String>,
   updated_at: String,
}

impl JsonlGraphStore {
   pub fn new(path: PathBuf) -> Self {
      Self { path, guard: Mutex::new(()) }
   }

   async fn load_map(&self) -> Result<BTreeMap<String, EdgeRecord>> {
      match tokio::fs::read(&self.path).await {
         Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
         Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
         Err(e) => Err(e.into()),
      }
   }

   /// Number of distinct relationships currently stored.
   pub async fn edge_count(&self) -> Result<usize> {
      Ok(self.load_map().await?.len())
   }
}

#[async_trait]
impl GraphStoreClient for JsonlGraphStore {
   async fn merge_edge(&self, canvas_key: &str, edge: &CanvasEdge) -> Result<()> {
      // Writes are read-modify-write over one file; serialize them.
      let _guard = self.guard.lock().await;

      let mut map = self.load_map().await?;
      map.insert(
         format!("{canvas_key}/{}", edge.id),
         EdgeRecord {
            canvas:     canvas_key.to_string(),
            from_node:  edge.from_node.clone(),
            to_node:    edge.to_node.clone(),
            label:      edge.label.clone(),
            updated_at: Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
         },
      );

      if let Some(parent) = self.path.parent() {
         tokio::fs::create_dir_all(parent).await?;
      }
      let tmp = self.path.with_extension("json.tmp");
      tokio::fs::write(&tmp, serde_json::to_vec(&map)?).await?;
      tokio::fs::rename(&tmp, &self.path).await?;

      Ok(())
   }
}
