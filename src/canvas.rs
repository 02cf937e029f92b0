//! Canvas document model (JSON Canvas: nodes + edges) and disk access.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Result, error::SyncError};

/// Extension used by canvas documents on disk.
pub const CANVAS_EXTENSION: &str = "canvas";

/// A single node in a canvas graph.
///
/// Only the fields relevant to indexing are modeled; unknown fields in the
/// document are ignored on parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasNode {
   pub id: String,

   #[serde(rename = "type")]
   pub node_type: String,

   /// Inline text content (`type = "text"` nodes).
   #[serde(default, skip_serializing_if = "Option::is_none")]
   pub text: Option<String>,

   /// Referenced file path (`type = "file"` nodes).
   #[serde(default, skip_serializing_if = "Option::is_none")]
   pub file: Option<String>,

   #[serde(default, skip_serializing_if = "Option::is_none")]
   pub label: Option<String>,
}

/// A directed edge between two canvas nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasEdge {
   pub id:        String,
   pub from_node: String,
   pub to_node:   String,

   #[serde(default, skip_serializing_if = "Option::is_none")]
   pub label: Option<String>,
}

/// The authoritative canvas document: a graph of nodes and edges.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Canvas {
   #[serde(default)]
   pub nodes: Vec<CanvasNode>,
   #[serde(default)]
   pub edges: Vec<CanvasEdge>,
}

impl Canvas {
   /// Reads and parses a canvas document from disk.
   ///
   /// A missing file maps to [`SyncError::CanvasNotFound`], which the retry
   /// layer treats as fatal: the canvas is gone and retrying cannot help.
   pub async fn load(path: &Path) -> Result<Self> {
      let bytes = match tokio::fs::read(path).await {
         Ok(bytes) => bytes,
         Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(SyncError::CanvasNotFound(path.to_path_buf()).into());
         },
         Err(e) => return Err(e.into()),
      };

      Ok(serde_json::from_slice(&bytes)?)
   }
}

/// Derives the canvas key (file stem, no extension) from a canvas path.
pub fn canvas_key(path: &Path) -> String {
   path
      .file_stem()
      .map_or_else(|| path.display().to_string(), |s| s.to_string_lossy().into_owned())
}

/// Resolves the on-disk path for a canvas key under a base directory.
pub fn canvas_path(base: &Path, canvas_key: &str) -> PathBuf {
   base.join(format!("{canvas_key}.{CANVAS_EXTENSION}"))
}
