//! Configuration for the synchronization subsystem: debounce window,
//! timeouts, concurrency caps, and data paths.

use std::path::{Path, PathBuf};

use directories::BaseDirs;
use figment::{
   Figment,
   providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

pub const MAX_CONCURRENT_EDGE_WRITES_CAP: usize = 64;
pub const MAX_INDEX_TIMEOUT_SECS_CAP: u64 = 600;

/// Application configuration loaded from config file and environment variables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
   /// Feature toggle for the entire synchronization subsystem.
   pub sync_enabled: bool,

   /// Quiet period before a scheduled index fires.
   pub debounce_window_ms: u64,

   /// Hard timeout for a single vector-index write.
   pub index_timeout_secs: u64,

   /// Total attempts (first try included) for one index invocation.
   pub index_max_attempts: u32,

   /// Total attempts for one per-edge graph write.
   pub edge_max_attempts: u32,

   /// Bound on simultaneous in-flight graph-store writes.
   pub max_concurrent_edge_writes: usize,

   /// Vector-index table receiving canvas nodes.
   pub index_table: String,

   /// File name of the pending-entry log inside the data directory.
   pub pending_log: String,

   /// Override for the data directory (defaults to `~/.cansync`).
   pub data_dir: Option<PathBuf>,
}

impl Default for Config {
   fn default() -> Self {
      Self {
         sync_enabled: true,
         debounce_window_ms: 500,
         index_timeout_secs: 30,
         index_max_attempts: 3,
         edge_max_attempts: 3,
         max_concurrent_edge_writes: 12,
         index_table: "canvas_nodes".to_string(),
         pending_log: "pending_sync.jsonl".to_string(),
         data_dir: None,
      }
   }
}

impl Config {
   /// Loads configuration by layering defaults, the global config file, and
   /// `CANSYNC_`-prefixed environment variables.
   pub fn load() -> Self {
      let config_path = ensure_global_config();

      Figment::from(Serialized::defaults(Self::default()))
         .merge(Toml::file(config_path))
         .merge(Env::prefixed("CANSYNC_").lowercase(true))
         .extract()
         .inspect_err(|e| tracing::warn!("failed to parse config: {e}"))
         .unwrap_or_default()
   }

   pub fn debounce_window(&self) -> std::time::Duration {
      std::time::Duration::from_millis(self.debounce_window_ms)
   }

   pub fn index_timeout(&self) -> std::time::Duration {
      std::time::Duration::from_secs(self.index_timeout_secs.min(MAX_INDEX_TIMEOUT_SECS_CAP))
   }

   /// Returns the configured edge-write bound, clamped to the safety cap.
   pub fn effective_max_concurrent_edge_writes(&self) -> usize {
      self
         .max_concurrent_edge_writes
         .min(MAX_CONCURRENT_EDGE_WRITES_CAP)
         .max(1)
   }

   /// Directory holding the pending log and dev-mode store files.
   pub fn data_dir(&self) -> PathBuf {
      self.data_dir.clone().unwrap_or_else(base_dir)
   }

   pub fn pending_log_path(&self) -> PathBuf {
      self.data_dir().join(&self.pending_log)
   }

   /// Replaces the data directory, mostly useful for tests and tooling.
   #[must_use]
   pub fn with_data_dir(mut self, dir: &Path) -> Self {
      self.data_dir = Some(dir.to_path_buf());
      self
   }
}

/// Returns the global config path, writing a default file on first run.
fn ensure_global_config() -> PathBuf {
   let path = base_dir().join("config.toml");
   if !path.exists() {
      if let Some(parent) = path.parent() {
         let _ = std::fs::create_dir_all(parent);
      }
      if let Ok(toml) = toml::to_string_pretty(&Config::default()) {
         let _ = std::fs::write(&path, toml);
      }
   }
   path
}

/// Base directory for cansync data (`$CANSYNC_HOME` or `~/.cansync`).
pub fn base_dir() -> PathBuf {
   if let Ok(dir) = std::env::var("CANSYNC_HOME") {
      return PathBuf::from(dir);
   }
   BaseDirs::new().map_or_else(
      || PathBuf::from(".cansync"),
      |dirs| dirs.home_dir().join(".cansync"),
   )
}
