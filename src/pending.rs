//! Durable pending-entry log: the crash-recovery queue for canvases whose
//! synchronization exhausted its retries.
//!
//! The log is an append-only, line-delimited JSON file. Recovery at startup
//! replays it through the index worker, deduplicating to the most recent
//! entry per canvas key, and rewrites the file with only the entries that
//! still fail.

use std::{collections::BTreeMap, path::{Path, PathBuf}};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::{Error, indexer::IndexWorker};

/// One durable record of a synchronization attempt that exhausted retries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingEntry {
   pub canvas_key: String,
   pub timestamp:  DateTime<Utc>,
   pub error:      String,
}

/// Counts reported by a recovery pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RecoveryReport {
   /// Entries successfully reprocessed and dropped from the log.
   pub recovered: usize,
   /// Entries that still fail and remain in the log.
   pub pending: usize,
}

/// Append-only log of pending synchronizations.
pub struct PendingLog {
   path: PathBuf,
}

impl PendingLog {
   pub fn new(path: PathBuf) -> Self {
      Self { path }
   }

   pub fn path(&self) -> &Path {
      &self.path
   }

   /// Appends one entry to the log.
   ///
   /// Never propagates its own failure: losing a pending record is
   /// preferable to failing the caller, which is already on a failure path.
   pub async fn persist(&self, canvas_key: &str, error: &Error) {
      let entry = PendingEntry {
         canvas_key: canvas_key.to_string(),
         timestamp:  Utc::now(),
         error:      error.to_string(),
      };

      if let Err(e) = self.append(&entry).await {
         warn!(canvas_key, error = %e, "failed to persist pending entry");
      } else {
         info!(canvas_key, "persisted pending entry for recovery");
      }
   }

   async fn append(&self, entry: &PendingEntry) -> crate::Result<()> {
      if let Some(parent) = self.path.parent() {
         tokio::fs::create_dir_all(parent).await?;
      }

      let mut line = serde_json::to_string(entry)?;
      line.push('\n');

      let mut file = tokio::fs::OpenOptions::new()
         .create(true)
         .append(true)
         .open(&self.path)
         .await?;
      file.write_all(line.as_bytes()).await?;
      file.flush().await?;

      Ok(())
   }

   /// Replays the log through the index worker.
   ///
   /// Each unique canvas key gets a single best-effort attempt; the log
   /// itself is the retry mechanism across restarts, so no backoff wrapper
   /// is applied here. The file is rewritten with the survivors (fresh
   /// timestamps) or deleted when none remain, which makes repeated recovery
   /// against a still-unavailable store idempotent.
   pub async fn recover(&self, base_path: &Path, worker: &IndexWorker) -> RecoveryReport {
      let content = match tokio::fs::read_to_string(&self.path).await {
         Ok(content) => content,
         Err(e) if e.kind() == std::io::ErrorKind::NotFound => return RecoveryReport::default(),
         Err(e) => {
            warn!(error = %e, "failed to read pending log");
            return RecoveryReport::default();
         },
      };

      let entries = parse_entries(&content);
      if entries.is_empty() {
         let _ = tokio::fs::remove_file(&self.path).await;
         return RecoveryReport::default();
      }

      let mut recovered = 0;
      let mut still_failing: Vec<PendingEntry> = Vec::new();

      for (canvas_key, entry) in entries {
         match worker.index_canvas(&canvas_key, base_path).await {
            Ok(nodes) => {
               info!(canvas_key = %canvas_key, nodes, "recovered pending canvas");
               recovered += 1;
            },
            Err(e) => {
               debug!(canvas_key = %canvas_key, error = %e, "pending canvas still failing");
               still_failing.push(PendingEntry {
                  canvas_key: entry.canvas_key,
                  timestamp:  Utc::now(),
                  error:      e.to_string(),
               });
            },
         }
      }

      let pending = still_failing.len();
      if let Err(e) = self.rewrite(&still_failing).await {
         warn!(error = %e, "failed to rewrite pending log after recovery");
      }

      info!(recovered, pending, "pending-log recovery finished");
      RecoveryReport { recovered, pending }
   }

   /// Replaces the log contents, deleting the file when nothing remains.
   async fn rewrite(&self, entries: &[PendingEntry]) -> crate::Result<()> {
      if entries.is_empty() {
         match tokio::fs::remove_file(&self.path).await {
            Ok(()) => return Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
         }
      }

      let mut out = String::new();
      for entry in entries {
         out.push_str(&serde_json::to_string(entry)?);
         out.push('\n');
      }

      let tmp = self.path.with_extension("jsonl.tmp");
      tokio::fs::write(&tmp, out).await?;
      tokio::fs::rename(&tmp, &self.path).await?;

      Ok(())
   }
}

/// Parses log lines into the most recent entry per canvas key.
///
/// Malformed lines are skipped; later lines overwrite earlier ones for the
/// same key. Keys come back in sorted order, which keeps recovery
/// deterministic.
fn parse_entries(content: &str) -> BTreeMap<String, PendingEntry> {
   let mut entries = BTreeMap::new();

   for line in content.lines() {
      let line = line.trim();
      if line.is_empty() {
         continue;
      }
      match serde_json::from_str::<PendingEntry>(line) {
         Ok(entry) => {
            entries.insert(entry.canvas_key.clone(), entry);
         },
         Err(e) => {
            debug!(error = %e, "skipping malformed pending-log line");
         },
      }
   }

   entries
}
