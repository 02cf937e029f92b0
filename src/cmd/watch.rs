//! `cansync watch` — watch a directory of canvases and keep the derived
//! stores in sync.
//!
//! Runs pending-log recovery first, then schedules a debounced index for
//! every canvas file mutation until interrupted.

use std::path::Path;

use notify::{Event, RecursiveMode, Watcher};
use tokio::signal;
use tracing::{info, warn};

use crate::{
   Result,
   canvas::{self, CANVAS_EXTENSION},
   config::Config,
   service::CanvasSyncService,
};

pub async fn run(base_path: &Path) -> Result<()> {
   let service = super::default_service(Config::load());

   let report = service.recover_pending(base_path).await;
   if report.recovered + report.pending > 0 {
      info!(
         recovered = report.recovered,
         pending = report.pending,
         "startup recovery finished"
      );
   }

   let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
   let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
      let _ = tx.send(res);
   })?;
   watcher.watch(base_path, RecursiveMode::Recursive)?;

   info!(path = %base_path.display(), "watching for canvas mutations");

   loop {
      tokio::select! {
         _ = signal::ctrl_c() => break,
         event = rx.recv() => match event {
            Some(Ok(event)) => handle_event(&service, &event),
            Some(Err(e)) => warn!(error = %e, "watch error"),
            None => break,
         },
      }
   }

   service.cleanup();
   info!("watcher stopped");

   Ok(())
}

fn handle_event(service: &CanvasSyncService, event: &Event) {
   for path in &event.paths {
      if path.extension().and_then(|e| e.to_str()) != Some(CANVAS_EXTENSION) {
         continue;
      }
      let Some(parent) = path.parent() else { continue };
      let key = canvas::canvas_key(path);
      service.schedule_index(&key, parent);
   }
}
