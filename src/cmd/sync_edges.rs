//! `cansync sync-edges` — bulk-sync all edges of one canvas.

use std::path::Path;

use crate::{Result, config::Config};

pub async fn run(canvas_path: &Path, json: bool) -> Result<()> {
   let service = super::default_service(Config::load());
   let result = service.sync_all_edges(canvas_path).await?;

   if json {
      println!("{}", serde_json::to_string_pretty(&result)?);
   } else {
      println!("canvas:  {}", result.canvas_path);
      println!("total:   {}", result.total_edges);
      println!("synced:  {}", result.synced_count);
      println!("failed:  {}", result.failed_count);
      println!("skipped: {}", result.skipped_count);
      println!("elapsed: {}ms", result.sync_time_ms);
   }

   Ok(())
}
