//! `cansync recover` — replay the pending-entry log once.

use std::path::Path;

use crate::{Result, config::Config};

pub async fn run(base_path: &Path) -> Result<()> {
   let service = super::default_service(Config::load());
   let report = service.recover_pending(base_path).await;

   println!("recovered: {}", report.recovered);
   println!("pending:   {}", report.pending);

   Ok(())
}
