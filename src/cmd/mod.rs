//! CLI subcommands.

pub mod recover;
pub mod sync_edges;
pub mod watch;

use std::sync::Arc;

use crate::{
   config::Config,
   service::CanvasSyncService,
   store::{JsonlGraphStore, JsonlVectorIndex, VectorClientFactory, VectorIndexClient},
   subject::FolderSubjectResolver,
};

/// Builds a service wired to the file-backed dev-mode stores.
pub(crate) fn default_service(config: Config) -> CanvasSyncService {
   let data_dir = config.data_dir();

   let index_dir = data_dir.join("index");
   let vector: VectorClientFactory = Box::new(move || {
      let client: Arc<dyn VectorIndexClient> =
         Arc::new(JsonlVectorIndex::new(index_dir.clone()));
      Ok(client)
   });

   let graph = Arc::new(JsonlGraphStore::new(data_dir.join("graph.json")));

   CanvasSyncService::new(config, vector, Some(graph), Arc::new(FolderSubjectResolver))
}
