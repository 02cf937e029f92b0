//! Index worker: one vector-index synchronization for one canvas.

use std::{
   path::Path,
   sync::Arc,
   time::{Duration, Instant},
};

use tokio::{sync::Mutex, time};
use tracing::{debug, warn};

use crate::{
   Result,
   canvas::{self, Canvas},
   error::SyncError,
   store::{ClientAvailability, VectorClientFactory, VectorIndexClient},
   subject::{DEFAULT_SUBJECT, SubjectResolver},
};

enum ClientSlot {
   NotInitialized,
   Available(Arc<dyn VectorIndexClient>),
   Unavailable(String),
}

/// Performs single vector-index synchronizations: lazy client acquisition,
/// canvas read, subject resolution, and a timed indexing write.
pub struct IndexWorker {
   factory:  VectorClientFactory,
   slot:     Mutex<ClientSlot>,
   resolver: Arc<dyn SubjectResolver>,
   table:    String,
   timeout:  Duration,
}

impl IndexWorker {
   pub fn new(
      factory: VectorClientFactory,
      resolver: Arc<dyn SubjectResolver>,
      table: String,
      timeout: Duration,
   ) -> Self {
      Self {
         factory,
         slot: Mutex::new(ClientSlot::NotInitialized),
         resolver,
         table,
         timeout,
      }
   }

   /// Current lifecycle state of the vector-index client.
   pub async fn client_availability(&self) -> ClientAvailability {
      match &*self.slot.lock().await {
         ClientSlot::NotInitialized => ClientAvailability::NotInitialized,
         ClientSlot::Available(_) => ClientAvailability::Available,
         ClientSlot::Unavailable(_) => ClientAvailability::Unavailable,
      }
   }

   /// Synchronizes one canvas into the vector index, returning the number of
   /// nodes written.
   ///
   /// Failure classification: a permanently unavailable client and a missing
   /// canvas file are fatal; a timed-out or otherwise failed client write is
   /// transient and left to the caller's retry policy.
   pub async fn index_canvas(&self, canvas_key: &str, base_path: &Path) -> Result<usize> {
      let client = self.acquire_client().await?;

      // Initialization is idempotent on the client side; a failure here is
      // reported by the indexing write itself if it matters.
      if let Err(e) = client.initialize().await {
         warn!(canvas_key, error = %e, "vector-index initialization failed, continuing");
      }

      let path = canvas::canvas_path(base_path, canvas_key);

      let subject = match self.resolver.resolve(&path).await {
         Ok(subject) => subject,
         Err(e) => {
            debug!(canvas_key, error = %e, "subject resolution failed, using default");
            DEFAULT_SUBJECT.to_string()
         },
      };

      let canvas = Canvas::load(&path).await?;

      let started = Instant::now();
      match time::timeout(
         self.timeout,
         client.index_canvas(&path, &canvas.nodes, &self.table, &subject),
      )
      .await
      {
         Ok(result) => {
            let count = result?;
            debug!(
               canvas_key,
               nodes = count,
               subject = %subject,
               elapsed_ms = started.elapsed().as_millis() as u64,
               "canvas indexed"
            );
            Ok(count)
         },
         Err(_) => Err(
            SyncError::Timeout {
               op:         "index_canvas",
               elapsed_ms: started.elapsed().as_millis() as u64,
            }
            .into(),
         ),
      }
   }

   /// Lazily constructs the vector-index client, caching both outcomes.
   ///
   /// A failed acquisition is remembered so the retry budget is never spent
   /// on a dependency that cannot appear mid-process.
   async fn acquire_client(&self) -> Result<Arc<dyn VectorIndexClient>> {
      let mut slot = self.slot.lock().await;

      match &*slot {
         ClientSlot::Available(client) => Ok(Arc::clone(client)),
         ClientSlot::Unavailable(reason) => Err(
            SyncError::ClientUnavailable {
               client: "vector-index",
               reason: reason.clone(),
            }
            .into(),
         ),
         ClientSlot::NotInitialized => match (self.factory)() {
            Ok(client) => {
               *slot = ClientSlot::Available(Arc::clone(&client));
               Ok(client)
            },
            Err(e) => {
               let reason = e.to_string();
               warn!(error = %e, "vector-index client unavailable, disabling indexing");
               *slot = ClientSlot::Unavailable(reason.clone());
               Err(SyncError::ClientUnavailable { client: "vector-index", reason }.into())
            },
         },
      }
   }
}
