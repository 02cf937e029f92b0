//! Subject/category resolution for canvases.

use std::path::Path;

use async_trait::async_trait;

use crate::Result;

/// Subject assigned when no resolver answer is available.
pub const DEFAULT_SUBJECT: &str = "general";

/// Resolves the subject (category) a canvas belongs to.
///
/// The index worker treats resolution as best-effort: failures fall back to
/// [`DEFAULT_SUBJECT`] rather than aborting the synchronization.
#[async_trait]
pub trait SubjectResolver: Send + Sync {
   async fn resolve(&self, canvas_path: &Path) -> Result<String>;
}

/// Resolver that uses the canvas's parent directory name as its subject.
pub struct FolderSubjectResolver;

#[async_trait]
impl SubjectResolver for FolderSubjectResolver {
   async fn resolve(&self, canvas_path: &Path) -> Result<String> {
      let subject = canvas_path
         .parent()
         .and_then(Path::file_name)
         .map(|name| name.to_string_lossy().into_owned())
         .filter(|name| !name.is_empty());

      Ok(subject.unwrap_or_else(|| DEFAULT_SUBJECT.to_string()))
   }
}
