//! `load_documents`: reads both documents concurrently off the async runtime.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::documents::{DocumentError, DocumentLoader};
use crate::errors::StageError;
use crate::workflow::{DocumentRefs, LoadedDocuments, Stage};

pub struct DocumentStage {
    loader: Arc<dyn DocumentLoader>,
}

impl DocumentStage {
    pub fn new(loader: Arc<dyn DocumentLoader>) -> Self {
        Self { loader }
    }

    async fn load(&self, path: PathBuf) -> Result<String, StageError> {
        let loader = self.loader.clone();
        let text = tokio::task::spawn_blocking(move || loader.load(&path))
            .await
            .map_err(|e| StageError::Aborted(format!("document loader task failed: {e}")))??;
        Ok(text)
    }
}

#[async_trait]
impl Stage for DocumentStage {
    type Input = DocumentRefs;
    type Output = LoadedDocuments;

    async fn execute(
        &self,
        refs: DocumentRefs,
        cancel: &CancellationToken,
    ) -> Result<LoadedDocuments, StageError> {
        info!("Loading CV from: {}", refs.cv.display());
        info!("Loading job description from: {}", refs.job.display());

        let both = async {
            tokio::try_join!(self.load(refs.cv.clone()), self.load(refs.job.clone()))
        };
        let (cv_text, job_text) = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(StageError::Cancelled),
            loaded = both => loaded?,
        };

        if cv_text.trim().is_empty() {
            return Err(DocumentError::Extraction {
                path: refs.cv.display().to_string(),
                message: "document contains no text".to_string(),
            }
            .into());
        }
        if job_text.trim().is_empty() {
            return Err(DocumentError::Extraction {
                path: refs.job.display().to_string(),
                message: "document contains no text".to_string(),
            }
            .into());
        }

        info!(
            cv_chars = cv_text.len(),
            job_chars = job_text.len(),
            "Documents loaded"
        );
        Ok(LoadedDocuments { cv_text, job_text })
    }
}
