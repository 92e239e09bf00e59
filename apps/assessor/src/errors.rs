use thiserror::Error;

use crate::documents::DocumentError;
use crate::llm_client::LlmError;
use crate::workflow::{GraphError, StageId, StateError};

/// Failure reported by a single stage.
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("{0}")]
    Invalid(String),

    #[error("stage cancelled")]
    Cancelled,

    #[error("stage task aborted: {0}")]
    Aborted(String),
}

/// Category a stage failure is reported under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    DocumentLoad,
    Extraction,
    Evaluation,
    Aggregation,
}

/// Outcome of a failed run. Stage failures always carry the failing stage and
/// its underlying cause.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Document loading failed at stage '{stage}': {source}")]
    DocumentLoad {
        stage: StageId,
        #[source]
        source: StageError,
    },

    #[error("Extraction failed at stage '{stage}': {source}")]
    Extraction {
        stage: StageId,
        #[source]
        source: StageError,
    },

    #[error("Evaluation failed at stage '{stage}': {source}")]
    Evaluation {
        stage: StageId,
        #[source]
        source: StageError,
    },

    #[error("Aggregation failed at stage '{stage}': {source}")]
    Aggregation {
        stage: StageId,
        #[source]
        source: StageError,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Workflow cancelled")]
    Cancelled,

    #[error("Invalid workflow graph: {0}")]
    Graph(#[from] GraphError),

    #[error("Workflow engine error: {0}")]
    Engine(String),
}

impl WorkflowError {
    /// Classifies a stage failure by the stage that produced it.
    pub fn stage_failed(stage: StageId, source: StageError) -> Self {
        if matches!(source, StageError::Cancelled) {
            return WorkflowError::Cancelled;
        }
        match stage.failure_kind() {
            FailureKind::DocumentLoad => WorkflowError::DocumentLoad { stage, source },
            FailureKind::Extraction => WorkflowError::Extraction { stage, source },
            FailureKind::Evaluation => WorkflowError::Evaluation { stage, source },
            FailureKind::Aggregation => WorkflowError::Aggregation { stage, source },
        }
    }

    /// The failing stage, for stage failures.
    pub fn stage(&self) -> Option<StageId> {
        match self {
            WorkflowError::DocumentLoad { stage, .. }
            | WorkflowError::Extraction { stage, .. }
            | WorkflowError::Evaluation { stage, .. }
            | WorkflowError::Aggregation { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    pub fn kind(&self) -> Option<FailureKind> {
        self.stage().map(StageId::failure_kind)
    }

    /// The stage's own error, for stage failures.
    pub fn cause(&self) -> Option<&StageError> {
        match self {
            WorkflowError::DocumentLoad { source, .. }
            | WorkflowError::Extraction { source, .. }
            | WorkflowError::Evaluation { source, .. }
            | WorkflowError::Aggregation { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<StateError> for WorkflowError {
    fn from(e: StateError) -> Self {
        WorkflowError::Engine(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_failed_classifies_by_stage() {
        let err = WorkflowError::stage_failed(
            StageId::ParseCv,
            StageError::Invalid("missing name".to_string()),
        );
        assert!(matches!(err, WorkflowError::Extraction { stage: StageId::ParseCv, .. }));
        assert_eq!(err.kind(), Some(FailureKind::Extraction));
        assert_eq!(err.cause().unwrap().to_string(), "missing name");
    }

    #[test]
    fn test_stage_failed_display_names_stage() {
        let err = WorkflowError::stage_failed(
            StageId::LoadDocuments,
            StageError::Document(DocumentError::NotFound("cv.pdf".to_string())),
        );
        assert_eq!(
            err.to_string(),
            "Document loading failed at stage 'load_documents': File not found: cv.pdf"
        );
    }

    #[test]
    fn test_cancelled_stage_is_run_cancellation() {
        let err = WorkflowError::stage_failed(StageId::MatchSkills, StageError::Cancelled);
        assert!(matches!(err, WorkflowError::Cancelled));
        assert_eq!(err.stage(), None);
    }

    #[test]
    fn test_source_chain_reaches_llm_error() {
        use std::error::Error as _;

        let err = WorkflowError::stage_failed(
            StageId::Aggregate,
            StageError::Llm(LlmError::EmptyContent),
        );
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "LLM returned empty content");
    }
}
