//! Workflow engine: a fixed DAG of assessment stages over a typed, write-once
//! run state.
//!
//! ```text
//! load_documents ─┬─ parse_cv ────┬─ match_skills ─────────┬─ aggregate
//!                 └─ analyze_job ─┼─ evaluate_experience ──┤
//!                                 └─ assess_culture_fit ───┘
//! ```
//!
//! A stage is dispatched as soon as every slot it reads is populated. Stages
//! only return values; the engine alone writes the run state.

pub mod engine;
pub mod graph;
pub mod stage;
pub mod state;

pub use engine::AssessmentWorkflow;
pub use graph::GraphError;
pub use stage::{
    AggregateView, CandidateView, CvTextView, DocumentRefs, JobTextView, LoadedDocuments, Stage,
    StageId, StageSet,
};
pub use state::StateError;
