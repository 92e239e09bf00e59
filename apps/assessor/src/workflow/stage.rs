//! Stage contract. Every workflow node implements [`Stage`].

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::errors::{FailureKind, StageError};
use crate::models::{AssessmentReport, CultureFit, CvRecord, ExperienceEvaluation, JobRecord, SkillMatch};

/// Identity of a node in the assessment DAG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    LoadDocuments,
    ParseCv,
    AnalyzeJob,
    MatchSkills,
    EvaluateExperience,
    AssessCultureFit,
    Aggregate,
}

impl StageId {
    pub const ALL: [StageId; 7] = [
        StageId::LoadDocuments,
        StageId::ParseCv,
        StageId::AnalyzeJob,
        StageId::MatchSkills,
        StageId::EvaluateExperience,
        StageId::AssessCultureFit,
        StageId::Aggregate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StageId::LoadDocuments => "load_documents",
            StageId::ParseCv => "parse_cv",
            StageId::AnalyzeJob => "analyze_job",
            StageId::MatchSkills => "match_skills",
            StageId::EvaluateExperience => "evaluate_experience",
            StageId::AssessCultureFit => "assess_culture_fit",
            StageId::Aggregate => "aggregate",
        }
    }

    /// Which error category a failure of this stage is reported under.
    pub fn failure_kind(self) -> FailureKind {
        match self {
            StageId::LoadDocuments => FailureKind::DocumentLoad,
            StageId::ParseCv | StageId::AnalyzeJob => FailureKind::Extraction,
            StageId::MatchSkills | StageId::EvaluateExperience | StageId::AssessCultureFit => {
                FailureKind::Evaluation
            }
            StageId::Aggregate => FailureKind::Aggregation,
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of work in the workflow.
///
/// `Input` is the stage's view of the run state: it carries exactly the slots
/// the stage declared and nothing else. Stages return values; only the engine
/// writes them into the run state.
#[async_trait]
pub trait Stage: Send + Sync {
    type Input: Send + 'static;
    type Output: Send + 'static;

    async fn execute(
        &self,
        input: Self::Input,
        cancel: &CancellationToken,
    ) -> Result<Self::Output, StageError>;
}

pub type SharedStage<I, O> = Arc<dyn Stage<Input = I, Output = O>>;

// ────────────────────────────────────────────────────────────────────────────
// Partial state views
// ────────────────────────────────────────────────────────────────────────────

/// The run's two document references. Input of `load_documents`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentRefs {
    pub cv: PathBuf,
    pub job: PathBuf,
}

impl DocumentRefs {
    pub fn new(cv: impl Into<PathBuf>, job: impl Into<PathBuf>) -> Self {
        Self {
            cv: cv.into(),
            job: job.into(),
        }
    }

    /// Both references must be non-empty.
    pub fn check(&self) -> Result<(), String> {
        if self.cv.as_os_str().is_empty() {
            return Err("CV reference is empty".to_string());
        }
        if self.job.as_os_str().is_empty() {
            return Err("job description reference is empty".to_string());
        }
        Ok(())
    }
}

/// Output of `load_documents`.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDocuments {
    pub cv_text: String,
    pub job_text: String,
}

/// Input of `parse_cv`.
#[derive(Debug, Clone)]
pub struct CvTextView {
    pub cv_text: Arc<String>,
}

/// Input of `analyze_job`.
#[derive(Debug, Clone)]
pub struct JobTextView {
    pub job_text: Arc<String>,
}

/// Input shared by the three evaluators.
#[derive(Debug, Clone)]
pub struct CandidateView {
    pub cv: Arc<CvRecord>,
    pub job: Arc<JobRecord>,
}

/// Input of `aggregate`.
#[derive(Debug, Clone)]
pub struct AggregateView {
    pub cv: Arc<CvRecord>,
    pub job: Arc<JobRecord>,
    pub skill_match: Arc<SkillMatch>,
    pub experience: Arc<ExperienceEvaluation>,
    pub culture_fit: Arc<CultureFit>,
}

/// One implementation per logical stage. Built once and shared by every run.
#[derive(Clone)]
pub struct StageSet {
    pub load_documents: SharedStage<DocumentRefs, LoadedDocuments>,
    pub parse_cv: SharedStage<CvTextView, CvRecord>,
    pub analyze_job: SharedStage<JobTextView, JobRecord>,
    pub match_skills: SharedStage<CandidateView, SkillMatch>,
    pub evaluate_experience: SharedStage<CandidateView, ExperienceEvaluation>,
    pub assess_culture_fit: SharedStage<CandidateView, CultureFit>,
    pub aggregate: SharedStage<AggregateView, AssessmentReport>,
}
