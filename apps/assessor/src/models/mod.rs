//! Structured records exchanged between workflow stages.
//!
//! Every record that comes back from the model is checked with [`Validate`]
//! exactly once, at the point the producing stage deserializes it. Downstream
//! code treats these records as already valid.

pub mod cv;
pub mod evaluation;
pub mod job;
pub mod report;

pub use cv::{CvRecord, Education, Skill, WorkExperience};
pub use evaluation::{CultureFit, ExperienceEvaluation, SkillMatch};
pub use job::JobRecord;
pub use report::{AssessmentDetails, AssessmentReport, Recommendation, ReportSources};

/// Post-deserialization checks for model output.
///
/// Serde enforces shape; `validate` enforces the value ranges and non-empty
/// fields serde cannot express.
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

/// Scores produced by the evaluators are fractions in `[0.0, 1.0]`.
pub(crate) fn check_unit_score(field: &str, value: f64) -> Result<(), String> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(format!("{field} must be between 0.0 and 1.0 (got {value})"))
    }
}

pub(crate) fn check_non_empty(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{field} must not be empty"))
    } else {
        Ok(())
    }
}
