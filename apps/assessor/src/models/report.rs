use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{
    check_non_empty, check_unit_score, CultureFit, CvRecord, ExperienceEvaluation, JobRecord,
    SkillMatch, Validate,
};

/// Hiring recommendation band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    StrongMatch,
    GoodMatch,
    WeakMatch,
    NoMatch,
}

impl Recommendation {
    /// All bands, best first.
    pub const SCALE: [Recommendation; 4] = [
        Recommendation::StrongMatch,
        Recommendation::GoodMatch,
        Recommendation::WeakMatch,
        Recommendation::NoMatch,
    ];

    /// Band for an overall score: ≥0.8 strong, ≥0.6 good, ≥0.4 weak, else none.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            Recommendation::StrongMatch
        } else if score >= 0.6 {
            Recommendation::GoodMatch
        } else if score >= 0.4 {
            Recommendation::WeakMatch
        } else {
            Recommendation::NoMatch
        }
    }

    /// Wire label, e.g. `strong_match`.
    pub fn label(self) -> &'static str {
        match self {
            Recommendation::StrongMatch => "strong_match",
            Recommendation::GoodMatch => "good_match",
            Recommendation::WeakMatch => "weak_match",
            Recommendation::NoMatch => "no_match",
        }
    }

    pub fn score_range(self) -> &'static str {
        match self {
            Recommendation::StrongMatch => "80-100%",
            Recommendation::GoodMatch => "60-79%",
            Recommendation::WeakMatch => "40-59%",
            Recommendation::NoMatch => "0-39%",
        }
    }

    pub fn guidance(self) -> &'static str {
        match self {
            Recommendation::StrongMatch => "Highly qualified, proceed to interview",
            Recommendation::GoodMatch => "Qualified with some gaps, interview recommended",
            Recommendation::WeakMatch => {
                "Significant gaps, interview only if no better candidates"
            }
            Recommendation::NoMatch => "Not qualified for this role",
        }
    }
}

impl fmt::Display for Recommendation {
    /// `STRONG MATCH`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label().to_uppercase().replace('_', " "))
    }
}

/// The narrative part of the final assessment, produced by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentDetails {
    pub recommendation: Recommendation,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub concerns: Vec<String>,
    pub summary: String,
}

impl Validate for AssessmentDetails {
    fn validate(&self) -> Result<(), String> {
        check_non_empty("summary", &self.summary)
    }
}

/// Already-validated stage outputs the final report is built from.
#[derive(Debug, Clone)]
pub struct ReportSources {
    pub cv: CvRecord,
    pub job: JobRecord,
    pub skill_match: SkillMatch,
    pub experience: ExperienceEvaluation,
    pub culture_fit: CultureFit,
}

/// Final output of a workflow run. Serialized as the persisted report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentReport {
    #[serde(rename = "cv_data")]
    pub cv: CvRecord,
    #[serde(rename = "job_description")]
    pub job: JobRecord,
    pub skill_match: SkillMatch,
    #[serde(rename = "experience_evaluation")]
    pub experience: ExperienceEvaluation,
    pub culture_fit: CultureFit,
    pub overall_score: f64,
    pub recommendation: Recommendation,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub concerns: Vec<String>,
    pub summary: String,
    #[serde(rename = "timestamp")]
    pub generated_at: DateTime<Utc>,
}

impl AssessmentReport {
    /// Combines stage outputs into the final report.
    ///
    /// Precondition: every record in `sources` and `details` has already passed
    /// [`Validate`] in the stage that produced it; they are embedded as-is. Only
    /// `overall_score`, which is computed here rather than parsed, is checked.
    pub fn assemble(
        sources: ReportSources,
        overall_score: f64,
        details: AssessmentDetails,
        generated_at: DateTime<Utc>,
    ) -> Result<Self, String> {
        check_unit_score("overall_score", overall_score)?;

        Ok(Self {
            cv: sources.cv,
            job: sources.job,
            skill_match: sources.skill_match,
            experience: sources.experience,
            culture_fit: sources.culture_fit,
            overall_score,
            recommendation: details.recommendation,
            strengths: details.strengths,
            concerns: details.concerns,
            summary: details.summary,
            generated_at,
        })
    }
}
