//! `aggregate`: computes the weighted overall score and asks the model for the
//! narrative (strengths, concerns, summary) that goes with it.
//!
//! The score and its recommendation band are computed here, not by the model.
//! A model recommendation that disagrees with the band is logged and replaced.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::agents::ask;
use crate::agents::prompts::{
    ASSESSMENT_DETAILS_SCHEMA, FINAL_ASSESSMENT_PROMPT_TEMPLATE, FINAL_SCORER_ROLE,
};
use crate::config::ScoringWeights;
use crate::errors::StageError;
use crate::llm_client::prompts::{comma_list, render, system_prompt, truncate, with_schema};
use crate::llm_client::LanguageModel;
use crate::models::{AssessmentDetails, AssessmentReport, Recommendation, ReportSources};
use crate::workflow::{AggregateView, Stage};

const MAX_LISTED: usize = 10;
const MAX_ANALYSIS_CHARS: usize = 200;

pub struct FinalScorer {
    llm: Arc<dyn LanguageModel>,
    weights: ScoringWeights,
}

impl FinalScorer {
    pub fn new(llm: Arc<dyn LanguageModel>, weights: ScoringWeights) -> Self {
        Self { llm, weights }
    }

    pub fn overall_score(&self, view: &AggregateView) -> f64 {
        self.weights.combine(
            view.skill_match.match_score,
            view.experience.experience_score,
            view.culture_fit.culture_fit_score,
        )
    }
}

#[async_trait]
impl Stage for FinalScorer {
    type Input = AggregateView;
    type Output = AssessmentReport;

    async fn execute(
        &self,
        view: AggregateView,
        cancel: &CancellationToken,
    ) -> Result<AssessmentReport, StageError> {
        let overall = self.overall_score(&view);
        let band = Recommendation::from_score(overall);
        info!(overall_score = overall, recommendation = band.label(), "Computed overall score");

        let prompt = build_prompt(&view, overall);
        debug!(prompt = %prompt, "Final assessment prompt");

        let mut details: AssessmentDetails =
            ask(&*self.llm, &system_prompt(FINAL_SCORER_ROLE), &prompt, cancel).await?;
        if details.recommendation != band {
            warn!(
                model = details.recommendation.label(),
                computed = band.label(),
                "Model recommendation disagrees with score band; using computed band"
            );
            details.recommendation = band;
        }

        let sources = ReportSources {
            cv: (*view.cv).clone(),
            job: (*view.job).clone(),
            skill_match: (*view.skill_match).clone(),
            experience: (*view.experience).clone(),
            culture_fit: (*view.culture_fit).clone(),
        };
        let report = AssessmentReport::assemble(sources, overall, details, Utc::now())
            .map_err(StageError::Invalid)?;

        info!("Final assessment: {} ({:.2})", report.recommendation, report.overall_score);
        Ok(report)
    }
}

fn first_items(items: &[String]) -> String {
    let shown = &items[..items.len().min(MAX_LISTED)];
    comma_list(shown, "None")
}

pub(crate) fn build_prompt(view: &AggregateView, overall: f64) -> String {
    let skill_score = format!("{:.2}", view.skill_match.match_score);
    let matched = first_items(&view.skill_match.matched_skills);
    let missing = first_items(&view.skill_match.missing_skills);
    let skill_analysis = truncate(&view.skill_match.skill_gap_analysis, MAX_ANALYSIS_CHARS);
    let experience_score = format!("{:.2}", view.experience.experience_score);
    let relevant_years = format!("{}", view.experience.relevant_years_experience);
    let experience_analysis = truncate(&view.experience.analysis, MAX_ANALYSIS_CHARS);
    let culture_score = format!("{:.2}", view.culture_fit.culture_fit_score);
    let soft_skills = first_items(&view.culture_fit.soft_skills_identified);
    let culture_notes = truncate(&view.culture_fit.notes, MAX_ANALYSIS_CHARS);
    let overall_score = format!("{overall:.2}");

    let prompt = render(
        FINAL_ASSESSMENT_PROMPT_TEMPLATE,
        &[
            ("name", view.cv.display_name()),
            ("job_title", view.job.job_title.as_str()),
            ("skill_score", skill_score.as_str()),
            ("matched", matched.as_str()),
            ("missing", missing.as_str()),
            ("skill_analysis", skill_analysis.as_str()),
            ("experience_score", experience_score.as_str()),
            ("experience_level", view.experience.experience_level.as_str()),
            ("relevant_years", relevant_years.as_str()),
            ("experience_analysis", experience_analysis.as_str()),
            ("culture_score", culture_score.as_str()),
            ("soft_skills", soft_skills.as_str()),
            ("culture_notes", culture_notes.as_str()),
            ("overall_score", overall_score.as_str()),
        ],
    );
    with_schema(&prompt, ASSESSMENT_DETAILS_SCHEMA)
}
