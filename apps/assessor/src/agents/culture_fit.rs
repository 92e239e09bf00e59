//! `assess_culture_fit`: soft skills and leadership against the role's
//! expectations.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::agents::ask;
use crate::agents::prompts::{CULTURE_FIT_PROMPT_TEMPLATE, CULTURE_FIT_ROLE, CULTURE_FIT_SCHEMA};
use crate::errors::StageError;
use crate::llm_client::prompts::{bullet_list, comma_list, render, system_prompt, with_schema};
use crate::llm_client::LanguageModel;
use crate::models::{CultureFit, CvRecord, JobRecord, WorkExperience};
use crate::workflow::{CandidateView, Stage};

const MAX_ROLES: usize = 3;
const MAX_RESPONSIBILITIES: usize = 3;

pub struct CultureFitAssessor {
    llm: Arc<dyn LanguageModel>,
}

impl CultureFitAssessor {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Stage for CultureFitAssessor {
    type Input = CandidateView;
    type Output = CultureFit;

    async fn execute(
        &self,
        view: CandidateView,
        cancel: &CancellationToken,
    ) -> Result<CultureFit, StageError> {
        let prompt = build_prompt(&view.cv, &view.job);
        debug!(prompt = %prompt, "Culture fit prompt");

        let fit: CultureFit =
            ask(&*self.llm, &system_prompt(CULTURE_FIT_ROLE), &prompt, cancel).await?;
        info!(
            soft_skills = fit.soft_skills_identified.len(),
            leadership_indicators = fit.leadership_indicators.len(),
            "Culture fit score: {:.2}",
            fit.culture_fit_score
        );
        Ok(fit)
    }
}

pub(crate) fn build_prompt(cv: &CvRecord, job: &JobRecord) -> String {
    let experience = format_experience(&cv.work_experience);
    let certifications = comma_list(&cv.certifications, "None");
    let languages = comma_list(&cv.languages, "None");
    let responsibilities = bullet_list(&job.responsibilities, "Not specified");
    let leadership = if job.requires_leadership() {
        bullet_list(&job.leadership, "")
    } else {
        "None - This is an individual contributor role".to_string()
    };
    let soft_skills = bullet_list(&job.soft_skills_requirement, "Not specified");

    let prompt = render(
        CULTURE_FIT_PROMPT_TEMPLATE,
        &[
            ("name", cv.display_name()),
            ("summary", cv.summary.as_deref().unwrap_or("Not provided")),
            ("experience", experience.as_str()),
            ("certifications", certifications.as_str()),
            ("languages", languages.as_str()),
            ("job_title", job.job_title.as_str()),
            ("company", job.company.as_deref().unwrap_or("Not specified")),
            ("responsibilities", responsibilities.as_str()),
            ("leadership", leadership.as_str()),
            ("soft_skills", soft_skills.as_str()),
        ],
    );
    with_schema(&prompt, CULTURE_FIT_SCHEMA)
}

/// The three most recent roles, where soft-skill evidence usually lives.
fn format_experience(experience: &[WorkExperience]) -> String {
    if experience.is_empty() {
        return "Not provided".to_string();
    }
    experience
        .iter()
        .take(MAX_ROLES)
        .map(|exp| {
            let mut entry = format!("- {} at {}", exp.position, exp.company);
            if !exp.responsibilities.is_empty() {
                entry.push_str("\n  Key responsibilities:");
                for resp in exp.responsibilities.iter().take(MAX_RESPONSIBILITIES) {
                    entry.push_str(&format!("\n    - {resp}"));
                }
            }
            entry
        })
        .collect::<Vec<_>>()
        .join("\n")
}
