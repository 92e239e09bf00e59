//! `evaluate_experience`: rates the candidate's work history against the
//! role's responsibilities and experience requirements.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::agents::ask;
use crate::agents::prompts::{EXPERIENCE_EVALUATOR_ROLE, EXPERIENCE_PROMPT_TEMPLATE, EXPERIENCE_SCHEMA};
use crate::errors::StageError;
use crate::llm_client::prompts::{bullet_list, render, system_prompt, with_schema};
use crate::llm_client::LanguageModel;
use crate::models::{CvRecord, ExperienceEvaluation, JobRecord, WorkExperience};
use crate::workflow::{CandidateView, Stage};

const MAX_RESPONSIBILITIES: usize = 3;
const MAX_JOB_RESPONSIBILITIES: usize = 5;

pub struct ExperienceEvaluator {
    llm: Arc<dyn LanguageModel>,
}

impl ExperienceEvaluator {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Stage for ExperienceEvaluator {
    type Input = CandidateView;
    type Output = ExperienceEvaluation;

    async fn execute(
        &self,
        view: CandidateView,
        cancel: &CancellationToken,
    ) -> Result<ExperienceEvaluation, StageError> {
        let prompt = build_prompt(&view.cv, &view.job);
        debug!(prompt = %prompt, "Experience evaluation prompt");

        let evaluation: ExperienceEvaluation =
            ask(&*self.llm, &system_prompt(EXPERIENCE_EVALUATOR_ROLE), &prompt, cancel).await?;
        info!(
            level = %evaluation.experience_level,
            relevant_years = evaluation.relevant_years_experience,
            "Experience score: {:.2}",
            evaluation.experience_score
        );
        Ok(evaluation)
    }
}

pub(crate) fn build_prompt(cv: &CvRecord, job: &JobRecord) -> String {
    let experience = format_experience(&cv.work_experience);
    let job_context = format_job_context(job);

    let prompt = render(
        EXPERIENCE_PROMPT_TEMPLATE,
        &[
            ("job_title", job.job_title.as_str()),
            ("experience", experience.as_str()),
            ("job_context", job_context.as_str()),
        ],
    );
    with_schema(&prompt, EXPERIENCE_SCHEMA)
}

fn format_duration(exp: &WorkExperience) -> String {
    match exp.duration_months {
        Some(months) => format!("{months} months"),
        None => format!(
            "{} - {}",
            exp.start_date.as_deref().unwrap_or("?"),
            exp.end_date.as_deref().unwrap_or("Present")
        ),
    }
}

/// Every role, with up to three responsibilities each.
fn format_experience(experience: &[WorkExperience]) -> String {
    if experience.is_empty() {
        return "No work experience listed".to_string();
    }
    let mut out = String::new();
    for exp in experience {
        out.push_str(&format!(
            "\n{} at {} ({})",
            exp.position,
            exp.company,
            format_duration(exp)
        ));
        if !exp.responsibilities.is_empty() {
            out.push_str("\n  Responsibilities:");
            for resp in exp.responsibilities.iter().take(MAX_RESPONSIBILITIES) {
                out.push_str(&format!("\n  - {resp}"));
            }
        }
    }
    out
}

fn format_job_context(job: &JobRecord) -> String {
    let mut sections = Vec::new();

    let responsibilities: Vec<&String> = job
        .responsibilities
        .iter()
        .take(MAX_JOB_RESPONSIBILITIES)
        .collect();
    if !responsibilities.is_empty() {
        sections.push(format!("RESPONSIBILITIES:\n{}", bullet_list(&responsibilities, "")));
    }
    if !job.necessary_experience.is_empty() {
        sections.push(format!(
            "REQUIRED EXPERIENCE:\n{}",
            bullet_list(&job.necessary_experience, "")
        ));
    }
    if !job.nice_to_have_experience.is_empty() {
        sections.push(format!(
            "PREFERRED EXPERIENCE:\n{}",
            bullet_list(&job.nice_to_have_experience, "")
        ));
    }

    if sections.is_empty() {
        "No job context available".to_string()
    } else {
        sections.join("\n\n")
    }
}
