//! `match_skills`: compares the candidate's education, skills and recent
//! roles with the job's requirements.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::agents::ask;
use crate::agents::prompts::{SKILLS_MATCHER_ROLE, SKILLS_MATCH_PROMPT_TEMPLATE, SKILL_MATCH_SCHEMA};
use crate::errors::StageError;
use crate::llm_client::prompts::{comma_list, render, system_prompt, with_schema};
use crate::llm_client::LanguageModel;
use crate::models::{CvRecord, Education, JobRecord, Skill, SkillMatch, WorkExperience};
use crate::workflow::{CandidateView, Stage};

/// Most recent roles shown to the model.
const MAX_ROLES: usize = 5;
/// Responsibilities shown per role.
const MAX_RESPONSIBILITIES: usize = 3;

pub struct SkillsMatcher {
    llm: Arc<dyn LanguageModel>,
}

impl SkillsMatcher {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Stage for SkillsMatcher {
    type Input = CandidateView;
    type Output = SkillMatch;

    async fn execute(
        &self,
        view: CandidateView,
        cancel: &CancellationToken,
    ) -> Result<SkillMatch, StageError> {
        let prompt = build_prompt(&view.cv, &view.job);
        debug!(prompt = %prompt, "Skills match prompt");

        let result: SkillMatch =
            ask(&*self.llm, &system_prompt(SKILLS_MATCHER_ROLE), &prompt, cancel).await?;
        info!(
            matched = result.matched_skills.len(),
            missing = result.missing_skills.len(),
            "Skill match score: {:.2}",
            result.match_score
        );
        Ok(result)
    }
}

pub(crate) fn build_prompt(cv: &CvRecord, job: &JobRecord) -> String {
    let education = format_education(&cv.education);
    let skills = format_skills(&cv.skills);
    let experience = format_experience(&cv.work_experience);
    let requirements = format_requirements(job);

    let prompt = render(
        SKILLS_MATCH_PROMPT_TEMPLATE,
        &[
            ("education", education.as_str()),
            ("skills", skills.as_str()),
            ("experience", experience.as_str()),
            ("requirements", requirements.as_str()),
        ],
    );
    with_schema(&prompt, SKILL_MATCH_SCHEMA)
}

// ────────────────────────────────────────────────────────────────────────────
// Formatting
// ────────────────────────────────────────────────────────────────────────────

fn format_education(education: &[Education]) -> String {
    if education.is_empty() {
        return "None listed".to_string();
    }
    education
        .iter()
        .map(|edu| format!("- {}", edu.describe()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_skills(skills: &[Skill]) -> String {
    let described: Vec<String> = skills.iter().map(Skill::describe).collect();
    comma_list(&described, "None listed")
}

fn format_duration(exp: &WorkExperience) -> String {
    match exp.duration_months {
        Some(months) if months >= 12 => format!("{:.1} years", f64::from(months) / 12.0),
        Some(months) => format!("{months} months"),
        None => format!(
            "{} - {}",
            exp.start_date.as_deref().unwrap_or("?"),
            exp.end_date.as_deref().unwrap_or("Present")
        ),
    }
}

fn format_experience(experience: &[WorkExperience]) -> String {
    if experience.is_empty() {
        return "None listed".to_string();
    }
    experience
        .iter()
        .take(MAX_ROLES)
        .map(|exp| {
            let mut entry = format!(
                "- {} at {} ({})",
                exp.position,
                exp.company,
                format_duration(exp)
            );
            for resp in exp.responsibilities.iter().take(MAX_RESPONSIBILITIES) {
                entry.push_str(&format!("\n    • {resp}"));
            }
            entry
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn requirement_line(skill: &Skill) -> String {
    let mut line = format!("  - {}", skill.name);
    if let Some(years) = skill.years_experience.filter(|y| *y > 0.0) {
        line.push_str(&format!(" ({years}+ years)"));
    }
    if let Some(level) = &skill.skill_level {
        line.push_str(&format!(" [{level}]"));
    }
    line
}

fn format_requirements(job: &JobRecord) -> String {
    let mut sections = Vec::new();

    if !job.necessary_skills.is_empty() {
        let lines: Vec<String> = job.necessary_skills.iter().map(requirement_line).collect();
        sections.push(format!("REQUIRED SKILLS:\n{}", lines.join("\n")));
    }
    if !job.nice_to_have_skills.is_empty() {
        let lines: Vec<String> = job.nice_to_have_skills.iter().map(requirement_line).collect();
        sections.push(format!("PREFERRED SKILLS:\n{}", lines.join("\n")));
    }
    if !job.education.is_empty() {
        let lines: Vec<String> = job.education.iter().map(|e| format!("  - {e}")).collect();
        sections.push(format!("EDUCATION:\n{}", lines.join("\n")));
    }

    if sections.is_empty() {
        "No specific requirements listed".to_string()
    } else {
        sections.join("\n\n")
    }
}
