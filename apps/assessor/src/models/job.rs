use serde::{Deserialize, Serialize};

use crate::models::{check_non_empty, Skill, Validate};

/// Structured job posting extracted by the `analyze_job` stage.
///
/// "Necessary" lists are hard requirements; "nice to have" lists are bonus
/// signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_title: String,
    pub company: Option<String>,
    pub department: Option<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub necessary_experience: Vec<String>,
    #[serde(default)]
    pub necessary_skills: Vec<Skill>,
    #[serde(default)]
    pub nice_to_have_experience: Vec<String>,
    #[serde(default)]
    pub nice_to_have_skills: Vec<Skill>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(default)]
    pub education: Vec<String>,
    #[serde(default)]
    pub leadership: Vec<String>,
    #[serde(default)]
    pub soft_skills_requirement: Vec<String>,
    pub salary_range: Option<String>,
}

impl JobRecord {
    pub fn new(job_title: impl Into<String>) -> Self {
        Self {
            job_title: job_title.into(),
            company: None,
            department: None,
            location: None,
            necessary_experience: vec![],
            necessary_skills: vec![],
            nice_to_have_experience: vec![],
            nice_to_have_skills: vec![],
            responsibilities: vec![],
            education: vec![],
            leadership: vec![],
            soft_skills_requirement: vec![],
            salary_range: None,
        }
    }

    pub fn requires_leadership(&self) -> bool {
        !self.leadership.is_empty()
    }
}

impl Validate for JobRecord {
    fn validate(&self) -> Result<(), String> {
        check_non_empty("job_title", &self.job_title)?;
        self.necessary_skills
            .iter()
            .chain(&self.nice_to_have_skills)
            .try_for_each(|skill| skill.validate())
    }
}
