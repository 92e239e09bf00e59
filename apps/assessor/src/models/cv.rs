use serde::{Deserialize, Serialize};

use crate::models::{check_non_empty, Validate};

/// A skill, either held by a candidate or asked for by a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    /// "beginner" | "intermediate" | "advanced" | "expert"
    pub skill_level: Option<String>,
    pub years_experience: Option<f64>,
    pub category: Option<String>,
}

impl Skill {
    /// `Python (5 years) [expert]`, omitting the parts the model left empty.
    pub fn describe(&self) -> String {
        let mut out = self.name.clone();
        if let Some(years) = self.years_experience.filter(|y| *y > 0.0) {
            out.push_str(&format!(" ({years} years)"));
        }
        if let Some(level) = &self.skill_level {
            out.push_str(&format!(" [{level}]"));
        }
        out
    }
}

impl Validate for Skill {
    fn validate(&self) -> Result<(), String> {
        check_non_empty("skill name", &self.name)?;
        if let Some(years) = self.years_experience {
            if !years.is_finite() || years < 0.0 {
                return Err(format!("years_experience for '{}' is negative", self.name));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkExperience {
    pub company: String,
    pub position: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub duration_months: Option<u32>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Education {
    pub institution: String,
    pub degree: String,
    pub field_of_study: Option<String>,
    pub graduation_year: Option<i32>,
    pub gpa: Option<f64>,
}

impl Education {
    /// `MSc in Statistics from ETH Zurich (2016)`
    pub fn describe(&self) -> String {
        let mut out = self.degree.clone();
        if let Some(field) = &self.field_of_study {
            out.push_str(&format!(" in {field}"));
        }
        if !self.institution.is_empty() {
            out.push_str(&format!(" from {}", self.institution));
        }
        if let Some(year) = self.graduation_year {
            out.push_str(&format!(" ({year})"));
        }
        out
    }
}

/// Structured CV extracted from free text by the `parse_cv` stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CvRecord {
    pub candidate_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub summary: Option<String>,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub work_experience: Vec<WorkExperience>,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
}

impl CvRecord {
    pub fn display_name(&self) -> &str {
        self.candidate_name.as_deref().unwrap_or("Unknown")
    }
}

impl Validate for CvRecord {
    fn validate(&self) -> Result<(), String> {
        for skill in &self.skills {
            skill.validate()?;
        }
        for exp in &self.work_experience {
            check_non_empty("work_experience.company", &exp.company)?;
            check_non_empty("work_experience.position", &exp.position)?;
        }
        for edu in &self.education {
            check_non_empty("education.degree", &edu.degree)?;
        }
        Ok(())
    }
}
