use serde::{Deserialize, Serialize};

use crate::models::{check_non_empty, check_unit_score, Validate};

/// Output of the `match_skills` stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillMatch {
    #[serde(default)]
    pub matched_skills: Vec<String>,
    #[serde(default)]
    pub missing_skills: Vec<String>,
    #[serde(default)]
    pub partial_matches: Vec<String>,
    pub skill_gap_analysis: String,
    pub match_score: f64,
}

impl Validate for SkillMatch {
    fn validate(&self) -> Result<(), String> {
        check_unit_score("match_score", self.match_score)
    }
}

/// Output of the `evaluate_experience` stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEvaluation {
    pub total_years_experience: f64,
    pub relevant_years_experience: f64,
    #[serde(default)]
    pub relevant_roles: Vec<String>,
    /// "junior" | "mid" | "senior" | "lead"
    pub experience_level: String,
    #[serde(default)]
    pub key_achievements: Vec<String>,
    pub experience_score: f64,
    pub analysis: String,
}

impl Validate for ExperienceEvaluation {
    fn validate(&self) -> Result<(), String> {
        check_unit_score("experience_score", self.experience_score)?;
        for (field, years) in [
            ("total_years_experience", self.total_years_experience),
            ("relevant_years_experience", self.relevant_years_experience),
        ] {
            if !years.is_finite() || years < 0.0 {
                return Err(format!("{field} must be non-negative (got {years})"));
            }
        }
        check_non_empty("experience_level", &self.experience_level)
    }
}

/// Output of the `assess_culture_fit` stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CultureFit {
    #[serde(default)]
    pub soft_skills_identified: Vec<String>,
    #[serde(default)]
    pub leadership_indicators: Vec<String>,
    pub culture_fit_score: f64,
    pub notes: String,
}

impl Validate for CultureFit {
    fn validate(&self) -> Result<(), String> {
        check_unit_score("culture_fit_score", self.culture_fit_score)
    }
}
