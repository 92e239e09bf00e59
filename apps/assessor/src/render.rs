//! Terminal rendering and persistence of a finished assessment.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};

use crate::config::ScoringWeights;
use crate::models::{AssessmentReport, Recommendation};

/// Items shown per list before collapsing into "... and N more".
const MAX_SHOWN: usize = 10;

fn rule(out: &mut String, title: &str) {
    let bar = "=".repeat(80);
    let _ = write!(out, "\n{bar}\n{title}\n{bar}\n");
}

fn percent(score: f64) -> String {
    format!("{:.2}%", score * 100.0)
}

fn marked_list(out: &mut String, heading: &str, marker: &str, items: &[String]) {
    let _ = writeln!(out, "\n{heading} ({}):", items.len());
    for item in items.iter().take(MAX_SHOWN) {
        let _ = writeln!(out, "  {marker} {item}");
    }
    if items.len() > MAX_SHOWN {
        let _ = writeln!(out, "  ... and {} more", items.len() - MAX_SHOWN);
    }
}

fn plain_list(out: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n{heading}:");
    for item in items {
        let _ = writeln!(out, "  - {item}");
    }
}

fn numbered(out: &mut String, heading: &str, items: &[String]) {
    let _ = writeln!(out, "\n--- {heading} ---");
    for (i, item) in items.iter().enumerate() {
        let _ = writeln!(out, "{}. {item}", i + 1);
    }
}

/// Human-readable breakdown of a report: the three evaluations, the final
/// recommendation, the recommendation scale and the weighted score breakdown.
pub fn format_report(report: &AssessmentReport, weights: &ScoringWeights) -> String {
    let mut out = String::new();

    rule(&mut out, "DETAILED AGENT ANALYSIS");

    let skills = &report.skill_match;
    let _ = writeln!(out, "\n--- 1. SKILLS MATCH ANALYSIS ---");
    let _ = writeln!(out, "Score: {}", percent(skills.match_score));
    marked_list(&mut out, "Matched Skills", "✓", &skills.matched_skills);
    marked_list(&mut out, "Missing Skills", "✗", &skills.missing_skills);
    if !skills.partial_matches.is_empty() {
        marked_list(&mut out, "Partial Matches", "~", &skills.partial_matches);
    }
    let _ = writeln!(out, "\nSkill Gap Analysis:\n{}", skills.skill_gap_analysis);

    let exp = &report.experience;
    let _ = writeln!(out, "\n--- 2. EXPERIENCE EVALUATION ANALYSIS ---");
    let _ = writeln!(out, "Score: {}", percent(exp.experience_score));
    let _ = writeln!(out, "Experience Level: {}", exp.experience_level);
    let _ = writeln!(out, "Total Years: {}", exp.total_years_experience);
    let _ = writeln!(out, "Relevant Years: {}", exp.relevant_years_experience);
    plain_list(&mut out, "Relevant Roles", &exp.relevant_roles);
    plain_list(&mut out, "Key Achievements", &exp.key_achievements);
    let _ = writeln!(out, "\nExperience Analysis:\n{}", exp.analysis);

    let fit = &report.culture_fit;
    let _ = writeln!(out, "\n--- 3. CULTURE FIT ANALYSIS ---");
    let _ = writeln!(out, "Score: {}", percent(fit.culture_fit_score));
    plain_list(&mut out, "Soft Skills Identified", &fit.soft_skills_identified);
    plain_list(&mut out, "Leadership Indicators", &fit.leadership_indicators);
    let _ = writeln!(out, "\nCulture Fit Notes:\n{}", fit.notes);

    rule(&mut out, "FINAL RECOMMENDATION");
    numbered(&mut out, "Strengths", &report.strengths);
    numbered(&mut out, "Concerns", &report.concerns);
    let _ = writeln!(out, "\n--- Executive Summary ---\n{}", report.summary);

    rule(&mut out, "ASSESSMENT COMPLETE");
    let _ = writeln!(out, "\nCandidate: {}", report.cv.display_name());
    let _ = writeln!(out, "Position: {}", report.job.job_title);
    let _ = writeln!(out, "Overall Score: {}", percent(report.overall_score));
    let _ = writeln!(out, "Recommendation: {}", report.recommendation);

    let _ = writeln!(out, "\n--- Recommendation Scale ---");
    for band in Recommendation::SCALE {
        let label = format!("{band}");
        let range = format!("({}):", band.score_range());
        let _ = writeln!(out, "  {label:<13} {range:<10} {}", band.guidance());
    }

    rule(&mut out, "SCORE BREAKDOWN");
    let weight = |w: f64| format!("{:.0}%", w * 100.0);
    let _ = writeln!(
        out,
        "Skills Match: {} (Weight: {})",
        percent(skills.match_score),
        weight(weights.skills)
    );
    let _ = writeln!(
        out,
        "Experience: {} (Weight: {})",
        percent(exp.experience_score),
        weight(weights.experience)
    );
    let _ = writeln!(
        out,
        "Culture Fit: {} (Weight: {})",
        percent(fit.culture_fit_score),
        weight(weights.culture)
    );

    out
}

/// Writes the report as pretty-printed JSON, creating parent directories.
pub fn persist_report(path: &Path, report: &AssessmentReport) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(report).context("failed to serialize report")?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
