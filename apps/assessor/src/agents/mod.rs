//! Concrete assessment stages.
//!
//! Each stage owns its prompt and its formatting of the records it reads. All
//! model calls go through [`ask`], which races the call against the run's
//! cancellation token.

mod culture_fit;
mod cv_parser;
mod document_stage;
mod experience_evaluator;
mod final_scorer;
mod job_analyzer;
pub mod prompts;
mod skills_matcher;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::documents::DocumentLoader;
use crate::errors::StageError;
use crate::llm_client::{call_json, LanguageModel};
use crate::models::Validate;
use crate::workflow::StageSet;

pub use culture_fit::CultureFitAssessor;
pub use cv_parser::CvParser;
pub use document_stage::DocumentStage;
pub use experience_evaluator::ExperienceEvaluator;
pub use final_scorer::FinalScorer;
pub use job_analyzer::JobAnalyzer;
pub use skills_matcher::SkillsMatcher;

/// Wires one instance of every stage to the shared model and loader.
pub fn build_stages(
    config: &Config,
    llm: Arc<dyn LanguageModel>,
    loader: Arc<dyn DocumentLoader>,
) -> StageSet {
    StageSet {
        load_documents: Arc::new(DocumentStage::new(loader)),
        parse_cv: Arc::new(CvParser::new(llm.clone())),
        analyze_job: Arc::new(JobAnalyzer::new(llm.clone())),
        match_skills: Arc::new(SkillsMatcher::new(llm.clone())),
        evaluate_experience: Arc::new(ExperienceEvaluator::new(llm.clone())),
        assess_culture_fit: Arc::new(CultureFitAssessor::new(llm.clone())),
        aggregate: Arc::new(FinalScorer::new(llm, config.weights)),
    }
}

/// One structured model call, abandoned if the run is cancelled first.
pub(crate) async fn ask<T>(
    llm: &dyn LanguageModel,
    system: &str,
    prompt: &str,
    cancel: &CancellationToken,
) -> Result<T, StageError>
where
    T: DeserializeOwned + Validate,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(StageError::Cancelled),
        result = call_json::<T>(llm, prompt, system) => Ok(result?),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use super::*;
    use crate::config::ScoringWeights;
    use crate::documents::FsDocumentLoader;
    use crate::errors::{FailureKind, WorkflowError};
    use crate::llm_client::LlmError;
    use crate::models::{Recommendation, SkillMatch};
    use crate::test_support::{
        culture_fit, data_scientist_job, details, experience, jane_doe_cv, skill_match,
        ScriptedModel,
    };
    use crate::workflow::state::Slot;
    use crate::workflow::{AssessmentWorkflow, StageId};

    fn make_config() -> Config {
        Config {
            provider: crate::config::LlmProvider::Anthropic,
            model: "test-model".to_string(),
            api_key: "sk-test".to_string(),
            temperature: 0.4,
            timeout_seconds: 5,
            max_retries: 1,
            max_tokens: 1024,
            weights: ScoringWeights::default(),
            rust_log: "info".to_string(),
        }
    }

    fn json<T: serde::Serialize>(value: &T) -> String {
        serde_json::to_string(value).unwrap()
    }

    fn jane_doe_model() -> ScriptedModel {
        ScriptedModel::default()
            .respond("CV/Resume parser", &json(&jane_doe_cv()))
            .respond("job description analyst", &json(&data_scientist_job()))
            .respond("matching candidate skills", &json(&skill_match(0.9)))
            .respond("evaluating work experience", &json(&experience(0.8)))
            .respond("cultural fit", &json(&culture_fit(0.7)))
            .respond("hiring manager", &json(&details(Recommendation::StrongMatch)))
    }

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn make_workflow(model: ScriptedModel) -> (AssessmentWorkflow, Arc<ScriptedModel>) {
        let model = Arc::new(model);
        let stages = build_stages(&make_config(), model.clone(), Arc::new(FsDocumentLoader));
        (AssessmentWorkflow::new(stages).unwrap(), model)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_jane_doe_end_to_end() {
        let cv = write_temp(".txt", "Jane Doe\nSenior Data Scientist at Acme Analytics");
        let job = write_temp(".md", "# Data Scientist\nRequired: Python, Machine Learning");
        let (workflow, model) = make_workflow(jane_doe_model());

        let report = workflow.run(cv.path(), job.path()).await.unwrap();

        assert!((report.overall_score - 0.82).abs() < 1e-9);
        assert_eq!(report.recommendation, Recommendation::StrongMatch);
        assert_eq!(report.cv, jane_doe_cv());
        assert_eq!(report.job, data_scientist_job());
        assert_eq!(report.cv.skills.len(), 2);
        assert_eq!(report.job.necessary_skills.len(), 2);
        let shared: Vec<&str> = report
            .job
            .necessary_skills
            .iter()
            .filter(|req| report.cv.skills.iter().any(|s| s.name == req.name))
            .map(|req| req.name.as_str())
            .collect();
        assert_eq!(shared, ["Python"]);
        assert_eq!(report.skill_match, skill_match(0.9));
        assert_eq!(report.experience, experience(0.8));
        assert_eq!(report.culture_fit, culture_fit(0.7));
        assert_eq!(report.strengths, details(Recommendation::StrongMatch).strengths);

        // Loaded text reaches the parser prompts
        let cv_prompt = model.prompt_for("CV/Resume parser").unwrap();
        assert!(cv_prompt.contains("Senior Data Scientist at Acme Analytics"));
        let job_prompt = model.prompt_for("job description analyst").unwrap();
        assert!(job_prompt.contains("Required: Python, Machine Learning"));
        assert_eq!(model.calls().len(), 6);
    }

    #[tokio::test]
    async fn test_analyze_job_failure_is_extraction_failure() {
        let cv = write_temp(".txt", "Jane Doe");
        let job = write_temp(".txt", "A job");
        // No job_title in the payload
        let model = ScriptedModel::default()
            .respond("job description analyst", r#"{"company": "Initech"}"#)
            .respond("CV/Resume parser", &json(&jane_doe_cv()));
        let (workflow, _) = make_workflow(model);

        let record = workflow
            .execute(cv.path(), job.path(), CancellationToken::new())
            .await;
        let err = record.outcome.unwrap_err();

        assert_eq!(err.stage(), Some(StageId::AnalyzeJob));
        assert_eq!(err.kind(), Some(FailureKind::Extraction));
        assert!(matches!(
            err.cause(),
            Some(StageError::Llm(e)) if e.is_validation()
        ));
        for slot in [
            Slot::SkillResult,
            Slot::ExperienceResult,
            Slot::CultureResult,
            Slot::FinalReport,
        ] {
            assert!(!record.state.is_populated(slot));
        }
    }

    #[tokio::test]
    async fn test_missing_document_is_document_load_failure() {
        let job = write_temp(".txt", "A job");
        let (workflow, model) = make_workflow(jane_doe_model());

        let err = workflow
            .run("/no/such/dir/jane_doe.pdf", job.path())
            .await
            .unwrap_err();

        assert_eq!(err.stage(), Some(StageId::LoadDocuments));
        assert_eq!(err.kind(), Some(FailureKind::DocumentLoad));
        assert!(model.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_format_is_document_load_failure() {
        let cv = write_temp(".rtf", "Jane Doe");
        let job = write_temp(".txt", "A job");
        let (workflow, _) = make_workflow(jane_doe_model());

        let err = workflow.run(cv.path(), job.path()).await.unwrap_err();
        assert!(matches!(err, WorkflowError::DocumentLoad { .. }));
        assert!(err.to_string().contains("Unsupported file format"));
    }

    #[tokio::test]
    async fn test_provider_error_in_evaluator() {
        let cv = write_temp(".txt", "Jane Doe");
        let job = write_temp(".txt", "A job");
        let model = ScriptedModel::default()
            .fail("evaluating work experience", "overloaded")
            .respond("CV/Resume parser", &json(&jane_doe_cv()))
            .respond("job description analyst", &json(&data_scientist_job()))
            .respond("matching candidate skills", &json(&skill_match(0.9)))
            .respond("cultural fit", &json(&culture_fit(0.7)))
            .respond("hiring manager", &json(&details(Recommendation::StrongMatch)));
        let (workflow, model) = make_workflow(model);

        let err = workflow.run(cv.path(), job.path()).await.unwrap_err();
        assert_eq!(err.stage(), Some(StageId::EvaluateExperience));
        assert!(matches!(
            err.cause(),
            Some(StageError::Llm(LlmError::Api { status: 500, .. }))
        ));
        assert!(model.prompt_for("hiring manager").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_model_call() {
        let cv = write_temp(".txt", "Jane Doe");
        let job = write_temp(".txt", "A job");
        let model = jane_doe_model().delay("CV/Resume parser", Duration::from_secs(600));
        let (workflow, _) = make_workflow(model);
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let record = workflow.execute(cv.path(), job.path(), cancel).await;
        assert!(matches!(record.outcome, Err(WorkflowError::Cancelled)));
        assert!(!record.state.is_populated(Slot::CvRecord));
    }

    #[tokio::test]
    async fn test_ask_returns_cancelled_when_token_already_fired() {
        let model = jane_doe_model();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result: Result<SkillMatch, _> =
            ask(&model, "matching candidate skills", "prompt", &cancel).await;
        assert!(matches!(result, Err(StageError::Cancelled)));
    }
}
