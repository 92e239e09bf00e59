//! `parse_cv`: free CV text to a [`CvRecord`].

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::agents::ask;
use crate::agents::prompts::{CV_PARSER_ROLE, CV_PARSE_PROMPT_TEMPLATE, CV_RECORD_SCHEMA};
use crate::errors::StageError;
use crate::llm_client::prompts::{render, system_prompt, with_schema};
use crate::llm_client::LanguageModel;
use crate::models::CvRecord;
use crate::workflow::{CvTextView, Stage};

pub struct CvParser {
    llm: Arc<dyn LanguageModel>,
}

impl CvParser {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }
}

pub(crate) fn build_prompt(cv_text: &str) -> String {
    with_schema(
        &render(CV_PARSE_PROMPT_TEMPLATE, &[("cv_text", cv_text)]),
        CV_RECORD_SCHEMA,
    )
}

#[async_trait]
impl Stage for CvParser {
    type Input = CvTextView;
    type Output = CvRecord;

    async fn execute(
        &self,
        view: CvTextView,
        cancel: &CancellationToken,
    ) -> Result<CvRecord, StageError> {
        let prompt = build_prompt(&view.cv_text);
        debug!(prompt = %prompt, "CV parse prompt");

        let cv: CvRecord = ask(&*self.llm, &system_prompt(CV_PARSER_ROLE), &prompt, cancel).await?;
        info!("Parsed CV for candidate: {}", cv.display_name());
        Ok(cv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::LlmError;
    use crate::test_support::{jane_doe_cv, ScriptedModel};

    fn make_view(text: &str) -> CvTextView {
        CvTextView {
            cv_text: Arc::new(text.to_string()),
        }
    }

    #[test]
    fn test_prompt_embeds_text_and_schema() {
        let prompt = build_prompt("Jane Doe, Senior Data Scientist");
        assert!(prompt.contains("Jane Doe, Senior Data Scientist"));
        assert!(prompt.contains("\"candidate_name\""));
        assert!(!prompt.contains("{cv_text}"));
    }

    #[tokio::test]
    async fn test_parses_model_output() {
        let json = serde_json::to_string(&jane_doe_cv()).unwrap();
        let model = Arc::new(ScriptedModel::default().respond("CV/Resume parser", &json));
        let parser = CvParser::new(model.clone());

        let cv = parser
            .execute(make_view("Jane Doe"), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(cv, jane_doe_cv());

        let (system, _) = &model.calls()[0];
        assert!(system.contains("valid JSON only"));
    }

    #[tokio::test]
    async fn test_invalid_record_is_validation_error() {
        let model = Arc::new(ScriptedModel::default().respond(
            "CV/Resume parser",
            r#"{"candidate_name": "Jane", "skills": [{"name": ""}]}"#,
        ));
        let err = CvParser::new(model)
            .execute(make_view("Jane"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StageError::Llm(ref e) if e.is_validation()));
    }

    #[tokio::test]
    async fn test_empty_model_reply_is_provider_error() {
        let model = Arc::new(ScriptedModel::default());
        let err = CvParser::new(model)
            .execute(make_view("Jane"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StageError::Llm(LlmError::EmptyContent)));
    }
}
