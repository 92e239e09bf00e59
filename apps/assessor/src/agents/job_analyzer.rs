//! `analyze_job`: free job posting text to a [`JobRecord`].

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::agents::ask;
use crate::agents::prompts::{JOB_ANALYZER_ROLE, JOB_ANALYZE_PROMPT_TEMPLATE, JOB_RECORD_SCHEMA};
use crate::errors::StageError;
use crate::llm_client::prompts::{render, system_prompt, with_schema};
use crate::llm_client::LanguageModel;
use crate::models::JobRecord;
use crate::workflow::{JobTextView, Stage};

pub struct JobAnalyzer {
    llm: Arc<dyn LanguageModel>,
}

impl JobAnalyzer {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }
}

pub(crate) fn build_prompt(job_text: &str) -> String {
    with_schema(
        &render(JOB_ANALYZE_PROMPT_TEMPLATE, &[("job_text", job_text)]),
        JOB_RECORD_SCHEMA,
    )
}

#[async_trait]
impl Stage for JobAnalyzer {
    type Input = JobTextView;
    type Output = JobRecord;

    async fn execute(
        &self,
        view: JobTextView,
        cancel: &CancellationToken,
    ) -> Result<JobRecord, StageError> {
        let prompt = build_prompt(&view.job_text);
        debug!(prompt = %prompt, "Job analysis prompt");

        let job: JobRecord =
            ask(&*self.llm, &system_prompt(JOB_ANALYZER_ROLE), &prompt, cancel).await?;
        info!(
            required_skills = job.necessary_skills.len(),
            preferred_skills = job.nice_to_have_skills.len(),
            "Analyzed job: {}",
            job.job_title
        );
        Ok(job)
    }
}
