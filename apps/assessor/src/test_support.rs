//! Shared fixtures for unit tests: the Jane Doe / Data Scientist scenario,
//! scripted stages that log when they run, and a scripted language model.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rand::Rng;
use tokio::sync::Barrier;
use tokio_util::sync::CancellationToken;

use crate::errors::StageError;
use crate::llm_client::{LanguageModel, LlmError};
use crate::models::{
    AssessmentDetails, AssessmentReport, CultureFit, CvRecord, Education, ExperienceEvaluation,
    JobRecord, Recommendation, ReportSources, Skill, SkillMatch, WorkExperience,
};
use crate::workflow::stage::SharedStage;
use crate::workflow::{AggregateView, LoadedDocuments, Stage, StageId, StageSet};

// ────────────────────────────────────────────────────────────────────────────
// Scenario records
// ────────────────────────────────────────────────────────────────────────────

pub fn skill(name: &str, years: Option<f64>, level: Option<&str>) -> Skill {
    Skill {
        name: name.to_string(),
        skill_level: level.map(str::to_string),
        years_experience: years,
        category: None,
    }
}

pub fn jane_doe_cv() -> CvRecord {
    CvRecord {
        candidate_name: Some("Jane Doe".to_string()),
        email: Some("jane.doe@example.com".to_string()),
        location: Some("Zurich".to_string()),
        summary: Some("Data scientist focused on applied ML.".to_string()),
        skills: vec![
            skill("Python", Some(5.0), Some("expert")),
            skill("SQL", Some(4.0), Some("advanced")),
        ],
        work_experience: vec![
            WorkExperience {
                company: "Acme Analytics".to_string(),
                position: "Senior Data Scientist".to_string(),
                start_date: Some("2021-01".to_string()),
                end_date: None,
                duration_months: Some(36),
                responsibilities: vec![
                    "Built churn models".to_string(),
                    "Mentored two analysts".to_string(),
                ],
            },
            WorkExperience {
                company: "Globex".to_string(),
                position: "Data Analyst".to_string(),
                start_date: Some("2018-06".to_string()),
                end_date: Some("2020-12".to_string()),
                duration_months: Some(30),
                responsibilities: vec!["Owned weekly KPI reporting".to_string()],
            },
        ],
        education: vec![Education {
            institution: "ETH Zurich".to_string(),
            degree: "MSc".to_string(),
            field_of_study: Some("Statistics".to_string()),
            graduation_year: Some(2018),
            gpa: None,
        }],
        ..CvRecord::default()
    }
}

pub fn data_scientist_job() -> JobRecord {
    JobRecord {
        company: Some("Initech".to_string()),
        necessary_skills: vec![
            skill("Python", Some(3.0), None),
            skill("Machine Learning", None, None),
        ],
        necessary_experience: vec!["3+ years in data science".to_string()],
        responsibilities: vec!["Build predictive models".to_string()],
        soft_skills_requirement: vec!["Communication".to_string()],
        ..JobRecord::new("Data Scientist")
    }
}

pub fn skill_match(score: f64) -> SkillMatch {
    SkillMatch {
        matched_skills: vec!["Python".to_string()],
        missing_skills: vec!["Machine Learning".to_string()],
        partial_matches: vec![],
        skill_gap_analysis: "No production machine learning listed.".to_string(),
        match_score: score,
    }
}

pub fn experience(score: f64) -> ExperienceEvaluation {
    ExperienceEvaluation {
        total_years_experience: 5.5,
        relevant_years_experience: 5.5,
        relevant_roles: vec!["Senior Data Scientist".to_string()],
        experience_level: "senior".to_string(),
        key_achievements: vec!["Built churn models".to_string()],
        experience_score: score,
        analysis: "Directly relevant experience.".to_string(),
    }
}

pub fn culture_fit(score: f64) -> CultureFit {
    CultureFit {
        soft_skills_identified: vec!["Communication".to_string()],
        leadership_indicators: vec!["Mentored two analysts".to_string()],
        culture_fit_score: score,
        notes: "Collaborative profile.".to_string(),
    }
}

pub fn details(recommendation: Recommendation) -> AssessmentDetails {
    AssessmentDetails {
        recommendation,
        strengths: vec!["Strong Python".to_string()],
        concerns: vec!["No cloud experience listed".to_string()],
        summary: "Solid candidate for the role.".to_string(),
    }
}

pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

// ────────────────────────────────────────────────────────────────────────────
// Event log
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Started(StageId),
    Finished(StageId),
}

/// Ordered record of stage start/finish events, shared across tasks.
#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<Event>>>);

impl EventLog {
    pub fn push(&self, event: Event) {
        self.0.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }

    pub fn position(&self, event: Event) -> Option<usize> {
        self.events().iter().position(|e| *e == event)
    }

    pub fn started(&self, id: StageId) -> bool {
        self.position(Event::Started(id)).is_some()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Scripted stages
// ────────────────────────────────────────────────────────────────────────────

/// A stage that ignores its input and returns a fixed result after an
/// optional delay.
pub struct Scripted<I, O> {
    id: StageId,
    result: Result<O, String>,
    delay: Duration,
    jitter_ms: u64,
    barrier: Option<Arc<Barrier>>,
    log: EventLog,
    _input: PhantomData<fn(I)>,
}

impl<I, O> Scripted<I, O> {
    pub fn ok(id: StageId, value: O, log: &EventLog) -> Self {
        Self::with_result(id, Ok(value), log)
    }

    pub fn failing(id: StageId, message: &str, log: &EventLog) -> Self {
        Self::with_result(id, Err(message.to_string()), log)
    }

    fn with_result(id: StageId, result: Result<O, String>, log: &EventLog) -> Self {
        Self {
            id,
            result,
            delay: Duration::ZERO,
            jitter_ms: 0,
            barrier: None,
            log: log.clone(),
            _input: PhantomData,
        }
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Adds a random extra delay of up to `max_ms` per execution.
    pub fn jitter(mut self, max_ms: u64) -> Self {
        self.jitter_ms = max_ms;
        self
    }

    pub fn barrier(mut self, barrier: Arc<Barrier>) -> Self {
        self.barrier = Some(barrier);
        self
    }

    pub fn shared(self) -> SharedStage<I, O>
    where
        I: Send + 'static,
        O: Clone + Send + Sync + 'static,
    {
        Arc::new(self)
    }
}

#[async_trait]
impl<I, O> Stage for Scripted<I, O>
where
    I: Send + 'static,
    O: Clone + Send + Sync + 'static,
{
    type Input = I;
    type Output = O;

    async fn execute(&self, _input: I, cancel: &CancellationToken) -> Result<O, StageError> {
        self.log.push(Event::Started(self.id));

        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }

        let jitter = if self.jitter_ms > 0 {
            rand::thread_rng().gen_range(0..=self.jitter_ms)
        } else {
            0
        };
        let delay = self.delay + Duration::from_millis(jitter);
        if !delay.is_zero() {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancel.cancelled() => return Err(StageError::Cancelled),
            }
        }

        self.log.push(Event::Finished(self.id));
        self.result.clone().map_err(StageError::Invalid)
    }
}

/// Aggregate stage that weighs the evaluator scores 0.4 / 0.4 / 0.2 and
/// stamps a fixed time, so its report depends only on its inputs.
pub struct WeightedAggregate {
    pub log: EventLog,
}

#[async_trait]
impl Stage for WeightedAggregate {
    type Input = AggregateView;
    type Output = AssessmentReport;

    async fn execute(
        &self,
        view: AggregateView,
        _cancel: &CancellationToken,
    ) -> Result<AssessmentReport, StageError> {
        self.log.push(Event::Started(StageId::Aggregate));
        let overall = 0.4 * view.skill_match.match_score
            + 0.4 * view.experience.experience_score
            + 0.2 * view.culture_fit.culture_fit_score;
        let sources = ReportSources {
            cv: (*view.cv).clone(),
            job: (*view.job).clone(),
            skill_match: (*view.skill_match).clone(),
            experience: (*view.experience).clone(),
            culture_fit: (*view.culture_fit).clone(),
        };
        let report = AssessmentReport::assemble(
            sources,
            overall,
            details(Recommendation::from_score(overall)),
            fixed_time(),
        )
        .map_err(StageError::Invalid)?;
        self.log.push(Event::Finished(StageId::Aggregate));
        Ok(report)
    }
}

/// Every stage succeeds immediately with the scenario records
/// (skills 0.9, experience 0.8, culture 0.7).
pub fn scripted_stages(log: &EventLog) -> StageSet {
    StageSet {
        load_documents: Scripted::ok(
            StageId::LoadDocuments,
            LoadedDocuments {
                cv_text: "Jane Doe\nSenior Data Scientist".to_string(),
                job_text: "Data Scientist at Initech".to_string(),
            },
            log,
        )
        .shared(),
        parse_cv: Scripted::ok(StageId::ParseCv, jane_doe_cv(), log).shared(),
        analyze_job: Scripted::ok(StageId::AnalyzeJob, data_scientist_job(), log).shared(),
        match_skills: Scripted::ok(StageId::MatchSkills, skill_match(0.9), log).shared(),
        evaluate_experience: Scripted::ok(StageId::EvaluateExperience, experience(0.8), log)
            .shared(),
        assess_culture_fit: Scripted::ok(StageId::AssessCultureFit, culture_fit(0.7), log)
            .shared(),
        aggregate: Arc::new(WeightedAggregate { log: log.clone() }),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Scripted language model
// ────────────────────────────────────────────────────────────────────────────

/// Answers each prompt with the first canned response whose key appears in
/// the system prompt. Records every call.
#[derive(Default)]
pub struct ScriptedModel {
    responses: Vec<(String, Result<String, String>)>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedModel {
    pub fn respond(mut self, key: &str, json: &str) -> Self {
        self.responses.push((key.to_string(), Ok(json.to_string())));
        self
    }

    pub fn fail(mut self, key: &str, message: &str) -> Self {
        self.responses.push((key.to_string(), Err(message.to_string())));
        self
    }

    pub fn delay(mut self, key: &str, delay: Duration) -> Self {
        self.delays.insert(key.to_string(), delay);
        self
    }

    /// `(system, prompt)` pairs in call order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn prompt_for(&self, key: &str) -> Option<String> {
        self.calls()
            .into_iter()
            .find(|(system, _)| system.contains(key))
            .map(|(_, prompt)| prompt)
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        self.calls
            .lock()
            .unwrap()
            .push((system.to_string(), prompt.to_string()));

        let delay = self
            .delays
            .iter()
            .find(|(key, _)| system.contains(key.as_str()))
            .map(|(_, d)| *d);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match self.responses.iter().find(|(key, _)| system.contains(key.as_str())) {
            Some((_, Ok(json))) => Ok(json.clone()),
            Some((_, Err(message))) => Err(LlmError::Api {
                status: 500,
                message: message.clone(),
            }),
            None => Err(LlmError::EmptyContent),
        }
    }
}
