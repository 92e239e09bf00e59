//! Per-run state: one typed, write-once slot per stage output.

use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{AssessmentReport, CultureFit, CvRecord, ExperienceEvaluation, JobRecord, SkillMatch};
use crate::workflow::stage::{
    AggregateView, CandidateView, CvTextView, DocumentRefs, JobTextView, LoadedDocuments,
};

/// Names of the run-state slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    CvText,
    JobText,
    CvRecord,
    JobRecord,
    SkillResult,
    ExperienceResult,
    CultureResult,
    FinalReport,
}

impl Slot {
    pub fn as_str(self) -> &'static str {
        match self {
            Slot::CvText => "cv_text",
            Slot::JobText => "job_text",
            Slot::CvRecord => "cv_record",
            Slot::JobRecord => "job_record",
            Slot::SkillResult => "skill_result",
            Slot::ExperienceResult => "experience_result",
            Slot::CultureResult => "culture_result",
            Slot::FinalReport => "final_report",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("slot '{0}' was already written in this run")]
    AlreadyWritten(Slot),

    #[error("slot '{0}' is not populated")]
    Missing(Slot),
}

/// A write-once cell. Published values are shared read-only via `Arc`.
#[derive(Debug)]
pub struct SlotCell<T> {
    value: Option<Arc<T>>,
}

impl<T> Default for SlotCell<T> {
    fn default() -> Self {
        Self { value: None }
    }
}

impl<T> SlotCell<T> {
    pub fn get(&self) -> Option<&T> {
        self.value.as_deref()
    }

    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    fn shared(&self, slot: Slot) -> Result<Arc<T>, StateError> {
        self.value.clone().ok_or(StateError::Missing(slot))
    }

    fn set(&mut self, slot: Slot, value: T) -> Result<(), StateError> {
        if self.value.is_some() {
            return Err(StateError::AlreadyWritten(slot));
        }
        self.value = Some(Arc::new(value));
        Ok(())
    }
}

impl<T: Serialize> Serialize for SlotCell<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.get().serialize(serializer)
    }
}

/// A stage's result, tagged by the slots it fills.
#[derive(Debug, Clone)]
pub enum StageOutput {
    Documents(LoadedDocuments),
    CvRecord(CvRecord),
    JobRecord(JobRecord),
    SkillMatch(SkillMatch),
    Experience(ExperienceEvaluation),
    CultureFit(CultureFit),
    Report(AssessmentReport),
}

impl StageOutput {
    /// Slots this output writes.
    pub fn slots(&self) -> &'static [Slot] {
        match self {
            StageOutput::Documents(_) => &[Slot::CvText, Slot::JobText],
            StageOutput::CvRecord(_) => &[Slot::CvRecord],
            StageOutput::JobRecord(_) => &[Slot::JobRecord],
            StageOutput::SkillMatch(_) => &[Slot::SkillResult],
            StageOutput::Experience(_) => &[Slot::ExperienceResult],
            StageOutput::CultureFit(_) => &[Slot::CultureResult],
            StageOutput::Report(_) => &[Slot::FinalReport],
        }
    }
}

/// State of one workflow run. Created empty, owned by the engine for the
/// duration of the run, handed back to the caller in the run record.
#[derive(Debug, Serialize)]
pub struct RunState {
    #[serde(skip)]
    run_id: Uuid,
    refs: DocumentRefs,
    cv_text: SlotCell<String>,
    job_text: SlotCell<String>,
    cv_record: SlotCell<CvRecord>,
    job_record: SlotCell<JobRecord>,
    skill_result: SlotCell<SkillMatch>,
    experience_result: SlotCell<ExperienceEvaluation>,
    culture_result: SlotCell<CultureFit>,
    final_report: SlotCell<AssessmentReport>,
}

impl RunState {
    pub fn new(refs: DocumentRefs) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            refs,
            cv_text: SlotCell::default(),
            job_text: SlotCell::default(),
            cv_record: SlotCell::default(),
            job_record: SlotCell::default(),
            skill_result: SlotCell::default(),
            experience_result: SlotCell::default(),
            culture_result: SlotCell::default(),
            final_report: SlotCell::default(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn refs(&self) -> &DocumentRefs {
        &self.refs
    }

    pub fn is_populated(&self, slot: Slot) -> bool {
        match slot {
            Slot::CvText => self.cv_text.is_set(),
            Slot::JobText => self.job_text.is_set(),
            Slot::CvRecord => self.cv_record.is_set(),
            Slot::JobRecord => self.job_record.is_set(),
            Slot::SkillResult => self.skill_result.is_set(),
            Slot::ExperienceResult => self.experience_result.is_set(),
            Slot::CultureResult => self.culture_result.is_set(),
            Slot::FinalReport => self.final_report.is_set(),
        }
    }

    #[cfg(test)]
    pub fn cv_text(&self) -> Option<&str> {
        self.cv_text.get().map(String::as_str)
    }

    #[cfg(test)]
    pub fn job_text(&self) -> Option<&str> {
        self.job_text.get().map(String::as_str)
    }

    #[cfg(test)]
    pub fn job_record(&self) -> Option<&JobRecord> {
        self.job_record.get()
    }

    pub fn final_report(&self) -> Option<&AssessmentReport> {
        self.final_report.get()
    }

    /// Writes a stage output into its slots. Fails if any slot is already set;
    /// in that case nothing is written.
    pub fn publish(&mut self, output: StageOutput) -> Result<(), StateError> {
        if let Some(taken) = output.slots().iter().find(|s| self.is_populated(**s)) {
            return Err(StateError::AlreadyWritten(*taken));
        }

        match output {
            StageOutput::Documents(docs) => {
                self.cv_text.set(Slot::CvText, docs.cv_text)?;
                self.job_text.set(Slot::JobText, docs.job_text)
            }
            StageOutput::CvRecord(cv) => self.cv_record.set(Slot::CvRecord, cv),
            StageOutput::JobRecord(job) => self.job_record.set(Slot::JobRecord, job),
            StageOutput::SkillMatch(result) => self.skill_result.set(Slot::SkillResult, result),
            StageOutput::Experience(result) => {
                self.experience_result.set(Slot::ExperienceResult, result)
            }
            StageOutput::CultureFit(result) => self.culture_result.set(Slot::CultureResult, result),
            StageOutput::Report(report) => self.final_report.set(Slot::FinalReport, report),
        }
    }

    // Views. Each exposes only the slots its stage declares.

    pub fn cv_text_view(&self) -> Result<CvTextView, StateError> {
        Ok(CvTextView {
            cv_text: self.cv_text.shared(Slot::CvText)?,
        })
    }

    pub fn job_text_view(&self) -> Result<JobTextView, StateError> {
        Ok(JobTextView {
            job_text: self.job_text.shared(Slot::JobText)?,
        })
    }

    pub fn candidate_view(&self) -> Result<CandidateView, StateError> {
        Ok(CandidateView {
            cv: self.cv_record.shared(Slot::CvRecord)?,
            job: self.job_record.shared(Slot::JobRecord)?,
        })
    }

    pub fn aggregate_view(&self) -> Result<AggregateView, StateError> {
        Ok(AggregateView {
            cv: self.cv_record.shared(Slot::CvRecord)?,
            job: self.job_record.shared(Slot::JobRecord)?,
            skill_match: self.skill_result.shared(Slot::SkillResult)?,
            experience: self.experience_result.shared(Slot::ExperienceResult)?,
            culture_fit: self.culture_result.shared(Slot::CultureResult)?,
        })
    }
}
