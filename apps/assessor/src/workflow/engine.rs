//! Run scheduler.
//!
//! Each run owns a fresh [`RunState`]. Ready stages are spawned as tokio tasks
//! the moment their inputs are published; results are written back by the
//! engine only. The first stage failure ends the run: nothing further is
//! dispatched, and stages still in flight are detached and their results
//! dropped.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::errors::{StageError, WorkflowError};
use crate::models::AssessmentReport;
use crate::workflow::graph::WorkflowGraph;
use crate::workflow::stage::{DocumentRefs, SharedStage, StageId, StageSet};
use crate::workflow::state::{RunState, StageOutput, StateError};

type StageTask = JoinHandle<Result<StageOutput, StageError>>;

/// Final state and outcome of one run.
#[derive(Debug)]
pub struct RunRecord {
    pub state: RunState,
    pub outcome: Result<AssessmentReport, WorkflowError>,
}

/// The assessment workflow. Immutable once built; any number of runs may
/// execute on it concurrently.
pub struct AssessmentWorkflow {
    graph: WorkflowGraph,
    stages: StageSet,
}

impl AssessmentWorkflow {
    pub fn new(stages: StageSet) -> Result<Self, WorkflowError> {
        Ok(Self {
            graph: WorkflowGraph::assessment()?,
            stages,
        })
    }

    /// Runs the workflow to completion and returns the final report.
    pub async fn run(
        &self,
        cv_ref: impl Into<PathBuf>,
        job_ref: impl Into<PathBuf>,
    ) -> Result<AssessmentReport, WorkflowError> {
        self.execute(cv_ref, job_ref, CancellationToken::new())
            .await
            .outcome
    }

    /// Runs the workflow and returns the final run state alongside the
    /// outcome. Cancelling `cancel` ends the run with
    /// [`WorkflowError::Cancelled`].
    #[instrument(name = "workflow_run", skip_all)]
    pub async fn execute(
        &self,
        cv_ref: impl Into<PathBuf>,
        job_ref: impl Into<PathBuf>,
        cancel: CancellationToken,
    ) -> RunRecord {
        let mut state = RunState::new(DocumentRefs::new(cv_ref, job_ref));
        let run_id = state.run_id();

        info!(
            run_id = %run_id,
            cv = %state.refs().cv.display(),
            job = %state.refs().job.display(),
            "workflow_started"
        );

        let started_at = Instant::now();
        let outcome = self.drive(&mut state, &cancel).await;

        match &outcome {
            Ok(report) => info!(
                run_id = %run_id,
                overall_score = report.overall_score,
                recommendation = %report.recommendation,
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                "workflow_completed"
            ),
            Err(e) => error!(
                run_id = %run_id,
                stage = ?e.stage(),
                error = %e,
                "workflow_failed"
            ),
        }

        RunRecord { state, outcome }
    }

    async fn drive(
        &self,
        state: &mut RunState,
        cancel: &CancellationToken,
    ) -> Result<AssessmentReport, WorkflowError> {
        state.refs().check().map_err(WorkflowError::InvalidInput)?;

        let run_id = state.run_id();
        let mut started: BTreeSet<StageId> = BTreeSet::new();
        let mut in_flight = FuturesUnordered::new();

        loop {
            if cancel.is_cancelled() {
                warn!(run_id = %run_id, "workflow cancelled");
                return Err(WorkflowError::Cancelled);
            }

            for id in self.graph.ready(state, &started) {
                started.insert(id);
                info!(run_id = %run_id, stage = %id, "stage_started");
                let task = self.dispatch(id, state, cancel)?;
                let dispatched_at = Instant::now();
                in_flight.push(async move { (id, task.await, dispatched_at.elapsed()) });
            }

            let (id, joined, elapsed) = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!(run_id = %run_id, "workflow cancelled during stage execution");
                    return Err(WorkflowError::Cancelled);
                }
                next = in_flight.next() => match next {
                    Some(done) => done,
                    None => break,
                },
            };

            // A panicking stage is still a failure of that stage
            let result = joined.unwrap_or_else(|e| Err(StageError::Aborted(e.to_string())));

            match result {
                Ok(output) => {
                    self.publish(state, id, output)?;
                    info!(
                        run_id = %run_id,
                        stage = %id,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "stage_completed"
                    );
                }
                Err(source) => {
                    error!(
                        run_id = %run_id,
                        stage = %id,
                        error = %source,
                        in_flight = in_flight.len(),
                        "stage_failed"
                    );
                    return Err(WorkflowError::stage_failed(id, source));
                }
            }
        }

        state.final_report().cloned().ok_or_else(|| {
            WorkflowError::Engine(format!(
                "no stage is ready but '{}' has not produced a report",
                self.graph.terminal()
            ))
        })
    }

    /// Builds the stage's view from the run state and spawns it.
    fn dispatch(
        &self,
        id: StageId,
        state: &RunState,
        cancel: &CancellationToken,
    ) -> Result<StageTask, StateError> {
        let cancel = cancel.clone();
        let stages = &self.stages;

        Ok(match id {
            StageId::LoadDocuments => spawn_stage(
                &stages.load_documents,
                state.refs().clone(),
                cancel,
                StageOutput::Documents,
            ),
            StageId::ParseCv => spawn_stage(
                &stages.parse_cv,
                state.cv_text_view()?,
                cancel,
                StageOutput::CvRecord,
            ),
            StageId::AnalyzeJob => spawn_stage(
                &stages.analyze_job,
                state.job_text_view()?,
                cancel,
                StageOutput::JobRecord,
            ),
            StageId::MatchSkills => spawn_stage(
                &stages.match_skills,
                state.candidate_view()?,
                cancel,
                StageOutput::SkillMatch,
            ),
            StageId::EvaluateExperience => spawn_stage(
                &stages.evaluate_experience,
                state.candidate_view()?,
                cancel,
                StageOutput::Experience,
            ),
            StageId::AssessCultureFit => spawn_stage(
                &stages.assess_culture_fit,
                state.candidate_view()?,
                cancel,
                StageOutput::CultureFit,
            ),
            StageId::Aggregate => spawn_stage(
                &stages.aggregate,
                state.aggregate_view()?,
                cancel,
                StageOutput::Report,
            ),
        })
    }

    /// Writes a stage's output into the run state after checking it fills
    /// exactly the slots the stage declared.
    fn publish(
        &self,
        state: &mut RunState,
        id: StageId,
        output: StageOutput,
    ) -> Result<(), WorkflowError> {
        let declared = self.graph.descriptor(id).map(|d| d.outputs).unwrap_or(&[]);
        if output.slots() != declared {
            return Err(WorkflowError::Engine(format!(
                "stage '{id}' produced {:?} but declares {:?}",
                output.slots(),
                declared
            )));
        }
        state.publish(output)?;
        Ok(())
    }
}

fn spawn_stage<I, O>(
    stage: &SharedStage<I, O>,
    input: I,
    cancel: CancellationToken,
    wrap: fn(O) -> StageOutput,
) -> StageTask
where
    I: Send + 'static,
    O: Send + 'static,
{
    let stage = Arc::clone(stage);
    tokio::spawn(async move { stage.execute(input, &cancel).await.map(wrap) })
}
