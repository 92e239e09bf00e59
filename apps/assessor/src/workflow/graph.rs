use std::collections::{BTreeMap, BTreeSet, VecDeque};

use thiserror::Error;

use crate::workflow::stage::StageId;
use crate::workflow::state::{RunState, Slot};

/// What a stage reads and writes. Edges of the graph are derived from these:
/// a stage depends on whichever stage produces each of its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageDescriptor {
    pub id: StageId,
    pub inputs: &'static [Slot],
    pub outputs: &'static [Slot],
}

/// The CV assessment DAG:
/// `load_documents → {parse_cv, analyze_job} → {match_skills, evaluate_experience, assess_culture_fit} → aggregate`.
pub const ASSESSMENT_STAGES: [StageDescriptor; 7] = [
    StageDescriptor {
        id: StageId::LoadDocuments,
        inputs: &[],
        outputs: &[Slot::CvText, Slot::JobText],
    },
    StageDescriptor {
        id: StageId::ParseCv,
        inputs: &[Slot::CvText],
        outputs: &[Slot::CvRecord],
    },
    StageDescriptor {
        id: StageId::AnalyzeJob,
        inputs: &[Slot::JobText],
        outputs: &[Slot::JobRecord],
    },
    StageDescriptor {
        id: StageId::MatchSkills,
        inputs: &[Slot::CvRecord, Slot::JobRecord],
        outputs: &[Slot::SkillResult],
    },
    StageDescriptor {
        id: StageId::EvaluateExperience,
        inputs: &[Slot::CvRecord, Slot::JobRecord],
        outputs: &[Slot::ExperienceResult],
    },
    StageDescriptor {
        id: StageId::AssessCultureFit,
        inputs: &[Slot::CvRecord, Slot::JobRecord],
        outputs: &[Slot::CultureResult],
    },
    StageDescriptor {
        id: StageId::Aggregate,
        inputs: &[
            Slot::CvRecord,
            Slot::JobRecord,
            Slot::SkillResult,
            Slot::ExperienceResult,
            Slot::CultureResult,
        ],
        outputs: &[Slot::FinalReport],
    },
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("workflow has no stages")]
    Empty,

    #[error("stage '{0}' is declared more than once")]
    DuplicateStage(StageId),

    #[error("slot '{slot}' is written by both '{first}' and '{second}'")]
    DuplicateProducer {
        slot: Slot,
        first: StageId,
        second: StageId,
    },

    #[error("stage '{stage}' reads slot '{slot}' but no stage writes it")]
    UnproducedInput { stage: StageId, slot: Slot },

    #[error("stages {0:?} form a cycle")]
    Cycle(Vec<StageId>),

    #[error("expected exactly one entry stage, found {0:?}")]
    EntryPoints(Vec<StageId>),

    #[error("expected exactly one terminal stage, found {0:?}")]
    TerminalStages(Vec<StageId>),
}

/// Validated stage graph. Built once; immutable for the life of the process.
#[derive(Debug, Clone)]
pub struct WorkflowGraph {
    /// Descriptors in a topological order.
    order: Vec<StageDescriptor>,
    /// stage -> stages that consume its outputs.
    downstream: BTreeMap<StageId, Vec<StageId>>,
    /// stage -> stages whose outputs it consumes.
    upstream: BTreeMap<StageId, Vec<StageId>>,
    entry: StageId,
    terminal: StageId,
}

impl WorkflowGraph {
    /// Builds the assessment graph.
    pub fn assessment() -> Result<Self, GraphError> {
        Self::build(&ASSESSMENT_STAGES)
    }

    /// Validates the descriptors and derives the edges between them.
    pub fn build(descriptors: &[StageDescriptor]) -> Result<Self, GraphError> {
        if descriptors.is_empty() {
            return Err(GraphError::Empty);
        }

        let mut by_id: BTreeMap<StageId, StageDescriptor> = BTreeMap::new();
        for descriptor in descriptors {
            if by_id.insert(descriptor.id, *descriptor).is_some() {
                return Err(GraphError::DuplicateStage(descriptor.id));
            }
        }

        // Each slot has exactly one writer
        let mut producers: BTreeMap<Slot, StageId> = BTreeMap::new();
        for descriptor in descriptors {
            for slot in descriptor.outputs {
                if let Some(first) = producers.insert(*slot, descriptor.id) {
                    return Err(GraphError::DuplicateProducer {
                        slot: *slot,
                        first,
                        second: descriptor.id,
                    });
                }
            }
        }

        let mut upstream: BTreeMap<StageId, Vec<StageId>> = BTreeMap::new();
        let mut downstream: BTreeMap<StageId, Vec<StageId>> = BTreeMap::new();
        for id in by_id.keys() {
            upstream.entry(*id).or_default();
            downstream.entry(*id).or_default();
        }

        for descriptor in descriptors {
            let mut sources = BTreeSet::new();
            for slot in descriptor.inputs {
                let producer = producers.get(slot).ok_or(GraphError::UnproducedInput {
                    stage: descriptor.id,
                    slot: *slot,
                })?;
                sources.insert(*producer);
            }
            for source in sources {
                upstream.entry(descriptor.id).or_default().push(source);
                downstream.entry(source).or_default().push(descriptor.id);
            }
        }

        let order = topological_order(&by_id, &upstream, &downstream)?;

        let entries: Vec<StageId> = upstream
            .iter()
            .filter(|(_, sources)| sources.is_empty())
            .map(|(id, _)| *id)
            .collect();
        let terminals: Vec<StageId> = downstream
            .iter()
            .filter(|(_, targets)| targets.is_empty())
            .map(|(id, _)| *id)
            .collect();

        let entry = match entries.as_slice() {
            [only] => *only,
            _ => return Err(GraphError::EntryPoints(entries)),
        };
        let terminal = match terminals.as_slice() {
            [only] => *only,
            _ => return Err(GraphError::TerminalStages(terminals)),
        };

        Ok(Self {
            order,
            downstream,
            upstream,
            entry,
            terminal,
        })
    }

    pub fn entry(&self) -> StageId {
        self.entry
    }

    pub fn terminal(&self) -> StageId {
        self.terminal
    }

    /// All stages, in a topological order.
    pub fn stages(&self) -> impl Iterator<Item = &StageDescriptor> {
        self.order.iter()
    }

    pub fn descriptor(&self, id: StageId) -> Option<&StageDescriptor> {
        self.order.iter().find(|d| d.id == id)
    }

    pub fn upstream(&self, id: StageId) -> &[StageId] {
        self.upstream.get(&id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn downstream(&self, id: StageId) -> &[StageId] {
        self.downstream.get(&id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Stages not yet started whose every input slot is populated.
    pub fn ready(&self, state: &RunState, started: &BTreeSet<StageId>) -> Vec<StageId> {
        self.order
            .iter()
            .filter(|d| !started.contains(&d.id))
            .filter(|d| d.inputs.iter().all(|slot| state.is_populated(*slot)))
            .map(|d| d.id)
            .collect()
    }
}

/// Kahn's algorithm. Ties are broken by `StageId` order so the result is
/// deterministic.
fn topological_order(
    by_id: &BTreeMap<StageId, StageDescriptor>,
    upstream: &BTreeMap<StageId, Vec<StageId>>,
    downstream: &BTreeMap<StageId, Vec<StageId>>,
) -> Result<Vec<StageDescriptor>, GraphError> {
    let mut in_degree: BTreeMap<StageId, usize> = upstream
        .iter()
        .map(|(id, sources)| (*id, sources.len()))
        .collect();

    let mut queue: VecDeque<StageId> = in_degree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(id, _)| *id)
        .collect();

    let mut order = Vec::with_capacity(by_id.len());
    while let Some(id) = queue.pop_front() {
        order.push(by_id[&id]);
        for next in downstream.get(&id).into_iter().flatten() {
            if let Some(degree) = in_degree.get_mut(next) {
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(*next);
                }
            }
        }
    }

    if order.len() != by_id.len() {
        let stuck = in_degree
            .into_iter()
            .filter(|(_, degree)| *degree > 0)
            .map(|(id, _)| id)
            .collect();
        return Err(GraphError::Cycle(stuck));
    }

    Ok(order)
}
