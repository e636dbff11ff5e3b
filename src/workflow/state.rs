//! The minutes wizard as a typed sequence of steps.
//!
//! Each step is an immutable snapshot. Advancing builds the next step from the
//! current one and moves the old snapshot into the history.

use std::fmt;

use crate::gateway::SignatureGateway;
use crate::models::acta::{AttendanceType, Attendee, QUORUM_THRESHOLD, VotingResult};
use crate::models::minutes::{AgendaItem, MinuteDocument, Quorum};

use super::signing::{FinalizeError, FinalizeReport, PresentMember, SignatureCollector, ValidationError};

#[derive(Debug, Clone, PartialEq)]
pub struct PreparationStep {
    pub minute: MinuteDocument,
}

impl PreparationStep {
    pub fn record_attendance(&self, attendees: Vec<Attendee>) -> Result<AttendanceStep, ValidationError> {
        let anyone = attendees
            .iter()
            .any(|a| a.attendance_type != AttendanceType::Absent);
        if !anyone {
            return Err(ValidationError("Deve registar os presentes".to_string()));
        }
        Ok(AttendanceStep {
            minute: self.minute.clone(),
            attendees,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceStep {
    pub minute: MinuteDocument,
    pub attendees: Vec<Attendee>,
}

impl AttendanceStep {
    /// Represented share in per mille of those present or represented.
    pub fn represented_permilage(&self) -> f64 {
        self.attendees
            .iter()
            .filter(|a| a.attendance_type != AttendanceType::Absent)
            .map(|a| a.permilage)
            .sum()
    }

    pub fn verify_quorum(&self) -> Result<QuorumStep, ValidationError> {
        let permilage = self.represented_permilage();
        let quorum = Quorum {
            percentage: permilage / 10.0,
            permilage,
        };
        let mut minute = self.minute.clone();
        minute
            .set_quorum(quorum)
            .map_err(|e| ValidationError(e.to_string()))?;
        Ok(QuorumStep {
            minute,
            attendees: self.attendees.clone(),
            achieved: quorum.percentage >= QUORUM_THRESHOLD,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuorumStep {
    pub minute: MinuteDocument,
    pub attendees: Vec<Attendee>,
    pub achieved: bool,
}

impl QuorumStep {
    pub fn open_deliberation(&self) -> Result<DeliberationStep, ValidationError> {
        if !self.achieved {
            return Err(ValidationError(
                "Quórum não atingido - Necessária segunda convocatória".to_string(),
            ));
        }
        Ok(DeliberationStep {
            minute: self.minute.clone(),
            attendees: self.attendees.clone(),
            voting_results: Vec::new(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeliberationStep {
    pub minute: MinuteDocument,
    pub attendees: Vec<Attendee>,
    pub voting_results: Vec<VotingResult>,
}

impl DeliberationStep {
    pub fn with_agenda(&self, items: Vec<AgendaItem>) -> Result<DeliberationStep, ValidationError> {
        let mut minute = self.minute.clone();
        minute
            .set_agenda(items)
            .map_err(|e| ValidationError(e.to_string()))?;
        Ok(DeliberationStep {
            minute,
            ..self.clone()
        })
    }

    pub fn with_votes(&self, voting_results: Vec<VotingResult>) -> DeliberationStep {
        DeliberationStep {
            voting_results,
            ..self.clone()
        }
    }

    /// Members present or represented with a known id may co-sign.
    pub fn start_signing(&self) -> SigningStep {
        let present = self
            .attendees
            .iter()
            .filter(|a| a.attendance_type != AttendanceType::Absent)
            .filter_map(|a| {
                a.member_id.map(|member_id| PresentMember {
                    member_id,
                    name: a.name.clone(),
                })
            })
            .collect();
        SigningStep {
            collector: SignatureCollector::new(self.minute.clone(), present),
            attendees: self.attendees.clone(),
            voting_results: self.voting_results.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SigningStep {
    pub collector: SignatureCollector,
    pub attendees: Vec<Attendee>,
    pub voting_results: Vec<VotingResult>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignedStep {
    pub minute: MinuteDocument,
    pub attendees: Vec<Attendee>,
    pub voting_results: Vec<VotingResult>,
    pub report: FinalizeReport,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActaStep {
    Preparation(PreparationStep),
    Attendance(AttendanceStep),
    Quorum(QuorumStep),
    Deliberation(DeliberationStep),
    Signing(SigningStep),
    Signed(SignedStep),
}

impl ActaStep {
    pub fn name(&self) -> &'static str {
        match self {
            ActaStep::Preparation(_) => "preparation",
            ActaStep::Attendance(_) => "attendance",
            ActaStep::Quorum(_) => "quorum",
            ActaStep::Deliberation(_) => "deliberation",
            ActaStep::Signing(_) => "signing",
            ActaStep::Signed(_) => "signed",
        }
    }

    pub fn minute(&self) -> &MinuteDocument {
        match self {
            ActaStep::Preparation(s) => &s.minute,
            ActaStep::Attendance(s) => &s.minute,
            ActaStep::Quorum(s) => &s.minute,
            ActaStep::Deliberation(s) => &s.minute,
            ActaStep::Signing(s) => s.collector.minute(),
            ActaStep::Signed(s) => &s.minute,
        }
    }
}

/// Snapshots of every step left behind, oldest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowHistory {
    snapshots: Vec<ActaStep>,
}

impl WorkflowHistory {
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActaStep> {
        self.snapshots.iter()
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.snapshots.iter().map(ActaStep::name).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowError {
    WrongStep { expected: &'static str, actual: &'static str },
    Validation(ValidationError),
    Finalize(FinalizeError),
}

impl fmt::Display for WorkflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowError::WrongStep { expected, actual } => {
                write!(f, "Expected step '{expected}' but workflow is at '{actual}'")
            }
            WorkflowError::Validation(e) => write!(f, "{e}"),
            WorkflowError::Finalize(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for WorkflowError {}

impl From<ValidationError> for WorkflowError {
    fn from(e: ValidationError) -> Self {
        WorkflowError::Validation(e)
    }
}

impl From<FinalizeError> for WorkflowError {
    fn from(e: FinalizeError) -> Self {
        WorkflowError::Finalize(e)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActaWorkflow {
    current: ActaStep,
    history: WorkflowHistory,
}

impl ActaWorkflow {
    pub fn new(minute: MinuteDocument) -> Self {
        ActaWorkflow {
            current: ActaStep::Preparation(PreparationStep { minute }),
            history: WorkflowHistory::default(),
        }
    }

    pub fn current(&self) -> &ActaStep {
        &self.current
    }

    pub fn history(&self) -> &WorkflowHistory {
        &self.history
    }

    fn advance(&mut self, next: ActaStep) {
        let previous = std::mem::replace(&mut self.current, next);
        self.history.snapshots.push(previous);
    }

    fn wrong_step(&self, expected: &'static str) -> WorkflowError {
        WorkflowError::WrongStep {
            expected,
            actual: self.current.name(),
        }
    }

    pub fn record_attendance(&mut self, attendees: Vec<Attendee>) -> Result<(), WorkflowError> {
        let next = match &self.current {
            ActaStep::Preparation(step) => step.record_attendance(attendees)?,
            _ => return Err(self.wrong_step("preparation")),
        };
        self.advance(ActaStep::Attendance(next));
        Ok(())
    }

    pub fn verify_quorum(&mut self) -> Result<bool, WorkflowError> {
        let next = match &self.current {
            ActaStep::Attendance(step) => step.verify_quorum()?,
            _ => return Err(self.wrong_step("attendance")),
        };
        let achieved = next.achieved;
        self.advance(ActaStep::Quorum(next));
        Ok(achieved)
    }

    pub fn open_deliberation(&mut self) -> Result<(), WorkflowError> {
        let next = match &self.current {
            ActaStep::Quorum(step) => step.open_deliberation()?,
            _ => return Err(self.wrong_step("quorum")),
        };
        self.advance(ActaStep::Deliberation(next));
        Ok(())
    }

    /// Record agenda and votes; each call is its own snapshot.
    pub fn deliberate(
        &mut self,
        agenda: Vec<AgendaItem>,
        voting_results: Vec<VotingResult>,
    ) -> Result<(), WorkflowError> {
        let next = match &self.current {
            ActaStep::Deliberation(step) => step.with_agenda(agenda)?.with_votes(voting_results),
            _ => return Err(self.wrong_step("deliberation")),
        };
        self.advance(ActaStep::Deliberation(next));
        Ok(())
    }

    pub fn start_signing(&mut self) -> Result<(), WorkflowError> {
        let next = match &self.current {
            ActaStep::Deliberation(step) => step.start_signing(),
            _ => return Err(self.wrong_step("deliberation")),
        };
        self.advance(ActaStep::Signing(next));
        Ok(())
    }

    /// Signature capture happens in place on the signing step.
    pub fn collector_mut(&mut self) -> Result<&mut SignatureCollector, WorkflowError> {
        let actual = self.current.name();
        match &mut self.current {
            ActaStep::Signing(step) => Ok(&mut step.collector),
            _ => Err(WorkflowError::WrongStep { expected: "signing", actual }),
        }
    }

    /// Persist the signatures and move to `Signed`. On failure the workflow
    /// stays on the signing step with the captured signatures intact.
    pub async fn finalize(&mut self, gateway: &dyn SignatureGateway) -> Result<&FinalizeReport, WorkflowError> {
        let next = match &self.current {
            ActaStep::Signing(step) => {
                let mut collector = step.collector.clone();
                let report = collector.finalize(gateway).await?;
                SignedStep {
                    minute: collector.into_minute(),
                    attendees: step.attendees.clone(),
                    voting_results: step.voting_results.clone(),
                    report,
                }
            }
            _ => return Err(self.wrong_step("signing")),
        };
        self.advance(ActaStep::Signed(next));
        match &self.current {
            ActaStep::Signed(step) => Ok(&step.report),
            _ => Err(self.wrong_step("signed")),
        }
    }
}
