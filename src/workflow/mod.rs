pub mod signing;
pub mod state;

pub use signing::*;
pub use state::{
    ActaStep, ActaWorkflow, AttendanceStep, DeliberationStep, PreparationStep, QuorumStep,
    SignedStep, SigningStep, WorkflowError, WorkflowHistory,
};
