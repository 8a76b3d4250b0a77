//! Submission state machine
//!
//! One upload moves through
//! `AwaitingUpload -> Validating -> Submitting -> AwaitingResponse -> DisplayingResult`.
//! Any failure returns to `AwaitingUpload`; a new submission restarts the
//! machine. Handlers drive an [`UploadFlow`] so that "no submission yet" and
//! "no result yet" are states rather than faults.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowState {
    #[default]
    AwaitingUpload,
    Validating,
    Submitting,
    AwaitingResponse,
    DisplayingResult,
}

impl Display for FlowState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            FlowState::AwaitingUpload => write!(f, "awaiting_upload"),
            FlowState::Validating => write!(f, "validating"),
            FlowState::Submitting => write!(f, "submitting"),
            FlowState::AwaitingResponse => write!(f, "awaiting_response"),
            FlowState::DisplayingResult => write!(f, "displaying_result"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowEvent {
    /// The form was posted
    Submitted,
    /// The submission passed validation
    Validated,
    ValidationFailed,
    /// The upload was written to a temporary file and handed to the classifier
    Stored,
    StorageFailed,
    /// The classifier answered
    Classified,
    ServiceFailed,
}

impl Display for FlowEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            FlowEvent::Submitted => write!(f, "submitted"),
            FlowEvent::Validated => write!(f, "validated"),
            FlowEvent::ValidationFailed => write!(f, "validation_failed"),
            FlowEvent::Stored => write!(f, "stored"),
            FlowEvent::StorageFailed => write!(f, "storage_failed"),
            FlowEvent::Classified => write!(f, "classified"),
            FlowEvent::ServiceFailed => write!(f, "service_failed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Invalid transition: {event} in state {state}")]
pub struct FlowError {
    pub state: FlowState,
    pub event: FlowEvent,
}

impl FlowState {
    /// Compute the next state, rejecting events that make no sense here
    pub fn next(self, event: FlowEvent) -> Result<FlowState, FlowError> {
        use FlowEvent::*;
        use FlowState::*;

        match (self, event) {
            (AwaitingUpload | DisplayingResult, Submitted) => Ok(Validating),
            (Validating, Validated) => Ok(Submitting),
            (Validating, ValidationFailed) => Ok(AwaitingUpload),
            (Submitting, Stored) => Ok(AwaitingResponse),
            (Submitting, StorageFailed) => Ok(AwaitingUpload),
            (AwaitingResponse, Classified) => Ok(DisplayingResult),
            (AwaitingResponse, ServiceFailed) => Ok(AwaitingUpload),
            (state, event) => Err(FlowError { state, event }),
        }
    }

    /// `DisplayingResult` ends a submission
    pub fn is_terminal(&self) -> bool {
        matches!(self, FlowState::DisplayingResult)
    }
}

/// Per-request driver around [`FlowState`] that logs each transition
#[derive(Debug, Clone, Default)]
pub struct UploadFlow {
    state: FlowState,
}

impl UploadFlow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume from a state remembered for the session
    pub fn resume(state: FlowState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn advance(&mut self, event: FlowEvent) -> Result<FlowState, FlowError> {
        let from = self.state;
        let to = from.next(event)?;
        tracing::debug!(from = %from, event = %event, to = %to, "Upload flow transition");
        self.state = to;
        Ok(to)
    }
}
