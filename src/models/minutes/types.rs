use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::signature::{Signature, SignerType};

/// Lifecycle of a minutes document: `draft` -> `signed` -> `finalized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MinuteStatus {
    Draft,
    Signed,
    Finalized,
}

impl MinuteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MinuteStatus::Draft => "draft",
            MinuteStatus::Signed => "signed",
            MinuteStatus::Finalized => "finalized",
        }
    }
}

/// One point of the agenda as recorded in the minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgendaItem {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voting_result: Option<String>,
}

impl AgendaItem {
    pub fn new(title: impl Into<String>) -> Self {
        AgendaItem {
            title: title.into(),
            voting_result: None,
        }
    }
}

/// Share of the building represented at the meeting.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Quorum {
    pub percentage: f64,
    pub permilage: f64,
}

/// The minutes of one assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinuteDocument {
    pub id: Uuid,
    pub minute_number: String,
    pub building_id: Uuid,
    pub meeting_date: NaiveDate,
    #[serde(default)]
    pub agenda_items: Vec<AgendaItem>,
    #[serde(default)]
    pub quorum: Quorum,
    pub status: MinuteStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MinuteError {
    /// Content changes are only accepted while the minutes are a draft.
    NotEditable(MinuteStatus),
    /// `signed` requires a president and a secretary signature.
    MissingMandatorySignature(SignerType),
    InvalidTransition { from: MinuteStatus, to: MinuteStatus },
}

impl std::fmt::Display for MinuteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MinuteError::NotEditable(status) => {
                write!(f, "Minutes in status '{}' can no longer be edited", status.as_str())
            }
            MinuteError::MissingMandatorySignature(signer) => {
                write!(f, "Missing mandatory {} signature", signer.as_str())
            }
            MinuteError::InvalidTransition { from, to } => {
                write!(f, "Cannot move minutes from '{}' to '{}'", from.as_str(), to.as_str())
            }
        }
    }
}

impl std::error::Error for MinuteError {}

impl MinuteDocument {
    pub fn new(minute_number: impl Into<String>, building_id: Uuid, meeting_date: NaiveDate) -> Self {
        MinuteDocument {
            id: Uuid::new_v4(),
            minute_number: minute_number.into(),
            building_id,
            meeting_date,
            agenda_items: Vec::new(),
            quorum: Quorum::default(),
            status: MinuteStatus::Draft,
            created_at: Some(Utc::now()),
        }
    }

    pub fn is_draft(&self) -> bool {
        self.status == MinuteStatus::Draft
    }

    /// Replace the recorded agenda. Draft only.
    pub fn set_agenda(&mut self, items: Vec<AgendaItem>) -> Result<(), MinuteError> {
        if !self.is_draft() {
            return Err(MinuteError::NotEditable(self.status));
        }
        self.agenda_items = items;
        Ok(())
    }

    /// Record the quorum verified at the start of the meeting. Draft only.
    pub fn set_quorum(&mut self, quorum: Quorum) -> Result<(), MinuteError> {
        if !self.is_draft() {
            return Err(MinuteError::NotEditable(self.status));
        }
        self.quorum = quorum;
        Ok(())
    }

    /// Move to `signed`. Re-signing an already signed document keeps it signed.
    pub fn mark_signed(&mut self, president: &Signature, secretary: &Signature) -> Result<(), MinuteError> {
        if president.signer_type != SignerType::President {
            return Err(MinuteError::MissingMandatorySignature(SignerType::President));
        }
        if secretary.signer_type != SignerType::Secretary {
            return Err(MinuteError::MissingMandatorySignature(SignerType::Secretary));
        }
        match self.status {
            MinuteStatus::Draft | MinuteStatus::Signed => {
                self.status = MinuteStatus::Signed;
                Ok(())
            }
            MinuteStatus::Finalized => Err(MinuteError::InvalidTransition {
                from: self.status,
                to: MinuteStatus::Signed,
            }),
        }
    }

    pub fn mark_finalized(&mut self) -> Result<(), MinuteError> {
        if self.status != MinuteStatus::Signed {
            return Err(MinuteError::InvalidTransition {
                from: self.status,
                to: MinuteStatus::Finalized,
            });
        }
        self.status = MinuteStatus::Finalized;
        Ok(())
    }
}
