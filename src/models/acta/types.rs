use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::integrity::IntegrityRecord;
use crate::models::signature::{Signature, SignerType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssemblyType {
    #[default]
    #[serde(alias = "ordinaria")]
    Ordinary,
    #[serde(alias = "extraordinaria")]
    Extraordinary,
}

impl AssemblyType {
    /// Title-case Portuguese label, as used in headings and file names.
    pub fn label(&self) -> &'static str {
        match self {
            AssemblyType::Ordinary => "Ordinária",
            AssemblyType::Extraordinary => "Extraordinária",
        }
    }

    pub fn label_upper(&self) -> &'static str {
        match self {
            AssemblyType::Ordinary => "ORDINÁRIA",
            AssemblyType::Extraordinary => "EXTRAORDINÁRIA",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgendaItemKind {
    #[serde(alias = "votacion", alias = "votacao")]
    Voting,
    #[serde(alias = "informativo")]
    Informative,
    #[serde(alias = "discusion", alias = "discussao")]
    Discussion,
}

impl AgendaItemKind {
    pub fn tag(&self) -> Option<&'static str> {
        match self {
            AgendaItemKind::Voting => Some("[Votação]"),
            AgendaItemKind::Informative => Some("[Informativo]"),
            AgendaItemKind::Discussion => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActaAgendaItem {
    #[serde(default)]
    pub item_number: Option<u32>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<AgendaItemKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceType {
    #[default]
    #[serde(alias = "presente")]
    Present,
    #[serde(alias = "representado")]
    Represented,
    #[serde(alias = "ausente")]
    Absent,
}

impl AttendanceType {
    pub fn tag(&self) -> &'static str {
        match self {
            AttendanceType::Present => "[Presente]",
            AttendanceType::Represented => "[Representado]",
            AttendanceType::Absent => "[Ausente]",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendee {
    pub name: String,
    #[serde(default)]
    pub attendance_type: AttendanceType,
    #[serde(default)]
    pub member_id: Option<Uuid>,
    /// Share of the building in per mille.
    #[serde(default)]
    pub permilage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteOutcome {
    #[serde(alias = "aprovado")]
    Approved,
    #[serde(alias = "rejeitado")]
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VotingResult {
    pub title: String,
    #[serde(default)]
    pub in_favor: Option<u32>,
    #[serde(default)]
    pub against: Option<u32>,
    #[serde(default)]
    pub abstentions: Option<u32>,
    #[serde(default)]
    pub result: Option<VoteOutcome>,
}

/// Everything printed in the body of the minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActaData {
    pub minute_number: String,
    #[serde(default)]
    pub assembly_type: AssemblyType,
    pub meeting_date: NaiveDate,
    #[serde(default)]
    pub meeting_time: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    pub building_name: String,
    #[serde(default)]
    pub building_address: String,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub president_name: Option<String>,
    #[serde(default)]
    pub secretary_name: Option<String>,
    #[serde(default)]
    pub attendees_count: Option<u32>,
    #[serde(default)]
    pub quorum_percentage: f64,
    /// Explicit verdict; when absent the 50% threshold decides.
    #[serde(default)]
    pub quorum_achieved: Option<bool>,
    #[serde(default)]
    pub agenda_items: Vec<ActaAgendaItem>,
    #[serde(default)]
    pub attendees: Vec<Attendee>,
    #[serde(default)]
    pub voting_results: Vec<VotingResult>,
    #[serde(default)]
    pub conclusions: Option<String>,
    #[serde(default)]
    pub signed_date: Option<NaiveDate>,
}

pub const QUORUM_THRESHOLD: f64 = 50.0;

impl ActaData {
    pub fn quorum_met(&self) -> bool {
        self.quorum_achieved
            .unwrap_or(self.quorum_percentage >= QUORUM_THRESHOLD)
    }

    /// Number printed in section III: explicit count or the attendance list.
    pub fn attendee_total(&self) -> usize {
        match self.attendees_count {
            Some(n) => n as usize,
            None => self
                .attendees
                .iter()
                .filter(|a| a.attendance_type != AttendanceType::Absent)
                .count(),
        }
    }
}

/// One rendered signature: the name, the raster (if any) and when it was made.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureMark {
    pub signer_name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub signed_at: Option<DateTime<Utc>>,
}

impl From<&Signature> for SignatureMark {
    fn from(sig: &Signature) -> Self {
        SignatureMark {
            signer_name: sig.signer_name.clone(),
            image: Some(sig.signature_image.clone()),
            signed_at: Some(sig.signed_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ActaSignatures {
    #[serde(default)]
    pub president: Option<SignatureMark>,
    #[serde(default)]
    pub secretary: Option<SignatureMark>,
    #[serde(default)]
    pub members: Vec<SignatureMark>,
}

impl ActaSignatures {
    /// Group signatures by role. A later signature for a mandatory role replaces
    /// an earlier one.
    pub fn from_signatures(signatures: &[Signature]) -> Self {
        let mut out = ActaSignatures::default();
        for sig in signatures {
            match sig.signer_type {
                SignerType::President => out.president = Some(sig.into()),
                SignerType::Secretary => out.secretary = Some(sig.into()),
                SignerType::Member => out.members.push(sig.into()),
            }
        }
        out
    }
}

/// Input of the minutes renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActaDocument {
    pub acta: ActaData,
    #[serde(default)]
    pub signatures: ActaSignatures,
    #[serde(default)]
    pub integrity: Option<IntegrityRecord>,
    /// Stamp printed in the footer; defaults to the render time.
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_portuguese_aliases() {
        let json = serde_json::json!({
            "minute_number": "7",
            "assembly_type": "extraordinaria",
            "meeting_date": "2025-03-15",
            "building_name": "Edifício Aurora",
            "agenda_items": [{"title": "Obras", "type": "votacion"}],
            "attendees": [{"name": "Ana", "attendance_type": "representado"}],
            "voting_results": [{"title": "Obras", "result": "aprovado"}]
        });
        let acta: ActaData = serde_json::from_value(json).expect("valid acta");
        assert_eq!(acta.assembly_type, AssemblyType::Extraordinary);
        assert_eq!(acta.agenda_items[0].kind, Some(AgendaItemKind::Voting));
        assert_eq!(acta.attendees[0].attendance_type, AttendanceType::Represented);
        assert_eq!(acta.voting_results[0].result, Some(VoteOutcome::Approved));
    }

    #[test]
    fn quorum_defaults_to_half() {
        let json = serde_json::json!({
            "minute_number": "7",
            "meeting_date": "2025-03-15",
            "building_name": "Edifício Aurora",
            "quorum_percentage": 50.0
        });
        let mut acta: ActaData = serde_json::from_value(json).expect("valid acta");
        assert!(acta.quorum_met());
        acta.quorum_percentage = 49.99;
        assert!(!acta.quorum_met());
        acta.quorum_achieved = Some(true);
        assert!(acta.quorum_met());
    }
}
