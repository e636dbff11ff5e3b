use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::acta::AssemblyType;

pub const DEFAULT_LEGAL_REFERENCE: &str = "Artigo 1432.º do Código Civil";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoticeAgendaItem {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub voting_required: bool,
}

/// Everything needed to print a meeting notice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvocatoriaData {
    pub building_name: String,
    pub building_address: String,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    pub assembly_number: String,
    #[serde(default)]
    pub assembly_type: AssemblyType,
    pub meeting_date: NaiveDate,
    /// `HH:MM`.
    pub meeting_time: String,
    pub meeting_location: String,
    #[serde(default)]
    pub second_call_enabled: bool,
    #[serde(default)]
    pub second_call_date: Option<NaiveDate>,
    #[serde(default)]
    pub second_call_time: Option<String>,
    pub administrator: String,
    #[serde(default)]
    pub agenda_items: Vec<NoticeAgendaItem>,
    #[serde(default)]
    pub legal_reference: Option<String>,
}

/// How the notice announces the second call, if at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecondCall {
    SameDay { time: String },
    OtherDay { date: NaiveDate, time: String },
}

impl ConvocatoriaData {
    pub fn validate(&self) -> Option<String> {
        let required = [
            (&self.building_name, "O nome do edifício é obrigatório"),
            (&self.assembly_number, "O número da assembleia é obrigatório"),
            (&self.meeting_time, "A hora da reunião é obrigatória"),
            (&self.meeting_location, "O local da reunião é obrigatório"),
            (&self.administrator, "O nome do administrador é obrigatório"),
        ];
        if let Some((_, msg)) = required.iter().find(|(value, _)| value.trim().is_empty()) {
            return Some(msg.to_string());
        }
        if self.agenda_items.iter().any(|item| item.title.trim().is_empty()) {
            return Some("Todos os pontos da ordem de trabalhos precisam de um título".to_string());
        }
        None
    }

    /// The second call is only announced when enabled and a time is known.
    pub fn second_call(&self) -> Option<SecondCall> {
        if !self.second_call_enabled {
            return None;
        }
        let time = self
            .second_call_time
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())?
            .to_string();
        match self.second_call_date {
            Some(date) if date != self.meeting_date => Some(SecondCall::OtherDay { date, time }),
            _ => Some(SecondCall::SameDay { time }),
        }
    }

    pub fn legal_reference(&self) -> &str {
        self.legal_reference
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_LEGAL_REFERENCE)
    }

    /// "Rua X, 1000-001 Lisboa", skipping missing parts.
    pub fn full_address(&self) -> String {
        let locality = [self.postal_code.as_deref(), self.city.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if locality.is_empty() {
            self.building_address.clone()
        } else {
            format!("{}, {}", self.building_address, locality)
        }
    }
}
