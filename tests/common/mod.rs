//! Shared fixtures for the integration tests.
//!
//! - `sample_minute()` / `sample_acta()` / `sample_notice()` - typical documents
//! - `signature_data_url()` - a real PNG signature as the signature pad sends it
//! - `MockGateway` - in-memory `SignatureGateway` with a call log and failure injection
//! - `setup_test_db()` - Postgres from `DATABASE_URL`, or `None` when unset
#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Mutex;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{NaiveDate, TimeZone, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use condominio::gateway::{GatewayError, SignatureGateway, UpsertOutcome};
use condominio::models::acta::{ActaData, ActaDocument, AttendanceType, Attendee};
use condominio::models::convocatoria::{ConvocatoriaData, NoticeAgendaItem};
use condominio::models::minutes::{AgendaItem, MinuteDocument};
use condominio::models::signature::{NewSignature, SignerType};

// ============================================================================
// DOCUMENTS
// ============================================================================

pub fn meeting_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 15).expect("valid date")
}

/// Draft minute with two agenda items and a fixed creation time.
pub fn sample_minute() -> MinuteDocument {
    let mut minute = MinuteDocument::new("12", Uuid::new_v4(), meeting_date());
    minute.created_at = Some(Utc.with_ymd_and_hms(2025, 3, 15, 21, 5, 0).single().expect("valid timestamp"));
    minute
        .set_agenda(vec![
            AgendaItem::new("Aprovação das contas de 2024"),
            AgendaItem::new("Orçamento para 2025"),
        ])
        .expect("draft is editable");
    minute
}

pub fn attendee(name: &str, attendance_type: AttendanceType, permilage: f64) -> Attendee {
    Attendee {
        name: name.to_string(),
        attendance_type,
        member_id: Some(Uuid::new_v4()),
        permilage,
    }
}

/// Minutes with every optional section empty.
pub fn empty_acta() -> ActaDocument {
    ActaDocument {
        acta: serde_json::from_value(serde_json::json!({
            "minute_number": "12",
            "meeting_date": "2025-03-15",
            "building_name": "Edifício Aurora",
            "building_address": "Rua das Flores 12"
        }))
        .expect("valid acta"),
        signatures: Default::default(),
        integrity: None,
        generated_at: Some(Utc.with_ymd_and_hms(2025, 3, 16, 10, 0, 0).single().expect("valid timestamp")),
    }
}

pub fn acta_with_agenda(items: usize) -> ActaDocument {
    let mut doc = empty_acta();
    let acta: &mut ActaData = &mut doc.acta;
    acta.agenda_items = (1..=items)
        .map(|i| {
            serde_json::from_value(serde_json::json!({
                "item_number": i,
                "title": format!("Ponto {i}: deliberação sobre obras na fachada e na cobertura"),
                "description": "Apresentação dos orçamentos recebidos, discussão das propostas \
                                e votação da solução a adotar pelos condóminos.",
                "type": "votacion"
            }))
            .expect("valid agenda item")
        })
        .collect();
    doc
}

pub fn sample_notice() -> ConvocatoriaData {
    serde_json::from_value(serde_json::json!({
        "buildingName": "Edifício Aurora",
        "buildingAddress": "Rua das Flores 12",
        "postalCode": "1000-001",
        "city": "Lisboa",
        "assemblyNumber": "3",
        "assemblyType": "ordinary",
        "meetingDate": "2025-03-15",
        "meetingTime": "18:30",
        "meetingLocation": "Hall do prédio",
        "administrator": "Gestão Predial Lda",
        "agendaItems": [
            {"title": "Aprovação das contas", "votingRequired": true},
            {"title": "Eleição da administração", "description": "Mandato 2025/2026"}
        ]
    }))
    .expect("valid notice")
}

pub fn notice_agenda(count: usize, title_len: usize) -> Vec<NoticeAgendaItem> {
    (0..count)
        .map(|_| NoticeAgendaItem {
            title: "x".repeat(title_len),
            description: None,
            voting_required: false,
        })
        .collect()
}

// ============================================================================
// SIGNATURE IMAGES
// ============================================================================

/// PNG bytes: a dark diagonal stroke on a transparent background.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut img = image::RgbaImage::new(width, height);
    for x in 0..width {
        let y = x * height / width.max(1);
        if y < height {
            img.put_pixel(x, y, image::Rgba([20, 20, 60, 255]));
        }
    }
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut out, image::ImageOutputFormat::Png)
        .expect("encode png");
    out.into_inner()
}

pub fn signature_data_url() -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(png_bytes(120, 40)))
}

pub fn new_signature(signer_type: SignerType, name: &str, member_id: Option<Uuid>) -> NewSignature {
    NewSignature {
        signer_type,
        signer_name: name.to_string(),
        signature: signature_data_url(),
        member_id,
        signed_at: None,
    }
}

// ============================================================================
// MOCK GATEWAY
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCall {
    Upsert {
        signer_type: SignerType,
        signer_name: String,
        member_id: Option<Uuid>,
    },
    Remove {
        signature_id: Uuid,
    },
}

#[derive(Default)]
struct MockState {
    calls: Vec<GatewayCall>,
    /// Stored signature id per slot.
    slots: HashMap<(&'static str, Option<Uuid>), Uuid>,
    fail_upsert_for: Option<SignerType>,
    fail_remove: bool,
}

/// In-memory signature store that records every call.
#[derive(Default)]
pub struct MockGateway {
    state: Mutex<MockState>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upserts for `signer_type` fail with a transport error.
    pub fn failing_on(signer_type: SignerType) -> Self {
        let gw = Self::default();
        gw.state.lock().expect("lock").fail_upsert_for = Some(signer_type);
        gw
    }

    pub fn fail_removals(self) -> Self {
        self.state.lock().expect("lock").fail_remove = true;
        self
    }

    /// Pretend a signature is already stored for this slot.
    pub fn with_existing(self, signer_type: SignerType, member_id: Option<Uuid>) -> Self {
        self.state
            .lock()
            .expect("lock")
            .slots
            .insert((signer_type.as_str(), member_id), Uuid::new_v4());
        self
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.state.lock().expect("lock").calls.clone()
    }

    pub fn upserts(&self) -> Vec<SignerType> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                GatewayCall::Upsert { signer_type, .. } => Some(signer_type),
                _ => None,
            })
            .collect()
    }

    pub fn removals(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, GatewayCall::Remove { .. }))
            .count()
    }

    pub fn stored(&self) -> usize {
        self.state.lock().expect("lock").slots.len()
    }
}

#[async_trait]
impl SignatureGateway for MockGateway {
    async fn upsert(&self, _minute_id: Uuid, sig: &NewSignature) -> Result<UpsertOutcome, GatewayError> {
        let mut state = self.state.lock().expect("lock");
        state.calls.push(GatewayCall::Upsert {
            signer_type: sig.signer_type,
            signer_name: sig.signer_name.clone(),
            member_id: sig.member_id,
        });
        if state.fail_upsert_for == Some(sig.signer_type) {
            return Err(GatewayError::Transport("connection reset by peer".to_string()));
        }
        let key = (sig.signer_type.as_str(), sig.member_id);
        match state.slots.get(&key) {
            Some(id) => Ok(UpsertOutcome { signature_id: *id, created: false }),
            None => {
                let id = Uuid::new_v4();
                state.slots.insert(key, id);
                Ok(UpsertOutcome { signature_id: id, created: true })
            }
        }
    }

    async fn remove(&self, _minute_id: Uuid, signature_id: Uuid) -> Result<(), GatewayError> {
        let mut state = self.state.lock().expect("lock");
        state.calls.push(GatewayCall::Remove { signature_id });
        if state.fail_remove {
            return Err(GatewayError::Transport("connection refused".to_string()));
        }
        let before = state.slots.len();
        state.slots.retain(|_, id| *id != signature_id);
        if state.slots.len() == before {
            return Err(GatewayError::Rejected("Assinatura não encontrada".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// DATABASE SETUP
// ============================================================================

pub struct TestDb {
    pool: PgPool,
}

impl TestDb {
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Connect to `DATABASE_URL` and run migrations. Tests return early on `None`.
pub async fn setup_test_db() -> Option<TestDb> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let pool = PgPool::connect(&url).await.expect("Failed to connect to test DB");
    condominio::db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    Some(TestDb { pool })
}
