use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::gateway::{GatewayError, SignatureGateway, UpsertOutcome};
use crate::integrity::{DocumentDigest, IntegrityHasher, IntegrityRecord};
use crate::models::minutes::{MinuteDocument, MinuteError, MinuteStatus};
use crate::models::signature::{Signature, SignerType};

/// The two mandatory signers of the minutes (Art. 19.º LPH).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignerRole {
    President,
    Secretary,
}

impl SignerRole {
    pub fn signer_type(&self) -> SignerType {
        match self {
            SignerRole::President => SignerType::President,
            SignerRole::Secretary => SignerType::Secretary,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SignerRole::President => "Presidente",
            SignerRole::Secretary => "Secretário",
        }
    }
}

/// Operator-facing validation message. Blocks the action, nothing else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError(pub String);

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ValidationError {}

fn missing_name(role: SignerRole) -> ValidationError {
    ValidationError(format!("Por favor, indique o nome do {}", role.label()))
}

#[derive(Debug, Clone, PartialEq)]
pub enum RoleSlot {
    Unsigned,
    /// Name entered, capture surface open. `previous` stays in force until
    /// the new capture completes.
    Pending { name: String, previous: Option<Signature> },
    Signed(Signature),
}

impl RoleSlot {
    /// The signature currently in force, if any.
    pub fn signature(&self) -> Option<&Signature> {
        match self {
            RoleSlot::Signed(sig) => Some(sig),
            RoleSlot::Pending { previous, .. } => previous.as_ref(),
            RoleSlot::Unsigned => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberSlot {
    NotSigned,
    Signing { previous: Option<Signature> },
    Signed(Signature),
}

impl MemberSlot {
    pub fn signature(&self) -> Option<&Signature> {
        match self {
            MemberSlot::Signed(sig) => Some(sig),
            MemberSlot::Signing { previous } => previous.as_ref(),
            MemberSlot::NotSigned => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CollectionPhase {
    Unsigned,
    PresidentPending,
    PresidentSigned,
    SecretaryPending,
    SecretarySigned,
    ReadyToFinalize,
}

/// A condómino present at the meeting and allowed to sign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentMember {
    pub member_id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
struct MemberEntry {
    member: PresentMember,
    slot: MemberSlot,
}

/// Which upsert of a finalize run failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistStage {
    President,
    Secretary,
    Member { member_id: Uuid, name: String },
}

impl fmt::Display for PersistStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistStage::President => write!(f, "Presidente"),
            PersistStage::Secretary => write!(f, "Secretário"),
            PersistStage::Member { name, .. } => write!(f, "condómino {name}"),
        }
    }
}

/// What the rollback of a failed finalize achieved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompensationOutcome {
    /// Signatures created in this run and removed again.
    pub reverted: Vec<PersistStage>,
    /// Removals that failed; these signatures are still stored.
    pub failed: Vec<(PersistStage, GatewayError)>,
    /// Pre-existing signatures overwritten in this run; the old ones are lost.
    pub replaced: Vec<PersistStage>,
}

impl CompensationOutcome {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.replaced.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FinalizeError {
    /// President and secretary must both have signed.
    NotReady,
    Persistence {
        stage: PersistStage,
        source: GatewayError,
        compensation: CompensationOutcome,
    },
    Minute(MinuteError),
}

impl fmt::Display for FinalizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinalizeError::NotReady => {
                write!(f, "Ambos o Presidente e o Secretário devem assinar a acta")
            }
            FinalizeError::Persistence { stage, source, compensation } => {
                write!(f, "Erro ao guardar a assinatura ({stage}): {source}")?;
                if !compensation.failed.is_empty() {
                    write!(
                        f,
                        ". {} assinatura(s) ficaram guardadas e devem ser revistas",
                        compensation.failed.len()
                    )?;
                }
                if !compensation.replaced.is_empty() {
                    write!(
                        f,
                        ". {} assinatura(s) anteriores foram substituídas",
                        compensation.replaced.len()
                    )?;
                }
                Ok(())
            }
            FinalizeError::Minute(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for FinalizeError {}

impl From<MinuteError> for FinalizeError {
    fn from(e: MinuteError) -> Self {
        FinalizeError::Minute(e)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FinalizeReport {
    pub integrity: IntegrityRecord,
    pub member_count: usize,
    /// Slots that already had a signature and were overwritten.
    pub replaced: usize,
    pub signatures: Vec<Signature>,
}

impl FinalizeReport {
    /// "Presidente + Secretário + N condóminos".
    pub fn summary(&self) -> String {
        match self.member_count {
            0 => "Presidente + Secretário".to_string(),
            1 => "Presidente + Secretário + 1 condómino".to_string(),
            n => format!("Presidente + Secretário + {n} condóminos"),
        }
    }
}

/// Collects the signatures of one minute and persists them on finalize.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureCollector {
    minute: MinuteDocument,
    president: RoleSlot,
    secretary: RoleSlot,
    members: Vec<MemberEntry>,
}

impl SignatureCollector {
    /// `present` comes from the attendance records; it is not owned here.
    pub fn new(minute: MinuteDocument, present: Vec<PresentMember>) -> Self {
        SignatureCollector {
            minute,
            president: RoleSlot::Unsigned,
            secretary: RoleSlot::Unsigned,
            members: present
                .into_iter()
                .map(|member| MemberEntry { member, slot: MemberSlot::NotSigned })
                .collect(),
        }
    }

    pub fn minute(&self) -> &MinuteDocument {
        &self.minute
    }

    pub fn into_minute(self) -> MinuteDocument {
        self.minute
    }

    pub fn slot(&self, role: SignerRole) -> &RoleSlot {
        match role {
            SignerRole::President => &self.president,
            SignerRole::Secretary => &self.secretary,
        }
    }

    fn slot_mut(&mut self, role: SignerRole) -> &mut RoleSlot {
        match role {
            SignerRole::President => &mut self.president,
            SignerRole::Secretary => &mut self.secretary,
        }
    }

    pub fn member_slot(&self, member_id: Uuid) -> Option<&MemberSlot> {
        self.members
            .iter()
            .find(|e| e.member.member_id == member_id)
            .map(|e| &e.slot)
    }

    pub fn present_members(&self) -> impl Iterator<Item = &PresentMember> {
        self.members.iter().map(|e| &e.member)
    }

    fn ensure_open(&self) -> Result<(), ValidationError> {
        if self.minute.status == MinuteStatus::Finalized {
            return Err(ValidationError("A acta já foi finalizada".to_string()));
        }
        Ok(())
    }

    /// Open the capture surface for a mandatory signer.
    pub fn begin_sign(&mut self, role: SignerRole, name: &str) -> Result<(), ValidationError> {
        self.ensure_open()?;
        let name = name.trim();
        if name.is_empty() {
            return Err(missing_name(role));
        }
        let previous = self.slot(role).signature().cloned();
        *self.slot_mut(role) = RoleSlot::Pending {
            name: name.to_string(),
            previous,
        };
        Ok(())
    }

    /// Close the capture surface without a new image.
    pub fn cancel_sign(&mut self, role: SignerRole) {
        let slot = self.slot_mut(role);
        if let RoleSlot::Pending { previous, .. } = &mut *slot {
            *slot = match previous.take() {
                Some(sig) => RoleSlot::Signed(sig),
                None => RoleSlot::Unsigned,
            };
        }
    }

    /// Store the captured image. Calling it again overwrites the signature.
    pub fn complete_sign(&mut self, role: SignerRole, image: &str) -> Result<(), ValidationError> {
        self.ensure_open()?;
        if image.trim().is_empty() {
            return Err(ValidationError("A assinatura está vazia".to_string()));
        }
        let name = match self.slot(role) {
            RoleSlot::Pending { name, .. } => name.clone(),
            RoleSlot::Signed(sig) => sig.signer_name.clone(),
            RoleSlot::Unsigned => return Err(missing_name(role)),
        };
        *self.slot_mut(role) = RoleSlot::Signed(Signature {
            signer_type: role.signer_type(),
            signer_name: name,
            signature_image: image.to_string(),
            signed_at: Utc::now(),
            member_id: None,
        });
        Ok(())
    }

    pub fn begin_member_sign(&mut self, member_id: Uuid) -> Result<(), ValidationError> {
        self.ensure_open()?;
        let entry = self
            .members
            .iter_mut()
            .find(|e| e.member.member_id == member_id)
            .ok_or_else(|| ValidationError("O condómino não consta da lista de presenças".to_string()))?;
        let previous = entry.slot.signature().cloned();
        entry.slot = MemberSlot::Signing { previous };
        Ok(())
    }

    pub fn cancel_member_sign(&mut self, member_id: Uuid) {
        if let Some(entry) = self.members.iter_mut().find(|e| e.member.member_id == member_id) {
            if let MemberSlot::Signing { previous } = &mut entry.slot {
                entry.slot = match previous.take() {
                    Some(sig) => MemberSlot::Signed(sig),
                    None => MemberSlot::NotSigned,
                };
            }
        }
    }

    pub fn complete_member_sign(&mut self, member_id: Uuid, image: &str) -> Result<(), ValidationError> {
        self.ensure_open()?;
        if image.trim().is_empty() {
            return Err(ValidationError("A assinatura está vazia".to_string()));
        }
        let entry = self
            .members
            .iter_mut()
            .find(|e| e.member.member_id == member_id)
            .ok_or_else(|| ValidationError("O condómino não consta da lista de presenças".to_string()))?;
        if entry.slot == MemberSlot::NotSigned {
            return Err(ValidationError(format!(
                "Inicie primeiro a assinatura de {}",
                entry.member.name
            )));
        }
        entry.slot = MemberSlot::Signed(Signature {
            signer_type: SignerType::Member,
            signer_name: entry.member.name.clone(),
            signature_image: image.to_string(),
            signed_at: Utc::now(),
            member_id: Some(member_id),
        });
        Ok(())
    }

    fn signed(&self, role: SignerRole) -> Option<&Signature> {
        self.slot(role)
            .signature()
            .filter(|sig| !sig.signer_name.trim().is_empty() && !sig.signature_image.trim().is_empty())
    }

    /// Both mandatory names and images present. Members never gate this.
    pub fn can_finalize(&self) -> bool {
        self.signed(SignerRole::President).is_some() && self.signed(SignerRole::Secretary).is_some()
    }

    pub fn phase(&self) -> CollectionPhase {
        use RoleSlot::*;
        match (&self.president, &self.secretary) {
            _ if self.can_finalize() => CollectionPhase::ReadyToFinalize,
            (_, Pending { .. }) => CollectionPhase::SecretaryPending,
            (Pending { .. }, _) => CollectionPhase::PresidentPending,
            (Signed(_), _) => CollectionPhase::PresidentSigned,
            (_, Signed(_)) => CollectionPhase::SecretarySigned,
            _ => CollectionPhase::Unsigned,
        }
    }

    pub fn signed_members(&self) -> Vec<&Signature> {
        self.members
            .iter()
            .filter_map(|e| e.slot.signature())
            .collect()
    }

    /// Every completed signature in persistence order.
    pub fn signatures(&self) -> Vec<Signature> {
        let mut out: Vec<Signature> = [SignerRole::President, SignerRole::Secretary]
            .into_iter()
            .filter_map(|role| self.signed(role).cloned())
            .collect();
        out.extend(self.signed_members().into_iter().cloned());
        out
    }

    pub async fn finalize(&mut self, gateway: &dyn SignatureGateway) -> Result<FinalizeReport, FinalizeError> {
        self.finalize_with(gateway, &IntegrityHasher::new()).await
    }

    /// Hash, persist president, secretary and members one at a time, then mark
    /// the minute signed. On any failure the signatures created in this run are
    /// removed again and the minute keeps its status.
    pub async fn finalize_with<D: DocumentDigest>(
        &mut self,
        gateway: &dyn SignatureGateway,
        hasher: &IntegrityHasher<D>,
    ) -> Result<FinalizeReport, FinalizeError> {
        let (president, secretary) = match (
            self.signed(SignerRole::President),
            self.signed(SignerRole::Secretary),
        ) {
            (Some(p), Some(s)) => (p.clone(), s.clone()),
            _ => return Err(FinalizeError::NotReady),
        };
        if self.minute.status == MinuteStatus::Finalized {
            return Err(MinuteError::InvalidTransition {
                from: MinuteStatus::Finalized,
                to: MinuteStatus::Signed,
            }
            .into());
        }

        let integrity = hasher.record(&self.minute, Utc::now());

        let mut plan = vec![
            (PersistStage::President, president.clone()),
            (PersistStage::Secretary, secretary.clone()),
        ];
        for entry in &self.members {
            if let Some(sig) = entry.slot.signature() {
                plan.push((
                    PersistStage::Member {
                        member_id: entry.member.member_id,
                        name: entry.member.name.clone(),
                    },
                    sig.clone(),
                ));
            }
        }

        let minute_id = self.minute.id;
        let mut persisted: Vec<(PersistStage, UpsertOutcome)> = Vec::with_capacity(plan.len());
        for (stage, sig) in &plan {
            match gateway.upsert(minute_id, &sig.to_new_signature()).await {
                Ok(outcome) => {
                    log::info!(
                        "Stored {} signature for minute {} ({})",
                        sig.signer_type.as_str(),
                        self.minute.minute_number,
                        if outcome.created { "new" } else { "replaced" }
                    );
                    persisted.push((stage.clone(), outcome));
                }
                Err(source) => {
                    log::error!(
                        "Failed to store signature of {stage} for minute {}: {source}",
                        self.minute.minute_number
                    );
                    let compensation = compensate(gateway, minute_id, persisted).await;
                    return Err(FinalizeError::Persistence {
                        stage: stage.clone(),
                        source,
                        compensation,
                    });
                }
            }
        }

        self.minute.mark_signed(&president, &secretary)?;

        let report = FinalizeReport {
            integrity,
            member_count: plan.len() - 2,
            replaced: persisted.iter().filter(|(_, o)| !o.created).count(),
            signatures: plan.into_iter().map(|(_, sig)| sig).collect(),
        };
        log::info!(
            "Minute {} signed: {}",
            self.minute.minute_number,
            report.summary()
        );
        Ok(report)
    }
}

/// Undo the upserts of a failed run, newest first.
async fn compensate(
    gateway: &dyn SignatureGateway,
    minute_id: Uuid,
    persisted: Vec<(PersistStage, UpsertOutcome)>,
) -> CompensationOutcome {
    let mut outcome = CompensationOutcome::default();
    for (stage, upsert) in persisted.into_iter().rev() {
        if !upsert.created {
            log::warn!("Signature of {stage} replaced an earlier one and cannot be restored");
            outcome.replaced.push(stage);
            continue;
        }
        match gateway.remove(minute_id, upsert.signature_id).await {
            Ok(()) => outcome.reverted.push(stage),
            Err(e) => {
                log::error!("Failed to remove signature of {stage} after aborted finalize: {e}");
                outcome.failed.push((stage, e));
            }
        }
    }
    outcome
}
