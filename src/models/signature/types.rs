use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Who is signing the minutes. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignerType {
    President,
    Secretary,
    Member,
}

impl SignerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignerType::President => "president",
            SignerType::Secretary => "secretary",
            SignerType::Member => "member",
        }
    }
}

impl FromStr for SignerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "president" => Ok(SignerType::President),
            "secretary" => Ok(SignerType::Secretary),
            "member" => Ok(SignerType::Member),
            _ => Err(INVALID_SIGNER_TYPE.to_string()),
        }
    }
}

pub const INVALID_SIGNER_TYPE: &str = "signer_type deve ser \"president\", \"secretary\" ou \"member\"";

/// A captured signature held in memory by the signing workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    pub signer_type: SignerType,
    pub signer_name: String,
    /// Base64 raster, usually a `data:image/png;base64,` URL.
    pub signature_image: String,
    pub signed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_id: Option<Uuid>,
}

impl Signature {
    pub fn to_new_signature(&self) -> NewSignature {
        NewSignature {
            signer_type: self.signer_type,
            signer_name: self.signer_name.clone(),
            signature: self.signature_image.clone(),
            member_id: self.member_id,
            signed_at: Some(self.signed_at),
        }
    }
}

/// Request body for the upsert endpoints and the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSignature {
    pub signer_type: SignerType,
    pub signer_name: String,
    pub signature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_at: Option<DateTime<Utc>>,
}

impl NewSignature {
    /// Returns the first problem found, phrased for the operator.
    pub fn validate(&self) -> Option<String> {
        if self.signer_name.trim().is_empty() {
            return Some("signer_name é obrigatório".to_string());
        }
        if self.signature.trim().is_empty() {
            return Some("signature é obrigatória".to_string());
        }
        match (self.signer_type, self.member_id) {
            (SignerType::Member, None) => {
                Some("member_id é obrigatório para assinaturas de condóminos".to_string())
            }
            (SignerType::President | SignerType::Secretary, Some(_)) => {
                Some("member_id só é permitido para assinaturas de condóminos".to_string())
            }
            _ => None,
        }
    }
}

/// Raw `minute_signatures` row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SignatureRow {
    pub id: Uuid,
    pub minute_id: Uuid,
    pub member_id: Option<Uuid>,
    pub signer_type: String,
    pub signer_name: String,
    pub signature: String,
    pub signed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A persisted signature with a typed signer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredSignature {
    pub id: Uuid,
    pub minute_id: Uuid,
    pub member_id: Option<Uuid>,
    pub signer_type: SignerType,
    pub signer_name: String,
    pub signature: String,
    pub signed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<SignatureRow> for StoredSignature {
    type Error = String;

    fn try_from(row: SignatureRow) -> Result<Self, Self::Error> {
        Ok(StoredSignature {
            id: row.id,
            minute_id: row.minute_id,
            member_id: row.member_id,
            signer_type: row.signer_type.parse()?,
            signer_name: row.signer_name,
            signature: row.signature,
            signed_at: row.signed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Row returned by an upsert: the stored signature plus whether it was new.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UpsertRow {
    #[sqlx(flatten)]
    pub row: SignatureRow,
    pub created: bool,
}

/// Which mandatory signatures a minute already carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SignatureStatus {
    pub has_president: bool,
    pub has_secretary: bool,
    pub is_complete: bool,
}

impl SignatureStatus {
    pub fn new(has_president: bool, has_secretary: bool) -> Self {
        SignatureStatus {
            has_president,
            has_secretary,
            is_complete: has_president && has_secretary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_sig(signer_type: SignerType, member_id: Option<Uuid>) -> NewSignature {
        NewSignature {
            signer_type,
            signer_name: "Ana Silva".to_string(),
            signature: "data:image/png;base64,AAAA".to_string(),
            member_id,
            signed_at: None,
        }
    }

    #[test]
    fn signer_type_parses_closed_set() {
        assert_eq!("president".parse::<SignerType>(), Ok(SignerType::President));
        assert_eq!("member".parse::<SignerType>(), Ok(SignerType::Member));
        assert_eq!("admin".parse::<SignerType>(), Err(INVALID_SIGNER_TYPE.to_string()));
    }

    #[test]
    fn member_id_required_only_for_members() {
        assert!(new_sig(SignerType::President, None).validate().is_none());
        assert!(new_sig(SignerType::Member, Some(Uuid::new_v4())).validate().is_none());
        assert!(new_sig(SignerType::Member, None).validate().is_some());
        assert!(new_sig(SignerType::Secretary, Some(Uuid::new_v4())).validate().is_some());
    }

    #[test]
    fn blank_fields_are_rejected() {
        let mut sig = new_sig(SignerType::President, None);
        sig.signer_name = "   ".to_string();
        assert_eq!(sig.validate().as_deref(), Some("signer_name é obrigatório"));

        let mut sig = new_sig(SignerType::President, None);
        sig.signature.clear();
        assert_eq!(sig.validate().as_deref(), Some("signature é obrigatória"));
    }

    #[test]
    fn status_complete_needs_both() {
        assert!(!SignatureStatus::new(true, false).is_complete);
        assert!(SignatureStatus::new(true, true).is_complete);
    }
}
