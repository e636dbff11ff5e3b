//! Tamper evidence for signed minutes.
//!
//! The digest covers the fields that must not change once the minutes are
//! signed: number, building, meeting date, agenda and the creation stamp. The
//! payload is canonical JSON (object keys sorted) so the same minute always
//! hashes to the same value.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::models::minutes::MinuteDocument;

pub const MANUAL_PREFIX: &str = "MANUAL-";

/// The digest primitive could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashComputationError(pub String);

impl fmt::Display for HashComputationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash computation failed: {}", self.0)
    }
}

impl std::error::Error for HashComputationError {}

impl From<serde_json::Error> for HashComputationError {
    fn from(e: serde_json::Error) -> Self {
        HashComputationError(e.to_string())
    }
}

/// A 256-bit digest rendered as lowercase hex.
pub trait DocumentDigest: Send + Sync {
    fn digest_hex(&self, bytes: &[u8]) -> Result<String, HashComputationError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Digest;

impl DocumentDigest for Sha256Digest {
    fn digest_hex(&self, bytes: &[u8]) -> Result<String, HashComputationError> {
        Ok(hex::encode(Sha256::digest(bytes)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrityMode {
    Sha256,
    /// `MANUAL-<epoch millis>` placeholder; not reproducible.
    ManualFallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrityRecord {
    /// The minute id, printed as a short stamp on every page.
    pub document_code: String,
    pub document_hash: String,
    pub mode: IntegrityMode,
    /// Creation stamp that went into the digest.
    pub created_at: DateTime<Utc>,
}

impl IntegrityRecord {
    pub fn is_degraded(&self) -> bool {
        self.mode == IntegrityMode::ManualFallback
    }

    pub fn short_code(&self) -> String {
        self.document_code.chars().take(8).collect()
    }

    pub fn short_hash(&self) -> String {
        self.document_hash.chars().take(16).collect()
    }

    /// Recompute a degraded record with SHA-256, keeping the original stamp so
    /// the result matches any later verification of the same minute.
    pub fn rehash(&self, minute: &MinuteDocument) -> Result<IntegrityRecord, HashComputationError> {
        let payload = canonical_payload(minute, self.created_at)?;
        Ok(IntegrityRecord {
            document_code: minute.id.to_string(),
            document_hash: Sha256Digest.digest_hex(&payload)?,
            mode: IntegrityMode::Sha256,
            created_at: self.created_at,
        })
    }
}

/// Canonical bytes for the immutable part of a minute.
pub fn canonical_payload(
    minute: &MinuteDocument,
    created_at: DateTime<Utc>,
) -> Result<Vec<u8>, HashComputationError> {
    let value = serde_json::json!({
        "minute_number": minute.minute_number,
        "building_id": minute.building_id,
        "meeting_date": minute.meeting_date.format("%Y-%m-%d").to_string(),
        "agenda_items": minute.agenda_items,
        "created_at": created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
    });
    Ok(serde_json::to_vec(&normalize(value))?)
}

fn normalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> =
                map.into_iter().map(|(k, v)| (k, normalize(v))).collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().collect::<Map<_, _>>())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(normalize).collect()),
        other => other,
    }
}

/// SHA-256 over the canonical payload. Uses `created_at` from the minute, or
/// the current time when the minute has none.
pub fn compute_hash(minute: &MinuteDocument) -> Result<String, HashComputationError> {
    let created_at = minute.created_at.unwrap_or_else(Utc::now);
    Sha256Digest.digest_hex(&canonical_payload(minute, created_at)?)
}

pub struct IntegrityHasher<D: DocumentDigest = Sha256Digest> {
    digest: D,
}

impl IntegrityHasher<Sha256Digest> {
    pub fn new() -> Self {
        IntegrityHasher { digest: Sha256Digest }
    }
}

impl Default for IntegrityHasher<Sha256Digest> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: DocumentDigest> IntegrityHasher<D> {
    pub fn with_digest(digest: D) -> Self {
        IntegrityHasher { digest }
    }

    /// Build the integrity record for `minute`. Never fails: when the digest is
    /// unavailable the record degrades to `MANUAL-<millis>` and says so.
    pub fn record(&self, minute: &MinuteDocument, now: DateTime<Utc>) -> IntegrityRecord {
        let created_at = minute.created_at.unwrap_or(now);
        let hashed = canonical_payload(minute, created_at)
            .and_then(|payload| self.digest.digest_hex(&payload));

        match hashed {
            Ok(document_hash) => IntegrityRecord {
                document_code: minute.id.to_string(),
                document_hash,
                mode: IntegrityMode::Sha256,
                created_at,
            },
            Err(e) => {
                log::warn!(
                    "Integrity hash unavailable for minute {} ({e}); using non-cryptographic placeholder",
                    minute.minute_number
                );
                IntegrityRecord {
                    document_code: minute.id.to_string(),
                    document_hash: format!("{MANUAL_PREFIX}{}", now.timestamp_millis()),
                    mode: IntegrityMode::ManualFallback,
                    created_at,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalize_orders_nested_keys() {
        let value = normalize(json!({"z": 1, "a": {"d": 4, "b": 2}, "arr": [{"k2": 2, "k1": 1}]}));
        let text = serde_json::to_string(&value).expect("json");
        assert_eq!(text, r#"{"a":{"b":2,"d":4},"arr":[{"k1":1,"k2":2}],"z":1}"#);
    }

    #[test]
    fn short_forms_truncate() {
        let record = IntegrityRecord {
            document_code: "0123456789abcdef".to_string(),
            document_hash: "f".repeat(64),
            mode: IntegrityMode::Sha256,
            created_at: Utc::now(),
        };
        assert_eq!(record.short_code(), "01234567");
        assert_eq!(record.short_hash().len(), 16);
        assert!(!record.is_degraded());
    }
}
