//! Signature persistence seen from the signing workflow.
//!
//! One call per signer; each call is atomic on its own. The workflow decides
//! what to do when a later call fails.

pub mod envelope;
pub mod http;
pub mod pg;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::models::signature::NewSignature;

pub use envelope::ApiEnvelope;
pub use http::HttpSignatureGateway;
pub use pg::PgSignatureGateway;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertOutcome {
    #[serde(rename = "id")]
    pub signature_id: Uuid,
    /// False when an existing signature for the same slot was replaced.
    pub created: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The request never got a usable answer.
    Transport(String),
    /// The store answered and refused; carries its message.
    Rejected(String),
    /// The answer did not have the expected envelope shape.
    Decode(String),
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::Transport(e) => write!(f, "Erro de comunicação: {e}"),
            GatewayError::Rejected(e) => write!(f, "{e}"),
            GatewayError::Decode(e) => write!(f, "Resposta inválida do servidor: {e}"),
        }
    }
}

impl std::error::Error for GatewayError {}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        GatewayError::Transport(e.to_string())
    }
}

impl From<sqlx::Error> for GatewayError {
    fn from(e: sqlx::Error) -> Self {
        GatewayError::Transport(e.to_string())
    }
}

#[async_trait]
pub trait SignatureGateway: Send + Sync {
    /// Insert or replace the signature for `(minute_id, signer_type, member_id)`.
    async fn upsert(&self, minute_id: Uuid, signature: &NewSignature) -> Result<UpsertOutcome, GatewayError>;

    /// Delete a signature. Used to undo upserts of a failed finalize.
    async fn remove(&self, minute_id: Uuid, signature_id: Uuid) -> Result<(), GatewayError>;
}
