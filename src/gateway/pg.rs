use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{GatewayError, SignatureGateway, UpsertOutcome};
use crate::models::signature::{self, NewSignature};

/// Gateway that writes straight to `minute_signatures`.
#[derive(Clone)]
pub struct PgSignatureGateway {
    pool: PgPool,
}

impl PgSignatureGateway {
    pub fn new(pool: PgPool) -> Self {
        PgSignatureGateway { pool }
    }
}

#[async_trait]
impl SignatureGateway for PgSignatureGateway {
    async fn upsert(&self, minute_id: Uuid, sig: &NewSignature) -> Result<UpsertOutcome, GatewayError> {
        if let Some(msg) = sig.validate() {
            return Err(GatewayError::Rejected(msg));
        }
        let (stored, created) = signature::upsert(&self.pool, minute_id, sig).await?;
        Ok(UpsertOutcome {
            signature_id: stored.id,
            created,
        })
    }

    async fn remove(&self, minute_id: Uuid, signature_id: Uuid) -> Result<(), GatewayError> {
        if signature::delete(&self.pool, minute_id, signature_id).await? {
            Ok(())
        } else {
            Err(GatewayError::Rejected("Assinatura não encontrada".to_string()))
        }
    }
}
