use async_trait::async_trait;
use uuid::Uuid;

use super::{ApiEnvelope, GatewayError, SignatureGateway, UpsertOutcome};
use crate::models::signature::NewSignature;

/// Gateway over the signature REST endpoints of a running service.
#[derive(Clone)]
pub struct HttpSignatureGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSignatureGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        HttpSignatureGateway { client, base_url }
    }

    fn signatures_url(&self, minute_id: Uuid) -> String {
        format!("{}/api/minutes/{minute_id}/signatures", self.base_url)
    }

    async fn read_envelope<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<ApiEnvelope<T>, GatewayError> {
        let status = response.status();
        let body = response.bytes().await?;
        match ApiEnvelope::parse(&body) {
            Ok(envelope) => Ok(envelope),
            Err(_) if !status.is_success() => Err(GatewayError::Rejected(format!("HTTP {status}"))),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl SignatureGateway for HttpSignatureGateway {
    async fn upsert(&self, minute_id: Uuid, signature: &NewSignature) -> Result<UpsertOutcome, GatewayError> {
        let response = self
            .client
            .post(format!("{}/upsert", self.signatures_url(minute_id)))
            .json(signature)
            .send()
            .await?;
        Self::read_envelope::<UpsertOutcome>(response).await?.into_result()
    }

    async fn remove(&self, minute_id: Uuid, signature_id: Uuid) -> Result<(), GatewayError> {
        let response = self
            .client
            .delete(format!("{}/{signature_id}", self.signatures_url(minute_id)))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await?;
        Self::read_envelope::<serde_json::Value>(response).await?.into_ack()
    }
}
