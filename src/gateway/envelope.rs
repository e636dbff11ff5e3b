use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::GatewayError;

/// The one response shape used by every JSON endpoint:
/// `{success, data?, error?, message?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default = "none", skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn none<T>() -> Option<T> {
    None
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: T) -> Self {
        ApiEnvelope {
            success: true,
            data: Some(data),
            error: None,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn failure(error: impl Into<String>) -> Self {
        ApiEnvelope {
            success: false,
            data: None,
            error: Some(error.into()),
            message: None,
        }
    }

    fn rejection(&mut self) -> GatewayError {
        let reason = self
            .error
            .take()
            .or_else(|| self.message.take())
            .unwrap_or_else(|| "Pedido rejeitado pelo servidor".to_string());
        GatewayError::Rejected(reason)
    }

    /// Success with a payload, or the upstream error.
    pub fn into_result(mut self) -> Result<T, GatewayError> {
        if !self.success {
            return Err(self.rejection());
        }
        self.data
            .ok_or_else(|| GatewayError::Decode("campo 'data' em falta".to_string()))
    }

    /// Success regardless of payload, or the upstream error.
    pub fn into_ack(mut self) -> Result<(), GatewayError> {
        if self.success {
            Ok(())
        } else {
            Err(self.rejection())
        }
    }
}

impl<T: DeserializeOwned> ApiEnvelope<T> {
    pub fn parse(bytes: &[u8]) -> Result<Self, GatewayError> {
        serde_json::from_slice(bytes).map_err(|e| GatewayError::Decode(e.to_string()))
    }
}
