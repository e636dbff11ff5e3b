use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::signature::{NewSignature, SignatureStatus, StoredSignature};

/// Signatures of one minute.
#[derive(Serialize, Debug, Clone)]
pub struct SignatureListData {
    pub signatures: Vec<StoredSignature>,
    pub count: usize,
}

/// Result of a single upsert. `id` and `created` are what gateway clients read.
#[derive(Serialize, Debug, Clone)]
pub struct UpsertResponseData {
    pub id: Uuid,
    pub created: bool,
    pub signature: StoredSignature,
}

/// All-or-nothing upsert of several signatures.
#[derive(Deserialize, Debug)]
pub struct BatchRequest {
    pub signatures: Vec<NewSignature>,
}

#[derive(Serialize, Debug, Clone)]
pub struct BatchResponseData {
    pub signatures: Vec<StoredSignature>,
    pub created: usize,
    pub replaced: usize,
    pub status: SignatureStatus,
}

/// `?archive=true` stores the PDF under the configured directory instead of
/// streaming it back.
#[derive(Deserialize, Debug, Default)]
pub struct RenderQuery {
    #[serde(default)]
    pub archive: bool,
}

#[derive(Serialize, Debug, Clone)]
pub struct DocumentSavedData {
    pub file_name: String,
    pub path: String,
    pub page_count: usize,
    pub warnings: Vec<String>,
    pub backend: &'static str,
}
