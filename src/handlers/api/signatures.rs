use actix_web::{HttpResponse, web};
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::gateway::ApiEnvelope;
use crate::models::signature::{self, NewSignature};
use crate::templates_structs::{
    BatchRequest, BatchResponseData, SignatureListData, UpsertResponseData,
};

/// GET /api/minutes/{minute_id}/signatures
pub async fn list(pool: web::Data<PgPool>, path: web::Path<Uuid>) -> Result<HttpResponse, AppError> {
    let minute_id = path.into_inner();
    let signatures = signature::find_by_minute(&pool, minute_id).await?;
    let count = signatures.len();
    Ok(HttpResponse::Ok().json(ApiEnvelope::ok(SignatureListData { signatures, count })))
}

/// GET /api/minutes/{minute_id}/signatures/status
pub async fn status(pool: web::Data<PgPool>, path: web::Path<Uuid>) -> Result<HttpResponse, AppError> {
    let status = signature::check_required(&pool, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiEnvelope::ok(status)))
}

/// POST /api/minutes/{minute_id}/signatures/upsert
pub async fn upsert(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
    body: web::Json<NewSignature>,
) -> Result<HttpResponse, AppError> {
    let minute_id = path.into_inner();
    let sig = body.into_inner();
    if let Some(msg) = sig.validate() {
        return Err(AppError::Validation(msg));
    }

    let (stored, created) = signature::upsert(pool.get_ref(), minute_id, &sig).await?;
    log::info!(
        "Signature {} ({}) {} for minute {minute_id}",
        stored.id,
        stored.signer_type.as_str(),
        if created { "created" } else { "replaced" }
    );

    let message = if created { "Assinatura registada" } else { "Assinatura atualizada" };
    Ok(HttpResponse::Ok().json(
        ApiEnvelope::ok(UpsertResponseData {
            id: stored.id,
            created,
            signature: stored,
        })
        .with_message(message),
    ))
}

fn validate_batch(signatures: &[NewSignature]) -> Option<String> {
    if signatures.is_empty() {
        return Some("Nenhuma assinatura enviada".to_string());
    }
    signatures
        .iter()
        .enumerate()
        .find_map(|(i, sig)| sig.validate().map(|msg| format!("Assinatura {}: {msg}", i + 1)))
}

/// POST /api/minutes/{minute_id}/signatures/batch
///
/// All-or-nothing: either every signature is stored or none is.
pub async fn batch(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
    body: web::Json<BatchRequest>,
) -> Result<HttpResponse, AppError> {
    let minute_id = path.into_inner();
    let request = body.into_inner();
    if let Some(msg) = validate_batch(&request.signatures) {
        return Err(AppError::Validation(msg));
    }

    let stored = signature::upsert_batch(&pool, minute_id, &request.signatures).await?;
    let created = stored.iter().filter(|(_, created)| *created).count();
    let replaced = stored.len() - created;
    let status = signature::check_required(&pool, minute_id).await?;
    log::info!("Stored {} signatures for minute {minute_id} ({created} new)", stored.len());

    Ok(HttpResponse::Ok().json(ApiEnvelope::ok(BatchResponseData {
        signatures: stored.into_iter().map(|(sig, _)| sig).collect(),
        created,
        replaced,
        status,
    })))
}

/// DELETE /api/minutes/{minute_id}/signatures/{signature_id}
pub async fn delete(
    pool: web::Data<PgPool>,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
    let (minute_id, signature_id) = path.into_inner();
    if !signature::delete(&pool, minute_id, signature_id).await? {
        return Err(AppError::NotFound("Assinatura não encontrada".to_string()));
    }
    log::info!("Signature {signature_id} removed from minute {minute_id}");
    Ok(HttpResponse::Ok().json(
        ApiEnvelope::ok(serde_json::json!({ "id": signature_id })).with_message("Assinatura removida"),
    ))
}
