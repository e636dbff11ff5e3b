pub mod documents;
pub mod signatures;

use actix_web::{
    Error, HttpResponse,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    error::InternalError,
    middleware::Next,
    web,
};

use crate::gateway::ApiEnvelope;

/// Signature images arrive inline as base64, so bodies can be large.
pub const JSON_LIMIT: usize = 10 * 1024 * 1024;

/// Rejects POST/PUT/DELETE requests without `Content-Type: application/json`.
/// GET requests are exempt.
async fn require_json_content_type(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let method = req.method().clone();

    if method == actix_web::http::Method::POST
        || method == actix_web::http::Method::PUT
        || method == actix_web::http::Method::DELETE
    {
        let content_type = req
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if !content_type.starts_with("application/json") {
            let response = HttpResponse::BadRequest().json(ApiEnvelope::<()>::failure(
                "Content-Type deve ser application/json",
            ));
            return Ok(req.into_response(response).map_into_right_body());
        }
    }

    next.call(req).await.map(|res| res.map_into_left_body())
}

/// Malformed bodies get the same envelope as every other error.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT)
        .error_handler(|err, _req| {
            let message = format!("Pedido inválido: {err}");
            InternalError::from_response(
                err,
                HttpResponse::BadRequest().json(ApiEnvelope::<()>::failure(message)),
            )
            .into()
        })
}

/// Configure `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/minutes/{minute_id}/signatures")
            .wrap(actix_web::middleware::from_fn(require_json_content_type))
            .route("", web::get().to(signatures::list))
            .route("/status", web::get().to(signatures::status))
            .route("/upsert", web::post().to(signatures::upsert))
            .route("/batch", web::post().to(signatures::batch))
            .route("/{signature_id}", web::delete().to(signatures::delete)),
    );
    cfg.service(
        web::scope("/documents")
            .wrap(actix_web::middleware::from_fn(require_json_content_type))
            .route("/acta", web::post().to(documents::acta))
            .route("/convocatoria", web::post().to(documents::convocatoria))
            .route("/convocatoria/preview", web::post().to(documents::convocatoria_preview)),
    );
}
