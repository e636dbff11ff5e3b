use actix_web::http::header::{
    Charset, ContentDisposition, DispositionParam, DispositionType, ExtendedValue,
};
use actix_web::{HttpResponse, web};

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::gateway::ApiEnvelope;
use crate::models::acta::ActaDocument;
use crate::models::convocatoria::ConvocatoriaData;
use crate::pdf::{self, ConvocatoriaRenderer, RenderMode, RenderOutput, RenderedDocument};
use crate::templates_structs::{DocumentSavedData, RenderQuery};

pub const WARNINGS_HEADER: &str = "X-Render-Warnings";
pub const BACKEND_HEADER: &str = "X-Render-Backend";

/// `filename` carries an ASCII fallback, `filename*` the real UTF-8 name.
fn attachment(file_name: &str) -> ContentDisposition {
    let ascii: String = file_name
        .chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '_' })
        .collect();
    ContentDisposition {
        disposition: DispositionType::Attachment,
        parameters: vec![
            DispositionParam::Filename(ascii),
            DispositionParam::FilenameExt(ExtendedValue {
                charset: Charset::Ext("UTF-8".to_string()),
                language_tag: None,
                value: file_name.as_bytes().to_vec(),
            }),
        ],
    }
}

fn render_mode(query: &RenderQuery, config: &AppConfig) -> RenderMode {
    if query.archive {
        RenderMode::Download {
            dir: config.pdf_output_dir.clone(),
        }
    } else {
        RenderMode::ReturnBytes
    }
}

fn document_response(doc: RenderedDocument) -> HttpResponse {
    for warning in &doc.warnings {
        log::warn!("{}: {warning}", doc.file_name);
    }
    match doc.output {
        RenderOutput::Bytes(bytes) => HttpResponse::Ok()
            .content_type("application/pdf")
            .insert_header(attachment(&doc.file_name))
            .insert_header((WARNINGS_HEADER, doc.warnings.len().to_string()))
            .insert_header((BACKEND_HEADER, doc.backend))
            .body(bytes),
        RenderOutput::Saved(path) => HttpResponse::Ok().json(
            ApiEnvelope::ok(DocumentSavedData {
                path: path.display().to_string(),
                file_name: doc.file_name,
                page_count: doc.page_count,
                warnings: doc.warnings,
                backend: doc.backend,
            })
            .with_message("Documento guardado"),
        ),
    }
}

/// POST /api/documents/acta
pub async fn acta(
    config: web::Data<AppConfig>,
    query: web::Query<RenderQuery>,
    body: web::Json<ActaDocument>,
) -> Result<HttpResponse, AppError> {
    let doc = body.into_inner();
    if doc.acta.minute_number.trim().is_empty() {
        return Err(AppError::Validation("O número da acta é obrigatório".to_string()));
    }
    let rendered = pdf::render_acta(&doc, &render_mode(&query, &config))?;
    Ok(document_response(rendered))
}

/// POST /api/documents/convocatoria
pub async fn convocatoria(
    config: web::Data<AppConfig>,
    renderer: web::Data<ConvocatoriaRenderer>,
    query: web::Query<RenderQuery>,
    body: web::Json<ConvocatoriaData>,
) -> Result<HttpResponse, AppError> {
    let data = body.into_inner();
    if let Some(msg) = data.validate() {
        return Err(AppError::Validation(msg));
    }
    let rendered = renderer.render(&data, &render_mode(&query, &config)).await?;
    Ok(document_response(rendered))
}

/// POST /api/documents/convocatoria/preview
pub async fn convocatoria_preview(
    renderer: web::Data<ConvocatoriaRenderer>,
    body: web::Json<ConvocatoriaData>,
) -> Result<HttpResponse, AppError> {
    let data = body.into_inner();
    if let Some(msg) = data.validate() {
        return Err(AppError::Validation(msg));
    }
    let html = renderer.preview_html(&data)?;
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachment_keeps_utf8_name() {
        let header = attachment("Acta_Ordinária_12_2025-03-15.pdf").to_string();
        assert!(header.starts_with("attachment"), "{header}");
        assert!(header.contains("filename=\"Acta_Ordin_ria_12_2025-03-15.pdf\""), "{header}");
        assert!(header.contains("filename*=UTF-8''Acta_Ordin%C3%A1ria_12_2025-03-15.pdf"), "{header}");
    }
}
