use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use std::fmt;

use crate::gateway::ApiEnvelope;
use crate::pdf::RenderError;

#[derive(Debug)]
pub enum AppError {
    Db(sqlx::Error),
    Validation(String),
    NotFound(String),
    Render(RenderError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Db(e) => write!(f, "Database error: {e}"),
            AppError::Validation(e) => write!(f, "{e}"),
            AppError::NotFound(e) => write!(f, "{e}"),
            AppError::Render(e) => write!(f, "Render error: {e}"),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Db(_) | AppError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::Validation(e) | AppError::NotFound(e) => e.clone(),
            AppError::Db(_) => {
                log::error!("{self}");
                "Erro interno do servidor".to_string()
            }
            AppError::Render(_) => {
                log::error!("{self}");
                "Erro ao gerar o documento".to_string()
            }
        };
        HttpResponse::build(self.status_code()).json(ApiEnvelope::<()>::failure(message))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Db(e)
    }
}

impl From<RenderError> for AppError {
    fn from(e: RenderError) -> Self {
        AppError::Render(e)
    }
}
