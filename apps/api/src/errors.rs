use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::render::compiler::CompileError;
use crate::render::output::RenderError;
use crate::render::template::TemplateError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<RenderError> for AppError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Template(e) => AppError::Template(e),
            RenderError::Compile(e) => AppError::Compile(e),
            io @ RenderError::Io { .. } => AppError::Io(io.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Template(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "TEMPLATE_ERROR",
                e.to_string(),
            ),
            AppError::Compile(e) => {
                // Full compiler output goes to the log, not the client.
                tracing::error!("Compile error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "COMPILE_ERROR",
                    "PDF compilation failed".to_string(),
                )
            }
            AppError::Io(msg) => {
                tracing::error!("I/O error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "IO_ERROR",
                    "Failed to write output files".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "success": false,
            "code": code,
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let validation = AppError::Validation("bad".into()).into_response();
        assert_eq!(validation.status(), StatusCode::BAD_REQUEST);

        let template = AppError::Template(TemplateError::UnknownField("x".into())).into_response();
        assert_eq!(template.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let io = AppError::Io("disk full".into()).into_response();
        assert_eq!(io.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_render_error_mapping() {
        let err: AppError = RenderError::Template(TemplateError::NotScalar("xs".into())).into();
        assert!(matches!(err, AppError::Template(_)));

        let err: AppError = RenderError::Io {
            path: "out".into(),
            source: std::io::Error::other("denied"),
        }
        .into();
        assert!(matches!(err, AppError::Io(msg) if msg.contains("denied")));
    }
}
