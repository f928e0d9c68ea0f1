use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::Deserialize;
use tracing::info;

use crate::errors::AppError;
use crate::models::{CoverLetterData, ResumeData, ResumeDocument};
use crate::render::output::{render_cover_letter, render_resume, RenderOutcome, RenderResponse};
use crate::scrape::parse_resume;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct RenderQuery {
    /// Overrides the configured default for this request.
    pub skip_pdf: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ParseRequest {
    pub content: String,
}

/// POST /render
pub async fn handle_render_cover_letter(
    State(state): State<AppState>,
    Query(query): Query<RenderQuery>,
    body: Bytes,
) -> Result<Response, AppError> {
    let data: CoverLetterData = serde_json::from_slice(&body)?;
    let skip_pdf = query.skip_pdf.unwrap_or(state.config.skip_pdf);
    info!(first_name = %data.first_name, position = %data.position, "rendering cover letter");

    let outcome = render_cover_letter(
        &state.templates.cover_letter,
        state.compiler.as_ref(),
        &data,
        &state.config.output_dir,
        skip_pdf,
    )
    .await?;
    respond(outcome).await
}

/// POST /api/v1/resumes/render
pub async fn handle_render_resume(
    State(state): State<AppState>,
    Query(query): Query<RenderQuery>,
    body: Bytes,
) -> Result<Response, AppError> {
    let data: ResumeData = serde_json::from_slice(&body)?;
    let skip_pdf = query.skip_pdf.unwrap_or(state.config.skip_pdf);
    info!(firstname = %data.author.firstname, lastname = %data.author.lastname, "rendering resume");

    let outcome = render_resume(
        &state.templates.resume,
        state.compiler.as_ref(),
        &data,
        &state.config.output_dir,
        skip_pdf,
    )
    .await?;
    respond(outcome).await
}

/// POST /api/v1/resumes/parse
pub async fn handle_parse_resume(body: Bytes) -> Result<Json<ResumeDocument>, AppError> {
    let request: ParseRequest = serde_json::from_slice(&body)?;
    let document = tokio::task::spawn_blocking(move || parse_resume(&request.content))
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    Ok(Json(document))
}

/// PDF bytes when one was compiled, otherwise the tagged JSON result naming the markup file.
async fn respond(outcome: RenderOutcome) -> Result<Response, AppError> {
    let Some(pdf_path) = &outcome.pdf_path else {
        return Ok(Json(RenderResponse::from(&outcome)).into_response());
    };

    let bytes = tokio::fs::read(pdf_path)
        .await
        .map_err(|e| AppError::Io(format!("failed to read {}: {e}", pdf_path.display())))?;
    let file_name = pdf_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_string());

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}
