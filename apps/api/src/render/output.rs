//! Render pipeline: record -> markup file -> optional PDF, in a caller-chosen directory.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::models::{CoverLetterData, ResumeData};
use crate::render::compiler::{CompileError, DocumentCompiler};
use crate::render::template::{Template, TemplateError};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Compile(#[from] CompileError),
}

/// Files produced by one render. `pdf_path` is only set when compilation ran and succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutcome {
    pub markup_path: PathBuf,
    pub pdf_path: Option<PathBuf>,
}

/// Success result reported at the CLI and HTTP boundary. Failures go through `AppError`
/// or the CLI's error chain.
#[derive(Debug, Clone, Serialize)]
pub struct RenderResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typst_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_file: Option<String>,
}

impl From<&RenderOutcome> for RenderResponse {
    fn from(outcome: &RenderOutcome) -> Self {
        let message = match outcome.pdf_path {
            Some(_) => "document rendered and compiled",
            None => "document rendered",
        };
        Self {
            success: true,
            message: Some(message.to_string()),
            typst_file: Some(outcome.markup_path.display().to_string()),
            pdf_file: outcome.pdf_path.as_ref().map(|p| p.display().to_string()),
        }
    }
}

/// Replaces every character outside `[A-Za-z0-9_]` with `_`.
pub fn normalize_component(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// `Cover_Letter_<first>_<position>`
pub fn cover_letter_stem(data: &CoverLetterData) -> String {
    format!(
        "Cover_Letter_{}_{}",
        normalize_component(&data.first_name),
        normalize_component(&data.position)
    )
}

/// `Resume_<first>_<last>`
pub fn resume_stem(data: &ResumeData) -> String {
    format!(
        "Resume_{}_{}",
        normalize_component(&data.author.firstname),
        normalize_component(&data.author.lastname)
    )
}

pub async fn render_cover_letter(
    template: &Template,
    compiler: &dyn DocumentCompiler,
    data: &CoverLetterData,
    output_dir: &Path,
    skip_pdf: bool,
) -> Result<RenderOutcome, RenderError> {
    let markup = template.render(data)?;
    write_and_compile(markup, &cover_letter_stem(data), compiler, output_dir, skip_pdf).await
}

pub async fn render_resume(
    template: &Template,
    compiler: &dyn DocumentCompiler,
    data: &ResumeData,
    output_dir: &Path,
    skip_pdf: bool,
) -> Result<RenderOutcome, RenderError> {
    let markup = template.render(data)?;
    write_and_compile(markup, &resume_stem(data), compiler, output_dir, skip_pdf).await
}

async fn write_and_compile(
    markup: String,
    stem: &str,
    compiler: &dyn DocumentCompiler,
    output_dir: &Path,
    skip_pdf: bool,
) -> Result<RenderOutcome, RenderError> {
    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|source| RenderError::Io {
            path: output_dir.to_path_buf(),
            source,
        })?;

    let markup_path = output_dir.join(format!("{stem}.typ"));
    tokio::fs::write(&markup_path, markup)
        .await
        .map_err(|source| RenderError::Io {
            path: markup_path.clone(),
            source,
        })?;
    info!(path = %markup_path.display(), "markup written");

    if skip_pdf {
        return Ok(RenderOutcome {
            markup_path,
            pdf_path: None,
        });
    }

    let pdf_path = output_dir.join(format!("{stem}.pdf"));
    compiler.compile(&markup_path, &pdf_path).await?;
    info!(path = %pdf_path.display(), "pdf compiled");

    Ok(RenderOutcome {
        markup_path,
        pdf_path: Some(pdf_path),
    })
}
