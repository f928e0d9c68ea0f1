use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::render::template::Template;

pub const COVER_LETTER_TEMPLATE_NAME: &str = "coverletter.typ.template";
pub const RESUME_TEMPLATE_NAME: &str = "resume.typ.template";

const COVER_LETTER_BUILTIN: &str = include_str!("../../templates/coverletter.typ.template");
const RESUME_BUILTIN: &str = include_str!("../../templates/resume.typ.template");

/// Parsed templates, loaded once at startup and shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    pub cover_letter: Template,
    pub resume: Template,
}

impl TemplateStore {
    /// `None` selects the built-in template. A path whose file name matches a built-in
    /// also resolves to the embedded copy; anything else is read from disk.
    pub fn load(cover_letter: Option<&Path>, resume: Option<&Path>) -> Result<Self> {
        let cover_letter = load_template(cover_letter, COVER_LETTER_TEMPLATE_NAME, COVER_LETTER_BUILTIN)?;
        let resume = load_template(resume, RESUME_TEMPLATE_NAME, RESUME_BUILTIN)?;
        Ok(Self {
            cover_letter,
            resume,
        })
    }

    #[cfg(test)]
    pub fn builtin() -> Result<Self> {
        Self::load(None, None)
    }
}

fn load_template(path: Option<&Path>, builtin_name: &str, builtin: &str) -> Result<Template> {
    let (origin, source) = match path {
        Some(path) if !matches_builtin(path, builtin_name) => {
            let source = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read template file {}", path.display()))?;
            (path.to_path_buf(), source)
        }
        _ => (PathBuf::from(builtin_name), builtin.to_string()),
    };

    let template = Template::parse(&source)
        .with_context(|| format!("failed to parse template {}", origin.display()))?;
    info!(template = %origin.display(), "template loaded");
    Ok(template)
}

fn matches_builtin(path: &Path, builtin_name: &str) -> bool {
    path.file_name().and_then(|n| n.to_str()) == Some(builtin_name)
}
