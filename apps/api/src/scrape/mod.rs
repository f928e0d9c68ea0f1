//! Résumé scraping: recovers a [`ResumeDocument`] from Typst markup.
//!
//! Pipeline: lexer → section locator → entry / skill / interest scanners → assembly.
//! Nothing in here fails. Missing sections, fields and blocks come back empty.

pub mod entries;
pub mod header;
pub mod interests;
pub mod lexer;
pub mod section;
pub mod skills;

use tracing::debug;

use crate::models::ResumeDocument;
use crate::scrape::entries::parse_entries;
use crate::scrape::header::{parse_positions, parse_summary};
use crate::scrape::interests::parse_interests;
use crate::scrape::lexer::TokenStream;
use crate::scrape::section::locate_section;
use crate::scrape::skills::parse_skills;

pub const EDUCATION_LABEL: &str = "Education";
pub const PROJECTS_LABEL: &str = "Projects";
/// Tried in order; the first heading present wins.
pub const WORK_LABELS: &[&str] = &["Working Experience", "Work Experience"];

/// Parses a Typst résumé into its structured form.
pub fn parse_resume(content: &str) -> ResumeDocument {
    let stream = TokenStream::new(content);

    let work_section = WORK_LABELS
        .iter()
        .map(|label| locate_section(&stream, label))
        .find(|span| !span.is_empty())
        .unwrap_or_default();

    let document = ResumeDocument {
        positions: parse_positions(&stream),
        summary: parse_summary(&stream),
        education: parse_entries(&stream, locate_section(&stream, EDUCATION_LABEL)),
        work_experience: parse_entries(&stream, work_section),
        projects: parse_entries(&stream, locate_section(&stream, PROJECTS_LABEL)),
        skills: parse_skills(&stream),
        interests: parse_interests(&stream),
    };

    debug!(
        tokens = stream.len(),
        positions = document.positions.len(),
        education = document.education.len(),
        work_experience = document.work_experience.len(),
        projects = document.projects.len(),
        skills = document.skills.len(),
        interests = document.interests.len(),
        "parsed resume"
    );
    document
}
