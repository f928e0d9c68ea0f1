//! Section lookup: maps a `= Heading` label to the slice of document it introduces.

use tracing::trace;

use crate::scrape::lexer::TokenStream;

/// Where a section stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary<'a> {
    /// The next level-1 heading.
    NextTopLevel,
    /// The next heading of any level.
    NextHeading,
    /// The next level-1 heading whose title starts with the given label.
    Until(&'a str),
    EndOfDocument,
}

/// A located section. `start..end` are token indices, `text` the raw source.
///
/// An absent section is the empty default span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SectionSpan<'src> {
    pub text: &'src str,
    pub start: usize,
    pub end: usize,
}

impl SectionSpan<'_> {
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Span from just after the `= <label>` heading line to just before the next level-1
/// heading, or to the end of the document.
pub fn locate_section<'src>(stream: &TokenStream<'src>, label: &str) -> SectionSpan<'src> {
    locate_with(stream, label, Boundary::NextTopLevel)
}

/// Like [`locate_section`] with an explicit end boundary.
///
/// The first level-1 heading whose title is `label`, or starts with it followed by a
/// non-word character (`= Skills & Tools`), wins. Matching is case-sensitive.
pub fn locate_with<'src>(
    stream: &TokenStream<'src>,
    label: &str,
    boundary: Boundary<'_>,
) -> SectionSpan<'src> {
    let headings = stream.headings();
    let Some(position) = headings
        .iter()
        .position(|h| h.level == 1 && title_matches(h.title, label))
    else {
        trace!(label, "section heading not present");
        return SectionSpan::default();
    };

    let heading = headings[position];
    let following = &headings[position + 1..];
    let closing = match boundary {
        Boundary::NextTopLevel => following.iter().find(|h| h.level == 1),
        Boundary::NextHeading => following.first(),
        Boundary::Until(end_label) => following
            .iter()
            .find(|h| h.level == 1 && title_matches(h.title, end_label)),
        Boundary::EndOfDocument => None,
    };

    let source = stream.source();
    let text_start = heading.line_end;
    let text_end = closing.map(|h| h.start).unwrap_or(source.len());

    let span = SectionSpan {
        text: &source[text_start..text_end],
        start: stream.index_at_offset(text_start),
        end: closing.map(|h| h.index).unwrap_or(stream.len()),
    };
    trace!(
        label,
        tokens = span.end.saturating_sub(span.start),
        "section located"
    );
    span
}

/// `= Skillset` is not the Skills section.
fn title_matches(title: &str, label: &str) -> bool {
    match title.strip_prefix(label) {
        Some(rest) => !rest.starts_with(|c: char| c.is_alphanumeric() || c == '_'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "= Summary\nHello there.\n= Education\n#resume-entry(title: \"MIT\")\n== Honors\nDean's list\n= Skills\n#resume-skill-item(\"Languages\", (\"Go\",))\n= Interests\nChess\n";

    #[test]
    fn test_locate_runs_to_next_top_level_heading() {
        let stream = TokenStream::new(DOC);
        let span = locate_section(&stream, "Education");
        assert!(span.text.contains("#resume-entry"));
        assert!(span.text.contains("== Honors"));
        assert!(!span.text.contains("= Skills"));
    }

    #[test]
    fn test_missing_heading_yields_empty_span() {
        let stream = TokenStream::new(DOC);
        let span = locate_section(&stream, "Projects");
        assert!(span.is_empty());
        assert_eq!(span.text, "");
    }

    #[test]
    fn test_last_section_runs_to_end() {
        let stream = TokenStream::new(DOC);
        let span = locate_section(&stream, "Interests");
        assert_eq!(span.text.trim(), "Chess");
        assert_eq!(span.end, stream.len());
    }

    #[test]
    fn test_heading_without_content_is_empty() {
        let stream = TokenStream::new("= Projects");
        let span = locate_section(&stream, "Projects");
        assert!(span.is_empty());
    }

    #[test]
    fn test_label_must_end_on_word_boundary() {
        let stream = TokenStream::new(
            "= Skillset\nnot this\n= Educational Outreach\nnor this\n= Skills & Tools\nthis\n",
        );
        assert_eq!(locate_section(&stream, "Skills").text.trim(), "this");
        assert!(locate_section(&stream, "Education").is_empty());
    }

    #[test]
    fn test_until_boundary_requires_whole_label() {
        let stream = TokenStream::new("= Skills\na\n= Interesting Facts\nb\n= Interests\nchess\n");
        let span = locate_with(&stream, "Skills", Boundary::Until("Interests"));
        assert!(span.text.contains("Interesting Facts"));
        assert!(!span.text.contains("chess"));
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let stream = TokenStream::new(DOC);
        assert!(locate_section(&stream, "education").is_empty());
    }

    #[test]
    fn test_next_heading_boundary_stops_at_sub_heading() {
        let stream = TokenStream::new(DOC);
        let span = locate_with(&stream, "Education", Boundary::NextHeading);
        assert!(span.text.contains("#resume-entry"));
        assert!(!span.text.contains("Honors"));
    }

    #[test]
    fn test_until_boundary_skips_other_sections() {
        let stream = TokenStream::new(DOC);
        let span = locate_with(&stream, "Education", Boundary::Until("Interests"));
        assert!(span.text.contains("= Skills"));
        assert!(!span.text.contains("Chess"));
    }

    #[test]
    fn test_span_tokens_exclude_heading_words() {
        let stream = TokenStream::new(DOC);
        let span = locate_section(&stream, "Interests");
        assert_eq!(span.end - span.start, 1);
    }
}
