//! Entry blocks: `#resume-entry(...)` headers, each optionally followed by a
//! `#resume-item[...]` body.

use tracing::{debug, trace};

use crate::models::Entry;
use crate::scrape::lexer::{unescape, Token, TokenStream};
use crate::scrape::section::SectionSpan;

pub const ENTRY_MARKER: &str = "resume-entry";
pub const BODY_MARKER: &str = "resume-item";

/// Link helpers whose single string argument stands in for a location.
const LINK_HELPERS: &[&str] = &["github-link"];

/// How a named field's value may be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueForm {
    /// `"..."`
    Quoted,
    /// `[...]`, nesting allowed, trimmed.
    Bracketed,
    /// `github-link("...")`, optionally inside `[#...]`.
    LinkHelper,
}

const TITLE_FORMS: &[ValueForm] = &[ValueForm::Bracketed, ValueForm::Quoted];
const LOCATION_FORMS: &[ValueForm] = &[
    ValueForm::Quoted,
    ValueForm::LinkHelper,
    ValueForm::Bracketed,
];
const DATE_FORMS: &[ValueForm] = &[ValueForm::Quoted];
const DESCRIPTION_FORMS: &[ValueForm] = &[ValueForm::Bracketed, ValueForm::Quoted];

/// Parses every entry in a section, in document order.
pub fn parse_entries(stream: &TokenStream<'_>, section: SectionSpan<'_>) -> Vec<Entry> {
    let mut entries = Vec::new();
    let mut cursor = section.start;

    while let Some(marker) = stream.find_call(ENTRY_MARKER, cursor, section.end) {
        let open = marker + 1;
        if stream.token(open) != Some(Token::LParen) {
            trace!(offset = stream.offset(marker), "entry marker without argument list");
            cursor = open;
            continue;
        }

        // An unclosed header runs to the next body marker or the end of the section.
        let (header_end, after_header) = match stream.matching_close(open, section.end) {
            Some(close) => (close, close + 1),
            None => {
                let end = stream
                    .find_call(BODY_MARKER, open, section.end)
                    .unwrap_or(section.end);
                (end, end)
            }
        };

        let mut entry = parse_header(stream, open + 1, header_end);

        let next_entry = stream
            .find_call(ENTRY_MARKER, after_header, section.end)
            .unwrap_or(section.end);

        cursor = match stream.find_call(BODY_MARKER, after_header, next_entry) {
            Some(body_marker) => {
                let (content, resume_at) = read_body(stream, body_marker, next_entry);
                entry.content = content;
                resume_at
            }
            None => after_header,
        };

        entries.push(entry);
    }

    debug!(count = entries.len(), "parsed entries");
    entries
}

/// Reads the body introduced by the marker at `marker`, bounded by `limit`.
/// Returns the cleaned body and the index to resume scanning from.
fn read_body(stream: &TokenStream<'_>, marker: usize, limit: usize) -> (String, usize) {
    let open = marker + 1;
    if stream.token(open) != Some(Token::LBracket) {
        return (String::new(), open);
    }

    if let Some(close) = stream.matching_close(open, limit) {
        return (clean_body(stream.text_between(open, close)), close + 1);
    }

    // Never closed: take everything up to the boundary, dropping a trailing `]`.
    let raw = stream.text_between(open, limit);
    let raw = raw.rfind(']').map(|i| &raw[..i]).unwrap_or(raw);
    (clean_body(raw), limit)
}

/// Strips backslashes, trims each line and drops blank lines.
pub fn clean_body(raw: &str) -> String {
    raw.replace('\\', "")
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Extracts the named fields of one entry header. Field order does not matter and
/// missing fields stay empty.
fn parse_header(stream: &TokenStream<'_>, from: usize, to: usize) -> Entry {
    let labels = top_level_labels(stream, from, to);

    let field = |name: &str, forms: &[ValueForm]| -> String {
        forms
            .iter()
            .find_map(|&form| {
                labels
                    .iter()
                    .filter(|(label, _)| *label == name)
                    .find_map(|&(_, value)| read_value(stream, form, value, to))
            })
            .unwrap_or_default()
    };

    Entry {
        title: field("title", TITLE_FORMS),
        location: field("location", LOCATION_FORMS),
        date: field("date", DATE_FORMS),
        description: field("description", DESCRIPTION_FORMS),
        content: String::new(),
    }
}

/// `name:` labels at argument depth zero, paired with the index of their value token.
fn top_level_labels<'src>(
    stream: &TokenStream<'src>,
    from: usize,
    to: usize,
) -> Vec<(&'src str, usize)> {
    let mut labels = Vec::new();
    let mut depth = 0usize;

    for index in from..to {
        match stream.token(index) {
            Some(Token::LParen | Token::LBracket) => depth += 1,
            Some(Token::RParen | Token::RBracket) => depth = depth.saturating_sub(1),
            Some(Token::Ident(name)) if depth == 0 => {
                if stream.token(index + 1) == Some(Token::Colon) {
                    labels.push((name, index + 2));
                }
            }
            _ => {}
        }
    }
    labels
}

fn read_value(stream: &TokenStream<'_>, form: ValueForm, at: usize, limit: usize) -> Option<String> {
    if at >= limit {
        return None;
    }

    match form {
        ValueForm::Quoted => match stream.token(at)? {
            Token::Str(raw) => Some(unescape(raw)),
            _ => None,
        },
        ValueForm::Bracketed => {
            if stream.token(at)? != Token::LBracket {
                return None;
            }
            let close = stream.matching_close(at, limit)?;
            Some(stream.text_between(at, close).trim().to_string())
        }
        ValueForm::LinkHelper => {
            let call = if stream.token(at)? == Token::LBracket {
                at + 1
            } else {
                at
            };
            let is_helper = match stream.token(call)? {
                Token::Call(name) | Token::Ident(name) => LINK_HELPERS.contains(&name),
                _ => false,
            };
            if !is_helper || call + 3 >= limit {
                return None;
            }
            match (
                stream.token(call + 1)?,
                stream.token(call + 2)?,
                stream.token(call + 3)?,
            ) {
                (Token::LParen, Token::Str(raw), Token::RParen) => Some(unescape(raw)),
                _ => None,
            }
        }
    }
}
