//! Interests: `#resume-skill-item("Category")[description]` from the Interests heading to
//! the end of the document.

use tracing::{debug, trace};

use crate::models::Interest;
use crate::scrape::lexer::{unescape, Token, TokenStream};
use crate::scrape::section::{locate_with, Boundary};
use crate::scrape::skills::SKILL_MARKER;

pub fn parse_interests(stream: &TokenStream<'_>) -> Vec<Interest> {
    let section = locate_with(stream, "Interests", Boundary::EndOfDocument);

    let mut interests = Vec::new();
    let mut cursor = section.start;

    while let Some(marker) = stream.find_call(SKILL_MARKER, cursor, section.end) {
        let item_end = stream
            .find_call(SKILL_MARKER, marker + 1, section.end)
            .unwrap_or(section.end);
        cursor = item_end;

        match read_interest(stream, marker + 1, item_end) {
            Some(interest) => interests.push(interest),
            None => trace!(offset = stream.offset(marker), "skipping malformed interest"),
        }
    }

    debug!(count = interests.len(), "parsed interests");
    interests
}

/// The first quoted string is the category; the first bracket block after it is the
/// description, kept verbatim apart from surrounding whitespace.
fn read_interest(stream: &TokenStream<'_>, from: usize, to: usize) -> Option<Interest> {
    let (category_at, category) = (from..to).find_map(|i| match stream.token(i) {
        Some(Token::Str(raw)) => Some((i, unescape(raw))),
        _ => None,
    })?;

    let open = (category_at + 1..to).find(|&i| stream.token(i) == Some(Token::LBracket))?;

    let close = match stream.matching_close(open, to) {
        Some(close) => close,
        // Unbalanced: fall back to the last closing bracket of the item.
        None => (open + 1..to)
            .rev()
            .find(|&i| stream.token(i) == Some(Token::RBracket))?,
    };

    Some(Interest {
        category,
        description: stream.text_between(open, close).trim().to_string(),
    })
}
