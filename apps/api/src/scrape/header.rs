//! Document-level fields: the `positions: (...)` tuple and the Summary paragraph.

use tracing::trace;

use crate::scrape::lexer::{Token, TokenStream};
use crate::scrape::section::{locate_with, Boundary};

/// Quoted strings of the first `positions: ( ... )` tuple anywhere in the document.
pub fn parse_positions(stream: &TokenStream<'_>) -> Vec<String> {
    for index in 0..stream.len() {
        if stream.token(index) != Some(Token::Ident("positions"))
            || stream.token(index + 1) != Some(Token::Colon)
            || stream.token(index + 2) != Some(Token::LParen)
        {
            continue;
        }

        let open = index + 2;
        match stream.matching_close(open, stream.len()) {
            Some(close) => {
                let positions = stream.strings(open + 1, close);
                trace!(count = positions.len(), "parsed positions");
                return positions;
            }
            None => {
                trace!("positions tuple is never closed");
                return Vec::new();
            }
        }
    }
    Vec::new()
}

/// Text between the Summary heading and the next heading of any level, trimmed.
pub fn parse_summary(stream: &TokenStream<'_>) -> String {
    let summary = locate_with(stream, "Summary", Boundary::NextHeading)
        .text
        .trim()
        .to_string();
    trace!(chars = summary.len(), "parsed summary");
    summary
}
