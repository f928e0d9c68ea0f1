//! Lexer for Typst résumé markup, built on logos.
//!
//! Only the handful of shapes the scrapers care about are tokenised. Prose, digits and
//! punctuation outside that set come back from logos as errors and are dropped.

use logos::{Filter, Lexer, Logos};

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Token<'src> {
    /// A run of `=`. Only a heading when it opens a line, see [`TokenStream::heading_at`].
    #[regex(r"=+", |lex| lex.slice().len())]
    Equals(usize),

    /// `#name`, the call form used by markup-mode function calls.
    #[regex(r"#[a-zA-Z_][a-zA-Z0-9_-]*", |lex| &lex.slice()[1..])]
    Call(&'src str),

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_-]*", |lex| lex.slice())]
    Ident(&'src str),

    /// Quoted string, quotes stripped, escapes left as written. A `"` with no partner on
    /// the same line is prose (`27" monitor`) and is skipped on its own.
    #[token("\"", quoted_string)]
    Str(&'src str),

    /// `\[`, `\]`, `\#` and friends. Never structural.
    #[regex(r"\\[^\n]")]
    Escape,

    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
}

fn quoted_string<'src>(lex: &mut Lexer<'src, Token<'src>>) -> Filter<&'src str> {
    let mut chars = lex.remainder().char_indices();
    while let Some((at, c)) = chars.next() {
        match c {
            '"' => {
                lex.bump(at + 1);
                let s = lex.slice();
                return Filter::Emit(&s[1..s.len() - 1]);
            }
            '\\' => match chars.next() {
                Some((_, '\n')) | None => break,
                Some(_) => {}
            },
            '\n' => break,
            _ => {}
        }
    }
    Filter::Skip
}

/// Byte range of a token in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSpan {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpannedToken<'src> {
    pub token: Token<'src>,
    pub span: TokenSpan,
}

/// A top-level or nested `=` heading found in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Heading<'src> {
    /// Index of the `=` token in the stream.
    pub index: usize,
    pub level: usize,
    /// Heading text, trimmed, without the marker.
    pub title: &'src str,
    /// Byte offset of the marker.
    pub start: usize,
    /// Byte offset just past the heading line (newline excluded).
    pub line_end: usize,
}

/// Lexed document: the source plus every recognised token, in order.
#[derive(Debug, Clone)]
pub struct TokenStream<'src> {
    source: &'src str,
    tokens: Vec<SpannedToken<'src>>,
}

impl<'src> TokenStream<'src> {
    pub fn new(source: &'src str) -> Self {
        let tokens = Token::lexer(source)
            .spanned()
            .filter_map(|(result, span)| {
                result.ok().map(|token| SpannedToken {
                    token,
                    span: TokenSpan {
                        start: span.start,
                        end: span.end,
                    },
                })
            })
            .collect();

        Self { source, tokens }
    }

    pub fn source(&self) -> &'src str {
        self.source
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn token(&self, index: usize) -> Option<Token<'src>> {
        self.tokens.get(index).map(|t| t.token)
    }

    pub fn span(&self, index: usize) -> Option<TokenSpan> {
        self.tokens.get(index).map(|t| t.span)
    }

    /// Start offset of the token at `index`, or the end of the source past the last token.
    pub fn offset(&self, index: usize) -> usize {
        self.span(index)
            .map(|s| s.start)
            .unwrap_or(self.source.len())
    }

    /// Interprets the token at `index` as a heading marker.
    ///
    /// A marker is a heading when it sits at column zero and is followed by horizontal
    /// whitespace and a word character, e.g. `= Education`.
    pub fn heading_at(&self, index: usize) -> Option<Heading<'src>> {
        let spanned = self.tokens.get(index)?;
        let Token::Equals(level) = spanned.token else {
            return None;
        };

        let start = spanned.span.start;
        if start > 0 && self.source.as_bytes()[start - 1] != b'\n' {
            return None;
        }

        let rest = &self.source[spanned.span.end..];
        let line = rest.split('\n').next().unwrap_or_default();
        let title = line.trim_start_matches([' ', '\t']);
        if title.len() == line.len() {
            return None;
        }
        if !title.starts_with(|c: char| c.is_ascii_alphanumeric() || c == '_') {
            return None;
        }

        Some(Heading {
            index,
            level,
            title: title.trim_end(),
            start,
            line_end: spanned.span.end + line.len(),
        })
    }

    /// Every heading in the document, in source order.
    pub fn headings(&self) -> Vec<Heading<'src>> {
        (0..self.tokens.len())
            .filter_map(|i| self.heading_at(i))
            .collect()
    }

    /// First token index whose start offset is at or past `offset`.
    pub fn index_at_offset(&self, offset: usize) -> usize {
        self.tokens.partition_point(|t| t.span.start < offset)
    }

    /// Finds the token that closes the group opened at `open`, tracking nesting of the
    /// same delimiter pair. Returns `None` when the group is never closed before `limit`.
    pub fn matching_close(&self, open: usize, limit: usize) -> Option<usize> {
        let (opener, closer) = match self.token(open)? {
            Token::LParen => (Token::LParen, Token::RParen),
            Token::LBracket => (Token::LBracket, Token::RBracket),
            _ => return None,
        };

        let mut depth = 0usize;
        for index in open..limit.min(self.tokens.len()) {
            let token = self.tokens[index].token;
            if token == opener {
                depth += 1;
            } else if token == closer {
                depth -= 1;
                if depth == 0 {
                    return Some(index);
                }
            }
        }
        None
    }

    /// Source text strictly between two tokens.
    pub fn text_between(&self, open: usize, close: usize) -> &'src str {
        let start = self.span(open).map(|s| s.end).unwrap_or(self.source.len());
        let end = self.offset(close).max(start);
        &self.source[start..end]
    }

    /// Index of the next call form named `name` in `from..limit`.
    pub fn find_call(&self, name: &str, from: usize, limit: usize) -> Option<usize> {
        (from..limit.min(self.tokens.len()))
            .find(|&i| matches!(self.tokens[i].token, Token::Call(n) if n == name))
    }

    /// Quoted strings in `from..to`, unescaped, in source order.
    pub fn strings(&self, from: usize, to: usize) -> Vec<String> {
        (from..to.min(self.tokens.len()))
            .filter_map(|i| match self.tokens[i].token {
                Token::Str(raw) => Some(unescape(raw)),
                _ => None,
            })
            .collect()
    }
}

/// Resolves `\"` and `\\` inside a quoted string body. Other escapes are kept verbatim.
pub fn unescape(raw: &str) -> String {
    if !raw.contains('\\') {
        return raw.to_string();
    }

    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(next @ ('"' | '\\')) => out.push(next),
            Some(next) => {
                out.push('\\');
                out.push(next);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token<'_>> {
        let stream = TokenStream::new(source);
        (0..stream.len()).filter_map(|i| stream.token(i)).collect()
    }

    #[test]
    fn test_lex_entry_call() {
        let tokens = kinds(r#"#resume-entry(title: "MIT", date: "2020")"#);
        assert_eq!(
            tokens,
            vec![
                Token::Call("resume-entry"),
                Token::LParen,
                Token::Ident("title"),
                Token::Colon,
                Token::Str("MIT"),
                Token::Comma,
                Token::Ident("date"),
                Token::Colon,
                Token::Str("2020"),
                Token::RParen,
            ]
        );
    }

    #[test]
    fn test_prose_and_digits_are_dropped() {
        let tokens = kinds("Reduced latency by 40% (p99).");
        assert_eq!(
            tokens,
            vec![
                Token::Ident("Reduced"),
                Token::Ident("latency"),
                Token::Ident("by"),
                Token::LParen,
                Token::Ident("p99"),
                Token::RParen,
            ]
        );
    }

    #[test]
    fn test_brackets_inside_strings_are_not_structural() {
        let tokens = kinds(r#"["a]b"]"#);
        assert_eq!(
            tokens,
            vec![Token::LBracket, Token::Str("a]b"), Token::RBracket]
        );
    }

    #[test]
    fn test_unpaired_quote_is_skipped() {
        let tokens = kinds("a 27\" monitor]\n= Skills");
        assert_eq!(
            tokens,
            vec![
                Token::Ident("a"),
                Token::Ident("monitor"),
                Token::RBracket,
                Token::Equals(1),
                Token::Ident("Skills"),
            ]
        );
    }

    #[test]
    fn test_string_with_escaped_quote() {
        let tokens = kinds(r#"("say \"hi\"", "x")"#);
        assert_eq!(tokens[1], Token::Str(r#"say \"hi\""#));
        assert_eq!(tokens[3], Token::Str("x"));
    }

    #[test]
    fn test_string_does_not_cross_lines() {
        let tokens = kinds("\"open\n\"closed\"");
        assert_eq!(tokens, vec![Token::Ident("open"), Token::Str("closed")]);
    }

    #[test]
    fn test_lone_backslash_at_end() {
        let tokens = kinds("[body] \\");
        assert_eq!(tokens, vec![Token::LBracket, Token::Ident("body"), Token::RBracket]);
    }

    #[test]
    fn test_escaped_brackets_are_not_structural() {
        let tokens = kinds(r"[see \] here]");
        assert_eq!(tokens.first(), Some(&Token::LBracket));
        assert_eq!(tokens.last(), Some(&Token::RBracket));
        assert_eq!(
            tokens.iter().filter(|t| **t == Token::RBracket).count(),
            1
        );
    }

    #[test]
    fn test_heading_requires_line_start() {
        let stream = TokenStream::new("= Skills\n#let x = 1\n== Sub section\n");
        let headings = stream.headings();
        assert_eq!(headings.len(), 2);
        assert_eq!(headings[0].title, "Skills");
        assert_eq!(headings[0].level, 1);
        assert_eq!(headings[1].title, "Sub section");
        assert_eq!(headings[1].level, 2);
    }

    #[test]
    fn test_heading_requires_space_and_word() {
        let stream = TokenStream::new("=Skills\n=   \n= (x)\n");
        assert!(stream.headings().is_empty());
    }

    #[test]
    fn test_heading_line_end() {
        let source = "= Summary  \nbody";
        let stream = TokenStream::new(source);
        let heading = stream.heading_at(0).unwrap();
        assert_eq!(heading.title, "Summary");
        assert_eq!(&source[heading.line_end..], "\nbody");
    }

    #[test]
    fn test_matching_close_nested() {
        let stream = TokenStream::new("[a [b] c] d]");
        assert_eq!(stream.matching_close(0, stream.len()), Some(6));
        assert_eq!(stream.text_between(0, 6), "a [b] c");
    }

    #[test]
    fn test_matching_close_unclosed() {
        let stream = TokenStream::new("( a ( b )");
        assert_eq!(stream.matching_close(0, stream.len()), None);
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r#"say \"hi\""#), r#"say "hi""#);
        assert_eq!(unescape(r"a\\b"), r"a\b");
        assert_eq!(unescape(r"C\#"), r"C\#");
        assert_eq!(unescape("plain"), "plain");
    }
}
