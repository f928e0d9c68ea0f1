//! Skill categories: `#resume-skill-item("Name", ("a", strong("b"), ...))` between the
//! Skills and Interests headings.

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::models::{SkillCategory, SkillItem};
use crate::scrape::lexer::{unescape, Token, TokenStream};
use crate::scrape::section::{locate_with, Boundary, SectionSpan};

pub const SKILL_MARKER: &str = "resume-skill-item";
const EMPHASIS_CALL: &str = "strong";

pub fn parse_skills(stream: &TokenStream<'_>) -> Vec<SkillCategory> {
    let section = locate_with(stream, "Skills", Boundary::Until("Interests"));
    parse_skill_categories(stream, section)
}

/// Every well-formed skill category call inside `section`.
pub fn parse_skill_categories(
    stream: &TokenStream<'_>,
    section: SectionSpan<'_>,
) -> Vec<SkillCategory> {
    let mut categories = Vec::new();
    let mut cursor = section.start;

    while let Some(marker) = stream.find_call(SKILL_MARKER, cursor, section.end) {
        cursor = marker + 1;
        match read_category(stream, marker, section.end) {
            Some((category, outer_close)) => {
                cursor = outer_close + 1;
                categories.push(category);
            }
            None => trace!(offset = stream.offset(marker), "skipping malformed skill item"),
        }
    }

    debug!(count = categories.len(), "parsed skill categories");
    categories
}

/// Expects `( "Name" , ( ... ) )` right after the marker. Returns the category and the
/// index of the outer closing parenthesis.
fn read_category(
    stream: &TokenStream<'_>,
    marker: usize,
    limit: usize,
) -> Option<(SkillCategory, usize)> {
    let outer_open = marker + 1;
    if stream.token(outer_open)? != Token::LParen {
        return None;
    }
    let outer_close = stream.matching_close(outer_open, limit)?;

    let Token::Str(name) = stream.token(outer_open + 1)? else {
        return None;
    };
    if stream.token(outer_open + 2)? != Token::Comma {
        return None;
    }
    let list_open = outer_open + 3;
    if stream.token(list_open)? != Token::LParen {
        return None;
    }
    let list_close = stream.matching_close(list_open, outer_close)?;

    Some((
        SkillCategory {
            name: unescape(name),
            skills: skill_items(stream, list_open + 1, list_close),
        },
        outer_close,
    ))
}

/// Every quoted string in the list is a skill. A skill is strong when the same string
/// appears as a `strong("...")` argument anywhere in the list.
fn skill_items(stream: &TokenStream<'_>, from: usize, to: usize) -> Vec<SkillItem> {
    let emphasis = emphasis_set(stream, from, to);

    stream
        .strings(from, to)
        .into_iter()
        .map(|name| {
            let strong = emphasis.contains(&name);
            SkillItem { name, strong }
        })
        .collect()
}

fn emphasis_set(stream: &TokenStream<'_>, from: usize, to: usize) -> HashSet<String> {
    let mut set = HashSet::new();
    for index in from..to {
        let is_emphasis = matches!(
            stream.token(index),
            Some(Token::Ident(EMPHASIS_CALL) | Token::Call(EMPHASIS_CALL))
        );
        if !is_emphasis || index + 3 >= to {
            continue;
        }
        if let (Some(Token::LParen), Some(Token::Str(raw)), Some(Token::RParen)) = (
            stream.token(index + 1),
            stream.token(index + 2),
            stream.token(index + 3),
        ) {
            set.insert(unescape(raw));
        }
    }
    set
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skills_of(doc: &str) -> Vec<SkillCategory> {
        parse_skills(&TokenStream::new(doc))
    }

    fn item(name: &str, strong: bool) -> SkillItem {
        SkillItem {
            name: name.to_string(),
            strong,
        }
    }

    #[test]
    fn test_strong_and_plain_items() {
        let doc = "= Skills\n#resume-skill-item(\"Languages\", (strong(\"Go\"), \"Python\"))\n";
        let skills = skills_of(doc);
        assert_eq!(
            skills,
            vec![SkillCategory {
                name: "Languages".to_string(),
                skills: vec![item("Go", true), item("Python", false)],
            }]
        );
    }

    #[test]
    fn test_emphasis_is_by_value() {
        let doc = "= Skills\n#resume-skill-item(\"Tools\", (strong(\"Git\"), \"Git\", \"Make\"))\n";
        let skills = skills_of(doc);
        assert_eq!(
            skills[0].skills,
            vec![item("Git", true), item("Git", true), item("Make", false)]
        );
    }

    #[test]
    fn test_emphasis_does_not_cross_categories() {
        let doc = "= Skills\n#resume-skill-item(\"A\", (strong(\"Rust\"),))\n#resume-skill-item(\"B\", (\"Rust\",))\n";
        let skills = skills_of(doc);
        assert_eq!(skills.len(), 2);
        assert!(skills[0].skills[0].strong);
        assert!(!skills[1].skills[0].strong);
    }

    #[test]
    fn test_stops_at_interests() {
        let doc = "= Skills\n#resume-skill-item(\"A\", (\"x\",))\n= Interests\n#resume-skill-item(\"Chess\", [Openings])\n";
        let skills = skills_of(doc);
        assert_eq!(skills.len(), 1);
        assert_eq!(skills[0].name, "A");
    }

    #[test]
    fn test_malformed_category_is_skipped() {
        let doc = "= Skills\n#resume-skill-item(Languages, (\"Go\",))\n#resume-skill-item(\"Tools\", (\"Nix\",))\n";
        let skills = skills_of(doc);
        assert_eq!(skills.len(), 1);
        assert_eq!(skills[0].name, "Tools");
    }

    #[test]
    fn test_multiline_list() {
        let doc = "= Skills\n#resume-skill-item(\n  \"Cloud\",\n  (\n    strong(\"AWS\"),\n    \"GCP\",\n  ),\n)\n";
        let skills = skills_of(doc);
        assert_eq!(skills[0].skills, vec![item("AWS", true), item("GCP", false)]);
    }

    #[test]
    fn test_no_skills_section() {
        assert!(skills_of("= Education\n").is_empty());
    }
}
