//! Text-substitution template engine for Typst output.
//!
//! Templates are plain Typst with tags:
//! - `{{ author.firstname }}` substitutes a field, `{{ author.firstname | str }}` escapes it
//!   for use inside a Typst string literal
//! - `{{ each education |entry| }} ... {{ /each }}` repeats over a list
//! - `{{ if entry.location }} ... {{ else }} ... {{ /if }}` branches on truthiness,
//!   `not <cond>` negates and `contains(path, "needle")` tests substring containment
//! - `{{-` / `-}}` trim whitespace on that side of the tag, `\{{` emits a literal `{{`
//!
//! Data comes in through serde as a JSON value. Root names must exist on the record;
//! keys missing below a root object render as empty.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template syntax error at byte {offset}: {message}")]
    Syntax { offset: usize, message: String },

    #[error("unknown field '{0}'")]
    UnknownField(String),

    #[error("field '{0}' is not a list")]
    NotIterable(String),

    #[error("field '{0}' cannot be substituted as text")]
    NotScalar(String),

    #[error("record could not be serialized: {0}")]
    Data(#[from] serde_json::Error),
}

impl TemplateError {
    fn syntax(offset: usize, message: impl Into<String>) -> Self {
        TemplateError::Syntax {
            offset,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct FieldPath {
    raw: String,
    segments: Vec<String>,
}

impl FieldPath {
    fn parse(raw: &str, offset: usize) -> Result<Self, TemplateError> {
        let segments: Vec<String> = raw.split('.').map(str::to_string).collect();
        let valid = segments.iter().all(|s| {
            !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        });
        if !valid {
            return Err(TemplateError::syntax(
                offset,
                format!("invalid field path '{raw}'"),
            ));
        }
        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }
}

/// Output transform applied to a substituted field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Filter {
    Raw,
    /// Backslash-escapes `\` and `"`.
    Str,
}

impl Filter {
    fn parse(name: &str, offset: usize) -> Result<Self, TemplateError> {
        match name {
            "str" => Ok(Filter::Str),
            other => Err(TemplateError::syntax(offset, format!("unknown filter '{other}'"))),
        }
    }

    fn write(self, text: &str, out: &mut String) {
        match self {
            Filter::Raw => out.push_str(text),
            Filter::Str => {
                for c in text.chars() {
                    if matches!(c, '\\' | '"') {
                        out.push('\\');
                    }
                    out.push(c);
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Condition {
    Truthy(FieldPath),
    Not(Box<Condition>),
    Contains(FieldPath, String),
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Text(String),
    Field(FieldPath, Filter),
    Each {
        list: FieldPath,
        binding: String,
        body: Vec<Node>,
    },
    If {
        condition: Condition,
        then: Vec<Node>,
        otherwise: Vec<Node>,
    },
}

/// A parsed template, reusable across renders.
#[derive(Debug, Clone)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let pieces = split_pieces(source)?;
        let mut parser = TreeBuilder {
            pieces: pieces.into_iter().peekable(),
        };
        let (nodes, terminator) = parser.block()?;
        if let Some((offset, tag)) = terminator {
            return Err(TemplateError::syntax(offset, format!("unexpected '{tag}'")));
        }
        Ok(Self { nodes })
    }

    /// Renders against any serializable record.
    pub fn render<T: Serialize>(&self, data: &T) -> Result<String, TemplateError> {
        let root = serde_json::to_value(data)?;
        self.render_value(&root)
    }

    pub fn render_value(&self, root: &Value) -> Result<String, TemplateError> {
        let mut out = String::new();
        let mut scope = Scope {
            root,
            locals: Vec::new(),
        };
        render_nodes(&self.nodes, &mut scope, &mut out)?;
        Ok(out)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Lexing: text / tag pieces
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
enum Piece {
    Text(String),
    Tag { offset: usize, body: String },
}

fn split_pieces(source: &str) -> Result<Vec<Piece>, TemplateError> {
    let mut pieces = Vec::new();
    let mut text = String::new();
    let mut trim_next = false;
    let mut rest = source;
    let mut consumed = 0usize;

    while let Some(found) = rest.find("{{") {
        // `\{{` is a literal.
        if found > 0 && rest.as_bytes()[found - 1] == b'\\' {
            text.push_str(&rest[..found - 1]);
            text.push_str("{{");
            consumed += found + 2;
            rest = &rest[found + 2..];
            continue;
        }

        text.push_str(&rest[..found]);
        let offset = consumed + found;
        let after_open = &rest[found + 2..];
        let close = after_open
            .find("}}")
            .ok_or_else(|| TemplateError::syntax(offset, "unclosed tag"))?;

        let mut body = &after_open[..close];
        if let Some(stripped) = body.strip_prefix('-') {
            body = stripped;
            text.truncate(text.trim_end().len());
        }
        let trim_after = if let Some(stripped) = body.strip_suffix('-') {
            body = stripped;
            true
        } else {
            false
        };

        push_text(&mut pieces, &mut text, trim_next);
        pieces.push(Piece::Tag {
            offset,
            body: body.trim().to_string(),
        });
        trim_next = trim_after;

        let advance = found + 2 + close + 2;
        consumed += advance;
        rest = &rest[advance..];
    }

    text.push_str(rest);
    push_text(&mut pieces, &mut text, trim_next);
    Ok(pieces)
}

fn push_text(pieces: &mut Vec<Piece>, text: &mut String, trim_start: bool) {
    let taken = std::mem::take(text);
    let taken = if trim_start {
        taken.trim_start().to_string()
    } else {
        taken
    };
    if !taken.is_empty() {
        pieces.push(Piece::Text(taken));
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tree building
// ────────────────────────────────────────────────────────────────────────────

struct TreeBuilder<I: Iterator<Item = Piece>> {
    pieces: std::iter::Peekable<I>,
}

impl<I: Iterator<Item = Piece>> TreeBuilder<I> {
    /// Reads nodes until a block-closing tag (`else`, `/if`, `/each`) or the end.
    fn block(&mut self) -> Result<(Vec<Node>, Option<(usize, String)>), TemplateError> {
        let mut nodes = Vec::new();

        while let Some(piece) = self.pieces.next() {
            let (offset, body) = match piece {
                Piece::Text(text) => {
                    nodes.push(Node::Text(text));
                    continue;
                }
                Piece::Tag { offset, body } => (offset, body),
            };

            if matches!(body.as_str(), "else" | "/if" | "/each") {
                return Ok((nodes, Some((offset, body))));
            }

            if let Some(header) = body.strip_prefix("each ") {
                nodes.push(self.each(offset, header.trim())?);
            } else if let Some(header) = body.strip_prefix("if ") {
                nodes.push(self.conditional(offset, header.trim())?);
            } else {
                let (path, filter) = match body.split_once('|') {
                    Some((path, name)) => (path.trim(), Filter::parse(name.trim(), offset)?),
                    None => (body.as_str(), Filter::Raw),
                };
                nodes.push(Node::Field(FieldPath::parse(path, offset)?, filter));
            }
        }

        Ok((nodes, None))
    }

    fn each(&mut self, offset: usize, header: &str) -> Result<Node, TemplateError> {
        let (path, binding) = header
            .split_once('|')
            .ok_or_else(|| TemplateError::syntax(offset, "each needs a |binding|"))?;
        let binding = binding
            .strip_suffix('|')
            .map(str::trim)
            .filter(|b| !b.is_empty() && b.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
            .ok_or_else(|| TemplateError::syntax(offset, "malformed each binding"))?;
        let list = FieldPath::parse(path.trim(), offset)?;

        let (body, terminator) = self.block()?;
        match terminator {
            Some((_, tag)) if tag == "/each" => Ok(Node::Each {
                list,
                binding: binding.to_string(),
                body,
            }),
            Some((at, tag)) => Err(TemplateError::syntax(at, format!("unexpected '{tag}' in each"))),
            None => Err(TemplateError::syntax(offset, "each is never closed")),
        }
    }

    fn conditional(&mut self, offset: usize, header: &str) -> Result<Node, TemplateError> {
        let condition = parse_condition(header, offset)?;

        let (then, terminator) = self.block()?;
        let otherwise = match terminator {
            Some((_, tag)) if tag == "/if" => Vec::new(),
            Some((else_at, tag)) if tag == "else" => {
                let (otherwise, end) = self.block()?;
                match end {
                    Some((_, tag)) if tag == "/if" => otherwise,
                    Some((at, tag)) => {
                        return Err(TemplateError::syntax(at, format!("unexpected '{tag}' in else")))
                    }
                    None => return Err(TemplateError::syntax(else_at, "if is never closed")),
                }
            }
            Some((at, tag)) => {
                return Err(TemplateError::syntax(at, format!("unexpected '{tag}' in if")))
            }
            None => return Err(TemplateError::syntax(offset, "if is never closed")),
        };

        Ok(Node::If {
            condition,
            then,
            otherwise,
        })
    }
}

fn parse_condition(header: &str, offset: usize) -> Result<Condition, TemplateError> {
    if let Some(inner) = header.strip_prefix("not ") {
        return Ok(Condition::Not(Box::new(parse_condition(inner.trim(), offset)?)));
    }

    if let Some(args) = header.strip_prefix("contains(") {
        let args = args
            .strip_suffix(')')
            .ok_or_else(|| TemplateError::syntax(offset, "contains(...) is not closed"))?;
        let (path, needle) = args
            .split_once(',')
            .ok_or_else(|| TemplateError::syntax(offset, "contains needs two arguments"))?;
        let needle = needle
            .trim()
            .strip_prefix('"')
            .and_then(|n| n.strip_suffix('"'))
            .ok_or_else(|| TemplateError::syntax(offset, "contains needle must be quoted"))?;
        return Ok(Condition::Contains(
            FieldPath::parse(path.trim(), offset)?,
            needle.to_string(),
        ));
    }

    Ok(Condition::Truthy(FieldPath::parse(header, offset)?))
}

// ────────────────────────────────────────────────────────────────────────────
// Rendering
// ────────────────────────────────────────────────────────────────────────────

struct Scope<'a> {
    root: &'a Value,
    locals: Vec<(String, &'a Value)>,
}

static NULL: Value = Value::Null;

impl<'a> Scope<'a> {
    fn resolve(&self, path: &FieldPath) -> Result<&'a Value, TemplateError> {
        let (first, rest) = path
            .segments
            .split_first()
            .ok_or_else(|| TemplateError::UnknownField(path.raw.clone()))?;

        let mut current = match self.locals.iter().rev().find(|(name, _)| name == first) {
            Some((_, value)) => *value,
            None => self
                .root
                .get(first.as_str())
                .ok_or_else(|| TemplateError::UnknownField(path.raw.clone()))?,
        };

        for segment in rest {
            current = match current {
                Value::Object(map) => map.get(segment.as_str()).unwrap_or(&NULL),
                Value::Array(items) => segment
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| items.get(i))
                    .unwrap_or(&NULL),
                Value::Null => &NULL,
                _ => return Err(TemplateError::UnknownField(path.raw.clone())),
            };
        }
        Ok(current)
    }
}

fn render_nodes<'a>(
    nodes: &'a [Node],
    scope: &mut Scope<'a>,
    out: &mut String,
) -> Result<(), TemplateError> {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Field(path, filter) => match scope.resolve(path)? {
                Value::Null => {}
                Value::String(s) => filter.write(s, out),
                Value::Bool(b) => filter.write(&b.to_string(), out),
                Value::Number(n) => filter.write(&n.to_string(), out),
                Value::Array(_) | Value::Object(_) => {
                    return Err(TemplateError::NotScalar(path.raw.clone()))
                }
            },
            Node::Each {
                list,
                binding,
                body,
            } => {
                let items = match scope.resolve(list)? {
                    Value::Array(items) => items.as_slice(),
                    Value::Null => &[],
                    _ => return Err(TemplateError::NotIterable(list.raw.clone())),
                };
                for item in items {
                    scope.locals.push((binding.clone(), item));
                    let result = render_nodes(body, scope, out);
                    scope.locals.pop();
                    result?;
                }
            }
            Node::If {
                condition,
                then,
                otherwise,
            } => {
                let branch = if evaluate(condition, scope)? {
                    then
                } else {
                    otherwise
                };
                render_nodes(branch, scope, out)?;
            }
        }
    }
    Ok(())
}

fn evaluate(condition: &Condition, scope: &Scope<'_>) -> Result<bool, TemplateError> {
    Ok(match condition {
        Condition::Truthy(path) => is_truthy(scope.resolve(path)?),
        Condition::Not(inner) => !evaluate(inner, scope)?,
        Condition::Contains(path, needle) => match scope.resolve(path)? {
            Value::String(s) => s.contains(needle.as_str()),
            Value::Array(items) => items.iter().any(|v| v.as_str() == Some(needle.as_str())),
            _ => false,
        },
    })
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
