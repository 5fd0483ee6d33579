//! Tag records and their line-oriented text form.
//!
//! A dissector prints one tag per line:
//!
//! ```text
//! [0x0,0x4) <I e_ident=0x464C457F
//! [0x10,0x12) <H e_type=0x2 ET_EXEC
//! [0x40,0x78) raw program header
//! ```

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{instrument, trace};

use crate::errors::{HierarchyError, HierarchyResult};
use crate::interval::Interval;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    fn sigil(self) -> char {
        match self {
            ByteOrder::Little => '<',
            ByteOrder::Big => '>',
        }
    }
}

/// What a tag's bytes hold.
///
/// Fixed-width integers are written with the struct-format codes the
/// dissectors print (`<I`, `>h`, ...). Anything not recognised is kept verbatim
/// in `Opaque`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TagKind {
    Int {
        width: u8,
        signed: bool,
        order: ByteOrder,
    },
    Raw,
    None,
    Fragment,
    Opaque(String),
}

impl TagKind {
    pub fn parse(code: &str) -> TagKind {
        match code {
            "raw" => return TagKind::Raw,
            "none" => return TagKind::None,
            "fragment" => return TagKind::Fragment,
            _ => {}
        }

        let mut chars = code.chars();
        let (Some(sigil), Some(letter), None) = (chars.next(), chars.next(), chars.next()) else {
            return TagKind::Opaque(code.to_string());
        };
        let order = match sigil {
            '<' => ByteOrder::Little,
            '>' => ByteOrder::Big,
            _ => return TagKind::Opaque(code.to_string()),
        };
        let width = match letter.to_ascii_uppercase() {
            'B' => 1,
            'H' => 2,
            'I' => 4,
            'Q' => 8,
            _ => return TagKind::Opaque(code.to_string()),
        };
        TagKind::Int {
            width,
            signed: letter.is_ascii_lowercase(),
            order,
        }
    }

    /// Byte width of fixed-width integer kinds.
    pub fn width(&self) -> Option<u64> {
        match self {
            TagKind::Int { width, .. } => Some(u64::from(*width)),
            _ => None,
        }
    }
}

impl FromStr for TagKind {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(TagKind::parse(s))
    }
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagKind::Int {
                width,
                signed,
                order,
            } => {
                let letter = match width {
                    1 => 'B',
                    2 => 'H',
                    4 => 'I',
                    _ => 'Q',
                };
                let letter = if *signed {
                    letter.to_ascii_lowercase()
                } else {
                    letter
                };
                write!(f, "{}{}", order.sigil(), letter)
            }
            TagKind::Raw => f.write_str("raw"),
            TagKind::None => f.write_str("none"),
            TagKind::Fragment => f.write_str("fragment"),
            TagKind::Opaque(code) => f.write_str(code),
        }
    }
}

/// A labeled byte range produced by a dissector.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    pub span: Interval,
    pub kind: TagKind,
    pub description: String,
}

impl Tag {
    pub fn new(begin: u64, end: u64, kind: TagKind, description: impl Into<String>) -> Self {
        Self {
            span: Interval::new(begin, end),
            kind,
            description: description.into(),
        }
    }

    /// Shorthand for a `raw` tag.
    pub fn raw(begin: u64, end: u64, description: impl Into<String>) -> Self {
        Self::new(begin, end, TagKind::Raw, description)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.span, self.kind)?;
        if !self.description.is_empty() {
            write!(f, " {}", self.description)?;
        }
        Ok(())
    }
}

fn tag_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\[\s*([0-9A-Za-z]+)\s*,\s*([0-9A-Za-z]+)\s*\)\s+(\S+)(?:\s+(.*))?$")
            .expect("tag line regex is valid")
    })
}

fn parse_offset(text: &str) -> Result<u64, String> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u64::from_str_radix(digits, 16).map_err(|e| format!("bad offset {text:?}: {e}"))
}

/// Parse one line of dissector output.
///
/// Blank lines yield `Ok(None)`. `line_no` is only used for error reporting.
pub fn parse_tag_line(line: &str, line_no: usize) -> HierarchyResult<Option<Tag>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let malformed = |reason: String| HierarchyError::MalformedTagLine {
        line: line_no,
        content: line.to_string(),
        reason,
    };

    let caps = tag_line_regex()
        .captures(trimmed)
        .ok_or_else(|| malformed("expected \"[<begin>,<end>) <kind> <description>\"".into()))?;

    let begin = parse_offset(&caps[1]).map_err(&malformed)?;
    let end = parse_offset(&caps[2]).map_err(&malformed)?;
    let kind = TagKind::parse(&caps[3]);
    let description = caps
        .get(4)
        .map(|m| m.as_str().trim_end().to_string())
        .unwrap_or_default();

    Ok(Some(Tag::new(begin, end, kind, description)))
}

/// Parse a whole dissector transcript, one tag per non-blank line.
#[instrument(level = "debug", skip(text))]
pub fn parse_tags(text: &str) -> HierarchyResult<Vec<Tag>> {
    let mut tags = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if let Some(tag) = parse_tag_line(line, i + 1)? {
            trace!(%tag, "parsed");
            tags.push(tag);
        }
    }
    Ok(tags)
}

/// Render tags back into the text form, one per line.
pub fn format_tags(tags: &[Tag]) -> String {
    tags.iter().map(|t| format!("{t}\n")).collect()
}
