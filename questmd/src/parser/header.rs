use std::ops::Range;

use indexmap::IndexMap;

use crate::lexer::{Token, TokenKind};
use crate::parser::error::ConvertError;

const QUEST_PREFIX: &str = "Quest:";

/// The `# Quest: <name>` heading and the `key: value` lines after it.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestHeader {
    pub name: String,
    /// Every `key: value` line up to the first section, in document order.
    /// Keys are kept exactly as written (trimmed).
    pub fields: IndexMap<String, String>,
    /// Span of the level-1 heading.
    pub span: Range<usize>,
}

impl QuestHeader {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn id(&self) -> Option<&str> {
        self.get("id")
    }

    pub fn desc(&self) -> Option<&str> {
        self.get("desc")
    }

    pub fn category(&self) -> Option<&str> {
        self.get("category")
    }

    /// `tags: a, b` split on commas; blank entries are dropped.
    pub fn tags(&self) -> Option<Vec<String>> {
        self.get("tags").map(|tags| {
            tags.split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(str::to_string)
                .collect()
        })
    }
}

/// Find the first level-1 heading and read the header fields that follow it.
pub fn parse_quest_header(tokens: &[Token]) -> Result<QuestHeader, ConvertError> {
    let Some(start) = tokens.iter().position(|t| t.heading_depth() == Some(1)) else {
        return Err(ConvertError::malformed_header(
            "Quest header is missing: expected a `# Quest: <name>` heading",
        ));
    };
    let heading = &tokens[start];
    let text = heading.heading_text().unwrap_or_default();

    let Some(name) = text.strip_prefix(QUEST_PREFIX) else {
        return Err(ConvertError::malformed_header(format!(
            "Quest heading must start with \"{}\", found: {}",
            QUEST_PREFIX, text
        ))
        .with_span(heading.span.clone()));
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(ConvertError::malformed_header("Quest name cannot be empty")
            .with_span(heading.span.clone()));
    }

    let mut fields = IndexMap::new();
    for token in &tokens[start + 1..] {
        match &token.kind {
            TokenKind::Heading { depth: 2, .. } => break,
            TokenKind::Paragraph { text } => {
                for line in text.lines() {
                    if let Some((key, value)) = line.split_once(':') {
                        fields.insert(key.trim().to_string(), value.trim().to_string());
                    }
                }
            }
            _ => {}
        }
    }

    Ok(QuestHeader {
        name: name.to_string(),
        fields,
        span: heading.span.clone(),
    })
}
