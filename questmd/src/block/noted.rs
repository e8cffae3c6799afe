use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::block::{Block, BlockData, MarkdownBlock};
use crate::parser::error::ConvertError;
use crate::parser::properties::extract_properties;

/// The flavours of labelled statement a noted block can be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotedKind {
    Definition,
    Fact,
    Theorem,
    Proposition,
    Remark,
    Lemma,
}

impl NotedKind {
    pub const ALL: [NotedKind; 6] = [
        NotedKind::Definition,
        NotedKind::Fact,
        NotedKind::Theorem,
        NotedKind::Proposition,
        NotedKind::Remark,
        NotedKind::Lemma,
    ];

    /// The `type` discriminant.
    pub fn as_str(self) -> &'static str {
        match self {
            NotedKind::Definition => "DEFINITION",
            NotedKind::Fact => "FACT",
            NotedKind::Theorem => "THEOREM",
            NotedKind::Proposition => "PROPOSITION",
            NotedKind::Remark => "REMARK",
            NotedKind::Lemma => "LEMMA",
        }
    }

    /// The registry tag.
    pub fn tag(self) -> &'static str {
        match self {
            NotedKind::Definition => "definition",
            NotedKind::Fact => "fact",
            NotedKind::Theorem => "theorem",
            NotedKind::Proposition => "proposition",
            NotedKind::Remark => "remark",
            NotedKind::Lemma => "lemma",
        }
    }

    fn label(self) -> &'static str {
        match self {
            NotedKind::Definition => "Definition",
            NotedKind::Fact => "Fact",
            NotedKind::Theorem => "Theorem",
            NotedKind::Proposition => "Proposition",
            NotedKind::Remark => "Remark",
            NotedKind::Lemma => "Lemma",
        }
    }
}

impl fmt::Display for NotedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotedBlock {
    pub id: String,
    #[serde(skip)]
    pub kind: NotedKind,
    pub name: String,
    pub content: String,
    pub updated_at: DateTime<Utc>,
}

impl NotedBlock {
    pub fn new(id: impl Into<String>, kind: NotedKind, content: impl Into<String>) -> Self {
        NotedBlock {
            id: id.into(),
            kind,
            name: String::new(),
            content: content.into(),
            updated_at: Utc::now(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn from_markdown(block: &MarkdownBlock, kind: NotedKind) -> Result<Self, ConvertError> {
        let extracted = extract_properties(&block.raw_tokens);
        let noted = NotedBlock::new(&block.id, kind, extracted.content)
            .with_name(block.name.clone().unwrap_or_default());
        noted.validate()?;
        Ok(noted)
    }
}

impl BlockData for NotedBlock {
    fn id(&self) -> &str {
        &self.id
    }

    fn block_type(&self) -> &str {
        self.kind.as_str()
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn content(&self) -> &str {
        &self.content
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn validate(&self) -> Result<(), ConvertError> {
        if self.content.trim().is_empty() {
            return Err(ConvertError::validation(
                &self.id,
                format!(
                    "Content cannot be empty for block ID: {} (Type: {})",
                    self.id, self.kind
                ),
            ));
        }
        Ok(())
    }

    fn text(&self) -> String {
        format!("{}: {}\n{}", self.kind.label(), self.name, self.content)
    }
}

/// Converter for one noted kind, for registering under that kind's tag.
pub fn noted_converter(
    kind: NotedKind,
) -> impl Fn(&MarkdownBlock) -> Result<Block, ConvertError> + Send + Sync {
    move |block| NotedBlock::from_markdown(block, kind).map(Block::Noted)
}
