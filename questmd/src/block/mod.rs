pub mod choice;
pub mod contradiction;
pub mod custom;
pub mod noted;
pub mod para;
pub mod proof_reorder;
pub mod selection;
pub mod single_choice;
pub mod tombstone;

use std::ops::Range;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::lexer::{Token, lex};
use crate::parser::error::ConvertError;

pub use choice::Choice;
pub use contradiction::{ContradictionBlock, ContradictionData};
pub use custom::CustomBlock;
pub use noted::{NotedBlock, NotedKind};
pub use para::ParaBlock;
pub use proof_reorder::{OrderItem, ProofReorderBlock, ProofReorderData};
pub use selection::{SelectionBlock, SelectionData};
pub use single_choice::{SingleChoiceBlock, SingleChoiceData};
pub use tombstone::TombstoneBlock;

/// A block as cut out of the document, before conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkdownBlock {
    /// Lowercased block-type keyword from the `### <tag>: <name>` heading.
    pub tag: String,
    /// Label after the colon, if any.
    pub name: Option<String>,
    /// From the `id:` line under the heading.
    pub id: String,
    /// Body tokens, including `####` property headings.
    pub raw_tokens: Vec<Token>,
    /// Span of the block heading in the original input.
    pub span: Range<usize>,
}

impl MarkdownBlock {
    pub fn new(tag: impl Into<String>, id: impl Into<String>, raw_tokens: Vec<Token>) -> Self {
        MarkdownBlock {
            tag: tag.into(),
            name: None,
            id: id.into(),
            raw_tokens,
            span: 0..0,
        }
    }

    /// Build a block by lexing `body` as its markdown.
    pub fn parse(
        tag: impl Into<String>,
        id: impl Into<String>,
        body: &str,
    ) -> Result<Self, ConvertError> {
        Ok(MarkdownBlock::new(tag, id, lex(body)?))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Behaviour shared by every block variant.
pub trait BlockData {
    fn id(&self) -> &str;

    /// The `type` discriminant, e.g. `PARA` or `SINGLE_CHOICE`.
    fn block_type(&self) -> &str;

    fn name(&self) -> Option<&str> {
        None
    }

    fn content(&self) -> &str;

    fn updated_at(&self) -> DateTime<Utc>;

    /// Check the variant's contract. Converters call this before returning.
    fn validate(&self) -> Result<(), ConvertError>;

    /// Canonical plain-text projection of the block.
    fn text(&self) -> String;
}

/// A converted, validated block.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Para(ParaBlock),
    Noted(NotedBlock),
    SingleChoice(SingleChoiceBlock),
    Selection(SelectionBlock),
    ProofReorder(ProofReorderBlock),
    Contradiction(ContradictionBlock),
    Tombstone(TombstoneBlock),
    /// Produced by converters registered at runtime.
    Custom(CustomBlock),
}

impl Block {
    pub fn data(&self) -> &dyn BlockData {
        match self {
            Block::Para(b) => b,
            Block::Noted(b) => b,
            Block::SingleChoice(b) => b,
            Block::Selection(b) => b,
            Block::ProofReorder(b) => b,
            Block::Contradiction(b) => b,
            Block::Tombstone(b) => b,
            Block::Custom(b) => b,
        }
    }

    pub fn id(&self) -> &str {
        self.data().id()
    }

    pub fn block_type(&self) -> &str {
        self.data().block_type()
    }

    pub fn name(&self) -> Option<&str> {
        self.data().name()
    }

    pub fn content(&self) -> &str {
        self.data().content()
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.data().updated_at()
    }

    pub fn validate(&self) -> Result<(), ConvertError> {
        self.data().validate()
    }

    pub fn text(&self) -> String {
        self.data().text()
    }
}

/// Serializes a variant's own fields next to its `type` discriminant.
#[derive(Serialize)]
struct Tagged<'a, T> {
    #[serde(rename = "type")]
    block_type: &'a str,
    #[serde(flatten)]
    data: &'a T,
}

fn serialize_tagged<T, S>(data: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: BlockData + Serialize,
    S: Serializer,
{
    Tagged {
        block_type: data.block_type(),
        data,
    }
    .serialize(serializer)
}

impl Serialize for Block {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Block::Para(b) => serialize_tagged(b, serializer),
            Block::Noted(b) => serialize_tagged(b, serializer),
            Block::SingleChoice(b) => serialize_tagged(b, serializer),
            Block::Selection(b) => serialize_tagged(b, serializer),
            Block::ProofReorder(b) => serialize_tagged(b, serializer),
            Block::Contradiction(b) => serialize_tagged(b, serializer),
            Block::Tombstone(b) => serialize_tagged(b, serializer),
            Block::Custom(b) => serialize_tagged(b, serializer),
        }
    }
}
