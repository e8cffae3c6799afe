use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::block::{Block, BlockData, MarkdownBlock};
use crate::parser::error::ConvertError;

pub const TOMBSTONE_TYPE: &str = "TOMBSTONE";

/// Marks the end of a proof. Carries no body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TombstoneBlock {
    pub id: String,
    pub content: String,
    pub updated_at: DateTime<Utc>,
}

impl TombstoneBlock {
    pub fn new(id: impl Into<String>) -> Self {
        TombstoneBlock {
            id: id.into(),
            content: String::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn from_markdown(block: &MarkdownBlock) -> Result<Self, ConvertError> {
        let tombstone = TombstoneBlock::new(&block.id);
        tombstone.validate()?;
        Ok(tombstone)
    }
}

impl BlockData for TombstoneBlock {
    fn id(&self) -> &str {
        &self.id
    }

    fn block_type(&self) -> &str {
        TOMBSTONE_TYPE
    }

    fn content(&self) -> &str {
        &self.content
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn validate(&self) -> Result<(), ConvertError> {
        if self.id.trim().is_empty() {
            return Err(ConvertError::validation(&self.id, "ID is required"));
        }
        Ok(())
    }

    fn text(&self) -> String {
        "--- Proof End ---".to_string()
    }
}

pub fn convert_tombstone(block: &MarkdownBlock) -> Result<Block, ConvertError> {
    TombstoneBlock::from_markdown(block).map(Block::Tombstone)
}
