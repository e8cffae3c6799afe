use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::block::{Block, BlockData, MarkdownBlock};
use crate::parser::error::ConvertError;
use crate::parser::properties::extract_properties;

pub const PARA_TYPE: &str = "PARA";

/// A plain paragraph of content.
///
/// ```text
/// Content.
///
/// #### Headline
/// Some title.
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParaBlock {
    pub id: String,
    pub content: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub headline: String,
    pub updated_at: DateTime<Utc>,
}

impl ParaBlock {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        ParaBlock {
            id: id.into(),
            content: content.into(),
            headline: String::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn from_markdown(block: &MarkdownBlock) -> Result<Self, ConvertError> {
        let extracted = extract_properties(&block.raw_tokens);
        let mut para = ParaBlock::new(&block.id, extracted.content_or_property());
        para.headline = extracted.property("headline").unwrap_or_default().to_string();
        para.validate()?;
        Ok(para)
    }
}

impl BlockData for ParaBlock {
    fn id(&self) -> &str {
        &self.id
    }

    fn block_type(&self) -> &str {
        PARA_TYPE
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
                format!("Content cannot be empty for block ID: {}", self.id),
            ));
        }
        Ok(())
    }

    fn text(&self) -> String {
        self.content.clone()
    }
}

pub fn convert_para(block: &MarkdownBlock) -> Result<Block, ConvertError> {
    ParaBlock::from_markdown(block).map(Block::Para)
}
