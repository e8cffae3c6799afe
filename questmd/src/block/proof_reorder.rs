use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::block::{Block, BlockData, MarkdownBlock};
use crate::parser::error::ConvertError;
use crate::parser::properties::extract_properties;

pub const PROOF_REORDER_TYPE: &str = "PROOF_REORDER";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItem {
    /// 1-based position of the part in the source.
    pub id: String,
    pub content: String,
}

impl OrderItem {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        OrderItem {
            id: id.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofReorderData {
    /// Parts in their correct order.
    pub order_items: Vec<OrderItem>,
    /// Comma-separated item ids in the order they are shown to the reader.
    pub question_order: String,
}

/// A proof whose parts the reader puts back in order.
///
/// ```text
/// Prove that 2 + 2 = 4.
///
/// #### Part 1
/// ...
/// #### Part 2
/// ...
/// #### Question Order
/// 2,1
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofReorderBlock {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub content: String,
    pub question_data: ProofReorderData,
    pub updated_at: DateTime<Utc>,
}

impl ProofReorderBlock {
    pub fn new(
        id: impl Into<String>,
        content: impl Into<String>,
        question_data: ProofReorderData,
    ) -> Self {
        ProofReorderBlock {
            id: id.into(),
            name: None,
            content: content.into(),
            question_data,
            updated_at: Utc::now(),
        }
    }

    pub fn from_markdown(block: &MarkdownBlock) -> Result<Self, ConvertError> {
        let extracted = extract_properties(&block.raw_tokens);
        let order_items = extracted
            .properties
            .iter()
            .filter(|(name, _)| is_part_name(name))
            .enumerate()
            .map(|(i, (_, content))| OrderItem::new((i + 1).to_string(), content.as_str()))
            .collect();
        let question_data = ProofReorderData {
            order_items,
            question_order: extracted
                .property("question order")
                .unwrap_or_default()
                .trim()
                .to_string(),
        };

        let mut reorder =
            ProofReorderBlock::new(&block.id, extracted.content_or_property(), question_data);
        reorder.name = block.name.clone();
        reorder.validate()?;
        Ok(reorder)
    }
}

/// `part <n>`, as lowercased by the property extractor.
fn is_part_name(name: &str) -> bool {
    name.strip_prefix("part")
        .map(str::trim)
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}

impl BlockData for ProofReorderBlock {
    fn id(&self) -> &str {
        &self.id
    }

    fn block_type(&self) -> &str {
        PROOF_REORDER_TYPE
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn content(&self) -> &str {
        &self.content
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn validate(&self) -> Result<(), ConvertError> {
        let data = &self.question_data;
        if data.order_items.is_empty() {
            return Err(ConvertError::validation(
                &self.id,
                format!("Parts cannot be empty for block ID: {}", self.id),
            ));
        }
        if data.question_order.is_empty() {
            return Err(ConvertError::validation(
                &self.id,
                format!("Question order is required for block ID: {}", self.id),
            ));
        }

        let order: Vec<&str> = data.question_order.split(',').map(str::trim).collect();
        if order.len() != data.order_items.len() {
            return Err(ConvertError::validation(
                &self.id,
                format!(
                    "Number of parts ({}) does not match the length of question order ({}) \
                     for block ID: {}",
                    data.order_items.len(),
                    order.len(),
                    self.id
                ),
            ));
        }
        for entry in order {
            if !data.order_items.iter().any(|item| item.id == entry) {
                let ids: Vec<&str> = data.order_items.iter().map(|item| item.id.as_str()).collect();
                return Err(ConvertError::validation(
                    &self.id,
                    format!(
                        "Question order entry \"{}\" does not match any part ({}) for block ID: {}",
                        entry,
                        ids.join(", "),
                        self.id
                    ),
                ));
            }
        }
        Ok(())
    }

    fn text(&self) -> String {
        let mut text = format!("Proof:\n\n{}\n\n", self.content);
        for (i, item) in self.question_data.order_items.iter().enumerate() {
            text.push_str(&format!("part-{}:\n{}\n\n", i + 1, item.content));
        }
        text
    }
}

pub fn convert_proof_reorder(block: &MarkdownBlock) -> Result<Block, ConvertError> {
    ProofReorderBlock::from_markdown(block).map(Block::ProofReorder)
}
