use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::block::choice::{
    Choice, check_answer_keys, check_not_empty, choices_text, parse_answer_keys, parse_choices,
};
use crate::block::{Block, BlockData, MarkdownBlock};
use crate::parser::error::ConvertError;
use crate::parser::properties::extract_properties;

pub const CONTRADICTION_TYPE: &str = "CONTRADICTION";

/// Number of statements the reader must pick as contradicting each other.
const ANSWER_KEYS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContradictionData {
    pub choices: Vec<Choice>,
    /// The two contradicting choice keys.
    pub answer: Vec<String>,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContradictionBlock {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub content: String,
    pub question_data: ContradictionData,
    pub updated_at: DateTime<Utc>,
}

impl ContradictionBlock {
    pub fn new(
        id: impl Into<String>,
        content: impl Into<String>,
        question_data: ContradictionData,
    ) -> Self {
        ContradictionBlock {
            id: id.into(),
            name: None,
            content: content.into(),
            question_data,
            updated_at: Utc::now(),
        }
    }

    pub fn from_markdown(block: &MarkdownBlock) -> Result<Self, ConvertError> {
        let extracted = extract_properties(&block.raw_tokens);
        let question_data = ContradictionData {
            choices: parse_choices(extracted.property("choices").unwrap_or_default()),
            answer: parse_answer_keys(extracted.property("answer").unwrap_or_default()),
            explanation: extracted.property("explanation").unwrap_or_default().to_string(),
        };

        let mut contradiction =
            ContradictionBlock::new(&block.id, extracted.content_or_property(), question_data);
        contradiction.name = block.name.clone();
        contradiction.validate()?;
        Ok(contradiction)
    }
}

impl BlockData for ContradictionBlock {
    fn id(&self) -> &str {
        &self.id
    }

    fn block_type(&self) -> &str {
        CONTRADICTION_TYPE
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
        check_not_empty(&self.id, &data.choices, &data.explanation)?;
        if data.answer.len() != ANSWER_KEYS {
            return Err(ConvertError::validation(
                &self.id,
                format!(
                    "Answer must contain exactly {} keys, found {} for block ID: {}",
                    ANSWER_KEYS,
                    data.answer.len(),
                    self.id
                ),
            ));
        }
        check_answer_keys(&self.id, &data.choices, data.answer.iter().map(String::as_str))
    }

    fn text(&self) -> String {
        let data = &self.question_data;
        choices_text(&self.content, &data.choices, &data.answer.join(", "), &data.explanation)
    }
}

pub fn convert_contradiction(block: &MarkdownBlock) -> Result<Block, ConvertError> {
    ContradictionBlock::from_markdown(block).map(Block::Contradiction)
}
