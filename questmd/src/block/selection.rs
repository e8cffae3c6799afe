use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::block::choice::{
    Choice, check_answer_keys, check_not_empty, choices_text, parse_answer_keys, parse_choices,
};
use crate::block::{Block, BlockData, MarkdownBlock};
use crate::parser::error::ConvertError;
use crate::parser::properties::extract_properties;

pub const SELECTION_TYPE: &str = "SELECTION";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionData {
    pub choices: Vec<Choice>,
    /// One or more choice keys, without duplicates.
    pub answer: Vec<String>,
    pub explanation: String,
}

/// A multiple-answer question.
///
/// ```text
/// Which of the following are prime?
///
/// #### Choices
/// a: 2
/// b: 4
/// c: 3
///
/// #### Answer
/// a, c
///
/// #### Explanation
/// 4 is composite.
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionBlock {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub content: String,
    pub question_data: SelectionData,
    pub updated_at: DateTime<Utc>,
}

impl SelectionBlock {
    pub fn new(
        id: impl Into<String>,
        content: impl Into<String>,
        question_data: SelectionData,
    ) -> Self {
        SelectionBlock {
            id: id.into(),
            name: None,
            content: content.into(),
            question_data,
            updated_at: Utc::now(),
        }
    }

    pub fn from_markdown(block: &MarkdownBlock) -> Result<Self, ConvertError> {
        let extracted = extract_properties(&block.raw_tokens);
        let question_data = SelectionData {
            choices: parse_choices(extracted.property("choices").unwrap_or_default()),
            answer: parse_answer_keys(extracted.property("answer").unwrap_or_default()),
            explanation: extracted.property("explanation").unwrap_or_default().to_string(),
        };

        let mut selection =
            SelectionBlock::new(&block.id, extracted.content_or_property(), question_data);
        selection.name = block.name.clone();
        selection.validate()?;
        Ok(selection)
    }
}

impl BlockData for SelectionBlock {
    fn id(&self) -> &str {
        &self.id
    }

    fn block_type(&self) -> &str {
        SELECTION_TYPE
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
        let SelectionData {
            choices,
            answer,
            explanation,
        } = &self.question_data;

        check_not_empty(&self.id, choices, explanation)?;
        if answer.is_empty() {
            return Err(ConvertError::validation(
                &self.id,
                format!("Answer must contain at least 1 key for block ID: {}", self.id),
            ));
        }
        check_answer_keys(&self.id, choices, answer.iter().map(String::as_str))
    }

    fn text(&self) -> String {
        let data = &self.question_data;
        choices_text(&self.content, &data.choices, &data.answer.join(", "), &data.explanation)
    }
}

pub fn convert_selection(block: &MarkdownBlock) -> Result<Block, ConvertError> {
    SelectionBlock::from_markdown(block).map(Block::Selection)
}
