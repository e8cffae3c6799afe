use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::block::choice::{Choice, check_answer_keys, check_not_empty, choices_text, parse_choices};
use crate::block::{Block, BlockData, MarkdownBlock};
use crate::parser::error::ConvertError;
use crate::parser::properties::extract_properties;

pub const SINGLE_CHOICE_TYPE: &str = "SINGLE_CHOICE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SingleChoiceData {
    pub choices: Vec<Choice>,
    /// Key of the one correct choice.
    pub answer: String,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleChoiceBlock {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub content: String,
    pub question_data: SingleChoiceData,
    pub updated_at: DateTime<Utc>,
}

impl SingleChoiceBlock {
    pub fn new(
        id: impl Into<String>,
        content: impl Into<String>,
        question_data: SingleChoiceData,
    ) -> Self {
        SingleChoiceBlock {
            id: id.into(),
            name: None,
            content: content.into(),
            question_data,
            updated_at: Utc::now(),
        }
    }

    pub fn from_markdown(block: &MarkdownBlock) -> Result<Self, ConvertError> {
        let extracted = extract_properties(&block.raw_tokens);
        let question_data = SingleChoiceData {
            choices: parse_choices(extracted.property("choices").unwrap_or_default()),
            answer: extracted.property("answer").unwrap_or_default().trim().to_string(),
            explanation: extracted.property("explanation").unwrap_or_default().to_string(),
        };

        let mut single =
            SingleChoiceBlock::new(&block.id, extracted.content_or_property(), question_data);
        single.name = block.name.clone();
        single.validate()?;
        Ok(single)
    }
}

impl BlockData for SingleChoiceBlock {
    fn id(&self) -> &str {
        &self.id
    }

    fn block_type(&self) -> &str {
        SINGLE_CHOICE_TYPE
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
        if data.answer.is_empty() {
            return Err(ConvertError::validation(
                &self.id,
                format!("Answer is required for block ID: {}", self.id),
            ));
        }
        check_answer_keys(&self.id, &data.choices, [data.answer.as_str()])
    }

    fn text(&self) -> String {
        let data = &self.question_data;
        choices_text(&self.content, &data.choices, &data.answer, &data.explanation)
    }
}

pub fn convert_single_choice(block: &MarkdownBlock) -> Result<Block, ConvertError> {
    SingleChoiceBlock::from_markdown(block).map(Block::SingleChoice)
}
