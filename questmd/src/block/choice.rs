//! Pieces shared by the choice-based blocks (single choice, selection, contradiction).

use serde::Serialize;

use crate::parser::error::ConvertError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub key: String,
    pub content: String,
}

impl Choice {
    pub fn new(key: impl Into<String>, content: impl Into<String>) -> Self {
        Choice {
            key: key.into(),
            content: content.into(),
        }
    }
}

/// Parse `key: content` lines. Lines without a key or content are skipped.
pub fn parse_choices(text: &str) -> Vec<Choice> {
    text.lines()
        .filter_map(|line| {
            let (key, content) = line.split_once(':')?;
            let (key, content) = (key.trim(), content.trim());
            (!key.is_empty() && !content.is_empty()).then(|| Choice::new(key, content))
        })
        .collect()
}

/// Parse a comma-separated answer. Blank and repeated keys are dropped;
/// the first occurrence of each key fixes its position.
pub fn parse_answer_keys(text: &str) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for key in text.split(',').map(str::trim) {
        if !key.is_empty() && !keys.iter().any(|k| k == key) {
            keys.push(key.to_string());
        }
    }
    keys
}

pub(crate) fn choice_keys(choices: &[Choice]) -> String {
    choices
        .iter()
        .map(|c| c.key.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Every key must name one of the choices.
pub(crate) fn check_answer_keys<'a>(
    block_id: &str,
    choices: &[Choice],
    keys: impl IntoIterator<Item = &'a str>,
) -> Result<(), ConvertError> {
    for key in keys {
        if !choices.iter().any(|c| c.key == key) {
            return Err(ConvertError::validation(
                block_id,
                format!(
                    "Answer key \"{}\" does not exist in choices ({}) for block ID: {}",
                    key,
                    choice_keys(choices),
                    block_id
                ),
            ));
        }
    }
    Ok(())
}

pub(crate) fn check_not_empty(
    block_id: &str,
    choices: &[Choice],
    explanation: &str,
) -> Result<(), ConvertError> {
    if choices.is_empty() {
        return Err(ConvertError::validation(
            block_id,
            format!("Choices cannot be empty for block ID: {}", block_id),
        ));
    }
    if explanation.trim().is_empty() {
        return Err(ConvertError::validation(
            block_id,
            format!("Explanation is required for block ID: {}", block_id),
        ));
    }
    Ok(())
}

/// `content`, then the choices, the answer and the explanation, in that order.
pub(crate) fn choices_text(
    content: &str,
    choices: &[Choice],
    answer: &str,
    explanation: &str,
) -> String {
    let mut text = format!("{}\n\nchoices:\n", content);
    for choice in choices {
        text.push_str(&format!("{}: {}\n", choice.key, choice.content));
    }
    text.push_str("\nanswer:\n");
    text.push_str(answer);
    text.push_str("\n\nexplanation:\n");
    text.push_str(explanation);
    text
}
