use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::block::BlockData;
use crate::parser::error::ConvertError;

/// A block built by a converter registered at runtime.
///
/// The type string and question data are whatever that converter chose.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomBlock {
    pub id: String,
    #[serde(skip)]
    pub block_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_data: Option<serde_json::Value>,
    /// Text projection; the content is used when unset.
    #[serde(skip)]
    pub text: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl CustomBlock {
    pub fn new(
        id: impl Into<String>,
        block_type: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        CustomBlock {
            id: id.into(),
            block_type: block_type.into(),
            name: None,
            content: content.into(),
            question_data: None,
            text: None,
            updated_at: Utc::now(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_question_data(mut self, data: serde_json::Value) -> Self {
        self.question_data = Some(data);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

impl BlockData for CustomBlock {
    fn id(&self) -> &str {
        &self.id
    }

    fn block_type(&self) -> &str {
        &self.block_type
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
        if self.id.trim().is_empty() {
            return Err(ConvertError::validation(
                &self.id,
                format!("ID is required for block type: {}", self.block_type),
            ));
        }
        Ok(())
    }

    fn text(&self) -> String {
        self.text.clone().unwrap_or_else(|| self.content.clone())
    }
}
