use indexmap::IndexMap;

use crate::lexer::{Token, tokens_to_markdown};
use crate::parser::error::{ConvertError, ErrorKind};

/// A block body split into its leading content and its `#### Name` properties.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extracted {
    /// Markdown before the first level-4 heading.
    pub content: String,
    /// Lowercased property name → markdown body, in order of first appearance.
    /// A repeated name keeps its first position but takes the last body.
    pub properties: IndexMap<String, String>,
}

impl Extracted {
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    /// The `Content` property when it is non-empty, the leading content otherwise.
    pub fn content_or_property(&self) -> &str {
        match self.property("content") {
            Some(content) if !content.is_empty() => content,
            _ => &self.content,
        }
    }
}

/// Split a token sequence on level-4 headings.
pub fn extract_properties(tokens: &[Token]) -> Extracted {
    let mut content_end = tokens.len();
    let mut sections: Vec<(String, &[Token])> = Vec::new();
    let mut current: Option<(String, usize)> = None;

    for (i, token) in tokens.iter().enumerate() {
        if token.heading_depth() != Some(4) {
            continue;
        }
        match current.take() {
            Some((name, from)) => sections.push((name, &tokens[from..i])),
            None => content_end = i,
        }
        let name = token.heading_text().unwrap_or_default().trim().to_lowercase();
        current = Some((name, i + 1));
    }
    if let Some((name, from)) = current {
        sections.push((name, &tokens[from..]));
    }

    let mut properties = IndexMap::new();
    for (name, body) in sections {
        properties.insert(name, tokens_to_markdown(body).trim().to_string());
    }

    Extracted {
        content: tokens_to_markdown(&tokens[..content_end]).trim().to_string(),
        properties,
    }
}

/// Fail with `"<name> is required"` for the first listed property that is missing or empty.
pub fn check_required_properties(
    properties: &IndexMap<String, String>,
    required: &[&str],
) -> Result<(), ConvertError> {
    for name in required {
        match properties.get(*name) {
            Some(value) if !value.is_empty() => {}
            _ => {
                return Err(ConvertError::new(
                    ErrorKind::Validation,
                    format!("{} is required", name),
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn required_properties_present() {
        let properties = props(&[("title", "Test Title"), ("content", "Test Content")]);
        assert!(check_required_properties(&properties, &["title", "content"]).is_ok());
        assert!(check_required_properties(&properties, &[]).is_ok());
    }

    #[test]
    fn first_missing_property_is_reported() {
        let properties = props(&[("description", "Test Description")]);
        let err = check_required_properties(&properties, &["title", "content"]).unwrap_err();
        assert_eq!(err.to_string(), "title is required");

        let properties = props(&[("title", "Test Title"), ("content", "")]);
        let err = check_required_properties(&properties, &["title", "content"]).unwrap_err();
        assert_eq!(err.to_string(), "content is required");
    }
}
