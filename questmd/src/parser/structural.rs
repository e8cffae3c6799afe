use std::ops::Range;

use crate::block::MarkdownBlock;
use crate::lexer::{Token, TokenKind};

const SECTION_PREFIX: &str = "Section:";
const ID_PREFIX: &str = "id:";

/// A section as cut out of the document, before its blocks are converted.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkdownSection {
    pub name: String,
    pub blocks: Vec<MarkdownBlock>,
    pub span: Range<usize>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Group tokens into sections (`##`) and blocks (`### <tag>: <name>`).
///
/// Tokens before the first section heading belong to the quest header and are
/// skipped here. Block ids are taken from `id:` paragraphs but not checked.
pub fn split_sections(tokens: &[Token]) -> Vec<MarkdownSection> {
    let mut state = SplitState::default();
    for token in tokens {
        state.process(token);
    }
    state.finalize()
}

// ---------------------------------------------------------------------------
// Split state
// ---------------------------------------------------------------------------

#[derive(Default)]
struct SplitState {
    /// Completed sections.
    sections: Vec<MarkdownSection>,
    section: Option<MarkdownSection>,
    block: Option<BlockBuilder>,
}

struct BlockBuilder {
    tag: String,
    name: Option<String>,
    id: String,
    tokens: Vec<Token>,
    span: Range<usize>,
}

impl BlockBuilder {
    /// Start a block from `<tag>: <name>` heading text.
    fn from_heading(text: &str, span: Range<usize>) -> Option<Self> {
        let (tag, name) = text.split_once(':')?;
        let name = name.trim();
        Some(BlockBuilder {
            tag: tag.trim().to_lowercase(),
            name: (!name.is_empty()).then(|| name.to_string()),
            id: String::new(),
            tokens: Vec::new(),
            span,
        })
    }

    fn into_block(self) -> MarkdownBlock {
        MarkdownBlock {
            tag: self.tag,
            name: self.name,
            id: self.id,
            raw_tokens: self.tokens,
            span: self.span,
        }
    }
}

impl SplitState {
    fn process(&mut self, token: &Token) {
        match &token.kind {
            TokenKind::Heading { depth: 2, text } => {
                self.flush_block();
                self.flush_section();

                let name = text.strip_prefix(SECTION_PREFIX).unwrap_or(text).trim();
                log::debug!("section: {}", name);
                self.section = Some(MarkdownSection {
                    name: name.to_string(),
                    blocks: Vec::new(),
                    span: token.span.clone(),
                });
            }
            TokenKind::Heading { depth: 3, text } if text.contains(':') => {
                self.flush_block();
                self.block = BlockBuilder::from_heading(text, token.span.clone());
            }
            TokenKind::Paragraph { text } if text.starts_with(ID_PREFIX) => {
                let Some(block) = self.block.as_mut() else {
                    return;
                };
                let (id, rest) = split_id_paragraph(token);
                block.id = id;
                block.tokens.extend(rest);
            }
            _ => {
                if let Some(block) = self.block.as_mut() {
                    block.tokens.push(token.clone());
                }
            }
        }
    }

    fn flush_block(&mut self) {
        let Some(builder) = self.block.take() else {
            return;
        };
        match self.section.as_mut() {
            Some(section) => {
                log::debug!("block: {} {:?} (id: {})", builder.tag, builder.name, builder.id);
                section.blocks.push(builder.into_block());
            }
            None => log::warn!("dropping {} block outside of any section", builder.tag),
        }
    }

    fn flush_section(&mut self) {
        if let Some(section) = self.section.take() {
            self.sections.push(section);
        }
    }

    fn finalize(mut self) -> Vec<MarkdownSection> {
        self.flush_block();
        self.flush_section();
        self.sections
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// The id on the first line of an `id:` paragraph, and any lines after it as a body token.
fn split_id_paragraph(token: &Token) -> (String, Option<Token>) {
    let text = token.paragraph_text().unwrap_or_default();
    let first_line = text.lines().next().unwrap_or_default();
    let id = first_line[ID_PREFIX.len()..].trim().to_string();

    let rest = token.raw.find('\n').and_then(|newline| {
        let raw = &token.raw[newline + 1..];
        if raw.trim().is_empty() {
            return None;
        }
        let start = token.span.start + newline + 1;
        Some(Token::new(
            TokenKind::Paragraph {
                text: raw.trim().to_string(),
            },
            raw,
            start..token.span.end,
        ))
    });

    (id, rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph(raw: &str) -> Token {
        Token::new(
            TokenKind::Paragraph {
                text: raw.trim().to_string(),
            },
            raw,
            10..10 + raw.len(),
        )
    }

    #[test]
    fn id_paragraph_with_single_line() {
        let (id, rest) = split_id_paragraph(&paragraph("id: para-1\n"));
        assert_eq!(id, "para-1");
        assert!(rest.is_none());
    }

    #[test]
    fn lines_after_the_id_stay_in_the_body() {
        let (id, rest) = split_id_paragraph(&paragraph("id: para-1\nBody line.\n"));
        assert_eq!(id, "para-1");
        let rest = rest.expect("body token");
        assert_eq!(rest.raw, "Body line.\n");
        assert_eq!(rest.paragraph_text(), Some("Body line."));
        assert_eq!(rest.span, 21..32);
    }
}
