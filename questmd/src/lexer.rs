//! Folds pulldown-cmark's event stream into a flat sequence of top-level tokens.
//!
//! Every token keeps the exact slice of source it came from, and the gaps
//! between top-level elements become [`TokenKind::Space`] tokens, so the raw
//! text of all tokens concatenated is the input again. Later stages slice the
//! stream into ranges and re-join them with [`tokens_to_markdown`].

use std::ops::Range;

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser as CmarkParser, Tag};

use crate::parser::error::ConvertError;

/// One markdown syntactic unit at the top level of a document.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text of the token, byte-for-byte.
    pub raw: String,
    /// Byte span of `raw` in the lexed text.
    pub span: Range<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Heading { depth: u8, text: String },
    Paragraph { text: String },
    List { ordered: bool },
    Code { lang: Option<String>, body: String },
    /// A paragraph holding nothing but `$$ ... $$` display math.
    Math { body: String },
    BlockQuote,
    Table,
    Html,
    Rule,
    /// Blank lines between elements.
    Space,
    /// Anything else pulldown-cmark does not report as a block (link reference definitions).
    Other,
}

impl Token {
    pub fn new(kind: TokenKind, raw: impl Into<String>, span: Range<usize>) -> Self {
        Token {
            kind,
            raw: raw.into(),
            span,
        }
    }

    pub fn heading_depth(&self) -> Option<u8> {
        match self.kind {
            TokenKind::Heading { depth, .. } => Some(depth),
            _ => None,
        }
    }

    /// Heading text, for heading tokens.
    pub fn heading_text(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Heading { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Paragraph text without the trailing line break, for paragraph tokens.
    pub fn paragraph_text(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Paragraph { text } => Some(text),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Lex markdown text into top-level tokens.
pub fn lex(source: &str) -> Result<Vec<Token>, ConvertError> {
    let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES | Options::ENABLE_MATH;
    let mut state = LexState::new(source);
    for (event, range) in CmarkParser::new_ext(source, options).into_offset_iter() {
        state.feed(event, range)?;
    }
    let tokens = state.finish()?;
    log::trace!("lexed {} tokens from {} bytes", tokens.len(), source.len());
    Ok(tokens)
}

/// Serialize a token subsequence back into markdown.
///
/// Joining every token of `lex(source)` gives back `source` byte for byte.
pub fn tokens_to_markdown(tokens: &[Token]) -> String {
    tokens.iter().map(|t| t.raw.as_str()).collect()
}

// ---------------------------------------------------------------------------
// Lex state
// ---------------------------------------------------------------------------

struct LexState<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    /// End of the last emitted token.
    cursor: usize,
    /// Nesting depth of open tags; 0 = top level.
    depth: usize,
    open: Option<OpenElement>,
}

/// The top-level element currently being read.
struct OpenElement {
    tag: OpenTag,
    span: Range<usize>,
    code_body: String,
    math_body: String,
    only_math: bool,
}

enum OpenTag {
    Heading(u8),
    Paragraph,
    List(bool),
    Code(Option<String>),
    BlockQuote,
    Table,
    Html,
    Other,
}

impl<'a> LexState<'a> {
    fn new(source: &'a str) -> Self {
        LexState {
            source,
            tokens: Vec::new(),
            cursor: 0,
            depth: 0,
            open: None,
        }
    }

    fn feed(&mut self, event: Event<'_>, range: Range<usize>) -> Result<(), ConvertError> {
        match event {
            Event::Start(tag) => {
                if self.depth == 0 {
                    self.open = Some(OpenElement {
                        tag: open_tag(&tag),
                        span: range,
                        code_body: String::new(),
                        math_body: String::new(),
                        only_math: true,
                    });
                }
                self.depth += 1;
            }
            Event::End(_) => {
                self.depth = self.depth.saturating_sub(1);
                if self.depth == 0 {
                    if let Some(open) = self.open.take() {
                        self.close(open)?;
                    }
                }
            }
            Event::Rule if self.depth == 0 => self.push(TokenKind::Rule, range)?,
            _ if self.depth == 0 => self.push(TokenKind::Other, range)?,
            event => self.inner(event),
        }
        Ok(())
    }

    /// Record content events nested inside the open element.
    fn inner(&mut self, event: Event<'_>) {
        let Some(open) = self.open.as_mut() else {
            return;
        };
        match (&open.tag, event) {
            (OpenTag::Code(_), Event::Text(text)) => open.code_body.push_str(&text),
            (OpenTag::Paragraph, Event::DisplayMath(math)) => open.math_body.push_str(&math),
            (OpenTag::Paragraph, Event::SoftBreak) => {}
            (OpenTag::Paragraph, Event::Text(text)) if text.trim().is_empty() => {}
            (OpenTag::Paragraph, _) => open.only_math = false,
            _ => {}
        }
    }

    fn close(&mut self, open: OpenElement) -> Result<(), ConvertError> {
        let raw = self.slice(open.span.clone())?;
        let kind = match open.tag {
            OpenTag::Heading(depth) => TokenKind::Heading {
                depth,
                text: heading_text(raw),
            },
            OpenTag::Paragraph if open.only_math && !open.math_body.is_empty() => TokenKind::Math {
                body: open.math_body,
            },
            OpenTag::Paragraph => TokenKind::Paragraph {
                text: raw.trim().to_string(),
            },
            OpenTag::List(ordered) => TokenKind::List { ordered },
            OpenTag::Code(lang) => TokenKind::Code {
                lang,
                body: open.code_body,
            },
            OpenTag::BlockQuote => TokenKind::BlockQuote,
            OpenTag::Table => TokenKind::Table,
            OpenTag::Html => TokenKind::Html,
            OpenTag::Other => TokenKind::Other,
        };
        self.push(kind, open.span)
    }

    fn push(&mut self, kind: TokenKind, span: Range<usize>) -> Result<(), ConvertError> {
        let start = span.start.max(self.cursor);
        if span.end <= start {
            return Ok(());
        }
        self.fill_gap(start)?;
        let raw = self.slice(start..span.end)?.to_string();
        self.tokens.push(Token::new(kind, raw, start..span.end));
        self.cursor = span.end;
        Ok(())
    }

    /// Emit whatever source lies between the cursor and `until`.
    fn fill_gap(&mut self, until: usize) -> Result<(), ConvertError> {
        if until <= self.cursor {
            return Ok(());
        }
        let raw = self.slice(self.cursor..until)?;
        let kind = if raw.trim().is_empty() {
            TokenKind::Space
        } else {
            TokenKind::Other
        };
        let raw = raw.to_string();
        self.tokens.push(Token::new(kind, raw, self.cursor..until));
        self.cursor = until;
        Ok(())
    }

    fn slice(&self, range: Range<usize>) -> Result<&'a str, ConvertError> {
        self.source.get(range.clone()).ok_or_else(|| {
            ConvertError::lex(
                format!(
                    "token range {}..{} does not fall on character boundaries",
                    range.start, range.end
                ),
                range,
            )
        })
    }

    fn finish(mut self) -> Result<Vec<Token>, ConvertError> {
        if let Some(open) = self.open.take() {
            self.close(open)?;
        }
        self.fill_gap(self.source.len())?;
        Ok(self.tokens)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn open_tag(tag: &Tag<'_>) -> OpenTag {
    match tag {
        Tag::Heading { level, .. } => OpenTag::Heading(heading_level_to_u8(level)),
        Tag::Paragraph => OpenTag::Paragraph,
        Tag::List(start) => OpenTag::List(start.is_some()),
        Tag::CodeBlock(CodeBlockKind::Fenced(info)) => {
            let lang = info.split_whitespace().next().map(str::to_string);
            OpenTag::Code(lang)
        }
        Tag::CodeBlock(CodeBlockKind::Indented) => OpenTag::Code(None),
        Tag::BlockQuote(_) => OpenTag::BlockQuote,
        Tag::Table(_) => OpenTag::Table,
        Tag::HtmlBlock => OpenTag::Html,
        _ => OpenTag::Other,
    }
}

fn heading_level_to_u8(level: &HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Heading text as written, without markers.
///
/// ATX headings lose the leading `#`s and an optional closing sequence;
/// setext headings lose their underline.
fn heading_text(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Some(rest) = trimmed.strip_prefix('#') {
        let rest = rest.trim_start_matches('#');
        let closed = rest.trim_end_matches('#');
        let text = if closed.is_empty() || closed.ends_with([' ', '\t']) {
            closed
        } else {
            rest
        };
        return text.trim().to_string();
    }

    let mut lines: Vec<&str> = trimmed.lines().collect();
    lines.pop();
    lines
        .iter()
        .map(|line| line.trim())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::heading_text;

    #[test]
    fn atx_heading_markers_are_stripped() {
        assert_eq!(heading_text("### para: Welcome\n"), "para: Welcome");
        assert_eq!(heading_text("## Section: Intro ##"), "Section: Intro");
        assert_eq!(heading_text("# C#"), "C#");
    }

    #[test]
    fn setext_underline_is_dropped() {
        assert_eq!(heading_text("Quest: Title\n===\n"), "Quest: Title");
    }
}
