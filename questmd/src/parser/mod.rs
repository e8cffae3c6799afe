pub mod error;
pub mod header;
pub mod properties;
pub mod structural;

use std::collections::HashMap;

use chrono::Utc;

pub use error::{ConvertError, ErrorKind};
pub use header::{QuestHeader, parse_quest_header};
pub use properties::{Extracted, check_required_properties, extract_properties};
pub use structural::{MarkdownSection, split_sections};

use crate::lexer::lex;
use crate::links::{self, DEFAULT_ASSET_BASE, Rewritten};
use crate::registry::BlockRegistry;
use crate::schema::{Quest, Section};

/// A quest cut into sections and raw blocks, before block conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkdownQuest {
    pub header: QuestHeader,
    pub sections: Vec<MarkdownSection>,
}

/// Parser entry point.
pub struct Parser {
    source: String,
    file_id: usize,
    asset_base: String,
}

impl Parser {
    pub fn new(source: String, file_id: usize) -> Self {
        Parser {
            source,
            file_id,
            asset_base: DEFAULT_ASSET_BASE.to_string(),
        }
    }

    /// URL prefix for rewritten `![[image]]` embeds.
    pub fn with_asset_base(mut self, asset_base: impl Into<String>) -> Self {
        self.asset_base = asset_base.into();
        self
    }

    /// Split the source into header, sections and raw blocks, checking block ids.
    ///
    /// Spans in the result refer to the link-rewritten text; errors are
    /// reported against the original source.
    pub fn parse_markdown(&self) -> Result<MarkdownQuest, ConvertError> {
        let rewritten = links::rewrite(&self.source, &self.asset_base);
        self.split(&rewritten).map_err(|err| self.locate(err, &rewritten))
    }

    /// Parse the source into a complete Quest, converting blocks with `registry`.
    pub fn parse(&self, registry: &BlockRegistry) -> Result<Quest, ConvertError> {
        let rewritten = links::rewrite(&self.source, &self.asset_base);
        let parsed = self
            .split(&rewritten)
            .map_err(|err| self.locate(err, &rewritten))?;

        let mut sections = Vec::with_capacity(parsed.sections.len());
        for section in parsed.sections {
            let mut blocks = Vec::with_capacity(section.blocks.len());
            for block in &section.blocks {
                let converted = registry
                    .convert(block)
                    .map_err(|err| self.locate(err.or_span(block.span.clone()), &rewritten))?;
                blocks.push(converted);
            }
            sections.push(Section {
                name: section.name,
                blocks,
            });
        }

        let header = parsed.header;
        let id = header.id().unwrap_or_default().to_string();
        if id.is_empty() {
            log::warn!("quest \"{}\" has no id", header.name);
        }
        let block_count = sections.iter().map(|s| s.blocks.len()).sum();
        log::debug!(
            "quest \"{}\": {} sections, {} blocks",
            header.name,
            sections.len(),
            block_count
        );

        Ok(Quest {
            id,
            desc: header.desc().unwrap_or_default().to_string(),
            category: header.category().map(str::to_string),
            tags: header.tags(),
            name: header.name,
            block_count,
            sections,
            updated_at: Utc::now(),
            dependent_quests: Vec::new(),
            child_quests: Vec::new(),
        })
    }

    fn split(&self, rewritten: &Rewritten) -> Result<MarkdownQuest, ConvertError> {
        let tokens = lex(&rewritten.text)?;
        let header = parse_quest_header(&tokens)?;
        let sections = split_sections(&tokens);
        check_block_ids(&header, &sections)?;
        Ok(MarkdownQuest { header, sections })
    }

    /// Point an error at the original source.
    fn locate(&self, mut err: ConvertError, rewritten: &Rewritten) -> ConvertError {
        err.span = err.span.map(|span| rewritten.original_span(&span));
        err.with_file_id(self.file_id)
    }
}

/// Every block needs a non-empty id, unique within the quest.
fn check_block_ids(header: &QuestHeader, sections: &[MarkdownSection]) -> Result<(), ConvertError> {
    let mut seen: HashMap<&str, &str> = HashMap::new();

    for (section_index, section) in sections.iter().enumerate() {
        for (block_index, block) in section.blocks.iter().enumerate() {
            let block_name = block.name.as_deref().unwrap_or("(unnamed)");
            if block.id.trim().is_empty() {
                return Err(ConvertError::new(
                    ErrorKind::MissingBlockId,
                    format!(
                        "Block ID is missing for block {} ({}: {}) in section {} (\"{}\") \
                         of quest \"{}\" (id: {})",
                        block_index + 1,
                        block.tag,
                        block_name,
                        section_index + 1,
                        section.name,
                        header.name,
                        header.id().unwrap_or_default(),
                    ),
                )
                .with_span(block.span.clone())
                .with_note("add an `id: <block id>` line right after the block heading"));
            }

            if let Some(first_section) = seen.insert(&block.id, &section.name) {
                return Err(ConvertError::new(
                    ErrorKind::DuplicateBlockId,
                    format!(
                        "Duplicate block ID \"{}\" for block {} ({}: {}) in section \"{}\": \
                         already used in section \"{}\"",
                        block.id,
                        block_index + 1,
                        block.tag,
                        block_name,
                        section.name,
                        first_section,
                    ),
                )
                .with_span(block.span.clone()));
            }
        }
    }
    Ok(())
}
