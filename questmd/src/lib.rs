pub mod block;
pub mod lexer;
pub mod links;
pub mod parser;
pub mod registry;
pub mod schema;

pub use block::{Block, BlockData, MarkdownBlock};
pub use parser::{ConvertError, ErrorKind, Parser};
pub use registry::{BlockRegistry, register_block_converter};
pub use schema::{Quest, QuestSummary, Section};

/// Convert one quest markdown document with the process-wide block registry.
///
/// Converters registered through [`register_block_converter`] are visible
/// here. A converter must not register converters itself while running.
pub fn convert_quest_markdown(markdown: &str) -> Result<Quest, ConvertError> {
    let parser = Parser::new(markdown.to_string(), 0);
    registry::with_default_registry(|registry| parser.parse(registry))
}
