use std::collections::HashMap;
use std::sync::RwLock;

use once_cell::sync::Lazy;

use crate::block::contradiction::convert_contradiction;
use crate::block::noted::noted_converter;
use crate::block::para::convert_para;
use crate::block::proof_reorder::convert_proof_reorder;
use crate::block::selection::convert_selection;
use crate::block::single_choice::convert_single_choice;
use crate::block::tombstone::convert_tombstone;
use crate::block::{Block, MarkdownBlock, NotedKind};
use crate::parser::error::ConvertError;

/// Turns one raw block into a validated [`Block`].
pub type Converter = Box<dyn Fn(&MarkdownBlock) -> Result<Block, ConvertError> + Send + Sync>;

/// Converters indexed by lowercase block tag.
pub struct BlockRegistry {
    converters: HashMap<String, Converter>,
}

impl BlockRegistry {
    /// A registry with no converters at all.
    pub fn empty() -> Self {
        BlockRegistry {
            converters: HashMap::new(),
        }
    }

    /// A registry holding every built-in block type.
    pub fn with_builtins() -> Self {
        let mut registry = BlockRegistry::empty();
        registry.register("para", convert_para);
        for kind in NotedKind::ALL {
            registry.register(kind.tag(), noted_converter(kind));
        }
        registry.register("single_choice", convert_single_choice);
        registry.register("proof_reorder", convert_proof_reorder);
        registry.register("contradiction", convert_contradiction);
        registry.register("selection", convert_selection);
        registry.register("tombstone", convert_tombstone);
        registry
    }

    /// Register `converter` for `tag`, replacing any converter already there.
    pub fn register<F>(&mut self, tag: &str, converter: F)
    where
        F: Fn(&MarkdownBlock) -> Result<Block, ConvertError> + Send + Sync + 'static,
    {
        self.converters.insert(tag.to_lowercase(), Box::new(converter));
    }

    pub fn resolve(&self, tag: &str) -> Option<&Converter> {
        self.converters.get(&tag.to_lowercase())
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.resolve(tag).is_some()
    }

    /// Registered tags, sorted.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.converters.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    /// Convert a block with the converter registered for its tag.
    pub fn convert(&self, block: &MarkdownBlock) -> Result<Block, ConvertError> {
        let converter = self
            .resolve(&block.tag)
            .ok_or_else(|| ConvertError::unknown_block_type(&block.tag))?;
        converter(block)
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        BlockRegistry::with_builtins()
    }
}

static DEFAULT_REGISTRY: Lazy<RwLock<BlockRegistry>> =
    Lazy::new(|| RwLock::new(BlockRegistry::with_builtins()));

/// Register a converter in the process-wide registry used by
/// [`convert_quest_markdown`](crate::convert_quest_markdown).
pub fn register_block_converter<F>(tag: &str, converter: F)
where
    F: Fn(&MarkdownBlock) -> Result<Block, ConvertError> + Send + Sync + 'static,
{
    let mut registry = DEFAULT_REGISTRY.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    registry.register(tag, converter);
}

/// Run `f` with shared access to the process-wide registry.
pub fn with_default_registry<T>(f: impl FnOnce(&BlockRegistry) -> T) -> T {
    let registry = DEFAULT_REGISTRY.read().unwrap_or_else(|poisoned| poisoned.into_inner());
    f(&registry)
}
