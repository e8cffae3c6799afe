use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::block::Block;

/// A named, ordered group of blocks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub name: String,
    pub blocks: Vec<Block>,
}

/// A converted quest document: the root of the tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quest {
    pub id: String,
    pub name: String,
    pub desc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Total blocks across all sections.
    pub block_count: usize,
    pub sections: Vec<Section>,
    pub updated_at: DateTime<Utc>,
    pub dependent_quests: Vec<String>,
    pub child_quests: Vec<String>,
}

/// The quest fields listed in an aggregate index, without the sections.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestSummary {
    pub id: String,
    pub name: String,
    pub desc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    pub block_count: usize,
    pub updated_at: DateTime<Utc>,
}

impl Quest {
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.sections.iter().flat_map(|section| section.blocks.iter())
    }

    pub fn find_block(&self, id: &str) -> Option<&Block> {
        self.blocks().find(|block| block.id() == id)
    }

    pub fn summary(&self) -> QuestSummary {
        QuestSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            desc: self.desc.clone(),
            category: self.category.clone(),
            tags: self.tags.clone(),
            block_count: self.block_count,
            updated_at: self.updated_at,
        }
    }

    /// Plain-text projection of the whole quest, section by section.
    pub fn text(&self) -> String {
        let mut text = format!("Quest: {}\n\n", self.name);
        for section in &self.sections {
            text.push_str(&format!("Section: {}\n\n", section.name));
            for block in &section.blocks {
                text.push_str(&block.text());
                text.push_str("\n\n");
            }
        }
        text.trim_end().to_string()
    }
}
