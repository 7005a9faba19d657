use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    #[default]
    Text,
    #[serde(rename = "h1")]
    Heading1,
    #[serde(rename = "h2")]
    Heading2,
    #[serde(rename = "bullet")]
    BulletItem,
    #[serde(rename = "task")]
    TaskReference,
}

impl BlockType {
    /// Task references embed a task row instead of an editable surface.
    pub fn is_editable(&self) -> bool {
        !matches!(self, BlockType::TaskReference)
    }

    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            BlockType::Heading1 => Some("Heading 1"),
            BlockType::Heading2 => Some("Heading 2"),
            BlockType::Text | BlockType::BulletItem => Some("Type '/' for commands..."),
            BlockType::TaskReference => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: String,
    #[serde(rename = "type")]
    pub block_type: BlockType,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

impl Block {
    pub fn new(block_type: BlockType, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            block_type,
            content: content.into(),
            task_id: None,
        }
    }

    pub fn empty() -> Self {
        Self::new(BlockType::Text, String::new())
    }

    pub fn task_reference(task_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            block_type: BlockType::TaskReference,
            content: String::new(),
            task_id: Some(task_id.into()),
        }
    }

    /// The task this block points at. Only task references carry one.
    pub fn linked_task_id(&self) -> Option<&str> {
        match self.block_type {
            BlockType::TaskReference => self.task_id.as_deref(),
            _ => None,
        }
    }
}

/// Field-level patch for `EditorModel::update_block`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockPatch {
    pub block_type: Option<BlockType>,
    pub content: Option<String>,
    pub task_id: Option<Option<String>>,
}

impl BlockPatch {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn block_type(block_type: BlockType) -> Self {
        Self {
            block_type: Some(block_type),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.block_type.is_none() && self.content.is_none() && self.task_id.is_none()
    }
}
