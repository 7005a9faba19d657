use crate::blocks::{Block, BlockType};
use crate::tasks::{Task, TaskStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_PROJECT_TITLE: &str = "New Project";
pub const DEFAULT_PROJECT_ICON: &str = "📝";

pub const ICON_CHOICES: &[&str] = &[
    "🚀", "📝", "✅", "📅", "💡", "🔥", "⭐", "🚩", "💼", "🎓", "🏠", "🛒", "✈️", "🎨", "💻",
    "📈", "📊", "🔔", "🎁", "🏆", "🔒", "🔑", "❤️", "💊", "⚽", "🎵", "📷", "📍", "⚙️", "🔍",
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub title: String,
    pub icon: String,
    pub blocks: Vec<Block>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn new() -> Self {
        Self::with_title(DEFAULT_PROJECT_TITLE)
    }

    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            icon: DEFAULT_PROJECT_ICON.to_string(),
            blocks: vec![Block::empty()],
            updated_at: Utc::now(),
        }
    }

    pub fn block(&self, id: &str) -> Option<&Block> {
        self.blocks.iter().find(|block| block.id == id)
    }

    pub fn block_index(&self, id: &str) -> Option<usize> {
        self.blocks.iter().position(|block| block.id == id)
    }

    /// Ids of the tasks referenced by this project, in block order.
    pub fn referenced_task_ids(&self) -> Vec<&str> {
        self.blocks
            .iter()
            .filter(|block| block.block_type == BlockType::TaskReference)
            .filter_map(|block| block.linked_task_id())
            .collect()
    }

    pub fn progress(&self, tasks: &[Task]) -> ProjectProgress {
        let resolved: Vec<&Task> = self
            .referenced_task_ids()
            .into_iter()
            .filter_map(|id| tasks.iter().find(|task| task.id == id))
            .collect();
        let total = resolved.len();
        let completed = resolved
            .iter()
            .filter(|task| task.status == TaskStatus::Completed)
            .count();
        ProjectProgress::new(total, completed)
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectProgress {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub percentage: u8,
}

impl ProjectProgress {
    fn new(total: usize, completed: usize) -> Self {
        let percentage = if total == 0 {
            0
        } else {
            ((completed as f64 / total as f64) * 100.0).round() as u8
        };
        Self {
            total,
            completed,
            pending: total - completed,
            percentage,
        }
    }
}
