use crate::blocks::{Block, BlockType};
use crate::tasks::{Task, TaskStatus};
use tracing::debug;

pub const TASK_NOT_FOUND: &str = "Task not found";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeadingLevel {
    One,
    Two,
}

/// Render-ready view of one block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockView<'a> {
    Paragraph {
        block: &'a Block,
    },
    Heading {
        block: &'a Block,
        level: HeadingLevel,
    },
    Bullet {
        block: &'a Block,
    },
    Task {
        block: &'a Block,
        task: &'a Task,
    },
    MissingTask {
        block: &'a Block,
    },
}

impl<'a> BlockView<'a> {
    pub fn block(&self) -> &'a Block {
        match self {
            BlockView::Paragraph { block }
            | BlockView::Heading { block, .. }
            | BlockView::Bullet { block }
            | BlockView::Task { block, .. }
            | BlockView::MissingTask { block } => block,
        }
    }

    /// Text shown when the block has nothing of its own to show.
    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            BlockView::Task { .. } => None,
            BlockView::MissingTask { .. } => Some(TASK_NOT_FOUND),
            _ => self.block().block_type.placeholder(),
        }
    }

    pub fn is_editable(&self) -> bool {
        matches!(
            self,
            BlockView::Paragraph { .. } | BlockView::Heading { .. } | BlockView::Bullet { .. }
        )
    }
}

pub fn resolve_task<'a>(block: &Block, tasks: &'a [Task]) -> Option<&'a Task> {
    let task_id = block.linked_task_id()?;
    tasks.iter().find(|task| task.id == task_id)
}

pub fn resolve_block<'a>(block: &'a Block, tasks: &'a [Task]) -> BlockView<'a> {
    match block.block_type {
        BlockType::Text => BlockView::Paragraph { block },
        BlockType::Heading1 => BlockView::Heading {
            block,
            level: HeadingLevel::One,
        },
        BlockType::Heading2 => BlockView::Heading {
            block,
            level: HeadingLevel::Two,
        },
        BlockType::BulletItem => BlockView::Bullet { block },
        BlockType::TaskReference => match resolve_task(block, tasks) {
            Some(task) => BlockView::Task { block, task },
            None => {
                debug!(block_id = %block.id, task_id = ?block.task_id, "task reference unresolved");
                BlockView::MissingTask { block }
            }
        },
    }
}

pub fn resolve_blocks<'a>(blocks: &'a [Block], tasks: &'a [Task]) -> Vec<BlockView<'a>> {
    blocks
        .iter()
        .map(|block| resolve_block(block, tasks))
        .collect()
}

/// Status to request when the completion box of an embedded row is toggled.
pub fn completion_toggle(task: &Task) -> TaskStatus {
    task.status.toggled()
}
