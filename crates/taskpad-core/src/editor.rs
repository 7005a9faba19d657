use crate::blocks::{Block, BlockPatch, BlockType};
use crate::project::Project;
use chrono::Utc;
use tracing::debug;

/// Owns the block sequence of one project and enforces its invariants.
///
/// Every method returns whether the project changed; callers publish a
/// snapshot only when it did.
#[derive(Clone, Debug, PartialEq)]
pub struct EditorModel {
    project: Project,
}

impl EditorModel {
    pub fn new(project: Project) -> Self {
        let mut model = Self { project };
        model.ensure_non_empty();
        for block in &mut model.project.blocks {
            normalize_block(block);
        }
        model
    }

    pub fn ensure_non_empty(&mut self) {
        if self.project.blocks.is_empty() {
            self.project.blocks.push(Block::empty());
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn blocks(&self) -> &[Block] {
        &self.project.blocks
    }

    pub fn block(&self, id: &str) -> Option<&Block> {
        self.project.block(id)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.project.block_index(id)
    }

    /// Replaces the whole project, e.g. when the host hands in a newer value.
    pub fn replace_project(&mut self, project: Project) {
        *self = Self::new(project);
    }

    pub fn update_block(&mut self, id: &str, patch: BlockPatch) -> bool {
        if patch.is_empty() {
            return false;
        }
        let Some(ix) = self.index_of(id) else {
            debug!(block_id = id, "update for unknown block ignored");
            return false;
        };
        let mut next = self.project.blocks[ix].clone();
        if let Some(block_type) = patch.block_type {
            next.block_type = block_type;
        }
        if let Some(content) = patch.content {
            next.content = content;
        }
        if let Some(task_id) = patch.task_id {
            next.task_id = task_id;
        }
        if next.block_type == BlockType::TaskReference && next.task_id.is_none() {
            debug!(block_id = id, "task reference without task id rejected");
            return false;
        }
        normalize_block(&mut next);
        if next == self.project.blocks[ix] {
            return false;
        }
        self.project.blocks[ix] = next;
        self.touch();
        true
    }

    /// Inserts `block` directly after `after_id`. Returns the new index.
    pub fn insert_block_after(&mut self, after_id: &str, mut block: Block) -> Option<usize> {
        let Some(ix) = self.index_of(after_id) else {
            debug!(block_id = after_id, "insert after unknown block ignored");
            return None;
        };
        if self.index_of(&block.id).is_some() {
            debug!(block_id = %block.id, "duplicate block id rejected");
            return None;
        }
        normalize_block(&mut block);
        let insert_ix = ix + 1;
        self.project.blocks.insert(insert_ix, block);
        self.touch();
        Some(insert_ix)
    }

    /// Inserts an empty text block after `after_id` and returns its id.
    pub fn insert_empty_after(&mut self, after_id: &str) -> Option<String> {
        let block = Block::empty();
        let id = block.id.clone();
        self.insert_block_after(after_id, block)?;
        Some(id)
    }

    pub fn remove_block(&mut self, id: &str) -> bool {
        if self.project.blocks.len() <= 1 {
            debug!(block_id = id, "refusing to remove the last block");
            return false;
        }
        let Some(ix) = self.index_of(id) else {
            return false;
        };
        self.project.blocks.remove(ix);
        self.touch();
        true
    }

    /// Changes the type of a block. Moving to `TaskReference` needs a task id
    /// and clears the content; moving away clears the task id.
    pub fn retype_block(&mut self, id: &str, block_type: BlockType, task_id: Option<String>) -> bool {
        let task_id = match block_type {
            BlockType::TaskReference => match task_id {
                Some(task_id) => Some(task_id),
                None => {
                    debug!(block_id = id, "task reference without task id rejected");
                    return false;
                }
            },
            _ => None,
        };
        self.update_block(
            id,
            BlockPatch {
                block_type: Some(block_type),
                content: None,
                task_id: Some(task_id),
            },
        )
    }

    /// Retypes to a basic block and drops the first trigger character from
    /// the content.
    pub fn retype_stripping_trigger(&mut self, id: &str, block_type: BlockType, trigger: char) -> bool {
        let Some(block) = self.block(id) else {
            return false;
        };
        let content = strip_first(&block.content, trigger);
        self.update_block(
            id,
            BlockPatch {
                block_type: Some(block_type),
                content: Some(content),
                task_id: Some(None),
            },
        )
    }

    /// Bullet items become text; any other editable block becomes a bullet
    /// item. Content is kept.
    pub fn toggle_bullet(&mut self, id: &str) -> bool {
        let Some(block) = self.block(id) else {
            return false;
        };
        let next = match block.block_type {
            BlockType::BulletItem => BlockType::Text,
            BlockType::Text | BlockType::Heading1 | BlockType::Heading2 => BlockType::BulletItem,
            BlockType::TaskReference => {
                debug!(block_id = id, "bullet toggle on task reference ignored");
                return false;
            }
        };
        self.update_block(id, BlockPatch::block_type(next))
    }

    pub fn set_title(&mut self, title: &str) -> bool {
        if self.project.title == title {
            return false;
        }
        self.project.title = title.to_string();
        self.touch();
        true
    }

    pub fn set_icon(&mut self, icon: &str) -> bool {
        if icon.is_empty() || self.project.icon == icon {
            return false;
        }
        self.project.icon = icon.to_string();
        self.touch();
        true
    }

    fn touch(&mut self) {
        self.project.updated_at = Utc::now();
    }
}

fn normalize_block(block: &mut Block) {
    if block.block_type == BlockType::TaskReference {
        block.content.clear();
    } else {
        block.task_id = None;
    }
}

fn strip_first(text: &str, ch: char) -> String {
    match text.find(ch) {
        Some(ix) => {
            let mut output = String::with_capacity(text.len());
            output.push_str(&text[..ix]);
            output.push_str(&text[ix + ch.len_utf8()..]);
            output
        }
        None => text.to_string(),
    }
}
