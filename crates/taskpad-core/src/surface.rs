use crate::blocks::{Block, BlockType};
use crate::geometry::Rect;
use crate::markup;
use tracing::trace;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Enter,
    Backspace,
    Other,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn any(&self) -> bool {
        self.shift || self.ctrl || self.alt || self.meta
    }

    /// Ctrl on most platforms, Cmd on macOS.
    pub fn opens_new_context(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// What a surface asks the editor to do in response to user input.
#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceAction {
    SlashTriggered { block_id: String, anchor: Rect },
    UpdateContent { block_id: String, content: String },
    InsertAfter { block_id: String },
    Demote { block_id: String },
    Remove { block_id: String },
    OpenLink { url: String },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct KeyOutcome {
    pub action: Option<SurfaceAction>,
    pub prevent_default: bool,
}

/// Editable region for one block.
///
/// The surface keeps its own copy of the markup. While it holds focus that
/// copy is authoritative and model changes are not written into it.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockSurface {
    block_id: String,
    block_type: BlockType,
    markup: String,
    focused: bool,
}

impl BlockSurface {
    pub fn new(block: &Block) -> Self {
        Self {
            block_id: block.id.clone(),
            block_type: block.block_type,
            markup: block.content.clone(),
            focused: false,
        }
    }

    pub fn block_id(&self) -> &str {
        &self.block_id
    }

    pub fn block_type(&self) -> BlockType {
        self.block_type
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn placeholder(&self) -> Option<&'static str> {
        self.block_type.placeholder()
    }

    pub fn focus(&mut self) {
        self.focused = true;
    }

    /// Drops focus and resumes mirroring the model.
    pub fn blur(&mut self, block: &Block) {
        self.focused = false;
        self.sync_from_block(block);
    }

    /// Mirrors the block into the surface. Content is left alone while the
    /// surface is focused. Returns whether the surface markup was rewritten.
    pub fn sync_from_block(&mut self, block: &Block) -> bool {
        self.block_type = block.block_type;
        if self.markup == block.content {
            return false;
        }
        if self.focused {
            trace!(block_id = %self.block_id, "focused surface keeps its own content");
            return false;
        }
        self.markup = block.content.clone();
        true
    }

    /// Handles an input event carrying the surface's new markup. The slash
    /// trigger, when present, is reported before the content update.
    pub fn on_input(
        &mut self,
        markup: String,
        caret: Option<Rect>,
        bounds: Rect,
        trigger: char,
    ) -> Vec<SurfaceAction> {
        let mut actions = Vec::with_capacity(2);
        if markup::ends_with_trigger(&markup, trigger) {
            actions.push(SurfaceAction::SlashTriggered {
                block_id: self.block_id.clone(),
                anchor: caret.unwrap_or(bounds),
            });
        }
        self.markup = markup;
        actions.push(SurfaceAction::UpdateContent {
            block_id: self.block_id.clone(),
            content: self.markup.clone(),
        });
        actions
    }

    pub fn on_key(&self, key: Key, modifiers: Modifiers) -> KeyOutcome {
        match key {
            Key::Enter if !modifiers.any() => KeyOutcome {
                action: Some(SurfaceAction::InsertAfter {
                    block_id: self.block_id.clone(),
                }),
                prevent_default: true,
            },
            Key::Backspace if markup::is_visibly_empty(&self.markup) => {
                let action = if self.block_type == BlockType::BulletItem {
                    SurfaceAction::Demote {
                        block_id: self.block_id.clone(),
                    }
                } else {
                    SurfaceAction::Remove {
                        block_id: self.block_id.clone(),
                    }
                };
                KeyOutcome {
                    action: Some(action),
                    prevent_default: true,
                }
            }
            _ => KeyOutcome::default(),
        }
    }

    /// `link` is the href of the link under the pointer, if any.
    pub fn on_click(&self, link: Option<&str>, modifiers: Modifiers) -> Option<SurfaceAction> {
        let url = link.filter(|url| !url.is_empty())?;
        if !modifiers.opens_new_context() {
            return None;
        }
        Some(SurfaceAction::OpenLink {
            url: url.to_string(),
        })
    }
}
