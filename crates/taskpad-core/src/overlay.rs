//! Transient popups: slash menu, task picker and the floating format
//! toolbar.
//!
//! Anchors are measured once when a popup opens. Scrolling or resizing the
//! viewport afterwards does not move an open popup.

use crate::blocks::BlockType;
use crate::config::EditorConfig;
use crate::geometry::{Placement, Point, Rect};
use crate::tasks::Task;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlashAction {
    SetBlockType(BlockType),
    LinkTask,
    NewTask,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandGroup {
    BasicBlocks,
    Actions,
}

impl CommandGroup {
    pub fn label(&self) -> &'static str {
        match self {
            CommandGroup::BasicBlocks => "Basic blocks",
            CommandGroup::Actions => "Actions",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlashCommandDef {
    pub id: &'static str,
    pub label: &'static str,
    pub group: CommandGroup,
    pub action: SlashAction,
}

pub const SLASH_COMMANDS: &[SlashCommandDef] = &[
    SlashCommandDef {
        id: "text",
        label: "Text",
        group: CommandGroup::BasicBlocks,
        action: SlashAction::SetBlockType(BlockType::Text),
    },
    SlashCommandDef {
        id: "h1",
        label: "Heading 1",
        group: CommandGroup::BasicBlocks,
        action: SlashAction::SetBlockType(BlockType::Heading1),
    },
    SlashCommandDef {
        id: "h2",
        label: "Heading 2",
        group: CommandGroup::BasicBlocks,
        action: SlashAction::SetBlockType(BlockType::Heading2),
    },
    SlashCommandDef {
        id: "bullet",
        label: "Bullet list",
        group: CommandGroup::BasicBlocks,
        action: SlashAction::SetBlockType(BlockType::BulletItem),
    },
    SlashCommandDef {
        id: "linktask",
        label: "Link Task",
        group: CommandGroup::Actions,
        action: SlashAction::LinkTask,
    },
    SlashCommandDef {
        id: "newtask",
        label: "New Task",
        group: CommandGroup::Actions,
        action: SlashAction::NewTask,
    },
];

pub fn find_slash_command(id: &str) -> Option<&'static SlashCommandDef> {
    SLASH_COMMANDS.iter().find(|command| command.id == id)
}

pub fn filter_slash_commands(query: &str) -> Vec<&'static SlashCommandDef> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return SLASH_COMMANDS.iter().collect();
    }
    SLASH_COMMANDS
        .iter()
        .filter(|command| {
            command.id.contains(&query) || command.label.to_lowercase().contains(&query)
        })
        .collect()
}

/// Case-insensitive substring match on task titles, in store order.
pub fn search_tasks<'a>(tasks: &'a [Task], query: &str) -> Vec<&'a Task> {
    let query = query.to_lowercase();
    tasks
        .iter()
        .filter(|task| task.title.to_lowercase().contains(&query))
        .collect()
}

pub const NO_TASKS_FOUND: &str = "No tasks found";

#[derive(Clone, Debug, PartialEq)]
pub struct MenuAnchor {
    pub x: f32,
    pub y: f32,
    pub placement: Placement,
    pub block_id: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SlashMenu {
    pub anchor: MenuAnchor,
    /// Narrows the listed commands by id or label.
    pub query: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TaskPicker {
    pub anchor: MenuAnchor,
    pub query: String,
}

/// The slash menu and the task picker share one slot, so at most one of
/// them is open.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum OverlayState {
    #[default]
    Closed,
    SlashMenu(SlashMenu),
    TaskPicker(TaskPicker),
}

impl OverlayState {
    pub fn owner_block_id(&self) -> Option<&str> {
        match self {
            OverlayState::Closed => None,
            OverlayState::SlashMenu(menu) => Some(&menu.anchor.block_id),
            OverlayState::TaskPicker(picker) => Some(&picker.anchor.block_id),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ToolbarAnchor {
    pub x: f32,
    pub y: f32,
    pub block_id: String,
    pub color_picker_open: bool,
}

impl ToolbarAnchor {
    /// Top edge the toolbar is drawn at, above the selection.
    pub fn render_top(&self, toolbar_height: f32) -> f32 {
        self.y - toolbar_height
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum ToolbarState {
    #[default]
    Hidden,
    Visible(ToolbarAnchor),
}

/// Selection facts the toolbar needs, gathered from the host.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectionSnapshot {
    pub collapsed: bool,
    pub rect: Option<Rect>,
    /// Owning block, only when that block has an editable surface.
    pub editable_block_id: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct OverlayController {
    overlay: OverlayState,
    toolbar: ToolbarState,
}

impl OverlayController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn overlay(&self) -> &OverlayState {
        &self.overlay
    }

    pub fn toolbar(&self) -> &ToolbarState {
        &self.toolbar
    }

    pub fn open_slash_menu(
        &mut self,
        block_id: &str,
        anchor: Rect,
        viewport_height: f32,
        config: &EditorConfig,
    ) -> MenuAnchor {
        let placement = Placement::for_anchor(anchor, viewport_height, config.menu_flip_threshold);
        let y = match placement {
            Placement::Below => anchor.bottom() + config.menu_gap,
            Placement::Above => anchor.top,
        };
        debug!(block_id, ?placement, "slash menu opened");
        let menu = MenuAnchor {
            x: anchor.left,
            y,
            placement,
            block_id: block_id.to_string(),
        };
        self.overlay = OverlayState::SlashMenu(SlashMenu {
            anchor: menu.clone(),
            query: String::new(),
        });
        menu
    }

    /// Opens the picker just below `anchor`.
    pub fn open_task_picker(&mut self, block_id: &str, anchor: Rect, config: &EditorConfig) {
        self.open_task_picker_at(block_id, anchor.left, anchor.bottom() + config.menu_gap);
    }

    pub fn open_task_picker_at(&mut self, block_id: &str, x: f32, y: f32) {
        debug!(block_id, "task picker opened");
        self.overlay = OverlayState::TaskPicker(TaskPicker {
            anchor: MenuAnchor {
                x,
                y,
                placement: Placement::Below,
                block_id: block_id.to_string(),
            },
            query: String::new(),
        });
    }

    pub fn close_menus(&mut self) {
        if self.overlay != OverlayState::Closed {
            debug!("menus closed");
        }
        self.overlay = OverlayState::Closed;
    }

    pub fn slash_menu(&self) -> Option<&MenuAnchor> {
        match &self.overlay {
            OverlayState::SlashMenu(menu) => Some(&menu.anchor),
            _ => None,
        }
    }

    pub fn task_picker(&self) -> Option<&TaskPicker> {
        match &self.overlay {
            OverlayState::TaskPicker(picker) => Some(picker),
            _ => None,
        }
    }

    pub fn set_picker_query(&mut self, query: &str) -> bool {
        match &mut self.overlay {
            OverlayState::TaskPicker(picker) => {
                picker.query = query.to_string();
                true
            }
            _ => false,
        }
    }

    pub fn picker_results<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        match &self.overlay {
            OverlayState::TaskPicker(picker) => search_tasks(tasks, &picker.query),
            _ => Vec::new(),
        }
    }

    /// Message shown in place of the list when an open picker matches nothing.
    pub fn picker_empty_message(&self, tasks: &[Task]) -> Option<&'static str> {
        match &self.overlay {
            OverlayState::TaskPicker(picker) if search_tasks(tasks, &picker.query).is_empty() => {
                Some(NO_TASKS_FOUND)
            }
            _ => None,
        }
    }

    pub fn set_menu_query(&mut self, query: &str) -> bool {
        match &mut self.overlay {
            OverlayState::SlashMenu(menu) => {
                menu.query = query.to_string();
                true
            }
            _ => false,
        }
    }

    /// Commands the open slash menu lists; empty while it is closed.
    pub fn menu_commands(&self) -> Vec<&'static SlashCommandDef> {
        match &self.overlay {
            OverlayState::SlashMenu(menu) => filter_slash_commands(&menu.query),
            _ => Vec::new(),
        }
    }

    /// Re-derives toolbar visibility after the selection changed.
    pub fn on_selection_change(&mut self, selection: &SelectionSnapshot, config: &EditorConfig) {
        if selection.collapsed {
            if !self.color_picker_open() {
                self.toolbar = ToolbarState::Hidden;
            }
            return;
        }
        let (Some(rect), Some(block_id)) = (selection.rect, selection.editable_block_id.as_ref())
        else {
            self.toolbar = ToolbarState::Hidden;
            return;
        };
        if rect.width <= 0.0 {
            self.toolbar = ToolbarState::Hidden;
            return;
        }
        let color_picker_open = self.color_picker_open();
        self.toolbar = ToolbarState::Visible(ToolbarAnchor {
            x: rect.center_x(),
            y: rect.top - config.toolbar_lift,
            block_id: block_id.clone(),
            color_picker_open,
        });
    }

    /// Mouse-down anywhere in the document. Presses inside the toolbar keep
    /// it; presses outside close it once the selection is collapsed.
    pub fn on_mouse_down(&mut self, point: Point, toolbar_bounds: Option<Rect>, collapsed: bool) {
        if toolbar_bounds.is_some_and(|bounds| bounds.contains(point)) {
            return;
        }
        if collapsed {
            self.hide_toolbar();
        }
    }

    pub fn hide_toolbar(&mut self) {
        self.toolbar = ToolbarState::Hidden;
    }

    pub fn toolbar_block_id(&self) -> Option<&str> {
        match &self.toolbar {
            ToolbarState::Visible(anchor) => Some(&anchor.block_id),
            ToolbarState::Hidden => None,
        }
    }

    pub fn color_picker_open(&self) -> bool {
        matches!(&self.toolbar, ToolbarState::Visible(anchor) if anchor.color_picker_open)
    }

    pub fn toggle_color_picker(&mut self) -> bool {
        match &mut self.toolbar {
            ToolbarState::Visible(anchor) => {
                anchor.color_picker_open = !anchor.color_picker_open;
                anchor.color_picker_open
            }
            ToolbarState::Hidden => false,
        }
    }

    pub fn close_color_picker(&mut self) {
        if let ToolbarState::Visible(anchor) = &mut self.toolbar {
            anchor.color_picker_open = false;
        }
    }

    /// Drops popups owned by blocks that no longer exist.
    pub fn forget_block(&mut self, block_id: &str) {
        if self.overlay.owner_block_id() == Some(block_id) {
            self.close_menus();
        }
        if self.toolbar_block_id() == Some(block_id) {
            self.hide_toolbar();
        }
    }
}
