use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::blocks::{Block, BlockPatch, BlockType};
use crate::config::EditorConfig;
use crate::editor::EditorModel;
use crate::formatting;
use crate::geometry::{Point, Rect};
use crate::overlay::{
    find_slash_command, MenuAnchor, OverlayController, SelectionSnapshot, SlashAction,
    SlashCommandDef,
};
use crate::project::{Project, ProjectProgress};
use crate::resolver::{resolve_blocks, BlockView};
use crate::selection::{
    owning_block_id, ColorComparator, FormatCommand, NormalizedColorComparator, SelectionHost,
};
use crate::surface::{BlockSurface, Key, Modifiers, SurfaceAction};
use crate::tasks::{Task, TaskStore};

/// Callbacks into the application that embeds the editor.
pub trait EditorHost {
    /// Receives the whole project after every change. Persistence is the
    /// host's job.
    fn on_project_change(&mut self, project: &Project);

    fn open_link(&mut self, url: &str);

    /// Blocking URL prompt. `None` means the user cancelled.
    fn prompt_link_url(&mut self) -> Option<String>;

    fn viewport_height(&self) -> f32;
}

/// One open project: document model, per-block surfaces and popups.
pub struct ProjectEditor<S: TaskStore, H: EditorHost> {
    model: EditorModel,
    surfaces: HashMap<String, BlockSurface>,
    overlays: OverlayController,
    config: EditorConfig,
    comparator: Box<dyn ColorComparator>,
    store: S,
    host: H,
}

impl<S: TaskStore, H: EditorHost> ProjectEditor<S, H> {
    pub fn new(project: Project, store: S, host: H, config: EditorConfig) -> Self {
        let mut editor = Self {
            model: EditorModel::new(project),
            surfaces: HashMap::new(),
            overlays: OverlayController::new(),
            config,
            comparator: Box::new(NormalizedColorComparator),
            store,
            host,
        };
        editor.reconcile_surfaces();
        editor
    }

    pub fn with_comparator(mut self, comparator: Box<dyn ColorComparator>) -> Self {
        self.comparator = comparator;
        self
    }

    pub fn project(&self) -> &Project {
        self.model.project()
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn overlays(&self) -> &OverlayController {
        &self.overlays
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn surface(&self, block_id: &str) -> Option<&BlockSurface> {
        self.surfaces.get(block_id)
    }

    /// Takes a newer project value from the host. Focused surfaces keep
    /// their own content.
    pub fn set_project(&mut self, project: Project) {
        self.model.replace_project(project);
        self.reconcile_surfaces();
    }

    pub fn focus_block(&mut self, block_id: &str) -> bool {
        for surface in self.surfaces.values_mut() {
            if surface.block_id() != block_id && surface.is_focused() {
                if let Some(block) = self.model.block(surface.block_id()) {
                    surface.blur(block);
                }
            }
        }
        match self.surfaces.get_mut(block_id) {
            Some(surface) => {
                surface.focus();
                true
            }
            None => false,
        }
    }

    pub fn blur_block(&mut self, block_id: &str) {
        let (Some(surface), Some(block)) =
            (self.surfaces.get_mut(block_id), self.model.block(block_id))
        else {
            return;
        };
        surface.blur(block);
    }

    /// Input event from a block surface carrying its re-serialized markup.
    pub fn handle_input(
        &mut self,
        block_id: &str,
        markup: impl Into<String>,
        caret: Option<Rect>,
        bounds: Rect,
    ) {
        let trigger = self.config.trigger;
        let Some(surface) = self.surfaces.get_mut(block_id) else {
            debug!(block_id, "input for block without surface ignored");
            return;
        };
        let actions = surface.on_input(markup.into(), caret, bounds, trigger);
        for action in actions {
            self.dispatch(action);
        }
    }

    /// Returns whether the host should suppress the key's default effect.
    pub fn handle_key(&mut self, block_id: &str, key: Key, modifiers: Modifiers) -> bool {
        let Some(surface) = self.surfaces.get(block_id) else {
            return false;
        };
        let outcome = surface.on_key(key, modifiers);
        if let Some(action) = outcome.action {
            self.dispatch(action);
        }
        outcome.prevent_default
    }

    pub fn handle_click(&mut self, block_id: &str, link: Option<&str>, modifiers: Modifiers) -> bool {
        let action = self
            .surfaces
            .get(block_id)
            .and_then(|surface| surface.on_click(link, modifiers));
        match action {
            Some(action) => {
                self.dispatch(action);
                true
            }
            None => false,
        }
    }

    fn dispatch(&mut self, action: SurfaceAction) {
        match action {
            SurfaceAction::SlashTriggered { block_id, anchor } => {
                self.open_slash_menu(&block_id, anchor);
            }
            SurfaceAction::UpdateContent { block_id, content } => {
                let changed = self
                    .model
                    .update_block(&block_id, BlockPatch::content(content));
                self.commit(changed);
            }
            SurfaceAction::InsertAfter { block_id } => {
                let inserted = self.model.insert_empty_after(&block_id);
                if let Some(new_id) = &inserted {
                    debug!(after = %block_id, block_id = %new_id, "block inserted");
                }
                self.commit(inserted.is_some());
            }
            SurfaceAction::Demote { block_id } => {
                let changed = self.model.retype_block(&block_id, BlockType::Text, None);
                self.commit(changed);
            }
            SurfaceAction::Remove { block_id } => {
                self.delete_block(&block_id);
            }
            SurfaceAction::OpenLink { url } => {
                info!(%url, "opening link");
                self.host.open_link(&url);
            }
        }
    }

    pub fn open_slash_menu(&mut self, block_id: &str, anchor: Rect) -> Option<MenuAnchor> {
        if self.model.block(block_id).is_none() {
            return None;
        }
        let viewport_height = self.host.viewport_height();
        Some(
            self.overlays
                .open_slash_menu(block_id, anchor, viewport_height, &self.config),
        )
    }

    /// The plus button beside a block opens the same menu as the trigger.
    pub fn open_plus_menu(&mut self, block_id: &str, anchor: Rect) -> Option<MenuAnchor> {
        self.open_slash_menu(block_id, anchor)
    }

    pub fn open_task_picker(&mut self, block_id: &str, anchor: Rect) -> bool {
        if self.model.block(block_id).is_none() {
            return false;
        }
        self.overlays.open_task_picker(block_id, anchor, &self.config);
        true
    }

    /// Runs a command from the open slash menu against the menu's block.
    pub fn run_slash_command(&mut self, command_id: &str) -> bool {
        let Some(menu) = self.overlays.slash_menu().cloned() else {
            debug!(command_id, "slash command without open menu ignored");
            return false;
        };
        let Some(command) = find_slash_command(command_id) else {
            warn!(command_id, "unknown slash command");
            self.overlays.close_menus();
            return false;
        };
        match command.action {
            SlashAction::SetBlockType(block_type) => {
                self.overlays.close_menus();
                let changed = self.model.retype_stripping_trigger(
                    &menu.block_id,
                    block_type,
                    self.config.trigger,
                );
                self.commit(changed);
                changed
            }
            SlashAction::LinkTask => {
                self.overlays
                    .open_task_picker_at(&menu.block_id, menu.x, menu.y);
                true
            }
            SlashAction::NewTask => {
                self.overlays.close_menus();
                let task = self.store.create_task();
                info!(task_id = %task.id, readable_id = task.readable_id, "task created from editor");
                let mut changed = self.model.retype_block(
                    &menu.block_id,
                    BlockType::TaskReference,
                    Some(task.id.clone()),
                );
                if changed {
                    changed |= self.model.insert_empty_after(&menu.block_id).is_some();
                }
                self.commit(changed);
                changed
            }
        }
    }

    pub fn set_menu_query(&mut self, query: &str) -> bool {
        self.overlays.set_menu_query(query)
    }

    pub fn menu_commands(&self) -> Vec<&'static SlashCommandDef> {
        self.overlays.menu_commands()
    }

    pub fn set_picker_query(&mut self, query: &str) -> bool {
        self.overlays.set_picker_query(query)
    }

    pub fn picker_results(&self) -> Vec<&Task> {
        self.overlays.picker_results(self.store.tasks())
    }

    pub fn picker_empty_message(&self) -> Option<&'static str> {
        self.overlays.picker_empty_message(self.store.tasks())
    }

    /// Binds the picker's block to `task_id` and closes the picker.
    pub fn select_picker_task(&mut self, task_id: &str) -> bool {
        let Some(picker) = self.overlays.task_picker().cloned() else {
            return false;
        };
        if self.store.find_task(task_id).is_none() {
            warn!(task_id, "picked task is not in the store");
            return false;
        }
        self.overlays.close_menus();
        let changed = self.model.retype_block(
            &picker.anchor.block_id,
            BlockType::TaskReference,
            Some(task_id.to_string()),
        );
        self.commit(changed);
        changed
    }

    pub fn close_overlays(&mut self) {
        self.overlays.close_menus();
    }

    pub fn handle_selection_change<Sel: SelectionHost>(&mut self, selection: &Sel) {
        let path = selection.anchor_path();
        let editable_block_id = owning_block_id(&path)
            .filter(|block_id| self.surfaces.contains_key(*block_id))
            .map(str::to_string);
        let snapshot = SelectionSnapshot {
            collapsed: selection.is_collapsed(),
            rect: selection.selection_rect(),
            editable_block_id,
        };
        self.overlays.on_selection_change(&snapshot, &self.config);
    }

    pub fn handle_mouse_down(&mut self, point: Point, toolbar_bounds: Option<Rect>, collapsed: bool) {
        self.overlays.on_mouse_down(point, toolbar_bounds, collapsed);
    }

    pub fn toggle_color_picker(&mut self) -> bool {
        self.overlays.toggle_color_picker()
    }

    pub fn apply_format<Sel: SelectionHost>(&mut self, selection: &mut Sel, command: FormatCommand) -> bool {
        formatting::apply_format(selection, command)
    }

    pub fn toggle_highlight<Sel: SelectionHost>(&mut self, selection: &mut Sel, color: &str) -> bool {
        let applied = formatting::toggle_highlight(selection, color, self.comparator.as_ref());
        self.overlays.close_color_picker();
        applied
    }

    pub fn create_link<Sel: SelectionHost>(&mut self, selection: &mut Sel) -> bool {
        let host = &mut self.host;
        formatting::create_link(selection, || host.prompt_link_url())
    }

    /// Flips the toolbar's block between text and bullet item.
    pub fn toggle_bullet_from_toolbar(&mut self) -> bool {
        let Some(block_id) = self.overlays.toolbar_block_id().map(str::to_string) else {
            return false;
        };
        let changed = self.model.toggle_bullet(&block_id);
        self.commit(changed);
        changed
    }

    pub fn delete_block(&mut self, block_id: &str) -> bool {
        let changed = self.model.remove_block(block_id);
        if changed {
            debug!(block_id, "block removed");
        }
        self.commit(changed);
        changed
    }

    pub fn set_title(&mut self, title: &str) -> bool {
        let changed = self.model.set_title(title);
        self.commit(changed);
        changed
    }

    pub fn set_icon(&mut self, icon: &str) -> bool {
        let changed = self.model.set_icon(icon);
        self.commit(changed);
        changed
    }

    /// Completion checkbox of an embedded task row.
    pub fn toggle_task_completion(&mut self, task_id: &str) -> bool {
        let Some(status) = self.store.find_task(task_id).map(|task| task.status.toggled()) else {
            warn!(task_id, "completion toggle for unknown task");
            return false;
        };
        self.store.update_task_status(task_id, status);
        true
    }

    pub fn edit_task(&mut self, task_id: &str) -> bool {
        let Some(task) = self.store.find_task(task_id).cloned() else {
            return false;
        };
        self.store.edit_task(&task);
        true
    }

    pub fn toggle_subtask(&mut self, task_id: &str, subtask_id: &str) {
        self.store.toggle_subtask(task_id, subtask_id);
    }

    pub fn focus_task(&mut self, task_id: &str) -> bool {
        let Some(task) = self.store.find_task(task_id).cloned() else {
            return false;
        };
        self.store.focus_task(&task);
        true
    }

    pub fn block_views(&self) -> Vec<BlockView<'_>> {
        resolve_blocks(self.model.blocks(), self.store.tasks())
    }

    pub fn progress(&self) -> ProjectProgress {
        self.model.project().progress(self.store.tasks())
    }

    fn commit(&mut self, changed: bool) {
        if !changed {
            return;
        }
        self.reconcile_surfaces();
        self.host.on_project_change(self.model.project());
    }

    /// Keeps one surface per editable block and drops popups whose block
    /// went away.
    fn reconcile_surfaces(&mut self) {
        let blocks: &[Block] = self.model.blocks();
        let mut live: HashMap<String, BlockSurface> = HashMap::with_capacity(blocks.len());
        for block in blocks.iter().filter(|block| block.block_type.is_editable()) {
            let surface = match self.surfaces.remove(&block.id) {
                Some(mut surface) => {
                    surface.sync_from_block(block);
                    surface
                }
                None => BlockSurface::new(block),
            };
            live.insert(block.id.clone(), surface);
        }
        for stale in self.surfaces.keys() {
            self.overlays.forget_block(stale);
        }
        self.surfaces = live;
        let missing: Vec<String> = self
            .overlays
            .overlay()
            .owner_block_id()
            .filter(|owner| self.model.block(owner).is_none())
            .map(str::to_string)
            .into_iter()
            .collect();
        for owner in missing {
            self.overlays.forget_block(&owner);
        }
    }
}
