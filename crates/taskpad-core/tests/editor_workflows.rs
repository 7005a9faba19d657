use taskpad_core::blocks::{Block, BlockType};
use taskpad_core::config::EditorConfig;
use taskpad_core::geometry::{Placement, Point, Rect};
use taskpad_core::overlay::ToolbarState;
use taskpad_core::project::Project;
use taskpad_core::resolver::BlockView;
use taskpad_core::selection::{FormatCommand, MarkupSelection, SelectionHost};
use taskpad_core::session::{EditorHost, ProjectEditor};
use taskpad_core::surface::{Key, Modifiers};
use taskpad_core::tasks::{MemoryTaskStore, Task, TaskRequest, TaskStatus, TaskStore};

const VIEWPORT: f32 = 800.0;

#[derive(Default)]
struct TestHost {
    snapshots: Vec<Project>,
    opened: Vec<String>,
    link_answer: Option<String>,
}

impl EditorHost for TestHost {
    fn on_project_change(&mut self, project: &Project) {
        self.snapshots.push(project.clone());
    }

    fn open_link(&mut self, url: &str) {
        self.opened.push(url.to_string());
    }

    fn prompt_link_url(&mut self) -> Option<String> {
        self.link_answer.take()
    }

    fn viewport_height(&self) -> f32 {
        VIEWPORT
    }
}

type Editor = ProjectEditor<MemoryTaskStore, TestHost>;

fn block(id: &str, block_type: BlockType, content: &str) -> Block {
    Block {
        id: id.to_string(),
        block_type,
        content: content.to_string(),
        task_id: None,
    }
}

fn sample_tasks() -> Vec<Task> {
    vec![
        Task::new("t1", 1, "Meeting with Alexa"),
        Task::new("t2", 2, "Draft social posts"),
        Task::new("t3", 3, "Book venue"),
    ]
}

fn open_editor(blocks: Vec<Block>) -> Editor {
    let mut project = Project::with_title("Launch");
    project.blocks = blocks;
    ProjectEditor::new(
        project,
        MemoryTaskStore::new(sample_tasks()),
        TestHost::default(),
        EditorConfig::default(),
    )
}

fn anchor_with_bottom(bottom: f32) -> Rect {
    Rect::new(24.0, bottom - 18.0, 1.0, 18.0)
}

fn block_ids(editor: &Editor) -> Vec<String> {
    editor
        .project()
        .blocks
        .iter()
        .map(|block| block.id.clone())
        .collect()
}

#[test]
fn new_task_command_binds_block_and_appends_empty_text() {
    let mut editor = open_editor(vec![block("b1", BlockType::Text, "Campaign Strategy")]);

    // Open the menu from the plus button and create a task
    editor.open_plus_menu("b1", anchor_with_bottom(200.0));
    assert!(editor.run_slash_command("newtask"));

    let created = editor.store().tasks().last().cloned().expect("created task");
    assert_eq!(created.readable_id, 4);
    assert_eq!(created.title, "New Task");

    let blocks = &editor.project().blocks;
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].id, "b1");
    assert_eq!(blocks[0].block_type, BlockType::TaskReference);
    assert_eq!(blocks[0].task_id.as_deref(), Some(created.id.as_str()));
    assert_eq!(blocks[0].content, "");
    assert_eq!(blocks[1].block_type, BlockType::Text);
    assert_eq!(blocks[1].content, "");
    assert_eq!(blocks[1].task_id, None);

    // One snapshot for the whole command, and the menu is gone
    assert_eq!(editor.host().snapshots.len(), 1);
    assert!(editor.overlays().slash_menu().is_none());
}

#[test]
fn picker_search_filters_titles_case_insensitively() {
    let mut editor = open_editor(vec![block("b1", BlockType::Text, "")]);
    assert!(editor.open_task_picker("b1", anchor_with_bottom(100.0)));

    editor.set_picker_query("Alexa");
    let found: Vec<&str> = editor
        .picker_results()
        .iter()
        .map(|task| task.title.as_str())
        .collect();
    assert_eq!(found, vec!["Meeting with Alexa"]);

    assert_eq!(editor.picker_empty_message(), None);

    editor.set_picker_query("zzz");
    assert!(editor.picker_results().is_empty());
    assert_eq!(editor.picker_empty_message(), Some("No tasks found"));
}

#[test]
fn typing_after_trigger_narrows_slash_menu() {
    let mut editor = open_editor(vec![block("b1", BlockType::Text, "Plan")]);
    assert!(!editor.set_menu_query("head"));

    editor
        .open_slash_menu("b1", anchor_with_bottom(100.0))
        .expect("menu");
    assert_eq!(editor.menu_commands().len(), 6);

    assert!(editor.set_menu_query("head"));
    let listed: Vec<&str> = editor.menu_commands().iter().map(|command| command.label).collect();
    assert_eq!(listed, vec!["Heading 1", "Heading 2"]);

    // Running a listed command closes the menu and clears the list
    assert!(editor.run_slash_command("h2"));
    assert!(editor.menu_commands().is_empty());
    assert_eq!(editor.project().blocks[0].block_type, BlockType::Heading2);
}

#[test]
fn slash_menu_placement_depends_on_space_below() {
    let mut editor = open_editor(vec![block("b1", BlockType::Text, "")]);

    let near_bottom = editor
        .open_slash_menu("b1", anchor_with_bottom(VIEWPORT - 100.0))
        .expect("menu");
    assert_eq!(near_bottom.placement, Placement::Above);

    let plenty_of_room = editor
        .open_slash_menu("b1", anchor_with_bottom(VIEWPORT - 500.0))
        .expect("menu");
    assert_eq!(plenty_of_room.placement, Placement::Below);
    assert_eq!(plenty_of_room.y, VIEWPORT - 500.0 + 5.0);
}

#[test]
fn typing_the_trigger_opens_menu_for_that_block() {
    let mut editor = open_editor(vec![
        block("b1", BlockType::Text, "Intro"),
        block("b2", BlockType::Text, ""),
    ]);
    editor.focus_block("b2");

    let caret = Rect::new(60.0, 120.0, 1.0, 18.0);
    editor.handle_input("b2", "Plan /", Some(caret), Rect::new(0.0, 116.0, 600.0, 26.0));

    let menu = editor.overlays().slash_menu().expect("slash menu");
    assert_eq!(menu.block_id, "b2");
    assert_eq!(menu.x, 60.0);
    assert_eq!(
        editor.project().block("b2").map(|block| block.content.as_str()),
        Some("Plan /")
    );
}

#[test]
fn slash_command_retypes_and_strips_trigger() {
    let mut editor = open_editor(vec![block("b1", BlockType::Text, "")]);
    editor.handle_input("b1", "Goals/", None, Rect::new(0.0, 40.0, 600.0, 26.0));
    assert!(editor.run_slash_command("h1"));

    let block = editor.project().block("b1").expect("block");
    assert_eq!(block.block_type, BlockType::Heading1);
    assert_eq!(block.content, "Goals");
    assert!(editor.overlays().slash_menu().is_none());
}

#[test]
fn link_task_command_reuses_menu_position() {
    let mut editor = open_editor(vec![block("b1", BlockType::Text, "/")]);
    let menu = editor
        .open_slash_menu("b1", anchor_with_bottom(200.0))
        .expect("menu");
    assert!(editor.run_slash_command("linktask"));

    let picker = editor.overlays().task_picker().expect("picker");
    assert_eq!((picker.anchor.x, picker.anchor.y), (menu.x, menu.y));
    assert!(picker.query.is_empty());

    assert!(editor.select_picker_task("t2"));
    let block = editor.project().block("b1").expect("block");
    assert_eq!(block.block_type, BlockType::TaskReference);
    assert_eq!(block.task_id.as_deref(), Some("t2"));
    assert_eq!(block.content, "");
    assert!(editor.overlays().task_picker().is_none());
}

#[test]
fn retyping_away_from_task_reference_clears_task_id() {
    let mut linked = Block::task_reference("t1");
    linked.id = "b1".to_string();
    let mut editor = open_editor(vec![linked]);

    editor.open_plus_menu("b1", anchor_with_bottom(100.0));
    assert!(editor.run_slash_command("text"));

    let block = editor.project().block("b1").expect("block");
    assert_eq!(block.block_type, BlockType::Text);
    assert_eq!(block.task_id, None);
    assert!(editor.surface("b1").is_some());
}

#[test]
fn enter_inserts_empty_block_directly_after() {
    let mut editor = open_editor(vec![
        block("a", BlockType::Text, "one"),
        block("b", BlockType::Heading2, "two"),
        block("c", BlockType::Text, "three"),
    ]);

    assert!(editor.handle_key("b", Key::Enter, Modifiers::none()));

    let ids = block_ids(&editor);
    assert_eq!(ids.len(), 4);
    assert_eq!(&ids[..2], &["a".to_string(), "b".to_string()]);
    assert_eq!(ids[3], "c");
    let inserted = &editor.project().blocks[2];
    assert_eq!(inserted.block_type, BlockType::Text);
    assert!(inserted.content.is_empty());
    assert!(editor.surface(&inserted.id).is_some());
}

#[test]
fn backspace_on_empty_bullet_demotes_then_removes() {
    let mut editor = open_editor(vec![
        block("a", BlockType::Text, "keep"),
        block("b", BlockType::BulletItem, ""),
    ]);

    // First press demotes
    assert!(editor.handle_key("b", Key::Backspace, Modifiers::none()));
    assert_eq!(
        editor.project().block("b").map(|block| block.block_type),
        Some(BlockType::Text)
    );

    // Second press removes
    assert!(editor.handle_key("b", Key::Backspace, Modifiers::none()));
    assert_eq!(block_ids(&editor), vec!["a".to_string()]);
    assert_eq!(editor.host().snapshots.len(), 2);
}

#[test]
fn last_block_is_never_deleted() {
    let mut editor = open_editor(vec![block("only", BlockType::Text, "")]);

    assert!(!editor.delete_block("only"));
    assert!(editor.handle_key("only", Key::Backspace, Modifiers::none()));
    assert_eq!(editor.project().blocks.len(), 1);
    assert!(editor.host().snapshots.is_empty());

    let mut editor = open_editor(Vec::new());
    assert_eq!(editor.project().blocks.len(), 1);
    let id = editor.project().blocks[0].id.clone();
    assert!(!editor.delete_block(&id));
}

#[test]
fn focused_surface_keeps_typing_through_external_updates() {
    let mut editor = open_editor(vec![block("b1", BlockType::Text, "draft")]);
    editor.focus_block("b1");

    let mut external = editor.project().clone();
    external.blocks[0].content = "from elsewhere".to_string();
    editor.set_project(external);

    let surface = editor.surface("b1").expect("surface");
    assert_eq!(surface.markup(), "draft");

    editor.blur_block("b1");
    let surface = editor.surface("b1").expect("surface");
    assert_eq!(surface.markup(), "from elsewhere");
}

#[test]
fn highlight_twice_with_same_color_clears_it() {
    let mut editor = open_editor(vec![block("b1", BlockType::Text, "launch date")]);
    let mut selection = MarkupSelection::new("b1", "launch date");
    selection.select(0..6, Rect::new(100.0, 200.0, 50.0, 18.0));

    // Selecting text shows the toolbar above the midpoint
    editor.handle_selection_change(&selection);
    match editor.overlays().toolbar() {
        ToolbarState::Visible(anchor) => {
            assert_eq!(anchor.x, 125.0);
            assert_eq!(anchor.y, 190.0);
        }
        ToolbarState::Hidden => panic!("toolbar should be visible"),
    }

    assert!(editor.toggle_color_picker());
    editor.toggle_highlight(&mut selection, "#fef08a");
    assert!(!editor.overlays().color_picker_open());
    assert_eq!(
        selection
            .query_inline_format_value(FormatCommand::HiliteColor)
            .as_deref(),
        Some("#fef08a")
    );

    editor.toggle_highlight(&mut selection, "#fef08a");
    assert_eq!(
        selection.query_inline_format_value(FormatCommand::HiliteColor),
        None
    );
    assert_eq!(selection.to_markup(), "launch date");
}

#[test]
fn selection_outside_editable_blocks_shows_no_toolbar() {
    let mut linked = Block::task_reference("t1");
    linked.id = "task".to_string();
    let mut editor = open_editor(vec![block("b1", BlockType::Text, "x"), linked]);

    let mut selection = MarkupSelection::new("task", "Meeting with Alexa");
    selection.select(0..7, Rect::new(0.0, 100.0, 40.0, 18.0));
    editor.handle_selection_change(&selection);
    assert_eq!(editor.overlays().toolbar(), &ToolbarState::Hidden);
}

#[test]
fn selecting_into_task_row_drops_toolbar_owner() {
    let mut linked = Block::task_reference("t1");
    linked.id = "task".to_string();
    let mut editor = open_editor(vec![block("b1", BlockType::Text, "words"), linked]);

    // Toolbar first belongs to the text block
    let mut in_text = MarkupSelection::new("b1", "words");
    in_text.select(0..5, Rect::new(0.0, 40.0, 40.0, 18.0));
    editor.handle_selection_change(&in_text);
    assert_eq!(editor.overlays().toolbar_block_id(), Some("b1"));

    // Then the selection moves into the task row
    let mut in_row = MarkupSelection::new("task", "Meeting with Alexa");
    in_row.select(0..7, Rect::new(0.0, 120.0, 70.0, 18.0));
    editor.handle_selection_change(&in_row);
    assert_eq!(editor.overlays().toolbar(), &ToolbarState::Hidden);

    assert!(!editor.toggle_bullet_from_toolbar());
    assert_eq!(
        editor.project().block("b1").map(|block| block.block_type),
        Some(BlockType::Text)
    );
    assert!(editor.host().snapshots.is_empty());
}

#[test]
fn create_link_uses_host_prompt() {
    let mut editor = open_editor(vec![block("b1", BlockType::Text, "see docs")]);
    let mut selection = MarkupSelection::new("b1", "see docs");
    selection.select(4..8, Rect::new(0.0, 50.0, 30.0, 18.0));

    // Cancelled prompt changes nothing
    assert!(!editor.create_link(&mut selection));
    assert_eq!(selection.to_markup(), "see docs");

    editor.host_mut().link_answer = Some("https://docs.rs".to_string());
    assert!(editor.create_link(&mut selection));
    assert_eq!(
        selection.to_markup(),
        "see <a href=\"https://docs.rs\">docs</a>"
    );

    // The host reports the edited markup back as input
    editor.handle_input("b1", selection.to_markup(), None, Rect::default());
    assert!(editor
        .project()
        .block("b1")
        .is_some_and(|block| block.content.contains("href")));
}

#[test]
fn modified_click_on_link_asks_host_to_open_it() {
    let mut editor = open_editor(vec![block(
        "b1",
        BlockType::Text,
        "<a href=\"https://example.com\">site</a>",
    )]);
    let ctrl = Modifiers {
        ctrl: true,
        ..Modifiers::default()
    };

    assert!(!editor.handle_click("b1", Some("https://example.com"), Modifiers::none()));
    assert!(editor.handle_click("b1", Some("https://example.com"), ctrl));
    assert_eq!(editor.host().opened, vec!["https://example.com".to_string()]);
}

#[test]
fn toolbar_bullet_toggle_flips_owning_block() {
    let mut editor = open_editor(vec![block("b1", BlockType::Heading1, "Agenda")]);
    let mut selection = MarkupSelection::new("b1", "Agenda");
    selection.select(0..6, Rect::new(0.0, 80.0, 60.0, 18.0));
    editor.handle_selection_change(&selection);

    assert!(editor.toggle_bullet_from_toolbar());
    assert_eq!(
        editor.project().block("b1").map(|block| block.block_type),
        Some(BlockType::BulletItem)
    );
    assert!(editor.toggle_bullet_from_toolbar());
    let block = editor.project().block("b1").expect("block");
    assert_eq!(block.block_type, BlockType::Text);
    assert_eq!(block.content, "Agenda");
}

#[test]
fn outside_press_closes_toolbar_once_selection_collapses() {
    let mut editor = open_editor(vec![block("b1", BlockType::Text, "words")]);
    let mut selection = MarkupSelection::new("b1", "words");
    selection.select(0..5, Rect::new(0.0, 80.0, 60.0, 18.0));
    editor.handle_selection_change(&selection);
    editor.toggle_color_picker();

    editor.handle_mouse_down(Point::new(500.0, 500.0), None, true);
    assert_eq!(editor.overlays().toolbar(), &ToolbarState::Hidden);
    assert!(!editor.overlays().color_picker_open());
}

#[test]
fn task_rows_forward_actions_to_store() {
    let mut linked = Block::task_reference("t1");
    linked.id = "row".to_string();
    let mut editor = open_editor(vec![linked]);
    editor.store_mut().update_task_status("t1", TaskStatus::InProgress);

    assert!(editor.toggle_task_completion("t1"));
    assert_eq!(
        editor.store().find_task("t1").map(|task| task.status),
        Some(TaskStatus::Completed)
    );
    assert!(editor.toggle_task_completion("t1"));
    assert_eq!(
        editor.store().find_task("t1").map(|task| task.status),
        Some(TaskStatus::Pending)
    );

    assert!(editor.edit_task("t1"));
    assert!(editor.focus_task("t1"));
    assert!(!editor.focus_task("missing"));
    assert_eq!(
        editor.store().requests(),
        &[
            (TaskRequest::Edit, "t1".to_string()),
            (TaskRequest::Focus, "t1".to_string()),
        ]
    );
    assert!(editor.host().snapshots.is_empty());
}

#[test]
fn missing_tasks_render_placeholder_and_skip_progress() {
    let mut done = Block::task_reference("t1");
    done.id = "r1".to_string();
    let mut open = Block::task_reference("t2");
    open.id = "r2".to_string();
    let mut gone = Block::task_reference("deleted");
    gone.id = "r3".to_string();
    let mut editor = open_editor(vec![done, open, gone, block("p", BlockType::Text, "")]);
    editor.store_mut().update_task_status("t1", TaskStatus::Completed);

    let views = editor.block_views();
    assert!(matches!(views[0], BlockView::Task { task, .. } if task.id == "t1"));
    assert!(matches!(views[2], BlockView::MissingTask { .. }));
    assert!(matches!(views[3], BlockView::Paragraph { .. }));

    let progress = editor.progress();
    assert_eq!(progress.total, 2);
    assert_eq!(progress.completed, 1);
    assert_eq!(progress.pending, 1);
    assert_eq!(progress.percentage, 50);
}

#[test]
fn title_and_icon_edits_emit_snapshots() {
    let mut editor = open_editor(vec![block("b1", BlockType::Text, "")]);
    assert!(editor.set_title("Q3 Launch"));
    assert!(editor.set_icon("🚀"));
    assert!(!editor.set_icon(""));

    let snapshots = &editor.host().snapshots;
    assert_eq!(snapshots.len(), 2);
    assert_eq!(snapshots[1].title, "Q3 Launch");
    assert_eq!(snapshots[1].icon, "🚀");
}
