use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::collections::VecDeque;
use std::path::PathBuf;
use taskpad_core::config::{ConfigError, ConfigStore, EditorConfig};
use taskpad_core::geometry::{Point, Rect};
use taskpad_core::project::Project;
use taskpad_core::selection::{FormatCommand, MarkupSelection};
use taskpad_core::session::{EditorHost, ProjectEditor};
use taskpad_core::surface::{Key, Modifiers};
use taskpad_core::tasks::{MemoryTaskStore, Task};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug)]
struct HarnessArgs {
    script_path: PathBuf,
    config_path: Option<PathBuf>,
}

fn parse_args(args: &[String]) -> Result<HarnessArgs, String> {
    let mut script_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--script" => {
                let value = iter.next().ok_or_else(|| "Missing --script value".to_string())?;
                script_path = Some(PathBuf::from(value));
            }
            "--config" => {
                let value = iter.next().ok_or_else(|| "Missing --config value".to_string())?;
                config_path = Some(PathBuf::from(value));
            }
            "--help" | "-h" => {
                return Err(String::new());
            }
            _ => return Err(format!("Unknown argument: {arg}")),
        }
    }

    let script_path = script_path.ok_or_else(|| "Missing --script".to_string())?;
    Ok(HarnessArgs {
        script_path,
        config_path,
    })
}

/// A block addressed by id, or by its position at the time the event runs.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum BlockRef {
    Index(usize),
    Id(String),
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ScriptKey {
    Enter,
    Backspace,
    Other,
}

impl From<ScriptKey> for Key {
    fn from(key: ScriptKey) -> Self {
        match key {
            ScriptKey::Enter => Key::Enter,
            ScriptKey::Backspace => Key::Backspace,
            ScriptKey::Other => Key::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
struct ScriptModifiers {
    shift: bool,
    ctrl: bool,
    alt: bool,
    meta: bool,
}

impl From<ScriptModifiers> for Modifiers {
    fn from(mods: ScriptModifiers) -> Self {
        Modifiers {
            shift: mods.shift,
            ctrl: mods.ctrl,
            alt: mods.alt,
            meta: mods.meta,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ScriptFormat {
    Bold,
    Italic,
    Underline,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ScriptEvent {
    Focus {
        block: BlockRef,
    },
    Blur {
        block: BlockRef,
    },
    Input {
        block: BlockRef,
        markup: String,
        #[serde(default)]
        caret: Option<Rect>,
        #[serde(default)]
        bounds: Rect,
    },
    Key {
        block: BlockRef,
        key: ScriptKey,
        #[serde(default)]
        modifiers: ScriptModifiers,
    },
    Click {
        block: BlockRef,
        #[serde(default)]
        link: Option<String>,
        #[serde(default)]
        modifiers: ScriptModifiers,
    },
    PlusMenu {
        block: BlockRef,
        anchor: Rect,
    },
    SlashCommand {
        command: String,
    },
    MenuQuery {
        query: String,
    },
    PickerQuery {
        query: String,
    },
    PickerSelect {
        task: String,
    },
    CloseMenus,
    Select {
        block: BlockRef,
        start: usize,
        end: usize,
        #[serde(default)]
        rect: Rect,
    },
    Format {
        format: ScriptFormat,
    },
    Highlight {
        color: String,
    },
    Link {
        #[serde(default)]
        url: Option<String>,
    },
    ToggleBullet,
    ToggleColorPicker,
    MouseDown {
        x: f32,
        y: f32,
        #[serde(default)]
        toolbar: Option<Rect>,
        #[serde(default = "default_collapsed")]
        collapsed: bool,
    },
    Delete {
        block: BlockRef,
    },
    Title {
        title: String,
    },
    Icon {
        icon: String,
    },
    ToggleTask {
        task: String,
    },
    EditTask {
        task: String,
    },
    FocusTask {
        task: String,
    },
    ToggleSubtask {
        task: String,
        subtask: String,
    },
}

fn default_collapsed() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Script {
    #[serde(default)]
    project: Option<Project>,
    #[serde(default)]
    tasks: Vec<Task>,
    #[serde(default = "default_viewport_height")]
    viewport_height: f32,
    #[serde(default)]
    events: Vec<ScriptEvent>,
}

fn default_viewport_height() -> f32 {
    800.0
}

struct HarnessHost {
    viewport_height: f32,
    link_answers: VecDeque<Option<String>>,
    snapshots: usize,
    opened_links: Vec<String>,
}

impl EditorHost for HarnessHost {
    fn on_project_change(&mut self, project: &Project) {
        self.snapshots += 1;
        debug!(blocks = project.blocks.len(), "project snapshot");
    }

    fn open_link(&mut self, url: &str) {
        self.opened_links.push(url.to_string());
    }

    fn prompt_link_url(&mut self) -> Option<String> {
        self.link_answers.pop_front().flatten()
    }

    fn viewport_height(&self) -> f32 {
        self.viewport_height
    }
}

type Session = ProjectEditor<MemoryTaskStore, HarnessHost>;

struct Replay {
    editor: Session,
    selection: Option<MarkupSelection>,
}

impl Replay {
    fn block_id(&self, block: &BlockRef) -> Result<String> {
        let blocks = &self.editor.project().blocks;
        match block {
            BlockRef::Index(ix) => blocks
                .get(*ix)
                .map(|block| block.id.clone())
                .ok_or_else(|| anyhow!("no block at index {ix}")),
            BlockRef::Id(id) => Ok(id.clone()),
        }
    }

    /// Writes the selection's markup back through the surface, the way a
    /// rich-text host reports an input event after formatting.
    fn sync_selection(&mut self) {
        if let Some(selection) = &self.selection {
            let block_id = selection.block_id().to_string();
            let markup = selection.to_markup();
            self.editor
                .handle_input(&block_id, markup, None, Rect::default());
        }
    }

    fn take_selection(&mut self) -> Result<MarkupSelection> {
        self.selection
            .take()
            .ok_or_else(|| anyhow!("formatting event without a prior select event"))
    }

    fn run(&mut self, event: ScriptEvent) -> Result<()> {
        match event {
            ScriptEvent::Focus { block } => {
                let id = self.block_id(&block)?;
                self.editor.focus_block(&id);
            }
            ScriptEvent::Blur { block } => {
                let id = self.block_id(&block)?;
                self.editor.blur_block(&id);
            }
            ScriptEvent::Input {
                block,
                markup,
                caret,
                bounds,
            } => {
                let id = self.block_id(&block)?;
                self.editor.handle_input(&id, markup, caret, bounds);
            }
            ScriptEvent::Key {
                block,
                key,
                modifiers,
            } => {
                let id = self.block_id(&block)?;
                self.editor.handle_key(&id, key.into(), modifiers.into());
            }
            ScriptEvent::Click {
                block,
                link,
                modifiers,
            } => {
                let id = self.block_id(&block)?;
                self.editor
                    .handle_click(&id, link.as_deref(), modifiers.into());
            }
            ScriptEvent::PlusMenu { block, anchor } => {
                let id = self.block_id(&block)?;
                self.editor.open_plus_menu(&id, anchor);
            }
            ScriptEvent::SlashCommand { command } => {
                self.editor.run_slash_command(&command);
            }
            ScriptEvent::MenuQuery { query } => {
                self.editor.set_menu_query(&query);
                let listed: Vec<&str> = self
                    .editor
                    .menu_commands()
                    .iter()
                    .map(|command| command.id)
                    .collect();
                debug!(%query, ?listed, "slash menu filtered");
            }
            ScriptEvent::PickerQuery { query } => {
                self.editor.set_picker_query(&query);
                if let Some(message) = self.editor.picker_empty_message() {
                    debug!(%query, message, "task picker empty");
                }
            }
            ScriptEvent::PickerSelect { task } => {
                self.editor.select_picker_task(&task);
            }
            ScriptEvent::CloseMenus => self.editor.close_overlays(),
            ScriptEvent::Select {
                block,
                start,
                end,
                rect,
            } => {
                let id = self.block_id(&block)?;
                let markup = self
                    .editor
                    .project()
                    .block(&id)
                    .map(|block| block.content.clone())
                    .ok_or_else(|| anyhow!("cannot select in unknown block {id}"))?;
                let mut selection = MarkupSelection::new(id, &markup);
                selection.select(start..end, rect);
                self.editor.handle_selection_change(&selection);
                self.selection = Some(selection);
            }
            ScriptEvent::Format { format } => {
                let command = match format {
                    ScriptFormat::Bold => FormatCommand::Bold,
                    ScriptFormat::Italic => FormatCommand::Italic,
                    ScriptFormat::Underline => FormatCommand::Underline,
                };
                let mut selection = self.take_selection()?;
                self.editor.apply_format(&mut selection, command);
                self.selection = Some(selection);
                self.sync_selection();
            }
            ScriptEvent::Highlight { color } => {
                let mut selection = self.take_selection()?;
                self.editor.toggle_highlight(&mut selection, &color);
                self.selection = Some(selection);
                self.sync_selection();
            }
            ScriptEvent::Link { url } => {
                let mut selection = self.take_selection()?;
                self.editor.host_mut().link_answers.push_back(url);
                self.editor.create_link(&mut selection);
                self.selection = Some(selection);
                self.sync_selection();
            }
            ScriptEvent::ToggleBullet => {
                self.editor.toggle_bullet_from_toolbar();
            }
            ScriptEvent::ToggleColorPicker => {
                self.editor.toggle_color_picker();
            }
            ScriptEvent::MouseDown {
                x,
                y,
                toolbar,
                collapsed,
            } => {
                self.editor
                    .handle_mouse_down(Point::new(x, y), toolbar, collapsed);
            }
            ScriptEvent::Delete { block } => {
                let id = self.block_id(&block)?;
                self.editor.delete_block(&id);
            }
            ScriptEvent::Title { title } => {
                self.editor.set_title(&title);
            }
            ScriptEvent::Icon { icon } => {
                self.editor.set_icon(&icon);
            }
            ScriptEvent::ToggleTask { task } => {
                self.editor.toggle_task_completion(&task);
            }
            ScriptEvent::EditTask { task } => {
                self.editor.edit_task(&task);
            }
            ScriptEvent::FocusTask { task } => {
                self.editor.focus_task(&task);
            }
            ScriptEvent::ToggleSubtask { task, subtask } => {
                self.editor.toggle_subtask(&task, &subtask);
            }
        }
        Ok(())
    }
}

/// Explicit `--config` file, else the per-user location, else built-in defaults
/// when the platform has no config directory.
fn load_config(path: Option<PathBuf>) -> Result<EditorConfig> {
    let store = match ConfigStore::locate(path) {
        Ok(store) => store,
        Err(ConfigError::ProjectDir) => {
            warn!("no per-user config directory, using built-in defaults");
            return Ok(EditorConfig::default());
        }
        Err(err) => return Err(err.into()),
    };
    debug!(path = %store.path().display(), "loading editor config");
    store
        .load()
        .with_context(|| format!("failed to load config from {}", store.path().display()))
}

fn replay_script(raw: &str, config: EditorConfig) -> Result<Replay> {
    let script: Script = serde_json::from_str(raw).context("invalid script")?;
    if !script.viewport_height.is_finite() || script.viewport_height <= 0.0 {
        bail!("viewportHeight must be a positive number");
    }

    let host = HarnessHost {
        viewport_height: script.viewport_height,
        link_answers: VecDeque::new(),
        snapshots: 0,
        opened_links: Vec::new(),
    };
    let project = script.project.unwrap_or_default();
    let store = MemoryTaskStore::new(script.tasks);
    let mut replay = Replay {
        editor: ProjectEditor::new(project, store, host, config),
        selection: None,
    };

    let total = script.events.len();
    for (ix, event) in script.events.into_iter().enumerate() {
        debug!(step = ix, ?event, "replaying event");
        replay
            .run(event)
            .with_context(|| format!("event {ix} failed"))?;
    }

    let host = replay.editor.host();
    info!(
        events = total,
        snapshots = host.snapshots,
        links = ?host.opened_links,
        "replay finished"
    );
    Ok(replay)
}

fn run(args: HarnessArgs) -> Result<()> {
    let config = load_config(args.config_path)?;
    let raw = std::fs::read_to_string(&args.script_path)
        .with_context(|| format!("failed to read script {}", args.script_path.display()))?;
    let replay = replay_script(&raw, config)?;
    let output = serde_json::to_string_pretty(replay.editor.project())?;
    println!("{output}");
    Ok(())
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = std::env::args().collect::<Vec<_>>();
    let parsed = match parse_args(&args) {
        Ok(value) => value,
        Err(message) => {
            if !message.is_empty() {
                eprintln!("{message}");
            }
            eprintln!("Usage: editor-harness --script <file.json> [--config <file.json>]");
            std::process::exit(1);
        }
    };
    run(parsed)
}
