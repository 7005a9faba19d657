use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Serde(serde_json::Error),
    ProjectDir,
    Invalid(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "config io error: {err}"),
            Self::Serde(err) => write!(f, "config parse error: {err}"),
            Self::ProjectDir => write!(f, "no config directory for this platform"),
            Self::Invalid(reason) => write!(f, "invalid editor config: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HighlightColor {
    pub label: String,
    pub color: String,
}

impl HighlightColor {
    fn new(label: &str, color: &str) -> Self {
        Self {
            label: label.to_string(),
            color: color.to_string(),
        }
    }
}

/// Clears an existing highlight when applied.
pub const NO_HIGHLIGHT: &str = "transparent";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EditorConfig {
    pub trigger: char,
    /// Menus open above their anchor when less space than this remains below.
    pub menu_flip_threshold: f32,
    pub menu_gap: f32,
    pub toolbar_lift: f32,
    pub toolbar_height: f32,
    pub highlight_colors: Vec<HighlightColor>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            trigger: '/',
            menu_flip_threshold: 300.0,
            menu_gap: 5.0,
            toolbar_lift: 10.0,
            toolbar_height: 50.0,
            highlight_colors: vec![
                HighlightColor::new("Yellow", "#fef08a"),
                HighlightColor::new("Green", "#bbf7d0"),
                HighlightColor::new("Blue", "#bfdbfe"),
                HighlightColor::new("Pink", "#fbcfe8"),
                HighlightColor::new("Purple", "#e9d5ff"),
                HighlightColor::new("Red", "#fecaca"),
            ],
        }
    }
}

impl EditorConfig {
    /// Rejects values that would misplace popups or offer unusable swatches.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let lengths = [
            ("menu_flip_threshold", self.menu_flip_threshold),
            ("menu_gap", self.menu_gap),
            ("toolbar_lift", self.toolbar_lift),
            ("toolbar_height", self.toolbar_height),
        ];
        for (name, value) in lengths {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-negative number"
                )));
            }
        }
        if self.trigger.is_whitespace() {
            return Err(ConfigError::Invalid("trigger cannot be whitespace".into()));
        }
        if let Some(swatch) = self
            .highlight_colors
            .iter()
            .find(|swatch| swatch.color.trim().is_empty())
        {
            return Err(ConfigError::Invalid(format!(
                "highlight color {:?} has no value",
                swatch.label
            )));
        }
        Ok(())
    }
}

pub struct ConfigStore {
    config_path: PathBuf,
}

impl ConfigStore {
    pub fn new(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn default_store() -> Result<Self, ConfigError> {
        let project_dirs =
            ProjectDirs::from("app", "taskpad", "Taskpad").ok_or(ConfigError::ProjectDir)?;
        Ok(Self::new(project_dirs.config_dir().join("editor.json")))
    }

    /// Uses `explicit` when given, otherwise the per-user config location.
    pub fn locate(explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Ok(Self::new(path)),
            None => Self::default_store(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// A missing file yields the defaults; anything unreadable is an error.
    pub fn load(&self) -> Result<EditorConfig, ConfigError> {
        let raw = match fs::read_to_string(&self.config_path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(EditorConfig::default()),
            Err(err) => return Err(err.into()),
        };
        let config: EditorConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, config: &EditorConfig) -> Result<(), ConfigError> {
        config.validate()?;
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(config)?;
        fs::write(&self.config_path, data)?;
        Ok(())
    }
}
