//! MindLog configuration at ~/.config/mindlog/config.toml

use std::path::{Path, PathBuf};

use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{MindLogError, MindLogResult};
use crate::question::QuestionBank;

static DEFAULT_DATA_DIR: &str = "~/.local/share/mindlog";

/// Event storage file inside the data directory.
pub const STORAGE_FILE: &str = "mindlog-storage.json";
/// Pending reminders file inside the data directory.
pub const REMINDERS_FILE: &str = "reminders.json";

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

fn default_daily_questions() -> usize {
    4
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MindLogConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Where exported calendars are written; `<data_dir>/exports` when unset
    #[serde(default)]
    pub export_dir: Option<PathBuf>,

    /// JSON question set replacing the built-in one
    #[serde(default)]
    pub questions_file: Option<PathBuf>,

    #[serde(default = "default_daily_questions")]
    pub daily_questions: usize,
}

impl Default for MindLogConfig {
    fn default() -> Self {
        MindLogConfig {
            data_dir: default_data_dir(),
            export_dir: None,
            questions_file: None,
            daily_questions: default_daily_questions(),
        }
    }
}

impl MindLogConfig {
    pub fn config_path() -> MindLogResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| MindLogError::Config("Could not determine config directory".into()))?
            .join("mindlog");

        Ok(config_dir.join("config.toml"))
    }

    /// Load the user's config, writing a commented default on first run.
    /// `MINDLOG_*` environment variables override file values.
    pub fn load() -> MindLogResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> MindLogResult<Self> {
        Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(Environment::with_prefix("MINDLOG"))
            .build()
            .map_err(|e| MindLogError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| MindLogError::Config(e.to_string()))
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> MindLogResult<()> {
        let contents = format!(
            "\
# MindLog configuration

# Where events and reminders are stored:
# data_dir = \"{}\"

# Where exported .ics files are written (defaults to <data_dir>/exports):
# export_dir = \"~/Documents/MindLog\"

# Custom diary questions, a JSON file with a \"questions\" list:
# questions_file = \"~/.config/mindlog/questions.json\"

# How many questions to suggest per day:
# daily_questions = 4
",
            DEFAULT_DATA_DIR
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                MindLogError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| MindLogError::Config(format!("Could not write config file: {e}")))?;

        tracing::info!(path = %path.display(), "created default config");
        Ok(())
    }

    pub fn data_path(&self) -> PathBuf {
        expand(&self.data_dir)
    }

    pub fn export_path(&self) -> PathBuf {
        match &self.export_dir {
            Some(dir) => expand(dir),
            None => self.data_path().join("exports"),
        }
    }

    pub fn storage_path(&self) -> PathBuf {
        self.data_path().join(STORAGE_FILE)
    }

    pub fn reminders_path(&self) -> PathBuf {
        self.data_path().join(REMINDERS_FILE)
    }

    /// The configured question set, or the built-in one.
    pub fn question_bank(&self) -> MindLogResult<QuestionBank> {
        match &self.questions_file {
            Some(path) => QuestionBank::load(&expand(path)),
            None => Ok(QuestionBank::builtin()),
        }
    }
}

fn expand(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}
