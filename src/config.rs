use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{ConfigError, Result};

/// Time limits a timed session may be configured with.
pub const TIME_LIMITS: [u64; 4] = [15, 30, 60, 120];

/// Tokens generated per batch when none is configured.
pub const DEFAULT_TOKEN_COUNT: usize = 35;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Mode {
    /// ends when the last token is committed
    Fixed,
    /// ends when the countdown reaches zero
    Timed,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum VocabularyKind {
    Words,
    Sentences,
}

impl VocabularyKind {
    pub fn file_stem(&self) -> &'static str {
        match self {
            VocabularyKind::Words => "words",
            VocabularyKind::Sentences => "sentences",
        }
    }
}

impl FromStr for VocabularyKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "words" => Ok(VocabularyKind::Words),
            "sentences" => Ok(VocabularyKind::Sentences),
            other => Err(ConfigError::UnknownVocabulary(other.to_string())),
        }
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(Mode::Fixed),
            "timed" => Ok(Mode::Timed),
            other => Err(ConfigError::UnknownMode(other.to_string())),
        }
    }
}

/// Parameters of a single session, validated before a session is created.
///
/// In timed mode `token_count` is the size of the initial batch and of every
/// extension batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub mode: Mode,
    pub vocabulary: VocabularyKind,
    pub token_count: usize,
    pub time_limit_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Fixed,
            vocabulary: VocabularyKind::Words,
            token_count: DEFAULT_TOKEN_COUNT,
            time_limit_secs: 30,
        }
    }
}

impl SessionConfig {
    pub fn fixed(vocabulary: VocabularyKind, token_count: usize) -> Self {
        Self {
            mode: Mode::Fixed,
            vocabulary,
            token_count,
            ..Self::default()
        }
    }

    pub fn timed(vocabulary: VocabularyKind, time_limit_secs: u64) -> Self {
        Self {
            mode: Mode::Timed,
            vocabulary,
            time_limit_secs,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.token_count == 0 {
            return Err(ConfigError::ZeroTokenCount);
        }
        if self.mode == Mode::Timed {
            validate_time_limit(self.time_limit_secs)?;
        }
        Ok(())
    }

    pub fn is_timed(&self) -> bool {
        self.mode == Mode::Timed
    }
}

pub fn validate_time_limit(secs: u64) -> Result<()> {
    if TIME_LIMITS.contains(&secs) {
        Ok(())
    } else {
        Err(ConfigError::UnsupportedTimeLimit(secs))
    }
}

/// Preferences remembered between runs of the terminal app.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub mode: Mode,
    pub vocabulary: VocabularyKind,
    pub token_count: usize,
    pub time_limit_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        SessionConfig::default().into()
    }
}

impl From<SessionConfig> for Config {
    fn from(sc: SessionConfig) -> Self {
        Self {
            mode: sc.mode,
            vocabulary: sc.vocabulary,
            token_count: sc.token_count,
            time_limit_secs: sc.time_limit_secs,
        }
    }
}

impl From<&Config> for SessionConfig {
    fn from(cfg: &Config) -> Self {
        Self {
            mode: cfg.mode,
            vocabulary: cfg.vocabulary,
            token_count: cfg.token_count,
            time_limit_secs: cfg.time_limit_secs,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "lokitype") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("lokitype_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let loaded = fs::read(&self.path)
            .ok()
            .and_then(|bytes| serde_json::from_slice::<Config>(&bytes).ok())
            .filter(|cfg| SessionConfig::from(cfg).validate().is_ok());

        match loaded {
            Some(cfg) => cfg,
            None => {
                tracing::debug!(path = %self.path.display(), "using default config");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).map_err(std::io::Error::other)?;
        fs::write(&self.path, data)
    }
}
