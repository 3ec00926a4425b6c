use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::app_dirs::AppDirs;
use crate::inactivity::InactivityMonitor;
use crate::session::SessionConfig;
use crate::speech::RecognitionConfig;

/// User preferences persisted between runs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub language: String,
    pub pass_threshold: f64,
    pub inactivity_timeout_secs: u64,
    pub feedback_sounds: bool,
    pub last_script: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            pass_threshold: 60.0,
            inactivity_timeout_secs: 5,
            feedback_sounds: true,
            last_script: None,
        }
    }
}

impl From<&Config> for SessionConfig {
    fn from(cfg: &Config) -> Self {
        let defaults = SessionConfig::default();
        Self {
            pass_threshold: cfg.pass_threshold.clamp(0.0, 100.0),
            inactivity: InactivityMonitor::new(
                defaults.inactivity.poll_interval,
                Duration::from_secs(cfg.inactivity_timeout_secs.max(1)),
            ),
            recognition: RecognitionConfig {
                language: cfg.language.clone(),
                ..RecognitionConfig::default()
            },
            ..defaults
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
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("recite_config.json"));
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
        match fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice::<Config>(&bytes).unwrap_or_else(|err| {
                tracing::warn!(%err, path = %self.path.display(), "ignoring unreadable config");
                Config::default()
            }),
            Err(_) => Config::default(),
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
