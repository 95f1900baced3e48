use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid yaml in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("settings validation failed: {0}")]
    Settings(String),
    #[error("failed to resolve home directory for default config path")]
    HomeDirectoryUnavailable,
}

pub const CONFIG_ENV_VAR: &str = "WPCGATE_CONFIG";
pub const GLOBAL_STATE_DIR: &str = ".wpcgate";
pub const GLOBAL_SETTINGS_FILE_NAME: &str = "config.yaml";

pub const DEFAULT_BROWSE_ROOT: &str = "project";
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_browse_root() -> String {
    DEFAULT_BROWSE_ROOT.to_string()
}

fn default_preview_roots() -> Vec<String> {
    vec!["docs".to_string(), "logs".to_string()]
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
    pub engine: EngineSettings,
    pub roots: BTreeMap<String, PathBuf>,
    #[serde(default = "default_browse_root")]
    pub browse_root: String,
    #[serde(default = "default_preview_roots")]
    pub preview_roots: Vec<String>,
    pub agents_file: PathBuf,
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

/// Location and limits of the external automation engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineSettings {
    pub interpreter: String,
    pub script: PathBuf,
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl EngineSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Directory the engine runs in: the configured one, else the script's parent.
    pub fn resolve_working_dir(&self) -> PathBuf {
        if let Some(dir) = &self.working_dir {
            return dir.clone();
        }
        self.script
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("/"))
    }
}

impl Settings {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.interpreter.trim().is_empty() {
            return Err(ConfigError::Settings(
                "`engine.interpreter` must be non-empty".to_string(),
            ));
        }
        if !self.engine.script.is_absolute() {
            return Err(ConfigError::Settings(
                "`engine.script` must be an absolute path".to_string(),
            ));
        }
        if let Some(dir) = &self.engine.working_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::Settings(
                    "`engine.working_dir` must be an absolute path".to_string(),
                ));
            }
        }
        if self.engine.timeout_secs == 0 {
            return Err(ConfigError::Settings(
                "`engine.timeout_secs` must be greater than zero".to_string(),
            ));
        }

        if self.roots.is_empty() {
            return Err(ConfigError::Settings(
                "`roots` must declare at least one sandbox root".to_string(),
            ));
        }
        for (name, path) in &self.roots {
            if name.trim().is_empty() {
                return Err(ConfigError::Settings(
                    "`roots` keys must be non-empty".to_string(),
                ));
            }
            if !path.is_absolute() {
                return Err(ConfigError::Settings(format!(
                    "root `{name}` must use an absolute path"
                )));
            }
            fs::canonicalize(path).map_err(|_| {
                ConfigError::Settings(format!(
                    "root `{name}` path `{}` is missing or invalid",
                    path.display()
                ))
            })?;
        }

        if !self.roots.contains_key(&self.browse_root) {
            return Err(ConfigError::Settings(format!(
                "`browse_root` references unknown root `{}`",
                self.browse_root
            )));
        }
        if self.preview_roots.is_empty() {
            return Err(ConfigError::Settings(
                "`preview_roots` must list at least one root".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for name in &self.preview_roots {
            if !self.roots.contains_key(name) {
                return Err(ConfigError::Settings(format!(
                    "`preview_roots` references unknown root `{name}`"
                )));
            }
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::Settings(format!(
                    "`preview_roots` lists root `{name}` more than once"
                )));
            }
        }

        if !self.agents_file.is_absolute() {
            return Err(ConfigError::Settings(
                "`agents_file` must be an absolute path".to_string(),
            ));
        }
        if let Some(dir) = &self.log_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::Settings(
                    "`log_dir` must be an absolute path".to_string(),
                ));
            }
        }
        Ok(())
    }
}

pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
        return Ok(PathBuf::from(path));
    }
    let home = std::env::var_os("HOME").ok_or(ConfigError::HomeDirectoryUnavailable)?;
    Ok(PathBuf::from(home)
        .join(GLOBAL_STATE_DIR)
        .join(GLOBAL_SETTINGS_FILE_NAME))
}

pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => default_config_path()?,
    };
    let settings = Settings::from_path(&path)?;
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn settings_yaml(base: &Path) -> String {
        format!(
            r#"
engine:
  interpreter: python3
  script: {base}/engine/WPCV1.py
roots:
  project: {base}/project
  docs: {base}/docs
  logs: {base}/logs
agents_file: {base}/agents.json
"#,
            base = base.display()
        )
    }

    fn make_roots(base: &Path) {
        for dir in ["project", "docs", "logs", "engine"] {
            fs::create_dir_all(base.join(dir)).expect("create root");
        }
    }

    #[test]
    fn defaults_fill_optional_fields() {
        let dir = tempdir().expect("tempdir");
        make_roots(dir.path());
        let settings: Settings =
            serde_yaml::from_str(&settings_yaml(dir.path())).expect("parse settings");

        assert_eq!(settings.listen, default_listen());
        assert_eq!(settings.engine.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(settings.browse_root, "project");
        assert_eq!(settings.preview_roots, vec!["docs", "logs"]);
        assert_eq!(
            settings.engine.resolve_working_dir(),
            dir.path().join("engine")
        );
        settings.validate().expect("valid settings");
    }

    #[test]
    fn validate_rejects_unknown_preview_root() {
        let dir = tempdir().expect("tempdir");
        make_roots(dir.path());
        let mut settings: Settings =
            serde_yaml::from_str(&settings_yaml(dir.path())).expect("parse settings");
        settings.preview_roots = vec!["docs".to_string(), "archive".to_string()];

        let err = settings.validate().expect_err("unknown root");
        assert!(err.to_string().contains("unknown root `archive`"));
    }

    #[test]
    fn validate_rejects_missing_root_directory() {
        let dir = tempdir().expect("tempdir");
        make_roots(dir.path());
        fs::remove_dir(dir.path().join("logs")).expect("remove logs");
        let settings: Settings =
            serde_yaml::from_str(&settings_yaml(dir.path())).expect("parse settings");

        let err = settings.validate().expect_err("missing root");
        assert!(err.to_string().contains("root `logs`"));
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let dir = tempdir().expect("tempdir");
        make_roots(dir.path());
        let mut settings: Settings =
            serde_yaml::from_str(&settings_yaml(dir.path())).expect("parse settings");
        settings.engine.timeout_secs = 0;

        assert!(matches!(
            settings.validate(),
            Err(ConfigError::Settings(message)) if message.contains("timeout_secs")
        ));
    }

    #[test]
    fn load_settings_reports_yaml_errors_with_path() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("config.yaml");
        fs::write(&path, "engine: [unclosed").expect("write config");

        match load_settings(Some(&path)) {
            Err(ConfigError::Parse { path: reported, .. }) => {
                assert_eq!(reported, path.display().to_string());
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
