//! Console configuration: TOML file, then environment overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{DeskError, Result};
use crate::resources::Role;

pub const ENV_API_URL: &str = "ECOLE_DESK_API_URL";
pub const ENV_ROLE: &str = "ECOLE_DESK_ROLE";
pub const ENV_TOKEN: &str = "ECOLE_DESK_TOKEN";
pub const ENV_EXPORT_DIR: &str = "ECOLE_DESK_EXPORT_DIR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub export_dir: PathBuf,
    /// Unset means requests never time out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Reload the list after a successful mutation.
    pub resync_after_mutation: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            role: Role::Admin,
            token: None,
            export_dir: PathBuf::from("."),
            timeout_secs: None,
            resync_after_mutation: true,
        }
    }
}

impl Config {
    /// `<config dir>/ecole-desk/config.toml`, when the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "ecole-desk").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Reads `explicit` if given (it must exist), else the default path if it
    /// exists, else defaults; then applies environment overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| DeskError::Config(format!("cannot read {}: {e}", path.display())))?;
        let config = Self::from_toml(&text)
            .map_err(|e| DeskError::Config(format!("{}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| DeskError::Config(e.to_string()))
    }

    /// Overrides fields from `lookup` (the process environment in production).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL) {
            self.base_url = url;
        }
        if let Some(role) = lookup(ENV_ROLE) {
            self.role = role.parse()?;
        }
        if let Some(token) = lookup(ENV_TOKEN).filter(|t| !t.is_empty()) {
            self.token = Some(token);
        }
        if let Some(dir) = lookup(ENV_EXPORT_DIR) {
            self.export_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            base_url = "https://ecole.example.org"
            role = "comptable"
            "#,
        )
        .unwrap();
        assert_eq!(config.base_url, "https://ecole.example.org");
        assert_eq!(config.role, Role::Comptable);
        assert!(config.resync_after_mutation);
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn environment_wins_over_file() {
        let mut config = Config::default();
        let env: HashMap<&str, &str> = [(ENV_ROLE, "censeur"), (ENV_TOKEN, "t0k")].into();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.role, Role::Censeur);
        assert_eq!(config.token.as_deref(), Some("t0k"));
    }

    #[test]
    fn bad_role_is_a_config_error() {
        let mut config = Config::default();
        let err = config
            .apply_env(|key| (key == ENV_ROLE).then(|| "directeur".to_string()))
            .unwrap_err();
        assert!(matches!(err, DeskError::Config(_)));
    }

    #[test]
    fn reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "timeout_secs = 20\nexport_dir = \"exports\"\n").unwrap();
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.timeout(), Some(Duration::from_secs(20)));
        assert_eq!(config.export_dir, PathBuf::from("exports"));
        assert!(Config::from_file(&dir.path().join("missing.toml")).is_err());
    }
}
