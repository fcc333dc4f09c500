use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::app::App;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Contents of a `settings.json` file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub apps: Vec<App>,
}

impl Settings {
    /// `~/.extools/settings.json`
    pub fn global_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".extools").join("settings.json"))
    }

    /// `<root>/.extools/settings.json`
    pub fn project_path(root: &Path) -> PathBuf {
        root.join(".extools").join("settings.json")
    }

    /// Parse a settings file that must exist.
    pub fn read(path: &Path) -> Result<Self, SettingsError> {
        let data = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&data).map_err(|source| SettingsError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Like [`Settings::read`], but a missing file yields `None`.
    pub fn read_optional(path: &Path) -> Result<Option<Self>, SettingsError> {
        match Self::read(path) {
            Ok(settings) => Ok(Some(settings)),
            Err(SettingsError::Io { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                tracing::debug!(path = %path.display(), "no settings file");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Overlay `other` on `self`. Apps in `other` replace apps with the same
    /// id and are appended after the remaining ones.
    pub fn merge(mut self, other: Settings) -> Settings {
        for app in other.apps {
            self.apps.retain(|a| a.id != app.id);
            self.apps.push(app);
        }
        self
    }

    /// Load global settings, then project-local settings on top.
    pub fn load_layered(global: Option<&Path>, project: &Path) -> Result<Self, SettingsError> {
        let mut settings = Settings::default();
        if let Some(path) = global
            && let Some(global) = Self::read_optional(path)?
        {
            settings = global;
        }
        if let Some(local) = Self::read_optional(project)? {
            settings = settings.merge(local);
        }
        tracing::debug!(apps = settings.apps.len(), "settings loaded");
        Ok(settings)
    }

    /// Load `~/.extools/settings.json` overlaid with the project file under
    /// `root`.
    pub fn load(root: &Path) -> Result<Self, SettingsError> {
        Self::load_layered(Self::global_path().as_deref(), &Self::project_path(root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Command;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, contents: &str) -> PathBuf {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn read_apps() {
        let dir = TempDir::new().unwrap();
        let path = write(
            dir.path(),
            "settings.json",
            r#"{"apps": [
                {"id": "term", "name": "Terminal", "cmd": "xterm", "working_dir": "${folder}"},
                {"id": "fmt", "cmd": ["fmtr", "--line=${line}", "${file}"]}
            ]}"#,
        );
        let settings = Settings::read(&path).unwrap();
        assert_eq!(settings.apps.len(), 2);
        assert_eq!(settings.apps[0].display_name(), "Terminal");
        assert_eq!(settings.apps[1].cmd, Command::args(["fmtr", "--line=${line}", "${file}"]));
    }

    #[test]
    fn missing_apps_key_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "settings.json", "{}");
        assert!(Settings::read(&path).unwrap().apps.is_empty());
    }

    #[test]
    fn read_missing_file_errors() {
        let dir = TempDir::new().unwrap();
        let err = Settings::read(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, SettingsError::Io { .. }));
    }

    #[test]
    fn read_optional_missing_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(Settings::read_optional(&dir.path().join("nope.json")).unwrap().is_none());
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "settings.json", r#"{"apps": [{"id": 1}]}"#);
        let err = Settings::read_optional(&path).unwrap_err();
        assert!(matches!(err, SettingsError::Json { .. }));
        assert!(err.to_string().contains("settings.json"));
    }

    #[test]
    fn project_overrides_global_by_id() {
        let dir = TempDir::new().unwrap();
        let global = write(
            dir.path(),
            "home/settings.json",
            r#"{"apps": [{"id": "a", "cmd": "ga"}, {"id": "b", "cmd": "gb"}]}"#,
        );
        let root = dir.path().join("project");
        write(
            &root,
            ".extools/settings.json",
            r#"{"apps": [{"id": "a", "cmd": "pa"}, {"id": "c", "cmd": "pc"}]}"#,
        );
        let settings =
            Settings::load_layered(Some(&global), &Settings::project_path(&root)).unwrap();
        let ids: Vec<&str> = settings.apps.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["b", "a", "c"]);
        assert_eq!(settings.apps[1].cmd, Command::from("pa"));
    }

    #[test]
    fn layered_without_any_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load_layered(
            Some(&dir.path().join("missing.json")),
            &Settings::project_path(dir.path()),
        )
        .unwrap();
        assert_eq!(settings, Settings::default());
    }
}
