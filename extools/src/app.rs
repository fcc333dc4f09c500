use serde::{Deserialize, Serialize};

/// Command template as written in settings: one command line, or an argument
/// vector. `null` entries are allowed in the vector and dropped at expansion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Command {
    Single(String),
    Args(Vec<Option<String>>),
}

impl Command {
    /// Build an argument-vector command with no absent entries.
    pub fn args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Command::Args(args.into_iter().map(|a| Some(a.into())).collect())
    }
}

impl From<&str> for Command {
    fn from(line: &str) -> Self {
        Command::Single(line.to_string())
    }
}

impl From<String> for Command {
    fn from(line: String) -> Self {
        Command::Single(line)
    }
}

/// A configured external tool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct App {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub cmd: Command,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
}

impl App {
    pub fn new(id: impl Into<String>, cmd: impl Into<Command>) -> Self {
        Self {
            id: id.into(),
            name: None,
            cmd: cmd.into(),
            working_dir: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<String>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Label for pickers and status lines: `name`, falling back to `id`.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// Working-directory template, or `None` when absent or blank.
    pub fn working_dir(&self) -> Option<&str> {
        self.working_dir
            .as_deref()
            .filter(|dir| !dir.trim().is_empty())
    }
}

/// Look up an app by exact id.
pub fn find<'a>(apps: &'a [App], id: &str) -> Option<&'a App> {
    apps.iter().find(|a| a.id == id)
}
