use std::collections::HashMap;
use std::path::PathBuf;

use tokio::sync::oneshot;

use crate::app::{self, App, Command};
use crate::expand::{ExpandedCommand, expand_command};
use crate::spawn::{ProcessHandle, Spawner};
use crate::variables::{Environment, Region, RowCol, SelectionBounds, VariableMap, resolve};

#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("No apps defined")]
    NoAppsConfigured,
    #[error("App with id {0} not found")]
    AppNotFound(String),
    #[error("Failed to start {command}: {source}")]
    LaunchFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Answer from the host's selection list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Choice {
    Selected(usize),
    Cancelled,
}

impl Choice {
    /// Map a list index where `-1` means "nothing picked".
    pub fn from_index(index: i64) -> Self {
        usize::try_from(index).map_or(Choice::Cancelled, Choice::Selected)
    }
}

/// The editing context the launcher runs in.
pub trait Host {
    /// Apps configured for the active view.
    fn apps(&self) -> Vec<App>;
    /// Path and workspace variables (`file`, `folder`, ...).
    fn workspace_variables(&self) -> HashMap<String, String>;
    /// First selection region of the active view.
    fn selection(&self) -> Region;
    /// Zero-based row/column of a character offset in the active view.
    fn row_col(&self, offset: usize) -> RowCol;
    /// Present `names` and resolve once with the user's choice. A dropped
    /// sender counts as cancellation.
    fn show_selection_list(&self, names: Vec<String>) -> oneshot::Receiver<Choice>;
    /// Transient user-facing status line.
    fn report_status(&self, message: &str);
}

/// What the caller asked for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Invocation {
    /// Run the configured app with this id.
    App { id: String },
    /// Run a raw command.
    Command {
        cmd: Command,
        name: Option<String>,
        working_dir: Option<String>,
    },
    /// Let the user pick an app.
    Select,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Launched(ProcessHandle),
    /// Selection was dismissed; nothing ran.
    Cancelled,
}

/// Expanded working directory, or `None` (inherit ours) when absent or blank.
pub fn resolve_working_dir(working_dir: Option<&str>, variables: &VariableMap) -> Option<PathBuf> {
    working_dir
        .map(|dir| variables.expand(dir))
        .filter(|dir| !dir.trim().is_empty())
        .map(PathBuf::from)
}

pub struct Launcher<H, S> {
    host: H,
    spawner: S,
}

impl<H: Host, S: Spawner> Launcher<H, S> {
    pub fn new(host: H, spawner: S) -> Self {
        Self { host, spawner }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn spawner(&self) -> &S {
        &self.spawner
    }

    /// Entry point: captures the environment once, dispatches, and reports
    /// any failure through the host's status line.
    pub async fn run(&self, invocation: Invocation) -> Result<Outcome, LaunchError> {
        let environment = Environment::capture();
        self.run_with_env(invocation, &environment).await
    }

    pub async fn run_with_env(
        &self,
        invocation: Invocation,
        environment: &Environment,
    ) -> Result<Outcome, LaunchError> {
        let result = match invocation {
            Invocation::App { id } => self.run_by_id(&id, &self.host.apps(), environment),
            Invocation::Command {
                cmd,
                name,
                working_dir,
            } => self.run_command(&cmd, name.as_deref(), working_dir.as_deref(), environment),
            Invocation::Select => self.select_and_run(&self.host.apps(), environment).await,
        };
        if let Err(e) = &result {
            self.host.report_status(&e.to_string());
        }
        result
    }

    /// Run the app whose id is `id`.
    pub fn run_by_id(
        &self,
        id: &str,
        apps: &[App],
        environment: &Environment,
    ) -> Result<Outcome, LaunchError> {
        // An empty picker would only ever cancel; say why instead.
        if apps.is_empty() {
            return Err(LaunchError::NoAppsConfigured);
        }
        let app = app::find(apps, id).ok_or_else(|| LaunchError::AppNotFound(id.to_string()))?;
        tracing::debug!(id, name = app.display_name(), "app resolved");
        let variables = self.variables(environment);
        self.launch(
            &app.cmd,
            Some(app.display_name()),
            app.working_dir(),
            &variables,
        )
    }

    /// Run a command that is not in the app list.
    pub fn run_command(
        &self,
        cmd: &Command,
        name: Option<&str>,
        working_dir: Option<&str>,
        environment: &Environment,
    ) -> Result<Outcome, LaunchError> {
        let variables = self.variables(environment);
        self.launch(cmd, name, working_dir, &variables)
    }

    /// Ask the host to pick an app, then run it by id.
    pub async fn select_and_run(
        &self,
        apps: &[App],
        environment: &Environment,
    ) -> Result<Outcome, LaunchError> {
        if apps.is_empty() {
            return Err(LaunchError::NoAppsConfigured);
        }
        let names = apps.iter().map(|a| a.display_name().to_string()).collect();
        let choice = self
            .host
            .show_selection_list(names)
            .await
            .unwrap_or(Choice::Cancelled);
        match choice {
            Choice::Selected(index) => match apps.get(index) {
                Some(app) => self.run_by_id(&app.id, apps, environment),
                None => {
                    tracing::warn!(index, count = apps.len(), "selection out of range");
                    Ok(Outcome::Cancelled)
                }
            },
            Choice::Cancelled => {
                tracing::debug!("selection cancelled");
                Ok(Outcome::Cancelled)
            }
        }
    }

    /// Variables for the host's current selection.
    pub fn variables(&self, environment: &Environment) -> VariableMap {
        let bounds = SelectionBounds::from_region(self.host.selection(), |offset| {
            self.host.row_col(offset)
        });
        resolve(bounds, &self.host.workspace_variables(), environment)
    }

    /// Expand and spawn. Does not wait for the process.
    pub fn launch(
        &self,
        cmd: &Command,
        name: Option<&str>,
        working_dir: Option<&str>,
        variables: &VariableMap,
    ) -> Result<Outcome, LaunchError> {
        let expanded = expand_command(cmd, variables);
        let cwd = resolve_working_dir(working_dir, variables);
        let shown_dir = cwd
            .as_deref()
            .map_or_else(|| "default dir".to_string(), |d| d.display().to_string());
        tracing::info!("External tool: {expanded} (in {shown_dir})");

        let label = name.map_or_else(|| expanded.to_string(), str::to_string);
        self.host.report_status(&format!("Start {label}"));

        let handle = self
            .spawner
            .spawn_detached(&expanded, cwd.as_deref())
            .map_err(|source| launch_failed(&expanded, source))?;
        tracing::debug!(pid = ?handle.pid, "spawned");
        Ok(Outcome::Launched(handle))
    }
}

fn launch_failed(command: &ExpandedCommand, source: std::io::Error) -> LaunchError {
    LaunchError::LaunchFailed {
        command: command.to_string(),
        source,
    }
}
