use std::collections::HashMap;
use std::io::IsTerminal;

use extools_core::{
    App, Choice, Host, Region, RowCol, TextBuffer, WorkspaceContext, extract_variables,
};
use tokio::sync::oneshot;

use crate::picker;

/// Host backed by command-line flags: the active file stands in for the
/// editor view, the picker for the quick panel, stderr for the status bar.
pub struct CliHost {
    apps: Vec<App>,
    variables: HashMap<String, String>,
    buffer: Option<TextBuffer>,
    region: Region,
    /// Use the full-screen picker rather than the line prompt.
    interactive: bool,
}

impl CliHost {
    pub fn new(apps: Vec<App>, ctx: &WorkspaceContext, region: Region) -> Self {
        let buffer = ctx
            .file
            .as_deref()
            .and_then(|path| match TextBuffer::open(path) {
                Ok(buffer) => Some(buffer),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "active file unreadable, positions default to 1:1");
                    None
                }
            });
        Self {
            apps,
            variables: extract_variables(ctx),
            buffer,
            region,
            interactive: std::io::stdin().is_terminal() && std::io::stdout().is_terminal(),
        }
    }
}

impl Host for CliHost {
    fn apps(&self) -> Vec<App> {
        self.apps.clone()
    }

    fn workspace_variables(&self) -> HashMap<String, String> {
        self.variables.clone()
    }

    fn selection(&self) -> Region {
        self.region
    }

    fn row_col(&self, offset: usize) -> RowCol {
        self.buffer
            .as_ref()
            .map(|b| b.row_col(offset))
            .unwrap_or_default()
    }

    fn show_selection_list(&self, names: Vec<String>) -> oneshot::Receiver<Choice> {
        let (tx, rx) = oneshot::channel();
        let interactive = self.interactive;
        tokio::task::spawn_blocking(move || {
            let choice = if interactive {
                picker::pick(&names)
            } else {
                picker::prompt(&names, std::io::stdin().lock(), std::io::stderr())
            };
            match choice {
                Ok(choice) => {
                    let _ = tx.send(choice);
                }
                // Dropping tx resolves the receiver as cancelled
                Err(e) => tracing::warn!(error = %e, "selection list failed"),
            }
        });
        rx
    }

    fn report_status(&self, message: &str) {
        eprintln!("{message}");
    }
}
