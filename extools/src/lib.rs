pub mod app;
pub mod buffer;
pub mod expand;
pub mod launcher;
pub mod settings;
pub mod spawn;
pub mod variables;
pub mod workspace;

// Re-exports
pub use app::{App, Command};
pub use buffer::TextBuffer;
pub use expand::{ExpandedCommand, expand, expand_command};
pub use launcher::{Choice, Host, Invocation, LaunchError, Launcher, Outcome};
pub use settings::{Settings, SettingsError};
pub use spawn::{DetachedSpawner, ProcessHandle, RecordingSpawner, SpawnRequest, Spawner};
pub use variables::{Environment, Region, RowCol, SelectionBounds, VariableMap, resolve};
pub use workspace::{WorkspaceContext, extract_variables};
