use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Mutex as StdMutex;

use crate::expand::ExpandedCommand;

/// What is left of a launched process: its pid, when the platform reports one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ProcessHandle {
    pub pid: Option<u32>,
}

/// Starts processes without waiting on them.
pub trait Spawner {
    /// Start `command` in `cwd` (the current directory when `None`) and return
    /// as soon as the process exists.
    fn spawn_detached(&self, command: &ExpandedCommand, cwd: Option<&Path>)
    -> io::Result<ProcessHandle>;
}

#[cfg(windows)]
fn default_shell() -> (String, &'static str) {
    (
        std::env::var("COMSPEC").unwrap_or_else(|_| "cmd.exe".into()),
        "/C",
    )
}

#[cfg(not(windows))]
fn default_shell() -> (String, &'static str) {
    (std::env::var("SHELL").unwrap_or_else(|_| "sh".into()), "-c")
}

/// Spawns real OS processes with null stdio in their own process group.
/// Command lines go through the user's shell; argument vectors are executed
/// directly. Must be called from within a Tokio runtime; outside one,
/// spawning fails with an error instead of starting anything.
pub struct DetachedSpawner {
    /// $SHELL or "sh" fallback (%COMSPEC% on Windows).
    shell_path: String,
    shell_flag: &'static str,
}

impl DetachedSpawner {
    pub fn new() -> Self {
        let (shell_path, shell_flag) = default_shell();
        Self {
            shell_path,
            shell_flag,
        }
    }

    pub fn with_shell(mut self, shell_path: impl Into<String>) -> Self {
        self.shell_path = shell_path.into();
        self
    }

    pub fn shell_path(&self) -> &str {
        &self.shell_path
    }

    fn build(&self, command: &ExpandedCommand) -> io::Result<tokio::process::Command> {
        match command {
            ExpandedCommand::Line(line) => {
                let mut cmd = tokio::process::Command::new(&self.shell_path);
                cmd.arg(self.shell_flag).arg(line);
                Ok(cmd)
            }
            ExpandedCommand::Argv(argv) => {
                let (program, args) = argv.split_first().ok_or_else(|| {
                    io::Error::new(io::ErrorKind::InvalidInput, "command has no program")
                })?;
                let mut cmd = tokio::process::Command::new(program);
                cmd.args(args);
                Ok(cmd)
            }
        }
    }
}

impl Default for DetachedSpawner {
    fn default() -> Self {
        Self::new()
    }
}

impl Spawner for DetachedSpawner {
    fn spawn_detached(
        &self,
        command: &ExpandedCommand,
        cwd: Option<&Path>,
    ) -> io::Result<ProcessHandle> {
        // tokio::process needs a reactor to reap the child
        tokio::runtime::Handle::try_current().map_err(io::Error::other)?;
        let mut cmd = self.build(command)?;
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(false);
        // Own process group so terminal signals aimed at us skip the child
        #[cfg(unix)]
        {
            cmd.process_group(0);
        }

        // Dropping the child leaves it running; tokio reaps it if it exits
        // while we are still alive.
        let child = cmd.spawn()?;
        Ok(ProcessHandle { pid: child.id() })
    }
}

/// A spawn request captured by [`RecordingSpawner`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpawnRequest {
    pub command: ExpandedCommand,
    pub cwd: Option<PathBuf>,
}

/// Records spawn requests instead of starting processes. Backs dry runs and
/// tests.
#[derive(Debug, Default)]
pub struct RecordingSpawner {
    requests: StdMutex<Vec<SpawnRequest>>,
}

impl RecordingSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<SpawnRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl Spawner for RecordingSpawner {
    fn spawn_detached(
        &self,
        command: &ExpandedCommand,
        cwd: Option<&Path>,
    ) -> io::Result<ProcessHandle> {
        let mut requests = self
            .requests
            .lock()
            .map_err(|_| io::Error::other("recording spawner poisoned"))?;
        requests.push(SpawnRequest {
            command: command.clone(),
            cwd: cwd.map(Path::to_path_buf),
        });
        Ok(ProcessHandle::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn recording_spawner_keeps_order() {
        let spawner = RecordingSpawner::new();
        spawner
            .spawn_detached(&ExpandedCommand::Line("a".into()), None)
            .unwrap();
        spawner
            .spawn_detached(
                &ExpandedCommand::Argv(vec!["b".into()]),
                Some(Path::new("/tmp")),
            )
            .unwrap();
        let requests = spawner.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].command, ExpandedCommand::Line("a".into()));
        assert_eq!(requests[0].cwd, None);
        assert_eq!(requests[1].cwd.as_deref(), Some(Path::new("/tmp")));
    }

    #[test]
    fn spawning_outside_a_runtime_errors() {
        let result = DetachedSpawner::new()
            .spawn_detached(&ExpandedCommand::Argv(vec!["true".into()]), None);
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::Other);
    }

    #[tokio::test]
    async fn empty_argv_is_invalid_input() {
        let err = DetachedSpawner::new()
            .spawn_detached(&ExpandedCommand::Argv(vec![]), None)
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn missing_program_fails() {
        let err = DetachedSpawner::new()
            .spawn_detached(
                &ExpandedCommand::Argv(vec!["extools-definitely-not-a-program".into()]),
                None,
            )
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn missing_working_dir_fails() {
        let dir = TempDir::new().unwrap();
        let result = DetachedSpawner::new().spawn_detached(
            &ExpandedCommand::Argv(vec!["true".into()]),
            Some(&dir.path().join("gone")),
        );
        assert!(result.is_err());
    }

    #[cfg(unix)]
    async fn wait_for(path: &Path) -> String {
        for _ in 0..100 {
            if let Ok(text) = std::fs::read_to_string(path)
                && !text.is_empty()
            {
                return text;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        panic!("{} never appeared", path.display());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn argv_runs_in_working_dir() {
        let dir = TempDir::new().unwrap();
        let handle = DetachedSpawner::new()
            .spawn_detached(
                &ExpandedCommand::Argv(vec!["sh".into(), "-c".into(), "pwd > where.txt".into()]),
                Some(dir.path()),
            )
            .unwrap();
        assert!(handle.pid.is_some());
        let text = wait_for(&dir.path().join("where.txt")).await;
        let expected = dir.path().canonicalize().unwrap();
        assert_eq!(Path::new(text.trim()).canonicalize().unwrap(), expected);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn line_goes_through_shell() {
        let dir = TempDir::new().unwrap();
        DetachedSpawner::new()
            .with_shell("sh")
            .spawn_detached(
                &ExpandedCommand::Line("echo one two > out.txt".into()),
                Some(dir.path()),
            )
            .unwrap();
        assert_eq!(wait_for(&dir.path().join("out.txt")).await, "one two\n");
    }
}
