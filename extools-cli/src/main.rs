mod host;
mod picker;
mod theme;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use extools_core::*;

use host::CliHost;

#[derive(Parser, Debug)]
#[command(name = "extools", version, about = "Launch external tools with editor context")]
struct Args {
    /// Run the configured app with this id
    #[arg(long, conflicts_with_all = ["cmd", "args"])]
    id: Option<String>,

    /// Run a raw command line through the shell
    #[arg(long, conflicts_with = "args")]
    cmd: Option<String>,

    /// Status label for a raw command
    #[arg(long, conflicts_with = "id")]
    name: Option<String>,

    /// Working directory for a raw command (variables are expanded)
    #[arg(short = 'C', long, conflicts_with = "id")]
    working_dir: Option<String>,

    /// Active file; drives ${file}* variables and line/column positions
    #[arg(long)]
    file: Option<PathBuf>,

    /// Workspace folder; the first one becomes ${folder}
    #[arg(long)]
    folder: Vec<PathBuf>,

    /// Project file; drives ${project}* variables
    #[arg(long)]
    project: Option<PathBuf>,

    /// Selection as character offsets into --file: OFFSET or ANCHOR:ACTIVE
    #[arg(long, value_parser = parse_region)]
    selection: Option<Region>,

    /// Settings file to use instead of ~/.extools and ./.extools
    #[arg(long, env = "EXTOOLS_SETTINGS")]
    settings: Option<PathBuf>,

    /// Print configured apps and exit
    #[arg(long)]
    list: bool,

    /// Print the expanded command instead of running it
    #[arg(long)]
    dry_run: bool,

    /// Mirror the log to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Raw command as separate arguments (after `--`)
    #[arg(last = true)]
    args: Vec<String>,
}

impl Args {
    fn invocation(&self) -> Invocation {
        if let Some(id) = &self.id {
            return Invocation::App { id: id.clone() };
        }
        let cmd = match (&self.cmd, self.args.is_empty()) {
            (Some(line), _) => Command::Single(line.clone()),
            (None, false) => Command::args(self.args.iter().cloned()),
            (None, true) => return Invocation::Select,
        };
        Invocation::Command {
            cmd,
            name: self.name.clone(),
            working_dir: self.working_dir.clone(),
        }
    }

    fn workspace(&self) -> WorkspaceContext {
        WorkspaceContext {
            file: self.file.clone(),
            folders: self.folder.clone(),
            project: self.project.clone(),
        }
    }
}

fn parse_region(s: &str) -> Result<Region, String> {
    let offset = |part: &str| {
        part.trim()
            .parse::<usize>()
            .map_err(|e| format!("invalid offset {part:?}: {e}"))
    };
    match s.split_once(':') {
        Some((a, b)) => Ok(Region::new(offset(a)?, offset(b)?)),
        None => Ok(Region::caret(offset(s)?)),
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::prelude::*;

    // Logs go to ~/.extools/extools.log
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
    let log_dir = PathBuf::from(&home).join(".extools");
    std::fs::create_dir_all(&log_dir).ok();
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("extools.log"))
        .ok();

    let filter = EnvFilter::try_from_env("EXTOOLS_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let file_layer = log_file.map(|file| {
        tracing_subscriber::fmt::layer()
            .with_writer(file)
            .with_ansi(false)
    });
    let stderr_layer = verbose.then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));
    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();
}

fn exit_code(result: Result<Outcome, LaunchError>) -> ExitCode {
    match result {
        Ok(Outcome::Launched(handle)) => {
            tracing::debug!(pid = ?handle.pid, "launched");
            ExitCode::SUCCESS
        }
        Ok(Outcome::Cancelled) => ExitCode::SUCCESS,
        // Already shown on the status line
        Err(e) => {
            tracing::error!(error = %e, "launch failed");
            ExitCode::FAILURE
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let cwd = std::env::current_dir()?;
    let settings = match &args.settings {
        Some(path) => Settings::read(path)?,
        None => Settings::load(&cwd)?,
    };

    if args.list {
        for app in &settings.apps {
            println!("{}\t{}", app.id, app.display_name());
        }
        return Ok(ExitCode::SUCCESS);
    }

    let invocation = args.invocation();
    let host = CliHost::new(
        settings.apps,
        &args.workspace(),
        args.selection.unwrap_or_default(),
    );

    if args.dry_run {
        let launcher = Launcher::new(host, RecordingSpawner::new());
        let result = launcher.run(invocation).await;
        for request in launcher.spawner().requests() {
            let dir = request
                .cwd
                .as_deref()
                .map_or_else(|| "default dir".to_string(), |d| d.display().to_string());
            println!("{}\t(in {dir})", request.command);
        }
        return Ok(exit_code(result));
    }

    let launcher = Launcher::new(host, DetachedSpawner::new());
    Ok(exit_code(launcher.run(invocation).await))
}
