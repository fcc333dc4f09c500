use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Paths describing the editing context the tool is launched from.
#[derive(Clone, Debug, Default)]
pub struct WorkspaceContext {
    /// Active file.
    pub file: Option<PathBuf>,
    /// Open folders; the first one is `${folder}`.
    pub folders: Vec<PathBuf>,
    /// Project file.
    pub project: Option<PathBuf>,
}

/// Name reported as `${platform}`.
pub fn platform() -> &'static str {
    if cfg!(target_os = "macos") {
        "OSX"
    } else if cfg!(windows) {
        "Windows"
    } else {
        "Linux"
    }
}

fn lossy(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Insert `<prefix>`, `<prefix>_path`, `<prefix>_name`, `<prefix>_base_name`
/// and `<prefix>_extension` for `path`, skipping parts the path lacks.
fn insert_path_family(vars: &mut HashMap<String, String>, prefix: &str, path: &Path) {
    vars.insert(prefix.to_string(), lossy(path));
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        vars.insert(format!("{prefix}_path"), lossy(parent));
    }
    if let Some(name) = path.file_name() {
        vars.insert(format!("{prefix}_name"), name.to_string_lossy().into_owned());
    }
    if let Some(stem) = path.file_stem() {
        vars.insert(format!("{prefix}_base_name"), stem.to_string_lossy().into_owned());
    }
    if let Some(ext) = path.extension() {
        vars.insert(format!("{prefix}_extension"), ext.to_string_lossy().into_owned());
    }
}

/// Path and workspace variables for `ctx`.
pub fn extract_variables(ctx: &WorkspaceContext) -> HashMap<String, String> {
    let mut vars = HashMap::new();
    vars.insert("platform".to_string(), platform().to_string());

    if let Some(file) = &ctx.file {
        insert_path_family(&mut vars, "file", file);
    }
    if let Some(project) = &ctx.project {
        insert_path_family(&mut vars, "project", project);
    }

    let folder = ctx.folders.first().cloned().or_else(|| {
        ctx.file
            .as_deref()
            .and_then(Path::parent)
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
    });
    if let Some(folder) = folder {
        vars.insert("folder".to_string(), lossy(&folder));
    }

    vars
}
