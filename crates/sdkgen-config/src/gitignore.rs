use std::path::Path;

use tracing::debug;

use crate::error::ConfigError;
use crate::fs::{DEFAULT_FILE_MODE, FileSystem};
use crate::workspace::SPEAKEASY_DIR;

pub const GITIGNORE_FILE: &str = ".gitignore";

/// Entries every workspace `.gitignore` must carry.
pub const GITIGNORE_ENTRIES: &[&str] = &["temp/", "reports/", "logs/", "workflow.local.yaml"];

/// Ensures `<dir>/.speakeasy/.gitignore` contains [`GITIGNORE_ENTRIES`].
///
/// Existing lines are kept, missing entries are appended after a newline separator.
/// Returns `true` when the file was written.
pub fn ensure_gitignore(dir: impl AsRef<Path>, fs: &dyn FileSystem) -> Result<bool, ConfigError> {
    let workspace = dir.as_ref().join(SPEAKEASY_DIR);
    let path = workspace.join(GITIGNORE_FILE);

    let existing = match fs.read(&path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(err) => return Err(ConfigError::Io(err).context(path.display())),
    };

    let updated = with_required_entries(&existing);
    if updated == existing {
        return Ok(false);
    }

    fs.create_dir_all(&workspace)
        .map_err(|err| ConfigError::Io(err).context(workspace.display()))?;
    fs.write(&path, updated.as_bytes(), DEFAULT_FILE_MODE)
        .map_err(|err| ConfigError::Io(err).context(path.display()))?;
    debug!(path = %path.display(), "updated workspace gitignore");
    Ok(true)
}

fn with_required_entries(existing: &str) -> String {
    let present: Vec<&str> = existing.lines().map(str::trim).collect();
    let missing: Vec<&str> = GITIGNORE_ENTRIES
        .iter()
        .copied()
        .filter(|entry| !present.contains(entry))
        .collect();
    if missing.is_empty() {
        return existing.to_string();
    }

    let mut out = existing.to_string();
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    for entry in missing {
        out.push_str(entry);
        out.push('\n');
    }
    out
}
