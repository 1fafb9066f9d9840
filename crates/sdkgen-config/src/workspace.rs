use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::fs::FileSystem;

/// Primary workspace directory name.
pub const SPEAKEASY_DIR: &str = ".speakeasy";
/// Legacy workspace directory name, probed after [`SPEAKEASY_DIR`].
pub const GEN_DIR: &str = ".gen";

/// Options controlling [`find_workspace`].
#[derive(Clone, Debug, Default)]
pub struct FindOptions {
    /// File to look for inside the workspace directory. When unset the directory itself
    /// is the target.
    pub find_file: Option<String>,
    /// Keep ascending toward the filesystem root after a miss.
    pub recursive: bool,
    /// Probe the current directory itself instead of its `.speakeasy`/`.gen` child.
    pub allow_outside: bool,
}

impl FindOptions {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            find_file: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn allow_outside(mut self, allow_outside: bool) -> Self {
        self.allow_outside = allow_outside;
        self
    }
}

/// Outcome of a successful workspace probe.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FindResult {
    /// Resolved path of the file (or directory when no file was requested).
    pub path: PathBuf,
    /// File contents when a file was requested.
    pub data: Option<Vec<u8>>,
}

impl FindResult {
    /// Directory containing the located artifact.
    pub fn dir(&self) -> &Path {
        if self.data.is_some() {
            self.path.parent().unwrap_or(&self.path)
        } else {
            &self.path
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WalkState {
    SpeakeasyDir,
    GenDir,
}

impl WalkState {
    fn dir_name(self) -> &'static str {
        match self {
            WalkState::SpeakeasyDir => SPEAKEASY_DIR,
            WalkState::GenDir => GEN_DIR,
        }
    }
}

/// Walks from `working_dir` toward the filesystem root looking for a workspace
/// directory (`.speakeasy`, then `.gen`) and, optionally, a file inside it.
///
/// Ascent is lexical on the absolute path returned by [`FileSystem::abs`]; symlinks
/// are never resolved, so the walk cannot jump outside the requested tree.
pub fn find_workspace(
    working_dir: impl AsRef<Path>,
    options: &FindOptions,
    fs: &dyn FileSystem,
) -> Result<FindResult, ConfigError> {
    let start = fs.abs(working_dir.as_ref())?;
    let mut current = start.clone();
    let mut state = WalkState::SpeakeasyDir;

    loop {
        let inside_workspace = is_workspace_dir(&current);
        let probe_dir = if inside_workspace || options.allow_outside {
            current.clone()
        } else {
            current.join(state.dir_name())
        };
        let probe = match &options.find_file {
            Some(file) => probe_dir.join(file),
            None => probe_dir,
        };

        if probe_hit(&probe, fs)? {
            debug!(path = %probe.display(), "located workspace artifact");
            let data = match options.find_file {
                Some(_) => Some(fs.read(&probe)?),
                None => None,
            };
            return Ok(FindResult { path: probe, data });
        }
        trace!(path = %probe.display(), "workspace probe missed");

        if !options.recursive {
            return Err(not_found(&start, options));
        }

        if state == WalkState::SpeakeasyDir && !inside_workspace && !options.allow_outside {
            state = WalkState::GenDir;
            continue;
        }

        state = WalkState::SpeakeasyDir;
        if is_filesystem_root(&current) {
            return Err(not_found(&start, options));
        }
        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => return Err(not_found(&start, options)),
        }
    }
}

/// Walks `file_name` directly up the tree from `working_dir`, without the workspace
/// directory prefix. Used by the generator-config loader.
pub fn find_file_upwards(
    working_dir: impl AsRef<Path>,
    file_name: &str,
    fs: &dyn FileSystem,
) -> Result<FindResult, ConfigError> {
    let start = fs.abs(working_dir.as_ref())?;
    for ancestor in start.ancestors() {
        let candidate = ancestor.join(file_name);
        if probe_hit(&candidate, fs)? {
            debug!(path = %candidate.display(), "located {file_name}");
            let data = fs.read(&candidate)?;
            return Ok(FindResult {
                path: candidate,
                data: Some(data),
            });
        }
        if is_filesystem_root(ancestor) {
            break;
        }
    }

    Err(ConfigError::NotFound(format!(
        "no {file_name} found in or above {}",
        start.display()
    )))
}

fn probe_hit(path: &Path, fs: &dyn FileSystem) -> Result<bool, ConfigError> {
    match fs.stat(path) {
        Ok(_) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(ConfigError::Io(err).context(path.display())),
    }
}

fn is_workspace_dir(path: &Path) -> bool {
    matches!(
        path.file_name().and_then(|name| name.to_str()),
        Some(SPEAKEASY_DIR) | Some(GEN_DIR)
    )
}

/// True for `.`, `/` and bare drive roots such as `C:\`.
fn is_filesystem_root(path: &Path) -> bool {
    let text = path.to_string_lossy();
    if text.is_empty() || text == "." || text == "/" {
        return true;
    }
    let bytes = text.as_bytes();
    if bytes.len() == 3 && bytes[0].is_ascii_alphabetic() && &text[1..] == ":\\" {
        return true;
    }
    path.parent().is_none()
}

fn not_found(start: &Path, options: &FindOptions) -> ConfigError {
    let target = match &options.find_file {
        Some(file) => format!("{SPEAKEASY_DIR}/{file}"),
        None => SPEAKEASY_DIR.to_string(),
    };
    ConfigError::NotFound(format!(
        "no {target} found in or above {}",
        start.display()
    ))
}
