use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{self, Cursor, Read, Write};
use std::path::{Component, Path, PathBuf};

use parking_lot::Mutex;

/// Default permission bits for configuration files written by this crate.
pub const DEFAULT_FILE_MODE: u32 = 0o644;

/// Minimal metadata surfaced by [`FileSystem::stat`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileStat {
    pub is_dir: bool,
    pub len: u64,
}

impl FileStat {
    pub fn is_file(&self) -> bool {
        !self.is_dir
    }
}

/// Filesystem seam used by every loader so callers can redirect or virtualize I/O.
pub trait FileSystem: Send + Sync {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
    fn write(&self, path: &Path, data: &[u8], mode: u32) -> io::Result<()>;
    fn stat(&self, path: &Path) -> io::Result<FileStat>;
    /// Opens a streaming reader; the handle is released when the reader is dropped.
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send>>;
    fn abs(&self, path: &Path) -> io::Result<PathBuf>;
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    fn exists(&self, path: &Path) -> io::Result<bool> {
        match self.stat(path) {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err),
        }
    }
}

/// Host filesystem implementation.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write(&self, path: &Path, data: &[u8], mode: u32) -> io::Result<()> {
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(mode);
        }
        #[cfg(not(unix))]
        let _ = mode;
        let mut file = options.open(path)?;
        file.write_all(data)?;
        file.flush()
    }

    fn stat(&self, path: &Path) -> io::Result<FileStat> {
        let metadata = fs::metadata(path)?;
        Ok(FileStat {
            is_dir: metadata.is_dir(),
            len: metadata.len(),
        })
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(fs::File::open(path)?))
    }

    fn abs(&self, path: &Path) -> io::Result<PathBuf> {
        Ok(normalize_lexically(&std::path::absolute(path)?))
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }
}

/// In-memory filesystem for hermetic tests and virtual workspaces.
///
/// Directories are implied by the files stored beneath them and can also be
/// created explicitly.
#[derive(Debug)]
pub struct InMemoryFileSystem {
    cwd: PathBuf,
    files: Mutex<BTreeMap<PathBuf, Vec<u8>>>,
    dirs: Mutex<BTreeSet<PathBuf>>,
}

impl Default for InMemoryFileSystem {
    fn default() -> Self {
        Self::new("/")
    }
}

impl InMemoryFileSystem {
    /// Creates an empty filesystem whose relative paths resolve against `cwd`.
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        let cwd = normalize_lexically(&cwd.into());
        let mut dirs = BTreeSet::new();
        for ancestor in cwd.ancestors() {
            dirs.insert(ancestor.to_path_buf());
        }
        Self {
            cwd,
            files: Mutex::new(BTreeMap::new()),
            dirs: Mutex::new(dirs),
        }
    }

    /// Seeds a file, creating its parent directories.
    pub fn with_file(self, path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Self {
        let resolved = self.resolve(path.as_ref());
        self.insert(resolved, contents.as_ref().to_vec());
        self
    }

    /// Returns a snapshot of a file's contents, if present.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        let resolved = self.resolve(path.as_ref());
        self.files.lock().get(&resolved).cloned()
    }

    /// Lists every stored file path in lexical order.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.lock().keys().cloned().collect()
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            normalize_lexically(path)
        } else {
            normalize_lexically(&self.cwd.join(path))
        }
    }

    fn insert(&self, path: PathBuf, data: Vec<u8>) {
        if let Some(parent) = path.parent() {
            let mut dirs = self.dirs.lock();
            for ancestor in parent.ancestors() {
                dirs.insert(ancestor.to_path_buf());
            }
        }
        self.files.lock().insert(path, data);
    }
}

impl FileSystem for InMemoryFileSystem {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let resolved = self.resolve(path);
        self.files
            .lock()
            .get(&resolved)
            .cloned()
            .ok_or_else(|| not_found(&resolved))
    }

    fn write(&self, path: &Path, data: &[u8], _mode: u32) -> io::Result<()> {
        let resolved = self.resolve(path);
        if self.dirs.lock().contains(&resolved) {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("{} is a directory", resolved.display()),
            ));
        }
        let parent_exists = resolved
            .parent()
            .map(|parent| self.dirs.lock().contains(parent))
            .unwrap_or(true);
        if !parent_exists {
            return Err(not_found(&resolved));
        }
        self.insert(resolved, data.to_vec());
        Ok(())
    }

    fn stat(&self, path: &Path) -> io::Result<FileStat> {
        let resolved = self.resolve(path);
        if let Some(data) = self.files.lock().get(&resolved) {
            return Ok(FileStat {
                is_dir: false,
                len: data.len() as u64,
            });
        }
        if self.dirs.lock().contains(&resolved) {
            return Ok(FileStat {
                is_dir: true,
                len: 0,
            });
        }
        Err(not_found(&resolved))
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        let data = self.read(path)?;
        Ok(Box::new(Cursor::new(data)))
    }

    fn abs(&self, path: &Path) -> io::Result<PathBuf> {
        Ok(self.resolve(path))
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let resolved = self.resolve(path);
        if self.files.lock().contains_key(&resolved) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} is a file", resolved.display()),
            ));
        }
        let mut dirs = self.dirs.lock();
        for ancestor in resolved.ancestors() {
            dirs.insert(ancestor.to_path_buf());
        }
        Ok(())
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{} does not exist", path.display()),
    )
}

/// Resolves `.` and `..` components without touching the filesystem, so symlinks
/// are never followed while ascending.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = match out.components().next_back() {
                    Some(Component::Normal(_)) => out.pop(),
                    Some(Component::RootDir) | Some(Component::Prefix(_)) => true,
                    _ => false,
                };
                if !popped {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn normalize_resolves_dot_segments() {
        assert_eq!(
            normalize_lexically(Path::new("/a/b/../c/./d")),
            PathBuf::from("/a/c/d")
        );
        assert_eq!(normalize_lexically(Path::new("/..")), PathBuf::from("/"));
        assert_eq!(normalize_lexically(Path::new("a/..")), PathBuf::from("."));
    }

    #[test]
    fn in_memory_fs_tracks_implied_directories() {
        let fs = InMemoryFileSystem::new("/work")
            .with_file("/work/repo/.speakeasy/workflow.yaml", "workflowVersion: 1.0.0");

        assert!(fs.stat(Path::new("/work/repo/.speakeasy")).unwrap().is_dir);
        assert!(
            fs.stat(Path::new("repo/.speakeasy/workflow.yaml"))
                .unwrap()
                .is_file()
        );
        let err = fs.stat(Path::new("/work/missing")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn in_memory_write_requires_parent() {
        let fs = InMemoryFileSystem::new("/");
        let err = fs
            .write(Path::new("/nope/file.yaml"), b"x", DEFAULT_FILE_MODE)
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);

        fs.create_dir_all(Path::new("/nope")).unwrap();
        fs.write(Path::new("/nope/file.yaml"), b"x", DEFAULT_FILE_MODE)
            .unwrap();
        assert_eq!(fs.contents("/nope/file.yaml").unwrap(), b"x");
    }

    #[test]
    fn os_fs_round_trips_and_streams() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("gen.yaml");
        let fs = OsFileSystem;
        fs.write(&path, b"configVersion: 2.0.0\n", DEFAULT_FILE_MODE)
            .unwrap();

        let mut reader = fs.open(&path).unwrap();
        let mut text = String::new();
        reader.read_to_string(&mut text).unwrap();
        assert_eq!(text, "configVersion: 2.0.0\n");
        assert_eq!(fs.stat(&path).unwrap().len, 21);
        assert!(fs.abs(&path).unwrap().is_absolute());
    }
}
