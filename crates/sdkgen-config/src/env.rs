use std::fmt;
use std::sync::Arc;

use crate::fs::{FileSystem, OsFileSystem};
use crate::ids::{IdGenerator, RandomIds};

/// Shared collaborators for every loader: the filesystem view and the source of
/// UUIDs and random filename suffixes.
#[derive(Clone)]
pub struct ConfigEnv {
    pub fs: Arc<dyn FileSystem>,
    pub ids: Arc<dyn IdGenerator>,
}

impl ConfigEnv {
    pub fn new(fs: Arc<dyn FileSystem>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { fs, ids }
    }

    /// Replaces the filesystem, keeping the id source.
    pub fn with_fs(mut self, fs: impl FileSystem + 'static) -> Self {
        self.fs = Arc::new(fs);
        self
    }

    /// Replaces the id source, keeping the filesystem.
    pub fn with_ids(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Arc::new(ids);
        self
    }

    pub fn fs(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    pub fn ids(&self) -> &dyn IdGenerator {
        self.ids.as_ref()
    }
}

impl Default for ConfigEnv {
    /// Host filesystem and random v4 UUIDs.
    fn default() -> Self {
        Self::new(Arc::new(OsFileSystem), Arc::new(RandomIds))
    }
}

impl fmt::Debug for ConfigEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigEnv").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::InMemoryFileSystem;
    use crate::ids::SequentialIds;
    use std::path::Path;

    #[test]
    fn swapped_collaborators_are_used() {
        let env = ConfigEnv::default()
            .with_fs(InMemoryFileSystem::new("/work").with_file("a.txt", "x"))
            .with_ids(SequentialIds::new());
        assert!(env.fs().exists(Path::new("/work/a.txt")).unwrap());
        assert_eq!(env.ids().uuid(), "00000000-0000-4000-8000-000000000001");
    }
}
