use std::path::Path;

#[derive(Clone, Copy, Debug, Default)]
pub struct Verbosity {
    pub json: bool,
    pub verbose: bool,
}

pub fn display_path(path: &Path) -> String {
    path.display().to_string()
}
