//! Project directory detection
//!
//! The project root is the directory holding both `cli/` and `www/`. Default
//! output and profile locations are placed there whether the tool runs from
//! the root or from `cli/`.

use std::path::{Path, PathBuf};

pub fn default_project_path(name: &str) -> PathBuf {
    project_path_from(Path::new("."), name)
}

/// Same as [`default_project_path`] but relative to `cwd`
pub fn project_path_from(cwd: &Path, name: &str) -> PathBuf {
    if is_project_root(cwd) {
        return relative_to(cwd, Path::new(name));
    }

    if is_project_root(&cwd.join("..")) {
        return relative_to(cwd, &Path::new("..").join(name));
    }

    relative_to(cwd, Path::new(name))
}

fn is_project_root(dir: &Path) -> bool {
    dir.join("cli").is_dir() && dir.join("www").is_dir()
}

fn relative_to(cwd: &Path, path: &Path) -> PathBuf {
    if cwd == Path::new(".") {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}
