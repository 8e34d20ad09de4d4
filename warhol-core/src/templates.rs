//! Profile Templates - Starter YAML for new styles and characters
//!
//! Templates are never written over an existing file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::profiles::{ProfileError, ProfileKind};
use crate::workspace::default_project_path;

/// Default location for a new profile: `<project>/<kind-dir>/<name>.yaml`
pub fn default_template_path(kind: ProfileKind, name: &str) -> PathBuf {
    default_project_path(kind.dir_name()).join(format!("{name}.yaml"))
}

pub fn render_template(kind: ProfileKind, name: &str) -> String {
    match kind {
        ProfileKind::Style => format!(
            r##"# warhol style profile
name: {name}
description: "Short description of the intended visual identity."

prompt_prefix:
  - "Define the core visual style in plain language."

palette:
  - "#111111"
  - "#f4f4f4"

camera:
  lens: "35mm"
  framing: "medium shot"
  lighting: "soft directional light"

negative_prompt:
  - "avoid brand marks"
  - "avoid unrelated text"

seed_policy:
  mode: "fixed" # fixed | random
  seed: 42
"##
        ),
        ProfileKind::Character => format!(
            r#"# warhol character profile
name: {name}
description: "Short character description."

traits:
  - "age range"
  - "hair style and color"

outfit:
  - "top clothing"
  - "bottom clothing"
  - "footwear"

prompt: ""
"#
        ),
    }
}

/// Write a starter profile to `path`, creating parent directories
pub fn write_template(kind: ProfileKind, name: &str, path: &Path) -> Result<(), ProfileError> {
    let io_err = |source: io::Error| ProfileError::Io {
        path: path.to_path_buf(),
        source,
    };

    match fs::metadata(path) {
        Ok(_) => return Err(ProfileError::AlreadyExists(path.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(io_err(e)),
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    fs::write(path, render_template(kind, name)).map_err(io_err)
}
