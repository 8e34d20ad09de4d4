//! Profile Store - Style and Character Resolution
//!
//! A profile reference is either a path or a bare name. Bare names are looked
//! up under `styles/` or `characters/` in every search root, so the tool works
//! from the project root and from one directory below it.

use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{is_separator, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile not found: {0}")]
    NotFound(String),

    #[error("parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("file already exists: {}", .0.display())]
    AlreadyExists(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    Style,
    Character,
}

impl ProfileKind {
    /// Directory holding profiles of this kind inside a search root
    pub fn dir_name(self) -> &'static str {
        match self {
            ProfileKind::Style => "styles",
            ProfileKind::Character => "characters",
        }
    }
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileKind::Style => f.write_str("style"),
            ProfileKind::Character => f.write_str("character"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleProfile {
    pub name: String,
    pub description: String,
    pub prompt_prefix: Vec<String>,
    pub negative_prompt: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterProfile {
    pub name: String,
    pub description: String,
    pub traits: Vec<String>,
    pub outfit: Vec<String>,
    /// Full override: when set, description/traits/outfit are ignored
    pub prompt: String,
}

/// Profiles that can be parsed from a file and named after it when unnamed
pub trait Profile: DeserializeOwned + Default {
    const KIND: ProfileKind;

    fn name_mut(&mut self) -> &mut String;
}

impl Profile for StyleProfile {
    const KIND: ProfileKind = ProfileKind::Style;

    fn name_mut(&mut self) -> &mut String {
        &mut self.name
    }
}

impl Profile for CharacterProfile {
    const KIND: ProfileKind = ProfileKind::Character;

    fn name_mut(&mut self) -> &mut String {
        &mut self.name
    }
}

/// A profile together with the file it was read from
#[derive(Debug, Clone)]
pub struct Resolved<P> {
    pub profile: P,
    pub path: PathBuf,
}

/// Resolves profile references against an ordered list of search roots
#[derive(Debug, Clone)]
pub struct ProfileStore {
    roots: Vec<PathBuf>,
}

impl ProfileStore {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn load_style(&self, reference: &str) -> Result<Resolved<StyleProfile>, ProfileError> {
        self.load(reference)
    }

    pub fn load_character(
        &self,
        reference: &str,
    ) -> Result<Resolved<CharacterProfile>, ProfileError> {
        self.load(reference)
    }

    /// Resolve `reference` to a file and parse it as `P`
    pub fn load<P: Profile>(&self, reference: &str) -> Result<Resolved<P>, ProfileError> {
        let path = self.resolve_path(P::KIND, reference)?;

        let content = fs::read(&path).map_err(|source| ProfileError::Io {
            path: path.clone(),
            source,
        })?;

        let mut profile: P = if content.iter().all(u8::is_ascii_whitespace) {
            P::default()
        } else {
            serde_yaml::from_slice(&content).map_err(|source| ProfileError::Parse {
                path: path.clone(),
                source,
            })?
        };

        let name = profile.name_mut();
        if name.is_empty() {
            *name = file_stem(&path);
        }

        Ok(Resolved { profile, path })
    }

    /// First existing regular file among the candidates for `reference`
    pub fn resolve_path(&self, kind: ProfileKind, reference: &str) -> Result<PathBuf, ProfileError> {
        for candidate in self.candidates(kind, reference) {
            match fs::metadata(&candidate) {
                Ok(meta) if !meta.is_dir() => {
                    debug!("resolved {} profile {reference} -> {}", kind, candidate.display());
                    return Ok(candidate);
                }
                Ok(_) => debug!("skipping directory {}", candidate.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!("no profile at {}", candidate.display());
                }
                Err(source) => {
                    return Err(ProfileError::Io {
                        path: candidate,
                        source,
                    })
                }
            }
        }

        Err(ProfileError::NotFound(reference.to_string()))
    }

    /// Ordered, de-duplicated probe list for `reference`
    pub fn candidates(&self, kind: ProfileKind, reference: &str) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();
        let mut add = |path: PathBuf| {
            if seen.insert(path.clone()) {
                candidates.push(path);
            }
        };

        for root in &self.roots {
            add(under_root(root, Path::new(reference)));
        }

        let has_extension = Path::new(reference).extension().is_some();
        if !has_extension {
            for root in &self.roots {
                let dir = under_root(root, Path::new(kind.dir_name()));
                add(dir.join(format!("{reference}.yaml")));
                add(dir.join(format!("{reference}.yml")));
            }
        } else if !reference.contains(is_separator) {
            for root in &self.roots {
                add(under_root(root, Path::new(kind.dir_name())).join(reference));
            }
        }

        candidates
    }
}

impl Default for ProfileStore {
    fn default() -> Self {
        Self::new(vec![PathBuf::from("."), PathBuf::from("..")])
    }
}

// `.` is left implicit so the current-directory candidate reads as the input itself
fn under_root(root: &Path, path: &Path) -> PathBuf {
    if root == Path::new(".") {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
