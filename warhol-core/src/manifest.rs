//! Generation Manifest
//!
//! One JSON record per run. Optional fields are omitted rather than written as
//! null, so readers can rely on key presence.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::pipeline::PipelineError;

/// Timestamp layout shared by the image and manifest file names
pub const FILE_STAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationManifest {
    pub created_at: String,
    pub provider: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    pub style_input: String,
    pub style_file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_file: Option<String>,
    pub prompt: String,
    pub final_prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    pub dry_run: bool,
}

impl GenerationManifest {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write the manifest to `path` through a sibling temp file, so `path`
    /// either holds the full document or does not exist
    pub fn write(&self, path: &Path) -> Result<(), PipelineError> {
        let data = self.to_json()?;
        let staging = staging_path(path);

        let result = fs::write(&staging, data)
            .and_then(|()| fs::rename(&staging, path))
            .map_err(|source| PipelineError::Io {
                path: path.to_path_buf(),
                source,
            });
        if result.is_err() {
            let _ = fs::remove_file(&staging);
        }
        result
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

pub fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// `image-<stamp>.png` and `manifest-<stamp>.json` under `out_dir`
pub fn artifact_paths(out_dir: &Path, at: DateTime<Utc>) -> (PathBuf, PathBuf) {
    let stamp = at.format(FILE_STAMP_FORMAT).to_string();
    (
        out_dir.join(format!("image-{stamp}.png")),
        out_dir.join(format!("manifest-{stamp}.json")),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> GenerationManifest {
        GenerationManifest {
            created_at: "2026-10-19T08:30:05Z".into(),
            provider: "google".into(),
            model: "gemini-2.5-flash-image".into(),
            size: None,
            quality: None,
            style_input: "noir".into(),
            style_file: "styles/noir.yaml".into(),
            character: None,
            character_file: None,
            prompt: "a cat".into(),
            final_prompt: "Neon noir. a cat".into(),
            image_path: None,
            dry_run: true,
        }
    }

    #[test]
    fn test_optional_fields_omitted() {
        let value: serde_json::Value = serde_json::from_str(&sample().to_json().unwrap()).unwrap();
        let object = value.as_object().unwrap();
        for key in ["size", "quality", "character", "character_file", "image_path"] {
            assert!(!object.contains_key(key), "{key} should be absent");
        }
        assert_eq!(object["dry_run"], true);
    }

    #[test]
    fn test_field_order_is_stable() {
        let mut manifest = sample();
        manifest.size = Some("1024x1024".into());
        manifest.image_path = Some("outputs/image.png".into());
        let json = manifest.to_json().unwrap();
        let created = json.find("\"created_at\"").unwrap();
        let size = json.find("\"size\"").unwrap();
        let final_prompt = json.find("\"final_prompt\"").unwrap();
        let image = json.find("\"image_path\"").unwrap();
        assert!(created < size && size < final_prompt && final_prompt < image);
    }

    #[test]
    fn test_write_leaves_only_final_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("manifest-20261019-083005.json");
        sample().write(&path).unwrap();

        let names: Vec<_> = fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["manifest-20261019-083005.json"]);
        let back: GenerationManifest =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn test_failed_write_cleans_up_staging_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("manifest.json");
        fs::create_dir(&path).unwrap();

        let err = sample().write(&path).unwrap_err();
        assert!(matches!(err, PipelineError::Io { .. }));
        assert!(!tmp.path().join("manifest.json.tmp").exists());
    }

    #[test]
    fn test_timestamps() {
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 5).unwrap();
        assert_eq!(rfc3339(at), "2026-10-19T08:30:05Z");

        let (image, manifest) = artifact_paths(Path::new("outputs"), at);
        assert_eq!(image, Path::new("outputs/image-20261019-083005.png"));
        assert_eq!(manifest, Path::new("outputs/manifest-20261019-083005.json"));
    }
}
