//! Generation Pipeline - Single Entry Point
//!
//! Profiles -> prompt -> model -> image (unless dry run) -> manifest.
//! The manifest is written last; a failed step leaves no manifest behind.

use chrono::{DateTime, Utc};
use log::info;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::compose::compose_prompt;
use crate::manifest::{artifact_paths, rfc3339, GenerationManifest};
use crate::profiles::{ProfileError, ProfileKind, ProfileStore};
use crate::provider::{resolve_model, ImageOptions, ImageRequest, ProviderError, ProviderGateway};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to load {kind} profile: {source}")]
    Profile {
        kind: ProfileKind,
        #[source]
        source: ProfileError,
    },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PipelineError {
    /// Process exit code: 2 for caller mistakes, 1 for everything else
    pub fn exit_code(&self) -> u8 {
        match self {
            PipelineError::Provider(ProviderError::UnsupportedProvider(_)) => 2,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Style reference, as typed by the caller
    pub style: String,
    pub character: Option<String>,
    pub prompt: String,
    pub provider: String,
    pub model: Option<String>,
    pub options: ImageOptions,
    pub out_dir: PathBuf,
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub manifest: GenerationManifest,
    pub manifest_path: PathBuf,
    pub image_path: Option<PathBuf>,
}

/// The generation pipeline - single entry point for a run
pub struct GenerationPipeline<G> {
    store: ProfileStore,
    gateway: G,
}

impl<G: ProviderGateway> GenerationPipeline<G> {
    pub fn new(store: ProfileStore, gateway: G) -> Self {
        Self { store, gateway }
    }

    pub fn store(&self) -> &ProfileStore {
        &self.store
    }

    pub fn run(&self, request: &GenerateRequest) -> Result<GenerationOutcome, PipelineError> {
        self.run_at(request, Utc::now())
    }

    /// Run with an explicit clock reading, used for `created_at` and file names
    pub fn run_at(
        &self,
        request: &GenerateRequest,
        now: DateTime<Utc>,
    ) -> Result<GenerationOutcome, PipelineError> {
        let style = self
            .store
            .load_style(&request.style)
            .map_err(|source| PipelineError::Profile {
                kind: ProfileKind::Style,
                source,
            })?;

        let character_ref = request
            .character
            .as_deref()
            .filter(|reference| !reference.is_empty());
        let character = character_ref
            .map(|reference| self.store.load_character(reference))
            .transpose()
            .map_err(|source| PipelineError::Profile {
                kind: ProfileKind::Character,
                source,
            })?;

        let final_prompt = compose_prompt(
            &style.profile,
            character.as_ref().map(|c| &c.profile),
            &request.prompt,
        );

        let (provider, model) = resolve_model(&request.provider, request.model.as_deref())?;
        info!(
            "style {} ({}), provider {provider}, model {model}",
            style.profile.name,
            style.path.display()
        );

        create_dir(&request.out_dir)?;
        let (image_path, manifest_path) = artifact_paths(&request.out_dir, now);

        let written_image = if request.dry_run {
            info!("dry run: skipping image generation");
            None
        } else {
            let image = self.gateway.generate(
                provider,
                &ImageRequest {
                    model: &model,
                    prompt: &final_prompt,
                    options: &request.options,
                },
            )?;
            fs::write(&image_path, &image).map_err(|source| PipelineError::Io {
                path: image_path.clone(),
                source,
            })?;
            info!("wrote {} bytes to {}", image.len(), image_path.display());
            Some(image_path)
        };

        let (size, quality) = if provider.supports_options() {
            (
                Some(request.options.size.clone()),
                Some(request.options.quality.clone()),
            )
        } else {
            (None, None)
        };

        let manifest = GenerationManifest {
            created_at: rfc3339(now),
            provider: provider.id().to_string(),
            model,
            size,
            quality,
            style_input: request.style.clone(),
            style_file: style.path.display().to_string(),
            character: character_ref.map(str::to_string),
            character_file: character.as_ref().map(|c| c.path.display().to_string()),
            prompt: request.prompt.clone(),
            final_prompt,
            image_path: written_image.as_ref().map(|p| p.display().to_string()),
            dry_run: request.dry_run,
        };

        manifest.write(&manifest_path)?;
        info!("wrote manifest {}", manifest_path.display());

        Ok(GenerationOutcome {
            manifest,
            manifest_path,
            image_path: written_image,
        })
    }
}

fn create_dir(dir: &Path) -> Result<(), PipelineError> {
    fs::create_dir_all(dir).map_err(|source| PipelineError::Io {
        path: dir.to_path_buf(),
        source,
    })
}
