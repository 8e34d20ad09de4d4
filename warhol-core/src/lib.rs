//! Warhol Core - Consistent-Style Image Generation
//!
//! A run resolves a style (and optionally a character) profile, composes the
//! final prompt, dispatches it to one of two image providers and records the
//! result in a JSON manifest.

pub mod compose;
pub mod credentials;
pub mod manifest;
pub mod pipeline;
pub mod profiles;
pub mod provider;
pub mod templates;
pub mod workspace;

pub use compose::compose_prompt;
pub use credentials::{CredentialSource, EnvCredentials, StaticCredentials};
pub use manifest::GenerationManifest;
pub use pipeline::{GenerateRequest, GenerationOutcome, GenerationPipeline, PipelineError};
pub use profiles::{CharacterProfile, ProfileError, ProfileKind, ProfileStore, StyleProfile};
pub use provider::{
    resolve_model, HttpGateway, ImageOptions, ImageRequest, Provider, ProviderError, ProviderGateway,
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
