//! Provider Gateway - Image Generation Backends
//!
//! Exactly two providers are supported. Each owns its request/response schema
//! and classifies its own failures; callers only see bytes or a `ProviderError`.

pub mod google;
pub mod openai;

use base64::Engine as _;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::credentials::CredentialSource;
pub use google::GoogleClient;
pub use openai::OpenAiClient;

/// Client-side limit for a single provider call
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

pub const DEFAULT_SIZE: &str = "1024x1024";
pub const DEFAULT_QUALITY: &str = "medium";

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unsupported provider {0:?} (expected google or openai)")]
    UnsupportedProvider(String),

    #[error("{provider} credential missing: set {}", .vars.join(" or "))]
    MissingCredential {
        provider: Provider,
        vars: &'static [&'static str],
    },

    #[error("{provider} error (status {status}): {message}")]
    Rejected {
        provider: Provider,
        status: u16,
        message: String,
    },

    #[error("{0} response did not include image data")]
    MissingImageData(Provider),

    #[error("decode image bytes: {0}")]
    InvalidImageData(#[from] base64::DecodeError),

    #[error("decode {provider} response: {source}")]
    Decode {
        provider: Provider,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid endpoint {url}: {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Google,
    #[serde(rename = "openai")]
    OpenAi,
}

impl Provider {
    pub fn id(self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::OpenAi => "openai",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Provider::Google => "gemini-2.5-flash-image",
            Provider::OpenAi => "gpt-image-1",
        }
    }

    /// Whether size/quality are sent to (and recorded for) this provider
    pub fn supports_options(self) -> bool {
        matches!(self, Provider::OpenAi)
    }

    /// API key variables, highest precedence first
    pub fn credential_vars(self) -> &'static [&'static str] {
        match self {
            Provider::Google => &["GEMINI_API_KEY", "GOOGLE_API_KEY"],
            Provider::OpenAi => &["OPENAI_API_KEY"],
        }
    }

    pub fn base_url_var(self) -> &'static str {
        match self {
            Provider::Google => "GEMINI_BASE_URL",
            Provider::OpenAi => "OPENAI_BASE_URL",
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            Provider::Google => "https://generativelanguage.googleapis.com/v1beta",
            Provider::OpenAi => "https://api.openai.com/v1",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Provider {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "google" => Ok(Provider::Google),
            "openai" => Ok(Provider::OpenAi),
            _ => Err(ProviderError::UnsupportedProvider(s.to_string())),
        }
    }
}

/// Parse the provider id and pick the model: the override if given, else the provider default
pub fn resolve_model(
    provider: &str,
    model_override: Option<&str>,
) -> Result<(Provider, String), ProviderError> {
    let provider: Provider = provider.parse()?;
    let model = match model_override.map(str::trim) {
        Some(model) if !model.is_empty() => model.to_string(),
        _ => provider.default_model().to_string(),
    };
    Ok((provider, model))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageOptions {
    pub size: String,
    pub quality: String,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            size: DEFAULT_SIZE.to_string(),
            quality: DEFAULT_QUALITY.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImageRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub options: &'a ImageOptions,
}

/// Turns a composed prompt into image bytes
pub trait ProviderGateway {
    fn generate(&self, provider: Provider, request: &ImageRequest<'_>) -> Result<Vec<u8>, ProviderError>;
}

impl<G: ProviderGateway + ?Sized> ProviderGateway for &G {
    fn generate(&self, provider: Provider, request: &ImageRequest<'_>) -> Result<Vec<u8>, ProviderError> {
        (**self).generate(provider, request)
    }
}

/// A connected provider, ready to issue requests
#[derive(Debug)]
pub enum ProviderClient {
    Google(GoogleClient),
    OpenAi(OpenAiClient),
}

impl ProviderClient {
    /// Resolve credentials and endpoint for `provider`
    pub fn connect(
        provider: Provider,
        credentials: &dyn CredentialSource,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let vars = provider.credential_vars();
        let api_key = credentials
            .first_of(vars)
            .ok_or(ProviderError::MissingCredential { provider, vars })?;

        let base_url = credentials
            .first_of(&[provider.base_url_var()])
            .unwrap_or_else(|| provider.default_base_url().to_string())
            .trim_end_matches('/')
            .to_string();

        let http = reqwest::blocking::Client::builder().timeout(timeout).build()?;
        debug!("connected {provider} client at {base_url}");

        Ok(match provider {
            Provider::Google => ProviderClient::Google(GoogleClient::new(api_key, base_url, http)),
            Provider::OpenAi => ProviderClient::OpenAi(OpenAiClient::new(api_key, base_url, http)),
        })
    }

    pub fn provider(&self) -> Provider {
        match self {
            ProviderClient::Google(_) => Provider::Google,
            ProviderClient::OpenAi(_) => Provider::OpenAi,
        }
    }

    pub fn generate(&self, request: &ImageRequest<'_>) -> Result<Vec<u8>, ProviderError> {
        match self {
            ProviderClient::Google(client) => client.generate_image(request.model, request.prompt),
            ProviderClient::OpenAi(client) => client.generate_image(
                request.model,
                request.prompt,
                &request.options.size,
                &request.options.quality,
            ),
        }
    }
}

/// Live gateway: connects to the provider on every dispatch
pub struct HttpGateway<C> {
    credentials: C,
    timeout: Duration,
}

impl<C: CredentialSource> HttpGateway<C> {
    pub fn new(credentials: C) -> Self {
        Self {
            credentials,
            timeout: REQUEST_TIMEOUT,
        }
    }
}

impl<C: CredentialSource> ProviderGateway for HttpGateway<C> {
    fn generate(&self, provider: Provider, request: &ImageRequest<'_>) -> Result<Vec<u8>, ProviderError> {
        ProviderClient::connect(provider, &self.credentials, self.timeout)?.generate(request)
    }
}

fn decode_base64(data: &str) -> Result<Vec<u8>, ProviderError> {
    Ok(base64::engine::general_purpose::STANDARD.decode(data)?)
}

/// Message for a failed call: the provider's own if present, else a generic one
fn rejection(provider: Provider, status: u16, message: Option<String>) -> ProviderError {
    let message = message
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("request failed with status {status}"));
    ProviderError::Rejected {
        provider,
        status,
        message,
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<ErrorBody>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Provider message from an error body, tolerating non-JSON bodies
fn error_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error)
        .map(|error| error.message)
}
