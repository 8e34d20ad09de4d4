//! OpenAI `images/generations` backend

use log::debug;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::{decode_base64, error_message, rejection, Provider, ProviderError};

#[derive(Debug)]
pub struct OpenAiClient {
    api_key: String,
    base_url: String,
    http: Client,
}

#[derive(Debug, Serialize)]
struct ImageGenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    size: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    quality: &'a str,
    response_format: &'static str,
}

#[derive(Debug, Default, Deserialize)]
struct ImageGenerationResponse {
    #[serde(default)]
    data: Vec<ImageDatum>,
}

#[derive(Debug, Default, Deserialize)]
struct ImageDatum {
    #[serde(default)]
    b64_json: String,
    #[serde(default)]
    url: String,
}

/// Where the generated image lives in a successful response
#[derive(Debug, PartialEq, Eq)]
enum ImagePayload {
    Inline(Vec<u8>),
    Remote(String),
}

impl OpenAiClient {
    pub fn new(api_key: String, base_url: String, http: Client) -> Self {
        Self {
            api_key,
            base_url,
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn generate_image(
        &self,
        model: &str,
        prompt: &str,
        size: &str,
        quality: &str,
    ) -> Result<Vec<u8>, ProviderError> {
        let endpoint = format!("{}/images/generations", self.base_url);
        let body = ImageGenerationRequest {
            model,
            prompt,
            size,
            quality,
            response_format: "b64_json",
        };

        debug!("POST {endpoint} (size={size}, quality={quality})");
        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()?;

        let status = response.status().as_u16();
        let bytes = response.bytes()?;

        match extract_payload(status, &bytes)? {
            ImagePayload::Inline(image) => Ok(image),
            ImagePayload::Remote(url) => self.download(&url),
        }
    }

    fn download(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        debug!("GET {url}");
        let response = self.http.get(url).send()?;
        let status = response.status().as_u16();
        if status >= 400 {
            return Err(ProviderError::Rejected {
                provider: Provider::OpenAi,
                status,
                message: format!("download failed with status {status}"),
            });
        }
        Ok(response.bytes()?.to_vec())
    }
}

/// Classify an `images/generations` response; only the first datum is considered
fn extract_payload(status: u16, body: &[u8]) -> Result<ImagePayload, ProviderError> {
    if status >= 400 {
        return Err(rejection(Provider::OpenAi, status, error_message(body)));
    }

    let payload: ImageGenerationResponse =
        serde_json::from_slice(body).map_err(|source| ProviderError::Decode {
            provider: Provider::OpenAi,
            source,
        })?;

    let datum = payload
        .data
        .into_iter()
        .next()
        .ok_or(ProviderError::MissingImageData(Provider::OpenAi))?;

    if !datum.b64_json.is_empty() {
        return Ok(ImagePayload::Inline(decode_base64(&datum.b64_json)?));
    }
    if !datum.url.is_empty() {
        return Ok(ImagePayload::Remote(datum.url));
    }
    Err(ProviderError::MissingImageData(Provider::OpenAi))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let body = ImageGenerationRequest {
            model: "gpt-image-1",
            prompt: "a cat",
            size: "1024x1024",
            quality: "",
            response_format: "b64_json",
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["size"], "1024x1024");
        assert!(value.get("quality").is_none());
        assert_eq!(value["response_format"], "b64_json");
    }

    #[test]
    fn test_inline_payload() {
        let body = br#"{"created":1,"data":[{"b64_json":"aGVsbG8="}]}"#;
        assert_eq!(
            extract_payload(200, body).unwrap(),
            ImagePayload::Inline(b"hello".to_vec())
        );
    }

    #[test]
    fn test_url_payload() {
        let body = br#"{"data":[{"url":"https://cdn.example.test/img.png"}]}"#;
        assert_eq!(
            extract_payload(200, body).unwrap(),
            ImagePayload::Remote("https://cdn.example.test/img.png".into())
        );
    }

    #[test]
    fn test_empty_data_is_missing_image_data() {
        for body in [&br#"{"data":[]}"#[..], &br#"{"data":[{}]}"#[..]] {
            assert!(matches!(
                extract_payload(200, body),
                Err(ProviderError::MissingImageData(Provider::OpenAi))
            ));
        }
    }

    #[test]
    fn test_error_without_message_uses_status() {
        match extract_payload(500, br#"{"error":{}}"#) {
            Err(ProviderError::Rejected { message, .. }) => {
                assert_eq!(message, "request failed with status 500");
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_malformed_success_body_is_decode_error() {
        assert!(matches!(
            extract_payload(200, b"not json"),
            Err(ProviderError::Decode { provider: Provider::OpenAi, .. })
        ));
    }
}
