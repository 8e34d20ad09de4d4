//! Gemini `generateContent` image backend

use log::debug;
use reqwest::blocking::Client;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use super::{decode_base64, error_message, rejection, Provider, ProviderError};

#[derive(Debug)]
pub struct GoogleClient {
    api_key: String,
    base_url: String,
    http: Client,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<TextPart<'a>>,
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponsePart {
    #[serde(default, rename = "inlineData", alias = "inline_data")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Default, Deserialize)]
struct InlineData {
    #[serde(default, rename = "mimeType", alias = "mime_type")]
    mime_type: String,
    #[serde(default)]
    data: String,
}

impl GoogleClient {
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

    pub fn generate_image(&self, model: &str, prompt: &str) -> Result<Vec<u8>, ProviderError> {
        let endpoint = self.endpoint(model)?;
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![TextPart { text: prompt }],
            }],
        };

        debug!("POST {endpoint}");
        let response = self
            .http
            .post(endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()?;

        let status = response.status().as_u16();
        let bytes = response.bytes()?;
        extract_image(status, &bytes)
    }

    fn endpoint(&self, model: &str) -> Result<Url, ProviderError> {
        let invalid = |reason: String| ProviderError::InvalidEndpoint {
            url: self.base_url.clone(),
            reason,
        };

        let mut url = Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("cannot be a base URL".to_string()))?
            .pop_if_empty()
            .push("models")
            .push(&format!("{model}:generateContent"));
        Ok(url)
    }
}

/// Classify a `generateContent` response and pull out the first inline image
fn extract_image(status: u16, body: &[u8]) -> Result<Vec<u8>, ProviderError> {
    if status >= 400 {
        return Err(rejection(Provider::Google, status, error_message(body)));
    }

    let payload: GenerateResponse =
        serde_json::from_slice(body).map_err(|source| ProviderError::Decode {
            provider: Provider::Google,
            source,
        })?;

    let inline = payload
        .candidates
        .iter()
        .flat_map(|candidate| candidate.content.parts.iter())
        .filter_map(|part| part.inline_data.as_ref())
        .find(|inline| !inline.data.is_empty())
        .ok_or(ProviderError::MissingImageData(Provider::Google))?;

    debug!("google returned inline {} payload", inline.mime_type);
    decode_base64(&inline.data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![TextPart { text: "a cat" }],
            }],
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"contents":[{"parts":[{"text":"a cat"}]}]}"#
        );
    }

    #[test]
    fn test_inline_image_after_text_part() {
        let body = br#"{"candidates":[{"content":{"parts":[
            {"text":"here you go"},
            {"inlineData":{"mimeType":"image/png","data":"aGVsbG8="}}
        ]}}]}"#;
        assert_eq!(extract_image(200, body).unwrap(), b"hello");
    }

    #[test]
    fn test_snake_case_inline_data() {
        let body = br#"{"candidates":[{"content":{"parts":[
            {"inline_data":{"mime_type":"image/png","data":"aGk="}}
        ]}}]}"#;
        assert_eq!(extract_image(200, body).unwrap(), b"hi");
    }

    #[test]
    fn test_text_only_is_missing_image_data() {
        let body = br#"{"candidates":[{"content":{"parts":[{"text":"sorry"}]}}]}"#;
        assert!(matches!(
            extract_image(200, body),
            Err(ProviderError::MissingImageData(Provider::Google))
        ));
    }

    #[test]
    fn test_error_status_carries_message() {
        let body = br#"{"error":{"code":400,"message":"API key not valid"}}"#;
        match extract_image(400, body) {
            Err(ProviderError::Rejected { status, message, .. }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_bad_base64_is_invalid_image_data() {
        let body = br#"{"candidates":[{"content":{"parts":[{"inlineData":{"data":"!!!"}}]}}]}"#;
        assert!(matches!(
            extract_image(200, body),
            Err(ProviderError::InvalidImageData(_))
        ));
    }

    #[test]
    fn test_endpoint_escapes_model() {
        let client = GoogleClient::new(
            "k".into(),
            "https://example.test/v1beta".into(),
            Client::new(),
        );
        let url = client.endpoint("gemini-2.5-flash-image").unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.test/v1beta/models/gemini-2.5-flash-image:generateContent"
        );
    }
}
