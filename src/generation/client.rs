// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! The remote image model.
//!
//! A request is a list of images plus instruction text; the reply is
//! exactly one image or a failure. Timeouts, transport errors, refusals and
//! replies without an image are all reported as `GenerationFailed`.

use crate::config::GeneratorConfig;
use crate::error::{EditorError, Result};
use crate::models::image::ImageData;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Modalities requested from the model.
pub const RESPONSE_MODALITIES: [&str; 2] = ["IMAGE", "TEXT"];

/// One generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub images: Vec<ImageData>,
    pub instruction: String,
    pub response_modalities: Vec<String>,
}

impl GenerationRequest {
    pub fn new(images: Vec<ImageData>, instruction: String) -> Self {
        Self {
            images,
            instruction,
            response_modalities: RESPONSE_MODALITIES.iter().map(|m| m.to_string()).collect(),
        }
    }
}

/// Anything that turns a request into an image.
pub trait ImageGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<ImageData>;
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequestBody {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponseBody {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

/// Blocking HTTP client for a `generateContent`-style endpoint.
pub struct HttpGenerator {
    client: reqwest::blocking::Client,
    url: String,
    api_key: String,
}

impl HttpGenerator {
    /// Build a client from config, reading the API key from the environment.
    pub fn from_config(config: &GeneratorConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            EditorError::GenerationFailed(format!("{} is not set", config.api_key_env))
        })?;
        Self::new(config, api_key)
    }

    pub fn new(config: &GeneratorConfig, api_key: String) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EditorError::GenerationFailed(e.to_string()))?;
        let url = format!(
            "{}/models/{}:generateContent",
            config.endpoint.trim_end_matches('/'),
            config.model
        );
        Ok(Self { client, url, api_key })
    }
}

impl ImageGenerator for HttpGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<ImageData> {
        log::info!(
            "Submitting {} image(s) to {}",
            request.images.len(),
            self.url
        );

        let response = self
            .client
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body(request))
            .send()
            .map_err(|e| EditorError::GenerationFailed(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .map_err(|e| EditorError::GenerationFailed(e.to_string()))?;
        if !status.is_success() {
            return Err(EditorError::GenerationFailed(format!(
                "model returned {}: {}",
                status,
                text.chars().take(200).collect::<String>()
            )));
        }

        parse_response(&text)
    }
}

fn request_body(request: &GenerationRequest) -> GenerateRequestBody {
    let mut parts: Vec<Part> = request
        .images
        .iter()
        .map(|image| Part {
            text: None,
            inline_data: Some(InlineData {
                mime_type: image.mime_type.clone(),
                data: BASE64.encode(&image.bytes),
            }),
        })
        .collect();
    parts.push(Part {
        text: Some(request.instruction.clone()),
        inline_data: None,
    });

    GenerateRequestBody {
        contents: vec![Content { parts }],
        generation_config: GenerationConfig {
            response_modalities: request.response_modalities.clone(),
        },
    }
}

/// Pull the first image out of a model reply.
fn parse_response(text: &str) -> Result<ImageData> {
    let body: GenerateResponseBody = serde_json::from_str(text)
        .map_err(|e| EditorError::GenerationFailed(format!("unreadable reply: {}", e)))?;

    if let Some(reason) = body.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(EditorError::GenerationFailed(format!("request blocked: {}", reason)));
    }

    let mut notes = Vec::new();
    for part in body.candidates.into_iter().flat_map(|c| c.content.parts) {
        if let Some(inline) = part.inline_data {
            let bytes = BASE64
                .decode(inline.data)
                .map_err(|e| EditorError::GenerationFailed(format!("bad image payload: {}", e)))?;
            return Ok(ImageData::new("generation", inline.mime_type, bytes));
        }
        if let Some(text) = part.text {
            notes.push(text);
        }
    }

    let detail = if notes.is_empty() {
        "no image in reply".to_string()
    } else {
        format!("no image in reply: {}", notes.join(" "))
    };
    Err(EditorError::GenerationFailed(detail))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_layout() {
        let request = GenerationRequest::new(
            vec![ImageData::new("a.jpg", "image/jpeg", vec![1, 2, 3])],
            "make it blue".to_string(),
        );
        let value = serde_json::to_value(request_body(&request)).unwrap();

        let parts = &value["contents"][0]["parts"];
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(parts[0]["inlineData"]["data"], "AQID");
        assert!(parts[0].get("text").is_none());
        assert_eq!(parts[1]["text"], "make it blue");
        assert_eq!(
            value["generationConfig"]["responseModalities"],
            serde_json::json!(["IMAGE", "TEXT"])
        );
    }

    #[test]
    fn test_parse_reply_with_image() {
        let reply = r#"{"candidates":[{"content":{"parts":[
            {"text":"Here you go"},
            {"inlineData":{"mimeType":"image/png","data":"AQID"}}
        ]}}]}"#;
        let image = parse_response(reply).unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.bytes, vec![1, 2, 3]);
    }

    #[test]
    fn test_parse_reply_without_image_fails() {
        let reply = r#"{"candidates":[{"content":{"parts":[{"text":"I cannot do that"}]}}]}"#;
        match parse_response(reply) {
            Err(EditorError::GenerationFailed(msg)) => assert!(msg.contains("I cannot do that")),
            other => panic!("unexpected {:?}", other),
        }
        assert!(parse_response(r#"{"candidates":[]}"#).is_err());
        assert!(parse_response("not json").is_err());
    }

    #[test]
    fn test_parse_blocked_reply_fails() {
        let reply = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        assert!(matches!(
            parse_response(reply),
            Err(EditorError::GenerationFailed(_))
        ));
    }

    #[test]
    fn test_unreachable_endpoint_is_generation_failure() {
        let config = GeneratorConfig {
            endpoint: "http://127.0.0.1:9".to_string(),
            timeout_secs: 1,
            ..Default::default()
        };
        let generator = HttpGenerator::new(&config, "key".to_string()).unwrap();
        let request = GenerationRequest::new(Vec::new(), "anything".to_string());
        assert!(matches!(
            generator.generate(&request),
            Err(EditorError::GenerationFailed(_))
        ));
    }
}
