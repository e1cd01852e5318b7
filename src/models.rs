//! Data models and structures
//!
//! Defines the OpenAI-side request/response shapes accepted by the proxy and the
//! runtime configuration loaded from the environment.

use crate::ingest::UploadLimits;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.monica.im";

// OpenAI API Request/Response models
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub stream: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<MessageContent>,
}

impl ChatMessage {
    pub fn text(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: Some(MessageContent::Text(content.to_string())),
        }
    }

    pub fn parts(role: &str, parts: Vec<ContentPart>) -> Self {
        Self {
            role: role.to_string(),
            content: Some(MessageContent::Parts(parts)),
        }
    }

    /// Scalar text of the message. For multipart content the last text part wins.
    pub fn text_content(&self) -> String {
        match &self.content {
            Some(MessageContent::Text(text)) => text.clone(),
            Some(MessageContent::Parts(parts)) => parts
                .iter()
                .rev()
                .find_map(|p| match p {
                    ContentPart::Text { text } => Some(text.clone()),
                    ContentPart::ImageUrl { .. } | ContentPart::Other => None,
                })
                .unwrap_or_default(),
            None => String::new(),
        }
    }
}

/// Either a plain string or an array of typed parts.
///
/// Variant order matters for `#[serde(untagged)]` decoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
    /// Any other part type (audio, files, ...). Accepted and ignored.
    #[serde(other)]
    Other,
}

impl ContentPart {
    pub fn text(text: &str) -> Self {
        Self::Text {
            text: text.to_string(),
        }
    }

    pub fn image(url: &str) -> Self {
        Self::ImageUrl {
            image_url: ImageUrl {
                url: url.to_string(),
                detail: None,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// A model in the OpenAI `/v1/models` format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpenAiModel {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub owned_by: String,
}

/// Response body of the `/v1/models` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiModelList {
    pub object: String,
    pub data: Vec<OpenAiModel>,
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub session_cookie: String,
    pub base_url: String,
    pub bot_uid: Option<String>,
    pub upload: UploadLimits,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // A missing .env is fine; a malformed one is not.
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(e.into());
            }
        }
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = UploadLimits::default();

        let session_cookie = lookup("MONICA_COOKIE")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| Error::Config("MONICA_COOKIE not set".to_string()))?;

        let upload = UploadLimits {
            max_concurrent: parse_var(&lookup, "MAX_CONCURRENT_UPLOADS", defaults.max_concurrent)?,
            timeout: Duration::from_secs(parse_var(
                &lookup,
                "IMAGE_UPLOAD_TIMEOUT_SECS",
                defaults.timeout.as_secs(),
            )?),
            poll_interval: Duration::from_millis(parse_var(
                &lookup,
                "FILE_POLL_INTERVAL_MS",
                defaults.poll_interval.as_millis() as u64,
            )?),
            max_image_size: parse_var(&lookup, "MAX_IMAGE_SIZE_BYTES", defaults.max_image_size)?,
        };

        if upload.max_concurrent == 0 {
            return Err(Error::Config(
                "MAX_CONCURRENT_UPLOADS must be at least 1".to_string(),
            ));
        }
        if upload.poll_interval.is_zero() {
            return Err(Error::Config(
                "FILE_POLL_INTERVAL_MS must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            session_cookie,
            base_url: lookup("MONICA_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            bot_uid: lookup("BOT_UID").filter(|v| !v.trim().is_empty()),
            upload,
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid {} '{}': {}", key, raw, e))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_vars(lookup_from(&[("MONICA_COOKIE", "session=abc")])).unwrap();

        assert_eq!(config.session_cookie, "session=abc");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.bot_uid.is_none());
        assert_eq!(config.upload.max_concurrent, 5);
        assert_eq!(config.upload.timeout, Duration::from_secs(30));
        assert_eq!(config.upload.max_image_size, 10 * 1024 * 1024);
    }

    #[test]
    fn test_config_requires_cookie() {
        let err = Config::from_vars(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_config_overrides() {
        let config = Config::from_vars(lookup_from(&[
            ("MONICA_COOKIE", "c"),
            ("MONICA_BASE_URL", "http://localhost:9000/"),
            ("BOT_UID", "bot-123"),
            ("MAX_CONCURRENT_UPLOADS", "2"),
            ("IMAGE_UPLOAD_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "http://localhost:9000");
        assert_eq!(config.bot_uid.as_deref(), Some("bot-123"));
        assert_eq!(config.upload.max_concurrent, 2);
        assert_eq!(config.upload.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_config_rejects_invalid_number() {
        let err = Config::from_vars(lookup_from(&[
            ("MONICA_COOKIE", "c"),
            ("MAX_CONCURRENT_UPLOADS", "many"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("MAX_CONCURRENT_UPLOADS"));
    }

    #[test]
    fn test_config_rejects_zero_concurrency() {
        let err = Config::from_vars(lookup_from(&[
            ("MONICA_COOKIE", "c"),
            ("MAX_CONCURRENT_UPLOADS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_config_rejects_zero_poll_interval() {
        let err = Config::from_vars(lookup_from(&[
            ("MONICA_COOKIE", "c"),
            ("FILE_POLL_INTERVAL_MS", "0"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("FILE_POLL_INTERVAL_MS"));
    }

    #[test]
    fn test_unknown_content_parts_are_ignored() {
        let json = r#"{
            "model": "gpt-4o",
            "messages": [
                {"role": "user", "content": [
                    {"type": "text", "text": "listen"},
                    {"type": "input_audio", "input_audio": {"data": "AAAA", "format": "wav"}}
                ]}
            ]
        }"#;

        let request: ChatCompletionRequest = serde_json::from_str(json).unwrap();
        let message = &request.messages[0];
        assert!(matches!(
            message.content,
            Some(MessageContent::Parts(ref parts)) if matches!(parts[1], ContentPart::Other)
        ));
        assert_eq!(message.text_content(), "listen");
    }

    #[test]
    fn test_message_content_deserialization() {
        let json = r#"{
            "model": "gpt-4o",
            "messages": [
                {"role": "system", "content": "be nice"},
                {"role": "user", "content": [
                    {"type": "text", "text": "what is this?"},
                    {"type": "image_url", "image_url": {"url": "data:image/png;base64,AAAA"}}
                ]},
                {"role": "assistant", "content": null}
            ]
        }"#;

        let request: ChatCompletionRequest = serde_json::from_str(json).unwrap();
        assert!(!request.stream);
        assert_eq!(request.messages.len(), 3);
        assert_eq!(request.messages[0].text_content(), "be nice");
        assert!(matches!(
            request.messages[1].content,
            Some(MessageContent::Parts(ref parts)) if parts.len() == 2
        ));
        assert_eq!(request.messages[2].text_content(), "");
    }

    #[test]
    fn test_text_content_uses_last_text_part() {
        let message = ChatMessage::parts(
            "user",
            vec![
                ContentPart::text("first"),
                ContentPart::image("data:image/png;base64,AAAA"),
                ContentPart::text("second"),
            ],
        );
        assert_eq!(message.text_content(), "second");
    }
}
