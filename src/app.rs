//! Application facade tying translation, image ingestion and dispatch together.

use crate::catalog;
use crate::ingest::{ImageIngestor, UploadLimits};
use crate::models::{ChatCompletionRequest, Config, OpenAiModelList};
use crate::provider::{FileStorage, MonicaClient, ProviderRequest};
use crate::translate::Translator;
use crate::{Error, Result};
use std::sync::Arc;
use tracing::info;

/// Translates OpenAI chat requests and optionally dispatches them to Monica.
pub struct App {
    translator: Translator,
    client: Option<Arc<MonicaClient>>,
    bot_uid: Option<String>,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub storage: Arc<dyn FileStorage>,
    pub client: Option<Arc<MonicaClient>>,
    pub limits: UploadLimits,
    pub bot_uid: Option<String>,
}

impl App {
    /// Build an app from concrete service dependencies.
    pub fn with_services(services: AppServices) -> Self {
        Self {
            translator: Translator::new(ImageIngestor::new(services.storage, services.limits)),
            client: services.client,
            bot_uid: services.bot_uid,
        }
    }

    /// Construct an app from a resolved configuration; Monica serves both storage and chat.
    pub fn from_config(config: &Config) -> Self {
        let client = Arc::new(MonicaClient::from_config(config));
        info!("Using Monica API at {}", client.base_url());

        Self::with_services(AppServices {
            storage: client.clone(),
            client: Some(client),
            limits: config.upload.clone(),
            bot_uid: config.bot_uid.clone(),
        })
    }

    /// Construct an app from environment configuration (`Config::from_env`).
    pub fn new() -> Result<Self> {
        let config = Config::from_env()?;
        Ok(Self::from_config(&config))
    }

    pub fn model_list(&self) -> OpenAiModelList {
        catalog::model_list()
    }

    /// Translate with the configured default: custom bot when a bot uid is set.
    pub async fn translate(&self, request: &ChatCompletionRequest) -> Result<ProviderRequest> {
        self.translate_for(request, self.bot_uid.as_deref()).await
    }

    /// Translate for a specific custom bot, or for the model catalog when `bot_uid` is `None`.
    pub async fn translate_for(
        &self,
        request: &ChatCompletionRequest,
        bot_uid: Option<&str>,
    ) -> Result<ProviderRequest> {
        match bot_uid {
            Some(bot_uid) => {
                info!("Translating request for custom bot {}", bot_uid);
                Ok(ProviderRequest::CustomBot(
                    self.translator
                        .to_custom_bot_request(request, bot_uid)
                        .await?,
                ))
            }
            None => {
                info!("Translating request for model {}", request.model);
                Ok(ProviderRequest::Bot(
                    self.translator.to_bot_request(request).await?,
                ))
            }
        }
    }

    /// Send a translated request and return the raw provider response for relay.
    pub async fn send(&self, request: &ProviderRequest) -> Result<reqwest::Response> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| Error::Config("no Monica client configured".to_string()))?;
        client.send_chat(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChatMessage;
    use crate::provider::MockFileStorage;

    fn app(bot_uid: Option<&str>) -> App {
        App::with_services(AppServices {
            storage: Arc::new(MockFileStorage::new()),
            client: None,
            limits: UploadLimits::default(),
            bot_uid: bot_uid.map(str::to_string),
        })
    }

    fn hello() -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: "gpt-4o".to_string(),
            messages: vec![ChatMessage::text("user", "hello")],
            stream: false,
        }
    }

    #[tokio::test]
    async fn test_default_translation_uses_model_bot() {
        let request = app(None).translate(&hello()).await.unwrap();
        assert_eq!(request.endpoint(), "/api/custom_bot/chat");
        assert!(matches!(request, ProviderRequest::Bot(ref bot) if bot.bot_uid == "gpt_4_o_chat"));
    }

    #[tokio::test]
    async fn test_configured_bot_uid_selects_custom_bot() {
        let request = app(Some("bot-7")).translate(&hello()).await.unwrap();
        assert_eq!(request.endpoint(), "/api/custom_bot/preview_chat");
        assert_eq!(request.items().len(), 2);
    }

    #[tokio::test]
    async fn test_send_without_client_fails() {
        let app = app(None);
        let request = app.translate(&hello()).await.unwrap();

        let err = app.send(&request).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
