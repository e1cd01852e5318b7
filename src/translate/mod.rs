//! OpenAI chat request → Monica bot request translation
//!
//! Both variants walk the message list once, building an [`ItemChain`]. Messages
//! that carry images wait for the [`ImageIngestor`] before their item is appended.

pub mod chain;

pub use chain::ItemChain;

use crate::catalog;
use crate::ingest::ImageIngestor;
use crate::models::{ChatCompletionRequest, ChatMessage, ContentPart, MessageContent};
use crate::provider::types::{
    BotChatData, BotChatRequest, BotData, BotToolData, CustomBotData, CustomBotRequest,
    ItemContent, ItemType, ToolData,
};
use crate::{Error, Result};
use tracing::debug;
use uuid::Uuid;

const LANGUAGE: &str = "auto";
const TASK_TYPE: &str = "chat";
const TRIGGER_BY: &str = "auto";
const CUSTOM_BOT_LOCALE: &str = "zh_CN";
const CUSTOM_BOT_RESPONSE_LANGUAGE: &str = "Chinese (Simplified)";
const CUSTOM_BOT_NAME: &str = "Test Bot";
const CUSTOM_BOT_PAGE_TITLE: &str = "Monica Bot Test";
const CUSTOM_BOT_LOGO_URL: &str = "https://assets.monica.im/assets/img/default_bot_icon.jpg";

fn new_task_uid() -> String {
    format!("task:{}", Uuid::new_v4())
}

/// Split message content into its text and image references.
///
/// Only the last text part is kept; earlier text parts are overwritten.
pub fn partition_content(content: Option<&MessageContent>) -> (String, Vec<String>) {
    let mut text = String::new();
    let mut images = Vec::new();

    match content {
        Some(MessageContent::Text(value)) => text = value.clone(),
        Some(MessageContent::Parts(parts)) => {
            for part in parts {
                match part {
                    ContentPart::Text { text: value } => text = value.clone(),
                    ContentPart::ImageUrl { image_url } => images.push(image_url.url.clone()),
                    ContentPart::Other => {}
                }
            }
        }
        None => {}
    }

    (text, images)
}

fn item_type_for(role: &str) -> ItemType {
    if role == "assistant" {
        ItemType::Reply
    } else {
        ItemType::Question
    }
}

/// Result of walking the message list.
struct Conversation {
    chain: ItemChain,
    system_prompt: String,
}

pub struct Translator {
    ingestor: ImageIngestor,
}

impl Translator {
    pub fn new(ingestor: ImageIngestor) -> Self {
        Self { ingestor }
    }

    /// Translate for the fixed-catalog bot endpoint (`/api/custom_bot/chat`).
    ///
    /// System messages are dropped; the bot is picked from the model name.
    pub async fn to_bot_request(&self, request: &ChatCompletionRequest) -> Result<BotChatRequest> {
        let conversation = self.build_conversation(&request.messages, true).await?;
        let pre_parent_item_id = conversation.chain.last_item_id().to_string();
        let conversation_id = conversation.chain.conversation_id().to_string();

        Ok(BotChatRequest {
            task_uid: new_task_uid(),
            bot_uid: catalog::model_to_bot(&request.model),
            data: BotChatData {
                conversation_id,
                pre_parent_item_id,
                items: conversation.chain.into_items(),
                trigger_by: TRIGGER_BY.to_string(),
                use_model: request.model.clone(),
                is_incognito: true,
                use_new_memory: false,
            },
            language: LANGUAGE.to_string(),
            task_type: TASK_TYPE.to_string(),
            tool_data: ToolData::default(),
        })
    }

    /// Translate for a user-configured bot (`/api/custom_bot/preview_chat`).
    ///
    /// The system message becomes the bot prompt.
    pub async fn to_custom_bot_request(
        &self,
        request: &ChatCompletionRequest,
        bot_uid: &str,
    ) -> Result<CustomBotRequest> {
        let use_model = catalog::custom_bot_model(&request.model);
        let conversation = self.build_conversation(&request.messages, false).await?;
        let pre_parent_item_id = conversation.chain.last_item_id().to_string();
        let conversation_id = conversation.chain.conversation_id().to_string();

        Ok(CustomBotRequest {
            task_uid: new_task_uid(),
            bot_uid: bot_uid.to_string(),
            data: CustomBotData {
                conversation_id,
                items: conversation.chain.into_items(),
                pre_generated_reply_id: chain::new_item_id(),
                pre_parent_item_id,
                origin: format!("https://monica.im/bots/{}", bot_uid),
                origin_page_title: CUSTOM_BOT_PAGE_TITLE.to_string(),
                trigger_by: TRIGGER_BY.to_string(),
                use_model: use_model.clone(),
                is_incognito: false,
                use_new_memory: true,
                use_memory_suggestion: true,
            },
            language: LANGUAGE.to_string(),
            locale: CUSTOM_BOT_LOCALE.to_string(),
            task_type: TASK_TYPE.to_string(),
            bot_data: BotData {
                description: CUSTOM_BOT_NAME.to_string(),
                logo_url: CUSTOM_BOT_LOGO_URL.to_string(),
                name: CUSTOM_BOT_NAME.to_string(),
                classification: "custom".to_string(),
                prompt: conversation.system_prompt,
                bot_type: "custom_bot".to_string(),
                uid: bot_uid.to_string(),
                example_list: Vec::new(),
                tool_data: BotToolData {
                    use_model,
                    ..BotToolData::default()
                },
            },
            ai_resp_language: CUSTOM_BOT_RESPONSE_LANGUAGE.to_string(),
        })
    }

    async fn build_conversation(
        &self,
        messages: &[ChatMessage],
        incognito: bool,
    ) -> Result<Conversation> {
        if messages.is_empty() {
            return Err(Error::EmptyMessages);
        }

        let mut chain = ItemChain::new();
        let mut system_prompt = String::new();

        for message in messages {
            if message.role == "system" {
                system_prompt = message.text_content();
                continue;
            }

            let data = self.item_content(message, incognito).await;
            chain.push(item_type_for(&message.role), data);
        }

        debug!(
            "Built conversation {} with {} items",
            chain.conversation_id(),
            chain.len()
        );

        Ok(Conversation {
            chain,
            system_prompt,
        })
    }

    async fn item_content(&self, message: &ChatMessage, incognito: bool) -> ItemContent {
        let (text, images) = partition_content(message.content.as_ref());
        if images.is_empty() {
            return ItemContent::text(text, incognito);
        }

        let file_infos = self.ingestor.ingest(&images).await.into_file_infos();
        if file_infos.is_empty() {
            return ItemContent::text(text, incognito);
        }
        ItemContent::file_with_text(text, file_infos, incognito)
    }
}
