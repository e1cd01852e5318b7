//! Monica wire types for bot chat and file storage endpoints.

use serde::{Deserialize, Serialize};

pub const WELCOME_MESSAGE: &str = "__RENDER_BOT_WELCOME_MSG__";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Question,
    Reply,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Text,
    FileWithText,
}

/// One turn in a Monica conversation chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub conversation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_item_id: Option<String>,
    pub item_id: String,
    pub item_type: ItemType,
    pub data: ItemContent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemContent {
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub content: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_incognito: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub file_infos: Vec<FileInfo>,
}

impl ItemContent {
    pub fn text(content: String, is_incognito: bool) -> Self {
        Self {
            content_type: ContentType::Text,
            content,
            is_incognito,
            file_infos: Vec::new(),
        }
    }

    pub fn file_with_text(content: String, file_infos: Vec<FileInfo>, is_incognito: bool) -> Self {
        Self {
            content_type: ContentType::FileWithText,
            content,
            is_incognito,
            file_infos,
        }
    }
}

/// Descriptor of a file uploaded to Monica storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    pub file_url: String,
    pub file_uid: String,
    pub parse: bool,
    pub file_name: String,
    pub file_size: u64,
    pub file_type: String,
    pub file_ext: String,
    pub file_tokens: i64,
    pub file_chunks: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub object_url: String,
    pub use_full_text: bool,
}

/// Request body for `/api/custom_bot/chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotChatRequest {
    pub task_uid: String,
    pub bot_uid: String,
    pub data: BotChatData,
    pub language: String,
    pub task_type: String,
    pub tool_data: ToolData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotChatData {
    pub conversation_id: String,
    pub pre_parent_item_id: String,
    pub items: Vec<Item>,
    pub trigger_by: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub use_model: String,
    pub is_incognito: bool,
    pub use_new_memory: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolData {
    pub sys_skill_list: Vec<String>,
}

/// Request body for `/api/custom_bot/preview_chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomBotRequest {
    pub task_uid: String,
    pub bot_uid: String,
    pub data: CustomBotData,
    pub language: String,
    pub locale: String,
    pub task_type: String,
    pub bot_data: BotData,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ai_resp_language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomBotData {
    pub conversation_id: String,
    pub items: Vec<Item>,
    pub pre_generated_reply_id: String,
    pub pre_parent_item_id: String,
    pub origin: String,
    pub origin_page_title: String,
    pub trigger_by: String,
    pub use_model: String,
    pub is_incognito: bool,
    pub use_new_memory: bool,
    pub use_memory_suggestion: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotData {
    pub description: String,
    pub logo_url: String,
    pub name: String,
    pub classification: String,
    pub prompt: String,
    #[serde(rename = "type")]
    pub bot_type: String,
    pub uid: String,
    pub example_list: Vec<serde_json::Value>,
    pub tool_data: BotToolData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BotToolData {
    pub knowledge_list: Vec<serde_json::Value>,
    pub user_skill_list: Vec<serde_json::Value>,
    pub sys_skill_list: Vec<serde_json::Value>,
    pub use_model: String,
    pub schedule_task_list: Vec<serde_json::Value>,
}

/// A translated request ready for dispatch.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ProviderRequest {
    Bot(BotChatRequest),
    CustomBot(CustomBotRequest),
}

impl ProviderRequest {
    /// Path of the chat endpoint this request is sent to.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Bot(_) => "/api/custom_bot/chat",
            Self::CustomBot(_) => "/api/custom_bot/preview_chat",
        }
    }

    pub fn items(&self) -> &[Item] {
        match self {
            Self::Bot(req) => &req.data.items,
            Self::CustomBot(req) => &req.data.items,
        }
    }
}

// File storage endpoints

#[derive(Debug, Serialize)]
pub struct PreSignRequest {
    pub filename_list: Vec<String>,
    pub module: String,
    pub location: String,
    pub obj_id: String,
}

#[derive(Debug, Deserialize)]
pub struct PreSignResponse {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub data: PreSignData,
}

#[derive(Debug, Default, Deserialize)]
pub struct PreSignData {
    #[serde(default)]
    pub pre_sign_url_list: Vec<String>,
    #[serde(default)]
    pub object_url_list: Vec<String>,
    #[serde(default)]
    pub cdn_url_list: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct FileUploadRequest {
    pub data: Vec<FileInfo>,
}

#[derive(Debug, Deserialize)]
pub struct FileUploadResponse {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub data: FileUploadData,
}

#[derive(Debug, Default, Deserialize)]
pub struct FileUploadData {
    #[serde(default)]
    pub items: Vec<RegisteredFile>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisteredFile {
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub file_type: String,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub file_uid: String,
    #[serde(default)]
    pub file_tokens: i64,
    #[serde(default)]
    pub file_chunks: i64,
}

#[derive(Debug, Serialize)]
pub struct FileBatchGetRequest {
    pub file_uids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct FileBatchGetResponse {
    #[serde(default)]
    pub data: FileBatchGetData,
}

#[derive(Debug, Default, Deserialize)]
pub struct FileBatchGetData {
    #[serde(default)]
    pub items: Vec<FileStatus>,
}

/// Indexing state of a registered file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileStatus {
    #[serde(default)]
    pub file_uid: String,
    #[serde(default)]
    pub index_state: i64,
    #[serde(default)]
    pub index_desc: String,
    #[serde(default)]
    pub error_message: String,
    #[serde(default)]
    pub file_tokens: i64,
    #[serde(default)]
    pub file_chunks: i64,
    #[serde(default)]
    pub index_progress: i64,
}
