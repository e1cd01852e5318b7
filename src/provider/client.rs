use super::types::{
    FileBatchGetRequest, FileBatchGetResponse, FileInfo, FileStatus, FileUploadRequest,
    FileUploadResponse, PreSignRequest, PreSignResponse, ProviderRequest, RegisteredFile,
};
use super::{FileStorage, PresignedSlot};
use crate::models::{Config, DEFAULT_BASE_URL};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

const PRE_SIGN_PATH: &str = "/api/file_object/pre_sign_list_by_module";
const FILE_CREATE_PATH: &str = "/api/files/batch_create_llm_file";
const FILE_GET_PATH: &str = "/api/files/batch_get_file";

pub const IMAGE_MODULE: &str = "chat_bot";
pub const IMAGE_LOCATION: &str = "files";

/// Monica REST client authenticated with the user's session cookie.
pub struct MonicaClient {
    client: Client,
    cookie: String,
    base_url: String,
    timeout: Duration,
}

impl MonicaClient {
    pub fn new(cookie: String) -> Self {
        Self::new_with_client(cookie, Client::new())
    }

    pub fn new_with_client(cookie: String, client: Client) -> Self {
        Self {
            client,
            cookie,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.session_cookie.clone()).with_base_url(config.base_url.clone())
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_json<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        path: &str,
        request: &Req,
    ) -> Result<Resp> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .header("Cookie", &self.cookie)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send request to Monica ({}): {}", path, e);
                e
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            tracing::error!("Monica API error on {} (status {}): {}", path, status, error_text);
            return Err(Error::Provider(format!(
                "{} returned status {}: {}",
                path, status, error_text
            )));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse Monica response: {}\nBody: {}", e, body);
            Error::Provider(format!("Failed to parse {} response: {}", path, e))
        })
    }

    /// Dispatch a translated chat request and return the raw event-stream response.
    pub async fn send_chat(&self, request: &ProviderRequest) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, request.endpoint());
        tracing::debug!("Dispatching chat request to {}", url);

        let response = self
            .client
            .post(&url)
            .header("Cookie", &self.cookie)
            .header("Accept", "text/event-stream")
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            tracing::error!("Monica chat error (status {}): {}", status, error_text);
            return Err(Error::Provider(format!(
                "chat returned status {}: {}",
                status, error_text
            )));
        }

        Ok(response)
    }
}

fn check_code(path: &str, code: i64, msg: &str) -> Result<()> {
    if code == 0 {
        Ok(())
    } else {
        Err(Error::Provider(format!("{} rejected (code {}): {}", path, code, msg)))
    }
}

#[async_trait]
impl FileStorage for MonicaClient {
    async fn pre_sign(&self, file_name: &str) -> Result<PresignedSlot> {
        let request = PreSignRequest {
            filename_list: vec![file_name.to_string()],
            module: IMAGE_MODULE.to_string(),
            location: IMAGE_LOCATION.to_string(),
            obj_id: Uuid::new_v4().to_string(),
        };

        let response: PreSignResponse = self.post_json(PRE_SIGN_PATH, &request).await?;
        check_code(PRE_SIGN_PATH, response.code, &response.msg)?;

        let data = response.data;
        match (
            data.pre_sign_url_list.into_iter().next(),
            data.object_url_list.into_iter().next(),
        ) {
            (Some(upload_url), Some(object_url)) => Ok(PresignedSlot {
                upload_url,
                cdn_url: data.cdn_url_list.into_iter().next().unwrap_or_default(),
                object_url,
            }),
            _ => Err(Error::Provider(
                "pre-sign response has no upload slot".to_string(),
            )),
        }
    }

    async fn transfer(&self, slot: &PresignedSlot, data: Vec<u8>, content_type: &str) -> Result<()> {
        let response = self
            .client
            .put(&slot.upload_url)
            .timeout(self.timeout)
            .header("Content-Type", content_type)
            .body(data)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            tracing::error!("Upload to pre-signed URL failed (status {}): {}", status, error_text);
            return Err(Error::Provider(format!(
                "upload returned status {}: {}",
                status, error_text
            )));
        }

        Ok(())
    }

    async fn register(&self, file: &FileInfo) -> Result<RegisteredFile> {
        let request = FileUploadRequest {
            data: vec![file.clone()],
        };

        let response: FileUploadResponse = self.post_json(FILE_CREATE_PATH, &request).await?;
        check_code(FILE_CREATE_PATH, response.code, &response.msg)?;

        response
            .data
            .items
            .into_iter()
            .next()
            .ok_or_else(|| Error::Provider("file registration returned no items".to_string()))
    }

    async fn file_status(&self, file_uid: &str) -> Result<FileStatus> {
        let request = FileBatchGetRequest {
            file_uids: vec![file_uid.to_string()],
        };

        let response: FileBatchGetResponse = self.post_json(FILE_GET_PATH, &request).await?;
        let mut items = response.data.items;
        if items.is_empty() {
            return Err(Error::Provider(format!("no status for file {}", file_uid)));
        }

        let index = items
            .iter()
            .position(|item| item.file_uid == file_uid)
            .unwrap_or(0);
        Ok(items.swap_remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_client(server: &MockServer) -> MonicaClient {
        MonicaClient::new("session=test".to_string()).with_base_url(server.uri())
    }

    #[tokio::test]
    async fn test_pre_sign_returns_first_slot() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(PRE_SIGN_PATH))
            .and(header("Cookie", "session=test"))
            .and(body_partial_json(serde_json::json!({
                "filename_list": ["a.png"],
                "module": "chat_bot",
                "location": "files"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 0,
                "msg": "",
                "data": {
                    "pre_sign_url_list": ["https://upload.example/a"],
                    "object_url_list": ["https://object.example/a"],
                    "cdn_url_list": ["https://cdn.example/a"]
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let slot = make_client(&server).pre_sign("a.png").await.unwrap();
        assert_eq!(
            slot,
            PresignedSlot {
                upload_url: "https://upload.example/a".to_string(),
                object_url: "https://object.example/a".to_string(),
                cdn_url: "https://cdn.example/a".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_pre_sign_rejects_nonzero_code() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(PRE_SIGN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 401,
                "msg": "not logged in",
                "data": {}
            })))
            .mount(&server)
            .await;

        let err = make_client(&server).pre_sign("a.png").await.unwrap_err();
        assert!(err.to_string().contains("not logged in"));
    }

    #[tokio::test]
    async fn test_http_error_returns_provider_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(FILE_CREATE_PATH))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = make_client(&server)
            .register(&FileInfo::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Provider(_)));
    }

    #[tokio::test]
    async fn test_transfer_puts_bytes_with_content_type() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/upload/a"))
            .and(header("Content-Type", "image/png"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let slot = PresignedSlot {
            upload_url: format!("{}/upload/a", server.uri()),
            object_url: String::new(),
            cdn_url: String::new(),
        };

        make_client(&server)
            .transfer(&slot, vec![1, 2, 3], "image/png")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_transfer_rejection() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(403).set_body_string("signature expired"))
            .mount(&server)
            .await;

        let slot = PresignedSlot {
            upload_url: format!("{}/upload/a", server.uri()),
            object_url: String::new(),
            cdn_url: String::new(),
        };

        let err = make_client(&server)
            .transfer(&slot, vec![1], "image/png")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("signature expired"));
    }

    #[tokio::test]
    async fn test_register_and_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(FILE_CREATE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 0,
                "msg": "",
                "data": { "items": [{ "file_name": "a.png", "file_uid": "uid-1" }] }
            })))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path(FILE_GET_PATH))
            .and(body_partial_json(serde_json::json!({ "file_uids": ["uid-1"] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "items": [{
                    "file_uid": "uid-1",
                    "index_progress": 100,
                    "file_tokens": 85,
                    "file_chunks": 1
                }] }
            })))
            .mount(&server)
            .await;

        let client = make_client(&server);
        let registered = client.register(&FileInfo::default()).await.unwrap();
        assert_eq!(registered.file_uid, "uid-1");

        let status = client.file_status("uid-1").await.unwrap();
        assert_eq!(status.index_progress, 100);
        assert_eq!(status.file_tokens, 85);
    }

    #[tokio::test]
    async fn test_send_chat_targets_variant_endpoint() {
        use crate::provider::types::{BotChatData, BotChatRequest, ToolData};

        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/custom_bot/chat"))
            .and(header("Accept", "text/event-stream"))
            .respond_with(ResponseTemplate::new(200).set_body_string("data: {}\n\n"))
            .expect(1)
            .mount(&server)
            .await;

        let request = ProviderRequest::Bot(BotChatRequest {
            task_uid: "task:1".to_string(),
            bot_uid: "gpt_4_o_chat".to_string(),
            data: BotChatData {
                conversation_id: "conv:1".to_string(),
                pre_parent_item_id: "msg:1".to_string(),
                items: Vec::new(),
                trigger_by: "auto".to_string(),
                use_model: String::new(),
                is_incognito: true,
                use_new_memory: false,
            },
            language: "auto".to_string(),
            task_type: "chat".to_string(),
            tool_data: ToolData::default(),
        });

        let response = make_client(&server).send_chat(&request).await.unwrap();
        assert_eq!(response.text().await.unwrap(), "data: {}\n\n");
    }
}
