//! Monica provider integration
//!
//! Wire types for the bot chat endpoints and the file storage seam used by image
//! ingestion: pre-sign an upload slot, transfer bytes, register the object and poll
//! its indexing status.

pub mod client;
pub mod mock;
pub mod types;

pub use client::MonicaClient;
pub use mock::MockFileStorage;
pub use types::{FileInfo, FileStatus, ProviderRequest, RegisteredFile};

use crate::Result;
use async_trait::async_trait;

/// Upload slot returned by the pre-sign endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct PresignedSlot {
    pub upload_url: String,
    pub object_url: String,
    pub cdn_url: String,
}

#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn pre_sign(&self, file_name: &str) -> Result<PresignedSlot>;
    async fn transfer(&self, slot: &PresignedSlot, data: Vec<u8>, content_type: &str) -> Result<()>;
    async fn register(&self, file: &FileInfo) -> Result<RegisteredFile>;
    async fn file_status(&self, file_uid: &str) -> Result<FileStatus>;
}
