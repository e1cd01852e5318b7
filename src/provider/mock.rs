use super::types::{FileInfo, FileStatus, RegisteredFile};
use super::{FileStorage, PresignedSlot};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// In-memory [`FileStorage`] for exercising ingestion without a network.
#[derive(Clone)]
pub struct MockFileStorage {
    base_url: String,
    transfer_delay: Duration,
    polls_until_ready: usize,
    index_error: Option<String>,
    fail_pre_sign: bool,
    fail_transfer: bool,
    missing_file_uid: bool,
    uploads: Arc<Mutex<Vec<(String, usize)>>>,
    pre_sign_count: Arc<Mutex<usize>>,
    register_count: Arc<Mutex<usize>>,
    status_polls: Arc<Mutex<HashMap<String, usize>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockFileStorage {
    pub fn new() -> Self {
        Self {
            base_url: "https://mock-storage.example.com".to_string(),
            transfer_delay: Duration::ZERO,
            polls_until_ready: 1,
            index_error: None,
            fail_pre_sign: false,
            fail_transfer: false,
            missing_file_uid: false,
            uploads: Arc::new(Mutex::new(Vec::new())),
            pre_sign_count: Arc::new(Mutex::new(0)),
            register_count: Arc::new(Mutex::new(0)),
            status_polls: Arc::new(Mutex::new(HashMap::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Each transfer sleeps this long before completing.
    pub fn with_transfer_delay(mut self, delay: Duration) -> Self {
        self.transfer_delay = delay;
        self
    }

    /// Number of status polls before a file reports 100% progress.
    pub fn with_polls_until_ready(mut self, polls: usize) -> Self {
        self.polls_until_ready = polls.max(1);
        self
    }

    pub fn with_index_error(mut self, message: &str) -> Self {
        self.index_error = Some(message.to_string());
        self
    }

    pub fn with_failing_pre_sign(mut self) -> Self {
        self.fail_pre_sign = true;
        self
    }

    pub fn with_failing_transfer(mut self) -> Self {
        self.fail_transfer = true;
        self
    }

    pub fn with_missing_file_uid(mut self) -> Self {
        self.missing_file_uid = true;
        self
    }

    /// Completed transfers as `(upload_url, byte_len)`.
    pub fn get_uploads(&self) -> Vec<(String, usize)> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn get_pre_sign_count(&self) -> usize {
        *self.pre_sign_count.lock().unwrap()
    }

    pub fn get_register_count(&self) -> usize {
        *self.register_count.lock().unwrap()
    }

    /// Highest number of transfers observed running at the same time.
    pub fn get_max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Default for MockFileStorage {
    fn default() -> Self {
        Self::new()
    }
}

struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl FileStorage for MockFileStorage {
    async fn pre_sign(&self, file_name: &str) -> Result<PresignedSlot> {
        *self.pre_sign_count.lock().unwrap() += 1;

        if self.fail_pre_sign {
            return Err(Error::Provider("pre-sign rejected (code 500)".to_string()));
        }

        Ok(PresignedSlot {
            upload_url: format!("{}/upload/{}", self.base_url, file_name),
            object_url: format!("{}/objects/{}", self.base_url, file_name),
            cdn_url: format!("{}/cdn/{}", self.base_url, file_name),
        })
    }

    async fn transfer(&self, slot: &PresignedSlot, data: Vec<u8>, _content_type: &str) -> Result<()> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlightGuard(self.in_flight.clone());
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.transfer_delay.is_zero() {
            tokio::time::sleep(self.transfer_delay).await;
        }

        if self.fail_transfer {
            return Err(Error::Provider("upload returned status 403".to_string()));
        }

        self.uploads
            .lock()
            .unwrap()
            .push((slot.upload_url.clone(), data.len()));
        Ok(())
    }

    async fn register(&self, file: &FileInfo) -> Result<RegisteredFile> {
        let mut count = self.register_count.lock().unwrap();
        *count += 1;

        Ok(RegisteredFile {
            file_name: file.file_name.clone(),
            file_type: file.file_type.clone(),
            file_size: file.file_size,
            file_uid: if self.missing_file_uid {
                String::new()
            } else {
                format!("file-{}", *count)
            },
            file_tokens: 0,
            file_chunks: 0,
        })
    }

    async fn file_status(&self, file_uid: &str) -> Result<FileStatus> {
        let polls = {
            let mut status_polls = self.status_polls.lock().unwrap();
            let polls = status_polls.entry(file_uid.to_string()).or_insert(0);
            *polls += 1;
            *polls
        };

        if let Some(message) = &self.index_error {
            return Ok(FileStatus {
                file_uid: file_uid.to_string(),
                error_message: message.clone(),
                ..FileStatus::default()
            });
        }

        let ready = polls >= self.polls_until_ready;
        Ok(FileStatus {
            file_uid: file_uid.to_string(),
            index_state: if ready { 3 } else { 1 },
            index_desc: (if ready { "done" } else { "indexing" }).to_string(),
            error_message: String::new(),
            file_tokens: if ready { 85 } else { 0 },
            file_chunks: if ready { 1 } else { 0 },
            index_progress: if ready { 100 } else { 50 },
        })
    }
}
