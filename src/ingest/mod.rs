//! Image ingestion into Monica file storage
//!
//! Every image of a message is uploaded in parallel on a semaphore-gated task
//! group. One deadline covers the whole batch; images that fail for any reason
//! are dropped and only counted.

pub mod data_uri;
pub mod mime;

use crate::provider::{FileInfo, FileStatus, FileStorage};
use crate::{Error, IngestError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_retry::strategy::FixedInterval;
use tokio_retry::RetryIf;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;
pub const MAX_CONCURRENT_UPLOADS: usize = 5;
pub const IMAGE_UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);
pub const FILE_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq)]
pub struct UploadLimits {
    pub max_concurrent: usize,
    pub timeout: Duration,
    pub poll_interval: Duration,
    pub max_image_size: usize,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_concurrent: MAX_CONCURRENT_UPLOADS,
            timeout: IMAGE_UPLOAD_TIMEOUT,
            poll_interval: FILE_POLL_INTERVAL,
            max_image_size: MAX_IMAGE_SIZE,
        }
    }
}

pub type ImageOutcome = std::result::Result<FileInfo, IngestError>;

/// Per-image outcomes of one batch, in completion order.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub outcomes: Vec<ImageOutcome>,
    pub succeeded: usize,
    pub failed: usize,
}

impl IngestReport {
    /// Descriptors of the images that made it, ready to attach to an item.
    pub fn into_file_infos(self) -> Vec<FileInfo> {
        self.outcomes
            .into_iter()
            .filter_map(|outcome| outcome.ok())
            .filter(|file| !file.file_uid.is_empty())
            .collect()
    }
}

#[derive(Clone)]
pub struct ImageIngestor {
    storage: Arc<dyn FileStorage>,
    limits: UploadLimits,
}

impl ImageIngestor {
    pub fn new(storage: Arc<dyn FileStorage>, limits: UploadLimits) -> Self {
        Self { storage, limits }
    }

    /// Upload a batch of image references under a fresh deadline.
    pub async fn ingest(&self, references: &[String]) -> IngestReport {
        self.ingest_until(references, Instant::now() + self.limits.timeout)
            .await
    }

    /// Upload a batch of image references; anything unfinished at `deadline` fails.
    pub async fn ingest_until(&self, references: &[String], deadline: Instant) -> IngestReport {
        if references.is_empty() {
            return IngestReport::default();
        }

        let semaphore = Arc::new(Semaphore::new(self.limits.max_concurrent.max(1)));
        let succeeded = Arc::new(AtomicUsize::new(0));
        let failed = Arc::new(AtomicUsize::new(0));
        let mut join_set = JoinSet::new();

        for (index, reference) in references.iter().cloned().enumerate() {
            let storage = self.storage.clone();
            let semaphore = semaphore.clone();
            let limits = self.limits.clone();
            let succeeded = succeeded.clone();
            let failed = failed.clone();

            join_set.spawn(async move {
                let outcome = match tokio::time::timeout_at(
                    deadline,
                    upload_with_permit(storage.as_ref(), &semaphore, &reference, &limits),
                )
                .await
                {
                    Ok(outcome) => outcome,
                    Err(_) => Err(IngestError::DeadlineExceeded),
                };

                match &outcome {
                    Ok(file) => {
                        succeeded.fetch_add(1, Ordering::Relaxed);
                        debug!("Image {} uploaded as {}", index + 1, file.file_uid);
                    }
                    Err(e) => {
                        failed.fetch_add(1, Ordering::Relaxed);
                        error!(
                            "Failed to upload image {} ({}): {}",
                            index + 1,
                            describe_reference(&reference),
                            e
                        );
                    }
                }
                outcome
            });
        }

        let mut outcomes = Vec::with_capacity(references.len());
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    failed.fetch_add(1, Ordering::Relaxed);
                    outcomes.push(Err(IngestError::Task(e.to_string())));
                }
            }
        }

        let succeeded = succeeded.load(Ordering::Relaxed);
        let failed = failed.load(Ordering::Relaxed);
        if failed > 0 {
            warn!(
                "Image upload finished: {} succeeded, {} failed, {} total",
                succeeded,
                failed,
                references.len()
            );
        } else {
            info!("All {} images uploaded", succeeded);
        }

        IngestReport {
            outcomes,
            succeeded,
            failed,
        }
    }
}

/// Short description of a reference for logs; data URIs are far too long to print.
fn describe_reference(reference: &str) -> String {
    match reference.split_once(',') {
        Some((header, payload)) => format!("{} ({} chars)", header, payload.len()),
        None => reference.chars().take(64).collect(),
    }
}

async fn upload_with_permit(
    storage: &dyn FileStorage,
    semaphore: &Semaphore,
    reference: &str,
    limits: &UploadLimits,
) -> ImageOutcome {
    let _permit = semaphore
        .acquire()
        .await
        .map_err(|e| IngestError::Task(e.to_string()))?;
    upload_image(storage, reference, limits).await
}

/// Run the pre-sign → transfer → register → confirm protocol for one image.
pub async fn upload_image(
    storage: &dyn FileStorage,
    reference: &str,
    limits: &UploadLimits,
) -> ImageOutcome {
    let image = data_uri::decode_image(reference, limits.max_image_size)?;
    let file_ext = mime::extension_for(&image.mime);
    let file_name = format!("{}.{}", Uuid::new_v4(), file_ext);
    let file_size = image.bytes.len() as u64;

    let slot = storage
        .pre_sign(&file_name)
        .await
        .map_err(IngestError::PreSign)?;

    storage
        .transfer(&slot, image.bytes, &image.mime)
        .await
        .map_err(IngestError::Transfer)?;

    let mut file = FileInfo {
        url: slot.cdn_url,
        file_url: slot.object_url.clone(),
        object_url: slot.object_url,
        parse: true,
        file_name,
        file_size,
        file_type: image.mime,
        file_ext: file_ext.to_string(),
        use_full_text: true,
        ..FileInfo::default()
    };

    let registered = storage
        .register(&file)
        .await
        .map_err(IngestError::Registration)?;
    if registered.file_uid.is_empty() {
        return Err(IngestError::Registration(Error::Provider(
            "registration returned an empty file uid".to_string(),
        )));
    }
    file.file_uid = registered.file_uid;
    file.file_tokens = registered.file_tokens;
    file.file_chunks = registered.file_chunks;

    let status = wait_until_indexed(storage, &file.file_uid, limits.poll_interval).await?;
    file.file_tokens = status.file_tokens;
    file.file_chunks = status.file_chunks;

    Ok(file)
}

enum Poll {
    Pending,
    Failed(IngestError),
}

/// Poll file status until indexing completes; only the caller's deadline stops a pending file.
async fn wait_until_indexed(
    storage: &dyn FileStorage,
    file_uid: &str,
    interval: Duration,
) -> Result<FileStatus, IngestError> {
    RetryIf::spawn(
        FixedInterval::new(interval),
        || async move {
            let status = storage
                .file_status(file_uid)
                .await
                .map_err(|e| Poll::Failed(IngestError::Status(e)))?;

            if !status.error_message.is_empty() {
                return Err(Poll::Failed(IngestError::Indexing(status.error_message)));
            }
            if status.index_progress >= 100 {
                Ok(status)
            } else {
                debug!("File {} indexing at {}%", file_uid, status.index_progress);
                Err(Poll::Pending)
            }
        },
        |e: &Poll| matches!(e, Poll::Pending),
    )
    .await
    .map_err(|e| match e {
        Poll::Pending => IngestError::DeadlineExceeded,
        Poll::Failed(err) => err,
    })
}
