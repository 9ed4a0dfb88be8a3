//! Artifact uploads.
//!
//! The submission core only needs the [`ArtifactUploader`] capability: given
//! a local file, a project and a kind, produce an [`Upload`] whose ARN a run
//! request can reference. [`DeviceFarmUploader`] is the concrete
//! implementation used by the binary:
//!
//! 1. `create_upload` registers the artifact and returns a pre-signed URL
//! 2. the file is transferred to that URL through a [`Transfer`]
//! 3. `get_upload` is polled until the service has processed the file
//!
//! Uploads are inert until a run references them, so a failed submission
//! leaves its uploads behind rather than cleaning them up.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use crate::client::{ClientError, DeviceFarmClient};
use crate::config::UploadConfig;
use crate::model::{UPLOAD_CONTENT_TYPE, Upload, UploadKind, UploadStatus};

/// Result type for upload operations.
pub type UploadResult<T> = Result<T, UploadError>;

/// Errors that can occur while uploading an artifact.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// The local file does not exist or is not a regular file.
    #[error("Artifact not found: {}", .0.display())]
    MissingFile(PathBuf),

    /// A service call made during the upload failed.
    #[error("Upload of {name} failed: {source}")]
    Client {
        name: String,
        #[source]
        source: ClientError,
    },

    /// Transferring the file bytes to the pre-signed URL failed.
    #[error("Transfer of {name} failed: {message}")]
    Transfer { name: String, message: String },

    /// The service finished processing and rejected the artifact.
    #[error("Device Farm rejected {name} ({kind}): {message}")]
    Rejected {
        name: String,
        kind: UploadKind,
        message: String,
    },

    /// Processing did not finish in time.
    #[error("Upload of {name} still {status:?} after {secs}s")]
    Timeout {
        name: String,
        status: UploadStatus,
        secs: u64,
    },
}

/// Capability interface for turning local files into service uploads.
#[async_trait]
pub trait ArtifactUploader: Send + Sync {
    /// Uploads `file` into the project as an artifact of `kind`.
    ///
    /// Returns only once the upload is usable by a run request.
    async fn upload(
        &self,
        file: &Path,
        project_arn: &str,
        kind: UploadKind,
    ) -> UploadResult<Upload>;
}

/// Moves file bytes to a pre-signed upload URL.
#[async_trait]
pub trait Transfer: Send + Sync {
    async fn put(&self, url: &str, file: &Path) -> Result<(), String>;
}

/// [`Transfer`] over HTTPS.
pub struct HttpTransfer {
    client: reqwest::Client,
}

impl HttpTransfer {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transfer for HttpTransfer {
    async fn put(&self, url: &str, file: &Path) -> Result<(), String> {
        let handle = tokio::fs::File::open(file)
            .await
            .map_err(|e| format!("failed to open {}: {}", file.display(), e))?;
        let len = handle
            .metadata()
            .await
            .map_err(|e| format!("failed to stat {}: {}", file.display(), e))?
            .len();

        // Pre-signed PUTs reject chunked bodies, so the length is sent up front.
        let response = self
            .client
            .put(url)
            .header(reqwest::header::CONTENT_TYPE, UPLOAD_CONTENT_TYPE)
            .header(reqwest::header::CONTENT_LENGTH, len)
            .body(reqwest::Body::wrap_stream(ReaderStream::new(handle)))
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(format!("HTTP {}: {}", status, text.trim()));
        }

        Ok(())
    }
}

/// Uploader that creates, transfers, and waits on Device Farm uploads.
pub struct DeviceFarmUploader<'a, C: ?Sized, T> {
    client: &'a C,
    transfer: T,
    poll_interval: Duration,
    timeout: Duration,
}

impl<'a, C, T> DeviceFarmUploader<'a, C, T>
where
    C: DeviceFarmClient + ?Sized,
    T: Transfer,
{
    pub fn new(client: &'a C, transfer: T, config: &UploadConfig) -> Self {
        Self {
            client,
            transfer,
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Polls until the service finishes processing the upload.
    async fn wait_for_processing(&self, mut upload: Upload) -> UploadResult<Upload> {
        let start = Instant::now();

        loop {
            match upload.status {
                UploadStatus::Succeeded => return Ok(upload),
                UploadStatus::Failed => {
                    return Err(UploadError::Rejected {
                        message: upload
                            .message
                            .clone()
                            .unwrap_or_else(|| "no reason given".to_string()),
                        name: upload.name,
                        kind: upload.kind,
                    });
                }
                UploadStatus::Initialized | UploadStatus::Processing => {}
            }

            if start.elapsed() >= self.timeout {
                return Err(UploadError::Timeout {
                    name: upload.name,
                    status: upload.status,
                    secs: self.timeout.as_secs(),
                });
            }

            debug!("Upload {} is {:?}, waiting", upload.name, upload.status);
            tokio::time::sleep(self.poll_interval).await;

            let name = upload.name.clone();
            upload = self
                .client
                .get_upload(&upload.arn)
                .await
                .map_err(|source| UploadError::Client { name, source })?;
        }
    }
}

#[async_trait]
impl<C, T> ArtifactUploader for DeviceFarmUploader<'_, C, T>
where
    C: DeviceFarmClient + ?Sized,
    T: Transfer,
{
    async fn upload(
        &self,
        file: &Path,
        project_arn: &str,
        kind: UploadKind,
    ) -> UploadResult<Upload> {
        if !tokio::fs::metadata(file).await.is_ok_and(|m| m.is_file()) {
            return Err(UploadError::MissingFile(file.to_path_buf()));
        }

        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file.to_string_lossy().to_string());

        info!("Uploading {} as {}", name, kind);

        let upload = self
            .client
            .create_upload(project_arn, &name, kind)
            .await
            .map_err(|source| UploadError::Client {
                name: name.clone(),
                source,
            })?;

        let url = upload.url.as_deref().ok_or_else(|| UploadError::Transfer {
            name: name.clone(),
            message: "service returned no upload URL".to_string(),
        })?;

        self.transfer
            .put(url, file)
            .await
            .map_err(|message| UploadError::Transfer {
                name: name.clone(),
                message,
            })?;

        let upload = self.wait_for_processing(upload).await?;
        info!("Uploaded {} -> {}", name, upload.arn);
        Ok(upload)
    }
}
