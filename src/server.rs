//! Run submission.
//!
//! [`DeviceFarmServer`] ties the pieces together for one build variant:
//!
//! ```text
//!   config names ──► IdentityResolver ──► project ARN, device pool ARN
//!                                              │
//!   app file ──────► ArtifactUploader ──► app upload
//!   test package ──► ArtifactUploader ──► test upload (kind from test type)
//!   device state ──► ArtifactUploader ──► extra data / auxiliary apps
//!                                              │
//!                                              ▼
//!                                      RunRequestBuilder ──► RunRequest
//!                                                               │
//!                                                               ▼
//!                                                         RunScheduler ──► RunResult
//! ```
//!
//! Each step runs only after the previous one succeeded and the first error
//! ends the submission. Exactly one run is scheduled per successful call and
//! none when any step fails. Uploads made before a failure are left in place.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::client::DeviceFarmClient;
use crate::config::{Config, expand_path};
use crate::model::{RunResult, Upload, UploadKind};
use crate::request::{BuildError, RunRequestBuilder, TestSource};
use crate::resolver::{IdentityResolver, ResolveError};
use crate::scheduler::{RunScheduler, SchedulingError};
use crate::upload::{ArtifactUploader, UploadError};

/// Any failure of a submission, classified by the step that failed.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// Project or device pool resolution failed.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// An artifact could not be uploaded.
    #[error(transparent)]
    Upload(#[from] UploadError),

    /// The run request could not be built.
    #[error(transparent)]
    Build(#[from] BuildError),

    /// The service did not schedule the run.
    #[error(transparent)]
    Scheduling(#[from] SchedulingError),
}

/// Submits test runs for build variants.
///
/// Holds only borrowed, immutable collaborators. Everything resolved during
/// a submission lives in locals of [`submit`](Self::submit), so separate
/// submissions share no state.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use std::time::Duration;
///
/// use devicefarm::client::cli::AwsCliClient;
/// use devicefarm::config::load_config;
/// use devicefarm::server::DeviceFarmServer;
/// use devicefarm::upload::{DeviceFarmUploader, HttpTransfer};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = load_config(Path::new("devicefarm.toml"))?;
///     let client = AwsCliClient::new(&config.aws);
///     let transfer = HttpTransfer::new(Duration::from_secs(600))?;
///     let uploader = DeviceFarmUploader::new(&client, transfer, &config.upload);
///
///     let server = DeviceFarmServer::new(&config, &client, &uploader);
///     let result = server
///         .submit(
///             "debug",
///             Path::new("app/build/outputs/apk/androidTest/debug/app-debug-androidTest.apk"),
///             Path::new("app/build/outputs/apk/debug/app-debug.apk"),
///         )
///         .await?;
///
///     println!("{}", result.arn());
///     Ok(())
/// }
/// ```
pub struct DeviceFarmServer<'a, C: ?Sized, U: ?Sized> {
    config: &'a Config,
    client: &'a C,
    uploader: &'a U,
}

impl<'a, C, U> DeviceFarmServer<'a, C, U>
where
    C: DeviceFarmClient + ?Sized,
    U: ArtifactUploader + ?Sized,
{
    pub fn new(config: &'a Config, client: &'a C, uploader: &'a U) -> Self {
        Self {
            config,
            client,
            uploader,
        }
    }

    /// Submits one run for `variant`.
    ///
    /// `test_package` is the package produced by the build. It is used when
    /// the configured test type is instrumentation; test types that carry
    /// their own package in the config use that instead, and built-in tests
    /// upload none.
    ///
    /// # Errors
    ///
    /// Returns the first failing step's error, classified as a
    /// [`SubmitError`] variant. No run is scheduled in that case.
    pub async fn submit(
        &self,
        variant: &str,
        test_package: &Path,
        app: &Path,
    ) -> Result<RunResult, SubmitError> {
        let settings = &self.config.devicefarm;
        info!(
            "Submitting {} to Device Farm via {}",
            variant,
            self.client.name()
        );

        let resolver = IdentityResolver::new(self.client);
        let project = resolver.resolve_project(&settings.project_name).await?;
        let pool = resolver
            .resolve_device_pool(&project.arn, &settings.device_pool)
            .await?;
        info!(
            "Using project '{}' and device pool '{}'",
            project.name, pool.name
        );

        let app_upload = self
            .uploader
            .upload(app, &project.arn, UploadKind::for_application(app))
            .await?;

        let test_type = self.config.test.test_type();
        let test_upload = match test_type.package_kind() {
            Some(kind) => {
                let file = self.test_package_path(test_package);
                Some(self.uploader.upload(&file, &project.arn, kind).await?)
            }
            None => {
                debug!("{} is a built-in test; no package uploaded", test_type);
                None
            }
        };
        let test_source = match &test_upload {
            Some(upload) => TestSource::Package(upload),
            None => TestSource::BuiltIn(test_type),
        };

        let app_name = file_name(app);
        let mut builder =
            RunRequestBuilder::from_config(self.config, settings.run_name_for(&app_name, variant));
        for upload in self.upload_device_state(&project.arn).await? {
            builder = match upload.kind {
                UploadKind::ExternalData => builder.extra_data(upload.arn),
                _ => builder.auxiliary_app(upload.arn),
            };
        }

        let request = builder.build(&project.arn, &pool.arn, &app_upload.arn, test_source)?;
        let result = RunScheduler::new(self.client).schedule_run(&request).await?;

        if let Some(url) = result.run.console_url(&self.config.aws.region) {
            info!("View the {} run in the Device Farm console: {}", variant, url);
        }

        Ok(result)
    }

    /// Test package file for the configured test type.
    fn test_package_path(&self, build_output: &Path) -> PathBuf {
        match self.config.test.package() {
            Some(configured) => {
                debug!(
                    "{} test uses configured package; ignoring {}",
                    self.config.test.name(),
                    build_output.display()
                );
                expand_path(configured)
            }
            None => build_output.to_path_buf(),
        }
    }

    /// Uploads the configured extra data zip and auxiliary apps.
    async fn upload_device_state(&self, project_arn: &str) -> Result<Vec<Upload>, SubmitError> {
        let state = &self.config.device_state;
        let mut uploads = Vec::new();

        if let Some(zip) = &state.extra_data_zip {
            let upload = self
                .uploader
                .upload(&expand_path(zip), project_arn, UploadKind::ExternalData)
                .await?;
            uploads.push(upload);
        }

        for app in &state.auxiliary_apps {
            let path = expand_path(app);
            let kind = UploadKind::for_application(&path);
            uploads.push(self.uploader.upload(&path, project_arn, kind).await?);
        }

        Ok(uploads)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
