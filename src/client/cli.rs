//! Device Farm client backed by the AWS command line interface.
//!
//! Every operation runs `aws devicefarm <operation> ... --output json` as a
//! child process and parses its stdout. Credentials, retries of throttled
//! calls, and pagination are all handled by the CLI itself, so the listings
//! returned here are complete snapshots.
//!
//! # Command Protocol
//!
//! | Operation | Invocation |
//! |-----------|------------|
//! | list projects | `devicefarm list-projects` |
//! | list device pools | `devicefarm list-device-pools --arn <project>` |
//! | create upload | `devicefarm create-upload --project-arn <p> --name <n> --type <kind> --content-type application/octet-stream` |
//! | get upload | `devicefarm get-upload --arn <upload>` |
//! | schedule run | `devicefarm schedule-run --cli-input-json <request>` |
//!
//! The base command is configurable, which allows pointing the client at a
//! local emulator:
//!
//! ```toml
//! [aws]
//! command = "aws --endpoint-url http://localhost:4566"
//! ```

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{ClientError, ClientResult, DeviceFarmClient};
use crate::config::AwsConfig;
use crate::model::{
    DevicePool, Project, RunRequest, RunResult, UPLOAD_CONTENT_TYPE, Upload, UploadKind,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListProjectsOutput {
    #[serde(default)]
    projects: Vec<Project>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDevicePoolsOutput {
    #[serde(default)]
    device_pools: Vec<DevicePool>,
}

#[derive(Deserialize)]
struct UploadOutput {
    upload: Upload,
}

/// Client that drives the `aws` executable.
pub struct AwsCliClient {
    /// Program and leading arguments, split from the configured command.
    base: Vec<String>,
    region: String,
    profile: Option<String>,
    timeout_secs: u64,
}

impl AwsCliClient {
    pub fn new(config: &AwsConfig) -> Self {
        let base = shell_words::split(&config.command)
            .unwrap_or_else(|_| vec![config.command.clone()]);

        Self {
            base,
            region: config.region.clone(),
            profile: config.profile.clone(),
            timeout_secs: config.timeout_secs,
        }
    }

    /// Full argument vector for one operation, program first.
    fn command_parts(&self, operation: &str, args: &[&str]) -> Vec<String> {
        let mut parts = self.base.clone();
        parts.push("devicefarm".to_string());
        parts.push(operation.to_string());
        parts.extend(args.iter().map(|a| a.to_string()));
        parts.push("--region".to_string());
        parts.push(self.region.clone());
        if let Some(profile) = &self.profile {
            parts.push("--profile".to_string());
            parts.push(profile.clone());
        }
        parts.push("--output".to_string());
        parts.push("json".to_string());
        parts
    }

    /// Runs one operation and decodes its JSON output.
    async fn invoke<T: DeserializeOwned>(&self, operation: &str, args: &[&str]) -> ClientResult<T> {
        if self.base.is_empty() {
            return Err(ClientError::Exec {
                operation: operation.to_string(),
                message: "empty AWS CLI command".to_string(),
            });
        }

        let parts = self.command_parts(operation, args);
        let (program, rest) = (&parts[0], &parts[1..]);

        debug!("Running: {} {}", program, rest.join(" "));

        let mut cmd = tokio::process::Command::new(program);
        cmd.args(rest);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let output = tokio::time::timeout(Duration::from_secs(self.timeout_secs), cmd.output())
            .await
            .map_err(|_| ClientError::Timeout {
                operation: operation.to_string(),
                secs: self.timeout_secs,
            })?
            .map_err(|e| ClientError::Exec {
                operation: operation.to_string(),
                message: format!("{}: {}", program, e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let message = if stderr.is_empty() {
                format!("exited with {}", output.status)
            } else {
                stderr
            };
            return Err(ClientError::Service {
                operation: operation.to_string(),
                message,
            });
        }

        serde_json::from_slice(&output.stdout).map_err(|source| ClientError::Parse {
            operation: operation.to_string(),
            source,
        })
    }
}

#[async_trait]
impl DeviceFarmClient for AwsCliClient {
    async fn list_projects(&self) -> ClientResult<Vec<Project>> {
        let output: ListProjectsOutput = self.invoke("list-projects", &[]).await?;
        Ok(output.projects)
    }

    async fn list_device_pools(&self, project_arn: &str) -> ClientResult<Vec<DevicePool>> {
        let output: ListDevicePoolsOutput = self
            .invoke("list-device-pools", &["--arn", project_arn])
            .await?;
        Ok(output.device_pools)
    }

    async fn create_upload(
        &self,
        project_arn: &str,
        name: &str,
        kind: UploadKind,
    ) -> ClientResult<Upload> {
        let output: UploadOutput = self
            .invoke(
                "create-upload",
                &[
                    "--project-arn",
                    project_arn,
                    "--name",
                    name,
                    "--type",
                    kind.as_str(),
                    "--content-type",
                    UPLOAD_CONTENT_TYPE,
                ],
            )
            .await?;
        Ok(output.upload)
    }

    async fn get_upload(&self, arn: &str) -> ClientResult<Upload> {
        let output: UploadOutput = self.invoke("get-upload", &["--arn", arn]).await?;
        Ok(output.upload)
    }

    async fn schedule_run(&self, request: &RunRequest) -> ClientResult<RunResult> {
        let input = serde_json::to_string(request).map_err(|source| ClientError::Parse {
            operation: "schedule-run".to_string(),
            source,
        })?;
        self.invoke("schedule-run", &["--cli-input-json", &input])
            .await
    }

    fn name(&self) -> &str {
        "aws-cli"
    }
}
