//! devicefarm: submit builds to AWS Device Farm.
//!
//! This crate takes a compiled application and its test package, uploads
//! both to a Device Farm project, and schedules a test run against a named
//! device pool, returning the ARN of the created run.
//!
//! # Architecture
//!
//! The main components are:
//!
//! - **Client**: Capability interface over the remote service ([`client`])
//! - **Resolver**: Maps project and device pool names to ARNs ([`resolver`])
//! - **Upload**: Turns local files into service uploads ([`upload`])
//! - **Request**: Builds a run request typed by the test package ([`request`])
//! - **Scheduler**: Schedules the run exactly once ([`scheduler`])
//! - **Server**: Runs the whole submission for one build variant ([`server`])
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::time::Duration;
//!
//! use devicefarm::client::cli::AwsCliClient;
//! use devicefarm::config::load_config;
//! use devicefarm::server::DeviceFarmServer;
//! use devicefarm::upload::{DeviceFarmUploader, HttpTransfer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config(Path::new("devicefarm.toml"))?;
//!     let client = AwsCliClient::new(&config.aws);
//!     let uploader = DeviceFarmUploader::new(
//!         &client,
//!         HttpTransfer::new(Duration::from_secs(600))?,
//!         &config.upload,
//!     );
//!
//!     let result = DeviceFarmServer::new(&config, &client, &uploader)
//!         .submit("debug", Path::new("test.apk"), Path::new("app.apk"))
//!         .await?;
//!     println!("Scheduled {}", result.arn());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod model;
pub mod request;
pub mod resolver;
pub mod scheduler;
pub mod server;
pub mod upload;

// Re-export commonly used types
pub use client::{ClientError, DeviceFarmClient};
pub use config::{Config, load_config};
pub use model::{RunRequest, RunResult, TestType, UploadKind};
pub use server::{DeviceFarmServer, SubmitError};
pub use upload::ArtifactUploader;
