//! Configuration schema definitions for devicefarm.
//!
//! This module defines all configuration types that can be deserialized from
//! TOML configuration files. The schema uses serde for serialization and a
//! tagged enum for test type selection.
//!
//! # Schema Overview
//!
//! ```text
//! Config (root)
//! ├── DeviceFarmSettings     - Project, device pool, billing, run naming
//! ├── AwsConfig              - How the AWS CLI is invoked
//! ├── UploadConfig           - Upload processing poll settings
//! ├── TestConfig             - Tagged enum selecting the test type
//! │   ├── Instrumentation    - Android instrumentation (host-supplied package)
//! │   ├── Uiautomator        - UI Automator package
//! │   ├── Calabash           - Calabash features zip
//! │   ├── AppiumJava*        - Appium Java (JUnit / TestNG) package
//! │   ├── AppiumPython       - Appium Python package
//! │   ├── Fuzz               - Built-in fuzz test
//! │   └── Explorer           - Built-in app explorer
//! └── DeviceStateConfig      - Radios, location, extra data, auxiliary apps
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::model::{Location, Radios, TestType};

/// Root configuration structure.
///
/// # Example
///
/// ```
/// use devicefarm::config::Config;
///
/// let config: Config = toml::from_str(r#"
///     [devicefarm]
///     project_name = "MyProject"
///
///     [test]
///     type = "instrumentation"
/// "#).unwrap();
///
/// assert_eq!(config.devicefarm.device_pool, "Top Devices");
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Project, device pool and run settings.
    pub devicefarm: DeviceFarmSettings,

    /// AWS CLI invocation settings (optional, has defaults).
    #[serde(default)]
    pub aws: AwsConfig,

    /// Upload processing settings (optional, has defaults).
    #[serde(default)]
    pub upload: UploadConfig,

    /// The test to run. Defaults to instrumentation with no filter.
    #[serde(default)]
    pub test: TestConfig,

    /// Device state applied before the run starts.
    #[serde(default)]
    pub device_state: DeviceStateConfig,
}

/// Core submission settings.
///
/// # Example
///
/// ```toml
/// [devicefarm]
/// project_name = "MyProject"
/// device_pool = "Top Devices"
/// use_unmetered_devices = true
/// run_name = "{project}: {app} ({variant})"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceFarmSettings {
    /// Name of the project to submit into. Must already exist.
    ///
    /// Names are not unique on the service; the first project listed with
    /// this name is used.
    pub project_name: String,

    /// Name of the device pool to run against, within the project.
    ///
    /// Default: `"Top Devices"`
    #[serde(default = "default_device_pool")]
    pub device_pool: String,

    /// Bill the run against unmetered device slots.
    ///
    /// Default: false
    #[serde(default)]
    pub use_unmetered_devices: bool,

    /// Template for the run name.
    ///
    /// Placeholders: `{app}` (application file name), `{variant}` (build
    /// variant label), `{project}` (project name).
    ///
    /// Default: `"{app} ({variant})"`
    #[serde(default = "default_run_name")]
    pub run_name: String,
}

fn default_device_pool() -> String {
    "Top Devices".to_string()
}

fn default_run_name() -> String {
    "{app} ({variant})".to_string()
}

impl DeviceFarmSettings {
    /// Expands the run name template.
    ///
    /// Placeholders are substituted in a single pass, so values containing
    /// placeholder text are inserted literally.
    pub fn run_name_for(&self, app: &str, variant: &str) -> String {
        let mut name = String::with_capacity(self.run_name.len() + app.len());
        let mut rest = self.run_name.as_str();

        while let Some(open) = rest.find('{') {
            name.push_str(&rest[..open]);
            let tail = &rest[open..];
            let value = [
                ("{app}", app),
                ("{variant}", variant),
                ("{project}", self.project_name.as_str()),
            ]
            .into_iter()
            .find(|(placeholder, _)| tail.starts_with(placeholder));

            match value {
                Some((placeholder, value)) => {
                    name.push_str(value);
                    rest = &tail[placeholder.len()..];
                }
                None => {
                    name.push('{');
                    rest = &tail[1..];
                }
            }
        }

        name.push_str(rest);
        name
    }
}

/// How the AWS CLI is invoked.
///
/// # Defaults
///
/// | Field | Default |
/// |-------|---------|
/// | `command` | `"aws"` |
/// | `region` | `"us-west-2"` |
/// | `profile` | None (CLI default chain) |
/// | `timeout_secs` | 300 |
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AwsConfig {
    /// Base command, split shell-style. Extra global flags may be included.
    #[serde(default = "default_aws_command")]
    pub command: String,

    /// Service region. Device Farm is only offered in `us-west-2`.
    #[serde(default = "default_region")]
    pub region: String,

    /// Named credentials profile.
    pub profile: Option<String>,

    /// Timeout for a single CLI call in seconds.
    #[serde(default = "default_aws_timeout")]
    pub timeout_secs: u64,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            command: default_aws_command(),
            region: default_region(),
            profile: None,
            timeout_secs: default_aws_timeout(),
        }
    }
}

fn default_aws_command() -> String {
    "aws".to_string()
}

fn default_region() -> String {
    "us-west-2".to_string()
}

fn default_aws_timeout() -> u64 {
    300
}

/// Upload processing settings.
///
/// After the file is transferred the service validates it asynchronously;
/// the uploader polls until processing finishes.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadConfig {
    /// Delay between status checks in seconds.
    ///
    /// Default: 5
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Give up waiting for processing after this many seconds.
    ///
    /// Default: 900 (15 minutes)
    #[serde(default = "default_upload_timeout")]
    pub timeout_secs: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            timeout_secs: default_upload_timeout(),
        }
    }
}

fn default_poll_interval() -> u64 {
    5
}

fn default_upload_timeout() -> u64 {
    900
}

/// Test configuration selecting which test technology the run uses.
///
/// # Example
///
/// ```toml
/// # Android instrumentation, package supplied by the build
/// [test]
/// type = "instrumentation"
/// filter = "com.example.SmokeTest"
///
/// # Appium with a separately built package
/// [test]
/// type = "appium-java-junit"
/// package = "build/appium-tests.zip"
///
/// # Built-in fuzzing, no package
/// [test]
/// type = "fuzz"
/// event_count = 1000
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TestConfig {
    /// Android instrumentation. The test package comes from the build.
    Instrumentation(InstrumentationTestConfig),

    /// UI Automator tests.
    Uiautomator(UiAutomatorTestConfig),

    /// Calabash features.
    Calabash(CalabashTestConfig),

    /// Appium Java tests run with JUnit.
    AppiumJavaJunit(AppiumTestConfig),

    /// Appium Java tests run with TestNG.
    AppiumJavaTestng(AppiumTestConfig),

    /// Appium Python tests.
    AppiumPython(AppiumTestConfig),

    /// Built-in fuzz test sending random UI events.
    Fuzz(FuzzTestConfig),

    /// Built-in explorer crawling the app's UI.
    Explorer(ExplorerTestConfig),
}

impl Default for TestConfig {
    fn default() -> Self {
        TestConfig::Instrumentation(InstrumentationTestConfig::default())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InstrumentationTestConfig {
    /// Restrict the run to matching test classes or methods.
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UiAutomatorTestConfig {
    /// Path to the UI Automator jar.
    pub package: PathBuf,

    pub filter: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CalabashTestConfig {
    /// Path to the zipped `features` directory.
    pub features: PathBuf,

    /// Cucumber tag expression.
    pub tags: Option<String>,

    /// Cucumber profile.
    pub profile: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppiumTestConfig {
    /// Path to the zipped test package.
    pub package: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FuzzTestConfig {
    /// Number of UI events to send.
    ///
    /// Default: 6000
    #[serde(default = "default_event_count")]
    pub event_count: u32,

    /// Delay between events in milliseconds.
    ///
    /// Default: 50
    #[serde(default = "default_event_throttle")]
    pub event_throttle: u32,

    /// Seed for reproducible event sequences.
    pub seed: Option<u64>,
}

impl Default for FuzzTestConfig {
    fn default() -> Self {
        Self {
            event_count: default_event_count(),
            event_throttle: default_event_throttle(),
            seed: None,
        }
    }
}

fn default_event_count() -> u32 {
    6000
}

fn default_event_throttle() -> u32 {
    50
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ExplorerTestConfig {
    /// Credentials the explorer enters on a login screen.
    pub username: Option<String>,
    pub password: Option<String>,
}

impl TestConfig {
    /// Test type the run will declare.
    pub fn test_type(&self) -> TestType {
        match self {
            TestConfig::Instrumentation(_) => TestType::Instrumentation,
            TestConfig::Uiautomator(_) => TestType::Uiautomator,
            TestConfig::Calabash(_) => TestType::Calabash,
            TestConfig::AppiumJavaJunit(_) => TestType::AppiumJavaJunit,
            TestConfig::AppiumJavaTestng(_) => TestType::AppiumJavaTestng,
            TestConfig::AppiumPython(_) => TestType::AppiumPython,
            TestConfig::Fuzz(_) => TestType::BuiltinFuzz,
            TestConfig::Explorer(_) => TestType::BuiltinExplorer,
        }
    }

    /// Config name of this test type, as written in `type = "..."`.
    pub fn name(&self) -> &'static str {
        match self {
            TestConfig::Instrumentation(_) => "instrumentation",
            TestConfig::Uiautomator(_) => "uiautomator",
            TestConfig::Calabash(_) => "calabash",
            TestConfig::AppiumJavaJunit(_) => "appium-java-junit",
            TestConfig::AppiumJavaTestng(_) => "appium-java-testng",
            TestConfig::AppiumPython(_) => "appium-python",
            TestConfig::Fuzz(_) => "fuzz",
            TestConfig::Explorer(_) => "explorer",
        }
    }

    /// Test package path configured here, if the test type carries its own.
    ///
    /// Instrumentation packages are produced by the build and handed to
    /// the submission directly, so they return `None`, as do built-in tests.
    pub fn package(&self) -> Option<&Path> {
        match self {
            TestConfig::Uiautomator(c) => Some(&c.package),
            TestConfig::Calabash(c) => Some(&c.features),
            TestConfig::AppiumJavaJunit(c)
            | TestConfig::AppiumJavaTestng(c)
            | TestConfig::AppiumPython(c) => Some(&c.package),
            TestConfig::Instrumentation(_) | TestConfig::Fuzz(_) | TestConfig::Explorer(_) => None,
        }
    }

    /// Whether the run needs the test package produced by the build.
    pub fn uses_build_package(&self) -> bool {
        matches!(self, TestConfig::Instrumentation(_))
    }

    pub fn filter(&self) -> Option<&str> {
        match self {
            TestConfig::Instrumentation(c) => c.filter.as_deref(),
            TestConfig::Uiautomator(c) => c.filter.as_deref(),
            _ => None,
        }
    }

    /// Test parameters passed to the service with the run request.
    pub fn parameters(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        match self {
            TestConfig::Calabash(c) => {
                if let Some(tags) = &c.tags {
                    params.insert("tags".to_string(), tags.clone());
                }
                if let Some(profile) = &c.profile {
                    params.insert("profile".to_string(), profile.clone());
                }
            }
            TestConfig::Fuzz(c) => {
                params.insert("event_count".to_string(), c.event_count.to_string());
                params.insert("throttle".to_string(), c.event_throttle.to_string());
                if let Some(seed) = c.seed {
                    params.insert("seed".to_string(), seed.to_string());
                }
            }
            TestConfig::Explorer(c) => {
                if let Some(username) = &c.username {
                    params.insert("username".to_string(), username.clone());
                }
                if let Some(password) = &c.password {
                    params.insert("password".to_string(), password.clone());
                }
            }
            TestConfig::Instrumentation(_)
            | TestConfig::Uiautomator(_)
            | TestConfig::AppiumJavaJunit(_)
            | TestConfig::AppiumJavaTestng(_)
            | TestConfig::AppiumPython(_) => {}
        }
        params
    }
}

/// Device state applied before the run starts.
///
/// # Example
///
/// ```toml
/// [device_state]
/// extra_data_zip = "fixtures/data.zip"
/// auxiliary_apps = ["build/helper.apk"]
///
/// [device_state.radios]
/// wifi = true
/// bluetooth = false
/// gps = true
/// nfc = false
///
/// [device_state.location]
/// latitude = 47.6204
/// longitude = -122.3491
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DeviceStateConfig {
    /// Zip extracted onto the device's external storage before the run.
    pub extra_data_zip: Option<PathBuf>,

    /// Additional apps installed alongside the app under test.
    #[serde(default)]
    pub auxiliary_apps: Vec<PathBuf>,

    /// Network shaping profile ARN.
    pub network_profile_arn: Option<String>,

    /// Radio states. Default: all on.
    #[serde(default)]
    pub radios: Radios,

    /// Simulated location. Default: Seattle.
    #[serde(default)]
    pub location: Location,
}
