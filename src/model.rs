//! Device Farm domain types.
//!
//! These mirror the shapes the remote service exchanges as JSON: projects,
//! device pools, uploads, the `ScheduleRun` request and the run it creates.
//! Field names are serialized in the service's camelCase form and enum values
//! in its SCREAMING_SNAKE_CASE form, so the types can be passed straight to
//! the remote client.
//!
//! All values here are request scoped. They are produced while a single
//! submission runs and dropped when it returns.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// A named grouping on the service under which device pools and runs exist.
///
/// Project names are not unique on the service; the ARN is authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub arn: String,
    pub name: String,
}

/// A named set of devices a run executes against, scoped to a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevicePool {
    pub arn: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Classification of an uploaded binary.
///
/// The kind decides how the service processes the upload and which test
/// type a run referencing it must declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UploadKind {
    AndroidApp,
    IosApp,
    InstrumentationTestPackage,
    UiautomatorTestPackage,
    CalabashTestPackage,
    AppiumJavaJunitTestPackage,
    AppiumJavaTestngTestPackage,
    AppiumPythonTestPackage,
    XctestTestPackage,
    ExternalData,
}

impl UploadKind {
    /// Returns the wire form of this kind, e.g. `ANDROID_APP`.
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadKind::AndroidApp => "ANDROID_APP",
            UploadKind::IosApp => "IOS_APP",
            UploadKind::InstrumentationTestPackage => "INSTRUMENTATION_TEST_PACKAGE",
            UploadKind::UiautomatorTestPackage => "UIAUTOMATOR_TEST_PACKAGE",
            UploadKind::CalabashTestPackage => "CALABASH_TEST_PACKAGE",
            UploadKind::AppiumJavaJunitTestPackage => "APPIUM_JAVA_JUNIT_TEST_PACKAGE",
            UploadKind::AppiumJavaTestngTestPackage => "APPIUM_JAVA_TESTNG_TEST_PACKAGE",
            UploadKind::AppiumPythonTestPackage => "APPIUM_PYTHON_TEST_PACKAGE",
            UploadKind::XctestTestPackage => "XCTEST_TEST_PACKAGE",
            UploadKind::ExternalData => "EXTERNAL_DATA",
        }
    }

    /// Picks the application kind for a file by its extension.
    ///
    /// `.ipa` files are iOS apps; everything else is treated as an Android
    /// package.
    pub fn for_application(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("ipa") => UploadKind::IosApp,
            _ => UploadKind::AndroidApp,
        }
    }
}

impl fmt::Display for UploadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content type declared when an upload is created and sent with its bytes.
///
/// The pre-signed URL is signed for this value, so both sides must agree.
pub const UPLOAD_CONTENT_TYPE: &str = "application/octet-stream";

/// Processing state of an upload on the service side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UploadStatus {
    Initialized,
    Processing,
    Succeeded,
    Failed,
}

/// An artifact uploaded to the service.
///
/// Freshly created uploads carry a pre-signed `url` the file is transferred
/// to. The ARN is what run requests reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Upload {
    pub arn: String,

    #[serde(default)]
    pub name: String,

    #[serde(rename = "type")]
    pub kind: UploadKind,

    pub status: UploadStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Service-extracted metadata (package name, SDK levels, ...), raw JSON text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,

    /// Processing failure detail, set when `status` is `FAILED`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// The test technology a run executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestType {
    Instrumentation,
    Uiautomator,
    Calabash,
    AppiumJavaJunit,
    AppiumJavaTestng,
    AppiumPython,
    Xctest,
    BuiltinFuzz,
    BuiltinExplorer,
}

impl TestType {
    /// Canonical string form used on the wire, e.g. `INSTRUMENTATION`.
    pub fn as_str(&self) -> &'static str {
        match self {
            TestType::Instrumentation => "INSTRUMENTATION",
            TestType::Uiautomator => "UIAUTOMATOR",
            TestType::Calabash => "CALABASH",
            TestType::AppiumJavaJunit => "APPIUM_JAVA_JUNIT",
            TestType::AppiumJavaTestng => "APPIUM_JAVA_TESTNG",
            TestType::AppiumPython => "APPIUM_PYTHON",
            TestType::Xctest => "XCTEST",
            TestType::BuiltinFuzz => "BUILTIN_FUZZ",
            TestType::BuiltinExplorer => "BUILTIN_EXPLORER",
        }
    }

    /// Upload kind of the package this test type runs, or `None` for the
    /// service's built-in tests which need no package.
    pub fn package_kind(&self) -> Option<UploadKind> {
        match self {
            TestType::Instrumentation => Some(UploadKind::InstrumentationTestPackage),
            TestType::Uiautomator => Some(UploadKind::UiautomatorTestPackage),
            TestType::Calabash => Some(UploadKind::CalabashTestPackage),
            TestType::AppiumJavaJunit => Some(UploadKind::AppiumJavaJunitTestPackage),
            TestType::AppiumJavaTestng => Some(UploadKind::AppiumJavaTestngTestPackage),
            TestType::AppiumPython => Some(UploadKind::AppiumPythonTestPackage),
            TestType::Xctest => Some(UploadKind::XctestTestPackage),
            TestType::BuiltinFuzz | TestType::BuiltinExplorer => None,
        }
    }

    pub fn is_builtin(&self) -> bool {
        self.package_kind().is_none()
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Radio states the devices are set to before the run starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Radios {
    pub wifi: bool,
    pub bluetooth: bool,
    pub nfc: bool,
    pub gps: bool,
}

impl Default for Radios {
    fn default() -> Self {
        Self {
            wifi: true,
            bluetooth: true,
            nfc: true,
            gps: true,
        }
    }
}

/// Simulated device location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for Location {
    fn default() -> Self {
        // Seattle
        Self {
            latitude: 47.6204,
            longitude: -122.3491,
        }
    }
}

/// How device minutes are billed for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingMethod {
    Metered,
    Unmetered,
}

/// Test portion of a run request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRunTest {
    #[serde(rename = "type")]
    pub test_type: TestType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_package_arn: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, String>,
}

/// Device state and billing portion of a run request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRunConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_data_package_arn: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_profile_arn: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radios: Option<Radios>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub auxiliary_apps: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_method: Option<BillingMethod>,
}

/// A fully specified request to schedule one run.
///
/// Serializes to the service's `ScheduleRun` input document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    pub project_arn: String,
    pub app_arn: String,
    pub device_pool_arn: String,
    pub name: String,
    pub test: ScheduleRunTest,
    pub configuration: ScheduleRunConfiguration,
}

/// A run as reported by the service right after scheduling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    pub arn: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

impl Run {
    /// Splits the resource part of the ARN (`...:<project-id>/<run-id>`).
    fn composite_key(&self) -> Option<(&str, &str)> {
        let resource = self.arn.rsplit(':').next()?;
        let (project, run) = resource.split_once('/')?;
        if project.is_empty() || run.is_empty() {
            return None;
        }
        Some((project, run))
    }

    /// Project half of the run's composite key.
    pub fn project_id(&self) -> Option<&str> {
        self.composite_key().map(|(project, _)| project)
    }

    /// Run half of the run's composite key.
    pub fn run_id(&self) -> Option<&str> {
        self.composite_key().map(|(_, run)| run)
    }

    /// Link to the run in the service console.
    ///
    /// # Example
    ///
    /// ```
    /// use devicefarm::model::Run;
    ///
    /// let run = Run {
    ///     arn: "arn:aws:devicefarm:us-west-2:123456789012:run:abc/def".into(),
    ///     name: None,
    ///     status: None,
    ///     platform: None,
    /// };
    /// assert_eq!(
    ///     run.console_url("us-west-2").unwrap(),
    ///     "https://console.aws.amazon.com/devicefarm/home?region=us-west-2#/projects/abc/runs/def"
    /// );
    /// ```
    pub fn console_url(&self, region: &str) -> Option<String> {
        let (project, run) = self.composite_key()?;
        Some(format!(
            "https://console.aws.amazon.com/devicefarm/home?region={}#/projects/{}/runs/{}",
            region, project, run
        ))
    }
}

/// Output of a successful scheduling call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    pub run: Run,
}

impl RunResult {
    /// ARN of the created run.
    pub fn arn(&self) -> &str {
        &self.run.arn
    }
}
