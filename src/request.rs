//! Run request construction.
//!
//! A run request must declare the test type that matches the package it
//! references: an instrumentation package has to be scheduled as an
//! `INSTRUMENTATION` run, an Appium JUnit package as `APPIUM_JAVA_JUNIT`, and
//! so on. A mismatch makes the service reject or mis-run the test, so the
//! type is always derived from the uploaded package's kind through an
//! exhaustive match, never from a default.

use std::collections::BTreeMap;

use crate::config::Config;
use crate::model::{
    BillingMethod, Location, Radios, RunRequest, ScheduleRunConfiguration, ScheduleRunTest,
    TestType, Upload, UploadKind,
};

/// Errors that can occur while building a run request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// The artifact kind has no run configuration mapping.
    #[error("Unsupported test kind: {0}")]
    UnsupportedTestKind(String),

    /// A required identity was empty.
    #[error("Missing {0} ARN")]
    MissingIdentity(&'static str),
}

/// Maps an uploaded test package's kind to the test type that runs it.
///
/// # Errors
///
/// Returns `BuildError::UnsupportedTestKind` for kinds that are not test
/// packages (applications, extra data).
///
/// # Example
///
/// ```
/// use devicefarm::model::{TestType, UploadKind};
/// use devicefarm::request::test_type_for_package;
///
/// assert_eq!(
///     test_type_for_package(UploadKind::InstrumentationTestPackage),
///     Ok(TestType::Instrumentation)
/// );
/// assert!(test_type_for_package(UploadKind::AndroidApp).is_err());
/// ```
pub fn test_type_for_package(kind: UploadKind) -> Result<TestType, BuildError> {
    match kind {
        UploadKind::InstrumentationTestPackage => Ok(TestType::Instrumentation),
        UploadKind::UiautomatorTestPackage => Ok(TestType::Uiautomator),
        UploadKind::CalabashTestPackage => Ok(TestType::Calabash),
        UploadKind::AppiumJavaJunitTestPackage => Ok(TestType::AppiumJavaJunit),
        UploadKind::AppiumJavaTestngTestPackage => Ok(TestType::AppiumJavaTestng),
        UploadKind::AppiumPythonTestPackage => Ok(TestType::AppiumPython),
        UploadKind::XctestTestPackage => Ok(TestType::Xctest),
        UploadKind::AndroidApp | UploadKind::IosApp | UploadKind::ExternalData => {
            Err(BuildError::UnsupportedTestKind(kind.as_str().to_string()))
        }
    }
}

/// Where the run's test comes from.
#[derive(Debug, Clone, Copy)]
pub enum TestSource<'a> {
    /// An uploaded test package; its kind decides the test type.
    Package(&'a Upload),

    /// A service built-in test that needs no package.
    BuiltIn(TestType),
}

/// Builds [`RunRequest`]s.
///
/// Holds the per-configuration parts of a request (name, filter, test
/// parameters, device state); the identities are supplied per call.
///
/// # Example
///
/// ```
/// use devicefarm::model::{TestType, Upload, UploadKind, UploadStatus};
/// use devicefarm::request::{RunRequestBuilder, TestSource};
///
/// let package = Upload {
///     arn: "arn:instrumentation/test/pkg".into(),
///     name: "app-debug-androidTest.apk".into(),
///     kind: UploadKind::InstrumentationTestPackage,
///     status: UploadStatus::Succeeded,
///     url: None,
///     metadata: None,
///     message: None,
/// };
///
/// let request = RunRequestBuilder::new("app-debug.apk (debug)")
///     .build("arn:project", "arn:pool", "arn:android/app", TestSource::Package(&package))
///     .unwrap();
///
/// assert_eq!(request.test.test_type, TestType::Instrumentation);
/// assert_eq!(request.test.test_package_arn.as_deref(), Some("arn:instrumentation/test/pkg"));
/// ```
#[derive(Debug, Clone)]
pub struct RunRequestBuilder {
    name: String,
    filter: Option<String>,
    parameters: BTreeMap<String, String>,
    configuration: ScheduleRunConfiguration,
}

impl RunRequestBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filter: None,
            parameters: BTreeMap::new(),
            configuration: ScheduleRunConfiguration::default(),
        }
    }

    /// Builder seeded from the loaded configuration.
    ///
    /// Extra data and auxiliary app ARNs are only known after uploading, so
    /// they are added separately.
    pub fn from_config(config: &Config, name: impl Into<String>) -> Self {
        let state = &config.device_state;
        let billing = if config.devicefarm.use_unmetered_devices {
            BillingMethod::Unmetered
        } else {
            BillingMethod::Metered
        };

        let mut builder = Self::new(name)
            .parameters(config.test.parameters())
            .radios(state.radios)
            .location(state.location)
            .billing_method(billing);

        if let Some(filter) = config.test.filter() {
            builder = builder.filter(filter);
        }
        if let Some(arn) = &state.network_profile_arn {
            builder = builder.network_profile(arn.clone());
        }
        builder
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn parameters(mut self, parameters: BTreeMap<String, String>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn radios(mut self, radios: Radios) -> Self {
        self.configuration.radios = Some(radios);
        self
    }

    pub fn location(mut self, location: Location) -> Self {
        self.configuration.location = Some(location);
        self
    }

    pub fn billing_method(mut self, billing: BillingMethod) -> Self {
        self.configuration.billing_method = Some(billing);
        self
    }

    pub fn network_profile(mut self, arn: impl Into<String>) -> Self {
        self.configuration.network_profile_arn = Some(arn.into());
        self
    }

    pub fn extra_data(mut self, arn: impl Into<String>) -> Self {
        self.configuration.extra_data_package_arn = Some(arn.into());
        self
    }

    pub fn auxiliary_app(mut self, arn: impl Into<String>) -> Self {
        self.configuration.auxiliary_apps.push(arn.into());
        self
    }

    /// Builds the request for one run.
    ///
    /// # Errors
    ///
    /// - `BuildError::UnsupportedTestKind` - the package kind has no test
    ///   type, or a built-in source names a type that requires a package
    /// - `BuildError::MissingIdentity` - an identity argument is empty
    pub fn build(
        &self,
        project_arn: &str,
        device_pool_arn: &str,
        app_arn: &str,
        test: TestSource<'_>,
    ) -> Result<RunRequest, BuildError> {
        for (label, value) in [
            ("project", project_arn),
            ("device pool", device_pool_arn),
            ("app", app_arn),
        ] {
            if value.is_empty() {
                return Err(BuildError::MissingIdentity(label));
            }
        }

        let (test_type, test_package_arn) = match test {
            TestSource::Package(upload) => {
                if upload.arn.is_empty() {
                    return Err(BuildError::MissingIdentity("test package"));
                }
                (test_type_for_package(upload.kind)?, Some(upload.arn.clone()))
            }
            TestSource::BuiltIn(test_type) if test_type.is_builtin() => (test_type, None),
            TestSource::BuiltIn(test_type) => {
                return Err(BuildError::UnsupportedTestKind(format!(
                    "{} requires a test package",
                    test_type
                )));
            }
        };

        Ok(RunRequest {
            project_arn: project_arn.to_string(),
            app_arn: app_arn.to_string(),
            device_pool_arn: device_pool_arn.to_string(),
            name: self.name.clone(),
            test: ScheduleRunTest {
                test_type,
                test_package_arn,
                filter: self.filter.clone(),
                parameters: self.parameters.clone(),
            },
            configuration: self.configuration.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_str;
    use crate::model::UploadStatus;

    fn package(arn: &str, name: &str, kind: UploadKind) -> Upload {
        Upload {
            arn: arn.to_string(),
            name: name.to_string(),
            kind,
            status: UploadStatus::Succeeded,
            url: None,
            metadata: None,
            message: None,
        }
    }

    #[test]
    fn test_instrumentation_type_ignores_file_names() {
        let builder = RunRequestBuilder::new("run");
        for name in ["tests.apk", "appium.zip", "INSTRUMENTATION", ""] {
            let pkg = package("arn:pkg", name, UploadKind::InstrumentationTestPackage);
            let request = builder
                .build("arn:p", "arn:d", "arn:a", TestSource::Package(&pkg))
                .unwrap();
            assert_eq!(request.test.test_type.as_str(), "INSTRUMENTATION");
            assert_eq!(
                request.test.test_type.as_str(),
                TestType::Instrumentation.as_str()
            );
        }
    }

    #[test]
    fn test_every_package_kind_maps_to_its_package_type() {
        for test_type in [
            TestType::Instrumentation,
            TestType::Uiautomator,
            TestType::Calabash,
            TestType::AppiumJavaJunit,
            TestType::AppiumJavaTestng,
            TestType::AppiumPython,
            TestType::Xctest,
        ] {
            let kind = test_type.package_kind().unwrap();
            assert_eq!(test_type_for_package(kind), Ok(test_type));
        }
    }

    #[test]
    fn test_application_as_test_package_is_unsupported() {
        let pkg = package("arn:app", "app.apk", UploadKind::AndroidApp);
        let err = RunRequestBuilder::new("run")
            .build("arn:p", "arn:d", "arn:a", TestSource::Package(&pkg))
            .unwrap_err();
        assert_eq!(err, BuildError::UnsupportedTestKind("ANDROID_APP".to_string()));
    }

    #[test]
    fn test_builtin_source_requires_builtin_type() {
        let builder = RunRequestBuilder::new("run");

        let fuzz = builder
            .build("arn:p", "arn:d", "arn:a", TestSource::BuiltIn(TestType::BuiltinFuzz))
            .unwrap();
        assert_eq!(fuzz.test.test_type, TestType::BuiltinFuzz);
        assert!(fuzz.test.test_package_arn.is_none());

        let err = builder
            .build(
                "arn:p",
                "arn:d",
                "arn:a",
                TestSource::BuiltIn(TestType::Instrumentation),
            )
            .unwrap_err();
        assert!(matches!(err, BuildError::UnsupportedTestKind(_)));
    }

    #[test]
    fn test_empty_identity_rejected() {
        let pkg = package("arn:pkg", "t.apk", UploadKind::InstrumentationTestPackage);
        let err = RunRequestBuilder::new("run")
            .build("arn:p", "", "arn:a", TestSource::Package(&pkg))
            .unwrap_err();
        assert_eq!(err, BuildError::MissingIdentity("device pool"));
    }

    #[test]
    fn test_builder_from_config() {
        let config = load_config_str(
            r#"
            [devicefarm]
            project_name = "MyProject"
            use_unmetered_devices = true

            [test]
            type = "instrumentation"
            filter = "com.example.SmokeTest"

            [device_state]
            network_profile_arn = "arn:profile"

            [device_state.radios]
            bluetooth = false
            "#,
        )
        .unwrap();

        let pkg = package("arn:pkg", "t.apk", UploadKind::InstrumentationTestPackage);
        let request = RunRequestBuilder::from_config(&config, "app.apk (debug)")
            .extra_data("arn:data")
            .auxiliary_app("arn:helper")
            .build("arn:p", "arn:d", "arn:a", TestSource::Package(&pkg))
            .unwrap();

        assert_eq!(request.name, "app.apk (debug)");
        assert_eq!(request.test.filter.as_deref(), Some("com.example.SmokeTest"));
        let cfg = &request.configuration;
        assert_eq!(cfg.billing_method, Some(BillingMethod::Unmetered));
        assert_eq!(cfg.network_profile_arn.as_deref(), Some("arn:profile"));
        assert_eq!(cfg.extra_data_package_arn.as_deref(), Some("arn:data"));
        assert_eq!(cfg.auxiliary_apps, vec!["arn:helper".to_string()]);
        let radios = cfg.radios.unwrap();
        assert!(radios.wifi);
        assert!(!radios.bluetooth);
    }
}
