//! Name-to-ARN resolution for projects and device pools.
//!
//! Users configure projects and device pools by name; run requests need
//! their ARNs. Resolution lists the whole collection from the service and
//! scans it client-side for the first entry whose name matches exactly
//! (case-sensitive). The service does not enforce unique names, so when
//! several entries share a name the first one listed wins.

use std::fmt;

use tracing::{debug, warn};

use crate::client::{ClientError, DeviceFarmClient};
use crate::model::{DevicePool, Project};

/// Result type for resolution.
pub type ResolveResult<T> = Result<T, ResolveError>;

/// What is being resolved, for error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Project,
    DevicePool,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Project => f.write_str("project"),
            ResourceKind::DevicePool => f.write_str("device pool"),
        }
    }
}

/// Errors that can occur while resolving names.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// No listed entry carries the requested name.
    #[error("No {kind} named '{name}' (available: {})", format_names(.available))]
    NotFound {
        kind: ResourceKind,
        name: String,
        available: Vec<String>,
    },

    /// The listing call itself failed.
    #[error("Failed to list {kind}s: {source}")]
    Listing {
        kind: ResourceKind,
        #[source]
        source: ClientError,
    },
}

fn format_names(names: &[String]) -> String {
    if names.is_empty() {
        "none".to_string()
    } else {
        names
            .iter()
            .map(|n| format!("'{}'", n))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Returns the first item whose name equals `name`.
///
/// Logs a warning when more than one item matches.
fn first_named<'a, T>(items: &'a [T], name: &str, name_of: impl Fn(&T) -> &str) -> Option<&'a T> {
    let mut matches = items.iter().filter(|item| name_of(*item) == name);
    let first = matches.next()?;
    let extra = matches.count();
    if extra > 0 {
        warn!(
            "{} entries are named '{}'; using the first one listed",
            extra + 1,
            name
        );
    }
    Some(first)
}

/// Resolves configured names to service identities.
///
/// Holds no state besides the borrowed client, so resolving the same name
/// twice against an unchanged listing yields the same result.
///
/// # Example
///
/// ```no_run
/// use devicefarm::client::cli::AwsCliClient;
/// use devicefarm::config::AwsConfig;
/// use devicefarm::resolver::IdentityResolver;
///
/// # async fn example() -> anyhow::Result<()> {
/// let client = AwsCliClient::new(&AwsConfig::default());
/// let resolver = IdentityResolver::new(&client);
///
/// let project = resolver.resolve_project("MyProject").await?;
/// let pool = resolver.resolve_device_pool(&project.arn, "Top Devices").await?;
/// println!("{} / {}", project.arn, pool.arn);
/// # Ok(())
/// # }
/// ```
pub struct IdentityResolver<'a, C: ?Sized> {
    client: &'a C,
}

impl<'a, C> IdentityResolver<'a, C>
where
    C: DeviceFarmClient + ?Sized,
{
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Finds the first project named `name`.
    ///
    /// # Errors
    ///
    /// - `ResolveError::NotFound` - no project has that name
    /// - `ResolveError::Listing` - the project listing failed
    pub async fn resolve_project(&self, name: &str) -> ResolveResult<Project> {
        let projects = self
            .client
            .list_projects()
            .await
            .map_err(|source| ResolveError::Listing {
                kind: ResourceKind::Project,
                source,
            })?;

        let project = first_named(&projects, name, |p| p.name.as_str()).ok_or_else(|| {
            ResolveError::NotFound {
                kind: ResourceKind::Project,
                name: name.to_string(),
                available: projects.iter().map(|p| p.name.clone()).collect(),
            }
        })?;

        debug!("Resolved project '{}' to {}", name, project.arn);
        Ok(project.clone())
    }

    /// Finds the first device pool named `name` under `project_arn`.
    ///
    /// # Errors
    ///
    /// - `ResolveError::NotFound` - no pool in the project has that name
    /// - `ResolveError::Listing` - the device pool listing failed
    pub async fn resolve_device_pool(
        &self,
        project_arn: &str,
        name: &str,
    ) -> ResolveResult<DevicePool> {
        let pools = self
            .client
            .list_device_pools(project_arn)
            .await
            .map_err(|source| ResolveError::Listing {
                kind: ResourceKind::DevicePool,
                source,
            })?;

        let pool = first_named(&pools, name, |p| p.name.as_str()).ok_or_else(|| {
            ResolveError::NotFound {
                kind: ResourceKind::DevicePool,
                name: name.to_string(),
                available: pools.iter().map(|p| p.name.clone()).collect(),
            }
        })?;

        debug!("Resolved device pool '{}' to {}", name, pool.arn);
        Ok(pool.clone())
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::client::ClientResult;
    use crate::model::{RunRequest, RunResult, Upload, UploadKind};

    /// Serves fixed listings; everything else is unreachable in these tests.
    struct ListingClient {
        projects: Vec<Project>,
        pools: Vec<DevicePool>,
        fail_listing: bool,
    }

    impl ListingClient {
        fn new(projects: Vec<Project>, pools: Vec<DevicePool>) -> Self {
            Self {
                projects,
                pools,
                fail_listing: false,
            }
        }

        fn failing() -> Self {
            Self {
                projects: Vec::new(),
                pools: Vec::new(),
                fail_listing: true,
            }
        }
    }

    #[async_trait]
    impl DeviceFarmClient for ListingClient {
        async fn list_projects(&self) -> ClientResult<Vec<Project>> {
            if self.fail_listing {
                return Err(ClientError::Service {
                    operation: "list-projects".to_string(),
                    message: "AccessDeniedException".to_string(),
                });
            }
            Ok(self.projects.clone())
        }

        async fn list_device_pools(&self, _project_arn: &str) -> ClientResult<Vec<DevicePool>> {
            Ok(self.pools.clone())
        }

        async fn create_upload(&self, _: &str, _: &str, _: UploadKind) -> ClientResult<Upload> {
            unreachable!("resolver never uploads")
        }

        async fn get_upload(&self, _: &str) -> ClientResult<Upload> {
            unreachable!("resolver never uploads")
        }

        async fn schedule_run(&self, _: &RunRequest) -> ClientResult<RunResult> {
            unreachable!("resolver never schedules")
        }

        fn name(&self) -> &str {
            "listing"
        }
    }

    fn project(name: &str, arn: &str) -> Project {
        Project {
            arn: arn.to_string(),
            name: name.to_string(),
        }
    }

    fn pool(name: &str, arn: &str) -> DevicePool {
        DevicePool {
            arn: arn.to_string(),
            name: name.to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn test_resolve_single_match() {
        let client = ListingClient::new(
            vec![project("Other", "arn:other"), project("MyProject", "1234")],
            vec![],
        );
        let resolver = IdentityResolver::new(&client);

        let resolved = resolver.resolve_project("MyProject").await.unwrap();
        assert_eq!(resolved.arn, "1234");
    }

    #[tokio::test]
    async fn test_resolve_duplicate_names_takes_first() {
        let client = ListingClient::new(
            vec![project("MyProject", "first"), project("MyProject", "second")],
            vec![pool("Top Devices", "pool-a"), pool("Top Devices", "pool-b")],
        );
        let resolver = IdentityResolver::new(&client);

        assert_eq!(resolver.resolve_project("MyProject").await.unwrap().arn, "first");
        assert_eq!(
            resolver
                .resolve_device_pool("first", "Top Devices")
                .await
                .unwrap()
                .arn,
            "pool-a"
        );
    }

    #[tokio::test]
    async fn test_resolve_is_case_sensitive() {
        let client = ListingClient::new(vec![project("MyProject", "1234")], vec![]);
        let resolver = IdentityResolver::new(&client);

        let err = resolver.resolve_project("myproject").await.unwrap_err();
        match err {
            ResolveError::NotFound {
                kind,
                name,
                available,
            } => {
                assert_eq!(kind, ResourceKind::Project);
                assert_eq!(name, "myproject");
                assert_eq!(available, vec!["MyProject".to_string()]);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_resolve_pool_not_found() {
        let client = ListingClient::new(vec![], vec![pool("Top Devices", "1234")]);
        let resolver = IdentityResolver::new(&client);

        let err = resolver
            .resolve_device_pool("1234", "Pixel Phones")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ResolveError::NotFound {
                kind: ResourceKind::DevicePool,
                ..
            }
        ));
        assert!(err.to_string().contains("'Top Devices'"));
    }

    #[tokio::test]
    async fn test_resolve_empty_listing_message() {
        let client = ListingClient::new(vec![], vec![]);
        let resolver = IdentityResolver::new(&client);

        let err = resolver.resolve_project("MyProject").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "No project named 'MyProject' (available: none)"
        );
    }

    #[tokio::test]
    async fn test_listing_failure_is_not_not_found() {
        let client = ListingClient::failing();
        let resolver = IdentityResolver::new(&client);

        let err = resolver.resolve_project("MyProject").await.unwrap_err();
        assert!(matches!(
            err,
            ResolveError::Listing {
                kind: ResourceKind::Project,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_resolution_is_repeatable() {
        let client = ListingClient::new(
            vec![project("MyProject", "1234")],
            vec![pool("Top Devices", "5678")],
        );
        let resolver = IdentityResolver::new(&client);

        let first = resolver.resolve_project("MyProject").await.unwrap();
        let second = resolver.resolve_project("MyProject").await.unwrap();
        assert_eq!(first, second);

        let pool_a = resolver.resolve_device_pool("1234", "Top Devices").await.unwrap();
        let pool_b = resolver.resolve_device_pool("1234", "Top Devices").await.unwrap();
        assert_eq!(pool_a, pool_b);
    }
}
