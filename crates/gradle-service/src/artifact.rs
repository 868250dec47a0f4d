use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::ArtifactStrategy;
use crate::errors::ArtifactError;

/// Build files checked in order, kotlin dsl first.
pub const DESCRIPTORS: [&str; 2] = ["build.gradle.kts", "build.gradle"];
pub const ARTIFACT_TASK: &str = "artifact";

/// Location of the built archive inside the build output.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ArtifactPath(String);

impl ArtifactPath {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for ArtifactPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ArtifactPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskOutput {
    pub stdout: String,
    pub stderr: String,
}

/// What a resolver may ask of a finished build.
#[async_trait]
pub trait ArtifactProbe: Send + Sync {
    /// Contents of `path` relative to the build root, `None` when absent.
    async fn read_file(&self, path: &str) -> eyre::Result<Option<String>>;

    /// Runs a gradle task in quiet mode against the bound source tree.
    async fn query_task(&self, task: &str) -> eyre::Result<TaskOutput>;
}

#[async_trait]
pub trait ArtifactResolver: Send + Sync {
    async fn resolve(&self, probe: &dyn ArtifactProbe) -> Result<ArtifactPath, ArtifactError>;
}

pub type DynArtifactResolver = Arc<dyn ArtifactResolver>;

impl ArtifactStrategy {
    pub fn resolver(&self, workdir: &str) -> DynArtifactResolver {
        match self {
            ArtifactStrategy::Descriptor => Arc::new(DescriptorResolver::default()),
            ArtifactStrategy::TaskQuery => Arc::new(TaskQueryResolver::new(libs_root(workdir))),
        }
    }
}

/// `<workdir>/build/libs/`, where gradle leaves jars inside the build container.
pub fn libs_root(workdir: &str) -> String {
    format!("{}/build/libs/", workdir.trim_end_matches('/'))
}

/// Reads `description` and `version` from the project's gradle build file.
#[derive(Clone, Debug)]
pub struct DescriptorResolver {
    descriptors: Vec<String>,
}

impl Default for DescriptorResolver {
    fn default() -> Self {
        Self {
            descriptors: DESCRIPTORS.iter().map(|d| d.to_string()).collect(),
        }
    }
}

#[async_trait]
impl ArtifactResolver for DescriptorResolver {
    async fn resolve(&self, probe: &dyn ArtifactProbe) -> Result<ArtifactPath, ArtifactError> {
        for descriptor in &self.descriptors {
            let contents = probe
                .read_file(descriptor)
                .await
                .map_err(|source| ArtifactError::Read {
                    path: descriptor.clone(),
                    source,
                })?;

            if let Some(contents) = contents {
                tracing::debug!(descriptor = descriptor.as_str(), "parsing gradle build file");
                return parse_descriptor(descriptor, &contents);
            }
        }

        Err(ArtifactError::DescriptorNotFound(self.descriptors.clone()))
    }
}

static DESCRIPTION: Lazy<[Regex; 2]> = Lazy::new(|| quoted_assignment("description"));
static VERSION: Lazy<[Regex; 2]> = Lazy::new(|| quoted_assignment("version"));

fn quoted_assignment(field: &str) -> [Regex; 2] {
    ['\'', '"'].map(|quote| {
        Regex::new(&format!(r#"(?m)^\s*{field}\s*=\s*{quote}([^{quote}\n]*){quote}"#))
            .expect("assignment pattern is valid")
    })
}

/// Single quotes win over double quotes unless the single-quoted value is empty.
fn scan_field<'a>(
    patterns: &[Regex; 2],
    contents: &'a str,
    field: &'static str,
    descriptor: &str,
) -> Result<&'a str, ArtifactError> {
    let mut matched = None;
    for pattern in patterns {
        if let Some(value) = pattern.captures(contents).and_then(|c| c.get(1)) {
            if !value.as_str().is_empty() {
                return Ok(value.as_str());
            }
            matched = Some("");
        }
    }

    matched.ok_or_else(|| ArtifactError::Parse {
        field,
        path: descriptor.to_string(),
    })
}

pub fn parse_descriptor(descriptor: &str, contents: &str) -> Result<ArtifactPath, ArtifactError> {
    let description = scan_field(&DESCRIPTION, contents, "description", descriptor)?;
    let version = scan_field(&VERSION, contents, "version", descriptor)?;

    let path = format!("build/libs/{description}-{version}.jar");
    if description.is_empty() || version.is_empty() {
        return Err(ArtifactError::Malformed(path));
    }

    Ok(ArtifactPath(path))
}

/// Asks the build for its artifact name through a dedicated gradle task.
#[derive(Clone, Debug)]
pub struct TaskQueryResolver {
    task: String,
    root: String,
}

impl TaskQueryResolver {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            task: ARTIFACT_TASK.into(),
            root: root.into(),
        }
    }

    pub fn with_task(mut self, task: impl Into<String>) -> Self {
        self.task = task.into();
        self
    }

    fn compose(&self, output: TaskOutput) -> Result<ArtifactPath, ArtifactError> {
        if !output.stderr.trim().is_empty() {
            return Err(ArtifactError::QueryFailed {
                task: self.task.clone(),
                diagnostic: output.stderr.trim_end().to_string(),
            });
        }

        let name = output.stdout.strip_suffix('\n').unwrap_or(&output.stdout);
        if name.trim().is_empty() {
            return Err(ArtifactError::EmptyArtifact {
                task: self.task.clone(),
            });
        }

        Ok(ArtifactPath(format!("{}{}", self.root, name)))
    }
}

#[async_trait]
impl ArtifactResolver for TaskQueryResolver {
    async fn resolve(&self, probe: &dyn ArtifactProbe) -> Result<ArtifactPath, ArtifactError> {
        let output = probe
            .query_task(&self.task)
            .await
            .map_err(|e| ArtifactError::QueryFailed {
                task: self.task.clone(),
                diagnostic: format!("{e:#}"),
            })?;

        self.compose(output)
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    use super::*;

    #[derive(Default)]
    struct StaticProbe {
        files: HashMap<String, String>,
        output: Option<TaskOutput>,
    }

    impl StaticProbe {
        fn with_file(mut self, path: &str, contents: &str) -> Self {
            self.files.insert(path.into(), contents.into());
            self
        }

        fn with_stdout(mut self, stdout: &str) -> Self {
            self.output = Some(TaskOutput {
                stdout: stdout.into(),
                stderr: String::new(),
            });
            self
        }
    }

    #[async_trait]
    impl ArtifactProbe for StaticProbe {
        async fn read_file(&self, path: &str) -> eyre::Result<Option<String>> {
            Ok(self.files.get(path).cloned())
        }

        async fn query_task(&self, task: &str) -> eyre::Result<TaskOutput> {
            self.output
                .clone()
                .ok_or_else(|| eyre::eyre!("Task '{task}' not found in root project"))
        }
    }

    #[tokio::test]
    #[traced_test]
    async fn test_descriptor_single_quotes() -> eyre::Result<()> {
        let probe = StaticProbe::default().with_file(
            "build.gradle",
            "plugins {\n  id 'java'\n}\n\ndescription = 'orders-service'\nversion = '1.2.3'\n",
        );

        let path = DescriptorResolver::default().resolve(&probe).await?;

        assert_eq!(path.as_str(), "build/libs/orders-service-1.2.3.jar");
        assert_eq!(path.file_name(), "orders-service-1.2.3.jar");
        assert!(logs_contain("parsing gradle build file"));

        Ok(())
    }

    #[tokio::test]
    async fn test_descriptor_double_quotes_prefers_kotlin_dsl() -> eyre::Result<()> {
        let probe = StaticProbe::default()
            .with_file(
                "build.gradle.kts",
                "description = \"orders-service\"\nversion = \"2.0.0\"\n",
            )
            .with_file("build.gradle", "description = 'legacy'\nversion = '0.1'\n");

        let path = DescriptorResolver::default().resolve(&probe).await?;

        assert_eq!(path.as_str(), "build/libs/orders-service-2.0.0.jar");

        Ok(())
    }

    #[test]
    fn test_descriptor_mixed_quotes_and_indentation() -> eyre::Result<()> {
        let path = parse_descriptor(
            "build.gradle",
            "group = 'com.tiendanube'\n  version = \"3.1\"\n  description = 'orders'\n",
        )?;

        assert_eq!(path.as_str(), "build/libs/orders-3.1.jar");

        Ok(())
    }

    #[test]
    fn test_descriptor_unquoted_field_is_parse_error() {
        let err = parse_descriptor("build.gradle", "description = 'orders'\nversion = 1.0\n")
            .unwrap_err();

        assert!(matches!(
            err,
            ArtifactError::Parse {
                field: "version",
                ..
            }
        ));
    }

    #[test]
    fn test_descriptor_empty_field_is_malformed() {
        let err = parse_descriptor("build.gradle", "description = ''\nversion = '1.0'\n")
            .unwrap_err();

        match err {
            ArtifactError::Malformed(path) => assert_eq!(path, "build/libs/-1.0.jar"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_descriptor_missing() {
        let err = DescriptorResolver::default()
            .resolve(&StaticProbe::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ArtifactError::DescriptorNotFound(_)));
        assert_eq!(
            err.to_string(),
            "gradle build file not found, looked for build.gradle.kts, build.gradle"
        );
    }

    #[tokio::test]
    async fn test_task_query_strips_one_newline() -> eyre::Result<()> {
        let resolver = TaskQueryResolver::new(libs_root("/app"));

        let path = resolver
            .resolve(&StaticProbe::default().with_stdout("orders-service-1.2.3.jar\n"))
            .await?;
        assert_eq!(path.as_str(), "/app/build/libs/orders-service-1.2.3.jar");

        let path = resolver
            .resolve(&StaticProbe::default().with_stdout("orders.jar\n\n"))
            .await?;
        assert_eq!(path.as_str(), "/app/build/libs/orders.jar\n");

        Ok(())
    }

    #[tokio::test]
    async fn test_task_query_empty_output() {
        let err = TaskQueryResolver::new("build/libs/")
            .resolve(&StaticProbe::default().with_stdout("\n"))
            .await
            .unwrap_err();

        assert!(matches!(err, ArtifactError::EmptyArtifact { .. }));
    }

    #[tokio::test]
    async fn test_task_query_failure_carries_diagnostic() {
        let err = TaskQueryResolver::new("build/libs/")
            .resolve(&StaticProbe::default())
            .await
            .unwrap_err();

        match err {
            ArtifactError::QueryFailed { task, diagnostic } => {
                assert_eq!(task, "artifact");
                assert!(diagnostic.contains("not found in root project"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_task_query_stderr_is_failure() {
        let probe = StaticProbe {
            output: Some(TaskOutput {
                stdout: "orders.jar\n".into(),
                stderr: "FAILURE: Build failed with an exception.\n".into(),
            }),
            ..Default::default()
        };

        let err = TaskQueryResolver::new("build/libs/")
            .resolve(&probe)
            .await
            .unwrap_err();

        assert!(matches!(err, ArtifactError::QueryFailed { .. }));
    }

    #[test]
    fn test_libs_root() {
        assert_eq!(libs_root("/app"), "/app/build/libs/");
        assert_eq!(libs_root("/srv/"), "/srv/build/libs/");
    }
}
