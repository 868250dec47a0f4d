use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

pub const GRADLE_VERSION: &str = "jdk21-alpine";
pub const RUNTIME_IMAGE: &str = "amazoncorretto:21.0.1-alpine3.18";
pub const IMAGE_NAME: &str = "services-orders";
pub const WORKDIR: &str = "/app";
pub const APP_PORT: u16 = 80;
pub const SPRING_PROFILE: &str = "default";

pub const DATABASE_IMAGE: &str = "mysql:8.2.0";
pub const DATABASE_ROOT_PASSWORD: &str = "gotiendanube";
pub const DATABASE_NAME: &str = "tiendanube";
pub const DATABASE_ALIAS: &str = "mysql";
pub const DATABASE_PORT: u16 = 3306;
pub const DATABASE_INIT_PATH: &str = "/docker-entrypoint-initdb.d/db.sql";

pub const TRACING_AGENT_URL: &str = "https://github.com/open-telemetry/opentelemetry-java-instrumentation/releases/latest/download/opentelemetry-javaagent.jar";
pub const TRACING_AGENT_PATH: &str = "/opt/tracing/agent.jar";

/// Which [`crate::artifact::ArtifactResolver`] locates the built jar.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactStrategy {
    /// Parse `description` and `version` out of the gradle build file.
    Descriptor,
    /// Ask gradle through the project's `artifact` task.
    #[default]
    TaskQuery,
}

impl fmt::Display for ArtifactStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactStrategy::Descriptor => f.write_str("descriptor"),
            ArtifactStrategy::TaskQuery => f.write_str("task-query"),
        }
    }
}

impl FromStr for ArtifactStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "descriptor" => Ok(ArtifactStrategy::Descriptor),
            "task-query" => Ok(ArtifactStrategy::TaskQuery),
            other => Err(format!(
                "unknown artifact strategy `{other}`, expected `descriptor` or `task-query`"
            )),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracingAgent {
    /// Fetched by the engine while the image is assembled.
    pub url: String,
    pub path: String,
}

impl Default for TracingAgent {
    fn default() -> Self {
        Self {
            url: TRACING_AGENT_URL.into(),
            path: TRACING_AGENT_PATH.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub image: String,
    pub root_password: String,
    pub name: String,
    /// Hostname the application reaches the database under.
    pub alias: String,
    pub port: u16,
    pub init_script_path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            image: DATABASE_IMAGE.into(),
            root_password: DATABASE_ROOT_PASSWORD.into(),
            name: DATABASE_NAME.into(),
            alias: DATABASE_ALIAS.into(),
            port: DATABASE_PORT,
            init_script_path: DATABASE_INIT_PATH.into(),
        }
    }
}

#[derive(Builder, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[builder(default, setter(into))]
#[serde(default)]
pub struct PipelineConfig {
    /// Tag of the `gradle` image the build runs in.
    pub gradle_version: String,
    /// Prefer the source tree's `gradlew` over the image's `gradle` when present.
    pub detect_wrapper: bool,
    /// Where the source tree lives inside the build and runtime containers.
    pub workdir: String,
    pub runtime_image: String,
    pub image_name: String,
    pub app_port: u16,
    pub profile: String,
    pub artifact_strategy: ArtifactStrategy,
    /// Alpine packages installed into the runtime image.
    pub diagnostics: Vec<String>,
    #[builder(setter(into, strip_option))]
    pub tracing_agent: Option<TracingAgent>,
    pub env: BTreeMap<String, String>,
    pub database: DatabaseConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            gradle_version: GRADLE_VERSION.into(),
            detect_wrapper: true,
            workdir: WORKDIR.into(),
            runtime_image: RUNTIME_IMAGE.into(),
            image_name: IMAGE_NAME.into(),
            app_port: APP_PORT,
            profile: SPRING_PROFILE.into(),
            artifact_strategy: ArtifactStrategy::default(),
            diagnostics: Vec::new(),
            tracing_agent: None,
            env: BTreeMap::new(),
            database: DatabaseConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Address the runtime image is pushed to. An empty registry yields a bare
    /// `name:tag` reference.
    pub fn image_address(&self, registry: &str, tag: &str) -> String {
        let registry = registry.trim_end_matches('/');
        match registry {
            "" => format!("{}:{}", self.image_name, tag),
            registry => format!("{}/{}:{}", registry, self.image_name, tag),
        }
    }
}
