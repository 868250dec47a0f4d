use std::collections::BTreeMap;

use serde::Serialize;

use crate::artifact::ArtifactPath;
use crate::config::{DatabaseConfig, PipelineConfig, TracingAgent};

/// File name the jar is copied to inside the runtime workdir.
pub const APP_JAR: &str = "app.jar";

/// Everything the runtime image is assembled from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RuntimeSpec {
    pub base_image: String,
    pub workdir: String,
    pub artifact: String,
    pub jar: String,
    pub packages: Vec<String>,
    pub tracing_agent: Option<TracingAgent>,
    pub env: BTreeMap<String, String>,
    pub labels: BTreeMap<String, String>,
    pub entrypoint: Vec<String>,
}

impl RuntimeSpec {
    pub fn new(config: &PipelineConfig, artifact: &ArtifactPath) -> Self {
        let mut entrypoint = vec!["java".to_string()];
        if let Some(agent) = &config.tracing_agent {
            entrypoint.push(format!("-javaagent:{}", agent.path));
        }
        entrypoint.extend([
            "-jar".to_string(),
            APP_JAR.to_string(),
            format!("--server.port={}", config.app_port),
            format!("--spring.profiles.active={}", config.profile),
        ]);

        let mut env = config.env.clone();
        if config.tracing_agent.is_some() {
            env.entry("OTEL_SERVICE_NAME".into())
                .or_insert_with(|| config.image_name.clone());
        }

        let labels = BTreeMap::from([
            (
                "org.opencontainers.image.title".to_string(),
                config.image_name.clone(),
            ),
            (
                "org.opencontainers.image.description".to_string(),
                artifact.file_name().to_string(),
            ),
        ]);

        Self {
            base_image: config.runtime_image.clone(),
            workdir: config.workdir.clone(),
            artifact: artifact.to_string(),
            jar: APP_JAR.to_string(),
            packages: config.diagnostics.clone(),
            tracing_agent: config.tracing_agent.clone(),
            env,
            labels,
            entrypoint,
        }
    }

    /// `apk add` invocation for the diagnostic packages, if any were asked for.
    pub fn install_command(&self) -> Option<Vec<String>> {
        if self.packages.is_empty() {
            return None;
        }

        let mut args = vec!["apk".to_string(), "add".to_string(), "--no-cache".to_string()];
        args.extend(self.packages.iter().cloned());
        Some(args)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DatabaseSpec {
    pub image: String,
    pub env: BTreeMap<String, String>,
    pub init_script_path: String,
    pub port: u16,
}

impl DatabaseSpec {
    pub fn new(config: &DatabaseConfig) -> Self {
        Self {
            image: config.image.clone(),
            env: BTreeMap::from([
                (
                    "MYSQL_ROOT_PASSWORD".to_string(),
                    config.root_password.clone(),
                ),
                ("MYSQL_DATABASE".to_string(), config.name.clone()),
            ]),
            init_script_path: config.init_script_path.clone(),
            port: config.port,
        }
    }
}

/// How the runtime image is wired to its database when run as a service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ServiceSpec {
    pub env: BTreeMap<String, String>,
    pub database_alias: String,
    pub port: u16,
}

impl ServiceSpec {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            env: BTreeMap::from([
                ("DB_HOST".to_string(), config.database.alias.clone()),
                ("DB_PORT".to_string(), config.database.port.to_string()),
            ]),
            database_alias: config.database.alias.clone(),
            port: config.app_port,
        }
    }
}
