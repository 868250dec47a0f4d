use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use eyre::WrapErr;
use gradle_service::{ArtifactStrategy, PipelineConfig};

#[derive(Parser, Debug)]
#[command(name = "gradle-service-ci", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub pipeline: PipelineArgs,

    #[arg(long, env = "CI_LOG_LEVEL", default_value = "info")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile the service with gradle.
    Build,
    /// Run the service's test suite.
    Test,
    /// Build the runtime image, optionally exporting it as a tarball.
    Package {
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Build and push the runtime image.
    Publish {
        #[arg(long, env = "CI_REGISTRY")]
        registry: String,
        #[arg(long, env = "CI_IMAGE_TAG")]
        tag: String,
    },
    /// Run the service next to its database until interrupted.
    Serve {
        #[arg(long, default_value = "db/db.sql")]
        init_script: String,
    },
    /// Run only the database until interrupted.
    Mysql {
        #[arg(long, default_value = "db/db.sql")]
        init_script: String,
    },
    /// Print the effective pipeline configuration as json.
    Config,
}

#[derive(Args, Debug)]
pub struct PipelineArgs {
    /// Service source directory on the host.
    #[arg(long, env = "CI_SOURCE", default_value = ".")]
    pub source: String,

    /// Json file with pipeline settings, flags below take precedence.
    #[arg(long, env = "CI_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, env = "CI_GRADLE_VERSION")]
    pub gradle_version: Option<String>,

    #[arg(long, env = "CI_ARTIFACT_STRATEGY")]
    pub artifact_strategy: Option<ArtifactStrategy>,

    /// Always use the image's gradle, even when the source ships gradlew.
    #[arg(long)]
    pub no_wrapper: bool,

    /// Extra alpine packages for the runtime image.
    #[arg(long = "diagnostic", value_delimiter = ',')]
    pub diagnostics: Vec<String>,

    #[arg(long)]
    pub tracing_agent: bool,

    /// Only read when `--tracing-agent` is set.
    #[arg(long, env = "CI_TRACING_AGENT_URL")]
    pub tracing_agent_url: Option<String>,
}

impl PipelineArgs {
    pub fn load(&self) -> eyre::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .wrap_err_with(|| format!("could not read {}", path.display()))?;
                serde_json::from_str(&raw)
                    .wrap_err_with(|| format!("invalid pipeline config in {}", path.display()))?
            }
            None => PipelineConfig::default(),
        };

        if let Some(version) = &self.gradle_version {
            config.gradle_version = version.clone();
        }
        if let Some(strategy) = self.artifact_strategy {
            config.artifact_strategy = strategy;
        }
        if self.no_wrapper {
            config.detect_wrapper = false;
        }
        if !self.diagnostics.is_empty() {
            config.diagnostics = self.diagnostics.clone();
        }
        if self.tracing_agent {
            let mut agent = config.tracing_agent.take().unwrap_or_default();
            if let Some(url) = &self.tracing_agent_url {
                agent.url = url.clone();
            }
            config.tracing_agent = Some(agent);
        }

        Ok(config)
    }
}
