use async_trait::async_trait;
use tokio::sync::OnceCell;

use crate::artifact::{ArtifactPath, ArtifactProbe, DynArtifactResolver, TaskOutput};
use crate::backend::Backend;
use crate::config::PipelineConfig;
use crate::errors::PipelineError;
use crate::gradle::{Gradle, GradleTask, WRAPPER_SCRIPT};
use crate::image::{DatabaseSpec, RuntimeSpec, ServiceSpec};

/// Build, package and ship one gradle service.
///
/// Nothing runs until a source tree is bound with [`GradleService::configure`];
/// every build-dependent stage fails with [`PipelineError::MissingSource`]
/// before that, without touching the backend.
pub struct GradleService<B: Backend> {
    backend: B,
    config: PipelineConfig,
    resolver: DynArtifactResolver,
    source: Option<B::Source>,
    gradle: OnceCell<Gradle<B::Source>>,
}

impl<B: Backend> GradleService<B> {
    pub fn new(backend: B, config: PipelineConfig) -> Self {
        let resolver = config.artifact_strategy.resolver(&config.workdir);

        Self {
            backend,
            config,
            resolver,
            source: None,
            gradle: OnceCell::new(),
        }
    }

    /// Replaces the resolver picked from the configured strategy.
    pub fn with_resolver(mut self, resolver: DynArtifactResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn configure(mut self, source: B::Source) -> Self {
        self.source = Some(source);
        self.gradle = OnceCell::new();
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    async fn gradle(&self) -> Result<&Gradle<B::Source>, PipelineError> {
        let source = self.source.as_ref().ok_or(PipelineError::MissingSource)?;

        self.gradle
            .get_or_try_init(|| async {
                let wrapper = if self.config.detect_wrapper {
                    let entries = self
                        .backend
                        .entries(source)
                        .await
                        .map_err(PipelineError::Setup)?;
                    entries.iter().any(|e| e == WRAPPER_SCRIPT)
                } else {
                    false
                };

                tracing::debug!(wrapper, version = %self.config.gradle_version, "gradle ready");

                Ok::<_, PipelineError>(Gradle::new(
                    self.config.gradle_version.as_str(),
                    source.clone(),
                    self.config.workdir.as_str(),
                )
                .with_wrapper(wrapper))
            })
            .await
    }

    pub async fn compile(&self) -> Result<B::Output, PipelineError> {
        let gradle = self.gradle().await?;

        tracing::info!(image = %gradle.image(), wrapper = gradle.uses_wrapper(), "building service");

        self.backend
            .run(gradle, &GradleTask::Assemble)
            .await
            .map_err(PipelineError::Build)
    }

    pub async fn run_tests(&self) -> Result<B::Output, PipelineError> {
        let gradle = self.gradle().await?;

        tracing::info!(image = %gradle.image(), wrapper = gradle.uses_wrapper(), "testing service");

        self.backend
            .run(gradle, &GradleTask::Test)
            .await
            .map_err(PipelineError::Test)
    }

    async fn build_artifact(&self) -> Result<(B::Output, ArtifactPath), PipelineError> {
        let output = self.compile().await?;
        let gradle = self.gradle().await?;

        let probe = BuildProbe {
            backend: &self.backend,
            gradle,
            output: &output,
        };
        let artifact = self.resolver.resolve(&probe).await?;

        tracing::info!(artifact = artifact.as_str(), "resolved build artifact");

        Ok((output, artifact))
    }

    /// Builds and resolves the artifact, returning what the runtime image
    /// would be assembled from.
    pub async fn runtime_spec(&self) -> Result<RuntimeSpec, PipelineError> {
        let (_, artifact) = self.build_artifact().await?;

        Ok(RuntimeSpec::new(&self.config, &artifact))
    }

    pub async fn package_runtime(&self) -> Result<B::Image, PipelineError> {
        let (output, artifact) = self.build_artifact().await?;

        let jar = self
            .backend
            .extract(&output, artifact.as_str())
            .await
            .map_err(|source| PipelineError::Extract {
                path: artifact.to_string(),
                source,
            })?;

        let spec = RuntimeSpec::new(&self.config, &artifact);

        Ok(self.backend.assemble(jar, &spec))
    }

    pub async fn publish(&self, registry: &str, tag: &str) -> Result<String, PipelineError> {
        if tag.trim().is_empty() {
            return Err(PipelineError::InvalidTag);
        }

        let image = self.package_runtime().await?;
        let address = self.config.image_address(registry, tag);

        tracing::info!(address = %address, "publishing runtime image");

        self.backend
            .publish(&image, &address)
            .await
            .map_err(|source| PipelineError::Publish { address, source })
    }

    /// The runtime image bound to its database, ready for integration tests.
    pub async fn as_service(&self, init_script: B::File) -> Result<B::Service, PipelineError> {
        let image = self.package_runtime().await?;
        let database = self.auxiliary_database(init_script);

        Ok(self
            .backend
            .serve(image, &ServiceSpec::new(&self.config), database))
    }

    pub fn auxiliary_database(&self, init_script: B::File) -> B::Service {
        self.backend
            .database(&DatabaseSpec::new(&self.config.database), init_script)
    }
}

struct BuildProbe<'a, B: Backend> {
    backend: &'a B,
    gradle: &'a Gradle<B::Source>,
    output: &'a B::Output,
}

#[async_trait]
impl<B: Backend> ArtifactProbe for BuildProbe<'_, B> {
    async fn read_file(&self, path: &str) -> eyre::Result<Option<String>> {
        self.backend.read_file(self.output, path).await
    }

    async fn query_task(&self, task: &str) -> eyre::Result<TaskOutput> {
        self.backend
            .capture(self.gradle, &GradleTask::Query(task.to_string()))
            .await
    }
}
