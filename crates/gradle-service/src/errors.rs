use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("no source directory configured, call configure before running build stages")]
    MissingSource,
    #[error("failed to prepare gradle for the configured source")]
    Setup(#[source] eyre::Error),
    #[error("gradle build failed")]
    Build(#[source] eyre::Error),
    #[error("gradle test failed")]
    Test(#[source] eyre::Error),
    #[error("could not resolve build artifact")]
    Artifact(#[from] ArtifactError),
    #[error("artifact {path} not found in build output")]
    Extract {
        path: String,
        #[source]
        source: eyre::Error,
    },
    #[error("image tag must not be empty")]
    InvalidTag,
    #[error("failed to publish image to {address}")]
    Publish {
        address: String,
        #[source]
        source: eyre::Error,
    },
}

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("gradle build file not found, looked for {}", .0.join(", "))]
    DescriptorNotFound(Vec<String>),
    #[error("could not read gradle build file {path}")]
    Read {
        path: String,
        #[source]
        source: eyre::Error,
    },
    #[error("no quoted `{field}` assignment found in {path}")]
    Parse { field: &'static str, path: String },
    #[error("resolved artifact path {0} is malformed")]
    Malformed(String),
    #[error("gradle task `{task}` failed: {diagnostic}")]
    QueryFailed { task: String, diagnostic: String },
    #[error("gradle task `{task}` did not print an artifact name")]
    EmptyArtifact { task: String },
}
