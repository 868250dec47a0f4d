pub mod artifact;
pub mod backend;
pub mod config;
pub mod dagger;
pub mod errors;
pub mod gradle;
pub mod image;
pub mod logging;
pub mod pipeline;

pub use crate::artifact::{ArtifactPath, ArtifactResolver, DynArtifactResolver};
pub use crate::backend::Backend;
pub use crate::config::{ArtifactStrategy, PipelineConfig};
pub use crate::dagger::DaggerBackend;
pub use crate::errors::{ArtifactError, PipelineError};
pub use crate::pipeline::GradleService;
