use async_trait::async_trait;

use crate::artifact::TaskOutput;
use crate::gradle::{Gradle, GradleTask};
use crate::image::{DatabaseSpec, RuntimeSpec, ServiceSpec};

/// The container engine a [`crate::pipeline::GradleService`] drives.
///
/// Constructors (`assemble`, `database`, `serve`) only describe work; the
/// async methods are where the engine actually evaluates something.
#[async_trait]
pub trait Backend: Send + Sync {
    type Source: Clone + Send + Sync;
    type File: Clone + Send + Sync;
    /// A finished, evaluated build.
    type Output: Clone + Send + Sync;
    type Image: Clone + Send + Sync;
    type Service: Clone + Send + Sync;

    /// Top-level entry names of a source tree.
    async fn entries(&self, source: &Self::Source) -> eyre::Result<Vec<String>>;

    /// Runs `task` and forces evaluation so a failing build errors here.
    async fn run(
        &self,
        gradle: &Gradle<Self::Source>,
        task: &GradleTask,
    ) -> eyre::Result<Self::Output>;

    /// Runs `task` and captures both output streams.
    async fn capture(
        &self,
        gradle: &Gradle<Self::Source>,
        task: &GradleTask,
    ) -> eyre::Result<TaskOutput>;

    /// Contents of `path` inside the build output, `None` when absent.
    async fn read_file(&self, output: &Self::Output, path: &str) -> eyre::Result<Option<String>>;

    /// Fails when `path` does not exist in the build output.
    async fn extract(&self, output: &Self::Output, path: &str) -> eyre::Result<Self::File>;

    fn assemble(&self, artifact: Self::File, spec: &RuntimeSpec) -> Self::Image;

    async fn publish(&self, image: &Self::Image, address: &str) -> eyre::Result<String>;

    fn database(&self, spec: &DatabaseSpec, init_script: Self::File) -> Self::Service;

    fn serve(&self, image: Self::Image, spec: &ServiceSpec, database: Self::Service)
        -> Self::Service;
}
