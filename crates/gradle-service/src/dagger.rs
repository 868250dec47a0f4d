use async_trait::async_trait;
use dagger_sdk::{Container, Directory, File, HostDirectoryOptsBuilder, Query, Service};

use crate::artifact::TaskOutput;
use crate::backend::Backend;
use crate::gradle::{Gradle, GradleTask};
use crate::image::{DatabaseSpec, RuntimeSpec, ServiceSpec};

/// Paths never shipped into the build container.
pub const SOURCE_EXCLUDES: [&str; 4] = [".gradle/", "build/", ".idea/", "target/"];

/// Splits `path` into the directory to list and the entry to look for.
fn split_parent(path: &str) -> (&str, &str) {
    match path.rsplit_once('/') {
        Some(("", name)) => ("/", name),
        Some((dir, name)) => (dir, name),
        None => (".", path),
    }
}

#[derive(Clone)]
pub struct DaggerBackend {
    client: Query,
}

impl DaggerBackend {
    pub fn new(client: Query) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Query {
        &self.client
    }

    /// The service source tree at `path` on the host, minus local build state.
    pub fn source(&self, path: &str) -> eyre::Result<Directory> {
        let opts = HostDirectoryOptsBuilder::default()
            .exclude(SOURCE_EXCLUDES.to_vec())
            .build()?;

        Ok(self.client.host().directory_opts(path, opts))
    }

    pub fn host_file(&self, path: &str) -> File {
        self.client.host().file(path)
    }

    fn gradle_container(&self, gradle: &Gradle<Directory>) -> Container {
        self.client
            .container()
            .from(gradle.image())
            .with_directory(gradle.workdir(), gradle.source().clone())
            .with_workdir(gradle.workdir())
    }
}

#[async_trait]
impl Backend for DaggerBackend {
    type Source = Directory;
    type File = File;
    type Output = Container;
    type Image = Container;
    type Service = Service;

    async fn entries(&self, source: &Directory) -> eyre::Result<Vec<String>> {
        Ok(source.entries().await?)
    }

    async fn run(&self, gradle: &Gradle<Directory>, task: &GradleTask) -> eyre::Result<Container> {
        let container = self
            .gradle_container(gradle)
            .with_exec(gradle.command(task));

        container.sync().await?;

        Ok(container)
    }

    async fn capture(
        &self,
        gradle: &Gradle<Directory>,
        task: &GradleTask,
    ) -> eyre::Result<TaskOutput> {
        let container = self
            .gradle_container(gradle)
            .with_exec(gradle.command(task));

        let (stdout, stderr) = futures::try_join!(container.stdout(), container.stderr())?;

        Ok(TaskOutput { stdout, stderr })
    }

    async fn read_file(&self, output: &Container, path: &str) -> eyre::Result<Option<String>> {
        let (dir, name) = split_parent(path);

        let entries = output.directory(dir).entries().await?;
        if !entries.iter().any(|e| e.trim_end_matches('/') == name) {
            return Ok(None);
        }

        Ok(Some(output.file(path).contents().await?))
    }

    async fn extract(&self, output: &Container, path: &str) -> eyre::Result<File> {
        let file = output.file(path);
        file.sync().await?;

        Ok(file)
    }

    fn assemble(&self, artifact: File, spec: &RuntimeSpec) -> Container {
        let mut container = self
            .client
            .container()
            .from(spec.base_image.as_str())
            .with_workdir(spec.workdir.as_str());

        if let Some(install) = spec.install_command() {
            container = container.with_exec(install);
        }

        if let Some(agent) = &spec.tracing_agent {
            let agent_jar = self.client.http(agent.url.as_str());
            container = container.with_file(agent.path.as_str(), agent_jar);
        }

        container = container.with_file(spec.jar.as_str(), artifact);

        for (name, value) in &spec.env {
            container = container.with_env_variable(name.as_str(), value.as_str());
        }

        for (name, value) in &spec.labels {
            container = container.with_label(name.as_str(), value.as_str());
        }

        container.with_entrypoint(spec.entrypoint.clone())
    }

    async fn publish(&self, image: &Container, address: &str) -> eyre::Result<String> {
        Ok(image.publish(address).await?)
    }

    fn database(&self, spec: &DatabaseSpec, init_script: File) -> Service {
        let mut container = self.client.container().from(spec.image.as_str());

        for (name, value) in &spec.env {
            container = container.with_env_variable(name.as_str(), value.as_str());
        }

        container
            .with_file(spec.init_script_path.as_str(), init_script)
            .with_exposed_port(spec.port as isize)
            .as_service()
    }

    fn serve(&self, image: Container, spec: &ServiceSpec, database: Service) -> Service {
        let mut container = image;

        for (name, value) in &spec.env {
            container = container.with_env_variable(name.as_str(), value.as_str());
        }

        container
            .with_service_binding(spec.database_alias.as_str(), database)
            .with_exposed_port(spec.port as isize)
            .as_service()
    }
}
