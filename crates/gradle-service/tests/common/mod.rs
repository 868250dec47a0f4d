use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use gradle_service::artifact::TaskOutput;
use gradle_service::gradle::{Gradle, GradleTask};
use gradle_service::image::{DatabaseSpec, RuntimeSpec, ServiceSpec};
use gradle_service::Backend;

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Entries(String),
    Run(Vec<String>),
    Capture(Vec<String>),
    ReadFile(String),
    Extract(String),
    Assemble(RuntimeSpec),
    Publish(String),
    Database(DatabaseSpec),
    Serve(ServiceSpec),
}

#[derive(Clone, Debug, PartialEq)]
pub struct FakeImage {
    pub jar: String,
    pub spec: RuntimeSpec,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FakeService {
    Database {
        spec: DatabaseSpec,
        init_script: String,
    },
    App {
        image: FakeImage,
        spec: ServiceSpec,
        database: Box<FakeService>,
    },
}

/// Records every call and answers from canned state instead of an engine.
#[derive(Default)]
pub struct FakeBackend {
    pub entries: Vec<String>,
    pub files: HashMap<String, String>,
    pub artifacts: Vec<String>,
    pub task_output: Option<TaskOutput>,
    pub build_error: Option<String>,
    pub publish_error: Option<String>,
    calls: Mutex<Vec<Call>>,
}

impl FakeBackend {
    pub fn with_entries(mut self, entries: &[&str]) -> Self {
        self.entries = entries.iter().map(|e| e.to_string()).collect();
        self
    }

    pub fn with_file(mut self, path: &str, contents: &str) -> Self {
        self.files.insert(path.into(), contents.into());
        self
    }

    pub fn with_artifact(mut self, path: &str) -> Self {
        self.artifacts.push(path.into());
        self
    }

    pub fn with_stdout(mut self, stdout: &str) -> Self {
        self.task_output = Some(TaskOutput {
            stdout: stdout.into(),
            stderr: String::new(),
        });
        self
    }

    pub fn failing_build(mut self, message: &str) -> Self {
        self.build_error = Some(message.into());
        self
    }

    pub fn failing_publish(mut self, message: &str) -> Self {
        self.publish_error = Some(message.into());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn assembled(&self) -> Vec<RuntimeSpec> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Assemble(spec) => Some(spec),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Backend for FakeBackend {
    type Source = String;
    type File = String;
    type Output = String;
    type Image = FakeImage;
    type Service = FakeService;

    async fn entries(&self, source: &String) -> eyre::Result<Vec<String>> {
        self.record(Call::Entries(source.clone()));
        Ok(self.entries.clone())
    }

    async fn run(&self, gradle: &Gradle<String>, task: &GradleTask) -> eyre::Result<String> {
        let command = gradle.command(task);
        self.record(Call::Run(command.clone()));

        match &self.build_error {
            Some(message) => eyre::bail!("{}", message),
            None => Ok(format!("{}:{}", gradle.source(), command.join(" "))),
        }
    }

    async fn capture(&self, gradle: &Gradle<String>, task: &GradleTask) -> eyre::Result<TaskOutput> {
        self.record(Call::Capture(gradle.command(task)));

        self.task_output
            .clone()
            .ok_or_else(|| eyre::eyre!("Task '{task}' not found in root project"))
    }

    async fn read_file(&self, _output: &String, path: &str) -> eyre::Result<Option<String>> {
        self.record(Call::ReadFile(path.into()));
        Ok(self.files.get(path).cloned())
    }

    async fn extract(&self, _output: &String, path: &str) -> eyre::Result<String> {
        self.record(Call::Extract(path.into()));

        if self.artifacts.iter().any(|a| a == path) {
            Ok(format!("file:{path}"))
        } else {
            eyre::bail!("{path}: no such file or directory")
        }
    }

    fn assemble(&self, artifact: String, spec: &RuntimeSpec) -> FakeImage {
        self.record(Call::Assemble(spec.clone()));

        FakeImage {
            jar: artifact,
            spec: spec.clone(),
        }
    }

    async fn publish(&self, _image: &FakeImage, address: &str) -> eyre::Result<String> {
        self.record(Call::Publish(address.into()));

        match &self.publish_error {
            Some(message) => eyre::bail!("{}", message),
            None => Ok(address.to_string()),
        }
    }

    fn database(&self, spec: &DatabaseSpec, init_script: String) -> FakeService {
        self.record(Call::Database(spec.clone()));

        FakeService::Database {
            spec: spec.clone(),
            init_script,
        }
    }

    fn serve(&self, image: FakeImage, spec: &ServiceSpec, database: FakeService) -> FakeService {
        self.record(Call::Serve(spec.clone()));

        FakeService::App {
            image,
            spec: spec.clone(),
            database: Box::new(database),
        }
    }
}
