use std::fmt;

pub const WRAPPER_SCRIPT: &str = "gradlew";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GradleTask {
    /// Compiles and packages the project without running tests.
    Assemble,
    Test,
    /// Runs a task in quiet mode so its stdout is just what the task prints.
    Query(String),
}

impl GradleTask {
    pub fn args(&self) -> Vec<String> {
        match self {
            GradleTask::Assemble => vec!["assemble".into()],
            GradleTask::Test => vec!["test".into()],
            GradleTask::Query(task) => vec!["-q".into(), task.clone()],
        }
    }
}

impl fmt::Display for GradleTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradleTask::Assemble => f.write_str("assemble"),
            GradleTask::Test => f.write_str("test"),
            GradleTask::Query(task) => f.write_str(task),
        }
    }
}

/// A gradle toolchain bound to a source tree.
#[derive(Clone, Debug)]
pub struct Gradle<S> {
    version: String,
    source: S,
    workdir: String,
    wrapper: bool,
}

impl<S> Gradle<S> {
    pub fn new(version: impl Into<String>, source: S, workdir: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            source,
            workdir: workdir.into(),
            wrapper: false,
        }
    }

    pub fn with_wrapper(mut self, wrapper: bool) -> Self {
        self.wrapper = wrapper;
        self
    }

    pub fn image(&self) -> String {
        format!("gradle:{}", self.version)
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn workdir(&self) -> &str {
        &self.workdir
    }

    pub fn uses_wrapper(&self) -> bool {
        self.wrapper
    }

    /// Full command line for `task`, run from the workdir.
    pub fn command(&self, task: &GradleTask) -> Vec<String> {
        let program = if self.wrapper {
            format!("./{WRAPPER_SCRIPT}")
        } else {
            "gradle".to_string()
        };

        let mut args = vec![program, "--no-daemon".to_string()];
        args.extend(task.args());
        args
    }
}
