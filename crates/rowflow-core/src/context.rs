//! Phases, form policy and per-run execution state
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline phase a definition is instantiated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Context {
    PreProcess,
    Source,
    Transform,
    Destination,
    PostProcess,
}

impl Context {
    /// All phases, in execution order.
    pub const ALL: [Context; 5] = [
        Context::PreProcess,
        Context::Source,
        Context::Transform,
        Context::Destination,
        Context::PostProcess,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreProcess => "pre_process",
            Self::Source => "source",
            Self::Transform => "transform",
            Self::Destination => "destination",
            Self::PostProcess => "post_process",
        }
    }

    /// Which definition forms this phase accepts.
    pub fn policy(&self) -> FormPolicy {
        match self {
            Self::Source | Self::Destination => FormPolicy::default(),
            Self::Transform | Self::PreProcess | Self::PostProcess => {
                FormPolicy::default().with_callable()
            }
        }
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a definition asks for its component to be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Form {
    Class,
    Callable,
}

impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Class => f.write_str("class"),
            Self::Callable => f.write_str("block"),
        }
    }
}

/// Per-phase switches for the two definition forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormPolicy {
    #[serde(default = "default_true")]
    pub allow_class: bool,
    #[serde(default)]
    pub allow_callable: bool,
}

fn default_true() -> bool {
    true
}

impl Default for FormPolicy {
    fn default() -> Self {
        Self {
            allow_class: true,
            allow_callable: false,
        }
    }
}

impl FormPolicy {
    pub fn with_callable(mut self) -> Self {
        self.allow_callable = true;
        self
    }

    pub fn without_class(mut self) -> Self {
        self.allow_class = false;
        self
    }

    pub fn allows(&self, form: Form) -> bool {
        match form {
            Form::Class => self.allow_class,
            Form::Callable => self.allow_callable,
        }
    }
}

/// Identity of one run of a job.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub job: String,
    pub run_id: String,
}

impl RunContext {
    pub fn new(job: impl Into<String>) -> Self {
        Self {
            job: job.into(),
            run_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new("job")
    }
}

/// Runner knobs. Everything here is optional in serialized form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerOptions {
    /// Log progress every N rows read. 0 disables it.
    #[serde(default)]
    pub progress_every: u64,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self { progress_every: 0 }
    }
}
