//! Component definitions and the control object handed to the runner
//!
//! Definitions are produced by a job parser and never mutated here. A
//! definition names its component either by class (a named constructor plus
//! positional arguments) or by an inline closure.

use crate::component::{Component, HookFn, Row, RowFn};
use crate::context::{Context, Form};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Constructor behind a [`ClassRef`]. Receives the definition's arguments.
pub type Constructor = dyn Fn(&[Value]) -> anyhow::Result<Component> + Send + Sync;

/// Reference to a constructible component type.
#[derive(Clone)]
pub struct ClassRef {
    name: String,
    min_args: usize,
    max_args: Option<usize>,
    constructor: Arc<Constructor>,
}

impl ClassRef {
    /// Create a class accepting any number of arguments.
    pub fn new<F>(name: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(&[Value]) -> anyhow::Result<Component> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            min_args: 0,
            max_args: None,
            constructor: Arc::new(constructor),
        }
    }

    /// Require exactly `n` arguments.
    pub fn with_arity(self, n: usize) -> Self {
        self.with_arity_range(n, Some(n))
    }

    /// Require between `min` and `max` arguments (`None` means unbounded).
    pub fn with_arity_range(mut self, min: usize, max: Option<usize>) -> Self {
        self.min_args = min;
        self.max_args = max;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check the argument count, then run the constructor.
    pub fn construct(&self, args: &[Value]) -> anyhow::Result<Component> {
        let given = args.len();
        let too_many = self.max_args.map_or(false, |max| given > max);
        if given < self.min_args || too_many {
            let expected = match self.max_args {
                Some(max) if max == self.min_args => max.to_string(),
                Some(max) => format!("{}..{}", self.min_args, max),
                None => format!("{}+", self.min_args),
            };
            anyhow::bail!(
                "wrong number of arguments (given {}, expected {})",
                given,
                expected
            );
        }
        (self.constructor)(args)
    }
}

impl fmt::Debug for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ClassRef")
            .field("name", &self.name)
            .field("min_args", &self.min_args)
            .field("max_args", &self.max_args)
            .finish()
    }
}

impl fmt::Display for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Inline component body.
#[derive(Clone)]
pub enum Callable {
    /// Called once per row, like a transform.
    Row(Arc<RowFn>),
    /// Called once with no arguments, like a pre/post process.
    Hook(Arc<HookFn>),
}

impl Callable {
    pub fn row<F>(body: F) -> Self
    where
        F: Fn(Row) -> anyhow::Result<Option<Row>> + Send + Sync + 'static,
    {
        Self::Row(Arc::new(body))
    }

    pub fn hook<F>(body: F) -> Self
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::Hook(Arc::new(body))
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Row(_) => f.write_str("Callable::Row"),
            Self::Hook(_) => f.write_str("Callable::Hook"),
        }
    }
}

/// Declarative description of one component.
#[derive(Debug, Clone, Default)]
pub struct ComponentDefinition {
    pub class: Option<ClassRef>,
    pub args: Vec<Value>,
    pub callable: Option<Callable>,
}

impl ComponentDefinition {
    /// Class form with positional constructor arguments.
    pub fn class(class: ClassRef, args: Vec<Value>) -> Self {
        Self {
            class: Some(class),
            args,
            callable: None,
        }
    }

    /// Inline form.
    pub fn block(callable: Callable) -> Self {
        Self {
            class: None,
            args: Vec::new(),
            callable: Some(callable),
        }
    }

    /// Inline transform.
    pub fn row_block<F>(body: F) -> Self
    where
        F: Fn(Row) -> anyhow::Result<Option<Row>> + Send + Sync + 'static,
    {
        Self::block(Callable::row(body))
    }

    /// Inline pre/post process.
    pub fn hook_block<F>(body: F) -> Self
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::block(Callable::hook(body))
    }

    /// The form this definition uses, or `None` when it has both or neither.
    pub fn form(&self) -> Option<Form> {
        match (&self.class, &self.callable) {
            (Some(_), None) => Some(Form::Class),
            (None, Some(_)) => Some(Form::Callable),
            _ => None,
        }
    }

    /// Name used in logs and errors.
    pub fn identity(&self) -> &str {
        match (&self.class, &self.callable) {
            (Some(class), _) => class.name(),
            (None, Some(_)) => "block",
            (None, None) => "<empty>",
        }
    }
}

/// The five ordered definition lists of one job.
#[derive(Debug, Clone, Default)]
pub struct Control {
    pub pre_processes: Vec<ComponentDefinition>,
    pub sources: Vec<ComponentDefinition>,
    pub transforms: Vec<ComponentDefinition>,
    pub destinations: Vec<ComponentDefinition>,
    pub post_processes: Vec<ComponentDefinition>,
}

impl Control {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pre_process(mut self, definition: ComponentDefinition) -> Self {
        self.pre_processes.push(definition);
        self
    }

    pub fn source(mut self, definition: ComponentDefinition) -> Self {
        self.sources.push(definition);
        self
    }

    pub fn transform(mut self, definition: ComponentDefinition) -> Self {
        self.transforms.push(definition);
        self
    }

    pub fn destination(mut self, definition: ComponentDefinition) -> Self {
        self.destinations.push(definition);
        self
    }

    pub fn post_process(mut self, definition: ComponentDefinition) -> Self {
        self.post_processes.push(definition);
        self
    }

    /// Definitions for one phase, in declaration order.
    pub fn definitions(&self, context: Context) -> &[ComponentDefinition] {
        match context {
            Context::PreProcess => &self.pre_processes,
            Context::Source => &self.sources,
            Context::Transform => &self.transforms,
            Context::Destination => &self.destinations,
            Context::PostProcess => &self.post_processes,
        }
    }
}
