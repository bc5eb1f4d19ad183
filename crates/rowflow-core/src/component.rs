//! Component contracts: the shapes live instances take in each phase
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// One unit of data flowing through a job. The runner never looks inside.
pub type Row = Value;

/// Lazy, forward-only sequence of rows produced by a [`Source`].
pub type RowStream<'a> = Box<dyn Iterator<Item = anyhow::Result<Row>> + 'a>;

/// Row closure used by inline transforms.
pub type RowFn = dyn Fn(Row) -> anyhow::Result<Option<Row>> + Send + Sync;

/// Zero-argument closure used by inline pre/post processes.
pub type HookFn = dyn Fn() -> anyhow::Result<()> + Send + Sync;

/// Produces the rows of a job. Iterated once per run.
pub trait Source: Send {
    fn rows(&mut self) -> RowStream<'_>;
}

/// Rewrites one row. `Ok(None)` drops it.
pub trait Transform: Send {
    fn process(&mut self, row: Row) -> anyhow::Result<Option<Row>>;
}

/// Receives every surviving row, then is closed once.
pub trait Destination: Send {
    fn write(&mut self, row: &Row) -> anyhow::Result<()>;

    /// No writes follow a close.
    fn close(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Pre/post-process hook, invoked once with no arguments.
pub trait Hook: Send {
    fn call(&mut self) -> anyhow::Result<()>;
}

/// A live instance, tagged with the capability it implements.
pub enum Component {
    Source(Box<dyn Source>),
    Transform(Box<dyn Transform>),
    Destination(Box<dyn Destination>),
    Hook(Box<dyn Hook>),
}

impl Component {
    pub fn source(source: impl Source + 'static) -> Self {
        Self::Source(Box::new(source))
    }

    pub fn transform(transform: impl Transform + 'static) -> Self {
        Self::Transform(Box::new(transform))
    }

    pub fn destination(destination: impl Destination + 'static) -> Self {
        Self::Destination(Box::new(destination))
    }

    pub fn hook(hook: impl Hook + 'static) -> Self {
        Self::Hook(Box::new(hook))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Source(_) => "source",
            Self::Transform(_) => "transform",
            Self::Destination(_) => "destination",
            Self::Hook(_) => "hook",
        }
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Component::{}", self.kind())
    }
}

/// Lets an inline row closure stand in for a class-based transform.
#[derive(Clone)]
pub struct BlockTransform {
    body: Arc<RowFn>,
}

impl BlockTransform {
    pub fn new(body: Arc<RowFn>) -> Self {
        Self { body }
    }
}

impl Transform for BlockTransform {
    fn process(&mut self, row: Row) -> anyhow::Result<Option<Row>> {
        (self.body)(row)
    }
}

/// Lets an inline zero-argument closure stand in for a class-based hook.
#[derive(Clone)]
pub struct BlockHook {
    body: Arc<HookFn>,
}

impl BlockHook {
    pub fn new(body: Arc<HookFn>) -> Self {
        Self { body }
    }
}

impl Hook for BlockHook {
    fn call(&mut self) -> anyhow::Result<()> {
        (self.body)()
    }
}
