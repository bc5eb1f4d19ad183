//! Rowflow Core: component instantiation and row streaming
//!
//! A job is a [`Control`]: five ordered lists of [`ComponentDefinition`]s.
//! The [`PipelineRunner`] instantiates each phase under its form policy,
//! runs the pre-process hooks, streams every row of every source through
//! the transform chain into every destination, closes the destinations and
//! runs the post-process hooks.
//!
//! ```
//! use rowflow_core::{run, ComponentDefinition, Control};
//!
//! let control = Control::new()
//!     .pre_process(ComponentDefinition::hook_block(|| Ok(())))
//!     .transform(ComponentDefinition::row_block(|row| Ok(Some(row))));
//!
//! let report = run(&control).unwrap();
//! assert_eq!(report.rows_read(), 0);
//! assert_eq!(report.pre_processes, 1);
//! ```

pub mod component;
pub mod context;
pub mod definition;
pub mod error;
pub mod instantiator;
pub mod logging;
pub mod report;
pub mod runner;

pub use component::{
    BlockHook, BlockTransform, Component, Destination, Hook, Row, RowStream, Source, Transform,
};
pub use context::{Context, Form, FormPolicy, RunContext, RunnerOptions};
pub use definition::{Callable, ClassRef, ComponentDefinition, Control};
pub use error::RunnerError;
pub use instantiator::{to_instance, to_instances};
pub use logging::init_logging;
pub use report::{DestinationStats, RunReport, SourceStats};
pub use runner::{run, PipelineRunner};

/// Rowflow engine version
pub const ROWFLOW_VERSION: &str = env!("CARGO_PKG_VERSION");
