//! Log Hook: a pre/post-process that logs a fixed message

use crate::str_arg;
use rowflow_core::{ClassRef, Component, Hook};
use serde_json::Value;
use tracing::info;

/// Logs a fixed message at `info` when invoked.
///
/// Class form: `LogHook(message)`.
#[derive(Debug, Clone)]
pub struct LogHook {
    message: String,
}

impl LogHook {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn class() -> ClassRef {
        ClassRef::new("LogHook", |args: &[Value]| {
            let message = str_arg(args, 0, "message")?;
            Ok(Component::hook(LogHook::new(message)))
        })
        .with_arity(1)
    }
}

impl Hook for LogHook {
    fn call(&mut self) -> anyhow::Result<()> {
        info!(message = %self.message, "hook");
        Ok(())
    }
}
