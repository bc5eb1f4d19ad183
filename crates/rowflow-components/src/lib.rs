//! Rowflow Components: reference sources, transforms and destinations.
//!
//! These components stay small and deterministic. They give jobs and tests
//! something real to run without bespoke connectors; production jobs are
//! expected to bring their own.
//!
//! # Job Flow
//!
//! ```text
//! MemorySource → SetField / RenameField / FieldFilter / SelectFields → CaptureDestination
//!      ↓                              ↓                                      ↓
//!   rows in                  rewritten or dropped                     rows collected
//! ```

mod capture;
mod fields;
mod log_hook;
mod memory;

pub use capture::{Capture, CaptureDestination};
pub use fields::{FieldFilter, RenameField, SelectFields, SetField};
pub use log_hook::LogHook;
pub use memory::MemorySource;

use rowflow_registry::{ComponentRegistry, RegistryError, Role};
use serde_json::Value;

/// Register every stateless reference component.
///
/// `CaptureDestination` is bound to a [`Capture`] handle and is registered
/// through [`Capture::register`] instead.
pub fn register_builtins(registry: &mut ComponentRegistry) -> Result<(), RegistryError> {
    registry.register(Role::Source, MemorySource::class())?;
    registry.register(Role::Transform, FieldFilter::class())?;
    registry.register(Role::Transform, SetField::class())?;
    registry.register(Role::Transform, RenameField::class())?;
    registry.register(Role::Transform, SelectFields::class())?;
    registry.register(Role::Hook, LogHook::class())?;
    Ok(())
}

/// Positional string argument, or a descriptive error.
pub(crate) fn str_arg<'a>(args: &'a [Value], index: usize, what: &str) -> anyhow::Result<&'a str> {
    args.get(index)
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow::anyhow!("{} must be a string (argument {})", what, index + 1))
}
