//! Rowflow Registry: class names, roles and job spec resolution
//!
//! A job parser knows components by name. The registry maps those names to
//! [`rowflow_core::ClassRef`]s, remembers which role each class plays, and
//! turns a serialized [`ControlSpec`] into a runnable [`rowflow_core::Control`].
pub mod compat;
pub mod component_registry;
pub mod spec;

pub use compat::{role_for, Role};
pub use component_registry::{ComponentRegistry, RegistryEntry};
pub use spec::{ControlSpec, DefinitionSpec};

use rowflow_core::Context;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("REGISTRY/invalid class name '{0}'")]
    InvalidName(String),

    #[error("REGISTRY/class '{0}' is already registered")]
    Duplicate(String),

    #[error("REGISTRY/{context}: unknown class '{name}'")]
    UnknownClass { name: String, context: Context },

    #[error("REGISTRY/{context}: class '{name}' is a {role}, expected a {expected}")]
    IncompatibleRole {
        name: String,
        context: Context,
        role: Role,
        expected: Role,
    },
}
