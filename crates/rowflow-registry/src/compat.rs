//! Compatibility Matrix: which role a phase expects
use rowflow_core::Context;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Capability a registered class provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Source,
    Transform,
    Destination,
    Hook,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Transform => "transform",
            Self::Destination => "destination",
            Self::Hook => "hook",
        }
    }

    pub fn is_compatible_with(&self, context: Context) -> bool {
        role_for(context) == *self
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role every instance of `context` must have.
pub fn role_for(context: Context) -> Role {
    match context {
        Context::PreProcess | Context::PostProcess => Role::Hook,
        Context::Source => Role::Source,
        Context::Transform => Role::Transform,
        Context::Destination => Role::Destination,
    }
}
