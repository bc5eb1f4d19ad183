//! Unified Error Model
use crate::context::{Context, Form};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunnerError {
    /// A definition uses a form its context does not allow.
    #[error("POLICY/{form} form is not allowed for {context}")]
    PolicyViolation { context: Context, form: Form },

    /// A definition carries both forms, or neither.
    #[error("DEFINITION/{context}: class and callable form cannot be used together")]
    DefinitionConflict { context: Context },

    /// A class constructor failed. The original failure is kept only as text.
    #[error("INSTANTIATE/{context} {class} instantiation failed ({message})")]
    ComponentInstantiation {
        context: Context,
        class: String,
        message: String,
    },

    /// A constructor returned a component of the wrong shape for its context.
    #[error("CAPABILITY/{context} {component} is a {actual}, expected a {expected}")]
    CapabilityMismatch {
        context: Context,
        component: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// Failure raised by a live component while the job runs.
    #[error(transparent)]
    Component(#[from] anyhow::Error),
}

impl RunnerError {
    /// Phase the error is attributed to, when it happened during instantiation.
    pub fn context(&self) -> Option<Context> {
        match self {
            Self::PolicyViolation { context, .. }
            | Self::DefinitionConflict { context }
            | Self::ComponentInstantiation { context, .. }
            | Self::CapabilityMismatch { context, .. } => Some(*context),
            Self::Component(_) => None,
        }
    }
}

pub type Result<T, E = RunnerError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_phase() {
        let err = RunnerError::PolicyViolation {
            context: Context::Source,
            form: Form::Callable,
        };
        assert_eq!(err.to_string(), "POLICY/block form is not allowed for source");

        let err = RunnerError::ComponentInstantiation {
            context: Context::Destination,
            class: "CsvDestination".to_string(),
            message: "missing path".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "INSTANTIATE/destination CsvDestination instantiation failed (missing path)"
        );
        assert_eq!(err.context(), Some(Context::Destination));
    }

    #[test]
    fn test_component_errors_are_transparent() {
        let err: RunnerError = anyhow::anyhow!("connection reset").into();
        assert_eq!(err.to_string(), "connection reset");
        assert!(err.context().is_none());
    }
}
