//! Instantiator: turns component definitions into live instances
//!
//! Every definition goes through the same gate: the form invariant first
//! (exactly one of class or callable), then the phase policy, then
//! construction. Constructor failures, panics included, are re-framed once,
//! here, as [`RunnerError::ComponentInstantiation`].

use crate::component::{BlockHook, BlockTransform, Component, Destination, Hook, Source, Transform};
use crate::context::{Context, Form, FormPolicy};
use crate::definition::{Callable, ComponentDefinition};
use crate::error::{Result, RunnerError};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::debug;

/// A component shape the runner can hold in a typed list.
pub trait Capability: Sized {
    const KIND: &'static str;

    /// Unwrap the matching variant, or hand the component back.
    fn from_component(component: Component) -> std::result::Result<Self, Component>;
}

impl Capability for Box<dyn Source> {
    const KIND: &'static str = "source";

    fn from_component(component: Component) -> std::result::Result<Self, Component> {
        match component {
            Component::Source(source) => Ok(source),
            other => Err(other),
        }
    }
}

impl Capability for Box<dyn Transform> {
    const KIND: &'static str = "transform";

    fn from_component(component: Component) -> std::result::Result<Self, Component> {
        match component {
            Component::Transform(transform) => Ok(transform),
            other => Err(other),
        }
    }
}

impl Capability for Box<dyn Destination> {
    const KIND: &'static str = "destination";

    fn from_component(component: Component) -> std::result::Result<Self, Component> {
        match component {
            Component::Destination(destination) => Ok(destination),
            other => Err(other),
        }
    }
}

impl Capability for Box<dyn Hook> {
    const KIND: &'static str = "hook";

    fn from_component(component: Component) -> std::result::Result<Self, Component> {
        match component {
            Component::Hook(hook) => Ok(hook),
            other => Err(other),
        }
    }
}

/// Capability a phase expects its instances to have.
pub fn expected_kind(context: Context) -> &'static str {
    match context {
        Context::PreProcess | Context::PostProcess => <Box<dyn Hook> as Capability>::KIND,
        Context::Source => <Box<dyn Source> as Capability>::KIND,
        Context::Transform => <Box<dyn Transform> as Capability>::KIND,
        Context::Destination => <Box<dyn Destination> as Capability>::KIND,
    }
}

/// Instantiate every definition, preserving order. Stops at the first failure.
pub fn to_instances(
    context: Context,
    definitions: &[ComponentDefinition],
    policy: FormPolicy,
) -> Result<Vec<Component>> {
    definitions
        .iter()
        .map(|definition| to_instance(context, definition, policy))
        .collect()
}

/// Instantiate one definition under `policy`.
pub fn to_instance(
    context: Context,
    definition: &ComponentDefinition,
    policy: FormPolicy,
) -> Result<Component> {
    admit(context, definition, policy)?;

    if let Some(class) = &definition.class {
        debug!(%context, class = class.name(), args = definition.args.len(), "instantiating");
        let constructed =
            panic::catch_unwind(AssertUnwindSafe(|| class.construct(&definition.args)))
                .unwrap_or_else(|payload| Err(anyhow::anyhow!(panic_message(payload.as_ref()))));
        return constructed.map_err(|e| RunnerError::ComponentInstantiation {
            context,
            class: class.name().to_string(),
            message: format!("{:#}", e),
        });
    }

    match &definition.callable {
        Some(Callable::Row(body)) => {
            debug!(%context, "wrapping row block");
            Ok(Component::transform(BlockTransform::new(body.clone())))
        }
        Some(Callable::Hook(body)) => {
            debug!(%context, "wrapping hook block");
            Ok(Component::hook(BlockHook::new(body.clone())))
        }
        None => Err(RunnerError::DefinitionConflict { context }),
    }
}

/// Instantiate a phase and check every instance has the shape `T`.
pub fn materialize<T: Capability>(
    context: Context,
    definitions: &[ComponentDefinition],
    policy: FormPolicy,
) -> Result<Vec<T>> {
    let mut instances = Vec::with_capacity(definitions.len());
    for definition in definitions {
        let component = to_instance(context, definition, policy)?;
        let instance = T::from_component(component).map_err(|actual| {
            RunnerError::CapabilityMismatch {
                context,
                component: definition.identity().to_string(),
                expected: T::KIND,
                actual: actual.kind(),
            }
        })?;
        instances.push(instance);
    }
    Ok(instances)
}

/// Check a definition without constructing anything.
///
/// Class definitions can only be checked for form and policy; inline
/// definitions are also checked for the shape the phase expects.
pub fn validate(
    context: Context,
    definition: &ComponentDefinition,
    policy: FormPolicy,
) -> Result<()> {
    let form = admit(context, definition, policy)?;
    if form == Form::Class {
        return Ok(());
    }

    let actual = match &definition.callable {
        Some(Callable::Row(_)) => <Box<dyn Transform> as Capability>::KIND,
        Some(Callable::Hook(_)) => <Box<dyn Hook> as Capability>::KIND,
        None => return Err(RunnerError::DefinitionConflict { context }),
    };
    let expected = expected_kind(context);
    if actual != expected {
        return Err(RunnerError::CapabilityMismatch {
            context,
            component: definition.identity().to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}

/// Text carried by a constructor panic.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {}", message)
    } else {
        "panicked".to_string()
    }
}

fn admit(context: Context, definition: &ComponentDefinition, policy: FormPolicy) -> Result<Form> {
    let form = definition
        .form()
        .ok_or(RunnerError::DefinitionConflict { context })?;
    if !policy.allows(form) {
        return Err(RunnerError::PolicyViolation { context, form });
    }
    Ok(form)
}
