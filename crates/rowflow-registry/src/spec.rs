//! Serializable job description, resolved against a registry.
//!
//! Only class-form definitions can be expressed here; inline blocks exist
//! in code and are added to the resolved [`Control`] directly.
use crate::component_registry::ComponentRegistry;
use crate::RegistryError;
use rowflow_core::{ComponentDefinition, Context, Control};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefinitionSpec {
    /// Registered class name
    pub class: String,
    /// Positional constructor arguments
    #[serde(default)]
    pub args: Vec<Value>,
}

impl DefinitionSpec {
    pub fn new(class: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            class: class.into(),
            args,
        }
    }

    pub fn resolve(
        &self,
        registry: &ComponentRegistry,
        context: Context,
    ) -> Result<ComponentDefinition, RegistryError> {
        let class = registry.resolve(context, &self.class)?;
        Ok(ComponentDefinition::class(class.clone(), self.args.clone()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlSpec {
    #[serde(default)]
    pub pre_processes: Vec<DefinitionSpec>,
    #[serde(default)]
    pub sources: Vec<DefinitionSpec>,
    #[serde(default)]
    pub transforms: Vec<DefinitionSpec>,
    #[serde(default)]
    pub destinations: Vec<DefinitionSpec>,
    #[serde(default)]
    pub post_processes: Vec<DefinitionSpec>,
}

impl ControlSpec {
    pub fn specs(&self, context: Context) -> &[DefinitionSpec] {
        match context {
            Context::PreProcess => &self.pre_processes,
            Context::Source => &self.sources,
            Context::Transform => &self.transforms,
            Context::Destination => &self.destinations,
            Context::PostProcess => &self.post_processes,
        }
    }

    /// Resolve every phase, keeping declaration order. Stops at the first
    /// unknown or misplaced class.
    pub fn resolve(&self, registry: &ComponentRegistry) -> Result<Control, RegistryError> {
        let phase = |context: Context| -> Result<Vec<ComponentDefinition>, RegistryError> {
            self.specs(context)
                .iter()
                .map(|spec| spec.resolve(registry, context))
                .collect()
        };

        Ok(Control {
            pre_processes: phase(Context::PreProcess)?,
            sources: phase(Context::Source)?,
            transforms: phase(Context::Transform)?,
            destinations: phase(Context::Destination)?,
            post_processes: phase(Context::PostProcess)?,
        })
    }
}
