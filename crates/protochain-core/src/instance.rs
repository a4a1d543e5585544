//! Instances: objects bound to one direct template
//!
//! An instance holds only its own fields. Methods are never copied onto
//! it; every call resolves through the registry starting at the direct
//! template. Fields and methods are separate namespaces, so a field named
//! like a method does not shadow it.

use crate::error::{ChainError, Result};
use crate::message::Message;
use crate::registry::Registry;
use crate::template::TemplateId;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::trace;
use uuid::Uuid;

/// Unique identifier for an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceId(pub Uuid);

impl InstanceId {
    /// Create a new unique instance ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Serializable snapshot of an instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceState {
    pub id: InstanceId,
    pub template: TemplateId,
    pub fields: BTreeMap<String, Value>,
}

/// A runtime object bound to exactly one direct template
#[derive(Debug, Clone)]
pub struct Instance {
    id: InstanceId,
    template: TemplateId,
    fields: BTreeMap<String, Value>,
}

impl Instance {
    /// Bind a fresh instance with no fields to `template`
    ///
    /// Prefer [`Registry::create_instance`], which checks the template exists.
    pub fn new(template: TemplateId) -> Self {
        Self {
            id: InstanceId::new(),
            template,
            fields: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// The direct template, fixed at construction
    pub fn template(&self) -> TemplateId {
        self.template
    }

    pub fn get_field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Set an own field, returning the previous value
    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }

    pub fn remove_field(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    pub fn state(&self) -> InstanceState {
        InstanceState {
            id: self.id,
            template: self.template,
            fields: self.fields.clone(),
        }
    }

    /// Restore from a snapshot, keeping its id
    pub fn from_state(state: InstanceState) -> Self {
        Self {
            id: state.id,
            template: state.template,
            fields: state.fields,
        }
    }

    pub fn responds_to(&self, registry: &Registry, name: &str) -> Result<bool> {
        registry.responds_to(self.template, name)
    }

    /// Resolve `name` from the direct template and run it on this instance
    pub fn call_method(
        &mut self,
        registry: &Registry,
        name: &str,
        args: &[Value],
    ) -> Result<Value> {
        let resolution = registry.lookup(self.template, name)?;
        trace!(instance = %self.id, method = name, owner = %resolution.owner, "calling method");
        resolution
            .method
            .invoke(self, args)
            .map_err(|source| ChainError::MethodFailed {
                selector: name.to_string(),
                source,
            })
    }

    /// Dispatch a pre-built message
    pub fn send(&mut self, registry: &Registry, message: &Message) -> Result<Value> {
        match message {
            Message::GetField(name) => Ok(self.fields.get(name).cloned().unwrap_or(Value::Nil)),

            Message::SetField(name, value) => {
                self.fields.insert(name.clone(), value.clone());
                Ok(Value::Nil)
            }

            Message::UpdateFields(updates) => {
                for (name, value) in updates {
                    self.fields.insert(name.clone(), value.clone());
                }
                Ok(Value::Nil)
            }

            Message::GetTemplate => Ok(Value::String(registry.name(self.template)?.to_string())),

            Message::GetAllFields => Ok(Value::Map(self.fields.clone())),

            Message::RespondsTo(selector) => {
                Ok(Value::Boolean(self.responds_to(registry, selector)?))
            }

            Message::Send { selector, args } => self.call_method(registry, selector, args),
        }
    }
}
