//! Shared runtime for templates and instances
//!
//! Wraps a [`Registry`] behind a single lock so several tasks can build
//! chains and call methods. Mutation of method maps and parent links takes
//! the exclusive lock; lookups share it. Behaviors run after the registry
//! lock is released, holding only the receiver's own lock.

use crate::config::RuntimeConfig;
use crate::error::{ChainError, Result};
use crate::instance::{Instance, InstanceId};
use crate::message::Message;
use crate::registry::Registry;
use crate::template::{Method, TemplateId};
use crate::value::Value;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// The main runtime for shared templates and instances
pub struct Runtime {
    config: RuntimeConfig,
    registry: RwLock<Registry>,
    instances: DashMap<InstanceId, Arc<RwLock<Instance>>>,
    /// Slots reserved by live or in-flight instances
    reserved: AtomicUsize,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}

impl Runtime {
    /// Create a new runtime with the given configuration
    pub fn new(config: RuntimeConfig) -> Self {
        let registry = Registry::with_config(config.chain.clone());
        Self {
            config,
            registry: RwLock::new(registry),
            instances: DashMap::new(),
            reserved: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn root(&self) -> TemplateId {
        TemplateId::ROOT
    }

    pub async fn create_template(
        &self,
        name: impl Into<String>,
        parent: TemplateId,
    ) -> Result<TemplateId> {
        self.registry.write().await.create_template(name, parent)
    }

    pub async fn define_method(
        &self,
        template: TemplateId,
        name: impl Into<String>,
        method: Method,
    ) -> Result<()> {
        self.registry
            .write()
            .await
            .define_method(template, name, method)
    }

    pub async fn set_parent(&self, template: TemplateId, new_parent: TemplateId) -> Result<()> {
        self.registry.write().await.set_parent(template, new_parent)
    }

    /// Owner of the nearest definition of `name`, if any
    pub async fn resolve_owner(
        &self,
        template: TemplateId,
        name: &str,
    ) -> Result<Option<TemplateId>> {
        let registry = self.registry.read().await;
        Ok(registry.resolve(template, name)?.map(|r| r.owner))
    }

    /// Run `f` against the registry under the shared lock
    pub async fn with_registry<R>(&self, f: impl FnOnce(&Registry) -> R) -> R {
        let registry = self.registry.read().await;
        f(&registry)
    }

    /// Create an instance and keep it in the runtime
    ///
    /// A slot is reserved before the registry is consulted, so concurrent
    /// creates never push the live count past `max_instances`.
    pub async fn create_instance(&self, template: TemplateId) -> Result<InstanceId> {
        self.reserve_slot()?;

        let instance = match self.registry.read().await.create_instance(template) {
            Ok(instance) => instance,
            Err(err) => {
                self.reserved.fetch_sub(1, Ordering::AcqRel);
                return Err(err);
            }
        };
        let id = instance.id();
        self.instances.insert(id, Arc::new(RwLock::new(instance)));
        Ok(id)
    }

    fn reserve_slot(&self) -> Result<()> {
        let max = self.config.max_instances;
        self.reserved
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |live| match max {
                Some(max) if live >= max => None,
                _ => Some(live + 1),
            })
            .map(drop)
            .map_err(|_| ChainError::InstanceLimit(max.unwrap_or(usize::MAX)))
    }

    pub fn instance(&self, id: InstanceId) -> Result<Arc<RwLock<Instance>>> {
        self.instances
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(ChainError::UnknownInstance(id))
    }

    /// Resolve and call a method on a held instance
    pub async fn call_method(&self, id: InstanceId, name: &str, args: &[Value]) -> Result<Value> {
        self.send(id, &Message::send(name, args.to_vec())).await
    }

    /// Dispatch a message to a held instance
    pub async fn send(&self, id: InstanceId, message: &Message) -> Result<Value> {
        let handle = self.instance(id)?;
        let mut instance = handle.write().await;

        let Message::Send { selector, args } = message else {
            let registry = self.registry.read().await;
            return instance.send(&registry, message);
        };

        let method = {
            let registry = self.registry.read().await;
            registry.lookup(instance.template(), selector)?.method.clone()
        };
        method
            .invoke(&mut instance, args)
            .map_err(|source| ChainError::MethodFailed {
                selector: selector.clone(),
                source,
            })
    }

    /// Remove an instance from the runtime, returning its final state
    pub async fn drop_instance(&self, id: InstanceId) -> Result<Instance> {
        let (_, handle) = self
            .instances
            .remove(&id)
            .ok_or(ChainError::UnknownInstance(id))?;
        self.reserved.fetch_sub(1, Ordering::AcqRel);
        let instance = handle.read().await.clone();
        tracing::debug!(instance = %id, "dropped instance");
        Ok(instance)
    }

    /// Get runtime statistics
    pub async fn stats(&self) -> RuntimeStats {
        RuntimeStats {
            templates: self.registry.read().await.len(),
            instances: self.instances.len(),
        }
    }
}

/// Runtime statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeStats {
    pub templates: usize,
    pub instances: usize,
}
