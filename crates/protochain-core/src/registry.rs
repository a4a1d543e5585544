//! Template arena and chain resolution
//!
//! The registry owns every template. Templates refer to their parent by
//! [`TemplateId`], and a new template can only point at an id the registry
//! already handed out, so chains built through [`Registry::create_template`]
//! are acyclic by construction. [`Registry::set_parent`] is the one way to
//! change a link after the fact and it walks the proposed ancestry first.

use crate::config::ChainConfig;
use crate::error::{ChainError, Result};
use crate::instance::Instance;
use crate::template::{Method, Template, TemplateId};
use tracing::{debug, trace, warn};

/// Name given to the root template
pub const ROOT_NAME: &str = "Root";

/// A successful lookup: the nearest definition and the template owning it
#[derive(Debug, Clone)]
pub struct Resolution<'a> {
    pub owner: TemplateId,
    pub method: &'a Method,
}

/// One state of the lookup state machine
#[derive(Debug, Clone)]
pub enum Lookup<'a> {
    /// Checking the own methods of this template next
    Searching(TemplateId),
    Found(Resolution<'a>),
    /// Walked past Root without a match
    Exhausted,
}

impl Lookup<'_> {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Lookup::Searching(_))
    }
}

/// Arena of templates rooted at [`TemplateId::ROOT`]
#[derive(Debug, Clone)]
pub struct Registry {
    config: ChainConfig,
    templates: Vec<Template>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create a registry holding only Root
    pub fn new() -> Self {
        Self::with_config(ChainConfig::default())
    }

    pub fn with_config(config: ChainConfig) -> Self {
        Self {
            config,
            templates: vec![Template::new(
                TemplateId::ROOT,
                ROOT_NAME.to_string(),
                None,
            )],
        }
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn root(&self) -> TemplateId {
        TemplateId::ROOT
    }

    /// Number of templates, Root included
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Never true: Root always exists
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn contains(&self, id: TemplateId) -> bool {
        id.0 < self.templates.len()
    }

    pub fn template(&self, id: TemplateId) -> Result<&Template> {
        self.templates
            .get(id.0)
            .ok_or(ChainError::UnknownTemplate(id))
    }

    fn template_mut(&mut self, id: TemplateId) -> Result<&mut Template> {
        self.templates
            .get_mut(id.0)
            .ok_or(ChainError::UnknownTemplate(id))
    }

    pub fn name(&self, id: TemplateId) -> Result<&str> {
        Ok(self.template(id)?.name())
    }

    pub fn parent(&self, id: TemplateId) -> Result<Option<TemplateId>> {
        Ok(self.template(id)?.parent)
    }

    /// Allocate a template linked to an existing `parent`
    pub fn create_template(
        &mut self,
        name: impl Into<String>,
        parent: TemplateId,
    ) -> Result<TemplateId> {
        let id = TemplateId(self.templates.len());
        if !self.contains(parent) {
            return Err(ChainError::InvalidParent {
                template: id,
                parent,
                reason: "parent does not exist",
            });
        }

        let depth = self.depth(parent)? + 1;
        if let Some(max) = self.config.max_depth {
            if depth > max {
                return Err(ChainError::ChainTooDeep { depth, max });
            }
        }

        let name = name.into();
        debug!(%id, %parent, name = %name, depth, "created template");
        self.templates.push(Template::new(id, name, Some(parent)));
        Ok(id)
    }

    /// Insert or overwrite `name` in the template's own methods
    pub fn define_method(
        &mut self,
        template: TemplateId,
        name: impl Into<String>,
        method: Method,
    ) -> Result<()> {
        let name = name.into();
        let replaced = self.template_mut(template)?.insert(name.clone(), method);
        debug!(%template, method = %name, redefined = replaced.is_some(), "defined method");
        Ok(())
    }

    /// Advance the lookup state machine by one transition
    pub fn step<'a>(&'a self, state: Lookup<'a>, name: &str) -> Result<Lookup<'a>> {
        let Lookup::Searching(current) = state else {
            return Ok(state);
        };

        let node = self.template(current)?;
        if self.config.trace_lookups {
            trace!(template = %current, method = name, "lookup step");
        }

        Ok(match (node.own_method(name), node.parent) {
            (Some(method), _) => Lookup::Found(Resolution {
                owner: current,
                method,
            }),
            (None, None) => Lookup::Exhausted,
            (None, Some(parent)) => Lookup::Searching(parent),
        })
    }

    /// Find the nearest definition of `name` starting at `template`
    ///
    /// Returns `Ok(None)` when the chain is exhausted.
    pub fn resolve(&self, template: TemplateId, name: &str) -> Result<Option<Resolution<'_>>> {
        let mut state = Lookup::Searching(template);
        loop {
            state = self.step(state, name)?;
            match state {
                Lookup::Found(resolution) => return Ok(Some(resolution)),
                Lookup::Exhausted => return Ok(None),
                Lookup::Searching(_) => {}
            }
        }
    }

    /// Like [`resolve`](Self::resolve) but reports exhaustion as `MethodNotFound`
    pub fn lookup(&self, template: TemplateId, name: &str) -> Result<Resolution<'_>> {
        self.resolve(template, name)?
            .ok_or_else(|| ChainError::MethodNotFound {
                selector: name.to_string(),
                template,
            })
    }

    pub fn responds_to(&self, template: TemplateId, name: &str) -> Result<bool> {
        Ok(self.resolve(template, name)?.is_some())
    }

    /// Walk from `template` up to and including Root
    pub fn ancestors(&self, template: TemplateId) -> Ancestors<'_> {
        Ancestors {
            registry: self,
            next: self.contains(template).then_some(template),
        }
    }

    /// Number of links between `template` and Root
    pub fn depth(&self, template: TemplateId) -> Result<usize> {
        self.template(template)?;
        Ok(self.ancestors(template).count() - 1)
    }

    /// Whether `ancestor` appears on the chain of `of`, `of` itself included
    pub fn is_ancestor(&self, ancestor: TemplateId, of: TemplateId) -> bool {
        self.ancestors(of).any(|id| id == ancestor)
    }

    /// Re-link `template` to `new_parent`
    ///
    /// Root keeps its empty parent link. The new parent's chain is walked
    /// first and the call fails if `template` is found on it.
    pub fn set_parent(&mut self, template: TemplateId, new_parent: TemplateId) -> Result<()> {
        self.template(template)?;
        let reject = |reason: &'static str| -> Result<()> {
            warn!(%template, parent = %new_parent, reason, "rejected re-parent");
            Err(ChainError::InvalidParent {
                template,
                parent: new_parent,
                reason,
            })
        };

        if template.is_root() {
            return reject("root has no parent");
        }
        if !self.contains(new_parent) {
            return reject("parent does not exist");
        }
        if self.is_ancestor(template, new_parent) {
            return reject("link would create a cycle");
        }

        if let Some(max) = self.config.max_depth {
            let subtree = self.subtree_height(template);
            let depth = self.depth(new_parent)? + 1 + subtree;
            if depth > max {
                return Err(ChainError::ChainTooDeep { depth, max });
            }
        }

        self.template_mut(template)?.parent = Some(new_parent);
        debug!(%template, parent = %new_parent, "re-parented template");
        Ok(())
    }

    /// Longest chain of descendants hanging below `template`
    ///
    /// Walks every template's ancestry, O(templates * depth). Only called
    /// from `set_parent` when a depth limit is configured.
    fn subtree_height(&self, template: TemplateId) -> usize {
        self.templates
            .iter()
            .filter_map(|t| self.ancestors(t.id).position(|id| id == template))
            .max()
            .unwrap_or(0)
    }

    /// Bind a new instance to an existing template
    pub fn create_instance(&self, template: TemplateId) -> Result<Instance> {
        self.template(template)?;
        let instance = Instance::new(template);
        debug!(instance = %instance.id(), %template, "created instance");
        Ok(instance)
    }
}

/// Iterator over a template and its ancestors, ending at Root
pub struct Ancestors<'a> {
    registry: &'a Registry,
    next: Option<TemplateId>,
}

impl Iterator for Ancestors<'_> {
    type Item = TemplateId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self
            .registry
            .templates
            .get(current.0)
            .and_then(Template::parent);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn test_new_registry_has_root() {
        let registry = Registry::new();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.name(registry.root()).unwrap(), ROOT_NAME);
        assert_eq!(registry.parent(registry.root()).unwrap(), None);
    }

    #[test]
    fn test_step_transitions() {
        let mut registry = Registry::new();
        let a = registry.create_template("A", TemplateId::ROOT).unwrap();
        registry
            .define_method(TemplateId::ROOT, "toString", Method::constant("[object]"))
            .unwrap();

        let state = registry.step(Lookup::Searching(a), "toString").unwrap();
        assert!(matches!(state, Lookup::Searching(id) if id.is_root()));

        let state = registry.step(state, "toString").unwrap();
        assert!(matches!(state, Lookup::Found(ref r) if r.owner.is_root()));

        let state = registry.step(Lookup::Searching(a), "missing").unwrap();
        let state = registry.step(state, "missing").unwrap();
        assert!(matches!(state, Lookup::Exhausted));
        assert!(state.is_terminal());
    }

    #[test]
    fn test_unknown_parent_is_invalid() {
        let mut registry = Registry::new();
        let err = registry
            .create_template("Orphan", TemplateId(42))
            .unwrap_err();
        assert!(matches!(err, ChainError::InvalidParent { .. }));
    }

    #[test]
    fn test_max_depth() {
        let mut registry = Registry::with_config(ChainConfig {
            max_depth: Some(2),
            trace_lookups: true,
        });
        let a = registry.create_template("A", TemplateId::ROOT).unwrap();
        let b = registry.create_template("B", a).unwrap();
        let err = registry.create_template("C", b).unwrap_err();
        assert!(matches!(err, ChainError::ChainTooDeep { depth: 3, max: 2 }));
    }

    #[test]
    fn test_reparent_respects_max_depth_of_subtree() {
        let mut registry = Registry::with_config(ChainConfig {
            max_depth: Some(3),
            trace_lookups: false,
        });
        let a = registry.create_template("A", TemplateId::ROOT).unwrap();
        let b = registry.create_template("B", a).unwrap();
        let c = registry.create_template("C", TemplateId::ROOT).unwrap();
        let d = registry.create_template("D", c).unwrap();

        // Moving A (with child B) under D gives B a depth of 4
        let err = registry.set_parent(a, d).unwrap_err();
        assert!(matches!(err, ChainError::ChainTooDeep { depth: 4, max: 3 }));
        assert_eq!(registry.depth(b).unwrap(), 2);
    }

    #[test]
    fn test_resolution_returns_behavior() {
        let mut registry = Registry::new();
        let a = registry.create_template("A", TemplateId::ROOT).unwrap();
        registry.define_method(a, "f", Method::constant(1)).unwrap();

        let resolution = registry.lookup(a, "f").unwrap();
        let mut receiver = registry.create_instance(a).unwrap();
        assert_eq!(
            resolution.method.invoke(&mut receiver, &[]).unwrap(),
            Value::from(1)
        );
    }
}
