//! Templates: the nodes of a prototype chain
//!
//! A template owns its method definitions and a single parent link. Only
//! the registry hands out template ids, so a parent always refers to a
//! template that already existed when the link was made.

use crate::instance::Instance;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Stable identity of a template inside its registry
///
/// Two templates are the same node iff their ids are equal, regardless of
/// what methods they define.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TemplateId(pub(crate) usize);

impl TemplateId {
    /// The universal root every chain ends at
    pub const ROOT: Self = Self(0);

    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            write!(f, "template#root")
        } else {
            write!(f, "template#{}", self.0)
        }
    }
}

type BehaviorFn = dyn Fn(&mut Instance, &[Value]) -> anyhow::Result<Value> + Send + Sync;

/// Shared handle to a method behavior
///
/// The instance a method is called on is passed as the receiver, so the
/// behavior can read and write the instance's own fields.
#[derive(Clone)]
pub struct Method(Arc<BehaviorFn>);

impl Method {
    pub fn new<F>(behavior: F) -> Self
    where
        F: Fn(&mut Instance, &[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self(Arc::new(behavior))
    }

    /// A method that ignores its receiver and always answers `value`
    pub fn constant(value: impl Into<Value>) -> Self {
        let value = value.into();
        Self::new(move |_, _| Ok(value.clone()))
    }

    pub fn invoke(&self, receiver: &mut Instance, args: &[Value]) -> anyhow::Result<Value> {
        (self.0)(receiver, args)
    }

    /// Whether both handles point at the same behavior
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Method(..)")
    }
}

/// A node in the inheritance chain
#[derive(Debug, Clone)]
pub struct Template {
    pub(crate) id: TemplateId,
    pub(crate) name: String,
    pub(crate) parent: Option<TemplateId>,
    pub(crate) methods: BTreeMap<String, Method>,
}

impl Template {
    pub(crate) fn new(id: TemplateId, name: String, parent: Option<TemplateId>) -> Self {
        Self {
            id,
            name,
            parent,
            methods: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> TemplateId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `None` only for Root
    pub fn parent(&self) -> Option<TemplateId> {
        self.parent
    }

    /// Look at this template's own definitions, ignoring ancestors
    pub fn own_method(&self, name: &str) -> Option<&Method> {
        self.methods.get(name)
    }

    pub fn own_method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    pub(crate) fn insert(&mut self, name: String, method: Method) -> Option<Method> {
        self.methods.insert(name, method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_display() {
        assert_eq!(TemplateId::ROOT.to_string(), "template#root");
        assert_eq!(TemplateId(3).to_string(), "template#3");
    }

    #[test]
    fn test_constant_method() {
        let method = Method::constant("salary**");
        let mut receiver = Instance::new(TemplateId::ROOT);
        assert_eq!(
            method.invoke(&mut receiver, &[]).unwrap(),
            Value::from("salary**")
        );
    }

    #[test]
    fn test_method_identity() {
        let a = Method::constant(1);
        let b = a.clone();
        let c = Method::constant(1);
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
    }
}
