//! Protochain Core
//!
//! Prototype-style delegation with explicit chains:
//! - Templates linked by a single parent, ending at a universal Root
//! - Instances bound to one direct template, holding only their own fields
//! - Method lookup walking parent links, nearest definition wins
//! - Explicit value copy vs. shared records, and hint-driven conversions
//! - A lock-guarded runtime for sharing chains between tasks

pub mod coercion;
pub mod config;
pub mod error;
pub mod instance;
pub mod message;
pub mod registry;
pub mod runtime;
pub mod template;
pub mod value;

pub use coercion::{instance_to_primitive, Hint, Primitive, ToPrimitive};
pub use config::{ChainConfig, RuntimeConfig};
pub use error::ChainError;
pub use instance::{Instance, InstanceId, InstanceState};
pub use message::Message;
pub use registry::{Lookup, Registry, Resolution};
pub use runtime::{Runtime, RuntimeStats};
pub use template::{Method, Template, TemplateId};
pub use value::{Record, Value};
