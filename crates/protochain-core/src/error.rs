//! Error taxonomy for chain construction and method dispatch

use crate::instance::InstanceId;
use crate::template::TemplateId;

/// Errors raised by the registry, instances and the shared runtime
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// Lookup walked past Root without finding the selector
    #[error("{template} does not understand: {selector}")]
    MethodNotFound {
        selector: String,
        template: TemplateId,
    },

    /// A parent link would be dangling, cyclic, or touch Root
    #[error("invalid parent {parent} for {template}: {reason}")]
    InvalidParent {
        template: TemplateId,
        parent: TemplateId,
        reason: &'static str,
    },

    #[error("unknown template {0}")]
    UnknownTemplate(TemplateId),

    #[error("unknown instance {0}")]
    UnknownInstance(InstanceId),

    /// Chain depth limit from `ChainConfig::max_depth`
    #[error("chain depth {depth} exceeds limit {max}")]
    ChainTooDeep { depth: usize, max: usize },

    /// A record write that would make the record contain itself
    #[error("record field {key} would contain its own record")]
    CyclicRecord { key: String },

    #[error("instance limit of {0} reached")]
    InstanceLimit(usize),

    /// The resolved behavior itself returned an error
    #[error("method {selector} failed: {source}")]
    MethodFailed {
        selector: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ChainError {
    /// True for the expected negative-lookup outcome
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::MethodNotFound { .. })
    }
}

pub type Result<T, E = ChainError> = std::result::Result<T, E>;
