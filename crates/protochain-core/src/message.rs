//! Messages sent to instances
//!
//! Field access and method sends share one enum so callers can build a
//! message once and dispatch it through [`Instance::send`](crate::Instance::send).

use crate::value::Value;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pre-built message for dispatch
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Message {
    /// Read an own field: `counter`
    GetField(String),

    /// Write an own field: `counter: 1`
    SetField(String, Value),

    /// Write several own fields at once
    UpdateFields(Vec<(String, Value)>),

    /// Resolve a method through the chain and call it
    Send {
        selector: String,
        args: Vec<Value>,
    },

    /// Name of the direct template
    GetTemplate,
    GetAllFields,
    RespondsTo(String),
}

impl Message {
    /// Shorthand for a method send
    pub fn send(selector: impl Into<String>, args: Vec<Value>) -> Self {
        Self::Send {
            selector: selector.into(),
            args,
        }
    }

    /// Parse a simple message from string (for interactive use)
    ///
    /// A bare word reads a field; `!name args...` sends a method.
    pub fn parse(input: &str) -> Result<Self> {
        let parts: Vec<&str> = input.split_whitespace().collect();

        match parts.as_slice() {
            [] => Err(anyhow!("Empty message")),
            ["template"] => Ok(Self::GetTemplate),
            ["allFields"] => Ok(Self::GetAllFields),
            ["respondsTo:", selector] => Ok(Self::RespondsTo((*selector).to_string())),
            ["respondsTo:"] => Err(anyhow!("respondsTo: needs a selector")),

            // Method send: "!salary" or "!add: 1 2"
            [first, rest @ ..] if first.starts_with('!') => {
                let selector = &first[1..];
                if selector.is_empty() {
                    return Err(anyhow!("Missing selector after '!'"));
                }
                Ok(Self::send(
                    selector,
                    rest.iter().map(|s| parse_value(s)).collect(),
                ))
            }

            // Field setter: "counter: 1" or "counter : 1"
            [field, ":", value] => Ok(Self::SetField(
                field.trim_end_matches(':').to_string(),
                parse_value(value),
            )),
            [field, value] if field.ends_with(':') => Ok(Self::SetField(
                field.trim_end_matches(':').to_string(),
                parse_value(value),
            )),

            // Field getter (must be last single-element pattern)
            [field] => Ok(Self::GetField((*field).to_string())),

            _ => Err(anyhow!("Cannot parse message: {input}")),
        }
    }

    /// The selector (method or field name) for this message
    pub fn selector(&self) -> &str {
        match self {
            Self::GetField(p) | Self::SetField(p, _) => p,
            Self::UpdateFields(_) => "updateFields:",
            Self::Send { selector, .. } => selector,
            Self::GetTemplate => "template",
            Self::GetAllFields => "allFields",
            Self::RespondsTo(_) => "respondsTo:",
        }
    }

    /// Get the number of arguments
    pub fn arg_count(&self) -> usize {
        match self {
            Self::GetField(_) | Self::GetTemplate | Self::GetAllFields => 0,
            Self::SetField(_, _) | Self::RespondsTo(_) => 1,
            Self::UpdateFields(fields) => fields.len(),
            Self::Send { args, .. } => args.len(),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GetField(p) => write!(f, "{p}"),
            Self::SetField(p, v) => write!(f, "{p}: {v}"),
            Self::UpdateFields(fields) => {
                write!(f, "updateFields: [")?;
                for (i, (k, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "]")
            }
            Self::Send { selector, args } => {
                write!(f, "!{selector}")?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                Ok(())
            }
            Self::GetTemplate => write!(f, "template"),
            Self::GetAllFields => write!(f, "allFields"),
            Self::RespondsTo(s) => write!(f, "respondsTo: {s}"),
        }
    }
}

/// Parse a simple value from string
fn parse_value(s: &str) -> Value {
    if let Ok(i) = s.parse::<i64>() {
        return Value::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return Value::Float(f.into());
    }

    match s {
        "true" => Value::Boolean(true),
        "false" => Value::Boolean(false),
        "nil" => Value::Nil,
        _ => s.strip_prefix('#').map_or_else(
            || {
                if s.starts_with('"') && s.ends_with('"') && s.len() >= 2 {
                    Value::String(s[1..s.len() - 1].to_string())
                } else {
                    Value::String(s.to_string())
                }
            },
            |stripped| Value::Symbol(stripped.to_string()),
        ),
    }
}

/// Macro for compile-time message creation
#[macro_export]
macro_rules! msg {
    // Special cases must come first to match before generic patterns

    // Template name: msg!(template)
    (template) => {
        $crate::message::Message::GetTemplate
    };

    // All fields: msg!(allFields)
    (allFields) => {
        $crate::message::Message::GetAllFields
    };

    // Method send: msg!(send salary) / msg!(send add, 1, 2)
    (send $selector:ident $(, $arg:expr)* $(,)?) => {
        $crate::message::Message::Send {
            selector: stringify!($selector).to_string(),
            args: vec![$($crate::value::Value::from($arg)),*],
        }
    };

    // Field setter: msg!(counter: 1)
    ($field:ident : $value:expr) => {
        $crate::message::Message::SetField(
            stringify!($field).to_string(),
            $crate::value::Value::from($value),
        )
    };

    // Field getter: msg!(counter) - must be last
    ($field:ident) => {
        $crate::message::Message::GetField(stringify!($field).to_string())
    };
}
