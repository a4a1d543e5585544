//! Explicit conversions to primitive representations
//!
//! Nothing here runs implicitly. A caller asks for a representation by
//! [`Hint`] and gets back a [`Primitive`]. Instances can customize the
//! result through their chain: a `toPrimitive` method receives the hint
//! as a symbol; otherwise `toString` and `valueOf` are tried in hint order.

use crate::error::{ChainError, Result};
use crate::instance::Instance;
use crate::registry::Registry;
use crate::value::Value;
use std::fmt;

/// Method consulted first, with the hint as its only argument
pub const TO_PRIMITIVE: &str = "toPrimitive";
pub const TO_STRING: &str = "toString";
pub const VALUE_OF: &str = "valueOf";

/// The kind of representation a caller wants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hint {
    String,
    Number,
    Default,
}

impl Hint {
    pub fn as_str(self) -> &'static str {
        match self {
            Hint::String => "string",
            Hint::Number => "number",
            Hint::Default => "default",
        }
    }

    /// Order in which `toString` / `valueOf` are attempted
    fn method_order(self) -> [&'static str; 2] {
        match self {
            Hint::String => [TO_STRING, VALUE_OF],
            Hint::Number | Hint::Default => [VALUE_OF, TO_STRING],
        }
    }
}

impl fmt::Display for Hint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A primitive representation
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Nil,
    Boolean(bool),
    Number(f64),
    String(String),
}

impl Primitive {
    /// Numeric reading; strings that do not parse give NaN
    pub fn to_number(&self) -> f64 {
        match self {
            Primitive::Nil => 0.0,
            Primitive::Boolean(b) => f64::from(u8::from(*b)),
            Primitive::Number(n) => *n,
            Primitive::String(s) => parse_number(s),
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::Nil => write!(f, "nil"),
            Primitive::Boolean(b) => write!(f, "{b}"),
            Primitive::Number(n) if n.is_nan() => write!(f, "NaN"),
            Primitive::Number(n) => write!(f, "{n}"),
            Primitive::String(s) => write!(f, "{s}"),
        }
    }
}

fn parse_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// Conversion selected by the caller's hint
pub trait ToPrimitive {
    fn to_primitive(&self, hint: Hint) -> Primitive;
}

impl ToPrimitive for Value {
    fn to_primitive(&self, hint: Hint) -> Primitive {
        match (self, hint) {
            (Value::Nil, _) => Primitive::Nil,
            (Value::Boolean(b), _) => Primitive::Boolean(*b),
            (Value::Integer(i), _) => Primitive::Number(*i as f64),
            (Value::Float(f), _) => Primitive::Number(f.into_inner()),
            (Value::String(s) | Value::Symbol(s), _) => Primitive::String(s.clone()),
            (_, Hint::Number) => Primitive::Number(f64::NAN),
            (structured, _) => Primitive::String(to_json(structured)),
        }
    }
}

impl Value {
    /// Explicit numeric conversion
    pub fn to_number(&self) -> f64 {
        self.to_primitive(Hint::Number).to_number()
    }

    /// Explicit string conversion
    pub fn to_display_string(&self) -> String {
        self.to_primitive(Hint::String).to_string()
    }
}

fn to_json(value: &Value) -> String {
    plain_json(value).to_string()
}

/// JSON without the serde type tags, for string representations
fn plain_json(value: &Value) -> serde_json::Value {
    use serde_json::Value as Json;
    match value {
        Value::Nil => Json::Null,
        Value::Boolean(b) => Json::Bool(*b),
        Value::Integer(i) => Json::from(*i),
        Value::Float(f) => Json::from(f.into_inner()),
        Value::String(s) | Value::Symbol(s) => Json::String(s.clone()),
        Value::Array(items) => Json::Array(items.iter().map(plain_json).collect()),
        Value::Map(map) => map
            .iter()
            .map(|(k, v)| (k.clone(), plain_json(v)))
            .collect::<serde_json::Map<String, Json>>()
            .into(),
        Value::Record(record) => record
            .snapshot()
            .iter()
            .map(|(k, v)| (k.clone(), plain_json(v)))
            .collect::<serde_json::Map<String, Json>>()
            .into(),
    }
}

/// Convert an instance, consulting its chain for conversion methods
///
/// Results that are not primitive are skipped. With no usable method the
/// string form is the JSON of the instance's fields and the number form
/// is NaN.
pub fn instance_to_primitive(
    instance: &mut Instance,
    registry: &Registry,
    hint: Hint,
) -> Result<Primitive> {
    if registry.responds_to(instance.template(), TO_PRIMITIVE)? {
        let hint_arg = Value::Symbol(hint.as_str().to_string());
        let result = instance.call_method(registry, TO_PRIMITIVE, &[hint_arg])?;
        if !result.is_primitive() {
            return Err(ChainError::MethodFailed {
                selector: TO_PRIMITIVE.to_string(),
                source: anyhow::anyhow!("returned a {}", result.type_name()),
            });
        }
        return Ok(result.to_primitive(hint));
    }

    for name in hint.method_order() {
        if !registry.responds_to(instance.template(), name)? {
            continue;
        }
        let result = instance.call_method(registry, name, &[])?;
        if result.is_primitive() {
            return Ok(result.to_primitive(hint));
        }
    }

    Ok(match hint {
        Hint::Number => Primitive::Number(f64::NAN),
        Hint::String | Hint::Default => {
            Primitive::String(to_json(&Value::Map(instance.fields().clone())))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hint_order() {
        assert_eq!(Hint::String.method_order(), [TO_STRING, VALUE_OF]);
        assert_eq!(Hint::Number.method_order(), [VALUE_OF, TO_STRING]);
        assert_eq!(Hint::Default.method_order(), [VALUE_OF, TO_STRING]);
    }

    #[test]
    fn test_string_to_number() {
        assert_eq!(Value::from("21").to_number(), 21.0);
        assert_eq!(Value::from("").to_number(), 0.0);
        assert!(Value::from("a").to_number().is_nan());
        assert_eq!(Value::from(true).to_number(), 1.0);
    }

    #[test]
    fn test_map_string_form() {
        let value = Value::Map([("age".to_string(), Value::from(25))].into_iter().collect());
        assert_eq!(value.to_display_string(), r#"{"age":25}"#);
    }
}
