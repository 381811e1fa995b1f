//! Attribute schemas and typed, fail-closed decoding
//!
//! Every value handed over by the engine goes through one of the typed
//! getters below before it is used. Anything with an unexpected shape is
//! reported as a [`DecodeError`] instead of being coerced.

use crate::types::{Attributes, Diagnostics, Value};
use std::collections::BTreeMap;

/// The kind of value an attribute holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    String,
    Bool,
    /// Map of string to string
    StringMap,
}

impl AttributeKind {
    fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null | Value::Unknown) => true,
            (Self::String, Value::String(_)) => true,
            (Self::Bool, Value::Bool(_)) => true,
            (Self::StringMap, Value::Map(entries)) => entries
                .values()
                .all(|v| matches!(v, Value::String(_) | Value::Unknown)),
            _ => false,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Bool => "bool",
            Self::StringMap => "map of string",
        }
    }
}

/// Declaration of a single attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSchema {
    pub kind: AttributeKind,
    pub required: bool,
    pub optional: bool,
    /// Filled in by the provider when not set
    pub computed: bool,
    /// Must never be shown in plain text
    pub sensitive: bool,
}

impl AttributeSchema {
    pub fn required(kind: AttributeKind) -> Self {
        Self {
            kind,
            required: true,
            optional: false,
            computed: false,
            sensitive: false,
        }
    }

    pub fn optional(kind: AttributeKind) -> Self {
        Self {
            kind,
            required: false,
            optional: true,
            computed: false,
            sensitive: false,
        }
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }
}

/// Schema of a resource type or of the provider configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    pub attributes: BTreeMap<String, AttributeSchema>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style attribute declaration
    pub fn with_attribute(mut self, name: impl Into<String>, attribute: AttributeSchema) -> Self {
        self.attributes.insert(name.into(), attribute);
        self
    }

    /// Names of attributes that must not be displayed
    pub fn sensitive_attributes(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .iter()
            .filter(|(_, a)| a.sensitive)
            .map(|(name, _)| name.as_str())
    }

    /// Validate a set of attributes against the schema
    ///
    /// Reports undeclared attributes, wrong value kinds and missing
    /// required attributes as error diagnostics.
    pub fn validate(&self, attrs: &Attributes) -> Diagnostics {
        let mut diags = Diagnostics::new();

        for (name, value) in attrs {
            match self.attributes.get(name) {
                None => diags.error(
                    "Unsupported attribute",
                    format!("An attribute named \"{name}\" is not expected here"),
                ),
                Some(schema) if !schema.kind.accepts(value) => diags.error(
                    "Incorrect attribute value type",
                    format!(
                        "Attribute \"{name}\" must be a {}, got {}",
                        schema.kind.describe(),
                        value.kind()
                    ),
                ),
                Some(_) => {}
            }
        }

        for (name, schema) in &self.attributes {
            let missing = attrs.get(name).is_none_or(Value::is_null);
            if schema.required && missing {
                diags.error(
                    "Missing required attribute",
                    format!("The attribute \"{name}\" is required, but no definition was found"),
                );
            }
        }

        diags
    }
}

/// Failure to decode an attribute into its Rust type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("attribute \"{0}\" is required")]
    Missing(String),

    #[error("attribute \"{0}\" is not known yet")]
    Unknown(String),

    #[error("attribute \"{name}\" must be a {expected}, got {found}")]
    WrongType {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
}

fn present<'a>(attrs: &'a Attributes, name: &str) -> Result<Option<&'a Value>, DecodeError> {
    match attrs.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Unknown) => Err(DecodeError::Unknown(name.to_string())),
        Some(value) => Ok(Some(value)),
    }
}

/// Read an optional string attribute
pub fn get_string(attrs: &Attributes, name: &str) -> Result<Option<String>, DecodeError> {
    match present(attrs, name)? {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(DecodeError::WrongType {
            name: name.to_string(),
            expected: "string",
            found: other.kind(),
        }),
    }
}

/// Read a required string attribute
pub fn require_string(attrs: &Attributes, name: &str) -> Result<String, DecodeError> {
    get_string(attrs, name)?.ok_or_else(|| DecodeError::Missing(name.to_string()))
}

/// Read an optional bool attribute
pub fn get_bool(attrs: &Attributes, name: &str) -> Result<Option<bool>, DecodeError> {
    match present(attrs, name)? {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(DecodeError::WrongType {
            name: name.to_string(),
            expected: "bool",
            found: other.kind(),
        }),
    }
}

/// Read an optional map-of-string attribute
///
/// Every element must be a known string; one bad element rejects the map.
pub fn get_string_map(
    attrs: &Attributes,
    name: &str,
) -> Result<Option<BTreeMap<String, String>>, DecodeError> {
    let entries = match present(attrs, name)? {
        None => return Ok(None),
        Some(Value::Map(entries)) => entries,
        Some(other) => {
            return Err(DecodeError::WrongType {
                name: name.to_string(),
                expected: "map of string",
                found: other.kind(),
            });
        }
    };

    let mut out = BTreeMap::new();
    for (key, value) in entries {
        let element = format!("{name}.{key}");
        match value {
            Value::String(s) => {
                out.insert(key.clone(), s.clone());
            }
            Value::Unknown => return Err(DecodeError::Unknown(element)),
            other => {
                return Err(DecodeError::WrongType {
                    name: element,
                    expected: "string",
                    found: other.kind(),
                });
            }
        }
    }
    Ok(Some(out))
}
