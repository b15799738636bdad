//! Request Validation
//!
//! Untrusted payloads are checked against a declared [`Schema`] before they
//! reach persistence. Validation never stops at the first problem: every
//! field is visited in declaration order and every violation is collected,
//! so a client can fix its whole request from a single response.
//!
//! On success the caller receives a coerced object: defaults applied,
//! integers normalised, and any field the schema does not declare dropped.
//!
//! ```
//! use orchestra_core::{FieldSpec, Schema};
//! use serde_json::json;
//!
//! let schema = Schema::new(
//!     "Example",
//!     vec![
//!         FieldSpec::string("name").min_len(1).max_len(10),
//!         FieldSpec::enumeration("mode", &["FAST", "SLOW"]).default_value(json!("SLOW")),
//!     ],
//! )
//! .unwrap();
//!
//! let data = schema.validate(&json!({ "name": "x", "extra": true })).unwrap();
//! assert_eq!(data["mode"], "SLOW");
//! assert!(!data.contains_key("extra"));
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

use crate::error::SchemaError;

// ============================================================================
// ERROR REPORTING
// ============================================================================

/// A single violation, addressed by dotted field path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FieldError {
    /// Dotted path of the offending field; empty for the payload itself
    pub field: String,
    /// Human-readable description of the problem
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Ordered list of every violation found in one payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    pub fn into_errors(self) -> Vec<FieldError> {
        self.0
    }

    /// Whether any violation is reported against `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }
}

impl From<Vec<FieldError>> for ValidationErrors {
    fn from(errors: Vec<FieldError>) -> Self {
        Self(errors)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", e.field, e.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

// ============================================================================
// SCHEMA DECLARATION
// ============================================================================

/// Primitive type and bounds of a field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// String with optional inclusive length bounds, counted in characters.
    String {
        min: Option<usize>,
        max: Option<usize>,
    },
    /// Whole JSON number with optional inclusive bounds.
    Integer { min: Option<f64>, max: Option<f64> },
    /// String restricted to a fixed set of values.
    Enum { values: &'static [&'static str] },
}

/// Whether a field must be present, and what happens when it is not.
#[derive(Debug, Clone, PartialEq)]
pub enum Presence {
    Required,
    Optional,
    Default(Value),
}

/// Declaration of one field in a [`Schema`].
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    path: String,
    kind: FieldKind,
    presence: Presence,
}

impl FieldSpec {
    fn with_kind(path: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            path: path.into(),
            kind,
            presence: Presence::Required,
        }
    }

    /// A required string field.
    pub fn string(path: impl Into<String>) -> Self {
        Self::with_kind(path, FieldKind::String { min: None, max: None })
    }

    /// A required integer field.
    pub fn integer(path: impl Into<String>) -> Self {
        Self::with_kind(path, FieldKind::Integer { min: None, max: None })
    }

    /// A required field restricted to `values`.
    pub fn enumeration(path: impl Into<String>, values: &'static [&'static str]) -> Self {
        Self::with_kind(path, FieldKind::Enum { values })
    }

    /// Minimum length in characters. Ignored for non-string fields.
    pub fn min_len(mut self, n: usize) -> Self {
        if let FieldKind::String { min, .. } = &mut self.kind {
            *min = Some(n);
        }
        self
    }

    /// Maximum length in characters. Ignored for non-string fields.
    pub fn max_len(mut self, n: usize) -> Self {
        if let FieldKind::String { max, .. } = &mut self.kind {
            *max = Some(n);
        }
        self
    }

    /// Inclusive numeric lower bound. Ignored for non-numeric fields.
    pub fn min(mut self, n: f64) -> Self {
        if let FieldKind::Integer { min, .. } = &mut self.kind {
            *min = Some(n);
        }
        self
    }

    /// Inclusive numeric upper bound. Ignored for non-numeric fields.
    pub fn max(mut self, n: f64) -> Self {
        if let FieldKind::Integer { max, .. } = &mut self.kind {
            *max = Some(n);
        }
        self
    }

    /// Absent values are left absent.
    pub fn optional(mut self) -> Self {
        self.presence = Presence::Optional;
        self
    }

    /// Absent values are replaced by `value`.
    pub fn default_value(mut self, value: Value) -> Self {
        self.presence = Presence::Default(value);
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn presence(&self) -> &Presence {
        &self.presence
    }

    /// Type check, then bounds. Returns the coerced value.
    fn check(&self, value: &Value) -> Result<Value, String> {
        match &self.kind {
            FieldKind::String { min, max } => {
                let s = value
                    .as_str()
                    .ok_or_else(|| expected("string", value))?;
                let len = s.chars().count();
                if let Some(min) = min {
                    if len < *min {
                        return Err(format!("String must contain at least {} character(s)", min));
                    }
                }
                if let Some(max) = max {
                    if len > *max {
                        return Err(format!("String must contain at most {} character(s)", max));
                    }
                }
                Ok(Value::String(s.to_string()))
            }
            FieldKind::Integer { min, max } => {
                let n = value.as_f64().ok_or_else(|| expected("number", value))?;
                if n.fract() != 0.0 {
                    return Err("Expected integer, received float".to_string());
                }
                if let Some(min) = min {
                    if n < *min {
                        return Err(format!("Number must be greater than or equal to {}", min));
                    }
                }
                if let Some(max) = max {
                    if n > *max {
                        return Err(format!("Number must be less than or equal to {}", max));
                    }
                }
                Ok(Value::from(n as i64))
            }
            FieldKind::Enum { values } => {
                let s = value
                    .as_str()
                    .ok_or_else(|| expected("string", value))?;
                if values.contains(&s) {
                    Ok(Value::String(s.to_string()))
                } else {
                    let options = values
                        .iter()
                        .map(|v| format!("'{}'", v))
                        .collect::<Vec<_>>()
                        .join(" | ");
                    Err(format!(
                        "Invalid enum value. Expected {}, received '{}'",
                        options, s
                    ))
                }
            }
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn expected(kind: &str, value: &Value) -> String {
    format!("Expected {}, received {}", kind, type_name(value))
}

/// An ordered set of field declarations for one kind of request.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    name: &'static str,
    fields: Vec<FieldSpec>,
}

impl Schema {
    /// Build a schema, rejecting declarations that could never validate
    /// consistently.
    pub fn new(name: &'static str, fields: Vec<FieldSpec>) -> Result<Self, SchemaError> {
        let mut seen = HashSet::new();
        for field in &fields {
            if field.path.split('.').any(str::is_empty) {
                return Err(SchemaError::EmptyFieldName {
                    schema: name.to_string(),
                    field: field.path.clone(),
                });
            }
            if !seen.insert(field.path.as_str()) {
                return Err(SchemaError::DuplicateField {
                    schema: name.to_string(),
                    field: field.path.clone(),
                });
            }
            match &field.kind {
                FieldKind::String {
                    min: Some(min),
                    max: Some(max),
                } if min > max => {
                    return Err(SchemaError::InvertedBounds {
                        schema: name.to_string(),
                        field: field.path.clone(),
                        min: min.to_string(),
                        max: max.to_string(),
                    });
                }
                FieldKind::Integer {
                    min: Some(min),
                    max: Some(max),
                } if min > max => {
                    return Err(SchemaError::InvertedBounds {
                        schema: name.to_string(),
                        field: field.path.clone(),
                        min: min.to_string(),
                        max: max.to_string(),
                    });
                }
                FieldKind::Enum { values } if values.is_empty() => {
                    return Err(SchemaError::EmptyEnum {
                        schema: name.to_string(),
                        field: field.path.clone(),
                    });
                }
                _ => {}
            }
            if let Presence::Default(default) = &field.presence {
                field
                    .check(default)
                    .map_err(|reason| SchemaError::InvalidDefault {
                        schema: name.to_string(),
                        field: field.path.clone(),
                        reason,
                    })?;
            }
        }
        Ok(Self { name, fields })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Check `payload`, returning the coerced object or every violation.
    pub fn validate(&self, payload: &Value) -> Result<Map<String, Value>, ValidationErrors> {
        let root = match payload.as_object() {
            Some(root) => root,
            None => {
                return Err(ValidationErrors::from(vec![FieldError::new(
                    "",
                    expected("object", payload),
                )]));
            }
        };

        let mut errors = ValidationErrors::new();
        let mut output = Map::new();

        for field in &self.fields {
            let value = match lookup(root, &field.path) {
                Ok(value) => value,
                Err(error) => {
                    errors.push(error);
                    continue;
                }
            };

            match value {
                Some(value) => match field.check(value) {
                    Ok(coerced) => insert(&mut output, &field.path, coerced),
                    Err(message) => errors.push(FieldError::new(field.path.clone(), message)),
                },
                None => match &field.presence {
                    Presence::Required => {
                        errors.push(FieldError::new(field.path.clone(), "Required"));
                    }
                    Presence::Optional => {}
                    Presence::Default(default) => {
                        insert(&mut output, &field.path, default.clone());
                    }
                },
            }
        }

        if errors.is_empty() {
            Ok(output)
        } else {
            Err(errors)
        }
    }
}

/// Resolve a dotted path. A missing key anywhere along the way is "absent";
/// a non-object parent is a type error reported against the parent's path.
fn lookup<'a>(root: &'a Map<String, Value>, path: &str) -> Result<Option<&'a Value>, FieldError> {
    let mut current = root;
    let mut walked = String::new();
    let mut segments = path.split('.').peekable();

    while let Some(segment) = segments.next() {
        if !walked.is_empty() {
            walked.push('.');
        }
        walked.push_str(segment);

        let value = match current.get(segment) {
            Some(value) => value,
            None => return Ok(None),
        };
        if segments.peek().is_none() {
            return Ok(Some(value));
        }
        current = value
            .as_object()
            .ok_or_else(|| FieldError::new(walked.clone(), expected("object", value)))?;
    }
    Ok(None)
}

fn insert(output: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            output.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let child = output
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            if let Value::Object(child) = child {
                insert(child, rest, value);
            }
        }
    }
}

// ============================================================================
// TYPED VALIDATION
// ============================================================================

/// A request type whose shape is described by a [`Schema`].
///
/// The validated object is deserialized into `Self`, so the struct's serde
/// field names must match the schema's paths.
pub trait Validate: DeserializeOwned {
    fn schema() -> &'static Schema;

    /// Validate `payload` and convert the coerced object into `Self`.
    fn from_payload(payload: &Value) -> Result<Self, ValidationErrors> {
        let data = Self::schema().validate(payload)?;
        serde_json::from_value(Value::Object(data)).map_err(|e| {
            // The schema admitted something the struct cannot hold.
            ValidationErrors::from(vec![FieldError::new(
                "",
                format!("{} schema and type disagree: {}", Self::schema().name(), e),
            )])
        })
    }
}

/// Validate `payload` against `T`'s schema.
pub fn validate<T: Validate>(payload: &Value) -> Result<T, ValidationErrors> {
    T::from_payload(payload)
}
