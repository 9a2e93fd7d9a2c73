//! Structured documents - JSON bodies and twin payloads
//!
//! Thin navigation layer over `serde_json::Value`: parse a byte buffer, then
//! look up values by dotted path (`machine.temperature`). Lookups never
//! fail; a missing key, a non-object in the middle of the path, or a value
//! of the wrong type all come back as `None`.

use serde_json::{Map, Value};
use thiserror::Error;

/// Document parse failure
#[derive(Error, Debug)]
pub enum DocumentError {
    /// Not valid JSON (includes invalid UTF-8)
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Valid JSON whose root is not an object
    #[error("document root is not an object")]
    NotAnObject,
}

/// A parsed JSON document with an object root
#[derive(Debug, Clone)]
pub struct Document {
    root: Map<String, Value>,
}

impl Document {
    /// Parse a byte buffer
    pub fn parse(bytes: &[u8]) -> Result<Self, DocumentError> {
        match serde_json::from_slice::<Value>(bytes)? {
            Value::Object(root) => Ok(Self { root }),
            _ => Err(DocumentError::NotAnObject),
        }
    }

    /// The root object
    pub fn root(&self) -> &Map<String, Value> {
        &self.root
    }

    /// Value at a dotted path
    pub fn nested(&self, path: &str) -> Option<&Value> {
        lookup(&self.root, path)
    }

    /// Number at a dotted path
    pub fn nested_number(&self, path: &str) -> Option<f64> {
        number_at(&self.root, path)
    }

    /// Object at a dotted path
    pub fn nested_object(&self, path: &str) -> Option<&Map<String, Value>> {
        self.nested(path).and_then(Value::as_object)
    }

    /// Whether the root has a field called `name` (no path splitting)
    pub fn has_field(&self, name: &str) -> bool {
        self.root.contains_key(name)
    }
}

/// Value at a dotted path inside `object`
pub fn lookup<'a>(object: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = object.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Number at a dotted path inside `object`
pub fn number_at(object: &Map<String, Value>, path: &str) -> Option<f64> {
    lookup(object, path).and_then(Value::as_f64)
}
