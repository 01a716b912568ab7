//! Entry-key encoding and the display-side decode contract.
//!
//! The key is a JSON array, order-significant:
//! `[method, path, via, bag, field]` plus the message when captured. Two
//! occurrences aggregate together exactly when their serialized keys are
//! byte-identical.

use http::Method;
use serde_json::Value;

use crate::error::RecorderError;
use crate::extract::{FieldError, DEFAULT_BAG};

/// Serialize one field error into its canonical entry key.
pub fn encode_key(method: &Method, path: &str, via: Option<&str>, error: &FieldError) -> String {
    let mut parts = vec![
        Value::from(method.as_str()),
        Value::from(path),
        via.map(Value::from).unwrap_or(Value::Null),
        Value::from(error.bag.as_str()),
        Value::from(error.field.as_str()),
    ];
    if let Some(message) = &error.message {
        parts.push(Value::from(message.as_str()));
    }
    serde_json::to_string(&parts).expect("string arrays always serialize")
}

/// An entry key decoded back into its fields for display.
///
/// A missing sixth element means the recorder was configured not to capture
/// messages, not that no message existed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedKey {
    pub method: String,
    pub path: String,
    pub via: Option<String>,
    pub bag: String,
    pub field: String,
    pub message: Option<String>,
}

impl DecodedKey {
    pub fn parse(key: &str) -> Result<Self, RecorderError> {
        let parts: Vec<Value> = serde_json::from_str(key)?;
        if parts.len() < 5 || parts.len() > 6 {
            return Err(RecorderError::KeyShape);
        }

        let mut parts = parts.into_iter();
        let method = take_string(parts.next())?;
        let path = take_string(parts.next())?;
        let via = match parts.next() {
            Some(Value::Null) => None,
            Some(Value::String(via)) => Some(via),
            _ => return Err(RecorderError::KeyShape),
        };
        let bag = take_string(parts.next())?;
        let field = take_string(parts.next())?;
        let message = match parts.next() {
            None => None,
            Some(Value::String(message)) => Some(message),
            Some(_) => return Err(RecorderError::KeyShape),
        };

        Ok(Self {
            method,
            path,
            via,
            bag,
            field,
            message,
        })
    }

    /// Bag name for display; the default bag shows as no bag at all.
    pub fn display_bag(&self) -> Option<&str> {
        (self.bag != DEFAULT_BAG).then_some(self.bag.as_str())
    }
}

fn take_string(value: Option<Value>) -> Result<String, RecorderError> {
    match value {
        Some(Value::String(s)) => Ok(s),
        _ => Err(RecorderError::KeyShape),
    }
}
