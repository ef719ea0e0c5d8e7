//! Canonical response envelope.
//!
//! The backend answers in three shapes: a bare JSON value, `{ success, data, error }`,
//! or `{ success, <resourceName>: ... }`. Everything is adapted into [`Envelope`]
//! right after the body is read so nothing past the client sees the difference.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{fallback_message, DeskError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
}

impl Envelope<Value> {
    /// Normalizes a 2xx body. `resource_key` is the wrapper name some endpoints
    /// use instead of `data` (e.g. `factures`).
    pub fn adapt(body: Value, resource_key: &str) -> Self {
        let mut map = match body {
            Value::Object(map) => map,
            other => {
                return Self {
                    success: true,
                    data: Some(other),
                    error: None,
                }
            }
        };

        let success = map.get("success").and_then(Value::as_bool);
        let error = error_text(map.get("error"));

        let data = if let Some(data) = map.remove("data") {
            Some(data)
        } else if let Some(data) = map.remove(resource_key) {
            Some(data)
        } else if success.is_none() && error.is_none() {
            // Unwrapped object, e.g. a stats payload.
            Some(Value::Object(map))
        } else {
            None
        };

        Self {
            success: success.unwrap_or(error.is_none()),
            data,
            error,
        }
    }

    /// Turns the envelope into the payload or the server's error.
    pub fn into_data(self, status: u16) -> Result<Value> {
        if !self.success {
            return Err(DeskError::Http {
                status,
                message: self.error.unwrap_or_else(|| fallback_message(status)),
            });
        }
        Ok(self.data.unwrap_or(Value::Null))
    }
}

/// Decodes a 2xx body holding a list of `T`. A missing payload is an empty list.
pub fn decode_list<T: DeserializeOwned>(body: Value, resource_key: &str, status: u16) -> Result<Vec<T>> {
    match Envelope::adapt(body, resource_key).into_data(status)? {
        Value::Null => Ok(Vec::new()),
        value => Ok(serde_json::from_value(value)?),
    }
}

/// Decodes a 2xx body holding a single `T`.
pub fn decode_one<T: DeserializeOwned>(body: Value, resource_key: &str, status: u16) -> Result<T> {
    let value = Envelope::adapt(body, resource_key).into_data(status)?;
    Ok(serde_json::from_value(value)?)
}

/// Message from a non-2xx body: `error`, then `message`, then `details`,
/// else the generic fallback.
pub fn error_message(body: Option<&Value>, status: u16) -> String {
    body.and_then(|value| {
        error_text(value.get("error"))
            .or_else(|| error_text(value.get("message")))
            .or_else(|| error_text(value.get("details")))
    })
    .unwrap_or_else(|| fallback_message(status))
}

fn error_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Object(inner) => inner
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: u32,
    }

    #[test]
    fn bare_array_is_the_payload() {
        let items: Vec<Item> = decode_list(json!([{ "id": 1 }, { "id": 2 }]), "items", 200).unwrap();
        assert_eq!(items, vec![Item { id: 1 }, Item { id: 2 }]);
    }

    #[test]
    fn data_wrapper_is_unwrapped() {
        let body = json!({ "success": true, "data": [{ "id": 4 }] });
        let items: Vec<Item> = decode_list(body, "items", 200).unwrap();
        assert_eq!(items, vec![Item { id: 4 }]);
    }

    #[test]
    fn named_wrapper_is_unwrapped() {
        let body = json!({ "success": true, "factures": [{ "id": 9 }] });
        let items: Vec<Item> = decode_list(body, "factures", 200).unwrap();
        assert_eq!(items, vec![Item { id: 9 }]);
    }

    #[test]
    fn success_false_becomes_an_error() {
        let body = json!({ "success": false, "error": "Filière introuvable" });
        let err = decode_list::<Item>(body, "filieres", 200).unwrap_err();
        assert_eq!(err.user_message(), "Filière introuvable");
    }

    #[test]
    fn unwrapped_object_is_kept_whole() {
        let body = json!({ "totalEleves": 120, "totalPaiements": 48 });
        let stats: serde_json::Map<String, Value> = decode_one(body, "stats", 200).unwrap();
        assert_eq!(stats.get("totalEleves"), Some(&json!(120)));
    }

    #[test]
    fn error_message_prefers_error_field() {
        let body = json!({ "message": "second", "error": "first" });
        assert_eq!(error_message(Some(&body), 400), "first");
        let nested = json!({ "error": { "message": "nested" } });
        assert_eq!(error_message(Some(&nested), 400), "nested");
        assert_eq!(error_message(None, 502), fallback_message(502));
    }
}
