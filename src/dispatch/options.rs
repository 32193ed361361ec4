//! Dispatch Options and Object-Style Actions

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CacheError, Result};

/// Field naming the action type in an object-style action.
const TYPE_FIELD: &str = "type";
/// Field carrying a per-call timeout in an object-style action.
const TIMEOUT_FIELD: &str = "timeout";

// == Dispatch Options ==
/// Per-call options of a cached dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchOptions {
    /// TTL in milliseconds for the result of this call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl DispatchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options with a call-level TTL.
    pub fn with_timeout(timeout_ms: u64) -> Self {
        Self {
            timeout: Some(timeout_ms),
        }
    }
}

// == Action ==
/// An action written as a single object, `{ "type": "fetchUser", "id": 1 }`.
///
/// The remaining fields, minus `type` and `timeout`, form the payload. An
/// object with nothing but a type therefore has an empty-object payload, which
/// keys differently from a dispatch with no payload at all.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    action_type: String,
    payload: Value,
    timeout: Option<u64>,
}

impl Action {
    /// Builds an action from its parts.
    pub fn new(action_type: impl Into<String>, payload: Map<String, Value>) -> Self {
        Self {
            action_type: action_type.into(),
            payload: Value::Object(payload),
            timeout: None,
        }
    }

    /// Parses an object-style action.
    ///
    /// A `timeout` that is not a non-negative integer is ignored.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut fields) = value else {
            return Err(CacheError::MissingActionType);
        };

        let action_type = match fields.remove(TYPE_FIELD) {
            Some(Value::String(name)) if !name.is_empty() => name,
            Some(Value::String(_)) => return Err(CacheError::EmptyActionType),
            _ => return Err(CacheError::MissingActionType),
        };
        let timeout = fields.remove(TIMEOUT_FIELD).and_then(|t| t.as_u64());

        Ok(Self {
            action_type,
            payload: Value::Object(fields),
            timeout,
        })
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout = Some(timeout_ms);
        self
    }

    pub fn action_type(&self) -> &str {
        &self.action_type
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn timeout(&self) -> Option<u64> {
        self.timeout
    }

    /// Call-level timeout: explicit options win over the embedded one.
    pub(crate) fn call_timeout(&self, options: &DispatchOptions) -> Option<u64> {
        options.timeout.or(self.timeout)
    }

    /// Splits the action into its type and payload.
    pub(crate) fn into_parts(self) -> (String, Value) {
        (self.action_type, self.payload)
    }
}

impl TryFrom<Value> for Action {
    type Error = CacheError;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_options_deserialize() {
        let opts: DispatchOptions = serde_json::from_str(r#"{"timeout": 250}"#).unwrap();
        assert_eq!(opts, DispatchOptions::with_timeout(250));

        let opts: DispatchOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts.timeout, None);
    }

    #[test]
    fn test_action_from_value() {
        let action =
            Action::from_value(json!({"type": "fetchUser", "id": 1, "timeout": 500})).unwrap();

        assert_eq!(action.action_type(), "fetchUser");
        assert_eq!(action.payload(), &json!({"id": 1}));
        assert_eq!(action.timeout(), Some(500));
    }

    #[test]
    fn test_action_type_only() {
        let action = Action::try_from(json!({"type": "ping"})).unwrap();
        assert_eq!(action.payload(), &json!({}));
        assert_eq!(action.timeout(), None);
    }

    #[test]
    fn test_action_missing_type() {
        assert_eq!(
            Action::from_value(json!({"id": 1})),
            Err(CacheError::MissingActionType)
        );
        assert_eq!(
            Action::from_value(json!({"type": 3})),
            Err(CacheError::MissingActionType)
        );
        assert_eq!(
            Action::from_value(json!("fetchUser")),
            Err(CacheError::MissingActionType)
        );
        assert_eq!(
            Action::from_value(json!({"type": ""})),
            Err(CacheError::EmptyActionType)
        );
    }

    #[test]
    fn test_invalid_timeout_ignored() {
        let action = Action::from_value(json!({"type": "x", "timeout": -5})).unwrap();
        assert_eq!(action.timeout(), None);
        assert_eq!(action.payload(), &json!({}));
    }

    #[test]
    fn test_call_timeout_precedence() {
        let action = Action::new("x", Map::new()).with_timeout(100);

        assert_eq!(action.call_timeout(&DispatchOptions::new()), Some(100));
        assert_eq!(action.call_timeout(&DispatchOptions::with_timeout(5)), Some(5));
    }

    #[test]
    fn test_into_parts_drops_timeout() {
        let action =
            Action::from_value(json!({"type": "fetchUser", "id": 1, "timeout": 500})).unwrap();

        let (action_type, payload) = action.into_parts();

        assert_eq!(action_type, "fetchUser");
        assert_eq!(payload, json!({"id": 1}));
    }
}
