//! Response envelope adapter.
//!
//! The clinic API wraps payloads in one of two shapes:
//!
//! ```text
//! { "success": true, "data": { ... }, "message": "optional" }
//! { "data": { ... } }
//! ```
//!
//! and list payloads are either `data: [...]` or
//! `data: { "items": [...], "total": 42 }`. Anything else is a parse error.

use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::BackendError;

/// Either envelope shape.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    /// Present on `{ success, data, message }` responses.
    #[serde(default)]
    pub success: Option<bool>,
    /// The payload.
    pub data: Option<T>,
    /// Human-readable status message.
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    /// Reject `success: false` responses.
    fn check(&self) -> Result<(), BackendError> {
        if self.success == Some(false) {
            return Err(BackendError::Rejected(
                self.message
                    .clone()
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| super::GENERIC_ERROR_MESSAGE.to_string()),
            ));
        }
        Ok(())
    }

    /// Unwrap the payload.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Rejected` on `success: false` and
    /// `BackendError::Parse` when `data` is absent.
    pub fn into_data(self) -> Result<T, BackendError> {
        self.check()?;
        self.data
            .ok_or_else(|| BackendError::Parse("response has no data field".to_string()))
    }

    /// Accept the response without requiring a payload (deletes, actions).
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Rejected` on `success: false`.
    pub fn into_ack(self) -> Result<Option<String>, BackendError> {
        self.check()?;
        Ok(self.message)
    }
}

/// Either list shape.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListPayload<T> {
    Bare(Vec<T>),
    Paged {
        items: Vec<T>,
        #[serde(default)]
        total: Option<u64>,
    },
}

/// A page of records.
#[derive(Debug, Clone, PartialEq)]
pub struct ListPage<T> {
    /// Records on this page.
    pub items: Vec<T>,
    /// Total matching records, when the API reports it.
    pub total: u64,
}

impl<T> ListPage<T> {
    /// Whether the page has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for ListPage<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
        }
    }
}

impl<T> From<ListPayload<T>> for ListPage<T> {
    fn from(payload: ListPayload<T>) -> Self {
        match payload {
            ListPayload::Bare(items) => Self {
                total: items.len() as u64,
                items,
            },
            ListPayload::Paged { items, total } => Self {
                total: total.unwrap_or(items.len() as u64),
                items,
            },
        }
    }
}

/// Decode a single-record response body.
///
/// # Errors
///
/// Returns `BackendError::Parse` if the body is not an envelope around `T`.
pub fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, BackendError> {
    let envelope: Envelope<T> = serde_json::from_slice(body)
        .map_err(|e| BackendError::Parse(format!("Failed to parse response: {e}")))?;
    envelope.into_data()
}

/// Decode a list response body.
///
/// # Errors
///
/// Returns `BackendError::Parse` if the body is not an envelope around one of
/// the two list shapes.
pub fn decode_list<T: DeserializeOwned>(body: &[u8]) -> Result<ListPage<T>, BackendError> {
    let envelope: Envelope<ListPayload<T>> = serde_json::from_slice(body)
        .map_err(|e| BackendError::Parse(format!("Failed to parse list response: {e}")))?;
    envelope.into_data().map(ListPage::from)
}

/// Decode a response whose payload, if any, is ignored.
///
/// An empty body counts as success.
///
/// # Errors
///
/// Returns `BackendError::Rejected` on `success: false`.
pub fn decode_ack(body: &[u8]) -> Result<Option<String>, BackendError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    match serde_json::from_slice::<Envelope<serde_json::Value>>(body) {
        Ok(envelope) => envelope.into_ack(),
        // Non-envelope bodies on a 2xx are accepted as-is
        Err(_) => Ok(None),
    }
}

/// Pull a human-readable message out of an error response body.
///
/// Looks at `message`, then `error`, then the first entry of `errors`.
#[must_use]
pub fn error_message(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    let text = |v: &serde_json::Value| {
        v.as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
    };

    value
        .get("message")
        .and_then(text)
        .or_else(|| value.get("error").and_then(text))
        .or_else(|| {
            let first = value.get("errors")?.as_array()?.first()?;
            text(first).or_else(|| first.get("message").and_then(text))
        })
}
