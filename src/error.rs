//! Error types that can be shown to the caller of a command.
//!
//! Internally everything is an `anyhow::Error`. At the command boundary, errors are tagged with an
//! `ErrorType` (via `IntoResult::pub_result`) so that the CLI and MCP surfaces can render a
//! structured `{"detail": ...}` body and a status code.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// The broad kind of failure, used to pick a status code and to decide whether retrying makes
/// sense.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The request was malformed: empty substrings, unknown category, unparseable dates, etc.
    Validation,
    /// A referenced entity does not exist or does not belong to the owner.
    NotFound,
    /// No valid credential was presented.
    Unauthorized,
    /// The storage collaborator failed. Retrying may succeed.
    Storage,
    /// The home directory or configuration file is missing or invalid.
    Config,
}

serde_plain::derive_display_from_serialize!(ErrorType);
serde_plain::derive_fromstr_from_deserialize!(ErrorType);

impl ErrorType {
    /// The HTTP-style status code associated with this kind of error.
    pub fn status(&self) -> u16 {
        match self {
            ErrorType::Validation => 400,
            ErrorType::Unauthorized => 401,
            ErrorType::NotFound => 404,
            ErrorType::Storage => 503,
            ErrorType::Config => 500,
        }
    }
}

/// One entry of a list-shaped error detail.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct DetailItem {
    pub msg: String,
}

/// The `detail` field of an error body: either a single message or a list of messages.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Detail {
    Message(String),
    Items(Vec<DetailItem>),
}

impl Display for Detail {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Detail::Message(s) => write!(f, "{s}"),
            Detail::Items(items) => {
                let joined = items
                    .iter()
                    .map(|i| i.msg.as_str())
                    .collect::<Vec<_>>()
                    .join("; ");
                write!(f, "{joined}")
            }
        }
    }
}

/// An error that is safe to show to the caller.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct PubError {
    #[serde(skip)]
    error_type: Option<ErrorType>,
    detail: Detail,
}

impl PubError {
    pub fn new(error_type: ErrorType, message: impl Into<String>) -> Self {
        Self {
            error_type: Some(error_type),
            detail: Detail::Message(message.into()),
        }
    }

    /// Creates a validation error that lists several problems at once.
    pub fn validation_items<S: Into<String>>(messages: impl IntoIterator<Item = S>) -> Self {
        Self {
            error_type: Some(ErrorType::Validation),
            detail: Detail::Items(
                messages
                    .into_iter()
                    .map(|m| DetailItem { msg: m.into() })
                    .collect(),
            ),
        }
    }

    pub fn error_type(&self) -> ErrorType {
        self.error_type.unwrap_or(ErrorType::Storage)
    }

    pub fn detail(&self) -> &Detail {
        &self.detail
    }

    pub fn status(&self) -> u16 {
        self.error_type().status()
    }

    /// Only storage failures are worth retrying; the engine itself is deterministic.
    pub fn is_retryable(&self) -> bool {
        self.error_type() == ErrorType::Storage
    }

    /// The JSON body for this error, e.g. `{"detail": "Category not found"}`.
    pub fn body(&self) -> serde_json::Value {
        serde_json::json!({ "detail": self.detail })
    }
}

impl Display for PubError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.detail)
    }
}

impl std::error::Error for PubError {}

/// Shorthand for returning a validation error from a function that returns `Result`.
pub(crate) fn validation(message: impl Into<String>) -> Error {
    PubError::new(ErrorType::Validation, message).into()
}

/// Shorthand for returning a not-found error.
pub(crate) fn not_found(message: impl Into<String>) -> Error {
    PubError::new(ErrorType::NotFound, message).into()
}

/// Finds a `PubError` anywhere in the chain of `e`.
pub fn find_pub_error(e: &Error) -> Option<&PubError> {
    e.downcast_ref::<PubError>()
        .or_else(|| e.chain().find_map(|cause| cause.downcast_ref::<PubError>()))
}

/// Converts an internal result into one whose error is a `PubError`.
pub trait IntoResult<T> {
    /// If the error is already a `PubError` it is kept as is. Otherwise it becomes a `PubError` of
    /// type `error_type` whose detail is the full context chain of the original error.
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T> IntoResult<T> for Result<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| {
            if let Some(existing) = find_pub_error(&e) {
                return existing.clone().into();
            }
            PubError::new(error_type, format!("{e:#}")).into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_body() {
        let e = PubError::new(ErrorType::NotFound, "Category not found");
        assert_eq!(e.status(), 404);
        assert_eq!(
            e.body(),
            serde_json::json!({ "detail": "Category not found" })
        );
    }

    #[test]
    fn test_items_body() {
        let e = PubError::validation_items(["a is empty", "b is empty"]);
        assert_eq!(e.status(), 400);
        assert_eq!(
            e.body(),
            serde_json::json!({ "detail": [{ "msg": "a is empty" }, { "msg": "b is empty" }] })
        );
        assert_eq!(e.to_string(), "a is empty; b is empty");
    }

    #[test]
    fn test_pub_result_keeps_existing_type() {
        let r: Result<()> = Err(validation("bad input"));
        let e = r.pub_result(ErrorType::Storage).unwrap_err();
        let p = find_pub_error(&e).unwrap();
        assert_eq!(p.error_type(), ErrorType::Validation);
        assert!(!p.is_retryable());
    }

    #[test]
    fn test_pub_result_wraps_plain_error() {
        let r: Result<()> = Err(anyhow::anyhow!("disk on fire")).map_err(|e| e.context("saving"));
        let e = r.pub_result(ErrorType::Storage).unwrap_err();
        let p = find_pub_error(&e).unwrap();
        assert_eq!(p.error_type(), ErrorType::Storage);
        assert!(p.is_retryable());
        assert!(p.to_string().contains("disk on fire"));
    }

    #[test]
    fn test_context_does_not_hide_pub_error() {
        use anyhow::Context;
        let r: Result<()> = Err(not_found("Account not found"));
        let e = r.context("while inserting").unwrap_err();
        assert_eq!(
            find_pub_error(&e).unwrap().error_type(),
            ErrorType::NotFound
        );
    }
}
