//! The unified error taxonomy for synchronization operations.
//!
//! Every async operation on the client either completes with its declared
//! result or fails with exactly one [`SyncError`]. Transport-level failures
//! pass through unchanged; API-level error documents are parsed into
//! [`ApiError`] with the HTTP status and any server-supplied detail.
//!
//! # Example
//!
//! ```rust,ignore
//! use jsonapi_sync::SyncError;
//!
//! match client.find_one_by_id("articles", "1").await {
//!     Ok(article) => println!("found {}", article.type_name()),
//!     Err(SyncError::NotFound { type_name, id }) => {
//!         println!("{type_name} {id} does not exist");
//!     }
//!     Err(SyncError::Api(e)) => {
//!         println!("server rejected the request with status {}", e.status);
//!     }
//!     Err(e) => println!("other failure: {e}"),
//! }
//! ```

use thiserror::Error;

use crate::client::TransportError;

/// A single error object from a JSON:API error document.
///
/// Servers may supply any subset of these fields; all are optional on the
/// wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiErrorObject {
    /// The HTTP status code expressed by this error object, as a string.
    pub status: Option<String>,
    /// An application-specific, machine-readable error code.
    pub code: Option<String>,
    /// A short, human-readable summary of the problem.
    pub title: Option<String>,
    /// A human-readable explanation specific to this occurrence.
    pub detail: Option<String>,
    /// A JSON pointer to the offending part of the request document.
    pub source_pointer: Option<String>,
}

/// An error parsed from a server error document.
///
/// Carries the HTTP status of the response plus every error object the
/// server supplied. An empty `errors` list means the response body was not
/// a parseable error document; the status alone still identifies the
/// failure.
#[derive(Debug, Error, Clone)]
#[error("API error (status {status}): {}", self.summary())]
pub struct ApiError {
    /// The HTTP status code of the error response.
    pub status: u16,
    /// The parsed error objects, in document order.
    pub errors: Vec<ApiErrorObject>,
}

impl ApiError {
    /// Returns a one-line summary of the first error object, or a generic
    /// message when the server supplied none.
    #[must_use]
    pub fn summary(&self) -> String {
        self.errors.first().map_or_else(
            || "no error details supplied".to_string(),
            |e| {
                e.title
                    .as_deref()
                    .or(e.detail.as_deref())
                    .or(e.code.as_deref())
                    .unwrap_or("no error details supplied")
                    .to_string()
            },
        )
    }

    /// Returns the first machine-readable error code, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.errors.iter().find_map(|e| e.code.as_deref())
    }
}

/// Unified error type for all synchronization operations.
///
/// The taxonomy is closed: every failure a client operation can produce is
/// one of these variants. Use pattern matching to handle specific cases.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A connectivity-level failure (connection refused, timeout,
    /// cancellation). Passed through from the transport unchanged.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server answered with an error document.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A deserialization input was structurally invalid, e.g. a resource
    /// record missing its type or id.
    #[error("invalid document: {detail}")]
    Validation {
        /// What was wrong with the input.
        detail: String,
    },

    /// A resource record's type has no registered schema.
    #[error("no schema registered for resource type '{type_name}'")]
    UnknownType {
        /// The unregistered type name.
        type_name: String,
    },

    /// A single-resource query yielded zero results.
    #[error("{type_name} with id {id} not found")]
    NotFound {
        /// The requested resource type.
        type_name: String,
        /// The requested id, or `*` for an unkeyed lookup.
        id: String,
    },

    /// A resolved resource is not of the statically requested type.
    #[error("expected a resource of type '{expected}', got '{found}'")]
    TypeMismatch {
        /// The requested type name.
        expected: String,
        /// The type name the server returned.
        found: String,
    },
}

impl SyncError {
    /// Shorthand for building a [`SyncError::Validation`].
    pub(crate) fn validation(detail: impl Into<String>) -> Self {
        Self::Validation {
            detail: detail.into(),
        }
    }
}

// Verify errors are Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<SyncError>();
    assert_send_sync::<ApiError>();
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_summary_prefers_title() {
        let error = ApiError {
            status: 422,
            errors: vec![ApiErrorObject {
                code: Some("invalid_field".to_string()),
                title: Some("Title is blank".to_string()),
                ..Default::default()
            }],
        };

        assert_eq!(error.summary(), "Title is blank");
        assert_eq!(error.code(), Some("invalid_field"));
    }

    #[test]
    fn test_api_error_summary_without_objects() {
        let error = ApiError {
            status: 500,
            errors: vec![],
        };

        assert!(error.summary().contains("no error details"));
        assert!(error.to_string().contains("500"));
    }

    #[test]
    fn test_not_found_message_names_type_and_id() {
        let error = SyncError::NotFound {
            type_name: "articles".to_string(),
            id: "42".to_string(),
        };

        let message = error.to_string();
        assert!(message.contains("articles"));
        assert!(message.contains("42"));
    }

    #[test]
    fn test_type_mismatch_message_names_both_types() {
        let error = SyncError::TypeMismatch {
            expected: "articles".to_string(),
            found: "people".to_string(),
        };

        let message = error.to_string();
        assert!(message.contains("articles"));
        assert!(message.contains("people"));
    }

    #[test]
    fn test_all_variants_implement_std_error() {
        let errors: Vec<SyncError> = vec![
            SyncError::validation("bad"),
            SyncError::UnknownType {
                type_name: "widgets".to_string(),
            },
            SyncError::NotFound {
                type_name: "articles".to_string(),
                id: "1".to_string(),
            },
            SyncError::TypeMismatch {
                expected: "a".to_string(),
                found: "b".to_string(),
            },
        ];

        for error in &errors {
            let _: &dyn std::error::Error = error;
        }
    }
}
