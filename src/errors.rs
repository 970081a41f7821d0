//! # Error Handling for Cursor Pagination
//!
//! This module provides the error type returned by every pagination operation:
//! - Malformed cursors map to `400 Bad Request` with a short, user-facing reason
//! - Invalid page sizes map to `400 Bad Request`
//! - Query execution failures map to `500 Internal Server Error`, with the
//!   underlying `DbErr` logged server-side and never sent to the client
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cursorcrate::{PaginationError, paginate};
//!
//! async fn list_posts(
//!     State(db): State<DatabaseConnection>,
//!     Query(options): Query<CursorOptions>,
//! ) -> Result<Page<post::Model>, PaginationError> {
//!     let page_size = config.resolve_page_size(options.limit)?;
//!     paginate(&db, &query, &graph, page_size, options.cursor.as_deref(), &config).await
//! }
//! ```
//!
//! Database errors are propagated unmodified inside [`PaginationError::Query`];
//! pagination never retries and never turns a failed query into an empty page.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;
use std::fmt;

/// A cursor string that could not be decoded into a `CursorPayload`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedCursor {
    /// Why decoding failed (safe to show to the caller)
    pub reason: String,
}

impl MalformedCursor {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for MalformedCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Malformed cursor: {}", self.reason)
    }
}

impl std::error::Error for MalformedCursor {}

/// Errors produced while paginating a query.
#[derive(Debug)]
pub enum PaginationError {
    /// 400 Bad Request - The cursor could not be decoded
    MalformedCursor(MalformedCursor),

    /// 400 Bad Request - Page size was zero
    InvalidPageSize {
        /// The page size that was requested
        requested: u64,
    },

    /// 500 Internal Server Error - The underlying query failed (details logged, not exposed)
    Query(DbErr),
}

impl PaginationError {
    /// Create a malformed-cursor error
    pub fn malformed_cursor(reason: impl Into<String>) -> Self {
        Self::MalformedCursor(MalformedCursor::new(reason))
    }

    /// Get the HTTP status code for this error
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedCursor(_) | Self::InvalidPageSize { .. } => StatusCode::BAD_REQUEST,
            Self::Query(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the user-facing error message (sanitized)
    fn user_message(&self) -> String {
        match self {
            Self::MalformedCursor(err) => err.to_string(),
            Self::InvalidPageSize { requested } => {
                format!("Page size must be a positive integer, got {requested}")
            }
            Self::Query(_) => "A database error occurred".to_string(),
        }
    }

    /// Log internal error details (not sent to user)
    fn log_internal(&self) {
        match self {
            Self::Query(internal) => {
                tracing::error!(error = ?internal, "Pagination query failed");
            }
            _ => {
                tracing::debug!(
                    error = %self.user_message(),
                    status = %self.status_code(),
                    "Pagination error"
                );
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for PaginationError {
    fn into_response(self) -> Response {
        self.log_internal();

        let status = self.status_code();
        let body = ErrorResponse {
            error: self.user_message(),
        };

        (status, Json(body)).into_response()
    }
}

impl fmt::Display for PaginationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // The raw database error is only shown to developers, never in responses
            Self::Query(err) => write!(f, "Pagination query failed: {err}"),
            _ => write!(f, "{}", self.user_message()),
        }
    }
}

impl std::error::Error for PaginationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MalformedCursor(err) => Some(err),
            Self::Query(err) => Some(err),
            Self::InvalidPageSize { .. } => None,
        }
    }
}

impl From<DbErr> for PaginationError {
    fn from(err: DbErr) -> Self {
        Self::Query(err)
    }
}

impl From<MalformedCursor> for PaginationError {
    fn from(err: MalformedCursor) -> Self {
        Self::MalformedCursor(err)
    }
}
