use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Query parameters for cursor-paginated list endpoints.
///
/// # Cursor
/// Pass the `nextCursor` or `previousCursor` of a previous response to move
/// forward or backward. Omit it for the first page. Cursors are opaque and
/// only valid for the sort order they were issued with.
///
/// # Sorting
/// The `sort` parameter accepts either a comma-separated list of keys, where
/// a leading `-` or a `_desc` suffix sorts descending:
/// ```text
/// -score,title
/// created_at_desc,author.name_asc_nulls_last
/// ```
/// or the React Admin JSON form:
/// ```json
/// ["title", "DESC"]
/// ```
#[derive(Debug, Deserialize, IntoParams, ToSchema, Default)]
#[into_params(parameter_in = Query)]
pub struct CursorOptions {
    /// Opaque cursor from a previous page.
    pub cursor: Option<String>,
    /// Maximum number of rows per page.
    ///
    /// Example: `25`
    #[param(example = 25)]
    pub limit: Option<u64>,
    /// Sort order, e.g. `-score,title` or `["title", "DESC"]`.
    #[param(example = "-score,title")]
    pub sort: Option<String>,
}

/// One page of rows plus the cursors leading to its neighbours.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub rows: Vec<T>,
    /// Cursor for the page after this one, absent on the last page
    pub next_cursor: Option<String>,
    /// Cursor for the page before this one, absent on the first page
    pub previous_cursor: Option<String>,
}

impl<T> Page<T> {
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.next_cursor.is_some()
    }

    #[must_use]
    pub fn has_prev(&self) -> bool {
        self.previous_cursor.is_some()
    }

    /// Convert every row, keeping both cursors
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            rows: self.rows.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
            previous_cursor: self.previous_cursor,
        }
    }
}

impl<T: Serialize> IntoResponse for Page<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
