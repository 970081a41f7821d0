use crate::errors::PaginationError;

/// Page size used when the request does not specify one
pub const DEFAULT_PAGE_SIZE: u64 = 25;
/// Upper bound applied to any requested page size
pub const MAX_PAGE_SIZE: u64 = 100;

/// What to do with a cursor that fails to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedCursorPolicy {
    /// Log a warning and serve the first page as if no cursor was sent
    #[default]
    FirstPage,
    /// Return `PaginationError::MalformedCursor`
    Reject,
}

/// Runtime settings for cursor pagination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationConfig {
    pub default_page_size: u64,
    pub max_page_size: u64,
    pub malformed_cursor: MalformedCursorPolicy,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
            malformed_cursor: MalformedCursorPolicy::default(),
        }
    }
}

impl PaginationConfig {
    #[must_use]
    pub fn with_default_page_size(mut self, page_size: u64) -> Self {
        self.default_page_size = page_size;
        self
    }

    #[must_use]
    pub fn with_max_page_size(mut self, page_size: u64) -> Self {
        self.max_page_size = page_size;
        self
    }

    #[must_use]
    pub fn with_malformed_cursor(mut self, policy: MalformedCursorPolicy) -> Self {
        self.malformed_cursor = policy;
        self
    }

    /// Resolve the page size for a request.
    ///
    /// Missing values use `default_page_size`, values above `max_page_size`
    /// are clamped.
    ///
    /// # Errors
    ///
    /// Returns `PaginationError::InvalidPageSize` when the requested size is zero.
    pub fn resolve_page_size(&self, requested: Option<u64>) -> Result<u64, PaginationError> {
        match requested {
            Some(0) => Err(PaginationError::InvalidPageSize { requested: 0 }),
            Some(size) => Ok(size.min(self.max_page_size)),
            None => Ok(self.default_page_size.min(self.max_page_size)),
        }
    }
}
