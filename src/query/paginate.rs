use crate::errors::ScoutError;
use serde::{Deserialize, Serialize};

/// Requested page. Both numbers start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSpec {
    page: usize,
    limit: usize,
}

impl PageSpec {
    /// # Errors
    /// Returns a validation error when either number is zero.
    pub fn new(page: usize, limit: usize) -> Result<Self, ScoutError> {
        if page == 0 || limit == 0 {
            return Err(ScoutError::Validation(format!("page ({page}) and limit ({limit}) must be at least 1")));
        }
        Ok(Self { page, limit })
    }

    #[must_use]
    pub const fn page(&self) -> usize {
        self.page
    }

    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }
}

/// The `(skip, limit)` slice of the matching set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub skip: usize,
    pub limit: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRef {
    pub page: usize,
    pub limit: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<PageRef>,
}

#[must_use]
pub const fn page_window(spec: &PageSpec) -> PageWindow {
    PageWindow { skip: (spec.page - 1).saturating_mul(spec.limit), limit: spec.limit }
}

/// `previous` exists past the first page; `next` exists while the window ends before `total`.
#[must_use]
pub const fn paginate(total: usize, spec: &PageSpec) -> Pagination {
    let window = page_window(spec);
    let next = if window.skip.saturating_add(window.limit) < total {
        Some(PageRef { page: spec.page.saturating_add(1), limit: spec.limit })
    } else {
        None
    };
    let previous = if spec.page > 1 { Some(PageRef { page: spec.page - 1, limit: spec.limit }) } else { None };
    Pagination { next, previous }
}
