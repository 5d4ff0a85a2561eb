//! Offset paging and sorting of search results.

use serde::{Deserialize, Serialize};

/// Default page size.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Offset-based paging with an optional sort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paging {
    /// Offset of the first hit.
    #[serde(default)]
    pub from: u32,

    /// Maximum number of hits.
    #[serde(default = "default_size")]
    pub size: u32,

    /// Dotted property path, matched case-insensitively.
    #[serde(default)]
    pub sort_by: Option<String>,

    #[serde(default)]
    pub descending: bool,
}

fn default_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for Paging {
    fn default() -> Self {
        Self {
            from: 0,
            size: DEFAULT_PAGE_SIZE,
            sort_by: None,
            descending: false,
        }
    }
}

impl Paging {
    pub fn new(from: u32, size: u32) -> Self {
        Self {
            from,
            size,
            ..Default::default()
        }
    }

    /// Sorts ascending by `path`.
    pub fn sort_by(mut self, path: impl Into<String>) -> Self {
        self.sort_by = Some(path.into());
        self.descending = false;
        self
    }

    /// Sorts descending by `path`.
    pub fn sort_by_desc(mut self, path: impl Into<String>) -> Self {
        self.sort_by = Some(path.into());
        self.descending = true;
        self
    }

    /// Sort order keyword.
    pub fn order(&self) -> &'static str {
        if self.descending { "desc" } else { "asc" }
    }
}
