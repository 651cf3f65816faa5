//! Child listing query and paged result types
//!
//! # Examples
//!
//! ```rust
//! use mediatree_core::models::{ChildQuery, OrderDirection, OrderField};
//!
//! let query = ChildQuery::new()
//!     .with_filter("img")
//!     .with_order(OrderField::Name, OrderDirection::Ascending)
//!     .with_page(2, 25);
//!
//! assert!(query.is_paged());
//! assert_eq!(query.skip_size(), 25);
//! ```

use super::node::ValidationError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Sort direction for child listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderDirection {
    #[default]
    Ascending,
    Descending,
}

/// Node field a child listing can be ordered by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderField {
    Id,
    Name,
    #[default]
    SortOrder,
    CreatedAt,
    UpdatedAt,
    ContentTypeId,
}

impl FromStr for OrderField {
    type Err = ValidationError;

    /// Parse a field name as sent by the editor UI (case-insensitive)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "id" => Ok(Self::Id),
            "name" => Ok(Self::Name),
            "sortorder" => Ok(Self::SortOrder),
            "createdate" | "createdat" => Ok(Self::CreatedAt),
            "updatedate" | "updatedat" => Ok(Self::UpdatedAt),
            "contenttypeid" => Ok(Self::ContentTypeId),
            _ => Err(ValidationError::UnknownOrderField(s.to_string())),
        }
    }
}

/// Filter, order and window applied to a child listing
///
/// Windowing only applies when both `page_number` and `page_size` are
/// greater than zero; page numbers are 1-based.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildQuery {
    /// Case-insensitive substring matched against node names (empty = all)
    #[serde(default)]
    pub filter: String,

    #[serde(default)]
    pub order_by: OrderField,

    #[serde(default)]
    pub direction: OrderDirection,

    #[serde(default)]
    pub page_number: usize,

    #[serde(default)]
    pub page_size: usize,
}

impl ChildQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    pub fn with_order(mut self, order_by: OrderField, direction: OrderDirection) -> Self {
        self.order_by = order_by;
        self.direction = direction;
        self
    }

    pub fn with_page(mut self, page_number: usize, page_size: usize) -> Self {
        self.page_number = page_number;
        self.page_size = page_size;
        self
    }

    pub fn is_paged(&self) -> bool {
        self.page_number > 0 && self.page_size > 0
    }

    /// Number of matching items preceding the requested page
    pub fn skip_size(&self) -> usize {
        if self.is_paged() {
            (self.page_number - 1).saturating_mul(self.page_size)
        } else {
            0
        }
    }
}

/// One page of a child listing
///
/// `total_count` is the number of children before filtering. `matched_count`
/// is the number that survived the filter, and `total_pages` is derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub total_count: usize,
    pub matched_count: usize,
    pub page_number: usize,
    pub page_size: usize,
    pub total_pages: usize,
}

impl<T> PagedResult<T> {
    /// Result for a parent without children
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
            matched_count: 0,
            page_number: 0,
            page_size: 0,
            total_pages: 0,
        }
    }

    pub fn new(items: Vec<T>, total_count: usize, matched_count: usize, query: &ChildQuery) -> Self {
        let total_pages = if query.page_size > 0 {
            matched_count.div_ceil(query.page_size)
        } else if matched_count > 0 {
            1
        } else {
            0
        };

        Self {
            items,
            total_count,
            matched_count,
            page_number: query.page_number,
            page_size: query.page_size,
            total_pages,
        }
    }
}
