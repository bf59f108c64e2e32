//! Wire types for the catalog service

use serde::{Deserialize, Serialize};

/// One catalog record as served by the catalog service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductShoe {
    pub id: String,
    pub dwid: String,
    pub brand: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub price_sale: f64,
    pub price_original: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_group: Option<String>,
    #[serde(default)]
    pub sizes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
}

/// Spring-style sort metadata carried inside page responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortMeta {
    pub sorted: bool,
    pub empty: bool,
    pub unsorted: bool,
}

impl SortMeta {
    pub fn unsorted() -> Self {
        Self {
            sorted: false,
            empty: true,
            unsorted: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pageable {
    pub page_number: u32,
    pub page_size: u32,
    pub sort: SortMeta,
    pub offset: u64,
    pub paged: bool,
    pub unpaged: bool,
}

/// Paginated response envelope shared by the catalog and search adapters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub pageable: Pageable,
    pub last: bool,
    pub total_pages: u32,
    pub total_elements: u64,
    pub size: u32,
    pub number: u32,
    pub sort: SortMeta,
    pub first: bool,
    pub number_of_elements: u32,
    pub empty: bool,
}

impl<T> Page<T> {
    /// An empty page with the requested size, used as the resting state
    /// before any fetch resolves
    pub fn empty(size: u32) -> Self {
        Self {
            content: Vec::new(),
            pageable: Pageable {
                page_number: 0,
                page_size: size,
                sort: SortMeta::unsorted(),
                offset: 0,
                paged: true,
                unpaged: false,
            },
            last: true,
            total_pages: 0,
            total_elements: 0,
            size,
            number: 0,
            sort: SortMeta::unsorted(),
            first: true,
            number_of_elements: 0,
            empty: true,
        }
    }
}

/// Per-brand latest collected date, reformatted from the raw `dwid`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestData {
    pub brand: String,
    pub latest_date: String,
}

/// Filters the storefront can apply to a catalog search.
///
/// Exactly one of `date` or the `start_date`/`end_date` pair is meaningful
/// at a time; use [`ProductFilters::set_date`] and
/// [`ProductFilters::set_date_range`] to keep them exclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilters {
    pub brand: Option<String>,
    pub gender: Option<String>,
    pub date: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub keyword: Option<String>,
    pub sizes: Option<Vec<String>>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub on_sale: Option<bool>,
}

impl ProductFilters {
    /// Pin the search to a single collected date, dropping any range
    pub fn set_date(&mut self, date: impl Into<String>) {
        self.date = Some(date.into());
        self.start_date = None;
        self.end_date = None;
    }

    /// Pin the search to a collected-date range, dropping any single date
    pub fn set_date_range(&mut self, start: impl Into<String>, end: impl Into<String>) {
        self.start_date = Some(start.into());
        self.end_date = Some(end.into());
        self.date = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_and_range_are_mutually_exclusive() {
        let mut filters = ProductFilters::default();
        filters.set_date_range("2025-01-01", "2025-01-02");
        filters.set_date("2025-01-05");
        assert!(filters.start_date.is_none() && filters.end_date.is_none());
        filters.set_date_range("2025-02-01", "2025-02-02");
        assert!(filters.date.is_none());
    }

    #[test]
    fn empty_page_is_well_formed() {
        let page: Page<ProductShoe> = Page::empty(18);
        assert!(page.empty && page.first && page.last);
        assert_eq!(page.size, 18);
        assert_eq!(page.pageable.page_size, 18);
    }
}
