//! Catalog service client

mod search;
mod types;

use chrono::{Days, NaiveDate};
use reqwest::Client;
use serde::Deserialize;

use crate::error::Error;
use crate::fetch::Fetch;

pub use search::*;
pub use types::*;

/// Client for the shoe catalog service
pub struct CatalogClient {
    base_url: String,
    client: Client,
}

impl CatalogClient {
    pub(crate) fn new(base_url: &str, client: Client) -> Self {
        Self {
            base_url: base_url.to_string(),
            client,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    /// Fetch a page of shoes matching the given filters.
    ///
    /// Only meaningful filter values become query parameters: blank strings
    /// are skipped, `on_sale` is serialized only when `true`, and a date
    /// range is sent with the end date advanced by one day because the
    /// backend treats `endDate` as exclusive.
    pub async fn fetch_shoes_by_filter(
        &self,
        filters: &ProductFilters,
        page: u32,
        size: u32,
    ) -> Result<Page<ProductShoe>, Error> {
        let mut request = Fetch::get(&self.client, &self.endpoint("/catalog-shoes"));

        if let Some(brand) = trimmed(&filters.brand) {
            request = request.query("brand", brand);
        }
        if let Some(gender) = trimmed(&filters.gender) {
            request = request.query("gender", gender);
        }

        if let Some(date) = trimmed(&filters.date) {
            request = request.query("date", date);
        } else if let (Some(start), Some(end)) =
            (trimmed(&filters.start_date), trimmed(&filters.end_date))
        {
            request = request
                .query("startDate", start)
                .query("endDate", exclusive_end_date(end));
        }

        if let Some(keyword) = trimmed(&filters.keyword) {
            request = request.query("keyword", keyword);
        }
        if let Some(sizes) = &filters.sizes {
            if !sizes.is_empty() {
                request = request.query("sizes", sizes.join(","));
            }
        }
        if let Some(min_price) = filters.min_price {
            request = request.query("minPrice", min_price);
        }
        if let Some(max_price) = filters.max_price {
            request = request.query("maxPrice", max_price);
        }
        if filters.on_sale == Some(true) {
            request = request.query("onSale", true);
        }

        request
            .query("page", page)
            .query("size", size)
            .execute()
            .await
    }

    /// Latest collected date per brand, with the raw `YYYYMMDD` dwid
    /// reformatted to `YYYY-MM-DD`
    pub async fn fetch_latest(&self) -> Result<Vec<LatestData>, Error> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct RawLatestData {
            brand: String,
            latest_dwid: String,
        }

        let raw: Vec<RawLatestData> = Fetch::get(&self.client, &self.endpoint("/catalog-shoes/latest"))
            .execute()
            .await?;

        Ok(raw
            .into_iter()
            .map(|entry| LatestData {
                latest_date: format_dwid(&entry.latest_dwid),
                brand: entry.brand,
            })
            .collect())
    }
}

fn trimmed(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|trimmed| !trimmed.is_empty())
}

/// The backend excludes `endDate`, so push it forward one day to make the
/// user-facing range inclusive
fn exclusive_end_date(end: &str) -> String {
    match NaiveDate::parse_from_str(end, "%Y-%m-%d") {
        Ok(date) => date
            .checked_add_days(Days::new(1))
            .unwrap_or(date)
            .format("%Y-%m-%d")
            .to_string(),
        Err(_) => end.to_string(),
    }
}

fn format_dwid(dwid: &str) -> String {
    if dwid.len() == 8 && dwid.chars().all(|c| c.is_ascii_digit()) {
        format!("{}-{}-{}", &dwid[0..4], &dwid[4..6], &dwid[6..8])
    } else {
        dwid.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_date_is_advanced_one_day() {
        assert_eq!(exclusive_end_date("2025-03-31"), "2025-04-01");
        assert_eq!(exclusive_end_date("2024-12-31"), "2025-01-01");
        // Unparseable input is passed through untouched.
        assert_eq!(exclusive_end_date("yesterday"), "yesterday");
    }

    #[test]
    fn dwid_is_reformatted() {
        assert_eq!(format_dwid("20250830"), "2025-08-30");
        assert_eq!(format_dwid("latest"), "latest");
    }
}
