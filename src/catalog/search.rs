//! Free-text ("AI") search client and its page adapter
//!
//! The text-search service returns a different envelope than the catalog
//! service; [`adapt_response_to_page`] normalizes both into one pagination
//! model so result consumers never care which mode produced a page.

use reqwest::Client;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::Error;
use crate::fetch::Fetch;

use super::{Page, Pageable, ProductShoe, SortMeta};

const INVALID_QUERY_MESSAGE: &str =
    "Your search contains invalid characters. Please use letters, numbers, and basic punctuation only.";
const REJECTED_QUERY_MESSAGE: &str = "Search query invalid. Please adjust and try again.";

/// One hit from the text-search service; every field is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextSearchHit {
    pub id: Option<String>,
    pub brand: Option<String>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub url: Option<String>,
    pub image: Option<String>,
    pub price_sale: Option<f64>,
    pub price_original: Option<f64>,
    pub gender: Option<String>,
    pub age_group: Option<String>,
    #[serde(default)]
    pub sizes: Option<Vec<String>>,
    pub collected_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextSearchResults {
    pub content: Option<Vec<TextSearchHit>>,
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub total_elements: Option<u64>,
    pub total_pages: Option<u32>,
    pub first: Option<bool>,
    pub last: Option<bool>,
    pub empty: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextSearchResponse {
    /// Structured filter the service inferred from the query; opaque here
    #[serde(default)]
    pub filter: serde_json::Value,
    #[serde(default)]
    pub results: TextSearchResults,
}

/// Client for the text-search service
pub struct TextSearchClient {
    base_url: String,
    client: Client,
}

impl TextSearchClient {
    pub(crate) fn new(base_url: &str, client: Client) -> Self {
        Self {
            base_url: base_url.to_string(),
            client,
        }
    }

    /// Run a free-text query.
    ///
    /// Queries are validated client-side before any request goes out; the
    /// service only accepts printable ASCII. A 400 from the service is
    /// surfaced with its own message when it has one.
    pub async fn fetch_shoes_ai(
        &self,
        query: &str,
        page: u32,
        size: u32,
    ) -> Result<TextSearchResponse, Error> {
        if !is_valid_query(query) {
            return Err(Error::InvalidQuery(INVALID_QUERY_MESSAGE.to_string()));
        }

        let url = format!("{}/search/fact-product-shoes", self.base_url);
        let result = Fetch::get(&self.client, &url)
            .query("q", query)
            .query("page", page)
            .query("size", size)
            .execute()
            .await;

        match result {
            Err(Error::Api { status: 400, body }) => {
                let message = serde_json::from_str::<serde_json::Value>(&body)
                    .ok()
                    .and_then(|value| value.get("message")?.as_str().map(String::from))
                    .unwrap_or_else(|| REJECTED_QUERY_MESSAGE.to_string());
                Err(Error::InvalidQuery(message))
            }
            other => other,
        }
    }

    /// Convenience wrapper returning the normalized page directly
    pub async fn search_page(
        &self,
        query: &str,
        page: u32,
        size: u32,
    ) -> Result<Page<ProductShoe>, Error> {
        let response = self.fetch_shoes_ai(query, page, size).await?;
        Ok(adapt_response_to_page(response, page, size))
    }
}

fn is_valid_query(query: &str) -> bool {
    !query.is_empty()
        && query
            .chars()
            .all(|c| c.is_ascii_graphic() || c.is_ascii_whitespace())
}

/// Normalize a text-search envelope into the catalog page model, filling
/// gaps from the requested page/size
pub fn adapt_response_to_page(
    response: TextSearchResponse,
    requested_page: u32,
    requested_size: u32,
) -> Page<ProductShoe> {
    let results = response.results;
    let hits = results.content.unwrap_or_default();
    let content: Vec<ProductShoe> = hits
        .into_iter()
        .enumerate()
        .map(|(idx, hit)| map_hit_to_product(hit, idx))
        .collect();

    let number = results.page.unwrap_or(requested_page);
    let mut size = results.size.unwrap_or(requested_size);
    if size == 0 {
        size = requested_size.max(content.len() as u32);
    }
    let total_elements = results.total_elements.unwrap_or(content.len() as u64);
    let total_pages = results.total_pages.unwrap_or_else(|| {
        if size == 0 {
            0
        } else {
            ((total_elements + u64::from(size) - 1) / u64::from(size)) as u32
        }
    });

    let number_of_elements = content.len() as u32;
    Page {
        empty: results.empty.unwrap_or(content.is_empty()),
        first: results.first.unwrap_or(number == 0),
        last: results
            .last
            .unwrap_or(number + 1 >= total_pages.max(1)),
        pageable: Pageable {
            page_number: number,
            page_size: size,
            sort: SortMeta::unsorted(),
            offset: u64::from(number) * u64::from(size),
            paged: true,
            unpaged: false,
        },
        sort: SortMeta::unsorted(),
        content,
        total_pages,
        total_elements,
        size,
        number,
        number_of_elements,
    }
}

/// Fill a sparse hit into a complete product record.
///
/// Missing prices collapse onto whichever one is present; a missing id gets
/// a synthetic one so list consumers can still key entries.
pub fn map_hit_to_product(hit: TextSearchHit, idx: usize) -> ProductShoe {
    let fallback_id = hit
        .id
        .unwrap_or_else(|| format!("ai-{}-{}", idx, Uuid::new_v4().simple()));
    let price_sale = hit.price_sale.or(hit.price_original).unwrap_or(0.0);
    let price_original = hit.price_original.unwrap_or(price_sale);

    let mut year = None;
    let mut month = None;
    let mut day = None;
    if let Some(collected) = &hit.collected_date {
        let parts: Vec<&str> = collected.split('-').collect();
        if parts.len() == 3 {
            year = parts[0].parse().ok();
            month = parts[1].parse().ok();
            day = parts[2].parse().ok();
        }
    }

    ProductShoe {
        id: fallback_id.clone(),
        dwid: fallback_id,
        brand: hit.brand.unwrap_or_else(|| "unknown".to_string()),
        title: hit
            .title
            .or(hit.subtitle.clone())
            .unwrap_or_else(|| "Unnamed product".to_string()),
        subtitle: hit.subtitle,
        url: hit.url.unwrap_or_else(|| "#".to_string()),
        image: hit.image,
        price_sale,
        price_original,
        gender: hit.gender,
        age_group: hit.age_group,
        sizes: hit.sizes,
        year,
        month,
        day,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_basic_ascii_queries() {
        assert!(is_valid_query("red nike running shoes under $100"));
        assert!(is_valid_query("size 9.5, women's"));
        assert!(!is_valid_query(""));
        assert!(!is_valid_query("chaussures été"));
    }

    #[test]
    fn sparse_hit_is_filled_in() {
        let product = map_hit_to_product(
            TextSearchHit {
                title: Some("Pegasus 41".to_string()),
                price_original: Some(129.0),
                collected_date: Some("2025-08-28".to_string()),
                ..Default::default()
            },
            3,
        );
        assert!(product.id.starts_with("ai-3-"));
        assert_eq!(product.price_sale, 129.0);
        assert_eq!(product.price_original, 129.0);
        assert_eq!(product.brand, "unknown");
        assert_eq!((product.year, product.month, product.day), (Some(2025), Some(8), Some(28)));
    }

    #[test]
    fn subtitle_stands_in_for_missing_title() {
        let product = map_hit_to_product(
            TextSearchHit {
                subtitle: Some("Men's road shoe".to_string()),
                ..Default::default()
            },
            0,
        );
        assert_eq!(product.title, "Men's road shoe");
        assert_eq!(product.subtitle.as_deref(), Some("Men's road shoe"));
    }

    #[test]
    fn adapter_fills_pagination_gaps() {
        let response = TextSearchResponse {
            filter: serde_json::Value::Null,
            results: TextSearchResults {
                content: Some(vec![TextSearchHit::default(); 5]),
                total_elements: Some(23),
                ..Default::default()
            },
        };
        let page = adapt_response_to_page(response, 2, 10);
        assert_eq!(page.number, 2);
        assert_eq!(page.size, 10);
        assert_eq!(page.total_elements, 23);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.pageable.offset, 20);
        assert!(!page.first);
        assert!(page.last);
        assert_eq!(page.number_of_elements, 5);
    }

    #[test]
    fn adapter_prefers_service_pagination_fields() {
        let response = TextSearchResponse {
            filter: serde_json::Value::Null,
            results: TextSearchResults {
                content: Some(vec![]),
                page: Some(0),
                size: Some(18),
                total_elements: Some(0),
                total_pages: Some(0),
                first: Some(true),
                last: Some(true),
                empty: Some(true),
            },
        };
        let page = adapt_response_to_page(response, 4, 8);
        assert_eq!(page.number, 0);
        assert_eq!(page.size, 18);
        assert!(page.empty && page.first && page.last);
    }
}
