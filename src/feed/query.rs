use serde::Serialize;

use crate::auth::Identity;
use crate::filter::{ListingOrder, ListingQuery, PriceBound, SortColumn, SortDirection};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PER_PAGE: i64 = 20;

/// Feed parameters exactly as they arrived, before any normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFeedParams {
    pub page: Option<String>,
    pub per_page: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub price_min: Option<String>,
    pub price_max: Option<String>,
}

impl RawFeedParams {
    /// Parse a URL query string. The first occurrence of a repeated key wins
    /// and unknown keys are ignored.
    pub fn from_query_string(query: &str) -> Self {
        let mut raw = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let slot = match key.as_ref() {
                "page" => &mut raw.page,
                "per_page" => &mut raw.per_page,
                "sort_by" => &mut raw.sort_by,
                "order" => &mut raw.order,
                "price_min" => &mut raw.price_min,
                "price_max" => &mut raw.price_max,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        raw
    }
}

/// Normalized feed request. Every field is within its documented domain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryParams {
    pub page: i64,
    pub per_page: i64,
    pub offset: i64,
    pub sort_by: SortColumn,
    pub order: SortDirection,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub caller_identity: Option<Identity>,
}

impl QueryParams {
    pub fn to_listing_query(&self) -> ListingQuery {
        let bounds = self
            .price_min
            .map(PriceBound::Min)
            .into_iter()
            .chain(self.price_max.map(PriceBound::Max))
            .collect();

        ListingQuery {
            bounds,
            order: ListingOrder {
                column: self.sort_by,
                direction: self.order,
            },
            limit: self.per_page,
            offset: self.offset,
        }
    }
}

/// Pure normalization of raw feed parameters. Never rejects a request.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedQueryCompiler {
    max_per_page: Option<i64>,
}

impl FeedQueryCompiler {
    pub fn new(max_per_page: Option<i64>) -> Self {
        Self { max_per_page }
    }

    pub fn compile(&self, raw: &RawFeedParams, caller: Option<Identity>) -> QueryParams {
        let page = positive_int(raw.page.as_deref()).unwrap_or(DEFAULT_PAGE);
        let mut per_page = positive_int(raw.per_page.as_deref()).unwrap_or(DEFAULT_PER_PAGE);
        if let Some(max) = self.max_per_page.filter(|max| *max > 0) {
            per_page = per_page.min(max);
        }

        let sort_by = match present(raw.sort_by.as_deref()) {
            Some(s) if s.eq_ignore_ascii_case("price") => SortColumn::Price,
            _ => SortColumn::CreatedAt,
        };
        let order = match present(raw.order.as_deref()) {
            Some(s) if s.eq_ignore_ascii_case("asc") => SortDirection::Asc,
            _ => SortDirection::Desc,
        };

        QueryParams {
            page,
            per_page,
            offset: (page - 1).saturating_mul(per_page),
            sort_by,
            order,
            price_min: price(raw.price_min.as_deref()),
            price_max: price(raw.price_max.as_deref()),
            caller_identity: caller,
        }
    }
}

/// Values are matched as sent; only an empty value counts as absent.
fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

fn positive_int(value: Option<&str>) -> Option<i64> {
    present(value)?.parse::<i64>().ok().filter(|n| *n > 0)
}

fn price(value: Option<&str>) -> Option<f64> {
    // NaN compares false against everything and cannot bound a range
    present(value)?.parse::<f64>().ok().filter(|p| !p.is_nan())
}
