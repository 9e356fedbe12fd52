use serde::{Deserialize, Serialize};

/// Columns the feed may be ordered by. Only these ever reach the ORDER BY clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortColumn {
    CreatedAt,
    Price,
}

impl SortColumn {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortColumn::CreatedAt => "c.created_at",
            SortColumn::Price => "c.price",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// An inclusive bound on the listing price
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PriceBound {
    Min(f64),
    Max(f64),
}

impl PriceBound {
    pub fn admits(&self, price: f64) -> bool {
        match *self {
            PriceBound::Min(min) => price >= min,
            PriceBound::Max(max) => price <= max,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingOrder {
    pub column: SortColumn,
    pub direction: SortDirection,
}

/// Store-level description of one feed page: conjunction of bounds,
/// ordering, and the window to return.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingQuery {
    pub bounds: Vec<PriceBound>,
    pub order: ListingOrder,
    pub limit: i64,
    pub offset: i64,
}

impl ListingQuery {
    pub fn admits(&self, price: f64) -> bool {
        self.bounds.iter().all(|bound| bound.admits(price))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SqlParam {
    Float(f64),
    Int(i64),
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<SqlParam>,
}
