use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{ListingQuery, SqlParam, SqlResult};

const LISTING_SELECT: &str =
    "SELECT c.title, c.card_text AS text, c.image_url, c.price, u.username, c.created_at";
const LISTING_FROM: &str = "FROM cards c JOIN users u ON u.id = c.user_id";

/// Compiles a [`ListingQuery`] into parameterized Postgres SQL
pub struct Filter<'a> {
    query: &'a ListingQuery,
}

impl<'a> Filter<'a> {
    pub fn new(query: &'a ListingQuery) -> Self {
        Self { query }
    }

    pub fn to_sql(&self) -> SqlResult {
        let (where_clause, mut params) = FilterWhere::generate(&self.query.bounds, 0);
        let order_clause = FilterOrder::generate(&self.query.order);
        let limit_clause = format!("LIMIT ${} OFFSET ${}", params.len() + 1, params.len() + 2);
        params.push(SqlParam::Int(self.query.limit));
        params.push(SqlParam::Int(self.query.offset));

        let query = [
            LISTING_SELECT.to_string(),
            LISTING_FROM.to_string(),
            if where_clause.is_empty() { String::new() } else { format!("WHERE {}", where_clause) },
            order_clause,
            limit_clause,
        ].into_iter().filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" ");

        SqlResult { query, params }
    }
}
