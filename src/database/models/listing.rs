use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A listing as submitted by its author
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewListing {
    pub title: String,
    pub text: String,
    pub image_url: String,
    pub price: f64,
}

/// A listing as read back from the store, joined with its author's username
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ListingRow {
    pub title: String,
    pub text: String,
    pub image_url: String,
    pub price: f64,
    pub username: String,
    pub created_at: DateTime<Utc>,
}
