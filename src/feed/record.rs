use serde::Serialize;

/// One listing as returned by the feed.
///
/// `is_owned` is computed per request relative to the caller and is left out
/// of the JSON entirely for anonymous callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingRecord {
    pub title: String,
    pub text: String,
    pub image_url: String,
    pub price: f64,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_owned: Option<bool>,
}
