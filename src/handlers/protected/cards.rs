// handlers/protected/cards.rs - POST /post-a-card handler

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::auth::{AuthError, Identity};
use crate::database::models::NewListing;
use crate::error::{ApiError, ApiResult};
use crate::images;
use crate::state::AppState;
use crate::validation::check_length;

pub const MIN_TITLE_LEN: usize = 2;
pub const MAX_TITLE_LEN: usize = 100;
pub const MIN_TEXT_LEN: usize = 5;
pub const MAX_TEXT_LEN: usize = 4000;
pub const MAX_PRICE: f64 = 1_000_000_000_000.0;

#[derive(Debug, Deserialize)]
pub struct PostCardRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub image_url: String,
    /// Sent as a string, parsed server side
    #[serde(default)]
    pub price: String,
}

/// POST /post-a-card - create a listing owned by the caller
pub async fn post_a_card(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<PostCardRequest>, JsonRejection>,
) -> ApiResult<Json<NewListing>> {
    let Json(request) =
        payload.map_err(|e| ApiError::bad_request(format!("invalid request body: {}", e.body_text())))?;

    check_length(&request.title, "title", MIN_TITLE_LEN, MAX_TITLE_LEN).map_err(ApiError::bad_request)?;
    check_length(&request.text, "text", MIN_TEXT_LEN, MAX_TEXT_LEN).map_err(ApiError::bad_request)?;
    let price = validate_price(&request.price).map_err(ApiError::bad_request)?;

    let bytes = images::fetch_image(&state.http, &request.image_url).await?;
    images::validate_image(&bytes)?;

    // The verifier confirmed the user moments ago; a miss here means it was just removed
    let author = state
        .users
        .find_by_username(identity.as_str())
        .await?
        .ok_or_else(|| AuthError::UnknownUser(identity.to_string()))?;

    let listing = NewListing {
        title: request.title,
        text: request.text,
        image_url: request.image_url,
        price,
    };
    state.listings.insert_listing(&listing, &author).await?;
    tracing::info!("{} posted listing '{}'", author.username, listing.title);

    Ok(Json(listing))
}

pub fn validate_price(raw: &str) -> Result<f64, String> {
    let price: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("price '{}' is not a number", raw))?;
    if !price.is_finite() || price <= 0.0 {
        return Err("price must be greater than 0".to_string());
    }
    if price > MAX_PRICE {
        return Err(format!("price cannot exceed {:.0}", MAX_PRICE));
    }
    Ok(price)
}
