use axum::{
    extract::{RawQuery, State},
    Extension, Json,
};

use crate::error::ApiResult;
use crate::feed::{ListingRecord, RawFeedParams};
use crate::middleware::CallerIdentity;
use crate::state::AppState;

/// GET /get-cards - one page of the listing feed
///
/// Query: `page`, `per_page`, `sort_by`, `order`, `price_min`, `price_max`.
/// Malformed values fall back to defaults, so this never fails validation.
pub async fn get_cards(
    State(state): State<AppState>,
    Extension(CallerIdentity(caller)): Extension<CallerIdentity>,
    RawQuery(query): RawQuery,
) -> ApiResult<Json<Vec<ListingRecord>>> {
    let raw = RawFeedParams::from_query_string(query.as_deref().unwrap_or_default());
    let records = state.feed.get_feed(&raw, caller).await?;
    Ok(Json(records))
}
