// handlers/public/images.rs - image generation, upload and download

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::models::NewImage;
use crate::error::{ApiError, ApiResult};
use crate::images::{self, ImageError, IMAGE_MIME};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoadImageRequest {
    /// Base64 (standard alphabet) image bytes
    pub image: String,
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct LoadImageResponse {
    pub image_name: String,
}

fn jpeg(bytes: Vec<u8>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, IMAGE_MIME)], Bytes::from(bytes))
}

/// GET /images/create - a fresh random image that satisfies the listing rules
pub async fn create_image() -> ApiResult<impl IntoResponse> {
    let bytes = tokio::task::spawn_blocking(images::generate_image).await??;
    Ok(jpeg(bytes))
}

/// POST /images - store an image for a user
pub async fn load_image(
    State(state): State<AppState>,
    payload: Result<Json<LoadImageRequest>, JsonRejection>,
) -> ApiResult<Json<LoadImageResponse>> {
    let Json(request) =
        payload.map_err(|e| ApiError::bad_request(format!("invalid request body: {}", e.body_text())))?;

    let user_id = Uuid::parse_str(&request.user_id)
        .map_err(|_| ApiError::bad_request("user_id is not a valid UUID"))?;
    let data = STANDARD
        .decode(request.image.as_bytes())
        .map_err(|_| ApiError::bad_request("image is not valid base64"))?;
    if data.is_empty() {
        return Err(ImageError::Empty.into());
    }

    if state.users.find_by_id(user_id).await?.is_none() {
        return Err(ApiError::bad_request(format!("user {} does not exist", user_id)));
    }

    let image = NewImage {
        name: images::new_image_name(),
        mime_type: IMAGE_MIME.to_string(),
        data,
        user_id,
    };
    state.images.insert_image(&image).await?;
    tracing::info!("Stored image {} ({} bytes)", image.name, image.data.len());

    Ok(Json(LoadImageResponse { image_name: image.name }))
}

/// GET /images/:name - `name` is `image<uuid>.jpeg`
pub async fn get_image(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let name = images::parse_image_file_name(&file_name)
        .ok_or_else(|| ApiError::bad_request("invalid image name"))?;

    let bytes = state
        .images
        .get_image(name)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("image '{}' not found", name)))?;
    Ok(jpeg(bytes))
}
