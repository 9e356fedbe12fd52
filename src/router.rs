use axum::{
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{protected, public};
use crate::middleware::{optional_auth, required_auth};
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.security.cors_origins);

    Router::new()
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .merge(account_routes())
        .merge(feed_routes(&state))
        .merge(card_routes(&state))
        .merge(image_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/sign-up", post(public::sign_up))
        .route("/sign-in", post(public::sign_in))
}

fn feed_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/get-cards", get(public::get_cards))
        .route_layer(from_fn_with_state(state.clone(), optional_auth))
}

fn card_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/post-a-card", post(protected::post_a_card))
        .route_layer(from_fn_with_state(state.clone(), required_auth))
}

fn image_routes() -> Router<AppState> {
    Router::new()
        .route("/images/create", get(public::create_image))
        .route("/images", post(public::load_image))
        .route("/images/:name", get(public::get_image))
}

/// Permissive when no origins are configured
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
        .expose_headers([axum::http::header::AUTHORIZATION])
}
