use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::{AuthError, CredentialVerifier, Identity};
use crate::error::ApiError;
use crate::state::AppState;

/// Whether a route tolerates anonymous callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPolicy {
    Optional,
    Required,
}

/// Resolved caller, inserted into request extensions on every gated route.
/// `None` means anonymous.
#[derive(Debug, Clone, Default)]
pub struct CallerIdentity(pub Option<Identity>);

/// Read the credential from the Authorization header.
///
/// Accepts `Bearer <token>` or a bare token. A missing or blank header, or a
/// bare `Bearer` scheme, yields `Ok(None)`.
pub fn extract_credential(headers: &HeaderMap) -> Result<Option<String>, AuthError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let raw = value
        .to_str()
        .map_err(|_| AuthError::MalformedCredential("Authorization header is not valid ASCII".into()))?
        .trim();

    let token = match raw.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        _ if raw.eq_ignore_ascii_case("bearer") => "",
        _ => raw,
    };

    if token.is_empty() {
        Ok(None)
    } else {
        Ok(Some(token.to_string()))
    }
}

/// Resolve the caller once per request.
///
/// A present credential is always verified, even on optional routes, so a bad
/// token is never silently downgraded to anonymous.
pub async fn resolve_identity(
    headers: &HeaderMap,
    verifier: &dyn CredentialVerifier,
    policy: AuthPolicy,
) -> Result<Option<Identity>, AuthError> {
    match extract_credential(headers)? {
        Some(token) => verifier.verify(&token).await.map(Some),
        None if policy == AuthPolicy::Required => Err(AuthError::MissingCredential),
        None => Ok(None),
    }
}

async fn gate(
    state: &AppState,
    policy: AuthPolicy,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = resolve_identity(request.headers(), state.verifier.as_ref(), policy)
        .await
        .map_err(|err| {
            if !matches!(err, AuthError::Storage(_)) {
                tracing::warn!("Rejected credential on {}: {}", request.uri().path(), err);
            }
            ApiError::from(err)
        })?;

    tracing::debug!(
        "Caller on {}: {}",
        request.uri().path(),
        identity.as_ref().map_or("anonymous", Identity::as_str)
    );

    if let Some(identity) = identity.clone() {
        request.extensions_mut().insert(identity);
    }
    request.extensions_mut().insert(CallerIdentity(identity));

    Ok(next.run(request).await)
}

/// Anonymous callers pass through with `CallerIdentity(None)`
pub async fn optional_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    gate(&state, AuthPolicy::Optional, request, next).await
}

/// Rejects anonymous callers; handlers may extract `Extension<Identity>`
pub async fn required_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    gate(&state, AuthPolicy::Required, request, next).await
}
