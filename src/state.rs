use std::sync::Arc;
use std::time::Duration;

use crate::auth::{CredentialVerifier, JwtVerifier, TokenKeys};
use crate::config::AppConfig;
use crate::database::{HealthCheck, ImageStore, ListingStore, UserStore};
use crate::feed::FeedService;

/// Everything a handler needs, built once in `main` and cloned per request
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tokens: Arc<TokenKeys>,
    pub verifier: Arc<dyn CredentialVerifier>,
    pub users: Arc<dyn UserStore>,
    pub listings: Arc<dyn ListingStore>,
    pub images: Arc<dyn ImageStore>,
    pub health: Arc<dyn HealthCheck>,
    pub feed: Arc<FeedService>,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new<S>(config: AppConfig, store: Arc<S>) -> Result<Self, reqwest::Error>
    where
        S: UserStore + ListingStore + ImageStore + HealthCheck + 'static,
    {
        let tokens = Arc::new(TokenKeys::new(&config.security));
        let users: Arc<dyn UserStore> = store.clone();
        let listings: Arc<dyn ListingStore> = store.clone();
        let verifier: Arc<dyn CredentialVerifier> =
            Arc::new(JwtVerifier::new(tokens.clone(), users.clone()));
        let feed = Arc::new(FeedService::new(listings.clone(), config.feed.max_per_page));
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.images.fetch_timeout_secs))
            .build()?;

        Ok(Self {
            config: Arc::new(config),
            tokens,
            verifier,
            users,
            listings,
            images: store.clone(),
            health: store,
            feed,
            http,
        })
    }
}
