#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{codecs::jpeg::JpegEncoder, Rgb, RgbImage};
use reqwest::StatusCode;
use serde_json::{json, Value};

use marketplace_api::config::AppConfig;
use marketplace_api::database::models::NewListing;
use marketplace_api::database::{ListingStore, MemoryStore, UserStore};
use marketplace_api::router;
use marketplace_api::state::AppState;

pub const PASSWORD: &str = "Sup3r-secret";

/// The real router on an ephemeral port, backed by a fresh in-memory store.
/// Each test gets its own server, so tests never see each other's data.
pub struct TestServer {
    pub base_url: String,
    pub store: Arc<MemoryStore>,
    pub client: reqwest::Client,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with(AppConfig::development()).await
    }

    pub async fn spawn_with(config: AppConfig) -> Result<Self> {
        init_tracing();
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(config, store.clone())?;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .context("failed to bind test listener")?;
        let base_url = format!("http://{}", listener.local_addr()?);

        tokio::spawn(async move {
            axum::serve(listener, router::app(state)).await.ok();
        });

        Ok(Self {
            base_url,
            store,
            client: reqwest::Client::new(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Register through the API and return the issued token
    pub async fn sign_up(&self, username: &str) -> Result<String> {
        let res = self
            .client
            .post(self.url("/sign-up"))
            .json(&json!({ "username": username, "password": PASSWORD }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "sign-up failed: {}", res.status());
        let body: Value = res.json().await?;
        body["token"]
            .as_str()
            .map(str::to_string)
            .context("sign-up response carried no token")
    }

    /// Insert a listing directly into the store, bypassing image checks
    pub async fn seed_listing(&self, username: &str, title: &str, price: f64) -> Result<()> {
        let author = self
            .store
            .find_by_username(username)
            .await?
            .context("seed author does not exist")?;
        self.store
            .insert_listing(
                &NewListing {
                    title: title.to_string(),
                    text: format!("{} for sale", title),
                    image_url: format!("{}/images/placeholder.jpeg", self.base_url),
                    price,
                },
                &author,
            )
            .await?;
        Ok(())
    }

    /// Upload a valid JPEG for `username` and return the URL it is served from
    pub async fn upload_image(&self, username: &str, width: u32, height: u32) -> Result<String> {
        let user = self
            .store
            .find_by_username(username)
            .await?
            .context("image owner does not exist")?;

        let res = self
            .client
            .post(self.url("/images"))
            .json(&json!({
                "image": STANDARD.encode(jpeg(width, height)?),
                "user_id": user.id.to_string(),
            }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "upload failed: {}", res.status());
        let body: Value = res.json().await?;
        let name = body["image_name"].as_str().context("no image_name")?;
        Ok(self.url(&format!("/images/{}.jpeg", name)))
    }

    pub async fn get_cards(&self, query: &str, token: Option<&str>) -> Result<reqwest::Response> {
        let mut req = self.client.get(self.url(&format!("/get-cards{}", query)));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        Ok(req.send().await?)
    }
}

/// RUST_LOG=debug cargo test shows server logs; silent otherwise
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("off")),
        )
        .with_test_writer()
        .try_init();
}

pub fn jpeg(width: u32, height: u32) -> Result<Vec<u8>> {
    let img = RgbImage::from_pixel(width, height, Rgb([200, 40, 90]));
    let mut buf = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut buf, 80).encode_image(&img)?;
    Ok(buf.into_inner())
}
