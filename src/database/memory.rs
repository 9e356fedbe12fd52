use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{ListingRow, NewImage, NewListing, User};
use crate::database::repository::{HealthCheck, ImageStore, ListingStore, UserStore};
use crate::filter::{ListingQuery, SortColumn, SortDirection};

#[derive(Debug, Clone)]
struct StoredListing {
    listing: NewListing,
    user_id: Uuid,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Inner {
    users: Vec<User>,
    listings: Vec<StoredListing>,
    images: HashMap<String, NewImage>,
    last_stamp: Option<DateTime<Utc>>,
}

impl Inner {
    /// Creation stamps are strictly increasing so that newest-first is well defined
    fn next_stamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_stamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_stamp = Some(stamp);
        stamp
    }

    fn user(&self, id: Uuid) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }
}

/// In-process store used when no DATABASE_URL is configured and by the test suite
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn listing_count(&self) -> usize {
        self.inner.read().await.listings.len()
    }

    pub async fn image_count(&self) -> usize {
        self.inner.read().await.images.len()
    }

    /// Drops a user without touching their listings or images
    pub async fn remove_user(&self, username: &str) -> bool {
        let mut inner = self.inner.write().await;
        let before = inner.users.len();
        inner.users.retain(|u| u.username != username);
        inner.users.len() != before
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        Ok(self.inner.read().await.user(id).cloned())
    }

    async fn user_exists(&self, username: &str) -> Result<bool, DatabaseError> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().any(|u| u.username == username))
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, DatabaseError> {
        let mut inner = self.inner.write().await;
        if inner.users.iter().any(|u| u.username == username) {
            return Err(DatabaseError::Conflict(format!(
                "username '{}' is already taken",
                username
            )));
        }
        let created_at = inner.next_stamp();
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at,
        };
        inner.users.push(user.clone());
        Ok(user)
    }
}

#[async_trait]
impl ListingStore for MemoryStore {
    async fn query(&self, query: &ListingQuery) -> Result<Vec<ListingRow>, DatabaseError> {
        let inner = self.inner.read().await;

        let mut rows: Vec<ListingRow> = inner
            .listings
            .iter()
            .filter(|stored| query.admits(stored.listing.price))
            .filter_map(|stored| {
                // Inner join: listings whose author is gone do not appear
                inner.user(stored.user_id).map(|author| ListingRow {
                    title: stored.listing.title.clone(),
                    text: stored.listing.text.clone(),
                    image_url: stored.listing.image_url.clone(),
                    price: stored.listing.price,
                    username: author.username.clone(),
                    created_at: stored.created_at,
                })
            })
            .collect();

        let compare = |a: &ListingRow, b: &ListingRow| -> Ordering {
            match query.order.column {
                SortColumn::CreatedAt => a.created_at.cmp(&b.created_at),
                SortColumn::Price => a.price.total_cmp(&b.price),
            }
        };
        match query.order.direction {
            SortDirection::Asc => rows.sort_by(compare),
            SortDirection::Desc => rows.sort_by(|a, b| compare(b, a)),
        }

        let offset = usize::try_from(query.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.limit).unwrap_or(0);
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }

    async fn insert_listing(&self, listing: &NewListing, author: &User) -> Result<(), DatabaseError> {
        let mut inner = self.inner.write().await;
        if inner.user(author.id).is_none() {
            return Err(DatabaseError::NotFound(format!("user '{}'", author.username)));
        }
        let created_at = inner.next_stamp();
        inner.listings.push(StoredListing {
            listing: listing.clone(),
            user_id: author.id,
            created_at,
        });
        Ok(())
    }
}

#[async_trait]
impl ImageStore for MemoryStore {
    async fn insert_image(&self, image: &NewImage) -> Result<(), DatabaseError> {
        let mut inner = self.inner.write().await;
        if inner.user(image.user_id).is_none() {
            return Err(DatabaseError::NotFound(format!("user {}", image.user_id)));
        }
        if inner.images.contains_key(&image.name) {
            return Err(DatabaseError::Conflict(format!("image '{}' already exists", image.name)));
        }
        inner.images.insert(image.name.clone(), image.clone());
        Ok(())
    }

    async fn get_image(&self, name: &str) -> Result<Option<Vec<u8>>, DatabaseError> {
        let inner = self.inner.read().await;
        Ok(inner.images.get(name).map(|img| img.data.clone()))
    }
}

#[async_trait]
impl HealthCheck for MemoryStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}
