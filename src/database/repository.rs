use async_trait::async_trait;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{ListingRow, NewImage, NewListing, User};
use crate::filter::ListingQuery;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError>;

    async fn user_exists(&self, username: &str) -> Result<bool, DatabaseError>;

    /// Fails with [`DatabaseError::Conflict`] when the username is taken
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, DatabaseError>;
}

/// Read/write access to listings. `query` is the only read path the feed uses.
#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn query(&self, query: &ListingQuery) -> Result<Vec<ListingRow>, DatabaseError>;

    async fn insert_listing(&self, listing: &NewListing, author: &User) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn insert_image(&self, image: &NewImage) -> Result<(), DatabaseError>;

    async fn get_image(&self, name: &str) -> Result<Option<Vec<u8>>, DatabaseError>;
}

#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn ping(&self) -> Result<(), DatabaseError>;
}
