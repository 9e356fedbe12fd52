use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::{self, postgres::PgArguments, PgPool};
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{ListingRow, NewImage, NewListing, User};
use crate::database::repository::{HealthCheck, ImageStore, ListingStore, UserStore};
use crate::filter::{Filter, ListingQuery, SqlParam};

/// Postgres-backed implementation of every store trait
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn user_exists(&self, username: &str) -> Result<bool, DatabaseError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, username, password_hash) VALUES ($1, $2, $3)
             RETURNING id, username, password_hash, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                DatabaseError::Conflict(format!("username '{}' is already taken", username))
            }
            _ => e.into(),
        })
    }
}

#[async_trait]
impl ListingStore for PgStore {
    async fn query(&self, query: &ListingQuery) -> Result<Vec<ListingRow>, DatabaseError> {
        let sql_result = Filter::new(query).to_sql();
        tracing::debug!("Listing query: {}", sql_result.query);

        let mut q = sqlx::query_as::<_, ListingRow>(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query_as(q, p);
        }
        let rows: Vec<ListingRow> = q.fetch(&self.pool).try_collect().await?;
        Ok(rows)
    }

    async fn insert_listing(&self, listing: &NewListing, author: &User) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO cards (id, title, card_text, image_url, price, user_id)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(Uuid::new_v4())
        .bind(&listing.title)
        .bind(&listing.text)
        .bind(&listing.image_url)
        .bind(listing.price)
        .bind(author.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ImageStore for PgStore {
    async fn insert_image(&self, image: &NewImage) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO images (name, mimetype, image_data, user_id) VALUES ($1, $2, $3, $4)",
        )
        .bind(&image.name)
        .bind(&image.mime_type)
        .bind(&image.data)
        .bind(image.user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_image(&self, name: &str) -> Result<Option<Vec<u8>>, DatabaseError> {
        let data: Option<Vec<u8>> = sqlx::query_scalar("SELECT image_data FROM images WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(data)
    }
}

#[async_trait]
impl HealthCheck for PgStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}

fn bind_param_query_as<'q, O>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>,
    v: &SqlParam,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>
where
    O: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow>,
{
    match *v {
        SqlParam::Float(f) => q.bind(f),
        SqlParam::Int(i) => q.bind(i),
    }
}
