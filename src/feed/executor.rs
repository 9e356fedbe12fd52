use std::sync::Arc;

use super::query::QueryParams;
use super::record::ListingRecord;
use super::FeedError;
use crate::database::ListingStore;

/// Runs a normalized feed query against the listing store
pub struct FeedExecutor {
    store: Arc<dyn ListingStore>,
}

impl FeedExecutor {
    pub fn new(store: Arc<dyn ListingStore>) -> Self {
        Self { store }
    }

    pub async fn execute(&self, params: &QueryParams) -> Result<Vec<ListingRecord>, FeedError> {
        let rows = self
            .store
            .query(&params.to_listing_query())
            .await
            .map_err(FeedError::Storage)?;

        let caller = params.caller_identity.as_ref();
        Ok(rows
            .into_iter()
            .map(|row| ListingRecord {
                is_owned: caller.map(|c| c.as_str() == row.username),
                title: row.title,
                text: row.text,
                image_url: row.image_url,
                price: row.price,
                username: row.username,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::auth::Identity;
    use crate::database::models::{ListingRow, NewListing, User};
    use crate::database::{DatabaseError, MemoryStore, UserStore};
    use crate::feed::query::{FeedQueryCompiler, RawFeedParams};
    use crate::filter::ListingQuery;

    async fn six_listings() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        let alice = store.create_user("alice", "hash").await.unwrap();
        let bob = store.create_user("bob", "hash").await.unwrap();
        for (i, price) in (5000..=10000).step_by(1000).enumerate() {
            let author: &User = if i % 3 == 0 { &alice } else { &bob };
            store
                .insert_listing(
                    &NewListing {
                        title: format!("card {}", price),
                        text: "a fine thing".into(),
                        image_url: format!("http://img/{}.jpeg", price),
                        price: price as f64,
                    },
                    author,
                )
                .await
                .unwrap();
        }
        store
    }

    fn params(query: &str, caller: Option<&str>) -> QueryParams {
        FeedQueryCompiler::default().compile(
            &RawFeedParams::from_query_string(query),
            caller.map(Identity::new),
        )
    }

    #[tokio::test]
    async fn price_range_ascending() {
        let exec = FeedExecutor::new(six_listings().await);
        let records = exec
            .execute(&params("price_min=7000&price_max=10000&sort_by=price&order=asc", None))
            .await
            .unwrap();
        let prices: Vec<f64> = records.iter().map(|r| r.price).collect();
        assert_eq!(prices, vec![7000.0, 8000.0, 9000.0, 10000.0]);
    }

    #[tokio::test]
    async fn anonymous_caller_gets_no_ownership() {
        let exec = FeedExecutor::new(six_listings().await);
        let records = exec.execute(&params("", None)).await.unwrap();
        assert_eq!(records.len(), 6);
        assert!(records.iter().all(|r| r.is_owned.is_none()));
    }

    #[tokio::test]
    async fn ownership_is_relative_to_caller() {
        let exec = FeedExecutor::new(six_listings().await);
        let records = exec.execute(&params("", Some("alice"))).await.unwrap();
        let owned = records.iter().filter(|r| r.is_owned == Some(true)).count();
        let foreign = records.iter().filter(|r| r.is_owned == Some(false)).count();
        assert_eq!((owned, foreign), (2, 4));
        for r in &records {
            assert_eq!(r.is_owned, Some(r.username == "alice"));
        }
    }

    #[tokio::test]
    async fn second_page_of_three() {
        let store = Arc::new(MemoryStore::new());
        let alice = store.create_user("alice", "hash").await.unwrap();
        for i in 1..=10 {
            store
                .insert_listing(
                    &NewListing {
                        title: format!("card {}", i),
                        text: "a fine thing".into(),
                        image_url: "http://img/x.jpeg".into(),
                        price: 1.0,
                    },
                    &alice,
                )
                .await
                .unwrap();
        }
        let exec = FeedExecutor::new(store);
        let records = exec.execute(&params("page=2&per_page=3", None)).await.unwrap();
        let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
        // newest first: ranks 4..=6 are cards 7, 6, 5
        assert_eq!(titles, vec!["card 7", "card 6", "card 5"]);
    }

    struct BrokenStore;

    #[async_trait]
    impl ListingStore for BrokenStore {
        async fn query(&self, _: &ListingQuery) -> Result<Vec<ListingRow>, DatabaseError> {
            Err(sqlx::Error::Protocol("connection reset".into()).into())
        }

        async fn insert_listing(&self, _: &NewListing, _: &User) -> Result<(), DatabaseError> {
            Err(sqlx::Error::Protocol("connection reset".into()).into())
        }
    }

    #[tokio::test]
    async fn storage_failure_fails_whole_request() {
        let exec = FeedExecutor::new(Arc::new(BrokenStore));
        let err = exec.execute(&params("", None)).await.unwrap_err();
        assert!(matches!(err, FeedError::Storage(_)));
    }
}
