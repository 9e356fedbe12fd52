pub mod executor;
pub mod query;
pub mod record;

use std::sync::Arc;

use thiserror::Error;

use crate::auth::Identity;
use crate::database::{DatabaseError, ListingStore};

pub use executor::FeedExecutor;
pub use query::{FeedQueryCompiler, QueryParams, RawFeedParams};
pub use record::ListingRecord;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("listing store failure: {0}")]
    Storage(DatabaseError),
}

/// Compiles raw feed parameters and runs them. The caller has already been
/// resolved by the auth middleware.
pub struct FeedService {
    compiler: FeedQueryCompiler,
    executor: FeedExecutor,
}

impl FeedService {
    pub fn new(store: Arc<dyn ListingStore>, max_per_page: Option<i64>) -> Self {
        Self {
            compiler: FeedQueryCompiler::new(max_per_page),
            executor: FeedExecutor::new(store),
        }
    }

    pub async fn get_feed(
        &self,
        raw: &RawFeedParams,
        caller: Option<Identity>,
    ) -> Result<Vec<ListingRecord>, FeedError> {
        let params = self.compiler.compile(raw, caller);
        tracing::debug!(
            "Feed query: page={} per_page={} sort={:?} {:?} min={:?} max={:?}",
            params.page,
            params.per_page,
            params.sort_by,
            params.order,
            params.price_min,
            params.price_max
        );
        self.executor.execute(&params).await
    }
}
