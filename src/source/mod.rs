//! Universe and quote sources
//!
//! The radar only sees these traits. Implementations:
//! - [`HttpSource`]: KIS-style proxy over HTTP
//! - [`SyntheticSource`]: seeded random walk for demo mode and tests
//! - [`FallbackSource`]: primary with a timeout, then a fallback

mod fallback;
mod http;
mod synthetic;
mod types;

pub use fallback::FallbackSource;
pub use http::{pad_code, HttpSource, HttpSourceConfig};
pub use synthetic::SyntheticSource;
pub use types::{DataOrigin, InstrumentMeta, Market, Quote, QuoteBatch, SourceError, Universe};

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

/// Bound a source call by `timeout`
pub async fn with_timeout<T>(
    timeout: Duration,
    fut: impl Future<Output = Result<T, SourceError>>,
) -> Result<T, SourceError> {
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(SourceError::Timeout(timeout)),
    }
}

/// Ranks the instruments worth watching
#[async_trait]
pub trait UniverseSource: Send + Sync {
    /// Rank candidates by recent activity
    ///
    /// Returns at most `watch_count` candidate codes picked from the top
    /// `top_n` of the ranking.
    async fn rank_candidates(
        &self,
        market: Market,
        top_n: usize,
        watch_count: usize,
    ) -> Result<Universe, SourceError>;
}

/// Supplies last-price snapshots on demand
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch_quotes(&self, market: Market, codes: &[String]) -> Result<QuoteBatch, SourceError>;
}
