//! Primary source with a fallback

use super::{
    with_timeout, DataOrigin, Market, QuoteBatch, QuoteSource, SourceError, Universe,
    UniverseSource,
};
use async_trait::async_trait;
use std::time::Duration;

/// Asks the primary source first, bounded by a timeout, and answers from the
/// fallback when it fails
///
/// Responses produced by the fallback are tagged [`DataOrigin::Fallback`]
/// with the primary's failure as the reason.
pub struct FallbackSource<P, F> {
    primary: P,
    fallback: F,
    timeout: Duration,
}

impl<P, F> FallbackSource<P, F> {
    pub fn new(primary: P, fallback: F, timeout: Duration) -> Self {
        Self {
            primary,
            fallback,
            timeout,
        }
    }
}

#[async_trait]
impl<P, F> UniverseSource for FallbackSource<P, F>
where
    P: UniverseSource,
    F: UniverseSource,
{
    async fn rank_candidates(
        &self,
        market: Market,
        top_n: usize,
        watch_count: usize,
    ) -> Result<Universe, SourceError> {
        let primary = self.primary.rank_candidates(market, top_n, watch_count);
        match with_timeout(self.timeout, primary).await {
            Ok(universe) => Ok(universe),
            Err(e) => {
                tracing::warn!(error = %e, "Universe source failed, using fallback");
                let mut universe = self.fallback.rank_candidates(market, top_n, watch_count).await?;
                universe.origin = DataOrigin::Fallback {
                    reason: e.to_string(),
                };
                Ok(universe)
            }
        }
    }
}

#[async_trait]
impl<P, F> QuoteSource for FallbackSource<P, F>
where
    P: QuoteSource,
    F: QuoteSource,
{
    async fn fetch_quotes(&self, market: Market, codes: &[String]) -> Result<QuoteBatch, SourceError> {
        let primary = self.primary.fetch_quotes(market, codes);
        match with_timeout(self.timeout, primary).await {
            Ok(batch) => Ok(batch),
            Err(e) => {
                tracing::warn!(error = %e, "Quote source failed, using fallback");
                let mut batch = self.fallback.fetch_quotes(market, codes).await?;
                batch.origin = DataOrigin::Fallback {
                    reason: e.to_string(),
                };
                Ok(batch)
            }
        }
    }
}
