//! CDN trait and implementations.
//!
//! The sync engine needs two things from a CDN: find the distribution that
//! serves a domain, and ask it to evict a set of paths.

#[cfg(feature = "cloudfront")]
mod cloudfront;
#[cfg(feature = "mock")]
mod mock;

#[cfg(feature = "cloudfront")]
pub use self::cloudfront::{CloudFront, CreatedDistribution, DistributionSpec, upload_server_certificate};
#[cfg(feature = "mock")]
pub use self::mock::MockCdn;
use crate::error::Result;
use crate::models::{Distribution, InvalidationBatch};
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use std::pin::Pin;

pub type DistributionStream<'a> = Pin<Box<dyn Stream<Item = Result<Distribution>> + Send + 'a>>;

/// Unified interface for content delivery networks.
#[async_trait]
pub trait Cdn: Send + Sync {
    /// Provider name (used for logging).
    fn name(&self) -> &str;

    /// Stream every distribution in the account.
    ///
    /// Implementations backed by a paged listing API **must** follow every
    /// page; a distribution on a later page is otherwise never found.
    fn list_distributions_stream(&self) -> DistributionStream<'_>;

    /// List every distribution in the account.
    async fn list_distributions(&self) -> Result<Vec<Distribution>> {
        self.list_distributions_stream().try_collect().await
    }

    /// Find the first distribution serving `domain`, stopping the listing as
    /// soon as one matches.
    async fn find_distribution(&self, domain: &str) -> Result<Option<Distribution>> {
        let mut stream = self.list_distributions_stream();
        while let Some(distribution) = stream.try_next().await? {
            if distribution.serves(domain) {
                return Ok(Some(distribution));
            }
        }
        Ok(None)
    }

    /// Submit an invalidation, returning the provider's invalidation id.
    async fn create_invalidation(&self, distribution_id: &str, batch: &InvalidationBatch) -> Result<String>;
}
