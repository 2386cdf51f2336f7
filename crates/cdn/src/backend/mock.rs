//! In-memory CDN for testing.

use super::DistributionStream;
use crate::Cdn;
use crate::error::{ErrorKind, Result};
use crate::models::{Distribution, InvalidationBatch};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// In-memory CDN for testing.
///
/// Distributions are handed out in pages of [`page_size`](Self::page_size)
/// so that callers exercise pagination; every submitted invalidation is
/// recorded for inspection.
///
/// # Examples
///
/// ```
/// use sitesync_cdn::backend::MockCdn;
/// use sitesync_cdn::Cdn;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let cdn = MockCdn::with_distributions([("E1", ["example.com"])]);
/// let found = cdn.find_distribution("example.com").await?;
/// assert_eq!(found.unwrap().id, "E1");
/// # Ok(())
/// # }
/// ```
pub struct MockCdn {
    distributions: Vec<Distribution>,
    page_size: usize,
    invalidations: RwLock<Vec<(String, InvalidationBatch)>>,
    pages_served: RwLock<usize>,
    fail_listing: bool,
    fail_invalidation: bool,
}

impl MockCdn {
    /// Create a mock CDN from `(id, aliases)` pairs.
    ///
    /// Each distribution's provider host name is `<id>.cloudfront.test`.
    pub fn with_distributions<A>(distributions: impl IntoIterator<Item = (&'static str, A)>) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
    {
        let distributions = distributions
            .into_iter()
            .map(|(id, aliases)| Distribution {
                id: id.to_string(),
                domain_name: format!("{}.cloudfront.test", id.to_lowercase()),
                aliases: aliases.into_iter().map(Into::into).collect(),
            })
            .collect();
        Self {
            distributions,
            page_size: 1,
            invalidations: RwLock::new(Vec::new()),
            pages_served: RwLock::new(0),
            fail_listing: false,
            fail_invalidation: false,
        }
    }

    /// Number of distributions per listing page.
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Make listing fail as if credentials were rejected.
    pub fn failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    /// Make every invalidation request fail.
    pub fn failing_invalidation(mut self) -> Self {
        self.fail_invalidation = true;
        self
    }

    /// Every invalidation submitted so far, with its distribution id.
    pub async fn invalidations(&self) -> Vec<(String, InvalidationBatch)> {
        self.invalidations.read().await.clone()
    }

    /// Number of listing pages requested so far.
    pub async fn pages_served(&self) -> usize {
        *self.pages_served.read().await
    }
}
impl Default for MockCdn {
    fn default() -> Self {
        let distributions: [(&str, [&str; 0]); 0] = [];
        Self::with_distributions(distributions)
    }
}

#[async_trait]
impl Cdn for MockCdn {
    fn name(&self) -> &str {
        "mock"
    }

    fn list_distributions_stream(&self) -> DistributionStream<'_> {
        Box::pin(async_stream::stream! {
            if self.fail_listing {
                yield Err(exn::Exn::from(ErrorKind::Credentials));
                return;
            }
            for page in self.distributions.chunks(self.page_size) {
                *self.pages_served.write().await += 1;
                for distribution in page {
                    yield Ok(distribution.clone());
                }
            }
        })
    }

    async fn create_invalidation(&self, distribution_id: &str, batch: &InvalidationBatch) -> Result<String> {
        if self.fail_invalidation {
            exn::bail!(ErrorKind::BackendError("injected invalidation failure".to_string()));
        }
        if !self.distributions.iter().any(|d| d.id == distribution_id) {
            exn::bail!(ErrorKind::NotFound(distribution_id.to_string()));
        }
        let mut invalidations = self.invalidations.write().await;
        invalidations.push((distribution_id.to_string(), batch.clone()));
        Ok(format!("I{}", invalidations.len()))
    }
}
