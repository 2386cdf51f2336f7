//! CDN invalidation of changed paths.

use crate::error::{ErrorKind, Result};
use crate::report::ChangedKeys;
use sitesync_cdn::{Cdn, InvalidationBatch};
use tracing::instrument;

/// A submitted invalidation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidationReceipt {
    pub distribution_id: String,
    pub invalidation_id: String,
    pub paths: Vec<String>,
}

/// Invalidate every changed path on the distribution serving `domain`.
///
/// Does nothing (and returns `None`) when no path changed. Otherwise the
/// first distribution whose host name or aliases include `domain` gets a
/// single batch containing every path once.
#[instrument(skip(cdn, changed), fields(cdn = cdn.name(), paths = changed.len()))]
pub async fn invalidate(cdn: &dyn Cdn, domain: &str, changed: &ChangedKeys) -> Result<Option<InvalidationReceipt>> {
    if changed.is_empty() {
        tracing::info!(domain, "Nothing changed; no invalidation needed");
        return Ok(None);
    }
    let paths: Vec<String> = changed.iter().map(str::to_string).collect();

    let distribution = match cdn.find_distribution(domain).await {
        Ok(Some(distribution)) => distribution,
        Ok(None) => {
            tracing::error!(domain, stale = ?paths, "No distribution serves this domain; cached copies remain stale");
            exn::bail!(ErrorKind::NoDistribution(domain.to_string()));
        },
        Err(err) => {
            tracing::error!(domain, stale = ?paths, "Unable to list distributions; cached copies remain stale");
            let kind = if err.is_credentials() { ErrorKind::Credentials } else { ErrorKind::Invalidation };
            return Err(err.raise(kind));
        },
    };

    tracing::info!(domain, distribution = distribution.id, paths = paths.len(), "Invalidating");
    let batch = InvalidationBatch::new(paths.iter().cloned());
    match cdn.create_invalidation(&distribution.id, &batch).await {
        Ok(invalidation_id) => Ok(Some(InvalidationReceipt {
            distribution_id: distribution.id,
            invalidation_id,
            paths,
        })),
        Err(err) => {
            tracing::error!(distribution = distribution.id, stale = ?paths, "Invalidation rejected; cached copies remain stale");
            let kind = if err.is_credentials() { ErrorKind::Credentials } else { ErrorKind::Invalidation };
            Err(err.raise(kind))
        },
    }
}
