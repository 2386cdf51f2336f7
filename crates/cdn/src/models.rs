//! CDN models.

use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

/// A distribution as reported by the provider's listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distribution {
    pub id: String,
    /// Provider-assigned host name (e.g. `d111111abcdef8.cloudfront.net`)
    pub domain_name: String,
    /// Alternate domain names (CNAMEs) the distribution answers for
    pub aliases: Vec<String>,
}
impl Distribution {
    /// Whether this distribution answers for `domain`.
    ///
    /// Matching is exact: `example.com` does not match `www.example.com`.
    ///
    /// ```
    /// use sitesync_cdn::Distribution;
    ///
    /// let distribution = Distribution {
    ///     id: "E2QWRUHEXAMPLE".to_string(),
    ///     domain_name: "d111111abcdef8.cloudfront.net".to_string(),
    ///     aliases: vec!["example.com".to_string(), "www.example.com".to_string()],
    /// };
    /// assert!(distribution.serves("www.example.com"));
    /// assert!(!distribution.serves("example.org"));
    /// ```
    pub fn serves(&self, domain: &str) -> bool {
        self.domain_name == domain || self.aliases.iter().any(|alias| alias == domain)
    }
}

/// A batch of paths to evict from the CDN caches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidationBatch {
    /// Unique per request; the provider deduplicates on it
    pub caller_reference: String,
    /// Absolute, escaped request paths (`/index.html`)
    pub paths: Vec<String>,
}
impl InvalidationBatch {
    /// Create a batch for `paths`, referenced by the current time.
    pub fn new(paths: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            caller_reference: caller_reference(OffsetDateTime::now_utc()),
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }
}

/// Render a caller reference for an invalidation requested at `at`.
///
/// The reference is the UTC timestamp down to the millisecond, digits only.
///
/// ```
/// use sitesync_cdn::caller_reference;
/// use time::macros::datetime;
///
/// assert_eq!(caller_reference(datetime!(2024-03-09 07:05:01.042 UTC)), "20240309070501042");
/// ```
pub fn caller_reference(at: OffsetDateTime) -> String {
    let at = at.to_offset(UtcOffset::UTC);
    at.format(format_description!("[year][month][day][hour][minute][second][subsecond digits:3]"))
        .unwrap_or_else(|_| at.unix_timestamp_nanos().to_string())
}
