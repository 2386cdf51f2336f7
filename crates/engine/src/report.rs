//! Results of a sync run.

use crate::invalidate::InvalidationReceipt;
use std::collections::BTreeSet;
use std::fmt::Write;

/// Request-path form of an object key: `/`-prefixed, percent-encoded.
///
/// Unreserved characters, `/` and the sub-delimiters allowed in a URI path
/// are kept; every other byte is escaped.
///
/// ```
/// use sitesync_engine::escape_path;
///
/// assert_eq!(escape_path("docs/read me.html"), "/docs/read%20me.html");
/// assert_eq!(escape_path("a+b(1).css"), "/a+b(1).css");
/// ```
pub fn escape_path(key: &str) -> String {
    let mut escaped = String::with_capacity(key.len() + 1);
    escaped.push('/');
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || b"-._~/!$&'()*+,;=:@".contains(&byte) {
            escaped.push(char::from(byte));
        } else {
            // Writing to a String cannot fail.
            let _ = write!(escaped, "%{byte:02X}");
        }
    }
    escaped
}

/// Request paths of the objects uploaded during a run, each at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangedKeys(BTreeSet<String>);

impl ChangedKeys {
    /// Record an escaped request path. Returns `false` if it was already present.
    pub fn insert(&mut self, path: impl Into<String>) -> bool {
        self.0.insert(path.into())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.0.contains(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
impl<'a> IntoIterator for &'a ChangedKeys {
    type Item = &'a String;
    type IntoIter = std::collections::btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
impl<S: Into<String>> FromIterator<S> for ChangedKeys {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Summary of a completed sync.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Paths uploaded during this run
    pub changed: ChangedKeys,
    /// Files whose remote copy was already up to date
    pub unchanged: u64,
    /// Keys of files that could not be uploaded
    pub failed: Vec<String>,
    /// `None` when nothing changed or the run was a dry run
    pub invalidation: Option<InvalidationReceipt>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("index.html", "/index.html")]
    #[case("css/site.css", "/css/site.css")]
    #[case("a b.txt", "/a%20b.txt")]
    #[case("q?.html", "/q%3F.html")]
    #[case("100%.html", "/100%25.html")]
    #[case("frag#1", "/frag%231")]
    #[case("café.html", "/caf%C3%A9.html")]
    #[case("~user/x_y-z.js", "/~user/x_y-z.js")]
    #[case("a=1;b@c:d$e&f,g", "/a=1;b@c:d$e&f,g")]
    fn test_escape_path(#[case] key: &str, #[case] expected: &str) {
        assert_eq!(escape_path(key), expected);
    }

    #[test]
    fn test_changed_keys_deduplicate() {
        let mut changed = ChangedKeys::default();
        assert!(changed.insert("/a.html"));
        assert!(changed.insert("/b.html"));
        assert!(!changed.insert("/a.html"));
        assert_eq!(changed.len(), 2);
        assert_eq!(changed.iter().collect::<Vec<_>>(), vec!["/a.html", "/b.html"]);
    }
}
