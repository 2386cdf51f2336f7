//! Storage models.
//!
//! These types describe objects already stored remotely (for change
//! detection) and the metadata attached to new uploads.

/// An object currently stored in the remote bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteObject {
    /// Object key, relative to the bucket root, no leading slash
    pub key: String,
    /// Content fingerprint recorded by the provider, quotes stripped
    pub digest: String,
}
impl RemoteObject {
    /// Create a record from a listing entry, normalizing the entity tag.
    ///
    /// ```
    /// use sitesync_storage::RemoteObject;
    ///
    /// let object = RemoteObject::new("index.html", "\"d41d8cd98f00b204e9800998ecf8427e\"");
    /// assert_eq!(object.digest, "d41d8cd98f00b204e9800998ecf8427e");
    /// ```
    pub fn new(key: impl Into<String>, etag: impl AsRef<str>) -> Self {
        Self {
            key: key.into(),
            digest: normalize_etag(etag.as_ref()).to_string(),
        }
    }
}

/// Strip the quoting (and weak validator prefix) from an entity tag.
pub fn normalize_etag(etag: &str) -> &str {
    let etag = etag.trim();
    let etag = etag.strip_prefix("W/").unwrap_or(etag);
    etag.strip_prefix('"').and_then(|e| e.strip_suffix('"')).unwrap_or(etag)
}

/// Metadata sent along with an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutOptions {
    /// MIME type served as `Content-Type`
    pub content_type: String,
    /// `Content-Encoding`, set only when the body is compressed
    pub content_encoding: Option<String>,
    /// `Cache-Control` header served to browsers and the CDN
    pub cache_control: String,
    /// Canned access policy (e.g. `public-read`); omitted when `None`
    pub acl: Option<String>,
}
