//! S3-compatible object store.
//!
//! This module provides an [`ObjectStore`] implementation for S3-compatible
//! services, plus the one-shot bucket provisioning used by the `create`
//! command.
//!
//! # Credentials
//!
//! The store takes an already-configured [`Client`]; credential resolution
//! (explicit keys, profiles, environment) happens where the client is built.
//! Service errors that indicate rejected or missing credentials are reported
//! as [`ErrorKind::Credentials`].

use crate::{
    ObjectStore, PutOptions, RemoteObject,
    backend::RemoteObjectStream,
    error::{Error, ErrorKind, Result},
    validate_key,
};
use async_stream::stream;
use async_trait::async_trait;
use aws_sdk_s3::{
    Client,
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    primitives::ByteStream,
    types::{
        BucketLocationConstraint, CreateBucketConfiguration, ErrorDocument, IndexDocument, ObjectCannedAcl,
        ObjectOwnership, WebsiteConfiguration,
    },
};
use exn::ResultExt;
use std::fmt::Debug;
use std::path::Path;
use tracing::instrument;

/// Service error codes meaning "fix your credentials or permissions".
const CREDENTIAL_ERROR_CODES: [&str; 7] = [
    "AccessDenied",
    "AllAccessDisabled",
    "ExpiredToken",
    "InvalidAccessKeyId",
    "InvalidToken",
    "SignatureDoesNotMatch",
    "TokenRefreshRequired",
];

/// S3-compatible object store.
///
/// # Examples
///
/// ```no_run
/// use sitesync_storage::backend::S3Store;
///
/// # async fn example() {
/// let config = aws_sdk_s3::Config::builder().build();
/// let store = S3Store::new(aws_sdk_s3::Client::from_conf(config), "example.com");
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    /// Create a new store for `bucket` using a configured client.
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self { client, bucket: bucket.into() }
    }

    /// Create the bucket and configure it for static website hosting.
    ///
    /// The bucket is created with object-writer ownership and without a
    /// public access block so that uploads may carry a `public-read` ACL.
    /// A bucket that already exists and is owned by the caller is reused.
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    pub async fn create_website(&self, region: &str, index_document: &str, error_document: &str) -> Result<()> {
        let mut request =
            self.client.create_bucket().bucket(&self.bucket).object_ownership(ObjectOwnership::ObjectWriter);
        // us-east-1 is the implicit default and rejects an explicit constraint.
        if region != "us-east-1" {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }
        match request.send().await {
            Ok(_) => tracing::info!(bucket = %self.bucket, region, "Created bucket"),
            Err(e) if e.as_service_error().and_then(|s| s.code()) == Some("BucketAlreadyOwnedByYou") => {
                tracing::info!(bucket = %self.bucket, "Bucket already exists; reusing it");
            },
            Err(e) => return Err(self.raise(e)),
        }

        self.client
            .delete_public_access_block()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| self.raise(e))?;

        let website = WebsiteConfiguration::builder()
            .index_document(
                IndexDocument::builder()
                    .suffix(index_document)
                    .build()
                    .or_raise(|| ErrorKind::BackendError("invalid index document".to_string()))?,
            )
            .error_document(
                ErrorDocument::builder()
                    .key(error_document)
                    .build()
                    .or_raise(|| ErrorKind::BackendError("invalid error document".to_string()))?,
            )
            .build();
        self.client
            .put_bucket_website()
            .bucket(&self.bucket)
            .website_configuration(website)
            .send()
            .await
            .map_err(|e| self.raise(e))?;
        tracing::info!(bucket = %self.bucket, index_document, error_document, "Enabled website hosting");
        Ok(())
    }

    /// Wrap an SDK error in an error tree, classified into an actionable kind.
    #[track_caller]
    fn raise<E, R>(&self, err: SdkError<E, R>) -> Error
    where
        E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
        R: Debug + Send + Sync + 'static,
    {
        let kind = classify(&err, &self.bucket);
        exn::Exn::from(err).raise(kind)
    }
}

fn classify<E, R>(err: &SdkError<E, R>, bucket: &str) -> ErrorKind
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: Debug,
{
    let message = DisplayErrorContext(err).to_string();
    match err {
        SdkError::ServiceError(service) => match service.err().code() {
            Some("NoSuchBucket") => ErrorKind::BucketNotFound(bucket.to_string()),
            Some(code) if CREDENTIAL_ERROR_CODES.contains(&code) => ErrorKind::Credentials,
            _ => ErrorKind::BackendError(message),
        },
        // Identity resolution happens before dispatch; a missing credential
        // chain never reaches the service.
        _ if message.to_lowercase().contains("credential") => ErrorKind::Credentials,
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            ErrorKind::Network(message)
        },
        _ => ErrorKind::BackendError(message),
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    fn name(&self) -> &str {
        &self.bucket
    }

    fn list_stream(&self) -> RemoteObjectStream<'_> {
        Box::pin(stream! {
            let mut continuation: Option<String> = None;
            let mut page = 0_u32;
            loop {
                let response = match self
                    .client
                    .list_objects_v2()
                    .bucket(&self.bucket)
                    .set_continuation_token(continuation.take())
                    .send()
                    .await
                {
                    Ok(response) => response,
                    Err(e) => {
                        yield Err(self.raise(e));
                        return;
                    },
                };
                page += 1;
                tracing::debug!(bucket = %self.bucket, page, objects = response.contents().len(), "Listed page");
                for object in response.contents() {
                    match (object.key(), object.e_tag()) {
                        (Some(key), Some(etag)) => yield Ok(RemoteObject::new(key, etag)),
                        (key, _) => tracing::warn!(bucket = %self.bucket, ?key, "Listed object has no key or entity tag; ignoring"),
                    }
                }
                // Keep going for as long as the service hands out a token;
                // `is_truncated` alone is not reported by every provider.
                match response.next_continuation_token() {
                    Some(token) => continuation = Some(token.to_string()),
                    None => break,
                }
            }
        })
    }

    #[instrument(skip(self, options), fields(bucket = %self.bucket))]
    async fn put(&self, key: &str, body: &Path, options: &PutOptions) -> Result<()> {
        let key = validate_key(key)?;
        let stream = ByteStream::from_path(body).await.or_raise(|| ErrorKind::Read(body.to_path_buf()))?;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(stream)
            .content_type(&options.content_type)
            .set_content_encoding(options.content_encoding.clone())
            .cache_control(&options.cache_control)
            .set_acl(options.acl.as_deref().map(ObjectCannedAcl::from))
            .send()
            .await
            .map_err(|e| self.raise(e))?;
        Ok(())
    }
}
