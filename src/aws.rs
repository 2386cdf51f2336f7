//! Provider client construction.

use aws_config::retry::RetryConfig;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_s3::config::{Credentials, Region};
use sitesync_config::Config;

/// Attempts per request, the first included.
const MAX_ATTEMPTS: u32 = 4;

/// Clients for every service sitesync talks to, sharing one configuration.
#[derive(Debug, Clone)]
pub struct Clients {
    pub s3: aws_sdk_s3::Client,
    pub cloudfront: aws_sdk_cloudfront::Client,
    pub iam: aws_sdk_iam::Client,
}

impl Clients {
    /// Resolve region and credentials and build the clients.
    ///
    /// Explicit keys from the configuration take precedence over a named
    /// profile, which takes precedence over the default provider chain
    /// (environment, shared files, instance metadata). Credentials are
    /// resolved lazily, on the first request.
    pub async fn load(config: &Config) -> Self {
        let shared = sdk_config(config).await;
        let mut s3 = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = &config.endpoint {
            tracing::debug!(endpoint, "Using custom object store endpoint");
            // Most S3-compatible services do not support virtual-hosted buckets.
            s3 = s3.endpoint_url(endpoint).force_path_style(true);
        }
        Self {
            s3: aws_sdk_s3::Client::from_conf(s3.build()),
            cloudfront: aws_sdk_cloudfront::Client::new(&shared),
            iam: aws_sdk_iam::Client::new(&shared),
        }
    }
}

async fn sdk_config(config: &Config) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.region.clone()))
        .retry_config(RetryConfig::standard().with_max_attempts(MAX_ATTEMPTS));
    if let Some(credentials) = &config.credentials {
        loader = loader.credentials_provider(Credentials::new(
            &credentials.key_id,
            &credentials.key_secret,
            None,
            None,
            "sitesync-config",
        ));
    } else if let Some(profile) = &config.profile {
        loader = loader.profile_name(profile);
    }
    loader.load().await
}
