//! Amazon CloudFront.
//!
//! Besides the [`Cdn`] implementation used by every sync, this module holds
//! the provisioning calls behind the `create` command: creating a
//! distribution in front of a website bucket, and uploading the TLS
//! certificate it presents.

use crate::{
    Cdn,
    backend::DistributionStream,
    error::{Error, ErrorKind, Result},
    models::{Distribution, InvalidationBatch, caller_reference},
};
use async_stream::stream;
use async_trait::async_trait;
use aws_sdk_cloudfront::{
    Client,
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    types::{
        Aliases, CookiePreference, CustomOriginConfig, DefaultCacheBehavior, DistributionConfig, ForwardedValues,
        ItemSelection, Origin, OriginProtocolPolicy, Origins, Paths, SslSupportMethod, TrustedSigners,
        ViewerCertificate, ViewerProtocolPolicy,
    },
};
use exn::{OptionExt, ResultExt};
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tracing::instrument;

const CREDENTIAL_ERROR_CODES: [&str; 7] = [
    "AccessDenied",
    "AccessDeniedException",
    "ExpiredToken",
    "InvalidClientTokenId",
    "MissingAuthenticationToken",
    "SignatureDoesNotMatch",
    "UnrecognizedClientException",
];

/// Server certificates used by CloudFront must live under this IAM path.
const CERTIFICATE_PATH: &str = "/cloudfront/production/";

/// Amazon CloudFront.
#[derive(Debug, Clone)]
pub struct CloudFront {
    client: Client,
}

impl CloudFront {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Create a distribution serving the website endpoint of a bucket.
    #[instrument(skip(self, spec), fields(domain = %spec.domain))]
    pub async fn create_distribution(&self, spec: &DistributionSpec) -> Result<CreatedDistribution> {
        let origin_id = format!("S3-{}", spec.domain);
        let aliases = spec.aliases();

        let origin = Origin::builder()
            .id(&origin_id)
            .domain_name(spec.origin_domain())
            .custom_origin_config(
                CustomOriginConfig::builder()
                    .http_port(80)
                    .https_port(443)
                    // Website endpoints only speak plain HTTP.
                    .origin_protocol_policy(OriginProtocolPolicy::HttpOnly)
                    .build()
                    .or_raise(|| invalid("custom origin"))?,
            )
            .build()
            .or_raise(|| invalid("origin"))?;
        // Legacy cache settings: the minimum TTL is configured per distribution
        // rather than through a separately managed cache policy.
        #[allow(deprecated)]
        let cache_behavior = DefaultCacheBehavior::builder()
            .target_origin_id(&origin_id)
            .viewer_protocol_policy(ViewerProtocolPolicy::AllowAll)
            .min_ttl(spec.min_ttl)
            .forwarded_values(
                ForwardedValues::builder()
                    .query_string(false)
                    .cookies(
                        CookiePreference::builder()
                            .forward(ItemSelection::None)
                            .build()
                            .or_raise(|| invalid("cookie preference"))?,
                    )
                    .build()
                    .or_raise(|| invalid("forwarded values"))?,
            )
            .trusted_signers(
                TrustedSigners::builder().enabled(false).quantity(0).build().or_raise(|| invalid("trusted signers"))?,
            )
            .build()
            .or_raise(|| invalid("default cache behavior"))?;

        let mut config = DistributionConfig::builder()
            .caller_reference(caller_reference(OffsetDateTime::now_utc()))
            .comment(&spec.domain)
            .enabled(true)
            .default_root_object(&spec.index_document)
            .aliases(
                Aliases::builder()
                    .quantity(quantity(aliases.len())?)
                    .set_items(Some(aliases.clone()))
                    .build()
                    .or_raise(|| invalid("aliases"))?,
            )
            .origins(Origins::builder().quantity(1).items(origin).build().or_raise(|| invalid("origins"))?)
            .default_cache_behavior(cache_behavior);
        if let Some(certificate_id) = &spec.certificate_id {
            config = config.viewer_certificate(
                ViewerCertificate::builder()
                    .iam_certificate_id(certificate_id)
                    .ssl_support_method(SslSupportMethod::SniOnly)
                    .build(),
            );
        }
        let config = config.build().or_raise(|| invalid("distribution config"))?;

        let response =
            self.client.create_distribution().distribution_config(config).send().await.map_err(raise)?;
        let distribution = response
            .distribution()
            .ok_or_raise(|| ErrorKind::BackendError("no distribution in response".to_string()))?;
        tracing::info!(id = distribution.id(), domain_name = distribution.domain_name(), ?aliases, "Created distribution");
        Ok(CreatedDistribution {
            id: distribution.id().to_string(),
            domain_name: distribution.domain_name().to_string(),
        })
    }
}

/// What to put in front of a website bucket.
#[derive(Debug, Clone)]
pub struct DistributionSpec {
    /// Site domain; also the bucket name
    pub domain: String,
    /// Region hosting the bucket's website endpoint
    pub region: String,
    /// Also answer for `www.<domain>`
    pub www: bool,
    /// IAM server certificate id to present over HTTPS
    pub certificate_id: Option<String>,
    pub index_document: String,
    /// Minimum time objects stay cached, in seconds
    pub min_ttl: i64,
}
impl DistributionSpec {
    pub fn new(domain: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            region: region.into(),
            www: true,
            certificate_id: None,
            index_document: "index.html".to_string(),
            min_ttl: 60,
        }
    }

    fn aliases(&self) -> Vec<String> {
        let mut aliases = vec![self.domain.clone()];
        if self.www {
            aliases.push(format!("www.{}", self.domain));
        }
        aliases
    }

    fn origin_domain(&self) -> String {
        format!("{}.s3-website-{}.amazonaws.com", self.domain, self.region)
    }
}

/// A newly created distribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedDistribution {
    pub id: String,
    /// Host name the site's DNS records should point at
    pub domain_name: String,
}

/// Upload a TLS certificate for `domain` to IAM, where CloudFront can use it.
///
/// Returns the server certificate id to pass as
/// [`DistributionSpec::certificate_id`].
#[instrument(skip(client))]
pub async fn upload_server_certificate(
    client: &aws_sdk_iam::Client,
    domain: &str,
    body: &Path,
    chain: &Path,
    private_key: &Path,
) -> Result<String> {
    let body = read_pem(body).await?;
    let chain = read_pem(chain).await?;
    let private_key = read_pem(private_key).await?;
    let response = client
        .upload_server_certificate()
        .server_certificate_name(domain)
        .path(CERTIFICATE_PATH)
        .certificate_body(body)
        .certificate_chain(chain)
        .private_key(private_key)
        .send()
        .await
        .map_err(raise)?;
    let id = response
        .server_certificate_metadata()
        .map(|metadata| metadata.server_certificate_id().to_string())
        .ok_or_raise(|| ErrorKind::BackendError("no certificate metadata in response".to_string()))?;
    tracing::info!(domain, id, "Uploaded server certificate");
    Ok(id)
}

async fn read_pem(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path).await.or_raise(|| ErrorKind::Read(PathBuf::from(path)))
}

fn invalid(what: &str) -> ErrorKind {
    ErrorKind::InvalidRequest(what.to_string())
}

fn quantity(len: usize) -> Result<i32> {
    i32::try_from(len).or_raise(|| ErrorKind::InvalidRequest(format!("too many items: {len}")))
}

#[track_caller]
fn raise<E, R>(err: SdkError<E, R>) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: Debug + Send + Sync + 'static,
{
    let message = DisplayErrorContext(&err).to_string();
    let kind = match &err {
        SdkError::ServiceError(service) => match service.err().code() {
            Some("NoSuchDistribution") => ErrorKind::NotFound(service.err().message().unwrap_or_default().to_string()),
            Some(code) if CREDENTIAL_ERROR_CODES.contains(&code) => ErrorKind::Credentials,
            _ => ErrorKind::BackendError(message),
        },
        _ if message.to_lowercase().contains("credential") => ErrorKind::Credentials,
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            ErrorKind::Network(message)
        },
        _ => ErrorKind::BackendError(message),
    };
    exn::Exn::from(err).raise(kind)
}

#[async_trait]
impl Cdn for CloudFront {
    fn name(&self) -> &str {
        "cloudfront"
    }

    fn list_distributions_stream(&self) -> DistributionStream<'_> {
        Box::pin(stream! {
            let mut marker: Option<String> = None;
            loop {
                let response = match self.client.list_distributions().set_marker(marker.take()).send().await {
                    Ok(response) => response,
                    Err(e) => {
                        yield Err(raise(e));
                        return;
                    },
                };
                let Some(list) = response.distribution_list() else {
                    break;
                };
                for summary in list.items() {
                    yield Ok(Distribution {
                        id: summary.id().to_string(),
                        domain_name: summary.domain_name().to_string(),
                        aliases: summary.aliases().map(|aliases| aliases.items().to_vec()).unwrap_or_default(),
                    });
                }
                match (list.is_truncated(), list.next_marker()) {
                    (true, Some(next)) => marker = Some(next.to_string()),
                    _ => break,
                }
            }
        })
    }

    #[instrument(skip(self, batch), fields(paths = batch.paths.len()))]
    async fn create_invalidation(&self, distribution_id: &str, batch: &InvalidationBatch) -> Result<String> {
        let paths = Paths::builder()
            .quantity(quantity(batch.paths.len())?)
            .set_items(Some(batch.paths.clone()))
            .build()
            .or_raise(|| invalid("paths"))?;
        let request = aws_sdk_cloudfront::types::InvalidationBatch::builder()
            .paths(paths)
            .caller_reference(&batch.caller_reference)
            .build()
            .or_raise(|| invalid("invalidation batch"))?;
        let response = self
            .client
            .create_invalidation()
            .distribution_id(distribution_id)
            .invalidation_batch(request)
            .send()
            .await
            .map_err(raise)?;
        let invalidation = response
            .invalidation()
            .ok_or_raise(|| ErrorKind::BackendError("no invalidation in response".to_string()))?;
        Ok(invalidation.id().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_cloudfront::error::ErrorMetadata;
    use aws_sdk_cloudfront::operation::create_distribution::CreateDistributionOutput;
    use aws_sdk_cloudfront::operation::create_invalidation::CreateInvalidationOutput;
    use aws_sdk_cloudfront::operation::list_distributions::{ListDistributionsError, ListDistributionsOutput};
    use aws_sdk_cloudfront::primitives::DateTime;
    use aws_sdk_cloudfront::types::{DistributionList, DistributionSummary, HttpVersion, Invalidation, PriceClass};
    use aws_smithy_mocks::{RuleMode, mock, mock_client};
    use std::io::Write;

    fn summary(id: &str, aliases: &[&str]) -> DistributionSummary {
        let mut builder = DistributionSummary::builder()
            .id(id)
            .arn(format!("arn:aws:cloudfront::123456789012:distribution/{id}"))
            .status("Deployed")
            .last_modified_time(DateTime::from_secs(0))
            .domain_name(format!("{}.cloudfront.net", id.to_lowercase()))
            .comment("")
            .price_class(PriceClass::PriceClassAll)
            .enabled(true)
            .web_acl_id("")
            .http_version(HttpVersion::Http2)
            .is_ipv6_enabled(true)
            .staging(false);
        if !aliases.is_empty() {
            builder = builder.aliases(
                Aliases::builder()
                    .quantity(aliases.len() as i32)
                    .set_items(Some(aliases.iter().map(|a| a.to_string()).collect()))
                    .build()
                    .unwrap(),
            );
        }
        builder.build().unwrap()
    }

    fn page(items: Vec<DistributionSummary>, next: Option<&str>) -> DistributionList {
        DistributionList::builder()
            .marker("")
            .max_items(100)
            .is_truncated(next.is_some())
            .quantity(items.len() as i32)
            .set_items(Some(items))
            .set_next_marker(next.map(str::to_string))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_listing_follows_markers() {
        let first = mock!(Client::list_distributions).match_requests(|req| req.marker().is_none()).then_output(|| {
            ListDistributionsOutput::builder()
                .distribution_list(page(vec![summary("E1", &["other.org"])], Some("m2")))
                .build()
        });
        let second = mock!(Client::list_distributions).match_requests(|req| req.marker() == Some("m2")).then_output(
            || {
                ListDistributionsOutput::builder()
                    .distribution_list(page(vec![summary("E2", &["example.com", "www.example.com"]), summary("E3", &[])], None))
                    .build()
            },
        );
        let client = mock_client!(aws_sdk_cloudfront, RuleMode::MatchAny, [&first, &second]);
        let cdn = CloudFront::new(client);

        let all = cdn.list_distributions().await.unwrap();
        assert_eq!(all.iter().map(|d| d.id.as_str()).collect::<Vec<_>>(), vec!["E1", "E2", "E3"]);
        assert_eq!(all[1].aliases, vec!["example.com".to_string(), "www.example.com".to_string()]);
        assert!(all[2].aliases.is_empty());
        assert_eq!(first.num_calls(), 1);
        assert_eq!(second.num_calls(), 1);
    }

    #[tokio::test]
    async fn test_listing_access_denied() {
        let rule = mock!(Client::list_distributions).then_error(|| {
            ListDistributionsError::generic(ErrorMetadata::builder().code("AccessDenied").message("no").build())
        });
        let client = mock_client!(aws_sdk_cloudfront, [&rule]);
        let err = CloudFront::new(client).list_distributions().await.unwrap_err();
        assert!(err.is_credentials());
    }

    #[tokio::test]
    async fn test_create_invalidation() {
        let rule = mock!(Client::create_invalidation)
            .match_requests(|req| {
                let batch = req.invalidation_batch().unwrap();
                req.distribution_id() == Some("E2")
                    && batch.caller_reference() == "20240101000000000"
                    && batch.paths().map(|p| p.items().to_vec()) == Some(vec!["/index.html".to_string()])
                    && batch.paths().map(|p| p.quantity()) == Some(1)
            })
            .then_output(|| {
                CreateInvalidationOutput::builder()
                    .invalidation(
                        Invalidation::builder()
                            .id("I2J0I21PCUYOIK")
                            .status("InProgress")
                            .create_time(DateTime::from_secs(0))
                            .build()
                            .unwrap(),
                    )
                    .build()
            });
        let client = mock_client!(aws_sdk_cloudfront, [&rule]);
        let batch = InvalidationBatch {
            caller_reference: "20240101000000000".to_string(),
            paths: vec!["/index.html".to_string()],
        };
        let id = CloudFront::new(client).create_invalidation("E2", &batch).await.unwrap();
        assert_eq!(id, "I2J0I21PCUYOIK");
        assert_eq!(rule.num_calls(), 1);
    }

    #[tokio::test]
    #[allow(deprecated)]
    async fn test_create_distribution_request() {
        let rule = mock!(Client::create_distribution)
            .match_requests(|req| {
                let Some(config) = req.distribution_config() else {
                    return false;
                };
                let origin = &config.origins().unwrap().items()[0];
                let aliases = config.aliases().map(|a| a.items().to_vec()).unwrap_or_default();
                origin.domain_name() == "example.com.s3-website-eu-west-1.amazonaws.com"
                    && origin.custom_origin_config().map(|c| c.origin_protocol_policy().clone())
                        == Some(OriginProtocolPolicy::HttpOnly)
                    && aliases == vec!["example.com".to_string()]
                    && config.default_root_object() == Some("index.html")
                    && config.default_cache_behavior().and_then(|b| b.min_ttl()) == Some(60)
                    && config.viewer_certificate().and_then(|v| v.iam_certificate_id()) == Some("ASCACERT")
            })
            .then_output(|| {
                CreateDistributionOutput::builder()
                    .distribution(
                        aws_sdk_cloudfront::types::Distribution::builder()
                            .id("ENEW")
                            .arn("arn:aws:cloudfront::123456789012:distribution/ENEW")
                            .status("InProgress")
                            .last_modified_time(DateTime::from_secs(0))
                            .in_progress_invalidation_batches(0)
                            .domain_name("dnew.cloudfront.net")
                            .build()
                            .unwrap(),
                    )
                    .build()
            });
        let client = mock_client!(aws_sdk_cloudfront, [&rule]);
        let mut spec = DistributionSpec::new("example.com", "eu-west-1");
        spec.www = false;
        spec.certificate_id = Some("ASCACERT".to_string());
        let created = CloudFront::new(client).create_distribution(&spec).await.unwrap();
        assert_eq!(created, CreatedDistribution { id: "ENEW".to_string(), domain_name: "dnew.cloudfront.net".to_string() });
        assert_eq!(rule.num_calls(), 1);
    }

    #[test]
    fn test_distribution_aliases() {
        let spec = DistributionSpec::new("example.com", "us-east-1");
        assert_eq!(spec.aliases(), vec!["example.com".to_string(), "www.example.com".to_string()]);
        assert_eq!(spec.origin_domain(), "example.com.s3-website-us-east-1.amazonaws.com");
    }

    #[tokio::test]
    async fn test_upload_server_certificate() {
        use aws_sdk_iam::operation::upload_server_certificate::UploadServerCertificateOutput;
        use aws_sdk_iam::types::ServerCertificateMetadata;

        let rule = mock!(aws_sdk_iam::Client::upload_server_certificate)
            .match_requests(|req| {
                req.server_certificate_name() == Some("example.com")
                    && req.path() == Some(CERTIFICATE_PATH)
                    && req.certificate_body() == Some("BODY")
                    && req.certificate_chain() == Some("CHAIN")
            })
            .then_output(|| {
                UploadServerCertificateOutput::builder()
                    .server_certificate_metadata(
                        ServerCertificateMetadata::builder()
                            .path(CERTIFICATE_PATH)
                            .server_certificate_name("example.com")
                            .server_certificate_id("ASCACERT")
                            .arn("arn:aws:iam::123456789012:server-certificate/cloudfront/production/example.com")
                            .build()
                            .unwrap(),
                    )
                    .build()
            });
        let client = mock_client!(aws_sdk_iam, [&rule]);
        let dir = tempfile::tempdir().unwrap();
        let write = |name: &str, data: &str| {
            let path = dir.path().join(name);
            std::fs::File::create(&path).unwrap().write_all(data.as_bytes()).unwrap();
            path
        };
        let (body, chain, key) = (write("body.pem", "BODY"), write("chain.pem", "CHAIN"), write("key.pem", "KEY"));
        let id = upload_server_certificate(&client, "example.com", &body, &chain, &key).await.unwrap();
        assert_eq!(id, "ASCACERT");
        assert_eq!(rule.num_calls(), 1);
    }

    #[tokio::test]
    async fn test_upload_server_certificate_missing_file() {
        let rule = mock!(aws_sdk_iam::Client::upload_server_certificate).then_output(|| {
            aws_sdk_iam::operation::upload_server_certificate::UploadServerCertificateOutput::builder().build()
        });
        let client = mock_client!(aws_sdk_iam, [&rule]);
        let missing = Path::new("/definitely/not/here.pem");
        let err = upload_server_certificate(&client, "example.com", missing, missing, missing).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Read(_)));
        assert_eq!(rule.num_calls(), 0);
    }
}
