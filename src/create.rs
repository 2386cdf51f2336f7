//! Provisioning for a new site: certificate, bucket, distribution.

use crate::aws::Clients;
use crate::cli::CreateArgs;
use crate::error::{ErrorKind, Result, escalate};
use exn::OptionExt;
use sitesync_cdn::backend::{CloudFront, DistributionSpec, upload_server_certificate};
use sitesync_storage::backend::S3Store;

const INDEX_DOCUMENT: &str = "index.html";
const ERROR_DOCUMENT: &str = "error.html";

/// Provision everything needed to serve `args.domain`. Stops at the first
/// failure; anything already created is left in place.
pub async fn create(clients: &Clients, region: &str, args: &CreateArgs) -> Result<()> {
    let certificate_id = match args.ssl {
        true => {
            let body = args.cert_body.as_deref().ok_or_raise(|| ErrorKind::Certificate)?;
            let chain = args.cert_chain.as_deref().ok_or_raise(|| ErrorKind::Certificate)?;
            let key = args.private_key.as_deref().ok_or_raise(|| ErrorKind::Certificate)?;
            let id = upload_server_certificate(&clients.iam, &args.domain, body, chain, key)
                .await
                .map_err(|err| {
                    let credentials = err.is_credentials();
                    escalate(err, credentials, ErrorKind::Certificate)
                })?;
            Some(id)
        },
        false => None,
    };

    S3Store::new(clients.s3.clone(), &args.domain)
        .create_website(region, INDEX_DOCUMENT, ERROR_DOCUMENT)
        .await
        .map_err(|err| {
            let credentials = err.is_credentials();
            escalate(err, credentials, ErrorKind::Bucket)
        })?;

    let mut spec = DistributionSpec::new(&args.domain, region);
    spec.www = args.www;
    spec.certificate_id = certificate_id;
    spec.index_document = INDEX_DOCUMENT.to_string();
    let created = CloudFront::new(clients.cloudfront.clone()).create_distribution(&spec).await.map_err(|err| {
        let credentials = err.is_credentials();
        escalate(err, credentials, ErrorKind::Distribution)
    })?;

    println!("Created distribution {} for {}", created.id, args.domain);
    println!("Point DNS for {} at {}", args.domain, created.domain_name);
    if args.www {
        println!("Point DNS for www.{} at {}", args.domain, created.domain_name);
    }
    Ok(())
}
