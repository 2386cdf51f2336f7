use clap::{ArgAction, Args, Parser, Subcommand};
use figment::Figment;
use figment::providers::Serialized;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "sitesync", version, about = "Deploy a static site to S3 and invalidate what changed on CloudFront")]
pub struct Cli {
    /// Configuration file (TOML, YAML or JSON), layered over the user configuration
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// More output; repeat for even more
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Upload changed files and invalidate them on the CDN
    Sync(SyncArgs),
    /// Create the bucket and distribution for a new site
    Create(CreateArgs),
}

#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Domain of the site; also the bucket name
    #[arg(long)]
    pub domain: String,
    /// Directory to upload
    #[arg(long, default_value = ".")]
    pub path: PathBuf,
    /// Upload every file, even those that have not changed
    #[arg(long)]
    pub reupload: bool,
    /// Number of concurrent uploads [default: 4]
    #[arg(long, value_name = "N")]
    pub concurrent: Option<usize>,
    /// Content encoding for compressible files: none, gzip, br, zstd [default: gzip]
    #[arg(long)]
    pub encoding: Option<String>,
    /// Report what would be uploaded without uploading or invalidating
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    /// Domain of the site; also the bucket name
    #[arg(long)]
    pub domain: String,
    /// Also serve the site on www.<domain>
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub www: bool,
    /// Upload a certificate and serve the site over HTTPS
    #[arg(long, requires_all = ["cert_body", "cert_chain", "private_key"])]
    pub ssl: bool,
    /// PEM-encoded certificate
    #[arg(long, value_name = "FILE")]
    pub cert_body: Option<PathBuf>,
    /// PEM-encoded intermediate certificate chain
    #[arg(long, value_name = "FILE")]
    pub cert_chain: Option<PathBuf>,
    /// PEM-encoded private key
    #[arg(long, value_name = "FILE")]
    pub private_key: Option<PathBuf>,
}

impl Command {
    /// Layer the flags that override configuration values on top of `figment`.
    pub fn merge_overrides(&self, figment: Figment) -> Figment {
        match self {
            Command::Sync(args) => {
                let mut figment = figment;
                if let Some(concurrent) = args.concurrent {
                    figment = figment.merge(Serialized::default("sync.concurrency", concurrent));
                }
                if let Some(encoding) = &args.encoding {
                    figment = figment.merge(Serialized::default("sync.compression.encoding", encoding));
                }
                figment
            },
            Command::Create(_) => figment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rstest::rstest;
    use sitesync_config::{Config, Loader};

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_sync_defaults() {
        let cli = Cli::parse_from(["sitesync", "sync", "--domain", "example.com"]);
        let Command::Sync(args) = cli.command else {
            panic!("expected sync");
        };
        assert_eq!(args.path, PathBuf::from("."));
        assert!(!args.reupload);
        assert!(!args.dry_run);
        assert_eq!(args.concurrent, None);
        assert_eq!(cli.verbose, 0);
    }

    #[rstest]
    #[case(&["sitesync", "create", "--domain", "example.com"], true)]
    #[case(&["sitesync", "create", "--domain", "example.com", "--www", "false"], false)]
    fn test_create_www(#[case] argv: &[&str], #[case] expected: bool) {
        let Command::Create(args) = Cli::parse_from(argv).command else {
            panic!("expected create");
        };
        assert_eq!(args.www, expected);
    }

    #[test]
    fn test_ssl_requires_certificate_files() {
        assert!(Cli::try_parse_from(["sitesync", "create", "--domain", "example.com", "--ssl"]).is_err());
        let cli = Cli::try_parse_from([
            "sitesync", "create", "--domain", "example.com", "--ssl", "--cert-body", "a.pem", "--cert-chain", "b.pem",
            "--private-key", "c.pem",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Create(CreateArgs { ssl: true, .. })));
    }

    #[test]
    fn test_flags_override_configuration() {
        let cli = Cli::parse_from(["sitesync", "-vv", "sync", "--domain", "example.com", "--concurrent", "9", "--encoding", "none"]);
        assert_eq!(cli.verbose, 2);
        let figment = cli.command.merge_overrides(Loader::new().without_user_file().figment().unwrap());
        let config = Config::from_figment(&figment).unwrap();
        assert_eq!(config.sync.concurrency, 9);
        assert_eq!(config.sync.compression.encoding, "none");
    }
}
