//! Courier Sign - print signed SES and APNs requests.
//!
//! Reads channel settings from the environment, signs one request, and
//! writes it to stdout so it can be replayed with any HTTP client.
//!
//! # Usage
//!
//! ```text
//! courier-sign ses [raw-message-file]   # SigV4 SendRawEmail (stdin if no file)
//! courier-sign ses-legacy               # AWS3-HTTPS headers
//! courier-sign apns <device-token> [subject]
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SES_REGION` | `eu-west-1` | SES region |
//! | `SES_REQUEST_MODE` | `api` | `api` or `http` |
//! | `SES_ACCESS_KEY` / `SES_SECRET_KEY` | *(unset)* | API key credential |
//! | `SES_USERNAME` / `SES_PASSWORD` | *(unset)* | Basic credential |
//! | `APNS_PRODUCTION` | `false` | Use the production gateway |
//! | `APNS_KEY_ID` / `APNS_TEAM_ID` / `APNS_PRIVATE_KEY_PATH` | *(unset)* | Token auth |
//! | `APNS_CERT_PATH` / `APNS_CERT_PASSPHRASE` | *(unset)* | Certificate auth |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::io::Read;

use anyhow::{Context, Result, bail};
use courier_apns_auth::{ApnsConfig, ApnsOptions, ApnsRequest};
use courier_core::{CourierConfig, RequestDescriptor};
use courier_ses_auth::{Aws3Signer, SesConfig};
use http::HeaderMap;
use tracing::info;
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const USAGE: &str = "usage: courier-sign <ses [raw-message-file] | ses-legacy | apns <device-token> [subject]>";

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
/// Logs go to stderr so stdout carries only the signed request.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn print_headers(headers: &HeaderMap) {
    for (name, value) in headers {
        println!("{name}: {}", String::from_utf8_lossy(value.as_bytes()));
    }
}

fn print_descriptor(request: &RequestDescriptor) {
    println!("{} https://{}{}", request.method, request.host, request.path);
    print_headers(&request.headers);
    println!();
    println!("{}", request.encoded_body());
}

/// Sign a `SendRawEmail` request with SigV4.
fn sign_ses(raw_message_file: Option<&str>) -> Result<()> {
    let raw_message = match raw_message_file {
        Some(path) => {
            std::fs::read(path).with_context(|| format!("cannot read raw message from {path}"))?
        }
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("cannot read raw message from stdin")?;
            buf
        }
    };

    let config = SesConfig::from_env();
    let ses = config.ses_request().context("invalid SES configuration")?;
    info!(
        region = %ses.region(),
        mode = %ses.mode(),
        "signing SES SendRawEmail request"
    );

    let request = ses.send_raw_email_descriptor(&raw_message);
    let prepared = ses
        .prepare_now(&request)
        .context("failed to sign SES request")?;
    print_descriptor(&prepared);
    Ok(())
}

/// Produce the legacy AWS3-HTTPS headers for the configured endpoint.
fn sign_ses_legacy() -> Result<()> {
    let config = SesConfig::from_env();
    let ses = config.ses_request().context("invalid SES configuration")?;
    info!(region = %ses.region(), "signing SES request with AWS3-HTTPS");

    let request = ses.send_raw_email_descriptor(&[]);
    let headers = Aws3Signer::new()
        .sign(&request, ses.credential())
        .context("failed to sign SES request")?;
    print_headers(&headers);
    Ok(())
}

/// Build and authenticate an APNs notification for one device.
fn sign_apns(device_token: &str, subject: &str) -> Result<()> {
    let config = ApnsConfig::from_env();
    let auth = config
        .authenticator()
        .context("invalid APNs configuration")?;
    info!(
        gateway = %config.environment(),
        production = config.production,
        "authenticating APNs request"
    );

    let options = ApnsOptions::new(device_token).with_random_id();
    let request = ApnsRequest::from_options(config.environment(), &options, subject)
        .context("failed to build APNs request")?
        .authenticate_with(&auth)
        .context("failed to authenticate APNs request")?;

    println!("{} {}", request.method, request.url());
    print_headers(&request.headers);
    if let Some(tls) = &request.tls {
        println!("# client certificate: {}", tls.certificate_path().display());
    }
    println!();
    let body = request.body().context("failed to encode APNs payload")?;
    println!("{}", String::from_utf8_lossy(&body));
    Ok(())
}

fn main() -> Result<()> {
    let config = CourierConfig::from_env();
    init_tracing(&config.log_level)?;

    info!(version = VERSION, "starting courier-sign");

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["ses"] => sign_ses(None),
        ["ses", file] => sign_ses(Some(*file)),
        ["ses-legacy"] => sign_ses_legacy(),
        ["apns", token] => sign_apns(token, ""),
        ["apns", token, subject] => sign_apns(token, subject),
        _ => bail!(USAGE),
    }
}
