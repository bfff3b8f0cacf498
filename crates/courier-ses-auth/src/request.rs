//! SES request preparation.
//!
//! [`SesRequest`] binds a region, a request mode, and a credential, and turns
//! caller-supplied message fields into signed [`RequestDescriptor`]s for the
//! SES query API (`SendEmail` / `SendRawEmail`). Building MIME content is the
//! caller's job; this module only places fields.

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use courier_core::{AwsRegion, RequestDescriptor};
use http::{HeaderMap, Method};
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::credentials::Credential;
use crate::error::SigningError;
use crate::sigv4::{Sigv4Signer, SigningContext};

/// Whether the request goes to the SES query API or is a plain HTTP call.
///
/// In [`SesRequestMode::Api`] the form `Content-Type` header is emitted and
/// covered by the signature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SesRequestMode {
    /// SES query API call.
    #[default]
    Api,
    /// Plain HTTP call; no `Content-Type` is signed.
    Http,
}

impl SesRequestMode {
    /// Lowercase name, as accepted by `SES_REQUEST_MODE`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::Http => "http",
        }
    }
}

impl fmt::Display for SesRequestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SesRequestMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "api" => Ok(Self::Api),
            "http" => Ok(Self::Http),
            other => Err(format!("unknown SES request mode: {other:?}")),
        }
    }
}

/// SES endpoint host for a region: `email.{region}.amazonaws.com`.
///
/// # Examples
///
/// ```
/// use courier_core::AwsRegion;
/// use courier_ses_auth::request::endpoint_host;
///
/// let region = AwsRegion::new("eu-west-1").unwrap();
/// assert_eq!(endpoint_host(&region), "email.eu-west-1.amazonaws.com");
/// ```
#[must_use]
pub fn endpoint_host(region: &AwsRegion) -> String {
    format!("email.{region}.amazonaws.com")
}

/// Fields of a `SendEmail` call, already rendered to strings by the caller.
#[derive(Debug, Clone, Default, TypedBuilder)]
pub struct SendEmailParams {
    /// `To` recipients.
    #[builder(default)]
    pub to: Vec<String>,
    /// `Cc` recipients.
    #[builder(default)]
    pub cc: Vec<String>,
    /// `Bcc` recipients.
    #[builder(default)]
    pub bcc: Vec<String>,
    /// Subject line.
    #[builder(setter(into))]
    pub subject: String,
    /// Envelope sender.
    #[builder(setter(into))]
    pub source: String,
    /// Plain text body.
    #[builder(default, setter(strip_option, into))]
    pub text_body: Option<String>,
    /// HTML body.
    #[builder(default, setter(strip_option, into))]
    pub html_body: Option<String>,
}

/// A region, mode, and credential bound together for SES calls.
#[derive(Debug, Clone)]
pub struct SesRequest {
    region: AwsRegion,
    signer: Sigv4Signer,
    credential: Credential,
}

impl SesRequest {
    /// Bind `credential` to `region` in the given mode.
    #[must_use]
    pub fn new(region: AwsRegion, mode: SesRequestMode, credential: Credential) -> Self {
        Self {
            region,
            signer: Sigv4Signer::new(mode),
            credential,
        }
    }

    /// The region requests are signed for.
    #[must_use]
    pub fn region(&self) -> &AwsRegion {
        &self.region
    }

    /// The request mode.
    #[must_use]
    pub fn mode(&self) -> SesRequestMode {
        self.signer.mode()
    }

    /// The credential requests are signed with.
    #[must_use]
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// The endpoint host for this request's region.
    #[must_use]
    pub fn endpoint_host(&self) -> String {
        endpoint_host(&self.region)
    }

    /// Build an unsigned `SendEmail` descriptor.
    ///
    /// Optional lists and bodies are only placed when non-empty.
    #[must_use]
    pub fn send_email_descriptor(&self, params: &SendEmailParams) -> RequestDescriptor {
        let mut request = RequestDescriptor::new(Method::POST, self.endpoint_host())
            .with_param("Action", "SendEmail")
            .with_param("Destination.ToAddresses.member", params.to.clone())
            .with_param("Message.Subject.Data", params.subject.as_str())
            .with_param("Source", params.source.as_str());

        if !params.cc.is_empty() {
            request = request.with_param("Destination.CcAddresses.member", params.cc.clone());
        }
        if !params.bcc.is_empty() {
            request = request.with_param("Destination.BccAddresses.member", params.bcc.clone());
        }
        if let Some(text) = params.text_body.as_deref().filter(|t| !t.is_empty()) {
            request = request.with_param("Message.Body.Text.Data", text);
        }
        if let Some(html) = params.html_body.as_deref().filter(|h| !h.is_empty()) {
            request = request.with_param("Message.Body.Html.Data", html);
        }
        request
    }

    /// Build an unsigned `SendRawEmail` descriptor for an already-rendered
    /// MIME message.
    #[must_use]
    pub fn send_raw_email_descriptor(&self, raw_message: &[u8]) -> RequestDescriptor {
        RequestDescriptor::new(Method::POST, self.endpoint_host())
            .with_param("Action", "SendRawEmail")
            .with_param("RawMessage.Data", STANDARD.encode(raw_message))
    }

    /// Sign `request` at `timestamp`, returning the headers to merge.
    ///
    /// # Errors
    ///
    /// See [`Sigv4Signer::sign_with_context`].
    pub fn sign(
        &self,
        request: &RequestDescriptor,
        timestamp: DateTime<Utc>,
    ) -> Result<HeaderMap, SigningError> {
        let context = SigningContext::new(self.region.as_str(), timestamp)?;
        self.signer
            .sign_with_context(request, &self.credential, &context)
    }

    /// Sign `request` and return a copy with the signed headers merged in.
    ///
    /// # Errors
    ///
    /// See [`Sigv4Signer::sign_with_context`].
    pub fn prepare(
        &self,
        request: &RequestDescriptor,
        timestamp: DateTime<Utc>,
    ) -> Result<RequestDescriptor, SigningError> {
        let signed = self.sign(request, timestamp)?;
        let mut prepared = request.clone();
        prepared.headers = request.merged_headers(&signed);
        Ok(prepared)
    }

    /// [`SesRequest::prepare`] with a fresh read of the system clock.
    ///
    /// # Errors
    ///
    /// See [`Sigv4Signer::sign_with_context`].
    pub fn prepare_now(&self, request: &RequestDescriptor) -> Result<RequestDescriptor, SigningError> {
        self.prepare(request, Utc::now())
    }
}
