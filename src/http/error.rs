//! The single error shape every failed call produces.

use reqwest::StatusCode;
use reqwest::header::HeaderMap;

use super::envelope::Envelope;

pub const NETWORK_ERROR_MESSAGE: &str = "network error, please check your connection";
pub const REQUEST_CONFIG_PREFIX: &str = "request configuration error: ";
pub const BUSINESS_ERROR_MESSAGE: &str = "request failed";

/// Failure class of a [`RequestError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request could not be built (bad URL, header or body).
    RequestConfig,
    /// No response was received.
    Network,
    /// No response was received within the configured timeout.
    Timeout,
    /// A response arrived with a status outside 2xx.
    HttpStatus,
    /// HTTP succeeded but the envelope `code` was non-zero.
    Business,
    /// HTTP succeeded but the body was not the expected envelope or payload.
    Decode,
    /// A downloaded file could not be written.
    Save,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::RequestConfig => "request configuration",
            ErrorKind::Network => "network",
            ErrorKind::Timeout => "timeout",
            ErrorKind::HttpStatus => "http status",
            ErrorKind::Business => "business",
            ErrorKind::Decode => "decode",
            ErrorKind::Save => "save",
        };
        f.write_str(name)
    }
}

/// A response as received, before any envelope handling.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    /// Reason phrase sent by the server, when it differs from the canonical one.
    pub reason: Option<String>,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// The server's reason phrase, else the canonical one (`"Not Found"`);
    /// empty for unknown codes sent without a phrase.
    pub fn status_text(&self) -> &str {
        self.reason
            .as_deref()
            .or_else(|| self.status.canonical_reason())
            .unwrap_or("")
    }

    /// The body decoded as an envelope, if it is one.
    pub fn envelope(&self) -> Option<Envelope> {
        Envelope::from_slice(&self.body).ok()
    }
}

/// Normalized error returned by every [`crate::ApiClient`] call.
#[derive(Debug)]
pub struct RequestError {
    pub message: String,
    pub kind: ErrorKind,
    /// Short machine-readable code (`ERR_NETWORK`, `ECONNABORTED`, ...), or the
    /// envelope code for business errors.
    pub code: Option<String>,
    /// The raw response, when one was received.
    pub response: Option<HttpResponse>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl RequestError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
            code: None,
            response: None,
            source: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_response(mut self, response: HttpResponse) -> Self {
        self.response = Some(response);
        self
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// The request never left: its configuration was invalid.
    pub fn request_config(cause: impl std::fmt::Display) -> Self {
        let cause = cause.to_string();
        let cause = if cause.is_empty() {
            "unknown error".to_string()
        } else {
            cause
        };
        Self::new(
            ErrorKind::RequestConfig,
            format!("{}{}", REQUEST_CONFIG_PREFIX, cause),
        )
        .with_code("ERR_INVALID_CONFIG")
    }

    /// The transport failed before a response arrived.
    pub fn no_response(error: reqwest::Error) -> Self {
        let (kind, code) = if error.is_timeout() {
            (ErrorKind::Timeout, "ECONNABORTED")
        } else {
            (ErrorKind::Network, "ERR_NETWORK")
        };
        Self::new(kind, NETWORK_ERROR_MESSAGE)
            .with_code(code)
            .with_source(error)
    }

    /// A response arrived with a non-2xx status.
    pub fn from_status(response: HttpResponse) -> Self {
        let code = if response.status.is_server_error() {
            "ERR_BAD_RESPONSE"
        } else {
            "ERR_BAD_REQUEST"
        };
        Self::new(
            ErrorKind::HttpStatus,
            status_message(response.status.as_u16(), response.status_text()),
        )
        .with_code(code)
        .with_response(response)
    }

    /// HTTP succeeded but the envelope reports failure.
    pub fn business(envelope: &Envelope, response: HttpResponse) -> Self {
        let message = if envelope.message.is_empty() {
            BUSINESS_ERROR_MESSAGE
        } else {
            envelope.message.as_str()
        };
        Self::new(ErrorKind::Business, message)
            .with_code(envelope.code.to_string())
            .with_response(response)
    }

    pub fn decode(error: serde_json::Error, response: Option<HttpResponse>) -> Self {
        let mut err = Self::new(
            ErrorKind::Decode,
            format!("invalid response body: {}", error),
        )
        .with_code("ERR_BAD_RESPONSE")
        .with_source(error);
        err.response = response;
        err
    }

    pub fn save(error: anyhow::Error) -> Self {
        Self::new(
            ErrorKind::Save,
            format!("failed to save downloaded file: {:#}", error),
        )
    }

    /// HTTP status of the attached response.
    pub fn status(&self) -> Option<StatusCode> {
        self.response.as_ref().map(|r| r.status)
    }
}

impl std::fmt::Display for RequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for RequestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Human-readable message for a non-2xx status.
pub fn status_message(status: u16, status_text: &str) -> String {
    match status {
        401 => "unauthorized, please log in again".to_string(),
        403 => "access denied".to_string(),
        404 => "requested resource not found".to_string(),
        500 => "internal server error".to_string(),
        _ => format!("request error: {} - {}", status, status_text),
    }
}
