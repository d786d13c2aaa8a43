//! Envelope-aware HTTP client with request/response interception.

mod client;
mod envelope;
mod error;
mod loading;
mod options;

pub use client::ApiClient;
pub use envelope::{Envelope, SUCCESS_CODE};
pub use error::{
    BUSINESS_ERROR_MESSAGE, ErrorKind, HttpResponse, NETWORK_ERROR_MESSAGE, REQUEST_CONFIG_PREFIX,
    RequestError, status_message,
};
pub use loading::{LoadingGuard, LoadingTracker};
pub use options::{DEFAULT_SUCCESS_MESSAGE, RequestOptions, ResponseType};
