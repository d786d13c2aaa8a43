//! Envelope-aware HTTP client.
//!
//! [`ApiClient`] wraps `reqwest` with a uniform contract: every call resolves
//! to the `data` of a `{code, data, message}` envelope whose `code` is `0`,
//! or fails with a [`RequestError`]. Bearer tokens come from [`Storage`],
//! notices and the loading indicator go to a [`Notifier`].

pub mod commands;
pub mod config;
pub mod download;
pub mod http;
pub mod notify;
pub mod runtime;
pub mod storage;

pub use config::ClientConfig;
pub use download::Blob;
pub use http::{ApiClient, Envelope, ErrorKind, RequestError, RequestOptions, ResponseType};
pub use notify::{Notice, Notifier};
pub use storage::Storage;
