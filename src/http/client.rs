//! Envelope-aware HTTP client.
//!
//! Every call runs through the same four hooks:
//!
//! - `intercept_request`: bearer token from storage, loading acquire
//! - `intercept_request_error`: the request could not be built
//! - `intercept_response`: 2xx; success notice, envelope `code` check
//! - `intercept_response_error`: no response, or a non-2xx status
//!
//! Callers only ever see the envelope's `data` or a [`RequestError`].

use anyhow::{Context, Result};
use hyper::ext::ReasonPhrase;
use log::{debug, error};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::multipart::Form;
use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::sync::Arc;

use super::envelope::Envelope;
use super::error::{ErrorKind, HttpResponse, RequestError};
use super::loading::{LoadingGuard, LoadingTracker};
use super::options::{RequestOptions, ResponseType};
use crate::config::{ClientConfig, ResolvedConfig};
use crate::download::{self, Blob};
use crate::notify::{Notice, Notifier};
use crate::runtime::Runtime;
use crate::storage::{Storage, TOKEN_KEY};

const USER_AGENT: &str = concat!("apisvc/", env!("CARGO_PKG_VERSION"));
const JSON_CONTENT_TYPE: &str = "application/json;charset=utf-8";

/// A settled 2xx call: the raw response plus, for JSON calls, the envelope
/// that passed the `code` check.
struct Settled {
    response: HttpResponse,
    envelope: Option<Envelope>,
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    download_dir: PathBuf,
    runtime: Arc<dyn Runtime>,
    storage: Arc<dyn Storage>,
    notifier: Arc<dyn Notifier>,
    loading: Arc<LoadingTracker>,
}

impl ApiClient {
    #[tracing::instrument(skip(runtime, storage, notifier))]
    pub fn new(
        config: ClientConfig,
        runtime: Arc<dyn Runtime>,
        storage: Arc<dyn Storage>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let ResolvedConfig {
            base_url,
            timeout,
            download_dir,
        } = config.resolve(runtime.as_ref());

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        debug!(
            "API client ready (base URL {:?}, timeout {:?}, downloads in {:?})",
            base_url, timeout, download_dir
        );

        Ok(Self {
            client,
            base_url,
            download_dir,
            runtime,
            storage,
            loading: Arc::new(LoadingTracker::new(Arc::clone(&notifier))),
            notifier,
        })
    }

    /// The application-wide client: configuration from the environment with
    /// the longer application timeout.
    pub fn from_env(
        runtime: Arc<dyn Runtime>,
        storage: Arc<dyn Storage>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let config = ClientConfig::from_env(runtime.as_ref());
        Self::new(config, runtime, storage, notifier)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn download_dir(&self) -> &std::path::Path {
        &self.download_dir
    }

    /// Shared loading counter of this client and its clones.
    pub fn loading(&self) -> &LoadingTracker {
        &self.loading
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        opts: RequestOptions,
    ) -> Result<T, RequestError> {
        let builder = self.request(Method::GET, url, &opts);
        self.send_json(builder, opts).await
    }

    pub async fn post<T, B>(
        &self,
        url: &str,
        body: Option<&B>,
        opts: RequestOptions,
    ) -> Result<T, RequestError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let mut builder = self.request(Method::POST, url, &opts);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        self.send_json(builder, opts).await
    }

    pub async fn put<T, B>(
        &self,
        url: &str,
        body: Option<&B>,
        opts: RequestOptions,
    ) -> Result<T, RequestError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let mut builder = self.request(Method::PUT, url, &opts);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        self.send_json(builder, opts).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        url: &str,
        opts: RequestOptions,
    ) -> Result<T, RequestError> {
        let builder = self.request(Method::DELETE, url, &opts);
        self.send_json(builder, opts).await
    }

    /// POSTs a multipart form. Any caller `Content-Type` is dropped so the
    /// boundary-carrying `multipart/form-data` header is the one sent.
    pub async fn upload<T: DeserializeOwned>(
        &self,
        url: &str,
        form: Form,
        opts: RequestOptions,
    ) -> Result<T, RequestError> {
        let opts = opts.without_header(CONTENT_TYPE.as_str());
        let builder = self.request(Method::POST, url, &opts).multipart(form);
        self.send_json(builder, opts).await
    }

    /// GETs raw bytes and saves them under the download directory, named
    /// after the `content-disposition` header.
    pub async fn download(&self, url: &str, opts: RequestOptions) -> Result<Blob, RequestError> {
        let opts = opts.response_type(ResponseType::Blob);
        let builder = self.request(Method::GET, url, &opts);
        let Settled { response, .. } = self.send(builder, &opts).await?;

        let file_name = download::file_name_from_headers(&response.headers);
        let content_type = download::content_type(&response.headers);
        let saved_to = download::save_file(
            self.runtime.as_ref(),
            &self.download_dir,
            &file_name,
            &response.body,
        )
        .map_err(|e| {
            let err = RequestError::save(e);
            self.handle_error(&err, opts.show_error);
            err
        })?;

        Ok(Blob {
            bytes: response.body,
            content_type,
            file_name,
            saved_to,
        })
    }

    /// Joins a relative URL onto the base URL; absolute URLs pass through.
    pub fn resolve_url(&self, url: &str) -> String {
        if self.base_url.is_empty() || url.starts_with("http://") || url.starts_with("https://") {
            return url.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            url.trim_start_matches('/')
        )
    }

    fn request(&self, method: Method, url: &str, opts: &RequestOptions) -> RequestBuilder {
        let mut builder = self.client.request(method, self.resolve_url(url));
        for (name, value) in &opts.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !opts.query.is_empty() {
            builder = builder.query(&opts.query);
        }
        if let Some(timeout) = opts.timeout {
            builder = builder.timeout(timeout);
        }
        builder
    }

    /// Sends a JSON verb call. The response type is always JSON here, so the
    /// envelope `code` check can't be skipped; raw bodies go through
    /// [`ApiClient::download`].
    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        opts: RequestOptions,
    ) -> Result<T, RequestError> {
        let opts = opts.response_type(ResponseType::Json);
        let Settled { response, envelope } = self.send(builder, &opts).await?;
        let Some(envelope) = envelope else {
            let err = RequestError::new(ErrorKind::Decode, "response carried no envelope")
                .with_code("ERR_BAD_RESPONSE")
                .with_response(response);
            self.handle_error(&err, opts.show_error);
            return Err(err);
        };
        envelope.into_data().map_err(|e| {
            let err = RequestError::decode(e, Some(response));
            self.handle_error(&err, opts.show_error);
            err
        })
    }

    #[tracing::instrument(skip(self, builder, opts))]
    async fn send(
        &self,
        builder: RequestBuilder,
        opts: &RequestOptions,
    ) -> Result<Settled, RequestError> {
        let (builder, loading) = self.intercept_request(builder, opts);

        let request = match builder.build() {
            Ok(request) => request,
            Err(e) => return Err(self.intercept_request_error(e, loading)),
        };
        debug!("{} {}", request.method(), request.url());

        let response = match self.client.execute(request).await {
            Ok(response) => response,
            // reqwest rejects unsupported URL schemes only at send time.
            Err(e) if e.is_builder() => return Err(self.intercept_request_error(e, loading)),
            Err(e) => {
                return Err(self.intercept_response_error(RequestError::no_response(e), opts, loading));
            }
        };

        let status = response.status();
        let reason = response
            .extensions()
            .get::<ReasonPhrase>()
            .map(|phrase| String::from_utf8_lossy(phrase.as_bytes()).into_owned());
        let headers = response.headers().clone();
        let body = match response.bytes().await {
            Ok(body) => body.to_vec(),
            Err(e) => {
                return Err(self.intercept_response_error(RequestError::no_response(e), opts, loading));
            }
        };
        let response = HttpResponse {
            status,
            reason,
            headers,
            body,
        };

        if status.is_success() {
            self.intercept_response(response, opts, loading)
        } else {
            Err(self.intercept_response_error(RequestError::from_status(response), opts, loading))
        }
    }

    fn intercept_request(
        &self,
        mut builder: RequestBuilder,
        opts: &RequestOptions,
    ) -> (RequestBuilder, Option<LoadingGuard>) {
        if let Some(token) = self.storage.get_item(TOKEN_KEY) {
            builder = builder.bearer_auth(token);
        }
        let loading = opts.show_loading.then(|| self.loading.acquire());
        (builder, loading)
    }

    fn intercept_request_error(
        &self,
        cause: reqwest::Error,
        loading: Option<LoadingGuard>,
    ) -> RequestError {
        let err = RequestError::request_config(describe(&cause)).with_source(cause);
        // Configuration errors are always shown, regardless of `show_error`.
        self.handle_error(&err, true);
        drop(loading);
        err
    }

    fn intercept_response(
        &self,
        response: HttpResponse,
        opts: &RequestOptions,
        loading: Option<LoadingGuard>,
    ) -> Result<Settled, RequestError> {
        if opts.show_success {
            self.notifier
                .on_notify(&Notice::Success(opts.success_text().to_string()));
        }

        let envelope = match opts.response_type {
            ResponseType::Blob => None,
            ResponseType::Json => {
                let envelope = match Envelope::from_slice(&response.body) {
                    Ok(envelope) => envelope,
                    Err(e) => {
                        let err = RequestError::decode(e, Some(response));
                        self.handle_error(&err, opts.show_error);
                        return Err(err);
                    }
                };
                if !envelope.is_success() {
                    let err = RequestError::business(&envelope, response);
                    self.handle_error(&err, opts.show_error);
                    return Err(err);
                }
                Some(envelope)
            }
        };

        drop(loading);
        Ok(Settled { response, envelope })
    }

    fn intercept_response_error(
        &self,
        err: RequestError,
        opts: &RequestOptions,
        loading: Option<LoadingGuard>,
    ) -> RequestError {
        self.handle_error(&err, opts.show_error);
        // Released here too, so a failed call can't leave the indicator up.
        drop(loading);
        err
    }

    fn handle_error(&self, err: &RequestError, show_error: bool) {
        if show_error {
            self.notifier.on_notify(&Notice::Error(err.message.clone()));
        }
        match err.status() {
            Some(status) => error!("Request error ({}, HTTP {}): {}", err.kind, status, err),
            None => error!("Request error ({}): {}", err.kind, err),
        }
        if let Some(source) = std::error::Error::source(err) {
            debug!("Caused by: {}", source);
        }
    }
}

/// Flattens a reqwest error chain into one line; the top-level message alone
/// is usually just "builder error".
fn describe(err: &reqwest::Error) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        parts.push(cause.to_string());
        source = std::error::Error::source(cause);
    }
    parts.join(": ")
}
