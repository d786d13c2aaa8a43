//! Per-call request options.

use std::time::Duration;

pub const DEFAULT_SUCCESS_MESSAGE: &str = "operation succeeded";

/// How a 2xx body is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseType {
    /// A `{code, data, message}` envelope; `data` is handed to the caller.
    #[default]
    Json,
    /// Raw bytes, no envelope check.
    Blob,
}

/// Options consumed by the interceptors of a single call.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// Notify the user on failure. Failures are logged either way.
    pub show_error: bool,
    pub show_success: bool,
    /// Message for `show_success`; [`DEFAULT_SUCCESS_MESSAGE`] when unset.
    pub success_message: Option<String>,
    /// Track this call in the loading indicator.
    pub show_loading: bool,
    pub response_type: ResponseType,
    /// Extra headers. Validated when the request is built, so a bad name or
    /// value surfaces as a request configuration error.
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    /// Overrides the client-wide timeout for this call.
    pub timeout: Option<Duration>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            show_error: true,
            show_success: false,
            success_message: None,
            show_loading: false,
            response_type: ResponseType::Json,
            headers: Vec::new(),
            query: Vec::new(),
            timeout: None,
        }
    }
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show_error(mut self, show: bool) -> Self {
        self.show_error = show;
        self
    }

    /// Shorthand for `show_error(false)`.
    pub fn silent(self) -> Self {
        self.show_error(false)
    }

    pub fn show_success(mut self, show: bool) -> Self {
        self.show_success = show;
        self
    }

    /// Enables `show_success` with a custom message.
    pub fn success_message(mut self, message: impl Into<String>) -> Self {
        self.show_success = true;
        self.success_message = Some(message.into());
        self
    }

    pub fn show_loading(mut self, show: bool) -> Self {
        self.show_loading = show;
        self
    }

    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = response_type;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub(crate) fn success_text(&self) -> &str {
        self.success_message
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_SUCCESS_MESSAGE)
    }

    /// Drops caller-supplied headers matching `name`, case-insensitively.
    pub(crate) fn without_header(mut self, name: &str) -> Self {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = RequestOptions::default();
        assert!(opts.show_error);
        assert!(!opts.show_success);
        assert!(!opts.show_loading);
        assert_eq!(opts.response_type, ResponseType::Json);
        assert_eq!(opts.success_text(), DEFAULT_SUCCESS_MESSAGE);
        assert!(opts.headers.is_empty());
        assert!(opts.timeout.is_none());
    }

    #[test]
    fn test_builders() {
        let opts = RequestOptions::new()
            .silent()
            .success_message("saved")
            .show_loading(true)
            .response_type(ResponseType::Blob)
            .header("X-Trace", "1")
            .query("page", "2")
            .timeout(Duration::from_secs(1));

        assert!(!opts.show_error);
        assert!(opts.show_success);
        assert_eq!(opts.success_text(), "saved");
        assert!(opts.show_loading);
        assert_eq!(opts.response_type, ResponseType::Blob);
        assert_eq!(opts.headers, vec![("X-Trace".to_string(), "1".to_string())]);
        assert_eq!(opts.query, vec![("page".to_string(), "2".to_string())]);
        assert_eq!(opts.timeout, Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_empty_success_message_uses_default() {
        let opts = RequestOptions::new().success_message("");
        assert_eq!(opts.success_text(), DEFAULT_SUCCESS_MESSAGE);
    }

    #[test]
    fn test_without_header_is_case_insensitive() {
        let opts = RequestOptions::new()
            .header("content-type", "text/plain")
            .header("Content-Type", "application/xml")
            .header("X-Keep", "yes")
            .without_header("CONTENT-TYPE");
        assert_eq!(opts.headers, vec![("X-Keep".to_string(), "yes".to_string())]);
    }
}
