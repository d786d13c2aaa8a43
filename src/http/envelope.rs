//! The `{code, data, message}` wrapper every JSON response body carries.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Envelope code signalling logical success.
pub const SUCCESS_CODE: i64 = 0;

/// Wire-level response body.
///
/// `code` is required; a body without it is not an envelope. `data` and
/// `message` default to `null` and `""` when the server omits them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T = Value> {
    pub code: i64,
    #[serde(default)]
    pub data: T,
    #[serde(default)]
    pub message: String,
}

impl Envelope {
    /// Structurally decodes a response body.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    /// Decodes `data` into the caller's type.
    pub fn into_data<T: DeserializeOwned>(self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.data)
    }
}

impl<T> Envelope<T> {
    /// `code == 0`, independent of the HTTP status.
    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }
}
