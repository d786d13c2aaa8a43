//! Command implementations behind the CLI.

pub mod config;
mod request;
mod session;

pub use config::{Config, Overrides};
pub use request::{DEFAULT_UPLOAD_FIELD, delete, download, get, post, put, upload};
pub use session::{login, logout};
