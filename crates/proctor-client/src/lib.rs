//! proctor-client: exam backend integrations.
//!
//! Implements the `ExamBackend` trait for the REST exam server, a local
//! exam directory and an in-memory mock used in tests.

pub mod config;
pub mod envelope;
pub mod error;
pub mod http;
pub mod local;
pub mod mock;

pub use config::{create_backend, load_config, load_config_from, BackendConfig, ProctorConfig};
pub use error::ClientError;
pub use http::HttpBackend;
pub use local::LocalBackend;
pub use mock::MockBackend;
