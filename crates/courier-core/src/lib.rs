//! Core library for courier.
//!
//! Builds the shared, preconfigured HTTP client an application uses for all
//! of its API calls: a base URL chosen by deployment environment, a fixed
//! timeout, form-urlencoded request bodies, token injection on the way out
//! and error normalization on the way back.

pub mod api;
pub mod config;
pub mod connectivity;
pub mod environment;
pub mod storage;

pub use api::{ApiClient, ApiClientBuilder, ApiError, ErrorResponse};
pub use config::{ClientConfig, Config, OfflinePolicy};
pub use connectivity::{AlwaysOnline, Connectivity, ConnectivityFlag};
pub use environment::Environment;
pub use storage::{FileStore, KeyValueStore, KeyringStore, MemoryStore, StorageError, TOKEN_KEY};
