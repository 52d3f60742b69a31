//! The shared API client.
//!
//! `ApiClient` wraps a `reqwest::Client` configured once from a
//! `ClientConfig`. Every request passes through the same two steps: the
//! stored token is attached as the `Authorization` header on the way out,
//! and failures are normalized into `ApiError` on the way back, clearing the
//! token when the server answers 403.

pub mod client;
pub mod error;

pub use client::{ApiClient, ApiClientBuilder};
pub use error::{ApiError, ErrorResponse};
