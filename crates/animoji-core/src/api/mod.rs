//! REST API client module for the Animoji backend.
//!
//! This module provides the `ApiClient` for the `/auth` endpoints, which
//! issue JWT bearer tokens, and the `/images` gallery endpoints, which
//! accept them.

pub mod client;
pub mod error;

pub use client::{ApiClient, ApiResult, DEFAULT_BASE_URL};
pub use error::ApiError;
