//! Animoji core - client library for the Animoji image service.
//!
//! The heart of the crate is [`auth::SessionManager`], the single source of
//! truth for who is logged in. Everything else consumes it:
//!
//! - [`api`]: HTTP client for the auth and image endpoints
//! - [`views`]: headless login, signup, Google sign-in and gallery screens
//! - [`validation`]: form checks performed before any request
//! - [`config`]: persisted settings and environment overrides

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod utils;
pub mod validation;
pub mod views;

pub use api::{ApiClient, ApiError};
pub use auth::{Session, SessionManager, SessionState};
pub use config::Config;
