//! Wire models for the Animoji API.
//!
//! - `Image`, `LikeResponse`: gallery records
//! - `AuthResponse`, `GoogleAuthResponse`: token-bearing auth responses
//! - `ErrorBody`: the `{detail}` body sent with non-2xx responses

pub mod auth;
pub mod image;

pub use auth::{AuthResponse, Credentials, ErrorBody, GoogleAuthRequest, GoogleAuthResponse};
pub use image::{GenerateRequest, Image, LikeResponse, SaveImageRequest};
