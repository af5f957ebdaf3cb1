//! Authentication module for managing the client session.
//!
//! This module provides:
//! - `SessionManager`: owns the bearer token and the identity decoded from it
//! - `decode_claims`: reads token claims without verifying the signature
//! - `TokenStore`: durable storage for the token (file, OS keychain, memory)
//! - `Navigator`: receives the redirect issued on logout
//!
//! The token is persisted under the `auth_token` key and survives restarts
//! until logout. Expiry is never checked locally.

pub mod keychain;
pub mod navigation;
pub mod session;
pub mod store;
pub mod token;

pub use keychain::KeychainStore;
pub use navigation::{NavigationMode, Navigator, RecordingNavigator, Route};
pub use session::{Session, SessionManager, SessionState};
pub use store::{FileStore, MemoryStore, TokenStore, AUTH_TOKEN_KEY};
pub use token::{decode_claims, Claims, InvalidTokenError, JwtDecoder, TokenDecoder};
