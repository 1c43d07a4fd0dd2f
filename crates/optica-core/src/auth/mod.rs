//! Authentication module for managing admin sessions and credentials.
//!
//! This module provides:
//! - `Session`: bearer-token session with expiry, persisted to disk
//! - `CredentialStore`: secure OS-level password storage via keyring
//!
//! The API client clears the session when the backend rejects its token.

pub mod credentials;
pub mod session;

pub use credentials::CredentialStore;
pub use session::{Session, SessionData};
