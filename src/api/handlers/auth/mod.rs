//! Auth handlers and supporting modules.
//!
//! This module coordinates sign-in (Google assertions and email/password),
//! session management, and profile completion.
//!
//! ## Sessions
//!
//! Session tokens are opaque 32-byte random values. Only a SHA-256 digest is
//! stored server-side, and every authenticated request re-reads the account
//! row so role and verification changes take effect immediately.
//!
//! ## Verification
//!
//! Professional roles (`tutor`, `repair_specialist`) enter a review queue on
//! profile completion; the account state machine lives in [`crate::account`].

pub(crate) mod google;
pub(crate) mod local;
pub(crate) mod principal;
pub(crate) mod profile;
pub(crate) mod session;
mod state;
mod storage;
pub(crate) mod types;
mod utils;
pub(crate) mod verifier;

pub use state::{AuthConfig, AuthState};
pub use verifier::AssertionVerifier;

pub(crate) use utils::{hash_password, normalize_email, valid_email, MIN_PASSWORD_LEN};
