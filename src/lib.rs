//! # MelodyMart Accounts
//!
//! Account verification and authorization service for the MelodyMart
//! instrument marketplace. It handles Google and email/password sign-in,
//! role selection, and the admin review queue for professional accounts.
//!
//! ## Roles
//!
//! Accounts start in a `pending` role and pick one of `customer`, `tutor`,
//! or `repair_specialist` during profile completion. Customers are usable
//! immediately; professional roles must upload verification documents and
//! wait for an admin decision before reaching protected surfaces.
//!
//! ## Sessions
//!
//! Session tokens are opaque random values stored server-side as SHA-256
//! digests. Every authenticated request re-reads the account row, so role
//! changes and review decisions take effect on the next request.

pub mod account;
pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
