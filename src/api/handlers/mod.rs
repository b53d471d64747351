//! API handlers for the MelodyMart account service.
//!
//! This module organizes the route handlers: sign-in and session management
//! under `auth`, the admin verification queue under `admin`, plus `/health`,
//! `/v1/me`, and the root banner.

pub mod admin;
pub mod auth;
pub mod health;
pub mod me;
pub mod root;
