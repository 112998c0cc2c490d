//! Shared building blocks for the Cloud SQL operations workspace.
//!
//! - [`config`]: environment-driven settings
//! - [`credentials`]: access / identity token providers
//! - [`errors`]: the [`errors::AppError`] taxonomy and its HTTP mapping
//! - [`middleware`]: axum middleware shared by services
//! - [`models`]: Admin API resources and incident payloads
//! - [`response`]: the JSON response envelope

pub mod config;
pub mod credentials;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod response;
