//! # Storefront
//!
//! The async half of Storefront: HTTP API, CLI, configuration and the media
//! host adapter. All catalog rules live in `storefront-core`.

pub mod api;
pub mod cli;
pub mod config;
pub mod media;
