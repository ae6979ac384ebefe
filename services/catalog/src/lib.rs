//! Luxe listings catalog service library crate.
//!
//! # Purpose
//! Exposes the catalog API surface, listing and media services, auth helpers,
//! configuration, and storage implementations for use by the binary and tests.
pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod listing;
pub mod media;
pub mod model;
pub mod observability;
pub mod stats;
pub mod store;
