//! Catalog HTTP API module.
//!
//! # Purpose
//! Route handler modules for the management surface (`properties`, `cars`,
//! `upload`, `stats`), the anonymous surface (`public`), and operational
//! endpoints (`system`, `auth`), plus shared error and body types.
pub mod auth;
pub mod cars;
pub mod error;
pub mod openapi;
pub mod properties;
pub mod public;
pub mod stats;
pub mod system;
pub mod types;
pub mod upload;
