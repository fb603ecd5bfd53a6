//! Linen Core - Shared types library.
//!
//! This crate provides common types used by the Linen storefront.
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. The
//! storefront is a thin client over a remote commerce API, so the IDs
//! here wrap the remote API's string identifiers rather than local
//! database keys.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, and emails

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
