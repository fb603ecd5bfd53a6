//! Linen Storefront library.
//!
//! This crate provides the storefront functionality as a library,
//! allowing the cart and checkout core to be tested and reused without
//! a running HTTP server.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod storage;
