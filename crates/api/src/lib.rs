//! Fitshop API library.
//!
//! Session tokens, request-scoped identity, permission and ownership checks,
//! password reset, and cart reconciliation, served as a JSON API over axum.
//! The binary in `main.rs` only wires configuration, telemetry, and the
//! listener around [`routes::app`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
