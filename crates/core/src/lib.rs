//! Fitshop Core - Shared domain types.
//!
//! This crate provides the types shared by every Fitshop component:
//! - `api` - The HTTP backend (sessions, authorization, cart, items)
//! - `cli` - Operator tooling for migrations and permission grants
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. Database encoding is available behind the `postgres`
//! feature.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, normalized emails, and the permission model

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
