// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Civic-Portal: member and content state for a civic association website.
//!
//! This crate keeps local state (users, credentials, news, board posts,
//! events, polls) consistent with a hosted document store and identity
//! provider that enforce no business rules of their own.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;
pub mod store;
pub mod time_utils;

pub use config::Config;
pub use error::{AppError, Result};
pub use store::{Backends, Store};
