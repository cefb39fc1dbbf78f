// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - clients for the hosted backends and reconciliation logic.

pub mod admin_api;
pub mod credentials;
pub mod identity;
pub mod reconcile;

pub use admin_api::{AdminApiClient, AdminApiResponse, AdminEndpoints, MemoryAdminApi};
pub use credentials::{CredentialCache, Session};
pub use identity::{
    auth_email, normalize_identifier, AuthError, AuthErrorCode, AuthSession, FirebaseAuthClient,
    IdentityProvider, MemoryIdentity,
};
pub use reconcile::{SignInVerdict, SweepReport};
