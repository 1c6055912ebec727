//! Router Module Index
//!
//! Splits the HTTP surface by concern. Both modules are mounted without an
//! authentication layer: the comic endpoint resolves the caller itself because
//! its read path must also serve anonymous requests.

/// Liveness endpoint for load balancers and container health checks.
pub mod public;

/// The comic listing/creation endpoint.
pub mod comics;
