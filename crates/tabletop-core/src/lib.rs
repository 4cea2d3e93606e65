//! HTTP plumbing shared by Tabletop services: response envelope, health checks,
//! request-id and trace middleware, serde helpers and tracing setup.

pub mod envelope;
pub mod health;
pub mod middleware;
pub mod serde;
pub mod tracing;
