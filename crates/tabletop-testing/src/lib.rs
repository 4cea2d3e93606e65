//! Test utilities for Tabletop services.
//!
//! Dev-dependency only.

pub mod auth;
