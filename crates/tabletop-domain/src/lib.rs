//! Domain types shared across Tabletop crates.
//!
//! This crate contains only pure types and functions with no framework dependencies.
//! Import in `usecase/` and `domain/` layers; never in `infra/` or `handlers/`.

pub mod catalog;
pub mod credentials;
pub mod merchant;
pub mod order;
pub mod pagination;
pub mod pricing;
pub mod role;
pub mod session;

/// Error returned when parsing a wire string into a domain enum fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}
