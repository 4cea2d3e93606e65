//! Auth types shared across Tabletop crates.
//!
//! Provides JWT issuing and validation for staff, refresh and customer tokens, and
//! bearer-token header parsing.

pub mod bearer;
pub mod token;
