// src/lib.rs
// continuum - session context tracking for AI-assisted development

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod config;
pub mod error;
pub mod layout;
pub mod ledger;
pub mod mcp;
pub mod restore;
pub mod session;
pub mod tokens;
pub mod types;
pub mod utils;
pub use error::{ContinuumError, Result};
