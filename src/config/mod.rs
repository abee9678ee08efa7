// src/config/mod.rs
// Per-project configuration and its in-memory cache

pub mod cache;
pub mod file;

pub use cache::ConfigStore;
pub use file::{ContextConfig, SummaryLength};
