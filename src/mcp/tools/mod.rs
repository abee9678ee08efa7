// src/mcp/tools/mod.rs
// Tool handlers: validate arguments, call into the library, render text

pub mod progress;
pub mod restore;
pub mod session;

use crate::error::ContinuumError;

/// A required string argument, rejected when absent or blank
pub(crate) fn require(value: Option<String>, name: &str) -> Result<String, String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ContinuumError::missing(name).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require() {
        assert_eq!(require(Some("x".into()), "title"), Ok("x".to_string()));
        assert_eq!(require(None, "title"), Err("title is required".to_string()));
        assert_eq!(
            require(Some("   ".into()), "projectPath"),
            Err("projectPath is required".to_string())
        );
    }
}
