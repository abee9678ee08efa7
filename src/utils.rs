//! src/utils.rs
//! Shared utility functions used across the codebase

use std::fmt::Display;
use std::path::Path;

/// Extension trait for Result to simplify error conversion to String.
///
/// Tool handlers return `Result<String, String>`; use `.str_err()?` instead of
/// `.map_err(|e| e.to_string())?`.
pub trait ResultExt<T, E> {
    /// Convert the error type to String.
    fn str_err(self) -> Result<T, String>;
}

impl<T, E: Display> ResultExt<T, E> for Result<T, E> {
    fn str_err(self) -> Result<T, String> {
        self.map_err(|e| e.to_string())
    }
}

/// Last path segment of a project path, or the whole path when it has none.
pub fn project_basename(project_path: &Path) -> String {
    project_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| project_path.to_string_lossy().into_owned())
}

/// Collapse all whitespace runs, newlines included, to single spaces.
pub fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Integer division rounded half away from zero, 0 when the divisor is 0.
pub fn rounded_ratio(numerator: f64, denominator: f64) -> u64 {
    if denominator <= 0.0 {
        return 0;
    }
    (numerator / denominator).round() as u64
}
