//! Utility functions and helpers

pub mod format;
pub mod ptr;

pub use format::{sprintf, FormatError};
pub use ptr::{format_ptr, to_ptr, to_value};

/// Redact a sensitive value for logs and `config show` output.
///
/// Keeps the first two characters of long values so operators can tell
/// tokens apart without exposing them.
pub fn redact(value: &str) -> String {
    if value.chars().count() <= 8 {
        return "****".to_string();
    }
    let head: String = value.chars().take(2).collect();
    format!("{}****", head)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_short_values() {
        assert_eq!(redact(""), "****");
        assert_eq!(redact("secret"), "****");
    }

    #[test]
    fn test_redact_long_values() {
        assert_eq!(redact("s.abcdefghijkl"), "s.****");
    }
}
