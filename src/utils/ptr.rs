//! Helpers for optional values.
//!
//! Optional configuration fields and SDK response fields are `Option`s; these
//! keep the formatting and defaulting of them in one place.

use std::fmt::Display;

/// Render an optional value, `"<nil>"` when absent.
pub fn format_ptr<T: Display + ?Sized>(value: Option<&T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "<nil>".to_string(),
    }
}

/// Wrap a value as present.
pub fn to_ptr<T>(value: T) -> Option<T> {
    Some(value)
}

/// The contained value, or `T::default()` when absent.
pub fn to_value<T: Clone + Default>(value: Option<&T>) -> T {
    value.cloned().unwrap_or_default()
}
