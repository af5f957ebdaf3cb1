//! Utility functions for display formatting.

pub mod format;

pub use format::{age_display, format_date, truncate_string};
