//! Git operations.

pub mod staged;

pub use staged::get_staged_diff;
