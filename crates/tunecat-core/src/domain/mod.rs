//! Domain modules
//!
//! Business logic for tunecat, kept apart from storage bootstrap and the CLI.

pub mod catalog;
