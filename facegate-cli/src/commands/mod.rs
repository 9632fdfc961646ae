//! Subcommand implementations.

pub mod enroll;
pub mod login;
