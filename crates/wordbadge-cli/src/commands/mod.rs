//! Subcommand implementations.

pub mod clear;
pub mod edition;
pub mod init;
pub mod lookup;
pub mod rebuild;
pub mod status;
