//! Car Zone application library
//!
//! Feature modules plus the bootstrap sequence shared by the server binary and the CLI.

pub mod bootstrap;
pub mod modules;
pub mod utils;

/// Re-export commonly used types
pub use modules::*;
