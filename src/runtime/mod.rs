//! Runtime abstraction for process-level operations.
//!
//! This module provides a trait-based abstraction over the environment and
//! input sources, enabling dependency injection and testability.
//!
//! # Structure
//!
//! - `env` - Environment variables
//! - `input` - Reading a log batch from a file or stdin

mod env;
mod input;

use anyhow::Result;
use std::env as std_env;
use std::path::Path;

#[cfg_attr(test, mockall::automock)]
pub trait Runtime: Send + Sync {
    // Environment
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError>;

    // Input
    fn read_file(&self, path: &Path) -> Result<Vec<u8>>;
    fn read_stdin(&self) -> Result<Vec<u8>>;
}

pub struct RealRuntime;

impl Runtime for RealRuntime {
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError> {
        self.env_var_impl(key)
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        self.read_file_impl(path)
    }

    fn read_stdin(&self) -> Result<Vec<u8>> {
        self.read_stdin_impl()
    }
}
