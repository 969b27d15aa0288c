//! Reading a raw log batch from a file or stdin.

use anyhow::{Context, Result};
use std::fs;
use std::io::{self, Read};
use std::path::Path;

use super::RealRuntime;

/// Reads everything from any reader. Free-standing so tests can drive it with a cursor.
pub(crate) fn read_all_with_io<R: Read>(input: &mut R) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    input
        .read_to_end(&mut buf)
        .context("Failed to read log batch")?;
    Ok(buf)
}

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) fn read_file_impl(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).with_context(|| format!("Failed to read log batch from {:?}", path))
    }

    pub(crate) fn read_stdin_impl(&self) -> Result<Vec<u8>> {
        let stdin = io::stdin();
        let mut stdin_lock = stdin.lock();
        read_all_with_io(&mut stdin_lock)
    }
}
