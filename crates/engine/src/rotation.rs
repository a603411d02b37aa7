// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Lanes Authors

//! Size-based rotating file sink backing the Log Parser's raw and readable
//! streams (spec.md §4.5). Each `append()` call opens, writes, and closes
//! the file in the teacher's `JobLogger` style — write frequency here is
//! bounded by child output, not hot enough to justify a held file handle.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;
pub const DEFAULT_MAX_FILES: usize = 5;

/// A single rotating file, growing at `path` until it exceeds
/// `max_file_size`, at which point it is renamed `path.1` (existing `.N`
/// suffixes shift up to `max_files`, the oldest discarded) and a fresh file
/// starts (spec.md §4.5 "Rotation").
pub struct RotatingSink {
    path: PathBuf,
    max_file_size: u64,
    max_files: usize,
    current_size: u64,
}

impl RotatingSink {
    pub fn new(path: PathBuf, max_file_size: u64, max_files: usize) -> std::io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let current_size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        Ok(Self { path, max_file_size, max_files: max_files.max(1), current_size })
    }

    pub fn with_defaults(path: PathBuf) -> std::io::Result<Self> {
        Self::new(path, DEFAULT_MAX_FILE_SIZE, DEFAULT_MAX_FILES)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `bytes` verbatim, rotating first if the write would exceed
    /// the size limit.
    pub fn append(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        if self.current_size > 0 && self.current_size + bytes.len() as u64 > self.max_file_size {
            self.rotate()?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(bytes)?;
        self.current_size += bytes.len() as u64;
        Ok(())
    }

    fn rotate(&mut self) -> std::io::Result<()> {
        let oldest = self.path.with_extension(format!("log.{}", self.max_files));
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for n in (1..self.max_files).rev() {
            let from = self.path.with_extension(format!("log.{n}"));
            let to = self.path.with_extension(format!("log.{}", n + 1));
            if from.exists() {
                fs::rename(&from, &to)?;
            }
        }
        let first = self.path.with_extension("log.1");
        if self.path.exists() {
            fs::rename(&self.path, &first)?;
        }
        self.current_size = 0;
        Ok(())
    }
}

#[cfg(test)]
#[path = "rotation_tests.rs"]
mod tests;
