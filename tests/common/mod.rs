//! # Fixture Tree Helpers
//!
//! Builds throwaway fixture trees and stand-in executables for the
//! integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A tool that echoes its build-description file to stdout.
pub const ECHO_SOURCE: &str = r#"cat "$1""#;

/// A temporary workspace: `test/` holds fixtures, `build/` holds the fake tool.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("test")).unwrap();
        fs::create_dir_all(dir.path().join("build")).unwrap();
        Self { dir }
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().join("test")
    }

    /// Creates a fixture directory under the test root with the given files.
    pub fn fixture(&self, rel: &str, files: &[(&str, &str)]) -> PathBuf {
        let dir = self.root().join(rel);
        fs::create_dir_all(&dir).unwrap();
        for (name, content) in files {
            fs::write(dir.join(name), content).unwrap();
        }
        dir
    }

    /// Installs a shell script as `build/<subdir>/vaq-make`.
    #[cfg(unix)]
    pub fn tool(&self, subdir: &str, body: &str) -> PathBuf {
        let dir = self.dir.path().join("build").join(subdir);
        fs::create_dir_all(&dir).unwrap();
        write_script(&dir.join("vaq-make"), body)
    }
}

/// Writes an executable `/bin/sh` script.
#[cfg(unix)]
pub fn write_script(path: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    fs::write(path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    path.to_path_buf()
}
