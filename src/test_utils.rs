//! Test utilities shared across test modules

use std::fs;
use tempfile::TempDir;

use crate::config::CONFIG_FILE_NAME;
use crate::env::MapEnv;

/// Create a profile directory named `name` inside the temp directory,
/// optionally with a `profile.cfg`, and return its path as a string
pub fn setup_profile_dir(temp_dir: &TempDir, name: &str, config: Option<&str>) -> String {
    let dir = temp_dir.path().join(name);
    fs::create_dir_all(&dir).unwrap();
    if let Some(content) = config {
        fs::write(dir.join(CONFIG_FILE_NAME), content).unwrap();
    }
    dir.to_string_lossy().into_owned()
}

/// A small environment resembling an interactive shell
pub fn base_env() -> MapEnv {
    MapEnv::from_vars([
        ("PATH", "/usr/local/bin:/usr/bin"),
        ("HOME", "/home/user"),
        ("SHELL", "/bin/bash"),
    ])
}
