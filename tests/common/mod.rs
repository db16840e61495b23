use std::path::{Path, PathBuf};

use tempfile::TempDir;
use walkdir::WalkDir;

/// Fixture directory below `tests/data`.
pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data")
        .join(name)
}

/// Copy the simulation of fixture `name` into a temporary directory. Returns the directory and
/// the path of the copied simulation.
pub fn copy_sim(name: &str) -> (TempDir, PathBuf) {
    let source = fixture(name).join("sim");
    let dir = tempfile::tempdir().unwrap();
    let sim = dir.path().join("sim");
    for entry in WalkDir::new(&source) {
        let entry = entry.unwrap();
        let target = sim.join(entry.path().strip_prefix(&source).unwrap());
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).unwrap();
        } else {
            std::fs::copy(entry.path(), &target).unwrap();
        }
    }
    (dir, sim)
}
