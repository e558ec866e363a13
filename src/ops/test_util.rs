//! fixtures shared by the ops tests

use std::fs;
use std::path::{Path, PathBuf};

use nix::sys::stat::{makedev, mknod, Mode, SFlag};
use tempfile::{tempdir, TempDir};
use walkdir::WalkDir;

use crate::types::Triple;

/// a live root, its upper layer and an empty staging root inside a tempdir
///
/// base and diff exist, the target does not but its parent does.
pub fn layout() -> (TempDir, Triple) {
    let dir = tempdir().unwrap();
    let base = dir.path().join("usr");
    let diff = dir.path().join("upperdir/usr");
    let target = dir.path().join("newroot/usr");
    fs::create_dir_all(&base).unwrap();
    fs::create_dir_all(&diff).unwrap();
    fs::create_dir_all(target.parent().unwrap()).unwrap();
    (dir, Triple::new(base, diff, target))
}

/// create an overlay-style whiteout, false if we lack the privileges
pub fn make_tombstone(path: &Path) -> bool {
    mknod(path, SFlag::S_IFCHR, Mode::empty(), makedev(0, 0)).is_ok()
}

/// every path under `root` with its kind and, for files, content
pub fn snapshot(root: &Path) -> Vec<(PathBuf, String)> {
    WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .map(|e| {
            let e = e.unwrap();
            let rel = e.path().strip_prefix(root).unwrap().to_path_buf();
            let ft = e.file_type();
            let desc = if ft.is_dir() {
                "dir".to_string()
            } else if ft.is_symlink() {
                format!("-> {}", fs::read_link(e.path()).unwrap().display())
            } else {
                fs::read_to_string(e.path()).unwrap()
            };
            (rel, desc)
        })
        .collect()
}
