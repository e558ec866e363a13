use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;
use std::path::{Component, Path, PathBuf};

use nix::libc;

use crate::error::{Error, Result};

/// the unit of reconciliation work
///
/// `base` is the live content, `diff` the recorded change (which may not
/// exist) and `target` the path under construction. a target is written once
/// by apply and afterwards only ever exchanged as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triple {
    pub base: PathBuf,
    pub diff: PathBuf,
    pub target: PathBuf,
    /// set for nodes reached through the base pass of a changed directory
    pub ignore_existing: bool,
}

impl Triple {
    pub fn new(
        base: impl Into<PathBuf>,
        diff: impl Into<PathBuf>,
        target: impl Into<PathBuf>,
    ) -> Self {
        Self {
            base: base.into(),
            diff: diff.into(),
            target: target.into(),
            ignore_existing: false,
        }
    }

    /// build the triple for a mapped root such as `/usr`
    ///
    /// the diff lives under the overlay upper layer and the target under the
    /// staging root, both at the same relative location as the live root.
    pub fn for_root(root: &Path, upper: &Path, target_root: &Path) -> Result<Self> {
        Ok(Self::new(
            root,
            rebase(upper, root)?,
            rebase(target_root, root)?,
        ))
    }

    pub fn with_ignore_existing(mut self, ignore_existing: bool) -> Self {
        self.ignore_existing = ignore_existing;
        self
    }

    /// the triple for a child entry named `name`
    pub fn child(&self, name: &OsStr, ignore_existing: bool) -> Result<Self> {
        Ok(Self {
            base: join_child(&self.base, name)?,
            diff: join_child(&self.diff, name)?,
            target: join_child(&self.target, name)?,
            ignore_existing,
        })
    }
}

/// join a single directory entry name onto `parent`
///
/// fails instead of producing a path that escapes `parent` or exceeds the
/// kernel limit.
pub fn join_child(parent: &Path, name: &OsStr) -> Result<PathBuf> {
    let bytes = name.as_bytes();
    if bytes.is_empty() || bytes == b"." || bytes == b".." || bytes.contains(&b'/') {
        return Err(Error::InvalidPathComponent {
            parent: parent.to_path_buf(),
            name: name.to_string_lossy().into_owned(),
        });
    }

    let path = parent.join(name);
    check_len(path)
}

/// place an absolute path `root` underneath `prefix`
///
/// `rebase("/mnt/upperdir", "/usr")` is `/mnt/upperdir/usr`.
pub fn rebase(prefix: &Path, root: &Path) -> Result<PathBuf> {
    if !root.is_absolute() {
        return Err(Error::InvalidMappedRoot(root.to_path_buf()));
    }

    let mut path = prefix.to_path_buf();
    for component in root.components() {
        match component {
            Component::RootDir => {}
            Component::Normal(name) => path.push(name),
            Component::CurDir | Component::ParentDir | Component::Prefix(_) => {
                return Err(Error::InvalidMappedRoot(root.to_path_buf()));
            }
        }
    }
    check_len(path)
}

fn check_len(path: PathBuf) -> Result<PathBuf> {
    let len = path.as_os_str().len();
    // PATH_MAX includes the terminating nul
    if len >= libc::PATH_MAX as usize {
        return Err(Error::PathTooLong { path, len });
    }
    Ok(path)
}
