use std::fs::{self, DirBuilder};
use std::os::unix::fs::{symlink, DirBuilderExt};
use std::path::Path;

use crate::error::{Error, IoResultExt, Result};
use crate::fs::read::try_classify;
use crate::types::EntryKind;

/// hardlink `from` to the new name `to`
///
/// `to` must not exist yet; targets are write-once.
pub fn create_hardlink(from: &Path, to: &Path) -> Result<()> {
    let res = fs::hard_link(from, to);
    tracing::trace!("link {:?} {:?} {}", from, to, outcome(&res));
    res.map_err(|source| Error::LinkCreation {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    })
}

/// create a symlink at `path` whose content is `path` itself
///
/// once the enclosing directory has been exchanged, that name holds the
/// original unchanged directory, so the link resolves to it.
pub fn create_sentinel(path: &Path) -> Result<()> {
    let res = symlink(path, path);
    tracing::trace!("sentinel {:?} {}", path, outcome(&res));
    res.map_err(|source| Error::SentinelCreation {
        path: path.to_path_buf(),
        source,
    })
}

/// make sure `path` is a directory, creating it (mode 0755) if missing
pub fn ensure_dir(path: &Path) -> Result<()> {
    match try_classify(path)? {
        None => DirBuilder::new().mode(0o755).create(path).with_path(path),
        Some(entry) if entry.kind == EntryKind::Directory => Ok(()),
        Some(_) => Err(Error::NotADirectory(path.to_path_buf())),
    }
}

fn outcome<T>(res: &std::io::Result<T>) -> &'static str {
    if res.is_ok() {
        "success"
    } else {
        "failed"
    }
}
