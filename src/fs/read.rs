use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use nix::libc;

use crate::error::{Error, Result};
use crate::types::{EntryKind, FsEntry};

/// xattr names overlayfs uses to mark a directory as opaque
const OPAQUE_XATTRS: [&str; 2] = ["trusted.overlay.opaque", "user.overlay.opaque"];

/// classify a path (does not follow symlinks)
pub fn classify(path: &Path) -> Result<FsEntry> {
    let meta = fs::symlink_metadata(path).map_err(|source| Error::Stat {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(FsEntry::new(path, EntryKind::from_metadata(&meta)))
}

/// classify a path, returning None if nothing exists there
pub fn try_classify(path: &Path) -> Result<Option<FsEntry>> {
    match fs::symlink_metadata(path) {
        Ok(meta) => Ok(Some(FsEntry::new(path, EntryKind::from_metadata(&meta)))),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(Error::Stat {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// whether anything, including a dangling or self-referencing symlink, exists at path
pub fn exists(path: &Path) -> Result<bool> {
    Ok(try_classify(path)?.is_some())
}

/// read the raw stored content of a symlink
pub fn read_link_raw(path: &Path) -> Result<OsString> {
    let target = fs::read_link(path).map_err(|source| Error::Stat {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(target.into_os_string())
}

/// check whether an overlay upper directory hides everything below it
pub fn is_opaque_dir(path: &Path) -> bool {
    OPAQUE_XATTRS.iter().any(|name| match xattr::get(path, name) {
        Ok(Some(value)) => value.as_slice() == b"y",
        Ok(None) => false,
        Err(e) => {
            // ENOTSUP/EPERM just mean we can't see the marker
            if e.raw_os_error() != Some(libc::ENOTSUP)
                && e.raw_os_error() != Some(libc::EOPNOTSUPP)
                && e.raw_os_error() != Some(libc::EPERM)
                && e.raw_os_error() != Some(libc::ENODATA)
            {
                tracing::warn!("failed to read xattr {} on {:?}: {}", name, path, e);
            }
            false
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::symlink;
    use tempfile::tempdir;

    #[test]
    fn test_classify_kinds() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("file");
        let sub = dir.path().join("sub");
        let link = dir.path().join("link");
        fs::write(&file, "content").unwrap();
        fs::create_dir(&sub).unwrap();
        symlink(&sub, &link).unwrap();

        assert_eq!(classify(&file).unwrap().kind, EntryKind::Regular);
        assert_eq!(classify(&sub).unwrap().kind, EntryKind::Directory);
        assert_eq!(classify(&link).unwrap().kind, EntryKind::Symlink);
        assert_eq!(
            classify(Path::new("/dev/null")).unwrap().kind,
            EntryKind::CharDevice
        );
    }

    #[test]
    fn test_classify_missing() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing");

        assert!(matches!(classify(&missing), Err(Error::Stat { .. })));
        assert!(try_classify(&missing).unwrap().is_none());
        assert!(!exists(&missing).unwrap());
    }

    #[test]
    fn test_exists_self_referencing_symlink() {
        let dir = tempdir().unwrap();
        let link = dir.path().join("loop");
        symlink(&link, &link).unwrap();

        assert!(exists(&link).unwrap());
        assert_eq!(read_link_raw(&link).unwrap(), link.into_os_string());
    }

    #[test]
    fn test_plain_dir_not_opaque() {
        let dir = tempdir().unwrap();
        assert!(!is_opaque_dir(dir.path()));
    }

    #[test]
    fn test_user_opaque_marker() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();

        // tmpfs on older kernels has no user xattrs
        if xattr::set(&sub, "user.overlay.opaque", b"y").is_err() {
            return;
        }
        assert!(is_opaque_dir(&sub));
    }
}
