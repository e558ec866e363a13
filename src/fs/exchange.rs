use std::path::Path;

use nix::fcntl::{renameat2, RenameFlags, AT_FDCWD};

use crate::error::{Error, Result};

/// atomically swap the directory entries `a` and `b`
///
/// both names must exist and live on the same filesystem. afterwards `a`
/// resolves to what `b` did and vice versa. on failure nothing is swapped.
pub fn exchange(a: &Path, b: &Path) -> Result<()> {
    tracing::trace!("exchange {:?} {:?}", a, b);

    renameat2(AT_FDCWD, a, AT_FDCWD, b, RenameFlags::RENAME_EXCHANGE).map_err(|e| {
        Error::Exchange {
            a: a.to_path_buf(),
            b: b.to_path_buf(),
            source: std::io::Error::from(e),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::symlink;
    use tempfile::tempdir;

    #[test]
    fn test_exchange_files() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        fs::write(&a, "alpha").unwrap();
        fs::write(&b, "beta").unwrap();

        exchange(&a, &b).unwrap();

        assert_eq!(fs::read_to_string(&a).unwrap(), "beta");
        assert_eq!(fs::read_to_string(&b).unwrap(), "alpha");
    }

    #[test]
    fn test_exchange_is_involution() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        fs::create_dir(&a).unwrap();
        fs::write(a.join("inner"), "x").unwrap();
        symlink("/elsewhere", &b).unwrap();

        exchange(&a, &b).unwrap();
        assert!(a.symlink_metadata().unwrap().file_type().is_symlink());
        assert!(b.join("inner").exists());

        exchange(&a, &b).unwrap();
        assert!(a.join("inner").exists());
        assert_eq!(fs::read_link(&b).unwrap(), Path::new("/elsewhere"));
    }

    #[test]
    fn test_exchange_missing_side_swaps_nothing() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        fs::write(&a, "alpha").unwrap();

        let err = exchange(&a, &b).unwrap_err();
        match err {
            Error::Exchange { source, .. } => {
                assert_eq!(source.raw_os_error(), Some(nix::libc::ENOENT))
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(fs::read_to_string(&a).unwrap(), "alpha");
        assert!(!b.exists());
    }
}
