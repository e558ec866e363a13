use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::fs::{classify, exchange, read_link_raw, walk, Descent, Step, Visitor};
use crate::types::{join_child, EntryKind};

/// finalize statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FinalizeStats {
    /// sentinels exchanged for the real directory
    pub collapsed: usize,
    /// symlinks that were not ours and were left alone
    pub foreign_symlinks: usize,
}

/// replace the sentinel symlinks in a committed tree with the directories they stand for
///
/// each exchange is atomic on its own. a reader racing the walk sees some
/// directories still behind a sentinel and others already collapsed, both of
/// which resolve to the same content.
pub fn finalize(base: &Path, target: &Path) -> Result<FinalizeStats> {
    tracing::debug!("finalize {:?} {:?}", base, target);
    let mut finalizer = Finalizer::default();
    let root = Node {
        base: base.to_path_buf(),
        target: target.to_path_buf(),
    };
    walk(&mut finalizer, root)?;
    Ok(finalizer.stats)
}

struct Node {
    base: PathBuf,
    target: PathBuf,
}

#[derive(Default)]
struct Finalizer {
    stats: FinalizeStats,
}

impl Visitor for Finalizer {
    type Node = Node;

    fn visit(&mut self, node: &Node) -> Result<Step<Node>> {
        let entry = classify(&node.base)?;
        match entry.kind {
            EntryKind::Symlink => {
                let content = read_link_raw(&node.base)?;
                if content.as_os_str() == node.target.as_os_str() {
                    exchange(&node.base, &node.target)?;
                    self.stats.collapsed += 1;
                } else {
                    tracing::debug!("ignoring symlink at {:?} to {:?}", node.base, content);
                    self.stats.foreign_symlinks += 1;
                }
                Ok(Step::Leaf)
            }
            EntryKind::Directory => Ok(Step::Descend(vec![Descent::new(
                node.base.clone(),
                Node {
                    base: node.base.clone(),
                    target: node.target.clone(),
                },
            )])),
            EntryKind::Regular | EntryKind::CharDevice | EntryKind::Other => Ok(Step::Leaf),
        }
    }

    fn child(&self, parent: &Node, name: &OsStr) -> Result<Node> {
        Ok(Node {
            base: join_child(&parent.base, name)?,
            target: join_child(&parent.target, name)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::ops::test_util::{layout, make_tombstone, snapshot};
    use crate::ops::{apply, commit};
    use std::fs;
    use std::os::unix::fs::{symlink, MetadataExt};

    #[test]
    fn test_finalize_collapses_sentinel() {
        let (_dir, t) = layout();
        fs::create_dir(t.base.join("share")).unwrap();
        fs::write(t.base.join("share/doc"), "doc").unwrap();
        fs::write(t.diff.join("new"), "new").unwrap();
        let share_ino = fs::metadata(t.base.join("share")).unwrap().ino();

        apply(&t).unwrap();
        commit(&t.base, &t.target).unwrap();

        // between commit and finalize the live name is a sentinel that still resolves
        let live_share = t.base.join("share");
        assert!(live_share.symlink_metadata().unwrap().file_type().is_symlink());
        assert_eq!(fs::read_to_string(live_share.join("doc")).unwrap(), "doc");

        let stats = finalize(&t.base, &t.target).unwrap();

        assert_eq!(stats.collapsed, 1);
        let meta = live_share.symlink_metadata().unwrap();
        assert!(meta.is_dir());
        assert_eq!(meta.ino(), share_ino);
        assert_eq!(fs::read_to_string(live_share.join("doc")).unwrap(), "doc");
    }

    #[test]
    fn test_finalize_leaves_foreign_symlinks() {
        let (_dir, t) = layout();
        fs::create_dir(&t.target).unwrap();
        symlink("../lib", t.base.join("lib64")).unwrap();

        let stats = finalize(&t.base, &t.target).unwrap();

        assert_eq!(stats.foreign_symlinks, 1);
        assert_eq!(
            fs::read_link(t.base.join("lib64")).unwrap(),
            Path::new("../lib")
        );
    }

    #[test]
    fn test_finalize_missing_base() {
        let (dir, t) = layout();
        let missing = dir.path().join("missing");

        assert!(matches!(
            finalize(&missing, &t.target),
            Err(Error::Stat { .. })
        ));
    }

    #[test]
    fn test_finalize_whole_root_sentinel() {
        // nothing changed below the root at all
        let (_dir, t) = layout();
        fs::remove_dir(&t.diff).unwrap();
        fs::write(t.base.join("file"), "x").unwrap();

        apply(&t).unwrap();
        assert_eq!(fs::read_link(&t.target).unwrap(), t.target);
        commit(&t.base, &t.target).unwrap();
        finalize(&t.base, &t.target).unwrap();

        assert!(t.base.symlink_metadata().unwrap().is_dir());
        assert_eq!(fs::read_to_string(t.base.join("file")).unwrap(), "x");
    }

    #[test]
    fn test_full_cycle_union() {
        let (_dir, t) = layout();
        // base
        fs::create_dir_all(t.base.join("bin")).unwrap();
        fs::write(t.base.join("bin/ls"), "ls").unwrap();
        fs::create_dir_all(t.base.join("share/doc/pkg")).unwrap();
        fs::write(t.base.join("share/doc/pkg/README"), "readme").unwrap();
        fs::create_dir_all(t.base.join("lib/newpkg")).unwrap();
        fs::write(t.base.join("lib/newpkg/old.so"), "old pkg").unwrap();
        fs::write(t.base.join("lib/libc.so"), "libc").unwrap();
        symlink("lib", t.base.join("lib64")).unwrap();
        // diff
        fs::create_dir_all(t.diff.join("lib/newpkg")).unwrap();
        fs::write(t.diff.join("lib/newpkg/a.so"), "a").unwrap();
        fs::write(t.diff.join("lib/libc.so"), "libc v2").unwrap();
        let ls_ino = fs::metadata(t.base.join("bin/ls")).unwrap().ino();
        let a_ino = fs::metadata(t.diff.join("lib/newpkg/a.so")).unwrap().ino();

        apply(&t).unwrap();
        commit(&t.base, &t.target).unwrap();
        let stats = finalize(&t.base, &t.target).unwrap();

        // bin and share were unchanged
        assert_eq!(stats.collapsed, 2);
        assert_eq!(stats.foreign_symlinks, 1);

        let expected: Vec<(std::path::PathBuf, String)> = [
            ("bin", "dir"),
            ("bin/ls", "ls"),
            ("lib", "dir"),
            ("lib/libc.so", "libc v2"),
            ("lib/newpkg", "dir"),
            ("lib/newpkg/a.so", "a"),
            ("lib/newpkg/old.so", "old pkg"),
            ("lib64", "-> lib"),
            ("share", "dir"),
            ("share/doc", "dir"),
            ("share/doc/pkg", "dir"),
            ("share/doc/pkg/README", "readme"),
        ]
        .iter()
        .map(|(p, d)| (p.into(), d.to_string()))
        .collect();
        assert_eq!(snapshot(&t.base), expected);

        // unchanged data keeps its inode, changed data is the diff's inode
        assert_eq!(fs::metadata(t.base.join("bin/ls")).unwrap().ino(), ls_ino);
        assert_eq!(
            fs::metadata(t.base.join("lib/newpkg/a.so")).unwrap().ino(),
            a_ino
        );
    }

    #[test]
    fn test_full_cycle_tombstone() {
        let (_dir, t) = layout();
        fs::create_dir(t.base.join("lib")).unwrap();
        fs::write(t.base.join("lib/old.so"), "old").unwrap();
        fs::write(t.base.join("lib/keep.so"), "keep").unwrap();
        fs::create_dir(t.diff.join("lib")).unwrap();
        if !make_tombstone(&t.diff.join("lib/old.so")) {
            return;
        }

        apply(&t).unwrap();
        commit(&t.base, &t.target).unwrap();
        finalize(&t.base, &t.target).unwrap();

        assert!(t.base.join("lib/old.so").symlink_metadata().is_err());
        assert!(t.base.join("lib/keep.so").exists());
    }
}
