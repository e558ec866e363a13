use std::ffi::OsStr;

use crate::error::Result;
use crate::fs::{
    classify, create_hardlink, create_sentinel, ensure_dir, exists, is_opaque_dir, try_classify,
    walk, Descent, Step, Visitor,
};
use crate::types::{EntryKind, Triple};

/// apply statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ApplyStats {
    /// unchanged or changed non-directories linked into the target
    pub hardlinks: usize,
    /// unchanged directories represented by a sentinel symlink
    pub sentinels: usize,
    /// paths deleted by the diff
    pub tombstones: usize,
    /// changed directories created in the target
    pub directories: usize,
    /// targets that already existed
    pub skipped: usize,
}

/// build `triple.target` as the diff overlaid on the base, without copying data
///
/// a target that already exists is never touched, whatever it is: staging
/// trees are write-once, and after a commit the target name holds the
/// original tree. running apply again is therefore always a no-op for
/// anything already materialized.
pub fn apply(triple: &Triple) -> Result<ApplyStats> {
    let mut applier = Applier::default();
    walk(&mut applier, triple.clone())?;
    Ok(applier.stats)
}

#[derive(Default)]
struct Applier {
    stats: ApplyStats,
}

impl Visitor for Applier {
    type Node = Triple;

    fn visit(&mut self, node: &Triple) -> Result<Step<Triple>> {
        if exists(&node.target)? {
            if node.ignore_existing {
                tracing::trace!("skip {:?}", node.target);
            } else {
                tracing::debug!("skip {:?} (already applied)", node.target);
            }
            self.stats.skipped += 1;
            return Ok(Step::Leaf);
        }

        let diff = match try_classify(&node.diff)? {
            Some(diff) => diff,
            None => {
                // unchanged under base
                let base = classify(&node.base)?;
                if base.is_dir() {
                    create_sentinel(&node.target)?;
                    self.stats.sentinels += 1;
                } else {
                    create_hardlink(&node.base, &node.target)?;
                    self.stats.hardlinks += 1;
                }
                return Ok(Step::Leaf);
            }
        };

        if diff.is_tombstone() {
            // the base pass meets the same tombstone again
            if !node.ignore_existing {
                tracing::debug!("remove {:?}", node.target);
                self.stats.tombstones += 1;
            }
            return Ok(Step::Leaf);
        }

        match diff.kind {
            EntryKind::Directory => {
                ensure_dir(&node.target)?;
                self.stats.directories += 1;
                tracing::debug!("apply {:?}", node.target);
                descend(node)
            }
            EntryKind::Regular
            | EntryKind::Symlink
            | EntryKind::CharDevice
            | EntryKind::Other => {
                create_hardlink(&node.diff, &node.target)?;
                self.stats.hardlinks += 1;
                Ok(Step::Leaf)
            }
        }
    }

    fn child(&self, parent: &Triple, name: &OsStr) -> Result<Triple> {
        parent.child(name, parent.ignore_existing)
    }
}

/// walk the diff entries first, then let the base fill whatever is left
fn descend(node: &Triple) -> Result<Step<Triple>> {
    let mut descents = vec![Descent::new(node.diff.clone(), node.clone())];
    if merges_base(node)? {
        descents.push(Descent::new(
            node.base.clone(),
            node.clone().with_ignore_existing(true),
        ));
    }
    Ok(Step::Descend(descents))
}

/// whether the base directory contributes entries under a changed directory
fn merges_base(node: &Triple) -> Result<bool> {
    let base_is_dir = matches!(
        try_classify(&node.base)?,
        Some(entry) if entry.kind == EntryKind::Directory
    );
    if !base_is_dir {
        return Ok(false);
    }
    if is_opaque_dir(&node.diff) {
        tracing::debug!("opaque {:?}, not merging {:?}", node.diff, node.base);
        return Ok(false);
    }
    Ok(true)
}
