use std::fmt;
use std::fs;
use std::path::PathBuf;

use crate::config::{Config, Phases, RootFailurePolicy};
use crate::error::{Error, IoResultExt, Result};
use crate::fs::{ensure_dir, exists};
use crate::ops::{apply, commit, finalize, ApplyStats, FinalizeStats};
use crate::types::Triple;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Apply,
    Commit,
    Finalize,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Apply => write!(f, "apply"),
            Phase::Commit => write!(f, "commit"),
            Phase::Finalize => write!(f, "finalize"),
        }
    }
}

/// what happened to one mapped root
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootReport {
    pub root: PathBuf,
    /// the live root does not exist, nothing was done
    pub skipped: bool,
    pub apply: Option<ApplyStats>,
    pub committed: bool,
    pub finalize: Option<FinalizeStats>,
}

/// run the selected phases for one mapped root
///
/// a failed phase stops the pipeline for this root: a tree that was not fully
/// applied is never committed, and a failed commit is never finalized.
pub fn reconcile_root(triple: &Triple, phases: Phases) -> Result<RootReport> {
    let mut report = RootReport {
        root: triple.base.clone(),
        ..Default::default()
    };

    if !exists(&triple.base)? {
        tracing::warn!("{:?} does not exist, skipping", triple.base);
        report.skipped = true;
        return Ok(report);
    }

    if phases.apply {
        let stats = in_phase(Phase::Apply, triple, || {
            if let Some(parent) = triple.target.parent() {
                fs::create_dir_all(parent).with_path(parent)?;
            }
            apply(triple)
        })?;
        tracing::info!(
            "applied {:?}: {} links, {} sentinels, {} removed, {} dirs, {} skipped",
            triple.base,
            stats.hardlinks,
            stats.sentinels,
            stats.tombstones,
            stats.directories,
            stats.skipped
        );
        report.apply = Some(stats);
    }

    if phases.commit {
        in_phase(Phase::Commit, triple, || commit(&triple.base, &triple.target))?;
        tracing::info!("committed {:?}", triple.base);
        report.committed = true;
    }

    if phases.finalize {
        let stats = in_phase(Phase::Finalize, triple, || {
            finalize(&triple.base, &triple.target)
        })?;
        tracing::info!(
            "finalized {:?}: {} sentinels collapsed",
            triple.base,
            stats.collapsed
        );
        report.finalize = Some(stats);
    }

    Ok(report)
}

fn in_phase<T>(phase: Phase, triple: &Triple, f: impl FnOnce() -> Result<T>) -> Result<T> {
    tracing::debug!("{} {:?}", phase, triple.base);
    f().inspect_err(|e| tracing::error!("{} failed for {:?}: {}", phase, triple.base, e))
}

/// reconcile every mapped root in order
///
/// roots are independent: what happens after one of them fails is decided by
/// `config.on_root_failure`. either way the run ends in
/// [`Error::RootsFailed`] if any root failed.
pub fn reconcile_all(config: &Config, phases: Phases) -> Result<Vec<RootReport>> {
    if phases.apply {
        ensure_dir(&config.target_root)?;
    }
    let upper = config.layout().upperdir;

    let mut reports = Vec::new();
    let mut failed = Vec::new();
    for root in &config.mapped_roots {
        let triple = Triple::for_root(root, &upper, &config.target_root)?;
        match reconcile_root(&triple, phases) {
            Ok(report) => reports.push(report),
            Err(e) if e.is_fatal() => return Err(e),
            Err(_) => {
                failed.push(root.clone());
                if config.on_root_failure == RootFailurePolicy::Abort {
                    return Err(Error::RootsFailed(failed));
                }
            }
        }
    }

    if !failed.is_empty() {
        return Err(Error::RootsFailed(failed));
    }
    Ok(reports)
}
