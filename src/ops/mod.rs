//! the reconciliation phases and the pipeline driving them

mod apply;
mod commit;
mod finalize;
mod reconcile;
mod run;

#[cfg(test)]
mod test_util;

pub use apply::{apply, ApplyStats};
pub use commit::commit;
pub use finalize::{finalize, FinalizeStats};
pub use reconcile::{reconcile_all, reconcile_root, Phase, RootReport};
pub use run::{run, RunPlan};
