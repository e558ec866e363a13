use crate::config::{Config, Phases};
use crate::error::{Error, Result};
use crate::ops::reconcile::{reconcile_all, RootReport};
use crate::staging::{run_in_sandbox, OverlayMount};

/// everything a run needs, fixed before the first phase starts
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub config: Config,
    pub phases: Phases,
    /// command producing the diff; only needed when applying
    pub command: Vec<String>,
}

/// stage the command's changes and reconcile every mapped root
///
/// the command only runs when the apply phase is selected, since nothing else
/// reads the diff. mounts are released before this returns, on success and
/// on every error.
pub fn run(plan: &RunPlan) -> Result<Vec<RootReport>> {
    plan.config.validate()?;
    tracing::debug!("phases: {:?}, command: {:?}", plan.phases, plan.command);

    let _mount = if plan.phases.apply {
        if plan.command.is_empty() {
            return Err(Error::MissingCommand);
        }
        let layout = plan.config.layout();
        let mount = OverlayMount::mount(&layout, &plan.config.lower_dir)?;
        run_in_sandbox(&layout.merged, &plan.command)?;
        Some(mount)
    } else {
        None
    };

    reconcile_all(&plan.config, plan.phases)
}
