use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::Command;

use crate::error::{Error, Result};

/// run `argv` chrooted into `root` and wait for it
///
/// the program is looked up on PATH inside the new root. a command that exits
/// non-zero or is killed by a signal is an error, so its partial changes are
/// never reconciled.
pub fn run_in_sandbox(root: &Path, argv: &[String]) -> Result<()> {
    let (program, args) = argv.split_first().ok_or(Error::MissingCommand)?;
    let command = argv.join(" ");

    let mut cmd = Command::new(program);
    cmd.args(args);

    let new_root = root.to_path_buf();
    // SAFETY: chroot and chdir are async-signal-safe; short paths are
    // converted on the stack, so nothing allocates after fork
    unsafe {
        cmd.pre_exec(move || {
            nix::unistd::chroot(&new_root)?;
            nix::unistd::chdir("/")?;
            Ok(())
        });
    }

    tracing::info!("running {} in {:?}", command, root);
    let status = cmd.status().map_err(|source| Error::Sandbox {
        command: command.clone(),
        root: root.to_path_buf(),
        source,
    })?;

    match status.code() {
        Some(code) => tracing::debug!("child process finished with exit code {}", code),
        None => tracing::info!("child process terminated abnormally"),
    }
    if !status.success() {
        return Err(Error::CommandFailed { command, status });
    }
    Ok(())
}
