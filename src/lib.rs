//! auv - atomic updates of live filesystem subtrees
//!
//! a command runs chrooted into an overlay of the live root; its writes land
//! in the overlay upper layer (the diff). each mapped root such as `/usr` is
//! then reconciled in three phases:
//!
//! - **apply**: build a staging tree from base and diff out of hardlinks,
//!   leaving a self-referencing sentinel symlink for each unchanged directory
//!   and nothing for paths the diff deleted (character device tombstones)
//! - **commit**: atomically exchange the live root with the staging tree
//! - **finalize**: exchange every sentinel with the original directory it
//!   stands for, which commit moved to the sentinel's own path
//!
//! every step is a single atomic syscall. apply never touches a target that
//! already exists, so running it again over a finished tree is a no-op.
//!
//! # Example usage
//!
//! ```no_run
//! use auv::ops::{apply, commit, finalize};
//! use auv::Triple;
//!
//! let triple = Triple::new("/usr", "/mnt/upperdir/usr", "/mnt/newroot/usr");
//! apply(&triple).unwrap();
//! commit(&triple.base, &triple.target).unwrap();
//! finalize(&triple.base, &triple.target).unwrap();
//! ```

mod config;
mod error;

pub mod fs;
pub mod ops;
pub mod staging;
pub mod types;

pub use config::{Config, LogLevel, OverlayLayout, Phases, RootFailurePolicy};
pub use error::{Error, Result};
pub use types::{EntryKind, FsEntry, Triple};
