mod entry;
mod triple;

pub use entry::{EntryKind, FsEntry};
pub use triple::{join_child, rebase, Triple};
