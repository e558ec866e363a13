//! staging plumbing: the overlay the command runs in and the command itself

mod mount;
mod sandbox;

pub use mount::OverlayMount;
pub use sandbox::run_in_sandbox;
