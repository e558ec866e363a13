pub mod exchange;
pub mod read;
pub mod walk;
pub mod write;

pub use exchange::exchange;
pub use read::{classify, exists, is_opaque_dir, read_link_raw, try_classify};
pub use walk::{read_children, walk, Descent, Step, Visitor};
pub use write::{create_hardlink, create_sentinel, ensure_dir};
