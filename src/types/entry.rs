use std::fs::Metadata;
use std::os::unix::fs::FileTypeExt;
use std::path::PathBuf;

/// classification of a filesystem entry, taken without following symlinks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Regular,
    Directory,
    Symlink,
    /// in a diff tree this is always a tombstone
    CharDevice,
    /// block devices, fifos, sockets
    Other,
}

impl EntryKind {
    /// detect entry kind from lstat metadata
    pub fn from_metadata(meta: &Metadata) -> Self {
        let ft = meta.file_type();
        if ft.is_file() {
            EntryKind::Regular
        } else if ft.is_dir() {
            EntryKind::Directory
        } else if ft.is_symlink() {
            EntryKind::Symlink
        } else if ft.is_char_device() {
            EntryKind::CharDevice
        } else {
            EntryKind::Other
        }
    }
}

/// a path together with its classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEntry {
    pub path: PathBuf,
    pub kind: EntryKind,
}

impl FsEntry {
    pub fn new(path: impl Into<PathBuf>, kind: EntryKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// a character device inside a diff marks a deletion
    pub fn is_tombstone(&self) -> bool {
        self.kind == EntryKind::CharDevice
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}
