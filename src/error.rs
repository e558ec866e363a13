use std::path::PathBuf;
use std::process::ExitStatus;

/// error type for auv operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to mount {fstype} on {target}: {source}")]
    Mount {
        target: PathBuf,
        fstype: &'static str,
        #[source]
        source: nix::errno::Errno,
    },

    #[error("failed to run {command} in sandbox {root}: {source}")]
    Sandbox {
        command: String,
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("sandboxed command {command} failed: {status}")]
    CommandFailed { command: String, status: ExitStatus },

    #[error("failed to stat {path}: {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read directory {path}: {source}")]
    DirectoryOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to link {from} to {to}: {source}")]
    LinkCreation {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create sentinel symlink {path}: {source}")]
    SentinelCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to exchange {a} and {b}: {source}")]
    Exchange {
        a: PathBuf,
        b: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("path exists but is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("invalid path component {name:?} under {parent}")]
    InvalidPathComponent { parent: PathBuf, name: String },

    #[error("path too long ({len} bytes): {path}")]
    PathTooLong { path: PathBuf, len: usize },

    #[error("invalid mapped root: {0}")]
    InvalidMappedRoot(PathBuf),

    #[error("config path must be absolute: {0}")]
    InvalidConfigPath(PathBuf),

    #[error("no command given for the apply phase")]
    MissingCommand,

    #[error("reconciliation failed for {}", display_roots(.0))]
    RootsFailed(Vec<PathBuf>),

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
}

impl Error {
    /// whether this error must abort the whole run rather than a single root
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::Mount { .. }
            | Error::Sandbox { .. }
            | Error::CommandFailed { .. }
            | Error::Config(_)
            | Error::MissingCommand
            | Error::InvalidMappedRoot(_)
            | Error::InvalidConfigPath(_) => true,
            Error::Stat { .. }
            | Error::DirectoryOpen { .. }
            | Error::LinkCreation { .. }
            | Error::SentinelCreation { .. }
            | Error::Exchange { .. }
            | Error::NotADirectory(_)
            | Error::InvalidPathComponent { .. }
            | Error::PathTooLong { .. }
            | Error::RootsFailed(_)
            | Error::Io { .. } => false,
        }
    }
}

fn display_roots(roots: &[PathBuf]) -> String {
    roots
        .iter()
        .map(|r| r.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, Error>;

/// helper to wrap io errors with path context
pub trait IoResultExt<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| Error::Io {
            path: path.into(),
            source,
        })
    }
}
