use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, IoResultExt, Result};
use crate::types::rebase;

/// paths and policies for a run, optionally loaded from a toml file
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// holds upperdir, workdir and the merged mount point
    pub overlay_home: PathBuf,
    /// lower layer of the overlay, normally the live root
    pub lower_dir: PathBuf,
    /// staging root; each mapped root is built at the same path below it
    pub target_root: PathBuf,
    /// top-level subtrees reconciled one after another
    pub mapped_roots: Vec<PathBuf>,
    pub log_level: LogLevel,
    pub on_root_failure: RootFailurePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            overlay_home: PathBuf::from("/mnt"),
            lower_dir: PathBuf::from("/"),
            target_root: PathBuf::from("/mnt/newroot"),
            mapped_roots: ["/usr", "/etc", "/var", "/opt", "/boot"]
                .iter()
                .map(PathBuf::from)
                .collect(),
            log_level: LogLevel::default(),
            on_root_failure: RootFailurePolicy::default(),
        }
    }
}

impl Config {
    /// load config from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).with_path(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// check that every path can be used as-is
    pub fn validate(&self) -> Result<()> {
        for path in [&self.overlay_home, &self.lower_dir, &self.target_root] {
            if !path.is_absolute() {
                return Err(Error::InvalidConfigPath(path.clone()));
            }
        }
        for root in &self.mapped_roots {
            // rejects relative roots and `..`
            rebase(&self.target_root, root)?;
            if root.parent().is_none() {
                return Err(Error::InvalidMappedRoot(root.clone()));
            }
        }
        Ok(())
    }

    pub fn layout(&self) -> OverlayLayout {
        OverlayLayout::new(&self.overlay_home)
    }
}

/// directories making up the staging overlay
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OverlayLayout {
    pub upperdir: PathBuf,
    pub workdir: PathBuf,
    pub merged: PathBuf,
}

impl OverlayLayout {
    pub fn new(home: &Path) -> Self {
        Self {
            upperdir: home.join("upperdir"),
            workdir: home.join("workdir"),
            merged: home.join("auv"),
        }
    }
}

/// which reconciliation phases to run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Phases {
    pub apply: bool,
    pub commit: bool,
    pub finalize: bool,
}

impl Phases {
    pub fn all() -> Self {
        Self {
            apply: true,
            commit: true,
            finalize: true,
        }
    }

    /// build from individual flags, selecting everything when none is set
    pub fn from_flags(all: bool, apply: bool, commit: bool, finalize: bool) -> Self {
        if all || !(apply || commit || finalize) {
            Self::all()
        } else {
            Self {
                apply,
                commit,
                finalize,
            }
        }
    }
}

impl Default for Phases {
    fn default() -> Self {
        Self::all()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Fatal,
}

impl LogLevel {
    pub fn as_tracing(&self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            // tracing has nothing above error
            LogLevel::Error | LogLevel::Fatal => tracing::Level::ERROR,
        }
    }
}

/// what a failed mapped root means for the others
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RootFailurePolicy {
    /// keep reconciling the remaining roots, fail the run at the end
    #[default]
    Continue,
    /// stop at the first failed root
    Abort,
}
