use std::ffi::OsString;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use nix::errno::Errno;
use nix::mount::{mount, umount2, MntFlags, MsFlags};

use crate::config::OverlayLayout;
use crate::error::{Error, Result};
use crate::fs::ensure_dir;

/// pseudo filesystems mounted inside the merged view: (source, fstype, dir)
const PSEUDO_MOUNTS: [(&str, &str, &str); 3] = [
    ("proc", "proc", "proc"),
    ("devtmpfs", "devtmpfs", "dev"),
    ("sysfs", "sysfs", "sys"),
];

/// an overlay of the upper layer on the live root, with proc/dev/sys inside
///
/// everything mounted so far is unmounted again when this is dropped, in
/// reverse order, including after a partial failure in [`OverlayMount::mount`].
#[derive(Debug)]
pub struct OverlayMount {
    mounted: Vec<PathBuf>,
}

impl OverlayMount {
    pub fn mount(layout: &OverlayLayout, lower: &Path) -> Result<Self> {
        for dir in [&layout.upperdir, &layout.workdir, &layout.merged] {
            ensure_dir(dir)?;
        }

        let mut guard = Self { mounted: vec![] };

        let opts = overlay_options(lower, layout)?;
        guard.mount_one("overlay", &layout.merged, "overlay", Some(&opts))?;

        for (source, fstype, dir) in PSEUDO_MOUNTS {
            guard.mount_one(source, &layout.merged.join(dir), fstype, None)?;
        }

        tracing::debug!("overlayfs mounted successfully on {:?}", layout.merged);
        Ok(guard)
    }

    fn mount_one(
        &mut self,
        source: &str,
        target: &Path,
        fstype: &'static str,
        data: Option<&OsString>,
    ) -> Result<()> {
        mount(
            Some(source),
            target,
            Some(fstype),
            MsFlags::empty(),
            data.map(|d| d.as_os_str()),
        )
        .map_err(|source| Error::Mount {
            target: target.to_path_buf(),
            fstype,
            source,
        })?;
        tracing::trace!("mounted {} on {:?}", fstype, target);
        self.mounted.push(target.to_path_buf());
        Ok(())
    }
}

impl Drop for OverlayMount {
    fn drop(&mut self) {
        for path in self.mounted.drain(..).rev() {
            match umount2(&path, MntFlags::MNT_DETACH | MntFlags::MNT_FORCE) {
                Ok(()) => tracing::debug!("successfully unmounted {:?}", path),
                Err(e) => tracing::error!("failed to unmount {:?}: {}", path, e),
            }
        }
    }
}

/// `lowerdir=..,upperdir=..,workdir=..`
///
/// overlayfs splits its options on `,` and layers on `:`, so paths
/// containing either cannot be expressed.
fn overlay_options(lower: &Path, layout: &OverlayLayout) -> Result<OsString> {
    let mut opts = OsString::new();
    for (key, path) in [
        ("lowerdir", lower),
        ("upperdir", layout.upperdir.as_path()),
        ("workdir", layout.workdir.as_path()),
    ] {
        if path.as_os_str().as_bytes().iter().any(|b| *b == b',' || *b == b':') {
            return Err(Error::Mount {
                target: layout.merged.clone(),
                fstype: "overlay",
                source: Errno::EINVAL,
            });
        }
        if !opts.is_empty() {
            opts.push(",");
        }
        opts.push(key);
        opts.push("=");
        opts.push(path);
    }
    Ok(opts)
}
