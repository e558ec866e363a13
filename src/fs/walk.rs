//! depth-first tree walk shared by apply and finalize
//!
//! a [`Visitor`] decides what to do with each node. when it asks to descend,
//! the walker enumerates the named directories and derives one child node per
//! entry through [`Visitor::child`].

use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// a directory whose entries become children of `parent`
#[derive(Debug)]
pub struct Descent<N> {
    pub dir: PathBuf,
    pub parent: N,
}

impl<N> Descent<N> {
    pub fn new(dir: impl Into<PathBuf>, parent: N) -> Self {
        Self {
            dir: dir.into(),
            parent,
        }
    }
}

/// what the walker does after visiting a node
#[derive(Debug)]
pub enum Step<N> {
    /// nothing below this node
    Leaf,
    /// enumerate each directory in order and walk its children
    Descend(Vec<Descent<N>>),
}

pub trait Visitor {
    type Node;

    /// act on a node
    fn visit(&mut self, node: &Self::Node) -> Result<Step<Self::Node>>;

    /// derive the node for entry `name` of a descent's directory
    fn child(&self, parent: &Self::Node, name: &OsStr) -> Result<Self::Node>;
}

/// walk the tree rooted at `node`, stopping at the first error
pub fn walk<V: Visitor>(visitor: &mut V, node: V::Node) -> Result<()> {
    let descents = match visitor.visit(&node)? {
        Step::Leaf => return Ok(()),
        Step::Descend(descents) => descents,
    };

    for descent in descents {
        tracing::debug!("open {:?}", descent.dir);
        for name in read_children(&descent.dir)? {
            let child = visitor.child(&descent.parent, &name)?;
            walk(visitor, child)?;
        }
    }
    Ok(())
}

/// names of the immediate children of `dir`, sorted byte-wise
///
/// the listing is taken up front so callers may rename entries of `dir`
/// while iterating.
pub fn read_children(dir: &Path) -> Result<Vec<OsString>> {
    let open_err = |source| Error::DirectoryOpen {
        path: dir.to_path_buf(),
        source,
    };

    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(open_err)? {
        names.push(entry.map_err(open_err)?.file_name());
    }
    names.sort();
    Ok(names)
}
