//! Label hierarchy reconstruction from delimited path names
//!
//! Gmail exposes nested labels as a flat list whose names encode the nesting,
//! e.g. `Finance`, `Finance/Fidelity`, `Finance/Fidelity/Statements`. This module
//! rebuilds the tree from those names.
//!
//! Labels are bucketed by depth and, within a bucket, indexed by their short name
//! (last path segment). Each label at depth `n + 1` is attached to the label at depth
//! `n` whose short name equals its second-to-last segment. Parents are resolved by
//! short name only, not by full path: two same-depth labels with the same short name
//! (`Work/Projects`, `Home/Projects`) collide, and [`CollisionPolicy`] decides what
//! happens. A label whose parent cannot be found is an orphan and is handled per
//! [`OrphanPolicy`].
//!
//! The result is an immutable [`Hierarchy`] of indices into the caller's list.
//! Children under a parent keep the order of the flat list; no sorting is applied.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::error::{GmailError, Result};

/// Separator between path segments in a label name
pub const DELIMITER: char = '/';

/// Number of segments in a label path
pub fn depth(path: &str) -> usize {
    path.split(DELIMITER).count()
}

/// Last segment of a label path
pub fn short_name(path: &str) -> &str {
    path.rsplit(DELIMITER).next().unwrap_or(path)
}

/// Second-to-last segment of a label path, `None` for top-level labels
pub fn parent_short_name(path: &str) -> Option<&str> {
    let mut segments = path.rsplit(DELIMITER);
    segments.next();
    segments.next()
}

/// What to do with a label whose parent segment has no matching label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanPolicy {
    /// Leave it out of the tree. It stays reachable through the flat lookups.
    #[default]
    Drop,
    /// Add it to the root set
    PromoteToRoot,
    /// Fail the build
    Error,
}

/// What to do when two labels at the same depth share a short name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// The later label replaces the earlier one as the parent candidate
    #[default]
    Overwrite,
    /// Fail the build
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HierarchyOptions {
    #[serde(default)]
    pub orphans: OrphanPolicy,
    #[serde(default)]
    pub collisions: CollisionPolicy,
}

/// Result of one build pass, as indices into the flat list that was passed in
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hierarchy {
    roots: Vec<usize>,
    children: Vec<Vec<usize>>,
    orphans: Vec<usize>,
}

impl Hierarchy {
    /// Top-level labels, plus promoted orphans under `OrphanPolicy::PromoteToRoot`
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    pub fn children(&self, index: usize) -> &[usize] {
        self.children.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Labels whose parent segment matched no label, whatever the policy did with them
    pub fn orphans(&self) -> &[usize] {
        &self.orphans
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Depth-first pre-order walk from the roots, yielding `(depth, index)` with roots at depth 0
    pub fn walk(&self) -> Vec<(usize, usize)> {
        let mut visited = Vec::with_capacity(self.children.len());
        let mut stack: Vec<(usize, usize)> = self.roots.iter().rev().map(|&r| (0, r)).collect();

        while let Some((level, index)) = stack.pop() {
            visited.push((level, index));
            for &child in self.children(index).iter().rev() {
                stack.push((level + 1, child));
            }
        }

        visited
    }
}

/// Build the label tree from a flat list of label paths
///
/// Shallower depths are indexed before deeper ones are attached, so the input order
/// only affects the order of siblings (and which label wins a short-name collision).
pub fn build_hierarchy<'a, I>(paths: I, options: &HierarchyOptions) -> Result<Hierarchy>
where
    I: IntoIterator<Item = &'a str>,
{
    let paths: Vec<&str> = paths.into_iter().collect();

    // buckets[d] holds the indices of labels with d + 1 segments, in list order
    let mut buckets: Vec<Vec<usize>> = Vec::new();
    for (index, path) in paths.iter().enumerate() {
        let level = depth(path) - 1;
        if buckets.len() <= level {
            buckets.resize_with(level + 1, Vec::new);
        }
        buckets[level].push(index);
    }

    let mut indexes: Vec<HashMap<&str, usize>> = Vec::with_capacity(buckets.len());
    for (level, bucket) in buckets.iter().enumerate() {
        let mut by_short_name = HashMap::with_capacity(bucket.len());
        for &index in bucket {
            let name = short_name(paths[index]);
            if let Some(previous) = by_short_name.insert(name, index) {
                match options.collisions {
                    CollisionPolicy::Overwrite => {
                        debug!(
                            "Label '{}' replaces '{}' as parent candidate '{}' at depth {}",
                            paths[index],
                            paths[previous],
                            name,
                            level + 1
                        );
                    }
                    CollisionPolicy::Error => {
                        return Err(GmailError::HierarchyError(format!(
                            "labels '{}' and '{}' share the name '{}' at depth {}",
                            paths[previous],
                            paths[index],
                            name,
                            level + 1
                        )));
                    }
                }
            }
        }
        indexes.push(by_short_name);
    }

    let mut hierarchy = Hierarchy {
        roots: buckets.first().cloned().unwrap_or_default(),
        children: vec![Vec::new(); paths.len()],
        orphans: Vec::new(),
    };

    for level in 1..buckets.len() {
        for &index in &buckets[level] {
            let path = paths[index];
            let parent = parent_short_name(path).and_then(|name| indexes[level - 1].get(name));

            match parent {
                Some(&parent) => hierarchy.children[parent].push(index),
                None => match options.orphans {
                    OrphanPolicy::Drop => {
                        debug!("Dropping label '{}': no parent label at depth {}", path, level);
                        hierarchy.orphans.push(index);
                    }
                    OrphanPolicy::PromoteToRoot => {
                        debug!("Promoting orphan label '{}' to root", path);
                        hierarchy.orphans.push(index);
                        hierarchy.roots.push(index);
                    }
                    OrphanPolicy::Error => {
                        return Err(GmailError::HierarchyError(format!(
                            "label '{}' has no parent label named '{}'",
                            path,
                            parent_short_name(path).unwrap_or_default()
                        )));
                    }
                },
            }
        }
    }

    Ok(hierarchy)
}
