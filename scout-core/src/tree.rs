//! The path tree.
//!
//! An arena-backed tree mirroring the directory namespace: one node per
//! path segment, children referenced by arena index, the parent kept as
//! a non-owning back-reference used only to rebuild full paths. Each
//! node aggregates a character-presence mask of its entire subtree's
//! names (see [`crate::mask`]); the invariant is that a node's mask
//! equals the OR of its own name's mask and all of its descendants'
//! masks after every mutation.
//!
//! Fuzzy search lives here too, since it walks the tree directly rather
//! than the basename index: a query matches a path when its characters
//! appear in the path in order, and the subtree masks let the matcher
//! discard whole subtrees without reading a single name.

use crate::error::{IndexError, Result};
use crate::mask::{bytes_mask, fold_case, name_mask};
use std::path::PathBuf;

/// Index of a node in the tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// One path segment and its subtree summary.
#[derive(Debug)]
pub struct PathNode {
    /// Segment name. Empty for the root.
    name: String,
    /// OR of this name's mask and every descendant's mask.
    subtree_mask: u64,
    /// Back-reference for path reconstruction only; never used for
    /// traversal or ownership.
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// The directory tree. Nodes live in an indexable arena; slots of
/// deleted subtrees are recycled through a free list.
pub struct PathTree {
    nodes: Vec<PathNode>,
    free: Vec<NodeId>,
    root: NodeId,
}

impl Default for PathTree {
    fn default() -> Self {
        Self::new()
    }
}

impl PathTree {
    /// Creates a tree containing only the root.
    pub fn new() -> Self {
        let root = PathNode {
            name: String::new(),
            subtree_mask: 0,
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![root],
            free: Vec::new(),
            root: NodeId(0),
        }
    }

    /// The root node, representing `/`.
    pub fn root(&self) -> NodeId {
        self.root
    }

    fn node(&self, id: NodeId) -> &PathNode {
        &self.nodes[id.index()]
    }

    fn find_child(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.node(id)
            .children
            .iter()
            .copied()
            .find(|&child| self.node(child).name == name)
    }

    fn alloc(&mut self, name: &str, parent: NodeId) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                let node = &mut self.nodes[id.index()];
                node.name.clear();
                node.name.push_str(name);
                node.subtree_mask = name_mask(name);
                node.parent = Some(parent);
                node.children.clear();
                id
            }
            None => {
                let id = NodeId(self.nodes.len() as u32);
                self.nodes.push(PathNode {
                    name: name.to_string(),
                    subtree_mask: name_mask(name),
                    parent: Some(parent),
                    children: Vec::new(),
                });
                id
            }
        }
    }

    /// Inserts `path` into the tree, creating missing segments, and
    /// returns the leaf node. Idempotent: adding an existing path
    /// returns the existing node without duplicating structure.
    ///
    /// Every node walked unions in the mask of the path suffix below
    /// it, so ancestor masks always cover their full subtree content.
    pub fn add(&mut self, path: &str) -> NodeId {
        let parts: Vec<&str> = segments(path).collect();

        // suffix_masks[i] covers parts[i..].
        let mut suffix_masks = vec![0u64; parts.len() + 1];
        for i in (0..parts.len()).rev() {
            suffix_masks[i] = suffix_masks[i + 1] | name_mask(parts[i]);
        }

        let mut current = self.root;
        for (i, part) in parts.iter().enumerate() {
            self.nodes[current.index()].subtree_mask |= suffix_masks[i];
            current = match self.find_child(current, part) {
                Some(child) => child,
                None => {
                    let child = self.alloc(part, current);
                    self.nodes[current.index()].children.push(child);
                    child
                }
            };
        }
        current
    }

    /// Resolves a path to its node, or `InvalidPath` if any segment is
    /// missing.
    pub fn resolve(&self, path: &str) -> Result<NodeId> {
        let mut current = self.root;
        for part in segments(path) {
            current = self
                .find_child(current, part)
                .ok_or_else(|| IndexError::InvalidPath(PathBuf::from(path)))?;
        }
        Ok(current)
    }

    /// Returns the immediate child segment names of the directory at
    /// `path`. No ordering guarantee.
    pub fn children_of(&self, path: &str) -> Result<Vec<String>> {
        let id = self.resolve(path)?;
        Ok(self
            .node(id)
            .children
            .iter()
            .map(|&child| self.node(child).name.clone())
            .collect())
    }

    /// Removes the node named by the final segment of `path`, detaching
    /// its whole subtree, then recomputes subtree masks bottom-up along
    /// the surviving parent chain. Fails with `InvalidPath` when the
    /// path does not resolve.
    pub fn delete_at(&mut self, path: &str) -> Result<()> {
        let id = self.resolve(path)?;
        // The root has no parent and can't be deleted.
        let parent = self
            .node(id)
            .parent
            .ok_or_else(|| IndexError::InvalidPath(PathBuf::from(path)))?;

        let children = &mut self.nodes[parent.index()].children;
        if let Some(pos) = children.iter().position(|&child| child == id) {
            children.swap_remove(pos);
        }

        self.release(id);
        self.recompute_masks(parent);
        Ok(())
    }

    /// Returns detached slots to the free list.
    fn release(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = &mut self.nodes[current.index()];
            stack.append(&mut node.children);
            node.name.clear();
            node.subtree_mask = 0;
            node.parent = None;
            self.free.push(current);
        }
    }

    /// Recomputes masks from `from` up to the root, stopping early once
    /// a mask comes out unchanged. Masks may only shrink here; growth
    /// happens in `add`.
    fn recompute_masks(&mut self, from: NodeId) {
        let mut current = Some(from);
        while let Some(id) = current {
            let node = self.node(id);
            let mut mask = name_mask(&node.name);
            for &child in &node.children {
                mask |= self.node(child).subtree_mask;
            }

            let node = &mut self.nodes[id.index()];
            if node.subtree_mask == mask {
                break;
            }
            node.subtree_mask = mask;
            current = node.parent;
        }
    }

    /// Reconstructs the canonical absolute path of a node by walking
    /// parent back-references. O(depth).
    pub fn path_of(&self, id: NodeId) -> String {
        let mut parts = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.node(node_id);
            if node.parent.is_some() {
                parts.push(node.name.as_str());
            }
            current = node.parent;
        }

        let mut path = String::new();
        for part in parts.iter().rev() {
            path.push('/');
            path.push_str(part);
        }
        path
    }

    /// Depth-first traversal of a subtree. The visitor receives the
    /// full path of every node, starting with the subtree root itself.
    /// A visitor error stops the traversal.
    pub fn walk<F>(&self, id: NodeId, visitor: &mut F) -> Result<()>
    where
        F: FnMut(&str) -> Result<()>,
    {
        let base = self.path_of(id);
        self.walk_inner(id, &base, visitor)
    }

    fn walk_inner<F>(&self, id: NodeId, base: &str, visitor: &mut F) -> Result<()>
    where
        F: FnMut(&str) -> Result<()>,
    {
        visitor(base)?;
        for &child in &self.node(id).children {
            let child_path = format!("{}/{}", base, self.node(child).name);
            self.walk_inner(child, &child_path, visitor)?;
        }
        Ok(())
    }

    /// Fuzzy subsequence search over full paths.
    ///
    /// Work-list traversal: each frontier item greedily consumes the
    /// node's name against the still-unmatched query suffix. Once the
    /// whole query is consumed, every path in that node's subtree is a
    /// hit, scored by how many name characters had to be skipped after
    /// the match began (lower is tighter). Before descending, the
    /// remaining suffix's character mask is tested against the node's
    /// subtree mask; a missing bit proves no descendant can complete
    /// the match and the subtree is skipped without being read.
    pub fn visit_fuzzy<F>(&self, query: &str, case_insensitive: bool, visitor: &mut F) -> Result<()>
    where
        F: FnMut(&str, usize) -> Result<()>,
    {
        let query = query.as_bytes();
        let mut frontier = vec![Frontier {
            node: self.root,
            prefix: String::new(),
            offset: 0,
            skipped: 0,
        }];

        while let Some(mut item) = frontier.pop() {
            let node = self.node(item.node);
            let (matched, skipped) = fuzzy_match_count(
                node.name.as_bytes(),
                &query[item.offset..],
                item.offset,
                case_insensitive,
            );
            item.offset += matched;
            if item.offset != 0 {
                // Skips before anything has matched are free: unmatched
                // leading path segments don't worsen the score.
                item.skipped += skipped;
            }

            let full = if node.parent.is_none() {
                String::new()
            } else {
                format!("{}/{}", item.prefix, node.name)
            };

            if item.offset == query.len() {
                let score = item.skipped;
                self.walk_inner(item.node, &full, &mut |path| visitor(path, score))?;
                continue;
            }

            let needed = bytes_mask(&query[item.offset..]);
            let have = if case_insensitive {
                fold_case(node.subtree_mask)
            } else {
                node.subtree_mask
            };
            if have & needed != needed {
                continue;
            }

            for &child in &self.node(item.node).children {
                frontier.push(Frontier {
                    node: child,
                    prefix: full.clone(),
                    offset: item.offset,
                    skipped: item.skipped,
                });
            }
        }

        Ok(())
    }
}

/// One pending subtree of the fuzzy search.
struct Frontier {
    node: NodeId,
    /// Full path of the node's parent; empty for children of the root.
    prefix: String,
    /// How many query bytes have been consumed so far.
    offset: usize,
    /// Name bytes skipped since the match began.
    skipped: usize,
}

/// Greedily consumes `name` against the unmatched query suffix.
///
/// Returns how many query bytes were matched and how many name bytes
/// had to be skipped. Skips only count once the overall match has
/// begun; `offset` carries how much of the query ancestor segments
/// already matched.
fn fuzzy_match_count(
    name: &[u8],
    partial: &[u8],
    offset: usize,
    case_insensitive: bool,
) -> (usize, usize) {
    if partial.is_empty() {
        return (0, 0);
    }

    let mut count = 0;
    let mut skipped = 0;
    for &byte in name {
        let mut b = byte;
        let mut q = partial[count];
        if case_insensitive {
            b = b.to_ascii_lowercase();
            q = q.to_ascii_lowercase();
        }

        if b != q {
            if count + offset > 0 {
                skipped += 1;
            }
            continue;
        }

        count += 1;
        if count >= partial.len() {
            break;
        }
    }
    (count, skipped)
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|part| !part.is_empty())
}
