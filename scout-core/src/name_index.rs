//! The basename index.
//!
//! A byte-wise trie from file/directory basename to the set of path
//! tree nodes carrying that name anywhere in the tree. Prefix queries
//! descend to the prefix and enumerate the subtrie; substring queries
//! have no sublinear shortcut on a prefix trie and scan every stored
//! name.
//!
//! The per-name node sets are unordered: insertion appends, removal
//! swap-removes. Nothing downstream depends on their order (the query
//! engine re-sorts results unless asked not to).

use crate::error::Result;
use crate::tree::{NodeId, PathTree};
use std::collections::BTreeMap;

#[derive(Debug, Default)]
struct TrieNode {
    children: BTreeMap<u8, TrieNode>,
    /// Path tree nodes whose basename is spelled by the trie path down
    /// to this node.
    nodes: Vec<NodeId>,
}

/// Basename to node-set index.
#[derive(Debug, Default)]
pub struct NameIndex {
    root: TrieNode,
    entries: usize,
}

impl NameIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of indexed entries (not distinct names).
    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Records `node` under `name`. Nodes sharing a basename accumulate
    /// in one set.
    pub fn insert(&mut self, name: &str, node: NodeId) {
        let mut current = &mut self.root;
        for byte in name.bytes() {
            current = current.children.entry(byte).or_default();
        }
        current.nodes.push(node);
        self.entries += 1;
    }

    /// Removes the entry under `name` whose tree node reconstructs to
    /// exactly `path`. Returns whether anything was removed.
    ///
    /// This is a linear scan of the name's node set; collisions on one
    /// basename are rare in practice so the scan stays cheap. Emptied
    /// trie branches are pruned on the way back up.
    pub fn remove(&mut self, name: &str, path: &str, tree: &PathTree) -> bool {
        let mut removed = false;
        remove_rec(&mut self.root, name.as_bytes(), path, tree, &mut removed);
        if removed {
            self.entries -= 1;
        }
        removed
    }

    /// Invokes `visitor` with every stored name beginning with `prefix`
    /// and its node set.
    pub fn visit_prefix<F>(&self, prefix: &str, visitor: &mut F) -> Result<()>
    where
        F: FnMut(&str, &[NodeId]) -> Result<()>,
    {
        let mut current = &self.root;
        for byte in prefix.bytes() {
            match current.children.get(&byte) {
                Some(child) => current = child,
                None => return Ok(()),
            }
        }

        let mut name = prefix.as_bytes().to_vec();
        visit_subtrie(current, &mut name, visitor)
    }

    /// Invokes `visitor` with every stored name containing `needle`
    /// anywhere, case-folded on both sides when requested.
    pub fn visit_substring<F>(
        &self,
        needle: &str,
        case_insensitive: bool,
        visitor: &mut F,
    ) -> Result<()>
    where
        F: FnMut(&str, &[NodeId]) -> Result<()>,
    {
        let needle = if case_insensitive {
            needle.to_ascii_lowercase()
        } else {
            needle.to_string()
        };

        let mut name = Vec::new();
        visit_matching(&self.root, &mut name, &needle, case_insensitive, visitor)
    }
}

/// Returns whether `node` ended up empty and can be pruned by its
/// parent.
fn remove_rec(
    node: &mut TrieNode,
    key: &[u8],
    path: &str,
    tree: &PathTree,
    removed: &mut bool,
) -> bool {
    match key.split_first() {
        None => {
            if let Some(pos) = node.nodes.iter().position(|&n| tree.path_of(n) == path) {
                node.nodes.swap_remove(pos);
                *removed = true;
            }
        }
        Some((&byte, rest)) => {
            if let Some(child) = node.children.get_mut(&byte) {
                if remove_rec(child, rest, path, tree, removed) {
                    node.children.remove(&byte);
                }
            }
        }
    }
    node.nodes.is_empty() && node.children.is_empty()
}

fn visit_subtrie<F>(node: &TrieNode, name: &mut Vec<u8>, visitor: &mut F) -> Result<()>
where
    F: FnMut(&str, &[NodeId]) -> Result<()>,
{
    if !node.nodes.is_empty() {
        visitor(&String::from_utf8_lossy(name), &node.nodes)?;
    }
    for (&byte, child) in &node.children {
        name.push(byte);
        visit_subtrie(child, name, visitor)?;
        name.pop();
    }
    Ok(())
}

fn visit_matching<F>(
    node: &TrieNode,
    name: &mut Vec<u8>,
    needle: &str,
    case_insensitive: bool,
    visitor: &mut F,
) -> Result<()>
where
    F: FnMut(&str, &[NodeId]) -> Result<()>,
{
    if !node.nodes.is_empty() {
        let text = String::from_utf8_lossy(name);
        let hit = if case_insensitive {
            text.to_ascii_lowercase().contains(needle)
        } else {
            text.contains(needle)
        };
        if hit {
            visitor(&text, &node.nodes)?;
        }
    }
    for (&byte, child) in &node.children {
        name.push(byte);
        visit_matching(child, name, needle, case_insensitive, visitor)?;
        name.pop();
    }
    Ok(())
}
