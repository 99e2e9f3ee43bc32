//! Index reconciliation and initial population.
//!
//! The reconciler keeps the path tree and name index consistent with
//! one directory's actual on-disk listing after a change notification:
//! re-list, diff against the recorded children, apply the minimal set
//! of insertions and deletions. The same walk-and-filter logic builds
//! the whole index at startup.

use crate::engine::IndexEngine;
use crate::error::{IndexError, Result};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Summary of the startup scan, reported for observability.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScanStats {
    pub files: u64,
    pub directories: u64,
    pub duration_ms: u64,
}

impl IndexEngine {
    /// Builds the initial index with one full recursive scan from
    /// `root`, applying the exclusion policy to every candidate path.
    pub fn scan(&mut self, root: &str) -> ScanStats {
        info!("starting initial scan of {root}");
        let start = Instant::now();
        let (files, directories) = self.insert_subtree(root);
        let duration = start.elapsed();
        info!(
            "indexed {} files and {} directories in {:.2?}",
            files, directories, duration
        );
        ScanStats {
            files,
            directories,
            duration_ms: duration.as_millis() as u64,
        }
    }

    /// Re-lists `dir` and applies the minimal diff against the recorded
    /// children.
    ///
    /// The change kind that triggered this call is advisory; the fresh
    /// listing is the ground truth. An unreadable directory is treated
    /// as empty for this pass and self-heals on the next notification.
    /// Replayed or reordered notifications (e.g. the two halves of a
    /// rename) converge because the diff is computed against live
    /// state.
    pub fn refresh_directory(&mut self, dir: &str) {
        debug!("refreshing directory {dir}");

        let current = match self.list_directory(dir) {
            Ok(current) => current,
            Err(err) => {
                // Treated as an empty listing for this pass.
                warn!("{err}");
                HashMap::new()
            }
        };

        // A directory the tree doesn't know yet has no recorded
        // children; everything listed counts as created.
        let recorded: HashSet<String> = self
            .tree
            .children_of(dir)
            .map(|children| children.into_iter().collect())
            .unwrap_or_default();

        let created: Vec<String> = current
            .keys()
            .filter(|name| !recorded.contains(*name))
            .cloned()
            .collect();
        let deleted: Vec<String> = recorded
            .iter()
            .filter(|name| !current.contains_key(*name))
            .cloned()
            .collect();

        if !created.is_empty() {
            debug!("indexing new entries {created:?}");
        }
        if !deleted.is_empty() {
            debug!("removing deleted entries {deleted:?}");
        }

        for name in &created {
            let full = join_path(dir, name);
            if current[name] {
                self.insert_subtree(&full);
            } else {
                self.insert_leaf(&full);
            }
        }

        for name in &deleted {
            let full = join_path(dir, name);
            // Index entries go first so a lookup never observes a node
            // the tree has already dropped.
            self.remove_subtree_from_index(dir, name);
            if let Err(err) = self.tree.delete_at(&full) {
                debug!("nothing to delete at {full}: {err}");
            }
        }
    }

    /// Lists a directory's current content as name -> is_dir, with the
    /// exclusion policy already applied.
    fn list_directory(&self, dir: &str) -> Result<HashMap<String, bool>> {
        let entries =
            fs::read_dir(dir).map_err(|source| IndexError::DirectoryUnreadable {
                path: PathBuf::from(dir),
                source,
            })?;

        let mut current = HashMap::new();
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            let full = join_path(dir, &name);
            if self.filter.is_excluded(&full) {
                debug!("ignoring filtered entry {full}");
                continue;
            }
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            current.insert(name, is_dir);
        }
        Ok(current)
    }

    /// Inserts a single file into both structures.
    fn insert_leaf(&mut self, path: &str) {
        let node = self.tree.add(path);
        let name = basename(path);
        if !name.is_empty() {
            self.names.insert(name, node);
        }
    }

    /// Walks `root` and inserts every discovered file and directory,
    /// applying the exclusion policy per path. Unreadable entries are
    /// logged and skipped. Returns (files, directories) inserted or
    /// revisited.
    fn insert_subtree(&mut self, root: &str) -> (u64, u64) {
        let Self {
            tree,
            names,
            filter,
        } = self;

        let mut files = 0;
        let mut directories = 0;

        let walker = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| !filter.is_excluded(&entry.path().to_string_lossy()));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("skipping unreadable entry: {err}");
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                directories += 1;
            } else {
                files += 1;
            }

            let path = entry.path().to_string_lossy();
            let node = tree.add(&path);
            let name = basename(&path);
            if !name.is_empty() {
                names.insert(name, node);
            }
        }

        (files, directories)
    }

    /// Removes `name` under `parent` and every descendant from the
    /// name index, leaves first via the recorded tree children.
    fn remove_subtree_from_index(&mut self, parent: &str, name: &str) {
        let full = join_path(parent, name);
        {
            let Self { tree, names, .. } = self;
            names.remove(name, &full, tree);
        }

        let children = match self.tree.children_of(&full) {
            Ok(children) => children,
            Err(_) => return,
        };
        for child in children {
            self.remove_subtree_from_index(&full, &child);
        }
    }
}

fn join_path(dir: &str, name: &str) -> String {
    if dir.ends_with('/') {
        format!("{dir}{name}")
    } else {
        format!("{dir}/{name}")
    }
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FilterConfig, PathFilter};
    use crate::tree::NodeId;
    use std::fs;
    use tempfile::tempdir;

    fn engine() -> IndexEngine {
        IndexEngine::new(PathFilter::allow_all())
    }

    fn indexed_nodes(engine: &IndexEngine, name: &str) -> Vec<String> {
        let mut paths = Vec::new();
        engine
            .names
            .visit_prefix(name, &mut |found, nodes| {
                if found == name {
                    for &n in nodes {
                        paths.push(engine.tree.path_of(n));
                    }
                }
                Ok(())
            })
            .unwrap();
        paths.sort();
        paths
    }

    /// Every name index entry must resolve through the tree, and the
    /// reconstructed path must resolve back to the same node.
    fn assert_cross_consistency(engine: &IndexEngine) {
        let mut entries: Vec<(String, NodeId)> = Vec::new();
        engine
            .names
            .visit_prefix("", &mut |name, nodes| {
                for &n in nodes {
                    entries.push((name.to_string(), n));
                }
                Ok(())
            })
            .unwrap();

        for (name, node) in entries {
            let path = engine.tree.path_of(node);
            assert!(path.ends_with(&name), "entry '{name}' has path '{path}'");
            let resolved = engine.tree.resolve(&path).expect("dangling index entry");
            assert_eq!(resolved, node);
        }
    }

    #[test]
    fn test_scan_indexes_everything() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("a.txt"), "").unwrap();
        fs::write(dir.path().join("sub/b.txt"), "").unwrap();

        let mut engine = engine();
        let stats = engine.scan(&dir.path().to_string_lossy());

        assert_eq!(stats.files, 2);
        assert_eq!(stats.directories, 2); // the root itself and sub
        assert_eq!(indexed_nodes(&engine, "a.txt").len(), 1);
        assert_eq!(indexed_nodes(&engine, "b.txt").len(), 1);
        assert_cross_consistency(&engine);
    }

    #[test]
    fn test_scan_applies_exclusions() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("node_modules")).unwrap();
        fs::write(dir.path().join("node_modules/dep.js"), "").unwrap();
        fs::write(dir.path().join("keep.js"), "").unwrap();

        let filter = PathFilter::compile(&FilterConfig {
            substrings: vec!["node_modules".into()],
            ..Default::default()
        })
        .unwrap();
        let mut engine = IndexEngine::new(filter);
        let stats = engine.scan(&dir.path().to_string_lossy());

        assert_eq!(stats.files, 1);
        assert!(indexed_nodes(&engine, "dep.js").is_empty());
        assert_eq!(indexed_nodes(&engine, "keep.js").len(), 1);
    }

    #[test]
    fn test_refresh_applies_minimal_diff() {
        let dir = tempdir().unwrap();
        for name in ["a", "b", "c"] {
            fs::write(dir.path().join(name), "").unwrap();
        }

        let mut engine = engine();
        let root = dir.path().to_string_lossy().into_owned();
        engine.scan(&root);

        // {a, b, c} -> {a, c, d}
        fs::remove_file(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("d"), "").unwrap();
        engine.refresh_directory(&root);

        let mut children = engine.tree.children_of(&root).unwrap();
        children.sort();
        assert_eq!(children, vec!["a", "c", "d"]);

        assert!(indexed_nodes(&engine, "b").is_empty());
        assert_eq!(indexed_nodes(&engine, "d").len(), 1);
        // Untouched entries stayed put.
        assert_eq!(indexed_nodes(&engine, "a").len(), 1);
        assert_eq!(indexed_nodes(&engine, "c").len(), 1);
        assert_cross_consistency(&engine);
    }

    #[test]
    fn test_refresh_is_idempotent() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("same.txt"), "").unwrap();

        let mut engine = engine();
        let root = dir.path().to_string_lossy().into_owned();
        engine.scan(&root);
        let entries_before = engine.names.len();

        engine.refresh_directory(&root);
        engine.refresh_directory(&root);

        assert_eq!(engine.names.len(), entries_before);
        assert_cross_consistency(&engine);
    }

    #[test]
    fn test_refresh_unknown_directory_indexes_it() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("late.txt"), "").unwrap();

        // No prior scan: the tree knows nothing about this directory.
        let mut engine = engine();
        engine.refresh_directory(&dir.path().to_string_lossy());

        assert_eq!(indexed_nodes(&engine, "late.txt").len(), 1);
        assert_cross_consistency(&engine);
    }

    #[test]
    fn test_refresh_created_directory_indexes_whole_subtree() {
        let dir = tempdir().unwrap();
        let mut engine = engine();
        let root = dir.path().to_string_lossy().into_owned();
        engine.scan(&root);

        fs::create_dir_all(dir.path().join("new/deep")).unwrap();
        fs::write(dir.path().join("new/deep/leaf.txt"), "").unwrap();
        engine.refresh_directory(&root);

        assert_eq!(indexed_nodes(&engine, "leaf.txt").len(), 1);
        assert_eq!(indexed_nodes(&engine, "deep").len(), 1);
        assert_cross_consistency(&engine);
    }

    #[test]
    fn test_refresh_deleted_directory_removes_whole_subtree() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("gone/deep")).unwrap();
        fs::write(dir.path().join("gone/deep/leaf.txt"), "").unwrap();

        let mut engine = engine();
        let root = dir.path().to_string_lossy().into_owned();
        engine.scan(&root);
        assert_eq!(indexed_nodes(&engine, "leaf.txt").len(), 1);

        fs::remove_dir_all(dir.path().join("gone")).unwrap();
        engine.refresh_directory(&root);

        assert!(indexed_nodes(&engine, "gone").is_empty());
        assert!(indexed_nodes(&engine, "deep").is_empty());
        assert!(indexed_nodes(&engine, "leaf.txt").is_empty());
        assert_cross_consistency(&engine);
    }

    #[test]
    fn test_refresh_vanished_directory_empties_it() {
        let dir = tempdir().unwrap();
        let victim = dir.path().join("victim");
        fs::create_dir(&victim).unwrap();
        fs::write(victim.join("x"), "").unwrap();

        let mut engine = engine();
        let root = dir.path().to_string_lossy().into_owned();
        engine.scan(&root);

        fs::remove_dir_all(&victim).unwrap();
        // The directory itself is gone: re-listing fails, the pass
        // treats it as empty and drops its recorded children.
        engine.refresh_directory(&victim.to_string_lossy());

        assert!(indexed_nodes(&engine, "x").is_empty());
        // The victim node itself disappears once its parent refreshes.
        engine.refresh_directory(&root);
        assert!(indexed_nodes(&engine, "victim").is_empty());
        assert_cross_consistency(&engine);
    }

    #[test]
    fn test_join_path_handles_root() {
        assert_eq!(join_path("/", "usr"), "/usr");
        assert_eq!(join_path("/usr", "bin"), "/usr/bin");
    }

    #[test]
    fn test_basename() {
        assert_eq!(basename("/usr/bin/grep"), "grep");
        assert_eq!(basename("plain"), "plain");
    }
}
