//! # Normalization
//!
//! Every applied operation marks the nodes it touched (and their ancestors)
//! dirty. Held dirty paths are mapped through each later operation, so they
//! keep pointing at the same nodes. When the outermost command finishes the
//! list is drained from the end, which visits descendants before their
//! ancestors and the most recent edits first.
//!
//! Each dirty node is brought to a fixpoint: validate, repair, find the node
//! again (its path may have shifted), validate again. A node that is still
//! invalid after `rules + children + iteration_floor` repairs means the
//! schema's repairs do not converge, and is reported as
//! [`EditorError::NormalizationDiverged`].

use crate::editor::Editor;
use crate::errors::{EditorError, EditorResult};
use quire_model::{NodesOptions, Operation, Path};
use tracing::{debug, instrument, warn};

impl Editor {
    /// Normalize the whole document
    #[instrument(skip(self))]
    pub fn normalize(&mut self) -> EditorResult<()> {
        self.command(|editor| {
            let paths: Vec<Path> = editor
                .value
                .document
                .entries(NodesOptions {
                    include_root: true,
                    ..Default::default()
                })
                .map(|(_, path)| path)
                .collect();
            editor.dirty.extend(paths);
            Ok(())
        })
    }

    /// Repair the node at `path` until it satisfies the schema
    pub fn normalize_node_by_path(&mut self, path: &Path) -> EditorResult<()> {
        let schema = self.schema_handle();
        let mut path = path.clone();
        let Some(node) = self.value.document.get_node(&path) else {
            return Ok(());
        };

        let mut key = node.key().clone();
        let max = schema.rules().len() + node.nodes().len() + self.config().iteration_floor;
        let mut iterations = 0;

        loop {
            let Some(node) = self.value.document.get_node(&path) else {
                break;
            };
            let Some(violation) = schema.validate_node(self, node, &path) else {
                break;
            };

            iterations += 1;
            if iterations > max {
                warn!(path = %path, code = violation.code(), iterations, "normalization diverged");
                return Err(EditorError::NormalizationDiverged { path, iterations: max });
            }

            debug!(rule = violation.rule, code = violation.code(), path = %violation.path, "repair");
            schema.normalize(self, &violation)?;

            // Find the node again; the repair may have moved or removed it.
            let document = &self.value.document;
            match document.get_node(&path) {
                Some(found) if found.key() == &key => {}
                _ => match document.path_by_key(&key) {
                    Some(found) => path = found,
                    None => break,
                },
            }
            if let Some(node) = document.get_node(&path) {
                key = node.key().clone();
            }
        }

        Ok(())
    }

    pub(crate) fn normalize_dirty_paths(&mut self) -> EditorResult<()> {
        if !self.context.normalize || self.dirty.is_empty() {
            return Ok(());
        }

        // Repairs run as nested commands so they join the current batch and
        // do not trigger normalization of their own.
        self.depth += 1;
        let result = self.drain_dirty_paths();
        self.depth -= 1;

        if result.is_err() {
            self.dirty.clear();
        }
        result
    }

    fn drain_dirty_paths(&mut self) -> EditorResult<()> {
        while let Some(path) = self.dirty.pop() {
            if self.value.document.has_node(&path) {
                self.normalize_node_by_path(&path)?;
            }
        }
        Ok(())
    }

    pub(crate) fn track_dirty_paths(&mut self, op: &Operation) {
        let mut dirty: Vec<Path> = self.dirty.iter().filter_map(|p| p.transform(op)).collect();
        for path in dirty_paths(op) {
            if !dirty.contains(&path) {
                dirty.push(path);
            }
        }
        self.dirty = dirty;
    }
}

/// The paths an operation may have made invalid, ancestors first
fn dirty_paths(op: &Operation) -> Vec<Path> {
    match op {
        Operation::InsertText { path, .. }
        | Operation::RemoveText { path, .. }
        | Operation::AddMark { path, .. }
        | Operation::RemoveMark { path, .. }
        | Operation::SetMark { path, .. }
        | Operation::SetNode { path, .. } => with_ancestors(path),

        Operation::InsertNode { path, node } => {
            let mut paths = with_ancestors(path);
            paths.extend(node.entries(NodesOptions::default()).map(|(_, p)| path.concat(&p)));
            paths
        }

        Operation::SplitNode { path, .. } => {
            let mut paths = with_ancestors(path);
            paths.extend(path.next());
            paths
        }

        Operation::MergeNode { path, .. } => {
            let mut paths = path.ancestors();
            paths.extend(path.previous());
            paths
        }

        Operation::MoveNode { path, new_path } => {
            if path == new_path {
                return Vec::new();
            }
            let mut paths: Vec<Path> = path.ancestors().iter().filter_map(|p| p.transform(op)).collect();
            if let Some(landing) = path.transform(op) {
                for ancestor in landing.ancestors() {
                    if !paths.contains(&ancestor) {
                        paths.push(ancestor);
                    }
                }
            }
            paths
        }

        Operation::RemoveNode { path, .. } => path.ancestors(),

        Operation::SetSelection { .. } | Operation::SetValue { .. } => Vec::new(),
    }
}

fn with_ancestors(path: &Path) -> Vec<Path> {
    let mut paths = path.ancestors();
    paths.push(path.clone());
    paths
}
