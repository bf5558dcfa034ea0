//! # Editor
//!
//! Owns the current [`Value`] and is the only way it changes. Every change
//! goes through [`Editor::apply_operation`], which:
//!
//! 1. applies the operation to produce the next value
//! 2. maps held dirty paths through it and records the nodes it touched
//! 3. saves it to history, merging into the open batch when appropriate
//! 4. keeps the selection pointing at live text across structural edits
//!
//! Commands are nested calls that apply operations. When the outermost
//! command returns, the dirty paths are normalized against the schema.
//!
//! ## Edit context
//!
//! Normalization, history saving and batch merging can be suspended for
//! the duration of a callback. The previous context is restored when the
//! callback returns, whether it succeeded or not.
//!
//! ```rust,ignore
//! editor.without_normalizing(|editor| {
//!     editor.split_node_by_path(&path, 2)?;
//!     editor.insert_node_by_path(&parent, 1, node)
//! })?;
//! ```

use crate::config::EditorConfig;
use crate::errors::EditorResult;
use crate::plugin::{Chain, Next, Plugin};
use crate::schema::Schema;
use quire_model::{
    should_merge, Affinity, Data, History, Mark, Node, Operation, Path, Point, Range, Selection, Value,
    ValueProperties,
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument, trace};

/// Flags that scope how operations are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditContext {
    /// Normalize dirty paths when the outermost command finishes
    pub normalize: bool,

    /// Record operations in history
    pub save: bool,

    /// Force merging into (`Some(true)`) or splitting from (`Some(false)`)
    /// the open history batch
    pub merge: Option<bool>,

    /// Replaying history: the operations already carry their own selection
    /// changes
    pub(crate) replaying: bool,
}

impl Default for EditContext {
    fn default() -> Self {
        Self {
            normalize: true,
            save: true,
            merge: None,
            replaying: false,
        }
    }
}

pub struct Editor {
    pub(crate) value: Value,
    config: EditorConfig,
    schema: Arc<Schema>,
    chain: Chain,
    pub(crate) context: EditContext,

    /// Paths still to be normalized, deepest and most recent last
    pub(crate) dirty: Vec<Path>,

    /// Operations applied by the current (or last) outermost command
    operations: Vec<Operation>,

    /// Nesting depth of commands
    pub(crate) depth: usize,

    /// Operations saved to history by the current outermost command
    command_saved: usize,
}

pub struct EditorBuilder {
    value: Value,
    schema: Option<Schema>,
    plugins: Vec<Arc<dyn Plugin>>,
    config: EditorConfig,
}

impl EditorBuilder {
    pub fn schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Add a plugin after those already added. Earlier plugins are asked
    /// first.
    pub fn plugin(mut self, plugin: impl Plugin + 'static) -> Self {
        self.plugins.push(Arc::new(plugin));
        self
    }

    pub fn config(mut self, config: EditorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn normalize_on_create(mut self, normalize: bool) -> Self {
        self.config.normalize_on_create = normalize;
        self
    }

    pub fn build(self) -> EditorResult<Editor> {
        let schema = Arc::new(self.schema.unwrap_or_default());
        let mut plugins = self.plugins;
        plugins.push(schema.clone());

        let mut value = self.value;
        if value.history.limit() != self.config.history_limit {
            value.history = History::new(self.config.history_limit);
        }

        let mut editor = Editor {
            value,
            config: self.config,
            schema,
            chain: plugins.into(),
            context: EditContext::default(),
            dirty: Vec::new(),
            operations: Vec::new(),
            depth: 0,
            command_saved: 0,
        };

        if editor.config.normalize_on_create {
            editor.without_saving(|editor| editor.normalize())?;
        }
        Ok(editor)
    }
}

impl Editor {
    /// An editor with the core schema, no plugins and the default config
    pub fn new(value: Value) -> EditorResult<Self> {
        Self::builder(value).build()
    }

    pub fn builder(value: Value) -> EditorBuilder {
        EditorBuilder {
            value,
            schema: None,
            plugins: Vec::new(),
            config: EditorConfig::default(),
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    pub fn document(&self) -> &Node {
        &self.value.document
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.value.selection.as_ref()
    }

    pub fn history(&self) -> &History {
        &self.value.history
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub(crate) fn schema_handle(&self) -> Arc<Schema> {
        self.schema.clone()
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn context(&self) -> EditContext {
        self.context
    }

    /// Operations applied by the most recent command, including the
    /// normalization it triggered
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    // -- hooks --------------------------------------------------------------

    pub fn is_void(&self, node: &Node) -> bool {
        Next::new(self.chain.clone()).is_void(self, node)
    }

    pub fn is_inline(&self, node: &Node) -> bool {
        Next::new(self.chain.clone()).is_inline(self, node)
    }

    pub fn is_atomic(&self, mark: &Mark) -> bool {
        Next::new(self.chain.clone()).is_atomic(self, mark)
    }

    pub(crate) fn chain(&self) -> Chain {
        self.chain.clone()
    }

    // -- scopes -------------------------------------------------------------

    fn scoped<T>(
        &mut self,
        update: impl FnOnce(&mut EditContext),
        f: impl FnOnce(&mut Self) -> EditorResult<T>,
    ) -> EditorResult<T> {
        let saved = self.context;
        update(&mut self.context);
        let result = f(self);
        self.context = saved;
        result
    }

    /// Apply several changes and normalize once at the end
    pub fn without_normalizing<T>(&mut self, f: impl FnOnce(&mut Self) -> EditorResult<T>) -> EditorResult<T> {
        self.command(|editor| editor.scoped(|c| c.normalize = false, f))
    }

    /// Apply changes that are not recorded in history
    pub fn without_saving<T>(&mut self, f: impl FnOnce(&mut Self) -> EditorResult<T>) -> EditorResult<T> {
        self.scoped(|c| c.save = false, f)
    }

    /// Start a new history batch with the first saved operation
    pub fn without_merging<T>(&mut self, f: impl FnOnce(&mut Self) -> EditorResult<T>) -> EditorResult<T> {
        self.scoped(|c| c.merge = Some(false), f)
    }

    /// Add every saved operation to the open history batch
    pub fn with_merging<T>(&mut self, f: impl FnOnce(&mut Self) -> EditorResult<T>) -> EditorResult<T> {
        self.scoped(|c| c.merge = Some(true), f)
    }

    pub(crate) fn replaying<T>(&mut self, f: impl FnOnce(&mut Self) -> EditorResult<T>) -> EditorResult<T> {
        self.scoped(|c| c.replaying = true, f)
    }

    /// Run `f` as one command. Dirty paths are normalized when the
    /// outermost command returns successfully.
    pub fn command<T>(&mut self, f: impl FnOnce(&mut Self) -> EditorResult<T>) -> EditorResult<T> {
        if self.depth == 0 {
            self.operations.clear();
            self.command_saved = 0;
        }

        self.depth += 1;
        let result = f(self);
        self.depth -= 1;

        let output = result?;
        if self.depth == 0 {
            self.normalize_dirty_paths()?;
        }
        Ok(output)
    }

    // -- applying -----------------------------------------------------------

    #[instrument(skip(self, op), fields(kind = op.kind()))]
    pub fn apply_operation(&mut self, op: Operation) -> EditorResult<()> {
        self.command(|editor| editor.apply(op))
    }

    pub(crate) fn apply(&mut self, op: Operation) -> EditorResult<()> {
        let next = op.apply(&self.value)?;
        trace!(kind = op.kind(), path = ?op.path(), "applied");

        self.value = next;
        self.track_dirty_paths(&op);
        self.save_operation(&op);
        self.operations.push(op.clone());

        if op.is_structural() && !self.context.replaying {
            self.maintain_selection(&op)?;
        }
        Ok(())
    }

    fn save_operation(&mut self, op: &Operation) {
        if !self.context.save {
            return;
        }

        // Moving the caret on its own is not an undoable edit.
        if matches!(op, Operation::SetSelection { .. }) && self.command_saved == 0 && self.context.merge.is_none() {
            return;
        }

        let merge = match self.context.merge {
            Some(merge) => merge,
            None if self.command_saved > 0 => true,
            None => {
                self.config.merge_typing
                    && self
                        .value
                        .history
                        .last_operation()
                        .is_some_and(|last| should_merge(last, op))
            }
        };

        let merged = self.value.history.save(op.clone(), merge);
        self.command_saved += 1;
        if !merged {
            debug!(kind = op.kind(), undos = self.value.history.undos().len(), "opened history batch");
        }
    }

    /// Keep both selection points on live text after `op`. A point whose
    /// text was removed moves to the end of the text before it, or failing
    /// that the start of the text after it.
    fn maintain_selection(&mut self, op: &Operation) -> EditorResult<()> {
        let Some(selection) = self.value.selection.clone() else {
            return Ok(());
        };

        let (anchor_affinity, focus_affinity) = selection.range().affinities();
        let anchor = self.transform_point(&selection.anchor, op, anchor_affinity);
        let focus = self.transform_point(&selection.focus, op, focus_affinity);

        let next = match (anchor, focus) {
            (Some(anchor), Some(focus)) => Some(selection.with_range(Range::new(anchor, focus))),
            _ => None,
        };

        if next.as_ref() != Some(&selection) {
            self.apply(Operation::SetSelection {
                properties: Some(selection),
                new_properties: next,
            })?;
        }
        Ok(())
    }

    fn transform_point(&self, point: &Point, op: &Operation, affinity: Affinity) -> Option<Point> {
        if let Some(point) = point.transform_with(op, affinity) {
            return Some(point);
        }

        let removed = op.path()?;
        let document = &self.value.document;
        let before = document.texts().take_while(|(_, p)| p < removed).last();
        if let Some((text, path)) = before {
            return Some(Point::new(path, text.len()));
        }
        document
            .texts()
            .find(|(_, p)| p >= removed)
            .map(|(_, path)| Point::new(path, 0))
    }

    /// Replace the value-level data
    pub fn set_data(&mut self, data: Data) -> EditorResult<()> {
        let properties = self.value.properties();
        self.apply_operation(Operation::SetValue {
            properties,
            new_properties: ValueProperties { data: Some(data) },
        })
    }
}

impl fmt::Debug for Editor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Editor")
            .field("value", &self.value)
            .field("config", &self.config)
            .field("plugins", &(self.chain.len() - 1))
            .field("context", &self.context)
            .field("dirty", &self.dirty)
            .field("depth", &self.depth)
            .finish()
    }
}
