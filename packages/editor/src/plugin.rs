//! # Plugins
//!
//! Behaviour that embedders customize is exposed as hooks on the [`Plugin`]
//! trait. An editor holds an ordered list of plugins; each hook is called on
//! the first plugin with a [`Next`] continuation it may call to defer to the
//! rest of the list. The schema is always the innermost plugin and the
//! built-in behaviour answers when every plugin has deferred.
//!
//! ```text
//! plugins[0] ─next→ plugins[1] ─next→ ... ─next→ schema ─next→ core
//! ```

use crate::editor::Editor;
use crate::errors::EditorResult;
use quire_model::{Mark, Node};
use std::sync::Arc;

/// Content handed to the editor from outside, such as a paste or a drop
#[derive(Debug, Clone, PartialEq)]
pub enum TransferData {
    Text(String),
    Fragment(Node),
}

pub trait Plugin: Send + Sync {
    /// Whether `node` is an atomic, non-editable block or inline
    fn is_void(&self, editor: &Editor, node: &Node, next: Next) -> bool {
        next.is_void(editor, node)
    }

    fn is_inline(&self, editor: &Editor, node: &Node, next: Next) -> bool {
        next.is_inline(editor, node)
    }

    /// Whether typing at the edge of a run of `mark` should leave it behind
    fn is_atomic(&self, editor: &Editor, mark: &Mark, next: Next) -> bool {
        next.is_atomic(editor, mark)
    }

    fn insert_data(&self, editor: &mut Editor, data: &TransferData, next: Next) -> EditorResult<()> {
        next.insert_data(editor, data)
    }
}

pub(crate) type Chain = Arc<[Arc<dyn Plugin>]>;

/// The rest of the plugin list after the current plugin
#[derive(Clone)]
pub struct Next {
    chain: Chain,
    index: usize,
}

impl Next {
    pub(crate) fn new(chain: Chain) -> Self {
        Self { chain, index: 0 }
    }

    fn split(self) -> Option<(Arc<dyn Plugin>, Next)> {
        let plugin = self.chain.get(self.index)?.clone();
        let rest = Next {
            chain: self.chain,
            index: self.index + 1,
        };
        Some((plugin, rest))
    }

    pub fn is_void(self, editor: &Editor, node: &Node) -> bool {
        match self.split() {
            Some((plugin, next)) => plugin.is_void(editor, node, next),
            None => false,
        }
    }

    pub fn is_inline(self, editor: &Editor, node: &Node) -> bool {
        match self.split() {
            Some((plugin, next)) => plugin.is_inline(editor, node, next),
            None => node.is_inline(),
        }
    }

    pub fn is_atomic(self, editor: &Editor, mark: &Mark) -> bool {
        match self.split() {
            Some((plugin, next)) => plugin.is_atomic(editor, mark, next),
            None => false,
        }
    }

    pub fn insert_data(self, editor: &mut Editor, data: &TransferData) -> EditorResult<()> {
        match self.split() {
            Some((plugin, next)) => plugin.insert_data(editor, data, next),
            None => editor.core_insert_data(data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Rule, Schema, SchemaDefinition};
    use quire_model::{Object, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Images;

    impl Plugin for Images {
        fn is_void(&self, editor: &Editor, node: &Node, next: Next) -> bool {
            node.ty() == Some("image") || next.is_void(editor, node)
        }
    }

    /// Chips render as inline atoms of their own and need no caret padding
    struct FlatChips;

    impl Plugin for FlatChips {
        fn is_inline(&self, editor: &Editor, node: &Node, next: Next) -> bool {
            node.ty() != Some("chip") && next.is_inline(editor, node)
        }
    }

    struct Shout(Arc<AtomicUsize>);

    impl Plugin for Shout {
        fn insert_data(&self, editor: &mut Editor, data: &TransferData, next: Next) -> EditorResult<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            match data {
                TransferData::Text(text) => next.insert_data(editor, &TransferData::Text(text.to_uppercase())),
                other => next.insert_data(editor, other),
            }
        }
    }

    fn value() -> Value {
        Value::new(Node::document(vec![Node::block("paragraph", vec![Node::new_text("")])]))
    }

    #[test]
    fn test_plugin_answers_before_schema() {
        let mut definition = SchemaDefinition::default();
        definition.blocks.insert("video".into(), Rule::default().void(true));

        let editor = Editor::builder(value())
            .plugin(Images)
            .schema(Schema::new(definition))
            .build()
            .unwrap();

        assert!(editor.is_void(&Node::block("image", vec![])));
        assert!(editor.is_void(&Node::block("video", vec![])));
        assert!(!editor.is_void(&Node::block("paragraph", vec![])));
        assert!(editor.is_inline(&Node::inline("link", vec![])));
    }

    #[test]
    fn test_is_inline_answer_drives_normalization() {
        let value = || {
            Value::new(Node::document(vec![Node::block(
                "paragraph",
                vec![
                    Node::new_text("a"),
                    Node::inline("chip", vec![Node::new_text("x")]),
                    Node::inline("chip", vec![Node::new_text("")]),
                ],
            )]))
        };
        let kinds = |editor: &Editor| -> Vec<(Object, String)> {
            editor.document().nodes()[0]
                .nodes()
                .iter()
                .map(|node| (node.object(), node.text()))
                .collect()
        };

        // By default the empty chip goes and the other one gets padded.
        let plain = Editor::new(value()).unwrap();
        assert_eq!(
            kinds(&plain),
            vec![
                (Object::Text, "a".to_string()),
                (Object::Inline, "x".to_string()),
                (Object::Text, String::new()),
            ]
        );

        let flat = Editor::builder(value()).plugin(FlatChips).build().unwrap();
        assert!(!flat.is_inline(&Node::inline("chip", vec![])));
        assert_eq!(
            kinds(&flat),
            vec![
                (Object::Text, "a".to_string()),
                (Object::Inline, "x".to_string()),
                (Object::Inline, String::new()),
            ]
        );
    }

    #[test]
    fn test_insert_data_continuation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut editor = Editor::builder(value()).plugin(Shout(calls.clone())).build().unwrap();
        editor.move_to_start_of_document().unwrap();

        editor.insert_data(TransferData::Text("hi\nthere".into())).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let doc = editor.document();
        assert_eq!(doc.nodes().len(), 2);
        assert_eq!(doc.nodes()[0].text(), "HI");
        assert_eq!(doc.nodes()[1].text(), "THERE");
    }
}
