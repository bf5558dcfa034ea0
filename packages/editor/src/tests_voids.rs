/// Void blocks and inlines under editing commands
/// A void is removed whole or left alone, never edited inside
use crate::*;
use quire_model::{Node, Point, Range, Selection, Value};

#[cfg(test)]
mod void_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn schema() -> Schema {
        let mut definition = SchemaDefinition::default();
        definition.blocks.insert("image".into(), Rule::default().void(true));
        definition.inlines.insert("emoji".into(), Rule::default().void(true));
        Schema::new(definition)
    }

    fn editor_with(nodes: Vec<Node>) -> Editor {
        let value = Value::new(Node::document(nodes)).with_selection(Selection::collapsed(Point::new([0, 0], 0)));
        Editor::builder(value).schema(schema()).build().expect("Failed to build editor")
    }

    fn image() -> Node {
        Node::block("image", vec![Node::new_text("")])
    }

    fn paragraph(text: &str) -> Node {
        Node::block("paragraph", vec![Node::new_text(text)])
    }

    fn types(editor: &Editor) -> Vec<Option<&str>> {
        editor.document().nodes().iter().map(Node::ty).collect()
    }

    #[test]
    fn test_backspace_after_image_removes_it() {
        let mut editor = editor_with(vec![paragraph("a"), image(), paragraph("b")]);
        editor.move_to(Point::new([2, 0], 0)).unwrap();

        editor.delete_char_backward().unwrap();

        assert_eq!(types(&editor), vec![Some("paragraph"), Some("paragraph")]);
        assert_eq!(editor.document().text(), "ab");
    }

    #[test]
    fn test_delete_forward_before_image_removes_it() {
        let mut editor = editor_with(vec![paragraph("a"), image(), paragraph("b")]);
        editor.move_to(Point::new([0, 0], 1)).unwrap();

        editor.delete_char_forward().unwrap();

        assert_eq!(types(&editor), vec![Some("paragraph"), Some("paragraph")]);
    }

    #[test]
    fn test_typing_inside_void_is_ignored() {
        let mut editor = editor_with(vec![paragraph("a"), image()]);
        editor.move_to(Point::new([1, 0], 0)).unwrap();

        editor.insert_text("nope").unwrap();

        assert_eq!(editor.document().text(), "a");
        assert!(!editor.can_undo());
    }

    #[test]
    fn test_selection_starting_in_void() {
        let mut editor = editor_with(vec![paragraph("a"), image(), paragraph("bc")]);
        editor
            .select(Range::new(Point::new([1, 0], 0), Point::new([2, 0], 1)))
            .unwrap();

        editor.delete().unwrap();

        assert_eq!(types(&editor), vec![Some("paragraph"), Some("paragraph")]);
        assert_eq!(editor.document().nodes()[1].text(), "c");
    }

    #[test]
    fn test_block_inserted_after_void() {
        let mut editor = editor_with(vec![paragraph("a"), image()]);
        editor.move_to(Point::new([1, 0], 0)).unwrap();

        editor.insert_block(paragraph("caption")).unwrap();

        assert_eq!(types(&editor), vec![Some("paragraph"), Some("image"), Some("paragraph")]);
        assert_eq!(editor.selection().unwrap().focus, Point::new([2, 0], 7));
    }

    #[test]
    fn test_backspace_over_inline_void() {
        let mut editor = editor_with(vec![Node::block(
            "paragraph",
            vec![Node::new_text("ab"), Node::inline("emoji", vec![Node::new_text("")]), Node::new_text("cd")],
        )]);
        editor.move_to(Point::new([0, 2], 0)).unwrap();

        editor.delete_char_backward().unwrap();

        let block = &editor.document().nodes()[0];
        assert_eq!(block.nodes().len(), 1);
        assert_eq!(block.text(), "abcd");
        assert_eq!(editor.selection().unwrap().focus, Point::new([0, 0], 2));
    }

    #[test]
    fn test_caret_skips_over_inline_void() {
        let mut editor = editor_with(vec![Node::block(
            "paragraph",
            vec![Node::new_text("ab"), Node::inline("emoji", vec![Node::new_text("")]), Node::new_text("cd")],
        )]);
        editor.move_to(Point::new([0, 0], 2)).unwrap();

        editor.move_forward(2).unwrap();

        assert_eq!(editor.selection().unwrap().focus, Point::new([0, 2], 0));
    }
}
