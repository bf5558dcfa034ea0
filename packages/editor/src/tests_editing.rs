/// Editing scenarios driven through selection commands
/// Covers typing sessions, structural deletes and their undo
use crate::*;
use quire_model::{Element, Mark, Node, Point, Range, Selection, Value};

#[cfg(test)]
mod editing_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn editor_with(document: Node) -> Editor {
        let value = Value::new(document).with_selection(Selection::collapsed(Point::new([0, 0], 0)));
        Editor::new(value).expect("Failed to build editor")
    }

    fn paragraphs(texts: &[&str]) -> Node {
        Node::document(
            texts
                .iter()
                .map(|text| Node::block("paragraph", vec![Node::new_text(*text)]))
                .collect(),
        )
    }

    fn texts(editor: &Editor) -> Vec<String> {
        editor.document().nodes().iter().map(Node::text).collect()
    }

    #[test]
    fn test_typing_two_paragraphs() {
        let mut editor = editor_with(paragraphs(&[""]));

        editor.insert_text("Hello").unwrap();
        editor.split_block(1).unwrap();
        editor.insert_text("world").unwrap();

        assert_eq!(texts(&editor), vec!["Hello", "world"]);
        assert_eq!(editor.selection().unwrap().focus, Point::new([1, 0], 5));
        assert_eq!(editor.history().undos().len(), 3);

        editor.undo().unwrap();
        assert_eq!(texts(&editor), vec!["Hello", ""]);
        editor.undo().unwrap();
        editor.undo().unwrap();
        assert_eq!(texts(&editor), vec![""]);
    }

    #[test]
    fn test_backspaces_undo_together() {
        let mut editor = editor_with(paragraphs(&[""]));
        editor.insert_text("abc").unwrap();
        editor.delete_char_backward().unwrap();
        editor.delete_char_backward().unwrap();
        assert_eq!(editor.document().text(), "a");

        editor.undo().unwrap();
        assert_eq!(editor.document().text(), "abc");
        editor.undo().unwrap();
        assert_eq!(editor.document().text(), "");
    }

    #[test]
    fn test_format_then_type_over_selection() {
        let bold = Mark::new("bold");
        let mut editor = editor_with(paragraphs(&["make this loud"]));

        editor
            .select(Range::new(Point::new([0, 0], 10), Point::new([0, 0], 14)))
            .unwrap();
        editor.toggle_mark(bold.clone()).unwrap();
        editor.insert_text("LOUD").unwrap();

        assert_eq!(editor.document().text(), "make this LOUD");
        let text = editor.document().assert_text(&[0, 0].into()).unwrap();
        assert!(text.marks_at(14).contains(&bold));
        assert!(!text.marks_at(9).contains(&bold));
    }

    #[test]
    fn test_split_list_item() {
        let document = Node::document(vec![Node::block(
            "list",
            vec![Node::block("item", vec![Node::block("paragraph", vec![Node::new_text("ab")])])],
        )]);
        let mut editor = editor_with(document);
        editor.move_to(Point::new([0, 0, 0, 0], 1)).unwrap();

        editor.split_block(2).unwrap();

        let list = &editor.document().nodes()[0];
        assert_eq!(list.nodes().len(), 2);
        assert_eq!(list.nodes()[0].text(), "a");
        assert_eq!(list.nodes()[1].text(), "b");
        assert_eq!(editor.selection().unwrap().focus, Point::new([0, 1, 0, 0], 0));
    }

    #[test]
    fn test_delete_into_list_removes_emptied_list() {
        let document = Node::document(vec![
            Node::block("paragraph", vec![Node::new_text("intro")]),
            Node::block(
                "list",
                vec![
                    Node::block("item", vec![Node::new_text("one")]),
                    Node::block("item", vec![Node::new_text("two")]),
                ],
            ),
        ]);
        let mut editor = editor_with(document);
        let before = editor.document().clone();

        editor
            .select(Range::new(Point::new([0, 0], 2), Point::new([1, 1, 0], 1)))
            .unwrap();
        editor.delete().unwrap();

        assert_eq!(texts(&editor), vec!["inwo"]);
        assert_eq!(editor.document().nodes()[0].ty(), Some("paragraph"));

        editor.undo().unwrap();
        assert_eq!(editor.document(), &before);
    }

    #[test]
    fn test_quote_and_unquote() {
        let mut editor = editor_with(paragraphs(&["first", "second"]));
        editor
            .select(Range::new(Point::new([0, 0], 1), Point::new([1, 0], 2)))
            .unwrap();

        editor.wrap_block(&Node::Block(Element::new("quote", vec![]))).unwrap();
        assert_eq!(editor.document().nodes()[0].ty(), Some("quote"));

        editor.undo().unwrap();
        assert_eq!(texts(&editor), vec!["first", "second"]);
        assert!(editor.document().nodes().iter().all(|n| n.ty() == Some("paragraph")));
    }

    #[test]
    fn test_word_deletes_in_sentence() {
        let mut editor = editor_with(paragraphs(&["the quick fox"]));
        editor.move_to(Point::new([0, 0], 9)).unwrap();

        editor.delete_word_backward().unwrap();
        assert_eq!(editor.document().text(), "the  fox");

        editor.delete_word_forward().unwrap();
        assert_eq!(editor.document().text(), "the ");
    }

    #[test]
    fn test_line_delete_at_block_edge_is_noop() {
        let mut editor = editor_with(paragraphs(&["one", "two"]));
        editor.move_to(Point::new([1, 0], 0)).unwrap();
        editor.delete_line_backward().unwrap();
        assert_eq!(texts(&editor), vec!["one", "two"]);
        assert!(!editor.can_undo());
    }
}
