use criterion::{black_box, criterion_group, criterion_main, Criterion};
use quire_editor::Editor;
use quire_model::{Node, Point, Range, Selection, Value};

fn document(blocks: usize) -> Value {
    let nodes = (0..blocks)
        .map(|i| {
            Node::block(
                "paragraph",
                vec![
                    Node::new_text(format!("paragraph {i} with some text ")),
                    Node::inline("link", vec![Node::new_text("a link")]),
                    Node::new_text(" and a tail"),
                ],
            )
        })
        .collect();
    Value::new(Node::document(nodes)).with_selection(Selection::collapsed(Point::new([0, 0], 0)))
}

fn typing_sentence(c: &mut Criterion) {
    let value = document(50);

    c.bench_function("typing_sentence", |b| {
        b.iter(|| {
            let mut editor = Editor::new(value.clone()).unwrap();
            for ch in "the quick brown fox jumps over the lazy dog".chars() {
                editor.insert_text(black_box(&ch.to_string())).unwrap();
            }
            editor
        })
    });
}

fn delete_across_blocks(c: &mut Criterion) {
    let value = document(200);

    c.bench_function("delete_across_blocks", |b| {
        b.iter(|| {
            let mut editor = Editor::new(value.clone()).unwrap();
            let range = Range::new(Point::new([10, 0], 3), Point::new([150, 2], 2));
            editor.select(black_box(range)).unwrap();
            editor.delete().unwrap();
            editor
        })
    });
}

fn normalize_document(c: &mut Criterion) {
    let value = document(500);

    c.bench_function("normalize_document", |b| {
        b.iter(|| Editor::new(black_box(value.clone())).unwrap())
    });
}

fn undo_redo(c: &mut Criterion) {
    let value = document(50);

    c.bench_function("undo_redo", |b| {
        b.iter(|| {
            let mut editor = Editor::new(value.clone()).unwrap();
            editor.move_to_end_of_document().unwrap();
            for _ in 0..20 {
                editor.split_block(1).unwrap();
                editor.insert_text("line").unwrap();
            }
            while editor.can_undo() {
                editor.undo().unwrap();
            }
            while editor.can_redo() {
                editor.redo().unwrap();
            }
            editor
        })
    });
}

criterion_group!(benches, typing_sentence, delete_across_blocks, normalize_document, undo_redo);
criterion_main!(benches);
