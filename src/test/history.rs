//! History navigation.
use super::{assert_cursor, assert_history, init_editor};
use crate::config::EditMode;
use crate::History;

fn editor_with_history(keys: &str) -> crate::Editor {
    let mut editor = init_editor(EditMode::Emacs, keys);
    for entry in &["first", "second", "third"] {
        editor.history.add(entry);
    }
    editor.history.move_to_end();
    editor
}

#[test]
fn previous_history_replaces_buffer() {
    assert_history(EditMode::Emacs, &["first", "second", "third"], "\x10\r", "third");
    assert_history(
        EditMode::Emacs,
        &["first", "second", "third"],
        "\x10\x10\r",
        "second",
    );
}

#[test]
fn next_history_comes_back() {
    // down past the newest entry restores the live (empty) line
    let mut editor = editor_with_history("\x10\x10\x0e\r");
    assert_eq!("third", editor.readline("").unwrap());
    let mut editor = editor_with_history("\x10\x0e\r");
    assert_eq!("", editor.readline("").unwrap());
}

#[test]
fn previous_stops_at_oldest() {
    let mut editor = editor_with_history("\x10\x10\x10\x10\x10\r");
    assert_eq!("first", editor.readline("").unwrap());
}

#[test]
fn beginning_and_end_of_history() {
    let mut editor = editor_with_history("\x1b<\r");
    assert_eq!("first", editor.readline("").unwrap());
    // M-> from the oldest jumps to the newest entry
    let mut editor = editor_with_history("\x1b<\x1b>\r");
    assert_eq!("third", editor.readline("").unwrap());
}

#[test]
fn emacs_recall_puts_cursor_at_end() {
    let mut editor = editor_with_history("\x10|\r");
    assert_eq!("third|", editor.readline("").unwrap());
}

#[test]
fn arrow_keys_navigate() {
    let mut editor = editor_with_history("\x1b[A\x1b[A\x1b[B\r");
    assert_eq!("third", editor.readline("").unwrap());
}

#[test]
fn navigation_discards_the_edited_line() {
    // the live position past the newest entry is an empty slot: going
    // up replaces the typed text and coming back down does not restore
    // it
    let mut editor = editor_with_history("abc\x10\x0e\r");
    assert_eq!("", editor.readline("").unwrap());
}

#[test]
fn accepted_lines_append_in_order() {
    let mut editor = init_editor(EditMode::Emacs, "foo\rbar\r");
    assert_eq!("foo", editor.readline("").unwrap());
    assert_eq!("bar", editor.readline("").unwrap());
    assert_eq!(2, editor.history.size());
    assert_eq!(Some("foo"), editor.history.get(0));
    assert_eq!(Some("bar"), editor.history.get(1));
    assert_eq!(2, editor.history.index());
}

#[test]
fn cursor_after_recall_then_edit() {
    assert_cursor(EditMode::Emacs, ("", ""), "x", ("x", ""));
}
