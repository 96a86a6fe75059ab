//! Vi movement-mode bindings.
use super::{assert_cursor_vi_move, init_editor, ESC};
use crate::config::EditMode;
use crate::{History, VI_MOVE};

// `keys`: keys pressed in movement mode
// `expected_line`: line after the accepting enter
fn assert_vi_move(initial: (&str, &str), keys: &str, expected_line: &str) {
    let mut editor = init_editor(EditMode::Vi, &format!("{}\r", keys));
    editor.set_keymap(VI_MOVE);
    let actual_line = editor.readline_with_initial("", initial).unwrap();
    assert_eq!(expected_line, actual_line);
}

#[test]
fn motions() {
    assert_cursor_vi_move(("ab", "cd"), "h", ("a", "bcd"));
    assert_cursor_vi_move(("ab", "cd"), "l", ("abc", "d"));
    assert_cursor_vi_move(("ab", "cd"), "0", ("", "abcd"));
    assert_cursor_vi_move(("ab", "cd"), "$", ("abcd", ""));
    assert_cursor_vi_move(("ab", "cd"), " ", ("abc", "d"));
}

#[test]
fn word_motions() {
    assert_cursor_vi_move(("", "one two three"), "w", ("one ", "two three"));
    assert_cursor_vi_move(("", "one two three"), "ww", ("one two ", "three"));
    assert_cursor_vi_move(("", "one two three"), "2w", ("one two ", "three"));
    assert_cursor_vi_move(("one two", ""), "b", ("one ", "two"));
    assert_cursor_vi_move(("one two", ""), "2b", ("", "one two"));
    assert_cursor_vi_move(("", "one two"), "e", ("on", "e two"));
}

#[test]
fn delete_commands() {
    assert_vi_move(("a", "bc"), "x", "ac");
    assert_vi_move(("a", "bc"), "2x", "a");
    assert_vi_move(("ab", "c"), "X", "ac");
    assert_vi_move(("abc", ""), "D", "abc");
    assert_vi_move(("ab", "cd"), "D", "ab");
}

#[test]
fn repeat_count_accumulates_digits() {
    // 12x deletes twelve characters
    let line = format!("{}b", "a".repeat(12));
    assert_vi_move(("", &line), "12x", "b");
}

#[test]
fn zero_is_digit_within_a_count() {
    // `10x` must not treat the 0 as beginning-of-line
    let line = format!("{}b", "a".repeat(10));
    assert_vi_move(("", &line), "10x", "b");
}

#[test]
fn change_case() {
    assert_vi_move(("", "aBc"), "~~~", "AbC");
    assert_cursor_vi_move(("", "ab"), "~", ("A", "b"));
}

#[test]
fn bracket_match() {
    assert_cursor_vi_move(("", "(abc)"), "%", ("(abc", ")"));
    assert_cursor_vi_move(("(abc", ")"), "%", ("", "(abc)"));
    assert_cursor_vi_move(("", "{a(b)c}"), "%", ("{a(b)c", "}"));
    // involution: twice lands back on the start
    assert_cursor_vi_move(("", "[x]"), "%%", ("", "[x]"));
    // not on a bracket: no move
    assert_cursor_vi_move(("", "abc"), "%", ("", "abc"));
}

#[test]
fn insert_commands() {
    assert_vi_move(("ab", "cd"), "ixy", "abxycd");
    assert_vi_move(("ab", "cd"), "axy", "abcxyd");
    assert_vi_move(("ab", "cd"), "Axy", "abcdxy");
    assert_vi_move(("ab", "cd"), "Ixy", "xyabcd");
}

#[test]
fn history_j_k_put_cursor_at_start() {
    let mut editor = init_editor(EditMode::Vi, "ki|\r");
    editor.set_keymap(VI_MOVE);
    editor.history.add("previous entry");
    editor.history.move_to_end();
    // k recalls the entry with the cursor at column 0
    assert_eq!("|previous entry", editor.readline("").unwrap());
}

#[test]
fn eof_scenario() {
    // i h i ESC 0 x x: insert "hi", back to movement mode, delete both
    let keys = format!("ihi{}0xx\r", ESC);
    let mut editor = init_editor(EditMode::Vi, &keys);
    editor.set_keymap(VI_MOVE);
    assert_eq!("", editor.readline("").unwrap());
}

#[test]
fn emacs_mode_switch() {
    // C-E in movement mode switches back to the emacs map, where C-A
    // is beginning-of-line again
    let mut editor = init_editor(EditMode::Vi, "\x05\x01x\r");
    editor.set_keymap(VI_MOVE);
    let line = editor.readline_with_initial("", ("abc", "")).unwrap();
    assert_eq!("xabc", line);
}
