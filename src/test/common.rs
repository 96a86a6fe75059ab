//! Basic commands, shared by every keymap.
use super::{assert_cursor, assert_line, assert_line_with_initial};
use crate::config::EditMode;

#[test]
fn home_key() {
    for mode in &[EditMode::Emacs, EditMode::Vi] {
        assert_cursor(*mode, ("", ""), "\x1b[H", ("", ""));
        assert_cursor(*mode, ("Hi", ""), "\x1b[H", ("", "Hi"));
        assert_cursor(*mode, ("Hi", ""), "\x1b[1~", ("", "Hi"));
    }
}

#[test]
fn end_key() {
    for mode in &[EditMode::Emacs, EditMode::Vi] {
        assert_cursor(*mode, ("", ""), "\x1b[F", ("", ""));
        assert_cursor(*mode, ("H", "i"), "\x1b[F", ("Hi", ""));
        assert_cursor(*mode, ("", "Hi"), "\x1b[4~", ("Hi", ""));
    }
}

#[test]
fn left_key() {
    for mode in &[EditMode::Emacs, EditMode::Vi] {
        assert_cursor(*mode, ("Hi", ""), "\x1b[D", ("H", "i"));
        assert_cursor(*mode, ("H", "i"), "\x1b[D", ("", "Hi"));
        assert_cursor(*mode, ("", "Hi"), "\x1b[D", ("", "Hi"));
    }
}

#[test]
fn right_key() {
    for mode in &[EditMode::Emacs, EditMode::Vi] {
        assert_cursor(*mode, ("", ""), "\x1b[C", ("", ""));
        assert_cursor(*mode, ("", "Hi"), "\x1b[C", ("H", "i"));
        assert_cursor(*mode, ("B", "ye"), "\x1b[C", ("By", "e"));
    }
}

#[test]
fn delete_key() {
    for mode in &[EditMode::Emacs, EditMode::Vi] {
        assert_line_with_initial(*mode, ("foo", "o"), "\x1b[3~\r", "foo");
        // at the end of the line nothing happens
        assert_line_with_initial(*mode, ("foo", ""), "\x1b[3~\r", "foo");
    }
}

#[test]
fn backspace_key() {
    for mode in &[EditMode::Emacs, EditMode::Vi] {
        assert_line(*mode, "foox\x7f\r", "foo");
        // backspace at column 0 is a no-op
        assert_line_with_initial(*mode, ("", "foo"), "\x7f\r", "foo");
    }
}

#[test]
fn wide_input_stays_intact() {
    for mode in &[EditMode::Emacs, EditMode::Vi] {
        // code points above the keymap table self-insert
        assert_line(*mode, "héllo 🦀\r", "héllo 🦀");
    }
}

#[test]
fn up_down_without_history() {
    for mode in &[EditMode::Emacs, EditMode::Vi] {
        assert_line(*mode, "x\x1b[A\x1b[B\r", "x");
    }
}
