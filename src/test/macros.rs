//! Keyboard macro recording and replay.
use super::{assert_line, init_editor};
use crate::config::EditMode;

#[test]
fn record_and_replay() {
    // C-X ( ab C-X ) C-X e: the recording plays once more
    assert_line(EditMode::Emacs, "\x18(ab\x18)\x18e\r", "abab");
}

#[test]
fn stop_keys_are_trimmed_from_the_recording() {
    // the macro is exactly "ab": no stray C-X ) in the replay
    let mut editor = init_editor(EditMode::Emacs, "\x18(ab\x18)\x18e\x18e\r");
    assert_eq!("ababab", editor.readline("").unwrap());
}

#[test]
fn replay_includes_commands() {
    // the recording captures commands too: C-A makes each replay
    // prepend at column 0
    assert_line(EditMode::Emacs, "\x18(\x01x\x18)\x18e\r", "xx");
}

#[test]
fn starting_a_recording_discards_the_previous_macro() {
    let mut editor = init_editor(EditMode::Emacs, "\x18(a\x18)\x18(b\x18)\x18e\r");
    assert_eq!("abb", editor.readline("").unwrap());
}

#[test]
fn replay_with_empty_macro_is_a_noop() {
    assert_line(EditMode::Emacs, "x\x18e\r", "x");
}
