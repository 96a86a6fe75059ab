//! End-to-end keystroke tests over the dummy terminal
use assert_matches::assert_matches;

use crate::config::{Config, EditMode};
use crate::error::ReadlineError;
use crate::{Editor, History, MemoryHistory};

mod common;
mod completion;
mod history;
mod macros;
mod vi_cmd;

pub const ESC: char = '\x1b';
/// See [`crate::tty::PAUSE`]: a silence longer than the escape timeout.
pub const PAUSE: char = crate::tty::PAUSE;

pub fn init_editor(mode: EditMode, keys: &str) -> Editor<MemoryHistory> {
    init_editor_with_config(Config::builder().edit_mode(mode).build(), keys)
}

pub fn init_editor_with_config(config: Config, keys: &str) -> Editor<MemoryHistory> {
    let mut editor = Editor::with_config(config);
    editor.term.keys.extend(keys.chars());
    editor
}

// `keys`: keys to press
// `expected_line`: line after enter key
pub fn assert_line(mode: EditMode, keys: &str, expected_line: &str) {
    let mut editor = init_editor(mode, keys);
    let actual_line = editor.readline(">>").unwrap();
    assert_eq!(expected_line, actual_line);
}

// `initial`: line status before `keys` pressed: strings before and after cursor
pub fn assert_line_with_initial(
    mode: EditMode,
    initial: (&str, &str),
    keys: &str,
    expected_line: &str,
) {
    let mut editor = init_editor(mode, keys);
    let actual_line = editor.readline_with_initial(">>", initial).unwrap();
    assert_eq!(expected_line, actual_line);
}

// The cursor position is verified by inserting a `|` marker: the keys
// must leave the editor in a self-inserting keymap.
pub fn assert_cursor(mode: EditMode, initial: (&str, &str), keys: &str, expected: (&str, &str)) {
    let all = format!("{}|\r", keys);
    let mut editor = init_editor(mode, &all);
    let actual_line = editor.readline_with_initial("", initial).unwrap();
    assert_eq!(format!("{}|{}", expected.0, expected.1), actual_line);
}

// Movement-mode variant: enters insert mode before dropping the marker.
pub fn assert_cursor_vi_move(initial: (&str, &str), keys: &str, expected: (&str, &str)) {
    let all = format!("{}i|\r", keys);
    let mut editor = init_editor(EditMode::Vi, &all);
    editor.set_keymap(crate::VI_MOVE);
    let actual_line = editor.readline_with_initial("", initial).unwrap();
    assert_eq!(format!("{}|{}", expected.0, expected.1), actual_line);
}

// `entries`: history entries before `keys` pressed
pub fn assert_history(mode: EditMode, entries: &[&str], keys: &str, expected_line: &str) {
    let mut editor = init_editor(mode, keys);
    for entry in entries {
        editor.history.add(entry);
    }
    editor.history.move_to_end();
    let actual_line = editor.readline("").unwrap();
    assert_eq!(expected_line, actual_line);
}

#[test]
fn eof_returns_eof() {
    for mode in &[EditMode::Emacs, EditMode::Vi] {
        let mut editor = init_editor(*mode, "");
        assert_matches!(editor.readline(""), Err(ReadlineError::Eof));
        // typed text is lost when the stream closes mid-line
        let mut editor = init_editor(*mode, "abc");
        assert_matches!(editor.readline(""), Err(ReadlineError::Eof));
    }
}

#[test]
fn ctrl_c_interrupts() {
    for mode in &[EditMode::Emacs, EditMode::Vi] {
        let mut editor = init_editor(*mode, "ab\x03cd\r");
        assert_matches!(editor.readline(""), Err(ReadlineError::Interrupted));
    }
}

#[test]
fn unknown_sequences_are_dropped() {
    // ESC [ z is not bound anywhere: the sequence is discarded after
    // prefix backoff and editing goes on
    assert_line(EditMode::Emacs, "a\x1b[zb\r", "ab");
}

#[test]
fn keys_span_readline_calls() {
    let mut editor = init_editor(EditMode::Emacs, "one\rtwo\r");
    assert_eq!("one", editor.readline("").unwrap());
    assert_eq!("two", editor.readline("").unwrap());
    assert_eq!(2, editor.history.size());
}

#[test]
fn masked_line_skips_history() {
    let mut editor = init_editor(EditMode::Emacs, "secret\r");
    let line = editor.readline_with_mask("password: ", Some('*')).unwrap();
    assert_eq!("secret", line);
    assert_eq!(0, editor.history.size());
    assert!(editor.term.output().contains("******"));
    assert!(!editor.term.output().contains("secret"));
}

#[test]
fn null_mask_echoes_nothing() {
    let mut editor = init_editor(EditMode::Emacs, "secret\r");
    let line = editor.readline_with_mask("> ", Some('\0')).unwrap();
    assert_eq!("secret", line);
    assert!(!editor.term.output().contains('s'));
}

#[test]
fn history_can_be_disabled() {
    let mut editor = init_editor(EditMode::Emacs, "hello\r");
    editor.set_history_enabled(false);
    assert_eq!("hello", editor.readline("").unwrap());
    assert_eq!(0, editor.history.size());
}

#[test]
fn callback_binding_runs() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    let hits = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&hits);
    let mut editor = init_editor(EditMode::Emacs, "a\x18zb\r");
    editor.keymaps_mut().bind(
        crate::EMACS,
        "\x18z",
        crate::keymap::Action::Callback(Arc::new(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        })),
    );
    assert_eq!("ab", editor.readline("").unwrap());
    assert_eq!(1, hits.load(Ordering::SeqCst));
}

#[test]
fn macro_binding_replays_keys() {
    let mut editor = init_editor(EditMode::Emacs, "\x18m!\r");
    editor.keymaps_mut().bind(
        crate::EMACS,
        "\x18m",
        crate::keymap::Action::Macro("echo".to_owned()),
    );
    assert_eq!("echo!", editor.readline("").unwrap());
}

#[test]
fn insert_comment_accepts_immediately() {
    // M-# prepends the comment prefix and accepts
    let mut editor = init_editor(EditMode::Emacs, "ls\x1b#");
    assert_eq!("#ls", editor.readline("").unwrap());

    let mut editor = init_editor(EditMode::Emacs, "ls\x1b#");
    editor.set_comment_begin("//");
    assert_eq!("//ls", editor.readline("").unwrap());

    let mut editor = init_editor(EditMode::Emacs, "ls\x1b#");
    editor.keymaps_mut().set_variable("comment-begin", ";;");
    assert_eq!(";;ls", editor.readline("").unwrap());
}

#[test]
fn re_read_init_file_restores_defaults() {
    // rebind C-T to a macro, then C-X C-R reloads the default map and
    // C-T transposes again
    let mut editor = init_editor(EditMode::Emacs, "ab\x14\r");
    editor
        .keymaps_mut()
        .bind(crate::EMACS, "\x14", crate::keymap::Action::Macro("X".to_owned()));
    assert_eq!("abX", editor.readline("").unwrap());

    let mut editor = init_editor(EditMode::Emacs, "\x18\x12ab\x14\r");
    editor
        .keymaps_mut()
        .bind(crate::EMACS, "\x14", crate::keymap::Action::Macro("X".to_owned()));
    assert_eq!("ba", editor.readline("").unwrap());
}
