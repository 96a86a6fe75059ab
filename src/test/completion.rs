//! Tab completion plumbing.
use super::{init_editor, init_editor_with_config};
use crate::completion::Completer;
use crate::config::{Config, EditMode};

struct SimpleCompleter;

impl Completer for SimpleCompleter {
    fn complete(&self, line: &str, _cursor: usize, candidates: &mut Vec<String>) -> Option<usize> {
        candidates.push(format!("{}t", line));
        Some(0)
    }
}

struct WordCompleter(Vec<&'static str>);

impl Completer for WordCompleter {
    fn complete(&self, line: &str, cursor: usize, candidates: &mut Vec<String>) -> Option<usize> {
        let head: String = line.chars().take(cursor).collect();
        for word in &self.0 {
            if word.starts_with(&head) {
                candidates.push((*word).to_owned());
            }
        }
        if candidates.is_empty() {
            None
        } else {
            Some(0)
        }
    }
}

#[test]
fn single_candidate_is_installed() {
    let mut editor = init_editor(EditMode::Emacs, "rus\x09\r");
    editor.add_completer(Box::new(SimpleCompleter));
    assert_eq!("rust", editor.readline("").unwrap());
}

#[test]
fn multiple_candidates_extend_to_common_prefix() {
    let mut editor = init_editor(EditMode::Emacs, "fo\x09\r");
    editor.add_completer(Box::new(WordCompleter(vec!["foobar", "foobaz"])));
    assert_eq!("fooba", editor.readline("").unwrap());
    // both candidates were listed
    let out = editor.term.output();
    assert!(out.contains("foobar"));
    assert!(out.contains("foobaz"));
}

#[test]
fn no_completer_beeps() {
    let config = Config::builder().bell_enabled(true).build();
    let mut editor = init_editor_with_config(config, "x\x09\r");
    assert_eq!("x", editor.readline("").unwrap());
    assert!(editor.term.bells() > 0);
}

#[test]
fn first_matching_completer_wins() {
    struct Never;
    impl Completer for Never {
        fn complete(&self, _: &str, _: usize, _: &mut Vec<String>) -> Option<usize> {
            None
        }
    }
    let mut editor = init_editor(EditMode::Emacs, "rus\x09\r");
    editor.add_completer(Box::new(Never));
    editor.add_completer(Box::new(SimpleCompleter));
    assert_eq!("rust", editor.readline("").unwrap());
}

#[test]
fn possible_completions_list_without_installing() {
    let mut editor = init_editor(EditMode::Emacs, "fo\x1b?\r");
    editor.add_completer(Box::new(WordCompleter(vec!["foobar", "foobaz"])));
    assert_eq!("fo", editor.readline("").unwrap());
    let out = editor.term.output();
    assert!(out.contains("foobar"));
    assert!(out.contains("foobaz"));
}

#[test]
fn threshold_prompts_before_listing() {
    let config = Config::builder().autoprint_threshold(2).build();
    let words: Vec<&'static str> = vec!["aaa", "aab", "aac"];
    // answer n: nothing is listed
    let mut editor = init_editor_with_config(config, "\x1b?n\r");
    editor.add_completer(Box::new(WordCompleter(words.clone())));
    assert_eq!("", editor.readline("").unwrap());
    let out = editor.term.output();
    assert!(out.contains("Display all 3 possibilities? (y or n)"));
    assert!(!out.contains("aac"));

    // answer y: the candidates show up
    let mut editor = init_editor_with_config(config, "\x1b?y\r");
    editor.add_completer(Box::new(WordCompleter(words)));
    assert_eq!("", editor.readline("").unwrap());
    assert!(editor.term.output().contains("aac"));
}

#[test]
fn completion_with_prefix_replacement() {
    // candidates replace from the reported position
    struct PathCompleter;
    impl Completer for PathCompleter {
        fn complete(
            &self,
            line: &str,
            cursor: usize,
            candidates: &mut Vec<String>,
        ) -> Option<usize> {
            let head: String = line.chars().take(cursor).collect();
            let start = head.rfind('/').map(|i| i + 1).unwrap_or(0);
            candidates.push("passwd".to_owned());
            Some(head[..start].chars().count())
        }
    }
    let mut editor = init_editor(EditMode::Emacs, "/etc/pas\x09\r");
    editor.add_completer(Box::new(PathCompleter));
    assert_eq!("/etc/passwd", editor.readline("").unwrap());
}
