//! Interactive smoke test: `cargo run --bin demo`
use termline::completion::Completer;
use termline::{Editor, ReadlineError};

struct CommandCompleter;

impl Completer for CommandCompleter {
    fn complete(&self, line: &str, cursor: usize, candidates: &mut Vec<String>) -> Option<usize> {
        let head = &line[..line
            .char_indices()
            .nth(cursor)
            .map(|(i, _)| i)
            .unwrap_or_else(|| line.len())];
        let start = head.rfind(' ').map(|i| i + 1).unwrap_or(0);
        let word = &head[start..];
        for cmd in &["help", "history", "exit", "echo"] {
            if cmd.starts_with(word) {
                candidates.push((*cmd).to_owned());
            }
        }
        if candidates.is_empty() {
            None
        } else {
            Some(head[..start].chars().count())
        }
    }
}

fn main() -> termline::Result<()> {
    let mut editor = Editor::new();
    editor.add_completer(Box::new(CommandCompleter));
    loop {
        match editor.readline("termline> ") {
            Ok(line) => {
                if line == "exit" {
                    break;
                }
                if line == "history" {
                    for (i, entry) in editor.history().iter().enumerate() {
                        println!("{:4}  {}", i, entry);
                    }
                    continue;
                }
                println!("{}", line);
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err),
        }
    }
    Ok(())
}
