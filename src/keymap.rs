//! Key maps: sequences of keys resolved to editor commands
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::trace;

use crate::consts::{ctrl, DELETE, ESC};

/// Emacs keymap name
pub const EMACS: &str = "emacs";
/// Vi insert-mode keymap name
pub const VI_INSERT: &str = "vi-insert";
/// Vi movement-mode keymap name
pub const VI_MOVE: &str = "vi-move";

/// Tag identifying a built-in editor command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Operation {
    Abort,
    AcceptLine,
    BackwardChar,
    BackwardDeleteChar,
    BackwardKillWord,
    BackwardWord,
    BeginningOfHistory,
    BeginningOfLine,
    CallLastKbdMacro,
    CapitalizeWord,
    ClearScreen,
    Complete,
    DeleteChar,
    /// Lowercase the last key of the pending sequence and resolve again.
    DoLowercaseVersion,
    DowncaseWord,
    EmacsEditingMode,
    EndKbdMacro,
    EndOfHistory,
    EndOfLine,
    /// Ctrl-D: EOF on an empty line, delete-char otherwise.
    ExitOrDeleteChar,
    ForwardChar,
    ForwardWord,
    InsertComment,
    Interrupt,
    KillLine,
    KillWholeLine,
    KillWord,
    NextHistory,
    OverwriteMode,
    PossibleCompletions,
    PreviousHistory,
    ReReadInitFile,
    ReverseSearchHistory,
    SelfInsert,
    StartKbdMacro,
    TabInsert,
    TransposeChars,
    UnixLineDiscard,
    UnixWordRubout,
    UpcaseWord,
    ViAppendEol,
    ViAppendMode,
    ViArgDigit,
    ViBeginningOfLineOrArgDigit,
    ViChangeCase,
    ViDelete,
    ViEditingMode,
    ViEndWord,
    ViEofMaybe,
    ViInsertBeg,
    ViInsertComment,
    ViInsertionMode,
    ViMatch,
    ViMoveAcceptLine,
    ViMovementMode,
    ViNextHistory,
    ViNextWord,
    ViPrevWord,
    ViPreviousHistory,
    ViRubout,
    ViSearch,
}

/// User callback bound to a key sequence.
pub type Callback = Arc<dyn Fn() + Send + Sync>;

/// A terminal binding value: what a completed key sequence resolves to.
#[derive(Clone)]
pub enum Action {
    /// Built-in command
    Op(Operation),
    /// Keys replayed through the pushback stack
    Macro(String),
    /// User callback
    Callback(Callback),
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Op(op) => write!(f, "Op({:?})", op),
            Action::Macro(keys) => write!(f, "Macro({:?})", keys),
            Action::Callback(_) => write!(f, "Callback"),
        }
    }
}

impl From<Operation> for Action {
    fn from(op: Operation) -> Self {
        Action::Op(op)
    }
}

const KEYMAP_LENGTH: usize = 256;

#[derive(Clone, Debug)]
enum Slot {
    Action(Action),
    Sub(Box<KeyMap>),
}

/// Result of resolving a pending key sequence against a keymap.
#[derive(Clone, Debug)]
pub enum Resolved {
    /// The sequence ends on a terminal binding.
    Action(Action),
    /// The sequence ends on an inner node: more keys may follow.
    /// `another_key` is the binding that fires if the sequence is
    /// committed here anyway.
    Sub { another_key: Option<Action> },
}

/// Prefix trie from key sequences to bindings.
///
/// Each node maps a single key (code points below 256) to either a
/// terminal [`Action`] or a child map; code points above the table
/// self-insert. A node reached by a sequence that is both a complete
/// binding and a prefix of longer ones keeps the short binding as its
/// `another_key`.
#[derive(Clone, Debug)]
pub struct KeyMap {
    mapping: Vec<Option<Slot>>,
    another_key: Option<Action>,
}

impl Default for KeyMap {
    fn default() -> Self {
        KeyMap {
            mapping: vec![None; KEYMAP_LENGTH],
            another_key: None,
        }
    }
}

impl KeyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn another_key(&self) -> Option<&Action> {
        self.another_key.as_ref()
    }

    /// Resolve `seq` against this map. `None` means the sequence is not
    /// bound and is no prefix of anything bound.
    pub fn get_bound(&self, seq: &[char]) -> Option<Resolved> {
        let mut map = self;
        for (i, &c) in seq.iter().enumerate() {
            let code = c as usize;
            if code >= KEYMAP_LENGTH {
                return Some(Resolved::Action(Action::Op(Operation::SelfInsert)));
            }
            match map.mapping[code] {
                Some(Slot::Sub(ref sub)) => {
                    if i == seq.len() - 1 {
                        return Some(Resolved::Sub {
                            another_key: sub.another_key.clone(),
                        });
                    }
                    map = &**sub;
                }
                Some(Slot::Action(ref action)) => return Some(Resolved::Action(action.clone())),
                None => return None,
            }
        }
        None
    }

    /// Bind `action` to the key sequence `seq`, growing inner nodes as
    /// needed. A binding displaced by a longer sequence moves to the new
    /// inner node's `another_key`; binding a sequence that is already a
    /// prefix lands on the existing inner node's `another_key`.
    pub fn bind<A: Into<Action>>(&mut self, seq: &str, action: A) {
        let keys: Vec<char> = seq.chars().collect();
        self.bind_keys(&keys, action.into());
    }

    fn bind_keys(&mut self, keys: &[char], action: Action) {
        let (&first, rest) = match keys.split_first() {
            Some(split) => split,
            None => return,
        };
        let code = first as usize;
        if code >= KEYMAP_LENGTH {
            return;
        }
        if rest.is_empty() {
            match self.mapping[code] {
                Some(Slot::Sub(ref mut sub)) => sub.another_key = Some(action),
                _ => self.mapping[code] = Some(Slot::Action(action)),
            }
            return;
        }
        if !matches!(self.mapping[code], Some(Slot::Sub(_))) {
            let mut sub = KeyMap::new();
            if let Some(Slot::Action(displaced)) = self.mapping[code].take() {
                if !matches!(displaced, Action::Op(Operation::DoLowercaseVersion)) {
                    sub.another_key = Some(displaced);
                }
            }
            self.mapping[code] = Some(Slot::Sub(Box::new(sub)));
        }
        if let Some(Slot::Sub(ref mut sub)) = self.mapping[code] {
            sub.bind_keys(rest, action);
        }
    }
}

fn bind_arrow_keys(map: &mut KeyMap) {
    map.bind("\x1b[A", Operation::PreviousHistory);
    map.bind("\x1b[B", Operation::NextHistory);
    map.bind("\x1b[C", Operation::ForwardChar);
    map.bind("\x1b[D", Operation::BackwardChar);
    map.bind("\x1b[H", Operation::BeginningOfLine);
    map.bind("\x1b[F", Operation::EndOfLine);
    map.bind("\x1bOA", Operation::PreviousHistory);
    map.bind("\x1bOB", Operation::NextHistory);
    map.bind("\x1bOC", Operation::ForwardChar);
    map.bind("\x1bOD", Operation::BackwardChar);
    map.bind("\x1bOH", Operation::BeginningOfLine);
    map.bind("\x1bOF", Operation::EndOfLine);
    map.bind("\x1b[1~", Operation::BeginningOfLine);
    map.bind("\x1b[4~", Operation::EndOfLine);
    map.bind("\x1b[3~", Operation::DeleteChar);
}

/// The default Emacs keymap.
pub fn emacs() -> KeyMap {
    use self::Operation::*;
    let mut map = KeyMap::new();
    for c in ' '..='\u{ff}' {
        map.bind(&c.to_string(), SelfInsert);
    }
    map.bind(&ctrl('A').to_string(), BeginningOfLine);
    map.bind(&ctrl('B').to_string(), BackwardChar);
    map.bind(&ctrl('C').to_string(), Interrupt);
    map.bind(&ctrl('D').to_string(), ExitOrDeleteChar);
    map.bind(&ctrl('E').to_string(), EndOfLine);
    map.bind(&ctrl('F').to_string(), ForwardChar);
    map.bind(&ctrl('G').to_string(), Abort);
    map.bind(&ctrl('H').to_string(), BackwardDeleteChar);
    map.bind(&ctrl('I').to_string(), Complete);
    map.bind(&ctrl('J').to_string(), AcceptLine);
    map.bind(&ctrl('K').to_string(), KillLine);
    map.bind(&ctrl('L').to_string(), ClearScreen);
    map.bind(&ctrl('M').to_string(), AcceptLine);
    map.bind(&ctrl('N').to_string(), NextHistory);
    map.bind(&ctrl('P').to_string(), PreviousHistory);
    map.bind(&ctrl('R').to_string(), ReverseSearchHistory);
    map.bind(&ctrl('T').to_string(), TransposeChars);
    map.bind(&ctrl('U').to_string(), UnixLineDiscard);
    map.bind(&ctrl('W').to_string(), UnixWordRubout);
    map.bind(&DELETE.to_string(), BackwardDeleteChar);
    emacs_ctrl_x(&mut map);
    emacs_meta(&mut map);
    bind_arrow_keys(&mut map);
    map
}

fn emacs_ctrl_x(map: &mut KeyMap) {
    use self::Operation::*;
    let x = ctrl('X');
    map.bind(&format!("{}{}", x, '('), StartKbdMacro);
    map.bind(&format!("{}{}", x, ')'), EndKbdMacro);
    map.bind(&format!("{}{}", x, 'e'), CallLastKbdMacro);
    map.bind(&format!("{}{}", x, ctrl('G')), Abort);
    map.bind(&format!("{}{}", x, ctrl('R')), ReReadInitFile);
}

fn emacs_meta(map: &mut KeyMap) {
    use self::Operation::*;
    let meta = |c: char| format!("{}{}", ESC, c);
    map.bind(&meta(ctrl('G')), Abort);
    map.bind(&meta(ctrl('H')), BackwardKillWord);
    map.bind(&meta(ctrl('I')), TabInsert);
    map.bind(&meta(ctrl('J')), ViEditingMode);
    map.bind(&meta(ctrl('M')), ViEditingMode);
    map.bind(&meta('#'), InsertComment);
    map.bind(&meta('<'), BeginningOfHistory);
    map.bind(&meta('='), PossibleCompletions);
    map.bind(&meta('>'), EndOfHistory);
    map.bind(&meta('?'), PossibleCompletions);
    map.bind(&meta('b'), BackwardWord);
    map.bind(&meta('c'), CapitalizeWord);
    map.bind(&meta('d'), KillWord);
    map.bind(&meta('f'), ForwardWord);
    map.bind(&meta('l'), DowncaseWord);
    map.bind(&meta('u'), UpcaseWord);
    for c in 'A'..='Z' {
        map.bind(&meta(c), DoLowercaseVersion);
    }
    map.bind(&meta(DELETE), BackwardKillWord);
}

/// The default Vi insert-mode keymap.
pub fn vi_insert() -> KeyMap {
    use self::Operation::*;
    let mut map = KeyMap::new();
    for c in ' '..='\u{ff}' {
        map.bind(&c.to_string(), SelfInsert);
    }
    map.bind(&ctrl('C').to_string(), Interrupt);
    map.bind(&ctrl('D').to_string(), ViEofMaybe);
    map.bind(&ctrl('H').to_string(), BackwardDeleteChar);
    map.bind(&ctrl('I').to_string(), Complete);
    map.bind(&ctrl('J').to_string(), AcceptLine);
    map.bind(&ctrl('M').to_string(), AcceptLine);
    map.bind(&ctrl('R').to_string(), ReverseSearchHistory);
    map.bind(&ctrl('T').to_string(), TransposeChars);
    map.bind(&ctrl('U').to_string(), UnixLineDiscard);
    map.bind(&ctrl('W').to_string(), UnixWordRubout);
    map.bind(&ESC.to_string(), ViMovementMode);
    map.bind(&DELETE.to_string(), BackwardDeleteChar);
    bind_arrow_keys(&mut map);
    map
}

/// The default Vi movement-mode keymap.
pub fn vi_move() -> KeyMap {
    use self::Operation::*;
    let mut map = KeyMap::new();
    map.bind(" ", ForwardChar);
    map.bind("#", ViInsertComment);
    map.bind("$", EndOfLine);
    map.bind("%", ViMatch);
    map.bind("+", NextHistory);
    map.bind("-", PreviousHistory);
    map.bind("/", ViSearch);
    map.bind("0", ViBeginningOfLineOrArgDigit);
    for c in '1'..='9' {
        map.bind(&c.to_string(), ViArgDigit);
    }
    map.bind("?", ViSearch);
    map.bind("A", ViAppendEol);
    map.bind("B", ViPrevWord);
    map.bind("D", KillLine);
    map.bind("E", ViEndWord);
    map.bind("I", ViInsertBeg);
    map.bind("W", ViNextWord);
    map.bind("X", ViRubout);
    map.bind("^", BeginningOfLine);
    map.bind("a", ViAppendMode);
    map.bind("b", ViPrevWord);
    map.bind("e", ViEndWord);
    map.bind("h", BackwardChar);
    map.bind("i", ViInsertionMode);
    map.bind("j", ViNextHistory);
    map.bind("k", ViPreviousHistory);
    map.bind("l", ForwardChar);
    map.bind("w", ViNextWord);
    map.bind("x", ViDelete);
    map.bind("~", ViChangeCase);
    map.bind(&ctrl('C').to_string(), Interrupt);
    map.bind(&ctrl('D').to_string(), ViEofMaybe);
    map.bind(&ctrl('E').to_string(), EmacsEditingMode);
    map.bind(&ctrl('H').to_string(), BackwardChar);
    map.bind(&ctrl('J').to_string(), ViMoveAcceptLine);
    map.bind(&ctrl('L').to_string(), ClearScreen);
    map.bind(&ctrl('M').to_string(), ViMoveAcceptLine);
    map.bind(&ctrl('N').to_string(), NextHistory);
    map.bind(&ctrl('P').to_string(), PreviousHistory);
    map.bind(&ctrl('R').to_string(), ReverseSearchHistory);
    map.bind(&DELETE.to_string(), BackwardChar);
    bind_arrow_keys(&mut map);
    map
}

/// The registry of named keymaps, the active-map pointer and the
/// readline variable table. The init-file parser (an external
/// collaborator) populates it through [`KeyMaps::bind`] and
/// [`KeyMaps::set_variable`].
pub struct KeyMaps {
    maps: HashMap<String, KeyMap>,
    current: String,
    variables: HashMap<String, String>,
}

impl Default for KeyMaps {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyMaps {
    pub fn new() -> Self {
        KeyMaps {
            maps: Self::defaults(),
            current: EMACS.to_owned(),
            variables: HashMap::new(),
        }
    }

    fn defaults() -> HashMap<String, KeyMap> {
        let mut maps = HashMap::new();
        maps.insert(EMACS.to_owned(), emacs());
        maps.insert(VI_INSERT.to_owned(), vi_insert());
        maps.insert(VI_MOVE.to_owned(), vi_move());
        maps
    }

    /// The currently active keymap.
    pub fn active(&self) -> &KeyMap {
        &self.maps[&self.current]
    }

    pub fn active_name(&self) -> &str {
        &self.current
    }

    /// Switch the active keymap. Returns `false` for unknown names.
    pub fn set_active(&mut self, name: &str) -> bool {
        if self.maps.contains_key(name) {
            trace!(target: "termline", "keymap: {}", name);
            self.current = name.to_owned();
            true
        } else {
            false
        }
    }

    /// Add a binding to a named keymap. Returns `false` for unknown
    /// keymap names.
    pub fn bind<A: Into<Action>>(&mut self, keymap: &str, seq: &str, action: A) -> bool {
        match self.maps.get_mut(keymap) {
            Some(map) => {
                map.bind(seq, action);
                true
            }
            None => false,
        }
    }

    pub fn variable(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }

    pub fn set_variable(&mut self, name: &str, value: &str) {
        self.variables.insert(name.to_owned(), value.to_owned());
    }

    /// Reset every map to its default bindings, keeping the active-map
    /// name and the variable table. The init-file parser re-applies its
    /// bindings on top after a reload.
    pub fn reload(&mut self) {
        self.maps = Self::defaults();
    }
}
