//! # Macro Scripting Engine
//!
//! A small expansion language for scripting player input. A script is a
//! sequence of statements separated by `;` or newlines; expansion rewrites
//! it into a flat list of primitive commands which are then dispatched one
//! at a time through a caller-supplied callback.
//!
//! Grammar, applied in this order:
//!
//! - `#` starts a comment running to end of line (ignored inside
//!   parenthesized groups)
//! - `$1`..`$N` and `$*` substitute call-time arguments before anything else
//! - `(<script>)*N` re-expands the inner script N times, recursively
//! - `run <name> [args...]` inlines a named macro's expansion
//! - `<token>*N` repeats one primitive command N times
//! - a token matching `(\d*[nsew])+` is a speed-walk and expands to single
//!   direction commands
//! - anything else passes through whole as one primitive command
//!
//! Expansion is a single pre-pass: the step cap (1000 commands) and the
//! nesting guard (depth 8, shared by groups and macro calls) are enforced
//! before anything dispatches, so a runaway script executes nothing.

pub mod profile;

pub use profile::Profile;

use crate::{config, EramudError, EramudResult};
use log::warn;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Named macro scripts, single-key bindings, and the echo flag, plus the
/// directory profiles persist to.
///
/// The store is a process-lifetime component independent of the world; it
/// owns no gameplay state.
#[derive(Debug, Clone)]
pub struct MacroStore {
    macros: BTreeMap<String, String>,
    bindings: BTreeMap<char, String>,
    /// When set, every dispatched command is echoed with a `"> "` prefix.
    pub echo: bool,
    profile_dir: PathBuf,
}

impl MacroStore {
    /// Creates an empty store persisting profiles under `profile_dir`.
    pub fn new(profile_dir: PathBuf) -> Self {
        Self {
            macros: BTreeMap::new(),
            bindings: BTreeMap::new(),
            echo: false,
            profile_dir,
        }
    }

    /// Defines or replaces a named macro.
    pub fn add(&mut self, name: &str, script: &str) {
        self.macros.insert(name.to_string(), script.to_string());
    }

    /// The script behind a named macro.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.macros.get(name).map(String::as_str)
    }

    /// Removes a named macro; true when it existed.
    pub fn remove(&mut self, name: &str) -> bool {
        self.macros.remove(name).is_some()
    }

    /// Macro names, sorted.
    pub fn list(&self) -> Vec<&str> {
        self.macros.keys().map(String::as_str).collect()
    }

    /// Drops every macro.
    pub fn clear(&mut self) {
        self.macros.clear();
    }

    /// Binds a single key to an inline script.
    pub fn bind(&mut self, key: char, script: &str) {
        self.bindings.insert(key, script.to_string());
    }

    /// Removes a key binding; true when it existed.
    pub fn unbind(&mut self, key: char) -> bool {
        self.bindings.remove(&key).is_some()
    }

    /// The script bound to a key.
    pub fn binding(&self, key: char) -> Option<&str> {
        self.bindings.get(&key).map(String::as_str)
    }

    /// Key/script pairs, sorted by key.
    pub fn bindings(&self) -> Vec<(char, &str)> {
        self.bindings
            .iter()
            .map(|(key, script)| (*key, script.as_str()))
            .collect()
    }

    /// Expands a script into its flat primitive-command list without
    /// executing anything.
    ///
    /// # Examples
    ///
    /// ```
    /// use eramud::MacroStore;
    ///
    /// let store = MacroStore::new(std::path::PathBuf::from("/tmp/profiles"));
    /// let commands = store.expand("3n2e", &[]).unwrap();
    /// assert_eq!(commands, vec!["n", "n", "n", "e", "e"]);
    /// ```
    pub fn expand(&self, script: &str, args: &[String]) -> EramudResult<Vec<String>> {
        let mut commands = Vec::new();
        let mut steps = 0usize;
        self.expand_with_args(script, args, 0, &mut steps, &mut commands)?;
        Ok(commands)
    }

    /// Expands and executes a script.
    ///
    /// Each expanded command is handed to `dispatch`; a false return stops
    /// the rest of the script (in-script `exit`). `wait <ms>` sleeps,
    /// capped, without dispatching. Expansion errors abort before anything
    /// runs.
    pub fn run(
        &self,
        script: &str,
        args: &[String],
        dispatch: &mut dyn FnMut(&str) -> bool,
    ) -> EramudResult<()> {
        let commands = self.expand(script, args)?;
        for command in commands {
            if self.echo {
                println!("> {}", command);
            }
            if let Some(rest) = command.strip_prefix("wait") {
                if rest.is_empty() || rest.starts_with(' ') {
                    sleep_for(rest.trim());
                    continue;
                }
            }
            if !dispatch(&command) {
                break;
            }
        }
        Ok(())
    }

    /// Runs a named macro with arguments. Shares the depth guard with
    /// in-script macro calls.
    pub fn run_named(
        &self,
        name: &str,
        args: &[String],
        dispatch: &mut dyn FnMut(&str) -> bool,
    ) -> EramudResult<()> {
        let script = self.get(name).ok_or_else(|| {
            EramudError::InvalidAction(format!("No macro named '{}'.", name))
        })?;
        self.run(script, args, dispatch)
    }

    /// Runs the script bound to a key, if any. Key presses take no
    /// arguments and share the macro call path.
    pub fn run_key(
        &self,
        key: char,
        dispatch: &mut dyn FnMut(&str) -> bool,
    ) -> EramudResult<()> {
        let script = self.binding(key).ok_or_else(|| {
            EramudError::InvalidAction(format!("Nothing bound to '{}'.", key))
        })?;
        self.run(script, &[], dispatch)
    }

    pub(crate) fn profile_dir(&self) -> &PathBuf {
        &self.profile_dir
    }

    pub(crate) fn macros(&self) -> &BTreeMap<String, String> {
        &self.macros
    }

    pub(crate) fn bindings_map(&self) -> &BTreeMap<char, String> {
        &self.bindings
    }

    pub(crate) fn replace_contents(
        &mut self,
        macros: BTreeMap<String, String>,
        bindings: BTreeMap<char, String>,
        echo: bool,
    ) {
        self.macros = macros;
        self.bindings = bindings;
        self.echo = echo;
    }

    /// Substitutes call arguments once, then expands. This is the entry
    /// point for the top-level script and for each macro call; group
    /// re-expansion bypasses it so arguments are never substituted twice.
    fn expand_with_args(
        &self,
        script: &str,
        args: &[String],
        depth: usize,
        steps: &mut usize,
        out: &mut Vec<String>,
    ) -> EramudResult<()> {
        let substituted = substitute_params(script, args);
        self.expand_into(&substituted, depth, true, steps, out)
    }

    fn expand_into(
        &self,
        script: &str,
        depth: usize,
        comments_active: bool,
        steps: &mut usize,
        out: &mut Vec<String>,
    ) -> EramudResult<()> {
        if depth > config::MACRO_DEPTH_LIMIT {
            return Err(EramudError::ScriptRecursion(depth));
        }
        for statement in split_statements(script, comments_active) {
            if let Some((inner, count)) = parse_group_repeat(&statement) {
                // Comment handling is suspended inside repetition groups.
                for _ in 0..count {
                    self.expand_into(inner, depth + 1, false, steps, out)?;
                }
            } else if let Some((name, call_args)) = parse_macro_call(&statement) {
                let script = self.get(name).ok_or_else(|| {
                    EramudError::InvalidAction(format!("No macro named '{}'.", name))
                })?;
                self.expand_with_args(script, &call_args, depth + 1, steps, out)?;
            } else if let Some((token, count)) = parse_token_repeat(&statement) {
                for _ in 0..count {
                    push_step(token, steps, out)?;
                }
            } else if !statement.contains(char::is_whitespace) {
                if let Some(walk) = parse_speedwalk(&statement) {
                    for direction in walk {
                        push_step(&direction, steps, out)?;
                    }
                } else {
                    push_step(&statement, steps, out)?;
                }
            } else {
                push_step(&statement, steps, out)?;
            }
        }
        Ok(())
    }
}

fn push_step(command: &str, steps: &mut usize, out: &mut Vec<String>) -> EramudResult<()> {
    *steps += 1;
    if *steps > config::MACRO_STEP_LIMIT {
        return Err(EramudError::ScriptStepLimit(config::MACRO_STEP_LIMIT));
    }
    out.push(command.to_string());
    Ok(())
}

/// Replaces `$*` and `$1`..`$N` before any tokenization. Absent positions
/// substitute the empty string; a `$` not followed by `*` or digits is
/// literal.
fn substitute_params(script: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(script.len());
    let mut chars = script.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '$' {
            out.push(ch);
            continue;
        }
        match chars.peek() {
            Some('*') => {
                chars.next();
                out.push_str(&args.join(" "));
            }
            Some(c) if c.is_ascii_digit() => {
                let mut digits = String::new();
                while let Some(c) = chars.peek() {
                    if c.is_ascii_digit() {
                        digits.push(*c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if let Ok(index) = digits.parse::<usize>() {
                    if index >= 1 {
                        if let Some(value) = args.get(index - 1) {
                            out.push_str(value);
                        }
                    }
                }
            }
            _ => out.push('$'),
        }
    }
    out
}

/// Splits a script into trimmed, non-empty statements. `;` and newlines
/// separate statements and `#` opens a comment, but neither applies inside
/// parenthesized repetition groups. `comments_active` is false when the
/// script being split is itself the body of a group.
fn split_statements(script: &str, comments_active: bool) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut in_comment = false;
    for ch in script.chars() {
        if in_comment {
            if ch == '\n' {
                in_comment = false;
                flush_statement(&mut statements, &mut current);
            }
            continue;
        }
        match ch {
            '(' => {
                depth += 1;
                current.push(ch);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            '#' if depth == 0 && comments_active => in_comment = true,
            ';' | '\n' if depth == 0 => flush_statement(&mut statements, &mut current),
            _ => current.push(ch),
        }
    }
    flush_statement(&mut statements, &mut current);
    statements
}

fn flush_statement(statements: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        statements.push(trimmed.to_string());
    }
    current.clear();
}

/// Recognizes `(<script>)*N`. The close paren must balance and the `*N`
/// must consume the rest of the statement.
fn parse_group_repeat(statement: &str) -> Option<(&str, usize)> {
    let rest = statement.strip_prefix('(')?;
    let mut depth = 1usize;
    let mut close = None;
    for (index, ch) in rest.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    close = Some(index);
                    break;
                }
            }
            _ => {}
        }
    }
    let close = close?;
    let inner = &rest[..close];
    let tail = rest[close + 1..].trim();
    let count = tail.strip_prefix('*')?.trim();
    if count.is_empty() || !count.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((inner, count.parse().ok()?))
}

/// Recognizes an in-script macro call: `run <name> [args...]`.
fn parse_macro_call(statement: &str) -> Option<(&str, Vec<String>)> {
    let rest = statement.strip_prefix("run ")?;
    let mut parts = rest.split_whitespace();
    let name = parts.next()?;
    let args = parts.map(str::to_string).collect();
    Some((name, args))
}

/// Recognizes `<token>*N` for a single whitespace-free token.
fn parse_token_repeat(statement: &str) -> Option<(&str, usize)> {
    if statement.contains(char::is_whitespace) {
        return None;
    }
    let star = statement.rfind('*')?;
    let token = &statement[..star];
    let count = &statement[star + 1..];
    if token.is_empty() || token.ends_with(')') || count.is_empty() {
        return None;
    }
    if !count.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((token, count.parse().ok()?))
}

/// Recognizes a speed-walk token (`(\d*[nsew])+`, case-insensitive) and
/// expands it to single direction commands in left-to-right order.
fn parse_speedwalk(token: &str) -> Option<Vec<String>> {
    if token.is_empty() {
        return None;
    }
    let mut walk = Vec::new();
    let mut digits = String::new();
    let mut saw_letter = false;
    for ch in token.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
        } else {
            let letter = ch.to_ascii_lowercase();
            if !matches!(letter, 'n' | 's' | 'e' | 'w') {
                return None;
            }
            saw_letter = true;
            let count: usize = if digits.is_empty() {
                1
            } else {
                digits.parse().ok()?
            };
            for _ in 0..count {
                walk.push(letter.to_string());
            }
            digits.clear();
        }
    }
    if !saw_letter || !digits.is_empty() {
        return None;
    }
    Some(walk)
}

/// Sleeps for a script `wait`, capped at the configured maximum.
fn sleep_for(argument: &str) {
    let requested: u64 = argument.parse().unwrap_or(0);
    let capped = requested.min(config::MACRO_WAIT_CAP_MS);
    if capped < requested {
        warn!("script wait clamped from {}ms to {}ms", requested, capped);
    }
    if capped > 0 {
        std::thread::sleep(Duration::from_millis(capped));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MacroStore {
        MacroStore::new(PathBuf::from("/tmp/eramud-test-profiles"))
    }

    #[test]
    fn test_speedwalk_expansion() {
        let commands = store().expand("3n2e", &[]).unwrap();
        assert_eq!(commands, vec!["n", "n", "n", "e", "e"]);
    }

    #[test]
    fn test_speedwalk_case_insensitive_and_mixed() {
        let commands = store().expand("2N1sW", &[]).unwrap();
        assert_eq!(commands, vec!["n", "n", "s", "w"]);
    }

    #[test]
    fn test_trailing_digits_are_not_a_speedwalk() {
        let commands = store().expand("3n2", &[]).unwrap();
        assert_eq!(commands, vec!["3n2"]);
    }

    #[test]
    fn test_statement_separators() {
        let commands = store().expand("look; get all\nstats", &[]).unwrap();
        assert_eq!(commands, vec!["look", "get all", "stats"]);
    }

    #[test]
    fn test_comments_consume_to_end_of_line() {
        let commands = store()
            .expand("look # admire the view; never runs\nstats", &[])
            .unwrap();
        assert_eq!(commands, vec!["look", "stats"]);
    }

    #[test]
    fn test_comment_char_inert_inside_groups() {
        let commands = store().expand("(look)*2", &[]).unwrap();
        assert_eq!(commands, vec!["look", "look"]);
        // A '#' inside a group is part of the inner script, not a comment
        // boundary for the outer statement split.
        let commands = store().expand("(say #1)*2", &[]).unwrap();
        assert_eq!(commands, vec!["say #1", "say #1"]);
    }

    #[test]
    fn test_parameter_substitution() {
        let commands = store()
            .expand("get $*", &["Ion-Decay".to_string()])
            .unwrap();
        assert_eq!(commands, vec!["get Ion-Decay"]);
    }

    #[test]
    fn test_positional_parameters() {
        let args = vec!["sword".to_string(), "shield".to_string()];
        let commands = store().expand("get $1; drop $2; say $3", &args).unwrap();
        assert_eq!(commands, vec!["get sword", "drop shield", "say"]);
    }

    #[test]
    fn test_star_joins_all_arguments() {
        let args = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let commands = store().expand("say $*", &args).unwrap();
        assert_eq!(commands, vec!["say a b c"]);
    }

    #[test]
    fn test_token_repetition() {
        let commands = store().expand("look*3", &[]).unwrap();
        assert_eq!(commands, vec!["look", "look", "look"]);
    }

    #[test]
    fn test_group_repetition_nests() {
        let commands = store().expand("((n;e)*2;s)*2", &[]).unwrap();
        assert_eq!(
            commands,
            vec!["n", "e", "n", "e", "s", "n", "e", "n", "e", "s"]
        );
    }

    #[test]
    fn test_step_limit_aborts_with_nothing() {
        let err = store().expand("(look)*1001", &[]).unwrap_err();
        assert!(matches!(err, EramudError::ScriptStepLimit(_)));

        // Nothing dispatches when expansion fails.
        let mut dispatched = Vec::new();
        let result = store().run("(look)*1001", &[], &mut |command| {
            dispatched.push(command.to_string());
            true
        });
        assert!(result.is_err());
        assert!(dispatched.is_empty());
    }

    #[test]
    fn test_recursion_limit() {
        // Nine nested groups exceed the depth-8 guard.
        let script = "(((((((((look)*1)*1)*1)*1)*1)*1)*1)*1)*1";
        let err = store().expand(script, &[]).unwrap_err();
        assert!(matches!(err, EramudError::ScriptRecursion(_)));
    }

    #[test]
    fn test_macro_call_inlines_expansion() {
        let mut store = store();
        store.add("sweep", "3n2e");
        let commands = store.expand("look; run sweep", &[]).unwrap();
        assert_eq!(commands, vec!["look", "n", "n", "n", "e", "e"]);
    }

    #[test]
    fn test_macro_call_passes_arguments() {
        let mut store = store();
        store.add("fetch", "get $*");
        let commands = store.expand("run fetch Ion-Decay", &[]).unwrap();
        assert_eq!(commands, vec!["get Ion-Decay"]);
    }

    #[test]
    fn test_self_recursive_macro_hits_depth_guard() {
        let mut store = store();
        store.add("loop", "look; run loop");
        let err = store.expand("run loop", &[]).unwrap_err();
        assert!(matches!(err, EramudError::ScriptRecursion(_)));
    }

    #[test]
    fn test_unknown_macro_call_is_an_error() {
        let err = store().expand("run ghost", &[]).unwrap_err();
        assert!(matches!(err, EramudError::InvalidAction(_)));
    }

    #[test]
    fn test_dispatch_false_stops_script() {
        let mut dispatched = Vec::new();
        store()
            .run("look; exit; stats", &[], &mut |command| {
                dispatched.push(command.to_string());
                command != "exit"
            })
            .unwrap();
        assert_eq!(dispatched, vec!["look", "exit"]);
    }

    #[test]
    fn test_wait_does_not_dispatch() {
        let mut dispatched = Vec::new();
        store()
            .run("look; wait 1; stats", &[], &mut |command| {
                dispatched.push(command.to_string());
                true
            })
            .unwrap();
        assert_eq!(dispatched, vec!["look", "stats"]);
    }

    #[test]
    fn test_run_key_uses_binding() {
        let mut store = store();
        store.bind('x', "look*2");
        let mut dispatched = Vec::new();
        store
            .run_key('x', &mut |command| {
                dispatched.push(command.to_string());
                true
            })
            .unwrap();
        assert_eq!(dispatched, vec!["look", "look"]);
        assert!(store.run_key('y', &mut |_| true).is_err());
    }

    #[test]
    fn test_store_crud() {
        let mut store = store();
        store.add("a", "look");
        store.add("b", "stats");
        assert_eq!(store.list(), vec!["a", "b"]);
        assert_eq!(store.get("a"), Some("look"));
        assert!(store.remove("a"));
        assert!(!store.remove("a"));
        store.clear();
        assert!(store.list().is_empty());
    }
}
