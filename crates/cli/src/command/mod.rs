//! The command model (spec §4.7, §6): a hand-rolled noun/verb/switch
//! grammar rather than a clap derive grammar (see `SPEC_FULL.md` §1) —
//! the set of verbs, their accepted nouns, and each noun's aliases are all
//! runtime data here, not a static derive surface.
//!
//! ```text
//! command         := noun_ref* verb_or_listing
//! noun_ref        := noun_name [integer]
//! verb_or_listing := verb switch* arg* | ε
//! ```

mod bound;
mod tokenizer;

pub use bound::{bind, BoundCommand};
pub use tokenizer::tokenize;

use dbg_core::error::{Error, Result};

/// One of the fixed noun kinds spec §4.7 names. `sym-server`'s hyphen
/// means it can never collide with a verb token (no verb contains one).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Noun {
    Process,
    Thread,
    Frame,
    Job,
    Breakpoint,
    Filter,
    SymServer,
    Global,
}

const ALL_NOUNS: [Noun; 8] = [
    Noun::Process,
    Noun::Thread,
    Noun::Frame,
    Noun::Job,
    Noun::Breakpoint,
    Noun::Filter,
    Noun::SymServer,
    Noun::Global,
];

impl Noun {
    /// Canonical name plus any short aliases. `breakpoint`'s `break` is
    /// deliberately absent: `break` is the verb that creates one, and a
    /// noun alias sharing that token would make `break main.cc:10`
    /// ambiguous between "noun breakpoint, verb main.cc:10" and "verb
    /// break, arg main.cc:10".
    fn aliases(self) -> &'static [&'static str] {
        match self {
            Noun::Process => &["process", "pr"],
            Noun::Thread => &["thread", "th"],
            Noun::Frame => &["frame", "f"],
            Noun::Job => &["job", "j"],
            Noun::Breakpoint => &["breakpoint", "bp"],
            Noun::Filter => &["filter", "fi"],
            Noun::SymServer => &["sym-server", "ss"],
            Noun::Global => &["global", "gl"],
        }
    }

    fn from_token(token: &str) -> Option<Noun> {
        ALL_NOUNS.into_iter().find(|n| n.aliases().contains(&token))
    }
}

/// A parsed `noun_name [integer]` with the noun resolved but the index
/// still a bare `u32` — binding it to a real id happens in [`bound`],
/// which needs a live `ConsoleContext` this module has no knowledge of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NounRef {
    pub noun: Noun,
    pub index: Option<u32>,
}

/// A `--long[=value]` or `-s[=value]` switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Switch {
    pub name: String,
    pub value: Option<String>,
}

/// The result of parsing one command line, before context binding.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedCommand {
    pub nouns: Vec<NounRef>,
    /// `None` for the `ε` (listing) case.
    pub verb: Option<String>,
    pub switches: Vec<Switch>,
    pub args: Vec<String>,
}

fn parse_switch(token: &str) -> Switch {
    let body = token.trim_start_matches('-');
    match body.split_once('=') {
        Some((name, value)) => Switch { name: name.to_string(), value: Some(value.to_string()) },
        None => Switch { name: body.to_string(), value: None },
    }
}

/// Parses a raw command line into a [`ParsedCommand`]. Unknown
/// noun/verb/switch names are not rejected here — that happens once a
/// verb has validated its accepted noun set and switch list (spec §4.7
/// "ValidateNouns"), which this module doesn't know about.
pub fn parse(line: &str) -> Result<ParsedCommand> {
    let tokens = tokenize(line)?;
    let mut iter = tokens.into_iter().peekable();

    let mut nouns = Vec::new();
    while let Some(token) = iter.peek() {
        let Some(noun) = Noun::from_token(token.to_ascii_lowercase().as_str()) else {
            break;
        };
        iter.next();
        let index = match iter.peek().and_then(|next| next.parse::<u32>().ok()) {
            Some(index) => {
                iter.next();
                Some(index)
            }
            None => None,
        };
        nouns.push(NounRef { noun, index });
    }

    let verb = iter.next();
    let mut switches = Vec::new();
    let mut args = Vec::new();
    for token in iter {
        // A leading `-` that isn't a negative number is a switch; `mem-read`
        // addresses and the like are always hex/unsigned, so this never
        // misclassifies a real argument.
        if token.starts_with('-') && token.parse::<i64>().is_err() {
            switches.push(parse_switch(&token));
        } else {
            args.push(token);
        }
    }

    Ok(ParsedCommand { nouns, verb: verb.map(|v| v.to_ascii_lowercase()), switches, args })
}

/// Looks up a single switch by name, for verbs that only care whether it
/// was given (`--unsymbolized`) rather than its value.
pub fn has_switch(switches: &[Switch], name: &str) -> bool {
    switches.iter().any(|s| s.name == name)
}

/// Looks up a switch's value by name, erroring if it was given as a bare
/// flag with no `=value` (spec §4.7 "Switch handling").
pub fn switch_value<'a>(switches: &'a [Switch], name: &str) -> Result<Option<&'a str>> {
    match switches.iter().find(|s| s.name == name) {
        None => Ok(None),
        Some(Switch { value: Some(v), .. }) => Ok(Some(v.as_str())),
        Some(Switch { value: None, .. }) => Err(Error::Input(format!("--{name} requires a value"))),
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
