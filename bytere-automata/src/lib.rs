//! Byte-oriented regular expressions compiled to deterministic automata.
//!
//! A pattern goes through three stages:
//! [`parse_regex`] turns it into an [`Ast`], [`build_nfa`] turns that into a Thompson-style [`Nfa`],
//! and [`determinize`] turns the NFA into a [`Dfa`] by subset construction.
//! [`compile`] runs all three.
//!
//! A [`Dfa`] answers anchored longest-prefix queries through [`Dfa::match_at`],
//! and can be written to and read back from a line-oriented text format (see [`MAGIC_HEADER`]).

use thiserror::Error;

mod ast;
mod compile;
mod dfa;
mod dynamic;
mod nfa;
mod options;
mod parse;
mod persist;

#[cfg(feature = "emit")]
mod emit;

#[cfg(feature = "dot")]
mod dot;

pub use ast::{Ast, CharAtom, CharClass, Node, NodeId};
pub use compile::determinize;
pub use dfa::{Dfa, MatchState};
pub use dynamic::DfaMatcher;
pub use nfa::{Nfa, Symbol, TransitionTable, UidGenerator};
pub use options::CompileOptions;
pub use parse::ParseError;
pub use persist::{PersistError, MAGIC_HEADER};

/// Identifies a state of an [`Nfa`] or a [`Dfa`].
pub type StateID = usize;

/// A matcher that consumes its input one symbol at a time.
pub trait RegexMatcher {
    type Alphabet;

    /// Moves to the next state on `inp`.
    ///
    /// Returns false, and stays in the current state, when there is no transition on `inp`.
    fn accept(&mut self, inp: Self::Alphabet) -> bool;

    /// Accepts symbols until one is rejected. Returns false if any symbol was rejected.
    fn accept_many(&mut self, inp: impl IntoIterator<Item = Self::Alphabet>) -> bool {
        inp.into_iter().all(|i| self.accept(i))
    }

    /// Returns true if the regular expression accepts the whole input iterator
    fn accepts(&mut self, iter: impl IntoIterator<Item = Self::Alphabet>) -> bool {
        self.accept_many(iter) && self.is_accepting()
    }

    fn is_accepting(&self) -> bool;

    /// Returns to the start state.
    fn reset(&mut self);

    /// Number of symbols in the longest prefix of `input` that leads to an accepting state,
    /// starting from the current state.
    fn longest_prefix(&mut self, input: impl IntoIterator<Item = Self::Alphabet>) -> Option<usize> {
        let mut best = None;
        let mut consumed = 0;
        for i in input {
            if self.is_accepting() {
                best = Some(consumed);
            }
            if !self.accept(i) {
                return best;
            }
            consumed += 1;
        }

        if self.is_accepting() {
            Some(consumed)
        } else {
            best
        }
    }
}

/// Why a pattern could not be compiled.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("determinization exceeded the limit of {limit} states")]
    TooManyStates { limit: usize },
}

/// parse a string to a regular expression
pub fn parse_regex(pattern: impl AsRef<str>) -> Result<Ast, ParseError> {
    parse_regex_with(pattern, &CompileOptions::default())
}

/// parse a string to a regular expression, with the limits in `options`
pub fn parse_regex_with(
    pattern: impl AsRef<str>,
    options: &CompileOptions,
) -> Result<Ast, ParseError> {
    parse::RegexParser::new(pattern.as_ref().as_bytes(), options.max_repetition).parse()
}

/// Builds the nondeterministic automaton for `ast`, numbering states from
/// [`CompileOptions::first_state_id`].
pub fn build_nfa(ast: &Ast, options: &CompileOptions) -> Nfa {
    Nfa::build(ast, &mut UidGenerator::starting_at(options.first_state_id))
}

/// Compiles `pattern` into a deterministic automaton with the default options.
pub fn compile(pattern: impl AsRef<str>) -> Result<Dfa, CompileError> {
    compile_with(pattern, &CompileOptions::default())
}

/// Compiles `pattern` to a [`Dfa`] within the limits in `options`.
pub fn compile_with(
    pattern: impl AsRef<str>,
    options: &CompileOptions,
) -> Result<Dfa, CompileError> {
    let pattern = pattern.as_ref();
    let ast = parse_regex_with(pattern, options)?;
    log::debug!("parsed {pattern:?} into {} nodes", ast.len());

    let nfa = build_nfa(&ast, options);
    log::debug!("built NFA with {} states", nfa.state_count());

    Ok(determinize(&nfa, options.max_dfa_states)?)
}

#[cfg(test)]
#[ctor::ctor]
fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}
