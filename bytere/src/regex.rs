use bytere_automata::{
    compile_with, CompileError, CompileOptions, Dfa, DfaMatcher, PersistError, RegexMatcher,
};
use std::fmt::{Display, Formatter};
use std::path::Path;

/// A compiled regular expression.
///
/// Only the deterministic automaton is kept after compiling.
/// It is never modified while matching, so a `Regex` can be shared between threads.
#[derive(Debug, Clone)]
pub struct Regex {
    pattern: Option<String>,
    dfa: Dfa,
}

impl Regex {
    /// Compiles `pattern` with the default [`CompileOptions`].
    pub fn new(pattern: &str) -> Result<Self, CompileError> {
        Self::with_options(pattern, &CompileOptions::default())
    }

    /// Compiles `pattern`.
    pub fn with_options(pattern: &str, options: &CompileOptions) -> Result<Self, CompileError> {
        let dfa = compile_with(pattern, options)?;
        log::debug!("compiled {pattern:?} into {} DFA states", dfa.state_count());
        Ok(Self {
            pattern: Some(pattern.to_string()),
            dfa,
        })
    }

    /// Wraps an automaton that was built or loaded elsewhere.
    pub fn from_dfa(dfa: Dfa) -> Self {
        Self { pattern: None, dfa }
    }

    /// Length of the longest prefix of `text[offset..]` that matches, see [`Dfa::match_at`].
    pub fn match_at(&self, text: impl AsRef<[u8]>, offset: usize) -> Option<usize> {
        self.dfa.match_at(text, offset)
    }

    /// Like [`Regex::match_at`], but returns -1 when nothing matches.
    pub fn find_len(&self, text: impl AsRef<[u8]>, offset: usize) -> isize {
        self.match_at(text, offset)
            .map_or(-1, |len| isize::try_from(len).unwrap_or(isize::MAX))
    }

    /// Returns true if the whole of `text` matches.
    pub fn is_match(&self, text: impl AsRef<[u8]>) -> bool {
        self.matcher().accepts(text.as_ref().iter().copied())
    }

    /// A matcher that can be fed one byte at a time.
    pub fn matcher(&self) -> DfaMatcher<'_> {
        self.dfa.matcher()
    }

    /// Writes the automaton to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let path = path.as_ref();
        self.dfa.save(path)?;
        log::debug!("saved automaton to {}", path.display());
        Ok(())
    }

    /// Reads an automaton written by [`Regex::save`].
    /// The result has no pattern text.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        Ok(Self::from_dfa(Dfa::load(path)?))
    }

    /// Replaces the automaton with the one saved at `path`.
    ///
    /// On failure `self` is left exactly as it was.
    pub fn reload(&mut self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let path = path.as_ref();
        match Dfa::load(path) {
            Ok(dfa) => {
                log::debug!("reloaded automaton from {}", path.display());
                *self = Self::from_dfa(dfa);
                Ok(())
            }
            Err(e) => {
                log::warn!(
                    "failed to load automaton from {}, keeping the current one: {e}",
                    path.display()
                );
                Err(e)
            }
        }
    }

    /// The compiled automaton.
    pub fn dfa(&self) -> &Dfa {
        &self.dfa
    }

    /// The pattern this was compiled from, or `None` if the automaton was loaded.
    pub fn as_str(&self) -> Option<&str> {
        self.pattern.as_deref()
    }
}

impl From<Dfa> for Regex {
    fn from(dfa: Dfa) -> Self {
        Self::from_dfa(dfa)
    }
}

impl Display for Regex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.pattern {
            Some(pattern) => write!(f, "{pattern}"),
            None => write!(f, "{}", self.dfa),
        }
    }
}
