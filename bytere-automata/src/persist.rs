//! Line-oriented text format for [`Dfa`]s.
//!
//! ```text
//! Derteministic automaton
//! <start state, or '-'>
//! <number of end states>
//! <end state>                 (once per end state)
//! <from> <symbol> <to>        (once per transition)
//! ```
//!
//! A symbol is a graphic ASCII character other than `\`, or one of the escapes
//! `\\` (backslash), `\*` (wildcard) and `\xHH` (any other byte).

use crate::{Dfa, StateID};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;
use winnow::ascii::{digit1, space1};
use winnow::combinator::{alt, preceded};
use winnow::prelude::*;
use winnow::seq;
use winnow::token::{one_of, take_while};

/// First line of every saved automaton.
pub const MAGIC_HEADER: &str = "Derteministic automaton";

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("not a saved automaton: unexpected header {found:?}")]
    BadHeader { found: String },
    #[error("line {line}: {reason}")]
    Malformed { line: usize, reason: String },
    #[error("unexpected end of file: expected {expected}")]
    UnexpectedEof { expected: &'static str },
}

fn state_id(input: &mut &str) -> PResult<StateID> {
    digit1.try_map(str::parse::<StateID>).parse_next(input)
}

fn start_state(input: &mut &str) -> PResult<Option<StateID>> {
    alt(("-".value(None), state_id.map(Some))).parse_next(input)
}

/// `None` is the wildcard.
fn symbol(input: &mut &str) -> PResult<Option<u8>> {
    alt((
        preceded(
            '\\',
            alt((
                '*'.value(None),
                '\\'.value(Some(b'\\')),
                preceded(
                    'x',
                    take_while(2, |c: char| c.is_ascii_hexdigit())
                        .try_map(|hex: &str| u8::from_str_radix(hex, 16)),
                )
                .map(Some),
            )),
        ),
        one_of(|c: char| c.is_ascii_graphic() && c != '\\').map(|c: char| Some(c as u8)),
    ))
    .parse_next(input)
}

fn transition(input: &mut &str) -> PResult<(StateID, Option<u8>, StateID)> {
    seq!(state_id, _: space1, symbol, _: space1, state_id).parse_next(input)
}

fn encode_symbol(byte: Option<u8>) -> String {
    match byte {
        None => "\\*".to_string(),
        Some(b'\\') => "\\\\".to_string(),
        Some(b) if b.is_ascii_graphic() => char::from(b).to_string(),
        Some(b) => format!("\\x{b:02x}"),
    }
}

/// Numbers lines from 1 and strips a trailing `\r`.
struct LineReader<R> {
    lines: io::Lines<R>,
    number: usize,
}

impl<R: BufRead> LineReader<R> {
    fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            number: 0,
        }
    }

    fn next_line(&mut self) -> Result<Option<String>, PersistError> {
        let Some(line) = self.lines.next().transpose()? else {
            return Ok(None);
        };
        self.number += 1;
        Ok(Some(match line.strip_suffix('\r') {
            Some(stripped) => stripped.to_string(),
            None => line,
        }))
    }

    fn expect_line(&mut self, expected: &'static str) -> Result<String, PersistError> {
        self.next_line()?
            .ok_or(PersistError::UnexpectedEof { expected })
    }

    fn parse<O>(
        &self,
        line: &str,
        expected: &str,
        mut parser: impl FnMut(&mut &str) -> PResult<O>,
    ) -> Result<O, PersistError> {
        parser
            .parse(line)
            .map_err(|_| PersistError::Malformed {
                line: self.number,
                reason: format!("expected {expected}, found {line:?}"),
            })
    }
}

impl Dfa {
    /// Writes this automaton in the text format described in the [module docs](self).
    pub fn write_to(&self, w: &mut impl Write) -> io::Result<()> {
        writeln!(w, "{MAGIC_HEADER}")?;
        match self.start {
            Some(start) => writeln!(w, "{start}")?,
            None => writeln!(w, "-")?,
        }

        let end_states = self.end_states();
        writeln!(w, "{}", end_states.len())?;
        for state in end_states {
            writeln!(w, "{state}")?;
        }

        for (from, byte, to) in self.transitions() {
            writeln!(w, "{from} {} {to}", encode_symbol(byte))?;
        }

        Ok(())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let mut w = BufWriter::new(File::create(path)?);
        self.write_to(&mut w)?;
        w.flush()?;
        Ok(())
    }

    /// Reads an automaton written by [`Dfa::write_to`].
    ///
    /// Blank lines between transitions are ignored.
    /// Two transitions out of the same state on the same symbol must agree on the target.
    pub fn read_from(reader: impl BufRead) -> Result<Dfa, PersistError> {
        let mut lines = LineReader::new(reader);
        let mut dfa = Dfa::default();

        let header = lines.expect_line("the header")?;
        if header != MAGIC_HEADER {
            return Err(PersistError::BadHeader { found: header });
        }

        let line = lines.expect_line("the start state")?;
        if let Some(start) = lines.parse(&line, "a state id or '-'", start_state)? {
            dfa.set_start_state(start);
        }

        let line = lines.expect_line("the number of end states")?;
        let end_count = lines.parse(&line, "a count", state_id)?;
        for _ in 0..end_count {
            let line = lines.expect_line("an end state")?;
            let state = lines.parse(&line, "a state id", state_id)?;
            dfa.add_end_state(state);
        }

        while let Some(line) = lines.next_line()? {
            if line.trim().is_empty() {
                continue;
            }
            let (from, byte, to) = lines.parse(&line, "`<from> <symbol> <to>`", transition)?;
            match dfa.add_transition(from, byte, to) {
                Some(previous) if previous != to => {
                    return Err(PersistError::Malformed {
                        line: lines.number,
                        reason: format!(
                            "state {from} already moves to {previous} on {}",
                            encode_symbol(byte)
                        ),
                    });
                }
                _ => {}
            }
        }

        log::debug!("read automaton with {} states", dfa.state_count());
        Ok(dfa)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Dfa, PersistError> {
        Self::read_from(BufReader::new(File::open(path)?))
    }
}
