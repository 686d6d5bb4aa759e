//! Saves a compiled automaton to a file, or loads one and prints its transition table.
//!
//! ```text
//! cargo run --example persist -- save /tmp/automaton.dfa
//! cargo run --example persist -- load /tmp/automaton.dfa
//! ```

use bytere::Regex;
use std::process::ExitCode;

const PATTERN: &str = "(ab|.?c)+";

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = match args.as_slice() {
        [cmd, path] if cmd == "save" => Regex::new(PATTERN)
            .map_err(|e| e.to_string())
            .and_then(|re| re.save(path).map_err(|e| e.to_string()))
            .map(|()| println!("saved {PATTERN:?} to {path}")),
        [cmd, path] if cmd == "load" => Regex::load(path)
            .map(|re| print!("{}", re.dfa()))
            .map_err(|e| e.to_string()),
        _ => Err("usage: persist (save|load) <path>".to_string()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
