//! Compiles a pattern and prints the length of its longest match at the start of a text.
//!
//! ```text
//! cargo run --example match -- '(ab|c)*' ababcx
//! ```

use bytere::Regex;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [pattern, text] = args.as_slice() else {
        eprintln!("usage: match <pattern> <text>");
        return ExitCode::FAILURE;
    };

    let re = match Regex::new(pattern) {
        Ok(re) => re,
        Err(e) => {
            eprintln!("invalid pattern {pattern:?}: {e}");
            return ExitCode::FAILURE;
        }
    };

    match re.match_at(text, 0) {
        Some(len) => println!("{len}"),
        None => println!("no match"),
    }
    ExitCode::SUCCESS
}
