#![warn(missing_docs)]
//! Byte-oriented regular expressions, compiled to deterministic automata.
//!
//! ```rust
//! use bytere::Regex;
//!
//! let re = Regex::new("(ab|c)*").unwrap();
//! assert_eq!(re.match_at("ababcx", 0), Some(5));
//! assert_eq!(re.find_len("x", 1), 0);
//! ```
//!
//! A pattern is made of bytes.
//! `|` separates alternatives, `*`, `+`, `?`, `{n}` and `{n,m}` repeat the preceding item,
//! parentheses group, `[abc]` and `[^abc]` select or exclude bytes,
//! and `\d`, `\a` and `\w` match a digit, an alphanumeric byte or `_`, and a letter.
//! Any other escaped byte stands for itself.
//! Matching is anchored: [`Regex::match_at`] returns the length of the longest match
//! starting exactly at the given offset.
//!
//! A compiled automaton can be saved to a text file and loaded back,
//! see [`Regex::save`] and [`Regex::load`].
#![cfg_attr(docsrs, feature(doc_auto_cfg, doc_cfg))]

// lets the code generated by `compile_regex!` refer to `::bytere` from inside this crate
extern crate self as bytere;

pub use bytere_automata::*;

mod regex;
pub use regex::Regex;

/// Compile a regular expression into Rust code.
///
/// Generates a struct implementing [`RegexMatcher`] over bytes.
/// Instances of this struct can match the regular expression that is specified.
/// The pattern is checked while compiling: an invalid pattern is a compile error
/// pointing at the pattern literal.
///
/// Syntax: `$attrs $vis type $type = "pattern";`.
/// For example:
///
/// ```rust
/// use bytere::*;
///
/// compile_regex!(type Machine = "a*b");
/// assert!(Machine::new().accepts("aab".bytes()));
/// assert_eq!(Machine::new().longest_prefix("abb".bytes()), Some(2));
/// ```
///
/// # Supported Attributes
/// * `#[graph="$path"]` location to put a graphviz dot file representing the generated finite state machine. (only with the `dot` feature)
///
/// # Query Directly
///
/// Instead of using [`compile_regex`], you can also use [`query_regex`], which has a simpler syntax
/// and can immediately be used to match a string. This is useful if you want to use a regular expression
/// only once.
/// ```
/// use bytere::{query_regex, RegexMatcher};
/// assert!(query_regex!("\\d+").accepts("2024".bytes()));
/// ```
pub use bytere_macros::compile_regex;

/// Instantiates a matcher for `pattern`, generated at compile time.
/// See [`compile_regex`].
#[macro_export]
macro_rules! query_regex {
    ($pattern:literal) => {{
        $crate::compile_regex!(type QueryRegex = $pattern);
        QueryRegex::new()
    }};
}

#[cfg(test)]
#[ctor::ctor]
fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}
