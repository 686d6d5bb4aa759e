use crate::regex::RegexInput;
use proc_macro::TokenStream;
use syn::parse_macro_input;

mod regex;

#[proc_macro]
pub fn compile_regex(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as RegexInput);
    input.compile()
}
