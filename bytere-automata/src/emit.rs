use crate::{Dfa, MatchState};
use proc_macro2::{Ident, TokenStream};
use quote::quote;
use syn::Visibility;

impl Dfa {
    /// Convert this automaton into rust code that matches the same language.
    /// `name` is the name of the struct that is emitted. It implements `bytere::RegexMatcher`
    /// over bytes, so the generated code must be compiled in a crate that depends on `bytere`.
    pub fn emit(&self, name: &Ident, vis: &Visibility) -> TokenStream {
        // a matcher without a start state sits in a state that has no transitions
        // spelled as a path so it fits the target's pointer width
        let initial = match self.start {
            Some(start) => quote!(#start),
            None => quote!(::core::primitive::usize::MAX),
        };

        let ids: Vec<_> = self.states.keys().collect();
        let arms: Vec<_> = self
            .states
            .values()
            .map(|state| {
                let bytes = state.transition_table.keys();
                let targets = state.transition_table.values();
                let default = match state.default_transition {
                    Some(target) => quote!(::core::option::Option::Some(#target)),
                    None => quote!(::core::option::Option::None),
                };

                quote!(
                    match token {
                        #(
                            #bytes => ::core::option::Option::Some(#targets),
                        )*
                        _ => #default,
                    }
                )
            })
            .collect();

        let accepting: Vec<_> = self.states.values().map(MatchState::is_accepting).collect();

        quote!(
            #[derive(Debug, Clone)]
            #vis struct #name {
                state: usize,
            }

            impl #name {
                #vis fn new() -> Self {
                    Self { state: #initial }
                }
            }

            impl ::core::default::Default for #name {
                fn default() -> Self {
                    Self::new()
                }
            }

            impl ::bytere::RegexMatcher for #name {
                type Alphabet = u8;

                #[allow(unreachable_patterns)]
                fn accept(&mut self, token: u8) -> bool {
                    let next: ::core::option::Option<usize> = match self.state {
                        #(
                            #ids => #arms,
                        )*
                        _ => ::core::option::Option::None,
                    };
                    match next {
                        ::core::option::Option::Some(state) => {
                            self.state = state;
                            true
                        }
                        ::core::option::Option::None => false,
                    }
                }

                fn is_accepting(&self) -> bool {
                    match self.state {
                        #(
                            #ids => #accepting,
                        )*
                        _ => false,
                    }
                }

                fn reset(&mut self) {
                    self.state = #initial;
                }
            }
        )
    }
}
