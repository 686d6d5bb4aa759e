use bytere_automata::{compile, Dfa};
use proc_macro::TokenStream;
use quote::quote;
use syn::parse::{Parse, ParseStream};
use syn::{Attribute, Ident, LitStr, Token, Visibility};

#[cfg(feature = "dot")]
use std::fs::File;
#[cfg(feature = "dot")]
use syn::{Expr, ExprLit, Lit, Meta, MetaNameValue};

pub(crate) struct RegexInput {
    attrs: Vec<Attribute>,
    vis: Visibility,
    _type: Token![type],
    name: Ident,
    _equals: Token![=],
    pattern: LitStr,
    _semi: Option<Token![;]>,
}

impl Parse for RegexInput {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        Ok(Self {
            attrs: input.call(Attribute::parse_outer)?,
            vis: input.parse()?,
            _type: input.parse()?,
            name: input.parse()?,
            _equals: input.parse()?,
            pattern: input.parse()?,
            _semi: input.parse()?,
        })
    }
}

impl RegexInput {
    pub fn compile(self) -> TokenStream {
        let mut errors = Vec::new();
        #[cfg(feature = "dot")]
        let mut graph = None;

        for i in self.attrs {
            let attr = i.meta.clone();
            match attr {
                #[cfg(feature = "dot")]
                Meta::NameValue(MetaNameValue {
                    path,
                    value:
                        Expr::Lit(ExprLit {
                            lit: Lit::Str(s), ..
                        }),
                    ..
                }) if path.is_ident("graph") => {
                    graph = Some(s);
                }
                i => errors.push(syn::Error::new_spanned(i, "unexpected attribute")),
            }
        }

        // an invalid pattern still emits a matcher, so uses of it only report the pattern error
        let compiled = match compile(self.pattern.value()) {
            Ok(dfa) => dfa,
            Err(e) => {
                errors.push(syn::Error::new(
                    self.pattern.span(),
                    format!("invalid regular expression: {e}"),
                ));
                Dfa::default()
            }
        };

        #[cfg(feature = "dot")]
        if let Some(path) = graph {
            let written = File::create(path.value()).and_then(|mut f| compiled.output_dot(&mut f));
            if let Err(e) = written {
                errors.push(syn::Error::new(
                    path.span(),
                    format!("can't write dot file at {}: {e}", path.value()),
                ));
            }
        }

        let errors = errors.into_iter().map(syn::Error::into_compile_error);
        let matcher = compiled.emit(&self.name, &self.vis);
        quote!(
            #(#errors)*
            #matcher
        )
        .into()
    }
}
