use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use rulegen_ast::{Parameter, ParameterType, ParameterValue, RuleSet};

use crate::local_ident;

/// Emits `Params` and `ParamsBuilder`.
pub(crate) fn params(ruleset: &RuleSet, runtime: &syn::Path) -> TokenStream {
    let mut fields = Vec::new();
    let mut getters = Vec::new();
    let mut builder_fields = Vec::new();
    let mut setters = Vec::new();
    let mut inits = Vec::new();

    for p in &ruleset.parameters {
        let ident = local_ident(&p.name);
        let ty = owned_type(p.ty);
        let docs = docs(p);

        if p.is_always_set() {
            fields.push(quote!(#ident: #ty));
        } else {
            fields.push(quote!(#ident: ::std::option::Option<#ty>));
        }
        getters.push(getter(p));
        builder_fields.push(quote!(#ident: ::std::option::Option<#ty>));

        let set = format_ident!("set_{}", ident);
        setters.push(quote! {
            #(#[doc = #docs])*
            #[must_use]
            pub fn #ident(mut self, value: impl ::std::convert::Into<#ty>) -> Self {
                self.#ident = ::std::option::Option::Some(value.into());
                self
            }

            #(#[doc = #docs])*
            #[must_use]
            pub fn #set(mut self, param: ::std::option::Option<#ty>) -> Self {
                self.#ident = param;
                self
            }
        });

        let init = match (&p.default, p.required) {
            (Some(ParameterValue::Bool(b)), _) => quote!(self.#ident.unwrap_or(#b)),
            (Some(default), _) => {
                let default = default_value(default);
                quote!(self.#ident.unwrap_or_else(|| #default))
            }
            (None, true) => {
                let name = ident.to_string();
                let name = name.trim_start_matches("r#");
                quote!(self.#ident.ok_or_else(|| #runtime::InvalidParams::missing(#name))?)
            }
            (None, false) => quote!(self.#ident),
        };
        inits.push(quote!(#ident: #init));
    }

    quote! {
        /// The parameters endpoint resolution depends on.
        #[non_exhaustive]
        #[derive(Clone, Debug, PartialEq)]
        pub struct Params {
            #(#fields,)*
        }

        impl Params {
            /// Starts building a `Params`.
            pub fn builder() -> ParamsBuilder {
                ParamsBuilder::default()
            }

            #(#getters)*
        }

        /// Builds a [`Params`].
        #[derive(Clone, Debug, Default, PartialEq)]
        pub struct ParamsBuilder {
            #(#builder_fields,)*
        }

        impl ParamsBuilder {
            /// Fills in defaults and checks that every required
            /// parameter is set.
            pub fn build(self) -> ::std::result::Result<Params, #runtime::InvalidParams> {
                ::std::result::Result::Ok(Params {
                    #(#inits,)*
                })
            }

            #(#setters)*
        }
    }
}

fn owned_type(ty: ParameterType) -> TokenStream {
    match ty {
        ParameterType::String => quote!(::std::string::String),
        ParameterType::Boolean => quote!(bool),
        ParameterType::StringArray => quote!(::std::vec::Vec<::std::string::String>),
    }
}

fn getter(p: &Parameter) -> TokenStream {
    let ident = local_ident(&p.name);
    let docs = docs(p);
    let (ty, body) = match (p.ty, p.is_always_set()) {
        (ParameterType::String, true) => (quote!(&str), quote!(&self.#ident)),
        (ParameterType::String, false) => (
            quote!(::std::option::Option<&str>),
            quote!(self.#ident.as_deref()),
        ),
        (ParameterType::Boolean, true) => (quote!(bool), quote!(self.#ident)),
        (ParameterType::Boolean, false) => {
            (quote!(::std::option::Option<bool>), quote!(self.#ident))
        }
        (ParameterType::StringArray, true) => {
            (quote!(&[::std::string::String]), quote!(&self.#ident))
        }
        (ParameterType::StringArray, false) => (
            quote!(::std::option::Option<&[::std::string::String]>),
            quote!(self.#ident.as_deref()),
        ),
    };
    quote! {
        #(#[doc = #docs])*
        pub fn #ident(&self) -> #ty {
            #body
        }
    }
}

fn default_value(value: &ParameterValue) -> TokenStream {
    match value {
        ParameterValue::String(s) => quote!(#s.to_owned()),
        ParameterValue::Bool(b) => quote!(#b),
        ParameterValue::StringArray(items) => {
            quote!(::std::vec![#(#items.to_owned()),*])
        }
    }
}

fn docs(p: &Parameter) -> Vec<String> {
    let mut docs = Vec::new();
    if let Some(doc) = &p.documentation {
        docs.extend(doc.lines().map(|line| format!(" {line}")));
    }
    if let Some(built_in) = &p.built_in {
        if !docs.is_empty() {
            docs.push(String::new());
        }
        docs.push(format!(" Supplied by the `{built_in}` built-in."));
    }
    if let Some(deprecated) = &p.deprecated {
        if !docs.is_empty() {
            docs.push(String::new());
        }
        let mut line = String::from(" Deprecated");
        if let Some(since) = &deprecated.since {
            line.push_str(&format!(" since {since}"));
        }
        if let Some(message) = &deprecated.message {
            line.push_str(&format!(": {message}"));
        }
        docs.push(line);
    }
    docs
}
