use proc_macro2::{Literal, TokenStream};
use quote::{format_ident, quote};
use rulegen_ast::{Expectation, ParameterValue, PropertyValue, RuleSet, TestCase};
use tracing::{debug, instrument};

use crate::{CodegenError, EndpointConfig, local_ident};

/// Generates a `#[test]` function for each test case.
///
/// Tests build `Params` with the builder, resolve with a
/// `DefaultResolver` found at `config.resolver`, and compare the
/// whole endpoint or the error message.
#[instrument(skip_all, fields(cases = cases.len()))]
pub fn generate_tests(
    ruleset: &RuleSet,
    cases: &[TestCase],
    config: &EndpointConfig,
) -> Result<TokenStream, CodegenError> {
    let resolver = &config.resolver;
    let rt = &config.runtime;

    let mut tests = Vec::with_capacity(cases.len());
    for (i, case) in cases.iter().enumerate() {
        let name = format_ident!("test_{}", i.saturating_add(1));
        debug!(%name, "generating test");

        let mut setters = Vec::with_capacity(case.params.len());
        for (param, value) in &case.params {
            let p = ruleset.parameter(param).ok_or_else(|| {
                CodegenError::invalid_argument(format!("test {name} sets unknown parameter `{param}`"))
            })?;
            if p.ty != value.ty() {
                return Err(CodegenError::type_mismatch(format!(
                    "test {name} sets `{param}`, a {}, to a {}",
                    p.ty,
                    value.ty()
                )));
            }
            let setter = local_ident(param);
            let value = param_value(value);
            setters.push(quote!(.#setter(#value)));
        }

        let docs = case
            .documentation
            .iter()
            .flat_map(|doc| doc.lines())
            .map(|line| format!(" {line}"));
        let check = match &case.expect {
            Expectation::Endpoint(endpoint) => {
                let url = &endpoint.url;
                let headers = endpoint.headers.iter().flat_map(|(name, values)| {
                    values.iter().map(move |value| quote!(.header(#name, #value)))
                });
                let properties = endpoint.properties.iter().map(|(name, value)| {
                    let value = document(rt, value);
                    quote!(.property(#name, #value))
                });
                let msg = format!("expected a valid endpoint: {url}");
                quote! {
                    let endpoint = endpoint.expect(#msg);
                    assert_eq!(
                        endpoint,
                        #rt::Endpoint::builder()
                            .url(#url)
                            #(#headers)*
                            #(#properties)*
                            .build()
                    );
                }
            }
            Expectation::Error(error) => {
                let msg = format!("expected an error: {error}");
                quote! {
                    let error = endpoint.expect_err(#msg);
                    assert_eq!(error.to_string(), #error);
                }
            }
        };

        tests.push(quote! {
            #(#[doc = #docs])*
            #[test]
            fn #name() {
                let params = #resolver::Params::builder()
                    #(#setters)*
                    .build()
                    .expect("invalid params");
                let resolver = #resolver::DefaultResolver::new();
                let endpoint = resolver.resolve_endpoint(&params);
                #check
            }
        });
    }
    Ok(quote!(#(#tests)*))
}

fn param_value(value: &ParameterValue) -> TokenStream {
    match value {
        ParameterValue::String(s) => quote!(#s),
        ParameterValue::Bool(b) => quote!(#b),
        ParameterValue::StringArray(items) => {
            quote!(::std::vec::Vec::<::std::string::String>::from([#(#items.to_owned()),*]))
        }
    }
}

fn document(rt: &syn::Path, value: &PropertyValue) -> TokenStream {
    let doc = quote!(#rt::Document);
    match value {
        PropertyValue::String(s) => quote!(#doc::from(#s)),
        PropertyValue::Bool(b) => quote!(#doc::from(#b)),
        PropertyValue::Int(n) => {
            let n = Literal::i64_suffixed(*n);
            quote!(#doc::from(#n))
        }
        PropertyValue::Array(items) => {
            let items = items.iter().map(|item| document(rt, item));
            quote!(#doc::from(::std::vec::Vec::<#doc>::from([#(#items),*])))
        }
        PropertyValue::Object(fields) => {
            let fields = fields.iter().map(|(name, value)| {
                let value = document(rt, value);
                quote!((#name.to_owned(), #value))
            });
            quote! {
                #doc::from(::std::collections::HashMap::<::std::string::String, #doc>::from([
                    #(#fields),*
                ]))
            }
        }
    }
}
