use proc_macro2::TokenStream;
use quote::quote;
use rulegen_ast::RuleSet;
use tracing::instrument;

use crate::{CodegenError, FunctionRegistry, RulesetCompiler, params::params};

/// Configures [`generate_resolver`] and
/// [`generate_tests`](crate::generate_tests).
#[derive(Clone, Debug)]
pub struct EndpointConfig {
    /// The path generated code uses for `rulegen-runtime`.
    pub runtime: syn::Path,
    /// The path generated tests use for the module holding the
    /// resolver.
    pub resolver: syn::Path,
    /// The functions available to the rules.
    pub registry: FunctionRegistry,
    /// The deepest tree nesting the compiler accepts.
    pub max_depth: usize,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            runtime: syn::parse_quote!(::rulegen_runtime),
            resolver: syn::parse_quote!(super),
            registry: FunctionRegistry::standard(),
            max_depth: 64,
        }
    }
}

/// Generates the resolver for `ruleset`.
///
/// The output is a sequence of items: `Params`, `ParamsBuilder`,
/// `DefaultResolver` and the private `resolve_endpoint`
/// function that runs the rules.
#[instrument(skip_all)]
pub fn generate_resolver(
    ruleset: &RuleSet,
    config: &EndpointConfig,
) -> Result<TokenStream, CodegenError> {
    let compiled = RulesetCompiler::new(ruleset)
        .runtime(config.runtime.clone())
        .registry(config.registry.clone())
        .max_depth(config.max_depth)
        .compile()?;

    let rt = &config.runtime;
    let params = params(ruleset, rt);
    let idents = compiled
        .fields
        .iter()
        .map(|f| &f.ident)
        .collect::<Vec<_>>();
    let tys = compiled.fields.iter().map(|f| &f.ty);
    let inits = compiled.fields.iter().map(|f| &f.init);
    let function = &compiled.function;

    Ok(quote! {
        #params

        /// Resolves endpoints by evaluating the ruleset.
        #[derive(Debug)]
        pub struct DefaultResolver {
            #(#idents: #tys,)*
        }

        impl DefaultResolver {
            /// Creates a resolver.
            pub fn new() -> Self {
                Self {
                    #(#idents: #inits,)*
                }
            }

            /// Resolves the endpoint for `params`.
            ///
            /// When no rule matches, the error's source explains
            /// the last check that failed.
            pub fn resolve_endpoint(
                &self,
                params: &Params,
            ) -> ::std::result::Result<#rt::Endpoint, #rt::ResolveEndpointError> {
                let mut diagnostic_collector = #rt::DiagnosticCollector::new();
                resolve_endpoint(params, &mut diagnostic_collector, #(&self.#idents,)*)
                    .map_err(|err| err.with_source(diagnostic_collector.take_last_error()))
            }
        }

        impl ::std::default::Default for DefaultResolver {
            fn default() -> Self {
                Self::new()
            }
        }

        #function
    })
}
