use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};
use rulegen_ast::{Condition, EndpointTemplate, Expr, ParameterType, Rule, RuleKind, RuleSet};
use tracing::{debug, error, instrument};

use crate::{
    Binding, CodegenError, CodegenErrorKind, FunctionRegistry, ResolverField, RulesType, Scope,
    local_ident,
};

const DEFAULT_MAX_DEPTH: usize = 64;

/// Compiles a ruleset into the body of a resolver.
///
/// ```ignore
/// let compiled = RulesetCompiler::new(&ruleset)
///     .runtime(parse_quote!(::rulegen_runtime))
///     .compile()?;
/// ```
#[derive(Clone, Debug)]
pub struct RulesetCompiler<'r> {
    ruleset: &'r RuleSet,
    pub(crate) runtime: syn::Path,
    pub(crate) registry: FunctionRegistry,
    max_depth: usize,
    pub(crate) diagnostics: Ident,
}

/// The output of [`RulesetCompiler::compile`].
#[derive(Clone, Debug)]
pub struct CompiledRuleset {
    /// `fn resolve_endpoint(_params: &Params, ..)`, which runs the
    /// rules.
    pub function: TokenStream,
    /// The resolver state the rules use, in first-use order.
    /// Each field is also a parameter of `function`.
    pub fields: Vec<ResolverField>,
    /// The ids of the functions the rules call, in first-use
    /// order.
    pub used_functions: Vec<String>,
}

impl<'r> RulesetCompiler<'r> {
    /// Creates a compiler using the standard library.
    pub fn new(ruleset: &'r RuleSet) -> Self {
        Self {
            ruleset,
            runtime: syn::parse_quote!(::rulegen_runtime),
            registry: FunctionRegistry::standard(),
            max_depth: DEFAULT_MAX_DEPTH,
            diagnostics: format_ident!("_diagnostic_collector"),
        }
    }

    /// Sets the path to `rulegen-runtime`.
    #[must_use]
    pub fn runtime(mut self, runtime: syn::Path) -> Self {
        self.runtime = runtime;
        self
    }

    /// Sets the functions available to the rules.
    #[must_use]
    pub fn registry(mut self, registry: FunctionRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Sets the deepest tree nesting the compiler accepts.
    #[must_use]
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Compiles the ruleset.
    #[instrument(skip_all, fields(version = %self.ruleset.version))]
    pub fn compile(mut self) -> Result<CompiledRuleset, CodegenError> {
        self.registry.reset();
        self.compile_inner().inspect_err(|err| {
            error!(%err, bug = err.is_bug(), "unable to compile ruleset");
        })
    }

    fn compile_inner(&mut self) -> Result<CompiledRuleset, CodegenError> {
        let ruleset = self.ruleset;
        if ruleset.rules.is_empty() {
            return Err(CodegenErrorKind::EmptyRuleSet.into());
        }

        let mut scope = Scope::new();
        let mut locals = Vec::with_capacity(ruleset.parameters.len());
        for p in &ruleset.parameters {
            let ident = local_ident(&p.name);
            let always_set = p.is_always_set();
            let (value, ty) = match (p.ty, always_set) {
                (ParameterType::String, true) => (quote!(_params.#ident.as_str()), RulesType::String),
                (ParameterType::String, false) => (quote!(_params.#ident.as_deref()), RulesType::String),
                (ParameterType::Boolean, _) => (quote!(_params.#ident), RulesType::Bool),
                (ParameterType::StringArray, true) => {
                    (quote!(_params.#ident.as_slice()), RulesType::StringArray)
                }
                (ParameterType::StringArray, false) => {
                    (quote!(_params.#ident.as_deref()), RulesType::StringArray)
                }
            };
            let ty = if always_set { ty } else { RulesType::option(ty) };
            locals.push(quote!(let #ident = #value;));
            scope = scope.with_member(p.name.clone(), Binding { ident, ty });
        }

        let body = self.rules(&ruleset.rules, &scope, "rules", 0)?;

        let rt = &self.runtime;
        let dc = &self.diagnostics;
        let fields = self
            .registry
            .used()
            .filter_map(|f| f.resolver_field(rt))
            .collect::<Vec<_>>();
        let used_functions = self
            .registry
            .used()
            .map(|f| f.id().to_owned())
            .collect::<Vec<_>>();
        debug!(?used_functions, "compiled ruleset");

        let extra = fields.iter().map(|f| {
            let ident = &f.ident;
            let ty = &f.ty;
            quote!(#ident: &#ty)
        });
        let function = quote! {
            #[allow(
                unreachable_code,
                unused_parens,
                unused_variables,
                clippy::bool_comparison,
                clippy::needless_return,
                clippy::nonminimal_bool
            )]
            pub(crate) fn resolve_endpoint(
                _params: &Params,
                #dc: &mut #rt::DiagnosticCollector,
                #(#extra,)*
            ) -> ::std::result::Result<#rt::Endpoint, #rt::ResolveEndpointError> {
                #(#locals)*
                #body
            }
        };
        Ok(CompiledRuleset {
            function,
            fields,
            used_functions,
        })
    }

    /// Compiles one level of rules, in order.
    ///
    /// Falling off the end of the level is a bug in the ruleset,
    /// so unless the last rule always matches a catch-all error
    /// is returned.
    fn rules(
        &mut self,
        rules: &[Rule],
        scope: &Scope,
        path: &str,
        depth: usize,
    ) -> Result<TokenStream, CodegenError> {
        if depth > self.max_depth {
            return Err(CodegenError::unsupported(format!(
                "Rule trees nested deeper than {} levels",
                self.max_depth
            )));
        }

        let mut out = TokenStream::new();
        for (i, rule) in rules.iter().enumerate() {
            let path = format!("{path}[{i}]");
            debug!(
                %path,
                kind = rule.kind.name(),
                conditions = rule.conditions.len(),
                "compiling rule"
            );
            let tokens = self
                .conditions(&rule.conditions, rule, scope.clone(), &path, depth)
                .map_err(|err| err.in_rule(&path))?;
            out.extend(tokens);
        }

        if rules.last().is_none_or(|r| !r.conditions.is_empty()) {
            let rt = &self.runtime;
            out.extend(quote! {
                return ::std::result::Result::Err(#rt::ResolveEndpointError::message(::std::format!(
                    "No rules matched these parameters. This is a bug. {_params:?}"
                )));
            });
        }
        Ok(out)
    }

    /// Compiles the conditions of `rule`, nesting the rest of
    /// the rule inside each.
    fn conditions(
        &mut self,
        conditions: &[Condition],
        rule: &Rule,
        scope: Scope,
        path: &str,
        depth: usize,
    ) -> Result<TokenStream, CodegenError> {
        let Some((first, rest)) = conditions.split_first() else {
            return self.outcome(&rule.kind, &scope, path, depth);
        };

        if let Some((ident, narrowed)) = self.narrow(first, &scope)? {
            let rest = self.conditions(rest, rule, narrowed, path, depth)?;
            return Ok(quote! {
                if let ::std::option::Option::Some(#ident) = #ident {
                    #rest
                }
            });
        }

        let cond = self.call(&first.function, &scope)?;
        let tokens = &cond.tokens;
        let out = match (&first.assign, &cond.ty) {
            (Some(name), RulesType::Option(inner)) => {
                let ident = local_ident(name);
                let scope = scope.with_member(
                    name.clone(),
                    Binding {
                        ident: ident.clone(),
                        ty: (**inner).clone(),
                    },
                );
                let rest = self.conditions(rest, rule, scope, path, depth)?;
                quote! {
                    if let ::std::option::Option::Some(#ident) = #tokens {
                        #rest
                    }
                }
            }
            (None, RulesType::Option(_)) => {
                let rest = self.conditions(rest, rule, scope, path, depth)?;
                quote! {
                    if #tokens.is_some() {
                        #rest
                    }
                }
            }
            // A boolean is bound and also guards the rest of the
            // rule, like an unassigned boolean condition.
            (Some(name), RulesType::Bool) => {
                let ident = local_ident(name);
                let scope = scope.with_member(
                    name.clone(),
                    Binding {
                        ident: ident.clone(),
                        ty: RulesType::Bool,
                    },
                );
                let rest = self.conditions(rest, rule, scope, path, depth)?;
                quote! {{
                    let #ident = #tokens;
                    if #ident {
                        #rest
                    }
                }}
            }
            (Some(name), ty) => {
                let ident = local_ident(name);
                let rebind = cond
                    .owned
                    .then(|| quote!(let #ident = #ident.as_str();));
                let scope = scope.with_member(
                    name.clone(),
                    Binding {
                        ident: ident.clone(),
                        ty: ty.clone(),
                    },
                );
                let rest = self.conditions(rest, rule, scope, path, depth)?;
                quote! {{
                    let #ident = #tokens;
                    #rebind
                    #rest
                }}
            }
            (None, RulesType::Bool) => {
                let rest = self.conditions(rest, rule, scope, path, depth)?;
                quote! {
                    if #tokens {
                        #rest
                    }
                }
            }
            (None, ty) => {
                return Err(CodegenError::type_mismatch(format!(
                    "condition `{first}` is a {ty}, not a boolean or optional value"
                )));
            }
        };
        Ok(out)
    }

    /// Handles `isSet(ref)` on an optional local, which narrows
    /// the local to its value for the rest of the rule.
    fn narrow(
        &self,
        cond: &Condition,
        scope: &Scope,
    ) -> Result<Option<(Ident, Scope)>, CodegenError> {
        if cond.function.name != "isSet" || cond.assign.is_some() {
            return Ok(None);
        }
        let [Expr::Ref(name)] = cond.function.args.as_slice() else {
            return Ok(None);
        };
        let binding = scope
            .get(name)
            .ok_or_else(|| CodegenErrorKind::UnknownReference(name.clone()))?;
        let RulesType::Option(inner) = &binding.ty else {
            return Ok(None);
        };
        let ident = binding.ident.clone();
        let narrowed = scope.with_member(
            name.clone(),
            Binding {
                ident: ident.clone(),
                ty: (**inner).clone(),
            },
        );
        Ok(Some((ident, narrowed)))
    }

    /// Compiles what a matched rule does.
    fn outcome(
        &mut self,
        kind: &RuleKind,
        scope: &Scope,
        path: &str,
        depth: usize,
    ) -> Result<TokenStream, CodegenError> {
        let rt = self.runtime.clone();
        match kind {
            RuleKind::Endpoint(endpoint) => {
                let endpoint = self.endpoint(endpoint, scope)?;
                Ok(quote!(return ::std::result::Result::Ok(#endpoint);))
            }
            RuleKind::Error(msg) => {
                let msg = self.string(msg, scope, "the error message")?;
                Ok(quote! {
                    return ::std::result::Result::Err(#rt::ResolveEndpointError::message(#msg));
                })
            }
            RuleKind::Tree(rules) => {
                let depth = depth.saturating_add(1);
                self.rules(rules, scope, &format!("{path}.rules"), depth)
            }
        }
    }

    /// Builds an `Endpoint`: its URL, then its headers, then its
    /// properties.
    fn endpoint(
        &mut self,
        endpoint: &EndpointTemplate,
        scope: &Scope,
    ) -> Result<TokenStream, CodegenError> {
        let rt = self.runtime.clone();
        let url = self.string(&endpoint.url, scope, "the endpoint URL")?;

        let mut headers = Vec::new();
        for (name, values) in &endpoint.headers {
            for value in values {
                let value = self.string(value, scope, format_args!("header `{name}`"))?;
                headers.push(quote!(.header(#name, #value)));
            }
        }

        let properties = endpoint
            .properties
            .iter()
            .map(|(name, value)| {
                let value = self.document(value, scope)?;
                Ok(quote!(.property(#name, #value)))
            })
            .collect::<Result<Vec<_>, CodegenError>>()?;

        Ok(quote! {
            #rt::Endpoint::builder()
                .url(#url)
                #(#headers)*
                #(#properties)*
                .build()
        })
    }
}
