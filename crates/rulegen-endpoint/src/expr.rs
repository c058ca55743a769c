use std::fmt;

use proc_macro2::{Literal as TokenLiteral, TokenStream};
use quote::{format_ident, quote};
use rulegen_ast::{Expr, FunctionCall, Literal, Template, TemplatePart};
use tracing::trace;

use crate::{
    CallContext, CodegenError, CodegenErrorKind, CompiledExpr, Ownership, RulesType,
    RulesetCompiler, Scope,
};

impl RulesetCompiler<'_> {
    /// Compiles an expression.
    ///
    /// With [`Ownership::Owned`] strings never borrow from the
    /// resolver's locals. String literals are `'static`, so they
    /// satisfy either.
    pub(crate) fn expr(
        &mut self,
        expr: &Expr,
        scope: &Scope,
        ownership: Ownership,
    ) -> Result<CompiledExpr, CodegenError> {
        let compiled = match expr {
            Expr::Literal(lit) => return self.literal(lit, scope, ownership),
            Expr::Ref(name) => {
                let binding = scope
                    .get(name)
                    .ok_or_else(|| CodegenErrorKind::UnknownReference(name.clone()))?;
                let ident = &binding.ident;
                CompiledExpr::new(quote!(#ident), binding.ty.clone())
            }
            Expr::Call(call) => self.call(call, scope)?,
        };
        trace!(%expr, ty = %compiled.ty, ?ownership, "compiled expression");
        Ok(match ownership {
            Ownership::Borrowed => compiled.into_borrowed(),
            Ownership::Owned if compiled.ty == RulesType::String && !compiled.owned => {
                let tokens = compiled.tokens;
                CompiledExpr::owned_string(quote!(#tokens.to_owned()))
            }
            Ownership::Owned => compiled,
        })
    }

    /// Compiles an expression that must be a string.
    pub(crate) fn string(
        &mut self,
        expr: &Expr,
        scope: &Scope,
        what: impl fmt::Display,
    ) -> Result<TokenStream, CodegenError> {
        let compiled = self.expr(expr, scope, Ownership::Owned)?;
        expect(&compiled, &RulesType::String, &what)?;
        Ok(compiled.tokens)
    }

    fn literal(
        &mut self,
        lit: &Literal,
        scope: &Scope,
        ownership: Ownership,
    ) -> Result<CompiledExpr, CodegenError> {
        match lit {
            Literal::String(template) => {
                if let Some(s) = template.as_plain() {
                    return Ok(CompiledExpr::new(quote!(#s), RulesType::String));
                }
                let formatted = self.template(template, scope)?;
                Ok(match ownership {
                    Ownership::Borrowed => formatted.into_borrowed(),
                    Ownership::Owned => formatted,
                })
            }
            Literal::Bool(b) => Ok(CompiledExpr::new(quote!(#b), RulesType::Bool)),
            Literal::Int(n) => {
                let n = TokenLiteral::i64_unsuffixed(*n);
                Ok(CompiledExpr::new(quote!(#n), RulesType::Int))
            }
            Literal::Array(_) => Err(CodegenError::unsupported(
                "Array literals outside endpoint properties",
            )),
            Literal::Record(_) => Err(CodegenError::unsupported(
                "Record literals outside endpoint properties",
            )),
        }
    }

    /// Interpolates a template with `format!`.
    fn template(
        &mut self,
        template: &Template,
        scope: &Scope,
    ) -> Result<CompiledExpr, CodegenError> {
        let mut fmt = String::new();
        let mut args = Vec::new();
        for part in &template.parts {
            match part {
                TemplatePart::Literal(s) => {
                    fmt.push_str(&s.replace('{', "{{").replace('}', "}}"));
                }
                TemplatePart::Dynamic(expr) => {
                    let arg = self.expr(expr, scope, Ownership::Borrowed)?;
                    if arg.ty.is_option() {
                        return Err(not_set(expr));
                    }
                    if !arg.ty.is_displayable() {
                        return Err(CodegenError::type_mismatch(format!(
                            "can't interpolate `{expr}`, a {}, into a string",
                            arg.ty
                        )));
                    }
                    fmt.push_str("{}");
                    args.push(arg.tokens);
                }
            }
        }
        Ok(CompiledExpr::owned_string(
            quote!(::std::format!(#fmt, #(#args),*)),
        ))
    }

    /// Compiles a function call.
    ///
    /// The result is left as the function produced it: callers
    /// that bind it decide how to hold an owned string.
    pub(crate) fn call(
        &mut self,
        call: &FunctionCall,
        scope: &Scope,
    ) -> Result<CompiledExpr, CodegenError> {
        let name = call.name.as_str();
        match name {
            "isSet" => {
                let [arg] = self.args(call, scope)?;
                if !arg.ty.is_option() {
                    return Err(CodegenError::type_mismatch(format!(
                        "`{call}` checks a value that is always set"
                    )));
                }
                let t = arg.tokens;
                Ok(CompiledExpr::new(quote!(#t.is_some()), RulesType::Bool))
            }
            "not" => {
                let [arg] = self.args(call, scope)?;
                expect(&arg, &RulesType::Bool, format_args!("the argument of `{call}`"))?;
                let t = arg.tokens;
                Ok(CompiledExpr::new(quote!(!#t), RulesType::Bool))
            }
            "booleanEquals" | "stringEquals" => {
                let want = if name == "booleanEquals" {
                    RulesType::Bool
                } else {
                    RulesType::String
                };
                let [a, b] = self.args(call, scope)?;
                expect(&a, &want, format_args!("the first argument of `{call}`"))?;
                expect(&b, &want, format_args!("the second argument of `{call}`"))?;
                let (a, b) = (a.tokens, b.tokens);
                Ok(CompiledExpr::new(quote!((#a == #b)), RulesType::Bool))
            }
            "getAttr" => {
                let (target, path) = match call.args.as_slice() {
                    [target, Expr::Literal(Literal::String(path))] => match path.as_plain() {
                        Some(path) => (target, path),
                        None => {
                            return Err(CodegenError::invalid_argument(format!(
                                "the path of `{call}` must not interpolate values"
                            )));
                        }
                    },
                    _ => {
                        return Err(CodegenError::invalid_argument(format!(
                            "`getAttr` takes a value and a string path, found `{call}`"
                        )));
                    }
                };
                let target = self.expr(target, scope, Ownership::Borrowed)?;
                get_attr(target, &path, call)
            }
            "coalesce" => {
                let [a, b] = self.values(call, scope)?;
                coalesce(a, b, call)
            }
            _ => self.runtime_call(call, scope),
        }
    }

    /// Compiles the arguments of an intrinsic with exactly `N`
    /// arguments, leaving owned strings owned.
    fn values<const N: usize>(
        &mut self,
        call: &FunctionCall,
        scope: &Scope,
    ) -> Result<[CompiledExpr; N], CodegenError> {
        let args = call
            .args
            .iter()
            .map(|arg| match arg {
                Expr::Literal(lit) => self.literal(lit, scope, Ownership::Owned),
                Expr::Ref(_) => self.expr(arg, scope, Ownership::Borrowed),
                Expr::Call(call) => self.call(call, scope),
            })
            .collect::<Result<Vec<_>, _>>()?;
        let found = args.len();
        args.try_into().map_err(|_| {
            CodegenError::invalid_argument(format!(
                "`{}` takes {N} argument(s), found {found}",
                call.name
            ))
        })
    }

    fn runtime_call(
        &mut self,
        call: &FunctionCall,
        scope: &Scope,
    ) -> Result<CompiledExpr, CodegenError> {
        let f = self
            .registry
            .lookup(&call.name)
            .ok_or_else(|| CodegenErrorKind::UnknownFunction(call.name.clone()))?;
        let params = f.args();
        if params.len() != call.args.len() {
            return Err(CodegenError::invalid_argument(format!(
                "`{}` takes {} argument(s), found {}",
                call.name,
                params.len(),
                call.args.len()
            )));
        }

        let mut args = Vec::with_capacity(params.len());
        for (i, (arg, want)) in call.args.iter().zip(&params).enumerate() {
            let compiled = self.expr(arg, scope, Ownership::Borrowed)?;
            expect(
                &compiled,
                want,
                format_args!("argument {} of `{call}`", i.saturating_add(1)),
            )?;
            args.push(compiled.tokens);
        }

        let ctx = CallContext {
            runtime: &self.runtime,
            diagnostics: &self.diagnostics,
        };
        let tokens = f.call(ctx, &args);
        let ty = f.return_type();
        Ok(if f.returns_owned() && ty == RulesType::String {
            CompiledExpr::owned_string(tokens)
        } else {
            CompiledExpr::new(tokens, ty)
        })
    }

    /// Compiles the arguments of an intrinsic with exactly `N`
    /// arguments.
    fn args<const N: usize>(
        &mut self,
        call: &FunctionCall,
        scope: &Scope,
    ) -> Result<[CompiledExpr; N], CodegenError> {
        let args = call
            .args
            .iter()
            .map(|arg| self.expr(arg, scope, Ownership::Borrowed))
            .collect::<Result<Vec<_>, _>>()?;
        let found = args.len();
        args.try_into().map_err(|_| {
            CodegenError::invalid_argument(format!(
                "`{}` takes {N} argument(s), found {found}",
                call.name
            ))
        })
    }

    /// Compiles an endpoint property into a `Document`.
    pub(crate) fn document(
        &mut self,
        expr: &Expr,
        scope: &Scope,
    ) -> Result<TokenStream, CodegenError> {
        let rt = self.runtime.clone();
        let doc = quote!(#rt::Document);
        let tokens = match expr {
            Expr::Literal(Literal::Int(n)) => {
                let n = TokenLiteral::i64_suffixed(*n);
                quote!(#doc::from(#n))
            }
            Expr::Literal(Literal::Array(items)) => {
                let items = items
                    .iter()
                    .map(|item| self.document(item, scope))
                    .collect::<Result<Vec<_>, _>>()?;
                quote!(#doc::from(::std::vec::Vec::<#doc>::from([#(#items),*])))
            }
            Expr::Literal(Literal::Record(fields)) => {
                let fields = fields
                    .iter()
                    .map(|(name, value)| {
                        let value = self.document(value, scope)?;
                        Ok(quote!((#name.to_owned(), #value)))
                    })
                    .collect::<Result<Vec<_>, CodegenError>>()?;
                quote! {
                    #doc::from(::std::collections::HashMap::<::std::string::String, #doc>::from([
                        #(#fields),*
                    ]))
                }
            }
            expr => {
                let compiled = self.expr(expr, scope, Ownership::Owned)?;
                let t = compiled.tokens;
                match compiled.ty {
                    RulesType::String | RulesType::Bool => quote!(#doc::from(#t)),
                    RulesType::Int => quote!(#doc::from(#t as i64)),
                    RulesType::StringArray => {
                        let s = format_ident!("s");
                        quote! {
                            #doc::from(#t.iter().map(|#s| #doc::from(#s.as_str())).collect::<::std::vec::Vec<_>>())
                        }
                    }
                    RulesType::Record(record) => {
                        return Err(CodegenError::unsupported(format!(
                            "Endpoint properties holding a {}",
                            record.name
                        )));
                    }
                    RulesType::Option(_) => return Err(not_set(expr)),
                }
            }
        };
        Ok(tokens)
    }
}

/// Reads `path` from `target`.
///
/// A path is a `.`-separated list of record attributes, the last
/// of which may be indexed with `[n]`.
fn get_attr(
    target: CompiledExpr,
    path: &str,
    call: &FunctionCall,
) -> Result<CompiledExpr, CodegenError> {
    let invalid_path =
        || CodegenError::invalid_argument(format!("invalid attribute path in `{call}`"));

    let mut current = target;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        let (name, index) = match segment.split_once('[') {
            Some((name, index)) => {
                let index = index
                    .strip_suffix(']')
                    .and_then(|i| i.parse::<usize>().ok())
                    .ok_or_else(invalid_path)?;
                (name, Some(index))
            }
            None => (segment, None),
        };
        if name.is_empty() && index.is_none() {
            return Err(invalid_path());
        }

        if !name.is_empty() {
            let record = match &current.ty {
                RulesType::Record(record) => record,
                RulesType::Option(_) => {
                    return Err(CodegenError::type_mismatch(format!(
                        "`{call}` reads a value that may not be set"
                    )));
                }
                ty => {
                    return Err(CodegenError::type_mismatch(format!(
                        "`{call}` reads attribute `{name}` of a {ty}"
                    )));
                }
            };
            let field = record.get(name).ok_or_else(|| {
                CodegenError::invalid_argument(format!(
                    "a {} has no attribute `{name}`",
                    record.name
                ))
            })?;
            let accessor = format_ident!("{}", field.accessor);
            let t = &current.tokens;
            current = CompiledExpr::new(quote!(#t.#accessor()), field.ty.clone());
        }

        if let Some(index) = index {
            if segments.peek().is_some() {
                return Err(CodegenError::unsupported(
                    "Attribute paths continuing past an index",
                ));
            }
            if current.ty != RulesType::StringArray {
                return Err(CodegenError::type_mismatch(format!(
                    "`{call}` indexes into a {}",
                    current.ty
                )));
            }
            let index = TokenLiteral::usize_unsuffixed(index);
            let t = &current.tokens;
            current = CompiledExpr::new(
                quote!(#t.get(#index).map(::std::string::String::as_str)),
                RulesType::option(RulesType::String),
            );
        }
    }
    Ok(current)
}

/// Picks the first of `a` and `b` that is set.
///
/// The result is optional only when both arguments are.
fn coalesce(
    a: CompiledExpr,
    b: CompiledExpr,
    call: &FunctionCall,
) -> Result<CompiledExpr, CodegenError> {
    let ty = a.ty.unwrap_option();
    if ty != b.ty.unwrap_option() {
        return Err(CodegenError::type_mismatch(format!(
            "the arguments of `{call}` must have the same type, found a {} and a {}",
            a.ty, b.ty
        )));
    }
    if matches!(ty, RulesType::Record(_)) {
        return Err(CodegenError::unsupported(format!(
            "`coalesce` arguments of type {ty}"
        )));
    }

    let (ta, tb) = (&a.tokens, &b.tokens);
    let compiled = match (a.ty.is_option(), b.ty.is_option()) {
        (true, true) => CompiledExpr::new(quote!(#ta.or(#tb)), a.ty.clone()),
        (true, false) if b.owned => CompiledExpr::owned_string(
            quote!(#ta.map(::std::string::String::from).unwrap_or(#tb)),
        ),
        (true, false) => CompiledExpr::new(quote!(#ta.unwrap_or(#tb)), b.ty.clone()),
        // `a` is always set, but `b` is still evaluated.
        (false, _) => CompiledExpr {
            tokens: quote!((#ta, #tb).0),
            ty: a.ty.clone(),
            owned: a.owned,
        },
    };
    Ok(compiled)
}

fn expect(
    compiled: &CompiledExpr,
    want: &RulesType,
    what: impl fmt::Display,
) -> Result<(), CodegenError> {
    if &compiled.ty == want {
        return Ok(());
    }
    if compiled.ty.unwrap_option() == want {
        return Err(CodegenError::type_mismatch(format!(
            "{what} may not be set; check it with `isSet` first"
        )));
    }
    Err(CodegenError::type_mismatch(format!(
        "{what} must be a {want}, found a {}",
        compiled.ty
    )))
}

fn not_set(expr: &Expr) -> CodegenError {
    CodegenError::type_mismatch(format!(
        "`{expr}` may not be set; check it with `isSet` first"
    ))
}
