use buggy::bug;
use proc_macro2::{Ident, Literal, Span, TokenStream};
use quote::{ToTokens, format_ident, quote};
use rulegen_ast::{Comparator, JmesExpr, JmesLiteral, Schema, Shape, is_rust_keyword};
use tracing::{error, instrument, trace};

use crate::{
    GeneratedExpression, RustType, SafeNamer, TraversalBinding, TraversalError,
    TraversalErrorKind, TraversalRoot, TraversedShape, classify, rust_type,
};

const DEFAULT_MAX_DEPTH: usize = 64;

/// Compiles JMESPath expressions into Rust traversals over a
/// schema's data model.
///
/// ```ignore
/// let code = TraversalGenerator::new(&schema)
///     .model(parse_quote!(crate::model))
///     .generate_function("is_ready", &expr, &[TraversalRoot::global("Output")])?;
/// ```
#[derive(Clone, Debug)]
pub struct TraversalGenerator<'s> {
    schema: &'s Schema,
    model: syn::Path,
    debug: bool,
    max_depth: usize,
}

impl<'s> TraversalGenerator<'s> {
    /// Creates a generator for `schema`.
    pub fn new(schema: &'s Schema) -> Self {
        Self {
            schema,
            model: syn::parse_quote!(crate::model),
            debug: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Sets the path to the data model types. Defaults to
    /// `crate::model`.
    #[must_use]
    pub fn model(mut self, model: syn::Path) -> Self {
        self.model = model;
        self
    }

    /// Emits a `const _: &str` item after every sub-expression
    /// naming the local it was bound to.
    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Sets the deepest expression nesting the generator
    /// accepts.
    #[must_use]
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// The schema being traversed.
    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    /// Creates the binding for a root parameter held in `ident`.
    pub fn binding(
        &self,
        root: &TraversalRoot,
        ident: Ident,
    ) -> Result<TraversalBinding, TraversalError> {
        let shape = classify(self.schema, root.shape())?;
        let ty = RustType::reference(rust_type(self.schema, root.shape())?);
        let binding = match root {
            TraversalRoot::Global(_) => TraversalBinding::Global { ident, shape, ty },
            TraversalRoot::Named(name, _) => TraversalBinding::Named {
                name: name.clone(),
                ident,
                shape,
                ty,
            },
        };
        Ok(binding)
    }

    /// Compiles `expr` with `bindings` in scope.
    ///
    /// Every call gets its own namer, so identifiers are unique
    /// within the returned output.
    #[instrument(skip_all, fields(expr = %expr))]
    pub fn generate(
        &self,
        expr: &JmesExpr,
        bindings: &[TraversalBinding],
    ) -> Result<GeneratedExpression, TraversalError> {
        let mut walker = Walker {
            generator: self,
            namer: SafeNamer::new(),
        };
        walker
            .generate(expr, bindings, TraversalContext::default())
            .map_err(|err| {
                let err = err.with_expression(expr);
                error!(%err, bug = err.is_bug());
                err
            })
    }

    /// Compiles `expr` into a function returning `Option<T>`:
    ///
    /// ```ignore
    /// pub fn name<'a>(root: &'a model::Output) -> Option<&'a String> { .. }
    /// ```
    ///
    /// A global root is passed as `root`. Named roots are passed
    /// under their snake_case name.
    pub fn generate_function(
        &self,
        name: &str,
        expr: &JmesExpr,
        roots: &[TraversalRoot],
    ) -> Result<TokenStream, TraversalError> {
        let fn_name = syn::parse_str::<Ident>(name)
            .map_err(|_| TraversalError::invalid(format!("`{name}` is not a function name")))?;
        let lifetime = syn::Lifetime::new("'a", Span::call_site());
        let model = self.model.to_token_stream();

        let mut bindings = Vec::with_capacity(roots.len());
        let mut params = Vec::with_capacity(roots.len());
        for root in roots {
            let ident = match root {
                TraversalRoot::Global(_) => {
                    if bindings
                        .iter()
                        .any(|b| matches!(b, TraversalBinding::Global { .. }))
                    {
                        return Err(TraversalError::invalid("more than one global root"));
                    }
                    format_ident!("root")
                }
                TraversalRoot::Named(name, _) => field_ident(name),
            };
            let binding = self.binding(root, ident.clone())?;
            let ty = binding.ty().to_tokens(&model, Some(&lifetime));
            params.push(quote!(#ident: #ty));
            bindings.push(binding);
        }

        let generated = self.generate(expr, &bindings)?;
        let ret = match &generated.ty {
            ty @ RustType::Option(_) => ty.clone(),
            ty => RustType::option(ty.clone()),
        };
        let ret = ret.to_tokens(&model, Some(&lifetime));
        let output = &generated.output;
        let ident = &generated.ident;
        let tail = if generated.ty.is_option() {
            quote!(#ident)
        } else {
            quote!(Some(#ident))
        };
        let doc = format!(" Evaluates `{expr}`.");
        Ok(quote! {
            #[doc = #doc]
            pub fn #fn_name<#lifetime>(#(#params),*) -> #ret {
                #output
                #tail
            }
        })
    }
}

/// Per-node compilation settings.
#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct TraversalContext {
    /// Optional members yield `Option<&T>` instead of returning
    /// early when absent.
    pub retain_option: bool,
    /// How deeply nested the current node is.
    pub depth: usize,
}

impl TraversalContext {
    pub fn retaining(self, retain_option: bool) -> Self {
        Self {
            retain_option,
            ..self
        }
    }
}

/// The state of one top-level compilation.
pub(crate) struct Walker<'g, 's> {
    pub generator: &'g TraversalGenerator<'s>,
    pub namer: SafeNamer,
}

impl Walker<'_, '_> {
    pub fn generate(
        &mut self,
        expr: &JmesExpr,
        bindings: &[TraversalBinding],
        ctx: TraversalContext,
    ) -> Result<GeneratedExpression, TraversalError> {
        let ctx = TraversalContext {
            depth: ctx.depth.saturating_add(1),
            ..ctx
        };
        if ctx.depth > self.generator.max_depth {
            return Err(TraversalError::unsupported(format!(
                "Expressions nested deeper than {} levels",
                self.generator.max_depth
            )));
        }

        let mut result = match expr {
            JmesExpr::Field(name) => self.field(name, bindings, ctx)?,
            JmesExpr::Subexpression(left, right) => {
                let left = self.generate(left, bindings, ctx)?;
                self.apply(left, right, ctx)?
            }
            JmesExpr::Pipe(left, right) => {
                let left = self.generate(left, bindings, ctx)?;
                let left = self.unwrap_option(left);
                self.apply(left, right, ctx)?
            }
            JmesExpr::Comparator { op, left, right } => {
                self.comparator(*op, left, right, bindings, ctx)?
            }
            JmesExpr::And(left, right) => self.logical(true, left, right, bindings, ctx)?,
            JmesExpr::Or(left, right) => self.logical(false, left, right, bindings, ctx)?,
            JmesExpr::Not(inner) => {
                let inner = self.boolean(inner, "`!`", bindings, ctx)?;
                let src = &inner.ident;
                let value = quote!(!#src);
                inner.then(self.namer.name("not"), RustType::Bool, value)
            }
            JmesExpr::Literal(lit) => self.literal(lit)?,
            JmesExpr::MultiSelectList(items) => self.multi_select_list(items, bindings, ctx)?,
            JmesExpr::Function { name, args } => self.function(name, args, bindings, ctx)?,
            JmesExpr::Projection { left, right } => self.projection(left, right, bindings, ctx)?,
            JmesExpr::FilterProjection {
                left,
                right,
                condition,
            } => self.filter_projection(left, right, condition, bindings, ctx)?,
            JmesExpr::ObjectProjection { left, right } => {
                self.object_projection(left, right, bindings, ctx)?
            }
            JmesExpr::Flatten(inner) => self.flatten(inner, bindings, ctx)?,
            JmesExpr::Current => {
                let current = self.current(bindings)?;
                if ctx.retain_option {
                    current
                } else {
                    self.unwrap_option(current)
                }
            }
            JmesExpr::Index { .. } => return Err(TraversalError::unsupported("Index expressions")),
            JmesExpr::Slice { .. } => return Err(TraversalError::unsupported("Slice expressions")),
            JmesExpr::MultiSelectHash(_) => {
                return Err(TraversalError::unsupported("Multi-select hash expressions"));
            }
            JmesExpr::ExpressionType(_) => {
                return Err(TraversalError::unsupported("Expression type expressions"));
            }
        };

        trace!(ident = %result.ident, shape = %result.shape, %expr, "compiled");
        if self.generator.debug {
            let note = format!("{} = {expr}", result.ident);
            result.output.extend(quote! { const _: &str = #note; });
        }
        Ok(result)
    }

    /// Looks `name` up in `bindings`.
    fn field(
        &mut self,
        name: &str,
        bindings: &[TraversalBinding],
        ctx: TraversalContext,
    ) -> Result<GeneratedExpression, TraversalError> {
        if bindings.is_empty() {
            return Err(TraversalErrorKind::MissingBinding(name.to_owned()).into());
        }
        let named = bindings.iter().find(|b| match b {
            TraversalBinding::Named { name: n, .. } => n == name,
            TraversalBinding::Global { .. } => false,
        });
        if let Some(binding) = named {
            if !binding.shape().is_object() {
                return Err(TraversalError::invalid(format!(
                    "`{name}` is bound to a {}, not an object",
                    binding.shape()
                )));
            }
            return Ok(GeneratedExpression::from_binding(binding));
        }
        let Some(global) = bindings
            .iter()
            .find(|b| matches!(b, TraversalBinding::Global { .. }))
        else {
            return Err(TraversalError::invalid(format!("`{name}` is not in scope")));
        };
        self.member(GeneratedExpression::from_binding(global), name, ctx)
    }

    /// Accesses member `name` of `parent`.
    fn member(
        &mut self,
        parent: GeneratedExpression,
        name: &str,
        ctx: TraversalContext,
    ) -> Result<GeneratedExpression, TraversalError> {
        let schema = self.generator.schema;
        let id = match &parent.shape {
            TraversedShape::Object(Some(id)) => id.clone(),
            shape => {
                return Err(TraversalError::invalid(format!(
                    "cannot access field `{name}` of a {shape}"
                )));
            }
        };
        let src = &parent.ident;
        let (target, access, optional) = match schema.get(&id) {
            Some(Shape::Structure(s)) => {
                let Some(member) = s.members.get(name) else {
                    return Err(TraversalError::invalid(format!(
                        "`{id}` has no member `{name}`"
                    )));
                };
                let field = field_ident(name);
                if member.required {
                    (member.target.clone(), quote!(&#src.#field), false)
                } else {
                    (member.target.clone(), quote!(#src.#field.as_ref()), true)
                }
            }
            Some(Shape::Map(map)) => (map.value.clone(), quote!(#src.get(#name)), true),
            _ => bug!("object shapes are structures or maps"),
        };

        let shape = classify(schema, &target)?;
        let ty = RustType::reference(rust_type(schema, &target)?);
        let (value, ty) = match (optional, ctx.retain_option) {
            (false, _) => (access, ty),
            (true, true) => (access, RustType::option(ty)),
            (true, false) => (quote!(#access?), ty),
        };
        let ident = self.namer.name("fld");
        let mut output = parent.output;
        output.extend(quote! { let #ident = #value; });
        Ok(GeneratedExpression::new(ident, shape, ty, output))
    }

    /// Evaluates `right` with `left` as the global binding.
    fn apply(
        &mut self,
        left: GeneratedExpression,
        right: &JmesExpr,
        ctx: TraversalContext,
    ) -> Result<GeneratedExpression, TraversalError> {
        let RustType::Option(inner) = &left.ty else {
            let binding = TraversalBinding::Global {
                ident: left.ident.clone(),
                shape: left.shape.clone(),
                ty: left.ty.clone(),
            };
            let right = self.generate(right, &[binding], ctx)?;
            let mut output = left.output;
            output.extend(right.output);
            return Ok(GeneratedExpression::new(right.ident, right.shape, right.ty, output));
        };

        let elem = self.namer.name("elem");
        let binding = TraversalBinding::Global {
            ident: elem.clone(),
            shape: left.shape.clone(),
            ty: (**inner).clone(),
        };
        let right = self.generate(right, &[binding], ctx)?;
        let body = some_body(&right);
        let src = &left.ident;
        let ident = self.namer.name("sub");
        let mut output = left.output;
        output.extend(quote! {
            let #ident = #src.and_then(|#elem| { #body });
        });
        let ty = RustType::option(right.ty.unwrap_option().clone());
        Ok(GeneratedExpression::new(ident, right.shape, ty, output))
    }

    /// Unwraps an optional value, returning early when it's
    /// absent.
    pub(crate) fn unwrap_option(&mut self, expr: GeneratedExpression) -> GeneratedExpression {
        match &expr.ty {
            RustType::Option(inner) => {
                let ty = (**inner).clone();
                let src = &expr.ident;
                let value = quote!(#src?);
                expr.then(self.namer.name("some"), ty, value)
            }
            _ => expr,
        }
    }

    fn current(&mut self, bindings: &[TraversalBinding]) -> Result<GeneratedExpression, TraversalError> {
        if bindings.is_empty() {
            return Err(TraversalErrorKind::MissingBinding("@".into()).into());
        }
        bindings
            .iter()
            .find(|b| matches!(b, TraversalBinding::Global { .. }))
            .map(GeneratedExpression::from_binding)
            .ok_or_else(|| TraversalError::invalid("`@` has no global binding"))
    }

    fn comparator(
        &mut self,
        op: Comparator,
        left: &JmesExpr,
        right: &JmesExpr,
        bindings: &[TraversalBinding],
        ctx: TraversalContext,
    ) -> Result<GeneratedExpression, TraversalError> {
        let ctx = ctx.retaining(false);
        let left = self.generate(left, bindings, ctx)?;
        let right = self.generate(right, bindings, ctx)?;
        let (left, right) = self.coerce_pair(left, right, Some(op))?;

        let op = comparator_tokens(op);
        let (l, r) = (&left.ident, &right.ident);
        let ident = self.namer.name("cmp");
        let mut output = left.output;
        output.extend(right.output);
        output.extend(quote! { let #ident = #l #op #r; });
        Ok(GeneratedExpression::new(
            ident,
            TraversedShape::Bool(None),
            RustType::Bool,
            output,
        ))
    }

    /// Converts two values to a common representation so they
    /// can be compared. `op` is `None` for equality checks made
    /// by functions.
    pub(crate) fn coerce_pair(
        &mut self,
        left: GeneratedExpression,
        right: GeneratedExpression,
        op: Option<Comparator>,
    ) -> Result<(GeneratedExpression, GeneratedExpression), TraversalError> {
        let ordering = op.is_some_and(|op| !op.is_equality());
        match (&left.shape, &right.shape) {
            (l, r) if l.is_stringish() && r.is_stringish() => {
                if ordering {
                    return Err(TraversalError::unsupported("Ordering comparisons of strings"));
                }
                let left = left.convert_to_str_ref(&mut self.namer)?;
                let right = right.convert_to_str_ref(&mut self.namer)?;
                Ok((left, right))
            }
            (TraversedShape::Number(_), TraversedShape::Number(_)) => {
                let target = common_number(&left.ty, &right.ty);
                let left = left.convert_to_number_primitive(&target, &mut self.namer)?;
                let right = right.convert_to_number_primitive(&target, &mut self.namer)?;
                Ok((left, right))
            }
            (TraversedShape::Bool(_), TraversedShape::Bool(_)) => {
                if ordering {
                    return Err(TraversalError::unsupported("Ordering comparisons of booleans"));
                }
                let left = left.dereference(&mut self.namer);
                let right = right.dereference(&mut self.namer);
                Ok((left, right))
            }
            (l, r) => Err(TraversalError::unsupported(format!(
                "Comparisons between {} and {}",
                l.kind(),
                r.kind()
            ))),
        }
    }

    /// Compiles an operand that must be a boolean.
    fn boolean(
        &mut self,
        expr: &JmesExpr,
        what: &str,
        bindings: &[TraversalBinding],
        ctx: TraversalContext,
    ) -> Result<GeneratedExpression, TraversalError> {
        let generated = self.generate(expr, bindings, ctx.retaining(false))?;
        if !matches!(generated.shape, TraversedShape::Bool(_)) {
            return Err(TraversalError::unsupported(format!(
                "Non-boolean operands of {what}"
            )));
        }
        Ok(generated.dereference(&mut self.namer))
    }

    fn logical(
        &mut self,
        and: bool,
        left: &JmesExpr,
        right: &JmesExpr,
        bindings: &[TraversalBinding],
        ctx: TraversalContext,
    ) -> Result<GeneratedExpression, TraversalError> {
        let (what, prefix) = if and { ("`&&`", "and") } else { ("`||`", "or") };
        let left = self.boolean(left, what, bindings, ctx)?;
        let right = self.boolean(right, what, bindings, ctx)?;

        let l = &left.ident;
        let r = &right.ident;
        let r_output = &right.output;
        let value = if and {
            quote!(#l && { #r_output #r })
        } else {
            quote!(#l || { #r_output #r })
        };
        Ok(left.then(self.namer.name(prefix), RustType::Bool, value))
    }

    fn literal(&mut self, lit: &JmesLiteral) -> Result<GeneratedExpression, TraversalError> {
        let (shape, ty, value) = match lit {
            JmesLiteral::Bool(b) => (TraversedShape::Bool(None), RustType::Bool, quote!(#b)),
            JmesLiteral::Int(n) => {
                let abs = Literal::u64_unsuffixed(n.unsigned_abs());
                let value = if *n < 0 { quote!(-#abs) } else { quote!(#abs) };
                (TraversedShape::Number(None), RustType::Integer(64), value)
            }
            JmesLiteral::Float(f) => {
                if !f.is_finite() {
                    return Err(TraversalError::unsupported("Non-finite number literals"));
                }
                let abs = Literal::f64_unsuffixed(f.abs());
                let value = if f.is_sign_negative() {
                    quote!(-#abs)
                } else {
                    quote!(#abs)
                };
                (TraversedShape::Number(None), RustType::Float(64), value)
            }
            JmesLiteral::String(s) => (TraversedShape::String(None), RustType::str_ref(), quote!(#s)),
            JmesLiteral::Null => return Err(TraversalError::unsupported("Null literals")),
            JmesLiteral::Array(_) => return Err(TraversalError::unsupported("Array literals")),
            JmesLiteral::Object(_) => return Err(TraversalError::unsupported("Object literals")),
        };
        let ident = self.namer.name("LIT");
        let rendered = ty.to_tokens(&TokenStream::new(), None);
        let output = quote! { const #ident: #rendered = #value; };
        Ok(GeneratedExpression::new(ident, shape, ty, output))
    }

    fn multi_select_list(
        &mut self,
        items: &[JmesExpr],
        bindings: &[TraversalBinding],
        ctx: TraversalContext,
    ) -> Result<GeneratedExpression, TraversalError> {
        let mut generated = items
            .iter()
            .map(|item| self.generate(item, bindings, ctx))
            .collect::<Result<Vec<_>, _>>()?;
        let Some(first) = generated.first() else {
            return Err(TraversalError::unsupported("Empty multi-select lists"));
        };
        let mixed = || TraversalError::unsupported("Multi-select lists with mixed types");

        let shape = first.shape.clone();
        if !generated.iter().all(|g| g.shape.same_category(&shape) || g.shape == shape) {
            return Err(mixed());
        }
        generated = match &shape {
            s if s.is_stringish() => generated
                .into_iter()
                .map(|g| g.convert_to_str_ref(&mut self.namer))
                .collect::<Result<_, _>>()?,
            TraversedShape::Number(_) => {
                let target = generated
                    .iter()
                    .fold(RustType::Integer(64), |acc, g| common_number(&acc, &g.ty));
                generated
                    .into_iter()
                    .map(|g| g.convert_to_number_primitive(&target, &mut self.namer))
                    .collect::<Result<_, _>>()?
            }
            TraversedShape::Bool(_) => generated
                .into_iter()
                .map(|g| g.dereference(&mut self.namer))
                .collect(),
            _ => generated,
        };
        if generated.iter().any(|g| g.ty.is_option()) {
            generated = generated
                .into_iter()
                .map(|g| {
                    if g.ty.is_option() {
                        g
                    } else {
                        g.lift_option(&mut self.namer)
                    }
                })
                .collect();
        }

        let ty = match generated.first() {
            Some(g) => g.ty.clone(),
            None => bug!("multi-select list is not empty"),
        };
        if generated.iter().any(|g| g.ty != ty) {
            return Err(mixed());
        }

        let ident = self.namer.name("msl");
        let mut output = TokenStream::new();
        let mut idents = Vec::with_capacity(generated.len());
        for g in generated {
            output.extend(g.output);
            idents.push(g.ident);
        }
        output.extend(quote! { let #ident = ::std::vec![#(#idents),*]; });
        Ok(GeneratedExpression::new(
            ident,
            TraversedShape::array_of(shape),
            RustType::vec(ty),
            output,
        ))
    }

    /// Compiles the collection a projection iterates over.
    fn collection(
        &mut self,
        left: &JmesExpr,
        bindings: &[TraversalBinding],
        ctx: TraversalContext,
    ) -> Result<(GeneratedExpression, TraversedShape, RustType), TraversalError> {
        let left = self.generate(left, bindings, ctx.retaining(false))?;
        let (Some(member), Some(item)) = (left.shape.member(), left.ty.item()) else {
            return Err(TraversalError::invalid(format!(
                "cannot project over a {}",
                left.shape
            )));
        };
        let member = member.clone();
        Ok((left, member, item))
    }

    fn projection(
        &mut self,
        left: &JmesExpr,
        right: &JmesExpr,
        bindings: &[TraversalBinding],
        ctx: TraversalContext,
    ) -> Result<GeneratedExpression, TraversalError> {
        let (left, member, item) = self.collection(left, bindings, ctx)?;
        if *right == JmesExpr::Current {
            return Ok(left);
        }
        let elem = self.namer.name("elem");
        let binding = TraversalBinding::Global {
            ident: elem.clone(),
            shape: member,
            ty: item,
        };
        let right = self.generate(right, &[binding], ctx.retaining(true))?;
        let body = some_body(&right);
        let src = &left.ident;
        let ident = self.namer.name("prj");
        let mut output = left.output;
        output.extend(quote! {
            let #ident = #src
                .into_iter()
                .filter_map(|#elem| { #body })
                .collect::<::std::vec::Vec<_>>();
        });
        let ty = RustType::vec(right.ty.unwrap_option().clone());
        Ok(GeneratedExpression::new(
            ident,
            TraversedShape::array_of(right.shape),
            ty,
            output,
        ))
    }

    fn filter_projection(
        &mut self,
        left: &JmesExpr,
        right: &JmesExpr,
        condition: &JmesExpr,
        bindings: &[TraversalBinding],
        ctx: TraversalContext,
    ) -> Result<GeneratedExpression, TraversalError> {
        let (left, member, item) = self.collection(left, bindings, ctx)?;
        let elem = self.namer.name("elem");
        let binding = TraversalBinding::Global {
            ident: elem.clone(),
            shape: member.clone(),
            ty: item.clone(),
        };

        let cond = self.generate(condition, std::slice::from_ref(&binding), ctx.retaining(false))?;
        if !matches!(cond.shape, TraversedShape::Bool(_)) {
            return Err(TraversalError::invalid(format!(
                "filter condition `{condition}` is a {}, not a boolean",
                cond.shape
            )));
        }
        let cond = cond.dereference(&mut self.namer);

        let (body, shape, ty) = if *right == JmesExpr::Current {
            (quote!(Some(#elem)), member, item)
        } else {
            let right = self.generate(right, &[binding], ctx.retaining(true))?;
            let body = some_body(&right);
            let ty = right.ty.unwrap_option().clone();
            (body, right.shape, ty)
        };

        let src = &left.ident;
        let cond_output = &cond.output;
        let cond_ident = &cond.ident;
        let ident = self.namer.name("flt");
        let mut output = left.output;
        output.extend(quote! {
            let #ident = #src
                .into_iter()
                .filter_map(|#elem| {
                    #cond_output
                    if !#cond_ident {
                        return None;
                    }
                    #body
                })
                .collect::<::std::vec::Vec<_>>();
        });
        Ok(GeneratedExpression::new(
            ident,
            TraversedShape::array_of(shape),
            RustType::vec(ty),
            output,
        ))
    }

    fn object_projection(
        &mut self,
        left: &JmesExpr,
        right: &JmesExpr,
        bindings: &[TraversalBinding],
        ctx: TraversalContext,
    ) -> Result<GeneratedExpression, TraversalError> {
        let schema = self.generator.schema;
        let left = self.generate(left, bindings, ctx.retaining(false))?;
        let value = match left.shape.shape_id().and_then(|id| schema.get(id)) {
            Some(Shape::Map(map)) if left.shape.is_object() => map.value.clone(),
            Some(Shape::Structure(_)) => {
                return Err(TraversalError::unsupported("Object projections over structures"));
            }
            _ => {
                return Err(TraversalError::invalid(format!(
                    "cannot project over the values of a {}",
                    left.shape
                )));
            }
        };
        let member = classify(schema, &value)?;
        let item = RustType::reference(rust_type(schema, &value)?);
        let src = &left.ident;
        let ident = self.namer.name("obj");

        if *right == JmesExpr::Current {
            let mut output = left.output;
            output.extend(quote! {
                let #ident = #src.values().collect::<::std::vec::Vec<_>>();
            });
            return Ok(GeneratedExpression::new(
                ident,
                TraversedShape::array_of(member),
                RustType::vec(item),
                output,
            ));
        }

        let elem = self.namer.name("elem");
        let binding = TraversalBinding::Global {
            ident: elem.clone(),
            shape: member,
            ty: item,
        };
        let right = self.generate(right, &[binding], ctx.retaining(true))?;
        let body = some_body(&right);
        let mut output = left.output;
        output.extend(quote! {
            let #ident = #src
                .values()
                .filter_map(|#elem| { #body })
                .collect::<::std::vec::Vec<_>>();
        });
        let ty = RustType::vec(right.ty.unwrap_option().clone());
        Ok(GeneratedExpression::new(
            ident,
            TraversedShape::array_of(right.shape),
            ty,
            output,
        ))
    }

    fn flatten(
        &mut self,
        inner: &JmesExpr,
        bindings: &[TraversalBinding],
        ctx: TraversalContext,
    ) -> Result<GeneratedExpression, TraversalError> {
        let (left, member, item) = self.collection(inner, bindings, ctx)?;
        let (Some(nested), Some(nested_item)) = (member.member(), item.item()) else {
            return Ok(left);
        };
        let shape = TraversedShape::array_of(nested.clone());
        let src = &left.ident;
        let value = quote! {
            #src.into_iter().flatten().collect::<::std::vec::Vec<_>>()
        };
        let ident = self.namer.name("flat");
        let mut expr = left.then(ident, RustType::vec(nested_item), value);
        expr.shape = shape;
        Ok(expr)
    }
}

/// A closure body returning `Option<T>` for `expr`.
fn some_body(expr: &GeneratedExpression) -> TokenStream {
    let output = &expr.output;
    let ident = &expr.ident;
    if expr.ty.is_option() {
        quote!(#output #ident)
    } else {
        quote!(#output Some(#ident))
    }
}

/// `i64` when both sides are integers, `f64` otherwise.
pub(crate) fn common_number(a: &RustType, b: &RustType) -> RustType {
    let is_int = |ty: &RustType| matches!(ty.unwrap_option().referent(), RustType::Integer(_));
    if is_int(a) && is_int(b) {
        RustType::Integer(64)
    } else {
        RustType::Float(64)
    }
}

fn comparator_tokens(op: Comparator) -> TokenStream {
    match op {
        Comparator::Equal => quote!(==),
        Comparator::NotEqual => quote!(!=),
        Comparator::LessThan => quote!(<),
        Comparator::LessThanOrEqual => quote!(<=),
        Comparator::GreaterThan => quote!(>),
        Comparator::GreaterThanOrEqual => quote!(>=),
    }
}

/// The data model field for a schema member. Keywords become
/// raw identifiers.
pub fn field_ident(name: &str) -> Ident {
    let mut field = rulegen_ast::field_name(name);
    if field.is_empty() || field.starts_with(|c: char| c.is_ascii_digit()) {
        field.insert(0, '_');
    }
    match field.as_str() {
        "self" | "Self" | "crate" | "super" => format_ident!("{field}_"),
        f if is_rust_keyword(f) => Ident::new_raw(f, Span::call_site()),
        f => format_ident!("{f}"),
    }
}
