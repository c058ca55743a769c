use quote::quote;
use rulegen_ast::{JmesExpr, Shape};

use crate::{
    GeneratedExpression, RustType, TraversalBinding, TraversalError, TraversedShape,
    generate::{TraversalContext, Walker, common_number},
};

impl Walker<'_, '_> {
    /// Compiles a call to one of the supported JMESPath
    /// functions.
    pub(crate) fn function(
        &mut self,
        name: &str,
        args: &[JmesExpr],
        bindings: &[TraversalBinding],
        ctx: TraversalContext,
    ) -> Result<GeneratedExpression, TraversalError> {
        let arity = match name {
            "length" | "keys" => 1,
            "contains" => 2,
            _ => return Err(TraversalError::unsupported(format!("The `{name}` function"))),
        };
        if args.len() != arity {
            return Err(TraversalError::invalid(format!(
                "`{name}` takes {arity} argument(s), found {}",
                args.len()
            )));
        }

        let ctx = ctx.retaining(false);
        let mut args = args
            .iter()
            .map(|arg| self.generate(arg, bindings, ctx))
            .collect::<Result<Vec<_>, _>>()?
            .into_iter();
        let (Some(first), second) = (args.next(), args.next()) else {
            return Err(TraversalError::invalid(format!("`{name}` is missing its argument")));
        };
        match (name, second) {
            ("length", None) => self.length(first),
            ("keys", None) => self.keys(first),
            ("contains", Some(search)) => self.contains(first, search),
            _ => Err(TraversalError::invalid(format!("bad arguments to `{name}`"))),
        }
    }

    /// `length(x)` as an `i64`.
    fn length(&mut self, arg: GeneratedExpression) -> Result<GeneratedExpression, TraversalError> {
        let src = &arg.ident;
        let value = match &arg.shape {
            TraversedShape::String(_) => quote!(#src.chars().count() as i64),
            TraversedShape::Array { .. } => quote!(#src.len() as i64),
            shape => {
                return Err(TraversalError::invalid(format!(
                    "`length` takes an array or a string, found a {shape}"
                )));
            }
        };
        let mut expr = arg.then(self.namer.name("len"), RustType::Integer(64), value);
        expr.shape = TraversedShape::Number(None);
        Ok(expr)
    }

    /// `keys(x)` as a `Vec<&str>`.
    ///
    /// Structure keys are known ahead of time. Map keys are
    /// collected at runtime.
    fn keys(&mut self, arg: GeneratedExpression) -> Result<GeneratedExpression, TraversalError> {
        let schema = self.generator.schema();
        let shape = arg.shape.shape_id().and_then(|id| schema.get(id));
        let src = &arg.ident;
        let value = match shape {
            Some(Shape::Structure(s)) if arg.shape.is_object() => {
                let names = s.members.keys();
                if s.members.is_empty() {
                    quote!(::std::vec::Vec::<&str>::new())
                } else {
                    quote!(::std::vec![#(#names),*])
                }
            }
            Some(Shape::Map(_)) if arg.shape.is_object() => {
                let k = self.namer.name("k");
                quote!(#src.keys().map(|#k| #k.as_str()).collect::<::std::vec::Vec<_>>())
            }
            _ => {
                return Err(TraversalError::invalid(format!(
                    "`keys` takes an object, found a {}",
                    arg.shape
                )));
            }
        };
        let mut expr = arg.then(
            self.namer.name("keys"),
            RustType::vec(RustType::str_ref()),
            value,
        );
        expr.shape = TraversedShape::array_of(TraversedShape::String(None));
        Ok(expr)
    }

    /// `contains(subject, search)`.
    ///
    /// A string subject is searched for a substring. An array is
    /// searched element by element using comparator equality.
    /// `search` is computed once, outside the loop.
    fn contains(
        &mut self,
        subject: GeneratedExpression,
        search: GeneratedExpression,
    ) -> Result<GeneratedExpression, TraversalError> {
        if !matches!(
            search.shape,
            TraversedShape::Bool(_)
                | TraversedShape::Number(_)
                | TraversedShape::String(_)
                | TraversedShape::Enum(_)
        ) {
            return Err(TraversalError::invalid(format!(
                "`contains` searches for a boolean, number or string, found a {}",
                search.shape
            )));
        }

        let ident = self.namer.name("contains");
        let subject_shape = subject.shape.clone();
        let value = match &subject_shape {
            TraversedShape::String(_) => {
                if !search.shape.is_stringish() {
                    return Err(TraversalError::invalid(format!(
                        "`contains` on a string searches for a string, found a {}",
                        search.shape
                    )));
                }
                let subject = subject.convert_to_str_ref(&mut self.namer)?;
                let search = search.convert_to_str_ref(&mut self.namer)?;
                let (s, t) = (&subject.ident, &search.ident);
                let (s_out, t_out) = (&subject.output, &search.output);
                quote! {
                    #s_out
                    #t_out
                    let #ident = #s.contains(#t);
                }
            }
            TraversedShape::Array { member, .. } => {
                if !member.same_category(&search.shape) {
                    return Err(TraversalError::invalid(format!(
                        "`contains` on an array of {member} can't search for a {}",
                        search.shape
                    )));
                }
                let elem_ty = match subject.ty.referent() {
                    RustType::Vec(elem) => (**elem).clone(),
                    other => {
                        return Err(TraversalError::invalid(format!(
                            "`contains` can't iterate over `{other:?}`"
                        )));
                    }
                };
                let v = self.namer.name("v");
                let elem = GeneratedExpression::new(
                    v.clone(),
                    (**member).clone(),
                    RustType::reference(elem_ty),
                    Default::default(),
                );
                let (elem, search) = if member.is_stringish() {
                    (
                        elem.convert_to_str_ref(&mut self.namer)?,
                        search.convert_to_str_ref(&mut self.namer)?,
                    )
                } else if matches!(**member, TraversedShape::Number(_)) {
                    let target = common_number(&elem.ty, &search.ty);
                    (
                        elem.convert_to_number_primitive(&target, &mut self.namer)?,
                        search.convert_to_number_primitive(&target, &mut self.namer)?,
                    )
                } else {
                    (elem.dereference(&mut self.namer), search.dereference(&mut self.namer))
                };
                let s = &subject.ident;
                let s_out = &subject.output;
                let t = &search.ident;
                let t_out = &search.output;
                let e = &elem.ident;
                let e_out = &elem.output;
                quote! {
                    #s_out
                    #t_out
                    let #ident = #s.iter().any(|#v| {
                        #e_out
                        #e == #t
                    });
                }
            }
            shape => {
                return Err(TraversalError::invalid(format!(
                    "`contains` takes an array or a string, found a {shape}"
                )));
            }
        };
        Ok(GeneratedExpression::new(
            ident,
            TraversedShape::Bool(None),
            RustType::Bool,
            value,
        ))
    }
}
