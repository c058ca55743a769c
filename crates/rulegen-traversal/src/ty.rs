use proc_macro2::{Span, TokenStream};
use quote::{format_ident, quote};

/// The Rust type of a generated value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RustType {
    /// `bool`
    Bool,
    /// `i8` through `i64`.
    Integer(u8),
    /// `f32` or `f64`.
    Float(u8),
    /// `String`
    String,
    /// `str`, only ever seen behind a reference.
    Str,
    /// A data model type.
    Opaque(String),
    /// `Vec<T>`
    Vec(Box<RustType>),
    /// `HashMap<K, V>`
    HashMap(Box<RustType>, Box<RustType>),
    /// `Option<T>`
    Option(Box<RustType>),
    /// `&T`
    Reference(Box<RustType>),
}

impl RustType {
    /// `&T`
    pub fn reference(inner: RustType) -> Self {
        Self::Reference(Box::new(inner))
    }

    /// `Option<T>`
    pub fn option(inner: RustType) -> Self {
        Self::Option(Box::new(inner))
    }

    /// `Vec<T>`
    pub fn vec(inner: RustType) -> Self {
        Self::Vec(Box::new(inner))
    }

    /// `&str`
    pub fn str_ref() -> Self {
        Self::reference(Self::Str)
    }

    /// Reports whether values of this type are `Copy`.
    ///
    /// Data model types aren't assumed to be.
    pub fn is_copy(&self) -> bool {
        match self {
            Self::Bool | Self::Integer(_) | Self::Float(_) | Self::Reference(_) => true,
            Self::Option(inner) => inner.is_copy(),
            Self::String | Self::Str | Self::Opaque(_) | Self::Vec(_) | Self::HashMap(..) => false,
        }
    }

    /// Reports whether this is `Option<T>`.
    pub fn is_option(&self) -> bool {
        matches!(self, Self::Option(_))
    }

    /// Strips one level of `Option`.
    pub fn unwrap_option(&self) -> &RustType {
        match self {
            Self::Option(inner) => inner,
            other => other,
        }
    }

    /// Strips any number of references.
    pub fn referent(&self) -> &RustType {
        match self {
            Self::Reference(inner) => inner.referent(),
            other => other,
        }
    }

    /// Reports whether this is a number, possibly behind a
    /// reference.
    pub fn is_number(&self) -> bool {
        matches!(self.referent(), Self::Integer(_) | Self::Float(_))
    }

    /// The type `into_iter()` yields for a value of this type.
    ///
    /// Iterating through a reference yields references.
    pub fn item(&self) -> Option<RustType> {
        match self {
            Self::Vec(inner) => Some((**inner).clone()),
            Self::Reference(inner) => match &**inner {
                Self::Vec(elem) => Some(Self::reference((**elem).clone())),
                Self::Reference(_) => inner.item(),
                _ => None,
            },
            _ => None,
        }
    }

    /// Renders the type. References carry `lifetime` when it's
    /// set. `model` is the path to the data model types.
    pub fn to_tokens(&self, model: &TokenStream, lifetime: Option<&syn::Lifetime>) -> TokenStream {
        match self {
            Self::Bool => quote!(bool),
            Self::Integer(bits) => {
                let ident = format_ident!("i{bits}");
                quote!(#ident)
            }
            Self::Float(bits) => {
                let ident = format_ident!("f{bits}");
                quote!(#ident)
            }
            Self::String => quote!(::std::string::String),
            Self::Str => quote!(str),
            Self::Opaque(name) => {
                let ident = syn::Ident::new(name, Span::call_site());
                quote!(#model::#ident)
            }
            Self::Vec(inner) => {
                let inner = inner.to_tokens(model, lifetime);
                quote!(::std::vec::Vec<#inner>)
            }
            Self::HashMap(key, value) => {
                let key = key.to_tokens(model, lifetime);
                let value = value.to_tokens(model, lifetime);
                quote!(::std::collections::HashMap<#key, #value>)
            }
            Self::Option(inner) => {
                let inner = inner.to_tokens(model, lifetime);
                quote!(::std::option::Option<#inner>)
            }
            Self::Reference(inner) => {
                let inner = inner.to_tokens(model, lifetime);
                quote!(&#lifetime #inner)
            }
        }
    }
}
