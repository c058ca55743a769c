//! The standard library of rules functions.
//!
//! Each function is implemented in `rulegen_runtime::endpoint_lib`.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use crate::{CallContext, CustomRuntimeFunction, RecordType, ResolverField, RulesType};

pub(crate) fn functions() -> Vec<Box<dyn CustomRuntimeFunction>> {
    vec![
        Box::new(Substring),
        Box::new(IsValidHostLabel),
        Box::new(ParseUrl),
        Box::new(UriEncode),
        Box::new(Partition),
    ]
}

/// The record returned by `parseURL`.
pub fn url_type() -> RecordType {
    RecordType::new("URL")
        .field("scheme", "scheme", RulesType::String)
        .field("authority", "authority", RulesType::String)
        .field("path", "path", RulesType::String)
        .field("normalizedPath", "normalized_path", RulesType::String)
        .field("isIp", "is_ip", RulesType::Bool)
}

/// The record returned by `aws.partition`.
pub fn partition_type() -> RecordType {
    RecordType::new("partition")
        .field("name", "name", RulesType::String)
        .field("dnsSuffix", "dns_suffix", RulesType::String)
        .field("dualStackDnsSuffix", "dual_stack_dns_suffix", RulesType::String)
        .field("supportsFIPS", "supports_fips", RulesType::Bool)
        .field("supportsDualStack", "supports_dual_stack", RulesType::Bool)
        .field(
            "implicitGlobalRegion",
            "implicit_global_region",
            RulesType::String,
        )
}

/// `substring(input, start, stop, reverse)`.
#[derive(Debug)]
pub struct Substring;

impl CustomRuntimeFunction for Substring {
    fn id(&self) -> &str {
        "substring"
    }

    fn args(&self) -> Vec<RulesType> {
        vec![
            RulesType::String,
            RulesType::Int,
            RulesType::Int,
            RulesType::Bool,
        ]
    }

    fn return_type(&self) -> RulesType {
        RulesType::option(RulesType::String)
    }

    fn call(&self, ctx: CallContext<'_>, args: &[TokenStream]) -> TokenStream {
        let rt = ctx.runtime;
        let dc = ctx.diagnostics;
        quote!(#rt::endpoint_lib::substring::substring(#(#args,)* #dc))
    }
}

/// `isValidHostLabel(label, allowSubDomains)`.
#[derive(Debug)]
pub struct IsValidHostLabel;

impl CustomRuntimeFunction for IsValidHostLabel {
    fn id(&self) -> &str {
        "isValidHostLabel"
    }

    fn args(&self) -> Vec<RulesType> {
        vec![RulesType::String, RulesType::Bool]
    }

    fn return_type(&self) -> RulesType {
        RulesType::Bool
    }

    fn call(&self, ctx: CallContext<'_>, args: &[TokenStream]) -> TokenStream {
        let rt = ctx.runtime;
        let dc = ctx.diagnostics;
        quote!(#rt::endpoint_lib::host::is_valid_host_label(#(#args,)* #dc))
    }
}

/// `parseURL(url)`.
#[derive(Debug)]
pub struct ParseUrl;

impl CustomRuntimeFunction for ParseUrl {
    fn id(&self) -> &str {
        "parseURL"
    }

    fn args(&self) -> Vec<RulesType> {
        vec![RulesType::String]
    }

    fn return_type(&self) -> RulesType {
        RulesType::option(RulesType::Record(url_type()))
    }

    fn call(&self, ctx: CallContext<'_>, args: &[TokenStream]) -> TokenStream {
        let rt = ctx.runtime;
        let dc = ctx.diagnostics;
        quote!(#rt::endpoint_lib::parse_url::parse_url(#(#args,)* #dc))
    }
}

/// `uriEncode(value)`.
#[derive(Debug)]
pub struct UriEncode;

impl CustomRuntimeFunction for UriEncode {
    fn id(&self) -> &str {
        "uriEncode"
    }

    fn args(&self) -> Vec<RulesType> {
        vec![RulesType::String]
    }

    fn return_type(&self) -> RulesType {
        RulesType::String
    }

    fn returns_owned(&self) -> bool {
        true
    }

    fn call(&self, ctx: CallContext<'_>, args: &[TokenStream]) -> TokenStream {
        let rt = ctx.runtime;
        quote!(#rt::endpoint_lib::uri_encode::uri_encode(#(#args),*))
    }
}

/// `aws.partition(region)`.
///
/// The resolver owns a `PartitionResolver` loaded from the
/// built-in partition table.
#[derive(Debug)]
pub struct Partition;

impl CustomRuntimeFunction for Partition {
    fn id(&self) -> &str {
        "aws.partition"
    }

    fn args(&self) -> Vec<RulesType> {
        vec![RulesType::String]
    }

    fn return_type(&self) -> RulesType {
        RulesType::option(RulesType::Record(partition_type()))
    }

    fn call(&self, ctx: CallContext<'_>, args: &[TokenStream]) -> TokenStream {
        let dc = ctx.diagnostics;
        quote!(partition_resolver.resolve_partition(#(#args,)* #dc))
    }

    fn resolver_field(&self, runtime: &syn::Path) -> Option<ResolverField> {
        Some(ResolverField {
            ident: format_ident!("partition_resolver"),
            ty: quote!(#runtime::endpoint_lib::partition::PartitionResolver),
            init: quote!(#runtime::endpoint_lib::partition::PartitionResolver::default()),
        })
    }
}
