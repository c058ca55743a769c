#![cfg(test)]
#![allow(clippy::panic)]

use proc_macro2::TokenStream;
use proptest::prelude::*;
use quote::{format_ident, quote};
use rulegen_ast::{
    Condition, EndpointTemplate, Expr, FunctionCall, Parameter, ParameterType, Rule, RuleKind,
    RuleSet, TestCase,
};
use rulegen_lang::{parse_ruleset, parse_test_suite};

use crate::{
    Binding, CallContext, CodegenError, CodegenErrorKind, CustomRuntimeFunction, EndpointConfig,
    FunctionRegistry, RulesType, RulesetCompiler, Scope, generate_resolver, generate_tests,
    local_ident,
};

const PARAMETERS: &str = r#"{
    "Region": {"type": "String", "builtIn": "AWS::Region", "documentation": "The region."},
    "UseFIPS": {"type": "Boolean", "required": true, "default": false},
    "Endpoint": {"type": "String"},
    "Bucket": {"type": "String", "required": true},
    "Tags": {"type": "StringArray"}
}"#;

#[track_caller]
fn ruleset(rules: &str) -> RuleSet {
    let json = format!(r#"{{"version": "1.0", "parameters": {PARAMETERS}, "rules": {rules}}}"#);
    parse_ruleset(&json).unwrap_or_else(|err| panic!("{err}"))
}

#[track_caller]
fn resolver(rules: &str) -> TokenStream {
    let tokens = generate_resolver(&ruleset(rules), &EndpointConfig::default())
        .unwrap_or_else(|err| panic!("{err}"));
    // The output must be valid Rust.
    syn::parse2::<syn::File>(tokens.clone()).unwrap_or_else(|err| panic!("{err}"));
    tokens
}

#[track_caller]
fn resolver_err(rules: &str) -> CodegenError {
    match generate_resolver(&ruleset(rules), &EndpointConfig::default()) {
        Ok(tokens) => panic!("should not compile, got `{tokens}`"),
        Err(err) => err,
    }
}

#[track_caller]
fn assert_has(tokens: &TokenStream, want: TokenStream) {
    let (haystack, needle) = (tokens.to_string(), want.to_string());
    assert!(haystack.contains(&needle), "`{needle}` not in `{haystack}`");
}

#[track_caller]
fn assert_lacks(tokens: &TokenStream, want: TokenStream) {
    let (haystack, needle) = (tokens.to_string(), want.to_string());
    assert!(!haystack.contains(&needle), "`{needle}` in `{haystack}`");
}

/// Checks that `tokens` contains `head` followed by a block.
#[track_caller]
fn assert_opens(tokens: &TokenStream, head: TokenStream) {
    let (haystack, needle) = (tokens.to_string(), format!("{head} {{"));
    assert!(haystack.contains(&needle), "`{needle}` not in `{haystack}`");
}

fn catch_all() -> TokenStream {
    quote!("No rules matched these parameters. This is a bug. {_params:?}")
}

#[test]
fn test_local_ident() {
    assert_eq!(local_ident("Region").to_string(), "region");
    assert_eq!(local_ident("UseFIPS").to_string(), "use_fips");
    assert_eq!(local_ident("PartitionResult").to_string(), "partition_result");
    assert_eq!(local_ident("type").to_string(), "r#type");
    assert_eq!(local_ident("Self").to_string(), "self_");
}

#[test]
fn test_scope_is_persistent() {
    let ty = RulesType::option(RulesType::String);
    let root = Scope::new().with_member(
        "Region",
        Binding {
            ident: format_ident!("region"),
            ty: ty.clone(),
        },
    );
    let narrowed = root.with_member(
        "Region",
        Binding {
            ident: format_ident!("region"),
            ty: RulesType::String,
        },
    );
    let sibling = root.with_member(
        "Url",
        Binding {
            ident: format_ident!("url"),
            ty: RulesType::String,
        },
    );

    assert_eq!(narrowed.get("Region").map(|b| &b.ty), Some(&RulesType::String));
    assert_eq!(root.get("Region").map(|b| &b.ty), Some(&ty));
    assert!(root.get("Url").is_none());
    assert!(narrowed.get("Url").is_none());
    assert!(sibling.get("Url").is_some());
    assert!(Scope::new().is_empty());
    assert!(!root.is_empty());
}

#[test]
fn test_registry_tracks_first_use() {
    let mut registry = FunctionRegistry::standard();
    assert_eq!(registry.used().count(), 0);
    assert!(registry.lookup("nope").is_none());

    registry.lookup("uriEncode").expect("standard function");
    registry.lookup("aws.partition").expect("standard function");
    registry.lookup("uriEncode").expect("standard function");

    let used = registry.used().map(|f| f.id().to_owned()).collect::<Vec<_>>();
    assert_eq!(used, ["uriEncode", "aws.partition"]);
    assert!(registry.is_used("aws.partition"));
    assert!(!registry.is_used("substring"));

    registry.reset();
    assert_eq!(registry.used().count(), 0);
}

#[test]
fn test_unconditional_rule() {
    let tokens = resolver(
        r#"[{"conditions": [], "type": "endpoint", "endpoint": {"url": "https://example.com"}}]"#,
    );
    assert_has(
        &tokens,
        quote! {
            return ::std::result::Result::Ok(::rulegen_runtime::Endpoint::builder()
                .url("https://example.com")
                .build());
        },
    );
    // The only rule always matches.
    assert_lacks(&tokens, catch_all());
}

#[test]
fn test_rules_are_ordered() {
    let tokens = resolver(
        r#"[
            {
                "conditions": [
                    {"fn": "isSet", "argv": [{"ref": "Region"}]},
                    {"fn": "stringEquals", "argv": [{"ref": "Region"}, "us-east-1"]}
                ],
                "type": "endpoint",
                "endpoint": {"url": "https://east.example.com"}
            },
            {"conditions": [], "type": "endpoint", "endpoint": {"url": "https://default.example.com"}}
        ]"#,
    );
    let code = tokens.to_string();
    let east = code.find("https://east.example.com").expect("east endpoint");
    let default = code.find("https://default.example.com").expect("default endpoint");
    assert!(east < default);

    assert_has(&tokens, quote!(let region = _params.region.as_deref();));
    assert_opens(&tokens, quote!(if let ::std::option::Option::Some(region) = region));
    assert_opens(&tokens, quote!(if (region == "us-east-1")));
    assert_lacks(&tokens, catch_all());
}

#[test]
fn test_catch_all() {
    let tokens = resolver(
        r#"[
            {
                "conditions": [{"fn": "booleanEquals", "argv": [{"ref": "UseFIPS"}, true]}],
                "type": "error",
                "error": "FIPS is not supported"
            },
            {
                "conditions": [{"fn": "isSet", "argv": [{"ref": "Endpoint"}]}],
                "type": "endpoint",
                "endpoint": {"url": {"ref": "Endpoint"}}
            }
        ]"#,
    );
    assert_has(&tokens, quote!(let use_fips = _params.use_fips;));
    assert_has(
        &tokens,
        quote! {
            if (use_fips == true) {
                return ::std::result::Result::Err(::rulegen_runtime::ResolveEndpointError::message("FIPS is not supported"));
            }
        },
    );
    // Endpoints must not borrow the resolver's locals.
    assert_has(&tokens, quote!(.url(endpoint.to_owned())));
    assert_has(&tokens, catch_all());
}

#[test]
fn test_trees_nest() {
    let tokens = resolver(
        r#"[
            {
                "conditions": [{"fn": "aws.partition", "argv": ["{Bucket}"], "assign": "PartitionResult"}],
                "type": "tree",
                "rules": [
                    {
                        "conditions": [{"fn": "getAttr", "argv": [{"ref": "PartitionResult"}, "supportsFIPS"]}],
                        "type": "endpoint",
                        "endpoint": {
                            "url": "https://{Bucket}.{PartitionResult#dnsSuffix}",
                            "headers": {"x-partition": ["{PartitionResult#name}", "static"]},
                            "properties": {
                                "authSchemes": [{"name": "sigv4", "signingRegion": "{PartitionResult#implicitGlobalRegion}"}],
                                "fips": {"fn": "getAttr", "argv": [{"ref": "PartitionResult"}, "supportsFIPS"]},
                                "weight": 3
                            }
                        }
                    }
                ]
            },
            {"conditions": [], "type": "error", "error": "no partition for {Bucket}"}
        ]"#,
    );
    assert_opens(
        &tokens,
        quote! {
            if let ::std::option::Option::Some(partition_result) = partition_resolver.resolve_partition(
                ::std::format!("{}", bucket).as_str(),
                _diagnostic_collector
            )
        },
    );
    assert_opens(&tokens, quote!(if partition_result.supports_fips()));
    assert_has(
        &tokens,
        quote!(.url(::std::format!("https://{}.{}", bucket, partition_result.dns_suffix()))),
    );
    assert_has(
        &tokens,
        quote!(.header("x-partition", ::std::format!("{}", partition_result.name()))),
    );
    assert_has(&tokens, quote!(.header("x-partition", "static")));
    assert_has(&tokens, quote!(.property("weight", ::rulegen_runtime::Document::from(3i64))));
    assert_has(
        &tokens,
        quote!(.property("fips", ::rulegen_runtime::Document::from(partition_result.supports_fips()))),
    );
    assert_has(
        &tokens,
        quote! {
            "signingRegion".to_owned(),
            ::rulegen_runtime::Document::from(::std::format!("{}", partition_result.implicit_global_region()))
        },
    );
    assert_has(
        &tokens,
        quote!(::rulegen_runtime::ResolveEndpointError::message(::std::format!("no partition for {}", bucket))),
    );

    // The tree's last rule has conditions, so the tree ends in
    // an error. The top level ends in an unconditional rule.
    assert_eq!(tokens.to_string().matches(&catch_all().to_string()).count(), 1);
}

#[test]
fn test_assigned_conditions() {
    let tokens = resolver(
        r#"[
            {
                "conditions": [
                    {"fn": "uriEncode", "argv": [{"ref": "Bucket"}], "assign": "Encoded"},
                    {"fn": "isValidHostLabel", "argv": [{"ref": "Encoded"}, false], "assign": "Valid"},
                    {"fn": "substring", "argv": [{"ref": "Bucket"}, 0, 3, false], "assign": "Prefix"},
                    {"fn": "parseURL", "argv": ["https://{Prefix}.example.com"], "assign": "Url"}
                ],
                "type": "endpoint",
                "endpoint": {"url": "https://{Url#authority}/{Encoded}"}
            },
            {"conditions": [], "type": "error", "error": "invalid bucket"}
        ]"#,
    );
    // Owned strings are re-bound as `&str`.
    assert_has(
        &tokens,
        quote! {
            let encoded = ::rulegen_runtime::endpoint_lib::uri_encode::uri_encode(bucket);
            let encoded = encoded.as_str();
        },
    );
    assert_has(
        &tokens,
        quote! {
            let valid = ::rulegen_runtime::endpoint_lib::host::is_valid_host_label(
                encoded,
                false,
                _diagnostic_collector
            );
        },
    );
    assert_opens(&tokens, quote!(if valid));
    assert_opens(
        &tokens,
        quote! {
            if let ::std::option::Option::Some(prefix) = ::rulegen_runtime::endpoint_lib::substring::substring(
                bucket,
                0,
                3,
                false,
                _diagnostic_collector
            )
        },
    );
    assert_opens(
        &tokens,
        quote! {
            if let ::std::option::Option::Some(url) = ::rulegen_runtime::endpoint_lib::parse_url::parse_url(
                ::std::format!("https://{}.example.com", prefix).as_str(),
                _diagnostic_collector
            )
        },
    );
    assert_has(
        &tokens,
        quote!(.url(::std::format!("https://{}/{}", url.authority(), encoded))),
    );
}

#[test]
fn test_index_requires_narrowing() {
    let err = resolver_err(
        r#"[{
            "conditions": [{"fn": "getAttr", "argv": [{"ref": "Tags"}, "[0]"], "assign": "FirstTag"}],
            "type": "endpoint",
            "endpoint": {"url": "https://{FirstTag}"}
        }]"#,
    );
    assert!(
        matches!(err.kind(), CodegenErrorKind::TypeMismatch(_)),
        "{err}"
    );

    let tokens = resolver(
        r#"[
            {
                "conditions": [
                    {"fn": "isSet", "argv": [{"ref": "Tags"}]},
                    {"fn": "getAttr", "argv": [{"ref": "Tags"}, "[0]"], "assign": "FirstTag"}
                ],
                "type": "endpoint",
                "endpoint": {"url": "https://{FirstTag}"}
            },
            {"conditions": [], "type": "error", "error": "no tags"}
        ]"#,
    );
    assert_opens(
        &tokens,
        quote! {
            if let ::std::option::Option::Some(first_tag) = tags.get(0).map(::std::string::String::as_str)
        },
    );
}

#[test]
fn test_is_set_on_expressions() {
    let tokens = resolver(
        r#"[
            {
                "conditions": [
                    {"fn": "isSet", "argv": [{"fn": "parseURL", "argv": ["https://{Bucket}"]}]},
                    {"fn": "not", "argv": [{"fn": "isSet", "argv": [{"ref": "Endpoint"}]}]}
                ],
                "type": "endpoint",
                "endpoint": {"url": "https://{Bucket}"}
            },
            {"conditions": [], "type": "error", "error": "bad"}
        ]"#,
    );
    assert_opens(
        &tokens,
        quote! {
            if ::rulegen_runtime::endpoint_lib::parse_url::parse_url(
                ::std::format!("https://{}", bucket).as_str(),
                _diagnostic_collector
            ).is_some()
        },
    );
    assert_opens(&tokens, quote!(if !endpoint.is_some()));
}

#[test]
fn test_coalesce() {
    let tokens = resolver(
        r#"[
            {
                "conditions": [
                    {"fn": "coalesce", "argv": [{"ref": "Endpoint"}, {"ref": "Region"}], "assign": "Host"},
                    {"fn": "coalesce", "argv": [{"ref": "Endpoint"}, {"ref": "Bucket"}], "assign": "Name"},
                    {"fn": "coalesce", "argv": [{"ref": "Region"}, "{Bucket}-default"], "assign": "Label"},
                    {"fn": "coalesce", "argv": [{"ref": "Bucket"}, {"ref": "Endpoint"}], "assign": "Key"},
                    {"fn": "coalesce", "argv": [{"ref": "UseFIPS"}, false]}
                ],
                "type": "endpoint",
                "endpoint": {"url": "https://{Host}/{Name}/{Label}/{Key}"}
            },
            {"conditions": [], "type": "error", "error": "no host"}
        ]"#,
    );
    // Both optional: the result is still optional.
    assert_opens(
        &tokens,
        quote!(if let ::std::option::Option::Some(host) = endpoint.or(region)),
    );
    // Optional then set: the result is always set.
    assert_has(&tokens, quote!(let name = endpoint.unwrap_or(bucket);));
    // Owned defaults make the result owned.
    assert_has(
        &tokens,
        quote! {
            let label = region
                .map(::std::string::String::from)
                .unwrap_or(::std::format!("{}-default", bucket));
            let label = label.as_str();
        },
    );
    // The first argument is always set.
    assert_has(&tokens, quote!(let key = (bucket, endpoint).0;));
    assert_opens(&tokens, quote!(if (use_fips, false).0));
}

#[test]
fn test_coalesce_errors() {
    let tests = [
        (r#"[{"ref": "Bucket"}, true]"#, "type mismatch"),
        (r#"[{"ref": "Endpoint"}, {"ref": "Tags"}]"#, "type mismatch"),
        (
            r#"[{"fn": "parseURL", "argv": [{"ref": "Bucket"}]}, {"fn": "parseURL", "argv": ["https://example.com"]}]"#,
            "not supported",
        ),
        (r#"[{"ref": "Bucket"}]"#, "invalid argument"),
    ];
    for (argv, want) in tests {
        let rules = format!(
            r#"[{{
                "conditions": [{{"fn": "coalesce", "argv": {argv}, "assign": "X"}}],
                "type": "endpoint",
                "endpoint": {{"url": "https://example.com"}}
            }}]"#
        );
        let err = resolver_err(&rules);
        assert!(err.to_string().contains(want), "{argv}: {err}");
        assert!(!err.is_bug(), "{argv}: {err}");
    }
}

#[test]
fn test_unused_functions_add_no_state() {
    let rules = r#"[{"conditions": [], "type": "endpoint", "endpoint": {"url": "https://example.com"}}]"#;
    let tokens = resolver(rules);
    assert_lacks(&tokens, quote!(partition_resolver));
    assert_has(&tokens, quote!(pub struct DefaultResolver {}));

    #[derive(Debug)]
    struct Unused;
    impl CustomRuntimeFunction for Unused {
        fn id(&self) -> &str {
            "unused"
        }
        fn args(&self) -> Vec<RulesType> {
            Vec::new()
        }
        fn return_type(&self) -> RulesType {
            RulesType::Bool
        }
        fn call(&self, _ctx: CallContext<'_>, _args: &[TokenStream]) -> TokenStream {
            quote!(true)
        }
    }
    let mut config = EndpointConfig::default();
    config.registry.register(Box::new(Unused));
    let with_unused =
        generate_resolver(&ruleset(rules), &config).unwrap_or_else(|err| panic!("{err}"));
    assert_eq!(tokens.to_string(), with_unused.to_string());

    let tokens = resolver(
        r#"[
            {
                "conditions": [{"fn": "aws.partition", "argv": ["us-east-1"], "assign": "P"}],
                "type": "endpoint",
                "endpoint": {"url": "https://{P#dnsSuffix}"}
            },
            {"conditions": [], "type": "error", "error": "no partition"}
        ]"#,
    );
    assert_has(
        &tokens,
        quote! {
            pub struct DefaultResolver {
                partition_resolver: ::rulegen_runtime::endpoint_lib::partition::PartitionResolver,
            }
        },
    );
    assert_has(
        &tokens,
        quote!(resolve_endpoint(params, &mut diagnostic_collector, &self.partition_resolver,)),
    );
    assert_has(
        &tokens,
        quote!(partition_resolver: &::rulegen_runtime::endpoint_lib::partition::PartitionResolver,),
    );
}

#[test]
fn test_custom_functions() {
    #[derive(Debug)]
    struct Flag;
    impl CustomRuntimeFunction for Flag {
        fn id(&self) -> &str {
            "my.flag"
        }
        fn args(&self) -> Vec<RulesType> {
            vec![RulesType::String]
        }
        fn return_type(&self) -> RulesType {
            RulesType::Bool
        }
        fn call(&self, ctx: CallContext<'_>, args: &[TokenStream]) -> TokenStream {
            let dc = ctx.diagnostics;
            quote!(crate::flags::flag(#(#args,)* #dc))
        }
    }

    let ruleset = ruleset(
        r#"[
            {
                "conditions": [{"fn": "my.flag", "argv": [{"ref": "Bucket"}]}],
                "type": "endpoint",
                "endpoint": {"url": "https://flagged.example.com"}
            },
            {"conditions": [], "type": "endpoint", "endpoint": {"url": "https://example.com"}}
        ]"#,
    );
    let mut registry = FunctionRegistry::new();
    registry.register(Box::new(Flag));
    let compiled = RulesetCompiler::new(&ruleset)
        .registry(registry)
        .compile()
        .unwrap_or_else(|err| panic!("{err}"));
    assert_eq!(compiled.used_functions, ["my.flag"]);
    assert!(compiled.fields.is_empty());
    assert_opens(
        &compiled.function,
        quote!(if crate::flags::flag(bucket, _diagnostic_collector)),
    );

    // Without the standard library `uriEncode` is unknown.
    let ruleset = self::ruleset(
        r#"[{
            "conditions": [{"fn": "uriEncode", "argv": [{"ref": "Bucket"}], "assign": "E"}],
            "type": "endpoint",
            "endpoint": {"url": "https://{E}"}
        }]"#,
    );
    let err = RulesetCompiler::new(&ruleset)
        .registry(FunctionRegistry::new())
        .compile()
        .expect_err("`uriEncode` is not registered");
    assert_eq!(
        err.kind(),
        &CodegenErrorKind::UnknownFunction("uriEncode".into())
    );
}

#[test]
fn test_params() {
    let tokens = resolver(
        r#"[{"conditions": [], "type": "endpoint", "endpoint": {"url": "https://example.com"}}]"#,
    );
    assert_has(&tokens, quote!(region: ::std::option::Option<::std::string::String>,));
    assert_has(&tokens, quote!(use_fips: bool,));
    assert_has(&tokens, quote!(bucket: ::std::string::String,));
    assert_has(&tokens, quote!(use_fips: self.use_fips.unwrap_or(false)));
    assert_has(
        &tokens,
        quote!(bucket: self.bucket.ok_or_else(|| ::rulegen_runtime::InvalidParams::missing("bucket"))?),
    );
    assert_has(&tokens, quote!(region: self.region,));
    assert_has(
        &tokens,
        quote! {
            pub fn tags(&self) -> ::std::option::Option<&[::std::string::String]> {
                self.tags.as_deref()
            }
        },
    );
    assert_has(&tokens, quote!(pub fn set_region(mut self, param: ::std::option::Option<::std::string::String>) -> Self));

    let code = prettyplease::unparse(&syn::parse2(tokens).expect("valid Rust"));
    assert!(code.contains("/// The region."), "{code}");
    assert!(code.contains("/// Supplied by the `AWS::Region` built-in."), "{code}");
}

#[test]
fn test_ruleset_errors() {
    let tests: &[(&str, fn(&CodegenErrorKind) -> bool)] = &[
        (
            r#"[{"conditions": [{"fn": "nope", "argv": []}], "type": "error", "error": "x"}]"#,
            |k| matches!(k, CodegenErrorKind::UnknownFunction(f) if f == "nope"),
        ),
        (
            r#"[{"conditions": [], "type": "endpoint", "endpoint": {"url": "https://{Nope}"}}]"#,
            |k| matches!(k, CodegenErrorKind::UnknownReference(r) if r == "Nope"),
        ),
        (
            // `Region` may not be set.
            r#"[{"conditions": [{"fn": "stringEquals", "argv": [{"ref": "Region"}, "x"]}], "type": "error", "error": "x"}]"#,
            |k| matches!(k, CodegenErrorKind::TypeMismatch(_)),
        ),
        (
            r#"[{"conditions": [{"fn": "booleanEquals", "argv": [{"ref": "Bucket"}, true]}], "type": "error", "error": "x"}]"#,
            |k| matches!(k, CodegenErrorKind::TypeMismatch(_)),
        ),
        (
            // `Bucket` is always set.
            r#"[{"conditions": [{"fn": "isSet", "argv": [{"ref": "Bucket"}]}], "type": "error", "error": "x"}]"#,
            |k| matches!(k, CodegenErrorKind::TypeMismatch(_)),
        ),
        (
            r#"[{"conditions": [{"fn": "uriEncode", "argv": [{"ref": "Bucket"}]}], "type": "error", "error": "x"}]"#,
            |k| matches!(k, CodegenErrorKind::TypeMismatch(_)),
        ),
        (
            r#"[{"conditions": [{"fn": "substring", "argv": [{"ref": "Bucket"}, 0, 3]}], "type": "error", "error": "x"}]"#,
            |k| matches!(k, CodegenErrorKind::InvalidArgument(_)),
        ),
        (
            r#"[{"conditions": [{"fn": "not", "argv": [true, false]}], "type": "error", "error": "x"}]"#,
            |k| matches!(k, CodegenErrorKind::InvalidArgument(_)),
        ),
        (
            r#"[{"conditions": [{"fn": "aws.partition", "argv": [{"ref": "Bucket"}], "assign": "P"}], "type": "endpoint", "endpoint": {"url": "https://{P#nope}"}}]"#,
            |k| matches!(k, CodegenErrorKind::InvalidArgument(_)),
        ),
        (
            r#"[{"conditions": [{"fn": "aws.partition", "argv": [{"ref": "Bucket"}], "assign": "P"}], "type": "endpoint", "endpoint": {"url": {"ref": "P"}}}]"#,
            |k| matches!(k, CodegenErrorKind::TypeMismatch(_)),
        ),
        (
            r#"[{"conditions": [{"fn": "stringEquals", "argv": [["a"], "a"]}], "type": "error", "error": "x"}]"#,
            |k| matches!(k, CodegenErrorKind::Unsupported(_)),
        ),
    ];
    for (rules, check) in tests {
        let err = resolver_err(rules);
        assert!(check(err.kind()), "{rules}: {err}");
        assert!(!err.is_bug(), "{rules}: {err}");
        assert_eq!(err.rule(), Some("rules[0]"), "{rules}: {err}");
    }
}

#[test]
fn test_error_names_innermost_rule() {
    let err = resolver_err(
        r#"[
            {"conditions": [{"fn": "booleanEquals", "argv": [{"ref": "UseFIPS"}, true]}], "type": "error", "error": "x"},
            {
                "conditions": [],
                "type": "tree",
                "rules": [
                    {"conditions": [], "type": "endpoint", "endpoint": {"url": "https://{Nope}"}}
                ]
            }
        ]"#,
    );
    assert_eq!(err.rule(), Some("rules[1].rules[0]"));
    assert_eq!(
        err.to_string(),
        "unknown reference `Nope`\nRule: rules[1].rules[0]"
    );
}

#[test]
fn test_empty_ruleset_is_a_bug() {
    let ruleset = RuleSet {
        version: "1.0".into(),
        parameters: Vec::new(),
        rules: Vec::new(),
    };
    let err = RulesetCompiler::new(&ruleset)
        .compile()
        .expect_err("empty rulesets are rejected");
    assert_eq!(err.kind(), &CodegenErrorKind::EmptyRuleSet);
    assert!(err.is_bug());
}

#[test]
fn test_max_depth() {
    let mut rule = Rule {
        documentation: None,
        conditions: Vec::new(),
        kind: RuleKind::Error(Expr::string("too deep")),
    };
    for _ in 0..10 {
        rule = Rule {
            documentation: None,
            conditions: Vec::new(),
            kind: RuleKind::Tree(vec![rule]),
        };
    }
    let ruleset = RuleSet {
        version: "1.0".into(),
        parameters: Vec::new(),
        rules: vec![rule],
    };
    RulesetCompiler::new(&ruleset)
        .compile()
        .expect("within the default depth");
    let err = RulesetCompiler::new(&ruleset)
        .max_depth(5)
        .compile()
        .expect_err("too deep");
    assert!(matches!(err.kind(), CodegenErrorKind::Unsupported(_)), "{err}");
}

#[test]
fn test_generate_tests() {
    let ruleset = ruleset(
        r#"[
            {
                "conditions": [
                    {"fn": "isSet", "argv": [{"ref": "Region"}]},
                    {"fn": "stringEquals", "argv": [{"ref": "Region"}, "us-east-1"]}
                ],
                "type": "endpoint",
                "endpoint": {"url": "https://east.example.com"}
            },
            {"conditions": [], "type": "error", "error": "unknown region"}
        ]"#,
    );
    let suite = parse_test_suite(
        r#"{"testCases": [
            {
                "documentation": "east",
                "params": {"Region": "us-east-1", "Bucket": "b", "Tags": ["a"]},
                "expect": {"endpoint": {
                    "url": "https://east.example.com",
                    "headers": {"x-a": ["1", "2"]},
                    "properties": {"authSchemes": [{"name": "sigv4"}], "n": 1}
                }}
            },
            {
                "params": {"Region": "eu-west-1", "Bucket": "b", "UseFIPS": true},
                "expect": {"error": "unknown region"}
            }
        ]}"#,
    )
    .unwrap_or_else(|err| panic!("{err}"));

    let tokens = generate_tests(&ruleset, &suite.test_cases, &EndpointConfig::default())
        .unwrap_or_else(|err| panic!("{err}"));
    syn::parse2::<syn::File>(tokens.clone()).unwrap_or_else(|err| panic!("{err}"));

    assert_has(&tokens, quote!(fn test_1()));
    assert_has(&tokens, quote!(fn test_2()));
    assert_has(
        &tokens,
        quote! {
            let params = super::Params::builder()
                .region("us-east-1")
                .bucket("b")
                .tags(::std::vec::Vec::<::std::string::String>::from(["a".to_owned()]))
                .build()
                .expect("invalid params");
        },
    );
    assert_has(&tokens, quote!(.header("x-a", "1").header("x-a", "2")));
    assert_has(&tokens, quote!(.property("n", ::rulegen_runtime::Document::from(1i64))));
    assert_has(&tokens, quote!(.use_fips(true)));
    assert_has(
        &tokens,
        quote! {
            let error = endpoint.expect_err("expected an error: unknown region");
            assert_eq!(error.to_string(), "unknown region");
        },
    );
}

#[test]
fn test_generate_tests_rejects_bad_params() {
    let ruleset = ruleset(
        r#"[{"conditions": [], "type": "endpoint", "endpoint": {"url": "https://example.com"}}]"#,
    );
    let case = |params: &str| -> TestCase {
        let json = format!(
            r#"{{"testCases": [{{"params": {params}, "expect": {{"error": "x"}}}}]}}"#
        );
        let mut suite = parse_test_suite(&json).unwrap_or_else(|err| panic!("{err}"));
        suite.test_cases.remove(0)
    };

    let err = generate_tests(&ruleset, &[case(r#"{"Nope": "x"}"#)], &EndpointConfig::default())
        .expect_err("unknown parameter");
    assert!(matches!(err.kind(), CodegenErrorKind::InvalidArgument(_)), "{err}");

    let err = generate_tests(&ruleset, &[case(r#"{"UseFIPS": "x"}"#)], &EndpointConfig::default())
        .expect_err("wrong type");
    assert!(matches!(err.kind(), CodegenErrorKind::TypeMismatch(_)), "{err}");
}

/// Reports whether every path through `stmts` returns.
fn always_returns(stmts: &[syn::Stmt]) -> bool {
    match stmts.last() {
        Some(syn::Stmt::Expr(syn::Expr::Return(_), _)) => true,
        Some(syn::Stmt::Expr(syn::Expr::Block(block), _)) => always_returns(&block.block.stmts),
        _ => false,
    }
}

fn condition_strategy() -> impl Strategy<Value = Condition> {
    let call = |name: &str, args: Vec<Expr>| FunctionCall {
        name: name.to_owned(),
        args,
    };
    prop_oneof![
        Just(Condition {
            function: call("booleanEquals", vec![Expr::reference("UseFIPS"), Expr::Literal(rulegen_ast::Literal::Bool(true))]),
            assign: None,
        }),
        Just(Condition {
            function: call("not", vec![Expr::call("isSet", vec![Expr::reference("Region")])]),
            assign: None,
        }),
        Just(Condition {
            function: call("isSet", vec![Expr::call("parseURL", vec![Expr::reference("Bucket")])]),
            assign: None,
        }),
        Just(Condition {
            function: call("isValidHostLabel", vec![Expr::reference("Bucket"), Expr::Literal(rulegen_ast::Literal::Bool(false))]),
            assign: Some("Valid".into()),
        }),
        Just(Condition {
            function: call("substring", vec![
                Expr::reference("Bucket"),
                Expr::Literal(rulegen_ast::Literal::Int(0)),
                Expr::Literal(rulegen_ast::Literal::Int(1)),
                Expr::Literal(rulegen_ast::Literal::Bool(false)),
            ]),
            assign: Some("First".into()),
        }),
    ]
}

fn rule_strategy() -> impl Strategy<Value = Rule> {
    let leaf = (
        prop::collection::vec(condition_strategy(), 0..3),
        any::<bool>(),
    )
        .prop_map(|(conditions, endpoint)| Rule {
            documentation: None,
            conditions,
            kind: if endpoint {
                RuleKind::Endpoint(EndpointTemplate {
                    url: Expr::string("https://example.com"),
                    headers: Vec::new(),
                    properties: Vec::new(),
                })
            } else {
                RuleKind::Error(Expr::string("error"))
            },
        });
    leaf.prop_recursive(3, 16, 4, |inner| {
        (
            prop::collection::vec(condition_strategy(), 0..2),
            prop::collection::vec(inner, 0..4),
        )
            .prop_map(|(conditions, rules)| Rule {
                documentation: None,
                conditions,
                kind: RuleKind::Tree(rules),
            })
    })
}

proptest! {
    #[test]
    fn prop_resolvers_always_return(rules in prop::collection::vec(rule_strategy(), 1..4)) {
        let ruleset = RuleSet {
            version: "1.0".into(),
            parameters: vec![
                Parameter {
                    name: "Region".into(),
                    ty: ParameterType::String,
                    required: false,
                    default: None,
                    built_in: None,
                    documentation: None,
                    deprecated: None,
                },
                Parameter {
                    name: "UseFIPS".into(),
                    ty: ParameterType::Boolean,
                    required: true,
                    default: None,
                    built_in: None,
                    documentation: None,
                    deprecated: None,
                },
                Parameter {
                    name: "Bucket".into(),
                    ty: ParameterType::String,
                    required: true,
                    default: None,
                    built_in: None,
                    documentation: None,
                    deprecated: None,
                },
            ],
            rules,
        };
        let compiled = RulesetCompiler::new(&ruleset)
            .compile()
            .map_err(|err| TestCaseError::fail(err.to_string()))?;
        let function: syn::ItemFn = syn::parse2(compiled.function.clone())
            .map_err(|err| TestCaseError::fail(err.to_string()))?;
        prop_assert!(always_returns(&function.block.stmts), "{}", compiled.function);
    }
}
