#![cfg(test)]
#![allow(clippy::panic)]

use rulegen_ast::{
    Expr, FunctionCall, Literal, ParameterType, ParameterValue, RuleKind, Shape, ShapeId,
    Template, TemplatePart,
};

use crate::{ParseErrorKind, parse_ruleset, parse_schema, parse_template, parse_test_suite};

#[test]
fn test_parse_template() {
    let tmpl = parse_template("https://{Region}.{PartitionResult#dnsSuffix}/{{x}}")
        .expect("should parse");
    assert_eq!(
        tmpl,
        Template {
            parts: vec![
                TemplatePart::Literal("https://".into()),
                TemplatePart::Dynamic(Expr::reference("Region")),
                TemplatePart::Literal(".".into()),
                TemplatePart::Dynamic(Expr::call(
                    "getAttr",
                    vec![Expr::reference("PartitionResult"), Expr::string("dnsSuffix")],
                )),
                TemplatePart::Literal("/{x}".into()),
            ],
        }
    );
    assert!(parse_template("").expect("should parse").parts.is_empty());
}

#[test]
fn test_parse_template_errors() {
    let tests = [
        ("https://{Region", 8),
        ("a}b", 1),
        ("{}", 0),
        ("{a b}", 0),
        ("x{Ref#}", 1),
    ];
    for (input, offset) in tests {
        let err = parse_template(input).expect_err(input);
        assert_eq!(err.kind, ParseErrorKind::InvalidTemplate, "{input}");
        assert_eq!(err.offset, Some(offset), "{input}");
    }
}

const RULESET: &str = r#"{
    "version": "1.0",
    "parameters": {
        "Region": {
            "type": "String",
            "builtIn": "AWS::Region",
            "required": true,
            "documentation": "The region."
        },
        "UseFIPS": { "type": "Boolean", "required": true, "default": false },
        "Endpoint": { "type": "string" }
    },
    "rules": [
        {
            "conditions": [
                { "fn": "isSet", "argv": [{ "ref": "Endpoint" }] }
            ],
            "type": "endpoint",
            "endpoint": {
                "url": { "ref": "Endpoint" },
                "headers": { "x-fips": ["{UseFIPS}"] },
                "properties": { "authSchemes": [{ "name": "sigv4", "disableDoubleEncoding": true }] }
            }
        },
        {
            "conditions": [
                {
                    "fn": "aws.partition",
                    "argv": ["{Region}"],
                    "assign": "PartitionResult"
                }
            ],
            "type": "tree",
            "rules": [
                {
                    "conditions": [],
                    "type": "error",
                    "error": "no partition for {Region}"
                }
            ]
        }
    ]
}"#;

#[test]
fn test_parse_ruleset() {
    let ruleset = parse_ruleset(RULESET).expect("should parse");
    assert_eq!(ruleset.version, "1.0");

    let names: Vec<_> = ruleset.parameters.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Region", "UseFIPS", "Endpoint"]);
    let region = ruleset.parameter("Region").expect("Region");
    assert!(region.required);
    assert_eq!(region.built_in.as_deref(), Some("AWS::Region"));
    let fips = ruleset.parameter("UseFIPS").expect("UseFIPS");
    assert_eq!(fips.ty, ParameterType::Boolean);
    assert_eq!(fips.default, Some(ParameterValue::Bool(false)));
    assert_eq!(
        ruleset.parameter("Endpoint").map(|p| p.ty),
        Some(ParameterType::String)
    );

    let first = &ruleset.rules[0];
    assert_eq!(
        first.conditions[0].function,
        FunctionCall {
            name: "isSet".into(),
            args: vec![Expr::reference("Endpoint")],
        }
    );
    let RuleKind::Endpoint(endpoint) = &first.kind else {
        panic!("expected an endpoint rule");
    };
    assert_eq!(endpoint.url, Expr::reference("Endpoint"));
    assert_eq!(endpoint.headers[0].0, "x-fips");
    let Expr::Literal(Literal::Array(schemes)) = &endpoint.properties[0].1 else {
        panic!("expected an array");
    };
    assert!(matches!(&schemes[0], Expr::Literal(Literal::Record(fields)) if fields.len() == 2));

    let second = &ruleset.rules[1];
    assert_eq!(second.conditions[0].assign.as_deref(), Some("PartitionResult"));
    let RuleKind::Tree(inner) = &second.kind else {
        panic!("expected a tree rule");
    };
    assert!(matches!(&inner[0].kind, RuleKind::Error(Expr::Literal(Literal::String(_)))));
    assert_eq!(inner[0].kind.name(), "error");
}

#[test]
fn test_parse_ruleset_errors() {
    let tests = [
        (
            r#"{"version": "1.0", "parameters": {"A": {"type": "Boolean", "default": "x"}}, "rules": []}"#,
            "parameter `A` has type Boolean",
        ),
        (
            r#"{"version": "1.0", "rules": [{"type": "error", "error": "{oops"}]}"#,
            "rules[0].error",
        ),
        (
            r#"{"version": "1.0", "rules": [{"type": "tree", "rules": [{"type": "error", "error": null}]}]}"#,
            "rules[0].rules[0].error: null",
        ),
        (
            r#"{"version": "1.0", "rules": [{"type": "endpoint", "endpoint": {"url": 1.5}}]}"#,
            "only integers",
        ),
        (r#"{"version": "1.0", "rules": [{"type": "bogus"}]}"#, "bogus"),
    ];
    for (input, want) in tests {
        let err = parse_ruleset(input).expect_err(want);
        assert_eq!(err.kind, ParseErrorKind::InvalidDocument);
        assert!(err.to_string().contains(want), "`{err}` should contain `{want}`");
    }
}

#[test]
fn test_parse_test_suite() {
    let suite = parse_test_suite(
        r#"{"testCases": [{"params": {"Region": "us-east-1"}, "expect": {"error": "bad"}}]}"#,
    )
    .expect("should parse");
    assert_eq!(suite.test_cases.len(), 1);
    assert_eq!(
        suite.test_cases[0].params.get("Region"),
        Some(&ParameterValue::String("us-east-1".into()))
    );
}

#[test]
fn test_parse_schema() {
    let schema = parse_schema(
        r#"{"shapes": {
            "Output": {"type": "structure", "members": {"tags": {"target": "Tags"}}},
            "Tags": {"type": "list", "member": "String"},
            "String": {"type": "string"}
        }}"#,
    )
    .expect("should parse");
    assert!(matches!(
        schema.get(&ShapeId::new("Tags")),
        Some(Shape::List(l)) if l.member == ShapeId::new("String")
    ));

    let err = parse_schema(r#"{"shapes": {"Tags": {"type": "list", "member": "Nope"}}}"#)
        .expect_err("dangling target");
    assert!(err.to_string().contains("unknown shape `Nope`"), "{err}");
}
