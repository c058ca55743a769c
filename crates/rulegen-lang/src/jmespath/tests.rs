#![allow(clippy::panic)]

use rulegen_ast::{Comparator, JmesExpr, JmesLiteral};

use super::parse_jmespath;
use crate::ParseErrorKind;

fn b(e: JmesExpr) -> Box<JmesExpr> {
    Box::new(e)
}

fn field(name: &str) -> JmesExpr {
    JmesExpr::field(name)
}

fn string(s: &str) -> JmesExpr {
    JmesExpr::Literal(JmesLiteral::String(s.to_owned()))
}

#[track_caller]
fn parse(input: &str) -> JmesExpr {
    match parse_jmespath(input) {
        Ok(expr) => expr,
        Err(err) => panic!("`{input}`: {err}"),
    }
}

#[test]
fn test_parse_fields() {
    assert_eq!(parse("foo"), field("foo"));
    assert_eq!(parse("\"with space\""), field("with space"));
    assert_eq!(
        parse("foo.bar.baz"),
        JmesExpr::sub(JmesExpr::sub(field("foo"), field("bar")), field("baz"))
    );
    assert_eq!(parse("@"), JmesExpr::Current);
}

#[test]
fn test_parse_projections() {
    assert_eq!(
        parse("items[].name"),
        JmesExpr::Projection {
            left: b(JmesExpr::Flatten(b(field("items")))),
            right: b(field("name")),
        }
    );
    assert_eq!(
        parse("items[*].name"),
        JmesExpr::Projection {
            left: b(field("items")),
            right: b(field("name")),
        }
    );
    assert_eq!(
        parse("labels.*"),
        JmesExpr::ObjectProjection {
            left: b(field("labels")),
            right: b(JmesExpr::Current),
        }
    );
    assert_eq!(
        parse("groups[].members[].name"),
        JmesExpr::Projection {
            left: b(JmesExpr::Flatten(b(JmesExpr::Projection {
                left: b(JmesExpr::Flatten(b(field("groups")))),
                right: b(field("members")),
            }))),
            right: b(field("name")),
        }
    );
}

#[test]
fn test_parse_projection_ends() {
    let items = |right| JmesExpr::Projection {
        left: b(field("items")),
        right: b(right),
    };
    assert_eq!(parse("items[*]"), items(JmesExpr::Current));
    assert_eq!(
        parse("items[*] | name"),
        JmesExpr::Pipe(b(items(JmesExpr::Current)), b(field("name")))
    );
    assert_eq!(
        parse("items[*].name.first"),
        items(JmesExpr::sub(field("name"), field("first")))
    );
}

#[test]
fn test_parse_filter() {
    assert_eq!(
        parse("items[?state == 'Active'].name"),
        JmesExpr::FilterProjection {
            left: b(field("items")),
            right: b(field("name")),
            condition: b(JmesExpr::Comparator {
                op: Comparator::Equal,
                left: b(field("state")),
                right: b(string("Active")),
            }),
        }
    );
    assert_eq!(
        parse("length(items[?weight > `1.5`])"),
        JmesExpr::Function {
            name: "length".into(),
            args: vec![JmesExpr::FilterProjection {
                left: b(field("items")),
                right: b(JmesExpr::Current),
                condition: b(JmesExpr::Comparator {
                    op: Comparator::GreaterThan,
                    left: b(field("weight")),
                    right: b(JmesExpr::Literal(JmesLiteral::Float(1.5))),
                }),
            }],
        }
    );
}

#[test]
fn test_parse_operators() {
    assert_eq!(
        parse("a || b && !c"),
        JmesExpr::Or(
            b(field("a")),
            b(JmesExpr::And(b(field("b")), b(JmesExpr::Not(b(field("c")))))),
        )
    );
    assert_eq!(
        parse("a.b | c"),
        JmesExpr::Pipe(b(JmesExpr::sub(field("a"), field("b"))), b(field("c")))
    );
    assert_eq!(
        parse("size >= `10`"),
        JmesExpr::Comparator {
            op: Comparator::GreaterThanOrEqual,
            left: b(field("size")),
            right: b(JmesExpr::Literal(JmesLiteral::Int(10))),
        }
    );
}

#[test]
fn test_parse_functions_and_lists() {
    assert_eq!(
        parse("contains(tags, 'prod')"),
        JmesExpr::Function {
            name: "contains".into(),
            args: vec![field("tags"), string("prod")],
        }
    );
    assert_eq!(
        parse("[foo.bar, 'x']"),
        JmesExpr::MultiSelectList(vec![JmesExpr::sub(field("foo"), field("bar")), string("x")])
    );
    assert_eq!(
        parse("items[].[name, state]"),
        JmesExpr::Projection {
            left: b(JmesExpr::Flatten(b(field("items")))),
            right: b(JmesExpr::MultiSelectList(vec![field("name"), field("state")])),
        }
    );
}

#[test]
fn test_parse_rejected_constructs() {
    // These parse fine and are rejected by the traversal
    // compiler.
    assert_eq!(
        parse("a[0:2]"),
        JmesExpr::Projection {
            left: b(JmesExpr::Slice {
                left: b(field("a")),
                start: Some(0),
                stop: Some(2),
                step: None,
            }),
            right: b(JmesExpr::Current),
        }
    );
    assert_eq!(
        parse("a[-1]"),
        JmesExpr::Index {
            left: b(field("a")),
            index: -1,
        }
    );
    assert_eq!(
        parse("{k: v}"),
        JmesExpr::MultiSelectHash(vec![("k".into(), field("v"))])
    );
    assert_eq!(parse("`null`"), JmesExpr::Literal(JmesLiteral::Null));
    assert_eq!(
        parse("&foo"),
        JmesExpr::ExpressionType(b(field("foo")))
    );
}

#[test]
fn test_parse_literals() {
    assert_eq!(parse("'it\\'s'"), string("it's"));
    assert_eq!(parse("`\"x\"`"), string("x"));
    assert_eq!(parse("`foo`"), string("foo"));
    assert_eq!(
        parse("`[1, true]`"),
        JmesExpr::Literal(JmesLiteral::Array(vec![
            JmesLiteral::Int(1),
            JmesLiteral::Bool(true)
        ]))
    );
}

#[test]
fn test_parse_errors() {
    let tests = [
        ("", ParseErrorKind::UnexpectedEnd),
        ("foo.", ParseErrorKind::UnexpectedEnd),
        ("foo bar", ParseErrorKind::UnexpectedToken),
        ("foo[", ParseErrorKind::UnexpectedEnd),
        ("\"f\"(a)", ParseErrorKind::UnexpectedToken),
        ("a = b", ParseErrorKind::Syntax),
        ("a[99999999999999999999]", ParseErrorKind::InvalidNumber),
    ];
    for (input, kind) in tests {
        match parse_jmespath(input) {
            Ok(expr) => panic!("`{input}` should not parse, got {expr:?}"),
            Err(err) => assert_eq!(err.kind, kind, "`{input}`: {err}"),
        }
    }
}

#[test]
fn test_display_reparses() {
    let inputs = [
        "foo.bar",
        "items[].name",
        "items[?state == 'Active'].name",
        "length(items[?weight > `1.5`])",
        "groups[].members[].name",
        "(a || b) && !c",
        "labels.*",
        "[foo.bar, 'x']",
        "a | b",
        "a[0:2]",
    ];
    for input in inputs {
        let expr = parse(input);
        assert_eq!(parse(&expr.to_string()), expr, "`{input}` => `{expr}`");
    }
}
