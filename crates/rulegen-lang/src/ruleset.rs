use indexmap::IndexMap;
use rulegen_ast::{
    Condition, Deprecated, EndpointTemplate, Expr, FunctionCall, Literal, Parameter,
    ParameterType, ParameterValue, Rule, RuleKind, RuleSet, Schema, Shape, TestSuite,
};
use serde_derive::Deserialize;
use serde_json::Value;

use crate::{ParseError, parse_template};

#[derive(Deserialize)]
struct RawRuleSet {
    version: String,
    #[serde(default)]
    parameters: IndexMap<String, RawParameter>,
    rules: Vec<RawRule>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawParameter {
    #[serde(rename = "type")]
    ty: ParameterType,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    default: Option<ParameterValue>,
    #[serde(default)]
    built_in: Option<String>,
    #[serde(default)]
    documentation: Option<String>,
    #[serde(default)]
    deprecated: Option<Deprecated>,
}

#[derive(Deserialize)]
struct RawRule {
    #[serde(default)]
    documentation: Option<String>,
    #[serde(default)]
    conditions: Vec<RawCondition>,
    #[serde(flatten)]
    kind: RawRuleKind,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum RawRuleKind {
    Endpoint { endpoint: RawEndpoint },
    Error { error: Value },
    Tree { rules: Vec<RawRule> },
}

#[derive(Deserialize)]
struct RawCondition {
    #[serde(rename = "fn")]
    function: String,
    #[serde(default)]
    argv: Vec<Value>,
    #[serde(default)]
    assign: Option<String>,
}

#[derive(Deserialize)]
struct RawEndpoint {
    url: Value,
    #[serde(default)]
    properties: IndexMap<String, Value>,
    #[serde(default)]
    headers: IndexMap<String, Vec<Value>>,
}

/// Parses an endpoint ruleset from its JSON form.
pub fn parse_ruleset(input: &str) -> Result<RuleSet, ParseError> {
    let raw: RawRuleSet = serde_json::from_str(input)?;

    let parameters = raw
        .parameters
        .into_iter()
        .map(|(name, p)| {
            if let Some(default) = &p.default {
                if default.ty() != p.ty {
                    return Err(ParseError::document(format!(
                        "parameter `{name}` has type {} but its default is a {}",
                        p.ty,
                        default.ty()
                    )));
                }
            }
            Ok(Parameter {
                name,
                ty: p.ty,
                required: p.required,
                default: p.default,
                built_in: p.built_in,
                documentation: p.documentation,
                deprecated: p.deprecated,
            })
        })
        .collect::<Result<_, _>>()?;

    let rules = rules(raw.rules, "rules")?;

    Ok(RuleSet {
        version: raw.version,
        parameters,
        rules,
    })
}

fn rules(raw: Vec<RawRule>, path: &str) -> Result<Vec<Rule>, ParseError> {
    raw.into_iter()
        .enumerate()
        .map(|(i, rule)| self::rule(rule, &format!("{path}[{i}]")))
        .collect()
}

fn rule(raw: RawRule, path: &str) -> Result<Rule, ParseError> {
    let conditions = raw
        .conditions
        .into_iter()
        .enumerate()
        .map(|(i, c)| {
            let path = format!("{path}.conditions[{i}]");
            Ok(Condition {
                function: FunctionCall {
                    name: c.function,
                    args: exprs(c.argv, &path)?,
                },
                assign: c.assign,
            })
        })
        .collect::<Result<_, ParseError>>()?;

    let kind = match raw.kind {
        RawRuleKind::Endpoint { endpoint } => {
            let path = format!("{path}.endpoint");
            let headers = endpoint
                .headers
                .into_iter()
                .map(|(name, values)| Ok((name, exprs(values, &path)?)))
                .collect::<Result<_, ParseError>>()?;
            let properties = endpoint
                .properties
                .into_iter()
                .map(|(name, value)| Ok((name, expr(value, &path)?)))
                .collect::<Result<_, ParseError>>()?;
            RuleKind::Endpoint(EndpointTemplate {
                url: expr(endpoint.url, &path)?,
                headers,
                properties,
            })
        }
        RawRuleKind::Error { error } => RuleKind::Error(expr(error, &format!("{path}.error"))?),
        RawRuleKind::Tree { rules } => RuleKind::Tree(self::rules(rules, &format!("{path}.rules"))?),
    };

    Ok(Rule {
        documentation: raw.documentation,
        conditions,
        kind,
    })
}

fn exprs(values: Vec<Value>, path: &str) -> Result<Vec<Expr>, ParseError> {
    values.into_iter().map(|v| expr(v, path)).collect()
}

fn expr(value: Value, path: &str) -> Result<Expr, ParseError> {
    let expr = match value {
        Value::String(s) => {
            let template = parse_template(&s)
                .map_err(|err| ParseError::document(format!("{path}: {err}")))?;
            Expr::Literal(Literal::String(template))
        }
        Value::Bool(b) => Expr::Literal(Literal::Bool(b)),
        Value::Number(n) => match n.as_i64() {
            Some(n) => Expr::Literal(Literal::Int(n)),
            None => {
                return Err(ParseError::document(format!(
                    "{path}: only integers are supported, found {n}"
                )));
            }
        },
        Value::Array(items) => Expr::Literal(Literal::Array(exprs(items, path)?)),
        Value::Object(mut obj) => {
            if let Some(name) = obj.get("ref").and_then(Value::as_str) {
                Expr::reference(name)
            } else if let Some(Value::String(name)) = obj.remove("fn") {
                let argv = match obj.remove("argv") {
                    Some(Value::Array(argv)) => argv,
                    Some(other) => {
                        return Err(ParseError::document(format!(
                            "{path}: `argv` of `{name}` must be an array, found {other}"
                        )));
                    }
                    None => Vec::new(),
                };
                Expr::Call(FunctionCall {
                    name,
                    args: exprs(argv, path)?,
                })
            } else {
                let fields = obj
                    .into_iter()
                    .map(|(k, v)| Ok((k, expr(v, path)?)))
                    .collect::<Result<_, ParseError>>()?;
                Expr::Literal(Literal::Record(fields))
            }
        }
        Value::Null => {
            return Err(ParseError::document(format!(
                "{path}: null is not a valid expression"
            )));
        }
    };
    Ok(expr)
}

/// Parses endpoint test cases from their JSON form.
pub fn parse_test_suite(input: &str) -> Result<TestSuite, ParseError> {
    Ok(serde_json::from_str(input)?)
}

/// Parses a shape schema from its JSON form.
pub fn parse_schema(input: &str) -> Result<Schema, ParseError> {
    let schema: Schema = serde_json::from_str(input)?;
    for (id, shape) in &schema.shapes {
        let targets: Vec<_> = match shape {
            Shape::Structure(s) | Shape::Union(s) => {
                s.members.values().map(|m| &m.target).collect()
            }
            Shape::Map(m) => vec![&m.value],
            Shape::List(l) | Shape::Set(l) => vec![&l.member],
            _ => Vec::new(),
        };
        if let Some(missing) = targets.into_iter().find(|t| schema.get(t).is_none()) {
            return Err(ParseError::document(format!(
                "shape `{id}` targets unknown shape `{missing}`"
            )));
        }
    }
    Ok(schema)
}
