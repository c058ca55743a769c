use rulegen_ast::{Comparator, JmesExpr, JmesLiteral};

use super::{Rule, Token};
use crate::{ParseError, ParseErrorKind};

/// Projections stop consuming at this binding power.
const PROJECTION_STOP: u8 = 10;

fn binding_power(rule: Rule) -> u8 {
    match rule {
        Rule::pipe => 1,
        Rule::op_or => 2,
        Rule::op_and => 3,
        Rule::op_eq | Rule::op_ne | Rule::op_lt | Rule::op_lte | Rule::op_gt | Rule::op_gte => 5,
        Rule::flatten => 9,
        Rule::star => 20,
        Rule::filter => 21,
        Rule::dot => 40,
        Rule::op_not => 45,
        Rule::lbrace => 50,
        Rule::lbracket => 55,
        Rule::lparen => 60,
        _ => 0,
    }
}

fn comparator(rule: Rule) -> Option<Comparator> {
    let op = match rule {
        Rule::op_eq => Comparator::Equal,
        Rule::op_ne => Comparator::NotEqual,
        Rule::op_lt => Comparator::LessThan,
        Rule::op_lte => Comparator::LessThanOrEqual,
        Rule::op_gt => Comparator::GreaterThan,
        Rule::op_gte => Comparator::GreaterThanOrEqual,
        _ => return None,
    };
    Some(op)
}

/// A Pratt parser over lexed JMESPath tokens.
pub(super) struct Parser<'t, 'a> {
    tokens: &'t [Token<'a>],
    pos: usize,
}

impl<'t, 'a> Parser<'t, 'a> {
    pub fn new(tokens: &'t [Token<'a>]) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn parse(mut self) -> Result<JmesExpr, ParseError> {
        let expr = self.expression(0)?;
        if self.current() != Rule::EOI {
            return Err(self.unexpected());
        }
        Ok(expr)
    }

    fn peek(&self, n: usize) -> Option<&Token<'a>> {
        self.tokens.get(self.pos.saturating_add(n))
    }

    fn lookahead(&self, n: usize) -> Rule {
        self.peek(n).map_or(Rule::EOI, |t| t.rule)
    }

    fn current(&self) -> Rule {
        self.lookahead(0)
    }

    fn offset(&self) -> usize {
        match self.peek(0) {
            Some(t) => t.offset,
            None => self.tokens.last().map_or(0, |t| t.offset.saturating_add(t.text.len())),
        }
    }

    fn advance(&mut self) -> Option<Token<'a>> {
        let token = self.peek(0).copied();
        if token.is_some() {
            self.pos = self.pos.saturating_add(1);
        }
        token
    }

    fn unexpected(&self) -> ParseError {
        match self.peek(0) {
            Some(t) if t.rule != Rule::EOI => ParseError::at(
                ParseErrorKind::UnexpectedToken,
                format!("unexpected token `{}`", t.text),
                t.offset,
            ),
            _ => ParseError::at(
                ParseErrorKind::UnexpectedEnd,
                "unexpected end of expression",
                self.offset(),
            ),
        }
    }

    fn expect(&mut self, rule: Rule) -> Result<Token<'a>, ParseError> {
        if self.current() != rule {
            return Err(self.unexpected());
        }
        self.advance().ok_or_else(|| self.unexpected())
    }

    fn expression(&mut self, rbp: u8) -> Result<JmesExpr, ParseError> {
        let token = match self.peek(0) {
            Some(t) if t.rule != Rule::EOI => *t,
            _ => return Err(self.unexpected()),
        };
        self.advance();
        let mut left = self.nud(token)?;
        while rbp < binding_power(self.current()) {
            let Some(token) = self.advance() else {
                break;
            };
            left = self.led(token, left)?;
        }
        Ok(left)
    }

    fn nud(&mut self, token: Token<'a>) -> Result<JmesExpr, ParseError> {
        match token.rule {
            Rule::json_literal => Ok(JmesExpr::Literal(json_literal(&token)?)),
            Rule::raw_string => Ok(JmesExpr::Literal(JmesLiteral::String(raw_string(&token)))),
            Rule::unquoted_identifier => Ok(JmesExpr::Field(token.text.to_owned())),
            Rule::quoted_identifier => {
                if self.current() == Rule::lparen {
                    return Err(ParseError::at(
                        ParseErrorKind::UnexpectedToken,
                        "quoted identifiers cannot name functions",
                        token.offset,
                    ));
                }
                Ok(JmesExpr::Field(quoted_identifier(&token)?))
            }
            Rule::star => {
                let right = if self.current() == Rule::rbracket {
                    JmesExpr::Current
                } else {
                    self.projection_rhs(binding_power(Rule::star))?
                };
                Ok(JmesExpr::ObjectProjection {
                    left: Box::new(JmesExpr::Current),
                    right: Box::new(right),
                })
            }
            Rule::filter => self.filter(JmesExpr::Current),
            Rule::lbrace => self.multi_select_hash(),
            Rule::lparen => {
                let expr = self.expression(0)?;
                self.expect(Rule::rparen)?;
                Ok(expr)
            }
            Rule::flatten => {
                let right = self.projection_rhs(binding_power(Rule::flatten))?;
                Ok(JmesExpr::Projection {
                    left: Box::new(JmesExpr::Flatten(Box::new(JmesExpr::Current))),
                    right: Box::new(right),
                })
            }
            Rule::op_not => {
                let expr = self.expression(binding_power(Rule::op_not))?;
                Ok(JmesExpr::Not(Box::new(expr)))
            }
            Rule::lbracket => match self.current() {
                Rule::number | Rule::colon => self.index_or_slice(JmesExpr::Current),
                Rule::star if self.lookahead(1) == Rule::rbracket => {
                    self.advance();
                    self.advance();
                    let right = self.projection_rhs(binding_power(Rule::star))?;
                    Ok(JmesExpr::Projection {
                        left: Box::new(JmesExpr::Current),
                        right: Box::new(right),
                    })
                }
                _ => self.multi_select_list(),
            },
            Rule::current => Ok(JmesExpr::Current),
            Rule::expref => {
                let expr = self.expression(binding_power(Rule::expref))?;
                Ok(JmesExpr::ExpressionType(Box::new(expr)))
            }
            _ => Err(ParseError::at(
                ParseErrorKind::UnexpectedToken,
                format!("unexpected token `{}`", token.text),
                token.offset,
            )),
        }
    }

    fn led(&mut self, token: Token<'a>, left: JmesExpr) -> Result<JmesExpr, ParseError> {
        if let Some(op) = comparator(token.rule) {
            let right = self.expression(binding_power(token.rule))?;
            return Ok(JmesExpr::Comparator {
                op,
                left: Box::new(left),
                right: Box::new(right),
            });
        }
        match token.rule {
            Rule::dot => {
                if self.current() == Rule::star {
                    self.advance();
                    let right = self.projection_rhs(binding_power(Rule::dot))?;
                    Ok(JmesExpr::ObjectProjection {
                        left: Box::new(left),
                        right: Box::new(right),
                    })
                } else {
                    let right = self.dot_rhs(binding_power(Rule::dot))?;
                    Ok(JmesExpr::sub(left, right))
                }
            }
            Rule::pipe => {
                let right = self.expression(binding_power(Rule::pipe))?;
                Ok(JmesExpr::Pipe(Box::new(left), Box::new(right)))
            }
            Rule::op_or => {
                let right = self.expression(binding_power(Rule::op_or))?;
                Ok(JmesExpr::Or(Box::new(left), Box::new(right)))
            }
            Rule::op_and => {
                let right = self.expression(binding_power(Rule::op_and))?;
                Ok(JmesExpr::And(Box::new(left), Box::new(right)))
            }
            Rule::lparen => {
                let JmesExpr::Field(name) = left else {
                    return Err(ParseError::at(
                        ParseErrorKind::UnexpectedToken,
                        format!("invalid function name `{left}`"),
                        token.offset,
                    ));
                };
                let mut args = Vec::new();
                while self.current() != Rule::rparen {
                    args.push(self.expression(0)?);
                    if self.current() == Rule::comma {
                        self.advance();
                    }
                }
                self.expect(Rule::rparen)?;
                Ok(JmesExpr::Function { name, args })
            }
            Rule::filter => self.filter(left),
            Rule::flatten => {
                let right = self.projection_rhs(binding_power(Rule::flatten))?;
                Ok(JmesExpr::Projection {
                    left: Box::new(JmesExpr::Flatten(Box::new(left))),
                    right: Box::new(right),
                })
            }
            Rule::lbracket => match self.current() {
                Rule::number | Rule::colon => self.index_or_slice(left),
                _ => {
                    self.expect(Rule::star)?;
                    self.expect(Rule::rbracket)?;
                    let right = self.projection_rhs(binding_power(Rule::star))?;
                    Ok(JmesExpr::Projection {
                        left: Box::new(left),
                        right: Box::new(right),
                    })
                }
            },
            _ => Err(ParseError::at(
                ParseErrorKind::UnexpectedToken,
                format!("unexpected token `{}`", token.text),
                token.offset,
            )),
        }
    }

    /// Parses `[?cond]` after the `[?` token.
    fn filter(&mut self, left: JmesExpr) -> Result<JmesExpr, ParseError> {
        let condition = self.expression(0)?;
        self.expect(Rule::rbracket)?;
        let right = if self.current() == Rule::flatten {
            JmesExpr::Current
        } else {
            self.projection_rhs(binding_power(Rule::filter))?
        };
        Ok(JmesExpr::FilterProjection {
            left: Box::new(left),
            right: Box::new(right),
            condition: Box::new(condition),
        })
    }

    /// Parses `[n]` or `[start:stop:step]` after the `[` token.
    fn index_or_slice(&mut self, left: JmesExpr) -> Result<JmesExpr, ParseError> {
        if self.lookahead(0) == Rule::colon || self.lookahead(1) == Rule::colon {
            let mut parts = [None; 3];
            let mut idx = 0usize;
            while self.current() != Rule::rbracket {
                match self.current() {
                    Rule::colon => {
                        idx = idx.saturating_add(1);
                        if idx >= parts.len() {
                            return Err(self.unexpected());
                        }
                        self.advance();
                    }
                    Rule::number => {
                        let token = self.expect(Rule::number)?;
                        parts[idx] = Some(number(&token)?);
                    }
                    _ => return Err(self.unexpected()),
                }
            }
            self.expect(Rule::rbracket)?;
            let [start, stop, step] = parts;
            let slice = JmesExpr::Slice {
                left: Box::new(left),
                start,
                stop,
                step,
            };
            let right = self.projection_rhs(binding_power(Rule::star))?;
            Ok(JmesExpr::Projection {
                left: Box::new(slice),
                right: Box::new(right),
            })
        } else {
            let token = self.expect(Rule::number)?;
            let index = number(&token)?;
            self.expect(Rule::rbracket)?;
            Ok(JmesExpr::Index {
                left: Box::new(left),
                index,
            })
        }
    }

    fn projection_rhs(&mut self, bp: u8) -> Result<JmesExpr, ParseError> {
        let next = self.current();
        if binding_power(next) < PROJECTION_STOP {
            return Ok(JmesExpr::Current);
        }
        match next {
            Rule::lbracket | Rule::filter => self.expression(bp),
            Rule::dot => {
                self.advance();
                self.dot_rhs(bp)
            }
            _ => Err(self.unexpected()),
        }
    }

    fn dot_rhs(&mut self, bp: u8) -> Result<JmesExpr, ParseError> {
        match self.current() {
            Rule::quoted_identifier | Rule::unquoted_identifier | Rule::star => {
                self.expression(bp)
            }
            Rule::lbracket => {
                self.advance();
                self.multi_select_list()
            }
            Rule::lbrace => {
                self.advance();
                self.multi_select_hash()
            }
            _ => Err(self.unexpected()),
        }
    }

    /// Parses `a, b]` after the `[` token.
    fn multi_select_list(&mut self) -> Result<JmesExpr, ParseError> {
        let mut items = Vec::new();
        loop {
            items.push(self.expression(0)?);
            if self.current() == Rule::rbracket {
                break;
            }
            self.expect(Rule::comma)?;
        }
        self.expect(Rule::rbracket)?;
        Ok(JmesExpr::MultiSelectList(items))
    }

    /// Parses `k: v}` after the `{` token.
    fn multi_select_hash(&mut self) -> Result<JmesExpr, ParseError> {
        let mut entries = Vec::new();
        loop {
            let key = match self.current() {
                Rule::unquoted_identifier => self.expect(Rule::unquoted_identifier)?.text.to_owned(),
                Rule::quoted_identifier => {
                    let token = self.expect(Rule::quoted_identifier)?;
                    quoted_identifier(&token)?
                }
                _ => return Err(self.unexpected()),
            };
            self.expect(Rule::colon)?;
            let value = self.expression(0)?;
            entries.push((key, value));
            if self.current() == Rule::rbrace {
                break;
            }
            self.expect(Rule::comma)?;
        }
        self.expect(Rule::rbrace)?;
        Ok(JmesExpr::MultiSelectHash(entries))
    }
}

fn number(token: &Token<'_>) -> Result<i64, ParseError> {
    token.text.parse().map_err(|_| {
        ParseError::at(
            ParseErrorKind::InvalidNumber,
            format!("`{}` is out of range", token.text),
            token.offset,
        )
    })
}

fn strip(text: &str) -> &str {
    text.get(1..text.len().saturating_sub(1)).unwrap_or_default()
}

fn raw_string(token: &Token<'_>) -> String {
    strip(token.text).replace("\\'", "'")
}

fn quoted_identifier(token: &Token<'_>) -> Result<String, ParseError> {
    serde_json::from_str(token.text).map_err(|err| {
        ParseError::at(
            ParseErrorKind::InvalidLiteral,
            format!("invalid quoted identifier: {err}"),
            token.offset,
        )
    })
}

fn json_literal(token: &Token<'_>) -> Result<JmesLiteral, ParseError> {
    let body = strip(token.text).replace("\\`", "`");
    let value = match serde_json::from_str(body.trim()) {
        Ok(value) => value,
        // Older JMESPath treated unquoted text as a string.
        Err(_) => serde_json::from_str(&format!("\"{}\"", body.trim())).map_err(|err| {
            ParseError::at(
                ParseErrorKind::InvalidLiteral,
                format!("invalid JSON literal: {err}"),
                token.offset,
            )
        })?,
    };
    json_to_literal(value).ok_or_else(|| {
        ParseError::at(
            ParseErrorKind::InvalidNumber,
            format!("unsupported number in `{}`", token.text),
            token.offset,
        )
    })
}

fn json_to_literal(value: serde_json::Value) -> Option<JmesLiteral> {
    use serde_json::Value;

    let lit = match value {
        Value::Null => JmesLiteral::Null,
        Value::Bool(b) => JmesLiteral::Bool(b),
        Value::Number(n) => match n.as_i64() {
            Some(n) => JmesLiteral::Int(n),
            None => JmesLiteral::Float(n.as_f64()?),
        },
        Value::String(s) => JmesLiteral::String(s),
        Value::Array(items) => JmesLiteral::Array(
            items
                .into_iter()
                .map(json_to_literal)
                .collect::<Option<_>>()?,
        ),
        Value::Object(entries) => JmesLiteral::Object(
            entries
                .into_iter()
                .map(|(k, v)| Some((k, json_to_literal(v)?)))
                .collect::<Option<_>>()?,
        ),
    };
    Some(lit)
}
