//! JMESPath text to [`JmesExpr`].

use pest::Parser as _;
use rulegen_ast::JmesExpr;

use crate::ParseError;

mod parse;
#[cfg(test)]
mod tests;

mod internal {
    // Avoids the name clash between pest_derive::Parser and pest::Parser.
    use pest_derive::Parser;
    #[derive(Parser)]
    #[grammar = "jmespath/jmespath.pest"]
    pub struct JmesPathLexer;
}

pub(crate) use internal::{JmesPathLexer, Rule};

/// A lexed token.
#[derive(Copy, Clone, Debug)]
struct Token<'a> {
    rule: Rule,
    text: &'a str,
    offset: usize,
}

fn tokenize(input: &str) -> Result<Vec<Token<'_>>, ParseError> {
    let pairs = JmesPathLexer::parse(Rule::tokens, input)?;
    let tokens = pairs
        .flat_map(|pair| pair.into_inner())
        .map(|pair| Token {
            rule: pair.as_rule(),
            text: pair.as_str(),
            offset: pair.as_span().start(),
        })
        .collect();
    Ok(tokens)
}

/// Parses a JMESPath expression.
///
/// The full grammar is accepted, including constructs the
/// traversal compiler later rejects.
pub fn parse_jmespath(input: &str) -> Result<JmesExpr, ParseError> {
    let tokens = tokenize(input)?;
    parse::Parser::new(&tokens).parse()
}
