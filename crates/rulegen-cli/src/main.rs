use std::{
    fs,
    io::{self, Write as _},
    path::{Path, PathBuf},
};

use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};
use proc_macro2::TokenStream;
use quote::quote;
use rulegen_endpoint::{EndpointConfig, generate_resolver, generate_tests};
use rulegen_lang::{parse_jmespath, parse_ruleset, parse_schema, parse_test_suite};
use rulegen_traversal::{TraversalGenerator, TraversalRoot};
use tracing::debug;
use tracing_subscriber::{EnvFilter, prelude::*};


/// Generates Rust code from endpoint rulesets and JMESPath
/// expressions.
#[derive(Parser, Debug)]
#[command(name = "rulegen", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
    /// Suppress trace output.
    ///
    /// Fatal errors are still printed.
    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a ruleset into an endpoint resolver.
    Endpoint(EndpointArgs),
    /// Compile a JMESPath expression into a traversal function.
    Traversal(TraversalArgs),
}

#[derive(Args, Debug)]
struct EndpointArgs {
    /// The ruleset JSON file.
    ruleset: PathBuf,
    /// A test suite JSON file to generate tests from.
    #[arg(long)]
    tests: Option<PathBuf>,
    /// The path generated code uses for `rulegen-runtime`.
    #[arg(long, default_value = "::rulegen_runtime")]
    runtime: String,
    /// Write to a file instead of stdout.
    #[arg(long, short)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct TraversalArgs {
    /// The schema JSON file.
    schema: PathBuf,
    /// The shape of the value being traversed.
    #[arg(long)]
    shape: String,
    /// The JMESPath expression.
    #[arg(long)]
    expr: String,
    /// The name of the generated function.
    #[arg(long)]
    name: String,
    /// The path to the data model types.
    #[arg(long, default_value = "crate::model")]
    model: String,
    /// Write to a file instead of stdout.
    #[arg(long, short)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if !cli.quiet {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .with(EnvFilter::from_env("RULEGEN_LOG"))
            .init();
    }

    match cli.command {
        Command::Endpoint(args) => {
            let ruleset = read(&args.ruleset)?;
            let tests = args.tests.as_deref().map(read).transpose()?;
            let code = render_endpoint(&ruleset, tests.as_deref(), &args.runtime)?;
            emit(args.output.as_deref(), &code)
        }
        Command::Traversal(args) => {
            let schema = read(&args.schema)?;
            let code =
                render_traversal(&schema, &args.shape, &args.expr, &args.name, &args.model)?;
            emit(args.output.as_deref(), &code)
        }
    }
}

/// Compiles a ruleset and, optionally, its tests.
///
/// Tests are emitted in a `#[cfg(test)]` module next to the
/// resolver.
fn render_endpoint(ruleset: &str, tests: Option<&str>, runtime: &str) -> Result<String> {
    let ruleset = parse_ruleset(ruleset).context("unable to parse ruleset")?;
    let config = EndpointConfig {
        runtime: syn::parse_str(runtime)
            .with_context(|| format!("`{runtime}` is not a path"))?,
        ..EndpointConfig::default()
    };

    let mut tokens = generate_resolver(&ruleset, &config).context("unable to compile ruleset")?;
    if let Some(tests) = tests {
        let suite = parse_test_suite(tests).context("unable to parse tests")?;
        debug!(cases = suite.test_cases.len(), "generating tests");
        let tests = generate_tests(&ruleset, &suite.test_cases, &config)
            .context("unable to generate tests")?;
        tokens.extend(quote! {
        });
    }
    format(tokens)
}

/// Compiles a JMESPath expression into a function taking a
/// `shape` root.
fn render_traversal(
    schema: &str,
    shape: &str,
    expr: &str,
    name: &str,
    model: &str,
) -> Result<String> {
    let schema = parse_schema(schema).context("unable to parse schema")?;
    let expr = parse_jmespath(expr).with_context(|| format!("unable to parse `{expr}`"))?;
    let model = syn::parse_str(model).with_context(|| format!("`{model}` is not a path"))?;
    let tokens = TraversalGenerator::new(&schema)
        .model(model)
        .generate_function(name, &expr, &[TraversalRoot::global(shape)])
        .with_context(|| format!("unable to compile `{expr}`"))?;
    format(tokens)
}

fn format(tokens: TokenStream) -> Result<String> {
    let file: syn::File = syn::parse2(tokens).context("generated invalid code")?;
    Ok(prettyplease::unparse(&file))
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("unable to read file `{}`", path.display()))
}

fn emit(output: Option<&Path>, code: &str) -> Result<()> {
    match output {
        Some(path) => fs::write(path, code)
            .with_context(|| format!("unable to write file `{}`", path.display())),
        None => io::stdout()
            .write_all(code.as_bytes())
            .context("unable to write to stdout"),
    }
}
