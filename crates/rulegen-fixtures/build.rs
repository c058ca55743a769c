use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use proc_macro2::TokenStream;
use rulegen_endpoint::{EndpointConfig, generate_resolver, generate_tests};
use rulegen_lang::{parse_jmespath, parse_ruleset, parse_schema, parse_test_suite};
use rulegen_traversal::{TraversalGenerator, TraversalRoot};
use serde_derive::Deserialize;
use syn::parse_quote;
use tracing::info;
use tracing_subscriber::{EnvFilter, prelude::*};

/// The rulesets in `fixtures/`. Each has a `<name>.json`
/// ruleset and a `<name>.tests.json` test suite.
const RULESETS: &[&str] = &["basic", "regional", "aws", "fallback"];

/// An entry in `fixtures/traversals.json`.
#[derive(Deserialize)]
struct Traversal {
    name: String,
    shape: String,
    expr: String,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_env("RULEGEN_LOG"))
        .init();

    let fixtures = Path::new("fixtures");
    println!("cargo:rerun-if-changed={}", fixtures.display());
    let out_dir = PathBuf::from(env::var("OUT_DIR")?);

    let config = EndpointConfig::default();
    for name in RULESETS {
        let ruleset = parse_ruleset(&read(&fixtures.join(format!("{name}.json")))?)
            .with_context(|| format!("unable to parse ruleset `{name}`"))?;
        let suite = parse_test_suite(&read(&fixtures.join(format!("{name}.tests.json")))?)
            .with_context(|| format!("unable to parse tests for `{name}`"))?;

        let resolver = generate_resolver(&ruleset, &config)
            .with_context(|| format!("unable to compile ruleset `{name}`"))?;
        write(&out_dir.join(format!("{name}.rs")), resolver)?;

        let tests = generate_tests(&ruleset, &suite.test_cases, &config)
            .with_context(|| format!("unable to generate tests for `{name}`"))?;
        write(&out_dir.join(format!("{name}_tests.rs")), tests)?;

        info!(name, tests = suite.test_cases.len(), "generated resolver");
    }

    let schema = parse_schema(&read(&fixtures.join("schema.json"))?)
        .context("unable to parse schema")?;
    let traversals: Vec<Traversal> = serde_json::from_str(&read(&fixtures.join("traversals.json"))?)
        .context("unable to parse traversals")?;
    let generator = TraversalGenerator::new(&schema).model(parse_quote!(crate::model));
    let mut functions = TokenStream::new();
    for t in &traversals {
        let expr = parse_jmespath(&t.expr)
            .with_context(|| format!("unable to parse `{}`", t.expr))?;
        let function = generator
            .generate_function(&t.name, &expr, &[TraversalRoot::global(t.shape.as_str())])
            .with_context(|| format!("unable to compile `{}`", t.expr))?;
        functions.extend(function);
    }
    write(&out_dir.join("traversals.rs"), functions)?;
    info!(traversals = traversals.len(), "generated traversals");

    Ok(())
}

fn read(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("unable to read file `{}`", path.display()))
}

fn write(path: &Path, tokens: TokenStream) -> anyhow::Result<()> {
    let file: syn::File = syn::parse2(tokens)
        .with_context(|| format!("generated invalid code for `{}`", path.display()))?;
    fs::write(path, prettyplease::unparse(&file))
        .with_context(|| format!("unable to write file `{}`", path.display()))
}
