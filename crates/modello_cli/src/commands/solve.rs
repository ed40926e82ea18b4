//! solve subcommand handler.
//!
//! Instantiates one model of a document with `--set path=expr` values and
//! prints every attribute, nested ones as dotted paths.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;
use modello::Values;
use modello_ast::Context;
use modello_parser::parse;

use crate::commands::{load_registry, to_json};
use crate::config::{ModelloConfig, OutputFormat};
use crate::format::{approximate, expr_string, table};
use crate::json_types::{SolveJsonOutput, ValueJson};

/// Arguments for solve subcommand
#[derive(Args, Debug)]
pub struct SolveArgs {
    /// Model document
    pub file: PathBuf,

    /// Model to instantiate
    #[arg(long, short)]
    pub model: String,

    /// Instance name (defaults to the model name)
    #[arg(long, short)]
    pub name: Option<String>,

    /// Known value as PATH=EXPR, e.g. `--set start.x=0`; repeatable
    #[arg(long = "set", value_name = "PATH=EXPR", value_parser = parse_assignment)]
    pub set: Vec<(String, String)>,

    /// Output format: text, json
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Also print numeric approximations with this many decimals
    #[arg(long)]
    pub decimals: Option<usize>,
}

fn parse_assignment(s: &str) -> Result<(String, String), String> {
    let (path, expr) = s
        .split_once('=')
        .ok_or_else(|| format!("expected PATH=EXPR, got '{}'", s))?;
    let (path, expr) = (path.trim(), expr.trim());
    if path.is_empty() || expr.is_empty() {
        return Err(format!("expected PATH=EXPR, got '{}'", s));
    }
    Ok((path.to_string(), expr.to_string()))
}

pub fn run(args: &SolveArgs, config: &ModelloConfig, format: OutputFormat) -> Result<String> {
    let mut ctx = Context::new();
    let registry = load_registry(&mut ctx, &args.file, config)?;
    let class = registry.class(&args.model)?;
    let name = args.name.as_deref().unwrap_or(&args.model);

    let mut values = Values::new();
    for (path, source) in &args.set {
        let expr = parse(source, &mut ctx).with_context(|| format!("invalid value for {}", path))?;
        values.insert_path(path, expr);
    }
    let model = class.instantiate_with(&mut ctx, name, &values, &config.solve_options())?;
    let decimals = args.decimals.or(config.decimals);
    tracing::debug!(model = %args.model, instance = name, given = args.set.len(), "solved");

    let attributes: Vec<ValueJson> = model
        .flatten()
        .into_iter()
        .map(|(path, value)| ValueJson {
            value: expr_string(&ctx, value),
            numeric: decimals.and_then(|d| approximate(&ctx, value, d)),
            label: model.label_path(&path).map(str::to_string),
            path,
        })
        .collect();

    match format {
        OutputFormat::Json => to_json(&SolveJsonOutput {
            ok: true,
            model: args.model.clone(),
            name: name.to_string(),
            attributes,
        }),
        OutputFormat::Text => {
            let rows: Vec<(String, String, Option<String>)> = attributes
                .into_iter()
                .map(|attr| {
                    let value = match (attr.numeric, decimals) {
                        (Some(n), Some(d)) if n.to_string() != attr.value => {
                            format!("{} ≈ {:.*}", attr.value, d, n)
                        }
                        _ => attr.value,
                    };
                    (attr.path, value, attr.label)
                })
                .collect();
            Ok(format!("{} '{}'\n{}", args.model, name, table(&rows)))
        }
    }
}
