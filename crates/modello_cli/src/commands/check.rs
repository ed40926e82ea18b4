//! check subcommand handler.
//!
//! Builds every model of a document and lists its attributes and
//! constraints.

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use modello::ModelClass;
use modello_ast::Context;

use crate::commands::{load_registry, to_json};
use crate::config::{ModelloConfig, OutputFormat};
use crate::format::expr_string;
use crate::json_types::{AttributeJson, CheckJsonOutput, ModelJson, NestedJson};

/// Arguments for check subcommand
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Model document
    pub file: PathBuf,

    /// Output format: text, json
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,
}

fn model_json(ctx: &Context, class: &ModelClass) -> ModelJson {
    ModelJson {
        name: class.name().to_string(),
        bases: class.bases().to_vec(),
        attributes: class
            .attributes()
            .iter()
            .map(|attr| AttributeJson {
                name: attr.name.clone(),
                expr: (!attr.is_free()).then(|| expr_string(ctx, attr.expr)),
                assumptions: ctx.assumptions(attr.dummy).names(),
                label: attr.label.clone(),
            })
            .collect(),
        nested: class
            .nested_models()
            .iter()
            .map(|n| NestedJson {
                name: n.name.clone(),
                model: n.class.name().to_string(),
                label: n.label.clone(),
            })
            .collect(),
        constraints: class
            .flat_constraints()
            .iter()
            .map(|eq| eq.display(ctx).to_string())
            .collect(),
    }
}

pub fn run(args: &CheckArgs, config: &ModelloConfig, format: OutputFormat) -> Result<String> {
    let mut ctx = Context::new();
    let registry = load_registry(&mut ctx, &args.file, config)?;

    match format {
        OutputFormat::Json => to_json(&CheckJsonOutput {
            ok: true,
            models: registry.classes().map(|c| model_json(&ctx, c)).collect(),
        }),
        OutputFormat::Text => {
            let mut out = String::new();
            for class in registry.classes() {
                out.push_str(&class.describe(&ctx));
                let constraints = class.flat_constraints();
                if !constraints.is_empty() {
                    out.push_str("  constraints:\n");
                    for eq in constraints {
                        let _ = writeln!(out, "    {}", eq.display(&ctx));
                    }
                }
                out.push('\n');
            }
            let _ = writeln!(out, "{} model(s) ok", registry.len());
            Ok(out)
        }
    }
}
