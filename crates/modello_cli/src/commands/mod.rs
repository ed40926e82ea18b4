//! Subcommand handlers. Each returns the text to print on stdout.

pub mod check;
pub mod solve;

use std::fs;
use std::path::Path;

use anyhow::{Context as _, Result};
use modello::Registry;
use modello_ast::Context;
use serde::Serialize;

use crate::config::ModelloConfig;

/// Read and build every model of a document.
pub fn load_registry(ctx: &mut Context, file: &Path, config: &ModelloConfig) -> Result<Registry> {
    let source = fs::read_to_string(file)
        .with_context(|| format!("cannot read {}", file.display()))?;
    let mut registry = Registry::with_options(config.simplify_options());
    registry
        .load(ctx, &source)
        .with_context(|| format!("in {}", file.display()))?;
    Ok(registry)
}

pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    let mut out = serde_json::to_string_pretty(value)?;
    out.push('\n');
    Ok(out)
}
