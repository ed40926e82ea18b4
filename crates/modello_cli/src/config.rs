//! `modello.toml` settings.

use std::fs;
use std::path::Path;

use anyhow::{Context as _, Result};
use clap::ValueEnum;
use modello_math::SimplifyOptions;
use modello_solver::SolveOptions;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Settings read from `modello.toml`. Missing keys take their defaults and
/// command line flags win over the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelloConfig {
    /// Largest power of a sum expanded while simplifying.
    pub max_expand_exponent: u32,
    pub max_solve_passes: usize,
    /// Print numeric approximations with this many decimals.
    pub decimals: Option<usize>,
    pub format: OutputFormat,
}

impl Default for ModelloConfig {
    fn default() -> Self {
        let solve = SolveOptions::default();
        Self {
            max_expand_exponent: solve.simplify.max_expand_exponent,
            max_solve_passes: solve.max_passes,
            decimals: None,
            format: OutputFormat::Text,
        }
    }
}

impl ModelloConfig {
    pub const FILE_NAME: &'static str = "modello.toml";

    /// Load `explicit`, else `modello.toml` in the working directory when it
    /// exists, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let path = Path::new(Self::FILE_NAME);
                if path.exists() {
                    Self::from_file(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("cannot read config {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("invalid config {}", path.display()))?;
        tracing::debug!(path = %path.display(), ?config, "config loaded");
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn simplify_options(&self) -> SimplifyOptions {
        SimplifyOptions {
            max_expand_exponent: self.max_expand_exponent,
            ..SimplifyOptions::default()
        }
    }

    pub fn solve_options(&self) -> SolveOptions {
        SolveOptions {
            max_passes: self.max_solve_passes,
            simplify: self.simplify_options(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(ModelloConfig::parse("").unwrap(), ModelloConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = ModelloConfig::parse("decimals = 3\nformat = \"json\"\n").unwrap();
        assert_eq!(config.decimals, Some(3));
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.max_solve_passes, SolveOptions::default().max_passes);
    }

    #[test]
    fn options_follow_the_config() {
        let config = ModelloConfig {
            max_expand_exponent: 4,
            max_solve_passes: 2,
            ..ModelloConfig::default()
        };
        let opts = config.solve_options();
        assert_eq!(opts.max_passes, 2);
        assert_eq!(opts.simplify.max_expand_exponent, 4);
    }

    #[test]
    fn unknown_format_is_rejected() {
        assert!(ModelloConfig::parse("format = \"yaml\"").is_err());
    }
}
