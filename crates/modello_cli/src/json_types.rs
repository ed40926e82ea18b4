//! JSON output of the `check` and `solve` commands.

use serde::Serialize;

#[derive(Serialize, Debug)]
pub struct ErrorJsonOutput {
    pub ok: bool,
    pub error: String,
}

impl ErrorJsonOutput {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: error.into(),
        }
    }
}

#[derive(Serialize, Debug)]
pub struct CheckJsonOutput {
    pub ok: bool,
    pub models: Vec<ModelJson>,
}

#[derive(Serialize, Debug)]
pub struct ModelJson {
    pub name: String,
    pub bases: Vec<String>,
    pub attributes: Vec<AttributeJson>,
    pub nested: Vec<NestedJson>,
    /// Own and nested constraints, rendered `lhs = rhs`.
    pub constraints: Vec<String>,
}

#[derive(Serialize, Debug)]
pub struct AttributeJson {
    pub name: String,
    /// Defining expression; absent for free attributes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expr: Option<String>,
    pub assumptions: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct NestedJson {
    pub name: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct SolveJsonOutput {
    pub ok: bool,
    pub model: String,
    pub name: String,
    pub attributes: Vec<ValueJson>,
}

/// One solved attribute; nested attributes use dotted paths.
#[derive(Serialize, Debug)]
pub struct ValueJson {
    pub path: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeric: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}
