//! Model classes loaded from documents.

use std::rc::Rc;

use modello_ast::{Assumptions, Context};
use modello_math::SimplifyOptions;
use modello_parser::{parse_document, Document, MemberKind, ModelDecl};
use rustc_hash::FxHashMap;

use crate::builder::ModelBuilder;
use crate::class::ModelClass;
use crate::error::ModelError;

/// Named model classes in declaration order.
///
/// Bases and nested models are looked up among the classes registered so
/// far, so a model may only refer to models declared before it.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    classes: Vec<Rc<ModelClass>>,
    index: FxHashMap<String, usize>,
    opts: SimplifyOptions,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(opts: SimplifyOptions) -> Self {
        Self {
            opts,
            ..Self::default()
        }
    }

    pub fn from_document(ctx: &mut Context, document: &Document) -> Result<Self, ModelError> {
        let mut registry = Self::new();
        registry.add_document(ctx, document)?;
        Ok(registry)
    }

    /// Parse `source` and register every model in it.
    pub fn load(&mut self, ctx: &mut Context, source: &str) -> Result<(), ModelError> {
        let document = parse_document(source)?;
        self.add_document(ctx, &document)
    }

    pub fn add_document(&mut self, ctx: &mut Context, document: &Document) -> Result<(), ModelError> {
        for decl in &document.models {
            let class = self.build_decl(ctx, decl)?;
            self.insert(class);
        }
        tracing::debug!(models = document.models.len(), "document loaded");
        Ok(())
    }

    fn build_decl(&self, ctx: &mut Context, decl: &ModelDecl) -> Result<Rc<ModelClass>, ModelError> {
        let at = |line: usize| {
            let model = decl.name.clone();
            move |e: ModelError| ModelError::Definition {
                model,
                line,
                message: e.to_string(),
            }
        };

        let mut builder = ModelBuilder::new(decl.name.as_str()).with_options(self.opts);
        for base in &decl.bases {
            let class = self.class(base).map_err(at(decl.line))?;
            builder.extends(ctx, class).map_err(at(decl.line))?;
        }
        for member in &decl.members {
            let name = member.name.as_str();
            match &member.kind {
                MemberKind::Dummy {
                    assumptions,
                    symbol,
                } => {
                    let assumptions = Assumptions::from_names(assumptions.iter().map(String::as_str))
                        .map_err(|e| at(member.line)(e.into()))?;
                    let symbol = symbol.as_deref().unwrap_or(name);
                    builder
                        .dummy_named(ctx, name, symbol, assumptions)
                        .map_err(at(member.line))?;
                }
                MemberKind::Define { expr } => {
                    builder.define_str(ctx, name, expr).map_err(at(member.line))?;
                }
                MemberKind::Nested { model } => {
                    let class = self.class(model).map_err(at(member.line))?;
                    builder.nested(ctx, name, class).map_err(at(member.line))?;
                }
            }
            if let Some(label) = &member.label {
                builder.label(name, label.as_str()).map_err(at(member.line))?;
            }
        }
        Ok(builder.build(ctx))
    }

    /// Register a class, replacing one with the same name.
    pub fn insert(&mut self, class: Rc<ModelClass>) {
        match self.index.get(class.name()) {
            Some(&i) => self.classes[i] = class,
            None => {
                self.index.insert(class.name().to_string(), self.classes.len());
                self.classes.push(class);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Rc<ModelClass>> {
        self.index.get(name).map(|&i| &self.classes[i])
    }

    /// Like [`Registry::get`], but a missing model is an error.
    pub fn class(&self, name: &str) -> Result<&Rc<ModelClass>, ModelError> {
        self.get(name)
            .ok_or_else(|| ModelError::UnknownModel(name.to_string()))
    }

    pub fn classes(&self) -> impl Iterator<Item = &Rc<ModelClass>> {
        self.classes.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
