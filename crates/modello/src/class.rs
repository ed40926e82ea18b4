use std::fmt::Write as _;
use std::rc::Rc;

use modello_ast::{Context, DisplayExpr, Equation, ExprId, SubstMap, SymbolId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    /// Class-level unknown standing for this attribute.
    pub dummy: SymbolId,
    /// `Variable(dummy)`.
    pub node: ExprId,
    /// Defining expression; `node` itself for free attributes.
    pub expr: ExprId,
    pub label: Option<String>,
}

impl Attribute {
    #[inline]
    pub fn is_free(&self) -> bool {
        self.expr == self.node
    }
}

/// A model used as an attribute of another model.
#[derive(Debug, Clone)]
pub struct NestedModel {
    pub name: String,
    pub class: Rc<ModelClass>,
    /// Child symbol (a child dummy or one of the child's own proxies) to the
    /// proxy dummy standing for it in the parent.
    pub mapping: Vec<(SymbolId, SymbolId)>,
    pub label: Option<String>,
}

impl NestedModel {
    pub fn proxy(&self, child: SymbolId) -> Option<SymbolId> {
        self.mapping
            .iter()
            .find(|(c, _)| *c == child)
            .map(|(_, p)| *p)
    }

    pub(crate) fn subst_map(&self, ctx: &mut Context) -> SubstMap {
        self.mapping
            .iter()
            .map(|&(child, proxy)| (child, ctx.symbol(proxy)))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct ModelClass {
    pub(crate) name: String,
    pub(crate) bases: Vec<String>,
    pub(crate) attributes: Vec<Attribute>,
    pub(crate) nested: Vec<NestedModel>,
    /// Inherited dummies replaced by a later base, and their replacement.
    pub(crate) overrides: Vec<(SymbolId, SymbolId)>,
    /// Own constraints followed by those of nested models, rewritten
    /// through the proxies.
    pub(crate) flat_constraints: Vec<Equation>,
}

impl ModelClass {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bases(&self) -> &[String] {
        &self.bases
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn nested_models(&self) -> &[NestedModel] {
        &self.nested
    }

    pub fn nested(&self, name: &str) -> Option<&NestedModel> {
        self.nested.iter().find(|n| n.name == name)
    }

    pub fn overrides(&self) -> &[(SymbolId, SymbolId)] {
        &self.overrides
    }

    /// Dummy of an attribute.
    pub fn dummy(&self, name: &str) -> Option<SymbolId> {
        self.attribute(name).map(|a| a.dummy)
    }

    /// Symbol for a dotted path: the attribute's dummy for `a`, the proxy
    /// for `child.a`, `child.grandchild.a` and so on.
    pub fn path_symbol(&self, path: &str) -> Option<SymbolId> {
        match path.split_once('.') {
            None => self.dummy(path),
            Some((head, rest)) => {
                let nested = self.nested(head)?;
                nested.proxy(nested.class.path_symbol(rest)?)
            }
        }
    }

    pub fn label(&self, name: &str) -> Option<&str> {
        self.attribute(name)
            .and_then(|a| a.label.as_deref())
            .or_else(|| self.nested(name).and_then(|n| n.label.as_deref()))
    }

    /// `dummy = expr` for every attribute that is not free.
    pub fn constraints(&self) -> Vec<Equation> {
        self.attributes
            .iter()
            .filter(|a| !a.is_free())
            .map(|a| Equation::new(a.node, a.expr))
            .collect()
    }

    /// Constraints of this class and, transitively, of its nested models.
    pub fn flat_constraints(&self) -> &[Equation] {
        &self.flat_constraints
    }

    /// Every symbol an instance has to bind: own dummies, then proxies.
    pub fn symbols(&self) -> Vec<SymbolId> {
        let mut out: Vec<SymbolId> = Vec::new();
        let proxies = self
            .nested
            .iter()
            .flat_map(|n| n.mapping.iter().map(|(_, p)| *p));
        for sym in self.attributes.iter().map(|a| a.dummy).chain(proxies) {
            if !out.contains(&sym) {
                out.push(sym);
            }
        }
        out
    }

    /// Human readable summary of attributes and constraints.
    pub fn describe(&self, ctx: &Context) -> String {
        let mut out = String::new();
        let _ = write!(out, "model {}", self.name);
        if !self.bases.is_empty() {
            let _ = write!(out, " extends {}", self.bases.join(", "));
        }
        out.push('\n');
        for attr in &self.attributes {
            let _ = write!(out, "  {}", attr.name);
            let assumptions = ctx.assumptions(attr.dummy);
            if !assumptions.is_empty() {
                let _ = write!(out, " [{}]", assumptions);
            }
            if !attr.is_free() {
                let _ = write!(
                    out,
                    " = {}",
                    DisplayExpr {
                        context: ctx,
                        id: attr.expr
                    }
                );
            }
            if let Some(label) = &attr.label {
                let _ = write!(out, " \"{}\"", label);
            }
            out.push('\n');
        }
        for nested in &self.nested {
            let _ = writeln!(out, "  {}: {}", nested.name, nested.class.name);
        }
        out
    }
}
