//! Assembling model classes.

use std::rc::Rc;

use modello_ast::{substitute, Assumptions, Context, Equation, ExprId, SubstMap, SymbolId, SymbolKind};
use modello_math::{simplify_with, SimplifyOptions};
use modello_parser::{parse_with, ParseError, Resolver};

use crate::class::{Attribute, ModelClass, NestedModel};
use crate::error::ModelError;

/// Builds a [`ModelClass`] attribute by attribute.
///
/// Bases are applied in call order: an attribute that a later base shares
/// with what is already collected is taken from the later base, and every
/// expression mentioning the replaced dummy is rewritten to the new one.
#[derive(Debug, Clone)]
pub struct ModelBuilder {
    name: String,
    bases: Vec<String>,
    attributes: Vec<Attribute>,
    nested: Vec<NestedModel>,
    overrides: Vec<(SymbolId, SymbolId)>,
    opts: SimplifyOptions,
}

impl ModelBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bases: Vec::new(),
            attributes: Vec::new(),
            nested: Vec::new(),
            overrides: Vec::new(),
            opts: SimplifyOptions::default(),
        }
    }

    pub fn with_options(mut self, opts: SimplifyOptions) -> Self {
        self.opts = opts;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn attr_index(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a.name == name)
    }

    fn nested_index(&self, name: &str) -> Option<usize> {
        self.nested.iter().position(|n| n.name == name)
    }

    fn nested_conflict(&self, attr: &str) -> ModelError {
        ModelError::NestedConflict {
            model: self.name.clone(),
            attr: attr.to_string(),
        }
    }

    fn not_an_expression(&self, attr: &str) -> ModelError {
        ModelError::NotAnExpression {
            model: self.name.clone(),
            attr: attr.to_string(),
        }
    }

    fn override_map(&self, ctx: &mut Context) -> SubstMap {
        self.overrides
            .iter()
            .map(|&(old, new)| (old, ctx.symbol(new)))
            .collect()
    }

    /// Record `old` as replaced by `new`, collapsing chains.
    fn add_override(&mut self, old: SymbolId, new: SymbolId) {
        if old == new {
            return;
        }
        for entry in self.overrides.iter_mut() {
            if entry.1 == old {
                entry.1 = new;
            }
        }
        self.overrides.push((old, new));
    }

    fn rewrite(&self, ctx: &mut Context, expr: ExprId) -> ExprId {
        let simplified = simplify_with(ctx, expr, &self.opts);
        if self.overrides.is_empty() {
            return simplified;
        }
        let map = self.override_map(ctx);
        let replaced = substitute(ctx, simplified, &map);
        if replaced == simplified {
            simplified
        } else {
            simplify_with(ctx, replaced, &self.opts)
        }
    }

    /// Insert or replace the nested model of the same name. Proxies of the
    /// replaced entry are overridden by the new proxy for the same child.
    fn put_nested(&mut self, nested: NestedModel) {
        let Some(i) = self.nested_index(&nested.name) else {
            self.nested.push(nested);
            return;
        };
        let old = std::mem::replace(&mut self.nested[i], nested);
        let replaced: Vec<(SymbolId, SymbolId)> = old
            .mapping
            .iter()
            .filter_map(|&(child, proxy)| Some((proxy, self.nested[i].proxy(child)?)))
            .collect();
        for (proxy, new) in replaced {
            self.add_override(proxy, new);
        }
    }

    fn rewrite_all(&mut self, ctx: &mut Context) {
        if self.overrides.is_empty() {
            return;
        }
        let mut attributes = std::mem::take(&mut self.attributes);
        for attr in attributes.iter_mut().filter(|a| !a.is_free()) {
            attr.expr = self.rewrite(ctx, attr.expr);
        }
        self.attributes = attributes;
    }

    /// Inherit the attributes and nested models of `base`.
    pub fn extends(&mut self, ctx: &mut Context, base: &ModelClass) -> Result<(), ModelError> {
        for attr in base.attributes() {
            if self.nested_index(&attr.name).is_some() {
                return Err(self.nested_conflict(&attr.name));
            }
            match self.attr_index(&attr.name) {
                Some(i) => {
                    let replaced = self.attributes[i].dummy;
                    self.add_override(replaced, attr.dummy);
                    self.attributes[i] = attr.clone();
                }
                None => self.attributes.push(attr.clone()),
            }
        }
        for nested in base.nested_models() {
            if self.attr_index(&nested.name).is_some() {
                return Err(self.not_an_expression(&nested.name));
            }
            self.put_nested(nested.clone());
        }
        self.bases.push(base.name().to_string());
        self.rewrite_all(ctx);
        tracing::trace!(model = %self.name, base = base.name(), "extends");
        Ok(())
    }

    /// Declare a free attribute.
    pub fn dummy(&mut self, ctx: &mut Context, name: &str) -> Result<ExprId, ModelError> {
        self.dummy_with(ctx, name, Assumptions::NONE)
    }

    /// Declare a free attribute with assumptions.
    ///
    /// Redeclaring an existing attribute gives it a fresh dummy; expressions
    /// using the old one are rewritten.
    pub fn dummy_with(
        &mut self,
        ctx: &mut Context,
        name: &str,
        assumptions: Assumptions,
    ) -> Result<ExprId, ModelError> {
        self.dummy_named(ctx, name, name, assumptions)
    }

    /// Declare a free attribute whose dummy is displayed as `symbol`.
    pub fn dummy_named(
        &mut self,
        ctx: &mut Context,
        name: &str,
        symbol: &str,
        assumptions: Assumptions,
    ) -> Result<ExprId, ModelError> {
        if self.nested_index(name).is_some() {
            return Err(self.nested_conflict(name));
        }
        let (dummy, node) = ctx.dummy(symbol, SymbolKind::InstanceDummy, assumptions);
        let attr = Attribute {
            name: name.to_string(),
            dummy,
            node,
            expr: node,
            label: None,
        };
        match self.attr_index(name) {
            Some(i) => {
                let replaced = self.attributes[i].dummy;
                let label = self.attributes[i].label.take();
                self.attributes[i] = Attribute { label, ..attr };
                self.add_override(replaced, dummy);
                self.rewrite_all(ctx);
            }
            None => self.attributes.push(attr),
        }
        Ok(node)
    }

    /// Define an attribute by an expression.
    ///
    /// An existing attribute keeps its dummy and gets the new expression.
    /// Returns the attribute's dummy node.
    pub fn define(&mut self, ctx: &mut Context, name: &str, expr: ExprId) -> Result<ExprId, ModelError> {
        if self.nested_index(name).is_some() {
            return Err(self.nested_conflict(name));
        }
        let value = self.rewrite(ctx, expr);
        if let Some(i) = self.attr_index(name) {
            self.attributes[i].expr = value;
            return Ok(self.attributes[i].node);
        }
        let (dummy, node) = ctx.dummy(name, SymbolKind::InstanceDummy, Assumptions::NONE);
        self.attributes.push(Attribute {
            name: name.to_string(),
            dummy,
            node,
            expr: value,
            label: None,
        });
        Ok(node)
    }

    /// Define an attribute from source text; identifiers and dotted paths
    /// are resolved with [`ModelBuilder::attr`].
    pub fn define_str(&mut self, ctx: &mut Context, name: &str, source: &str) -> Result<ExprId, ModelError> {
        let expr = parse_with(source, ctx, &mut AttrResolver { builder: self })?;
        self.define(ctx, name, expr)
    }

    /// Use `class` as the attribute `name`.
    ///
    /// Creates a proxy dummy `<name>_<dummy>` for every dummy of the class
    /// and for every proxy the class itself holds.
    pub fn nested(&mut self, ctx: &mut Context, name: &str, class: &Rc<ModelClass>) -> Result<(), ModelError> {
        if self.attr_index(name).is_some() {
            return Err(self.not_an_expression(name));
        }
        let mut mapping: Vec<(SymbolId, SymbolId)> = Vec::new();
        let child_symbols = class
            .attributes()
            .iter()
            .map(|a| a.dummy)
            .chain(
                class
                    .nested_models()
                    .iter()
                    .flat_map(|n| n.mapping.iter().map(|(_, p)| *p)),
            );
        for child in child_symbols {
            if mapping.iter().any(|(c, _)| *c == child) {
                continue;
            }
            let proxy_name = format!("{}_{}", name, ctx.sym_name(child));
            let assumptions = ctx.assumptions(child);
            let (proxy, _) = ctx.dummy(&proxy_name, SymbolKind::InstanceDummy, assumptions);
            mapping.push((child, proxy));
        }
        let nested = NestedModel {
            name: name.to_string(),
            class: Rc::clone(class),
            mapping,
            label: None,
        };
        self.put_nested(nested);
        self.rewrite_all(ctx);
        Ok(())
    }

    pub fn label(&mut self, name: &str, text: impl Into<String>) -> Result<(), ModelError> {
        let text = Some(text.into());
        if let Some(i) = self.attr_index(name) {
            self.attributes[i].label = text;
        } else if let Some(i) = self.nested_index(name) {
            self.nested[i].label = text;
        } else {
            return Err(ModelError::UnknownAttribute {
                model: self.name.clone(),
                attr: name.to_string(),
            });
        }
        Ok(())
    }

    /// Expression for an attribute path: the dummy for `a`, the proxy for
    /// `child.a`.
    pub fn attr(&self, ctx: &mut Context, path: &str) -> Result<ExprId, ModelError> {
        let unknown = |model: &str, attr: &str| ModelError::UnknownAttribute {
            model: model.to_string(),
            attr: attr.to_string(),
        };
        match path.split_once('.') {
            None => {
                if let Some(i) = self.attr_index(path) {
                    Ok(self.attributes[i].node)
                } else if self.nested_index(path).is_some() {
                    Err(self.nested_conflict(path))
                } else {
                    Err(unknown(&self.name, path))
                }
            }
            Some((head, rest)) => {
                let Some(i) = self.nested_index(head) else {
                    return Err(if self.attr_index(head).is_some() {
                        ModelError::NotNested {
                            model: self.name.clone(),
                            attr: head.to_string(),
                        }
                    } else {
                        unknown(&self.name, head)
                    });
                };
                let nested = &self.nested[i];
                let proxy = nested
                    .class
                    .path_symbol(rest)
                    .and_then(|child| nested.proxy(child))
                    .ok_or_else(|| unknown(nested.class.name(), rest))?;
                Ok(ctx.symbol(proxy))
            }
        }
    }

    pub fn build(self, ctx: &mut Context) -> Rc<ModelClass> {
        let mut flat_constraints: Vec<Equation> = self
            .attributes
            .iter()
            .filter(|a| !a.is_free())
            .map(|a| Equation::new(a.node, a.expr))
            .collect();
        for nested in &self.nested {
            let map = nested.subst_map(ctx);
            for eq in nested.class.flat_constraints() {
                let lhs = substitute(ctx, eq.lhs, &map);
                let rhs = substitute(ctx, eq.rhs, &map);
                flat_constraints.push(Equation::new(lhs, rhs));
            }
        }
        tracing::debug!(
            model = %self.name,
            attributes = self.attributes.len(),
            nested = self.nested.len(),
            constraints = flat_constraints.len(),
            "model class built"
        );
        Rc::new(ModelClass {
            name: self.name,
            bases: self.bases,
            attributes: self.attributes,
            nested: self.nested,
            overrides: self.overrides,
            flat_constraints,
        })
    }
}

struct AttrResolver<'b> {
    builder: &'b ModelBuilder,
}

impl Resolver for AttrResolver<'_> {
    fn resolve(&mut self, ctx: &mut Context, path: &str) -> Result<ExprId, ParseError> {
        self.builder
            .attr(ctx, path)
            .map_err(|_| ParseError::UnknownName(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modello_ast::{DisplayExpr, Expr};

    fn show(ctx: &Context, id: ExprId) -> String {
        DisplayExpr { context: ctx, id }.to_string()
    }

    fn child(ctx: &mut Context) -> Rc<ModelClass> {
        let mut b = ModelBuilder::new("Child");
        b.dummy(ctx, "a").unwrap();
        b.dummy(ctx, "b").unwrap();
        b.define_str(ctx, "c", "a + b").unwrap();
        b.build(ctx)
    }

    #[test]
    fn free_and_defined_attributes() {
        let mut ctx = Context::new();
        let class = child(&mut ctx);
        assert_eq!(class.attributes().len(), 3);
        assert!(class.attribute("a").unwrap().is_free());
        let c = class.attribute("c").unwrap();
        assert_eq!(show(&ctx, c.expr), "a + b");
        assert_eq!(class.constraints().len(), 1);
    }

    #[test]
    fn redefinition_keeps_the_dummy() {
        let mut ctx = Context::new();
        let mut b = ModelBuilder::new("M");
        let x = b.dummy(&mut ctx, "x").unwrap();
        let first = b.define_str(&mut ctx, "y", "x + 1").unwrap();
        let second = b.define_str(&mut ctx, "y", "2 * x").unwrap();
        assert_eq!(first, second);
        let class = b.build(&mut ctx);
        let two = ctx.num(2);
        let expected = ctx.add(Expr::Mul(two, x));
        assert_eq!(class.attribute("y").unwrap().expr, expected);
    }

    #[test]
    fn proxies_are_transitive() {
        let mut ctx = Context::new();
        let child = child(&mut ctx);
        let mut mid = ModelBuilder::new("Mid");
        mid.nested(&mut ctx, "child", &child).unwrap();
        let mid = mid.build(&mut ctx);

        let mut top = ModelBuilder::new("Top");
        top.nested(&mut ctx, "mid", &mid).unwrap();
        let deep = top.attr(&mut ctx, "mid.child.c").unwrap();
        assert_eq!(show(&ctx, deep), "mid_child_c");
        let top = top.build(&mut ctx);
        // child's constraint reaches the top through two proxy layers
        assert_eq!(top.flat_constraints().len(), 1);
        let eq = top.flat_constraints()[0];
        assert_eq!(eq.display(&ctx).to_string(), "mid_child_c = mid_child_a + mid_child_b");
    }

    #[test]
    fn nested_and_expression_names_do_not_mix() {
        let mut ctx = Context::new();
        let child = child(&mut ctx);
        let mut b = ModelBuilder::new("Parent");
        b.dummy(&mut ctx, "d").unwrap();
        b.nested(&mut ctx, "child", &child).unwrap();
        assert_eq!(
            b.nested(&mut ctx, "d", &child),
            Err(ModelError::NotAnExpression {
                model: "Parent".into(),
                attr: "d".into()
            })
        );
        let one = ctx.num(1);
        assert_eq!(
            b.define(&mut ctx, "child", one),
            Err(ModelError::NestedConflict {
                model: "Parent".into(),
                attr: "child".into()
            })
        );
        assert!(matches!(
            b.define_str(&mut ctx, "e", "child.zzz + 1"),
            Err(ModelError::Parse(ParseError::UnknownName(_)))
        ));
    }

    #[test]
    fn later_base_overrides_shared_attribute() {
        let mut ctx = Context::new();
        let mut a = ModelBuilder::new("A");
        a.dummy(&mut ctx, "conflicted").unwrap();
        a.define_str(&mut ctx, "a", "conflicted").unwrap();
        let a = a.build(&mut ctx);

        let mut b = ModelBuilder::new("B");
        b.dummy(&mut ctx, "conflicted").unwrap();
        b.define_str(&mut ctx, "b", "conflicted").unwrap();
        let b = b.build(&mut ctx);

        let mut c = ModelBuilder::new("C");
        c.extends(&mut ctx, &a).unwrap();
        c.extends(&mut ctx, &b).unwrap();
        let c = c.build(&mut ctx);

        assert_eq!(c.dummy("conflicted"), b.dummy("conflicted"));
        assert_ne!(c.dummy("conflicted"), a.dummy("conflicted"));
        assert_eq!(c.bases(), &["A".to_string(), "B".to_string()]);
        let conflicted = c.attribute("conflicted").unwrap().node;
        assert_eq!(c.attribute("a").unwrap().expr, conflicted);
        assert_eq!(c.overrides().len(), 1);
    }

    #[test]
    fn renesting_rewrites_old_proxies() {
        let mut ctx = Context::new();
        let child = child(&mut ctx);
        let mut b = ModelBuilder::new("M");
        b.nested(&mut ctx, "child", &child).unwrap();
        b.define_str(&mut ctx, "x", "child.c").unwrap();
        b.nested(&mut ctx, "child", &child).unwrap();
        let fresh = b.attr(&mut ctx, "child.c").unwrap();
        let class = b.build(&mut ctx);
        assert_eq!(class.attribute("x").unwrap().expr, fresh);
        assert_eq!(class.overrides().len(), 3);
    }
}
