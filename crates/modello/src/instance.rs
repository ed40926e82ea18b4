//! Instantiating model classes.

use std::fmt::Write as _;
use std::rc::Rc;

use modello_ast::{
    substitute, Context, DisplayExpr, Equation, ExprId, SubstMap, SymbolId, SymbolKind,
};
use modello_math::simplify_with;
use modello_solver::{solve_system, Solution, SolveOptions};
use rustc_hash::FxHashMap;

use crate::class::{ModelClass, NestedModel};
use crate::error::ModelError;
use crate::values::{Value, Values};

/// A solved instance of a [`ModelClass`].
#[derive(Debug, Clone)]
pub struct Model {
    name: String,
    class: Rc<ModelClass>,
    values: Vec<(String, ExprId)>,
    bound: Vec<(String, SymbolId)>,
    nested: Vec<(String, Model)>,
    constraints: Vec<Equation>,
}

/// Bound dummies of one instantiation, keyed by top-level class symbol.
struct Binding {
    bound: FxHashMap<SymbolId, SymbolId>,
    subst: SubstMap,
    unknowns: Vec<SymbolId>,
}

impl Binding {
    fn new(ctx: &mut Context, class: &ModelClass, name: &str) -> Self {
        let mut binding = Binding {
            bound: FxHashMap::default(),
            subst: SubstMap::default(),
            unknowns: Vec::new(),
        };
        for sym in class.symbols() {
            let bound_name = format!("{}_{}", name, ctx.sym_name(sym));
            let assumptions = ctx.assumptions(sym);
            let (bound, node) = ctx.dummy(&bound_name, SymbolKind::Bound, assumptions);
            binding.bound.insert(sym, bound);
            binding.subst.insert(sym, node);
            binding.unknowns.push(bound);
        }
        binding
    }

    /// Bound dummy for a symbol of the class reached through `chain`.
    fn bound_for(&self, chain: &[&NestedModel], sym: SymbolId) -> Option<SymbolId> {
        let top = chain
            .iter()
            .rev()
            .try_fold(sym, |sym, nested| nested.proxy(sym))?;
        self.bound.get(&top).copied()
    }
}

/// Instance constraints `bound = value`, later values replacing earlier ones.
#[derive(Default)]
struct Given {
    entries: Vec<(SymbolId, ExprId)>,
}

impl Given {
    fn put(&mut self, bound: SymbolId, value: ExprId) {
        match self.entries.iter_mut().find(|(b, _)| *b == bound) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((bound, value)),
        }
    }

    fn get(&self, bound: SymbolId) -> Option<ExprId> {
        self.entries
            .iter()
            .find(|(b, _)| *b == bound)
            .map(|(_, v)| *v)
    }
}

fn nested_of<'c>(class: &'c ModelClass, attr: &str) -> Result<&'c NestedModel, ModelError> {
    class.nested(attr).ok_or_else(|| {
        if class.attribute(attr).is_some() {
            ModelError::NotNested {
                model: class.name().to_string(),
                attr: attr.to_string(),
            }
        } else {
            ModelError::UnknownAttribute {
                model: class.name().to_string(),
                attr: attr.to_string(),
            }
        }
    })
}

struct Instantiation<'a> {
    opts: &'a SolveOptions,
    binding: Binding,
    given: Given,
    solution: Solution,
}

impl Instantiation<'_> {
    fn collect(
        &mut self,
        ctx: &mut Context,
        class: &ModelClass,
        chain: &[&NestedModel],
        values: &Values,
    ) -> Result<(), ModelError> {
        for (attr, value) in values.iter() {
            match value {
                Value::Expr(expr) => {
                    if class.nested(attr).is_some() {
                        tracing::warn!(
                            model = class.name(),
                            attr,
                            "ignoring expression given for a nested model"
                        );
                        continue;
                    }
                    let bound = class
                        .dummy(attr)
                        .and_then(|dummy| self.binding.bound_for(chain, dummy))
                        .ok_or_else(|| ModelError::UnknownAttribute {
                            model: class.name().to_string(),
                            attr: attr.to_string(),
                        })?;
                    let simplified = simplify_with(ctx, *expr, &self.opts.simplify);
                    let replaced = substitute(ctx, simplified, &self.binding.subst);
                    let value = if replaced == simplified {
                        simplified
                    } else {
                        simplify_with(ctx, replaced, &self.opts.simplify)
                    };
                    self.given.put(bound, value);
                }
                Value::Nested(inner) => {
                    let nested = nested_of(class, attr)?;
                    let mut next = chain.to_vec();
                    next.push(nested);
                    self.collect(ctx, &nested.class, &next, inner)?;
                }
                Value::Instance(model) => {
                    let nested = nested_of(class, attr)?;
                    let seeded = model.to_values_for(&nested.class);
                    let mut next = chain.to_vec();
                    next.push(nested);
                    self.collect(ctx, &nested.class, &next, &seeded)?;
                }
            }
        }
        Ok(())
    }

    /// Class symbols (own dummies and proxies) to bound dummy nodes.
    fn level_map(&self, ctx: &mut Context, class: &ModelClass, chain: &[&NestedModel]) -> SubstMap {
        let mut map = SubstMap::default();
        for sym in class.symbols() {
            if let Some(bound) = self.binding.bound_for(chain, sym) {
                map.insert(sym, ctx.symbol(bound));
            }
        }
        map
    }

    fn assemble(
        &self,
        ctx: &mut Context,
        class: &Rc<ModelClass>,
        name: String,
        chain: &[&NestedModel],
    ) -> Model {
        let level = self.level_map(ctx, class, chain);
        let mut values = Vec::with_capacity(class.attributes().len());
        let mut bound = Vec::with_capacity(class.attributes().len());
        for attr in class.attributes() {
            let Some(b) = self.binding.bound_for(chain, attr.dummy) else {
                continue;
            };
            let value = if let Some(v) = self.solution.get(b) {
                v
            } else if let Some(v) = self.given.get(b) {
                v
            } else if !attr.is_free() {
                let e = substitute(ctx, attr.expr, &level);
                simplify_with(ctx, e, &self.opts.simplify)
            } else {
                ctx.symbol(b)
            };
            values.push((attr.name.clone(), value));
            bound.push((attr.name.clone(), b));
        }

        let constraints = class
            .flat_constraints()
            .iter()
            .map(|eq| {
                let lhs = substitute(ctx, eq.lhs, &level);
                let rhs = substitute(ctx, eq.rhs, &level);
                Equation::new(lhs, rhs)
            })
            .collect();

        let mut nested = Vec::with_capacity(class.nested_models().len());
        for n in class.nested_models() {
            let mut next = chain.to_vec();
            next.push(n);
            let child = self.assemble(ctx, &n.class, format!("{}_{}", name, n.name), &next);
            nested.push((n.name.clone(), child));
        }

        Model {
            name,
            class: Rc::clone(class),
            values,
            bound,
            nested,
            constraints,
        }
    }
}

impl ModelClass {
    /// Instantiate with default solver options.
    pub fn instantiate(
        self: &Rc<Self>,
        ctx: &mut Context,
        name: &str,
        values: &Values,
    ) -> Result<Model, ModelError> {
        self.instantiate_with(ctx, name, values, &SolveOptions::default())
    }

    /// Bind the class to `name`, add `values` as constraints and solve.
    ///
    /// Attributes resolve to their solved value, else the given value, else
    /// their defining expression, else their bound dummy `<name>_<dummy>`.
    /// Nested models are built from the same solution.
    pub fn instantiate_with(
        self: &Rc<Self>,
        ctx: &mut Context,
        name: &str,
        values: &Values,
        opts: &SolveOptions,
    ) -> Result<Model, ModelError> {
        let mut inst = Instantiation {
            opts,
            binding: Binding::new(ctx, self, name),
            given: Given::default(),
            solution: Solution::default(),
        };
        inst.collect(ctx, self, &[], values)?;

        let mut equations: Vec<Equation> = Vec::new();
        for eq in self.flat_constraints() {
            let lhs = substitute(ctx, eq.lhs, &inst.binding.subst);
            let rhs = substitute(ctx, eq.rhs, &inst.binding.subst);
            equations.push(Equation::new(lhs, rhs));
        }
        for &(bound, value) in &inst.given.entries {
            let node = ctx.symbol(bound);
            equations.push(Equation::new(node, value));
        }
        tracing::debug!(
            model = self.name(),
            instance = name,
            unknowns = inst.binding.unknowns.len(),
            equations = equations.len(),
            "instantiate"
        );

        inst.solution = solve_system(ctx, &equations, &inst.binding.unknowns, opts).map_err(
            |source| ModelError::Solve {
                model: self.name().to_string(),
                instance: name.to_string(),
                source,
            },
        )?;
        Ok(inst.assemble(ctx, self, name.to_string(), &[]))
    }
}

impl Model {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class(&self) -> &Rc<ModelClass> {
        &self.class
    }

    /// Value of an own attribute.
    pub fn get(&self, attr: &str) -> Option<ExprId> {
        self.values
            .iter()
            .find(|(n, _)| n == attr)
            .map(|(_, v)| *v)
    }

    /// Value at a dotted path such as `base.c`.
    pub fn path(&self, path: &str) -> Option<ExprId> {
        match path.split_once('.') {
            None => self.get(path),
            Some((head, rest)) => self.nested(head)?.path(rest),
        }
    }

    pub fn nested(&self, attr: &str) -> Option<&Model> {
        self.nested.iter().find(|(n, _)| n == attr).map(|(_, m)| m)
    }

    pub fn nested_models(&self) -> impl Iterator<Item = (&str, &Model)> {
        self.nested.iter().map(|(n, m)| (n.as_str(), m))
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, ExprId)> {
        self.values.iter().map(|(n, v)| (n.as_str(), *v))
    }

    /// Class constraints expressed in this instance's bound dummies.
    pub fn constraints(&self) -> &[Equation] {
        &self.constraints
    }

    /// Bound dummy of an own attribute.
    pub fn bound(&self, attr: &str) -> Option<SymbolId> {
        self.bound.iter().find(|(n, _)| n == attr).map(|(_, b)| *b)
    }

    pub fn label(&self, attr: &str) -> Option<&str> {
        self.class.label(attr)
    }

    /// Label at a dotted path.
    pub fn label_path(&self, path: &str) -> Option<&str> {
        match path.split_once('.') {
            None => self.label(path),
            Some((head, rest)) => self.nested(head)?.label_path(rest),
        }
    }

    /// Every attribute, nested ones as dotted paths.
    pub fn flatten(&self) -> Vec<(String, ExprId)> {
        let mut out: Vec<(String, ExprId)> = self
            .values
            .iter()
            .map(|(n, v)| (n.clone(), *v))
            .collect();
        for (name, model) in &self.nested {
            out.extend(
                model
                    .flatten()
                    .into_iter()
                    .map(|(path, v)| (format!("{}.{}", name, path), v)),
            );
        }
        out
    }

    /// Values of the attributes `class` declares, for seeding a nested model.
    pub fn to_values_for(&self, class: &ModelClass) -> Values {
        let mut values = Values::new();
        for attr in class.attributes() {
            if let Some(v) = self.get(&attr.name) {
                values = values.set(&attr.name, v);
            }
        }
        for nested in class.nested_models() {
            if let Some(model) = self.nested(&nested.name) {
                values = values.nested(&nested.name, model.to_values_for(&nested.class));
            }
        }
        values
    }

    fn render_into(&self, ctx: &Context, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth + 1);
        for (name, value) in &self.values {
            let _ = write!(
                out,
                "{}{} = {}",
                indent,
                name,
                DisplayExpr {
                    context: ctx,
                    id: *value
                }
            );
            if let Some(label) = self.label(name) {
                let _ = write!(out, "  # {}", label);
            }
            out.push('\n');
        }
        for (name, model) in &self.nested {
            let _ = write!(out, "{}{}: {} '{}'", indent, name, model.class.name(), model.name);
            if let Some(label) = self.label(name) {
                let _ = write!(out, "  # {}", label);
            }
            out.push('\n');
            model.render_into(ctx, out, depth + 1);
        }
    }

    /// Attribute table with labels.
    pub fn render(&self, ctx: &Context) -> String {
        let mut out = format!("{} '{}'\n", self.class.name(), self.name);
        self.render_into(ctx, &mut out, 0);
        out
    }
}
