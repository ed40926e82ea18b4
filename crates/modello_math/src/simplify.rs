//! Canonical normal form.
//!
//! An expression is lowered to a [`Poly`] over atoms and rebuilt in a fixed
//! layout. Because the context hash-conses nodes, two inputs with the same
//! normal form end up with the same [`ExprId`].
//!
//! Atoms are symbols, constants, function calls (arguments simplified),
//! symbolic powers, `q`-th roots written `base^(1/q)` and sums that could not
//! be expanded (negative or large powers). Roots raised to a multiple of
//! their index and sums divided by themselves are folded back.

use std::cmp::Ordering;

use modello_ast::ordering::compare_expr;
use modello_ast::{Assumptions, Constant, Context, Expr, ExprId};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive};
use rustc_hash::FxHashMap;
use smallvec::smallvec;

use crate::numeric::{fold_function, rational_pow, rational_root};
use crate::poly::{mono_degree, mono_pow, Monomial, Poly};

/// Rounds of root reduction / inverse cancellation before giving up.
const MAX_TIDY_ROUNDS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimplifyOptions {
    /// Largest power of a sum that is expanded term by term.
    pub max_expand_exponent: u32,
    /// Reduction steps allowed when cancelling a sum against itself.
    pub max_division_steps: usize,
}

impl Default for SimplifyOptions {
    fn default() -> Self {
        Self {
            max_expand_exponent: 12,
            max_division_steps: 64,
        }
    }
}

/// Simplify with default options.
pub fn simplify(ctx: &mut Context, expr: ExprId) -> ExprId {
    simplify_with(ctx, expr, &SimplifyOptions::default())
}

pub fn simplify_with(ctx: &mut Context, expr: ExprId, opts: &SimplifyOptions) -> ExprId {
    let poly = poly_from_expr(ctx, expr, opts);
    let out = poly_to_expr(ctx, &poly);
    tracing::trace!(input = expr.index(), output = out.index(), terms = poly.len(), "simplified");
    out
}

/// Lower an expression into its polynomial normal form.
pub fn poly_from_expr(ctx: &mut Context, expr: ExprId, opts: &SimplifyOptions) -> Poly {
    Normalizer::new(ctx, *opts).poly(expr)
}

struct Normalizer<'a> {
    ctx: &'a mut Context,
    opts: SimplifyOptions,
    cache: FxHashMap<ExprId, Poly>,
}

impl<'a> Normalizer<'a> {
    fn new(ctx: &'a mut Context, opts: SimplifyOptions) -> Self {
        Self {
            ctx,
            opts,
            cache: FxHashMap::default(),
        }
    }

    fn poly(&mut self, id: ExprId) -> Poly {
        if let Some(p) = self.cache.get(&id) {
            return p.clone();
        }
        let p = self.compute(id);
        self.cache.insert(id, p.clone());
        p
    }

    fn compute(&mut self, id: ExprId) -> Poly {
        match self.ctx.get(id).clone() {
            Expr::Number(n) => Poly::constant(n),
            Expr::Constant(_) | Expr::Variable(_) => Poly::atom(id),
            Expr::Add(l, r) => self.poly(l).add(&self.poly(r)),
            Expr::Sub(l, r) => self.poly(l).sub(&self.poly(r)),
            Expr::Neg(e) => self.poly(e).neg(),
            Expr::Mul(l, r) => {
                let (a, b) = (self.poly(l), self.poly(r));
                self.multiply(&a, &b)
            }
            Expr::Div(l, r) => {
                let numer = self.poly(l);
                let denom = self.poly(r);
                let inverse = self.inverse(&denom);
                self.multiply(&numer, &inverse)
            }
            Expr::Pow(b, e) => {
                let base = self.poly(b);
                let exp = self.poly(e);
                self.power(&base, &exp)
            }
            Expr::Function(name, args) => self.function(&name, &args),
        }
    }

    /// `a * b`, kept as an unexpanded product atom when exponents overflow.
    fn multiply(&mut self, a: &Poly, b: &Poly) -> Poly {
        match a.mul(b) {
            Some(p) => self.tidy(p),
            None => {
                let l = poly_to_expr(self.ctx, a);
                let r = poly_to_expr(self.ctx, b);
                Poly::atom(self.ctx.add(Expr::Mul(l, r)))
            }
        }
    }

    fn undefined(&mut self) -> Poly {
        Poly::atom(self.ctx.constant(Constant::Undefined))
    }

    /// Split off the leading coefficient so the remaining sum starts with 1.
    fn primitive(&self, p: &Poly) -> (BigRational, Poly) {
        let content = sorted_terms(self.ctx, p)
            .into_iter()
            .next()
            .map(|(_, c)| c)
            .unwrap_or_else(BigRational::one);
        let primitive = p.scale(&content.recip());
        (content, primitive)
    }

    fn inverse(&mut self, p: &Poly) -> Poly {
        if p.is_zero() {
            return self.undefined();
        }
        if let Some((m, c)) = p.single_term() {
            if let Some(inv) = mono_pow(m, -1) {
                return Poly::term(inv, c.recip());
            }
        }
        let (content, primitive) = self.primitive(p);
        let atom = poly_to_expr(self.ctx, &primitive);
        Poly::term(smallvec![(atom, -1)], content.recip())
    }

    fn power(&mut self, base: &Poly, exp: &Poly) -> Poly {
        let Some(r) = exp.as_constant() else {
            return self.opaque_pow(base, exp);
        };
        if r.is_integer() {
            return match r.to_integer().to_i32() {
                Some(k) => self.int_power(base, k),
                None => self.opaque_pow(base, exp),
            };
        }
        match (r.numer().to_i32(), r.denom().to_i32()) {
            (Some(p), Some(q)) => self.root_power(base, p, q),
            _ => self.opaque_pow(base, exp),
        }
    }

    fn int_power(&mut self, base: &Poly, k: i32) -> Poly {
        if k == 0 {
            return Poly::integer(1);
        }
        if base.is_zero() {
            return if k > 0 { Poly::zero() } else { self.undefined() };
        }
        if let Some((m, c)) = base.single_term() {
            let Some(m) = mono_pow(m, k) else {
                return self.opaque_pow(base, &Poly::integer(k.into()));
            };
            let term = match rational_pow(c, k) {
                Some(coeff) => Poly::term(m, coeff),
                None => return self.undefined(),
            };
            return self.tidy(term);
        }
        if k > 0 && k.unsigned_abs() <= self.opts.max_expand_exponent {
            if let Some(expanded) = base.pow(k.unsigned_abs()) {
                return self.tidy(expanded);
            }
        }
        // keep (content * S)^k as content^k * S^k with S an atom
        let (content, primitive) = self.primitive(base);
        let atom = poly_to_expr(self.ctx, &primitive);
        match rational_pow(&content, k) {
            Some(coeff) => Poly::term(smallvec![(atom, k)], coeff),
            None => self.undefined(),
        }
    }

    /// `base^(p/q)` with `q > 1`.
    fn root_power(&mut self, base: &Poly, p: i32, q: i32) -> Poly {
        if base.is_zero() {
            return if p > 0 { Poly::zero() } else { self.undefined() };
        }
        if let Some(c) = base.as_constant() {
            if c.is_positive() {
                if let Some(root) = rational_root(&c, q as u32) {
                    return rational_pow(&root, p)
                        .map(Poly::constant)
                        .unwrap_or_else(|| self.undefined());
                }
            }
            let number = self.ctx.rational(c);
            let atom = self.root_atom(number, q);
            return self.tidy(Poly::atom_pow(atom, p));
        }
        if let Some((m, c)) = base.single_term() {
            let divisible = m
                .iter()
                .all(|&(a, e)| e % q == 0 && self.is_nonnegative(a));
            if c.is_positive() && divisible {
                if let Some(root) = rational_root(c, q as u32) {
                    let m_root: Monomial = m.iter().map(|&(a, e)| (a, e / q)).collect();
                    if let (Some(m), Some(coeff)) = (mono_pow(&m_root, p), rational_pow(&root, p)) {
                        return self.tidy(Poly::term(m, coeff));
                    }
                }
            }
        }
        // pull a positive content with an exact root out of the radical
        let (content, primitive) = self.primitive(base);
        let (outer, inner) = match rational_root(&content, q as u32) {
            Some(root) if content.is_positive() => (root, primitive),
            _ => (BigRational::one(), base.clone()),
        };
        let radicand = poly_to_expr(self.ctx, &inner);
        let atom = self.root_atom(radicand, q);
        match rational_pow(&outer, p) {
            Some(coeff) => self.tidy(Poly::term(smallvec![(atom, p)], coeff)),
            None => self.undefined(),
        }
    }

    fn root_atom(&mut self, radicand: ExprId, q: i32) -> ExprId {
        let index = self
            .ctx
            .rational(BigRational::new(BigInt::one(), BigInt::from(q)));
        self.ctx.add(Expr::Pow(radicand, index))
    }

    fn opaque_pow(&mut self, base: &Poly, exp: &Poly) -> Poly {
        if base.as_constant().is_some_and(|c| c.is_one()) {
            return Poly::integer(1);
        }
        let b = poly_to_expr(self.ctx, base);
        let e = poly_to_expr(self.ctx, exp);
        Poly::atom(self.ctx.add(Expr::Pow(b, e)))
    }

    fn function(&mut self, name: &str, args: &[ExprId]) -> Poly {
        let simplified: Vec<ExprId> = args
            .iter()
            .map(|a| {
                let p = self.poly(*a);
                poly_to_expr(self.ctx, &p)
            })
            .collect();
        let numbers: Option<Vec<BigRational>> = simplified
            .iter()
            .map(|a| self.ctx.as_number(*a).cloned())
            .collect();
        if let Some(value) = numbers.and_then(|n| fold_function(name, &n)) {
            return Poly::constant(value);
        }
        Poly::atom(self.ctx.call(name, simplified))
    }

    fn is_nonnegative(&self, atom: ExprId) -> bool {
        match self.ctx.get(atom) {
            Expr::Variable(sym) => self
                .ctx
                .assumptions(*sym)
                .contains(Assumptions::NONNEGATIVE),
            Expr::Constant(Constant::Pi) | Expr::Constant(Constant::E) => true,
            _ => false,
        }
    }

    /// `(radicand, q)` when `atom` is `radicand^(1/q)`.
    fn root_of(&self, atom: ExprId) -> Option<(ExprId, i32)> {
        if let Expr::Pow(base, exp) = self.ctx.get(atom) {
            if let Some(r) = self.ctx.as_number(*exp) {
                if r.numer().is_one() && r.denom() > &BigInt::one() {
                    return Some((*base, r.denom().to_i32()?));
                }
            }
        }
        None
    }

    fn tidy(&mut self, p: Poly) -> Poly {
        let p = self.reduce_roots(p);
        self.cancel_inverses(p)
    }

    /// Fold `(S^(1/q))^k` with `|k| >= q` into `S^(k/q) * (S^(1/q))^(k%q)`.
    fn reduce_roots(&mut self, p: Poly) -> Poly {
        let mut current = p;
        for _ in 0..MAX_TIDY_ROUNDS {
            // an exponent overflow leaves the remaining roots as they are
            let Some((out, changed)) = self.reduce_roots_once(&current) else {
                break;
            };
            current = out;
            if !changed {
                break;
            }
        }
        current
    }

    fn reduce_roots_once(&mut self, p: &Poly) -> Option<(Poly, bool)> {
        let mut changed = false;
        let mut out = Poly::zero();
        for (m, c) in p.terms() {
            let mut term = Poly::constant(c.clone());
            let mut rest = Monomial::new();
            for &(atom, e) in m.iter() {
                match self.root_of(atom) {
                    Some((radicand, q)) if e.abs() >= q => {
                        changed = true;
                        if e % q != 0 {
                            rest.push((atom, e % q));
                        }
                        let radicand = self.poly(radicand);
                        let whole = self.int_power(&radicand, e / q);
                        term = term.mul(&whole)?;
                    }
                    _ => rest.push((atom, e)),
                }
            }
            out = out.add(&term.mul_term(&rest, &BigRational::one())?);
        }
        Some((out, changed))
    }

    /// Replace `N * S^-k` by `Q * S^(1-k)` whenever `N = Q * S` exactly.
    fn cancel_inverses(&mut self, p: Poly) -> Poly {
        let mut current = p;
        for _ in 0..MAX_TIDY_ROUNDS {
            let mut changed = false;
            for atom in current.atoms() {
                let negative = current.terms().any(|(m, _)| mono_degree(m, atom) < 0);
                if !negative {
                    continue;
                }
                let divisor = self.poly(atom);
                if divisor.len() < 2 {
                    continue;
                }
                let mut group = Poly::zero();
                let mut others = Poly::zero();
                for (m, c) in current.terms() {
                    if mono_degree(m, atom) < 0 {
                        group.add_term(m.clone(), c.clone());
                    } else {
                        others.add_term(m.clone(), c.clone());
                    }
                }
                let quotient = group
                    .mul_term(&smallvec![(atom, 1)], &BigRational::one())
                    .and_then(|lifted| lifted.div_exact(&divisor, self.opts.max_division_steps));
                if let Some(quotient) = quotient {
                    current = others.add(&quotient);
                    changed = true;
                    break;
                }
            }
            if !changed {
                break;
            }
        }
        current
    }
}

type SortedTerm = (Vec<(ExprId, i32)>, BigRational);

fn degree(factors: &[(ExprId, i32)]) -> i32 {
    factors.iter().map(|(_, e)| (*e).max(0)).sum()
}

/// Display order: higher degree first, then by atom order; constants last.
fn compare_terms(ctx: &Context, a: &[(ExprId, i32)], b: &[(ExprId, i32)]) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        (false, false) => {}
    }
    degree(b).cmp(&degree(a)).then_with(|| {
        for (fa, fb) in a.iter().zip(b.iter()) {
            let ord = compare_expr(ctx, fa.0, fb.0).then(fb.1.cmp(&fa.1));
            if ord != Ordering::Equal {
                return ord;
            }
        }
        a.len().cmp(&b.len())
    })
}

fn sorted_terms(ctx: &Context, poly: &Poly) -> Vec<SortedTerm> {
    let mut terms: Vec<SortedTerm> = poly
        .terms()
        .map(|(m, c)| {
            let mut factors = m.to_vec();
            factors.sort_by(|x, y| compare_expr(ctx, x.0, y.0));
            (factors, c.clone())
        })
        .collect();
    terms.sort_by(|a, b| compare_terms(ctx, &a.0, &b.0));
    terms
}

fn factor_expr(ctx: &mut Context, atom: ExprId, exp: i32) -> ExprId {
    // roots are written with a fractional exponent: S^(k/q)
    if let Expr::Pow(radicand, index) = ctx.get(atom).clone() {
        if let Some(r) = ctx.as_number(index).cloned() {
            if r.numer().is_one() && r.denom() > &BigInt::one() {
                let scaled = ctx.rational(r * BigRational::from_integer(BigInt::from(exp)));
                return ctx.add(Expr::Pow(radicand, scaled));
            }
        }
    }
    if exp == 1 {
        atom
    } else {
        let e = ctx.num(i64::from(exp));
        ctx.add(Expr::Pow(atom, e))
    }
}

fn product(ctx: &mut Context, coeff: &BigInt, factors: &[ExprId]) -> ExprId {
    let mut items: Vec<ExprId> = Vec::with_capacity(factors.len() + 1);
    if !coeff.is_one() || factors.is_empty() {
        items.push(ctx.rational(BigRational::from_integer(coeff.clone())));
    }
    items.extend_from_slice(factors);
    let mut iter = items.into_iter();
    let first = iter.next().unwrap_or_else(|| ctx.num(1));
    iter.fold(first, |acc, f| ctx.add(Expr::Mul(acc, f)))
}

fn term_expr(ctx: &mut Context, factors: &[(ExprId, i32)], magnitude: &BigRational) -> ExprId {
    if factors.is_empty() {
        return ctx.rational(magnitude.clone());
    }
    let numer: Vec<ExprId> = factors
        .iter()
        .filter(|(_, e)| *e > 0)
        .map(|&(a, e)| factor_expr(ctx, a, e))
        .collect();
    let denom: Vec<ExprId> = factors
        .iter()
        .filter(|(_, e)| *e < 0)
        .map(|&(a, e)| factor_expr(ctx, a, -e))
        .collect();

    let top = product(ctx, magnitude.numer(), &numer);
    if denom.is_empty() && magnitude.denom().is_one() {
        return top;
    }
    let bottom = product(ctx, magnitude.denom(), &denom);
    ctx.add(Expr::Div(top, bottom))
}

/// Rebuild the canonical expression for a polynomial.
pub fn poly_to_expr(ctx: &mut Context, poly: &Poly) -> ExprId {
    if let Some(c) = poly.as_constant() {
        return ctx.rational(c);
    }
    let mut acc: Option<ExprId> = None;
    for (factors, coeff) in sorted_terms(ctx, poly) {
        let magnitude = term_expr(ctx, &factors, &coeff.abs());
        let term = if coeff.is_negative() {
            ctx.add(Expr::Neg(magnitude))
        } else {
            magnitude
        };
        acc = Some(match acc {
            None => term,
            Some(prev) => ctx.add(Expr::Add(prev, term)),
        });
    }
    acc.unwrap_or_else(|| ctx.num(0))
}
