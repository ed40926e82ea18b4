//! Sparse polynomials with exact rational coefficients.
//!
//! The "variables" of a [`Poly`] are atoms: canonical expression ids for
//! symbols, constants, function calls, roots and inverses of sums. Exponents
//! are signed, so a [`Monomial`] is a Laurent monomial.

use std::cmp::Ordering;
use std::collections::hash_map::Entry;

use modello_ast::ExprId;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Zero};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Atoms with nonzero exponents, sorted by id.
pub type Monomial = SmallVec<[(ExprId, i32); 4]>;

/// Product of two monomials; `None` when an exponent leaves the `i32` range.
pub fn mono_mul(a: &Monomial, b: &Monomial) -> Option<Monomial> {
    let mut out = Monomial::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            Ordering::Less => {
                out.push(a[i]);
                i += 1;
            }
            Ordering::Greater => {
                out.push(b[j]);
                j += 1;
            }
            Ordering::Equal => {
                let exp = a[i].1.checked_add(b[j].1)?;
                if exp != 0 {
                    out.push((a[i].0, exp));
                }
                i += 1;
                j += 1;
            }
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    Some(out)
}

/// `m^k`; `None` on exponent overflow.
pub fn mono_pow(m: &Monomial, k: i32) -> Option<Monomial> {
    if k == 0 {
        return Some(Monomial::new());
    }
    m.iter()
        .map(|&(atom, e)| Some((atom, e.checked_mul(k)?)))
        .collect()
}

/// Exponent of `atom` in `m` (0 when absent).
pub fn mono_degree(m: &Monomial, atom: ExprId) -> i32 {
    m.iter()
        .find(|(a, _)| *a == atom)
        .map(|(_, e)| *e)
        .unwrap_or(0)
}

/// `m` with `atom` removed.
pub fn mono_without(m: &Monomial, atom: ExprId) -> Monomial {
    m.iter().copied().filter(|(a, _)| *a != atom).collect()
}

/// Lexicographic order on exponent vectors, atoms by id.
///
/// Compatible with multiplication, which is what exact division needs.
pub fn mono_lex_cmp(a: &Monomial, b: &Monomial) -> Ordering {
    let (mut i, mut j) = (0, 0);
    loop {
        match (a.get(i), b.get(j)) {
            (None, None) => return Ordering::Equal,
            (Some(&(_, ea)), None) => return ea.cmp(&0),
            (None, Some(&(_, eb))) => return 0.cmp(&eb),
            (Some(&(xa, ea)), Some(&(xb, eb))) => match xa.cmp(&xb) {
                // b lacks xa: compare ea against 0
                Ordering::Less => return ea.cmp(&0),
                Ordering::Greater => return 0.cmp(&eb),
                Ordering::Equal => {
                    if ea != eb {
                        return ea.cmp(&eb);
                    }
                    i += 1;
                    j += 1;
                }
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Poly {
    terms: FxHashMap<Monomial, BigRational>,
}

impl Poly {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn constant(c: BigRational) -> Self {
        Self::term(Monomial::new(), c)
    }

    pub fn integer(n: i64) -> Self {
        Self::constant(BigRational::from_integer(BigInt::from(n)))
    }

    pub fn atom(atom: ExprId) -> Self {
        Self::atom_pow(atom, 1)
    }

    pub fn atom_pow(atom: ExprId, exp: i32) -> Self {
        let mut m = Monomial::new();
        if exp != 0 {
            m.push((atom, exp));
        }
        Self::term(m, BigRational::one())
    }

    pub fn term(monomial: Monomial, coeff: BigRational) -> Self {
        let mut poly = Self::zero();
        poly.add_term(monomial, coeff);
        poly
    }

    pub fn add_term(&mut self, monomial: Monomial, coeff: BigRational) {
        if coeff.is_zero() {
            return;
        }
        match self.terms.entry(monomial) {
            Entry::Occupied(mut entry) => {
                *entry.get_mut() += coeff;
                if entry.get().is_zero() {
                    entry.remove();
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(coeff);
            }
        }
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> impl Iterator<Item = (&Monomial, &BigRational)> {
        self.terms.iter()
    }

    /// Constant value, if the polynomial has no atoms.
    pub fn as_constant(&self) -> Option<BigRational> {
        match self.terms.len() {
            0 => Some(BigRational::zero()),
            1 => self.terms.get(&Monomial::new()).cloned(),
            _ => None,
        }
    }

    pub fn single_term(&self) -> Option<(&Monomial, &BigRational)> {
        if self.terms.len() == 1 {
            self.terms.iter().next()
        } else {
            None
        }
    }

    /// Every atom that occurs in some term.
    pub fn atoms(&self) -> Vec<ExprId> {
        let mut atoms: Vec<ExprId> = self
            .terms
            .keys()
            .flat_map(|m| m.iter().map(|(a, _)| *a))
            .collect();
        atoms.sort();
        atoms.dedup();
        atoms
    }

    /// Leading term under [`mono_lex_cmp`].
    pub fn leading_term(&self) -> Option<(&Monomial, &BigRational)> {
        self.terms.iter().max_by(|a, b| mono_lex_cmp(a.0, b.0))
    }

    pub fn add(&self, other: &Poly) -> Poly {
        let mut out = self.clone();
        for (m, c) in &other.terms {
            out.add_term(m.clone(), c.clone());
        }
        out
    }

    pub fn sub(&self, other: &Poly) -> Poly {
        self.add(&other.neg())
    }

    pub fn neg(&self) -> Poly {
        self.scale(&-BigRational::one())
    }

    pub fn scale(&self, factor: &BigRational) -> Poly {
        if factor.is_zero() {
            return Poly::zero();
        }
        Poly {
            terms: self
                .terms
                .iter()
                .map(|(m, c)| (m.clone(), c * factor))
                .collect(),
        }
    }

    /// Product, or `None` when an exponent overflows.
    pub fn mul(&self, other: &Poly) -> Option<Poly> {
        let mut out = Poly::zero();
        for (ma, ca) in &self.terms {
            for (mb, cb) in &other.terms {
                out.add_term(mono_mul(ma, mb)?, ca * cb);
            }
        }
        Some(out)
    }

    pub fn mul_term(&self, monomial: &Monomial, coeff: &BigRational) -> Option<Poly> {
        let mut out = Poly::zero();
        for (m, c) in &self.terms {
            out.add_term(mono_mul(m, monomial)?, c * coeff);
        }
        Some(out)
    }

    /// Non-negative integer power by repeated squaring.
    pub fn pow(&self, mut exp: u32) -> Option<Poly> {
        let mut result = Poly::integer(1);
        let mut base = self.clone();
        while exp > 0 {
            if exp & 1 == 1 {
                result = result.mul(&base)?;
            }
            exp >>= 1;
            if exp > 0 {
                base = base.mul(&base)?;
            }
        }
        Some(result)
    }

    /// Exact quotient `self / divisor`, or `None` when the division leaves
    /// a remainder within `max_steps` reduction steps.
    pub fn div_exact(&self, divisor: &Poly, max_steps: usize) -> Option<Poly> {
        let (lead_m, lead_c) = divisor.leading_term()?;
        let (lead_m, lead_c) = (lead_m.clone(), lead_c.clone());
        let mut rest = self.clone();
        let mut quotient = Poly::zero();
        for _ in 0..max_steps {
            let Some((m, c)) = rest.leading_term() else {
                return Some(quotient);
            };
            let q_m = mono_mul(m, &mono_pow(&lead_m, -1)?)?;
            let q_c = c / &lead_c;
            rest = rest.sub(&divisor.mul_term(&q_m, &q_c)?);
            quotient.add_term(q_m, q_c);
        }
        rest.is_zero().then_some(quotient)
    }
}
