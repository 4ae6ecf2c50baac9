use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::{Add, Neg, Sub};

use super::monomial::Monomial;

/// A multivariate polynomial with `f64` coefficients in canonical form.
///
/// Every monomial appears at most once and no stored coefficient is
/// exactly zero. Nothing is ever rounded or truncated: coefficients that
/// are merely *small* are kept, because the verifier's tolerance check
/// must see them.
///
/// Symbolic (unbound) coefficients are represented as ordinary variables;
/// binding them is a [`substitute`](Self::substitute) with a constant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polynomial {
    terms: BTreeMap<Monomial, f64>,
}

impl Polynomial {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn constant(value: f64) -> Self {
        Self::from_terms([(Monomial::one(), value)])
    }

    pub fn var(name: &str) -> Self {
        Self::from_terms([(Monomial::var(name), 1.0)])
    }

    pub fn monomial(monomial: Monomial, coefficient: f64) -> Self {
        Self::from_terms([(monomial, coefficient)])
    }

    /// Expand an unmerged list of terms into canonical form: duplicate
    /// monomials are summed, exact zeros are removed.
    pub fn from_terms(terms: impl IntoIterator<Item = (Monomial, f64)>) -> Self {
        let mut p = Self::zero();
        for (m, c) in terms {
            p.accumulate(m, c);
        }
        p
    }

    fn accumulate(&mut self, monomial: Monomial, coefficient: f64) {
        if coefficient == 0.0 {
            return;
        }
        match self.terms.entry(monomial) {
            Entry::Vacant(slot) => {
                slot.insert(coefficient);
            }
            Entry::Occupied(mut slot) => {
                *slot.get_mut() += coefficient;
                if *slot.get() == 0.0 {
                    slot.remove();
                }
            }
        }
    }

    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    /// Terms in ascending graded order.
    pub fn terms(&self) -> impl Iterator<Item = (&Monomial, f64)> {
        self.terms.iter().map(|(m, c)| (m, *c))
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn coefficient(&self, monomial: &Monomial) -> f64 {
        self.terms.get(monomial).copied().unwrap_or(0.0)
    }

    /// Coefficients ordered by monomial degree (ascending).
    pub fn coefficients(&self) -> Vec<f64> {
        self.terms.values().copied().collect()
    }

    /// Largest coefficient magnitude; `0.0` for the zero polynomial.
    pub fn max_abs_coefficient(&self) -> f64 {
        self.terms.values().fold(0.0, |acc, c| acc.max(c.abs()))
    }

    /// Total degree; `None` for the zero polynomial.
    pub fn degree(&self) -> Option<u64> {
        self.terms.keys().map(Monomial::degree).max()
    }

    pub fn variables(&self) -> BTreeSet<String> {
        self.terms
            .keys()
            .flat_map(Monomial::variables)
            .map(str::to_string)
            .collect()
    }

    /// The value if this polynomial has no variables.
    pub fn as_constant(&self) -> Option<f64> {
        match self.terms.len() {
            0 => Some(0.0),
            1 => self.terms.get(&Monomial::one()).copied(),
            _ => None,
        }
    }

    /// The single `(monomial, coefficient)` pair, if there is exactly one.
    pub fn as_single_term(&self) -> Option<(&Monomial, f64)> {
        if self.terms.len() == 1 {
            self.terms().next()
        } else {
            None
        }
    }

    pub fn scale(&self, factor: f64) -> Self {
        Self::from_terms(self.terms().map(|(m, c)| (m.clone(), c * factor)))
    }

    /// Product of two polynomials; `None` if a power overflows `u32`.
    pub fn checked_mul(&self, rhs: &Self) -> Option<Self> {
        let mut out = Self::zero();
        for (ma, ca) in self.terms() {
            for (mb, cb) in rhs.terms() {
                out.accumulate(ma.checked_mul(mb)?, ca * cb);
            }
        }
        Some(out)
    }

    /// `self^exponent` by repeated squaring; `None` on power overflow.
    pub fn checked_pow(&self, exponent: u32) -> Option<Self> {
        let mut result = Self::constant(1.0);
        let mut base = self.clone();
        let mut e = exponent;
        while e > 0 {
            if e & 1 == 1 {
                result = result.checked_mul(&base)?;
            }
            e >>= 1;
            if e > 0 {
                base = base.checked_mul(&base)?;
            }
        }
        Some(result)
    }

    /// Replace `var` with `replacement`. The replacement may mention `var`
    /// itself (e.g. `x -> x - 1`).
    pub fn substitute(&self, var: &str, replacement: &Self) -> Option<Self> {
        let mut map = BTreeMap::new();
        map.insert(var.to_string(), replacement.clone());
        self.substitute_all(&map)
    }

    /// Simultaneous substitution: every replacement is applied to the
    /// original terms, never to the output of another replacement.
    /// `None` if a power overflows `u32`.
    pub fn substitute_all(&self, replacements: &BTreeMap<String, Self>) -> Option<Self> {
        let mut result = Self::zero();
        for (monomial, coefficient) in self.terms() {
            let mut kept = Vec::new();
            let mut product = Self::constant(coefficient);
            for (name, power) in monomial.powers() {
                match replacements.get(name) {
                    Some(r) => product = product.checked_mul(&r.checked_pow(power)?)?,
                    None => kept.push((name, power)),
                }
            }
            let kept = Self::monomial(Monomial::from_powers(kept), 1.0);
            result = &result + &product.checked_mul(&kept)?;
        }
        Some(result)
    }

    /// Upper bound on the degree of [`substitute_all`](Self::substitute_all)
    /// with the same replacements, computed without expanding.
    pub fn substituted_degree(&self, replacements: &BTreeMap<String, Self>) -> u64 {
        self.terms
            .keys()
            .map(|m| {
                m.powers()
                    .map(|(name, power)| {
                        let inner = replacements.get(name).map_or(1, |r| r.degree().unwrap_or(0));
                        u64::from(power).saturating_mul(inner)
                    })
                    .fold(0u64, u64::saturating_add)
            })
            .max()
            .unwrap_or(0)
    }

    /// Evaluate at a point. `None` if a variable has no value.
    pub fn evaluate(&self, point: &BTreeMap<String, f64>) -> Option<f64> {
        let mut sum = 0.0;
        for (m, c) in self.terms() {
            sum += c * m.evaluate(point)?;
        }
        Some(sum)
    }
}

impl Add<&Polynomial> for &Polynomial {
    type Output = Polynomial;

    fn add(self, rhs: &Polynomial) -> Polynomial {
        let mut out = self.clone();
        for (m, c) in rhs.terms() {
            out.accumulate(m.clone(), c);
        }
        out
    }
}

impl Add for Polynomial {
    type Output = Polynomial;

    fn add(self, rhs: Polynomial) -> Polynomial {
        &self + &rhs
    }
}

impl Sub<&Polynomial> for &Polynomial {
    type Output = Polynomial;

    fn sub(self, rhs: &Polynomial) -> Polynomial {
        let mut out = self.clone();
        for (m, c) in rhs.terms() {
            out.accumulate(m.clone(), -c);
        }
        out
    }
}

impl Sub for Polynomial {
    type Output = Polynomial;

    fn sub(self, rhs: Polynomial) -> Polynomial {
        &self - &rhs
    }
}

impl Neg for &Polynomial {
    type Output = Polynomial;

    fn neg(self) -> Polynomial {
        self.scale(-1.0)
    }
}

impl Neg for Polynomial {
    type Output = Polynomial;

    fn neg(self) -> Polynomial {
        self.scale(-1.0)
    }
}

/// Format a coefficient compactly: scientific notation for tiny or huge
/// magnitudes, shortest round-trip decimal otherwise.
pub(crate) fn format_coefficient(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-4..1e15).contains(&magnitude) {
        format!("{value:e}")
    } else {
        format!("{value}")
    }
}

impl fmt::Display for Polynomial {
    /// Highest degree first, e.g. `0.5*x^2 + 1.5*x + 1`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return write!(f, "0");
        }
        for (i, (m, c)) in self.terms.iter().rev().enumerate() {
            let magnitude = c.abs();
            match (i, c.is_sign_negative()) {
                (0, true) => write!(f, "-")?,
                (0, false) => {}
                (_, true) => write!(f, " - ")?,
                (_, false) => write!(f, " + ")?,
            }
            if m.is_constant() {
                write!(f, "{}", format_coefficient(magnitude))?;
            } else if (magnitude - 1.0).abs() < f64::EPSILON {
                write!(f, "{m}")?;
            } else {
                write!(f, "{}*{m}", format_coefficient(magnitude))?;
            }
        }
        Ok(())
    }
}
