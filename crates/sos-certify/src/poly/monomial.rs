use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// A product of variables raised to positive integer powers.
///
/// Zero exponents are never stored, so two monomials are equal exactly
/// when their non-trivial powers agree. Monomials are ordered by total
/// degree first, then lexicographically by `(variable, power)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Monomial {
    powers: BTreeMap<String, u32>,
}

impl Monomial {
    /// The constant monomial `1`.
    pub fn one() -> Self {
        Self::default()
    }

    /// A single variable to the first power.
    pub fn var(name: &str) -> Self {
        Self::from_powers([(name, 1)])
    }

    /// Build from `(variable, power)` pairs. Repeated variables multiply;
    /// a combined power saturates at `u32::MAX`.
    pub fn from_powers<'a>(powers: impl IntoIterator<Item = (&'a str, u32)>) -> Self {
        let mut m = Self::one();
        for (name, power) in powers {
            if power > 0 {
                let slot = m.powers.entry(name.to_string()).or_insert(0);
                *slot = slot.saturating_add(power);
            }
        }
        m
    }

    /// Total degree. Summed in `u64` so it cannot overflow.
    pub fn degree(&self) -> u64 {
        self.powers.values().map(|p| u64::from(*p)).sum()
    }

    pub fn is_constant(&self) -> bool {
        self.powers.is_empty()
    }

    /// Exponent of `var` (zero if absent).
    pub fn power_of(&self, var: &str) -> u32 {
        self.powers.get(var).copied().unwrap_or(0)
    }

    pub fn powers(&self) -> impl Iterator<Item = (&str, u32)> {
        self.powers.iter().map(|(v, p)| (v.as_str(), *p))
    }

    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.powers.keys().map(String::as_str)
    }

    /// Product of two monomials; `None` if a power overflows `u32`.
    pub fn checked_mul(&self, other: &Self) -> Option<Self> {
        let mut powers = self.powers.clone();
        for (name, power) in &other.powers {
            let slot = powers.entry(name.clone()).or_insert(0);
            *slot = slot.checked_add(*power)?;
        }
        Some(Self { powers })
    }

    /// Split off `var`: returns the remaining monomial and the removed power.
    pub fn split_off(&self, var: &str) -> (Self, u32) {
        let mut powers = self.powers.clone();
        let power = powers.remove(var).unwrap_or(0);
        (Self { powers }, power)
    }

    /// Evaluate at a point. `None` if a variable has no value.
    pub fn evaluate(&self, point: &BTreeMap<String, f64>) -> Option<f64> {
        let mut value = 1.0;
        for (name, power) in &self.powers {
            let base = point.get(name)?;
            value *= base.powi(i32::try_from(*power).ok()?);
        }
        Some(value)
    }
}

impl PartialOrd for Monomial {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Monomial {
    fn cmp(&self, other: &Self) -> Ordering {
        self.degree()
            .cmp(&other.degree())
            .then_with(|| self.powers.iter().cmp(other.powers.iter()))
    }
}

impl fmt::Display for Monomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.powers.is_empty() {
            return write!(f, "1");
        }
        for (i, (name, power)) in self.powers.iter().enumerate() {
            if i > 0 {
                write!(f, "*")?;
            }
            if *power == 1 {
                write!(f, "{name}")?;
            } else {
                write!(f, "{name}^{power}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_powers_are_dropped() {
        let m = Monomial::from_powers([("x", 0), ("y", 2)]);
        assert_eq!(m, Monomial::from_powers([("y", 2)]));
        assert_eq!(m.power_of("x"), 0);
    }

    #[test]
    fn repeated_variables_multiply() {
        let m = Monomial::from_powers([("x", 1), ("x", 2)]);
        assert_eq!(m.power_of("x"), 3);
        assert_eq!(m.degree(), 3);
    }

    #[test]
    fn graded_order() {
        let one = Monomial::one();
        let x = Monomial::var("x");
        let y = Monomial::var("y");
        let x2 = Monomial::from_powers([("x", 2)]);
        let xy = Monomial::from_powers([("x", 1), ("y", 1)]);
        assert!(one < x);
        assert!(x < y);
        assert!(y < xy);
        assert!(xy < x2);
    }

    #[test]
    fn mul_adds_powers() {
        let a = Monomial::from_powers([("x", 1), ("y", 1)]);
        let b = Monomial::from_powers([("x", 2)]);
        assert_eq!(
            a.checked_mul(&b),
            Some(Monomial::from_powers([("x", 3), ("y", 1)]))
        );
    }

    #[test]
    fn power_overflow_is_detected() {
        let big = Monomial::from_powers([("x", u32::MAX)]);
        assert_eq!(big.checked_mul(&Monomial::var("x")), None);
        let mixed = big.checked_mul(&Monomial::var("y")).unwrap();
        assert_eq!(mixed.degree(), u64::from(u32::MAX) + 1);
    }

    #[test]
    fn degree_does_not_wrap() {
        let m = Monomial::from_powers([("x", u32::MAX), ("y", u32::MAX)]);
        assert_eq!(m.degree(), 2 * u64::from(u32::MAX));
        assert_eq!(Monomial::from_powers([("x", u32::MAX), ("x", 1)]).power_of("x"), u32::MAX);
    }

    #[test]
    fn split_off_removes_variable() {
        let m = Monomial::from_powers([("x", 2), ("y", 1)]);
        let (rest, p) = m.split_off("x");
        assert_eq!(p, 2);
        assert_eq!(rest, Monomial::var("y"));
    }

    #[test]
    fn display() {
        assert_eq!(Monomial::one().to_string(), "1");
        assert_eq!(Monomial::from_powers([("y", 1), ("x", 2)]).to_string(), "x^2*y");
    }

    #[test]
    fn evaluate_missing_variable() {
        let m = Monomial::from_powers([("x", 2), ("y", 1)]);
        let mut point = BTreeMap::new();
        point.insert("x".to_string(), 3.0);
        assert_eq!(m.evaluate(&point), None);
        point.insert("y".to_string(), 2.0);
        assert_eq!(m.evaluate(&point), Some(18.0));
    }
}
