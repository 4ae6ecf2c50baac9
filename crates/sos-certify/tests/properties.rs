//! Property tests for the matrix, SOS and residual checks.

mod common;

use std::collections::BTreeMap;

use proptest::prelude::*;
use sos_certify::certificate::{Certificate, Condition, SosSlot};
use sos_certify::condition;
use sos_certify::poly::{Monomial, Polynomial};
use sos_certify::sos::{self, MonomialVector};
use sos_certify::tolerance::Tolerances;
use sos_certify::verifier::{Mode, Verdict, verify};

/// Square factor `B` of size 1..=4 with moderate entries.
fn factor() -> impl Strategy<Value = Vec<Vec<f64>>> {
    (1usize..=4).prop_flat_map(|n| {
        proptest::collection::vec(proptest::collection::vec(-5.0_f64..5.0, n), n)
    })
}

/// A factor together with a permutation of its indices.
fn factor_and_permutation() -> impl Strategy<Value = (Vec<Vec<f64>>, Vec<usize>)> {
    (1usize..=4).prop_flat_map(|n| {
        (
            proptest::collection::vec(proptest::collection::vec(-5.0_f64..5.0, n), n),
            Just((0..n).collect::<Vec<usize>>()).prop_shuffle(),
        )
    })
}

proptest! {
    /// B·Bᵀ always passes the PSD test.
    #[test]
    fn gram_of_factor_is_psd(b in factor()) {
        let q = common::gram_of_factor(&b);
        prop_assert!(q.is_psd(&Tolerances::default()).unwrap());
    }

    /// Simultaneous row/column permutation preserves the spectrum.
    #[test]
    fn psd_is_permutation_invariant((b, perm) in factor_and_permutation()) {
        let q = common::gram_of_factor(&b);
        let p = q.permuted(&perm);
        let tol = Tolerances::default();
        prop_assert!(p.is_symmetric(&tol));
        prop_assert_eq!(q.is_psd(&tol).unwrap(), p.is_psd(&tol).unwrap());
        let (lq, lp) = (q.min_eigenvalue().unwrap(), p.min_eigenvalue().unwrap());
        prop_assert!((lq - lp).abs() < 1e-8, "λ_min {} vs {}", lq, lp);
    }

    /// zᵀ (B·Bᵀ) z = |Bᵀz|² is non-negative at every point.
    #[test]
    fn sos_of_psd_matrix_is_nonnegative(b in factor(), x in -2.0_f64..2.0) {
        let q = common::gram_of_factor(&b);
        let basis = MonomialVector::univariate("x", u32::try_from(q.dim() - 1).unwrap());
        let p = sos::build(&basis, &q).unwrap();
        let mut point = BTreeMap::new();
        point.insert("x".to_string(), x);
        let value = p.evaluate(&point).unwrap();
        prop_assert!(value >= -1e-6, "p({}) = {}", x, value);
    }

    /// Perturbing one diagonal entry by δ leaves a residual of δ·z_i² and
    /// nothing else.
    #[test]
    fn diagonal_perturbation_shows_in_residual(
        b in factor(),
        i in 0usize..4,
        delta in prop_oneof![0.01_f64..1.0, -1.0_f64..-0.01],
    ) {
        let q = common::gram_of_factor(&b);
        let n = q.dim();
        let i = i % n;
        let basis = MonomialVector::univariate("x", u32::try_from(n - 1).unwrap());
        let conclusion = sos::build(&basis, &q).unwrap();

        let mut rows: Vec<Vec<f64>> = (0..n).map(|r| (0..n).map(|c| q.get(r, c)).collect()).collect();
        rows[i][i] += delta;
        let perturbed = common::gram(&rows);

        let cond = Condition::new(
            None,
            vec![(Polynomial::constant(1.0), SosSlot::new(0, perturbed))],
            basis,
            conclusion,
        ).unwrap();
        let report = condition::evaluate(0, &cond, &Tolerances::default()).unwrap();
        prop_assert!(!report.passed);
        prop_assert_eq!(report.offending.len(), 1);
        let expected = Monomial::from_powers([("x", 2 * u32::try_from(i).unwrap())]);
        prop_assert_eq!(&report.offending[0].monomial, &expected.to_string());
        prop_assert!((report.offending[0].value - delta).abs() < 1e-9);
    }

    /// With PSD witnesses, skipping the matrix phase does not change the
    /// verdict.
    #[test]
    fn fast_agrees_with_full_on_psd_certificates(b in factor()) {
        let cert = common::self_witnessing(common::gram_of_factor(&b));
        let tol = Tolerances::default();
        let full = verify(&cert, Mode::Full, &tol).unwrap();
        let fast = verify(&cert, Mode::Fast, &tol).unwrap();
        prop_assert_eq!(full.verdict, Verdict::Correct);
        prop_assert_eq!(fast.verdict, full.verdict);
    }

    /// Answer-only never claims anything, even for garbage matrices.
    #[test]
    fn answer_only_is_always_unknown(
        entries in proptest::collection::vec(-10.0_f64..10.0, 4),
    ) {
        let q = common::gram(&[entries[..2].to_vec(), entries[2..].to_vec()]);
        let cond = Condition::new(
            None,
            vec![(Polynomial::constant(1.0), SosSlot::new(0, q))],
            MonomialVector::univariate("x", 1),
            Polynomial::var("x"),
        ).unwrap();
        let cert = Certificate::new(vec![], vec![cond]).unwrap();
        let report = verify(&cert, Mode::AnswerOnly, &Tolerances::default()).unwrap();
        prop_assert_eq!(report.verdict, Verdict::Unknown);
        prop_assert!(report.findings.is_empty());
    }
}
