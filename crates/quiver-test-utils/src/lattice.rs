//! Assertion helpers for verifying lattice algebraic laws.
//!
//! These check properties over a given set of sample elements and collect
//! all violations into a single report, so you can see every failing law at
//! once rather than fixing them one at a time.
//!
//! # Example
//!
//! ```
//! use quiver_test_utils::lattice::assert_lattice_laws;
//! use quiver_test_utils::Interval;
//!
//! assert_lattice_laws(&[
//!     Interval::empty(),
//!     Interval::constant(0),
//!     Interval::new(0, 5),
//!     Interval::top(),
//! ]);
//! ```

use std::fmt::{Debug, Write};

use quiver_fixpoint::{Lattice, SemanticError};

/// How many widening steps a chain may take before it is reported as
/// non-stabilizing.
const WIDENING_CHAIN_BOUND: usize = 128;

/// Collect violations into a `Vec<String>`, then panic with a combined
/// report if any were found.
fn report(violations: Vec<String>) {
    if violations.is_empty() {
        return;
    }
    let mut msg = format!("{} lattice law violation(s):\n", violations.len());
    for (i, v) in violations.iter().enumerate() {
        let _ = write!(msg, "  {}. {}\n", i + 1, v);
    }
    panic!("{msg}");
}

fn ok_or_report<T>(
    result: Result<T, SemanticError>,
    context: impl FnOnce() -> String,
    violations: &mut Vec<String>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            violations.push(format!("{} failed: {e}", context()));
            None
        }
    }
}

/// Check that `lub` is commutative, associative, and idempotent over the
/// given elements.
pub fn assert_lub_laws<L: Lattice + PartialEq + Debug>(elements: &[L]) {
    let mut violations = Vec::new();
    check_lub_laws(elements, &mut violations);
    report(violations);
}

/// Check that `less_or_equal` is a partial order consistent with `lub`,
/// and that elements reporting `is_bottom` sit under everything.
pub fn assert_partial_order_laws<L: Lattice + PartialEq + Debug>(elements: &[L]) {
    let mut violations = Vec::new();
    check_partial_order_laws(elements, &mut violations);
    report(violations);
}

/// Check that `widening` produces an upper bound of both operands and that
/// repeated widening against a fixed element stabilizes within a bounded
/// number of steps.
pub fn assert_widening_laws<L: Lattice + PartialEq + Debug>(elements: &[L]) {
    let mut violations = Vec::new();
    check_widening_laws(elements, &mut violations);
    report(violations);
}

/// Check all lattice laws over the given elements: lub laws, partial-order
/// laws, and widening laws. All violations are collected and reported
/// together.
///
/// This is the main entry point for testing a [`Lattice`] implementation.
/// Pass a representative set of elements; the more diverse the set, the
/// better the coverage.
pub fn assert_lattice_laws<L: Lattice + PartialEq + Debug>(elements: &[L]) {
    let mut violations = Vec::new();
    check_lub_laws(elements, &mut violations);
    check_partial_order_laws(elements, &mut violations);
    check_widening_laws(elements, &mut violations);
    report(violations);
}

// ---- internal helpers that push violations instead of panicking ----

fn check_lub_laws<L: Lattice + PartialEq + Debug>(elements: &[L], v: &mut Vec<String>) {
    for a in elements {
        // idempotent
        if let Some(joined) = ok_or_report(a.lub(a), || format!("{a:?}.lub({a:?})"), v) {
            if joined != *a {
                v.push(format!("lub not idempotent: {a:?}.lub({a:?}) != {a:?}"));
            }
        }
        for b in elements {
            // commutative
            let ab = ok_or_report(a.lub(b), || format!("{a:?}.lub({b:?})"), v);
            let ba = ok_or_report(b.lub(a), || format!("{b:?}.lub({a:?})"), v);
            if let (Some(ab), Some(ba)) = (&ab, &ba) {
                if ab != ba {
                    v.push(format!(
                        "lub not commutative: {a:?}.lub({b:?}) != {b:?}.lub({a:?})"
                    ));
                }
            }
            // associative
            for c in elements {
                let left = ab
                    .as_ref()
                    .and_then(|ab| ok_or_report(ab.lub(c), || format!("({a:?} ⊔ {b:?}).lub({c:?})"), v));
                let right = ok_or_report(b.lub(c), || format!("{b:?}.lub({c:?})"), v)
                    .and_then(|bc| ok_or_report(a.lub(&bc), || format!("{a:?}.lub({b:?} ⊔ {c:?})"), v));
                if let (Some(left), Some(right)) = (left, right) {
                    if left != right {
                        v.push(format!(
                            "lub not associative: ({a:?}.lub({b:?})).lub({c:?}) != {a:?}.lub({b:?}.lub({c:?}))"
                        ));
                    }
                }
            }
        }
    }
}

fn check_partial_order_laws<L: Lattice + PartialEq + Debug>(elements: &[L], v: &mut Vec<String>) {
    for a in elements {
        // reflexive
        if let Some(leq) = ok_or_report(a.less_or_equal(a), || format!("{a:?} ⊑ {a:?}"), v) {
            if !leq {
                v.push(format!("less_or_equal not reflexive on {a:?}"));
            }
        }
        if a.is_bottom() {
            for b in elements {
                if let Some(leq) = ok_or_report(a.less_or_equal(b), || format!("{a:?} ⊑ {b:?}"), v)
                {
                    if !leq {
                        v.push(format!(
                            "bottom not below element: {a:?}.less_or_equal({b:?}) = false \
                             although {a:?} reports is_bottom"
                        ));
                    }
                }
            }
        }
        for b in elements {
            let ab = ok_or_report(a.less_or_equal(b), || format!("{a:?} ⊑ {b:?}"), v);
            let ba = ok_or_report(b.less_or_equal(a), || format!("{b:?} ⊑ {a:?}"), v);
            // antisymmetric
            if ab == Some(true) && ba == Some(true) && a != b {
                v.push(format!(
                    "less_or_equal not antisymmetric: {a:?} and {b:?} are mutually ordered but differ"
                ));
            }
            // consistent with lub
            if let (Some(sub), Some(joined)) =
                (ab, ok_or_report(a.lub(b), || format!("{a:?}.lub({b:?})"), v))
            {
                if sub != (joined == *b) {
                    v.push(format!(
                        "ordering inconsistent with lub: {a:?}.less_or_equal({b:?}) = {sub}, \
                         but {a:?}.lub({b:?}) == {b:?} is {}",
                        joined == *b
                    ));
                }
            }
            // transitive
            for c in elements {
                let bc = ok_or_report(b.less_or_equal(c), || format!("{b:?} ⊑ {c:?}"), v);
                let ac = ok_or_report(a.less_or_equal(c), || format!("{a:?} ⊑ {c:?}"), v);
                if ab == Some(true) && bc == Some(true) && ac == Some(false) {
                    v.push(format!(
                        "less_or_equal not transitive: {a:?} ⊑ {b:?} ⊑ {c:?} but not {a:?} ⊑ {c:?}"
                    ));
                }
            }
        }
    }
}

fn check_widening_laws<L: Lattice + PartialEq + Debug>(elements: &[L], v: &mut Vec<String>) {
    for a in elements {
        for b in elements {
            let Some(widened) =
                ok_or_report(a.widening(b), || format!("{a:?}.widening({b:?})"), v)
            else {
                continue;
            };
            // upper bound of both operands
            for (name, side) in [("left", a), ("right", b)] {
                if let Some(leq) = ok_or_report(
                    side.less_or_equal(&widened),
                    || format!("{side:?} ⊑ {widened:?}"),
                    v,
                ) {
                    if !leq {
                        v.push(format!(
                            "widening not an upper bound of its {name} operand: \
                             {a:?}.widening({b:?}) = {widened:?} is not above {side:?}"
                        ));
                    }
                }
            }
            // chain stabilization
            let mut acc = widened;
            let mut stabilized = false;
            for _ in 0..WIDENING_CHAIN_BOUND {
                let Some(next) =
                    ok_or_report(acc.widening(b), || format!("{acc:?}.widening({b:?})"), v)
                else {
                    break;
                };
                if next == acc {
                    stabilized = true;
                    break;
                }
                acc = next;
            }
            if !stabilized {
                v.push(format!(
                    "widening chain starting at {a:?}.widening({b:?}) did not stabilize \
                     within {WIDENING_CHAIN_BOUND} steps"
                ));
            }
        }
    }
}
