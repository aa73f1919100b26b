//! Algebraic normalization of formula trees.
//!
//! Two formulas that describe the same shape (`S/B`, `(1*S)/B`, `S*B^-1`, ...)
//! normalize to the same [`Canon`] tree, and therefore to the same rendering.
//! The rewriting is deliberately limited to identities that hold for every
//! positive value of the variables:
//!
//! - subtraction is addition of a term scaled by -1, division is
//!   multiplication by a power of -1, `sqrt(x)` is `x^0.5`;
//! - sums and products are flattened, constants folded and children sorted;
//! - like terms are merged by summing coefficients, equal bases by summing
//!   exponents;
//! - `(x^a)^b` is merged for integer `b` or odd integer `a`, `(x*y)^n` only
//!   for integer `n`;
//! - products are distributed over sums, powers of sums are never expanded.

use crate::ast::{BinaryOp, Expr, Function, Symbol};
use crate::eval::apply;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Canon {
    Const(f64),
    Var(Symbol),
    /// At least two terms, none of them a sum, sorted by rendering.
    Sum(Vec<Canon>),
    /// At least two factors (or a coefficient and one factor), no nested
    /// products, no bare sums; the coefficient, if any, comes first.
    Product(Vec<Canon>),
    Pow(Box<Canon>, Box<Canon>),
    Call(Function, Vec<Canon>),
}

impl Canon {
    pub fn from_expr(expr: &Expr) -> Canon {
        match expr {
            Expr::Number(v) => Canon::Const(*v),
            Expr::Var(s) => Canon::Var(*s),
            Expr::Neg(inner) => product(vec![Canon::Const(-1.0), Canon::from_expr(inner)]),
            Expr::Binary(op, lhs, rhs) => {
                let lhs = Canon::from_expr(lhs);
                let rhs = Canon::from_expr(rhs);
                match op {
                    BinaryOp::Add => sum(vec![lhs, rhs]),
                    BinaryOp::Sub => sum(vec![lhs, product(vec![Canon::Const(-1.0), rhs])]),
                    BinaryOp::Mul => product(vec![lhs, rhs]),
                    BinaryOp::Div => product(vec![lhs, power(rhs, Canon::Const(-1.0))]),
                    BinaryOp::Pow => power(lhs, rhs),
                }
            }
            Expr::Call(func, args) => {
                let mut args: Vec<Canon> = args.iter().map(Canon::from_expr).collect();
                match (func, args.len()) {
                    (Function::Sqrt, 1) => power(args.remove(0), Canon::Const(0.5)),
                    (Function::Pow, 2) => {
                        let exponent = args.remove(1);
                        power(args.remove(0), exponent)
                    }
                    _ => call(*func, args),
                }
            }
        }
    }

    fn as_const(&self) -> Option<f64> {
        match self {
            Canon::Const(v) => Some(*v),
            _ => None,
        }
    }

    fn key(&self) -> String {
        self.to_string()
    }
}

fn is_integer(value: f64) -> bool {
    value.is_finite() && value.fract() == 0.0
}

/// An odd integer exponent keeps the sign of its base.
fn is_odd(exponent: &Canon) -> bool {
    matches!(exponent.as_const(), Some(a) if is_integer(a) && (a % 2.0).abs() == 1.0)
}

fn sum(terms: Vec<Canon>) -> Canon {
    let mut constant = 0.0;
    // Keyed by the coefficient-free part of each term.
    let mut groups: BTreeMap<String, (f64, Canon)> = BTreeMap::new();

    let mut pending = terms;
    while let Some(term) = pending.pop() {
        match term {
            Canon::Sum(inner) => pending.extend(inner),
            Canon::Const(v) => constant += v,
            other => {
                let (coefficient, rest) = split_coefficient(other);
                let entry = groups.entry(rest.key()).or_insert((0.0, rest));
                entry.0 += coefficient;
            }
        }
    }

    let mut out: Vec<Canon> = groups
        .into_values()
        .filter(|(coefficient, _)| *coefficient != 0.0)
        .map(|(coefficient, rest)| scale(coefficient, rest))
        .collect();
    if constant != 0.0 {
        out.push(Canon::Const(constant));
    }

    match out.len() {
        0 => Canon::Const(0.0),
        1 => out.remove(0),
        _ => {
            out.sort_by_cached_key(Canon::key);
            Canon::Sum(out)
        }
    }
}

/// Splits a term into its numeric coefficient and the remaining factors.
fn split_coefficient(term: Canon) -> (f64, Canon) {
    match term {
        Canon::Product(mut factors) => match factors.first().and_then(Canon::as_const) {
            Some(coefficient) => {
                factors.remove(0);
                let rest = if factors.len() == 1 {
                    factors.remove(0)
                } else {
                    Canon::Product(factors)
                };
                (coefficient, rest)
            }
            None => (1.0, Canon::Product(factors)),
        },
        other => (1.0, other),
    }
}

fn scale(coefficient: f64, rest: Canon) -> Canon {
    if coefficient == 1.0 {
        return rest;
    }
    match rest {
        Canon::Product(mut factors) => {
            factors.insert(0, Canon::Const(coefficient));
            Canon::Product(factors)
        }
        other => Canon::Product(vec![Canon::Const(coefficient), other]),
    }
}

fn product(factors: Vec<Canon>) -> Canon {
    let mut coefficient = 1.0;
    // Keyed by base; each base collects the exponents it appears with.
    let mut groups: BTreeMap<String, (Canon, Vec<Canon>)> = BTreeMap::new();

    let mut pending = factors;
    while let Some(factor) = pending.pop() {
        let (base, exponent) = match factor {
            Canon::Product(inner) => {
                pending.extend(inner);
                continue;
            }
            Canon::Const(v) => {
                coefficient *= v;
                continue;
            }
            Canon::Pow(base, exponent) => (*base, *exponent),
            other => (other, Canon::Const(1.0)),
        };
        groups
            .entry(base.key())
            .or_insert_with(|| (base, Vec::new()))
            .1
            .push(exponent);
    }

    if coefficient == 0.0 {
        return Canon::Const(0.0);
    }

    let mut rebuilt = Vec::new();
    let mut regroup = false;
    for (base, exponents) in groups.into_values() {
        match power(base, sum(exponents)) {
            Canon::Const(v) => coefficient *= v,
            Canon::Product(inner) => {
                regroup = true;
                rebuilt.extend(inner);
            }
            other => rebuilt.push(other),
        }
    }

    if regroup {
        rebuilt.push(Canon::Const(coefficient));
        return product(rebuilt);
    }
    if coefficient == 0.0 {
        return Canon::Const(0.0);
    }
    if rebuilt.is_empty() {
        return Canon::Const(coefficient);
    }

    if let Some(position) = rebuilt.iter().position(|f| matches!(f, Canon::Sum(_))) {
        if rebuilt.len() > 1 || coefficient != 1.0 {
            if let Canon::Sum(terms) = rebuilt.remove(position) {
                let distributed = terms
                    .into_iter()
                    .map(|term| {
                        let mut factors = rebuilt.clone();
                        factors.push(Canon::Const(coefficient));
                        factors.push(term);
                        product(factors)
                    })
                    .collect();
                return sum(distributed);
            }
        }
    }

    rebuilt.sort_by_cached_key(Canon::key);
    if coefficient == 1.0 && rebuilt.len() == 1 {
        return rebuilt.remove(0);
    }
    if coefficient != 1.0 {
        rebuilt.insert(0, Canon::Const(coefficient));
    }
    Canon::Product(rebuilt)
}

fn power(base: Canon, exponent: Canon) -> Canon {
    match (base, exponent) {
        (_, Canon::Const(e)) if e == 0.0 => Canon::Const(1.0),
        (base, Canon::Const(e)) if e == 1.0 => base,
        (Canon::Const(b), Canon::Const(e)) => {
            let value = b.powf(e);
            if value.is_finite() {
                Canon::Const(value)
            } else {
                Canon::Pow(Box::new(Canon::Const(b)), Box::new(Canon::Const(e)))
            }
        }
        (Canon::Const(b), _) if b == 1.0 => Canon::Const(1.0),
        (Canon::Pow(inner, e), Canon::Const(n)) if is_integer(n) || is_odd(&e) => {
            power(*inner, product(vec![*e, Canon::Const(n)]))
        }
        (Canon::Product(factors), Canon::Const(n)) if is_integer(n) => product(
            factors
                .into_iter()
                .map(|f| power(f, Canon::Const(n)))
                .collect(),
        ),
        (base, exponent) => Canon::Pow(Box::new(base), Box::new(exponent)),
    }
}

fn call(func: Function, args: Vec<Canon>) -> Canon {
    let constants: Option<Vec<f64>> = args.iter().map(Canon::as_const).collect();
    if let Some(values) = constants {
        let value = apply(func, &values);
        if value.is_finite() {
            return Canon::Const(value);
        }
    }
    Canon::Call(func, args)
}

/// Integers print exactly; anything else with twelve significant digits so
/// that `0.1 + 0.2` and `0.3` render the same.
fn format_constant(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if is_integer(value) && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value:.11e}")
    }
}

impl fmt::Display for Canon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Canon::Const(v) => f.write_str(&format_constant(*v)),
            Canon::Var(s) => write!(f, "{s}"),
            Canon::Sum(terms) => write_joined(f, terms, "+"),
            Canon::Product(factors) => write_joined(f, factors, "*"),
            Canon::Pow(base, exponent) => write!(f, "pow({base},{exponent})"),
            Canon::Call(func, args) => {
                f.write_str(func.name())?;
                write_joined(f, args, ",")
            }
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[Canon], separator: &str) -> fmt::Result {
    f.write_str("(")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{item}")?;
    }
    f.write_str(")")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn canon(src: &str) -> String {
        Canon::from_expr(&parse(src).unwrap()).to_string()
    }

    #[test]
    fn canonical_form_is_reflexive_and_stable() {
        for src in ["S/B", "S/(S+B)", "S/sqrt(S+B)", "1./(B**2)*sqrt(B**2*ES**2+S**2*EB**2)"] {
            assert_eq!(canon(src), canon(src));
        }
    }

    #[test]
    fn trivial_rewrites_are_recognized() {
        assert_eq!(canon("S/B"), canon("(1*S)/B"));
        assert_eq!(canon("S/B"), canon("S*B^-1"));
        assert_eq!(canon("S/B"), canon("2*S/(2*B)"));
        assert_eq!(canon("S/B"), canon("S/B + 0"));
        assert_eq!(canon("S/B"), canon("-(-S)/B"));
    }

    #[test]
    fn orientation_matters() {
        assert_ne!(canon("S/B"), canon("B/S"));
        assert_ne!(canon("S/(S+B)"), canon("B/(S+B)"));
        assert_ne!(canon("S/B"), canon("S/(S+B)"));
    }

    #[test]
    fn sums_are_commutative_and_merge_like_terms() {
        assert_eq!(canon("S/(S+B)"), canon("S/(B+S)"));
        assert_eq!(canon("S+S+B"), canon("2*S+B"));
        assert_eq!(canon("S-S+B"), canon("B"));
        assert_eq!(canon("2*(S+B)"), canon("2*S+2*B"));
    }

    #[test]
    fn square_roots_and_powers_agree() {
        let reference = canon("S/sqrt(S+B)");
        assert_eq!(reference, canon("S*pow(S+B,-0.5)"));
        assert_eq!(reference, canon("S/(B+S)**(1/2)"));
        assert_eq!(reference, canon("S/(S+B)^0.5"));
        assert_eq!(reference, canon("S*sqrt(1/(S+B))"));
        assert_eq!(reference, canon("S*pow(1/(B+S),1/2)"));
        assert_eq!(canon("sqrt(1/B)"), canon("B^-0.5"));
        assert_eq!(canon("sqrt(B^3)"), canon("B^1.5"));
    }

    #[test]
    fn equal_bases_collect_exponents() {
        assert_eq!(canon("1/B**2"), canon("1/(B*B)"));
        assert_eq!(canon("B*B/B"), canon("B"));
        assert_eq!(
            canon("1/B**2*sqrt(B**2*ES**2+S**2*EB**2)"),
            canon("sqrt(S^2*EB^2+ES^2*B^2)/(B*B)")
        );
        assert_eq!(canon("1./(S+B)**2"), canon("pow(S+B,-2)"));
        assert_eq!(canon("1/pow(S+B,3./2.)"), canon("(S+B)^-1.5"));
    }

    #[test]
    fn products_distribute_over_sums() {
        assert_eq!(canon("S*(S+B)"), canon("S^2+B*S"));
        assert_eq!(canon("(S+B)/S"), canon("1+B/S"));
    }

    #[test]
    fn square_root_of_a_square_is_not_simplified() {
        // sqrt(S^2) is |S|, not S.
        assert_ne!(canon("sqrt(S^2)"), canon("S"));
        assert_ne!(canon("sqrt(1/S^2)"), canon("1/S"));
    }

    #[test]
    fn constants_fold() {
        assert_eq!(canon("3./2."), "1.50000000000e0");
        assert_eq!(canon("2*3+sqrt(4)"), "8");
        assert_eq!(canon("0.1+0.2"), canon("0.3"));
    }
}
