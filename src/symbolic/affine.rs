// src/symbolic/affine.rs
//! Linear-part extraction for exponential Euler.
//!
//! An expression is affine in `x` when it can be written `A·x + B` with `A`
//! and `B` free of `x`. The decomposition walks the tree once, distributing
//! products and quotients over sums (the expansion step) and collecting the
//! coefficient of `x` as it goes. Any product of two `x`-dependent factors,
//! division by an `x`-dependent denominator, non-unit power of `x` or
//! function of `x` makes the expression non-affine.

use super::expr::Expr;

/// `linear·x + offset`
#[derive(Debug, Clone, PartialEq)]
pub struct Affine {
    pub linear: Expr,
    pub offset: Expr,
}

impl Affine {
    fn constant(expr: Expr) -> Self {
        Self {
            linear: Expr::Num(0.0),
            offset: expr,
        }
    }

    /// Linear coefficient when it is non-zero after folding
    pub fn coefficient(&self) -> Option<&Expr> {
        if self.linear.is_zero() {
            None
        } else {
            Some(&self.linear)
        }
    }
}

fn add(a: Expr, b: Expr) -> Expr {
    Expr::Add(Box::new(a), Box::new(b))
}

fn sub(a: Expr, b: Expr) -> Expr {
    Expr::Sub(Box::new(a), Box::new(b))
}

fn mul(a: Expr, b: Expr) -> Expr {
    Expr::Mul(Box::new(a), Box::new(b))
}

fn div(a: Expr, b: Expr) -> Expr {
    Expr::Div(Box::new(a), Box::new(b))
}

/// Split `expr` into `A·var + B`, or `None` when it is not affine in `var`.
/// Both parts are returned folded.
pub fn decompose(expr: &Expr, var: &str) -> Option<Affine> {
    let raw = split(expr, var)?;
    Some(Affine {
        linear: raw.linear.fold(),
        offset: raw.offset.fold(),
    })
}

fn split(expr: &Expr, var: &str) -> Option<Affine> {
    if !expr.has(var) {
        return Some(Affine::constant(expr.clone()));
    }
    match expr {
        Expr::Sym(_) => Some(Affine {
            linear: Expr::Num(1.0),
            offset: Expr::Num(0.0),
        }),
        Expr::Neg(a) => {
            let a = split(a, var)?;
            Some(Affine {
                linear: Expr::Neg(Box::new(a.linear)),
                offset: Expr::Neg(Box::new(a.offset)),
            })
        }
        Expr::Add(a, b) => {
            let (a, b) = (split(a, var)?, split(b, var)?);
            Some(Affine {
                linear: add(a.linear, b.linear),
                offset: add(a.offset, b.offset),
            })
        }
        Expr::Sub(a, b) => {
            let (a, b) = (split(a, var)?, split(b, var)?);
            Some(Affine {
                linear: sub(a.linear, b.linear),
                offset: sub(a.offset, b.offset),
            })
        }
        Expr::Mul(a, b) => {
            let (a, b) = (split(a, var)?, split(b, var)?);
            // (a1·x + a0)(b1·x + b0) is affine only if a1 or b1 vanishes
            let a_free = a.linear.fold().is_zero();
            let b_free = b.linear.fold().is_zero();
            if a_free {
                Some(Affine {
                    linear: mul(a.offset.clone(), b.linear),
                    offset: mul(a.offset, b.offset),
                })
            } else if b_free {
                Some(Affine {
                    linear: mul(a.linear, b.offset.clone()),
                    offset: mul(a.offset, b.offset),
                })
            } else {
                None
            }
        }
        Expr::Div(a, b) => {
            if b.has(var) {
                return None;
            }
            let a = split(a, var)?;
            Some(Affine {
                linear: div(a.linear, (**b).clone()),
                offset: div(a.offset, (**b).clone()),
            })
        }
        Expr::Pow(base, exponent) => {
            if exponent.has(var) {
                return None;
            }
            match exponent.fold().as_constant() {
                Some(e) if e == 1.0 => split(base, var),
                Some(e) if e == 0.0 => Some(Affine::constant(Expr::Num(1.0))),
                _ => None,
            }
        }
        Expr::Call(..) | Expr::Num(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::super::parser::parse;
    use super::super::Scope;
    use super::*;

    fn scope(pairs: &[(&str, f64)]) -> Scope {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_lif_membrane_is_affine() {
        let expr = parse("(-(V - V_rest) + R*I)/tau").unwrap();
        let affine = decompose(&expr, "V").unwrap();

        let bound = affine
            .linear
            .bind(&scope(&[("tau", 10.0)]))
            .fold();
        assert_eq!(bound, Expr::Num(-0.1));
        assert!(affine.offset.has("I"));
        assert!(!affine.offset.has("V"));
    }

    #[test]
    fn test_coefficient_depending_on_other_symbols() {
        // gating-variable form: alpha*(1 - m) - beta*m
        let expr = parse("alpha*(1 - m) - beta*m").unwrap();
        let affine = decompose(&expr, "m").unwrap();
        assert_eq!(affine.linear.to_string(), "-alpha - beta");
        assert_eq!(affine.offset, Expr::sym("alpha"));
    }

    #[test]
    fn test_non_affine_expressions() {
        for source in ["V*V", "V^2", "exp(V)", "1/V", "(V - 1)*(V + 1)", "a^V"] {
            let expr = parse(source).unwrap();
            assert!(decompose(&expr, "V").is_none(), "{} should not be affine", source);
        }
    }

    #[test]
    fn test_variable_free_expression_has_no_coefficient() {
        let expr = parse("I/tau").unwrap();
        let affine = decompose(&expr, "V").unwrap();
        assert!(affine.coefficient().is_none());

        let cancelled = decompose(&parse("V - V + 3").unwrap(), "V").unwrap();
        assert!(cancelled.coefficient().is_none());
        assert_eq!(cancelled.offset, Expr::Num(3.0));
    }

    #[test]
    fn test_unit_power_is_transparent() {
        let affine = decompose(&parse("2*V^1 + 1").unwrap(), "V").unwrap();
        assert_eq!(affine.linear, Expr::Num(2.0));
        assert_eq!(affine.offset, Expr::Num(1.0));
    }
}
