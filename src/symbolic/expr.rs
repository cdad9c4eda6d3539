// src/symbolic/expr.rs
use super::Scope;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Elementary functions understood by the expression language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    Exp,
    Log,
    Sqrt,
    Sin,
    Cos,
    Tanh,
    Abs,
}

impl Func {
    pub fn from_name(name: &str) -> Option<Func> {
        match name {
            "exp" => Some(Func::Exp),
            "log" | "ln" => Some(Func::Log),
            "sqrt" => Some(Func::Sqrt),
            "sin" => Some(Func::Sin),
            "cos" => Some(Func::Cos),
            "tanh" => Some(Func::Tanh),
            "abs" => Some(Func::Abs),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Func::Exp => "exp",
            Func::Log => "log",
            Func::Sqrt => "sqrt",
            Func::Sin => "sin",
            Func::Cos => "cos",
            Func::Tanh => "tanh",
            Func::Abs => "abs",
        }
    }

    pub fn apply(&self, x: f64) -> f64 {
        match self {
            Func::Exp => x.exp(),
            Func::Log => x.ln(),
            Func::Sqrt => x.sqrt(),
            Func::Sin => x.sin(),
            Func::Cos => x.cos(),
            Func::Tanh => x.tanh(),
            Func::Abs => x.abs(),
        }
    }
}

/// Arithmetic expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Num(f64),
    Sym(String),
    Neg(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Pow(Box<Expr>, Box<Expr>),
    Call(Func, Box<Expr>),
}

impl Expr {
    pub fn sym(name: &str) -> Expr {
        Expr::Sym(name.to_string())
    }

    pub fn as_constant(&self) -> Option<f64> {
        match self {
            Expr::Num(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.as_constant() == Some(0.0)
    }

    /// Every symbol referenced in the tree
    pub fn symbols(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_symbols(&mut out);
        out
    }

    fn collect_symbols(&self, out: &mut BTreeSet<String>) {
        match self {
            Expr::Num(_) => {}
            Expr::Sym(name) => {
                out.insert(name.clone());
            }
            Expr::Neg(a) | Expr::Call(_, a) => a.collect_symbols(out),
            Expr::Add(a, b)
            | Expr::Sub(a, b)
            | Expr::Mul(a, b)
            | Expr::Div(a, b)
            | Expr::Pow(a, b) => {
                a.collect_symbols(out);
                b.collect_symbols(out);
            }
        }
    }

    pub fn has(&self, name: &str) -> bool {
        match self {
            Expr::Num(_) => false,
            Expr::Sym(s) => s == name,
            Expr::Neg(a) | Expr::Call(_, a) => a.has(name),
            Expr::Add(a, b)
            | Expr::Sub(a, b)
            | Expr::Mul(a, b)
            | Expr::Div(a, b)
            | Expr::Pow(a, b) => a.has(name) || b.has(name),
        }
    }

    /// Rebuild the tree with `f` applied to every leaf
    fn map_leaves(&self, f: &impl Fn(&Expr) -> Expr) -> Expr {
        match self {
            Expr::Num(_) | Expr::Sym(_) => f(self),
            Expr::Neg(a) => Expr::Neg(Box::new(a.map_leaves(f))),
            Expr::Call(func, a) => Expr::Call(*func, Box::new(a.map_leaves(f))),
            Expr::Add(a, b) => Expr::Add(Box::new(a.map_leaves(f)), Box::new(b.map_leaves(f))),
            Expr::Sub(a, b) => Expr::Sub(Box::new(a.map_leaves(f)), Box::new(b.map_leaves(f))),
            Expr::Mul(a, b) => Expr::Mul(Box::new(a.map_leaves(f)), Box::new(b.map_leaves(f))),
            Expr::Div(a, b) => Expr::Div(Box::new(a.map_leaves(f)), Box::new(b.map_leaves(f))),
            Expr::Pow(a, b) => Expr::Pow(Box::new(a.map_leaves(f)), Box::new(b.map_leaves(f))),
        }
    }

    /// Whole-word symbol renaming
    pub fn substitute(&self, renames: &HashMap<String, String>) -> Expr {
        self.map_leaves(&|leaf| match leaf {
            Expr::Sym(name) => match renames.get(name) {
                Some(new_name) => Expr::Sym(new_name.clone()),
                None => leaf.clone(),
            },
            _ => leaf.clone(),
        })
    }

    /// Replace scope symbols by their numeric values
    pub fn bind(&self, scope: &Scope) -> Expr {
        self.map_leaves(&|leaf| match leaf {
            Expr::Sym(name) => match scope.get(name) {
                Some(value) => Expr::Num(*value),
                None => leaf.clone(),
            },
            _ => leaf.clone(),
        })
    }

    /// Constant folding with the usual additive and multiplicative identities.
    /// Only identities that hold for every finite operand are applied, so a
    /// folded tree evaluates to the same value as the original.
    pub fn fold(&self) -> Expr {
        match self {
            Expr::Num(_) | Expr::Sym(_) => self.clone(),
            Expr::Neg(a) => match a.fold() {
                Expr::Num(v) => Expr::Num(-v),
                Expr::Neg(inner) => *inner,
                other => Expr::Neg(Box::new(other)),
            },
            Expr::Call(func, a) => match a.fold() {
                Expr::Num(v) => Expr::Num(func.apply(v)),
                other => Expr::Call(*func, Box::new(other)),
            },
            Expr::Add(a, b) => match (a.fold(), b.fold()) {
                (Expr::Num(x), Expr::Num(y)) => Expr::Num(x + y),
                (Expr::Num(z), other) | (other, Expr::Num(z)) if z == 0.0 => other,
                (x, y) => Expr::Add(Box::new(x), Box::new(y)),
            },
            Expr::Sub(a, b) => match (a.fold(), b.fold()) {
                (Expr::Num(x), Expr::Num(y)) => Expr::Num(x - y),
                (x, Expr::Num(z)) if z == 0.0 => x,
                (Expr::Num(z), y) if z == 0.0 => Expr::Neg(Box::new(y)).fold(),
                (x, y) => Expr::Sub(Box::new(x), Box::new(y)),
            },
            Expr::Mul(a, b) => match (a.fold(), b.fold()) {
                (Expr::Num(x), Expr::Num(y)) => Expr::Num(x * y),
                (Expr::Num(z), _) | (_, Expr::Num(z)) if z == 0.0 => Expr::Num(0.0),
                (Expr::Num(o), other) | (other, Expr::Num(o)) if o == 1.0 => other,
                (Expr::Num(m), other) | (other, Expr::Num(m)) if m == -1.0 => {
                    Expr::Neg(Box::new(other)).fold()
                }
                (x, y) => Expr::Mul(Box::new(x), Box::new(y)),
            },
            Expr::Div(a, b) => match (a.fold(), b.fold()) {
                (Expr::Num(x), Expr::Num(y)) => Expr::Num(x / y),
                (x, Expr::Num(o)) if o == 1.0 => x,
                (x, y) => Expr::Div(Box::new(x), Box::new(y)),
            },
            Expr::Pow(a, b) => match (a.fold(), b.fold()) {
                (Expr::Num(x), Expr::Num(y)) => Expr::Num(x.powf(y)),
                (x, Expr::Num(o)) if o == 1.0 => x,
                (x, y) => Expr::Pow(Box::new(x), Box::new(y)),
            },
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Add(..) | Expr::Sub(..) => 1,
            Expr::Mul(..) | Expr::Div(..) => 2,
            Expr::Neg(..) => 3,
            Expr::Pow(..) => 4,
            Expr::Num(v) if *v < 0.0 => 3,
            Expr::Num(_) | Expr::Sym(_) | Expr::Call(..) => 5,
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>, min: u8) -> fmt::Result {
        if self.precedence() < min {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Num(v) => write!(f, "{}", v),
            Expr::Sym(name) => write!(f, "{}", name),
            Expr::Neg(a) => {
                write!(f, "-")?;
                a.fmt_operand(f, 3)
            }
            Expr::Call(func, a) => write!(f, "{}({})", func.name(), a),
            Expr::Add(a, b) => {
                a.fmt_operand(f, 1)?;
                write!(f, " + ")?;
                b.fmt_operand(f, 2)
            }
            Expr::Sub(a, b) => {
                a.fmt_operand(f, 1)?;
                write!(f, " - ")?;
                b.fmt_operand(f, 2)
            }
            Expr::Mul(a, b) => {
                a.fmt_operand(f, 2)?;
                write!(f, "*")?;
                b.fmt_operand(f, 3)
            }
            Expr::Div(a, b) => {
                a.fmt_operand(f, 2)?;
                write!(f, "/")?;
                b.fmt_operand(f, 3)
            }
            Expr::Pow(a, b) => {
                a.fmt_operand(f, 5)?;
                write!(f, "^")?;
                b.fmt_operand(f, 4)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::parser::parse;
    use super::*;

    #[test]
    fn test_symbols_and_has() {
        let expr = parse("(-(V - V_rest) + R*I)/tau").unwrap();
        let symbols: Vec<String> = expr.symbols().into_iter().collect();
        assert_eq!(symbols, vec!["I", "R", "V", "V_rest", "tau"]);
        assert!(expr.has("V"));
        assert!(!expr.has("t"));
    }

    #[test]
    fn test_bind_and_fold() {
        let expr = parse("a * x + b / 2").unwrap();
        let scope: Scope = [("a".to_string(), 3.0), ("b".to_string(), 4.0)]
            .into_iter()
            .collect();
        let folded = expr.bind(&scope).fold();
        assert_eq!(folded.to_string(), "3*x + 2");
    }

    #[test]
    fn test_fold_identities() {
        assert_eq!(parse("0 + x*1").unwrap().fold(), Expr::sym("x"));
        assert_eq!(parse("0*x").unwrap().fold(), Expr::Num(0.0));
        assert_eq!(parse("--x").unwrap().fold(), Expr::sym("x"));
        assert_eq!(parse("0 - x").unwrap().fold().to_string(), "-x");
    }

    #[test]
    fn test_substitute_whole_words() {
        let expr = parse("tau * tau_m + t").unwrap();
        let renames: HashMap<String, String> =
            [("tau".to_string(), "_V_tau".to_string())].into_iter().collect();
        assert_eq!(expr.substitute(&renames).to_string(), "_V_tau*tau_m + t");
    }

    #[test]
    fn test_display_round_trips_precedence() {
        let source = "(a - b)*c - (d - e)";
        let printed = parse(source).unwrap().to_string();
        assert_eq!(printed, "(a - b)*c - (d - e)");
        assert_eq!(parse(&printed).unwrap(), parse(source).unwrap());
    }
}
