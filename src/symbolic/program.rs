// src/symbolic/program.rs
//! Slot-resolved form of an [`Expr`], evaluated once per state element.
//!
//! Symbols are resolved to slot indices when the program is compiled so the
//! per-step evaluation never touches a string.

use super::expr::{Expr, Func};

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Const(f64),
    Slot(usize),
    Neg(Box<Node>),
    Add(Box<Node>, Box<Node>),
    Sub(Box<Node>, Box<Node>),
    Mul(Box<Node>, Box<Node>),
    Div(Box<Node>, Box<Node>),
    Pow(Box<Node>, Box<Node>),
    Call(Func, Box<Node>),
}

/// Compiled expression over a fixed slot layout
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    root: Node,
    width: usize,
}

impl Program {
    /// Compile `expr` against `slots`. Returns the first unresolved symbol on
    /// failure.
    pub fn compile(expr: &Expr, slots: &[String]) -> Result<Program, String> {
        Ok(Program {
            root: lower(expr, slots)?,
            width: slots.len(),
        })
    }

    /// Number of slots the program was compiled against
    pub fn width(&self) -> usize {
        self.width
    }

    /// `Some(value)` when the program does not read any slot
    pub fn constant(&self) -> Option<f64> {
        match self.root {
            Node::Const(v) => Some(v),
            _ => None,
        }
    }

    pub fn eval(&self, slots: &[f64]) -> f64 {
        eval(&self.root, slots)
    }
}

fn lower(expr: &Expr, slots: &[String]) -> Result<Node, String> {
    let pair = |a: &Expr, b: &Expr| -> Result<(Box<Node>, Box<Node>), String> {
        Ok((Box::new(lower(a, slots)?), Box::new(lower(b, slots)?)))
    };
    Ok(match expr {
        Expr::Num(v) => Node::Const(*v),
        Expr::Sym(name) => match slots.iter().position(|s| s == name) {
            Some(index) => Node::Slot(index),
            None => return Err(name.clone()),
        },
        Expr::Neg(a) => Node::Neg(Box::new(lower(a, slots)?)),
        Expr::Call(func, a) => Node::Call(*func, Box::new(lower(a, slots)?)),
        Expr::Add(a, b) => {
            let (a, b) = pair(a, b)?;
            Node::Add(a, b)
        }
        Expr::Sub(a, b) => {
            let (a, b) = pair(a, b)?;
            Node::Sub(a, b)
        }
        Expr::Mul(a, b) => {
            let (a, b) = pair(a, b)?;
            Node::Mul(a, b)
        }
        Expr::Div(a, b) => {
            let (a, b) = pair(a, b)?;
            Node::Div(a, b)
        }
        Expr::Pow(a, b) => {
            let (a, b) = pair(a, b)?;
            Node::Pow(a, b)
        }
    })
}

fn eval(node: &Node, slots: &[f64]) -> f64 {
    match node {
        Node::Const(v) => *v,
        Node::Slot(i) => slots[*i],
        Node::Neg(a) => -eval(a, slots),
        Node::Add(a, b) => eval(a, slots) + eval(b, slots),
        Node::Sub(a, b) => eval(a, slots) - eval(b, slots),
        Node::Mul(a, b) => eval(a, slots) * eval(b, slots),
        Node::Div(a, b) => eval(a, slots) / eval(b, slots),
        Node::Pow(a, b) => {
            let exponent = eval(b, slots);
            if exponent.fract() == 0.0 && exponent.abs() <= i32::MAX as f64 {
                eval(a, slots).powi(exponent as i32)
            } else {
                eval(a, slots).powf(exponent)
            }
        }
        Node::Call(func, a) => func.apply(eval(a, slots)),
    }
}
