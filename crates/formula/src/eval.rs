use crate::ast::{BinaryOp, Expr, Function, Symbol};

/// Values bound to the formula variables.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Variables {
    pub s: f64,
    pub b: f64,
    pub es: f64,
    pub eb: f64,
}

impl Variables {
    pub fn new(s: f64, b: f64, es: f64, eb: f64) -> Self {
        Self { s, b, es, eb }
    }

    pub fn get(&self, symbol: Symbol) -> f64 {
        match symbol {
            Symbol::Signal => self.s,
            Symbol::Background => self.b,
            Symbol::SignalError => self.es,
            Symbol::BackgroundError => self.eb,
        }
    }
}

/// Evaluates an expression. Division by zero gives NaN; domain errors such as
/// the square root of a negative number propagate as NaN.
pub fn eval_expr(expr: &Expr, vars: &Variables) -> f64 {
    match expr {
        Expr::Number(v) => *v,
        Expr::Var(s) => vars.get(*s),
        Expr::Neg(inner) => -eval_expr(inner, vars),
        Expr::Binary(op, lhs, rhs) => {
            let lhs = eval_expr(lhs, vars);
            let rhs = eval_expr(rhs, vars);
            match op {
                BinaryOp::Add => lhs + rhs,
                BinaryOp::Sub => lhs - rhs,
                BinaryOp::Mul => lhs * rhs,
                BinaryOp::Div => divide(lhs, rhs),
                BinaryOp::Pow => lhs.powf(rhs),
            }
        }
        Expr::Call(func, args) => {
            let values: Vec<f64> = args.iter().map(|a| eval_expr(a, vars)).collect();
            apply(*func, &values)
        }
    }
}

pub(crate) fn divide(lhs: f64, rhs: f64) -> f64 {
    if rhs == 0.0 { f64::NAN } else { lhs / rhs }
}

/// Applies a function to already evaluated arguments. A wrong argument count
/// yields NaN; the parser never produces one.
pub(crate) fn apply(func: Function, args: &[f64]) -> f64 {
    match (func, args) {
        (Function::Sqrt, [x]) => x.sqrt(),
        (Function::Pow, [x, y]) => x.powf(*y),
        (Function::Abs, [x]) => x.abs(),
        (Function::Exp, [x]) => x.exp(),
        (Function::Log, [x]) => {
            if *x <= 0.0 {
                f64::NAN
            } else {
                x.ln()
            }
        }
        _ => f64::NAN,
    }
}
