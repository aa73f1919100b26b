use crate::ast::{Expr, Symbol};
use crate::canonical::Canon;
use crate::error::FormulaError;
use crate::eval::{Variables, eval_expr};
use crate::lexer::{TokenKind, tokenize};
use crate::parser::parse;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A formula that passed validation, kept together with the text it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFormula {
    source: String,
    expr: Expr,
}

impl CompiledFormula {
    pub fn compile(text: &str) -> Result<Self, FormulaError> {
        let expr = parse(text)?;
        tracing::debug!(formula = text, "Compiled formula.");
        Ok(Self {
            source: text.to_string(),
            expr,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn evaluate(&self, vars: Variables) -> f64 {
        eval_expr(&self.expr, &vars)
    }

    pub fn canonical_form(&self) -> String {
        Canon::from_expr(&self.expr).to_string()
    }

    /// The variables this formula refers to.
    pub fn symbols(&self) -> BTreeSet<Symbol> {
        let mut symbols = BTreeSet::new();
        self.expr.for_each_symbol(&mut |s| {
            symbols.insert(s);
        });
        symbols
    }

    /// Whether both formulas normalize to the same shape.
    pub fn is_equivalent_to(&self, other: &CompiledFormula) -> bool {
        self.canonical_form() == other.canonical_form()
    }

    /// The same formula with signal and background exchanged.
    pub fn swapped(&self) -> CompiledFormula {
        CompiledFormula {
            source: swap_symbols_in_text(&self.source),
            expr: self.expr.map_symbols(&|s| s.swapped()),
        }
    }
}

impl fmt::Display for CompiledFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl FromStr for CompiledFormula {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CompiledFormula::compile(s)
    }
}

pub fn compile(text: &str) -> Result<CompiledFormula, FormulaError> {
    CompiledFormula::compile(text)
}

pub fn evaluate(formula: &CompiledFormula, vars: Variables) -> f64 {
    formula.evaluate(vars)
}

pub fn canonical_form(formula: &CompiledFormula) -> String {
    formula.canonical_form()
}

/// Exchanges `S`/`B` and `ES`/`EB` in a formula's text, leaving everything
/// else (spacing, number spelling, `**` vs `^`) byte for byte intact.
pub fn swap_signal_background(text: &str) -> Result<String, FormulaError> {
    let tokens = tokenize(text)?;
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for token in tokens {
        if token.kind != TokenKind::Ident {
            continue;
        }
        if let Some(symbol) = Symbol::from_name(token.text) {
            out.push_str(&text[last..token.span.start]);
            out.push_str(symbol.swapped().name());
            last = token.span.end;
        }
    }
    out.push_str(&text[last..]);
    Ok(out)
}

/// Only called on text that already compiled, so tokenizing cannot fail.
fn swap_symbols_in_text(text: &str) -> String {
    swap_signal_background(text).unwrap_or_else(|_| text.to_string())
}
