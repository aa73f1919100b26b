use std::fmt;

/// The four variables a figure-of-merit formula may refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
    /// `S`: signal yield.
    Signal,
    /// `B`: background yield.
    Background,
    /// `ES`: uncertainty on the signal yield.
    SignalError,
    /// `EB`: uncertainty on the background yield.
    BackgroundError,
}

impl Symbol {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "S" => Some(Symbol::Signal),
            "B" => Some(Symbol::Background),
            "ES" => Some(Symbol::SignalError),
            "EB" => Some(Symbol::BackgroundError),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Symbol::Signal => "S",
            Symbol::Background => "B",
            Symbol::SignalError => "ES",
            Symbol::BackgroundError => "EB",
        }
    }

    /// The same quantity with the roles of signal and background exchanged.
    pub fn swapped(&self) -> Self {
        match self {
            Symbol::Signal => Symbol::Background,
            Symbol::Background => Symbol::Signal,
            Symbol::SignalError => Symbol::BackgroundError,
            Symbol::BackgroundError => Symbol::SignalError,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Function {
    Sqrt,
    Pow,
    Abs,
    Exp,
    Log,
}

impl Function {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sqrt" => Some(Function::Sqrt),
            "pow" => Some(Function::Pow),
            "abs" => Some(Function::Abs),
            "exp" => Some(Function::Exp),
            "log" => Some(Function::Log),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Function::Sqrt => "sqrt",
            Function::Pow => "pow",
            Function::Abs => "abs",
            Function::Exp => "exp",
            Function::Log => "log",
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            Function::Pow => 2,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Var(Symbol),
    Neg(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Call(Function, Vec<Expr>),
}

impl Expr {
    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary(op, Box::new(lhs), Box::new(rhs))
    }

    pub fn neg(inner: Expr) -> Self {
        Expr::Neg(Box::new(inner))
    }

    /// Rebuilds the tree with every variable passed through `f`.
    pub fn map_symbols<F>(&self, f: &F) -> Expr
    where
        F: Fn(Symbol) -> Symbol,
    {
        match self {
            Expr::Number(v) => Expr::Number(*v),
            Expr::Var(s) => Expr::Var(f(*s)),
            Expr::Neg(inner) => Expr::neg(inner.map_symbols(f)),
            Expr::Binary(op, lhs, rhs) => Expr::binary(*op, lhs.map_symbols(f), rhs.map_symbols(f)),
            Expr::Call(func, args) => {
                Expr::Call(*func, args.iter().map(|a| a.map_symbols(f)).collect())
            }
        }
    }

    /// Calls `visit` on every variable occurrence, left to right.
    pub fn for_each_symbol<F>(&self, visit: &mut F)
    where
        F: FnMut(Symbol),
    {
        match self {
            Expr::Number(_) => {}
            Expr::Var(s) => visit(*s),
            Expr::Neg(inner) => inner.for_each_symbol(visit),
            Expr::Binary(_, lhs, rhs) => {
                lhs.for_each_symbol(visit);
                rhs.for_each_symbol(visit);
            }
            Expr::Call(_, args) => args.iter().for_each(|a| a.for_each_symbol(visit)),
        }
    }
}
