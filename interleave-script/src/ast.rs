use std::rc::Rc;

use strum::Display;

/// Compiled snippet: a flat list of top-level statements.
#[derive(Clone, Debug, PartialEq)]
pub struct Program {
    pub body: Vec<Stmt>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    Decl(DeclKind, Vec<(Rc<str>, Option<Expr>)>),
    Expr(Expr),
    Return(Option<Expr>),
    Throw(Expr),
    If(Expr, Box<Stmt>, Option<Box<Stmt>>),
    While(Expr, Box<Stmt>),
    /// `for (init; cond; update) body`. The init declarations are scoped to
    /// the loop.
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        update: Option<Expr>,
        body: Box<Stmt>,
    },
    Block(Vec<Stmt>),
    Empty,
}

#[derive(Display, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[strum(serialize_all = "snake_case")]
pub enum DeclKind {
    Let,
    Const,
    Var,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Number(f64),
    String(Rc<str>),
    Bool(bool),
    Null,
    Undefined,
    Ident(Rc<str>),
    Array(Vec<Expr>),
    Object(Vec<(Rc<str>, Expr)>),
    Member(Box<Expr>, Rc<str>),
    Index(Box<Expr>, Box<Expr>),
    Call(Box<Expr>, Vec<Expr>),
    New(Box<Expr>, Vec<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Logical(LogicalOp, Box<Expr>, Box<Expr>),
    Conditional(Box<Expr>, Box<Expr>, Box<Expr>),
    /// Assignment, with the operator applied to the old value for compound
    /// assignment.
    Assign(Option<BinaryOp>, Box<Expr>, Box<Expr>),
    /// `++`/`--`, as `(delta, prefix)`.
    Update(Box<Expr>, f64, bool),
}

#[derive(Display, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    #[strum(serialize = "-")]
    Neg,
    #[strum(serialize = "+")]
    Plus,
    #[strum(serialize = "!")]
    Not,
    #[strum(serialize = "typeof")]
    Typeof,
}

#[derive(Display, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Sub,
    #[strum(serialize = "*")]
    Mul,
    #[strum(serialize = "/")]
    Div,
    #[strum(serialize = "%")]
    Rem,
    #[strum(serialize = "==")]
    LooseEq,
    #[strum(serialize = "!=")]
    LooseNe,
    #[strum(serialize = "===")]
    StrictEq,
    #[strum(serialize = "!==")]
    StrictNe,
    #[strum(serialize = "<")]
    Lt,
    #[strum(serialize = "<=")]
    Le,
    #[strum(serialize = ">")]
    Gt,
    #[strum(serialize = ">=")]
    Ge,
}

#[derive(Display, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    #[strum(serialize = "&&")]
    And,
    #[strum(serialize = "||")]
    Or,
    #[strum(serialize = "??")]
    Nullish,
}

impl Expr {
    /// Reports whether the expression can appear on the left of `=`.
    #[inline]
    pub fn is_assignable(&self) -> bool {
        matches!(self, Expr::Ident(_) | Expr::Member(..) | Expr::Index(..))
    }
}
