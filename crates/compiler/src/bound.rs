//! The bound tree: the binder's typed, name-resolved output.
//!
//! Mirrors the AST shape, but every expression carries its resolved [`Type`]
//! and every name reference holds a direct handle to the [`Symbol`] it
//! resolved to. A [`BoundRoot`] only exists when the binder established "no
//! unresolved names, no type mismatches" for the whole program; otherwise
//! the binder reports diagnostics and returns `None`.

use crate::span::SourceSpan;
use crate::types::{Symbol, Type};
use std::rc::Rc;

#[derive(Debug, Clone)]
pub struct BoundRoot {
    pub records: Vec<Rc<Type>>,
    pub enums: Vec<Rc<Type>>,
    pub functions: Vec<BoundFunction>,
}

#[derive(Debug, Clone)]
pub struct BoundFunction {
    pub symbol: Rc<Symbol>,
    /// The parameter symbols, in declaration order, sharing identity with
    /// every `VarRef` in `body` that reads a parameter — lets downstream
    /// consumers (the IR generator) seed a parameter's storage slot without
    /// re-resolving it by name.
    pub params: Vec<Rc<Symbol>>,
    /// `None` for a declaration-only function (`extern`, or a body replaced
    /// by `;`) — mirrors `original_source`'s `Binder::visit(FunDecl&)`
    /// treating a null body as producing no bound block at all.
    pub body: Option<BoundBlock>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, Default)]
pub struct BoundBlock {
    pub statements: Vec<BoundStatement>,
}

#[derive(Debug, Clone)]
pub enum BoundStatement {
    VarDecl {
        symbol: Rc<Symbol>,
        init: Option<BoundExpression>,
        span: SourceSpan,
    },
    Assign {
        symbol: Rc<Symbol>,
        value: BoundExpression,
        span: SourceSpan,
    },
    Return {
        value: Option<BoundExpression>,
        span: SourceSpan,
    },
    If {
        cond: BoundExpression,
        then_block: BoundBlock,
        else_block: Option<BoundBlock>,
        span: SourceSpan,
    },
    While {
        cond: BoundExpression,
        body: BoundBlock,
        span: SourceSpan,
    },
    Break(SourceSpan),
    Continue(SourceSpan),
    ExprStmt(BoundExpression),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundBinOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundUnaryOp {
    Neg,
    Not,
    Deref,
    AddrOf,
}

#[derive(Debug, Clone)]
pub enum BoundExpression {
    IntLit {
        value: i64,
        span: SourceSpan,
    },
    FloatLit {
        value: f64,
        span: SourceSpan,
    },
    StringLit {
        value: String,
        span: SourceSpan,
    },
    BoolLit {
        value: bool,
        span: SourceSpan,
    },
    VarRef {
        symbol: Rc<Symbol>,
        ty: Type,
        span: SourceSpan,
    },
    BinOp {
        op: BoundBinOp,
        lhs: Box<BoundExpression>,
        rhs: Box<BoundExpression>,
        ty: Type,
        span: SourceSpan,
    },
    UnaryOp {
        op: BoundUnaryOp,
        operand: Box<BoundExpression>,
        ty: Type,
        span: SourceSpan,
    },
    Call {
        symbol: Rc<Symbol>,
        args: Vec<BoundExpression>,
        ty: Type,
        span: SourceSpan,
    },
    ArrayLit {
        elements: Vec<BoundExpression>,
        ty: Type,
        span: SourceSpan,
    },
    /// `a.b` — `ty` is the accessed field's declared type, resolved against
    /// the base expression's record declaration; `Void` if the base isn't a
    /// record or the field doesn't exist (the binder has already reported a
    /// diagnostic in that case).
    FieldAccess {
        base: Box<BoundExpression>,
        field: String,
        ty: Type,
        span: SourceSpan,
    },
    If {
        cond: Box<BoundExpression>,
        then_block: BoundBlock,
        then_value: Option<Box<BoundExpression>>,
        else_block: Option<BoundBlock>,
        else_value: Option<Box<BoundExpression>>,
        ty: Type,
        span: SourceSpan,
    },
}

impl BoundExpression {
    pub fn ty(&self) -> Type {
        match self {
            BoundExpression::IntLit { .. } => Type::Int,
            BoundExpression::FloatLit { .. } => Type::Float,
            BoundExpression::StringLit { .. } => Type::Record("String".to_string(), Vec::new()),
            BoundExpression::BoolLit { .. } => Type::Bool,
            BoundExpression::VarRef { ty, .. }
            | BoundExpression::BinOp { ty, .. }
            | BoundExpression::UnaryOp { ty, .. }
            | BoundExpression::Call { ty, .. }
            | BoundExpression::ArrayLit { ty, .. }
            | BoundExpression::FieldAccess { ty, .. }
            | BoundExpression::If { ty, .. } => ty.clone(),
        }
    }

    pub fn span(&self) -> SourceSpan {
        match self {
            BoundExpression::IntLit { span, .. }
            | BoundExpression::FloatLit { span, .. }
            | BoundExpression::StringLit { span, .. }
            | BoundExpression::BoolLit { span, .. }
            | BoundExpression::VarRef { span, .. }
            | BoundExpression::BinOp { span, .. }
            | BoundExpression::UnaryOp { span, .. }
            | BoundExpression::Call { span, .. }
            | BoundExpression::ArrayLit { span, .. }
            | BoundExpression::FieldAccess { span, .. }
            | BoundExpression::If { span, .. } => *span,
        }
    }
}
