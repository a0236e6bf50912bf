//! Untyped abstract syntax tree produced by the parser.
//!
//! Modeled as tagged variants per spec: a tree of owned nodes with no
//! back-edges. An expression used as a statement is its own `Statement`
//! variant (`ExprStmt`) rather than a node that is simultaneously an
//! expression and a statement.

use crate::span::SourceSpan;

#[derive(Debug, Clone, PartialEq)]
pub struct Root {
    pub items: Vec<TopLevel>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TopLevel {
    FunDecl(FunDecl),
    RecordDecl(RecordDecl),
    EnumDecl(EnumDecl),
    ImportDecl(ImportDecl),
}

/// `{extern, static, pub}` modifier set on a function declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FunModifiers {
    pub is_extern: bool,
    pub is_static: bool,
    pub is_pub: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub type_expr: TypeExpr,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunDecl {
    pub name: String,
    pub params: Vec<Parameter>,
    pub is_varargs: bool,
    pub return_type: Option<TypeExpr>,
    /// `None` for a declaration-only function (e.g. `extern`, or a body
    /// replaced by `;`).
    pub body: Option<Block>,
    pub modifiers: FunModifiers,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordDecl {
    pub name: String,
    pub fields: Vec<Parameter>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDecl {
    pub name: String,
    /// 0-indexed tag names, in declaration order.
    pub tags: Vec<String>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    pub path: String,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub statements: Vec<Statement>,
    /// The block's result expression: the final item before `}` when it is
    /// not terminated by `;`.
    pub trailing: Option<Box<Expression>>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    VarDecl {
        name: String,
        type_expr: TypeExpr,
        init: Option<Expression>,
        span: SourceSpan,
    },
    Assign {
        target: String,
        value: Expression,
        span: SourceSpan,
    },
    Return {
        value: Option<Expression>,
        span: SourceSpan,
    },
    If {
        cond: Expression,
        then_block: Block,
        else_block: Option<Block>,
        span: SourceSpan,
    },
    While {
        cond: Expression,
        body: Block,
        span: SourceSpan,
    },
    Break(SourceSpan),
    Continue(SourceSpan),
    ExprStmt(Expression),
}

impl Statement {
    pub fn span(&self) -> SourceSpan {
        match self {
            Statement::VarDecl { span, .. }
            | Statement::Assign { span, .. }
            | Statement::Return { span, .. }
            | Statement::If { span, .. }
            | Statement::While { span, .. } => *span,
            Statement::Break(span) | Statement::Continue(span) => *span,
            Statement::ExprStmt(expr) => expr.span(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
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
pub enum UnaryOp {
    Neg,
    Not,
    Deref,
    AddrOf,
}

/// A call argument: `(ID '=')? Expr`.
#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    pub name: Option<String>,
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
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
    IdRef {
        name: String,
        span: SourceSpan,
    },
    BinOp {
        op: BinOp,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
        span: SourceSpan,
    },
    UnaryOp {
        op: UnaryOp,
        operand: Box<Expression>,
        span: SourceSpan,
    },
    Call {
        callee: String,
        args: Vec<Arg>,
        span: SourceSpan,
    },
    ArrayLit {
        elements: Vec<Expression>,
        span: SourceSpan,
    },
    FieldAccess {
        base: Box<Expression>,
        field: String,
        span: SourceSpan,
    },
    IfExpr {
        cond: Box<Expression>,
        then_block: Block,
        else_block: Option<Block>,
        span: SourceSpan,
    },
}

impl Expression {
    pub fn span(&self) -> SourceSpan {
        match self {
            Expression::IntLit { span, .. }
            | Expression::FloatLit { span, .. }
            | Expression::StringLit { span, .. }
            | Expression::BoolLit { span, .. }
            | Expression::IdRef { span, .. }
            | Expression::BinOp { span, .. }
            | Expression::UnaryOp { span, .. }
            | Expression::Call { span, .. }
            | Expression::ArrayLit { span, .. }
            | Expression::FieldAccess { span, .. }
            | Expression::IfExpr { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    Named(String),
    PointerTo(Box<TypeExpr>),
    ReferenceTo(Box<TypeExpr>),
    ArrayOf {
        size: Box<Expression>,
        element: Box<TypeExpr>,
    },
    Varargs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statement_span_delegates_to_expr_stmt() {
        let span = SourceSpan::new(4, 2);
        let stmt = Statement::ExprStmt(Expression::IntLit { value: 1, span });
        assert_eq!(stmt.span(), span);
    }
}
