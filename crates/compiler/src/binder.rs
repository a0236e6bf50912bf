//! Binder: AST -> bound tree. Resolves names, checks types, validates scope
//! discipline. Two-pass per spec.md §4.3 — directly grounded on
//! `original_source/sema/binder.cpp`'s `Binder::bind`: a declaration pass
//! (records/enums, then function signatures) so forward references and
//! mutual recursion work, followed by a body pass that walks each function.
//!
//! The binder never throws across a stage boundary: every rule violation
//! reports one diagnostic anchored at the offending node's span and returns
//! a best-effort placeholder so traversal can continue and surface more
//! than one error per run (matching the parser's panic-mode philosophy one
//! level up — see spec.md §7 "Propagation policy").

use crate::ast::{self, BinOp, UnaryOp};
use crate::bound::{
    BoundBinOp, BoundBlock, BoundExpression, BoundFunction, BoundRoot, BoundStatement, BoundUnaryOp,
};
use crate::diagnostics::{DiagnosticEngine, DiagnosticKind};
use crate::span::SourceSpan;
use crate::types::{promote, FunctionModifiers, Symbol, SymbolTable, Type, TypedField};
use std::collections::HashMap;
use std::rc::Rc;

pub struct Binder<'d> {
    diag: &'d mut DiagnosticEngine,
    symbols: SymbolTable,
    /// Field lists for declared records, keyed by name — looked up for
    /// `FieldAccess` typing and to re-materialize a full `Type::Record` when
    /// emitting the bound root's type declarations. Kept separate from the
    /// symbol table's `Type::Record` (which nominal equality never inspects)
    /// so pass 1 can pre-declare a record name before its own fields (which
    /// may reference other not-yet-declared records) are resolved.
    record_fields: HashMap<String, Vec<TypedField>>,
    current_return_type: Type,
    loop_depth: u32,
}

impl<'d> Binder<'d> {
    pub fn new(diag: &'d mut DiagnosticEngine) -> Self {
        Binder {
            diag,
            symbols: SymbolTable::new(),
            record_fields: HashMap::new(),
            current_return_type: Type::Void,
            loop_depth: 0,
        }
    }

    /// Bind a whole program. Returns `None` (reporting diagnostics) if any
    /// rule violation was found anywhere in the program — the bound tree's
    /// invariant is "no unresolved names, no type mismatches" or nothing at
    /// all (spec.md §3.5).
    pub fn bind(mut self, root: &ast::Root) -> Option<BoundRoot> {
        // Pass 1: declare record and enum type names (placeholder fields).
        for item in &root.items {
            if let ast::TopLevel::RecordDecl(r) = item {
                let placeholder = Type::Record(r.name.clone(), Vec::new());
                if !self
                    .symbols
                    .declare(&r.name, Symbol::Type { name: r.name.clone(), ty: placeholder })
                {
                    self.error(r.span, format!("type '{}' already declared", r.name));
                }
            }
        }
        for item in &root.items {
            if let ast::TopLevel::EnumDecl(e) = item {
                let ty = Type::Enum(e.name.clone(), e.tags.clone());
                if !self
                    .symbols
                    .declare(&e.name, Symbol::Type { name: e.name.clone(), ty })
                {
                    self.error(e.span, format!("type '{}' already declared", e.name));
                }
            }
        }
        // Now that every type name is visible, resolve each record's field
        // types (fields may reference other records declared anywhere in
        // the file — forward references are legal, per spec.md §4.3).
        for item in &root.items {
            if let ast::TopLevel::RecordDecl(r) = item {
                let fields = r
                    .fields
                    .iter()
                    .map(|p| TypedField { name: p.name.clone(), ty: self.map_type(&p.type_expr) })
                    .collect();
                self.record_fields.insert(r.name.clone(), fields);
            }
        }

        // Pass 2: declare function signatures.
        for item in &root.items {
            if let ast::TopLevel::FunDecl(f) = item {
                let params = f
                    .params
                    .iter()
                    .map(|p| TypedField { name: p.name.clone(), ty: self.map_type(&p.type_expr) })
                    .collect();
                let return_type = f
                    .return_type
                    .as_ref()
                    .map(|t| self.map_type(t))
                    .unwrap_or(Type::Void);
                let modifiers = FunctionModifiers {
                    is_extern: f.modifiers.is_extern,
                    is_static: f.modifiers.is_static,
                    is_pub: f.modifiers.is_pub,
                };
                let symbol = Symbol::Function {
                    name: f.name.clone(),
                    params,
                    return_type,
                    modifiers,
                    is_varargs: f.is_varargs,
                };
                if !self.symbols.declare(&f.name, symbol) {
                    self.error(f.span, format!("function '{}' already declared", f.name));
                }
            }
        }

        // Body pass.
        let mut functions = Vec::new();
        for item in &root.items {
            if let ast::TopLevel::FunDecl(f) = item {
                functions.push(self.bind_fun_decl(f));
            }
        }

        let records = root
            .items
            .iter()
            .filter_map(|item| match item {
                ast::TopLevel::RecordDecl(r) => {
                    let fields = self.record_fields.get(&r.name).cloned().unwrap_or_default();
                    Some(Rc::new(Type::Record(
                        r.name.clone(),
                        fields.into_iter().map(|f| (f.name, f.ty)).collect(),
                    )))
                }
                _ => None,
            })
            .collect();
        let enums = root
            .items
            .iter()
            .filter_map(|item| match item {
                ast::TopLevel::EnumDecl(e) => Some(Rc::new(Type::Enum(e.name.clone(), e.tags.clone()))),
                _ => None,
            })
            .collect();

        if self.diag.had_errors() {
            None
        } else {
            Some(BoundRoot { records, enums, functions })
        }
    }

    fn error(&mut self, span: SourceSpan, message: impl Into<String>) {
        self.diag.error(DiagnosticKind::TypeError, span, message);
    }

    fn name_error(&mut self, span: SourceSpan, message: impl Into<String>) {
        self.diag.error(DiagnosticKind::NameError, span, message);
    }

    fn flow_error(&mut self, span: SourceSpan, message: impl Into<String>) {
        self.diag.error(DiagnosticKind::FlowError, span, message);
    }

    fn map_type(&mut self, type_expr: &ast::TypeExpr) -> Type {
        match type_expr {
            ast::TypeExpr::Named(name) => match name.as_str() {
                "Int" => Type::Int,
                "Float" => Type::Float,
                "Bool" => Type::Bool,
                "Void" => Type::Void,
                "String" => Type::Record("String".to_string(), Vec::new()),
                _ => match self.symbols.lookup(name).as_deref() {
                    Some(Symbol::Type { ty, .. }) => ty.clone(),
                    _ => Type::Record(name.clone(), Vec::new()),
                },
            },
            ast::TypeExpr::PointerTo(inner) | ast::TypeExpr::ReferenceTo(inner) => {
                Type::Pointer(Box::new(self.map_type(inner)))
            }
            ast::TypeExpr::ArrayOf { size, element } => {
                let n = match size.as_ref() {
                    ast::Expression::IntLit { value, .. } => (*value).max(0) as usize,
                    _ => 0,
                };
                Type::Array(Box::new(self.map_type(element)), n)
            }
            ast::TypeExpr::Varargs => Type::Void,
        }
    }

    fn bind_fun_decl(&mut self, f: &ast::FunDecl) -> BoundFunction {
        let symbol = self.symbols.lookup(&f.name).expect("declared in pass 2");
        let (_, return_type, _, _) = symbol.as_function().expect("function symbol");
        let return_type = return_type.clone();

        let mut param_symbols = Vec::with_capacity(f.params.len());
        let body = f.body.as_ref().map(|block| {
            self.symbols.push_scope();
            let saved_return_type = std::mem::replace(&mut self.current_return_type, return_type.clone());

            for param in &f.params {
                let ty = self.map_type(&param.type_expr);
                if !self.symbols.declare(
                    &param.name,
                    Symbol::Variable { name: param.name.clone(), ty, is_parameter: true },
                ) {
                    self.error(param.span, format!("parameter '{}' already declared", param.name));
                }
                param_symbols.push(self.symbols.lookup(&param.name).expect("just declared"));
            }

            let bound = self.bind_function_body(block, &return_type);

            self.current_return_type = saved_return_type;
            self.symbols.pop_scope();
            bound
        });

        if let Some(block) = &body {
            if return_type != Type::Void && !always_returns(block) {
                self.flow_error(
                    f.span,
                    format!(
                        "function '{}' has a non-void return type but control flow may reach the end without a 'return'",
                        f.name
                    ),
                );
            }
        }

        BoundFunction { symbol, params: param_symbols, body, span: f.span }
    }

    /// Binds a function body block. A trailing expression (no `;` before
    /// `}`) is treated as an implicit `return` of that value, matching the
    /// grammar's "trailing expression = block result" note applied to a
    /// function body rather than only to `if`-as-expression arms (a Design
    /// Note decision recorded in DESIGN.md — spec.md is silent on whether
    /// function bodies support this, and the block grammar allows it
    /// unconditionally).
    fn bind_function_body(&mut self, block: &ast::Block, return_type: &Type) -> BoundBlock {
        let mut statements = Vec::new();
        for stmt in &block.statements {
            statements.push(self.bind_statement(stmt));
        }
        if let Some(trailing) = &block.trailing {
            let span = trailing.span();
            let expr = self.bind_expression(trailing);
            if !expr.ty().convertible_to(return_type) {
                self.error(
                    span,
                    format!(
                        "function body's trailing expression has type '{}', expected '{}'",
                        expr.ty(),
                        return_type
                    ),
                );
            }
            statements.push(BoundStatement::Return { value: Some(expr), span });
        }
        BoundBlock { statements }
    }

    /// Binds a plain statement-context block (`while` body, `if` arm used
    /// as a statement). A trailing expression here is bound and folded into
    /// an `ExprStmt` — its value, if any, is simply discarded.
    fn bind_block(&mut self, block: &ast::Block) -> BoundBlock {
        self.symbols.push_scope();
        let mut statements = Vec::new();
        for stmt in &block.statements {
            statements.push(self.bind_statement(stmt));
        }
        if let Some(trailing) = &block.trailing {
            statements.push(BoundStatement::ExprStmt(self.bind_expression(trailing)));
        }
        self.symbols.pop_scope();
        BoundBlock { statements }
    }

    /// Binds a block used as a *value* (an `if`-expression arm): statements
    /// bind normally but the trailing expression is returned separately
    /// rather than folded into the block, so the caller can type-check and
    /// merge the two arms' result values (spec.md §4.3 `IfExpr` rule).
    fn bind_block_as_value(&mut self, block: &ast::Block) -> (BoundBlock, Option<BoundExpression>) {
        self.symbols.push_scope();
        let mut statements = Vec::new();
        for stmt in &block.statements {
            statements.push(self.bind_statement(stmt));
        }
        let trailing = block.trailing.as_ref().map(|t| self.bind_expression(t));
        self.symbols.pop_scope();
        (BoundBlock { statements }, trailing)
    }

    fn bind_statement(&mut self, stmt: &ast::Statement) -> BoundStatement {
        match stmt {
            ast::Statement::VarDecl { name, type_expr, init, span } => {
                let declared_ty = self.map_type(type_expr);
                let init = init.as_ref().map(|e| {
                    let bound = self.bind_expression(e);
                    if !bound.ty().convertible_to(&declared_ty) {
                        self.error(
                            e.span(),
                            format!(
                                "cannot assign expression of type '{}' to variable of type '{}'",
                                bound.ty(),
                                declared_ty
                            ),
                        );
                    }
                    bound
                });
                if !self.symbols.declare(
                    name,
                    Symbol::Variable { name: name.clone(), ty: declared_ty, is_parameter: false },
                ) {
                    self.error(*span, format!("variable '{name}' already declared in this scope"));
                }
                let symbol = self.symbols.lookup(name).expect("just declared");
                BoundStatement::VarDecl { symbol, init, span: *span }
            }
            ast::Statement::Assign { target, value, span } => {
                let bound_value = self.bind_expression(value);
                match self.symbols.lookup(target) {
                    Some(symbol) => match symbol.as_variable_type() {
                        Some(ty) => {
                            if !bound_value.ty().convertible_to(ty) {
                                self.error(
                                    *span,
                                    format!(
                                        "cannot assign expression of type '{}' to variable of type '{}'",
                                        bound_value.ty(),
                                        ty
                                    ),
                                );
                            }
                            BoundStatement::Assign { symbol, value: bound_value, span: *span }
                        }
                        None => {
                            self.error(*span, format!("'{target}' is not a variable"));
                            BoundStatement::Assign {
                                symbol,
                                value: bound_value,
                                span: *span,
                            }
                        }
                    },
                    None => {
                        self.name_error(*span, format!("undefined identifier '{target}'"));
                        BoundStatement::ExprStmt(bound_value)
                    }
                }
            }
            ast::Statement::Return { value, span } => {
                let bound_value = value.as_ref().map(|e| self.bind_expression(e));
                let actual = bound_value.as_ref().map(|e| e.ty()).unwrap_or(Type::Void);
                let expected = self.current_return_type.clone();
                if !actual.convertible_to(&expected) {
                    self.error(
                        *span,
                        format!("expected return type '{expected}', but found '{actual}'"),
                    );
                }
                BoundStatement::Return { value: bound_value, span: *span }
            }
            ast::Statement::If { cond, then_block, else_block, span } => {
                let bound_cond = self.bind_expression(cond);
                if bound_cond.ty() != Type::Bool {
                    self.error(
                        cond.span(),
                        format!("if condition must be 'Bool', but found '{}'", bound_cond.ty()),
                    );
                }
                let then_bound = self.bind_block(then_block);
                let else_bound = else_block.as_ref().map(|b| self.bind_block(b));
                BoundStatement::If {
                    cond: bound_cond,
                    then_block: then_bound,
                    else_block: else_bound,
                    span: *span,
                }
            }
            ast::Statement::While { cond, body, span } => {
                let bound_cond = self.bind_expression(cond);
                if bound_cond.ty() != Type::Bool {
                    self.error(
                        cond.span(),
                        format!("while condition must be 'Bool', but found '{}'", bound_cond.ty()),
                    );
                }
                self.loop_depth += 1;
                let bound_body = self.bind_block(body);
                self.loop_depth -= 1;
                BoundStatement::While { cond: bound_cond, body: bound_body, span: *span }
            }
            ast::Statement::Break(span) => {
                if self.loop_depth == 0 {
                    self.flow_error(*span, "'break' outside of a loop");
                }
                BoundStatement::Break(*span)
            }
            ast::Statement::Continue(span) => {
                if self.loop_depth == 0 {
                    self.flow_error(*span, "'continue' outside of a loop");
                }
                BoundStatement::Continue(*span)
            }
            ast::Statement::ExprStmt(expr) => BoundStatement::ExprStmt(self.bind_expression(expr)),
        }
    }

    fn bind_expression(&mut self, expr: &ast::Expression) -> BoundExpression {
        match expr {
            ast::Expression::IntLit { value, span } => BoundExpression::IntLit { value: *value, span: *span },
            ast::Expression::FloatLit { value, span } => {
                BoundExpression::FloatLit { value: *value, span: *span }
            }
            ast::Expression::StringLit { value, span } => {
                BoundExpression::StringLit { value: value.clone(), span: *span }
            }
            ast::Expression::BoolLit { value, span } => BoundExpression::BoolLit { value: *value, span: *span },
            ast::Expression::IdRef { name, span } => match self.symbols.lookup(name) {
                Some(symbol) => match symbol.as_variable_type() {
                    Some(ty) => {
                        let ty = ty.clone();
                        BoundExpression::VarRef { symbol, ty, span: *span }
                    }
                    None => {
                        self.name_error(*span, format!("'{name}' is not a variable"));
                        BoundExpression::IntLit { value: 0, span: *span }
                    }
                },
                None => {
                    self.name_error(*span, format!("undefined identifier '{name}'"));
                    BoundExpression::IntLit { value: 0, span: *span }
                }
            },
            ast::Expression::BinOp { op, lhs, rhs, span } => self.bind_binop(*op, lhs, rhs, *span),
            ast::Expression::UnaryOp { op, operand, span } => self.bind_unary(*op, operand, *span),
            ast::Expression::Call { callee, args, span } => self.bind_call(callee, args, *span),
            ast::Expression::ArrayLit { elements, span } => self.bind_array_lit(elements, *span),
            ast::Expression::FieldAccess { base, field, span } => self.bind_field_access(base, field, *span),
            ast::Expression::IfExpr { cond, then_block, else_block, span } => {
                self.bind_if_expr(cond, then_block, else_block.as_ref(), *span)
            }
        }
    }

    fn bind_binop(
        &mut self,
        op: BinOp,
        lhs: &ast::Expression,
        rhs: &ast::Expression,
        span: SourceSpan,
    ) -> BoundExpression {
        let bound_lhs = self.bind_expression(lhs);
        let bound_rhs = self.bind_expression(rhs);
        let lhs_ty = bound_lhs.ty();
        let rhs_ty = bound_rhs.ty();

        let (bound_op, ty) = match op {
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Pow => {
                let promoted = promote(&lhs_ty, &rhs_ty);
                if promoted.is_none() {
                    self.error(
                        span,
                        format!("operator cannot be applied to types '{lhs_ty}' and '{rhs_ty}'"),
                    );
                }
                let ty = promoted.unwrap_or(Type::Int);
                (bin_op(op), ty)
            }
            BinOp::Mod => {
                if lhs_ty != Type::Int || rhs_ty != Type::Int {
                    self.error(span, format!("'%' requires Int operands, found '{lhs_ty}' and '{rhs_ty}'"));
                }
                (BoundBinOp::Mod, Type::Int)
            }
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                if !lhs_ty.convertible_to(&rhs_ty) && !rhs_ty.convertible_to(&lhs_ty) {
                    self.error(
                        span,
                        format!("incompatible types for comparison: '{lhs_ty}' and '{rhs_ty}'"),
                    );
                }
                (bin_op(op), Type::Bool)
            }
        };

        BoundExpression::BinOp { op: bound_op, lhs: Box::new(bound_lhs), rhs: Box::new(bound_rhs), ty, span }
    }

    fn bind_unary(&mut self, op: UnaryOp, operand: &ast::Expression, span: SourceSpan) -> BoundExpression {
        let bound_operand = self.bind_expression(operand);
        let operand_ty = bound_operand.ty();

        let (bound_op, ty) = match op {
            UnaryOp::Neg => {
                if !operand_ty.is_numeric() {
                    self.error(span, format!("unary '-' cannot be applied to type '{operand_ty}'"));
                }
                (BoundUnaryOp::Neg, operand_ty.clone())
            }
            UnaryOp::Not => {
                if operand_ty != Type::Bool {
                    self.error(span, format!("unary '!' cannot be applied to type '{operand_ty}'"));
                }
                (BoundUnaryOp::Not, Type::Bool)
            }
            UnaryOp::AddrOf => {
                if !is_addressable(operand) {
                    self.error(span, "operand of '&' must be addressable (a variable or field)");
                }
                (BoundUnaryOp::AddrOf, Type::Pointer(Box::new(operand_ty.clone())))
            }
            UnaryOp::Deref => match &operand_ty {
                Type::Pointer(inner) => (BoundUnaryOp::Deref, (**inner).clone()),
                other => {
                    self.error(span, format!("cannot dereference non-pointer type '{other}'"));
                    (BoundUnaryOp::Deref, Type::Void)
                }
            },
        };

        BoundExpression::UnaryOp { op: bound_op, operand: Box::new(bound_operand), ty, span }
    }

    fn bind_call(&mut self, callee: &str, args: &[ast::Arg], span: SourceSpan) -> BoundExpression {
        let symbol = match self.symbols.lookup(callee) {
            Some(s) => s,
            None => {
                self.name_error(span, format!("undefined function '{callee}'"));
                return BoundExpression::IntLit { value: 0, span };
            }
        };
        let Some((params, return_type, _, is_varargs)) = symbol.as_function() else {
            self.error(span, format!("'{callee}' is not a function"));
            return BoundExpression::IntLit { value: 0, span };
        };
        let params = params.to_vec();
        let return_type = return_type.clone();

        if args.len() != params.len() && !(is_varargs && args.len() >= params.len()) {
            self.error(
                span,
                format!(
                    "function '{}' expects {} argument(s), but found {}",
                    callee,
                    params.len(),
                    args.len()
                ),
            );
        }

        // Resolve named arguments into positional slots when present (Open
        // Question resolution: parser accepts `name = expr`, binder matches
        // by name when given, else by position — see DESIGN.md).
        let mut ordered: Vec<&ast::Arg> = Vec::with_capacity(args.len());
        if args.iter().any(|a| a.name.is_some()) {
            let mut consumed = vec![false; args.len()];
            for param in &params {
                if let Some(idx) = args.iter().position(|a| a.name.as_deref() == Some(param.name.as_str())) {
                    ordered.push(&args[idx]);
                    consumed[idx] = true;
                }
            }
            // Anything left over is either a positional arg beyond the
            // matched names, or a named arg whose name matched no
            // parameter — the latter is a genuine error, not silently
            // dropped.
            for (i, a) in args.iter().enumerate() {
                if consumed[i] {
                    continue;
                }
                if let Some(name) = &a.name {
                    self.error(
                        a.value.span(),
                        format!("function '{callee}' has no parameter named '{name}'"),
                    );
                }
                ordered.push(a);
            }
        } else {
            ordered.extend(args.iter());
        }

        let mut bound_args = Vec::with_capacity(ordered.len());
        for (i, arg) in ordered.iter().enumerate() {
            let bound_arg = self.bind_expression(&arg.value);
            if let Some(param) = params.get(i) {
                if !bound_arg.ty().convertible_to(&param.ty) {
                    self.error(
                        arg.value.span(),
                        format!(
                            "argument {} of '{}' expects type '{}', but found '{}'",
                            i + 1,
                            callee,
                            param.ty,
                            bound_arg.ty()
                        ),
                    );
                }
            }
            bound_args.push(bound_arg);
        }

        BoundExpression::Call { symbol, args: bound_args, ty: return_type, span }
    }

    fn bind_array_lit(&mut self, elements: &[ast::Expression], span: SourceSpan) -> BoundExpression {
        let mut bound_elements = Vec::with_capacity(elements.len());
        let mut element_ty: Option<Type> = None;
        for el in elements {
            let bound_el = self.bind_expression(el);
            match &element_ty {
                None => element_ty = Some(bound_el.ty()),
                Some(expected) => {
                    if !bound_el.ty().convertible_to(expected) {
                        self.error(
                            el.span(),
                            format!(
                                "array elements must have the same type; expected '{expected}', found '{}'",
                                bound_el.ty()
                            ),
                        );
                    }
                }
            }
            bound_elements.push(bound_el);
        }
        let ty = Type::Array(Box::new(element_ty.unwrap_or(Type::Void)), bound_elements.len());
        BoundExpression::ArrayLit { elements: bound_elements, ty, span }
    }

    fn bind_field_access(&mut self, base: &ast::Expression, field: &str, span: SourceSpan) -> BoundExpression {
        let bound_base = self.bind_expression(base);
        let base_ty = bound_base.ty();
        let ty = match &base_ty {
            Type::Record(name, _) => match self.record_fields.get(name).and_then(|fields| {
                fields.iter().find(|f| f.name == field).map(|f| f.ty.clone())
            }) {
                Some(ty) => ty,
                None => {
                    self.error(span, format!("record '{name}' has no field '{field}'"));
                    Type::Void
                }
            },
            other => {
                self.error(span, format!("cannot access field '{field}' on non-record type '{other}'"));
                Type::Void
            }
        };
        BoundExpression::FieldAccess { base: Box::new(bound_base), field: field.to_string(), ty, span }
    }

    fn bind_if_expr(
        &mut self,
        cond: &ast::Expression,
        then_block: &ast::Block,
        else_block: Option<&ast::Block>,
        span: SourceSpan,
    ) -> BoundExpression {
        let bound_cond = self.bind_expression(cond);
        if bound_cond.ty() != Type::Bool {
            self.error(
                cond.span(),
                format!("if condition must be 'Bool', but found '{}'", bound_cond.ty()),
            );
        }

        let (then_bound, then_value) = self.bind_block_as_value(then_block);
        let (else_bound, else_value) = match else_block {
            Some(b) => {
                let (block, value) = self.bind_block_as_value(b);
                (Some(block), value)
            }
            None => (None, None),
        };

        let ty = match (&then_value, &else_value) {
            (Some(t), Some(e)) => {
                if t.ty().convertible_to(&e.ty()) {
                    e.ty()
                } else if e.ty().convertible_to(&t.ty()) {
                    t.ty()
                } else {
                    self.error(
                        span,
                        format!("if-expression arms have incompatible types '{}' and '{}'", t.ty(), e.ty()),
                    );
                    t.ty()
                }
            }
            (Some(_), None) | (None, Some(_)) => {
                self.error(
                    span,
                    "an if-expression with a result must have an 'else' arm with a result",
                );
                Type::Void
            }
            (None, None) => Type::Void,
        };

        BoundExpression::If {
            cond: Box::new(bound_cond),
            then_block: then_bound,
            then_value: then_value.map(Box::new),
            else_block: else_bound,
            else_value: else_value.map(Box::new),
            ty,
            span,
        }
    }
}

fn bin_op(op: BinOp) -> BoundBinOp {
    match op {
        BinOp::Eq => BoundBinOp::Eq,
        BinOp::Ne => BoundBinOp::Ne,
        BinOp::Lt => BoundBinOp::Lt,
        BinOp::Le => BoundBinOp::Le,
        BinOp::Gt => BoundBinOp::Gt,
        BinOp::Ge => BoundBinOp::Ge,
        BinOp::Add => BoundBinOp::Add,
        BinOp::Sub => BoundBinOp::Sub,
        BinOp::Mul => BoundBinOp::Mul,
        BinOp::Div => BoundBinOp::Div,
        BinOp::Mod => BoundBinOp::Mod,
        BinOp::Pow => BoundBinOp::Pow,
    }
}

/// Conservative "does every path through this block end in `return`?"
/// check, used to flag a non-void function whose control flow can fall off
/// the end (spec.md §4.4's last-resort `Ret(0)` is a generator-level
/// well-formedness fallback; the binder is expected to have already
/// rejected the program that needs it).
fn always_returns(block: &BoundBlock) -> bool {
    match block.statements.last() {
        Some(BoundStatement::Return { .. }) => true,
        Some(BoundStatement::If { then_block, else_block: Some(else_block), .. }) => {
            always_returns(then_block) && always_returns(else_block)
        }
        _ => false,
    }
}

fn is_addressable(expr: &ast::Expression) -> bool {
    matches!(expr, ast::Expression::IdRef { .. } | ast::Expression::FieldAccess { .. })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn bind(src: &str) -> (Option<BoundRoot>, DiagnosticEngine) {
        let mut diag = DiagnosticEngine::new();
        let tokens = Lexer::new(src).tokenize(&mut diag);
        let root = Parser::new(tokens, &mut diag).parse_root();
        let bound = Binder::new(&mut diag).bind(&root);
        (bound, diag)
    }

    fn bind_ok(src: &str) -> BoundRoot {
        let (bound, diag) = bind(src);
        assert!(!diag.had_errors(), "unexpected errors: {:?}", diag.diagnostics());
        bound.expect("binder must return Some when no errors were reported")
    }

    #[test]
    fn minimal_function_binds_cleanly() {
        let root = bind_ok("fun main() -> Int { return 42; }");
        assert_eq!(root.functions.len(), 1);
        assert!(root.functions[0].body.is_some());
    }

    #[test]
    fn undefined_identifier_is_a_name_error() {
        let (bound, diag) = bind("fun k() -> Int { return z; }");
        assert!(bound.is_none());
        assert_eq!(diag.error_count(), 1);
        assert_eq!(diag.diagnostics()[0].kind, DiagnosticKind::NameError);
    }

    #[test]
    fn duplicate_function_declaration_is_a_type_error() {
        let (bound, diag) = bind("fun f() -> Int { return 0; } fun f() -> Int { return 1; }");
        assert!(bound.is_none());
        assert!(diag.had_errors());
    }

    #[test]
    fn return_type_mismatch_is_a_type_error() {
        let (bound, diag) = bind("fun g() -> Int { return true; }");
        assert!(bound.is_none());
        assert_eq!(diag.error_count(), 1);
        assert_eq!(diag.diagnostics()[0].kind, DiagnosticKind::TypeError);
    }

    #[test]
    fn int_literal_converts_implicitly_to_float_return() {
        bind_ok("fun f() -> Float { return 1; }");
    }

    #[test]
    fn float_does_not_convert_to_int_return() {
        let (bound, diag) = bind("fun f() -> Int { return 1.5; }");
        assert!(bound.is_none());
        assert!(diag.had_errors());
    }

    #[test]
    fn binop_promotes_int_and_float_to_float() {
        let root = bind_ok("fun p() -> Float { var a: Int = 1; return a + 2.0; }");
        let body = root.functions[0].body.as_ref().unwrap();
        let BoundStatement::Return { value: Some(expr), .. } = body.statements.last().unwrap() else {
            panic!("expected a return statement")
        };
        assert_eq!(expr.ty(), Type::Float);
    }

    #[test]
    fn while_condition_must_be_bool() {
        let (bound, diag) = bind("fun h(n: Int) -> Int { while n { } return n; }");
        assert!(bound.is_none());
        assert_eq!(diag.diagnostics()[0].kind, DiagnosticKind::TypeError);
    }

    #[test]
    fn break_outside_loop_is_a_flow_error() {
        let (bound, diag) = bind("fun f() -> Void { break; }");
        assert!(bound.is_none());
        assert_eq!(diag.diagnostics()[0].kind, DiagnosticKind::FlowError);
    }

    #[test]
    fn continue_inside_while_is_accepted() {
        bind_ok("fun f(n: Int) -> Int { while n < 10 { continue; } return n; }");
    }

    #[test]
    fn shadowing_across_scopes_is_allowed() {
        bind_ok("fun f(x: Int) -> Int { var y: Int = 0; if x < 1 { var x: Int = 2; y = x; } return y; }");
    }

    #[test]
    fn redeclaring_a_name_in_the_same_scope_is_an_error() {
        let (bound, diag) = bind("fun f() -> Int { var x: Int = 1; var x: Int = 2; return x; }");
        assert!(bound.is_none());
        assert!(diag.had_errors());
    }

    #[test]
    fn call_arity_mismatch_is_a_type_error() {
        let (bound, diag) = bind(
            "fun add(a: Int, b: Int) -> Int { return a + b; } \
             fun main() -> Int { return add(1); }",
        );
        assert!(bound.is_none());
        assert!(diag.had_errors());
    }

    #[test]
    fn named_arguments_bind_by_name_regardless_of_order() {
        let root = bind_ok(
            "fun sub(a: Int, b: Int) -> Int { return a - b; } \
             fun main() -> Int { return sub(b = 1, a = 10); }",
        );
        let main_fn = root.functions.iter().find(|f| f.symbol.name() == "main").unwrap();
        let body = main_fn.body.as_ref().unwrap();
        let BoundStatement::Return { value: Some(BoundExpression::Call { args, .. }), .. } =
            &body.statements[0]
        else {
            panic!("expected a call")
        };
        // a = 10, b = 1 regardless of source order.
        assert!(matches!(args[0], BoundExpression::IntLit { value: 10, .. }));
        assert!(matches!(args[1], BoundExpression::IntLit { value: 1, .. }));
    }

    #[test]
    fn mutual_recursion_is_allowed_by_the_two_pass_declaration() {
        bind_ok(
            "fun is_even(n: Int) -> Bool { return n == 0; } \
             fun is_odd(n: Int) -> Bool { return is_even(n); }",
        );
    }

    #[test]
    fn field_access_on_unknown_field_is_an_error() {
        let (bound, diag) = bind(
            "record Point { x: Int, y: Int } \
             fun f(p: Point) -> Int { return p.z; }",
        );
        assert!(bound.is_none());
        assert!(diag.had_errors());
    }

    #[test]
    fn field_access_resolves_declared_field_type() {
        let root = bind_ok(
            "record Point { x: Int, y: Int } \
             fun f(p: Point) -> Int { return p.x; }",
        );
        let f = &root.functions[0];
        let body = f.body.as_ref().unwrap();
        let BoundStatement::Return { value: Some(expr), .. } = &body.statements[0] else {
            panic!()
        };
        assert_eq!(expr.ty(), Type::Int);
    }

    #[test]
    fn if_expression_requires_matching_arm_types() {
        let (bound, diag) = bind(
            "fun f(c: Bool) -> Int { var x: Int = if c { 1 } else { true }; return x; }",
        );
        assert!(bound.is_none());
        assert!(diag.had_errors());
    }

    #[test]
    fn if_expression_without_else_is_rejected_as_an_initializer() {
        let (bound, diag) = bind("fun f(c: Bool) -> Int { var x: Int = if c { 1 }; return x; }");
        assert!(bound.is_none());
        assert!(diag.had_errors());
    }

    #[test]
    fn extern_function_binds_to_a_bodyless_declaration() {
        let root = bind_ok("extern fun puts(s: String) -> Int;");
        assert!(root.functions[0].body.is_none());
    }

    #[test]
    fn address_of_requires_an_addressable_operand() {
        let (bound, diag) = bind("fun f() -> Int { return &1; }");
        assert!(bound.is_none());
        assert!(diag.had_errors());
    }

    #[test]
    fn deref_of_non_pointer_is_an_error() {
        let (bound, diag) = bind("fun f(x: Int) -> Int { return *x; }");
        assert!(bound.is_none());
        assert!(diag.had_errors());
    }

    #[test]
    fn pointer_round_trip_through_addr_of_and_deref() {
        bind_ok("fun f(x: Int) -> Int { var p: &Int = &x; return *p; }");
    }

    #[test]
    fn non_void_function_missing_a_return_on_some_path_is_a_flow_error() {
        let (bound, diag) = bind(
            "fun f(c: Bool) -> Int { if c { return 1; } }",
        );
        assert!(bound.is_none());
        assert_eq!(diag.diagnostics()[0].kind, DiagnosticKind::FlowError);
    }

    #[test]
    fn non_void_function_with_return_on_every_path_is_accepted() {
        bind_ok("fun f(c: Bool) -> Int { if c { return 1; } else { return 2; } }");
    }
}
