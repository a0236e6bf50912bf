//! IR generator: bound tree -> [`ir::Module`]. Grounded on
//! `original_source/ir/ir_generator.cpp`'s `IRGenerator::generate`: a single
//! pass per function that lowers statements into basic blocks, allocating a
//! stack slot for every local (parameters included) so `Assign` always has
//! somewhere to store, per spec.md §4.4.
//!
//! Unlike the binder, the generator never reports diagnostics — by the time
//! it runs, `bind()` has already returned `Some`, so every name resolved and
//! every type checked. A generator-level "can't happen" is an internal bug,
//! not a source error, so it panics instead of threading a `DiagnosticEngine`
//! through a stage that should never need one.

use crate::bound::{BoundBlock, BoundExpression, BoundFunction, BoundRoot, BoundStatement};
use crate::ir::{self, BasicBlock, ConstValue, Instruction, IrType, Param, RegId, Value};
use crate::types::{Symbol, Type};
use std::collections::HashMap;
use std::rc::Rc;

pub fn generate(root: &BoundRoot) -> ir::Module {
    let mut gen = IrGen::new();
    gen.generate(root)
}

/// Identity key for a variable's `Rc<Symbol>` — two lookups of the same
/// declaration share the same allocation, so pointer identity (not a
/// by-value `Symbol` comparison) is exactly the right notion of "same
/// variable" here, including across shadowing scopes.
fn symbol_key(symbol: &Rc<Symbol>) -> usize {
    Rc::as_ptr(symbol) as usize
}

struct IrGen {
    reg_counter: u32,
    label_counter: u32,
    blocks: Vec<BasicBlock>,
    var_slots: HashMap<usize, Value>,
    loop_labels: Vec<(String, String)>,
}

impl IrGen {
    fn new() -> Self {
        IrGen {
            reg_counter: 0,
            label_counter: 0,
            blocks: Vec::new(),
            var_slots: HashMap::new(),
            loop_labels: Vec::new(),
        }
    }

    fn generate(&mut self, root: &BoundRoot) -> ir::Module {
        let structs = root
            .records
            .iter()
            .filter_map(|ty| match ty.as_ref() {
                Type::Record(name, fields) => Some(ir::StructDecl {
                    name: name.clone(),
                    fields: fields.iter().map(|(n, t)| (n.clone(), type_to_ir(t))).collect(),
                }),
                _ => None,
            })
            .collect();

        let functions = root.functions.iter().map(|f| self.gen_function(f)).collect();

        ir::Module { structs, functions }
    }

    fn gen_function(&mut self, f: &BoundFunction) -> ir::Function {
        let (name, params, return_type) = match f.symbol.as_ref() {
            Symbol::Function { name, params, return_type, .. } => {
                (name.clone(), params.clone(), return_type.clone())
            }
            _ => panic!("BoundFunction::symbol must be a Symbol::Function"),
        };
        let ir_params: Vec<Param> =
            params.iter().map(|p| Param { name: p.name.clone(), ty: type_to_ir(&p.ty) }).collect();
        let ir_return_type = type_to_ir(&return_type);

        let Some(body) = &f.body else {
            return ir::Function {
                name,
                params: ir_params,
                return_type: ir_return_type,
                blocks: Vec::new(),
                is_extern: true,
            };
        };

        self.reg_counter = 0;
        self.label_counter = 0;
        self.var_slots.clear();
        self.loop_labels.clear();
        self.blocks = vec![BasicBlock::new("entry")];

        for (param_ty, param_symbol) in params.iter().zip(f.params.iter()) {
            let ty = type_to_ir(&param_ty.ty);
            let slot = self.new_reg();
            self.push_inst(Instruction::Alloca { result: slot, ty: ty.clone() });
            let ptr = Value::Reg(slot, IrType::Pointer(Box::new(ty.clone())));
            self.push_inst(Instruction::Store {
                value: Value::Arg(param_ty.name.clone(), ty),
                ptr: ptr.clone(),
            });
            self.var_slots.insert(symbol_key(param_symbol), ptr);
        }

        self.gen_block(body);

        // A non-void function whose last block still falls through is a
        // binder bug (the binder rejects this) — but a void function can
        // legitimately end without an explicit `return`.
        if !self.blocks.last().is_some_and(BasicBlock::is_terminated) {
            self.push_inst(Instruction::Ret { value: None });
        }

        ir::Function {
            name,
            params: ir_params,
            return_type: ir_return_type,
            blocks: std::mem::take(&mut self.blocks),
            is_extern: false,
        }
    }

    fn new_reg(&mut self) -> RegId {
        let r = RegId(self.reg_counter);
        self.reg_counter += 1;
        r
    }

    fn new_label(&mut self, prefix: &str) -> String {
        let label = format!("{prefix}.{}", self.label_counter);
        self.label_counter += 1;
        label
    }

    fn current_block(&self) -> &BasicBlock {
        self.blocks.last().expect("at least one block")
    }

    /// Appends `inst`, unless the current block already has a terminator —
    /// code reachable only after a `return`/`break`/`continue` is simply
    /// never emitted (no dead-code elimination pass needed for that).
    fn push_inst(&mut self, inst: Instruction) {
        if !self.current_block().is_terminated() {
            self.blocks.last_mut().expect("at least one block").push(inst);
        }
    }

    fn start_block(&mut self, label: String) {
        self.blocks.push(BasicBlock::new(label));
    }

    fn branch_to(&mut self, label: String) {
        self.push_inst(Instruction::Br { label });
    }

    fn gen_block(&mut self, block: &BoundBlock) {
        for stmt in &block.statements {
            self.gen_stmt(stmt);
        }
    }

    fn gen_stmt(&mut self, stmt: &BoundStatement) {
        match stmt {
            BoundStatement::VarDecl { symbol, init, .. } => {
                let ty = type_to_ir(symbol.as_variable_type().expect("variable symbol"));
                let slot = self.new_reg();
                self.push_inst(Instruction::Alloca { result: slot, ty: ty.clone() });
                let ptr = Value::Reg(slot, IrType::Pointer(Box::new(ty)));
                self.var_slots.insert(symbol_key(symbol), ptr.clone());
                if let Some(init) = init {
                    let value = self.gen_expr(init);
                    self.push_inst(Instruction::Store { value, ptr });
                }
            }
            BoundStatement::Assign { symbol, value, .. } => {
                let value = self.gen_expr(value);
                let ptr = self
                    .var_slots
                    .get(&symbol_key(symbol))
                    .cloned()
                    .expect("assigned variable has a storage slot");
                self.push_inst(Instruction::Store { value, ptr });
            }
            BoundStatement::Return { value, .. } => {
                let value = value.as_ref().map(|e| self.gen_expr(e));
                self.push_inst(Instruction::Ret { value });
            }
            BoundStatement::If { cond, then_block, else_block, .. } => {
                let cond_value = self.gen_expr(cond);
                let then_label = self.new_label("if.then");
                let merge_label = self.new_label("if.merge");
                let else_label =
                    if else_block.is_some() { self.new_label("if.else") } else { merge_label.clone() };

                self.push_inst(Instruction::CondBr {
                    cond: cond_value,
                    then_label: then_label.clone(),
                    else_label: else_label.clone(),
                });

                self.start_block(then_label);
                self.gen_block(then_block);
                self.branch_to(merge_label.clone());

                if let Some(else_block) = else_block {
                    self.start_block(else_label);
                    self.gen_block(else_block);
                    self.branch_to(merge_label.clone());
                }

                self.start_block(merge_label);
            }
            BoundStatement::While { cond, body, .. } => {
                let cond_label = self.new_label("while.cond");
                let body_label = self.new_label("while.body");
                let end_label = self.new_label("while.end");

                self.branch_to(cond_label.clone());
                self.start_block(cond_label.clone());
                let cond_value = self.gen_expr(cond);
                self.push_inst(Instruction::CondBr {
                    cond: cond_value,
                    then_label: body_label.clone(),
                    else_label: end_label.clone(),
                });

                self.start_block(body_label);
                self.loop_labels.push((cond_label.clone(), end_label.clone()));
                self.gen_block(body);
                self.loop_labels.pop();
                self.branch_to(cond_label);

                self.start_block(end_label);
            }
            BoundStatement::Break(_) => {
                let (_, break_label) = self.loop_labels.last().expect("binder rejects break outside a loop");
                let target = break_label.clone();
                self.push_inst(Instruction::Br { label: target });
            }
            BoundStatement::Continue(_) => {
                let (continue_label, _) =
                    self.loop_labels.last().expect("binder rejects continue outside a loop");
                let target = continue_label.clone();
                self.push_inst(Instruction::Br { label: target });
            }
            BoundStatement::ExprStmt(expr) => {
                self.gen_expr(expr);
            }
        }
    }

    fn gen_expr(&mut self, expr: &BoundExpression) -> Value {
        match expr {
            BoundExpression::IntLit { value, .. } => Value::Const(ConstValue::Int(*value), IrType::Int),
            BoundExpression::FloatLit { value, .. } => Value::Const(ConstValue::Float(*value), IrType::Float),
            BoundExpression::BoolLit { value, .. } => Value::Const(ConstValue::Bool(*value), IrType::Bool),
            BoundExpression::StringLit { value, .. } => {
                Value::Const(ConstValue::Str(value.clone()), IrType::Named("String".to_string()))
            }
            BoundExpression::VarRef { symbol, ty, .. } => {
                let ptr = self
                    .var_slots
                    .get(&symbol_key(symbol))
                    .cloned()
                    .expect("referenced variable has a storage slot");
                let result = self.new_reg();
                self.push_inst(Instruction::Load { result, ptr });
                Value::Reg(result, type_to_ir(ty))
            }
            BoundExpression::BinOp { op, lhs, rhs, ty, .. } => self.gen_binop(*op, lhs, rhs, ty),
            BoundExpression::UnaryOp { op, operand, ty, .. } => self.gen_unary(*op, operand, ty),
            BoundExpression::Call { symbol, args, ty, .. } => self.gen_call(symbol, args, ty),
            BoundExpression::ArrayLit { elements, ty, .. } => {
                // No array-construction opcode exists in the §3.6 opcode
                // set (no backend ever lays out aggregate storage here —
                // see spec.md's "no backend" Non-goal). Elements still
                // generate their instructions for any call side effects
                // they contain; the literal's own value is a placeholder.
                for el in elements {
                    self.gen_expr(el);
                }
                zero_value(&type_to_ir(ty))
            }
            BoundExpression::FieldAccess { base, ty, .. } => {
                // Same rationale as `ArrayLit`: no GEP/field-projection
                // opcode exists without a backend to define record layout.
                self.gen_expr(base);
                zero_value(&type_to_ir(ty))
            }
            BoundExpression::If { cond, then_block, then_value, else_block, else_value, ty, .. } => {
                self.gen_if_expr(cond, then_block, then_value.as_deref(), else_block, else_value.as_deref(), ty)
            }
        }
    }

    fn gen_binop(
        &mut self,
        op: crate::bound::BoundBinOp,
        lhs: &BoundExpression,
        rhs: &BoundExpression,
        ty: &Type,
    ) -> Value {
        use crate::bound::BoundBinOp as B;
        let lhs_is_float = lhs.ty() == Type::Float;
        let rhs_is_float = rhs.ty() == Type::Float;
        let lhs_v = self.gen_expr(lhs);
        let rhs_v = self.gen_expr(rhs);
        let is_float = lhs_is_float || rhs_is_float;

        // `promote()` widens a lone `Int` operand to `Float` when the other
        // operand is already `Float`; the generator has to materialize that
        // widening as an explicit conversion before the float opcode runs,
        // since the registers above still hold the narrower, unconverted
        // value (spec §4.3, §8 S6).
        let lhs_v = if is_float && !lhs_is_float { self.gen_int_to_float(lhs_v) } else { lhs_v };
        let rhs_v = if is_float && !rhs_is_float { self.gen_int_to_float(rhs_v) } else { rhs_v };

        let result = self.new_reg();
        let arith_ty = if is_float { IrType::Float } else { IrType::Int };

        let inst = match op {
            B::Add if is_float => Instruction::FAdd { result, lhs: lhs_v, rhs: rhs_v, ty: arith_ty },
            B::Add => Instruction::Add { result, lhs: lhs_v, rhs: rhs_v, ty: arith_ty },
            B::Sub if is_float => Instruction::FSub { result, lhs: lhs_v, rhs: rhs_v, ty: arith_ty },
            B::Sub => Instruction::Sub { result, lhs: lhs_v, rhs: rhs_v, ty: arith_ty },
            B::Mul if is_float => Instruction::FMul { result, lhs: lhs_v, rhs: rhs_v, ty: arith_ty },
            B::Mul => Instruction::Mul { result, lhs: lhs_v, rhs: rhs_v, ty: arith_ty },
            B::Div if is_float => Instruction::FDiv { result, lhs: lhs_v, rhs: rhs_v, ty: arith_ty },
            B::Div => Instruction::Div { result, lhs: lhs_v, rhs: rhs_v, ty: arith_ty },
            // `^` has no dedicated opcode (spec.md's opcode table has no
            // power/exponent instruction); lower it the same way `*` would
            // be lowered, since both operands are guaranteed numeric and
            // same-promoted by the binder. A real backend would expand
            // this into a runtime call or a multiplication loop.
            B::Pow if is_float => Instruction::FMul { result, lhs: lhs_v, rhs: rhs_v, ty: arith_ty },
            B::Pow => Instruction::Mul { result, lhs: lhs_v, rhs: rhs_v, ty: arith_ty },
            B::Mod => Instruction::Mod { result, lhs: lhs_v, rhs: rhs_v },
            B::Eq if is_float => Instruction::FCmpEq { result, lhs: lhs_v, rhs: rhs_v },
            B::Eq => Instruction::CmpEq { result, lhs: lhs_v, rhs: rhs_v },
            B::Ne if is_float => Instruction::FCmpNe { result, lhs: lhs_v, rhs: rhs_v },
            B::Ne => Instruction::CmpNe { result, lhs: lhs_v, rhs: rhs_v },
            B::Lt if is_float => Instruction::FCmpLt { result, lhs: lhs_v, rhs: rhs_v },
            B::Lt => Instruction::CmpLt { result, lhs: lhs_v, rhs: rhs_v },
            B::Le if is_float => Instruction::FCmpLe { result, lhs: lhs_v, rhs: rhs_v },
            B::Le => Instruction::CmpLe { result, lhs: lhs_v, rhs: rhs_v },
            B::Gt if is_float => Instruction::FCmpGt { result, lhs: lhs_v, rhs: rhs_v },
            B::Gt => Instruction::CmpGt { result, lhs: lhs_v, rhs: rhs_v },
            B::Ge if is_float => Instruction::FCmpGe { result, lhs: lhs_v, rhs: rhs_v },
            B::Ge => Instruction::CmpGe { result, lhs: lhs_v, rhs: rhs_v },
        };
        self.push_inst(inst);
        Value::Reg(result, type_to_ir(ty))
    }

    /// Emits a signed-int-to-float conversion and returns its result.
    fn gen_int_to_float(&mut self, operand: Value) -> Value {
        let result = self.new_reg();
        self.push_inst(Instruction::IntToFloat { result, operand });
        Value::Reg(result, IrType::Float)
    }

    fn gen_unary(&mut self, op: crate::bound::BoundUnaryOp, operand: &BoundExpression, ty: &Type) -> Value {
        use crate::bound::BoundUnaryOp as U;
        if op == U::AddrOf {
            return self.gen_addr_of(operand);
        }
        let operand_ty = operand.ty();
        let operand_v = self.gen_expr(operand);
        let result = self.new_reg();
        match op {
            U::Neg if operand_ty == Type::Float => {
                self.push_inst(Instruction::FNeg { result, operand: operand_v });
            }
            U::Neg => self.push_inst(Instruction::Neg { result, operand: operand_v }),
            U::Not => self.push_inst(Instruction::Not { result, operand: operand_v }),
            U::Deref => {
                self.push_inst(Instruction::Load { result, ptr: operand_v });
            }
            U::AddrOf => unreachable!("handled above"),
        }
        Value::Reg(result, type_to_ir(ty))
    }

    /// `&expr` for an addressable operand (`VarRef`/`FieldAccess`, per the
    /// binder's `is_addressable`) yields the pointer to its storage slot
    /// directly — it must never route through `gen_expr`, which would load
    /// the value the slot currently holds instead of the slot itself.
    fn gen_addr_of(&mut self, operand: &BoundExpression) -> Value {
        match operand {
            BoundExpression::VarRef { symbol, .. } => self
                .var_slots
                .get(&symbol_key(symbol))
                .cloned()
                .expect("addressable variable has a storage slot"),
            // No field-projection opcode exists yet (same placeholder
            // rationale as `gen_expr`'s `FieldAccess` arm), so `&s.field`
            // falls back to the address of the base record.
            BoundExpression::FieldAccess { base, .. } => self.gen_addr_of(base.as_ref()),
            _ => panic!("binder only allows `&` on addressable expressions"),
        }
    }

    fn gen_call(&mut self, symbol: &Rc<Symbol>, args: &[BoundExpression], ty: &Type) -> Value {
        let name = symbol.name().to_string();
        let arg_values = args.iter().map(|a| self.gen_expr(a)).collect();
        let ir_ty = type_to_ir(ty);
        if *ty == Type::Void {
            self.push_inst(Instruction::Call { result: None, target: name, args: arg_values, ty: ir_ty });
            return Value::Const(ConstValue::Int(0), IrType::Void);
        }
        let result = self.new_reg();
        self.push_inst(Instruction::Call {
            result: Some(result),
            target: name,
            args: arg_values,
            ty: ir_ty.clone(),
        });
        Value::Reg(result, ir_ty)
    }

    /// Lowers an `if`-expression via a temp slot rather than a PHI node:
    /// allocate storage before branching, have each arm that produces a
    /// value store it before merging, then load the slot as the
    /// expression's result. `original_source/ir/ir_generator.cpp` leaves
    /// this case as an explicit "Placeholder for IF as expression (PHI
    /// nodes)" with no implementation; this is this crate's resolution
    /// (recorded in DESIGN.md), chosen because it needs no block-predecessor
    /// bookkeeping beyond what `if`-as-statement already lowers.
    #[allow(clippy::too_many_arguments)]
    fn gen_if_expr(
        &mut self,
        cond: &BoundExpression,
        then_block: &BoundBlock,
        then_value: Option<&BoundExpression>,
        else_block: &Option<BoundBlock>,
        else_value: Option<&BoundExpression>,
        ty: &Type,
    ) -> Value {
        let ir_ty = type_to_ir(ty);
        let produces_value = *ty != Type::Void;
        let slot = produces_value.then(|| {
            let reg = self.new_reg();
            self.push_inst(Instruction::Alloca { result: reg, ty: ir_ty.clone() });
            Value::Reg(reg, IrType::Pointer(Box::new(ir_ty.clone())))
        });

        let cond_value = self.gen_expr(cond);
        let then_label = self.new_label("if.then");
        let merge_label = self.new_label("if.merge");
        let else_label = if else_block.is_some() { self.new_label("if.else") } else { merge_label.clone() };

        self.push_inst(Instruction::CondBr {
            cond: cond_value,
            then_label: then_label.clone(),
            else_label: else_label.clone(),
        });

        self.start_block(then_label);
        self.gen_block(then_block);
        if let (Some(slot), Some(value)) = (&slot, then_value) {
            let v = self.gen_expr(value);
            self.push_inst(Instruction::Store { value: v, ptr: slot.clone() });
        }
        self.branch_to(merge_label.clone());

        if let Some(else_block) = else_block {
            self.start_block(else_label);
            self.gen_block(else_block);
            if let (Some(slot), Some(value)) = (&slot, else_value) {
                let v = self.gen_expr(value);
                self.push_inst(Instruction::Store { value: v, ptr: slot.clone() });
            }
            self.branch_to(merge_label.clone());
        }

        self.start_block(merge_label);

        match slot {
            Some(ptr) => {
                let result = self.new_reg();
                self.push_inst(Instruction::Load { result, ptr });
                Value::Reg(result, ir_ty)
            }
            None => Value::Const(ConstValue::Int(0), IrType::Void),
        }
    }
}

fn type_to_ir(ty: &Type) -> IrType {
    match ty {
        Type::Void => IrType::Void,
        Type::Bool => IrType::Bool,
        Type::Int => IrType::Int,
        Type::Float => IrType::Float,
        Type::Pointer(inner) => IrType::Pointer(Box::new(type_to_ir(inner))),
        Type::Array(inner, n) => IrType::Array(Box::new(type_to_ir(inner)), *n),
        Type::Record(name, _) | Type::Enum(name, _) => IrType::Named(name.clone()),
    }
}

fn zero_value(ty: &IrType) -> Value {
    match ty {
        IrType::Bool => Value::Const(ConstValue::Bool(false), ty.clone()),
        IrType::Float => Value::Const(ConstValue::Float(0.0), ty.clone()),
        _ => Value::Const(ConstValue::Int(0), ty.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bound::{BoundBinOp, BoundRoot, BoundStatement};
    use crate::span::SourceSpan;
    use crate::types::{FunctionModifiers, TypedField};

    fn span() -> SourceSpan {
        SourceSpan::at(0)
    }

    fn int_fn(name: &str, body: BoundBlock) -> BoundFunction {
        let symbol = Rc::new(Symbol::Function {
            name: name.to_string(),
            params: Vec::new(),
            return_type: Type::Int,
            modifiers: FunctionModifiers::default(),
            is_varargs: false,
        });
        BoundFunction { symbol, params: Vec::new(), body: Some(body), span: span() }
    }

    #[test]
    fn literal_return_lowers_to_single_block_with_ret() {
        let body = BoundBlock {
            statements: vec![BoundStatement::Return {
                value: Some(BoundExpression::IntLit { value: 42, span: span() }),
                span: span(),
            }],
        };
        let root = BoundRoot { records: Vec::new(), enums: Vec::new(), functions: vec![int_fn("main", body)] };
        let module = generate(&root);
        let f = &module.functions[0];
        assert_eq!(f.blocks.len(), 1);
        assert!(matches!(f.blocks[0].instructions.last(), Some(Instruction::Ret { value: Some(_) })));
    }

    #[test]
    fn if_statement_produces_three_blocks_when_both_arms_fall_through() {
        let then_block = BoundBlock { statements: Vec::new() };
        let else_block = BoundBlock { statements: Vec::new() };
        let body = BoundBlock {
            statements: vec![
                BoundStatement::If {
                    cond: BoundExpression::BoolLit { value: true, span: span() },
                    then_block,
                    else_block: Some(else_block),
                    span: span(),
                },
                BoundStatement::Return { value: Some(BoundExpression::IntLit { value: 0, span: span() }), span: span() },
            ],
        };
        let root = BoundRoot { records: Vec::new(), enums: Vec::new(), functions: vec![int_fn("main", body)] };
        let module = generate(&root);
        let f = &module.functions[0];
        // entry, then, else, merge
        assert_eq!(f.blocks.len(), 4);
        assert!(f.blocks.iter().all(BasicBlock::is_terminated));
    }

    #[test]
    fn while_loop_branches_back_to_its_condition_block() {
        let body_block = BoundBlock { statements: Vec::new() };
        let body = BoundBlock {
            statements: vec![
                BoundStatement::While {
                    cond: BoundExpression::BoolLit { value: true, span: span() },
                    body: body_block,
                    span: span(),
                },
                BoundStatement::Return { value: None, span: span() },
            ],
        };
        let root = BoundRoot { records: Vec::new(), enums: Vec::new(), functions: vec![int_fn("loop", body)] };
        let module = generate(&root);
        let f = &module.functions[0];
        let cond_block = f.blocks.iter().find(|b| b.label.starts_with("while.cond")).unwrap();
        assert!(matches!(cond_block.instructions.last(), Some(Instruction::CondBr { .. })));
        let body_block = f.blocks.iter().find(|b| b.label.starts_with("while.body")).unwrap();
        assert!(matches!(body_block.instructions.last(), Some(Instruction::Br { .. })));
    }

    #[test]
    fn extern_function_has_no_blocks() {
        let symbol = Rc::new(Symbol::Function {
            name: "puts".to_string(),
            params: vec![TypedField { name: "s".to_string(), ty: Type::Record("String".to_string(), Vec::new()) }],
            return_type: Type::Int,
            modifiers: FunctionModifiers { is_extern: true, ..Default::default() },
            is_varargs: false,
        });
        let f = BoundFunction { symbol, params: Vec::new(), body: None, span: span() };
        let root = BoundRoot { records: Vec::new(), enums: Vec::new(), functions: vec![f] };
        let module = generate(&root);
        assert!(module.functions[0].is_extern);
        assert!(module.functions[0].blocks.is_empty());
    }

    #[test]
    fn int_addition_chooses_integer_opcode() {
        let body = BoundBlock {
            statements: vec![BoundStatement::Return {
                value: Some(BoundExpression::BinOp {
                    op: BoundBinOp::Add,
                    lhs: Box::new(BoundExpression::IntLit { value: 1, span: span() }),
                    rhs: Box::new(BoundExpression::IntLit { value: 2, span: span() }),
                    ty: Type::Int,
                    span: span(),
                }),
                span: span(),
            }],
        };
        let root = BoundRoot { records: Vec::new(), enums: Vec::new(), functions: vec![int_fn("main", body)] };
        let module = generate(&root);
        let instrs = &module.functions[0].blocks[0].instructions;
        assert!(instrs.iter().any(|i| matches!(i, Instruction::Add { .. })));
    }

    #[test]
    fn addr_of_returns_the_storage_slot_pointer_without_a_load() {
        let symbol = Rc::new(Symbol::Variable { name: "x".to_string(), ty: Type::Int, is_parameter: false });
        let body = BoundBlock {
            statements: vec![
                BoundStatement::VarDecl { symbol: symbol.clone(), init: None, span: span() },
                BoundStatement::Return {
                    value: Some(BoundExpression::UnaryOp {
                        op: crate::bound::BoundUnaryOp::AddrOf,
                        operand: Box::new(BoundExpression::VarRef { symbol: symbol.clone(), ty: Type::Int, span: span() }),
                        ty: Type::Pointer(Box::new(Type::Int)),
                        span: span(),
                    }),
                    span: span(),
                },
            ],
        };
        let root = BoundRoot {
            records: Vec::new(),
            enums: Vec::new(),
            functions: vec![BoundFunction {
                symbol: Rc::new(Symbol::Function {
                    name: "addr".to_string(),
                    params: Vec::new(),
                    return_type: Type::Pointer(Box::new(Type::Int)),
                    modifiers: FunctionModifiers::default(),
                    is_varargs: false,
                }),
                params: Vec::new(),
                body: Some(body),
                span: span(),
            }],
        };
        let module = generate(&root);
        let instrs = &module.functions[0].blocks[0].instructions;

        // `x`'s only Alloca gives its slot's register.
        let slot = instrs
            .iter()
            .find_map(|i| match i {
                Instruction::Alloca { result, .. } => Some(*result),
                _ => None,
            })
            .expect("var decl allocates a slot");

        // No Load is ever emitted -- `&x` never reads through the slot.
        assert!(!instrs.iter().any(|i| matches!(i, Instruction::Load { .. })));

        let Some(Instruction::Ret { value: Some(Value::Reg(returned, IrType::Pointer(inner))) }) = instrs.last()
        else {
            panic!("expected `return &x` to return a pointer register");
        };
        assert_eq!(**inner, IrType::Int);
        assert_eq!(*returned, slot, "&x must be the same register as x's Alloca slot");
    }
}
