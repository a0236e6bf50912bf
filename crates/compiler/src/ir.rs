//! Three-address, basic-block-structured IR produced by [`crate::irgen`].
//!
//! Grounded on `original_source/ir/ir.hpp`'s `IRModule`/`IRFunction`/
//! `IRBasicBlock`/`IRValue`/`IRInstruction`, translated from the C++
//! wide-struct (one `IRInstruction` carrying every field for every opcode)
//! into a Rust tagged-variant `enum Instruction` per spec.md §9's "Visitor
//! pattern -> tagged variants" design note: each opcode variant here carries
//! only the operands it actually needs.

use std::fmt;

/// A type as it appears in the IR: a flattened, backend-facing projection of
/// [`crate::types::Type`] (record/enum field lists are dropped — the IR only
/// needs to name them, not re-describe their layout).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IrType {
    Void,
    Bool,
    Int,
    Float,
    Pointer(Box<IrType>),
    Array(Box<IrType>, usize),
    Named(String),
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrType::Void => write!(f, "void"),
            IrType::Bool => write!(f, "i1"),
            IrType::Int => write!(f, "i64"),
            IrType::Float => write!(f, "f64"),
            IrType::Pointer(inner) => write!(f, "*{inner}"),
            IrType::Array(inner, n) => write!(f, "[{n}]{inner}"),
            IrType::Named(name) => write!(f, "{name}"),
        }
    }
}

/// An SSA-style virtual register id, unique within its owning function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegId(pub u32);

impl fmt::Display for RegId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Int(v) => write!(f, "{v}"),
            ConstValue::Float(v) => write!(f, "{v}"),
            ConstValue::Bool(v) => write!(f, "{v}"),
            ConstValue::Str(v) => write!(f, "{v:?}"),
        }
    }
}

/// A value: a virtual register, a constant, or an argument handle.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Reg(RegId, IrType),
    Const(ConstValue, IrType),
    Arg(String, IrType),
}

impl Value {
    pub fn ty(&self) -> &IrType {
        match self {
            Value::Reg(_, t) | Value::Const(_, t) | Value::Arg(_, t) => t,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Reg(id, _) => write!(f, "{id}"),
            Value::Const(c, _) => write!(f, "{c}"),
            Value::Arg(name, _) => write!(f, "%{name}"),
        }
    }
}

/// One instruction opcode per spec.md §3.6. Integer vs. floating variants
/// (`Add` vs. `FAdd`, `CmpLt` vs. `FCmpLt`) are selected by the IR generator
/// at lowering time, based on the bound expression's operand type.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Alloca { result: RegId, ty: IrType },
    Load { result: RegId, ptr: Value },
    Store { value: Value, ptr: Value },

    Add { result: RegId, lhs: Value, rhs: Value, ty: IrType },
    FAdd { result: RegId, lhs: Value, rhs: Value, ty: IrType },
    Sub { result: RegId, lhs: Value, rhs: Value, ty: IrType },
    FSub { result: RegId, lhs: Value, rhs: Value, ty: IrType },
    Mul { result: RegId, lhs: Value, rhs: Value, ty: IrType },
    FMul { result: RegId, lhs: Value, rhs: Value, ty: IrType },
    Div { result: RegId, lhs: Value, rhs: Value, ty: IrType },
    FDiv { result: RegId, lhs: Value, rhs: Value, ty: IrType },
    Mod { result: RegId, lhs: Value, rhs: Value },
    And { result: RegId, lhs: Value, rhs: Value },
    Or { result: RegId, lhs: Value, rhs: Value },
    Xor { result: RegId, lhs: Value, rhs: Value },
    Shl { result: RegId, lhs: Value, rhs: Value },
    Shr { result: RegId, lhs: Value, rhs: Value },

    /// Signed-int-to-float widening conversion, inserted by the IR generator
    /// ahead of a float opcode whenever one arithmetic operand promoted from
    /// `Int` to `Float` and the other started out `Float` (spec §4.3, §8 S6).
    IntToFloat { result: RegId, operand: Value },

    CmpEq { result: RegId, lhs: Value, rhs: Value },
    FCmpEq { result: RegId, lhs: Value, rhs: Value },
    CmpNe { result: RegId, lhs: Value, rhs: Value },
    FCmpNe { result: RegId, lhs: Value, rhs: Value },
    CmpLt { result: RegId, lhs: Value, rhs: Value },
    FCmpLt { result: RegId, lhs: Value, rhs: Value },
    CmpLe { result: RegId, lhs: Value, rhs: Value },
    FCmpLe { result: RegId, lhs: Value, rhs: Value },
    CmpGt { result: RegId, lhs: Value, rhs: Value },
    FCmpGt { result: RegId, lhs: Value, rhs: Value },
    CmpGe { result: RegId, lhs: Value, rhs: Value },
    FCmpGe { result: RegId, lhs: Value, rhs: Value },

    Neg { result: RegId, operand: Value },
    FNeg { result: RegId, operand: Value },
    Not { result: RegId, operand: Value },

    Call { result: Option<RegId>, target: String, args: Vec<Value>, ty: IrType },

    Ret { value: Option<Value> },
    Br { label: String },
    CondBr { cond: Value, then_label: String, else_label: String },
}

impl Instruction {
    /// The register this instruction defines, if any — used by the
    /// register-uniqueness property (§8.5).
    pub fn result_reg(&self) -> Option<RegId> {
        use Instruction::*;
        match self {
            Alloca { result, .. }
            | Load { result, .. }
            | Add { result, .. }
            | FAdd { result, .. }
            | Sub { result, .. }
            | FSub { result, .. }
            | Mul { result, .. }
            | FMul { result, .. }
            | Div { result, .. }
            | FDiv { result, .. }
            | Mod { result, .. }
            | And { result, .. }
            | Or { result, .. }
            | Xor { result, .. }
            | Shl { result, .. }
            | Shr { result, .. }
            | CmpEq { result, .. }
            | FCmpEq { result, .. }
            | CmpNe { result, .. }
            | FCmpNe { result, .. }
            | CmpLt { result, .. }
            | FCmpLt { result, .. }
            | CmpLe { result, .. }
            | FCmpLe { result, .. }
            | CmpGt { result, .. }
            | FCmpGt { result, .. }
            | CmpGe { result, .. }
            | FCmpGe { result, .. }
            | Neg { result, .. }
            | FNeg { result, .. }
            | Not { result, .. }
            | IntToFloat { result, .. } => Some(*result),
            Call { result, .. } => *result,
            Store { .. } | Ret { .. } | Br { .. } | CondBr { .. } => None,
        }
    }

    /// True for the three terminator opcodes (`Ret`, `Br`, `CondBr`).
    pub fn is_terminator(&self) -> bool {
        matches!(self, Instruction::Ret { .. } | Instruction::Br { .. } | Instruction::CondBr { .. })
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;
        match self {
            Alloca { result, ty } => write!(f, "{result}:*{ty} = alloca {ty}"),
            Load { result, ptr } => write!(f, "{result}:{} = load {ptr}", ptr_pointee(ptr)),
            Store { value, ptr } => write!(f, "store {value}, {ptr}"),
            Add { result, lhs, rhs, ty } => write!(f, "{result}:{ty} = add {lhs}, {rhs}"),
            FAdd { result, lhs, rhs, ty } => write!(f, "{result}:{ty} = fadd {lhs}, {rhs}"),
            Sub { result, lhs, rhs, ty } => write!(f, "{result}:{ty} = sub {lhs}, {rhs}"),
            FSub { result, lhs, rhs, ty } => write!(f, "{result}:{ty} = fsub {lhs}, {rhs}"),
            Mul { result, lhs, rhs, ty } => write!(f, "{result}:{ty} = mul {lhs}, {rhs}"),
            FMul { result, lhs, rhs, ty } => write!(f, "{result}:{ty} = fmul {lhs}, {rhs}"),
            Div { result, lhs, rhs, ty } => write!(f, "{result}:{ty} = div {lhs}, {rhs}"),
            FDiv { result, lhs, rhs, ty } => write!(f, "{result}:{ty} = fdiv {lhs}, {rhs}"),
            Mod { result, lhs, rhs } => write!(f, "{result}:{} = mod {lhs}, {rhs}", lhs.ty()),
            And { result, lhs, rhs } => write!(f, "{result}:{} = and {lhs}, {rhs}", lhs.ty()),
            Or { result, lhs, rhs } => write!(f, "{result}:{} = or {lhs}, {rhs}", lhs.ty()),
            Xor { result, lhs, rhs } => write!(f, "{result}:{} = xor {lhs}, {rhs}", lhs.ty()),
            Shl { result, lhs, rhs } => write!(f, "{result}:{} = shl {lhs}, {rhs}", lhs.ty()),
            Shr { result, lhs, rhs } => write!(f, "{result}:{} = shr {lhs}, {rhs}", lhs.ty()),
            CmpEq { result, lhs, rhs } => write!(f, "{result}:i1 = icmp_eq {lhs}, {rhs}"),
            FCmpEq { result, lhs, rhs } => write!(f, "{result}:i1 = fcmp_eq {lhs}, {rhs}"),
            CmpNe { result, lhs, rhs } => write!(f, "{result}:i1 = icmp_ne {lhs}, {rhs}"),
            FCmpNe { result, lhs, rhs } => write!(f, "{result}:i1 = fcmp_ne {lhs}, {rhs}"),
            CmpLt { result, lhs, rhs } => write!(f, "{result}:i1 = icmp_lt {lhs}, {rhs}"),
            FCmpLt { result, lhs, rhs } => write!(f, "{result}:i1 = fcmp_lt {lhs}, {rhs}"),
            CmpLe { result, lhs, rhs } => write!(f, "{result}:i1 = icmp_le {lhs}, {rhs}"),
            FCmpLe { result, lhs, rhs } => write!(f, "{result}:i1 = fcmp_le {lhs}, {rhs}"),
            CmpGt { result, lhs, rhs } => write!(f, "{result}:i1 = icmp_gt {lhs}, {rhs}"),
            FCmpGt { result, lhs, rhs } => write!(f, "{result}:i1 = fcmp_gt {lhs}, {rhs}"),
            CmpGe { result, lhs, rhs } => write!(f, "{result}:i1 = icmp_ge {lhs}, {rhs}"),
            FCmpGe { result, lhs, rhs } => write!(f, "{result}:i1 = fcmp_ge {lhs}, {rhs}"),
            Neg { result, operand } => write!(f, "{result}:{} = neg {operand}", operand.ty()),
            FNeg { result, operand } => write!(f, "{result}:{} = fneg {operand}", operand.ty()),
            Not { result, operand } => write!(f, "{result}:i1 = not {operand}"),
            IntToFloat { result, operand } => write!(f, "{result}:f64 = sitofp {operand}"),
            Call { result, target, args, ty } => {
                let arg_list = args.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
                match result {
                    Some(r) => write!(f, "{r}:{ty} = call {target}({arg_list})"),
                    None => write!(f, "call {target}({arg_list})"),
                }
            }
            Ret { value: Some(v) } => write!(f, "ret {v}"),
            Ret { value: None } => write!(f, "ret"),
            Br { label } => write!(f, "br {label}"),
            CondBr { cond, then_label, else_label } => {
                write!(f, "condbr {cond}, {then_label}, {else_label}")
            }
        }
    }
}

fn ptr_pointee(ptr: &Value) -> String {
    match ptr.ty() {
        IrType::Pointer(inner) => inner.to_string(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct BasicBlock {
    pub label: String,
    pub instructions: Vec<Instruction>,
}

impl BasicBlock {
    pub fn new(label: impl Into<String>) -> Self {
        BasicBlock { label: label.into(), instructions: Vec::new() }
    }

    pub fn push(&mut self, inst: Instruction) {
        self.instructions.push(inst);
    }

    /// True once the block ends in a terminator — used by the IR generator
    /// to avoid appending a second branch after an early `return` (§4.4).
    pub fn is_terminated(&self) -> bool {
        self.instructions.last().is_some_and(Instruction::is_terminator)
    }
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub ty: IrType,
}

#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: IrType,
    pub blocks: Vec<BasicBlock>,
    /// `true` for a declaration-only (`extern`) function: no basic blocks,
    /// an unambiguous "this is an external symbol" signal for the backend.
    pub is_extern: bool,
}

impl Function {
    pub fn entry(&self) -> Option<&BasicBlock> {
        self.blocks.first()
    }
}

#[derive(Debug, Clone)]
pub struct StructDecl {
    pub name: String,
    pub fields: Vec<(String, IrType)>,
}

#[derive(Debug, Clone, Default)]
pub struct Module {
    pub structs: Vec<StructDecl>,
    pub functions: Vec<Function>,
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for s in &self.structs {
            let fields = s
                .fields
                .iter()
                .map(|(name, ty)| format!("{name}: {ty}"))
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(f, "struct {} {{ {} }}", s.name, fields)?;
        }
        if !self.structs.is_empty() {
            writeln!(f)?;
        }
        for (i, func) in self.functions.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            let params = func
                .params
                .iter()
                .map(|p| format!("{}: {}", p.name, p.ty))
                .collect::<Vec<_>>()
                .join(", ");
            if func.is_extern {
                writeln!(f, "extern func {}({}) -> {}", func.name, params, func.return_type)?;
                continue;
            }
            writeln!(f, "func {}({}) -> {}:", func.name, params, func.return_type)?;
            for block in &func.blocks {
                writeln!(f, "  {}:", block.label)?;
                for inst in &block.instructions {
                    writeln!(f, "    {inst}")?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminator_detection() {
        let mut block = BasicBlock::new("entry");
        assert!(!block.is_terminated());
        block.push(Instruction::Ret { value: None });
        assert!(block.is_terminated());
    }

    #[test]
    fn module_display_renders_function_shape() {
        let mut entry = BasicBlock::new("entry");
        entry.push(Instruction::Ret { value: Some(Value::Const(ConstValue::Int(42), IrType::Int)) });
        let module = Module {
            structs: Vec::new(),
            functions: vec![Function {
                name: "main".to_string(),
                params: Vec::new(),
                return_type: IrType::Int,
                blocks: vec![entry],
                is_extern: false,
            }],
        };
        let text = module.to_string();
        assert!(text.contains("func main() -> i64:"));
        assert!(text.contains("entry:"));
        assert!(text.contains("ret 42"));
    }
}
