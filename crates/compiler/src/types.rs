//! The type algebra, symbols, and the scope-stack symbol table.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Closed type algebra: `Void | Bool | Int(64) | Float(64) | Pointer(T) |
/// Array(T, n) | Record(name, fields) | Enum(name, tags)`.
///
/// `Pointer` and `Record` are reference-like (calls pass by handle).
/// Equality is structural for primitives, pointers, and arrays, but
/// *nominal* for records and enums: two `Record`s with the same name are
/// equal regardless of field lists, because in a sound program two
/// distinct record declarations can never share a name (the binder's
/// declaration pass rejects the duplicate before any comparison happens).
#[derive(Debug, Clone)]
pub enum Type {
    Void,
    Bool,
    Int,
    Float,
    Pointer(Box<Type>),
    Array(Box<Type>, usize),
    Record(String, Vec<(String, Type)>),
    Enum(String, Vec<String>),
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Type::Void, Type::Void) => true,
            (Type::Bool, Type::Bool) => true,
            (Type::Int, Type::Int) => true,
            (Type::Float, Type::Float) => true,
            (Type::Pointer(a), Type::Pointer(b)) => a == b,
            (Type::Array(a, na), Type::Array(b, nb)) => na == nb && a == b,
            (Type::Record(a, _), Type::Record(b, _)) => a == b,
            (Type::Enum(a, _), Type::Enum(b, _)) => a == b,
            _ => false,
        }
    }
}
impl Eq for Type {}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => write!(f, "Void"),
            Type::Bool => write!(f, "Bool"),
            Type::Int => write!(f, "Int"),
            Type::Float => write!(f, "Float"),
            Type::Pointer(inner) => write!(f, "&{inner}"),
            Type::Array(inner, n) => write!(f, "[{n}]{inner}"),
            Type::Record(name, _) => write!(f, "{name}"),
            Type::Enum(name, _) => write!(f, "{name}"),
        }
    }
}

impl Type {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Int | Type::Float)
    }

    /// `from -> to` holds iff same kind+identity, or `Int -> Float`.
    /// No narrowing conversions exist.
    pub fn convertible_to(&self, to: &Type) -> bool {
        self == to || (*self == Type::Int && *to == Type::Float)
    }
}

/// Result type of mixing two numeric operands in an arithmetic context:
/// `Int` stays `Int`, any `Float` operand promotes the result to `Float`.
/// Returns `None` if either operand is non-numeric.
pub fn promote(lhs: &Type, rhs: &Type) -> Option<Type> {
    match (lhs, rhs) {
        (Type::Int, Type::Int) => Some(Type::Int),
        (Type::Float, Type::Float) => Some(Type::Float),
        (Type::Int, Type::Float) | (Type::Float, Type::Int) => Some(Type::Float),
        _ => None,
    }
}

/// A parameter or field: `(name, Type)`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedField {
    pub name: String,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FunctionModifiers {
    pub is_extern: bool,
    pub is_static: bool,
    pub is_pub: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
    Type {
        name: String,
        ty: Type,
    },
    Variable {
        name: String,
        ty: Type,
        is_parameter: bool,
    },
    Function {
        name: String,
        params: Vec<TypedField>,
        return_type: Type,
        modifiers: FunctionModifiers,
        is_varargs: bool,
    },
}

impl Symbol {
    pub fn name(&self) -> &str {
        match self {
            Symbol::Type { name, .. } => name,
            Symbol::Variable { name, .. } => name,
            Symbol::Function { name, .. } => name,
        }
    }

    pub fn as_variable_type(&self) -> Option<&Type> {
        match self {
            Symbol::Variable { ty, .. } => Some(ty),
            _ => None,
        }
    }

    pub fn as_function(
        &self,
    ) -> Option<(&[TypedField], &Type, &FunctionModifiers, bool)> {
        match self {
            Symbol::Function {
                params,
                return_type,
                modifiers,
                is_varargs,
                ..
            } => Some((params, return_type, modifiers, *is_varargs)),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<&Type> {
        match self {
            Symbol::Type { ty, .. } => Some(ty),
            _ => None,
        }
    }
}

/// A single scope: a name -> symbol map with unique keys.
#[derive(Debug, Default)]
struct Scope {
    names: HashMap<String, Rc<Symbol>>,
}

/// Stack of scopes. `lookup` walks from the innermost scope outward;
/// `declare` only ever checks (and inserts into) the innermost scope, so
/// shadowing across nested scopes is permitted while a duplicate name
/// within the same scope is rejected.
#[derive(Debug, Default)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

impl SymbolTable {
    /// A fresh table with one (global) scope, pre-declaring the built-in
    /// type names.
    pub fn new() -> Self {
        let mut table = SymbolTable {
            scopes: vec![Scope::default()],
        };
        for (name, ty) in [
            ("Int", Type::Int),
            ("Float", Type::Float),
            ("Bool", Type::Bool),
            ("Void", Type::Void),
            // String is a record surrogate representing null-terminated
            // bytes (resolves the "is String primitive, record, or
            // pointer?" open question the same way the original binder's
            // prologue does: `std::make_shared<RecordType>("String")`).
            ("String", Type::Record("String".to_string(), Vec::new())),
        ] {
            table.declare(
                name,
                Symbol::Type {
                    name: name.to_string(),
                    ty,
                },
            );
        }
        table
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Declare `name` in the innermost scope. Returns `false` (and leaves
    /// the table unchanged) if the name already exists in that scope.
    pub fn declare(&mut self, name: &str, symbol: Symbol) -> bool {
        let scope = self.scopes.last_mut().expect("at least one scope");
        if scope.names.contains_key(name) {
            return false;
        }
        scope.names.insert(name.to_string(), Rc::new(symbol));
        true
    }

    pub fn lookup(&self, name: &str) -> Option<Rc<Symbol>> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.names.get(name).cloned())
    }

    /// True if `name` is already declared in the *innermost* scope only.
    pub fn declared_in_current_scope(&self, name: &str) -> bool {
        self.scopes
            .last()
            .is_some_and(|scope| scope.names.contains_key(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_equality_for_primitives_and_pointers() {
        assert_eq!(Type::Int, Type::Int);
        assert_eq!(
            Type::Pointer(Box::new(Type::Int)),
            Type::Pointer(Box::new(Type::Int))
        );
        assert_ne!(
            Type::Pointer(Box::new(Type::Int)),
            Type::Pointer(Box::new(Type::Float))
        );
    }

    #[test]
    fn nominal_equality_for_records_ignores_fields() {
        let a = Type::Record("Point".to_string(), vec![("x".to_string(), Type::Int)]);
        let b = Type::Record("Point".to_string(), vec![]);
        assert_eq!(a, b);
    }

    #[test]
    fn int_converts_to_float_but_not_back() {
        assert!(Type::Int.convertible_to(&Type::Float));
        assert!(!Type::Float.convertible_to(&Type::Int));
    }

    #[test]
    fn promote_upward_only() {
        assert_eq!(promote(&Type::Int, &Type::Int), Some(Type::Int));
        assert_eq!(promote(&Type::Int, &Type::Float), Some(Type::Float));
        assert_eq!(promote(&Type::Float, &Type::Int), Some(Type::Float));
        assert_eq!(promote(&Type::Bool, &Type::Int), None);
    }

    #[test]
    fn global_scope_predeclares_builtins() {
        let table = SymbolTable::new();
        assert!(table.lookup("Int").is_some());
        assert!(table.lookup("String").is_some());
        assert!(table.lookup("nonexistent").is_none());
    }

    #[test]
    fn shadowing_across_scopes_is_allowed_within_scope_is_not() {
        let mut table = SymbolTable::new();
        table.declare(
            "x",
            Symbol::Variable {
                name: "x".to_string(),
                ty: Type::Int,
                is_parameter: false,
            },
        );
        table.push_scope();
        assert!(table.declare(
            "x",
            Symbol::Variable {
                name: "x".to_string(),
                ty: Type::Float,
                is_parameter: false,
            }
        ));
        assert!(!table.declare(
            "x",
            Symbol::Variable {
                name: "x".to_string(),
                ty: Type::Bool,
                is_parameter: false,
            }
        ));
        assert_eq!(
            table.lookup("x").unwrap().as_variable_type(),
            Some(&Type::Float)
        );
        table.pop_scope();
        assert_eq!(
            table.lookup("x").unwrap().as_variable_type(),
            Some(&Type::Int)
        );
    }
}
