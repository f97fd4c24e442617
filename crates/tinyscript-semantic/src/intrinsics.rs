//! Built-in types, values and operators of the global scope.

use std::rc::Rc;
use tinyscript_ast::Operator;
use tinyscript_core::types::{AtomicType, FloatRange, IntRange, ObjectType, Type, TypeIdentity};
use tinyscript_core::{Result, Span};

use crate::deferred::Deferred;
use crate::scope::Scope;
use crate::signature::{Signature, Symbol, SymbolValue};

pub const STRING_IDENTITY: TypeIdentity = TypeIdentity::new(1);
pub const BOOL_IDENTITY: TypeIdentity = TypeIdentity::new(2);
/// Identities below this value are reserved for intrinsic types.
pub const FIRST_DECLARED_IDENTITY: u32 = 16;

/// Result rule of a built-in operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Add,
    Subtract,
    Multiply,
    Divide,
    Concat,
    Compare,
    Equality,
    Logic,
    Negate,
    Not,
}

/// The intrinsic atomic types.
#[derive(Debug, Clone)]
pub struct Intrinsics {
    pub string: Type,
    pub bool: Type,
}

impl Default for Intrinsics {
    fn default() -> Self {
        Self::new()
    }
}

impl Intrinsics {
    pub fn new() -> Self {
        Self {
            string: Type::Atomic(Rc::new(AtomicType::new(STRING_IDENTITY, "String", false))),
            bool: Type::Atomic(Rc::new(AtomicType::new(BOOL_IDENTITY, "Bool", false))),
        }
    }

    /// Computes the result type of a built-in operator from its operands.
    pub fn evaluate(&self, builtin: Builtin, lhs: Option<&Type>, rhs: &Type) -> Type {
        match builtin {
            Builtin::Add => arithmetic(lhs, rhs, IntRange::add, FloatRange::add),
            Builtin::Subtract => arithmetic(lhs, rhs, IntRange::sub, FloatRange::sub),
            Builtin::Multiply => arithmetic(lhs, rhs, IntRange::mul, FloatRange::mul),
            Builtin::Divide => match rhs {
                Type::Float(_) => Type::float(),
                _ => Type::int(),
            },
            Builtin::Concat => self.string.clone(),
            Builtin::Compare | Builtin::Equality | Builtin::Logic | Builtin::Not => {
                self.bool.clone()
            }
            Builtin::Negate => match rhs {
                Type::Int(range) => Type::Int(range.neg()),
                Type::Float(range) => Type::Float(range.neg()),
                _ => Type::int(),
            },
        }
    }

    /// Populates the global scope.
    ///
    /// # Errors
    /// Fails only if the scope already holds overlapping entries.
    pub fn install(&self, scope: &Scope<'_>) -> Result<()> {
        let types = [
            ("Any", Type::Any),
            ("Int", Type::int()),
            ("Float", Type::float()),
            ("String", self.string.clone()),
            ("Bool", self.bool.clone()),
        ];
        for (name, ty) in types {
            let cell = Rc::new(Deferred::resolved(name, Span::default(), ty));
            scope.define_type(name, false, cell, Span::default())?;
        }

        let values = [("true", self.bool.clone()), ("false", self.bool.clone())];
        for (name, ty) in values {
            scope.define(Rc::new(Symbol::intrinsic(
                Signature::name(name),
                SymbolValue::Known(ty),
            )))?;
        }

        let println = Signature::Name {
            receiver: None,
            name: "println".to_string(),
            impure: true,
            params: Some(Rc::new(ObjectType::new(vec![(
                "value".to_string(),
                Type::Any,
            )]))),
        };
        scope.define(Rc::new(Symbol::intrinsic(
            println,
            SymbolValue::Known(Type::empty_object()),
        )))?;

        for (lhs, operator, rhs, builtin) in self.operators() {
            let signature = Signature::Operator {
                lhs,
                operator,
                impure: false,
                rhs,
            };
            scope.define(Rc::new(Symbol::intrinsic(
                signature,
                SymbolValue::Builtin(builtin),
            )))?;
        }
        Ok(())
    }

    fn operators(&self) -> Vec<(Option<Type>, Operator, Type, Builtin)> {
        let int = Type::int;
        let float = Type::float;
        let mut operators = Vec::new();

        for (operator, builtin) in [
            (Operator::Add, Builtin::Add),
            (Operator::Subtract, Builtin::Subtract),
            (Operator::Multiply, Builtin::Multiply),
            (Operator::Divide, Builtin::Divide),
            (Operator::Less, Builtin::Compare),
            (Operator::LessEqual, Builtin::Compare),
            (Operator::Greater, Builtin::Compare),
            (Operator::GreaterEqual, Builtin::Compare),
        ] {
            operators.push((Some(int()), operator, int(), builtin));
            operators.push((Some(float()), operator, float(), builtin));
        }
        operators.push((
            Some(self.string.clone()),
            Operator::Add,
            self.string.clone(),
            Builtin::Concat,
        ));
        for operator in [Operator::Equal, Operator::NotEqual] {
            operators.push((Some(Type::Any), operator, Type::Any, Builtin::Equality));
        }
        for operator in [Operator::And, Operator::Or] {
            operators.push((
                Some(self.bool.clone()),
                operator,
                self.bool.clone(),
                Builtin::Logic,
            ));
        }
        operators.push((None, Operator::Subtract, int(), Builtin::Negate));
        operators.push((None, Operator::Subtract, float(), Builtin::Negate));
        operators.push((None, Operator::Not, self.bool.clone(), Builtin::Not));
        operators
    }
}

fn arithmetic(
    lhs: Option<&Type>,
    rhs: &Type,
    int: fn(&IntRange, &IntRange) -> IntRange,
    float: fn(&FloatRange, &FloatRange) -> FloatRange,
) -> Type {
    match (lhs, rhs) {
        (Some(Type::Int(a)), Type::Int(b)) => Type::Int(int(a, b)),
        (Some(Type::Float(a)), Type::Float(b)) => Type::Float(float(a, b)),
        (_, Type::Float(_)) => Type::float(),
        _ => Type::int(),
    }
}
